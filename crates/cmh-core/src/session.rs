use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::types::{PromptInfo, ResourceInfo, ResourceTemplateInfo, ServerInfo, ToolInfo};

/// Gateway-internal view of the backend fleet, shared by the sandbox
/// capability API and the capability search.
///
/// All operations target a single named server; fan-out across servers
/// (pattern filtering, per-server error policy) is composed by callers on
/// top of [`list_servers`](McpSession::list_servers). Invocation results are
/// returned as plain JSON values in MCP wire shape, so no caller ever holds a
/// live handle into registry state.
///
/// Targeted dispatch to an absent or non-connected server fails with a
/// descriptive error.
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Snapshot of all registered servers regardless of status, in
    /// registration order.
    async fn list_servers(&self) -> Vec<ServerInfo>;

    /// Whether a server with this exact name is registered.
    async fn has_server(&self, name: &str) -> bool;

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolInfo>>;

    async fn call_tool(&self, server: &str, tool: &str, args: Option<Value>) -> Result<Value>;

    async fn list_resources(&self, server: &str) -> Result<Vec<ResourceInfo>>;

    async fn list_resource_templates(&self, server: &str) -> Result<Vec<ResourceTemplateInfo>>;

    async fn read_resource(&self, server: &str, uri: &str) -> Result<Value>;

    async fn list_prompts(&self, server: &str) -> Result<Vec<PromptInfo>>;

    async fn get_prompt(&self, server: &str, prompt: &str, args: Option<Value>) -> Result<Value>;
}
