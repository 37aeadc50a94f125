//! Shared types for the codemode hub: capability records, the session trait
//! consumed by the sandbox and the search engine, and the server-name matcher.

mod error;
mod pattern;
mod session;
mod types;

pub use error::GatewayError;
pub use pattern::ServerPattern;
pub use session::McpSession;
pub use types::{
    PromptArgumentInfo, PromptInfo, ResourceInfo, ResourceTemplateInfo, ServerCapabilityFlags,
    ServerInfo, ServerStatus, ToolInfo,
};
