use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use cmh_config::{BackendServerConfig, BackendTransportConfig};
use cmh_core::{
    GatewayError, McpSession, PromptArgumentInfo, PromptInfo, ResourceInfo, ResourceTemplateInfo,
    ServerCapabilityFlags, ServerInfo, ServerStatus, ToolInfo,
};
use rmcp::RoleClient;
use rmcp::model::{CallToolRequestParam, GetPromptRequestParam, ReadResourceRequestParam};
use rmcp::service::{RunningService, ServiceExt};
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::client_handler::GatewayClientHandler;
use crate::events::{BackendLogEntry, EventBuffers, NotificationEntry};
use crate::pending::{DEFAULT_PENDING_TIMEOUT_SECS, PendingRequestInfo, PendingRequests};

const RESTART_BACKOFF_INITIAL_MS: u64 = 100;
const RESTART_BACKOFF_MAX_MS: u64 = 30_000;
const SHUTDOWN_GRACE_SECS: u64 = 3;
const REQUEST_QUEUE_CAPACITY: usize = 64;
const DISPATCH_ATTEMPTS: usize = 3;

/// Process-wide collection of backend connections.
///
/// One worker task per server owns the rmcp client and serves requests from
/// an mpsc queue, which gives FIFO ordering per connection. Registration
/// order is preserved so aggregated listings are stable.
pub struct ServerRegistry {
    inner: RwLock<RegistryInner>,
    events: Arc<EventBuffers>,
    pending: Arc<PendingRequests>,
    shutdown: CancellationToken,
}

struct RegistryInner {
    order: Vec<String>,
    servers: HashMap<String, ServerHandle>,
}

struct ServerHandle {
    queue: ServerQueue,
    state: Arc<RwLock<BackendState>>,
}

struct BackendState {
    status: ServerStatus,
    capabilities: ServerCapabilityFlags,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            status: ServerStatus::Disconnected,
            capabilities: ServerCapabilityFlags::default(),
        }
    }
}

impl ServerRegistry {
    pub fn new() -> Self {
        let shutdown = CancellationToken::new();
        Self {
            inner: RwLock::new(RegistryInner {
                order: Vec::new(),
                servers: HashMap::new(),
            }),
            events: Arc::new(EventBuffers::default()),
            pending: Arc::new(PendingRequests::new(
                Duration::from_secs(DEFAULT_PENDING_TIMEOUT_SECS),
                shutdown.clone(),
            )),
            shutdown,
        }
    }

    /// Register a backend, spawn its connection worker, and connect eagerly
    /// so the server participates in fan-out right away. Replaces any
    /// existing server with the same name.
    pub async fn add_server(&self, config: BackendServerConfig) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(GatewayError::RegistryShutdown.into());
        }

        let name = config.name.clone();
        let state = Arc::new(RwLock::new(BackendState::default()));
        let queue = ServerQueue::spawn(
            config,
            state.clone(),
            self.events.clone(),
            self.pending.clone(),
        );

        let replaced = {
            let mut inner = self.inner.write().await;
            let replaced = inner.servers.insert(
                name.clone(),
                ServerHandle {
                    queue: queue.clone(),
                    state,
                },
            );
            if replaced.is_none() {
                inner.order.push(name.clone());
            }
            replaced
        };
        if let Some(old) = replaced {
            old.queue.shutdown().await;
            self.pending.reject_for_server(&name).await;
        }

        match queue.request(CommandKind::Connect).await {
            Ok(_) => Ok(()),
            Err(error) => Err(error.context(format!("failed to connect MCP server '{name}'"))),
        }
    }

    /// Remove a server, stop its worker, and reject its parked requests.
    pub async fn remove_server(&self, name: &str) -> Result<()> {
        let removed = {
            let mut inner = self.inner.write().await;
            inner.order.retain(|n| n != name);
            inner.servers.remove(name)
        };
        let Some(handle) = removed else {
            return Err(GatewayError::UnknownServer(name.to_string()).into());
        };
        handle.queue.shutdown().await;
        self.pending.reject_for_server(name).await;
        Ok(())
    }

    /// Stop every worker and reject all parked requests.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown.cancel();
        let handles: Vec<ServerHandle> = {
            let mut inner = self.inner.write().await;
            inner.order.clear();
            inner.servers.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            handle.queue.shutdown().await;
        }
        Ok(())
    }

    /// Drain buffered backend notifications.
    pub async fn take_notifications(&self) -> Vec<NotificationEntry> {
        self.events.take_notifications().await
    }

    /// Drain buffered backend log messages.
    pub async fn take_logs(&self) -> Vec<BackendLogEntry> {
        self.events.take_logs().await
    }

    /// Enumerate backend-initiated requests waiting for an operator.
    pub async fn pending_requests(&self) -> Vec<PendingRequestInfo> {
        self.pending.list().await
    }

    /// Answer a parked sampling/elicitation request.
    pub async fn respond_pending(&self, id: &str, response: Value) -> Result<()> {
        self.pending.respond(id, response).await
    }

    /// Reject a parked sampling/elicitation request.
    pub async fn reject_pending(&self, id: &str, reason: &str) -> Result<()> {
        self.pending.reject(id, reason).await
    }

    async fn dispatch(&self, server: &str, command: CommandKind) -> Result<CommandResponse> {
        let queue = {
            let inner = self.inner.read().await;
            let handle = inner
                .servers
                .get(server)
                .ok_or_else(|| GatewayError::UnknownServer(server.to_string()))?;
            handle.queue.clone()
        };
        queue.request(command).await
    }
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpSession for ServerRegistry {
    async fn list_servers(&self) -> Vec<ServerInfo> {
        let inner = self.inner.read().await;
        let mut servers = Vec::with_capacity(inner.order.len());
        for name in &inner.order {
            if let Some(handle) = inner.servers.get(name) {
                let state = handle.state.read().await;
                servers.push(ServerInfo {
                    name: name.clone(),
                    status: state.status,
                    capabilities: state.capabilities,
                });
            }
        }
        servers
    }

    async fn has_server(&self, name: &str) -> bool {
        self.inner.read().await.servers.contains_key(name)
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolInfo>> {
        match self.dispatch(server, CommandKind::ListTools).await? {
            CommandResponse::Tools(tools) => Ok(tools),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }

    async fn call_tool(&self, server: &str, tool: &str, args: Option<Value>) -> Result<Value> {
        match self
            .dispatch(
                server,
                CommandKind::CallTool {
                    tool: tool.to_string(),
                    args,
                },
            )
            .await?
        {
            CommandResponse::Value(value) => Ok(value),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }

    async fn list_resources(&self, server: &str) -> Result<Vec<ResourceInfo>> {
        match self.dispatch(server, CommandKind::ListResources).await? {
            CommandResponse::Resources(resources) => Ok(resources),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }

    async fn list_resource_templates(&self, server: &str) -> Result<Vec<ResourceTemplateInfo>> {
        match self
            .dispatch(server, CommandKind::ListResourceTemplates)
            .await?
        {
            CommandResponse::ResourceTemplates(templates) => Ok(templates),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }

    async fn read_resource(&self, server: &str, uri: &str) -> Result<Value> {
        match self
            .dispatch(
                server,
                CommandKind::ReadResource {
                    uri: uri.to_string(),
                },
            )
            .await?
        {
            CommandResponse::Value(value) => Ok(value),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }

    async fn list_prompts(&self, server: &str) -> Result<Vec<PromptInfo>> {
        match self.dispatch(server, CommandKind::ListPrompts).await? {
            CommandResponse::Prompts(prompts) => Ok(prompts),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }

    async fn get_prompt(&self, server: &str, prompt: &str, args: Option<Value>) -> Result<Value> {
        match self
            .dispatch(
                server,
                CommandKind::GetPrompt {
                    prompt: prompt.to_string(),
                    args,
                },
            )
            .await?
        {
            CommandResponse::Value(value) => Ok(value),
            other => Err(anyhow!("unexpected backend response: {}", other.label())),
        }
    }
}

#[derive(Clone)]
struct ServerQueue {
    server_name: String,
    sender: mpsc::Sender<QueueCommand>,
}

enum CommandKind {
    Connect,
    ListTools,
    CallTool { tool: String, args: Option<Value> },
    ListResources,
    ListResourceTemplates,
    ReadResource { uri: String },
    ListPrompts,
    GetPrompt { prompt: String, args: Option<Value> },
    Shutdown,
}

enum CommandResponse {
    Connected,
    Tools(Vec<ToolInfo>),
    Resources(Vec<ResourceInfo>),
    ResourceTemplates(Vec<ResourceTemplateInfo>),
    Prompts(Vec<PromptInfo>),
    Value(Value),
    Shutdown,
}

impl CommandResponse {
    fn label(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Tools(_) => "tools",
            Self::Resources(_) => "resources",
            Self::ResourceTemplates(_) => "resource_templates",
            Self::Prompts(_) => "prompts",
            Self::Value(_) => "value",
            Self::Shutdown => "shutdown",
        }
    }
}

struct QueueCommand {
    kind: CommandKind,
    response: oneshot::Sender<Result<CommandResponse>>,
}

impl ServerQueue {
    fn spawn(
        config: BackendServerConfig,
        state: Arc<RwLock<BackendState>>,
        events: Arc<EventBuffers>,
        pending: Arc<PendingRequests>,
    ) -> Self {
        let server_name = config.name.clone();
        let (sender, mut receiver) = mpsc::channel::<QueueCommand>(REQUEST_QUEUE_CAPACITY);
        let worker_name = server_name.clone();

        tokio::spawn(async move {
            let mut server = ManagedServer::new(config, state, events, pending);

            while let Some(command) = receiver.recv().await {
                match command.kind {
                    CommandKind::Shutdown => {
                        let _ = command.response.send(Ok(CommandResponse::Shutdown));
                        break;
                    }
                    kind => {
                        let result = server.run(kind).await;
                        let _ = command.response.send(result);
                    }
                }
            }

            server.shutdown().await;
            tracing::debug!(server = %worker_name, "backend worker stopped");
        });

        Self {
            server_name,
            sender,
        }
    }

    async fn request(&self, kind: CommandKind) -> Result<CommandResponse> {
        let (response_tx, response_rx) = oneshot::channel();
        let command = QueueCommand {
            kind,
            response: response_tx,
        };
        self.sender
            .send(command)
            .await
            .map_err(|_| anyhow!("backend queue stopped: {}", self.server_name))?;
        response_rx
            .await
            .context("backend queue worker dropped response channel")?
    }

    async fn shutdown(&self) {
        let _ = self.request(CommandKind::Shutdown).await;
    }
}

/// Dispatch failure classification: protocol-level rejections propagate
/// untouched, transport failures tear the connection down and retry.
enum PerformError {
    Fatal(anyhow::Error),
    Retryable(anyhow::Error),
}

struct ManagedServer {
    config: BackendServerConfig,
    transport: Option<BackendTransport>,
    restart_backoff: Duration,
    state: Arc<RwLock<BackendState>>,
    events: Arc<EventBuffers>,
    pending: Arc<PendingRequests>,
}

impl ManagedServer {
    fn new(
        config: BackendServerConfig,
        state: Arc<RwLock<BackendState>>,
        events: Arc<EventBuffers>,
        pending: Arc<PendingRequests>,
    ) -> Self {
        Self {
            config,
            transport: None,
            restart_backoff: Duration::from_millis(RESTART_BACKOFF_INITIAL_MS),
            state,
            events,
            pending,
        }
    }

    async fn run(&mut self, kind: CommandKind) -> Result<CommandResponse> {
        let mut last_err: Option<anyhow::Error> = None;

        for _ in 0..DISPATCH_ATTEMPTS {
            if let Err(error) = self.ensure_running().await {
                tracing::warn!(
                    server = %self.config.name,
                    error = %error,
                    "backend connect failed, retrying"
                );
                last_err = Some(error);
                self.restart_after_failure().await;
                continue;
            }
            if matches!(kind, CommandKind::Connect) {
                return Ok(CommandResponse::Connected);
            }
            let Some(transport) = self.transport.as_ref() else {
                continue;
            };
            match Self::perform(transport.service(), &self.config.name, &kind).await {
                Ok(response) => {
                    self.restart_backoff = Duration::from_millis(RESTART_BACKOFF_INITIAL_MS);
                    return Ok(response);
                }
                Err(PerformError::Fatal(error)) => return Err(error),
                Err(PerformError::Retryable(error)) => {
                    tracing::warn!(
                        server = %self.config.name,
                        error = %error,
                        "backend request failed, restarting connection"
                    );
                    last_err = Some(error);
                    self.restart_after_failure().await;
                }
            }
        }

        self.set_status(ServerStatus::Error).await;
        Err(last_err
            .unwrap_or_else(|| anyhow!("MCP server '{}' is not connected", self.config.name)))
    }

    async fn perform(
        service: &RunningService<RoleClient, GatewayClientHandler>,
        server: &str,
        kind: &CommandKind,
    ) -> Result<CommandResponse, PerformError> {
        match kind {
            CommandKind::Connect | CommandKind::Shutdown => Err(PerformError::Fatal(anyhow!(
                "command handled outside the dispatch loop"
            ))),
            CommandKind::ListTools => {
                let response = service
                    .list_tools(None)
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::Tools(
                    response
                        .tools
                        .into_iter()
                        .map(|tool| tool_info(server, tool))
                        .collect(),
                ))
            }
            CommandKind::CallTool { tool, args } => {
                let mut request = CallToolRequestParam::new(tool.clone());
                request.arguments = args.as_ref().and_then(|value| value.as_object().cloned());
                let response = service
                    .call_tool(request)
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::Value(encode(response)?))
            }
            CommandKind::ListResources => {
                let response = service
                    .list_resources(None)
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::Resources(
                    response
                        .resources
                        .into_iter()
                        .map(|resource| resource_info(server, resource))
                        .collect(),
                ))
            }
            CommandKind::ListResourceTemplates => {
                let response = service
                    .list_resource_templates(None)
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::ResourceTemplates(
                    response
                        .resource_templates
                        .into_iter()
                        .map(|template| resource_template_info(server, template))
                        .collect(),
                ))
            }
            CommandKind::ReadResource { uri } => {
                let response = service
                    .read_resource(ReadResourceRequestParam::new(uri.clone()))
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::Value(encode(response)?))
            }
            CommandKind::ListPrompts => {
                let response = service
                    .list_prompts(None)
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::Prompts(
                    response
                        .prompts
                        .into_iter()
                        .map(|prompt| prompt_info(server, prompt))
                        .collect(),
                ))
            }
            CommandKind::GetPrompt { prompt, args } => {
                let mut request = GetPromptRequestParam::new(prompt.clone());
                request.arguments = args.as_ref().and_then(|value| value.as_object().cloned());
                let response = service
                    .get_prompt(request)
                    .await
                    .map_err(|e| classify(server, e))?;
                Ok(CommandResponse::Value(encode(response)?))
            }
        }
    }

    async fn ensure_running(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }

        let handler = GatewayClientHandler::new(
            self.config.name.clone(),
            self.events.clone(),
            self.pending.clone(),
        );
        let transport = BackendTransport::connect(&self.config, handler).await?;

        let capabilities = transport
            .service()
            .peer_info()
            .map(|info| ServerCapabilityFlags {
                tools: info.capabilities.tools.is_some(),
                resources: info.capabilities.resources.is_some(),
                prompts: info.capabilities.prompts.is_some(),
            })
            .unwrap_or_default();

        self.transport = Some(transport);
        let mut state = self.state.write().await;
        state.status = ServerStatus::Connected;
        state.capabilities = capabilities;
        Ok(())
    }

    async fn restart_after_failure(&mut self) {
        self.set_status(ServerStatus::Reconnecting).await;
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }

        tokio::time::sleep(self.restart_backoff).await;
        self.restart_backoff =
            (self.restart_backoff * 2).min(Duration::from_millis(RESTART_BACKOFF_MAX_MS));
    }

    async fn set_status(&self, status: ServerStatus) {
        self.state.write().await.status = status;
    }

    async fn shutdown(&mut self) {
        self.set_status(ServerStatus::Disconnected).await;
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }
    }
}

fn classify(server: &str, error: rmcp::ServiceError) -> PerformError {
    match error {
        rmcp::ServiceError::McpError(data) => PerformError::Fatal(anyhow!(
            "MCP server '{server}' rejected the request: {}",
            data.message
        )),
        other => PerformError::Retryable(anyhow!(other)),
    }
}

fn encode<T: serde::Serialize>(response: T) -> Result<Value, PerformError> {
    serde_json::to_value(response)
        .map_err(|error| PerformError::Fatal(anyhow!("failed to encode backend response: {error}")))
}

fn tool_info(server: &str, tool: rmcp::model::Tool) -> ToolInfo {
    ToolInfo {
        server: server.to_string(),
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: Some(Value::Object(tool.input_schema.as_ref().clone())),
    }
}

fn resource_info(server: &str, resource: rmcp::model::Resource) -> ResourceInfo {
    ResourceInfo {
        server: server.to_string(),
        uri: resource.uri.to_string(),
        name: resource.name.to_string(),
        description: resource.description.clone().map(|d| d.to_string()),
        mime_type: resource.mime_type.clone().map(|m| m.to_string()),
    }
}

fn resource_template_info(
    server: &str,
    template: rmcp::model::ResourceTemplate,
) -> ResourceTemplateInfo {
    ResourceTemplateInfo {
        server: server.to_string(),
        uri_template: template.uri_template.to_string(),
        name: template.name.to_string(),
        description: template.description.clone().map(|d| d.to_string()),
        mime_type: template.mime_type.clone().map(|m| m.to_string()),
    }
}

fn prompt_info(server: &str, prompt: rmcp::model::Prompt) -> PromptInfo {
    PromptInfo {
        server: server.to_string(),
        name: prompt.name.to_string(),
        description: prompt.description.map(|d| d.to_string()),
        arguments: prompt.arguments.map(|arguments| {
            arguments
                .into_iter()
                .map(|argument| PromptArgumentInfo {
                    name: argument.name.to_string(),
                    description: argument.description.map(|d| d.to_string()),
                    required: argument.required,
                })
                .collect()
        }),
    }
}

/// One live connection to a backend server.
///
/// A stdio backend owns its child process alongside the rmcp client, so
/// teardown has to reap the child as well; the HTTP variant only has a
/// client to cancel.
enum BackendTransport {
    /// Spawned child process, JSON-RPC over its stdin/stdout.
    Stdio {
        service: RunningService<RoleClient, GatewayClientHandler>,
        child: Box<tokio::process::Child>,
    },
    /// Remote endpoint spoken to over streamable HTTP.
    #[cfg(feature = "transport-http-client")]
    Http {
        service: RunningService<RoleClient, GatewayClientHandler>,
    },
}

impl BackendTransport {
    /// Open whichever transport the server's config names.
    async fn connect(
        config: &BackendServerConfig,
        handler: GatewayClientHandler,
    ) -> Result<Self> {
        match &config.transport {
            BackendTransportConfig::Stdio { command, args, env } => {
                Self::spawn_stdio(config, command, args, env, handler).await
            }
            #[cfg(feature = "transport-http-client")]
            BackendTransportConfig::Http { url, headers } => {
                Self::connect_http(config, url, headers, handler).await
            }
            #[cfg(not(feature = "transport-http-client"))]
            BackendTransportConfig::Http { .. } => {
                anyhow::bail!(
                    "server '{}' requires HTTP transport, but cmh-registry was built \
                     without the 'transport-http-client' feature",
                    config.name
                );
            }
        }
    }

    /// The rmcp client behind this connection.
    fn service(&self) -> &RunningService<RoleClient, GatewayClientHandler> {
        match self {
            Self::Stdio { service, .. } => service,
            #[cfg(feature = "transport-http-client")]
            Self::Http { service, .. } => service,
        }
    }

    /// Cancel the client; a stdio child gets a grace period to exit before
    /// it is killed.
    async fn shutdown(self) {
        match self {
            Self::Stdio {
                service, mut child, ..
            } => {
                let _ = service.cancel().await;
                match tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), child.wait())
                    .await
                {
                    Ok(Ok(_)) => {}
                    Ok(Err(error)) => {
                        tracing::debug!(error = %error, "failed to wait MCP child process");
                    }
                    Err(_) => {
                        let _ = child.kill().await;
                    }
                }
            }
            #[cfg(feature = "transport-http-client")]
            Self::Http { service, .. } => {
                let _ = service.cancel().await;
            }
        }
    }

    /// Launch the configured command with piped stdio and run the MCP
    /// handshake over it. Stderr is drained so a chatty server cannot block.
    async fn spawn_stdio(
        config: &BackendServerConfig,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        handler: GatewayClientHandler,
    ) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn MCP server '{}'", config.name))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdout for MCP server '{}'", config.name))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdin for MCP server '{}'", config.name))?;
        if let Some(mut stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut sink = tokio::io::sink();
                let _ = tokio::io::copy(&mut stderr, &mut sink).await;
            });
        }

        let service = handler
            .serve((stdout, stdin))
            .await
            .with_context(|| format!("handshake with MCP server '{}' failed", config.name))?;

        Ok(Self::Stdio {
            service,
            child: Box::new(child),
        })
    }

    /// Dial a streamable HTTP backend.
    #[cfg(feature = "transport-http-client")]
    async fn connect_http(
        config: &BackendServerConfig,
        url: &str,
        headers: &HashMap<String, String>,
        handler: GatewayClientHandler,
    ) -> Result<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        if !headers.is_empty() {
            // TODO: apply configured headers once the transport builder exposes them.
            tracing::warn!(
                server = %config.name,
                "configured HTTP headers are not applied to streamable HTTP transports"
            );
        }

        tracing::info!(server = %config.name, url = %url, "connecting to HTTP MCP server");

        let transport = StreamableHttpClientTransport::from_uri(url);
        let service = handler.serve(transport).await.with_context(|| {
            format!(
                "failed to connect to HTTP MCP server '{}' at {url}",
                config.name
            )
        })?;

        Ok(Self::Http { service })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
