#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("unknown MCP server: {0}")]
    UnknownServer(String),

    #[error("MCP server '{0}' is not connected")]
    ServerNotConnected(String),

    #[error("Server '{0}' disconnected")]
    ServerRemoved(String),

    #[error("Registry shutting down")]
    RegistryShutdown,

    #[error("Request timed out after {0}s")]
    PendingRequestTimeout(u64),

    #[error("no pending request with id '{0}'")]
    PendingRequestNotFound(String),
}
