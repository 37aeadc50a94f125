//! Gateway configuration loaded from `codemode.toml`.

mod config;

pub use config::{BackendServerConfig, BackendTransportConfig, ExecutionConfig, GatewayConfig};
