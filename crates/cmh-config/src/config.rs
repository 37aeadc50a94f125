use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// How the gateway reaches one backend server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BackendTransportConfig {
    /// Local server launched as a child process, spoken to over stdin/stdout.
    #[serde(rename = "stdio")]
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        env: HashMap<String, String>,
    },
    /// Remote server reached over streamable HTTP.
    #[serde(rename = "http")]
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
    },
}

impl BackendTransportConfig {
    /// Transport name used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Http { .. } => "http",
        }
    }
}

/// One `[[servers]]` entry in `codemode.toml`.
///
/// The tagged spelling names the transport explicitly; an entry carrying a
/// bare `command` and no `type` is read as stdio, so server tables copied
/// from older gateway configs keep working:
///
/// ```toml
/// [[servers]]
/// name = "files"
/// type = "stdio"
/// command = "npx"
/// args = ["-y", "@modelcontextprotocol/server-filesystem", "/data"]
///
/// [[servers]]
/// name = "wiki"
/// type = "http"
/// url = "https://mcp.deepwiki.com/mcp"
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackendServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub transport: BackendTransportConfig,
}

/// Hand-rolled so both spellings share one pass: the raw table is read
/// whole, the transport is then resolved from `type` (or inferred from a
/// bare `command`), and anything missing is reported against the server's
/// name rather than as an anonymous serde error.
impl<'de> Deserialize<'de> for BackendServerConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            #[serde(rename = "type")]
            transport_type: Option<String>,
            // Stdio fields
            command: Option<String>,
            #[serde(default)]
            args: Vec<String>,
            #[serde(default)]
            env: HashMap<String, String>,
            // Http fields
            url: Option<String>,
            #[serde(default)]
            headers: HashMap<String, String>,
        }

        let raw = Raw::deserialize(deserializer)?;

        let transport = match raw.transport_type.as_deref() {
            Some("stdio") => {
                let command = raw.command.ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "server '{}': stdio transport needs a 'command'",
                        raw.name
                    ))
                })?;
                BackendTransportConfig::Stdio {
                    command,
                    args: raw.args,
                    env: raw.env,
                }
            }
            Some("http") => {
                let url = raw.url.ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "server '{}': http transport needs a 'url'",
                        raw.name
                    ))
                })?;
                BackendTransportConfig::Http {
                    url,
                    headers: raw.headers,
                }
            }
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "server '{}': unsupported transport '{}' (supported: stdio, http)",
                    raw.name, other
                )));
            }
            None => {
                if let Some(command) = raw.command {
                    // Untagged spelling: a command alone means stdio.
                    BackendTransportConfig::Stdio {
                        command,
                        args: raw.args,
                        env: raw.env,
                    }
                } else {
                    return Err(serde::de::Error::custom(format!(
                        "server '{}': no transport given; set type = \"stdio\" with a \
                         'command', or type = \"http\" with a 'url'",
                        raw.name
                    )));
                }
            }
        };

        Ok(BackendServerConfig {
            name: raw.name,
            transport,
        })
    }
}

/// Execution-limit overrides for the `execute_code` tool.
///
/// Missing fields fall back to the sandbox defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mcp_calls: Option<u32>,
}

/// Gateway configuration loaded from `codemode.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    #[serde(default)]
    pub servers: Vec<BackendServerConfig>,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl GatewayConfig {
    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read gateway config {}", path.display()))?;
        toml::from_str::<Self>(&raw)
            .with_context(|| format!("invalid gateway config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendTransportConfig, GatewayConfig};
    use tempfile::tempdir;

    fn load_str(contents: &str) -> anyhow::Result<GatewayConfig> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codemode.toml");
        std::fs::write(&path, contents).unwrap();
        GatewayConfig::load(&path)
    }

    #[test]
    fn bare_command_entries_read_as_stdio() {
        let config = load_str(
            r#"
[[servers]]
name = "files"
command = "uvx"
args = ["mcp-server-files"]
"#,
        )
        .unwrap();

        assert_eq!(config.servers.len(), 1);
        let server = &config.servers[0];
        assert_eq!(server.name, "files");
        match &server.transport {
            BackendTransportConfig::Stdio { command, args, env } => {
                assert_eq!(command, "uvx");
                assert_eq!(args, &["mcp-server-files"]);
                assert!(env.is_empty());
            }
            other => panic!("expected stdio transport, got {other:?}"),
        }
    }

    #[test]
    fn tagged_entries_carry_transport_fields() {
        let config = load_str(
            r#"
[[servers]]
name = "local"
type = "stdio"
command = "cargo"
args = ["run", "-p", "demo-server"]
env = { RUST_LOG = "debug" }

[[servers]]
name = "wiki"
type = "http"
url = "https://mcp.example.org/mcp"
headers = { "X-Api-Key" = "k123" }
"#,
        )
        .unwrap();

        assert_eq!(config.servers.len(), 2);
        match &config.servers[0].transport {
            BackendTransportConfig::Stdio { env, .. } => {
                assert_eq!(env.get("RUST_LOG").map(String::as_str), Some("debug"));
            }
            other => panic!("expected stdio transport, got {other:?}"),
        }
        match &config.servers[1].transport {
            BackendTransportConfig::Http { url, headers } => {
                assert_eq!(url, "https://mcp.example.org/mcp");
                assert_eq!(headers.get("X-Api-Key").map(String::as_str), Some("k123"));
            }
            other => panic!("expected http transport, got {other:?}"),
        }
    }

    #[test]
    fn entry_without_any_transport_names_the_server() {
        let err = load_str(
            r#"
[[servers]]
name = "dangling"
args = ["--flag"]
"#,
        )
        .unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("dangling"), "got: {msg}");
        assert!(msg.contains("no transport given"), "got: {msg}");
    }

    #[test]
    fn tagged_stdio_still_needs_a_command() {
        let err = load_str(
            r#"
[[servers]]
name = "half"
type = "stdio"
args = ["--help"]
"#,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("needs a 'command'"));
    }

    #[test]
    fn tagged_http_still_needs_a_url() {
        let err = load_str(
            r#"
[[servers]]
name = "half"
type = "http"
headers = { Authorization = "Bearer x" }
"#,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("needs a 'url'"));
    }

    #[test]
    fn sse_is_not_a_supported_transport() {
        let err = load_str(
            r#"
[[servers]]
name = "legacy"
type = "sse"
url = "https://mcp.example.org/sse"
"#,
        )
        .unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("unsupported transport 'sse'"), "got: {msg}");
    }

    #[test]
    fn keys_from_other_gateways_are_ignored() {
        // Server tables copied from other tools may carry extra knobs this
        // gateway has no use for; they must not break parsing.
        let config = load_str(
            r#"
[[servers]]
name = "files"
command = "uvx"
stateful = true
memory_max_mb = 512
"#,
        )
        .unwrap();

        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].transport.label(), "stdio");
    }

    #[test]
    fn execution_limits_are_optional_overrides() {
        let config = load_str(
            r#"
[execution]
timeout_ms = 60000
max_mcp_calls = 25
"#,
        )
        .unwrap();
        assert_eq!(config.execution.timeout_ms, Some(60_000));
        assert_eq!(config.execution.max_mcp_calls, Some(25));

        let config = load_str("").unwrap();
        assert!(config.servers.is_empty());
        assert_eq!(config.execution.timeout_ms, None);
        assert_eq!(config.execution.max_mcp_calls, None);
    }

    #[test]
    fn serialization_always_writes_the_tag() {
        // A bare-command entry still serializes in the tagged spelling.
        let config = load_str(
            r#"
[[servers]]
name = "files"
command = "uvx"
"#,
        )
        .unwrap();

        let rendered = toml::to_string(&config.servers[0]).unwrap();
        assert!(rendered.contains("type = \"stdio\""), "got: {rendered}");
        assert!(rendered.contains("command = \"uvx\""), "got: {rendered}");
    }

    #[test]
    fn unreadable_path_is_reported_with_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = GatewayConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }
}
