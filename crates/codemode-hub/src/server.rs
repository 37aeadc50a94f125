use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cmh_config::{ExecutionConfig, GatewayConfig};
use cmh_core::McpSession;
use cmh_registry::ServerRegistry;
use cmh_sandbox::{ExecuteOptions, ExecuteRequest, execute_request};
use cmh_search::{SearchRequest, search_capabilities};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

/// Gateway MCP server.
///
/// Exposes capability search and codemode execution as two MCP tools over a
/// JSON-RPC 2.0 stdio protocol.
pub(crate) async fn run_gateway(config_path: &Path) -> Result<()> {
    let config = GatewayConfig::load(config_path)?;

    let registry = Arc::new(ServerRegistry::new());
    for server in &config.servers {
        if let Err(error) = registry.add_server(server.clone()).await {
            warn!(
                server = %server.name,
                error = %error,
                "backend registration failed, continuing without it"
            );
        }
    }

    info!("Starting codemode gateway on stdio");
    let session: Arc<dyn McpSession> = registry.clone();
    let served = run_stdio_loop(&session, &config.execution).await;

    registry.shutdown().await?;
    info!("Gateway shut down");
    served
}

async fn run_stdio_loop(session: &Arc<dyn McpSession>, execution: &ExecutionConfig) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read line from stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(request) => request,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                let error_response = JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32700,
                        message: format!("Parse error: {e}"),
                    }),
                    id: None,
                };
                write_response(&stdout, &error_response)?;
                continue;
            }
        };

        let Some(response) = handle_request(session, execution, request).await else {
            continue;
        };
        write_response(&stdout, &response)?;
    }

    Ok(())
}

/// Incoming JSON-RPC 2.0 frame.
#[derive(Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Option<Value>,
    id: Option<Value>,
}

/// Outgoing JSON-RPC 2.0 frame.
#[derive(Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

/// Error payload of a failed JSON-RPC call.
#[derive(Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Tool descriptor advertised through `tools/list`.
#[derive(Serialize)]
struct McpToolDef {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

fn tool_definitions() -> Vec<McpToolDef> {
    vec![
        McpToolDef {
            name: "search_capabilities".to_string(),
            description: "Search tools, resources, prompts and servers across all connected \
                          MCP backends. The query is a case-insensitive regular expression \
                          with a literal-text fallback."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Pattern matched against capability names, descriptions and resource URIs"
                    },
                    "type": {
                        "type": "string",
                        "enum": ["tools", "resources", "prompts", "servers", "all"],
                        "description": "Capability kind to search (default: all)"
                    },
                    "server": {
                        "type": "string",
                        "description": "Restrict the search to matching servers"
                    },
                    "includeSchemas": {
                        "type": "boolean",
                        "description": "Include tool input schemas in the results (default: false)"
                    }
                },
                "required": ["query"]
            }),
        },
        McpToolDef {
            name: "execute_code".to_string(),
            description: "Run a JavaScript fragment against the gateway in one request instead \
                          of many tool calls. The fragment is the body of an async function \
                          with an `mcp` object in scope: listServers(), listTools(pattern?), \
                          callTool(server, tool, args?), listResources(pattern?), \
                          listResourceTemplates(pattern?), readResource(server, uri), \
                          listPrompts(pattern?), getPrompt(server, name, args?), sleep(ms), \
                          log(...values). Use `return` for the final result; console output \
                          is captured into the result logs. No filesystem, network, timer or \
                          dynamic-eval access is available."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "JavaScript source to execute"
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Wall-clock limit in milliseconds (1000-300000, default 30000)"
                    }
                },
                "required": ["code"]
            }),
        },
    ]
}

async fn handle_request(
    session: &Arc<dyn McpSession>,
    execution: &ExecutionConfig,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    // Notifications carry no id and expect no response.
    if request.method.starts_with("notifications/") {
        return None;
    }

    let id = request.id.clone();
    let result = match request.method.as_str() {
        "initialize" => Ok(initialize_result()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({"tools": tool_definitions()})),
        "tools/call" => {
            handle_tool_call(session, execution, request.params.unwrap_or(Value::Null)).await
        }
        other => Err(JsonRpcError {
            code: -32601,
            message: format!("Method not found: {other}"),
        }),
    };

    Some(match result {
        Ok(result) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        },
        Err(error) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        },
    })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {"tools": {}},
        "serverInfo": {
            "name": "codemode-hub",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

async fn handle_tool_call(
    session: &Arc<dyn McpSession>,
    execution: &ExecutionConfig,
    params: Value,
) -> Result<Value, JsonRpcError> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    match name.as_str() {
        "search_capabilities" => {
            let request: SearchRequest = serde_json::from_value(arguments).map_err(|e| {
                invalid_params(format!("invalid search_capabilities arguments: {e}"))
            })?;
            let results = search_capabilities(session.as_ref(), &request).await;
            Ok(tool_result(&results))
        }
        "execute_code" => {
            let request: ExecuteRequest = serde_json::from_value(arguments)
                .map_err(|e| invalid_params(format!("invalid execute_code arguments: {e}")))?;
            let options = ExecuteOptions {
                timeout_ms: execution.timeout_ms,
                max_mcp_calls: execution.max_mcp_calls,
                initial_logs: Vec::new(),
            };
            let envelope = execute_request(&request, session.clone(), options).await;
            Ok(tool_result(&envelope))
        }
        other => Err(JsonRpcError {
            code: -32602,
            message: format!("Unknown tool: {other}"),
        }),
    }
}

fn invalid_params(message: String) -> JsonRpcError {
    JsonRpcError {
        code: -32602,
        message,
    }
}

/// Shape a tool payload as MCP text content. User-level failures are carried
/// inside the payload (the execution envelope), never as protocol errors.
fn tool_result<T: Serialize>(payload: &T) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| "null".to_string());
    json!({"content": [{"type": "text", "text": text}], "isError": false})
}

fn write_response(stdout: &std::io::Stdout, response: &JsonRpcResponse) -> Result<()> {
    let serialized = serde_json::to_string(response).context("Failed to serialize response")?;
    let mut handle = stdout.lock();
    writeln!(handle, "{serialized}").context("Failed to write response")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
