use std::collections::HashMap;
use std::fs;

use anyhow::Result;
use cmh_config::{BackendServerConfig, BackendTransportConfig};
use cmh_core::{McpSession, ServerStatus};
use serde_json::json;

use super::ServerRegistry;

fn write_script(dir: &std::path::Path, body: &str) -> Result<std::path::PathBuf> {
    let path = dir.join("mock-mcp.sh");
    fs::write(&path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
    }
    Ok(path)
}

fn config(script_path: &std::path::Path, name: &str) -> BackendServerConfig {
    BackendServerConfig {
        name: name.to_string(),
        transport: BackendTransportConfig::Stdio {
            command: "sh".to_string(),
            args: vec![script_path.to_string_lossy().into_owned()],
            env: HashMap::new(),
        },
    }
}

const MOCK_SERVER_SCRIPT: &str = r#"#!/bin/sh
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id"[ ]*:[ ]*\([^,}]*\).*/\1/p')
  case "$line" in
    *\"initialize\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{},"resources":{},"prompts":{}},"serverInfo":{"name":"mock","version":"0.1.0"}}}\n' "$id"
      ;;
    *\"notifications/initialized\"*)
      ;;
    *\"tools/list\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo_tool","description":"echo","inputSchema":{"type":"object","properties":{}}}]}}\n' "$id"
      ;;
    *\"tools/call\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong"}]}}\n' "$id"
      ;;
    *\"resources/templates/list\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"resourceTemplates":[{"uriTemplate":"mock://{name}","name":"by-name"}]}}\n' "$id"
      ;;
    *\"resources/list\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"resources":[{"uri":"mock://greeting","name":"greeting","mimeType":"text/plain"}]}}\n' "$id"
      ;;
    *\"resources/read\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"contents":[{"uri":"mock://greeting","mimeType":"text/plain","text":"hello"}]}}\n' "$id"
      ;;
    *\"prompts/list\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"prompts":[{"name":"summarize","description":"Summarize a topic"}]}}\n' "$id"
      ;;
    *\"prompts/get\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"messages":[{"role":"user","content":{"type":"text","text":"summarize"}}]}}\n' "$id"
      ;;
    *)
      printf '{"jsonrpc":"2.0","id":%s,"result":{}}\n' "$id"
      ;;
  esac
done
"#;

#[tokio::test]
async fn registry_forwards_enumeration_and_calls() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script_path = write_script(temp.path(), MOCK_SERVER_SCRIPT)?;

    let registry = ServerRegistry::new();
    registry.add_server(config(&script_path, "mock")).await?;

    let tools = registry.list_tools("mock").await?;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "echo_tool");
    assert_eq!(tools[0].server, "mock");
    assert!(tools[0].input_schema.is_some());

    let response = registry
        .call_tool("mock", "echo_tool", Some(json!({"value": "ping"})))
        .await?;
    assert_eq!(response["content"][0]["text"], json!("pong"));

    let resources = registry.list_resources("mock").await?;
    assert_eq!(resources[0].uri, "mock://greeting");
    assert_eq!(resources[0].server, "mock");

    let templates = registry.list_resource_templates("mock").await?;
    assert_eq!(templates[0].uri_template, "mock://{name}");

    let contents = registry.read_resource("mock", "mock://greeting").await?;
    assert_eq!(contents["contents"][0]["text"], json!("hello"));

    let prompts = registry.list_prompts("mock").await?;
    assert_eq!(prompts[0].name, "summarize");

    let prompt = registry.get_prompt("mock", "summarize", None).await?;
    assert_eq!(prompt["messages"][0]["role"], json!("user"));

    registry.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn added_server_is_connected_with_capability_flags() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script_path = write_script(temp.path(), MOCK_SERVER_SCRIPT)?;

    let registry = ServerRegistry::new();
    registry.add_server(config(&script_path, "mock")).await?;

    let servers = registry.list_servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name, "mock");
    assert_eq!(servers[0].status, ServerStatus::Connected);
    assert!(servers[0].capabilities.tools);
    assert!(servers[0].capabilities.resources);
    assert!(servers[0].capabilities.prompts);

    assert!(registry.has_server("mock").await);
    assert!(!registry.has_server("other").await);

    registry.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn registration_order_is_preserved() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script_path = write_script(temp.path(), MOCK_SERVER_SCRIPT)?;

    let registry = ServerRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry.add_server(config(&script_path, name)).await?;
    }

    let names: Vec<String> = registry
        .list_servers()
        .await
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);

    registry.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn unknown_server_is_rejected_with_descriptive_error() -> Result<()> {
    let registry = ServerRegistry::new();

    let error = registry
        .call_tool("nope", "echo_tool", None)
        .await
        .expect_err("dispatch to unknown server should fail");
    assert!(
        error.to_string().contains("unknown MCP server: nope"),
        "got: {error}"
    );

    registry.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn registry_restarts_server_after_crash() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let stamp = temp.path().join("first-list.stamp");
    let script_path = write_script(
        temp.path(),
        &format!(
            r#"#!/bin/sh
stamp="{}"
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id"[ ]*:[ ]*\([^,}}]*\).*/\1/p')
  case "$line" in
    *\"initialize\"*)
      printf '{{"jsonrpc":"2.0","id":%s,"result":{{"protocolVersion":"2024-11-05","capabilities":{{"tools":{{}}}},"serverInfo":{{"name":"mock","version":"0.1.0"}}}}}}\n' "$id"
      ;;
    *\"notifications/initialized\"*)
      ;;
    *\"tools/list\"*)
      printf '{{"jsonrpc":"2.0","id":%s,"result":{{"tools":[{{"name":"echo_tool","description":"echo","inputSchema":{{"type":"object","properties":{{}}}}}}]}}}}\n' "$id"
      if [ ! -f "$stamp" ]; then
        touch "$stamp"
        exit 1
      fi
      ;;
  esac
done
"#,
            stamp.to_string_lossy()
        ),
    )?;

    let registry = ServerRegistry::new();
    registry.add_server(config(&script_path, "flaky")).await?;

    let first = registry.list_tools("flaky").await?;
    assert_eq!(first[0].name, "echo_tool");

    let second = registry.list_tools("flaky").await?;
    assert_eq!(second[0].name, "echo_tool");

    registry.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn removed_server_is_forgotten() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script_path = write_script(temp.path(), MOCK_SERVER_SCRIPT)?;

    let registry = ServerRegistry::new();
    registry.add_server(config(&script_path, "mock")).await?;
    registry.remove_server("mock").await?;

    assert!(!registry.has_server("mock").await);
    assert!(registry.list_servers().await.is_empty());
    let error = registry
        .list_tools("mock")
        .await
        .expect_err("dispatch to removed server should fail");
    assert!(error.to_string().contains("unknown MCP server"));

    registry.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_rejects_further_registration() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script_path = write_script(temp.path(), MOCK_SERVER_SCRIPT)?;

    let registry = ServerRegistry::new();
    registry.shutdown().await?;

    let error = registry
        .add_server(config(&script_path, "late"))
        .await
        .expect_err("registration after shutdown should fail");
    assert!(error.to_string().contains("Registry shutting down"));
    Ok(())
}
