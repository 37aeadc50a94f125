use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use cmh_core::{
    McpSession, PromptInfo, ResourceInfo, ResourceTemplateInfo, ServerCapabilityFlags, ServerInfo,
    ServerStatus, ToolInfo,
};
use serde_json::{Value, json};

use super::{SearchKind, SearchRequest, search_capabilities};

struct FleetSession {
    servers: Vec<ServerInfo>,
    failing: Vec<String>,
}

fn server(name: &str, status: ServerStatus) -> ServerInfo {
    ServerInfo {
        name: name.to_string(),
        status,
        capabilities: ServerCapabilityFlags {
            tools: true,
            resources: true,
            prompts: true,
        },
    }
}

fn fleet() -> Arc<FleetSession> {
    Arc::new(FleetSession {
        servers: vec![
            server("weather", ServerStatus::Connected),
            server("files", ServerStatus::Connected),
            server("offline", ServerStatus::Disconnected),
        ],
        failing: vec![],
    })
}

fn request(query: &str, kind: SearchKind) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        kind,
        server: None,
        include_schemas: false,
    }
}

impl FleetSession {
    fn check(&self, name: &str) -> Result<()> {
        if self.failing.iter().any(|f| f == name) {
            return Err(anyhow!("backend '{name}' unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl McpSession for FleetSession {
    async fn list_servers(&self) -> Vec<ServerInfo> {
        self.servers.clone()
    }

    async fn has_server(&self, name: &str) -> bool {
        self.servers.iter().any(|s| s.name == name)
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolInfo>> {
        self.check(server)?;
        Ok(vec![
            ToolInfo {
                server: server.to_string(),
                name: format!("{server}_forecast"),
                description: Some("Look up the forecast".to_string()),
                input_schema: Some(json!({"type": "object"})),
            },
            ToolInfo {
                server: server.to_string(),
                name: format!("{server}_admin"),
                description: None,
                input_schema: Some(json!({"type": "object"})),
            },
        ])
    }

    async fn call_tool(&self, _server: &str, _tool: &str, _args: Option<Value>) -> Result<Value> {
        Err(anyhow!("not exercised by search"))
    }

    async fn list_resources(&self, server: &str) -> Result<Vec<ResourceInfo>> {
        self.check(server)?;
        Ok(vec![ResourceInfo {
            server: server.to_string(),
            uri: format!("mock://{server}/forecast.txt"),
            name: "daily".to_string(),
            description: None,
            mime_type: None,
        }])
    }

    async fn list_resource_templates(&self, server: &str) -> Result<Vec<ResourceTemplateInfo>> {
        self.check(server)?;
        Ok(vec![])
    }

    async fn read_resource(&self, _server: &str, _uri: &str) -> Result<Value> {
        Err(anyhow!("not exercised by search"))
    }

    async fn list_prompts(&self, server: &str) -> Result<Vec<PromptInfo>> {
        self.check(server)?;
        Ok(vec![PromptInfo {
            server: server.to_string(),
            name: "forecast_summary".to_string(),
            description: Some("Summarize the weekly forecast".to_string()),
            arguments: None,
        }])
    }

    async fn get_prompt(&self, _server: &str, _prompt: &str, _args: Option<Value>) -> Result<Value> {
        Err(anyhow!("not exercised by search"))
    }
}

#[tokio::test]
async fn all_kinds_are_grouped_and_connected_servers_only() {
    let results = search_capabilities(fleet().as_ref(), &request("forecast", SearchKind::All)).await;

    let tools = results.tools.expect("tools group");
    assert_eq!(tools.len(), 2);
    assert!(tools.iter().all(|t| t.server != "offline"));

    let resources = results.resources.expect("resources group");
    assert_eq!(resources.len(), 2);

    let prompts = results.prompts.expect("prompts group");
    assert_eq!(prompts.len(), 2);

    // No server name matches the query, so the servers group is empty.
    assert_eq!(results.servers.expect("servers group").len(), 0);
}

#[tokio::test]
async fn kind_filter_omits_other_categories() {
    let results =
        search_capabilities(fleet().as_ref(), &request("forecast", SearchKind::Tools)).await;

    assert!(results.tools.is_some());
    assert!(results.resources.is_none());
    assert!(results.prompts.is_none());
    assert!(results.servers.is_none());
}

#[tokio::test]
async fn schemas_are_omitted_unless_requested() {
    let session = fleet();
    let plain = search_capabilities(session.as_ref(), &request("forecast", SearchKind::Tools)).await;
    assert!(
        plain.tools.expect("tools group").iter().all(|t| t.input_schema.is_none())
    );

    let mut with_schemas = request("forecast", SearchKind::Tools);
    with_schemas.include_schemas = true;
    let detailed = search_capabilities(session.as_ref(), &with_schemas).await;
    assert!(
        detailed.tools.expect("tools group").iter().all(|t| t.input_schema.is_some())
    );
}

#[tokio::test]
async fn server_filter_narrows_fan_out() {
    let mut req = request("forecast", SearchKind::Tools);
    req.server = Some("weather".to_string());
    let results = search_capabilities(fleet().as_ref(), &req).await;

    let tools = results.tools.expect("tools group");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].server, "weather");
}

#[tokio::test]
async fn invalid_server_filter_falls_back_to_equality() {
    let mut req = request("forecast", SearchKind::Tools);
    req.server = Some("WEATHER[".to_string());
    let results = search_capabilities(fleet().as_ref(), &req).await;

    // No server is literally named "weather[", so nothing matches.
    assert_eq!(results.tools.expect("tools group").len(), 0);
}

#[tokio::test]
async fn invalid_query_is_escaped_and_retried() {
    let session = Arc::new(FleetSession {
        servers: vec![server("weather", ServerStatus::Connected)],
        failing: vec![],
    });

    // "dai[ly" fails to parse as a regex; after metacharacter escaping it
    // compiles and matches the literal text "dai[ly", which nothing carries.
    let req = request("dai[ly", SearchKind::Resources);
    let results = search_capabilities(session.as_ref(), &req).await;
    assert_eq!(results.resources.expect("resources group").len(), 0);
}

#[tokio::test]
async fn resource_uri_participates_in_matching() {
    let results = search_capabilities(
        fleet().as_ref(),
        &request("forecast\\.txt", SearchKind::Resources),
    )
    .await;

    assert_eq!(results.resources.expect("resources group").len(), 2);
}

#[tokio::test]
async fn server_search_matches_names_regardless_of_status() {
    let results = search_capabilities(fleet().as_ref(), &request("off.*", SearchKind::Servers)).await;

    let servers = results.servers.expect("servers group");
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name, "offline");
    assert_eq!(servers[0].status, ServerStatus::Disconnected);
}

#[tokio::test]
async fn failing_backends_are_suppressed() {
    let session = Arc::new(FleetSession {
        servers: vec![
            server("weather", ServerStatus::Connected),
            server("broken", ServerStatus::Connected),
        ],
        failing: vec!["broken".to_string()],
    });

    let results = search_capabilities(session.as_ref(), &request("forecast", SearchKind::All)).await;

    let tools = results.tools.expect("tools group");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].server, "weather");
}

#[tokio::test]
async fn query_matching_is_case_insensitive() {
    let results = search_capabilities(fleet().as_ref(), &request("FORECAST", SearchKind::Tools)).await;
    assert_eq!(results.tools.expect("tools group").len(), 2);
}

#[test]
fn request_deserializes_wire_field_names() {
    let request: SearchRequest = serde_json::from_value(json!({
        "query": "forecast",
        "type": "tools",
        "includeSchemas": true
    }))
    .unwrap();
    assert_eq!(request.kind, SearchKind::Tools);
    assert!(request.include_schemas);

    let request: SearchRequest = serde_json::from_value(json!({"query": "x"})).unwrap();
    assert_eq!(request.kind, SearchKind::All);
    assert!(!request.include_schemas);
}
