//! Capability search across the backend fleet.
//!
//! A pure transformation over the session snapshot: fan out the requested
//! capability kinds to connected servers, keep items matching the query, and
//! shape a grouped result. Individual backend failures are suppressed; a
//! wholly failing search still returns an empty grouped result, not an error.

use cmh_core::{McpSession, PromptInfo, ResourceInfo, ServerInfo, ServerPattern, ToolInfo};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Capability kind filter; `all` expands to every category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Tools,
    Resources,
    Prompts,
    Servers,
    #[default]
    All,
}

impl SearchKind {
    fn wants_tools(self) -> bool {
        matches!(self, Self::Tools | Self::All)
    }

    fn wants_resources(self) -> bool {
        matches!(self, Self::Resources | Self::All)
    }

    fn wants_prompts(self) -> bool {
        matches!(self, Self::Prompts | Self::All)
    }

    fn wants_servers(self) -> bool {
        matches!(self, Self::Servers | Self::All)
    }
}

/// Input of the `search_capabilities` tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, rename = "type")]
    pub kind: SearchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, rename = "includeSchemas")]
    pub include_schemas: bool,
}

/// Grouped search output. Categories excluded by the kind filter are omitted
/// entirely; included categories are present even when empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<PromptInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<ServerInfo>>,
}

impl SearchResults {
    fn empty_for(kind: SearchKind) -> Self {
        Self {
            tools: kind.wants_tools().then(Vec::new),
            resources: kind.wants_resources().then(Vec::new),
            prompts: kind.wants_prompts().then(Vec::new),
            servers: kind.wants_servers().then(Vec::new),
        }
    }
}

/// Compile the query as a case-insensitive regex; on parse failure escape the
/// metacharacters and retry. `None` means even the escaped form failed.
fn compile_query(query: &str) -> Option<Regex> {
    RegexBuilder::new(query)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(query))
                .case_insensitive(true)
                .build()
        })
        .ok()
}

fn matches_any(query: &Regex, fields: &[Option<&str>]) -> bool {
    fields
        .iter()
        .flatten()
        .any(|field| query.is_match(field))
}

/// Run one search against the session snapshot.
pub async fn search_capabilities(
    session: &dyn McpSession,
    request: &SearchRequest,
) -> SearchResults {
    let mut results = SearchResults::empty_for(request.kind);
    let Some(query) = compile_query(&request.query) else {
        return results;
    };
    let server_filter = ServerPattern::parse(request.server.as_deref());

    let servers = session.list_servers().await;

    if let Some(found) = results.servers.as_mut() {
        found.extend(
            servers
                .iter()
                .filter(|s| server_filter.matches(&s.name) && query.is_match(&s.name))
                .cloned(),
        );
    }

    for server in &servers {
        if !server.status.is_connected() || !server_filter.matches(&server.name) {
            continue;
        }

        if let Some(found) = results.tools.as_mut() {
            match session.list_tools(&server.name).await {
                Ok(tools) => {
                    found.extend(tools.into_iter().filter_map(|mut tool| {
                        if !matches_any(&query, &[Some(&tool.name), tool.description.as_deref()]) {
                            return None;
                        }
                        if !request.include_schemas {
                            tool.input_schema = None;
                        }
                        Some(tool)
                    }));
                }
                Err(error) => {
                    tracing::debug!(server = %server.name, error = %error, "tool search skipped server");
                }
            }
        }

        if let Some(found) = results.resources.as_mut() {
            match session.list_resources(&server.name).await {
                Ok(resources) => {
                    found.extend(resources.into_iter().filter(|resource| {
                        matches_any(
                            &query,
                            &[
                                Some(&resource.name),
                                resource.description.as_deref(),
                                Some(&resource.uri),
                            ],
                        )
                    }));
                }
                Err(error) => {
                    tracing::debug!(server = %server.name, error = %error, "resource search skipped server");
                }
            }
        }

        if let Some(found) = results.prompts.as_mut() {
            match session.list_prompts(&server.name).await {
                Ok(prompts) => {
                    found.extend(prompts.into_iter().filter(|prompt| {
                        matches_any(&query, &[Some(&prompt.name), prompt.description.as_deref()])
                    }));
                }
                Err(error) => {
                    tracing::debug!(server = %server.name, error = %error, "prompt search skipped server");
                }
            }
        }
    }

    results
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
