use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use cmh_core::{McpSession, ServerPattern};
use rquickjs::function::{Async, Opt, Rest};
use rquickjs::{Ctx, Exception, Function, Object, Value};

use crate::context::ExecState;
use crate::convert::{format_log_line, js_value_to_json, json_to_js_value};
use crate::limits::MAX_SLEEP_MS;

/// Shared pieces every `mcp.*` binding closes over.
#[derive(Clone)]
struct ApiShared {
    session: Arc<dyn McpSession>,
    state: Rc<RefCell<ExecState>>,
    max_calls: u32,
}

impl ApiShared {
    /// Pre-increment accounting for a billable method. The budget check
    /// happens before any session work, so the limit stays exact when
    /// several calls are started across await points.
    fn charge<'js>(&self, ctx: &Ctx<'js>) -> rquickjs::Result<()> {
        let count = self.state.borrow_mut().charge();
        if count > self.max_calls {
            return Err(Exception::throw_message(
                ctx,
                &format!("Maximum mcp.* call limit exceeded ({})", self.max_calls),
            ));
        }
        Ok(())
    }
}

/// Encode a serializable host value into the context via the JSON codec.
fn to_js<'js, T: serde::Serialize>(ctx: &Ctx<'js>, value: &T) -> rquickjs::Result<Value<'js>> {
    match serde_json::to_value(value) {
        Ok(json) => json_to_js_value(ctx, &json),
        Err(error) => Err(Exception::throw_message(
            ctx,
            &format!("failed to encode gateway response: {error}"),
        )),
    }
}

/// Optional user-supplied arguments object, converted to plain JSON.
fn args_to_json<'js>(ctx: &Ctx<'js>, args: &Opt<Value<'js>>) -> Option<serde_json::Value> {
    args.0
        .as_ref()
        .filter(|value| !value.is_undefined() && !value.is_null())
        .and_then(|value| js_value_to_json(ctx, value))
}

/// Build the `mcp` capability object and bind it into the context globals.
///
/// Billable methods charge the budget before contacting the session. Fan-out
/// listings enumerate connected servers matching the pattern in registration
/// order and skip servers whose enumeration fails; targeted dispatch
/// propagates backend errors to user code as thrown exceptions.
pub(crate) fn install_capability_api<'js>(
    ctx: &Ctx<'js>,
    session: Arc<dyn McpSession>,
    state: Rc<RefCell<ExecState>>,
    max_calls: u32,
) -> rquickjs::Result<()> {
    let shared = ApiShared {
        session,
        state,
        max_calls,
    };
    let mcp = Object::new(ctx.clone())?;

    let api = shared.clone();
    mcp.set(
        "listServers",
        Function::new(
            ctx.clone(),
            Async(move |ctx: Ctx<'js>| {
                let api = api.clone();
                async move {
                    api.charge(&ctx)?;
                    let servers = api.session.list_servers().await;
                    to_js(&ctx, &servers)
                }
            }),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "listTools",
        Function::new(
            ctx.clone(),
            Async(move |ctx: Ctx<'js>, pattern: Opt<String>| {
                let api = api.clone();
                async move {
                    api.charge(&ctx)?;
                    let pattern = ServerPattern::parse(pattern.0.as_deref());
                    let mut tools = Vec::new();
                    for server in api.session.list_servers().await {
                        if !server.status.is_connected() || !pattern.matches(&server.name) {
                            continue;
                        }
                        match api.session.list_tools(&server.name).await {
                            Ok(items) => tools.extend(items),
                            Err(error) => {
                                tracing::debug!(server = %server.name, error = %error, "listTools fan-out skipped server");
                            }
                        }
                    }
                    to_js(&ctx, &tools)
                }
            }),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "callTool",
        Function::new(
            ctx.clone(),
            Async(
                move |ctx: Ctx<'js>, server: String, tool: String, args: Opt<Value<'js>>| {
                    let api = api.clone();
                    async move {
                        api.charge(&ctx)?;
                        let args = args_to_json(&ctx, &args);
                        match api.session.call_tool(&server, &tool, args).await {
                            Ok(result) => json_to_js_value(&ctx, &result),
                            Err(error) => {
                                Err(Exception::throw_message(&ctx, &format!("{error:#}")))
                            }
                        }
                    }
                },
            ),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "listResources",
        Function::new(
            ctx.clone(),
            Async(move |ctx: Ctx<'js>, pattern: Opt<String>| {
                let api = api.clone();
                async move {
                    api.charge(&ctx)?;
                    let pattern = ServerPattern::parse(pattern.0.as_deref());
                    let mut resources = Vec::new();
                    for server in api.session.list_servers().await {
                        if !server.status.is_connected() || !pattern.matches(&server.name) {
                            continue;
                        }
                        match api.session.list_resources(&server.name).await {
                            Ok(items) => resources.extend(items),
                            Err(error) => {
                                tracing::debug!(server = %server.name, error = %error, "listResources fan-out skipped server");
                            }
                        }
                    }
                    to_js(&ctx, &resources)
                }
            }),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "listResourceTemplates",
        Function::new(
            ctx.clone(),
            Async(move |ctx: Ctx<'js>, pattern: Opt<String>| {
                let api = api.clone();
                async move {
                    api.charge(&ctx)?;
                    let pattern = ServerPattern::parse(pattern.0.as_deref());
                    let mut templates = Vec::new();
                    for server in api.session.list_servers().await {
                        if !server.status.is_connected() || !pattern.matches(&server.name) {
                            continue;
                        }
                        match api.session.list_resource_templates(&server.name).await {
                            Ok(items) => templates.extend(items),
                            Err(error) => {
                                tracing::debug!(server = %server.name, error = %error, "listResourceTemplates fan-out skipped server");
                            }
                        }
                    }
                    to_js(&ctx, &templates)
                }
            }),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "readResource",
        Function::new(
            ctx.clone(),
            Async(move |ctx: Ctx<'js>, server: String, uri: String| {
                let api = api.clone();
                async move {
                    api.charge(&ctx)?;
                    match api.session.read_resource(&server, &uri).await {
                        Ok(result) => json_to_js_value(&ctx, &result),
                        Err(error) => Err(Exception::throw_message(&ctx, &format!("{error:#}"))),
                    }
                }
            }),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "listPrompts",
        Function::new(
            ctx.clone(),
            Async(move |ctx: Ctx<'js>, pattern: Opt<String>| {
                let api = api.clone();
                async move {
                    api.charge(&ctx)?;
                    let pattern = ServerPattern::parse(pattern.0.as_deref());
                    let mut prompts = Vec::new();
                    for server in api.session.list_servers().await {
                        if !server.status.is_connected() || !pattern.matches(&server.name) {
                            continue;
                        }
                        match api.session.list_prompts(&server.name).await {
                            Ok(items) => prompts.extend(items),
                            Err(error) => {
                                tracing::debug!(server = %server.name, error = %error, "listPrompts fan-out skipped server");
                            }
                        }
                    }
                    to_js(&ctx, &prompts)
                }
            }),
        )?,
    )?;

    let api = shared.clone();
    mcp.set(
        "getPrompt",
        Function::new(
            ctx.clone(),
            Async(
                move |ctx: Ctx<'js>, server: String, name: String, args: Opt<Value<'js>>| {
                    let api = api.clone();
                    async move {
                        api.charge(&ctx)?;
                        let args = args_to_json(&ctx, &args);
                        match api.session.get_prompt(&server, &name, args).await {
                            Ok(result) => json_to_js_value(&ctx, &result),
                            Err(error) => {
                                Err(Exception::throw_message(&ctx, &format!("{error:#}")))
                            }
                        }
                    }
                },
            ),
        )?,
    )?;

    // Free methods: neither touches the call budget.
    mcp.set(
        "sleep",
        Function::new(
            ctx.clone(),
            Async(move |ms: f64| async move {
                let millis = ms.clamp(0.0, MAX_SLEEP_MS as f64) as u64;
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }),
        )?,
    )?;

    let api = shared;
    mcp.set(
        "log",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
                let line = format_log_line(&ctx, &args.0);
                api.state.borrow_mut().push_log(line);
            },
        )?,
    )?;

    ctx.globals().set("mcp", mcp)?;
    Ok(())
}
