use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cmh_core::McpSession;
use rquickjs::{
    AsyncContext, AsyncRuntime, CatchResultExt, CaughtError, Ctx, Promise, Value, async_with,
};

use crate::capability::install_capability_api;
use crate::context::{ExecState, ExecuteOptions};
use crate::convert::{format_js_value, js_value_to_json};
use crate::envelope::{ErrorInfo, ExecutionResult, ExecutionStats};
use crate::globals::{install_console, install_denied_sentinels};
use crate::limits::SANDBOX_MEMORY_LIMIT_BYTES;
use crate::validate::{ExecuteRequest, validate_code, validate_execute_request};

/// Outcome of the in-context phase, before envelope assembly.
enum Outcome {
    Fulfilled(serde_json::Value),
    /// Fulfilment value had no JSON representation; the result becomes null.
    Unserializable,
    Failed(ErrorInfo),
    TimedOut,
}

/// Full execute-tool flow: request validation first, then the sandbox.
///
/// Validation failures come back as `success=false` envelopes carrying the
/// verbatim validator message; they are not separately signalled. A request
/// timeout overrides the one in `options`.
pub async fn execute_request(
    request: &ExecuteRequest,
    session: Arc<dyn McpSession>,
    options: ExecuteOptions,
) -> ExecutionResult {
    let started = Instant::now();
    if let Some(message) = validate_execute_request(request) {
        return pre_run_failure(message, options.initial_logs, started);
    }
    let options = ExecuteOptions {
        timeout_ms: request.timeout.or(options.timeout_ms),
        ..options
    };
    execute_sandbox(&request.code, session, options).await
}

/// Run one user fragment against the session and return the envelope.
///
/// The fragment is evaluated as the body of an async arrow invocation, so a
/// `return` yields the run's result and a bare trailing expression yields
/// `undefined` (normalized to null). A fresh engine is built per run and
/// dropped with it; nothing survives between executions.
///
/// The deadline is raced against the fragment's promise and only fires at
/// suspension points; a strictly synchronous hot loop is not preempted, which
/// is why the call budget exists. The returned future is not `Send` and must
/// be driven on the current task.
pub async fn execute_sandbox(
    code: &str,
    session: Arc<dyn McpSession>,
    options: ExecuteOptions,
) -> ExecutionResult {
    let started = Instant::now();
    let timeout_ms = options.effective_timeout_ms();
    let max_calls = options.effective_max_calls();

    if let Some(message) = validate_code(code) {
        return pre_run_failure(message, options.initial_logs, started);
    }

    let runtime = match AsyncRuntime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            return pre_run_failure(
                format!("failed to initialize sandbox runtime: {error}"),
                options.initial_logs,
                started,
            );
        }
    };
    runtime.set_memory_limit(SANDBOX_MEMORY_LIMIT_BYTES).await;

    let context = match AsyncContext::full(&runtime).await {
        Ok(context) => context,
        Err(error) => {
            return pre_run_failure(
                format!("failed to initialize sandbox context: {error}"),
                options.initial_logs,
                started,
            );
        }
    };

    let source = format!("(async () => {{\n{code}\n}})()");
    let initial_logs = options.initial_logs;

    let (outcome, logs, call_count) = async_with!(context => |ctx| {
        run_in_context(&ctx, &source, session, initial_logs, timeout_ms, max_calls).await
    })
    .await;

    let stats = ExecutionStats {
        duration_ms: elapsed_ms(started),
        mcp_calls: call_count,
    };
    match outcome {
        Outcome::Fulfilled(value) => ExecutionResult::fulfilled(value, logs, stats),
        Outcome::Unserializable => {
            ExecutionResult::fulfilled(serde_json::Value::Null, logs, stats)
        }
        Outcome::Failed(error) => ExecutionResult::failed(error, logs, stats),
        Outcome::TimedOut => ExecutionResult::failed(
            ErrorInfo {
                name: "Error".to_string(),
                message: format!("Execution timed out after {timeout_ms}ms"),
                stack: None,
            },
            logs,
            stats,
        ),
    }
}

async fn run_in_context(
    ctx: &Ctx<'_>,
    source: &str,
    session: Arc<dyn McpSession>,
    initial_logs: Vec<String>,
    timeout_ms: u64,
    max_calls: u32,
) -> (Outcome, Vec<String>, u32) {
    let state = Rc::new(RefCell::new(ExecState::new(initial_logs)));

    if let Err(error) = install_globals(ctx, session, state.clone(), max_calls) {
        let outcome = Outcome::Failed(ErrorInfo {
            name: "Error".to_string(),
            message: format!("failed to prepare sandbox context: {error}"),
            stack: None,
        });
        return finish(outcome, &state);
    }

    let promise = match ctx.eval::<Promise, _>(source) {
        Ok(promise) => promise,
        Err(error) => {
            let caught = CaughtError::from_error(ctx, error);
            let outcome = Outcome::Failed(caught_to_error_info(ctx, caught));
            return finish(outcome, &state);
        }
    };

    // The deadline only wins at a suspension point; the sleep itself is the
    // host's timer, no timer primitive leaks into the context.
    let outcome = tokio::select! {
        completed = promise.into_future::<Value>() => match completed.catch(ctx) {
            Ok(value) => match js_value_to_json(ctx, &value) {
                Some(json) => Outcome::Fulfilled(json),
                None => {
                    state.borrow_mut().push_log(
                        "Execution result could not be serialized to JSON; substituting null"
                            .to_string(),
                    );
                    Outcome::Unserializable
                }
            },
            Err(caught) => Outcome::Failed(caught_to_error_info(ctx, caught)),
        },
        () = tokio::time::sleep(Duration::from_millis(timeout_ms)) => Outcome::TimedOut,
    };

    finish(outcome, &state)
}

fn install_globals(
    ctx: &Ctx<'_>,
    session: Arc<dyn McpSession>,
    state: Rc<RefCell<ExecState>>,
    max_calls: u32,
) -> rquickjs::Result<()> {
    install_denied_sentinels(ctx)?;
    install_console(ctx, state.clone())?;
    install_capability_api(ctx, session, state, max_calls)
}

fn finish(outcome: Outcome, state: &Rc<RefCell<ExecState>>) -> (Outcome, Vec<String>, u32) {
    let state = state.borrow();
    (outcome, state.logs.clone(), state.call_count)
}

fn caught_to_error_info<'js>(ctx: &Ctx<'js>, caught: CaughtError<'js>) -> ErrorInfo {
    match caught {
        CaughtError::Exception(exception) => {
            let name = exception
                .get::<_, Option<String>>("name")
                .ok()
                .flatten()
                .unwrap_or_else(|| "Error".to_string());
            let message = exception.message().unwrap_or_default();
            let stack = exception.stack();
            ErrorInfo {
                name,
                message,
                stack,
            }
        }
        CaughtError::Value(value) => ErrorInfo {
            name: "Error".to_string(),
            message: format_js_value(ctx, &value),
            stack: None,
        },
        CaughtError::Error(error) => ErrorInfo {
            name: "Error".to_string(),
            message: error.to_string(),
            stack: None,
        },
    }
}

/// Envelope for failures that never reach the user fragment (validation,
/// engine construction).
fn pre_run_failure(message: String, logs: Vec<String>, started: Instant) -> ExecutionResult {
    ExecutionResult::failed(
        ErrorInfo {
            name: "Error".to_string(),
            message,
            stack: None,
        },
        logs,
        ExecutionStats {
            duration_ms: elapsed_ms(started),
            mcp_calls: 0,
        },
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
