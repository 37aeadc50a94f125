//! JavaScript execution sandbox for the codemode hub.
//!
//! A user-supplied fragment is wrapped as the body of an async evaluable and
//! run in a throwaway QuickJS context that exposes exactly three surfaces: the
//! standard data intrinsics, a capturing `console`, and the `mcp` capability
//! object proxying to the gateway session. Wall-clock deadline, gateway-call
//! budget and code-size limit are enforced deterministically. Every outcome
//! (success, user error, timeout, budget exhaustion) is returned as an
//! [`ExecutionResult`] envelope, never thrown.

mod capability;
mod context;
mod convert;
mod envelope;
mod globals;
mod limits;
mod runtime;
mod validate;

pub use context::ExecuteOptions;
pub use envelope::{ErrorInfo, ExecutionResult, ExecutionStats};
pub use limits::{
    DEFAULT_MAX_MCP_CALLS, DEFAULT_TIMEOUT_MS, MAX_CODE_LENGTH, MAX_SLEEP_MS, MAX_TIMEOUT_MS,
    MIN_TIMEOUT_MS,
};
pub use runtime::{execute_request, execute_sandbox};
pub use validate::{ExecuteRequest, validate_code, validate_execute_request, validate_timeout};
