use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error surface of a failed execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Error class name (`SyntaxError`, `TypeError`, plain `Error`, ...).
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub duration_ms: u64,
    /// Number of billable `mcp.*` invocations that began, including one
    /// rejected by the budget. `sleep` and `log` never count.
    pub mcp_calls: u32,
}

/// Uniform result envelope.
///
/// Every execution outcome is returned as one of these, from validation
/// failure and syntax error through timeout, budget exhaustion and success.
/// Nothing escapes the sandbox as a thrown error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Present on success: a plain JSON value, with `undefined` fulfilments
    /// normalized to null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub logs: Vec<String>,
    pub stats: ExecutionStats,
}

impl ExecutionResult {
    pub(crate) fn fulfilled(result: Value, logs: Vec<String>, stats: ExecutionStats) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            logs,
            stats,
        }
    }

    pub(crate) fn failed(error: ErrorInfo, logs: Vec<String>, stats: ExecutionStats) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            logs,
            stats,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Whether the run was terminated by the wall-clock deadline.
    pub fn is_timeout(&self) -> bool {
        !self.success
            && self
                .error
                .as_ref()
                .is_some_and(|e| e.message.contains("timed out"))
    }

    /// Whether the run exhausted its gateway-call budget.
    pub fn is_call_limit_exceeded(&self) -> bool {
        !self.success
            && self
                .error
                .as_ref()
                .is_some_and(|e| e.message.contains("call limit exceeded"))
    }
}
