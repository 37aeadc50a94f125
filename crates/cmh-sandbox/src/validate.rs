use serde::{Deserialize, Serialize};

use crate::limits::{MAX_CODE_LENGTH, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};

/// Input of the `execute_code` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    /// Wall-clock deadline in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Pre-flight check on user code.
///
/// Returns the message for the failure envelope, or `None` when acceptable.
pub fn validate_code(code: &str) -> Option<String> {
    if code.trim().is_empty() {
        return Some("Code cannot be empty".to_string());
    }
    if code.len() > MAX_CODE_LENGTH {
        return Some(format!(
            "Code exceeds maximum length of {MAX_CODE_LENGTH} characters"
        ));
    }
    None
}

/// Pre-flight check on a caller-supplied timeout. A missing timeout is
/// acceptable (the default applies).
pub fn validate_timeout(timeout_ms: Option<u64>) -> Option<String> {
    match timeout_ms {
        None => None,
        Some(t) if t < MIN_TIMEOUT_MS => {
            Some(format!("Timeout must be at least {MIN_TIMEOUT_MS}ms"))
        }
        Some(t) if t > MAX_TIMEOUT_MS => Some(format!("Timeout cannot exceed {MAX_TIMEOUT_MS}ms")),
        Some(_) => None,
    }
}

/// Composed request validation; the code check runs first.
pub fn validate_execute_request(request: &ExecuteRequest) -> Option<String> {
    validate_code(&request.code).or_else(|| validate_timeout(request.timeout))
}
