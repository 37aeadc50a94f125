use crate::limits::{DEFAULT_MAX_MCP_CALLS, DEFAULT_TIMEOUT_MS};

/// Caller-side knobs for one sandbox run.
///
/// Range checking of the timeout belongs to the request validator
/// ([`validate_execute_request`](crate::validate_execute_request)); the
/// runtime applies whatever deadline it is handed.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub timeout_ms: Option<u64>,
    pub max_mcp_calls: Option<u32>,
    /// Entries seeded into the log buffer ahead of any sandbox output.
    pub initial_logs: Vec<String>,
}

impl ExecuteOptions {
    pub(crate) fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub(crate) fn effective_max_calls(&self) -> u32 {
        self.max_mcp_calls.unwrap_or(DEFAULT_MAX_MCP_CALLS)
    }
}

/// Mutable per-run accounting shared between the capability bindings.
///
/// The sandbox is single-threaded cooperative, so a plain `RefCell` holds
/// this; interleavings only occur at await points, never inside a borrow.
pub(crate) struct ExecState {
    pub(crate) call_count: u32,
    pub(crate) logs: Vec<String>,
}

impl ExecState {
    pub(crate) fn new(initial_logs: Vec<String>) -> Self {
        Self {
            call_count: 0,
            logs: initial_logs,
        }
    }

    /// Pre-increment accounting for a billable call. The increment is kept
    /// even when the budget check then fails, so reported stats include the
    /// rejected attempt.
    pub(crate) fn charge(&mut self) -> u32 {
        self.call_count += 1;
        self.call_count
    }

    pub(crate) fn push_log(&mut self, line: String) {
        self.logs.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_counts_every_attempt() {
        let mut state = ExecState::new(vec![]);
        assert_eq!(state.charge(), 1);
        assert_eq!(state.charge(), 2);
        assert_eq!(state.call_count, 2);
    }

    #[test]
    fn logs_start_with_seed_entries() {
        let mut state = ExecState::new(vec!["a".into(), "b".into()]);
        state.push_log("c".into());
        assert_eq!(state.logs, vec!["a", "b", "c"]);
    }

    #[test]
    fn options_fall_back_to_defaults() {
        let options = ExecuteOptions::default();
        assert_eq!(options.effective_timeout_ms(), crate::DEFAULT_TIMEOUT_MS);
        assert_eq!(options.effective_max_calls(), crate::DEFAULT_MAX_MCP_CALLS);
    }
}
