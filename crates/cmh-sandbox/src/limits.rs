/// Maximum accepted source length in bytes.
pub const MAX_CODE_LENGTH: usize = 100_000;

/// Lower bound for a caller-supplied execution timeout.
pub const MIN_TIMEOUT_MS: u64 = 1_000;

/// Upper bound for a caller-supplied execution timeout.
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Deadline applied when the caller does not supply a timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Gateway-call budget applied when the caller does not supply one.
pub const DEFAULT_MAX_MCP_CALLS: u32 = 100;

/// Upper clamp for `mcp.sleep` delays.
pub const MAX_SLEEP_MS: u64 = 5_000;

/// Heap ceiling for one sandbox run.
pub(crate) const SANDBOX_MEMORY_LIMIT_BYTES: usize = 64 * 1024 * 1024;
