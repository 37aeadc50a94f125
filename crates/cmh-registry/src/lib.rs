//! Backend server registry for the codemode hub.
//!
//! Holds one connection worker per configured MCP server, multiplexes
//! enumeration and invocation over per-server FIFO queues, buffers
//! out-of-band backend traffic, and parks backend-initiated sampling and
//! elicitation requests until an operator responds.

mod client_handler;
mod events;
mod pending;
mod registry;

pub use events::{BackendLogEntry, NotificationEntry};
pub use pending::{PendingKind, PendingRequestInfo};
pub use registry::ServerRegistry;
