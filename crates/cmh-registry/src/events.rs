use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

const MAX_BUFFERED_EVENTS: usize = 256;

/// One backend-originated notification held until drained.
#[derive(Clone, Debug, Serialize)]
pub struct NotificationEntry {
    pub server: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub received_at: DateTime<Utc>,
}

/// One backend log message held until drained.
#[derive(Clone, Debug, Serialize)]
pub struct BackendLogEntry {
    pub server: String,
    pub level: String,
    pub data: Value,
    pub received_at: DateTime<Utc>,
}

/// Bounded drainable queues for out-of-band backend traffic.
///
/// When a buffer is full the oldest entry is dropped first; draining returns
/// the snapshot and clears the buffer.
#[derive(Default)]
pub(crate) struct EventBuffers {
    notifications: Mutex<Vec<NotificationEntry>>,
    logs: Mutex<Vec<BackendLogEntry>>,
}

impl EventBuffers {
    pub(crate) async fn push_notification(&self, server: &str, method: &str, params: Option<Value>) {
        let mut buffer = self.notifications.lock().await;
        if buffer.len() >= MAX_BUFFERED_EVENTS {
            buffer.remove(0);
        }
        buffer.push(NotificationEntry {
            server: server.to_string(),
            method: method.to_string(),
            params,
            received_at: Utc::now(),
        });
    }

    pub(crate) async fn push_log(&self, server: &str, level: String, data: Value) {
        let mut buffer = self.logs.lock().await;
        if buffer.len() >= MAX_BUFFERED_EVENTS {
            buffer.remove(0);
        }
        buffer.push(BackendLogEntry {
            server: server.to_string(),
            level,
            data,
            received_at: Utc::now(),
        });
    }

    pub(crate) async fn take_notifications(&self) -> Vec<NotificationEntry> {
        std::mem::take(&mut *self.notifications.lock().await)
    }

    pub(crate) async fn take_logs(&self) -> Vec<BackendLogEntry> {
        std::mem::take(&mut *self.logs.lock().await)
    }
}
