use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cmh_core::GatewayError;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

/// Default lifetime of a parked host-side request.
pub(crate) const DEFAULT_PENDING_TIMEOUT_SECS: u64 = 300;

/// Kind of host-side request a backend initiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Sampling,
    Elicitation,
}

/// Operator-visible view of one parked request.
#[derive(Clone, Debug, Serialize)]
pub struct PendingRequestInfo {
    pub id: String,
    pub server: String,
    pub kind: PendingKind,
    pub params: Value,
    pub created_at: DateTime<Utc>,
}

struct PendingEntry {
    info: PendingRequestInfo,
    responder: oneshot::Sender<Result<Value, String>>,
}

/// Backend-initiated sampling and elicitation requests, keyed by generated
/// id and bounded by a per-request timeout.
///
/// A parked request resolves through exactly one of: an operator response,
/// an operator rejection, the per-request timeout, removal of its server, or
/// registry shutdown.
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<String, PendingEntry>>,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl PendingRequests {
    pub(crate) fn new(timeout: Duration, shutdown: CancellationToken) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            timeout,
            shutdown,
        }
    }

    /// Park one backend-initiated request. Returns the operator response
    /// value, or the rejection reason as the error string handed back to the
    /// backend.
    pub(crate) async fn park(
        &self,
        server: &str,
        kind: PendingKind,
        params: Value,
    ) -> Result<Value, String> {
        if self.shutdown.is_cancelled() {
            return Err(GatewayError::RegistryShutdown.to_string());
        }

        let id = Ulid::new().to_string();
        let (responder, receiver) = oneshot::channel();
        {
            let mut entries = self.entries.lock().await;
            entries.insert(
                id.clone(),
                PendingEntry {
                    info: PendingRequestInfo {
                        id: id.clone(),
                        server: server.to_string(),
                        kind,
                        params,
                        created_at: Utc::now(),
                    },
                    responder,
                },
            );
        }

        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => Err(GatewayError::RegistryShutdown.to_string()),
            () = tokio::time::sleep(self.timeout) => {
                Err(GatewayError::PendingRequestTimeout(self.timeout.as_secs()).to_string())
            }
            received = receiver => {
                received.unwrap_or_else(|_| Err(GatewayError::RegistryShutdown.to_string()))
            }
        };
        self.entries.lock().await.remove(&id);
        outcome
    }

    /// Enumerate parked requests, oldest first.
    pub(crate) async fn list(&self) -> Vec<PendingRequestInfo> {
        let entries = self.entries.lock().await;
        let mut infos: Vec<_> = entries.values().map(|entry| entry.info.clone()).collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }

    /// Deliver an operator response to a parked request.
    pub(crate) async fn respond(&self, id: &str, value: Value) -> anyhow::Result<()> {
        let entry = self
            .entries
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| GatewayError::PendingRequestNotFound(id.to_string()))?;
        let _ = entry.responder.send(Ok(value));
        Ok(())
    }

    /// Reject a parked request with a reason the backend will see.
    pub(crate) async fn reject(&self, id: &str, reason: &str) -> anyhow::Result<()> {
        let entry = self
            .entries
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| GatewayError::PendingRequestNotFound(id.to_string()))?;
        let _ = entry.responder.send(Err(reason.to_string()));
        Ok(())
    }

    /// Reject every parked request originated by one server.
    pub(crate) async fn reject_for_server(&self, server: &str) {
        let drained: Vec<PendingEntry> = {
            let mut entries = self.entries.lock().await;
            let ids: Vec<String> = entries
                .values()
                .filter(|entry| entry.info.server == server)
                .map(|entry| entry.info.id.clone())
                .collect();
            ids.iter().filter_map(|id| entries.remove(id)).collect()
        };
        let reason = GatewayError::ServerRemoved(server.to_string()).to_string();
        for entry in drained {
            let _ = entry.responder.send(Err(reason.clone()));
        }
    }
}
