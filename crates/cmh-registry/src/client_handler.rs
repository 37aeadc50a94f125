use std::sync::Arc;

use rmcp::model::{
    CreateElicitationRequestParam, CreateElicitationResult, CreateMessageRequestParam,
    CreateMessageResult, ErrorData, LoggingMessageNotificationParam, ProgressNotificationParam,
    ResourceUpdatedNotificationParam,
};
use rmcp::service::{NotificationContext, RequestContext};
use rmcp::{ClientHandler, RoleClient};

use crate::events::EventBuffers;
use crate::pending::{PendingKind, PendingRequests};

/// Client-side handler attached to each backend connection.
///
/// Notifications and log messages are buffered into the registry's drainable
/// queues; sampling and elicitation requests initiated by the backend are
/// parked in the pending store until an operator responds or the per-request
/// timeout fires.
#[derive(Clone)]
pub(crate) struct GatewayClientHandler {
    server: String,
    events: Arc<EventBuffers>,
    pending: Arc<PendingRequests>,
}

impl GatewayClientHandler {
    pub(crate) fn new(
        server: String,
        events: Arc<EventBuffers>,
        pending: Arc<PendingRequests>,
    ) -> Self {
        Self {
            server,
            events,
            pending,
        }
    }

    async fn park(&self, kind: PendingKind, params: serde_json::Value) -> Result<serde_json::Value, ErrorData> {
        self.pending
            .park(&self.server, kind, params)
            .await
            .map_err(|reason| ErrorData::internal_error(reason, None))
    }
}

impl ClientHandler for GatewayClientHandler {
    async fn create_message(
        &self,
        params: CreateMessageRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateMessageResult, ErrorData> {
        let params = serde_json::to_value(&params).unwrap_or(serde_json::Value::Null);
        let response = self.park(PendingKind::Sampling, params).await?;
        serde_json::from_value(response).map_err(|error| {
            ErrorData::internal_error(format!("invalid sampling response: {error}"), None)
        })
    }

    async fn create_elicitation(
        &self,
        params: CreateElicitationRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateElicitationResult, ErrorData> {
        let params = serde_json::to_value(&params).unwrap_or(serde_json::Value::Null);
        let response = self.park(PendingKind::Elicitation, params).await?;
        serde_json::from_value(response).map_err(|error| {
            ErrorData::internal_error(format!("invalid elicitation response: {error}"), None)
        })
    }

    async fn on_logging_message(
        &self,
        params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        let level = serde_json::to_value(params.level)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "info".to_string());
        self.events.push_log(&self.server, level, params.data).await;
    }

    async fn on_progress(
        &self,
        params: ProgressNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        self.events
            .push_notification(
                &self.server,
                "notifications/progress",
                serde_json::to_value(&params).ok(),
            )
            .await;
    }

    async fn on_resource_updated(
        &self,
        params: ResourceUpdatedNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        self.events
            .push_notification(
                &self.server,
                "notifications/resources/updated",
                serde_json::to_value(&params).ok(),
            )
            .await;
    }

    async fn on_resource_list_changed(&self, _context: NotificationContext<RoleClient>) {
        self.events
            .push_notification(&self.server, "notifications/resources/list_changed", None)
            .await;
    }

    async fn on_tool_list_changed(&self, _context: NotificationContext<RoleClient>) {
        self.events
            .push_notification(&self.server, "notifications/tools/list_changed", None)
            .await;
    }

    async fn on_prompt_list_changed(&self, _context: NotificationContext<RoleClient>) {
        self.events
            .push_notification(&self.server, "notifications/prompts/list_changed", None)
            .await;
    }
}
