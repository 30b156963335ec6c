//! Notification channel wire messages.
//!
//! Every frame is a JSON text message shaped
//! `{"event": "<name>", "data": {...}}`. Inbound frames deserialize into
//! [`InboundEvent`]; outbound requests serialize from [`OutboundEvent`].

use serde::{Deserialize, Serialize};
use ustaz_core::types::EntityId;
use ustaz_core::Notification;

/// Events pushed by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    /// A new notification for the authenticated user.
    #[serde(rename = "new-notification")]
    NewNotification(Notification),

    /// A notification was marked read, by this session or another one.
    #[serde(rename = "notification-marked-read")]
    NotificationMarkedRead(MarkedRead),

    /// Result of a mark-all request.
    #[serde(rename = "all-notifications-marked-read")]
    AllNotificationsMarkedRead(AllMarkedRead),

    /// The server rejected a request or hit an internal failure.
    #[serde(rename = "error")]
    Error(ServerError),
}

/// Payload for `notification-marked-read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub notification_id: EntityId,
    #[serde(default = "default_true")]
    pub is_read: bool,
}

/// Payload for `all-notifications-marked-read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllMarkedRead {
    #[serde(default)]
    pub success: bool,
}

/// Payload for server `error` events.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub message: String,
    /// Optional detail; shape varies by server handler.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Requests sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    #[serde(rename = "mark-notification-read")]
    MarkNotificationRead(MarkReadRequest),

    #[serde(rename = "mark-all-notifications-read")]
    MarkAllNotificationsRead(EmptyPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: EntityId,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyPayload {}

impl OutboundEvent {
    pub fn mark_read(notification_id: impl Into<EntityId>) -> Self {
        OutboundEvent::MarkNotificationRead(MarkReadRequest {
            notification_id: notification_id.into(),
        })
    }

    pub fn mark_all_read() -> Self {
        OutboundEvent::MarkAllNotificationsRead(EmptyPayload {})
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::MarkNotificationRead(_) => "mark-notification-read",
            OutboundEvent::MarkAllNotificationsRead(_) => "mark-all-notifications-read",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn default_true() -> bool {
    true
}

/// Parse a text frame into a typed event.
///
/// Returns `Err` for malformed JSON or unknown event names. Callers
/// should log and continue.
pub fn parse_message(text: &str) -> Result<InboundEvent, serde_json::Error> {
    serde_json::from_str(text)
}
