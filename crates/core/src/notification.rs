//! The server-defined notification payload.
//!
//! Notifications arrive either as `new-notification` push events or as
//! pages from the REST list endpoint. Both use the same JSON shape:
//!
//! ```json
//! {
//!   "_id": "65f1c0...",
//!   "userId": "65a9...",
//!   "type": "booking_approved",
//!   "title": { "ar": "...", "en": "..." },
//!   "message": { "ar": "...", "en": "..." },
//!   "relatedId": "65b2...",
//!   "relatedModel": "Booking",
//!   "isRead": false,
//!   "readAt": null,
//!   "createdAt": "2026-01-05T10:00:00.000Z"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::locale::LocalizedText;
use crate::types::{EntityId, Timestamp};

/// What a notification is about.
///
/// Only used to choose an icon; no client logic branches on it. Kinds
/// this client does not know yet deserialize as [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CourseApproved,
    CourseRejected,
    LessonBooked,
    BookingApproved,
    BookingRejected,
    MessageReceived,
    ConsultationRequest,
    ConsultationResponse,
    ResearchPublished,
    AdvertisementApproved,
    PaymentReceived,
    General,
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    /// Icon name shown next to the notification.
    pub fn icon(self) -> &'static str {
        match self {
            NotificationKind::CourseApproved | NotificationKind::AdvertisementApproved => {
                "check-circle"
            }
            NotificationKind::CourseRejected | NotificationKind::BookingRejected => "x-circle",
            NotificationKind::LessonBooked | NotificationKind::BookingApproved => "calendar",
            NotificationKind::MessageReceived => "message",
            NotificationKind::ConsultationRequest | NotificationKind::ConsultationResponse => {
                "help-circle"
            }
            NotificationKind::ResearchPublished => "book-open",
            NotificationKind::PaymentReceived => "credit-card",
            NotificationKind::General | NotificationKind::Unknown => "bell",
        }
    }
}

/// Reference to the entity a notification points at (for deep links).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedEntity {
    /// Model name, e.g. `"Course"` or `"Booking"`.
    pub entity_type: String,
    pub entity_id: EntityId,
}

/// A single notification as the client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: EntityId,

    /// Owner. The channel is already scoped to the authenticated user, so
    /// this is never used for filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,

    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub title: LocalizedText,

    pub message: LocalizedText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_model: Option<String>,

    #[serde(default)]
    pub is_read: bool,

    #[serde(default)]
    pub read_at: Option<Timestamp>,

    pub created_at: Timestamp,
}

impl Notification {
    /// The related entity, when both halves of the reference are present.
    pub fn related(&self) -> Option<RelatedEntity> {
        match (&self.related_model, &self.related_id) {
            (Some(entity_type), Some(entity_id)) => Some(RelatedEntity {
                entity_type: entity_type.clone(),
                entity_id: entity_id.clone(),
            }),
            _ => None,
        }
    }

    /// Flip to read, stamping `at` unless a read time is already recorded.
    ///
    /// Returns `true` if the notification was unread before the call.
    pub fn mark_read(&mut self, at: Timestamp) -> bool {
        let was_unread = !self.is_read;
        self.is_read = true;
        if self.read_at.is_none() {
            self.read_at = Some(at);
        }
        was_unread
    }
}
