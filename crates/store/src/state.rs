//! Notification slice state and its reducer.

use chrono::Utc;
use ustaz_core::types::{EntityId, Timestamp};
use ustaz_core::{Notification, Pagination};

/// Everything the client knows about the user's notifications.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    /// Newest first. Ids are unique.
    pub notifications: Vec<Notification>,
    /// Server-wide unread count; covers pages that are not loaded.
    pub unread_count: u64,
    pub pagination: Pagination,
    pub loading: bool,
    pub error: Option<String>,
}

/// A single state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    /// Replace the list with a freshly fetched first page.
    SetNotifications {
        notifications: Vec<Notification>,
        pagination: Pagination,
        unread_count: u64,
    },
    /// Append a further page, skipping ids already present.
    AppendPage {
        notifications: Vec<Notification>,
        pagination: Pagination,
    },
    /// Insert a pushed notification at the top. No-op if the id is known.
    Add(Notification),
    MarkAsRead { id: EntityId, at: Timestamp },
    MarkAllAsRead { at: Timestamp },
    Remove { id: EntityId },
    SetUnreadCount(u64),
    SetLoading(bool),
    SetError(Option<String>),
    /// Drop everything, e.g. on logout.
    Reset,
}

impl NotificationAction {
    pub fn mark_as_read(id: impl Into<EntityId>) -> Self {
        NotificationAction::MarkAsRead {
            id: id.into(),
            at: Utc::now(),
        }
    }

    pub fn mark_all_as_read() -> Self {
        NotificationAction::MarkAllAsRead { at: Utc::now() }
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            NotificationAction::SetNotifications { .. } => "set_notifications",
            NotificationAction::AppendPage { .. } => "append_page",
            NotificationAction::Add(_) => "add",
            NotificationAction::MarkAsRead { .. } => "mark_as_read",
            NotificationAction::MarkAllAsRead { .. } => "mark_all_as_read",
            NotificationAction::Remove { .. } => "remove",
            NotificationAction::SetUnreadCount(_) => "set_unread_count",
            NotificationAction::SetLoading(_) => "set_loading",
            NotificationAction::SetError(_) => "set_error",
            NotificationAction::Reset => "reset",
        }
    }
}

impl NotificationState {
    /// Apply `action` in place.
    pub fn reduce(&mut self, action: NotificationAction) {
        match action {
            NotificationAction::SetNotifications {
                notifications,
                pagination,
                unread_count,
            } => {
                self.notifications.clear();
                self.extend_unique(notifications);
                self.pagination = pagination;
                self.unread_count = unread_count;
                self.loading = false;
                self.error = None;
            }
            NotificationAction::AppendPage {
                notifications,
                pagination,
            } => {
                self.extend_unique(notifications);
                self.pagination = pagination;
                self.loading = false;
                self.error = None;
            }
            NotificationAction::Add(notification) => {
                if self.contains(&notification.id) {
                    return;
                }
                if !notification.is_read {
                    self.unread_count += 1;
                }
                self.pagination.total += 1;
                self.notifications.insert(0, notification);
            }
            NotificationAction::MarkAsRead { id, at } => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
                    if n.mark_read(at) {
                        self.unread_count = self.unread_count.saturating_sub(1);
                    }
                }
            }
            NotificationAction::MarkAllAsRead { at } => {
                for n in &mut self.notifications {
                    n.mark_read(at);
                }
                self.unread_count = 0;
            }
            NotificationAction::Remove { id } => {
                if let Some(pos) = self.notifications.iter().position(|n| n.id == id) {
                    let removed = self.notifications.remove(pos);
                    if !removed.is_read {
                        self.unread_count = self.unread_count.saturating_sub(1);
                    }
                    self.pagination.total = self.pagination.total.saturating_sub(1);
                }
            }
            NotificationAction::SetUnreadCount(count) => {
                self.unread_count = count;
            }
            NotificationAction::SetLoading(loading) => {
                self.loading = loading;
                if loading {
                    self.error = None;
                }
            }
            NotificationAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            NotificationAction::Reset => {
                *self = NotificationState::default();
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Notifications in the list that are still unread.
    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.is_read)
    }

    fn extend_unique(&mut self, incoming: Vec<Notification>) {
        for n in incoming {
            if !self.contains(&n.id) {
                self.notifications.push(n);
            }
        }
    }
}
