//! REST reconciliation for the notification store.
//!
//! The push channel never replays missed events, so the list and the
//! unread count are (re)loaded from the REST API on startup and whenever
//! the UI asks for more. Mutations made here go to the server first and
//! only reach the store once the server accepted them.

use chrono::Utc;
use ustaz_realtime::{ListQuery, NotificationApi, NotificationApiError};
use ustaz_store::{NotificationAction, NotificationStore};

/// Errors from a sync operation. The store's `error` field is set too.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Notification sync failed: {0}")]
    Api(#[from] NotificationApiError),
}

/// Loads pages and counts from the REST API into a store.
#[derive(Debug, Clone)]
pub struct NotificationSync {
    api: NotificationApi,
    store: NotificationStore,
    page_limit: u32,
}

impl NotificationSync {
    pub fn new(api: NotificationApi, store: NotificationStore, page_limit: u32) -> Self {
        Self {
            api,
            store,
            page_limit: page_limit.max(1),
        }
    }

    /// Replace the store's list with page 1.
    pub async fn load_first_page(&self) -> Result<(), SyncError> {
        self.store.dispatch(NotificationAction::SetLoading(true));

        let page = self
            .api
            .list(&ListQuery::page(1, self.page_limit))
            .await
            .map_err(|e| self.fail(e))?;

        tracing::debug!(
            count = page.notifications.len(),
            total = page.pagination.total,
            unread = page.unread_count,
            "Loaded first notification page",
        );
        self.store.dispatch(NotificationAction::SetNotifications {
            notifications: page.notifications,
            pagination: page.pagination,
            unread_count: page.unread_count,
        });
        Ok(())
    }

    /// Append the next page. Returns `false` when there was nothing more.
    pub async fn load_next_page(&self) -> Result<bool, SyncError> {
        let pagination = self.store.read(|s| s.pagination);
        if !pagination.has_more() {
            return Ok(false);
        }

        self.store.dispatch(NotificationAction::SetLoading(true));
        let page = self
            .api
            .list(&ListQuery::page(pagination.page + 1, self.page_limit))
            .await
            .map_err(|e| self.fail(e))?;

        self.store.dispatch(NotificationAction::AppendPage {
            notifications: page.notifications,
            pagination: page.pagination,
        });
        Ok(true)
    }

    /// Overwrite the unread badge with the server's count.
    pub async fn refresh_unread_count(&self) -> Result<u64, SyncError> {
        let count = self.api.unread_count().await?;
        self.store.dispatch(NotificationAction::SetUnreadCount(count));
        Ok(count)
    }

    /// Mark one notification read over REST.
    pub async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
        let updated = self.api.mark_as_read(id).await?;
        let at = updated.read_at.unwrap_or_else(Utc::now);
        self.store.dispatch(NotificationAction::MarkAsRead {
            id: updated.id,
            at,
        });
        Ok(())
    }

    /// Mark every notification read over REST.
    pub async fn mark_all_as_read(&self) -> Result<(), SyncError> {
        self.api.mark_all_as_read().await?;
        self.store.dispatch(NotificationAction::mark_all_as_read());
        Ok(())
    }

    /// Delete on the server, then drop it locally.
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.api.delete(id).await?;
        self.store.dispatch(NotificationAction::Remove { id: id.to_string() });
        Ok(())
    }

    fn fail(&self, error: NotificationApiError) -> SyncError {
        tracing::warn!(error = %error, "Notification list request failed");
        self.store
            .dispatch(NotificationAction::SetError(Some(error.to_string())));
        SyncError::Api(error)
    }
}
