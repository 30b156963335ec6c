//! Shared handle over [`NotificationState`].

use std::sync::{Arc, Mutex, MutexGuard};

use ustaz_core::Notification;

use crate::state::{NotificationAction, NotificationState};

/// Cloneable handle to one notification slice.
///
/// Push handlers run on the channel task while the UI reads from its own
/// thread; each dispatch is a single critical section, so readers never
/// observe a half-applied action.
#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    inner: Arc<Mutex<NotificationState>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state (hydration, tests).
    pub fn with_state(state: NotificationState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn dispatch(&self, action: NotificationAction) {
        tracing::trace!(action = action.name(), "Dispatching notification action");
        self.lock().reduce(action);
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> NotificationState {
        self.lock().clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&NotificationState) -> R) -> R {
        f(&self.lock())
    }

    pub fn unread_count(&self) -> u64 {
        self.lock().unread_count
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, NotificationState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
