//! Binds the authenticated session to the notification channel.
//!
//! A [`NotificationBridge`] belongs to one UI consumer (a header bell, a
//! notifications page). While the user is authenticated it holds a channel
//! lease and one subscription per push event category, and turns push
//! events into store updates plus toasts. On logout or unmount every
//! subscription goes away in one call.

use std::sync::{Arc, Mutex, MutexGuard};

use ustaz_core::{routes, Locale, Notification};
use ustaz_realtime::events::{ChannelError, Connected};
use ustaz_realtime::messages::{AllMarkedRead, MarkedRead};
use ustaz_realtime::{ChannelLease, ChannelManager, SubscriptionSet};
use ustaz_store::{NotificationAction, NotificationStore};

use crate::auth::TokenStore;
use crate::route::RouteTracker;
use crate::toast::{generic_error_message, Toaster};

/// Lifecycle of one bridge.
///
/// ```text
/// Inactive -> Connecting -> Bound
///    ^                        |
///    +------- logout ---------+
/// ```
///
/// Reconnects happen inside the channel manager and are not visible here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeState {
    #[default]
    Inactive,
    Connecting,
    Bound,
}

/// Per-consumer link between auth state, the channel, and the store.
pub struct NotificationBridge {
    manager: Arc<ChannelManager>,
    store: NotificationStore,
    tokens: Arc<dyn TokenStore>,
    toaster: Arc<dyn Toaster>,
    route: RouteTracker,
    locale: Locale,
    muted_prefixes: Arc<[String]>,
    state: Arc<Mutex<BridgeState>>,
    lease: Option<ChannelLease>,
    subscriptions: SubscriptionSet,
}

impl NotificationBridge {
    pub fn new(
        manager: Arc<ChannelManager>,
        store: NotificationStore,
        tokens: Arc<dyn TokenStore>,
        toaster: Arc<dyn Toaster>,
    ) -> Self {
        Self {
            manager,
            store,
            tokens,
            toaster,
            route: RouteTracker::default(),
            locale: Locale::default(),
            muted_prefixes: routes::default_muted_prefixes().into(),
            state: Arc::new(Mutex::new(BridgeState::Inactive)),
            lease: None,
            subscriptions: SubscriptionSet::new(),
        }
    }

    pub fn with_route(mut self, route: RouteTracker) -> Self {
        self.route = route;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_muted_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.muted_prefixes = prefixes.into();
        self
    }

    pub fn state(&self) -> BridgeState {
        *lock_state(&self.state)
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn route(&self) -> &RouteTracker {
        &self.route
    }

    /// Follow the session's auth state.
    ///
    /// `true` activates (no-op when already active or when no token is
    /// stored). `false` tears down immediately and clears the store.
    pub async fn set_authenticated(&mut self, authenticated: bool) {
        if authenticated {
            self.activate().await;
        } else if self.lease.is_some() || !self.subscriptions.is_empty() {
            self.teardown();
            self.store.dispatch(NotificationAction::Reset);
            tracing::info!("Notification bridge deactivated on logout");
        }
    }

    /// Drop every subscription and the channel lease without touching the
    /// store. Called automatically on drop.
    pub fn unmount(&mut self) {
        self.teardown();
    }

    /// Ask the server to mark `id` read. Silent no-op while inactive.
    pub fn mark_as_read(&self, id: &str) {
        match &self.lease {
            Some(lease) => lease.manager().mark_as_read(id),
            None => tracing::debug!(notification_id = %id, "Bridge inactive, mark_as_read ignored"),
        }
    }

    /// Ask the server to mark everything read. Silent no-op while inactive.
    pub fn mark_all_as_read_socket(&self) {
        match &self.lease {
            Some(lease) => lease.manager().mark_all_as_read(),
            None => tracing::debug!("Bridge inactive, mark_all_as_read ignored"),
        }
    }

    async fn activate(&mut self) {
        if self.lease.is_some() {
            tracing::debug!("Notification bridge already active");
            return;
        }

        let token = match self.tokens.load().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("No auth token stored, notification bridge stays inactive");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read auth token, notification bridge stays inactive");
                return;
            }
        };

        // Lease first: releasing another consumer's last lease clears every
        // handler list, and must not take ours with it.
        *lock_state(&self.state) = BridgeState::Connecting;
        let lease = self.manager.acquire(&token);
        self.subscribe_all();
        // The connect event may have fired before we subscribed.
        if lease.manager().is_connected() {
            *lock_state(&self.state) = BridgeState::Bound;
        }
        self.lease = Some(lease);

        tracing::info!(handlers = self.subscriptions.len(), "Notification bridge activated");
    }

    fn subscribe_all(&mut self) {
        let manager = &self.manager;

        let on_notification = {
            let store = self.store.clone();
            let toaster = Arc::clone(&self.toaster);
            let route = self.route.clone();
            let muted = Arc::clone(&self.muted_prefixes);
            let locale = self.locale;
            move |notification: &Notification| {
                if store.contains(&notification.id) {
                    tracing::debug!(notification_id = %notification.id, "Duplicate push ignored");
                    return;
                }
                store.dispatch(NotificationAction::Add(notification.clone()));

                if route.is_muted(&muted) {
                    tracing::debug!(notification_id = %notification.id, "Toast muted on current route");
                    return;
                }
                toaster.success(notification.title.get(locale), notification.message.get(locale));
            }
        };

        let on_marked_read = {
            let store = self.store.clone();
            move |data: &MarkedRead| {
                if data.is_read {
                    store.dispatch(NotificationAction::mark_as_read(data.notification_id.clone()));
                }
            }
        };

        let on_all_marked_read = {
            let store = self.store.clone();
            move |data: &AllMarkedRead| {
                if data.success {
                    store.dispatch(NotificationAction::mark_all_as_read());
                } else {
                    tracing::warn!("Server reported mark-all-read failure, store unchanged");
                }
            }
        };

        let on_error = {
            let toaster = Arc::clone(&self.toaster);
            let locale = self.locale;
            move |error: &ChannelError| {
                let message = error.message.trim();
                if message.is_empty() {
                    toaster.error(generic_error_message(locale));
                } else {
                    toaster.error(message);
                }
            }
        };

        let on_connect = {
            let state = Arc::clone(&self.state);
            move |connected: &Connected| {
                let mut state = lock_state(&state);
                if *state == BridgeState::Connecting {
                    *state = BridgeState::Bound;
                    tracing::debug!(client_id = %connected.client_id, "Notification bridge bound");
                }
            }
        };

        self.subscriptions.extend([
            manager.on_notification(on_notification),
            manager.on_marked_read(on_marked_read),
            manager.on_all_marked_read(on_all_marked_read),
            manager.on_error(on_error),
            manager.on_connect(on_connect),
        ]);
    }

    fn teardown(&mut self) {
        self.subscriptions.dispose();
        // Releasing the last lease disconnects the channel.
        self.lease = None;
        *lock_state(&self.state) = BridgeState::Inactive;
    }
}

impl Drop for NotificationBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock_state(state: &Mutex<BridgeState>) -> MutexGuard<'_, BridgeState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
