//! Notification channel manager.
//!
//! [`ChannelManager`] owns at most one live connection to the backend's
//! notification channel and fans its events out to typed handler lists.
//! It is constructed once by the application root and handed to
//! consumers as an `Arc`; there is no global instance.
//!
//! Connecting spawns a single task (connect -> process -> reconnect loop)
//! that runs until [`ChannelManager::disconnect`] is called or the manager
//! is dropped. Connection failures never surface to the caller; they reach
//! the error handlers while the task keeps retrying.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use ustaz_core::Notification;

use crate::client::ChannelClient;
use crate::emitter::Subscription;
use crate::events::{ChannelError, ChannelHandlers, Connected, ConnectionState, DisconnectReason};
use crate::messages::{AllMarkedRead, MarkedRead, OutboundEvent};
use crate::processor::run_session;
use crate::reconnect::{delay_after, Backoff, ReconnectConfig};

/// Endpoint and retry settings for a [`ChannelManager`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket endpoint, e.g. `wss://api.example.com/ws/notifications`.
    pub ws_url: String,
    pub reconnect: ReconnectConfig,
}

impl ChannelConfig {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Owns the notification channel connection and its handler lists.
pub struct ChannelManager {
    client: Arc<ChannelClient>,
    reconnect: ReconnectConfig,
    shared: Arc<Shared>,
    /// Live consumers holding a [`ChannelLease`].
    leases: Mutex<usize>,
    next_generation: AtomicU64,
    /// Parent of every connection task's token; cancelled on drop.
    cancel: CancellationToken,
}

/// State reachable from the connection task.
struct Shared {
    handlers: ChannelHandlers,
    state_tx: watch::Sender<ConnectionState>,
    active: Mutex<Option<ActiveConnection>>,
}

/// Bookkeeping for the running connection task.
struct ActiveConnection {
    /// Distinguishes this task from ones already torn down.
    generation: u64,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl Shared {
    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveConnection>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish `state` only if `generation` is still the active task.
    fn set_state(&self, generation: u64, state: ConnectionState) -> bool {
        let active = self.lock_active();
        match active.as_ref() {
            Some(conn) if conn.generation == generation => {
                self.state_tx.send_replace(state);
                true
            }
            _ => false,
        }
    }
}

impl ChannelManager {
    pub fn new(config: ChannelConfig) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Arc::new(Self {
            client: Arc::new(ChannelClient::new(config.ws_url)),
            reconnect: config.reconnect,
            shared: Arc::new(Shared {
                handlers: ChannelHandlers::new(),
                state_tx,
                active: Mutex::new(None),
            }),
            leases: Mutex::new(0),
            next_generation: AtomicU64::new(1),
            cancel: CancellationToken::new(),
        })
    }

    /// Open the channel with `token`, unless it is already open or opening.
    ///
    /// Must be called from within a Tokio runtime. Returns immediately;
    /// watch [`state`](Self::state) or register an
    /// [`on_connect`](Self::on_connect) handler to learn when the
    /// handshake completes.
    pub fn connect(&self, token: &str) {
        let mut active = self.shared.lock_active();
        if let Some(conn) = active.as_ref() {
            if !conn.task.is_finished() {
                tracing::info!("Notification channel already connected, ignoring connect");
                return;
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = self.cancel.child_token();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        self.shared.state_tx.send_replace(ConnectionState::Connecting);

        let task = tokio::spawn(run_connection_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.client),
            token.to_string(),
            self.reconnect.clone(),
            generation,
            outbound_rx,
            cancel.clone(),
        ));

        *active = Some(ActiveConnection {
            generation,
            outbound: outbound_tx,
            cancel,
            task,
        });

        tracing::info!(generation, url = %self.client.ws_url(), "Notification channel connecting");
    }

    /// Tear down the connection and clear every handler list.
    pub fn disconnect(&self) {
        let previous = {
            let mut active = self.shared.lock_active();
            let previous = active.take();
            self.shared.state_tx.send_replace(ConnectionState::Idle);
            previous
        };

        match previous {
            Some(conn) => {
                conn.cancel.cancel();
                self.shared
                    .handlers
                    .disconnect
                    .emit(&DisconnectReason::ClientInitiated);
                tracing::info!(generation = conn.generation, "Notification channel disconnected");
            }
            None => {
                tracing::debug!("Disconnect called with no active channel");
            }
        }

        self.shared.handlers.clear_all();
    }

    /// Register as a consumer and make sure the channel is open.
    ///
    /// The channel stays up while at least one lease is alive; dropping
    /// the last one disconnects. The lease count is held locked across the
    /// connect and the final disconnect, so a concurrent acquire either
    /// keeps the old connection alive or opens a fresh one after the
    /// teardown. Disconnect handlers must not acquire or drop leases.
    pub fn acquire(self: &Arc<Self>, token: &str) -> ChannelLease {
        let mut leases = self.lock_leases();
        *leases += 1;
        tracing::debug!(leases = *leases, "Channel lease acquired");
        self.connect(token);
        drop(leases);

        ChannelLease {
            manager: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut leases = self.lock_leases();
        *leases = leases.saturating_sub(1);
        tracing::debug!(leases = *leases, "Channel lease released");
        if *leases == 0 {
            self.disconnect();
        }
    }

    pub fn lease_count(&self) -> usize {
        *self.lock_leases()
    }

    /// Ask the server to mark one notification read.
    ///
    /// Fire-and-forget: when the channel is not connected this logs and
    /// does nothing. The next list fetch reconciles.
    pub fn mark_as_read(&self, notification_id: &str) {
        self.send(OutboundEvent::mark_read(notification_id));
    }

    /// Ask the server to mark every notification read. Same delivery rules
    /// as [`mark_as_read`](Self::mark_as_read).
    pub fn mark_all_as_read(&self) {
        self.send(OutboundEvent::mark_all_read());
    }

    fn send(&self, event: OutboundEvent) {
        if !self.is_connected() {
            tracing::warn!(event = event.name(), "Notification channel not connected, dropping request");
            return;
        }
        let active = self.shared.lock_active();
        match active.as_ref() {
            Some(conn) => {
                if conn.outbound.send(event).is_err() {
                    tracing::warn!("Notification channel task has exited, dropping request");
                }
            }
            None => {
                tracing::warn!(event = event.name(), "Notification channel not connected, dropping request");
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.shared.state_tx.borrow(), ConnectionState::Connected)
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Handler lists, for publishing events in-process.
    pub fn handlers(&self) -> &ChannelHandlers {
        &self.shared.handlers
    }

    /// Total handlers registered across every category.
    pub fn handler_count(&self) -> usize {
        self.shared.handlers.total()
    }

    pub fn on_notification<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.shared.handlers.notification.subscribe(handler)
    }

    pub fn on_marked_read<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&MarkedRead) + Send + Sync + 'static,
    {
        self.shared.handlers.marked_read.subscribe(handler)
    }

    pub fn on_all_marked_read<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&AllMarkedRead) + Send + Sync + 'static,
    {
        self.shared.handlers.all_marked_read.subscribe(handler)
    }

    pub fn on_error<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChannelError) + Send + Sync + 'static,
    {
        self.shared.handlers.error.subscribe(handler)
    }

    pub fn on_connect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Connected) + Send + Sync + 'static,
    {
        self.shared.handlers.connect.subscribe(handler)
    }

    pub fn on_disconnect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&DisconnectReason) + Send + Sync + 'static,
    {
        self.shared.handlers.disconnect.subscribe(handler)
    }

    fn lock_leases(&self) -> MutexGuard<'_, usize> {
        self.leases.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Keeps the channel open for one consumer. Released on drop.
pub struct ChannelLease {
    manager: Arc<ChannelManager>,
}

impl ChannelLease {
    pub fn manager(&self) -> &Arc<ChannelManager> {
        &self.manager
    }
}

impl Drop for ChannelLease {
    fn drop(&mut self) {
        self.manager.release();
    }
}

/// Core connection loop: connect -> process frames -> reconnect.
///
/// Runs until `cancel` is triggered.
async fn run_connection_loop(
    shared: Arc<Shared>,
    client: Arc<ChannelClient>,
    token: String,
    reconnect: ReconnectConfig,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    cancel: CancellationToken,
) {
    let mut backoff = Backoff::new(reconnect);

    loop {
        shared.set_state(generation, ConnectionState::Connecting);

        let attempt = tokio::select! {
            _ = cancel.cancelled() => return,
            result = client.connect(&token) => result,
        };

        let delay = match attempt {
            Ok(conn) => {
                // Requests made while we were down are not replayed.
                while outbound.try_recv().is_ok() {}

                shared.set_state(generation, ConnectionState::Connected);
                shared.handlers.connect.emit(&Connected {
                    client_id: conn.client_id.clone(),
                });

                let started = Instant::now();
                let reason = run_session(conn.ws_stream, &shared.handlers, &mut outbound, &cancel).await;
                if reason == DisconnectReason::ClientInitiated || cancel.is_cancelled() {
                    return;
                }

                tracing::info!(client_id = %conn.client_id, %reason, "Notification channel dropped");
                shared.set_state(generation, ConnectionState::Disconnected(reason));
                shared.handlers.disconnect.emit(&reason);

                if started.elapsed() >= backoff.config().max_delay {
                    backoff.reset();
                }
                match delay_after(reason, &mut backoff) {
                    Some(delay) => delay,
                    None => return,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    attempt = backoff.attempts() + 1,
                    "Notification channel connect failed",
                );
                shared.set_state(generation, ConnectionState::Disconnected(DisconnectReason::Transport));
                shared.handlers.error.emit(&ChannelError::from(&e));
                backoff.next()
            }
        };

        if !delay.is_zero() {
            tracing::info!(delay_ms = delay.as_millis() as u64, "Reconnecting to notification channel");
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
