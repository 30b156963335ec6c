//! Connection-level events and state seen by channel consumers.

use std::fmt;

use ustaz_core::Notification;

use crate::client::ClientError;
use crate::emitter::Emitter;
use crate::messages::{AllMarkedRead, MarkedRead, ServerError};

/// Why a live connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server sent a Close frame. Not retried by the transport on its
    /// own, so the manager reconnects straight away.
    ServerInitiated,
    /// Read/write failure or the stream ended without a Close frame.
    Transport,
    /// [`ChannelManager::disconnect`](crate::ChannelManager::disconnect)
    /// was called. Never retried.
    ClientInitiated,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisconnectReason::ServerInitiated => "server disconnect",
            DisconnectReason::Transport => "transport close",
            DisconnectReason::ClientInitiated => "client disconnect",
        })
    }
}

/// Lifecycle of the channel connection.
///
/// ```text
/// Idle -> Connecting -> Connected -> Disconnected(reason) -> Connecting -> ...
///   ^                                                           |
///   +------------------------- disconnect() --------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected(DisconnectReason),
}

/// Delivered to connect handlers once the handshake completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    /// Per-connection id, used only for log correlation.
    pub client_id: String,
}

/// Every failure reaches error handlers in this one shape, whether it was
/// an auth rejection, a network error, or a server `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelError {
    pub message: String,
}

impl ChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&ClientError> for ChannelError {
    fn from(e: &ClientError) -> Self {
        ChannelError::new(e.to_string())
    }
}

impl From<ServerError> for ChannelError {
    fn from(e: ServerError) -> Self {
        ChannelError::new(e.message)
    }
}

/// One handler list per event category the channel produces.
///
/// Cloning shares the lists.
#[derive(Clone)]
pub struct ChannelHandlers {
    pub notification: Emitter<Notification>,
    pub marked_read: Emitter<MarkedRead>,
    pub all_marked_read: Emitter<AllMarkedRead>,
    pub error: Emitter<ChannelError>,
    pub connect: Emitter<Connected>,
    pub disconnect: Emitter<DisconnectReason>,
}

impl ChannelHandlers {
    pub fn new() -> Self {
        Self {
            notification: Emitter::new("notification"),
            marked_read: Emitter::new("marked_read"),
            all_marked_read: Emitter::new("all_marked_read"),
            error: Emitter::new("error"),
            connect: Emitter::new("connect"),
            disconnect: Emitter::new("disconnect"),
        }
    }

    pub fn clear_all(&self) {
        self.notification.clear();
        self.marked_read.clear();
        self.all_marked_read.clear();
        self.error.clear();
        self.connect.clear();
        self.disconnect.clear();
    }

    /// Total handlers registered across every category.
    pub fn total(&self) -> usize {
        self.notification.len()
            + self.marked_read.len()
            + self.all_marked_read.len()
            + self.error.len()
            + self.connect.len()
            + self.disconnect.len()
    }
}

impl Default for ChannelHandlers {
    fn default() -> Self {
        Self::new()
    }
}
