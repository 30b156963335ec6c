//! Real-time notification channel client.
//!
//! Provides typed wire messages, the WebSocket handshake, reconnection
//! policy, a typed handler registry, the [`ChannelManager`] that owns the
//! live connection, and a REST wrapper for the notification endpoints the
//! push channel is reconciled against.

pub mod api;
pub mod client;
pub mod emitter;
pub mod events;
pub mod manager;
pub mod messages;
pub mod processor;
pub mod reconnect;

pub use api::{ListQuery, NotificationApi, NotificationApiError, NotificationPage};
pub use emitter::{Emitter, Subscription, SubscriptionSet};
pub use events::{ChannelError, ConnectionState, DisconnectReason};
pub use manager::{ChannelConfig, ChannelLease, ChannelManager};
pub use reconnect::ReconnectConfig;
