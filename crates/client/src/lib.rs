//! `ustaz-client` library crate.
//!
//! The per-consumer [`NotificationBridge`] plus the pieces it is wired
//! from: token sources, toasts, route tracking, REST sync, and
//! configuration. The `ustaz-notify` binary entrypoint lives in `main.rs`.

pub mod auth;
pub mod bridge;
pub mod config;
pub mod route;
pub mod sync;
pub mod toast;

pub use auth::{EnvTokenStore, FileTokenStore, StaticTokenStore, TokenStore};
pub use bridge::{BridgeState, NotificationBridge};
pub use config::{ClientConfig, ConfigError};
pub use route::RouteTracker;
pub use sync::{NotificationSync, SyncError};
pub use toast::{Toaster, TracingToaster};
