//! Client-side notification state.
//!
//! [`NotificationState`] is a plain reducer: every [`NotificationAction`]
//! is applied as one synchronous transition. [`NotificationStore`] is the
//! shared handle that push handlers and the UI both dispatch through.

pub mod state;
pub mod store;

pub use state::{NotificationAction, NotificationState};
pub use store::NotificationStore;
