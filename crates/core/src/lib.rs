//! Shared domain types for the Ustaz notification client.
//!
//! Everything here is plain data: the server-defined [`Notification`]
//! payload, its bilingual text, and the route constants the bridge uses to
//! decide when a toast would be noise.

pub mod error;
pub mod locale;
pub mod notification;
pub mod pagination;
pub mod routes;
pub mod types;

pub use locale::{Locale, LocalizedText};
pub use notification::{Notification, NotificationKind, RelatedEntity};
pub use pagination::Pagination;
