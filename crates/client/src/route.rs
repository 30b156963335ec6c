//! Current navigation path, shared between the router and push handlers.

use std::sync::{Arc, RwLock};

use ustaz_core::routes;

/// Cloneable handle to the current route. Clones observe the same path.
#[derive(Debug, Clone)]
pub struct RouteTracker {
    current: Arc<RwLock<String>>,
}

impl RouteTracker {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub fn set(&self, path: impl Into<String>) {
        let path = path.into();
        tracing::trace!(%path, "Route changed");
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = path;
    }

    pub fn current(&self) -> String {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether the current route starts with any of `prefixes`.
    pub fn is_muted(&self, prefixes: &[String]) -> bool {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        routes::is_muted(&current, prefixes)
    }
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new("/")
    }
}
