//! Typed handler lists with handle-based unsubscription.
//!
//! An [`Emitter<T>`] keeps an ordered list of `Fn(&T)` handlers. Each
//! registration returns a [`Subscription`]; dropping it (or calling
//! [`Subscription::unsubscribe`]) removes exactly that handler, whatever
//! else was registered or removed in the meantime. A consumer that
//! registers several handlers collects them in a [`SubscriptionSet`] and
//! disposes all of them in one call.
//!
//! Once `unsubscribe` returns, the handler is never started again, even by
//! an `emit` already in progress on another thread. A call that had already
//! started is allowed to finish.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Identity of one registered handler.
pub type SubscriberId = u64;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Ordered list of handlers for one event category.
pub struct Emitter<T> {
    inner: Arc<HandlerList<T>>,
}

struct HandlerList<T> {
    name: &'static str,
    handlers: Mutex<Vec<Entry<T>>>,
}

struct Entry<T> {
    id: SubscriberId,
    /// Cleared on removal; checked right before every call.
    active: Arc<AtomicBool>,
    handler: Handler<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Arc::clone(&self.active),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Type-erased removal so a [`Subscription`] need not carry `T`.
trait Unregister: Send + Sync {
    fn unregister(&self, id: SubscriberId) -> bool;
}

impl<T> HandlerList<T> {
    fn lock(&self) -> MutexGuard<'_, Vec<Entry<T>>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> Unregister for HandlerList<T> {
    fn unregister(&self, id: SubscriberId) -> bool {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|entry| {
            if entry.id == id {
                entry.active.store(false, Ordering::SeqCst);
                false
            } else {
                true
            }
        });
        let removed = handlers.len() != before;
        if removed {
            tracing::trace!(emitter = self.name, subscriber = id, "Handler removed");
        }
        removed
    }
}

impl<T: 'static> Emitter<T> {
    /// `name` only appears in log fields.
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(HandlerList {
                name,
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Append `handler` to the list.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().push(Entry {
            id,
            active: Arc::new(AtomicBool::new(true)),
            handler: Arc::new(handler),
        });
        tracing::trace!(emitter = self.inner.name, subscriber = id, "Handler added");

        let registry: Arc<dyn Unregister> = self.inner.clone();
        Subscription {
            id,
            registry: Some(Arc::downgrade(&registry)),
        }
    }

    /// Invoke every handler in registration order. Returns how many ran.
    ///
    /// Handlers run outside the list lock against a snapshot, so a handler
    /// may subscribe or unsubscribe without deadlocking. Handlers added
    /// during the call wait for the next emit; handlers removed during the
    /// call are skipped.
    pub fn emit(&self, event: &T) -> usize {
        let snapshot: Vec<Entry<T>> = self.inner.lock().clone();
        let mut ran = 0;
        for entry in &snapshot {
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }
            (entry.handler)(event);
            ran += 1;
        }
        ran
    }

    /// Drop every handler. Outstanding [`Subscription`]s become no-ops.
    pub fn clear(&self) {
        let mut handlers = self.inner.lock();
        if !handlers.is_empty() {
            tracing::debug!(emitter = self.inner.name, count = handlers.len(), "Clearing handlers");
        }
        for entry in handlers.drain(..) {
            entry.active.store(false, Ordering::SeqCst);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Handle to one registered handler. Removes it on drop.
#[must_use = "dropping a Subscription unsubscribes the handler immediately"]
pub struct Subscription {
    id: SubscriberId,
    registry: Option<Weak<dyn Unregister>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the handler now. Returns `false` if it was already gone
    /// (e.g. the emitter was cleared).
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        match self.registry.take().and_then(|weak| weak.upgrade()) {
            Some(registry) => registry.unregister(self.id),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.registry.is_some())
            .finish()
    }
}

/// All subscriptions owned by one consumer.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribe everything in this set.
    pub fn dispose(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

impl FromIterator<Subscription> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            subscriptions: iter.into_iter().collect(),
        }
    }
}
