//! Subscriber broadcast hub
//!
//! A `Broadcaster` keeps a *set* of handlers keyed by the identity of their
//! `Arc`, so subscribing the same handler twice is a no-op. Notification works
//! on a snapshot: handlers are free to subscribe, unsubscribe, or trigger
//! another notification while they run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Broadcast handler type
pub type Subscriber<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Address of the handler allocation, used as its set identity
fn handler_key<A>(handler: &Subscriber<A>) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}

/// Publish/subscribe hub with set semantics and no ordering guarantee
pub struct Broadcaster<A> {
    subscribers: Mutex<FxHashMap<usize, Subscriber<A>>>,
}

impl<A: 'static> Broadcaster<A> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(FxHashMap::default()),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, FxHashMap<usize, Subscriber<A>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a handler. Returns `false` if it was already subscribed.
    pub fn subscribe(&self, handler: Subscriber<A>) -> bool {
        let key = handler_key(&handler);
        let mut subscribers = self.subscribers();
        if subscribers.contains_key(&key) {
            return false;
        }
        subscribers.insert(key, handler);
        true
    }

    /// Remove a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, handler: &Subscriber<A>) -> bool {
        self.subscribers().remove(&handler_key(handler)).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscribers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers().is_empty()
    }

    /// Invoke every handler subscribed at the time of the call.
    ///
    /// The lock is released before any handler runs. Returns the number of
    /// handlers invoked.
    pub fn notify(&self, args: &A) -> usize {
        let snapshot: SmallVec<[Subscriber<A>; 8]> =
            self.subscribers().values().map(Arc::clone).collect();

        tracing::trace!(subscribers = snapshot.len(), "broadcast");

        for handler in &snapshot {
            handler(args);
        }
        snapshot.len()
    }
}

impl<A: 'static> Default for Broadcaster<A> {
    fn default() -> Self {
        Self::new()
    }
}
