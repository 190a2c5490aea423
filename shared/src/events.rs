use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};

use crate::Version;

/// Where an applied change came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Authored through this process's write API
    Local,
    /// Received from a peer and applied by the scheduler
    Remote,
}

/// Fired when a `ReplicatedValue` changes
#[derive(Clone, Debug, PartialEq)]
pub struct ValueChanged<T> {
    pub previous: T,
    pub value: T,
    pub version: Version,
    pub origin: ChangeOrigin,
}

/// What happened to a `ReplicatedList`, with enough data to reconstruct the
/// previous state
#[derive(Clone, Debug, PartialEq)]
pub enum ListEvent<T> {
    Add { index: usize, value: T },
    Insert { index: usize, value: T },
    RemoveAt { index: usize, value: T },
    Set { index: usize, previous: T, value: T },
    Clear,
    /// The whole sequence was replaced from a snapshot
    Full,
}

/// Fired once per applied list delta
#[derive(Clone, Debug, PartialEq)]
pub struct ListChanged<T> {
    pub event: ListEvent<T>,
    pub origin: ChangeOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscriber<E> {
    key: SubscriptionKey,
    active: Arc<AtomicBool>,
    callback: Callback<E>,
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            active: self.active.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// Ordered subscriber list for one field.
///
/// Clones share the same list, so a caller may keep a handle to unsubscribe
/// later, including from inside a callback. Notification iterates over a copy
/// of the list; a subscriber removed mid-notification is not invoked again,
/// and the others are each invoked exactly once.
pub struct ChangeEventBus<E> {
    subscribers: Arc<RwLock<Vec<Subscriber<E>>>>,
    next_key: Arc<AtomicU64>,
}

impl<E> Clone for ChangeEventBus<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
            next_key: self.next_key.clone(),
        }
    }
}

impl<E> Default for ChangeEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ChangeEventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_key: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionKey
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let key = SubscriptionKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.push(Subscriber {
            key,
            active: Arc::new(AtomicBool::new(true)),
            callback: Arc::new(callback),
        });
        key
    }

    /// Returns whether the key was still subscribed
    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(position) = subscribers.iter().position(|entry| entry.key == key) else {
            return false;
        };
        let removed = subscribers.remove(position);
        removed.active.store(false, Ordering::Release);
        true
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every subscriber synchronously, in subscription order
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Subscriber<E>> = {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if subscribers.is_empty() {
                return;
            }
            subscribers.clone()
        };

        for subscriber in snapshot {
            if subscriber.active.load(Ordering::Acquire) {
                (subscriber.callback)(event);
            }
        }
    }
}
