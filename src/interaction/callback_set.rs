//! Key-deduplicated, ordered callback collections.
//!
//! A [`CallbackSet`] holds callbacks in registration order. Keys are compared
//! structurally (`PartialEq`), so two subscribers that build equal keys share
//! one slot and the later registration replaces the earlier one in place.
//!
//! Broadcasting iterates over a snapshot taken when the broadcast starts.
//! Callbacks may add or remove entries (including themselves) while running;
//! those changes apply to the next broadcast, never to the one in flight. A
//! callback removed mid-broadcast therefore still receives that broadcast.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Error type a callback may return.
pub type CallbackError = Box<dyn std::error::Error>;

/// Return type of every callback.
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Structural callback key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallbackKey {
    /// Named subscriber.
    Text(String),
    /// Numeric subscriber id.
    Id(u64),
    /// Several parts compared element-wise.
    Composite(Vec<CallbackKey>),
}

impl CallbackKey {
    /// Build a composite key.
    #[must_use]
    pub fn composite(parts: impl IntoIterator<Item = CallbackKey>) -> Self {
        CallbackKey::Composite(parts.into_iter().collect())
    }
}

impl From<&str> for CallbackKey {
    fn from(s: &str) -> Self {
        CallbackKey::Text(s.to_string())
    }
}

impl From<String> for CallbackKey {
    fn from(s: String) -> Self {
        CallbackKey::Text(s)
    }
}

impl From<u64> for CallbackKey {
    fn from(id: u64) -> Self {
        CallbackKey::Id(id)
    }
}

/// A callback that failed during a broadcast.
#[derive(Debug)]
pub struct CallbackFailure<K> {
    /// Key of the failing callback.
    pub key: K,
    /// What it returned.
    pub error: CallbackError,
}

/// Outcome of one broadcast.
#[derive(Debug)]
pub struct BroadcastReport<K> {
    /// Callbacks invoked (successful or not).
    pub delivered: usize,
    /// Failures in invocation order.
    pub failures: Vec<CallbackFailure<K>>,
}

impl<K> Default for BroadcastReport<K> {
    fn default() -> Self {
        Self { delivered: 0, failures: Vec::new() }
    }
}

impl<K> BroadcastReport<K> {
    /// True when no callback failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Surface failures as an error, or the delivered count.
    pub fn into_result(self) -> Result<usize> {
        match self.failures.first() {
            None => Ok(self.delivered),
            Some(first) => Err(Error::Broadcast { failed: self.failures.len(), first: first.error.to_string() }),
        }
    }
}

/// Ordered callbacks deduplicated by structural key equality.
pub struct CallbackSet<K, F: ?Sized> {
    entries: RefCell<Vec<(K, Rc<F>)>>,
}

impl<K, F: ?Sized> Default for CallbackSet<K, F> {
    fn default() -> Self {
        Self { entries: RefCell::new(Vec::new()) }
    }
}

impl<K: fmt::Debug, F: ?Sized> fmt::Debug for CallbackSet<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        f.debug_struct("CallbackSet").field("keys", &entries.iter().map(|(k, _)| k).collect::<Vec<_>>()).finish()
    }
}

impl<K: PartialEq + Clone + fmt::Debug, F: ?Sized> CallbackSet<K, F> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `key`, replacing an equal key in place.
    pub fn add(&self, key: K, callback: Rc<F>) {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = callback,
            None => entries.push((key, callback)),
        }
    }

    /// Register or, with `None`, remove.
    pub fn set(&self, key: K, callback: Option<Rc<F>>) {
        match callback {
            Some(callback) => self.add(key, callback),
            None => {
                self.remove(&key);
            }
        }
    }

    /// Remove the entry with an equal key. Returns whether one existed.
    pub fn remove(&self, key: &K) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        entries.len() != before
    }

    /// True if an entry with an equal key exists.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.borrow().iter().any(|(k, _)| k == key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Keys in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.entries.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Invoke every callback in registration order.
    ///
    /// `invoke` receives each callback and supplies the arguments. A failing
    /// callback is logged and recorded; the remaining callbacks still run.
    pub fn call_all(&self, mut invoke: impl FnMut(&F) -> CallbackResult) -> BroadcastReport<K> {
        let snapshot: Vec<(K, Rc<F>)> =
            self.entries.borrow().iter().map(|(k, cb)| (k.clone(), Rc::clone(cb))).collect();

        let mut report = BroadcastReport::default();
        for (key, callback) in snapshot {
            report.delivered += 1;
            if let Err(error) = invoke(&callback) {
                log::warn!("callback {key:?} failed: {error}");
                report.failures.push(CallbackFailure { key, error });
            }
        }
        report
    }
}
