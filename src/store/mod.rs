//! Reactive store for the active filter set.
//!
//! The store owns the one live [`FilterParams`] of a session and is the only
//! place it changes. Readers get an immutable `Arc` snapshot, so iterating over
//! it can never observe a later mutation. Every committed change bumps the
//! store generation and is announced exactly once on a broadcast channel for
//! async consumers and synchronously to the registered listeners, in
//! subscription order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::params::FilterParams;

/// Capacity of the broadcast channel used by [`FilterStore::changes`].
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// What caused a committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeCause {
    /// The whole map was replaced (hydration or navigation).
    Replaced,
    /// A single key was set.
    Set(String),
    /// A single key was removed.
    Removed(String),
}

/// Notification delivered after every committed change.
#[derive(Debug, Clone)]
pub struct FilterChange {
    /// Store generation produced by this change.
    pub generation: u64,
    /// Snapshot of the filters after the change.
    pub params: Arc<FilterParams>,
    pub cause: ChangeCause,
}

type Callback = dyn Fn(&FilterChange) + Send + Sync;

struct ListenerEntry {
    id: u64,
    active: AtomicBool,
    callback: Box<Callback>,
}

type ListenerList = Mutex<Vec<Arc<ListenerEntry>>>;

struct Snapshot {
    params: Arc<FilterParams>,
    generation: u64,
}

/// Single source of truth for the active filters.
pub struct FilterStore {
    state: RwLock<Snapshot>,
    /// Serializes commits so generations and notifications stay in order.
    commit_lock: Mutex<()>,
    listeners: Arc<ListenerList>,
    next_listener_id: AtomicU64,
    sender: broadcast::Sender<FilterChange>,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("FilterStore")
            .field("params", &state.params)
            .field("generation", &state.generation)
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl FilterStore {
    /// Create a store holding an empty filter set at generation 0.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(Snapshot {
                params: Arc::new(FilterParams::new()),
                generation: 0,
            }),
            commit_lock: Mutex::new(()),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(1),
            sender,
        }
    }

    /// Current filters. The snapshot never changes after it is returned.
    pub fn get_params(&self) -> Arc<FilterParams> {
        Arc::clone(&self.state.read().params)
    }

    /// Current values for a single key.
    pub fn get_param(&self, key: &str) -> Option<Vec<String>> {
        self.state.read().params.get(key).map(<[String]>::to_vec)
    }

    /// Number of committed changes so far.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Replace the whole filter set. Listeners are notified once.
    pub fn set_all_params(&self, params: FilterParams) {
        self.commit(ChangeCause::Replaced, |_| params);
    }

    /// Set the values of one key. An empty value list removes the key.
    pub fn set_param<I, V>(&self, key: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        self.commit(ChangeCause::Set(key.to_string()), |current| {
            let mut next = current.clone();
            next.set(key, values);
            next
        });
    }

    /// Remove one key.
    pub fn remove_param(&self, key: &str) {
        self.commit(ChangeCause::Removed(key.to_string()), |current| {
            let mut next = current.clone();
            next.remove(key);
            next
        });
    }

    /// Register a listener invoked after every committed change.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FilterChange) + Send + Sync + 'static,
    {
        let entry = Arc::new(ListenerEntry {
            id: self.next_listener_id.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            callback: Box::new(listener),
        });
        self.listeners.lock().push(Arc::clone(&entry));
        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            entry: Some(entry),
        }
    }

    /// Receive changes over a broadcast channel.
    pub fn changes(&self) -> broadcast::Receiver<FilterChange> {
        self.sender.subscribe()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn commit(&self, cause: ChangeCause, build: impl FnOnce(&FilterParams) -> FilterParams) {
        let change = {
            let _guard = self.commit_lock.lock();
            let current = self.get_params();
            let next = Arc::new(build(&current));
            let mut state = self.state.write();
            state.generation += 1;
            state.params = Arc::clone(&next);
            FilterChange {
                generation: state.generation,
                params: next,
                cause,
            }
        };

        tracing::debug!(
            generation = change.generation,
            cause = ?change.cause,
            "filter store committed"
        );

        // Sent before listeners run so that a change committed from inside a
        // listener reaches the channel after this one. No receivers is fine.
        let _ = self.sender.send(change.clone());

        // Snapshot first: listeners may subscribe or unsubscribe while we
        // iterate, and no lock may be held while they run.
        let snapshot: Vec<Arc<ListenerEntry>> = self.listeners.lock().clone();
        for entry in snapshot {
            if entry.active.load(Ordering::Acquire) {
                (entry.callback)(&change);
            }
        }
    }
}

/// Handle to a registered store listener.
pub struct Subscription {
    listeners: Weak<ListenerList>,
    entry: Option<Arc<ListenerEntry>>,
}

impl Subscription {
    /// Stop receiving notifications. Takes effect immediately, even while a
    /// notification round is in progress.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(entry) = self.entry.take() else {
            return;
        };
        entry.active.store(false, Ordering::Release);
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|other| other.id != entry.id);
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
            .field("id", &self.entry.as_ref().map(|entry| entry.id))
            .finish()
    }
}
