//! Keeps the filter store consistent with the address bar.
//!
//! The synchronizer hydrates the store from the location that is actually
//! current when a view mounts, then follows navigation (back/forward, in-app
//! links) by decoding the new query string into the store. It only ever writes
//! the store; updating the address after a user edit is left to the caller,
//! which builds the new address with [`location_for`]. Writing the URL on every
//! store change would feed back into navigation events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use url::Url;

use crate::params::{FilterParams, decode, encode};
use crate::store::FilterStore;

/// Lifecycle of a synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// The store has not been populated from the address yet.
    #[default]
    Uninitialized,
    /// Hydration in progress.
    Hydrating,
    /// The store reflects the address; filters may be read.
    Ready,
}

/// Result of feeding a navigation event to the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The store was replaced with the decoded filters.
    Applied,
    /// The query decodes to the filters already in the store.
    Unchanged,
    /// Navigation arrived before hydration and was ignored.
    NotReady,
}

/// Read access to the current address.
pub trait LocationSource {
    /// The query string of the address as it is right now, with or without
    /// the leading `?`.
    fn current_query(&self) -> String;
}

impl LocationSource for Url {
    fn current_query(&self) -> String {
        self.query().unwrap_or_default().to_string()
    }
}

impl LocationSource for str {
    fn current_query(&self) -> String {
        self.to_string()
    }
}

impl LocationSource for String {
    fn current_query(&self) -> String {
        self.clone()
    }
}

/// Shared view of whether a synchronizer has hydrated its store.
///
/// Store listeners that fetch hold one of these and ignore commits until it
/// reads ready.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::Release);
    }
}

/// Bridges a [`LocationSource`] and a [`FilterStore`].
#[derive(Debug)]
pub struct UrlSynchronizer {
    store: Arc<FilterStore>,
    state: SyncState,
    ready: Readiness,
}

impl UrlSynchronizer {
    pub fn new(store: Arc<FilterStore>) -> Self {
        Self {
            store,
            state: SyncState::Uninitialized,
            ready: Readiness::default(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SyncState::Ready
    }

    pub fn store(&self) -> &Arc<FilterStore> {
        &self.store
    }

    /// Handle that tracks this synchronizer's readiness from other threads.
    pub fn readiness(&self) -> Readiness {
        self.ready.clone()
    }

    /// Populate the store from the current location and become ready.
    ///
    /// Calling this again (a remount) re-reads the location. The hydrating
    /// commit itself is made before readiness flips, so bound listeners skip
    /// it and the caller starts loading once this returns.
    pub fn hydrate<L>(&mut self, location: &L) -> Arc<FilterParams>
    where
        L: LocationSource + ?Sized,
    {
        self.state = SyncState::Hydrating;
        self.ready.set(false);
        let query = location.current_query();
        let params = decode_or_empty(&query);
        tracing::debug!(query = %query, filters = params.len(), "hydrating filter store");
        self.store.set_all_params(params);
        self.state = SyncState::Ready;
        self.ready.set(true);
        self.store.get_params()
    }

    /// Follow a navigation to a new query string.
    ///
    /// The decoded query is compared with the store, not with the previous
    /// address, since user edits change the store without navigating.
    pub fn on_navigation(&mut self, query: &str) -> NavigationOutcome {
        if self.state != SyncState::Ready {
            tracing::debug!(query, "navigation before hydration ignored");
            return NavigationOutcome::NotReady;
        }
        let params = decode_or_empty(query);
        if *self.store.get_params() == params {
            return NavigationOutcome::Unchanged;
        }
        self.store.set_all_params(params);
        NavigationOutcome::Applied
    }

    /// The filters to fetch with, or `None` while the store is not hydrated.
    pub fn filters(&self) -> Option<Arc<FilterParams>> {
        self.is_ready().then(|| self.store.get_params())
    }
}

/// Address to push after a user filter edit: `base` with its query replaced
/// by the encoded filters.
pub fn location_for(base: &Url, params: &FilterParams) -> Url {
    let mut url = base.clone();
    let query = encode(params);
    url.set_query((!query.is_empty()).then_some(query.as_str()));
    url
}

fn decode_or_empty(query: &str) -> FilterParams {
    decode(query).unwrap_or_else(|err| {
        tracing::debug!(query, error = %err, "unreadable query string, using no filters");
        FilterParams::new()
    })
}
