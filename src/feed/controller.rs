//! Async driver for a [`ListFeed`].
//!
//! The controller issues the feed's page requests against a [`ListSource`] on
//! the tokio runtime, one task per request, and applies each result through the
//! feed's tag check. A request that gets superseded has its task aborted, but
//! a result that slips through is still dropped as stale. Every issued request
//! and every settled result is published as a [`FeedEvent`].

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::{DirectoryError, Result};
use crate::params::FilterParams;
use crate::remote::{FetchError, ListSource, Page};
use crate::store::Subscription;
use crate::sync::UrlSynchronizer;

use super::{ApplyOutcome, ListFeed, LoadGate, LoadStatus, PageRequest, PaginationState, RequestTag};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Progress of a controlled feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A page request was issued.
    Requested(RequestTag),
    /// A request finished and its result went through the tag check.
    Settled {
        tag: RequestTag,
        outcome: ApplyOutcome,
    },
}

/// Point-in-time copy of a feed.
#[derive(Debug, Clone)]
pub struct FeedSnapshot<T> {
    pub items: Vec<T>,
    pub pagination: PaginationState,
    pub status: LoadStatus,
    pub generation: u64,
}

struct Shared<S: ListSource> {
    source: S,
    feed: Mutex<ListFeed<S::Item>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
    events: broadcast::Sender<FeedEvent>,
}

impl<S: ListSource> Shared<S> {
    /// Spawn the fetch for `request`. Must be called with the feed locked so
    /// that handles are replaced in the order requests were issued.
    fn dispatch(self: &Arc<Self>, request: PageRequest) -> RequestTag {
        let tag = request.tag;
        let _ = self.events.send(FeedEvent::Requested(tag));

        let shared = Arc::clone(self);
        let task = self.runtime.spawn(async move {
            let result = shared
                .source
                .load_page(&request.filters, request.page, request.limit)
                .await;
            shared.settle(tag, result);
        });

        if let Some(previous) = self.in_flight.lock().replace(task)
            && !previous.is_finished()
        {
            tracing::debug!("aborting superseded page fetch");
            previous.abort();
        }
        tag
    }

    fn settle(&self, tag: RequestTag, result: std::result::Result<Page<S::Item>, FetchError>) {
        let mut feed = self.feed.lock();
        let outcome = feed.apply(tag, result);
        let _ = self.events.send(FeedEvent::Settled { tag, outcome });
    }

    fn reset(self: &Arc<Self>, filters: Arc<FilterParams>, generation: u64) -> RequestTag {
        let mut feed = self.feed.lock();
        let request = feed.reset(filters, generation);
        self.dispatch(request)
    }

    fn shutdown(&self) {
        let mut feed = self.feed.lock();
        feed.cancel();
        if let Some(task) = self.in_flight.lock().take() {
            task.abort();
        }
    }
}

/// Owns one list view's feed and keeps it fed from a [`ListSource`].
pub struct ListController<S: ListSource> {
    shared: Arc<Shared<S>>,
}

impl<S: ListSource> std::fmt::Debug for ListController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let feed = self.shared.feed.lock();
        f.debug_struct("ListController")
            .field("generation", &feed.generation())
            .field("pagination", &feed.pagination())
            .field("status", feed.status())
            .finish()
    }
}

impl<S: ListSource> ListController<S> {
    /// Create a controller that spawns its fetches on the current runtime.
    pub fn new(source: S, limit: u32) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            DirectoryError::Other(format!("list controller needs a tokio runtime: {e}"))
        })?;
        Ok(Self::with_runtime(source, limit, runtime))
    }

    /// Create a controller that spawns its fetches on `runtime`.
    pub fn with_runtime(source: S, limit: u32, runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                source,
                feed: Mutex::new(ListFeed::new(limit)),
                in_flight: Mutex::new(None),
                runtime,
                events,
            }),
        }
    }

    /// Discard the list and load page 1 for `filters`.
    pub fn reset(&self, filters: Arc<FilterParams>, generation: u64) -> RequestTag {
        self.shared.reset(filters, generation)
    }

    /// Load page 1 for the synchronizer's filters, if it is hydrated.
    pub fn start(&self, sync: &UrlSynchronizer) -> Option<RequestTag> {
        let filters = sync.filters()?;
        Some(self.reset(filters, sync.store().generation()))
    }

    /// Load the next page, or retry the page that failed last.
    ///
    /// Returns `None` when the feed has nothing to request right now.
    pub fn load_next(&self) -> Option<RequestTag> {
        let mut feed = self.shared.feed.lock();
        let request = feed.request_next()?;
        Some(self.shared.dispatch(request))
    }

    /// Reset the feed whenever the synchronizer's store commits a change.
    ///
    /// Commits made before the synchronizer is ready, the hydrating one
    /// included, are ignored; call [`start`](Self::start) after hydrating.
    /// The binding holds the controller weakly and ends when the returned
    /// subscription is dropped.
    #[must_use = "dropping the subscription unbinds the controller"]
    pub fn bind_store(&self, sync: &UrlSynchronizer) -> Subscription {
        let shared: Weak<Shared<S>> = Arc::downgrade(&self.shared);
        let readiness = sync.readiness();
        sync.store().subscribe(move |change| {
            if !readiness.is_ready() {
                tracing::debug!(generation = change.generation, "store not hydrated, feed left alone");
                return;
            }
            if let Some(shared) = shared.upgrade() {
                tracing::debug!(generation = change.generation, "filters changed, resetting feed");
                shared.reset(Arc::clone(&change.params), change.generation);
            }
        })
    }

    pub fn snapshot(&self) -> FeedSnapshot<S::Item> {
        let feed = self.shared.feed.lock();
        FeedSnapshot {
            items: feed.items().to_vec(),
            pagination: feed.pagination(),
            status: feed.status().clone(),
            generation: feed.generation(),
        }
    }

    pub fn gate(&self) -> LoadGate {
        self.shared.feed.lock().gate()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.events.subscribe()
    }

    /// Cancel the feed and abort the in-flight fetch.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl<S: ListSource> Drop for ListController<S> {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

/// Wait until the request tagged `tag` settles.
///
/// Subscribe before issuing the request. Returns `None` if the channel closes
/// or another request is issued after `tag` before it settles, which means
/// `tag` was superseded. A lagging receiver keeps waiting.
pub async fn settled(
    events: &mut broadcast::Receiver<FeedEvent>,
    tag: RequestTag,
) -> Option<ApplyOutcome> {
    let mut issued = false;
    loop {
        match events.recv().await {
            Ok(FeedEvent::Settled { tag: done, outcome }) if done == tag => return Some(outcome),
            Ok(FeedEvent::Requested(next)) if next == tag => issued = true,
            Ok(FeedEvent::Requested(_)) if issued => return None,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "feed event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
