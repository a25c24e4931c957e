//! Paginated list state.
//!
//! [`ListFeed`] holds the accumulated items of one list view and decides which
//! page to request next. It performs no I/O: callers issue the
//! [`PageRequest`]s it hands out and feed the outcome back through
//! [`ListFeed::apply`]. Every request carries a [`RequestTag`]; a result whose
//! tag is not the one currently in flight belongs to a superseded filter set or
//! page and is discarded, so responses may arrive in any order.

pub mod controller;

use std::sync::Arc;

use crate::params::FilterParams;
use crate::remote::{FetchError, Page};

pub use controller::{FeedEvent, FeedSnapshot, ListController, settled};

/// Identity of an issued page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    /// Filter generation the request was issued for.
    pub generation: u64,
    /// Requested page.
    pub page: u32,
    seq: u64,
}

/// A page fetch the caller must perform.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub tag: RequestTag,
    pub filters: Arc<FilterParams>,
    pub page: u32,
    pub limit: u32,
}

/// Position of a list view in its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Last page shown, or 1 while the first page is loading.
    pub page: u32,
    pub limit: u32,
    /// Total reported by the backend; unknown until a page has loaded.
    pub total_items: Option<u64>,
    pub loaded_item_count: u64,
}

impl PaginationState {
    fn first_page(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total_items: None,
            loaded_item_count: 0,
        }
    }

    /// Whether the backend has items beyond those loaded.
    pub fn has_more(&self) -> bool {
        self.total_items
            .is_some_and(|total| self.loaded_item_count < total)
    }
}

/// Load status of a list view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(FetchError),
}

/// What [`ListFeed::apply`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Page 1 replaced the list.
    Replaced { count: usize },
    /// A later page was appended.
    Appended { page: u32, count: usize },
    /// The fetch failed; loaded items are kept.
    Failed(FetchError),
    /// The result belonged to a superseded request and was dropped.
    Stale,
}

impl ApplyOutcome {
    /// Whether the list now holds items it did not hold before.
    ///
    /// A page 1 after a filter change counts, so a scroll trigger that fired
    /// for the old list re-arms on the new one.
    pub fn grew(&self) -> bool {
        match self {
            ApplyOutcome::Replaced { count } | ApplyOutcome::Appended { count, .. } => *count > 0,
            ApplyOutcome::Failed(_) | ApplyOutcome::Stale => false,
        }
    }
}

/// Everything the scroll trigger needs to know about a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadGate {
    pub is_loading: bool,
    pub has_more: bool,
}

/// Accumulated state of one paginated list view.
#[derive(Debug, Clone)]
pub struct ListFeed<T> {
    items: Vec<T>,
    pagination: PaginationState,
    status: LoadStatus,
    filters: Option<Arc<FilterParams>>,
    generation: u64,
    in_flight: Option<RequestTag>,
    failed_page: Option<u32>,
    next_seq: u64,
}

impl<T> ListFeed<T> {
    /// Create an idle feed. Nothing can be requested until [`reset`] supplies
    /// the filters.
    ///
    /// [`reset`]: ListFeed::reset
    pub fn new(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationState::first_page(limit.max(1)),
            status: LoadStatus::Idle,
            filters: None,
            generation: 0,
            in_flight: None,
            failed_page: None,
            next_seq: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn filters(&self) -> Option<&Arc<FilterParams>> {
        self.filters.as_ref()
    }

    /// Filter generation the feed currently shows.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestTag> {
        self.in_flight
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more()
    }

    pub fn gate(&self) -> LoadGate {
        LoadGate {
            is_loading: self.is_loading(),
            has_more: self.has_more() || self.failed_page.is_some(),
        }
    }

    /// Start over for a new filter set.
    ///
    /// Accumulated items are discarded before the page-1 request is issued,
    /// and any request still in flight becomes stale.
    pub fn reset(&mut self, filters: Arc<FilterParams>, generation: u64) -> PageRequest {
        if let Some(stale) = self.in_flight.take() {
            tracing::debug!(
                generation = stale.generation,
                page = stale.page,
                "superseding in-flight page request"
            );
        }
        self.items.clear();
        self.pagination = PaginationState::first_page(self.pagination.limit);
        self.filters = Some(filters);
        self.generation = generation;
        self.failed_page = None;
        self.issue(1)
    }

    /// Request the page after the last one loaded, or retry a failed page.
    ///
    /// Returns `None` while a request is in flight, before the first
    /// [`reset`](ListFeed::reset), or when every item is loaded.
    pub fn request_next(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.filters.is_none() {
            return None;
        }
        if let Some(page) = self.failed_page {
            return Some(self.issue(page));
        }
        if !self.has_more() {
            return None;
        }
        Some(self.issue(self.pagination.page + 1))
    }

    /// Apply the result of the request tagged `tag`.
    pub fn apply(&mut self, tag: RequestTag, result: Result<Page<T>, FetchError>) -> ApplyOutcome {
        if self.in_flight != Some(tag) {
            tracing::debug!(
                generation = tag.generation,
                page = tag.page,
                current_generation = self.generation,
                "dropping stale page response"
            );
            return ApplyOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let count = page.items.len();
                let outcome = if tag.page == 1 {
                    self.items = page.items;
                    ApplyOutcome::Replaced { count }
                } else {
                    self.items.extend(page.items);
                    ApplyOutcome::Appended {
                        page: tag.page,
                        count,
                    }
                };

                let loaded = self.items.len() as u64;
                if loaded > page.total_items {
                    tracing::warn!(
                        loaded,
                        total = page.total_items,
                        "backend reported fewer items than it returned"
                    );
                }
                self.pagination.page = tag.page;
                self.pagination.loaded_item_count = loaded;
                self.pagination.total_items = Some(page.total_items.max(loaded));
                self.failed_page = None;
                self.status = LoadStatus::Loaded;
                outcome
            }
            Err(err) => {
                tracing::warn!(page = tag.page, error = %err, "page load failed");
                self.failed_page = Some(tag.page);
                self.status = LoadStatus::Failed(err.clone());
                ApplyOutcome::Failed(err)
            }
        }
    }

    /// Forget the in-flight request, e.g. when the view unmounts.
    pub fn cancel(&mut self) {
        if self.in_flight.take().is_some() && self.status == LoadStatus::Loading {
            self.status = LoadStatus::Idle;
        }
    }

    fn issue(&mut self, page: u32) -> PageRequest {
        self.next_seq += 1;
        let tag = RequestTag {
            generation: self.generation,
            page,
            seq: self.next_seq,
        };
        self.in_flight = Some(tag);
        self.status = LoadStatus::Loading;
        PageRequest {
            tag,
            filters: self
                .filters
                .clone()
                .unwrap_or_else(|| Arc::new(FilterParams::new())),
            page,
            limit: self.pagination.limit,
        }
    }
}
