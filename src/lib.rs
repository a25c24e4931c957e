pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod feed;
pub mod params;
pub mod paths;
pub mod remote;
pub mod scroll;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{DirectoryError, Result};
pub use feed::{
    ApplyOutcome, FeedEvent, FeedSnapshot, ListController, ListFeed, LoadGate, LoadStatus,
    PageRequest, PaginationState, RequestTag,
};
pub use params::{DecodeError, FilterParams, SEPARATOR, decode, encode};
pub use remote::{FetchError, HttpListSource, ListSource, Page, Resource};
pub use scroll::{ScrollTrigger, SentinelId, SkipReason, TriggerDecision, ViewportObserver, Visibility};
pub use store::{ChangeCause, FilterChange, FilterStore, Subscription};
pub use sync::{
    LocationSource, NavigationOutcome, Readiness, SyncState, UrlSynchronizer, location_for,
};
