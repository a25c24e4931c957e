//! Backend list endpoints.
//!
//! A [`ListSource`] loads one page of a list for a filter set. The filters are
//! opaque to the source: they are passed through to the backend as query
//! parameters next to `page` and `limit`.

pub mod error;
pub mod http;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::error::DirectoryError;
use crate::params::FilterParams;

pub use error::FetchError;
pub use http::HttpListSource;

/// One page of a list as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items matching the filters across all pages.
    pub total_items: u64,
}

/// Anything that can load a page of items for a filter set.
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Load page `page` (1-based) of `limit` items.
    fn load_page(
        &self,
        filters: &FilterParams,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Page<Self::Item>, FetchError>> + Send;
}

/// Lists exposed by the Directory backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Members,
    Teams,
    Projects,
    Events,
    DemoDays,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Members,
        Resource::Teams,
        Resource::Projects,
        Resource::Events,
        Resource::DemoDays,
    ];

    /// Path segment of the list endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Members => "members",
            Resource::Teams => "teams",
            Resource::Projects => "projects",
            Resource::Events => "events",
            Resource::DemoDays => "demo-days",
        }
    }

    /// Item field used as the display label.
    pub fn label_field(&self) -> &'static str {
        match self {
            Resource::Members | Resource::Teams | Resource::Projects => "name",
            Resource::Events | Resource::DemoDays => "title",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl FromStr for Resource {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Resource::ALL
            .into_iter()
            .find(|resource| resource.path() == normalized)
            .ok_or_else(|| DirectoryError::UnknownResource(s.to_string()))
    }
}
