//! HTTP list source for the Directory backend.
//!
//! # Security Note - Logging
//!
//! The API token is held in a [`SecretString`] and only exposed while the
//! `Authorization` header is built. Page URLs are logged at debug level; they
//! carry filters but never the token.

use std::marker::PhantomData;
use std::time::Duration;

use directory_wire::{LIMIT_PARAM, ListBody, PAGE_PARAM, TOTAL_COUNT_HEADER};
use reqwest::Client;
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{DirectoryError, Result};
use crate::params::{FilterParams, encode};

use super::{FetchError, ListSource, Page, Resource};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads list pages with `GET <endpoint>?page=N&limit=M&<filters>`.
pub struct HttpListSource<T = serde_json::Value> {
    client: Client,
    endpoint: Url,
    token: Option<SecretString>,
    _item: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for HttpListSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListSource")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl<T> HttpListSource<T> {
    /// Create a source for a list endpoint URL.
    pub fn new(endpoint: Url) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a source whose requests give up after `timeout`.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token: None,
            _item: PhantomData,
        })
    }

    /// Create a source for `resource` using the configured API URL, token
    /// and timeout.
    pub fn from_config(config: &Config, resource: Resource) -> Result<Self> {
        let endpoint = resource_endpoint(&config.api_url()?, resource)?;
        let source = Self::with_timeout(endpoint, config.request_timeout())?;
        Ok(match config.token() {
            Some(token) => source.with_token(token),
            None => source,
        })
    }

    /// Send `token` as a bearer token with every request.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL requested for one page.
    ///
    /// Filters named like the paging parameters are not forwarded.
    pub fn page_url(&self, filters: &FilterParams, page: u32, limit: u32) -> Url {
        let mut forwarded = filters.clone();
        for reserved in [PAGE_PARAM, LIMIT_PARAM] {
            if forwarded.remove(reserved).is_some() {
                tracing::debug!(key = reserved, "dropping filter that shadows a paging parameter");
            }
        }

        let mut query = format!("{PAGE_PARAM}={page}&{LIMIT_PARAM}={limit}");
        let encoded = encode(&forwarded);
        if !encoded.is_empty() {
            query.push('&');
            query.push_str(&encoded);
        }

        let mut url = self.endpoint.clone();
        url.set_query(Some(&query));
        url
    }
}

impl<T> ListSource for HttpListSource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn load_page(
        &self,
        filters: &FilterParams,
        page: u32,
        limit: u32,
    ) -> std::result::Result<Page<T>, FetchError> {
        let url = self.page_url(filters, page, limit);
        tracing::debug!(url = %url, "fetching list page");

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http(status));
        }

        let header_total = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let bytes = response.bytes().await?;
        let body: ListBody<T> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

        let (items, body_total) = body.into_parts();
        let total_items = body_total.or(header_total).ok_or_else(|| {
            FetchError::Decode(format!(
                "response carries neither totalItems nor {TOTAL_COUNT_HEADER}"
            ))
        })?;

        Ok(Page { items, total_items })
    }
}

/// Endpoint URL of a resource list below the API base URL.
pub fn resource_endpoint(api_url: &Url, resource: Resource) -> Result<Url> {
    let mut base = api_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.join(resource.path()).map_err(DirectoryError::from)
}
