//! Wire types for the Directory backend list endpoints.
//!
//! Every list endpoint accepts `page` and `limit` query parameters next to the
//! encoded filters, and answers with one page of items plus the total number of
//! items matching the filters. The total is carried either in a JSON envelope
//! or, for endpoints that return a bare array, in the `X-Total-Count` header.

use serde::{Deserialize, Serialize};

/// Query parameter carrying the 1-based page number.
pub const PAGE_PARAM: &str = "page";

/// Query parameter carrying the page size.
pub const LIMIT_PARAM: &str = "limit";

/// Response header carrying the total item count for bare-array bodies.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Enveloped list response: `{"items": [...], "totalItems": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    pub items: Vec<T>,
    pub total_items: u64,
}

/// Any list body the backend may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Envelope(ListEnvelope<T>),
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    /// Split the body into its items and the total it declares, if any.
    pub fn into_parts(self) -> (Vec<T>, Option<u64>) {
        match self {
            ListBody::Envelope(envelope) => (envelope.items, Some(envelope.total_items)),
            ListBody::Bare(items) => (items, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_body() {
        let body: ListBody<String> =
            serde_json::from_str(r#"{"items":["a","b"],"totalItems":7}"#).unwrap();
        assert_eq!(body.into_parts(), (vec!["a".to_string(), "b".to_string()], Some(7)));
    }

    #[test]
    fn test_bare_body_has_no_total() {
        let body: ListBody<String> = serde_json::from_str(r#"["a"]"#).unwrap();
        assert_eq!(body.into_parts(), (vec!["a".to_string()], None));
    }

    #[test]
    fn test_envelope_requires_total() {
        let body = serde_json::from_str::<ListBody<String>>(r#"{"items":["a"]}"#);
        assert!(body.is_err());
    }
}
