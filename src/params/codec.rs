//! Query-string codec for filter sets.
//!
//! A key with several values is written as a single pair whose value is the
//! values joined with [`SEPARATOR`], e.g. `tag=ai%E2%90%9Fml`. Encoding follows
//! the `application/x-www-form-urlencoded` rules, so spaces become `+`.

use thiserror::Error;
use url::form_urlencoded;

use super::FilterParams;

/// Reserved multi-value separator (U+241F SYMBOL FOR UNIT SEPARATOR).
pub const SEPARATOR: char = '\u{241F}';

/// A query string that cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed percent escape at byte {position}")]
    MalformedEscape { position: usize },

    #[error("parameter '{key}' is not valid UTF-8 once decoded")]
    InvalidUtf8 { key: String },
}

/// Encode a filter set as a query string (without the leading `?`).
pub fn encode(params: &FilterParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let separator = SEPARATOR.to_string();
    for (key, values) in params.iter() {
        serializer.append_pair(key, &values.join(&separator));
    }
    serializer.finish()
}

/// Decode a query string, with or without its leading `?`.
///
/// Every value is split on [`SEPARATOR`] and trimmed; keys left without any
/// value are dropped. A key repeated in the query has its values merged.
pub fn decode(query: &str) -> Result<FilterParams, DecodeError> {
    let (offset, query) = match query.strip_prefix('?') {
        Some(rest) => (1, rest),
        None => (0, query),
    };
    validate(query, offset)?;

    let mut params = FilterParams::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params.extend(key, [value]);
    }
    Ok(params)
}

/// Reject what `form_urlencoded::parse` would silently repair: stray `%`
/// signs and byte sequences that do not decode to UTF-8.
fn validate(query: &str, offset: usize) -> Result<(), DecodeError> {
    let mut start = 0;
    for segment in query.split('&') {
        let key_end = segment.find('=').unwrap_or(segment.len());
        let (raw_key, raw_value) = segment.split_at(key_end);
        let key = percent_decode(raw_key, offset + start)?;
        let key = String::from_utf8(key).map_err(|_| DecodeError::InvalidUtf8 {
            key: raw_key.to_string(),
        })?;
        let value = percent_decode(raw_value, offset + start + key_end)?;
        if String::from_utf8(value).is_err() {
            return Err(DecodeError::InvalidUtf8 { key });
        }
        start += segment.len() + 1;
    }
    Ok(())
}

fn percent_decode(raw: &str, offset: usize) -> Result<Vec<u8>, DecodeError> {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let escape = bytes
                .get(index + 1..index + 3)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            match escape {
                Some(byte) => {
                    decoded.push(byte);
                    index += 3;
                }
                None => {
                    return Err(DecodeError::MalformedEscape {
                        position: offset + index,
                    });
                }
            }
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    Ok(decoded)
}
