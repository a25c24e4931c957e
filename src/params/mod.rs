//! Filter parameter sets.
//!
//! A [`FilterParams`] maps each filter key to one or more values. Values are
//! normalized when they are inserted so that every set survives a trip through
//! the query-string codec unchanged: surrounding whitespace is trimmed, empty
//! values are dropped, and a value carrying the multi-value separator is split
//! on it. A key whose value list ends up empty is not stored at all.

pub mod codec;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use codec::{DecodeError, SEPARATOR, decode, encode};

/// An ordered set of active filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams {
    entries: BTreeMap<String, Vec<String>>,
}

impl FilterParams {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the values for `key`.
    ///
    /// Returns `false` (and leaves no entry for `key`) when nothing survives
    /// normalization.
    pub fn set<I, V>(&mut self, key: impl AsRef<str>, values: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let key = key.as_ref().trim();
        let values = normalize_values(values);
        if key.is_empty() || values.is_empty() {
            self.entries.remove(key);
            return false;
        }
        self.entries.insert(key.to_string(), values);
        true
    }

    /// Append values to `key`, keeping any already present.
    pub fn extend<I, V>(&mut self, key: impl AsRef<str>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let key = key.as_ref().trim();
        let values = normalize_values(values);
        if key.is_empty() || values.is_empty() {
            return;
        }
        self.entries
            .entry(key.to_string())
            .or_default()
            .extend(values);
    }

    /// Builder-style [`FilterParams::set`].
    pub fn with<I, V>(mut self, key: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        self.set(key, values);
        self
    }

    /// Remove `key`, returning its values if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key)
    }

    /// Values for `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode(self))
    }
}

impl<K, V> FromIterator<(K, V)> for FilterParams
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    /// Collect `(key, value)` pairs, merging repeated keys.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = FilterParams::new();
        for (key, value) in iter {
            params.extend(key, [value]);
        }
        params
    }
}

fn normalize_values<I, V>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = V>,
    V: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|value| {
            value
                .as_ref()
                .split(SEPARATOR)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_trims_and_drops_empty_values() {
        let mut params = FilterParams::new();
        assert!(params.set("tag", [" ai ", "", "  "]));
        assert_eq!(params.get("tag"), Some(&["ai".to_string()][..]));
    }

    #[test]
    fn test_set_with_no_surviving_values_removes_key() {
        let mut params = FilterParams::new().with("tag", ["ai"]);
        assert!(!params.set("tag", [" "]));
        assert!(!params.contains_key("tag"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_set_splits_values_on_separator() {
        let params = FilterParams::new().with("tag", [format!("ai{SEPARATOR}ml")]);
        assert_eq!(
            params.get("tag"),
            Some(&["ai".to_string(), "ml".to_string()][..])
        );
    }

    #[test]
    fn test_empty_key_is_ignored() {
        let params = FilterParams::new().with("  ", ["x"]);
        assert!(params.is_empty());
    }

    #[test]
    fn test_from_iter_merges_repeated_keys() {
        let params: FilterParams = [("tag", "ai"), ("region", "us"), ("tag", "ml")]
            .into_iter()
            .collect();
        assert_eq!(params.len(), 2);
        assert_eq!(
            params.get("tag"),
            Some(&["ai".to_string(), "ml".to_string()][..])
        );
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let params = FilterParams::new()
            .with("zeta", ["1"])
            .with("alpha", ["2"]);
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}
