//! Helpers for the optional and free-form values carried by admin API records.

use serde_json::{Map, Value};

/// Free-form JSON object: plugin, partial and vault `config`, workspace `meta`.
///
/// `Clone` is a deep copy; a cloned map shares nothing with the original.
pub type Configuration = Map<String, Value>;

/// `Some(s)` unless `s` is missing or empty.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// First present, non-empty value of `candidates`.
#[must_use]
pub fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates.iter().copied().find_map(non_empty)
}

/// Remove repeated entries, keeping the first occurrence of each.
#[must_use]
pub fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Build a [`Configuration`] from a JSON value; anything but an object yields `None`.
#[must_use]
pub fn configuration(value: Value) -> Option<Configuration> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
