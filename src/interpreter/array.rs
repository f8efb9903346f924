//! The ordered string-keyed map backing every [`super::value::ArrayNode`].
//!
//! spec.md §9 calls for O(1) key lookup plus O(log n) `$O` in either
//! direction: a `HashMap` gives the first, a sorted `Vec` of keys (kept in
//! M-collation order) gives the second via binary search. Re-sorting on
//! every access would be correct but is explicitly flagged as the
//! not-recommended approach.

use super::value::{canonical_numeric_value, MValue};
use std::cmp::Ordering;
use std::collections::HashMap;

/// M collation order (spec.md §3, Glossary): numeric-string keys precede
/// non-numeric keys and sort by numeric value among themselves;
/// non-numeric keys sort lexicographically by code unit. Ties (which only
/// arise between distinct numeric spellings of the same value, e.g. `"1"`
/// vs `"1.0"`) are broken by plain string order so the total order stays
/// consistent with key uniqueness.
pub fn cmp_keys(a: &str, b: &str) -> Ordering {
    match (canonical_numeric_value(a), canonical_numeric_value(b)) {
        (Some(x), Some(y)) => x
            .partial_cmp(&y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedMap {
    entries: HashMap<String, MValue>,
    order: Vec<String>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn get(&self, key: &str) -> Option<&MValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MValue> {
        self.entries.get_mut(key)
    }

    /// Inserts or replaces a child. The empty-string key is excluded from
    /// the array per spec.md §3 and is silently ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: MValue) {
        let key = key.into();
        if key.is_empty() {
            return;
        }
        if self.entries.contains_key(&key) {
            self.entries.insert(key, value);
            return;
        }
        let idx = self
            .order
            .binary_search_by(|k| cmp_keys(k, &key))
            .unwrap_or_else(|e| e);
        self.order.insert(idx, key.clone());
        self.entries.insert(key, value);
    }

    /// Removes a key and its entire subtree (the subtree is just whatever
    /// `MValue` was stored there).
    pub fn remove(&mut self, key: &str) -> Option<MValue> {
        if let Ok(idx) = self.order.binary_search_by(|k| cmp_keys(k, key)) {
            self.order.remove(idx);
        }
        self.entries.remove(key)
    }

    /// The next key after `from` in M-collation order (`""` means "before
    /// the first key"); `None` at the end.
    pub fn next_key(&self, from: &str) -> Option<&str> {
        if from.is_empty() {
            return self.order.first().map(String::as_str);
        }
        match self.order.binary_search_by(|k| cmp_keys(k, from)) {
            Ok(idx) => self.order.get(idx + 1).map(String::as_str),
            Err(idx) => self.order.get(idx).map(String::as_str),
        }
    }

    /// The previous key before `from` (`""` means "after the last key").
    pub fn prev_key(&self, from: &str) -> Option<&str> {
        if from.is_empty() {
            return self.order.last().map(String::as_str);
        }
        match self.order.binary_search_by(|k| cmp_keys(k, from)) {
            Ok(idx) | Err(idx) if idx == 0 => None,
            Ok(idx) | Err(idx) => self.order.get(idx - 1).map(String::as_str),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MValue)> {
        self.order.iter().map(move |k| (k.as_str(), &self.entries[k]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(keys: &[&str]) -> OrderedMap {
        let mut m = OrderedMap::new();
        for k in keys {
            m.insert(*k, MValue::from_str("x"));
        }
        m
    }

    #[test]
    fn numeric_keys_sort_by_value_not_lexically() {
        let m = map_with(&["10", "2", "1"]);
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1", "2", "10"]);
    }

    #[test]
    fn numeric_keys_precede_non_numeric() {
        let m = map_with(&["b", "1", "a"]);
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1", "a", "b"]);
    }

    #[test]
    fn forward_and_backward_traversal_round_trips() {
        let m = map_with(&["1", "2", "10"]);
        assert_eq!(m.next_key(""), Some("1"));
        assert_eq!(m.next_key("1"), Some("2"));
        assert_eq!(m.next_key("2"), Some("10"));
        assert_eq!(m.next_key("10"), None);

        assert_eq!(m.prev_key(""), Some("10"));
        assert_eq!(m.prev_key("10"), Some("2"));
        assert_eq!(m.prev_key("2"), Some("1"));
        assert_eq!(m.prev_key("1"), None);
    }

    #[test]
    fn empty_key_is_excluded() {
        let mut m = OrderedMap::new();
        m.insert("", MValue::from_str("nope"));
        assert!(m.is_empty());
    }

    #[test]
    fn removing_a_key_drops_it_from_iteration() {
        let mut m = map_with(&["1", "2", "3"]);
        m.remove("2");
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1", "3"]);
        assert_eq!(m.next_key("1"), Some("3"));
    }
}
