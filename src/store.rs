//! Ordered key/value storage backing a mount specification.
//!
//! Items are kept sorted by key after every mutation so that two stores
//! holding the same pairs compare equal no matter in which order the pairs
//! were inserted. Typical stores hold a handful of entries (`type`, `host`,
//! `user`, `port`), so the items live inline and a full re-sort on insert
//! is cheaper than anything incremental.

use std::cmp::Ordering;

use smallvec::SmallVec;

/// Number of items stored inline before spilling to the heap.
const INLINE_ITEMS: usize = 4;

/// A single `key=value` parameter of a mount specification.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyValueItem {
    pub key: String,
    pub value: String,
}

impl KeyValueItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Key-sorted collection of unique keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyValueStore {
    items: SmallVec<[KeyValueItem; INLINE_ITEMS]>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.set_with_len(key, value, None);
    }

    /// Sets `key` to the first `len` bytes of `value`.
    ///
    /// `None` stores the whole value. A length that falls inside a UTF-8
    /// sequence is rounded down to the previous character boundary. Both key
    /// and value end at their first NUL byte, as they would on the C-string
    /// wire representation.
    pub fn set_with_len(&mut self, key: &str, value: &str, len: Option<usize>) {
        let value = match len {
            Some(len) => truncate_to_boundary(value, len),
            None => value,
        };
        let key = until_nul(key);
        let value = until_nul(value);

        if let Some(item) = self.items.iter_mut().find(|item| item.key == key) {
            item.value = value.to_owned();
            return;
        }

        self.items.push(KeyValueItem::new(key, value));
        self.items.sort_by(compare_keys);
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items in increasing key order.
    pub fn iter(&self) -> std::slice::Iter<'_, KeyValueItem> {
        self.items.iter()
    }

    /// Restores the sort invariant on items collected in arbitrary order.
    ///
    /// Keys and values are cut at their first NUL byte. The sort is stable,
    /// so when a key was collected more than once the value collected last
    /// wins, the same outcome as repeated `set` calls.
    fn normalize(&mut self) {
        for item in self.items.iter_mut() {
            truncate_at_nul(&mut item.key);
            truncate_at_nul(&mut item.value);
        }
        self.items.sort_by(compare_keys);
        self.items.dedup_by(|later, kept| {
            if later.key != kept.key {
                return false;
            }
            std::mem::swap(&mut later.value, &mut kept.value);
            true
        });
    }
}

impl FromIterator<KeyValueItem> for KeyValueStore {
    fn from_iter<I: IntoIterator<Item = KeyValueItem>>(iter: I) -> Self {
        let mut store = Self { items: iter.into_iter().collect() };
        store.normalize();
        store
    }
}

impl<'a> IntoIterator for &'a KeyValueStore {
    type Item = &'a KeyValueItem;
    type IntoIter = std::slice::Iter<'a, KeyValueItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn compare_keys(a: &KeyValueItem, b: &KeyValueItem) -> Ordering {
    a.key.as_bytes().cmp(b.key.as_bytes())
}

pub(crate) fn truncate_at_nul(s: &mut String) {
    if let Some(end) = s.find('\0') {
        s.truncate(end);
    }
}

pub(crate) fn until_nul(s: &str) -> &str {
    match s.find('\0') {
        Some(end) => &s[..end],
        None => s,
    }
}

fn truncate_to_boundary(s: &str, len: usize) -> &str {
    if len >= s.len() {
        return s;
    }
    let mut end = len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(store: &KeyValueStore) -> Vec<&str> {
        store.iter().map(|item| item.key.as_str()).collect()
    }

    #[test]
    fn set_keeps_keys_sorted_and_unique() {
        let mut store = KeyValueStore::new();
        store.set("user", "alice");
        store.set("type", "ftp");
        store.set("host", "example.com");
        store.set("type", "sftp");

        assert_eq!(keys(&store), ["host", "type", "user"]);
        assert_eq!(store.get("type"), Some("sftp"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn insertion_order_does_not_affect_equality() {
        let mut a = KeyValueStore::new();
        a.set("type", "smb-share");
        a.set("server", "nas");
        let mut b = KeyValueStore::new();
        b.set("server", "nas");
        b.set("type", "smb-share");

        assert_eq!(a, b);
    }

    #[test]
    fn get_missing_key() {
        let store = KeyValueStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("type"), None);
    }

    #[test]
    fn set_with_len_copies_prefix_bytes() {
        let mut store = KeyValueStore::new();
        store.set_with_len("host", "example.com:21", Some(11));
        assert_eq!(store.get("host"), Some("example.com"));

        store.set_with_len("host", "short", Some(64));
        assert_eq!(store.get("host"), Some("short"));

        // 'é' is two bytes; cutting inside it keeps only 'caf'
        store.set_with_len("share", "café", Some(4));
        assert_eq!(store.get("share"), Some("caf"));
    }

    #[test]
    fn values_end_at_nul() {
        let mut store = KeyValueStore::new();
        store.set("user", "alice\0mallory");
        assert_eq!(store.get("user"), Some("alice"));
    }

    #[test]
    fn collected_items_are_sorted_and_last_duplicate_wins() {
        let store: KeyValueStore = [
            KeyValueItem::new("type", "ftp"),
            KeyValueItem::new("host", "a"),
            KeyValueItem::new("host", "b"),
            KeyValueItem::new("host", "c"),
        ]
        .into_iter()
        .collect();

        assert_eq!(keys(&store), ["host", "type"]);
        assert_eq!(store.get("host"), Some("c"));
    }

    #[test]
    fn collected_items_end_at_nul() {
        let store: KeyValueStore =
            [KeyValueItem::new("user\0name", "alice\0mallory"), KeyValueItem::new("type", "ftp")]
                .into_iter()
                .collect();

        assert_eq!(keys(&store), ["type", "user"]);
        assert_eq!(store.get("user"), Some("alice"));
    }
}
