//! Ordered, name-keyed collections with explicit snapshot/restore.

use std::collections::HashMap;
use std::sync::Arc;

/// Items stored in an [`ItemList`] are keyed by their declared name.
pub trait Named {
    fn name(&self) -> &str;
}

/// An insertion-ordered collection of named items.
///
/// Every mutation bumps [`ItemList::version`], which lets callers detect whether
/// a list changed between two points without comparing contents.
#[derive(Debug, Clone)]
pub struct ItemList<T> {
    items: Vec<T>,
    version: u64,
}

/// Point-in-time copy of an [`ItemList`].
///
/// Snapshots are cheap to clone and never observe later mutations of the list
/// they were taken from.
#[derive(Debug, Clone)]
pub struct ItemListSnapshot<T> {
    items: Arc<[T]>,
    version: u64,
}

impl<T> ItemListSnapshot<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Version of the list at the time the snapshot was taken.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            version: 0,
        }
    }
}

impl<T> ItemList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.version += 1;
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        let before = self.items.len();
        self.items.extend(items);
        if self.items.len() != before {
            self.version += 1;
        }
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.version += 1;
        }
    }
}

impl<T: Clone> ItemList<T> {
    pub fn snapshot(&self) -> ItemListSnapshot<T> {
        ItemListSnapshot {
            items: Arc::from(self.items.as_slice()),
            version: self.version,
        }
    }

    /// Replace the contents with those captured in `snapshot`.
    ///
    /// The version keeps increasing: a restored list is a new state, even if its
    /// items equal an earlier one.
    pub fn restore(&mut self, snapshot: &ItemListSnapshot<T>) {
        self.items = snapshot.items.to_vec();
        self.version += 1;
    }
}

impl<T: Named> ItemList<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.iter().rev().find(|item| item.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Named::name)
    }

    /// Collapse items sharing a name into one.
    ///
    /// The surviving item is the last definition; it takes the position of the
    /// first occurrence. Returns the number of removed items.
    pub fn dedup_by_name(&mut self) -> usize {
        let before = self.items.len();
        let mut slots: HashMap<String, usize> = HashMap::with_capacity(before);
        let mut out: Vec<T> = Vec::with_capacity(before);

        for item in self.items.drain(..) {
            match slots.get(item.name()) {
                Some(&slot) => out[slot] = item,
                None => {
                    slots.insert(item.name().to_string(), out.len());
                    out.push(item);
                }
            }
        }

        self.items = out;
        let removed = before - self.items.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }
}

impl<T> IntoIterator for ItemList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ItemList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for ItemList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Var(&'static str, &'static str);

    impl Named for Var {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn values(list: &ItemList<Var>) -> Vec<(&str, &str)> {
        list.iter().map(|v| (v.0, v.1)).collect()
    }

    #[test]
    fn dedup_keeps_last_definition_at_first_position() {
        let mut list: ItemList<Var> = [
            Var("${X}", "1"),
            Var("${Y}", "a"),
            Var("${X}", "2"),
        ]
        .into_iter()
        .collect();

        assert_eq!(list.dedup_by_name(), 1);
        assert_eq!(values(&list), vec![("${X}", "2"), ("${Y}", "a")]);
    }

    #[test]
    fn dedup_without_duplicates_keeps_version() {
        let mut list = ItemList::new();
        list.push(Var("${X}", "1"));
        let version = list.version();
        assert_eq!(list.dedup_by_name(), 0);
        assert_eq!(list.version(), version);
    }

    #[test]
    fn restore_returns_to_snapshot_contents() {
        let mut list = ItemList::new();
        list.push(Var("${X}", "1"));
        let snapshot = list.snapshot();

        list.push(Var("${Y}", "2"));
        list.clear();
        assert!(list.is_empty());

        list.restore(&snapshot);
        assert_eq!(values(&list), vec![("${X}", "1")]);
        assert!(list.version() > snapshot.version());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn get_returns_latest_definition() {
        let mut list = ItemList::new();
        list.push(Var("${X}", "1"));
        list.push(Var("${X}", "2"));
        assert_eq!(list.get("${X}"), Some(&Var("${X}", "2")));
        assert!(!list.contains("${Z}"));
    }
}
