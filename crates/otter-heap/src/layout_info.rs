//! Ordered property layout tables
//!
//! A `LayoutInfo` is a prefix view over a table shared along a transition
//! chain. Extending the view that ends at the table's tail appends in place;
//! extending any shorter view copies its prefix first. Entries inside a view
//! never change and an entry's offset is its position, so offsets grow
//! strictly with insertion order and are never reused.

use crate::property::{PropertyAttributes, PropertyKey};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One layout entry
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub key: PropertyKey,
    pub attributes: PropertyAttributes,
}

#[derive(Debug, Default)]
struct LayoutTable {
    entries: Vec<LayoutEntry>,
    /// Cache of key positions, including entries past shorter views
    index: FxHashMap<PropertyKey, usize>,
}

/// Property key to attributes table in insertion order
#[derive(Debug, Clone, Default)]
pub struct LayoutInfo {
    table: Arc<RwLock<LayoutTable>>,
    len: usize,
}

impl LayoutInfo {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry at a position
    pub fn get(&self, index: usize) -> Option<LayoutEntry> {
        if index >= self.len {
            return None;
        }
        self.table.read().entries.get(index).cloned()
    }

    /// Position and attributes of a key
    pub fn find(&self, key: &PropertyKey) -> Option<(usize, PropertyAttributes)> {
        let table = self.table.read();
        table
            .index
            .get(key)
            .filter(|&&i| i < self.len)
            .map(|&i| (i, table.entries[i].attributes))
    }

    /// Entries in insertion order
    pub fn entries(&self) -> Vec<LayoutEntry> {
        self.table.read().entries[..self.len].to_vec()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.table.read().entries[..self.len].iter().map(|e| e.key.clone()).collect()
    }

    /// Offset the next entry receives
    pub fn next_offset(&self) -> u32 {
        self.len as u32
    }

    /// Whether both views read the same backing table
    pub fn shares_table_with(&self, other: &LayoutInfo) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }

    /// This layout with one more entry
    ///
    /// The entry's offset must be `next_offset()`; the key must be new.
    pub(crate) fn extended(&self, key: PropertyKey, attributes: PropertyAttributes) -> LayoutInfo {
        assert_eq!(
            attributes.offset(),
            self.next_offset(),
            "layout offsets are assigned in insertion order"
        );
        assert!(self.find(&key).is_none(), "duplicate key {key} in layout");

        let mut table = self.table.write();
        if table.entries.len() == self.len {
            table.index.insert(key.clone(), self.len);
            table.entries.push(LayoutEntry { key, attributes });
            return LayoutInfo {
                table: Arc::clone(&self.table),
                len: self.len + 1,
            };
        }

        let mut entries = table.entries[..self.len].to_vec();
        drop(table);
        entries.push(LayoutEntry { key, attributes });
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();
        LayoutInfo {
            table: Arc::new(RwLock::new(LayoutTable { entries, index })),
            len: self.len + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extend(layout: &LayoutInfo, key: &str) -> LayoutInfo {
        let attrs = PropertyAttributes::data().with_offset(layout.next_offset());
        layout.extended(key.into(), attrs)
    }

    #[test]
    fn test_extension_keeps_original() {
        let base = extend(&LayoutInfo::new(), "a");
        let next = extend(&base, "b");

        assert_eq!(base.len(), 1);
        assert_eq!(next.len(), 2);
        assert_eq!(next.find(&"b".into()).map(|(i, a)| (i, a.offset())), Some((1, 1)));
        assert!(base.find(&"b".into()).is_none());
        assert!(base.get(1).is_none());
        assert_eq!(base.keys(), vec![PropertyKey::from("a")]);
    }

    #[test]
    fn test_chain_shares_one_table() {
        let a = extend(&LayoutInfo::new(), "a");
        let b = extend(&a, "b");
        let c = extend(&b, "c");

        assert!(a.shares_table_with(&c));
        assert_eq!(c.keys(), vec![PropertyKey::from("a"), PropertyKey::from("b"), PropertyKey::from("c")]);
    }

    #[test]
    fn test_diverging_branch_copies_its_prefix() {
        let a = extend(&LayoutInfo::new(), "a");
        let ab = extend(&a, "b");
        let ac = extend(&a, "c");

        assert!(a.shares_table_with(&ab));
        assert!(!a.shares_table_with(&ac));
        assert!(ac.find(&"b".into()).is_none());
        assert_eq!(ac.find(&"c".into()).map(|(i, _)| i), Some(1));
        assert!(ab.find(&"c".into()).is_none());

        // The tail of the shared table is claimed, so re-adding "b" on `a`
        // with other attributes also copies
        let attrs = PropertyAttributes::frozen().with_offset(1);
        let ab_frozen = a.extended("b".into(), attrs);
        assert!(!ab_frozen.shares_table_with(&ab));
        assert!(ab.find(&"b".into()).is_some_and(|(_, attrs)| attrs.is_writable()));
    }

    #[test]
    #[should_panic(expected = "duplicate key")]
    fn test_duplicate_key_rejected() {
        let base = extend(&LayoutInfo::new(), "a");
        let _ = extend(&base, "a");
    }
}
