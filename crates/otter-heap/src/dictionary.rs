//! Hash-table property storage
//!
//! A name dictionary holds string and symbol keys of an object in dictionary
//! mode; a number dictionary holds the indexed elements of a sparse object.
//! Both live in the payload of a `TAGGED_DICTIONARY` cell. Growing past the
//! load limit allocates a fresh cell with a larger table.

use crate::property::{PropertyAttributes, PropertyKey};
use crate::value::TaggedValue;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Entry slot holding the key
pub const ENTRY_KEY_INDEX: usize = 0;
/// Entry slot holding the value
pub const ENTRY_VALUE_INDEX: usize = 1;
/// Entry slot holding the packed attributes
pub const ENTRY_DETAILS_INDEX: usize = 2;
/// Slots per entry
pub const ENTRY_SIZE: usize = 3;
/// Slots before the first entry
pub const TABLE_HEADER_SIZE: usize = 4;

const MIN_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    /// String and symbol keys
    Name,
    /// Integer index keys
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictEntry {
    pub value: TaggedValue,
    pub attributes: PropertyAttributes,
}

/// Insertion-ordered property table
#[derive(Debug, Clone)]
pub struct Dictionary {
    kind: DictionaryKind,
    entries: IndexMap<PropertyKey, DictEntry, FxBuildHasher>,
    capacity: usize,
}

impl Dictionary {
    /// A table sized for `at_least` entries
    pub fn new(kind: DictionaryKind, at_least: usize) -> Self {
        Self {
            kind,
            entries: IndexMap::with_capacity_and_hasher(at_least, FxBuildHasher),
            capacity: Self::compute_capacity(at_least),
        }
    }

    /// Table capacity for `n` entries: the next power of two of `n + n/2`
    pub fn compute_capacity(n: usize) -> usize {
        (n + (n >> 1)).next_power_of_two().max(MIN_CAPACITY)
    }

    pub fn kind(&self) -> DictionaryKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots the backing table occupies
    pub fn slot_count(&self) -> usize {
        TABLE_HEADER_SIZE + self.capacity * ENTRY_SIZE
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&DictEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut DictEntry> {
        self.entries.get_mut(key)
    }

    /// Insertion position of `key`
    pub fn index_of(&self, key: &PropertyKey) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether inserting `key` would push the load past 75%
    pub fn needs_growth_for(&self, key: &PropertyKey) -> bool {
        !self.entries.contains_key(key) && (self.entries.len() + 1) * 4 > self.capacity * 3
    }

    /// Insert or overwrite an entry; the caller grows the table first
    pub fn put(&mut self, key: PropertyKey, value: TaggedValue, attributes: PropertyAttributes) {
        debug_assert_eq!(
            key.is_index(),
            self.kind == DictionaryKind::Number,
            "key {key} in a {:?} dictionary",
            self.kind
        );
        self.entries.insert(key, DictEntry { value, attributes });
    }

    /// Remove an entry keeping the order of the rest
    pub fn remove(&mut self, key: &PropertyKey) -> Option<DictEntry> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &DictEntry)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> + '_ {
        self.entries.keys()
    }

    /// Entry in table position `index`, if occupied
    pub fn entry_at(&self, index: usize) -> Option<(&PropertyKey, &DictEntry)> {
        self.entries.get_index(index)
    }

    /// Copy sized for one more entry
    pub fn grown(&self) -> Self {
        let mut next = self.clone();
        next.capacity = Self::compute_capacity(self.entries.len() + 1).max(self.capacity * 2);
        next
    }

    /// Whether every key and value may live in the shared heap
    pub fn is_shareable(&self) -> bool {
        self.entries
            .iter()
            .all(|(k, e)| k.is_shareable() && e.value.is_shareable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert_eq!(Dictionary::compute_capacity(0), 4);
        assert_eq!(Dictionary::compute_capacity(2), 4);
        assert_eq!(Dictionary::compute_capacity(6), 16);
        assert_eq!(Dictionary::compute_capacity(10), 16);
        assert_eq!(Dictionary::compute_capacity(11), 16);
        assert_eq!(Dictionary::compute_capacity(12), 32);
    }

    #[test]
    fn test_growth_threshold() {
        let mut dict = Dictionary::new(DictionaryKind::Name, 0);
        dict.put("a".into(), TaggedValue::Int(1), PropertyAttributes::data());
        dict.put("b".into(), TaggedValue::Int(2), PropertyAttributes::data());
        dict.put("c".into(), TaggedValue::Int(3), PropertyAttributes::data());
        assert!(dict.needs_growth_for(&"d".into()));
        assert!(!dict.needs_growth_for(&"a".into()));

        let grown = dict.grown();
        assert_eq!(grown.capacity(), 8);
        assert_eq!(grown.len(), 3);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut dict = Dictionary::new(DictionaryKind::Name, 4);
        for key in ["a", "b", "c"] {
            dict.put(key.into(), TaggedValue::UNDEFINED, PropertyAttributes::data());
        }
        dict.remove(&"b".into());
        let keys: Vec<_> = dict.keys().cloned().collect();
        assert_eq!(keys, vec![PropertyKey::from("a"), PropertyKey::from("c")]);
    }
}
