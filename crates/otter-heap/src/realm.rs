//! Realms of one context
//!
//! Each realm owns its realm roots; every realm of a context holds the same
//! shared roots. Ids are handed out in creation order and never reused, so a
//! stale id resolves to nothing.

use crate::env_constants::GlobalEnvConstants;
use crate::value::TaggedValue;
use std::collections::BTreeMap;

/// Realm identifier, unique within its context
pub type RealmId = u32;

/// A removed realm and the constants it owned
#[derive(Debug, Clone)]
pub struct RealmRecord {
    pub id: RealmId,
    pub constants: GlobalEnvConstants,
}

/// Realm constants keyed by id, in creation order
#[derive(Debug, Default)]
pub struct RealmRegistry {
    realms: BTreeMap<RealmId, GlobalEnvConstants>,
    next_id: RealmId,
}

impl RealmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register freshly built constants under the next id
    pub(crate) fn register(&mut self, constants: GlobalEnvConstants) -> RealmId {
        let id = self.next_id;
        self.next_id += 1;
        self.realms.insert(id, constants);
        id
    }

    pub fn get(&self, id: RealmId) -> Option<&GlobalEnvConstants> {
        self.realms.get(&id)
    }

    /// Drop a realm; its realm roots stop being roots
    pub(crate) fn remove(&mut self, id: RealmId) -> Option<RealmRecord> {
        self.realms
            .remove(&id)
            .map(|constants| RealmRecord { id, constants })
    }

    pub fn ids(&self) -> impl Iterator<Item = RealmId> + '_ {
        self.realms.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }

    /// Realm roots of every live realm
    ///
    /// Shared roots are enumerated once by the shared heap, not per realm.
    pub fn iter_roots(&self) -> impl Iterator<Item = TaggedValue> + '_ {
        self.realms.values().flat_map(|constants| constants.realm().iter_roots())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ObjectHeap;
    use crate::shared::SharedHeap;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_not_reused() {
        let mut heap = ObjectHeap::new(Arc::new(SharedHeap::default())).unwrap();
        let mut realms = RealmRegistry::new();
        let first = realms.register(GlobalEnvConstants::new(&mut heap).unwrap());
        let second = realms.register(GlobalEnvConstants::new(&mut heap).unwrap());
        assert_eq!((first, second), (0, 1));

        let removed = realms.remove(first).unwrap();
        assert_eq!(removed.id, first);
        let third = realms.register(removed.constants);
        assert_eq!(third, 2);
        assert!(realms.get(first).is_none());
        assert_eq!(realms.ids().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_roots_cover_every_realm() {
        let mut heap = ObjectHeap::new(Arc::new(SharedHeap::default())).unwrap();
        let mut realms = RealmRegistry::new();
        let a = realms.register(GlobalEnvConstants::new(&mut heap).unwrap());
        let b = realms.register(GlobalEnvConstants::new(&mut heap).unwrap());

        let roots: Vec<TaggedValue> = realms.iter_roots().collect();
        for id in [a, b] {
            let proto = TaggedValue::from(realms.get(id).unwrap().realm().object_prototype());
            assert!(roots.iter().any(|root| root.same_word(proto)));
        }
    }
}
