//! Heap context
//!
//! A context owns one local heap and the realms created in it. Every context
//! built on the same [`SharedHeap`] sees the same shared roots.

use crate::env_constants::GlobalEnvConstants;
use crate::error::HeapResult;
use crate::factory::ObjectFactory;
use crate::heap::ObjectHeap;
use crate::realm::{RealmId, RealmRecord, RealmRegistry};
use crate::shared::{SharedHeap, SharedObjectFactory};
use std::sync::Arc;

/// One execution context's heap and realms
pub struct HeapContext {
    heap: ObjectHeap,
    realms: RealmRegistry,
}

impl HeapContext {
    pub fn new(shared: Arc<SharedHeap>) -> HeapResult<Self> {
        Ok(Self {
            heap: ObjectHeap::new(shared)?,
            realms: RealmRegistry::new(),
        })
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    pub fn realms(&self) -> &RealmRegistry {
        &self.realms
    }

    /// Build a realm's constants and register it
    pub fn create_realm(&mut self) -> HeapResult<RealmId> {
        let constants = GlobalEnvConstants::new(&mut self.heap)?;
        let id = self.realms.register(constants);
        tracing::debug!(
            target: "otter::heap::env",
            realm = id,
            cells = self.heap.len(),
            "realm initialized"
        );
        Ok(id)
    }

    /// Unregister a realm, handing back its constants
    pub fn remove_realm(&mut self, realm: RealmId) -> Option<RealmRecord> {
        let record = self.realms.remove(realm)?;
        tracing::debug!(target: "otter::heap::env", realm, "realm removed");
        Some(record)
    }

    /// Constants of a registered realm
    pub fn constants(&self, realm: RealmId) -> Option<GlobalEnvConstants> {
        self.realms.get(realm).cloned()
    }

    /// Factory allocating against `realm`; `None` for an unknown realm
    pub fn factory(&mut self, realm: RealmId) -> Option<ObjectFactory<'_>> {
        let roots = Arc::clone(self.realms.get(realm)?.realm());
        Some(ObjectFactory::new(&mut self.heap, roots))
    }

    pub fn shared_factory(&self) -> HeapResult<SharedObjectFactory<'_>> {
        SharedObjectFactory::new(self.heap.shared_heap())
    }
}
