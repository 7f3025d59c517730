//! Object factory
//!
//! [`ObjectFactory`] is the allocation gateway of one execution context.
//! Every constructor picks the shape and the memory space, allocates through
//! the heap and returns the object with every declared field at its default.
//! Operations are grouped by the kind of object they build:
//!
//! - `array`: tagged, copy-on-write, mutant, byte and dictionary arrays
//! - `object`: ordinary JS objects, arrays, proxies, buffers
//! - `function`: methods, functions, bound functions
//! - `clone`: literal and class constructor clones
//! - `records`: fixed-layout records, strings, symbols, realms
//! - `error`: error objects and exception plumbing

mod array;
mod clone;
mod error;
mod function;
pub(crate) mod init;
mod object;
mod records;

pub use error::ErrorType;
pub use function::FunctionKind;
pub use records::CompletionType;

use crate::cell::CellBody;
use crate::dictionary::{Dictionary, DictionaryKind};
use crate::env_constants::{RealmRoots, SharedRoots};
use crate::error::HeapResult;
use crate::heap::ObjectHeap;
use crate::layout::{Payload, layout_of};
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::MemSpace;
use std::sync::Arc;

/// Allocation gateway of one context
pub struct ObjectFactory<'h> {
    heap: &'h mut ObjectHeap,
    realm: Option<Arc<RealmRoots>>,
}

impl<'h> ObjectFactory<'h> {
    /// A factory with no realm yet, for building the realm roots themselves
    ///
    /// Operations that need a realm shape panic on a bootstrap factory.
    pub fn bootstrap(heap: &'h mut ObjectHeap) -> Self {
        Self { heap, realm: None }
    }

    pub fn new(heap: &'h mut ObjectHeap, realm: Arc<RealmRoots>) -> Self {
        Self {
            heap,
            realm: Some(realm),
        }
    }

    pub fn heap(&self) -> &ObjectHeap {
        self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        self.heap
    }

    /// Roots of the current realm
    pub fn realm(&self) -> &RealmRoots {
        match self.realm.as_deref() {
            Some(realm) => realm,
            None => panic!("realm roots requested from a bootstrap factory"),
        }
    }

    pub(crate) fn realm_arc(&self) -> Arc<RealmRoots> {
        match &self.realm {
            Some(realm) => Arc::clone(realm),
            None => panic!("realm roots requested from a bootstrap factory"),
        }
    }

    pub fn roots(&self) -> Arc<SharedRoots> {
        Arc::clone(self.heap.roots())
    }

    /// Store a declared field by its layout name
    pub(crate) fn set_named(&mut self, obj: LocalRef, name: &str, value: TaggedValue) {
        let ty = self.heap.cell(obj).ty();
        let Some(index) = layout_of(ty).field_index(name) else {
            panic!("{ty} has no field {name}");
        };
        self.heap.set_field(obj, index, value);
    }

    /// A default instance of any local type tag
    ///
    /// Kinds with a dispatch initializer are fully constructed; payload kinds
    /// get an empty payload. Panics for tags with no initializer.
    pub fn new_default(&mut self, ty: JsType) -> HeapResult<HeapRef> {
        let shape = self.heap.root_shape(ty);
        if ty.is_ecma_object() || init::init_kind(ty).is_some() {
            return Ok(self.heap.construct(shape, MemSpace::Young)?.into());
        }
        let body = match layout_of(ty).payload {
            Payload::None => CellBody::Empty,
            Payload::TaggedSlots | Payload::RawSlots => CellBody::Elements(Vec::new()),
            Payload::Bytes => CellBody::Bytes(Vec::new()),
            Payload::Chars => CellBody::Text(Box::from("")),
            Payload::Dictionary => CellBody::Dictionary(Box::new(Dictionary::new(DictionaryKind::Name, 0))),
        };
        Ok(self.heap.construct_with_body(shape, MemSpace::Young, body, 0)?.into())
    }

    /// Whether `value` is a callable JS function object
    pub(crate) fn is_function(&self, value: TaggedValue) -> bool {
        value
            .heap_ref()
            .is_some_and(|r| self.heap.type_of(r).is_js_function())
    }
}
