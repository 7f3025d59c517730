//! Shared heap
//!
//! The shared heap holds the objects every execution context may reference:
//! sendable JS objects plus the immutable roots (record shapes, empty
//! containers, built-in accessors). Cells and shapes sit behind one
//! `RwLock`; the roots are built once under a `Mutex` and then handed out by
//! `Arc`.

mod closure;
mod factory;

pub use closure::verify_shared_closure;
pub use factory::{SendableClass, SendableClassSpec, SharedObjectFactory};

use crate::cell::{CellBody, HeapCell};
use crate::config::HeapConfig;
use crate::dictionary::Dictionary;
use crate::env_constants::SharedRoots;
use crate::error::{HeapError, HeapResult};
use crate::factory::init;
use crate::layout::{TAGGED_SIZE, tagged_array};
use crate::shape::{Shape, ShapeArena, ShapeId, ShapeRef};
use crate::types::JsType;
use crate::value::{SharedRef, TaggedValue};
use otter_heap_gc::{HeapAddress, MemSpace, SharedSpaces};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;

struct SharedState {
    cells: Vec<HeapCell>,
    shapes: ShapeArena,
    alloc_counts: FxHashMap<JsType, usize>,
    /// Instance shape of each sendable class constructor
    initial_shapes: FxHashMap<SharedRef, ShapeId>,
}

/// Process-wide heap of shared objects
pub struct SharedHeap {
    config: HeapConfig,
    spaces: SharedSpaces,
    state: RwLock<SharedState>,
    roots: Mutex<Option<Arc<SharedRoots>>>,
}

pub(crate) fn check_store(value: TaggedValue) -> HeapResult<()> {
    if value.is_shareable() {
        Ok(())
    } else {
        Err(HeapError::type_error(
            "shared object cannot reference a non-shared value",
        ))
    }
}

impl SharedHeap {
    pub fn new(config: HeapConfig) -> Self {
        Self {
            spaces: SharedSpaces::with_config(&config.spaces),
            state: RwLock::new(SharedState {
                cells: Vec::new(),
                shapes: ShapeArena::new(true, config.size_tracking_count),
                alloc_counts: FxHashMap::default(),
                initial_shapes: FxHashMap::default(),
            }),
            roots: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn spaces(&self) -> &SharedSpaces {
        &self.spaces
    }

    /// The shared roots, built on first use
    pub fn roots(&self) -> HeapResult<Arc<SharedRoots>> {
        let mut slot = self.roots.lock();
        if let Some(roots) = slot.as_ref() {
            return Ok(Arc::clone(roots));
        }
        let roots = Arc::new(SharedRoots::build(self)?);
        tracing::debug!(
            target: "otter::heap::env",
            cells = self.len(),
            "shared roots initialized"
        );
        *slot = Some(Arc::clone(&roots));
        Ok(roots)
    }

    /// The shared roots if they were already built
    pub fn try_roots(&self) -> Option<Arc<SharedRoots>> {
        self.roots.lock().clone()
    }

    /// Number of shared cells
    pub fn len(&self) -> usize {
        self.state.read().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn allocation_count(&self, ty: JsType) -> usize {
        self.state.read().alloc_counts.get(&ty).copied().unwrap_or(0)
    }

    pub fn with_cell<R>(&self, obj: SharedRef, f: impl FnOnce(&HeapCell) -> R) -> R {
        let state = self.state.read();
        f(&state.cells[obj.index()])
    }

    pub(crate) fn with_cell_mut<R>(&self, obj: SharedRef, f: impl FnOnce(&mut HeapCell) -> R) -> R {
        let mut state = self.state.write();
        f(&mut state.cells[obj.index()])
    }

    pub fn with_shape<R>(&self, id: ShapeId, f: impl FnOnce(&Shape) -> R) -> R {
        let state = self.state.read();
        f(state.shapes.get(id))
    }

    pub fn with_arena<R>(&self, f: impl FnOnce(&ShapeArena) -> R) -> R {
        f(&self.state.read().shapes)
    }

    pub(crate) fn with_arena_mut<R>(&self, f: impl FnOnce(&mut ShapeArena) -> R) -> R {
        f(&mut self.state.write().shapes)
    }

    /// Instance shape recorded for a sendable class constructor
    pub fn initial_shape(&self, ctor: SharedRef) -> Option<ShapeId> {
        self.state.read().initial_shapes.get(&ctor).copied()
    }

    pub(crate) fn set_initial_shape(&self, ctor: SharedRef, shape: ShapeId) {
        self.state.write().initial_shapes.insert(ctor, shape);
    }

    /// Install another shared shape on a shared cell
    pub(crate) fn set_shape(&self, obj: SharedRef, shape: ShapeId) {
        self.with_cell_mut(obj, |cell| cell.shape = ShapeRef::Shared(shape));
    }

    pub fn field(&self, obj: SharedRef, index: usize) -> TaggedValue {
        self.with_cell(obj, |cell| cell.field(index))
    }

    pub fn inline_value(&self, obj: SharedRef, index: usize) -> TaggedValue {
        self.with_cell(obj, |cell| cell.inline[index])
    }

    pub fn type_of(&self, obj: SharedRef) -> JsType {
        self.with_cell(obj, |cell| cell.ty)
    }

    pub fn shape_of(&self, obj: SharedRef) -> ShapeId {
        self.with_cell(obj, |cell| cell.shape.id())
    }

    pub(crate) fn write_field(&self, obj: SharedRef, index: usize, value: TaggedValue) -> HeapResult<()> {
        check_store(value)?;
        self.with_cell_mut(obj, |cell| cell.fields[index] = value);
        Ok(())
    }

    pub(crate) fn write_inline(&self, obj: SharedRef, index: usize, value: TaggedValue) -> HeapResult<()> {
        check_store(value)?;
        self.with_cell_mut(obj, |cell| cell.inline[index] = value);
        Ok(())
    }

    pub(crate) fn write_array_value(&self, array: SharedRef, index: usize, value: TaggedValue) -> HeapResult<()> {
        check_store(value)?;
        self.with_cell_mut(array, |cell| {
            let ty = cell.ty();
            let Some(values) = cell.elements_mut() else {
                panic!("{ty} cell has no element payload");
            };
            values[index] = value;
        });
        Ok(())
    }

    /// Reserve raw storage in a shared space
    pub(crate) fn allocate_raw(&self, space: MemSpace, size: usize) -> HeapResult<HeapAddress> {
        let address = match space {
            MemSpace::SharedOld => self.spaces.allocate_old_or_huge(size),
            MemSpace::SharedNonMovable => self.spaces.allocate_non_movable(size),
            MemSpace::SharedReadOnly => self.spaces.allocate_read_only(size),
            local => panic!("local space {local} requested from the shared heap"),
        };
        address.ok_or_else(|| {
            tracing::warn!(target: "otter::heap::shared", %space, requested = size, "allocation failed");
            HeapError::OutOfMemory {
                space,
                requested: size,
            }
        })
    }

    fn push_cell(state: &mut SharedState, cell: HeapCell) -> SharedRef {
        *state.alloc_counts.entry(cell.ty).or_default() += 1;
        let obj = SharedRef::new(state.cells.len() as u32);
        state.cells.push(cell);
        obj
    }

    /// Allocate and fully initialize a shared object
    pub(crate) fn construct(
        &self,
        shape: ShapeId,
        space: MemSpace,
        roots: Option<&SharedRoots>,
    ) -> HeapResult<SharedRef> {
        let snapshot = self.with_shape(shape, Shape::clone);
        let address = self.allocate_raw(space, snapshot.object_size())?;
        let mut state = self.state.write();
        let tracking = snapshot.inline_capacity() > 0 && state.shapes.on_instantiation(shape);
        let mut cell = init::prefill(
            &snapshot,
            ShapeRef::Shared(shape),
            address,
            snapshot.object_size(),
            tracking,
        );
        init::initialize_object(&mut cell, &snapshot, roots);
        Ok(Self::push_cell(&mut state, cell))
    }

    /// Allocate a shared cell with a variable-size payload
    pub(crate) fn construct_with_body(
        &self,
        shape: ShapeId,
        space: MemSpace,
        body: CellBody,
        payload_size: usize,
        roots: Option<&SharedRoots>,
    ) -> HeapResult<SharedRef> {
        let snapshot = self.with_shape(shape, Shape::clone);
        let size = snapshot.object_size() + payload_size;
        let address = self.allocate_raw(space, size)?;
        let mut cell = init::prefill(&snapshot, ShapeRef::Shared(shape), address, size, false);
        init::fill_declared(&mut cell, roots);
        cell.body = body;
        Ok(Self::push_cell(&mut self.state.write(), cell))
    }
}

impl SharedHeap {
    /// Allocate a shared array cell of kind `ty`; every value must be shareable
    pub(crate) fn allocate_tagged_array(
        &self,
        roots: &SharedRoots,
        ty: JsType,
        values: Vec<TaggedValue>,
        space: MemSpace,
    ) -> HeapResult<SharedRef> {
        debug_assert!(ty.is_tagged_array());
        values.iter().copied().try_for_each(check_store)?;
        let len = values.len();
        let shape = roots.record_shape(ty).id();
        let array = self.construct_with_body(shape, space, CellBody::Elements(values), len * TAGGED_SIZE, Some(roots))?;
        self.write_field(array, tagged_array::LENGTH, init::primitive_u32(len as u32))?;
        Ok(array)
    }

    /// Allocate a shared dictionary cell holding `dict`
    pub(crate) fn allocate_dictionary(
        &self,
        roots: &SharedRoots,
        dict: Dictionary,
        space: MemSpace,
    ) -> HeapResult<SharedRef> {
        if !dict.is_shareable() {
            return Err(HeapError::type_error(
                "shared object cannot reference a non-shared value",
            ));
        }
        let slots = dict.slot_count();
        let shape = roots.record_shape(JsType::TaggedDictionary).id();
        let cell = self.construct_with_body(
            shape,
            space,
            CellBody::Dictionary(Box::new(dict)),
            slots * TAGGED_SIZE,
            Some(roots),
        )?;
        self.write_field(cell, tagged_array::LENGTH, init::primitive_u32(slots as u32))?;
        Ok(cell)
    }
}

impl Default for SharedHeap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_are_built_once() {
        let heap = SharedHeap::default();
        assert!(heap.try_roots().is_none());
        let first = heap.roots().unwrap();
        let cells = heap.len();
        let second = heap.roots().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(heap.len(), cells);
    }

    #[test]
    #[should_panic(expected = "requested from the shared heap")]
    fn test_local_space_rejected() {
        let _ = SharedHeap::default().allocate_raw(MemSpace::Young, 16);
    }

    #[test]
    fn test_store_check() {
        use crate::value::LocalRef;
        assert!(check_store(TaggedValue::Int(3)).is_ok());
        assert!(check_store(TaggedValue::from(SharedRef::new(0))).is_ok());
        assert!(matches!(
            check_store(TaggedValue::from(LocalRef::new(0))),
            Err(HeapError::TypeError(_))
        ));
    }
}
