//! Context-local object heap
//!
//! `ObjectHeap` owns the cells and the shape arena of one execution context
//! and holds a handle to the process-wide [`SharedHeap`]. Every allocation
//! goes through [`ObjectHeap::allocate_raw`], which enforces the sharedness
//! contract: local heaps never allocate into shared spaces and never install
//! a shape flagged shared.

use crate::cell::{CellBody, HeapCell};
use crate::config::HeapConfig;
use crate::env_constants::SharedRoots;
use crate::error::{HeapError, HeapResult};
use crate::factory::init;
use crate::dictionary::{Dictionary, ENTRY_SIZE, ENTRY_VALUE_INDEX, TABLE_HEADER_SIZE};
use crate::layout::{TAGGED_SIZE, layout_of, tagged_array};
use crate::shape::{Shape, ShapeArena, ShapeId, ShapeRef};
use crate::shared::SharedHeap;
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::{BarrierStats, HeapAddress, LocalSpaces, MemSpace, WriteBarrier};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Heap of one execution context
pub struct ObjectHeap {
    config: HeapConfig,
    cells: Vec<HeapCell>,
    shapes: ShapeArena,
    spaces: LocalSpaces,
    barrier: WriteBarrier,
    shared: Arc<SharedHeap>,
    roots: Arc<SharedRoots>,
    pending_exception: Option<TaggedValue>,
    alloc_counts: FxHashMap<JsType, usize>,
    /// Instance shape of each constructor that has been instantiated
    initial_shapes: FxHashMap<HeapRef, ShapeRef>,
    /// Property-less local root of each ECMA kind
    local_roots: FxHashMap<JsType, ShapeId>,
}

impl ObjectHeap {
    /// Create a heap attached to a shared heap, using its configuration
    pub fn new(shared: Arc<SharedHeap>) -> HeapResult<Self> {
        let config = shared.config().clone();
        Self::with_config(shared, config)
    }

    pub fn with_config(shared: Arc<SharedHeap>, config: HeapConfig) -> HeapResult<Self> {
        let roots = shared.roots()?;
        Ok(Self {
            spaces: LocalSpaces::with_config(config.spaces.clone()),
            shapes: ShapeArena::new(false, config.size_tracking_count),
            config,
            cells: Vec::new(),
            barrier: WriteBarrier::new(),
            shared,
            roots,
            pending_exception: None,
            alloc_counts: FxHashMap::default(),
            initial_shapes: FxHashMap::default(),
            local_roots: FxHashMap::default(),
        })
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn shared_heap(&self) -> &Arc<SharedHeap> {
        &self.shared
    }

    /// Process-wide roots
    pub fn roots(&self) -> &Arc<SharedRoots> {
        &self.roots
    }

    pub fn shapes(&self) -> &ShapeArena {
        &self.shapes
    }

    pub(crate) fn shapes_mut(&mut self) -> &mut ShapeArena {
        &mut self.shapes
    }

    /// Number of local cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn spaces(&self) -> &LocalSpaces {
        &self.spaces
    }

    pub fn cell(&self, obj: LocalRef) -> &HeapCell {
        &self.cells[obj.index()]
    }

    pub(crate) fn cell_mut(&mut self, obj: LocalRef) -> &mut HeapCell {
        &mut self.cells[obj.index()]
    }

    /// Run `f` on a local or shared cell
    ///
    /// `f` must not call back into the heap: shared cells are read under the
    /// shared heap lock.
    pub fn with_cell<R>(&self, obj: HeapRef, f: impl FnOnce(&HeapCell) -> R) -> R {
        match obj {
            HeapRef::Local(local) => f(self.cell(local)),
            HeapRef::Shared(shared) => self.shared.with_cell(shared, f),
        }
    }

    pub(crate) fn with_cell_mut<R>(&mut self, obj: HeapRef, f: impl FnOnce(&mut HeapCell) -> R) -> R {
        match obj {
            HeapRef::Local(local) => f(self.cell_mut(local)),
            HeapRef::Shared(shared) => self.shared.with_cell_mut(shared, f),
        }
    }

    /// Run `f` on a local or shared shape
    pub fn with_shape<R>(&self, shape: ShapeRef, f: impl FnOnce(&Shape) -> R) -> R {
        match shape {
            ShapeRef::Local(id) => f(self.shapes.get(id)),
            ShapeRef::Shared(id) => self.shared.with_shape(id, f),
        }
    }

    /// Run `f` on the arena that owns `shape`
    pub(crate) fn with_arena_mut<R>(
        &mut self,
        shape: ShapeRef,
        f: impl FnOnce(&mut ShapeArena, ShapeId) -> R,
    ) -> R {
        match shape {
            ShapeRef::Local(id) => f(&mut self.shapes, id),
            ShapeRef::Shared(id) => self.shared.with_arena_mut(|arena| f(arena, id)),
        }
    }

    /// Instance shape recorded for a constructor
    pub fn initial_shape(&self, ctor: HeapRef) -> Option<ShapeRef> {
        self.initial_shapes.get(&ctor).copied()
    }

    pub(crate) fn set_initial_shape(&mut self, ctor: HeapRef, shape: ShapeRef) {
        self.initial_shapes.insert(ctor, shape);
    }

    /// Property-less root shape of a kind with a null prototype
    ///
    /// ECMA object kinds get a cached local root; every other kind uses the
    /// shared record shape.
    pub fn root_shape(&mut self, ty: JsType) -> ShapeRef {
        if !ty.is_ecma_object() {
            return self.roots.record_shape(ty);
        }
        if let Some(&id) = self.local_roots.get(&ty) {
            return ShapeRef::Local(id);
        }
        let id = self.shapes.create_root(ty, 0, TaggedValue::NULL);
        self.local_roots.insert(ty, id);
        ShapeRef::Local(id)
    }

    pub fn shape_of(&self, obj: HeapRef) -> ShapeRef {
        self.with_cell(obj, HeapCell::shape)
    }

    pub fn type_of(&self, obj: HeapRef) -> JsType {
        self.with_cell(obj, HeapCell::ty)
    }

    /// A copy of the cell's shape
    pub fn shape_snapshot(&self, obj: HeapRef) -> Shape {
        let shape = self.shape_of(obj);
        self.with_shape(shape, Shape::clone)
    }

    /// Install another shape on a cell
    ///
    /// The new shape must describe the same type and belong to the object's
    /// domain.
    pub(crate) fn set_shape(&mut self, obj: HeapRef, shape: ShapeRef) {
        debug_assert_eq!(self.with_shape(shape, Shape::ty), self.type_of(obj));
        if self.with_shape(shape, Shape::is_shared) && !obj.is_shared() {
            panic!("shared shape installed on a local object");
        }
        if obj.is_shared() && !shape.is_shared() {
            panic!("local shape installed on a shared object");
        }
        self.with_cell_mut(obj, |cell| cell.shape = shape);
    }

    pub fn field(&self, obj: HeapRef, index: usize) -> TaggedValue {
        self.with_cell(obj, |cell| cell.field(index))
    }

    /// Field of a cell by its layout name
    pub fn field_by_name(&self, obj: HeapRef, name: &str) -> Option<TaggedValue> {
        let ty = self.type_of(obj);
        let index = layout_of(ty).field_index(name)?;
        Some(self.field(obj, index))
    }

    fn target_space(&self, value: TaggedValue) -> Option<MemSpace> {
        match value.heap_ref()? {
            HeapRef::Local(local) => Some(self.cell(local).address.space),
            HeapRef::Shared(_) => Some(MemSpace::SharedOld),
        }
    }

    fn record_write(&mut self, holder: LocalRef, slot: usize, value: TaggedValue) {
        let target = self.target_space(value);
        let address = self.cell(holder).address;
        self.barrier.on_write(address, slot, target);
    }

    /// Store a field of a local cell through the write barrier
    pub fn set_field(&mut self, obj: LocalRef, index: usize, value: TaggedValue) {
        let ty = self.cell(obj).ty;
        let slot = layout_of(ty).fields()[index].offset / TAGGED_SIZE;
        self.record_write(obj, slot, value);
        self.cell_mut(obj).fields[index] = value;
    }

    /// Store into a freshly allocated cell without barrier bookkeeping
    ///
    /// Only primitives and shared references qualify: neither can create an
    /// old-to-young edge.
    pub(crate) fn set_field_skip_barrier(&mut self, obj: LocalRef, index: usize, value: TaggedValue) {
        assert!(
            value.is_primitive_word() || value.shared_ref().is_some(),
            "barrier skipped for a local reference"
        );
        self.barrier.skip();
        self.cell_mut(obj).fields[index] = value;
    }

    /// Store a field of any cell; shared cells accept only shareable values
    pub(crate) fn write_field(&mut self, obj: HeapRef, index: usize, value: TaggedValue) -> HeapResult<()> {
        match obj {
            HeapRef::Local(local) => {
                self.set_field(local, index, value);
                Ok(())
            }
            HeapRef::Shared(shared) => self.shared.write_field(shared, index, value),
        }
    }

    pub fn inline_value(&self, obj: HeapRef, index: usize) -> TaggedValue {
        self.with_cell(obj, |cell| cell.inline[index])
    }

    pub(crate) fn set_inline(&mut self, obj: HeapRef, index: usize, value: TaggedValue) -> HeapResult<()> {
        match obj {
            HeapRef::Local(local) => {
                let ty = self.cell(local).ty;
                let slot = layout_of(ty).end_offset() / TAGGED_SIZE + index;
                self.record_write(local, slot, value);
                self.cell_mut(local).inline[index] = value;
                Ok(())
            }
            HeapRef::Shared(shared) => self.shared.write_inline(shared, index, value),
        }
    }

    /// Store one payload slot of an array cell
    pub(crate) fn set_array_value(&mut self, array: HeapRef, index: usize, value: TaggedValue) -> HeapResult<()> {
        match array {
            HeapRef::Local(local) => {
                let ty = self.cell(local).ty;
                let Some(values) = self.cell_mut(local).elements_mut() else {
                    panic!("{ty} cell has no element payload");
                };
                values[index] = value;
                let slot = layout_of(ty).end_offset() / TAGGED_SIZE + index;
                self.record_write(local, slot, value);
                Ok(())
            }
            HeapRef::Shared(shared) => self.shared.write_array_value(shared, index, value),
        }
    }

    /// Elements of an array cell
    pub fn array_values(&self, array: HeapRef) -> Vec<TaggedValue> {
        self.with_cell(array, |cell| cell.elements().map(<[_]>::to_vec).unwrap_or_default())
    }

    /// Length of an array cell's payload
    pub fn array_len(&self, array: HeapRef) -> usize {
        self.with_cell(array, |cell| cell.elements().map_or(0, <[_]>::len))
    }

    pub fn pending_exception(&self) -> Option<TaggedValue> {
        self.pending_exception
    }

    pub fn has_pending_exception(&self) -> bool {
        self.pending_exception.is_some()
    }

    pub fn set_pending_exception(&mut self, exception: TaggedValue) {
        self.pending_exception = Some(exception);
    }

    pub fn clear_pending_exception(&mut self) -> Option<TaggedValue> {
        self.pending_exception.take()
    }

    pub fn barrier(&self) -> &WriteBarrier {
        &self.barrier
    }

    pub fn barrier_stats(&self) -> BarrierStats {
        self.barrier.stats()
    }

    /// Objects of `ty` allocated by this heap
    pub fn allocation_count(&self, ty: JsType) -> usize {
        self.alloc_counts.get(&ty).copied().unwrap_or(0)
    }

    /// Reserve raw storage for an object with `shape`
    ///
    /// Panics when the request breaks the sharedness contract.
    pub(crate) fn allocate_raw(&mut self, shape: ShapeRef, space: MemSpace, size: usize) -> HeapResult<HeapAddress> {
        if space.is_shared() {
            panic!("shared space {space} requested from a local heap");
        }
        if self.with_shape(shape, Shape::is_shared) {
            panic!("shared shape cannot be allocated into local space {space}");
        }
        let address = match space {
            MemSpace::Young => self.spaces.allocate_young_or_huge(size),
            MemSpace::Old | MemSpace::Huge => self.spaces.allocate_old_or_huge(size),
            MemSpace::NonMovable => self.spaces.allocate_non_movable_or_huge(size),
            MemSpace::ReadOnly => self.spaces.allocate_read_only_or_huge(size),
            MemSpace::SharedOld | MemSpace::SharedNonMovable | MemSpace::SharedReadOnly => {
                unreachable!("shared spaces are rejected above")
            }
        };
        address.ok_or_else(|| {
            tracing::warn!(target: "otter::heap", %space, requested = size, "allocation failed");
            HeapError::OutOfMemory {
                space,
                requested: size,
            }
        })
    }

    fn push_cell(&mut self, cell: HeapCell) -> LocalRef {
        *self.alloc_counts.entry(cell.ty).or_default() += 1;
        let obj = LocalRef::new(self.cells.len() as u32);
        self.cells.push(cell);
        obj
    }

    /// Allocate and fully initialize an object with a dispatch-initialized type
    pub(crate) fn construct(&mut self, shape: ShapeRef, space: MemSpace) -> HeapResult<LocalRef> {
        let snapshot = self.with_shape(shape, Shape::clone);
        let address = self.allocate_raw(shape, space, snapshot.object_size())?;
        let tracking = snapshot.inline_capacity() > 0
            && self.with_arena_mut(shape, |arena, id| arena.on_instantiation(id));
        let mut cell = init::prefill(&snapshot, shape, address, snapshot.object_size(), tracking);
        init::initialize_object(&mut cell, &snapshot, Some(&self.roots));
        Ok(self.push_cell(cell))
    }

    /// Allocate a cell with a variable-size payload
    ///
    /// Declared fields receive their layout defaults; the caller sets the
    /// length fields.
    pub(crate) fn construct_with_body(
        &mut self,
        shape: ShapeRef,
        space: MemSpace,
        body: CellBody,
        payload_size: usize,
    ) -> HeapResult<LocalRef> {
        let snapshot = self.with_shape(shape, Shape::clone);
        let size = snapshot.object_size() + payload_size;
        let address = self.allocate_raw(shape, space, size)?;
        let mut cell = init::prefill(&snapshot, shape, address, size, false);
        init::fill_declared(&mut cell, Some(&self.roots));
        cell.body = body;
        Ok(self.push_cell(cell))
    }

    /// Allocate a length-prefixed array cell of kind `ty` holding `values`
    pub(crate) fn allocate_tagged_array(
        &mut self,
        ty: JsType,
        values: Vec<TaggedValue>,
        space: MemSpace,
    ) -> HeapResult<LocalRef> {
        debug_assert!(ty.is_tagged_array());
        let shape = self.roots.record_shape(ty);
        let len = values.len();
        let array = self.construct_with_body(shape, space, CellBody::Elements(values), len * TAGGED_SIZE)?;
        self.set_field_skip_barrier(array, tagged_array::LENGTH, init::primitive_u32(len as u32));
        if space != MemSpace::Young {
            let first = layout_of(ty).end_offset() / TAGGED_SIZE;
            for (i, value) in self.array_values(array.into()).into_iter().enumerate() {
                if value.local_ref().is_some() {
                    self.record_write(array, first + i, value);
                }
            }
        }
        Ok(array)
    }

    /// Allocate a `TAGGED_DICTIONARY` cell holding `dict`
    pub(crate) fn allocate_dictionary(&mut self, dict: Dictionary, space: MemSpace) -> HeapResult<LocalRef> {
        let shape = self.roots.record_shape(JsType::TaggedDictionary);
        let slots = dict.slot_count();
        let refs: Vec<(usize, TaggedValue)> = dict
            .iter()
            .enumerate()
            .filter(|(_, (_, entry))| entry.value.local_ref().is_some())
            .map(|(i, (_, entry))| (TABLE_HEADER_SIZE + i * ENTRY_SIZE + ENTRY_VALUE_INDEX, entry.value))
            .collect();
        let cell = self.construct_with_body(
            shape,
            space,
            CellBody::Dictionary(Box::new(dict)),
            slots * TAGGED_SIZE,
        )?;
        self.set_field_skip_barrier(cell, tagged_array::LENGTH, init::primitive_u32(slots as u32));
        for (payload_slot, value) in refs {
            self.record_payload_write(cell, payload_slot, value);
        }
        Ok(cell)
    }

    /// Record a store into the payload of a local cell
    pub(crate) fn record_payload_write(&mut self, holder: LocalRef, payload_slot: usize, value: TaggedValue) {
        let ty = self.cell(holder).ty;
        let slot = layout_of(ty).end_offset() / TAGGED_SIZE + payload_slot;
        self.record_write(holder, slot, value);
    }
}
