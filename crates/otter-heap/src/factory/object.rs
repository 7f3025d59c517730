use super::ObjectFactory;
use super::init::primitive_u32;
use crate::error::{HeapError, HeapResult};
use crate::layout::{js_array, js_function, js_object, js_proxy};
use crate::property::{PropertyAttributes, PropertyKey};
use crate::shape::{Shape, ShapeRef};
use crate::shared::SharedObjectFactory;
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::MemSpace;
use std::sync::Arc;

impl ObjectFactory<'_> {
    /// A JS object with `shape` in young space
    pub fn new_js_object(&mut self, shape: ShapeRef) -> HeapResult<LocalRef> {
        self.heap.construct(shape, MemSpace::Young)
    }

    /// A JS object whose in-object slots start with `values`
    pub fn new_js_object_with_init(&mut self, shape: ShapeRef, values: &[TaggedValue]) -> HeapResult<LocalRef> {
        let obj = self.new_js_object(shape)?;
        let capacity = self.heap.with_shape(shape, Shape::inline_capacity) as usize;
        assert!(values.len() <= capacity, "{} values for {capacity} in-object slots", values.len());
        for (index, &value) in values.iter().enumerate() {
            self.heap.set_inline(obj.into(), index, value)?;
        }
        Ok(obj)
    }

    pub fn new_non_movable_js_object(&mut self, shape: ShapeRef) -> HeapResult<LocalRef> {
        self.heap.construct(shape, MemSpace::NonMovable)
    }

    pub fn new_old_space_js_object(&mut self, shape: ShapeRef) -> HeapResult<LocalRef> {
        self.heap.construct(shape, MemSpace::Old)
    }

    /// A plain object inheriting from `Object.prototype`
    pub fn new_empty_js_object(&mut self) -> HeapResult<LocalRef> {
        let shape = self.realm().object_class();
        self.new_js_object(shape)
    }

    /// `OrdinaryObjectCreate(proto)`
    pub fn ordinary_new_js_object_create(&mut self, proto: TaggedValue) -> HeapResult<LocalRef> {
        let base = self.realm().object_class();
        let shape = self
            .heap
            .with_arena_mut(base, |arena, id| {
            let next = arena.transition_proto(id, proto);
            arena.shape_ref(next)
        });
        self.new_js_object(shape)
    }

    /// Instance shape of a constructor, created on first use
    ///
    /// The prototype comes from the constructor's `ProtoOrHClass` field and
    /// falls back to `Object.prototype` when that holds no object.
    fn initial_shape_of(&mut self, ctor: HeapRef) -> ShapeRef {
        if let Some(shape) = self.heap.initial_shape(ctor) {
            return shape;
        }
        let proto = match self.heap.field(ctor, js_function::PROTO_OR_HCLASS) {
            value if value.heap_ref().is_some() => value,
            _ => TaggedValue::from(self.realm().object_prototype()),
        };
        let inline = self.heap.config().default_inline_capacity;
        let shape = ShapeRef::Local(self.heap.shapes_mut().create_root(JsType::JsObject, inline, proto));
        self.heap.set_initial_shape(ctor, shape);
        shape
    }

    fn check_constructor(&self, ctor: HeapRef) -> HeapResult<()> {
        if ctor.is_shared() {
            return Err(HeapError::type_error("shared ctor needs the shared factory"));
        }
        if self.heap.type_of(ctor).is_js_function() {
            Ok(())
        } else {
            Err(HeapError::type_error("constructor is not a function"))
        }
    }

    /// `new ctor()` with the default in-object capacity
    pub fn new_js_object_by_constructor(&mut self, ctor: HeapRef) -> HeapResult<LocalRef> {
        self.check_constructor(ctor)?;
        let shape = self.initial_shape_of(ctor);
        self.new_js_object(shape)
    }

    /// `new ctor()` with an explicit in-object capacity
    ///
    /// A non-default capacity gets a fresh shape inheriting from
    /// `Object.prototype`.
    pub fn new_js_object_by_constructor_with_inline(&mut self, ctor: HeapRef, inline: u32) -> HeapResult<LocalRef> {
        if inline == self.heap.config().default_inline_capacity {
            return self.new_js_object_by_constructor(ctor);
        }
        self.check_constructor(ctor)?;
        let proto = TaggedValue::from(self.realm().object_prototype());
        let shape = ShapeRef::Local(self.heap.shapes_mut().create_root(JsType::JsObject, inline, proto));
        self.new_js_object(shape)
    }

    /// `Reflect.construct(ctor, [], new_target)`
    ///
    /// The instance takes the shape of `new_target`. A shared constructor
    /// needs a shared `new_target` and builds its instance in the shared heap.
    pub fn new_js_object_by_new_target(&mut self, ctor: HeapRef, new_target: TaggedValue) -> HeapResult<HeapRef> {
        if let HeapRef::Shared(shared_ctor) = ctor {
            if new_target.shared_ref().is_none() {
                return Err(HeapError::type_error("shared ctor cannot assign unshared newTarget"));
            }
            let shared = Arc::clone(self.heap.shared_heap());
            let obj = SharedObjectFactory::new(&shared)?.new_shared_object_by_constructor(shared_ctor, new_target)?;
            return Ok(obj.into());
        }
        self.check_constructor(ctor)?;
        let Some(target) = new_target.heap_ref().filter(|&t| self.heap.type_of(t).is_js_function()) else {
            return Err(HeapError::type_error("newTarget is not a constructor"));
        };
        if target.is_shared() {
            return Err(HeapError::type_error("local ctor cannot assign shared newTarget"));
        }
        let shape = self.initial_shape_of(target);
        Ok(self.new_js_object(shape)?.into())
    }

    /// A plain object holding `properties` in order
    ///
    /// Counts above the fast-property limit start in dictionary mode.
    pub fn create_js_object_with_properties(
        &mut self,
        properties: &[(PropertyKey, TaggedValue)],
    ) -> HeapResult<LocalRef> {
        let obj = self.new_empty_js_object()?;
        if properties.len() > self.heap.config().fast_property_limit() as usize {
            self.heap.migrate_to_dictionary(obj.into())?;
        }
        for (key, value) in properties {
            self.heap
                .add_property(obj.into(), key.clone(), *value, PropertyAttributes::data())?;
        }
        Ok(obj)
    }

    /// An empty array
    pub fn new_js_array(&mut self) -> HeapResult<LocalRef> {
        let shape = self.realm().array_class();
        self.new_js_object(shape)
    }

    /// An array of `length` holes
    ///
    /// Lengths past the element gap limit start with dictionary elements.
    pub fn new_js_array_with_length(&mut self, length: u32) -> HeapResult<LocalRef> {
        let array = self.new_js_array()?;
        if length as usize > self.heap.config().max_element_gap as usize {
            self.heap.elements_to_dictionary(array.into())?;
        } else {
            let elements = self.new_tagged_array_without_init(length as usize, MemSpace::Young)?;
            self.heap.set_field(array, js_object::ELEMENTS, elements.into());
        }
        self.heap.set_field(array, js_array::LENGTH, primitive_u32(length));
        Ok(array)
    }

    /// An array owning `values` as its dense elements
    pub fn new_js_stable_array_with_elements(&mut self, values: Vec<TaggedValue>) -> HeapResult<LocalRef> {
        let length = values.len() as u32;
        let array = self.new_js_array()?;
        let elements = self.new_tagged_array_from(values, MemSpace::Young)?;
        self.heap.set_field(array, js_object::ELEMENTS, elements.into());
        self.heap.set_field(array, js_array::LENGTH, primitive_u32(length));
        Ok(array)
    }

    /// A wrapper object for a primitive
    pub fn new_js_primitive_ref(&mut self, value: TaggedValue) -> HeapResult<LocalRef> {
        let shape = self.realm().primitive_ref_class();
        let obj = self.new_js_object(shape)?;
        self.set_named(obj, "Value", value);
        Ok(obj)
    }

    /// A proxy; callable and constructor targets give a callable proxy
    pub fn new_js_proxy(&mut self, target: HeapRef, handler: HeapRef) -> HeapResult<LocalRef> {
        let (callable, constructor) = self
            .heap
            .with_shape(self.heap.shape_of(target), |s| (s.is_callable(), s.is_constructor()));
        let shape = self.realm().proxy_class(callable, constructor);
        let proxy = self.new_js_object(shape)?;
        self.heap.set_field(proxy, js_proxy::TARGET, target.into());
        self.heap.set_field(proxy, js_proxy::HANDLER, handler.into());
        Ok(proxy)
    }

    /// Root shape of `ty` inheriting from `Object.prototype`
    fn ordinary_shape(&mut self, ty: JsType) -> ShapeRef {
        let root = self.heap.root_shape(ty);
        let proto = TaggedValue::from(self.realm().object_prototype());
        self.heap
            .with_arena_mut(root, |arena, id| {
            let next = arena.transition_proto(id, proto);
            arena.shape_ref(next)
        })
    }

    fn new_buffer(&mut self, ty: JsType, byte_length: u32) -> HeapResult<LocalRef> {
        let data = self.new_byte_array(byte_length, 1)?;
        let shape = self.ordinary_shape(ty);
        let buffer = self.new_js_object(shape)?;
        self.set_named(buffer, "ArrayBufferData", data.into());
        self.set_named(buffer, "ArrayBufferByteLength", primitive_u32(byte_length));
        Ok(buffer)
    }

    pub fn new_js_array_buffer(&mut self, byte_length: u32) -> HeapResult<LocalRef> {
        self.new_buffer(JsType::JsArrayBuffer, byte_length)
    }

    /// A `SharedArrayBuffer`; its `BitField` marks the buffer shared
    pub fn new_js_shared_array_buffer(&mut self, byte_length: u32) -> HeapResult<LocalRef> {
        self.new_buffer(JsType::JsSharedArrayBuffer, byte_length)
    }
}
