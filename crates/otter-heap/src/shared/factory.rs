//! Construction of shared and sendable objects
//!
//! Mirrors the local factory under the shared contract: every cell goes to a
//! shared space, every installed shape comes from the shared arena, and every
//! stored value passes the store check.

use super::SharedHeap;
use crate::cell::CellBody;
use crate::dictionary::{Dictionary, DictionaryKind};
use crate::env_constants::{
    ConstantString, FUNCTION_NAME_ATTRIBUTES, FUNCTION_PROTOTYPE_ATTRIBUTES, SharedRoots,
};
use crate::error::{HeapError, HeapResult};
use crate::factory::FunctionKind;
use crate::factory::init::primitive_u32;
use crate::layout::{TAGGED_SIZE, js_function, js_function_base, js_object, js_shared_array, layout_of};
use crate::property::{PropertyAttributes, PropertyKey};
use crate::shape::{ShapeFlags, ShapeId};
use crate::types::JsType;
use crate::value::{SharedRef, TaggedValue};
use otter_heap_gc::MemSpace;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// In-object slot of a sendable class constructor holding its static elements
const SENDABLE_ELEMENTS_SLOT: usize = 3;

/// Attributes of a sendable instance field
const SENDABLE_FIELD_ATTRIBUTES: PropertyAttributes = PropertyAttributes::data_with(true, true, false);

/// Declared layout of a sendable class
#[derive(Debug, Clone, Default)]
pub struct SendableClassSpec {
    /// Instance fields in declaration order
    pub fields: Vec<PropertyKey>,
    /// Static indexed elements of the class
    pub elements: Vec<(u32, TaggedValue)>,
    /// Parameter count of the constructor
    pub length: u32,
}

/// A defined sendable class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendableClass {
    pub constructor: SharedRef,
    pub prototype: SharedRef,
}

/// Allocation gateway of the shared heap
pub struct SharedObjectFactory<'a> {
    heap: &'a SharedHeap,
    roots: Arc<SharedRoots>,
}

impl<'a> SharedObjectFactory<'a> {
    pub fn new(heap: &'a SharedHeap) -> HeapResult<Self> {
        Ok(Self {
            roots: heap.roots()?,
            heap,
        })
    }

    pub fn heap(&self) -> &SharedHeap {
        self.heap
    }

    pub fn roots(&self) -> &SharedRoots {
        &self.roots
    }

    fn write_named(&self, obj: SharedRef, name: &str, value: TaggedValue) -> HeapResult<()> {
        let ty = self.heap.type_of(obj);
        let Some(index) = layout_of(ty).field_index(name) else {
            panic!("{ty} has no field {name}");
        };
        self.heap.write_field(obj, index, value)
    }

    fn construct(&self, shape: ShapeId) -> HeapResult<SharedRef> {
        self.heap.construct(shape, MemSpace::SharedOld, Some(&self.roots))
    }

    /// A shared object with `shape` in shared old space
    pub fn new_shared_old_space_js_object(&self, shape: ShapeId) -> HeapResult<SharedRef> {
        assert!(
            self.heap.with_shape(shape, |s| s.is_shared()),
            "{shape} is not a shared shape"
        );
        self.construct(shape)
    }

    /// A default instance of a shared JS kind
    pub fn new_default_shared(&self, ty: JsType) -> HeapResult<SharedRef> {
        assert!(ty.is_shared_js_kind(), "{ty} is not a shared JS kind");
        self.construct(self.roots.shared_shape(ty))
    }

    /// A shared tagged array; the empty array is the shared singleton
    pub fn new_shared_tagged_array(&self, values: Vec<TaggedValue>) -> HeapResult<SharedRef> {
        if values.is_empty() {
            return Ok(self.roots.empty_array());
        }
        self.heap
            .allocate_tagged_array(&self.roots, JsType::TaggedArray, values, MemSpace::SharedOld)
    }

    fn dictionary_of(&self, cell: SharedRef) -> Dictionary {
        match self.heap.with_cell(cell, |c| c.dictionary().cloned()) {
            Some(dict) => dict,
            None => panic!("shared cell {cell:?} holds no dictionary"),
        }
    }

    /// An independent copy of a shared dictionary
    pub fn new_and_copy_s_name_dictionary(&self, template: SharedRef) -> HeapResult<SharedRef> {
        let dict = self.dictionary_of(template);
        self.heap.allocate_dictionary(&self.roots, dict, MemSpace::SharedOld)
    }

    /// Static elements of `first` and `second` in one fresh dictionary
    ///
    /// On a duplicate index the entry of `second` wins.
    pub fn merge_sendable_class_elements(&self, first: SharedRef, second: SharedRef) -> HeapResult<SharedRef> {
        let first = self.dictionary_of(first);
        let second = self.dictionary_of(second);
        let mut merged = Dictionary::new(DictionaryKind::Number, first.len() + second.len());
        for (key, entry) in first.iter().chain(second.iter()) {
            merged.put(key.clone(), entry.value, entry.attributes);
        }
        self.heap.allocate_dictionary(&self.roots, merged, MemSpace::SharedOld)
    }

    /// A shared method record for `kind` taking `length` parameters
    pub fn new_shared_method(&self, kind: FunctionKind, length: u32) -> HeapResult<SharedRef> {
        let method = self.construct(self.roots.record_shape(JsType::Method).id())?;
        self.write_named(method, "CallField", primitive_u32(length))?;
        self.write_named(method, "ExtraLiteralInfo", TaggedValue::Int(kind.bits()))?;
        Ok(method)
    }

    fn method_kind(&self, method: SharedRef) -> FunctionKind {
        let index = layout_of(JsType::Method).field_index("ExtraLiteralInfo");
        index
            .and_then(|i| self.heap.field(method, i).as_int())
            .and_then(FunctionKind::from_bits)
            .unwrap_or(FunctionKind::Normal)
    }

    fn initialize_s_function(&self, func: SharedRef, method: SharedRef, kind: FunctionKind) -> HeapResult<()> {
        let length = layout_of(JsType::Method)
            .field_index("CallField")
            .map_or(TaggedValue::Int(0), |i| self.heap.field(method, i));
        self.heap.write_field(func, js_function_base::METHOD, method.into())?;
        self.heap
            .write_field(func, js_function_base::BIT_FIELD, TaggedValue::Int(kind.bits()))?;
        self.heap.write_field(func, js_function_base::LENGTH, length)?;
        self.heap
            .write_field(func, js_function::PROTO_OR_HCLASS, TaggedValue::HOLE)?;
        self.heap
            .write_field(func, js_function::HOME_OBJECT, TaggedValue::UNDEFINED)
    }

    /// A sendable function for a shared method
    pub fn new_s_function(&self, method: SharedRef) -> HeapResult<SharedRef> {
        let kind = self.method_kind(method);
        let ty = match kind {
            FunctionKind::Async | FunctionKind::AsyncArrow => JsType::JsSharedAsyncFunction,
            _ => JsType::JsSharedFunction,
        };
        let func = self.construct(self.roots.shared_shape(ty))?;
        self.initialize_s_function(func, method, kind)?;
        Ok(func)
    }

    /// A new sendable function sharing `func`'s shape and method
    pub fn clone_s_function(&self, func: SharedRef) -> HeapResult<SharedRef> {
        let Some(method) = self.heap.field(func, js_function_base::METHOD).shared_ref() else {
            panic!("sendable function {func:?} has no method");
        };
        let kind = self.method_kind(method);
        let clone = self.construct(self.heap.shape_of(func))?;
        self.initialize_s_function(clone, method, kind)?;
        for index in [js_function_base::LENGTH, js_function::MODULE] {
            self.heap.write_field(clone, index, self.heap.field(func, index))?;
        }
        Ok(clone)
    }

    /// A sendable array of `length` holes
    pub fn new_shared_array(&self, length: u32) -> HeapResult<SharedRef> {
        let array = self.construct(self.roots.shared_shape(JsType::JsSharedArray))?;
        if length > 0 {
            let elements = self.new_shared_tagged_array(vec![TaggedValue::HOLE; length as usize])?;
            self.heap.write_field(array, js_object::ELEMENTS, elements.into())?;
        }
        self.heap
            .write_field(array, js_shared_array::LENGTH, primitive_u32(length))?;
        self.heap
            .write_field(array, js_shared_array::MOD_RECORD, primitive_u32(0))?;
        Ok(array)
    }

    fn new_linked_container(&self, ty: JsType, field: &str) -> HeapResult<SharedRef> {
        let obj = self.construct(self.roots.shared_shape(ty))?;
        let linked = self.heap.allocate_tagged_array(
            &self.roots,
            JsType::TaggedArray,
            vec![TaggedValue::Int(0), TaggedValue::Int(0)],
            MemSpace::SharedOld,
        )?;
        self.write_named(obj, field, linked.into())?;
        self.write_named(obj, "ModRecord", primitive_u32(0))?;
        Ok(obj)
    }

    pub fn new_shared_map(&self) -> HeapResult<SharedRef> {
        self.new_linked_container(JsType::JsSharedMap, "LinkedMap")
    }

    pub fn new_shared_set(&self) -> HeapResult<SharedRef> {
        self.new_linked_container(JsType::JsSharedSet, "LinkedSet")
    }

    /// A sendable array buffer over a zeroed shared byte array
    pub fn new_sendable_array_buffer(&self, byte_length: u32) -> HeapResult<SharedRef> {
        let bytes = byte_length as usize;
        let data = self.heap.construct_with_body(
            self.roots.record_shape(JsType::ByteArray).id(),
            MemSpace::SharedOld,
            CellBody::Bytes(vec![0; bytes]),
            bytes.div_ceil(TAGGED_SIZE) * TAGGED_SIZE,
            Some(&self.roots),
        )?;
        self.write_named(data, "Length", primitive_u32(byte_length))?;
        self.write_named(data, "Size", primitive_u32(1))?;

        let buffer = self.new_default_shared(JsType::JsSendableArrayBuffer)?;
        self.write_named(buffer, "ArrayBufferData", data.into())?;
        self.write_named(buffer, "ArrayBufferByteLength", primitive_u32(byte_length))?;
        Ok(buffer)
    }

    /// Define a sendable class inheriting from `proto`
    ///
    /// Instances are not extensible. Past the fast-property limit the
    /// instance shape is in dictionary mode and carries a template dictionary
    /// that every instance copies.
    pub fn define_sendable_class(&self, spec: &SendableClassSpec, proto: TaggedValue) -> HeapResult<SendableClass> {
        super::check_store(proto)?;
        if spec.fields.iter().any(|key| !key.is_shareable() || key.is_index()) {
            return Err(HeapError::type_error("sendable field keys must be shared names"));
        }
        let mut seen = FxHashSet::default();
        if let Some(key) = spec.fields.iter().find(|&key| !seen.insert(key)) {
            return Err(HeapError::type_error(format!("duplicate sendable field {key}")));
        }

        let prototype_shape = self.heap.with_arena_mut(|arena| {
            let root = arena.create_root(JsType::JsSharedObject, 1, proto);
            let shape = arena.add_transition(
                root,
                ConstantString::Constructor.key(),
                PropertyAttributes::data_with(true, false, true),
            );
            arena.mark(shape, ShapeFlags::PROTOTYPE);
            shape
        });
        let prototype = self.construct(prototype_shape)?;

        let instance_shape = self.sendable_instance_shape(spec, prototype)?;
        let constructor = self.sendable_constructor(spec, prototype)?;

        self.heap.write_inline(prototype, 0, constructor.into())?;
        self.heap.set_initial_shape(constructor, instance_shape);
        tracing::debug!(
            target: "otter::heap::shared",
            fields = spec.fields.len(),
            elements = spec.elements.len(),
            shape = %instance_shape,
            "sendable class defined"
        );
        Ok(SendableClass {
            constructor,
            prototype,
        })
    }

    fn sendable_instance_shape(&self, spec: &SendableClassSpec, prototype: SharedRef) -> HeapResult<ShapeId> {
        let proto = TaggedValue::from(prototype);
        if spec.fields.len() <= self.heap.config().fast_property_limit() as usize {
            let inline = spec.fields.len() as u32;
            return Ok(self.heap.with_arena_mut(|arena| {
                let mut shape = arena.create_root(JsType::JsSharedObject, inline, proto);
                for key in &spec.fields {
                    shape = arena.add_transition(shape, key.clone(), SENDABLE_FIELD_ATTRIBUTES);
                }
                arena.transition_extension(shape)
            }));
        }

        let mut template = Dictionary::new(DictionaryKind::Name, spec.fields.len());
        for key in &spec.fields {
            template.put(key.clone(), TaggedValue::UNDEFINED, SENDABLE_FIELD_ATTRIBUTES);
        }
        let template = self
            .heap
            .allocate_dictionary(&self.roots, template, MemSpace::SharedOld)?;
        Ok(self.heap.with_arena_mut(|arena| {
            let root = arena.create_root(JsType::JsSharedObject, 0, proto);
            let dictionary = arena.to_dictionary(root);
            let shape = arena.transition_extension(dictionary);
            arena.attach_layout_dictionary(shape, template.into());
            shape
        }))
    }

    fn sendable_constructor(&self, spec: &SendableClassSpec, prototype: SharedRef) -> HeapResult<SharedRef> {
        let elements_key = self.roots.sendable_elements_key();
        let shape = self.heap.with_arena_mut(|arena| {
            let root = arena.create_root(JsType::JsSharedFunction, 4, TaggedValue::NULL);
            let shape = arena.add_transition(root, ConstantString::Length.key(), FUNCTION_NAME_ATTRIBUTES);
            let shape = arena.add_transition(shape, ConstantString::Name.key(), FUNCTION_NAME_ATTRIBUTES);
            let shape = arena.add_transition(shape, ConstantString::Prototype.key(), FUNCTION_PROTOTYPE_ATTRIBUTES);
            let shape = arena.add_transition(shape, elements_key, PropertyAttributes::data_with(false, false, false));
            arena.mark(shape, ShapeFlags::CONSTRUCTOR | ShapeFlags::CLASS_CONSTRUCTOR);
            shape
        });

        let method = self.new_shared_method(FunctionKind::ClassConstructor, spec.length)?;
        let constructor = self.construct(shape)?;
        self.initialize_s_function(constructor, method, FunctionKind::ClassConstructor)?;
        self.heap
            .write_field(constructor, js_function::PROTO_OR_HCLASS, prototype.into())?;

        let elements = if spec.elements.is_empty() {
            TaggedValue::UNDEFINED
        } else {
            let mut dict = Dictionary::new(DictionaryKind::Number, spec.elements.len());
            for &(index, value) in &spec.elements {
                dict.put(PropertyKey::Index(index), value, PropertyAttributes::data());
            }
            self.heap
                .allocate_dictionary(&self.roots, dict, MemSpace::SharedOld)?
                .into()
        };
        self.heap
            .write_inline(constructor, SENDABLE_ELEMENTS_SLOT, elements)?;
        Ok(constructor)
    }

    /// Static elements dictionary of a sendable class constructor
    pub fn sendable_elements(&self, ctor: SharedRef) -> Option<SharedRef> {
        let key = self.roots.sendable_elements_key();
        let (offset, attrs) = self.heap.with_shape(self.heap.shape_of(ctor), |s| s.lookup(&key))?;
        if !attrs.is_inlined() {
            return None;
        }
        self.heap
            .inline_value(ctor, offset)
            .shared_ref()
            .filter(|&dict| self.heap.type_of(dict) == JsType::TaggedDictionary)
    }

    /// `new ctor()` for a sendable class with `new_target`
    ///
    /// The instance takes the shape recorded for `new_target`. Dictionary
    /// instances get their own copy of the template dictionary; static
    /// elements of `ctor` and `new_target` are merged into fresh elements.
    pub fn new_shared_object_by_constructor(&self, ctor: SharedRef, new_target: TaggedValue) -> HeapResult<SharedRef> {
        let Some(target) = new_target.shared_ref() else {
            return Err(HeapError::type_error("shared ctor cannot assign unshared newTarget"));
        };
        let Some(shape) = self.heap.initial_shape(target) else {
            return Err(HeapError::type_error("newTarget is not a sendable class"));
        };
        let obj = self.construct(shape)?;

        if let Some(template) = self.heap.with_shape(shape, |s| s.layout_dictionary()) {
            let Some(template) = template.as_shared() else {
                unreachable!("shared shape {shape} holds a local template dictionary");
            };
            let properties = self.new_and_copy_s_name_dictionary(template)?;
            self.heap
                .write_field(obj, js_object::PROPERTIES, properties.into())?;
        }

        let elements = match (self.sendable_elements(ctor), self.sendable_elements(target)) {
            (Some(base), Some(derived)) if base != derived => Some(self.merge_sendable_class_elements(base, derived)?),
            (Some(dict), _) | (None, Some(dict)) => Some(self.new_and_copy_s_name_dictionary(dict)?),
            (None, None) => None,
        };
        if let Some(elements) = elements {
            self.heap.write_field(obj, js_object::ELEMENTS, elements.into())?;
            let dict_shape = self.heap.with_arena_mut(|arena| arena.elements_to_dictionary(shape));
            self.heap.set_shape(obj, dict_shape);
        }
        Ok(obj)
    }
}
