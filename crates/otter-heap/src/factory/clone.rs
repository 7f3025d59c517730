//! Literal and class constructor cloning
//!
//! A clone gets fresh properties and elements containers one level deep.
//! Captured environments are shared by reference. Functions found in the
//! containers or the in-object slots are cloned too, and each cloned
//! function's home object is the new clone.

use super::ObjectFactory;
use crate::error::HeapResult;
use crate::layout::{js_array, js_function, js_object};
use crate::shape::{Shape, ShapeRef};
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::MemSpace;

/// Environment and home object applied to cloned functions
#[derive(Debug, Clone, Copy)]
struct Rebind {
    env: TaggedValue,
    home: LocalRef,
}

impl ObjectFactory<'_> {
    /// Copy a properties or elements container into young space
    pub fn clone_properties(&mut self, old: HeapRef) -> HeapResult<HeapRef> {
        self.clone_container(old, None)
    }

    /// Copy a container, cloning functions onto `env` and `home`
    pub fn clone_properties_with_env(
        &mut self,
        old: HeapRef,
        env: TaggedValue,
        home: LocalRef,
    ) -> HeapResult<HeapRef> {
        self.clone_container(old, Some(Rebind { env, home }))
    }

    fn clone_container(&mut self, old: HeapRef, rebind: Option<Rebind>) -> HeapResult<HeapRef> {
        let ty = self.heap.type_of(old);
        if ty == JsType::TaggedDictionary {
            let mut dict = self.heap.with_cell(old, |cell| cell.dictionary().cloned());
            let Some(dict) = dict.as_mut() else {
                unreachable!("dictionary cell without a table");
            };
            if let Some(rebind) = rebind {
                let values: Vec<_> = dict.iter().map(|(k, e)| (k.clone(), e.value)).collect();
                for (key, value) in values {
                    let value = self.rebind_value(value, rebind)?;
                    if let Some(entry) = dict.get_mut(&key) {
                        entry.value = value;
                    }
                }
            }
            return Ok(self.heap.allocate_dictionary(dict.clone(), MemSpace::Young)?.into());
        }

        let values = self.heap.array_values(old);
        if values.is_empty() {
            return Ok(self.roots().empty_array().into());
        }
        let mut cloned = Vec::with_capacity(values.len());
        for value in values {
            cloned.push(match rebind {
                Some(rebind) => self.rebind_value(value, rebind)?,
                None => value,
            });
        }
        let ty = if ty.is_cow_array() { JsType::TaggedArray } else { ty };
        Ok(self.heap.allocate_tagged_array(ty, cloned, MemSpace::Young)?.into())
    }

    /// A function clone bound to the new environment and home object
    fn rebind_value(&mut self, value: TaggedValue, rebind: Rebind) -> HeapResult<TaggedValue> {
        let Some(func) = value.heap_ref().filter(|_| self.is_function(value)) else {
            return Ok(value);
        };
        let clone = self.clone_js_function(func)?;
        self.heap.set_field(clone, js_function::LEXICAL_ENV, rebind.env);
        self.heap
            .set_field(clone, js_function::HOME_OBJECT, rebind.home.into());
        Ok(clone.into())
    }

    fn is_accessor_data(&self, value: TaggedValue) -> bool {
        value
            .heap_ref()
            .is_some_and(|r| self.heap.type_of(r) == JsType::AccessorData)
    }

    /// In-object slots that hold properties
    fn used_inline_slots(shape: &Shape) -> usize {
        shape.inline_capacity().min(shape.number_of_props()) as usize
    }

    /// Clone an object literal sharing its shape
    pub fn clone_object_literal(&mut self, object: HeapRef) -> HeapResult<LocalRef> {
        let shape = self.heap.shape_of(object);
        let clone = self.new_js_object(shape)?;
        let elements = self.heap.field(object, js_object::ELEMENTS);
        let properties = self.heap.field(object, js_object::PROPERTIES);
        let elements = self.clone_properties(container(elements))?;
        self.heap.set_field(clone, js_object::ELEMENTS, elements.into());
        let properties = self.clone_properties(container(properties))?;
        self.heap
            .set_field(clone, js_object::PROPERTIES, properties.into());

        let used = self.heap.with_shape(shape, Self::used_inline_slots);
        for index in 0..used {
            let value = self.heap.inline_value(object, index);
            self.heap.set_inline(clone.into(), index, value)?;
        }
        Ok(clone)
    }

    /// Clone an object literal onto a new environment
    ///
    /// Methods are cloned with their home object set to the clone. Each
    /// in-object accessor pair is replaced by a fresh empty one for the class
    /// definition to fill. Without `can_share_shape` the clone
    /// gets a private copy of the shape.
    pub fn clone_object_literal_with_env(
        &mut self,
        object: HeapRef,
        env: TaggedValue,
        can_share_shape: bool,
    ) -> HeapResult<LocalRef> {
        let shape = self.private_shape(self.heap.shape_of(object), can_share_shape);
        let clone = self.new_js_object(shape)?;
        let rebind = Rebind { env, home: clone };
        self.clone_containers_into(object, clone, rebind)?;

        let used = self.heap.with_shape(shape, Self::used_inline_slots);
        for index in 0..used {
            let value = self.heap.inline_value(object, index);
            let value = if self.is_accessor_data(value) {
                self.new_accessor_data(TaggedValue::UNDEFINED, TaggedValue::UNDEFINED)?
                    .into()
            } else {
                self.rebind_value(value, rebind)?
            };
            self.heap.set_inline(clone.into(), index, value)?;
        }
        Ok(clone)
    }

    fn private_shape(&mut self, shape: ShapeRef, can_share: bool) -> ShapeRef {
        if can_share {
            return shape;
        }
        self.heap
            .with_arena_mut(shape, |arena, id| {
            let next = arena.clone_shape(id, true);
            arena.shape_ref(next)
        })
    }

    fn clone_containers_into(&mut self, from: HeapRef, to: LocalRef, rebind: Rebind) -> HeapResult<()> {
        let elements = container(self.heap.field(from, js_object::ELEMENTS));
        let elements = self.clone_container(elements, Some(rebind))?;
        self.heap.set_field(to, js_object::ELEMENTS, elements.into());
        let properties = container(self.heap.field(from, js_object::PROPERTIES));
        let properties = self.clone_container(properties, Some(rebind))?;
        self.heap.set_field(to, js_object::PROPERTIES, properties.into());
        Ok(())
    }

    /// Clone an array literal
    ///
    /// Containers no longer than the copy-on-write limit are shared through a
    /// copy-on-write array; the first clone moves the source onto that array
    /// as well.
    pub fn clone_array_literal(&mut self, array: LocalRef) -> HeapResult<LocalRef> {
        let shape = self.heap.shape_of(array.into());
        let clone = self.new_js_object(shape)?;
        let length = self.heap.field(array.into(), js_array::LENGTH);
        self.heap.set_field(clone, js_array::LENGTH, length);
        self.heap
            .set_field(clone, js_array::TRACK_INFO, TaggedValue::UNDEFINED);

        for field in [js_object::ELEMENTS, js_object::PROPERTIES] {
            let old = container(self.heap.field(array.into(), field));
            let len = self.heap.array_len(old);
            let cow = len <= self.heap.config().max_cow_literal_length as usize;
            let old_is_cow = self.heap.type_of(old).is_cow_array();
            let copied = if cow && old_is_cow {
                old
            } else {
                let space = if cow { MemSpace::NonMovable } else { MemSpace::Young };
                self.copy_array(old, len, space)?
            };
            self.heap.set_field(clone, field, copied.into());
            if cow && !old_is_cow && len > 0 {
                self.heap.set_field(array, field, copied.into());
            }
        }

        let inline = self.heap.with_shape(shape, Shape::inline_capacity) as usize;
        for index in 0..inline {
            let value = self.heap.inline_value(array.into(), index);
            self.heap.set_inline(clone.into(), index, value)?;
        }
        Ok(clone)
    }

    /// Clone a class constructor and its static members onto `env`
    pub fn clone_class_ctor(
        &mut self,
        ctor: HeapRef,
        env: TaggedValue,
        can_share_shape: bool,
    ) -> HeapResult<LocalRef> {
        let method = self.heap.field(ctor, crate::layout::js_function_base::METHOD);
        let Some(method) = method.heap_ref() else {
            panic!("class constructor {ctor:?} has no method");
        };
        assert!(
            self.method_kind(method).is_class_constructor(),
            "cloned function is not a class"
        );
        let shape = self.private_shape(self.heap.shape_of(ctor), can_share_shape);
        let clone = self.new_js_function_clone(method, shape)?;
        let rebind = Rebind { env, home: clone };

        let used = self.heap.with_shape(shape, Self::used_inline_slots);
        for index in 0..used {
            let value = self.heap.inline_value(ctor, index);
            let value = self.rebind_value(value, rebind)?;
            self.heap.set_inline(clone.into(), index, value)?;
        }
        self.clone_containers_into(ctor, clone, rebind)?;
        Ok(clone)
    }

    fn new_js_function_clone(&mut self, method: HeapRef, shape: ShapeRef) -> HeapResult<LocalRef> {
        let func = self.new_js_object(shape)?;
        let kind = self.method_kind(method);
        self.heap
            .set_field(func, crate::layout::js_function_base::METHOD, method.into());
        self.heap.set_field(
            func,
            crate::layout::js_function_base::BIT_FIELD,
            TaggedValue::Int(kind.bits()),
        );
        Ok(func)
    }
}

fn container(value: TaggedValue) -> HeapRef {
    match value.heap_ref() {
        Some(container) => container,
        None => panic!("object container holds {value}"),
    }
}
