//! Named property and indexed element storage
//!
//! Every JS object runs two independent state machines. Named properties
//! start in the shape's in-object slots, spill into an out-of-line array once
//! those run out, and move to a name dictionary for good when the shape tree
//! grows too large or a property is deleted. Elements start as the shared
//! empty array, grow as a dense (possibly copy-on-write) array, and fall back
//! to a number dictionary for sparse or non-default writes.

use crate::dictionary::{Dictionary, DictionaryKind, ENTRY_SIZE, ENTRY_VALUE_INDEX, TABLE_HEADER_SIZE};
use crate::error::{HeapError, HeapResult};
use crate::factory::init::primitive_u32;
use crate::heap::ObjectHeap;
use crate::layout::{js_array, js_object};
use crate::layout_info::LayoutInfo;
use crate::property::{PropertyAttributes, PropertyKey};
use crate::shape::{Shape, ShapeRef};
use crate::shared::check_store;
use crate::types::JsType;
use crate::value::{HeapRef, TaggedValue};
use otter_heap_gc::MemSpace;
use std::sync::Arc;

const MIN_ELEMENTS_CAPACITY: usize = 16;

const NOT_EXTENSIBLE: &str = "Cannot add property in prevent extensions";
const SHARED_ATTRIBUTES: &str = "shared obj does not support changing or deleting attributes";

/// State of an object's named property storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStorage {
    /// No named properties yet
    EmptyShape,
    /// Every property sits in an in-object slot
    InlineOnly,
    /// In-object slots are full; the rest live in the properties array
    InlineAndOwnArray,
    /// Properties live in a name dictionary
    Dictionary,
}

/// State of an object's indexed element storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementsStorage {
    /// The shared empty array
    Empty,
    /// A private dense array
    Dense,
    /// A dense array shared with other literals until the first write
    CopyOnWrite,
    /// A number dictionary
    Dictionary,
}

/// An own property's value and attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyEntry {
    pub value: TaggedValue,
    pub attributes: PropertyAttributes,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Inline(usize),
    OutOfLine(usize),
    Dictionary,
}

fn check_has_storage(ty: JsType) {
    if !ty.is_js_object() {
        panic!("{ty} has no property storage");
    }
}

/// Attributes as stored in a dictionary entry
fn dictionary_attributes(attributes: PropertyAttributes) -> PropertyAttributes {
    attributes.with_inlined(false).with_offset(0)
}

/// Capacity of a dense backing store that must hold `needed` slots
pub fn grow_capacity(needed: usize) -> usize {
    (needed + (needed >> 1)).max(MIN_ELEMENTS_CAPACITY)
}

impl ObjectHeap {
    fn container(&self, obj: HeapRef, field: usize) -> HeapRef {
        match self.field(obj, field).heap_ref() {
            Some(container) => container,
            None => panic!("{obj:?} has no container in field {field}"),
        }
    }

    fn is_empty_container(&self, container: HeapRef) -> bool {
        container == HeapRef::Shared(self.roots().empty_array())
    }

    fn with_dictionary<R>(&self, table: HeapRef, f: impl FnOnce(&Dictionary) -> R) -> R {
        self.with_cell(table, |cell| match cell.dictionary() {
            Some(dict) => f(dict),
            None => panic!("{table:?} is not a dictionary"),
        })
    }

    fn with_dictionary_mut<R>(&mut self, table: HeapRef, f: impl FnOnce(&mut Dictionary) -> R) -> R {
        self.with_cell_mut(table, |cell| match cell.dictionary_mut() {
            Some(dict) => f(dict),
            None => panic!("{table:?} is not a dictionary"),
        })
    }

    /// A fresh array container in the holder's domain
    fn new_array_container(&mut self, holder: HeapRef, values: Vec<TaggedValue>) -> HeapResult<HeapRef> {
        if holder.is_shared() {
            let roots = Arc::clone(self.roots());
            let array = self
                .shared_heap()
                .allocate_tagged_array(&roots, JsType::TaggedArray, values, MemSpace::SharedOld)?;
            Ok(array.into())
        } else {
            Ok(self.allocate_tagged_array(JsType::TaggedArray, values, MemSpace::Young)?.into())
        }
    }

    /// A fresh dictionary container in the holder's domain
    fn new_dictionary_container(&mut self, holder: HeapRef, dict: Dictionary) -> HeapResult<HeapRef> {
        if holder.is_shared() {
            let roots = Arc::clone(self.roots());
            let table = self
                .shared_heap()
                .allocate_dictionary(&roots, dict, MemSpace::SharedOld)?;
            Ok(table.into())
        } else {
            Ok(self.allocate_dictionary(dict, MemSpace::Young)?.into())
        }
    }

    pub fn property_storage(&self, obj: HeapRef) -> PropertyStorage {
        check_has_storage(self.type_of(obj));
        self.with_shape(self.shape_of(obj), |shape| {
            if shape.is_dictionary() {
                PropertyStorage::Dictionary
            } else if shape.number_of_props() == 0 {
                PropertyStorage::EmptyShape
            } else if shape.number_of_props() > shape.inline_capacity() {
                PropertyStorage::InlineAndOwnArray
            } else {
                PropertyStorage::InlineOnly
            }
        })
    }

    pub fn elements_storage(&self, obj: HeapRef) -> ElementsStorage {
        check_has_storage(self.type_of(obj));
        let elements = self.container(obj, js_object::ELEMENTS);
        if self.is_empty_container(elements) {
            return ElementsStorage::Empty;
        }
        match self.type_of(elements) {
            JsType::TaggedDictionary => ElementsStorage::Dictionary,
            ty if ty.is_cow_array() => ElementsStorage::CopyOnWrite,
            _ => ElementsStorage::Dense,
        }
    }

    fn locate(&self, obj: HeapRef, key: &PropertyKey) -> Option<(Slot, PropertyAttributes)> {
        let shape = self.shape_of(obj);
        if self.with_shape(shape, Shape::is_dictionary) {
            let table = self.container(obj, js_object::PROPERTIES);
            return self.with_dictionary(table, |dict| dict.get(key).map(|e| (Slot::Dictionary, e.attributes)));
        }
        self.with_shape(shape, |shape| {
            shape.lookup(key).map(|(offset, attributes)| {
                let slot = if attributes.is_inlined() {
                    Slot::Inline(offset)
                } else {
                    Slot::OutOfLine(offset - shape.inline_capacity() as usize)
                };
                (slot, attributes)
            })
        })
    }

    fn read_slot(&self, obj: HeapRef, key: &PropertyKey, slot: Slot) -> TaggedValue {
        match slot {
            Slot::Inline(index) => self.inline_value(obj, index),
            Slot::OutOfLine(index) => {
                let props = self.container(obj, js_object::PROPERTIES);
                self.with_cell(props, |cell| cell.elements().and_then(|v| v.get(index).copied()))
                    .unwrap_or(TaggedValue::UNDEFINED)
            }
            Slot::Dictionary => {
                let table = self.container(obj, js_object::PROPERTIES);
                self.with_dictionary(table, |dict| dict.get(key).map(|e| e.value))
                    .unwrap_or(TaggedValue::UNDEFINED)
            }
        }
    }

    fn write_slot(&mut self, obj: HeapRef, key: &PropertyKey, slot: Slot, value: TaggedValue) -> HeapResult<()> {
        match slot {
            Slot::Inline(index) => self.set_inline(obj, index, value),
            Slot::OutOfLine(index) => {
                let props = self.container(obj, js_object::PROPERTIES);
                self.set_array_value(props, index, value)
            }
            Slot::Dictionary => self.dictionary_put(obj, js_object::PROPERTIES, key.clone(), value, None),
        }
    }

    /// Insert or overwrite a dictionary entry, moving to a larger table when
    /// the load limit is reached
    ///
    /// `attributes` of `None` keeps the entry's current attributes.
    fn dictionary_put(
        &mut self,
        obj: HeapRef,
        field: usize,
        key: PropertyKey,
        value: TaggedValue,
        attributes: Option<PropertyAttributes>,
    ) -> HeapResult<()> {
        let table = self.container(obj, field);
        if table.is_shared() {
            check_store(value)?;
        }
        let attributes = match attributes {
            Some(attributes) => dictionary_attributes(attributes),
            None => self.with_dictionary(table, |dict| {
                dict.get(&key).map_or(PropertyAttributes::data(), |e| e.attributes)
            }),
        };
        if self.with_dictionary(table, |dict| dict.needs_growth_for(&key)) {
            let mut grown = self.with_dictionary(table, Dictionary::grown);
            grown.put(key, value, attributes);
            let fresh = self.new_dictionary_container(obj, grown)?;
            return self.write_field(obj, field, fresh.into());
        }
        let index = self.with_dictionary_mut(table, |dict| {
            dict.put(key.clone(), value, attributes);
            dict.index_of(&key)
        });
        if let (HeapRef::Local(holder), Some(index)) = (table, index) {
            self.record_payload_write(holder, TABLE_HEADER_SIZE + index * ENTRY_SIZE + ENTRY_VALUE_INDEX, value);
        }
        Ok(())
    }

    /// Own property of an object
    pub fn get_own_property(&self, obj: HeapRef, key: &PropertyKey) -> Option<PropertyEntry> {
        if let Some(index) = key.as_index() {
            return self.get_element_entry(obj, index);
        }
        check_has_storage(self.type_of(obj));
        let (slot, attributes) = self.locate(obj, key)?;
        Some(PropertyEntry {
            value: self.read_slot(obj, key, slot),
            attributes,
        })
    }

    pub fn get_own_value(&self, obj: HeapRef, key: &PropertyKey) -> Option<TaggedValue> {
        self.get_own_property(obj, key).map(|e| e.value)
    }

    /// Property found along the prototype chain, with its holder
    pub fn find_property(&self, obj: HeapRef, key: &PropertyKey) -> Option<(HeapRef, PropertyEntry)> {
        let mut current = Some(obj);
        while let Some(holder) = current {
            if !self.type_of(holder).is_js_object() {
                return None;
            }
            if let Some(entry) = self.get_own_property(holder, key) {
                return Some((holder, entry));
            }
            current = self.with_shape(self.shape_of(holder), Shape::proto).heap_ref();
        }
        None
    }

    /// Add a property the object does not have yet
    ///
    /// A key the object already owns is a TypeError. Index keys go to the
    /// elements. The shape transitions on the new key
    /// unless the object is in dictionary mode or the shape tree has grown
    /// past the configured limits, in which case the object migrates first.
    pub fn add_property(
        &mut self,
        obj: HeapRef,
        key: PropertyKey,
        value: TaggedValue,
        attributes: PropertyAttributes,
    ) -> HeapResult<()> {
        if let Some(index) = key.as_index() {
            return self.define_element(obj, index, value, attributes);
        }
        check_has_storage(self.type_of(obj));
        let shape_ref = self.shape_of(obj);
        let shape = self.with_shape(shape_ref, Shape::clone);
        if obj.is_shared() || !shape.is_extensible() {
            return Err(HeapError::type_error(NOT_EXTENSIBLE));
        }
        if self.locate(obj, &key).is_some() {
            return Err(HeapError::type_error(format!("Cannot redefine property: {key}")));
        }

        if !shape.is_dictionary() {
            let shapes_in_tree = match shape_ref {
                ShapeRef::Local(id) => self.shapes().shapes_in_tree(id),
                ShapeRef::Shared(id) => self.shared_heap().with_arena(|arena| arena.shapes_in_tree(id)),
            };
            let config = self.config();
            if shape.number_of_props() >= config.fast_property_limit() || shapes_in_tree >= config.max_shapes_per_root {
                self.migrate_to_dictionary(obj)?;
            }
        }
        if self.with_shape(self.shape_of(obj), Shape::is_dictionary) {
            return self.dictionary_put(obj, js_object::PROPERTIES, key, value, Some(attributes));
        }

        let next = self.with_arena_mut(shape_ref, |arena, id| {
            let next = arena.add_transition(id, key.clone(), attributes);
            arena.shape_ref(next)
        });
        let Some((offset, placed)) = self.with_shape(next, |s| s.lookup(&key)) else {
            unreachable!("transition target has no entry for {key}");
        };
        if placed.is_inlined() {
            self.set_shape(obj, next);
            self.set_inline(obj, offset, value)
        } else {
            let index = offset - shape.inline_capacity() as usize;
            self.ensure_out_of_line(obj, index)?;
            self.set_shape(obj, next);
            let props = self.container(obj, js_object::PROPERTIES);
            self.set_array_value(props, index, value)
        }
    }

    /// Make room for out-of-line slot `index`, growing by the configured step
    fn ensure_out_of_line(&mut self, obj: HeapRef, index: usize) -> HeapResult<()> {
        let props = self.container(obj, js_object::PROPERTIES);
        let mut values = self.array_values(props);
        if index < values.len() {
            return Ok(());
        }
        let step = self.config().properties_grow_step as usize;
        let len = (values.len() + step).max(index + 1);
        values.resize(len, TaggedValue::UNDEFINED);
        let fresh = self.new_array_container(obj, values)?;
        self.write_field(obj, js_object::PROPERTIES, fresh.into())
    }

    /// Move the named properties into a name dictionary
    ///
    /// There is no way back: the object keeps a private dictionary-mode
    /// shape from here on.
    pub fn migrate_to_dictionary(&mut self, obj: HeapRef) -> HeapResult<()> {
        check_has_storage(self.type_of(obj));
        let shape_ref = self.shape_of(obj);
        let shape = self.with_shape(shape_ref, Shape::clone);
        if shape.is_dictionary() {
            return Ok(());
        }
        if obj.is_shared() {
            return Err(HeapError::type_error(SHARED_ATTRIBUTES));
        }

        let entries = shape.layout().map(LayoutInfo::entries).unwrap_or_default();
        let mut dict = Dictionary::new(DictionaryKind::Name, entries.len());
        for entry in entries {
            let offset = entry.attributes.offset() as usize;
            let slot = if entry.attributes.is_inlined() {
                Slot::Inline(offset)
            } else {
                Slot::OutOfLine(offset - shape.inline_capacity() as usize)
            };
            let value = self.read_slot(obj, &entry.key, slot);
            dict.put(entry.key, value, dictionary_attributes(entry.attributes));
        }
        let properties = dict.len();
        let table = self.new_dictionary_container(obj, dict)?;
        let next = self.with_arena_mut(shape_ref, |arena, id| {
            let next = arena.to_dictionary(id);
            arena.shape_ref(next)
        });
        self.write_field(obj, js_object::PROPERTIES, table.into())?;
        self.set_shape(obj, next);
        self.with_cell_mut(obj, |cell| cell.inline.clear());
        tracing::debug!(
            target: "otter::heap",
            ty = %shape.ty(),
            properties,
            "object migrated to dictionary mode"
        );
        Ok(())
    }

    /// Ordinary `[[Set]]` on an own property
    ///
    /// Returns `false` for read-only and accessor properties and for a new
    /// key on a non-extensible object.
    pub fn set_property(&mut self, obj: HeapRef, key: PropertyKey, value: TaggedValue) -> HeapResult<bool> {
        if let Some(index) = key.as_index() {
            return self.set_element(obj, index, value);
        }
        check_has_storage(self.type_of(obj));
        match self.locate(obj, &key) {
            Some((_, attributes)) if attributes.is_accessor() || !attributes.is_writable() => Ok(false),
            Some((slot, _)) => {
                self.write_slot(obj, &key, slot, value)?;
                Ok(true)
            }
            None if !obj.is_shared() && !self.with_shape(self.shape_of(obj), Shape::is_extensible) => Ok(false),
            None => {
                self.add_property(obj, key, value, PropertyAttributes::data())?;
                Ok(true)
            }
        }
    }

    /// Delete an own property; `false` when it is not configurable
    pub fn delete_property(&mut self, obj: HeapRef, key: &PropertyKey) -> HeapResult<bool> {
        if let Some(index) = key.as_index() {
            return self.delete_element(obj, index);
        }
        check_has_storage(self.type_of(obj));
        if obj.is_shared() {
            return Err(HeapError::type_error(SHARED_ATTRIBUTES));
        }
        let Some((_, attributes)) = self.locate(obj, key) else {
            return Ok(true);
        };
        if !attributes.is_configurable() {
            return Ok(false);
        }
        self.migrate_to_dictionary(obj)?;
        let table = self.container(obj, js_object::PROPERTIES);
        self.with_dictionary_mut(table, |dict| dict.remove(key));
        Ok(true)
    }

    /// Redefine the attributes of an own property
    ///
    /// A fast-mode object migrates to dictionary mode first. Returns `false`
    /// when the property is absent or not configurable.
    pub fn change_attributes(
        &mut self,
        obj: HeapRef,
        key: &PropertyKey,
        attributes: PropertyAttributes,
    ) -> HeapResult<bool> {
        check_has_storage(self.type_of(obj));
        if obj.is_shared() {
            return Err(HeapError::type_error(SHARED_ATTRIBUTES));
        }
        if let Some(index) = key.as_index() {
            let Some(entry) = self.get_element_entry(obj, index) else {
                return Ok(false);
            };
            if !entry.attributes.is_configurable() {
                return Ok(false);
            }
            self.define_element(obj, index, entry.value, attributes)?;
            return Ok(true);
        }
        let Some((_, current)) = self.locate(obj, key) else {
            return Ok(false);
        };
        if current.transition_bits() == attributes.transition_bits() {
            return Ok(true);
        }
        if !current.is_configurable() {
            return Ok(false);
        }
        self.migrate_to_dictionary(obj)?;
        let table = self.container(obj, js_object::PROPERTIES);
        self.with_dictionary_mut(table, |dict| {
            if let Some(entry) = dict.get_mut(key) {
                entry.attributes = dictionary_attributes(attributes);
            }
        });
        Ok(true)
    }

    /// Make the object non-extensible
    pub fn prevent_extensions(&mut self, obj: HeapRef) {
        let shape = self.shape_of(obj);
        if !self.with_shape(shape, Shape::is_extensible) {
            return;
        }
        let next = self.with_arena_mut(shape, |arena, id| {
            let next = arena.transition_extension(id);
            arena.shape_ref(next)
        });
        self.set_shape(obj, next);
    }

    /// Replace the prototype through a cached prototype transition
    pub fn set_prototype(&mut self, obj: HeapRef, proto: TaggedValue) -> HeapResult<()> {
        if obj.is_shared() && !proto.is_shareable() {
            return Err(HeapError::type_error(
                "shared object cannot reference a non-shared value",
            ));
        }
        let shape = self.shape_of(obj);
        if self.with_shape(shape, Shape::proto).same_word(proto) {
            return Ok(());
        }
        let next = self.with_arena_mut(shape, |arena, id| {
            let next = arena.transition_proto(id, proto);
            arena.shape_ref(next)
        });
        self.set_shape(obj, next);
        Ok(())
    }

    pub fn prototype_of(&self, obj: HeapRef) -> TaggedValue {
        self.with_shape(self.shape_of(obj), Shape::proto)
    }

    /// Own keys: element indices in ascending order, then names in
    /// insertion order
    pub fn own_property_keys(&self, obj: HeapRef) -> Vec<PropertyKey> {
        check_has_storage(self.type_of(obj));
        let elements = self.container(obj, js_object::ELEMENTS);
        let mut keys: Vec<PropertyKey> = self.with_cell(elements, |cell| match cell.dictionary() {
            Some(dict) => {
                let mut indices: Vec<u32> = dict.keys().filter_map(PropertyKey::as_index).collect();
                indices.sort_unstable();
                indices.into_iter().map(PropertyKey::Index).collect()
            }
            None => cell
                .elements()
                .unwrap_or_default()
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_hole())
                .map(|(i, _)| PropertyKey::Index(i as u32))
                .collect(),
        });

        let shape = self.shape_of(obj);
        if self.with_shape(shape, Shape::is_dictionary) {
            let table = self.container(obj, js_object::PROPERTIES);
            keys.extend(self.with_dictionary(table, |dict| dict.keys().cloned().collect::<Vec<_>>()));
        } else {
            keys.extend(self.with_shape(shape, |s| {
                s.layout().map(LayoutInfo::keys).unwrap_or_default()
            }));
        }
        keys
    }

    pub fn get_element_entry(&self, obj: HeapRef, index: u32) -> Option<PropertyEntry> {
        check_has_storage(self.type_of(obj));
        let elements = self.container(obj, js_object::ELEMENTS);
        self.with_cell(elements, |cell| {
            if let Some(dict) = cell.dictionary() {
                return dict.get(&PropertyKey::Index(index)).map(|e| PropertyEntry {
                    value: e.value,
                    attributes: e.attributes,
                });
            }
            let value = cell.elements()?.get(index as usize).copied()?;
            (!value.is_hole()).then_some(PropertyEntry {
                value,
                attributes: PropertyAttributes::data(),
            })
        })
    }

    pub fn get_element(&self, obj: HeapRef, index: u32) -> Option<TaggedValue> {
        self.get_element_entry(obj, index).map(|e| e.value)
    }

    /// Ordinary `[[Set]]` on an element
    pub fn set_element(&mut self, obj: HeapRef, index: u32, value: TaggedValue) -> HeapResult<bool> {
        match self.get_element_entry(obj, index) {
            Some(entry) if entry.attributes.is_accessor() || !entry.attributes.is_writable() => Ok(false),
            Some(entry) => {
                self.define_element(obj, index, value, entry.attributes)?;
                Ok(true)
            }
            None if !obj.is_shared() && !self.with_shape(self.shape_of(obj), Shape::is_extensible) => Ok(false),
            None => {
                self.define_element(obj, index, value, PropertyAttributes::data())?;
                Ok(true)
            }
        }
    }

    /// Store an element with explicit attributes
    ///
    /// Dense storage grows to `max(needed + needed / 2, 16)` slots. A write
    /// more than the configured gap past the capacity, or one with
    /// non-default attributes, moves the elements to a number dictionary.
    pub fn define_element(
        &mut self,
        obj: HeapRef,
        index: u32,
        value: TaggedValue,
        attributes: PropertyAttributes,
    ) -> HeapResult<()> {
        let mut state = self.elements_storage(obj);
        if state != ElementsStorage::Dictionary && !attributes.is_default() {
            self.elements_to_dictionary(obj)?;
            state = ElementsStorage::Dictionary;
        }
        if state == ElementsStorage::Dictionary {
            self.dictionary_put(obj, js_object::ELEMENTS, PropertyKey::Index(index), value, Some(attributes))?;
            return self.update_array_length(obj, index);
        }
        if state == ElementsStorage::CopyOnWrite {
            self.copy_on_write_elements(obj)?;
        }

        let slot = index as usize;
        let elements = self.container(obj, js_object::ELEMENTS);
        let capacity = self.array_len(elements);
        if slot >= capacity {
            if slot - capacity > self.config().max_element_gap as usize {
                self.elements_to_dictionary(obj)?;
                self.dictionary_put(obj, js_object::ELEMENTS, PropertyKey::Index(index), value, Some(attributes))?;
                return self.update_array_length(obj, index);
            }
            let mut values = self.array_values(elements);
            values.resize(grow_capacity(slot + 1), TaggedValue::HOLE);
            let fresh = self.new_array_container(obj, values)?;
            self.write_field(obj, js_object::ELEMENTS, fresh.into())?;
        }
        let elements = self.container(obj, js_object::ELEMENTS);
        self.set_array_value(elements, slot, value)?;
        self.update_array_length(obj, index)
    }

    fn update_array_length(&mut self, obj: HeapRef, index: u32) -> HeapResult<()> {
        if !matches!(self.type_of(obj), JsType::JsArray | JsType::JsSharedArray) {
            return Ok(());
        }
        let length = self.array_length(obj);
        let needed = u64::from(index) + 1;
        if needed > u64::from(length) {
            let length = u32::try_from(needed).unwrap_or(u32::MAX);
            self.write_field(obj, js_array::LENGTH, primitive_u32(length))?;
        }
        Ok(())
    }

    /// The `length` of an array object
    pub fn array_length(&self, obj: HeapRef) -> u32 {
        self.field(obj, js_array::LENGTH)
            .as_number()
            .map_or(0, |n| n as u32)
    }

    fn copy_on_write_elements(&mut self, obj: HeapRef) -> HeapResult<()> {
        let elements = self.container(obj, js_object::ELEMENTS);
        let values = self.array_values(elements);
        let fresh = self.new_array_container(obj, values)?;
        self.write_field(obj, js_object::ELEMENTS, fresh.into())
    }

    /// Move the elements into a number dictionary
    pub fn elements_to_dictionary(&mut self, obj: HeapRef) -> HeapResult<()> {
        if self.elements_storage(obj) == ElementsStorage::Dictionary {
            return Ok(());
        }
        if obj.is_shared() {
            return Err(HeapError::type_error(SHARED_ATTRIBUTES));
        }
        let elements = self.container(obj, js_object::ELEMENTS);
        let values = self.array_values(elements);
        let present: Vec<(usize, TaggedValue)> =
            values.into_iter().enumerate().filter(|(_, v)| !v.is_hole()).collect();
        let mut dict = Dictionary::new(DictionaryKind::Number, present.len());
        for (index, value) in present {
            dict.put(PropertyKey::Index(index as u32), value, PropertyAttributes::data());
        }
        let count = dict.len();
        let table = self.new_dictionary_container(obj, dict)?;
        self.write_field(obj, js_object::ELEMENTS, table.into())?;
        let shape = self.shape_of(obj);
        let next = self.with_arena_mut(shape, |arena, id| {
            let next = arena.elements_to_dictionary(id);
            arena.shape_ref(next)
        });
        self.set_shape(obj, next);
        tracing::debug!(target: "otter::heap", elements = count, "elements migrated to dictionary mode");
        Ok(())
    }

    /// Delete an element; `false` when it is not configurable
    pub fn delete_element(&mut self, obj: HeapRef, index: u32) -> HeapResult<bool> {
        if obj.is_shared() {
            return Err(HeapError::type_error(SHARED_ATTRIBUTES));
        }
        match self.elements_storage(obj) {
            ElementsStorage::Empty => Ok(true),
            ElementsStorage::Dictionary => {
                let key = PropertyKey::Index(index);
                let elements = self.container(obj, js_object::ELEMENTS);
                match self.with_dictionary(elements, |dict| dict.get(&key).map(|e| e.attributes)) {
                    Some(attributes) if !attributes.is_configurable() => Ok(false),
                    Some(_) => {
                        self.with_dictionary_mut(elements, |dict| dict.remove(&key));
                        Ok(true)
                    }
                    None => Ok(true),
                }
            }
            state => {
                let elements = self.container(obj, js_object::ELEMENTS);
                if index as usize >= self.array_len(elements) {
                    return Ok(true);
                }
                if state == ElementsStorage::CopyOnWrite {
                    self.copy_on_write_elements(obj)?;
                }
                let elements = self.container(obj, js_object::ELEMENTS);
                self.set_array_value(elements, index as usize, TaggedValue::HOLE)?;
                Ok(true)
            }
        }
    }
}
