//! Object body iteration for the collector
//!
//! Given a cell and its shape, [`body_ranges`] yields the word ranges a
//! collector has to scan. Word 0 is the shape word and is never part of the
//! body. Layouts whose every field is tagged produce one range over fields
//! and in-object slots; mixed layouts skip primitive fields and in-object
//! slots laid out for unboxed doubles. Tagged payloads follow as one more
//! range.

use crate::cell::{CellBody, HeapCell};
use crate::dictionary::{ENTRY_KEY_INDEX, ENTRY_SIZE, ENTRY_VALUE_INDEX, TABLE_HEADER_SIZE};
use crate::heap::ObjectHeap;
use crate::layout::{TAGGED_SIZE, layout_of};
use crate::property::{PropertyKey, Representation};
use crate::shape::Shape;
use crate::shared::SharedHeap;
use crate::value::{HeapRef, SharedRef, TaggedValue};
use smallvec::SmallVec;

/// Half-open range of words from the start of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: usize,
    pub end: usize,
}

impl SlotRange {
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub type SlotRanges = SmallVec<[SlotRange; 4]>;

fn push_word(ranges: &mut SlotRanges, word: usize) {
    match ranges.last_mut() {
        Some(last) if last.end == word => last.end += 1,
        _ => ranges.push(SlotRange {
            start: word,
            end: word + 1,
        }),
    }
}

fn push_range(ranges: &mut SlotRanges, start: usize, end: usize) {
    if start >= end {
        return;
    }
    match ranges.last_mut() {
        Some(last) if last.end == start => last.end = end,
        _ => ranges.push(SlotRange { start, end }),
    }
}

/// In-object slots laid out for unboxed doubles
fn double_slots(shape: &Shape) -> SmallVec<[usize; 8]> {
    let Some(layout) = shape.layout() else {
        return SmallVec::new();
    };
    layout
        .entries()
        .iter()
        .map(|entry| entry.attributes)
        .filter(|attrs| attrs.is_inlined() && attrs.representation() == Representation::Double)
        .map(|attrs| attrs.offset() as usize)
        .collect()
}

/// Word ranges of `cell` holding tagged values
pub fn body_ranges(cell: &HeapCell, shape: &Shape) -> SlotRanges {
    let class = layout_of(cell.ty());
    let fixed_end = class.end_offset() / TAGGED_SIZE;
    let object_end = shape.object_size() / TAGGED_SIZE;
    let mut ranges = SlotRanges::new();

    if shape.is_all_tagged() {
        push_range(&mut ranges, 1, object_end);
    } else {
        for field in class.fields().iter().filter(|f| f.kind.is_tagged()) {
            push_word(&mut ranges, field.offset / TAGGED_SIZE);
        }
        let doubles = double_slots(shape);
        for slot in (0..shape.inline_capacity() as usize).filter(|slot| !doubles.contains(slot)) {
            push_word(&mut ranges, fixed_end + slot);
        }
    }

    if class.payload.is_tagged() {
        push_range(&mut ranges, object_end, cell.size() / TAGGED_SIZE);
    }
    ranges
}

/// Value stored in `word` of a dictionary payload
fn dictionary_word(cell: &HeapCell, slot: usize) -> Option<TaggedValue> {
    let CellBody::Dictionary(dict) = cell.body() else {
        return None;
    };
    let slot = slot.checked_sub(TABLE_HEADER_SIZE)?;
    let (key, entry) = dict.entry_at(slot / ENTRY_SIZE)?;
    match slot % ENTRY_SIZE {
        ENTRY_KEY_INDEX => match key {
            PropertyKey::Symbol(symbol) => Some(TaggedValue::from(*symbol)),
            _ => None,
        },
        ENTRY_VALUE_INDEX => Some(entry.value),
        _ => None,
    }
}

/// Call `f` with every heap reference stored in the body of `cell`
pub fn for_each_reference(cell: &HeapCell, shape: &Shape, mut f: impl FnMut(HeapRef)) {
    let class = layout_of(cell.ty());
    let fixed_end = class.end_offset() / TAGGED_SIZE;
    let object_end = shape.object_size() / TAGGED_SIZE;

    let mut field_at: SmallVec<[Option<usize>; 16]> = SmallVec::from_elem(None, fixed_end);
    for (index, field) in class.fields().iter().enumerate() {
        if field.kind.is_tagged() {
            field_at[field.offset / TAGGED_SIZE] = Some(index);
        }
    }

    for range in body_ranges(cell, shape) {
        for word in range.start..range.end {
            let value = if word < fixed_end {
                field_at[word].map(|index| cell.field(index))
            } else if word < object_end {
                cell.inline().get(word - fixed_end).copied()
            } else {
                let slot = word - object_end;
                match cell.body() {
                    CellBody::Elements(values) => values.get(slot).copied(),
                    CellBody::Dictionary(_) => dictionary_word(cell, slot),
                    _ => None,
                }
            };
            if let Some(target) = value.and_then(TaggedValue::heap_ref) {
                f(target);
            }
        }
    }
}

impl ObjectHeap {
    /// Call `f` with every reference held by `obj`
    pub fn visit_references(&self, obj: HeapRef, f: impl FnMut(HeapRef)) {
        let shape = self.shape_snapshot(obj);
        self.with_cell(obj, |cell| for_each_reference(cell, &shape, f));
    }

    pub fn references(&self, obj: HeapRef) -> Vec<HeapRef> {
        let mut refs = Vec::new();
        self.visit_references(obj, |r| refs.push(r));
        refs
    }
}

impl SharedHeap {
    /// Call `f` with every reference held by a shared cell
    pub fn visit_references(&self, obj: SharedRef, f: impl FnMut(HeapRef)) {
        let shape = self.with_shape(self.shape_of(obj), Shape::clone);
        self.with_cell(obj, |cell| for_each_reference(cell, &shape, f));
    }

    pub fn references(&self, obj: SharedRef) -> Vec<HeapRef> {
        let mut refs = Vec::new();
        self.visit_references(obj, |r| refs.push(r));
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeapConfig;
    use crate::factory::ObjectFactory;
    use crate::layout::js_object;
    use crate::property::PropertyAttributes;
    use crate::types::JsType;
    use otter_heap_gc::MemSpace;
    use std::sync::Arc;

    fn heap() -> ObjectHeap {
        ObjectHeap::new(Arc::new(SharedHeap::new(HeapConfig::default()))).unwrap()
    }

    #[test]
    fn test_all_tagged_object_is_one_range() {
        let mut heap = heap();
        let root = heap.root_shape(JsType::JsObject);
        let obj = ObjectFactory::bootstrap(&mut heap).new_js_object(root).unwrap();
        let shape = heap.shape_snapshot(obj.into());
        let ranges = body_ranges(heap.cell(obj), &shape);
        assert_eq!(ranges.as_slice(), &[SlotRange { start: 1, end: shape.object_size() / 8 }]);
    }

    #[test]
    fn test_tagged_array_skips_length_words() {
        let mut heap = heap();
        let array = ObjectFactory::bootstrap(&mut heap)
            .new_tagged_array(3, TaggedValue::UNDEFINED, MemSpace::Young)
            .unwrap();
        let shape = heap.shape_snapshot(array);
        let ranges = heap.with_cell(array, |cell| body_ranges(cell, &shape));
        assert_eq!(ranges.as_slice(), &[SlotRange { start: 2, end: 5 }]);
    }

    #[test]
    fn test_double_inline_slot_is_skipped() {
        let mut heap = heap();
        let root = heap.shapes_mut().create_root(JsType::JsObject, 2, TaggedValue::NULL);
        let doubles = PropertyAttributes::data().with_representation(Representation::Double);
        let shape = heap.shapes_mut().add_transition(root, "x".into(), doubles);
        let obj = ObjectFactory::bootstrap(&mut heap)
            .new_js_object(crate::shape::ShapeRef::Local(shape))
            .unwrap();
        let snapshot = heap.shape_snapshot(obj.into());
        let ranges = body_ranges(heap.cell(obj), &snapshot);
        let fixed_end = layout_of(JsType::JsObject).end_offset() / 8;
        assert!(ranges.iter().all(|r| !(r.start..r.end).contains(&fixed_end)));
        assert!(ranges.iter().any(|r| (r.start..r.end).contains(&(fixed_end + 1))));
    }

    #[test]
    fn test_references_include_containers() {
        let mut heap = heap();
        let root = heap.root_shape(JsType::JsObject);
        let (obj, elements) = {
            let mut factory = ObjectFactory::bootstrap(&mut heap);
            let obj = factory.new_js_object(root).unwrap();
            let elements = factory
                .new_tagged_array(1, TaggedValue::Int(1), MemSpace::Young)
                .unwrap();
            factory
                .heap_mut()
                .set_field(obj, js_object::ELEMENTS, elements.into());
            (obj, elements)
        };
        let refs = heap.references(obj.into());
        assert!(refs.contains(&elements));
        assert!(refs.contains(&HeapRef::Shared(heap.roots().empty_array())));
    }
}
