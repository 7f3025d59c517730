use super::ObjectFactory;
use super::init::primitive_u32;
use crate::cell::CellBody;
use crate::dictionary::{Dictionary, DictionaryKind};
use crate::error::HeapResult;
use crate::layout::TAGGED_SIZE;
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::MemSpace;

impl ObjectFactory<'_> {
    /// A tagged array of `len` copies of `init`
    ///
    /// A zero length returns the shared empty array.
    pub fn new_tagged_array(&mut self, len: usize, init: TaggedValue, space: MemSpace) -> HeapResult<HeapRef> {
        if len == 0 {
            return Ok(self.roots().empty_array().into());
        }
        let array = self
            .heap
            .allocate_tagged_array(JsType::TaggedArray, vec![init; len], space)?;
        Ok(array.into())
    }

    /// A tagged array whose slots are all holes
    pub fn new_tagged_array_without_init(&mut self, len: usize, space: MemSpace) -> HeapResult<HeapRef> {
        self.new_tagged_array(len, TaggedValue::HOLE, space)
    }

    /// A tagged array holding `values`
    pub fn new_tagged_array_from(&mut self, values: Vec<TaggedValue>, space: MemSpace) -> HeapResult<HeapRef> {
        if values.is_empty() {
            return Ok(self.roots().empty_array().into());
        }
        Ok(self.heap.allocate_tagged_array(JsType::TaggedArray, values, space)?.into())
    }

    /// A copy-on-write array in non-movable space
    pub fn new_cow_tagged_array(&mut self, values: Vec<TaggedValue>) -> HeapResult<HeapRef> {
        if values.is_empty() {
            return Ok(self.roots().empty_array().into());
        }
        let array = self
            .heap
            .allocate_tagged_array(JsType::CowTaggedArray, values, MemSpace::NonMovable)?;
        Ok(array.into())
    }

    /// An array of `len` raw zero words
    pub fn new_mutant_tagged_array(&mut self, len: usize, space: MemSpace) -> HeapResult<HeapRef> {
        if len == 0 {
            return Ok(self.roots().empty_mutant_array().into());
        }
        let array = self.heap.allocate_tagged_array(
            JsType::MutantTaggedArray,
            vec![TaggedValue::Int(0); len],
            space,
        )?;
        Ok(array.into())
    }

    /// A larger copy of `old`, new slots set to `init`
    pub fn extend_array(
        &mut self,
        old: HeapRef,
        new_len: usize,
        init: TaggedValue,
        space: MemSpace,
    ) -> HeapResult<HeapRef> {
        let mut values = self.heap.array_values(old);
        assert!(new_len >= values.len(), "extend_array cannot shrink an array");
        values.resize(new_len, init);
        self.new_tagged_array_from(values, space)
    }

    /// A copy of `old` resized to `new_len`, padded with holes
    ///
    /// Copying into non-movable space yields a copy-on-write array.
    pub fn copy_array(&mut self, old: HeapRef, new_len: usize, space: MemSpace) -> HeapResult<HeapRef> {
        let mut values = self.heap.array_values(old);
        values.resize(new_len, TaggedValue::HOLE);
        if space == MemSpace::NonMovable {
            return self.new_cow_tagged_array(values);
        }
        self.new_tagged_array_from(values, space)
    }

    /// Slots `start..end` of `old` as a new young array
    pub fn copy_part_array(&mut self, old: HeapRef, start: usize, end: usize) -> HeapResult<HeapRef> {
        let values = self.heap.array_values(old);
        assert!(start <= end && end <= values.len(), "range {start}..{end} out of bounds");
        self.new_tagged_array_from(values[start..end].to_vec(), MemSpace::Young)
    }

    /// A zeroed byte array of `len` elements of `size` bytes each
    pub fn new_byte_array(&mut self, len: u32, size: u32) -> HeapResult<LocalRef> {
        let bytes = len as usize * size as usize;
        let shape = self.heap.roots().record_shape(JsType::ByteArray);
        let padded = bytes.div_ceil(TAGGED_SIZE) * TAGGED_SIZE;
        let array = self
            .heap
            .construct_with_body(shape, MemSpace::Young, CellBody::Bytes(vec![0; bytes]), padded)?;
        self.set_named(array, "Length", primitive_u32(len));
        self.set_named(array, "Size", primitive_u32(size));
        Ok(array)
    }

    /// An empty dictionary sized for `at_least` entries
    pub fn new_dictionary_array(&mut self, kind: DictionaryKind, at_least: usize) -> HeapResult<LocalRef> {
        self.heap
            .allocate_dictionary(Dictionary::new(kind, at_least), MemSpace::Young)
    }
}
