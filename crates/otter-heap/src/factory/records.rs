use super::ObjectFactory;
use super::init::primitive_u32;
use crate::cell::CellBody;
use crate::error::HeapResult;
use crate::layout::TAGGED_SIZE;
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::MemSpace;
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Slot of a lexical environment holding its parent
pub const LEXICAL_ENV_PARENT_INDEX: usize = 0;
/// Slot of a lexical environment holding its scope info
pub const LEXICAL_ENV_SCOPE_INFO_INDEX: usize = 1;
/// Slots a lexical environment reserves before its bindings
pub const LEXICAL_ENV_RESERVED_LENGTH: usize = 2;

/// Symbol flag of a private name
pub const SYMBOL_PRIVATE: u32 = 1;

/// `[[Type]]` of a completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompletionType {
    Normal,
    Break,
    Continue,
    Return,
    Throw,
}

impl ObjectFactory<'_> {
    fn new_record(&mut self, ty: JsType) -> HeapResult<LocalRef> {
        debug_assert!(!ty.is_ecma_object());
        let shape = self.heap.roots().record_shape(ty);
        self.heap.construct(shape, MemSpace::Young)
    }

    pub fn new_accessor_data(&mut self, getter: TaggedValue, setter: TaggedValue) -> HeapResult<LocalRef> {
        let accessor = self.new_record(JsType::AccessorData)?;
        self.set_named(accessor, "Getter", getter);
        self.set_named(accessor, "Setter", setter);
        Ok(accessor)
    }

    /// An accessor backed by native entry points; lives in non-movable space
    pub fn new_internal_accessor(&mut self, getter: i32, setter: i32) -> HeapResult<LocalRef> {
        let shape = self.heap.roots().record_shape(JsType::InternalAccessor);
        let accessor = self.heap.construct(shape, MemSpace::NonMovable)?;
        self.set_named(accessor, "Getter", TaggedValue::Int(getter));
        self.set_named(accessor, "Setter", TaggedValue::Int(setter));
        Ok(accessor)
    }

    pub fn new_property_box(&mut self, value: TaggedValue) -> HeapResult<LocalRef> {
        let cell = self.new_record(JsType::PropertyBox)?;
        self.set_named(cell, "Value", value);
        Ok(cell)
    }

    /// A promise capability with every slot undefined
    pub fn new_promise_capability(&mut self) -> HeapResult<LocalRef> {
        self.new_record(JsType::PromiseCapability)
    }

    pub fn new_promise_record(&mut self, value: TaggedValue) -> HeapResult<LocalRef> {
        let record = self.new_record(JsType::PromiseRecord)?;
        self.set_named(record, "Value", value);
        Ok(record)
    }

    pub fn new_completion_record(&mut self, kind: CompletionType, value: TaggedValue) -> HeapResult<LocalRef> {
        let record = self.new_record(JsType::CompletionRecord)?;
        self.set_named(record, "Value", value);
        self.set_named(record, "Type", primitive_u32(kind as u32));
        Ok(record)
    }

    /// A lexical environment with `bindings` hole slots after the reserved ones
    pub fn new_lexical_env(&mut self, bindings: usize, parent: TaggedValue) -> HeapResult<LocalRef> {
        let mut values = vec![TaggedValue::HOLE; LEXICAL_ENV_RESERVED_LENGTH + bindings];
        values[LEXICAL_ENV_PARENT_INDEX] = parent;
        values[LEXICAL_ENV_SCOPE_INFO_INDEX] = TaggedValue::UNDEFINED;
        self.heap
            .allocate_tagged_array(JsType::LexicalEnv, values, MemSpace::Young)
    }

    /// A flat string; the empty string is the shared constant
    pub fn new_line_string(&mut self, text: &str) -> HeapResult<HeapRef> {
        if text.is_empty() {
            return Ok(self.roots().empty_string().into());
        }
        let shape = self.heap.roots().record_shape(JsType::LineString);
        let payload = text.len().div_ceil(TAGGED_SIZE) * TAGGED_SIZE;
        let string = self
            .heap
            .construct_with_body(shape, MemSpace::Young, CellBody::Text(Box::from(text)), payload)?;
        let length = text.encode_utf16().count() as u32;
        self.set_named(string, "LengthAndFlags", primitive_u32(length));
        Ok(string.into())
    }

    fn symbol_hash(&self) -> u32 {
        let mut hasher = FxHasher::default();
        hasher.write_usize(self.heap.len());
        hasher.finish() as u32
    }

    pub fn new_symbol(&mut self, description: TaggedValue) -> HeapResult<LocalRef> {
        let hash = self.symbol_hash();
        let symbol = self.new_record(JsType::Symbol)?;
        self.set_named(symbol, "Description", description);
        self.set_named(symbol, "HashField", primitive_u32(hash));
        Ok(symbol)
    }

    /// A symbol naming a private class member
    pub fn new_private_symbol(&mut self, description: TaggedValue) -> HeapResult<LocalRef> {
        let symbol = self.new_symbol(description)?;
        self.set_named(symbol, "Flags", primitive_u32(SYMBOL_PRIVATE));
        Ok(symbol)
    }

    pub fn new_js_realm(&mut self, value: TaggedValue, global_env: TaggedValue) -> HeapResult<LocalRef> {
        let shape = self.realm().realm_class();
        let realm = self.heap.construct(shape, MemSpace::Young)?;
        self.set_named(realm, "Value", value);
        self.set_named(realm, "GlobalEnv", global_env);
        Ok(realm)
    }
}
