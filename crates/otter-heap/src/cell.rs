//! Heap cells
//!
//! A cell is the storage of one heap object: its shape, the declared fields
//! of its layout class, the in-object property slots, and an optional
//! variable-size payload.

use crate::dictionary::Dictionary;
use crate::shape::ShapeRef;
use crate::types::JsType;
use crate::value::TaggedValue;
use otter_heap_gc::HeapAddress;

/// Variable-size part of a cell
#[derive(Debug, Clone, Default)]
pub enum CellBody {
    #[default]
    Empty,
    /// Array payload (tagged or raw words)
    Elements(Vec<TaggedValue>),
    /// Byte payload
    Bytes(Vec<u8>),
    /// String payload
    Text(Box<str>),
    /// Hash table payload
    Dictionary(Box<Dictionary>),
}

/// One heap object
#[derive(Debug, Clone)]
pub struct HeapCell {
    pub(crate) shape: ShapeRef,
    pub(crate) ty: JsType,
    pub(crate) address: HeapAddress,
    pub(crate) size: usize,
    /// Declared fields after the shape word
    pub(crate) fields: Vec<TaggedValue>,
    /// In-object property slots
    pub(crate) inline: Vec<TaggedValue>,
    pub(crate) body: CellBody,
}

impl HeapCell {
    pub fn shape(&self) -> ShapeRef {
        self.shape
    }

    pub fn ty(&self) -> JsType {
        self.ty
    }

    pub fn address(&self) -> HeapAddress {
        self.address
    }

    /// Allocated size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fields(&self) -> &[TaggedValue] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> TaggedValue {
        self.fields[index]
    }

    pub fn inline(&self) -> &[TaggedValue] {
        &self.inline
    }

    pub fn body(&self) -> &CellBody {
        &self.body
    }

    /// Array payload
    pub fn elements(&self) -> Option<&[TaggedValue]> {
        match &self.body {
            CellBody::Elements(values) => Some(values),
            _ => None,
        }
    }

    pub(crate) fn elements_mut(&mut self) -> Option<&mut Vec<TaggedValue>> {
        match &mut self.body {
            CellBody::Elements(values) => Some(values),
            _ => None,
        }
    }

    pub fn dictionary(&self) -> Option<&Dictionary> {
        match &self.body {
            CellBody::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub(crate) fn dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match &mut self.body {
            CellBody::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            CellBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            CellBody::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}
