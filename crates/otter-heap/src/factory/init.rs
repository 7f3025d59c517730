//! Two-phase cell construction
//!
//! Phase one fills a fresh cell: declared fields hold `Uninitialized` and
//! in-object slots hold the filler chosen by the shape. Phase two dispatches
//! on the type tag and sets every declared field to its layout default.

use crate::cell::{CellBody, HeapCell};
use crate::env_constants::SharedRoots;
use crate::layout::{FieldDefault, FieldKind, layout_of};
use crate::property::PropertyKey;
use crate::shape::{Shape, ShapeRef};
use crate::types::JsType;
use crate::value::TaggedValue;
use otter_heap_gc::HeapAddress;

/// Field initialization a type tag dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InitKind {
    /// Layout defaults only
    Ordinary,
    /// Defaults plus the function accessors in the in-object slots
    Function,
    /// Defaults plus the array length accessor
    Array,
    /// Defaults plus the shared array length accessor
    SharedArray,
    /// Fixed-layout record defaults
    Record,
}

/// Initializer of a type tag
///
/// Payload kinds (strings, arrays, dictionaries, byte arrays, code) are
/// initialized by their own constructors and have none.
pub(crate) fn init_kind(ty: JsType) -> Option<InitKind> {
    match ty {
        JsType::Invalid | JsType::JsFunctionBase => None,
        JsType::JsArray => Some(InitKind::Array),
        JsType::JsSharedArray => Some(InitKind::SharedArray),
        ty if ty.is_js_function() => Some(InitKind::Function),
        ty if ty.is_ecma_object() => Some(InitKind::Ordinary),
        JsType::Program => Some(InitKind::Ordinary),
        JsType::Hclass
        | JsType::FreeObjectWithNoneField
        | JsType::FreeObjectWithOneField
        | JsType::FreeObjectWithTwoField
        | JsType::Bigint
        | JsType::ByteArray
        | JsType::MachineCodeObject
        | JsType::GlobalEnv => None,
        ty if ty.is_string() || ty.is_tagged_array() => None,
        _ => Some(InitKind::Record),
    }
}

/// Phase one: a cell with no field initialized yet
pub(crate) fn prefill(
    shape: &Shape,
    shape_ref: ShapeRef,
    address: HeapAddress,
    size: usize,
    tracking: bool,
) -> HeapCell {
    let filler = if tracking {
        TaggedValue::UNINITIALIZED
    } else if shape.is_aot() {
        TaggedValue::HOLE
    } else {
        TaggedValue::UNDEFINED
    };
    HeapCell {
        shape: shape_ref,
        ty: shape.ty(),
        address,
        size,
        fields: vec![TaggedValue::UNINITIALIZED; layout_of(shape.ty()).field_count()],
        inline: vec![filler; shape.inline_capacity() as usize],
        body: CellBody::Empty,
    }
}

/// Value a declared default stands for
pub(crate) fn resolve_default(default: FieldDefault, roots: Option<&SharedRoots>) -> TaggedValue {
    match default {
        FieldDefault::Undefined => TaggedValue::UNDEFINED,
        FieldDefault::Null => TaggedValue::NULL,
        FieldDefault::Hole => TaggedValue::HOLE,
        FieldDefault::Int(i) => TaggedValue::Int(i),
        FieldDefault::Double(d) => TaggedValue::Double(d),
        FieldDefault::Bool(b) => TaggedValue::Bool(b),
        FieldDefault::U32(v) => primitive_u32(v),
        FieldDefault::Zero => TaggedValue::Int(0),
        FieldDefault::EmptyArray => match roots {
            Some(roots) => roots.empty_array().into(),
            None => panic!("empty array default needed before the shared roots exist"),
        },
        FieldDefault::EmptyQueue => match roots {
            Some(roots) => roots.empty_tagged_queue().into(),
            None => panic!("empty queue default needed before the shared roots exist"),
        },
    }
}

/// A raw 32-bit field value in cell form
pub(crate) fn primitive_u32(value: u32) -> TaggedValue {
    match i32::try_from(value) {
        Ok(i) => TaggedValue::Int(i),
        Err(_) => TaggedValue::Double(f64::from(value)),
    }
}

/// Set every declared field to its layout default
pub(crate) fn fill_declared(cell: &mut HeapCell, roots: Option<&SharedRoots>) {
    let class = layout_of(cell.ty);
    for (slot, field) in cell.fields.iter_mut().zip(class.fields()) {
        debug_assert_ne!(field.kind, FieldKind::ShapeWord);
        *slot = resolve_default(field.default, roots);
    }
}

/// Put a built-in accessor into the in-object slot holding `key`
fn inject_accessor(cell: &mut HeapCell, shape: &Shape, key: &str, accessor: TaggedValue) {
    let key = PropertyKey::from(key);
    if let Some((offset, attrs)) = shape.lookup(&key)
        && attrs.is_accessor()
        && attrs.is_inlined()
    {
        cell.inline[offset] = accessor;
    }
}

/// Phase two: dispatch on the type tag
///
/// Panics for a tag with no initializer.
pub(crate) fn initialize_object(cell: &mut HeapCell, shape: &Shape, roots: Option<&SharedRoots>) {
    let Some(kind) = init_kind(cell.ty) else {
        unreachable!("this branch is unreachable, type: {}", cell.ty.as_u8());
    };
    fill_declared(cell, roots);
    let Some(roots) = roots else {
        return;
    };
    match kind {
        InitKind::Array => {
            inject_accessor(cell, shape, "length", roots.array_length_accessor().into());
        }
        InitKind::SharedArray => {
            inject_accessor(cell, shape, "length", roots.shared_array_length_accessor().into());
        }
        InitKind::Function => {
            inject_accessor(cell, shape, "length", roots.function_length_accessor().into());
            inject_accessor(cell, shape, "name", roots.function_name_accessor().into());
            inject_accessor(cell, shape, "prototype", roots.function_prototype_accessor().into());
        }
        InitKind::Ordinary | InitKind::Record => {}
    }
}
