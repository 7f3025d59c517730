//! Binary layout registry
//!
//! Every heap object kind is described by a layout class: an ordered table of
//! its own fields plus a reference to the parent class whose fields precede
//! them. The registry flattens these chains once and computes byte offsets,
//! which compiled code and external tooling rely on bit for bit.
//!
//! The root class `TAGGED_OBJECT` holds only the shape word. A heap cell keeps
//! the shape word out of band, so the flattened [`ClassLayout::fields`] list
//! starts at the first field after it and its indices are the indices of
//! `HeapCell::fields`.

mod classes;
pub mod metadata;

use crate::types::JsType;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Size of one tagged word in bytes
pub const TAGGED_SIZE: usize = 8;

/// Storage kind of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The shape word at offset zero
    ShapeWord,
    /// A tagged value the collector scans
    Tagged,
    /// Raw 32-bit integer
    U32,
    /// Raw 64-bit integer or native pointer
    U64,
    /// Raw one-byte flag
    Bool,
}

impl FieldKind {
    /// Size in bytes, which is also the alignment
    pub const fn size(self) -> usize {
        match self {
            FieldKind::ShapeWord | FieldKind::Tagged | FieldKind::U64 => 8,
            FieldKind::U32 => 4,
            FieldKind::Bool => 1,
        }
    }

    /// Whether the collector must visit this field
    pub const fn is_tagged(self) -> bool {
        matches!(self, FieldKind::Tagged)
    }
}

/// Value a field holds right after construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Undefined,
    Null,
    Hole,
    Int(i32),
    Double(f64),
    Bool(bool),
    U32(u32),
    /// Zeroed raw word
    Zero,
    /// The shared empty tagged array
    EmptyArray,
    /// The shared empty tagged queue
    EmptyQueue,
}

/// Variable-size payload following the declared fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    None,
    /// Tagged slots the collector scans
    TaggedSlots,
    /// Raw words (mutant arrays)
    RawSlots,
    /// Raw bytes
    Bytes,
    /// Character data
    Chars,
    /// Hash table entries
    Dictionary,
}

impl Payload {
    pub const fn is_tagged(self) -> bool {
        matches!(self, Payload::TaggedSlots | Payload::Dictionary)
    }
}

/// A declared field
#[derive(Debug, Clone, Copy)]
pub struct FieldDecl {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl FieldDecl {
    pub const fn shape_word(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::ShapeWord,
            default: FieldDefault::Zero,
        }
    }

    pub const fn tagged(name: &'static str, default: FieldDefault) -> Self {
        Self {
            name,
            kind: FieldKind::Tagged,
            default,
        }
    }

    pub const fn u32(name: &'static str, value: u32) -> Self {
        Self {
            name,
            kind: FieldKind::U32,
            default: FieldDefault::U32(value),
        }
    }

    pub const fn u64(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::U64,
            default: FieldDefault::Zero,
        }
    }

    pub const fn boolean(name: &'static str, value: bool) -> Self {
        Self {
            name,
            kind: FieldKind::Bool,
            default: FieldDefault::Bool(value),
        }
    }
}

/// A declared layout class
#[derive(Debug, Clone, Copy)]
pub struct ClassDecl {
    pub name: &'static str,
    pub ty: Option<JsType>,
    pub parent: Option<&'static str>,
    pub fields: &'static [FieldDecl],
    pub payload: Payload,
}

impl ClassDecl {
    pub const fn root(name: &'static str, fields: &'static [FieldDecl]) -> Self {
        Self {
            name,
            ty: None,
            parent: None,
            fields,
            payload: Payload::None,
        }
    }

    /// A class no object is tagged with directly
    pub const fn abstract_class(
        name: &'static str,
        parent: &'static str,
        fields: &'static [FieldDecl],
    ) -> Self {
        Self {
            name,
            ty: None,
            parent: Some(parent),
            fields,
            payload: Payload::None,
        }
    }

    pub const fn concrete(ty: JsType, parent: &'static str, fields: &'static [FieldDecl]) -> Self {
        Self {
            name: ty.name(),
            ty: Some(ty),
            parent: Some(parent),
            fields,
            payload: Payload::None,
        }
    }

    pub const fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// A placed field
#[derive(Debug, Clone, Copy)]
pub struct FieldLayout {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
    /// Absolute byte offset from the start of the object
    pub offset: usize,
    /// Class that declares the field
    pub owner: &'static str,
}

impl FieldLayout {
    pub const fn size(&self) -> usize {
        self.kind.size()
    }
}

/// A flattened layout class
#[derive(Debug, Clone)]
pub struct ClassLayout {
    pub name: &'static str,
    pub ty: Option<JsType>,
    pub parent: Option<&'static str>,
    pub payload: Payload,
    /// Every field including the shape word
    all: Vec<FieldLayout>,
    /// Index into `all` of the first own field
    own_start: usize,
    end_offset: usize,
    ancestors: Vec<&'static str>,
}

impl ClassLayout {
    /// Fields stored in a heap cell, in order
    pub fn fields(&self) -> &[FieldLayout] {
        self.all.get(1..).unwrap_or(&[])
    }

    /// Fields this class declares itself
    pub fn own_fields(&self) -> &[FieldLayout] {
        &self.all[self.own_start..]
    }

    /// Number of cell fields
    pub fn field_count(&self) -> usize {
        self.fields().len()
    }

    /// Byte size of the fixed part, aligned to a tagged word
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    /// Index of a cell field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Ancestor class names from the immediate parent to the root
    pub fn parents(&self) -> &[&'static str] {
        &self.ancestors
    }

    /// Whether this class is `name` or descends from it
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.contains(&name)
    }

    /// Whether every cell field is tagged
    pub fn all_tagged(&self) -> bool {
        self.fields().iter().all(|f| f.kind.is_tagged())
    }
}

/// Flattened layouts of every class
pub struct LayoutRegistry {
    classes: Vec<ClassLayout>,
    by_name: FxHashMap<&'static str, usize>,
    by_type: Vec<Option<usize>>,
}

static REGISTRY: LazyLock<LayoutRegistry> = LazyLock::new(|| LayoutRegistry::build(classes::CLASSES));

/// The process-wide layout registry
pub fn layout_registry() -> &'static LayoutRegistry {
    &REGISTRY
}

/// Layout of a concrete type; panics for a tag without one
pub fn layout_of(ty: JsType) -> &'static ClassLayout {
    layout_registry().of(ty)
}

const fn align_to(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

impl LayoutRegistry {
    fn build(decls: &[ClassDecl]) -> Self {
        let mut classes: Vec<ClassLayout> = Vec::with_capacity(decls.len());
        let mut by_name = FxHashMap::default();
        let mut by_type = vec![None; JsType::COUNT];

        for decl in decls {
            let (mut all, mut ancestors, mut offset) = match decl.parent {
                Some(parent) => {
                    let Some(&index) = by_name.get(parent) else {
                        panic!("parent {parent} of {} must be declared first", decl.name);
                    };
                    let parent_class: &ClassLayout = &classes[index];
                    let mut ancestors = vec![parent_class.name];
                    ancestors.extend_from_slice(&parent_class.ancestors);
                    (parent_class.all.clone(), ancestors, parent_class.end_offset)
                }
                None => (Vec::new(), Vec::new(), 0),
            };
            let own_start = all.len();
            for field in decl.fields {
                offset = align_to(offset, field.kind.size());
                all.push(FieldLayout {
                    name: field.name,
                    kind: field.kind,
                    default: field.default,
                    offset,
                    owner: decl.name,
                });
                offset += field.kind.size();
            }
            ancestors.shrink_to_fit();

            let index = classes.len();
            assert!(
                by_name.insert(decl.name, index).is_none(),
                "layout class {} declared twice",
                decl.name
            );
            if let Some(ty) = decl.ty {
                by_type[ty.as_u8() as usize] = Some(index);
            }
            classes.push(ClassLayout {
                name: decl.name,
                ty: decl.ty,
                parent: decl.parent,
                payload: decl.payload,
                all,
                own_start,
                end_offset: align_to(offset, TAGGED_SIZE),
                ancestors,
            });
        }

        Self {
            classes,
            by_name,
            by_type,
        }
    }

    /// Layout of a concrete type
    pub fn get(&self, ty: JsType) -> Option<&ClassLayout> {
        self.by_type[ty.as_u8() as usize].map(|i| &self.classes[i])
    }

    /// Layout of a concrete type; panics for a tag without one
    pub fn of(&self, ty: JsType) -> &ClassLayout {
        match self.get(ty) {
            Some(class) => class,
            None => panic!("no layout class for type {ty}"),
        }
    }

    /// Layout class by name, including abstract classes
    pub fn class(&self, name: &str) -> Option<&ClassLayout> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    /// Every class in declaration order
    pub fn classes(&self) -> impl Iterator<Item = &ClassLayout> + '_ {
        self.classes.iter()
    }
}

/// Cell field indices shared by every JS object
pub mod js_object {
    pub const HASH: usize = 0;
    pub const PROPERTIES: usize = 1;
    pub const ELEMENTS: usize = 2;
    /// Fields every JS object carries
    pub const FIELD_COUNT: usize = 3;
}

pub mod js_array {
    pub const LENGTH: usize = 3;
    pub const TRACK_INFO: usize = 4;
}

pub mod js_shared_array {
    pub const LENGTH: usize = 3;
    pub const TRACK_INFO: usize = 4;
    pub const MOD_RECORD: usize = 5;
}

pub mod js_function_base {
    pub const METHOD: usize = 3;
    pub const BIT_FIELD: usize = 4;
    pub const LENGTH: usize = 5;
}

pub mod js_function {
    pub const PROTO_OR_HCLASS: usize = 6;
    pub const LEXICAL_ENV: usize = 7;
    pub const MACHINE_CODE: usize = 8;
    pub const BASELINE_CODE: usize = 9;
    pub const RAW_PROFILE_TYPE_INFO: usize = 10;
    pub const HOME_OBJECT: usize = 11;
    pub const MODULE: usize = 12;
}

pub mod js_bound_function {
    pub const BOUND_TARGET: usize = 6;
    pub const BOUND_THIS: usize = 7;
    pub const BOUND_ARGUMENTS: usize = 8;
}

pub mod js_proxy {
    pub const TARGET: usize = 1;
    pub const HANDLER: usize = 2;
    pub const METHOD: usize = 3;
    pub const PRIVATE_FIELD: usize = 4;
}

pub mod tagged_array {
    pub const LENGTH: usize = 0;
    pub const EXTRA_LENGTH: usize = 1;
}
