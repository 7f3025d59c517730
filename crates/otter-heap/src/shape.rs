//! Hidden classes (shapes) and their transition graph
//!
//! Shapes live in an arena and are addressed by [`ShapeId`]. A shape is never
//! mutated once an object uses it: adding a property, changing a prototype, or
//! preventing extensions yields another arena entry, cached as an edge so that
//! objects with identical histories end up on the same id.
//!
//! Each local heap owns one arena; the shared heap owns another. Record,
//! string and array shapes live in the shared arena and serve every context;
//! only sendable JS object shapes there carry the `SHARED` flag. [`ShapeRef`]
//! records which arena an id is in.

use crate::layout::layout_of;
use crate::layout_info::LayoutInfo;
use crate::property::{PropertyAttributes, PropertyKey, Representation};
use crate::types::JsType;
use crate::value::{HeapRef, TaggedValue};
use rustc_hash::FxHashMap;
use std::fmt;

/// Index of a shape in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u32);

impl ShapeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// A shape in either the local or the shared arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRef {
    Local(ShapeId),
    Shared(ShapeId),
}

impl ShapeRef {
    pub const fn id(self) -> ShapeId {
        match self {
            ShapeRef::Local(id) | ShapeRef::Shared(id) => id,
        }
    }

    pub const fn is_shared(self) -> bool {
        matches!(self, ShapeRef::Shared(_))
    }
}

/// Shape flag bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShapeFlags(u16);

impl ShapeFlags {
    pub const EXTENSIBLE: ShapeFlags = ShapeFlags(1 << 0);
    pub const CALLABLE: ShapeFlags = ShapeFlags(1 << 1);
    pub const CONSTRUCTOR: ShapeFlags = ShapeFlags(1 << 2);
    pub const PROTOTYPE: ShapeFlags = ShapeFlags(1 << 3);
    pub const DICTIONARY: ShapeFlags = ShapeFlags(1 << 4);
    pub const DICTIONARY_ELEMENTS: ShapeFlags = ShapeFlags(1 << 5);
    pub const SHARED: ShapeFlags = ShapeFlags(1 << 6);
    /// Built from ahead-of-time layout information
    pub const AOT: ShapeFlags = ShapeFlags(1 << 7);
    pub const CLASS_CONSTRUCTOR: ShapeFlags = ShapeFlags(1 << 8);
    /// Every in-object slot holds a tagged value
    pub const ALL_TAGGED: ShapeFlags = ShapeFlags(1 << 9);

    pub const fn empty() -> Self {
        ShapeFlags(0)
    }

    pub const fn contains(self, other: ShapeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: ShapeFlags) -> Self {
        ShapeFlags(self.0 | other.0)
    }

    pub const fn without(self, other: ShapeFlags) -> Self {
        ShapeFlags(self.0 & !other.0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl std::ops::BitOr for ShapeFlags {
    type Output = ShapeFlags;

    fn bitor(self, rhs: ShapeFlags) -> ShapeFlags {
        self.union(rhs)
    }
}

impl fmt::Debug for ShapeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 10] = [
            "EXTENSIBLE",
            "CALLABLE",
            "CONSTRUCTOR",
            "PROTOTYPE",
            "DICTIONARY",
            "DICTIONARY_ELEMENTS",
            "SHARED",
            "AOT",
            "CLASS_CONSTRUCTOR",
            "ALL_TAGGED",
        ];
        let set: Vec<_> = NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "ShapeFlags({})", set.join(" | "))
    }
}

/// One hidden class
#[derive(Debug, Clone)]
pub struct Shape {
    ty: JsType,
    object_size: usize,
    inline_capacity: u32,
    /// `None` in dictionary mode
    layout: Option<LayoutInfo>,
    /// Template dictionary of a shared dictionary-mode class
    layout_dictionary: Option<HeapRef>,
    flags: ShapeFlags,
    proto: TaggedValue,
    parent: Option<ShapeId>,
    root: ShapeId,
    /// Property added by the edge leading here
    key: Option<PropertyKey>,
}

impl Shape {
    pub fn ty(&self) -> JsType {
        self.ty
    }

    /// Object size in bytes including the in-object slots
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    pub fn inline_capacity(&self) -> u32 {
        self.inline_capacity
    }

    pub fn layout(&self) -> Option<&LayoutInfo> {
        self.layout.as_ref()
    }

    pub fn layout_dictionary(&self) -> Option<HeapRef> {
        self.layout_dictionary
    }

    pub fn is_dictionary(&self) -> bool {
        self.flags.contains(ShapeFlags::DICTIONARY)
    }

    /// Named properties the layout describes
    pub fn number_of_props(&self) -> u32 {
        self.layout.as_ref().map_or(0, |l| l.len() as u32)
    }

    pub fn flags(&self) -> ShapeFlags {
        self.flags
    }

    pub fn is_extensible(&self) -> bool {
        self.flags.contains(ShapeFlags::EXTENSIBLE)
    }

    pub fn is_callable(&self) -> bool {
        self.flags.contains(ShapeFlags::CALLABLE)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(ShapeFlags::CONSTRUCTOR)
    }

    pub fn is_prototype(&self) -> bool {
        self.flags.contains(ShapeFlags::PROTOTYPE)
    }

    pub fn is_shared(&self) -> bool {
        self.flags.contains(ShapeFlags::SHARED)
    }

    pub fn is_aot(&self) -> bool {
        self.flags.contains(ShapeFlags::AOT)
    }

    pub fn is_class_constructor(&self) -> bool {
        self.flags.contains(ShapeFlags::CLASS_CONSTRUCTOR)
    }

    pub fn is_all_tagged(&self) -> bool {
        self.flags.contains(ShapeFlags::ALL_TAGGED)
    }

    pub fn has_dictionary_elements(&self) -> bool {
        self.flags.contains(ShapeFlags::DICTIONARY_ELEMENTS)
    }

    pub fn proto(&self) -> TaggedValue {
        self.proto
    }

    pub fn parent(&self) -> Option<ShapeId> {
        self.parent
    }

    pub fn root(&self) -> ShapeId {
        self.root
    }

    pub fn key(&self) -> Option<&PropertyKey> {
        self.key.as_ref()
    }

    /// Slot and attributes of a named property
    pub fn lookup(&self, key: &PropertyKey) -> Option<(usize, PropertyAttributes)> {
        self.layout.as_ref().and_then(|l| l.find(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransitionKey {
    from: ShapeId,
    key: PropertyKey,
    bits: u32,
}

/// Per-tree bookkeeping for a root shape
#[derive(Debug, Clone, Copy, Default)]
struct RootInfo {
    shape_count: u32,
    /// Instantiations left before size tracking completes
    construction_counter: u8,
    /// Most properties any instance reached, once tracking completed
    tracked_props: Option<u32>,
}

/// Arena of shapes with cached transition edges
#[derive(Debug)]
pub struct ShapeArena {
    shared: bool,
    tracking_start: u8,
    nodes: Vec<Shape>,
    transitions: FxHashMap<TransitionKey, ShapeId>,
    proto_transitions: FxHashMap<(ShapeId, u64), ShapeId>,
    extension_transitions: FxHashMap<ShapeId, ShapeId>,
    elements_dict_transitions: FxHashMap<ShapeId, ShapeId>,
    roots: FxHashMap<ShapeId, RootInfo>,
}

impl ShapeArena {
    /// Create an arena; `tracking_start` seeds object-size tracking
    pub fn new(shared: bool, tracking_start: u8) -> Self {
        Self {
            shared,
            tracking_start,
            nodes: Vec::new(),
            transitions: FxHashMap::default(),
            proto_transitions: FxHashMap::default(),
            extension_transitions: FxHashMap::default(),
            elements_dict_transitions: FxHashMap::default(),
            roots: FxHashMap::default(),
        }
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reference tagged with this arena's domain
    pub fn shape_ref(&self, id: ShapeId) -> ShapeRef {
        if self.shared {
            ShapeRef::Shared(id)
        } else {
            ShapeRef::Local(id)
        }
    }

    pub fn get(&self, id: ShapeId) -> &Shape {
        match self.nodes.get(id.index()) {
            Some(shape) => shape,
            None => panic!("{id} is not in this arena"),
        }
    }

    fn check_proto(&self, proto: TaggedValue) {
        if self.shared && proto.local_ref().is_some() {
            panic!("shared shape cannot reference a local prototype");
        }
    }

    fn push(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.nodes.len() as u32);
        self.nodes.push(shape);
        id
    }

    fn push_in_tree(&mut self, mut shape: Shape, root: ShapeId) -> ShapeId {
        shape.root = root;
        let id = self.push(shape);
        self.roots.entry(root).or_default().shape_count += 1;
        id
    }

    /// A property-less shape sized by the type's layout plus `inline_capacity` slots
    pub fn create_root(&mut self, ty: JsType, inline_capacity: u32, proto: TaggedValue) -> ShapeId {
        let size = layout_of(ty).end_offset() + inline_capacity as usize * 8;
        self.create_root_with_size(ty, size, inline_capacity, proto)
    }

    /// A property-less shape with an explicit object size
    pub fn create_root_with_size(
        &mut self,
        ty: JsType,
        object_size: usize,
        inline_capacity: u32,
        proto: TaggedValue,
    ) -> ShapeId {
        if !self.shared && ty.is_shared_js_kind() {
            panic!("type {ty} only lives in the shared heap");
        }
        self.check_proto(proto);

        let class = layout_of(ty);
        let mut flags = ShapeFlags::empty();
        if ty.is_ecma_object() {
            flags = flags | ShapeFlags::EXTENSIBLE;
        }
        if ty.is_js_function_base() {
            flags = flags | ShapeFlags::CALLABLE;
        }
        if self.shared && ty.is_ecma_object() {
            flags = flags | ShapeFlags::SHARED;
        }
        if class.all_tagged() {
            flags = flags | ShapeFlags::ALL_TAGGED;
        }

        let id = ShapeId(self.nodes.len() as u32);
        let tracking = !self.shared && ty.is_js_object() && inline_capacity > 0;
        self.push(Shape {
            ty,
            object_size,
            inline_capacity,
            layout: Some(LayoutInfo::new()),
            layout_dictionary: None,
            flags,
            proto,
            parent: None,
            root: id,
            key: None,
        });
        self.roots.insert(
            id,
            RootInfo {
                shape_count: 1,
                construction_counter: if tracking { self.tracking_start } else { 0 },
                tracked_props: None,
            },
        );
        id
    }

    /// Set flags on a shape no object uses yet
    pub(crate) fn mark(&mut self, id: ShapeId, flags: ShapeFlags) {
        let shape = &mut self.nodes[id.index()];
        shape.flags = shape.flags | flags;
    }

    /// Attach the template dictionary of a dictionary-mode class shape
    pub(crate) fn attach_layout_dictionary(&mut self, id: ShapeId, dictionary: HeapRef) {
        if self.shared {
            assert!(dictionary.is_shared(), "shared shape needs a shared dictionary");
        }
        self.nodes[id.index()].layout_dictionary = Some(dictionary);
    }

    /// Edge for `key` with `attributes`, created on first use
    ///
    /// The new property's offset is the next free layout offset; it is inline
    /// while the offset is below the inline capacity.
    pub fn add_transition(
        &mut self,
        from: ShapeId,
        key: PropertyKey,
        attributes: PropertyAttributes,
    ) -> ShapeId {
        let edge = TransitionKey {
            from,
            key,
            bits: attributes.transition_bits(),
        };
        if let Some(&to) = self.transitions.get(&edge) {
            return to;
        }
        if self.shared && !edge.key.is_shareable() {
            panic!("shared shape cannot use local key {}", edge.key);
        }

        let base = self.get(from);
        let Some(layout) = base.layout.as_ref() else {
            panic!("{from} is in dictionary mode and has no transitions");
        };
        let offset = layout.next_offset();
        let inlined = offset < base.inline_capacity;
        let attributes = attributes.with_offset(offset).with_inlined(inlined);
        let layout = layout.extended(edge.key.clone(), attributes);

        let mut next = base.clone();
        if inlined && attributes.representation() == Representation::Double {
            next.flags = next.flags.without(ShapeFlags::ALL_TAGGED);
        }
        next.layout = Some(layout);
        next.parent = Some(from);
        next.key = Some(edge.key.clone());
        let root = base.root;
        let to = self.push_in_tree(next, root);
        self.transitions.insert(edge, to);
        to
    }

    /// Existing edge, if any
    pub fn find_transition(
        &self,
        from: ShapeId,
        key: &PropertyKey,
        attributes: PropertyAttributes,
    ) -> Option<ShapeId> {
        let edge = TransitionKey {
            from,
            key: key.clone(),
            bits: attributes.transition_bits(),
        };
        self.transitions.get(&edge).copied()
    }

    /// Same layout with another prototype
    pub fn transition_proto(&mut self, from: ShapeId, proto: TaggedValue) -> ShapeId {
        self.check_proto(proto);
        let edge = (from, proto.encode());
        if let Some(&to) = self.proto_transitions.get(&edge) {
            return to;
        }
        let base = self.get(from);
        let root = base.root;
        let mut next = base.clone();
        next.proto = proto;
        next.parent = Some(from);
        next.key = None;
        let to = self.push_in_tree(next, root);
        self.proto_transitions.insert(edge, to);
        to
    }

    /// Same layout, not extensible
    pub fn transition_extension(&mut self, from: ShapeId) -> ShapeId {
        if let Some(&to) = self.extension_transitions.get(&from) {
            return to;
        }
        let base = self.get(from);
        let root = base.root;
        let mut next = base.clone();
        next.flags = next.flags.without(ShapeFlags::EXTENSIBLE);
        next.parent = Some(from);
        next.key = None;
        let to = self.push_in_tree(next, root);
        self.extension_transitions.insert(from, to);
        to
    }

    /// Same layout with dictionary elements
    pub fn elements_to_dictionary(&mut self, from: ShapeId) -> ShapeId {
        if self.get(from).has_dictionary_elements() {
            return from;
        }
        if let Some(&to) = self.elements_dict_transitions.get(&from) {
            return to;
        }
        let base = self.get(from);
        let root = base.root;
        let mut next = base.clone();
        next.flags = next.flags | ShapeFlags::DICTIONARY_ELEMENTS;
        next.parent = Some(from);
        next.key = None;
        let to = self.push_in_tree(next, root);
        self.elements_dict_transitions.insert(from, to);
        to
    }

    /// A private copy heading a fresh transition tree
    ///
    /// Without inline properties every property moves out of line and the
    /// object size shrinks accordingly.
    pub fn clone_shape(&mut self, from: ShapeId, with_inline: bool) -> ShapeId {
        let base = self.get(from);
        let mut next = base.clone();
        if !with_inline && base.inline_capacity > 0 {
            next.object_size = base.object_size - base.inline_capacity as usize * 8;
            next.inline_capacity = 0;
            if let Some(layout) = base.layout.as_ref() {
                let mut moved = LayoutInfo::new();
                for entry in layout.entries() {
                    let attrs = entry.attributes.with_inlined(false);
                    moved = moved.extended(entry.key.clone(), attrs);
                }
                next.layout = Some(moved);
            }
            if layout_of(base.ty).all_tagged() {
                next.flags = next.flags | ShapeFlags::ALL_TAGGED;
            }
        }
        next.parent = None;
        next.key = None;
        let id = ShapeId(self.nodes.len() as u32);
        next.root = id;
        self.push(next);
        self.roots.insert(
            id,
            RootInfo {
                shape_count: 1,
                ..RootInfo::default()
            },
        );
        id
    }

    /// Dictionary-mode copy of a shape
    ///
    /// The result has no layout and no in-object slots and is not cached:
    /// every object migrating to dictionary mode gets its own shape.
    pub fn to_dictionary(&mut self, from: ShapeId) -> ShapeId {
        let cloned = self.clone_shape(from, false);
        let shape = &mut self.nodes[cloned.index()];
        shape.layout = None;
        shape.flags = shape.flags | ShapeFlags::DICTIONARY;
        cloned
    }

    /// Ancestors of a shape up to its root, starting with the shape itself
    pub fn ancestors(&self, id: ShapeId) -> impl Iterator<Item = ShapeId> + '_ {
        std::iter::successors(Some(id), move |&current| self.get(current).parent)
    }

    /// Shapes created so far in the tree `id` belongs to
    pub fn shapes_in_tree(&self, id: ShapeId) -> u32 {
        let root = self.get(id).root;
        self.roots.get(&root).map_or(0, |r| r.shape_count)
    }

    /// Whether object-size tracking is still running for `id`'s tree
    pub fn is_tracking(&self, id: ShapeId) -> bool {
        let root = self.get(id).root;
        self.roots
            .get(&root)
            .is_some_and(|r| r.construction_counter > 0)
    }

    /// Property count the tree settled on once tracking completed
    pub fn tracked_props(&self, id: ShapeId) -> Option<u32> {
        let root = self.get(id).root;
        self.roots.get(&root).and_then(|r| r.tracked_props)
    }

    /// Record one instantiation; returns whether tracking was in progress
    ///
    /// When the counter reaches zero the tree records the largest property
    /// count any shape in it reached. Existing shapes keep their sizes.
    pub fn on_instantiation(&mut self, id: ShapeId) -> bool {
        let root = self.get(id).root;
        let Some(info) = self.roots.get_mut(&root) else {
            return false;
        };
        if info.construction_counter == 0 {
            return false;
        }
        info.construction_counter -= 1;
        if info.construction_counter == 0 {
            let max = self
                .nodes
                .iter()
                .filter(|s| s.root == root)
                .map(Shape::number_of_props)
                .max()
                .unwrap_or(0);
            if let Some(info) = self.roots.get_mut(&root) {
                info.tracked_props = Some(max);
            }
            tracing::debug!(
                target: "otter::heap::shape",
                root = root.index(),
                props = max,
                "object size tracking completed"
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ShapeArena {
        ShapeArena::new(false, 7)
    }

    #[test]
    fn test_identical_histories_share_shapes() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 4, TaggedValue::NULL);
        let attrs = PropertyAttributes::data();

        let a1 = shapes.add_transition(root, "x".into(), attrs);
        let b1 = shapes.add_transition(a1, "y".into(), attrs);
        let a2 = shapes.add_transition(root, "x".into(), attrs);
        let b2 = shapes.add_transition(a2, "y".into(), attrs);

        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        assert_eq!(shapes.get(b1).number_of_props(), 2);
        assert_eq!(shapes.shapes_in_tree(b1), 3);
    }

    #[test]
    fn test_attributes_split_edges() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 4, TaggedValue::NULL);
        let plain = shapes.add_transition(root, "x".into(), PropertyAttributes::data());
        let frozen = shapes.add_transition(root, "x".into(), PropertyAttributes::frozen());
        assert_ne!(plain, frozen);
    }

    #[test]
    fn test_inline_then_out_of_line() {
        let mut shapes = arena();
        let mut id = shapes.create_root(JsType::JsObject, 2, TaggedValue::NULL);
        for key in ["a", "b", "c"] {
            id = shapes.add_transition(id, key.into(), PropertyAttributes::data());
        }
        let shape = shapes.get(id);
        assert!(shape.lookup(&"b".into()).is_some_and(|(_, a)| a.is_inlined()));
        assert!(shape.lookup(&"c".into()).is_some_and(|(_, a)| !a.is_inlined()));
    }

    #[test]
    fn test_double_inline_clears_all_tagged() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 2, TaggedValue::NULL);
        assert!(shapes.get(root).is_all_tagged());
        let attrs = PropertyAttributes::data().with_representation(Representation::Double);
        let next = shapes.add_transition(root, "d".into(), attrs);
        assert!(!shapes.get(next).is_all_tagged());
    }

    #[test]
    fn test_proto_and_extension_edges_are_cached() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 0, TaggedValue::NULL);
        let p1 = shapes.transition_proto(root, TaggedValue::Int(1));
        let p2 = shapes.transition_proto(root, TaggedValue::Int(1));
        assert_eq!(p1, p2);
        assert_eq!(shapes.get(p1).proto(), TaggedValue::Int(1));

        let sealed = shapes.transition_extension(root);
        assert!(!shapes.get(sealed).is_extensible());
        assert_eq!(shapes.transition_extension(root), sealed);
    }

    #[test]
    fn test_dictionary_shapes_are_private() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 4, TaggedValue::NULL);
        let a = shapes.to_dictionary(root);
        let b = shapes.to_dictionary(root);
        assert_ne!(a, b);
        assert!(shapes.get(a).is_dictionary());
        assert!(shapes.get(a).layout().is_none());
        assert_eq!(shapes.get(a).inline_capacity(), 0);
    }

    #[test]
    #[should_panic(expected = "dictionary mode")]
    fn test_dictionary_shape_has_no_transitions() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 4, TaggedValue::NULL);
        let dict = shapes.to_dictionary(root);
        shapes.add_transition(dict, "x".into(), PropertyAttributes::data());
    }

    #[test]
    fn test_size_tracking_records_max() {
        let mut shapes = ShapeArena::new(false, 2);
        let root = shapes.create_root(JsType::JsObject, 4, TaggedValue::NULL);
        let a = shapes.add_transition(root, "a".into(), PropertyAttributes::data());
        let _ = shapes.add_transition(a, "b".into(), PropertyAttributes::data());

        assert!(shapes.is_tracking(root));
        assert!(shapes.on_instantiation(root));
        assert!(shapes.on_instantiation(a));
        assert!(!shapes.is_tracking(root));
        assert!(!shapes.on_instantiation(root));
        assert_eq!(shapes.tracked_props(a), Some(2));
        assert_eq!(shapes.get(root).inline_capacity(), 4);
    }

    #[test]
    fn test_clone_without_inline() {
        let mut shapes = arena();
        let root = shapes.create_root(JsType::JsObject, 4, TaggedValue::NULL);
        let a = shapes.add_transition(root, "a".into(), PropertyAttributes::data());
        let cloned = shapes.clone_shape(a, false);

        let shape = shapes.get(cloned);
        assert_eq!(shape.root(), cloned);
        assert_eq!(shape.object_size(), 32);
        assert!(shape.lookup(&"a".into()).is_some_and(|(_, attrs)| !attrs.is_inlined()));
    }

    #[test]
    #[should_panic(expected = "only lives in the shared heap")]
    fn test_local_arena_rejects_shared_kinds() {
        arena().create_root(JsType::JsSharedArray, 0, TaggedValue::NULL);
    }

    #[test]
    fn test_shared_arena_flags() {
        let mut shapes = ShapeArena::new(true, 7);
        let root = shapes.create_root(JsType::JsSharedObject, 2, TaggedValue::NULL);
        assert!(shapes.get(root).is_shared());
        assert_eq!(shapes.shape_ref(root), ShapeRef::Shared(root));
    }
}
