//! Global environment constants
//!
//! The constants split in two. [`SharedRoots`] is built once per shared heap
//! and handed to every realm by `Arc`: root shapes of the fixed-layout kinds,
//! the empty containers, built-in accessors and constant strings.
//! [`RealmRoots`] is built per realm from that realm's local heap: the
//! prototypes and the shapes that reference them.

use crate::cell::CellBody;
use crate::error::HeapResult;
use crate::factory::{ErrorType, FunctionKind};
use crate::heap::ObjectHeap;
use crate::layout::{js_function, js_function_base, tagged_array};
use crate::property::{PropertyAttributes, PropertyKey};
use crate::shape::{ShapeFlags, ShapeId, ShapeRef};
use crate::shared::SharedHeap;
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, SharedRef, TaggedValue};
use otter_heap_gc::MemSpace;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Native entry points behind the built-in accessors
pub mod native {
    pub const ARRAY_LENGTH_GETTER: i32 = 1;
    pub const ARRAY_LENGTH_SETTER: i32 = 2;
    pub const SHARED_ARRAY_LENGTH_GETTER: i32 = 3;
    pub const SHARED_ARRAY_LENGTH_SETTER: i32 = 4;
    pub const FUNCTION_LENGTH_GETTER: i32 = 5;
    pub const FUNCTION_NAME_GETTER: i32 = 6;
    pub const FUNCTION_PROTOTYPE_GETTER: i32 = 7;
    pub const FUNCTION_PROTOTYPE_SETTER: i32 = 8;
    /// Accessor without this half
    pub const NONE: i32 = 0;
}

macro_rules! constant_strings {
    ($($variant:ident => $text:literal,)*) => {
        /// Strings every realm needs preallocated
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ConstantString {
            $($variant,)*
        }

        impl ConstantString {
            pub const ALL: &'static [ConstantString] = &[$(ConstantString::$variant,)*];

            pub const fn text(self) -> &'static str {
                match self {
                    $(ConstantString::$variant => $text,)*
                }
            }
        }
    };
}

constant_strings! {
    Empty => "",
    Length => "length",
    Name => "name",
    Prototype => "prototype",
    Constructor => "constructor",
    Message => "message",
    Stack => "stack",
    Cause => "cause",
    Errors => "errors",
    Value => "value",
    Done => "done",
    Next => "next",
    Get => "get",
    Set => "set",
    Default => "default",
    OutOfMemory => "Out of memory",
}

impl ConstantString {
    pub fn key(self) -> PropertyKey {
        PropertyKey::from(self.text())
    }
}

/// Attributes of the array `length` accessor
pub const ARRAY_LENGTH_ATTRIBUTES: PropertyAttributes =
    PropertyAttributes::accessor(false, false).with_writable(true);
/// Attributes of the function `length` and `name` accessors
pub const FUNCTION_NAME_ATTRIBUTES: PropertyAttributes = PropertyAttributes::accessor(false, true);
/// Attributes of the function `prototype` accessor
pub const FUNCTION_PROTOTYPE_ATTRIBUTES: PropertyAttributes =
    PropertyAttributes::accessor(false, false).with_writable(true);

/// Process-wide roots, write-once
#[derive(Debug)]
pub struct SharedRoots {
    record_shapes: FxHashMap<JsType, ShapeId>,
    js_shapes: FxHashMap<JsType, ShapeId>,
    empty_array: SharedRef,
    empty_mutant_array: SharedRef,
    empty_tagged_queue: SharedRef,
    array_length_accessor: SharedRef,
    shared_array_length_accessor: SharedRef,
    function_length_accessor: SharedRef,
    function_name_accessor: SharedRef,
    function_prototype_accessor: SharedRef,
    sendable_elements_symbol: SharedRef,
    strings: Vec<SharedRef>,
}

/// Shared JS kinds that get a prebuilt root shape
const SHARED_JS_KINDS: &[JsType] = &[
    JsType::JsSharedObject,
    JsType::JsSharedArray,
    JsType::JsSharedFunction,
    JsType::JsSharedAsyncFunction,
    JsType::JsSharedMap,
    JsType::JsSharedSet,
    JsType::JsSendableArrayBuffer,
    JsType::JsSharedInt8Array,
    JsType::JsSharedUint8Array,
    JsType::JsSharedUint8ClampedArray,
    JsType::JsSharedInt16Array,
    JsType::JsSharedUint16Array,
    JsType::JsSharedInt32Array,
    JsType::JsSharedUint32Array,
    JsType::JsSharedFloat32Array,
    JsType::JsSharedFloat64Array,
    JsType::JsSharedBigint64Array,
    JsType::JsSharedBiguint64Array,
];

fn shared_tagged_array(
    heap: &SharedHeap,
    shape: ShapeId,
    values: Vec<TaggedValue>,
    space: MemSpace,
) -> HeapResult<SharedRef> {
    let len = values.len();
    let array = heap.construct_with_body(shape, space, CellBody::Elements(values), len * 8, None)?;
    heap.write_field(array, tagged_array::LENGTH, TaggedValue::Int(len as i32))?;
    Ok(array)
}

fn shared_string(heap: &SharedHeap, shape: ShapeId, text: &str) -> HeapResult<SharedRef> {
    let string = heap.construct_with_body(
        shape,
        MemSpace::SharedReadOnly,
        CellBody::Text(text.into()),
        text.len(),
        None,
    )?;
    heap.write_field(string, 0, TaggedValue::Int(text.len() as i32))?;
    Ok(string)
}

fn internal_accessor(heap: &SharedHeap, shape: ShapeId, getter: i32, setter: i32) -> HeapResult<SharedRef> {
    let accessor = heap.construct(shape, MemSpace::SharedNonMovable, None)?;
    heap.write_field(accessor, 0, TaggedValue::Int(getter))?;
    heap.write_field(accessor, 1, TaggedValue::Int(setter))?;
    Ok(accessor)
}

impl SharedRoots {
    /// Build the roots into `heap`
    ///
    /// Runs while the heap's roots slot is locked, so nothing here may ask
    /// the heap for its roots.
    pub(crate) fn build(heap: &SharedHeap) -> HeapResult<Self> {
        let record_shapes = heap.with_arena_mut(|arena| {
            JsType::ALL
                .iter()
                .filter(|ty| **ty != JsType::Invalid && !ty.is_ecma_object())
                .map(|&ty| (ty, arena.create_root(ty, 0, TaggedValue::NULL)))
                .collect::<FxHashMap<_, _>>()
        });
        let record = |ty: JsType| record_shapes[&ty];

        let empty_array = shared_tagged_array(heap, record(JsType::TaggedArray), Vec::new(), MemSpace::SharedReadOnly)?;
        let empty_mutant_array = shared_tagged_array(
            heap,
            record(JsType::MutantTaggedArray),
            Vec::new(),
            MemSpace::SharedReadOnly,
        )?;
        let empty_tagged_queue = shared_tagged_array(
            heap,
            record(JsType::TaggedArray),
            vec![TaggedValue::Int(0), TaggedValue::Int(0)],
            MemSpace::SharedReadOnly,
        )?;

        let accessor_shape = record(JsType::InternalAccessor);
        let array_length_accessor =
            internal_accessor(heap, accessor_shape, native::ARRAY_LENGTH_GETTER, native::ARRAY_LENGTH_SETTER)?;
        let shared_array_length_accessor = internal_accessor(
            heap,
            accessor_shape,
            native::SHARED_ARRAY_LENGTH_GETTER,
            native::SHARED_ARRAY_LENGTH_SETTER,
        )?;
        let function_length_accessor =
            internal_accessor(heap, accessor_shape, native::FUNCTION_LENGTH_GETTER, native::NONE)?;
        let function_name_accessor = internal_accessor(heap, accessor_shape, native::FUNCTION_NAME_GETTER, native::NONE)?;
        let function_prototype_accessor = internal_accessor(
            heap,
            accessor_shape,
            native::FUNCTION_PROTOTYPE_GETTER,
            native::FUNCTION_PROTOTYPE_SETTER,
        )?;

        let string_shape = record(JsType::LineString);
        let strings = ConstantString::ALL
            .iter()
            .map(|s| shared_string(heap, string_shape, s.text()))
            .collect::<HeapResult<Vec<_>>>()?;

        let sendable_elements_symbol = heap.construct(record(JsType::Symbol), MemSpace::SharedReadOnly, None)?;

        let js_shapes = heap.with_arena_mut(|arena| {
            let length = ConstantString::Length.key();
            let name = ConstantString::Name.key();
            let mut shapes = FxHashMap::default();
            for &ty in SHARED_JS_KINDS {
                let shape = match ty {
                    JsType::JsSharedArray => {
                        let root = arena.create_root(ty, 1, TaggedValue::NULL);
                        arena.add_transition(root, length.clone(), ARRAY_LENGTH_ATTRIBUTES)
                    }
                    JsType::JsSharedFunction | JsType::JsSharedAsyncFunction => {
                        let root = arena.create_root(ty, 2, TaggedValue::NULL);
                        let shape = arena.add_transition(root, length.clone(), FUNCTION_NAME_ATTRIBUTES);
                        arena.add_transition(shape, name.clone(), FUNCTION_NAME_ATTRIBUTES)
                    }
                    _ => arena.create_root(ty, 0, TaggedValue::NULL),
                };
                shapes.insert(ty, shape);
            }
            shapes
        });

        Ok(Self {
            record_shapes,
            js_shapes,
            empty_array,
            empty_mutant_array,
            empty_tagged_queue,
            array_length_accessor,
            shared_array_length_accessor,
            function_length_accessor,
            function_name_accessor,
            function_prototype_accessor,
            sendable_elements_symbol,
            strings,
        })
    }

    /// Root shape of a fixed-layout (non ECMA object) kind
    pub fn record_shape(&self, ty: JsType) -> ShapeRef {
        match self.record_shapes.get(&ty) {
            Some(&id) => ShapeRef::Shared(id),
            None => panic!("no shared root shape for {ty}"),
        }
    }

    /// Root shape of a shared JS kind
    pub fn shared_shape(&self, ty: JsType) -> ShapeId {
        match self.js_shapes.get(&ty) {
            Some(&id) => id,
            None => panic!("{ty} is not a shared JS kind"),
        }
    }

    /// The process-wide empty tagged array
    pub fn empty_array(&self) -> SharedRef {
        self.empty_array
    }

    pub fn empty_mutant_array(&self) -> SharedRef {
        self.empty_mutant_array
    }

    /// Empty reaction queue: a two-slot array of start and end indices
    pub fn empty_tagged_queue(&self) -> SharedRef {
        self.empty_tagged_queue
    }

    pub fn empty_string(&self) -> SharedRef {
        self.string(ConstantString::Empty)
    }

    pub fn array_length_accessor(&self) -> SharedRef {
        self.array_length_accessor
    }

    pub fn shared_array_length_accessor(&self) -> SharedRef {
        self.shared_array_length_accessor
    }

    pub fn function_length_accessor(&self) -> SharedRef {
        self.function_length_accessor
    }

    pub fn function_name_accessor(&self) -> SharedRef {
        self.function_name_accessor
    }

    pub fn function_prototype_accessor(&self) -> SharedRef {
        self.function_prototype_accessor
    }

    /// Private key of the static elements slot of a sendable class constructor
    pub fn sendable_elements_symbol(&self) -> SharedRef {
        self.sendable_elements_symbol
    }

    pub fn sendable_elements_key(&self) -> PropertyKey {
        PropertyKey::Symbol(HeapRef::Shared(self.sendable_elements_symbol))
    }

    pub fn string(&self, s: ConstantString) -> SharedRef {
        self.strings[s as usize]
    }

    /// Every root value, for the collector
    pub fn iter_roots(&self) -> impl Iterator<Item = TaggedValue> + '_ {
        [
            self.empty_array,
            self.empty_mutant_array,
            self.empty_tagged_queue,
            self.array_length_accessor,
            self.shared_array_length_accessor,
            self.function_length_accessor,
            self.function_name_accessor,
            self.function_prototype_accessor,
            self.sendable_elements_symbol,
        ]
        .into_iter()
        .chain(self.strings.iter().copied())
        .map(TaggedValue::from)
    }
}

/// Roots of one realm
#[derive(Debug)]
pub struct RealmRoots {
    object_prototype: LocalRef,
    function_prototype: LocalRef,
    array_prototype: LocalRef,
    iterator_prototype: LocalRef,
    error_prototypes: Vec<LocalRef>,
    object_class: ShapeId,
    null_proto_object_class: ShapeId,
    function_class_with_proto: ShapeId,
    function_class_without_proto: ShapeId,
    generator_function_class: ShapeId,
    async_function_class: ShapeId,
    async_generator_function_class: ShapeId,
    class_constructor_class: ShapeId,
    bound_function_class: ShapeId,
    array_class: ShapeId,
    arguments_class: ShapeId,
    iterator_result_class: ShapeId,
    error_classes: Vec<ShapeId>,
    proxy_class: ShapeId,
    callable_proxy_class: ShapeId,
    constructor_proxy_class: ShapeId,
    primitive_ref_class: ShapeId,
    realm_class: ShapeId,
    object_function: LocalRef,
    oom_error: LocalRef,
}

fn prototype_object(heap: &mut ObjectHeap, proto: TaggedValue) -> HeapResult<LocalRef> {
    let shape = heap.shapes_mut().create_root(JsType::JsObject, 0, proto);
    heap.shapes_mut().mark(shape, ShapeFlags::PROTOTYPE);
    heap.construct(ShapeRef::Local(shape), MemSpace::Old)
}

fn function_shape(heap: &mut ObjectHeap, ty: JsType, proto: TaggedValue, with_prototype: bool) -> ShapeId {
    let arena = heap.shapes_mut();
    let inline = if with_prototype { 3 } else { 2 };
    let mut shape = arena.create_root(ty, inline, proto);
    shape = arena.add_transition(shape, ConstantString::Length.key(), FUNCTION_NAME_ATTRIBUTES);
    shape = arena.add_transition(shape, ConstantString::Name.key(), FUNCTION_NAME_ATTRIBUTES);
    if with_prototype {
        shape = arena.add_transition(shape, ConstantString::Prototype.key(), FUNCTION_PROTOTYPE_ATTRIBUTES);
        arena.mark(shape, ShapeFlags::CONSTRUCTOR);
    }
    shape
}

impl RealmRoots {
    /// Build a realm's roots into `heap`
    pub fn build(heap: &mut ObjectHeap) -> HeapResult<Self> {
        let object_prototype = prototype_object(heap, TaggedValue::NULL)?;
        let object_proto = TaggedValue::from(object_prototype);
        let function_prototype = prototype_object(heap, object_proto)?;
        let array_prototype = prototype_object(heap, object_proto)?;
        let iterator_prototype = prototype_object(heap, object_proto)?;

        let mut error_prototypes = Vec::with_capacity(ErrorType::ALL.len());
        for &error in ErrorType::ALL {
            let parent = match error {
                ErrorType::Error => object_proto,
                _ => TaggedValue::from(error_prototypes[ErrorType::Error as usize]),
            };
            error_prototypes.push(prototype_object(heap, parent)?);
        }

        let inline = heap.config().default_inline_capacity;
        let function_proto = TaggedValue::from(function_prototype);
        let object_class = heap.shapes_mut().create_root(JsType::JsObject, inline, object_proto);
        let null_proto_object_class = heap.shapes_mut().create_root(JsType::JsObject, inline, TaggedValue::NULL);

        let function_class_with_proto = function_shape(heap, JsType::JsFunction, function_proto, true);
        let function_class_without_proto = function_shape(heap, JsType::JsFunction, function_proto, false);
        let generator_function_class = function_shape(heap, JsType::JsGeneratorFunction, function_proto, true);
        let async_function_class = function_shape(heap, JsType::JsAsyncFunction, function_proto, false);
        let async_generator_function_class =
            function_shape(heap, JsType::JsAsyncGeneratorFunction, function_proto, true);
        let class_constructor_class = function_shape(heap, JsType::JsFunction, function_proto, true);
        heap.shapes_mut()
            .mark(class_constructor_class, ShapeFlags::CLASS_CONSTRUCTOR);

        let arena = heap.shapes_mut();
        let bound_function_class = arena.create_root(JsType::JsBoundFunction, 0, function_proto);

        let array_class = arena.create_root(JsType::JsArray, 1, TaggedValue::from(array_prototype));
        let array_class = arena.add_transition(array_class, ConstantString::Length.key(), ARRAY_LENGTH_ATTRIBUTES);

        let arguments_class = arena.create_root(JsType::JsArguments, 1, object_proto);
        let arguments_class = arena.add_transition(
            arguments_class,
            ConstantString::Length.key(),
            PropertyAttributes::data_with(true, false, true),
        );

        let iterator_result_class = arena.create_root(JsType::JsObject, 2, object_proto);
        let iterator_result_class =
            arena.add_transition(iterator_result_class, ConstantString::Value.key(), PropertyAttributes::data());
        let iterator_result_class =
            arena.add_transition(iterator_result_class, ConstantString::Done.key(), PropertyAttributes::data());

        let error_classes: Vec<ShapeId> = ErrorType::ALL
            .iter()
            .map(|&error| {
                let proto = TaggedValue::from(error_prototypes[error as usize]);
                arena.create_root(error.js_type(), 2, proto)
            })
            .collect();

        let proxy_class = arena.create_root(JsType::JsProxy, 0, TaggedValue::NULL);
        let callable_proxy_class = arena.create_root(JsType::JsProxy, 0, TaggedValue::NULL);
        arena.mark(callable_proxy_class, ShapeFlags::CALLABLE);
        let constructor_proxy_class = arena.create_root(JsType::JsProxy, 0, TaggedValue::NULL);
        arena.mark(constructor_proxy_class, ShapeFlags::CALLABLE | ShapeFlags::CONSTRUCTOR);

        let primitive_ref_class = arena.create_root(JsType::JsPrimitiveRef, 0, object_proto);
        let realm_class = arena.create_root(JsType::JsRealm, 0, TaggedValue::NULL);

        let object_function = heap.construct(ShapeRef::Local(function_class_with_proto), MemSpace::Old)?;
        heap.set_field(object_function, js_function::PROTO_OR_HCLASS, object_proto);
        heap.set_field(
            object_function,
            js_function_base::BIT_FIELD,
            TaggedValue::Int(FunctionKind::BuiltinConstructor.bits()),
        );
        heap.set_initial_shape(object_function.into(), ShapeRef::Local(object_class));

        let oom_class: ShapeId = error_classes[ErrorType::OomError as usize];
        let oom_error = heap.construct(ShapeRef::Local(oom_class), MemSpace::Old)?;
        let message = heap.roots().string(ConstantString::OutOfMemory);
        heap.add_property(
            oom_error.into(),
            ConstantString::Message.key(),
            message.into(),
            PropertyAttributes::data_with(true, false, true),
        )?;

        tracing::debug!(
            target: "otter::heap::env",
            prototypes = 4 + error_prototypes.len(),
            shapes = heap.shapes().len(),
            "realm roots initialized"
        );

        Ok(Self {
            object_prototype,
            function_prototype,
            array_prototype,
            iterator_prototype,
            error_prototypes,
            object_class,
            null_proto_object_class,
            function_class_with_proto,
            function_class_without_proto,
            generator_function_class,
            async_function_class,
            async_generator_function_class,
            class_constructor_class,
            bound_function_class,
            array_class,
            arguments_class,
            iterator_result_class,
            error_classes,
            proxy_class,
            callable_proxy_class,
            constructor_proxy_class,
            primitive_ref_class,
            realm_class,
            object_function,
            oom_error,
        })
    }

    pub fn object_prototype(&self) -> LocalRef {
        self.object_prototype
    }

    pub fn function_prototype(&self) -> LocalRef {
        self.function_prototype
    }

    pub fn array_prototype(&self) -> LocalRef {
        self.array_prototype
    }

    pub fn iterator_prototype(&self) -> LocalRef {
        self.iterator_prototype
    }

    pub fn error_prototype(&self, error: ErrorType) -> LocalRef {
        self.error_prototypes[error as usize]
    }

    /// Plain object shape with the default in-object capacity
    pub fn object_class(&self) -> ShapeRef {
        ShapeRef::Local(self.object_class)
    }

    pub fn null_proto_object_class(&self) -> ShapeRef {
        ShapeRef::Local(self.null_proto_object_class)
    }

    /// Function shape for a function kind
    pub fn function_class(&self, kind: FunctionKind) -> ShapeRef {
        let id = match kind {
            FunctionKind::Generator => self.generator_function_class,
            FunctionKind::Async | FunctionKind::AsyncArrow => self.async_function_class,
            FunctionKind::AsyncGenerator => self.async_generator_function_class,
            FunctionKind::ClassConstructor | FunctionKind::DerivedConstructor => self.class_constructor_class,
            kind if kind.has_prototype() => self.function_class_with_proto,
            _ => self.function_class_without_proto,
        };
        ShapeRef::Local(id)
    }

    pub fn bound_function_class(&self) -> ShapeRef {
        ShapeRef::Local(self.bound_function_class)
    }

    pub fn array_class(&self) -> ShapeRef {
        ShapeRef::Local(self.array_class)
    }

    pub fn arguments_class(&self) -> ShapeRef {
        ShapeRef::Local(self.arguments_class)
    }

    /// Shape of `{ value, done }`
    pub fn iterator_result_class(&self) -> ShapeRef {
        ShapeRef::Local(self.iterator_result_class)
    }

    pub fn error_class(&self, error: ErrorType) -> ShapeRef {
        ShapeRef::Local(self.error_classes[error as usize])
    }

    pub fn proxy_class(&self, callable: bool, constructor: bool) -> ShapeRef {
        let id = match (callable, constructor) {
            (_, true) => self.constructor_proxy_class,
            (true, false) => self.callable_proxy_class,
            (false, false) => self.proxy_class,
        };
        ShapeRef::Local(id)
    }

    pub fn primitive_ref_class(&self) -> ShapeRef {
        ShapeRef::Local(self.primitive_ref_class)
    }

    pub fn realm_class(&self) -> ShapeRef {
        ShapeRef::Local(self.realm_class)
    }

    /// The `Object` constructor
    pub fn object_function(&self) -> LocalRef {
        self.object_function
    }

    /// Preallocated error thrown on heap exhaustion
    pub fn oom_error(&self) -> LocalRef {
        self.oom_error
    }

    /// Every root value, for the collector
    pub fn iter_roots(&self) -> impl Iterator<Item = TaggedValue> + '_ {
        [
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
            self.iterator_prototype,
            self.object_function,
            self.oom_error,
        ]
        .into_iter()
        .chain(self.error_prototypes.iter().copied())
        .map(TaggedValue::from)
    }
}

/// The constant table of one realm
#[derive(Debug, Clone)]
pub struct GlobalEnvConstants {
    shared: Arc<SharedRoots>,
    realm: Arc<RealmRoots>,
}

impl GlobalEnvConstants {
    /// Build the realm partition into `heap` and attach the shared one
    pub fn new(heap: &mut ObjectHeap) -> HeapResult<Self> {
        let shared = Arc::clone(heap.roots());
        let realm = Arc::new(RealmRoots::build(heap)?);
        Ok(Self { shared, realm })
    }

    pub fn shared(&self) -> &Arc<SharedRoots> {
        &self.shared
    }

    pub fn realm(&self) -> &Arc<RealmRoots> {
        &self.realm
    }
}
