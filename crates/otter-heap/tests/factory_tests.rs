//! Object factory integration tests
//!
//! Covers default construction of every local type tag, literal cloning,
//! error construction and the sharedness checks at allocation time.

use otter_heap::layout::{FieldDefault, js_array, js_function, js_object};
use otter_heap::{
    ElementsStorage, ErrorType, FunctionKind, GlobalEnvConstants, HeapContext, HeapRef, JsType, LocalRef,
    MemSpace, ObjectFactory, PropertyAttributes, PropertyKey, RealmId, SharedHeap, ShapeRef, TaggedValue,
    layout_of,
};
use std::sync::Arc;

fn context() -> (HeapContext, RealmId) {
    let mut ctx = HeapContext::new(Arc::new(SharedHeap::default())).unwrap();
    let realm = ctx.create_realm().unwrap();
    (ctx, realm)
}

fn expected_default(default: FieldDefault, constants: &GlobalEnvConstants) -> TaggedValue {
    match default {
        FieldDefault::Undefined => TaggedValue::UNDEFINED,
        FieldDefault::Null => TaggedValue::NULL,
        FieldDefault::Hole => TaggedValue::HOLE,
        FieldDefault::Int(i) => TaggedValue::Int(i),
        FieldDefault::Double(d) => TaggedValue::Double(d),
        FieldDefault::Bool(b) => TaggedValue::Bool(b),
        FieldDefault::U32(v) => match i32::try_from(v) {
            Ok(i) => TaggedValue::Int(i),
            Err(_) => TaggedValue::Double(f64::from(v)),
        },
        FieldDefault::Zero => TaggedValue::Int(0),
        FieldDefault::EmptyArray => constants.shared().empty_array().into(),
        FieldDefault::EmptyQueue => constants.shared().empty_tagged_queue().into(),
    }
}

fn string_text(factory: &ObjectFactory<'_>, value: TaggedValue) -> String {
    let Some(string) = value.heap_ref() else {
        panic!("{value} is not a string");
    };
    factory
        .heap()
        .with_cell(string, |cell| cell.text().map(str::to_owned))
        .unwrap()
}

// ============================================================================
// Default construction
// ============================================================================

#[test]
fn test_every_local_type_gets_layout_defaults() {
    let (mut ctx, realm) = context();
    let constants = ctx.constants(realm).unwrap();
    let mut factory = ctx.factory(realm).unwrap();

    let mut checked = 0;
    for &ty in JsType::ALL {
        if matches!(ty, JsType::Invalid | JsType::JsFunctionBase) || ty.is_shared_js_kind() {
            continue;
        }
        let obj = factory.new_default(ty).unwrap();
        assert_eq!(factory.heap().type_of(obj), ty);
        for (index, field) in layout_of(ty).fields().iter().enumerate() {
            let actual = factory.heap().field(obj, index);
            let expected = expected_default(field.default, &constants);
            assert!(
                actual.same_word(expected),
                "{ty}.{} is {actual}, expected {expected}",
                field.name
            );
        }
        checked += 1;
    }
    assert!(checked > 150, "only {checked} type tags constructed");
}

#[test]
fn test_allocation_is_counted_per_type() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let before = factory.heap().allocation_count(JsType::JsObject);
    factory.new_empty_js_object().unwrap();
    factory.new_empty_js_object().unwrap();
    assert_eq!(factory.heap().allocation_count(JsType::JsObject), before + 2);
}

#[test]
fn test_zero_length_arrays_are_the_shared_singleton() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let empty = HeapRef::Shared(factory.roots().empty_array());
    assert_eq!(factory.new_tagged_array(0, TaggedValue::UNDEFINED, MemSpace::Young).unwrap(), empty);
    assert_eq!(factory.new_tagged_array_from(Vec::new(), MemSpace::Old).unwrap(), empty);
    assert_eq!(factory.new_cow_tagged_array(Vec::new()).unwrap(), empty);
}

#[test]
fn test_non_movable_copy_is_copy_on_write() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let array = factory
        .new_tagged_array_from(vec![TaggedValue::Int(1), TaggedValue::Int(2)], MemSpace::Young)
        .unwrap();
    let copy = factory.copy_array(array, 4, MemSpace::NonMovable).unwrap();
    assert_eq!(factory.heap().type_of(copy), JsType::CowTaggedArray);
    assert_eq!(
        factory.heap().array_values(copy),
        vec![TaggedValue::Int(1), TaggedValue::Int(2), TaggedValue::HOLE, TaggedValue::HOLE]
    );
}

#[test]
fn test_bound_function_length() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let method = factory.new_method(FunctionKind::Normal, 3).unwrap();
    let target = factory.new_js_function(method.into()).unwrap();
    let bound = factory
        .new_js_bound_function(target.into(), TaggedValue::UNDEFINED, &[TaggedValue::Int(1)])
        .unwrap();
    assert_eq!(
        factory.heap().field(bound.into(), otter_heap::layout::js_function_base::LENGTH),
        TaggedValue::Int(2)
    );
}

#[test]
fn test_bind_rejects_non_callable_target() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let obj = factory.new_empty_js_object().unwrap();
    let err = factory
        .new_js_bound_function(obj.into(), TaggedValue::UNDEFINED, &[])
        .unwrap_err();
    assert!(err.to_string().starts_with("TypeError"));
}

// ============================================================================
// Literal cloning
// ============================================================================

#[test]
fn test_cloned_method_gets_new_home_object() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let method = factory.new_method(FunctionKind::Method, 0).unwrap();
    let func = factory.new_js_function(method.into()).unwrap();
    let literal = factory.new_empty_js_object().unwrap();
    factory
        .heap_mut()
        .set_field(func, js_function::HOME_OBJECT, literal.into());
    factory
        .heap_mut()
        .add_property(literal.into(), "m".into(), func.into(), PropertyAttributes::data())
        .unwrap();

    let clone = factory
        .clone_object_literal_with_env(literal.into(), TaggedValue::UNDEFINED, true)
        .unwrap();
    assert_ne!(clone, literal);
    assert_eq!(factory.heap().shape_of(clone.into()), factory.heap().shape_of(literal.into()));

    let cloned = factory
        .heap()
        .get_own_value(clone.into(), &PropertyKey::from("m"))
        .and_then(TaggedValue::local_ref)
        .unwrap();
    assert_ne!(cloned, func);
    assert_eq!(
        factory.heap().field(cloned.into(), js_function::HOME_OBJECT),
        TaggedValue::from(clone)
    );
    assert_eq!(
        factory.heap().field(func.into(), js_function::HOME_OBJECT),
        TaggedValue::from(literal)
    );
}

#[test]
fn test_object_literal_clone_copies_values() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let properties: Vec<(PropertyKey, TaggedValue)> = (0..6)
        .map(|i| (PropertyKey::from(format!("p{i}")), TaggedValue::Int(i)))
        .collect();
    let literal = factory.create_js_object_with_properties(&properties).unwrap();
    let clone = factory.clone_object_literal(literal.into()).unwrap();

    for (key, value) in &properties {
        assert_eq!(factory.heap().get_own_value(clone.into(), key), Some(*value));
    }
    let source_props = factory.heap().field(literal.into(), js_object::PROPERTIES);
    let clone_props = factory.heap().field(clone.into(), js_object::PROPERTIES);
    assert!(!source_props.same_word(clone_props));
}

#[test]
fn test_literal_accessors_are_replaced_by_empty_pairs() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let accessor = factory.new_accessor_data(TaggedValue::Int(1), TaggedValue::Int(2)).unwrap();
    let literal = factory.new_empty_js_object().unwrap();
    factory
        .heap_mut()
        .add_property(literal.into(), "x".into(), accessor.into(), PropertyAttributes::accessor(true, true))
        .unwrap();

    let clone = factory
        .clone_object_literal_with_env(literal.into(), TaggedValue::UNDEFINED, true)
        .unwrap();
    let copied = factory.heap().inline_value(clone.into(), 0).heap_ref().unwrap();
    assert_ne!(copied, HeapRef::from(accessor));
    assert_eq!(factory.heap().type_of(copied), JsType::AccessorData);
    assert_eq!(factory.heap().field_by_name(copied, "Getter"), Some(TaggedValue::UNDEFINED));
    assert_eq!(factory.heap().field_by_name(copied, "Setter"), Some(TaggedValue::UNDEFINED));
    assert_eq!(factory.heap().field_by_name(accessor.into(), "Getter"), Some(TaggedValue::Int(1)));
}

#[test]
fn test_short_array_literals_share_cow_elements() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let values = vec![TaggedValue::Int(1), TaggedValue::Int(2), TaggedValue::Int(3)];
    let literal = factory.new_js_stable_array_with_elements(values.clone()).unwrap();

    let first = factory.clone_array_literal(literal).unwrap();
    let second = factory.clone_array_literal(literal).unwrap();
    let elements = |factory: &ObjectFactory<'_>, array: LocalRef| factory.heap().field(array.into(), js_object::ELEMENTS);

    let shared = elements(&factory, literal);
    assert!(shared.same_word(elements(&factory, first)));
    assert!(shared.same_word(elements(&factory, second)));
    assert_eq!(factory.heap().elements_storage(literal.into()), ElementsStorage::CopyOnWrite);
    assert_eq!(factory.heap().field(first.into(), js_array::LENGTH), TaggedValue::Int(3));
    assert_eq!(factory.heap().field(first.into(), js_array::TRACK_INFO), TaggedValue::UNDEFINED);

    factory.heap_mut().set_element(first.into(), 0, TaggedValue::Int(9)).unwrap();
    assert_eq!(factory.heap().elements_storage(first.into()), ElementsStorage::Dense);
    assert_eq!(factory.heap().get_element(first.into(), 0), Some(TaggedValue::Int(9)));
    assert_eq!(factory.heap().get_element(second.into(), 0), Some(TaggedValue::Int(1)));
    assert_eq!(factory.heap().get_element(literal.into(), 0), Some(TaggedValue::Int(1)));
}

#[test]
fn test_long_array_literals_get_private_elements() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let max = factory.heap().config().max_cow_literal_length as i32;
    let values: Vec<TaggedValue> = (0..=max).map(TaggedValue::Int).collect();
    let literal = factory.new_js_stable_array_with_elements(values).unwrap();

    let clone = factory.clone_array_literal(literal).unwrap();
    let source = factory.heap().field(literal.into(), js_object::ELEMENTS);
    let copied = factory.heap().field(clone.into(), js_object::ELEMENTS);
    assert!(!source.same_word(copied));
    assert_eq!(factory.heap().elements_storage(literal.into()), ElementsStorage::Dense);
    assert_eq!(factory.heap().elements_storage(clone.into()), ElementsStorage::Dense);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_new_error_carries_message() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let error = factory.new_js_error(ErrorType::RangeError, "index out of range").unwrap();
    let error = error.heap_ref().unwrap();
    assert_eq!(factory.heap().type_of(error), JsType::JsRangeError);
    let message = factory.heap().get_own_value(error, &PropertyKey::from("message")).unwrap();
    assert_eq!(string_text(&factory, message), "index out of range");
}

#[test]
fn test_pending_exception_is_returned_unchanged() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    factory.heap_mut().set_pending_exception(TaggedValue::Int(42));
    let error = factory.new_js_error(ErrorType::TypeError, "ignored").unwrap();
    assert_eq!(error, TaggedValue::Int(42));
}

#[test]
fn test_throw_error_sets_pending_exception() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let marker = factory.throw_error(ErrorType::TypeError, "not a function");
    assert!(marker.is_exception());
    let pending = factory.heap_mut().clear_pending_exception().unwrap();
    assert_eq!(factory.heap().type_of(pending.heap_ref().unwrap()), JsType::JsTypeError);
}

#[test]
fn test_out_of_memory_raises_preallocated_error() {
    let (mut ctx, realm) = context();
    let oom = ctx.constants(realm).unwrap().realm().oom_error();
    let mut factory = ctx.factory(realm).unwrap();
    let marker = factory.throw_oom_error();
    assert!(marker.is_exception());
    assert_eq!(factory.heap().pending_exception(), Some(TaggedValue::from(oom)));
}

// ============================================================================
// Sharedness at allocation
// ============================================================================

#[test]
#[should_panic(expected = "shared shape cannot be allocated into local space")]
fn test_shared_shape_rejected_by_local_allocation() {
    let (mut ctx, realm) = context();
    let mut factory = ctx.factory(realm).unwrap();
    let shape = ShapeRef::Shared(factory.roots().shared_shape(JsType::JsSharedObject));
    let _ = factory.new_js_object(shape);
}

#[test]
fn test_local_new_target_rejected_for_shared_ctor() {
    let (mut ctx, realm) = context();
    let class = ctx
        .shared_factory()
        .unwrap()
        .define_sendable_class(&Default::default(), TaggedValue::NULL)
        .unwrap();
    let mut factory = ctx.factory(realm).unwrap();
    let local = factory.new_empty_js_object().unwrap();
    let err = factory
        .new_js_object_by_new_target(class.constructor.into(), local.into())
        .unwrap_err();
    assert_eq!(err.to_string(), "TypeError: shared ctor cannot assign unshared newTarget");

    let instance = factory
        .new_js_object_by_new_target(class.constructor.into(), class.constructor.into())
        .unwrap();
    assert!(instance.is_shared());
}
