//! Property and element storage tests

use otter_heap::layout::js_object;
use otter_heap::{
    ElementsStorage, HeapConfig, HeapContext, HeapError, HeapRef, ObjectHeap, PropertyAttributes, PropertyKey,
    PropertyStorage, RealmId, SendableClassSpec, SharedHeap, TaggedValue,
};
use std::sync::Arc;

fn context_with(config: HeapConfig) -> (HeapContext, RealmId) {
    let mut ctx = HeapContext::new(Arc::new(SharedHeap::new(config))).unwrap();
    let realm = ctx.create_realm().unwrap();
    (ctx, realm)
}

fn context() -> (HeapContext, RealmId) {
    context_with(HeapConfig::default())
}

fn key(name: &str) -> PropertyKey {
    PropertyKey::from(name)
}

fn add(heap: &mut ObjectHeap, obj: otter_heap::LocalRef, name: &str, value: i32) {
    heap.add_property(obj.into(), key(name), TaggedValue::Int(value), PropertyAttributes::data())
        .unwrap();
}

// ============================================================================
// Named properties
// ============================================================================

#[test]
fn test_inline_slots_spill_into_properties_array() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::EmptyShape);

    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        add(heap, obj, name, i as i32);
        assert_eq!(heap.property_storage(obj.into()), PropertyStorage::InlineOnly);
    }
    add(heap, obj, "e", 4);
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::InlineAndOwnArray);

    let shape = heap.shape_snapshot(obj.into());
    for name in ["a", "b", "c", "d"] {
        let (_, attrs) = shape.lookup(&key(name)).unwrap();
        assert!(attrs.is_inlined(), "{name} should be in-object");
    }
    let (offset, attrs) = shape.lookup(&key("e")).unwrap();
    assert!(!attrs.is_inlined());
    assert_eq!(offset, 4);

    let props = heap.field(obj.into(), js_object::PROPERTIES).heap_ref().unwrap();
    assert_eq!(heap.array_len(props), heap.config().properties_grow_step as usize);
    for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        assert_eq!(heap.get_own_value(obj.into(), &key(name)), Some(TaggedValue::Int(i as i32)));
    }
}

#[test]
fn test_identical_histories_share_a_shape() {
    let (mut ctx, realm) = context();
    let (first, second) = {
        let mut factory = ctx.factory(realm).unwrap();
        (factory.new_empty_js_object().unwrap(), factory.new_empty_js_object().unwrap())
    };
    let heap = ctx.heap_mut();
    for obj in [first, second] {
        add(heap, obj, "x", 1);
        add(heap, obj, "y", 2);
    }
    assert_eq!(heap.shape_of(first.into()), heap.shape_of(second.into()));

    let (mut ctx, realm) = context();
    let (third, fourth) = {
        let mut factory = ctx.factory(realm).unwrap();
        (factory.new_empty_js_object().unwrap(), factory.new_empty_js_object().unwrap())
    };
    let heap = ctx.heap_mut();
    add(heap, third, "x", 1);
    add(heap, third, "y", 2);
    add(heap, fourth, "y", 2);
    add(heap, fourth, "x", 1);
    assert_ne!(heap.shape_of(third.into()), heap.shape_of(fourth.into()));
}

#[test]
fn test_delete_moves_to_dictionary_for_good() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        add(heap, obj, name, i as i32);
    }

    assert!(heap.delete_property(obj.into(), &key("b")).unwrap());
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::Dictionary);
    assert_eq!(heap.get_own_value(obj.into(), &key("b")), None);
    assert_eq!(heap.get_own_value(obj.into(), &key("c")), Some(TaggedValue::Int(2)));

    add(heap, obj, "f", 5);
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::Dictionary);
    assert_eq!(heap.own_property_keys(obj.into()), vec![key("a"), key("c"), key("f")]);
}

#[test]
fn test_non_configurable_property_is_not_deleted() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    heap.add_property(
        obj.into(),
        key("fixed"),
        TaggedValue::TRUE,
        PropertyAttributes::data_with(true, true, false),
    )
    .unwrap();
    assert!(!heap.delete_property(obj.into(), &key("fixed")).unwrap());
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::InlineOnly);
}

#[test]
fn test_too_many_properties_go_to_dictionary() {
    let config = HeapConfig {
        max_fast_properties: 8,
        ..HeapConfig::default()
    };
    let (mut ctx, realm) = context_with(config);
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    for i in 0..8 {
        add(heap, obj, &format!("p{i}"), i);
    }
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::InlineAndOwnArray);
    add(heap, obj, "p8", 8);
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::Dictionary);
    for i in 0..9 {
        assert_eq!(heap.get_own_value(obj.into(), &key(&format!("p{i}"))), Some(TaggedValue::Int(i)));
    }
}

#[test]
fn test_fast_property_limit_is_capped_by_the_offset_field() {
    let config = HeapConfig {
        max_fast_properties: 2000,
        ..HeapConfig::default()
    };
    let (mut ctx, realm) = context_with(config);
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();

    for i in 0..1100 {
        add(heap, obj, &format!("p{i}"), i);
    }
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::Dictionary);
    assert_eq!(heap.get_own_value(obj.into(), &key("p0")), Some(TaggedValue::Int(0)));
    assert_eq!(heap.get_own_value(obj.into(), &key("p1099")), Some(TaggedValue::Int(1099)));
    assert_eq!(heap.own_property_keys(obj.into()).len(), 1100);
}

#[test]
fn test_adding_an_existing_key_is_a_type_error() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    add(heap, obj, "a", 1);

    let err = heap
        .add_property(obj.into(), key("a"), TaggedValue::Int(2), PropertyAttributes::data())
        .unwrap_err();
    assert!(matches!(err, HeapError::TypeError(_)));
    assert_eq!(heap.get_own_value(obj.into(), &key("a")), Some(TaggedValue::Int(1)));
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::InlineOnly);

    add(heap, obj, "b", 3);
    assert!(heap.delete_property(obj.into(), &key("b")).unwrap());
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::Dictionary);
    let err = heap
        .add_property(obj.into(), key("a"), TaggedValue::Int(4), PropertyAttributes::data())
        .unwrap_err();
    assert!(matches!(err, HeapError::TypeError(_)));
    assert_eq!(heap.get_own_value(obj.into(), &key("a")), Some(TaggedValue::Int(1)));
    assert_eq!(heap.own_property_keys(obj.into()), vec![key("a")]);
}

#[test]
fn test_change_attributes_makes_property_read_only() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    add(heap, obj, "x", 1);

    let read_only = PropertyAttributes::data_with(false, true, true);
    assert!(heap.change_attributes(obj.into(), &key("x"), read_only).unwrap());
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::Dictionary);
    assert!(!heap.set_property(obj.into(), key("x"), TaggedValue::Int(2)).unwrap());
    assert_eq!(heap.get_own_value(obj.into(), &key("x")), Some(TaggedValue::Int(1)));
}

#[test]
fn test_non_extensible_object_rejects_new_keys() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    add(heap, obj, "x", 1);
    heap.prevent_extensions(obj.into());

    assert!(!heap.set_property(obj.into(), key("y"), TaggedValue::Int(2)).unwrap());
    let err = heap
        .add_property(obj.into(), key("y"), TaggedValue::Int(2), PropertyAttributes::data())
        .unwrap_err();
    assert!(matches!(err, HeapError::TypeError(_)));
    assert!(heap.set_property(obj.into(), key("x"), TaggedValue::Int(3)).unwrap());
}

#[test]
fn test_prototype_lookup_walks_the_chain() {
    let (mut ctx, realm) = context();
    let (parent, child) = {
        let mut factory = ctx.factory(realm).unwrap();
        let parent = factory.new_empty_js_object().unwrap();
        let child = factory.ordinary_new_js_object_create(parent.into()).unwrap();
        (parent, child)
    };
    let heap = ctx.heap_mut();
    add(heap, parent, "inherited", 7);

    let (holder, entry) = heap.find_property(child.into(), &key("inherited")).unwrap();
    assert_eq!(holder, HeapRef::from(parent));
    assert_eq!(entry.value, TaggedValue::Int(7));
    assert!(heap.get_own_property(child.into(), &key("inherited")).is_none());
}

// ============================================================================
// Elements
// ============================================================================

#[test]
fn test_dense_elements_grow() {
    let (mut ctx, realm) = context();
    let array = ctx.factory(realm).unwrap().new_js_array().unwrap();
    let heap = ctx.heap_mut();
    assert_eq!(heap.elements_storage(array.into()), ElementsStorage::Empty);

    heap.set_element(array.into(), 0, TaggedValue::Int(10)).unwrap();
    assert_eq!(heap.elements_storage(array.into()), ElementsStorage::Dense);
    let elements = heap.field(array.into(), js_object::ELEMENTS).heap_ref().unwrap();
    assert_eq!(heap.array_len(elements), 16);
    assert_eq!(heap.array_length(array.into()), 1);

    heap.set_element(array.into(), 20, TaggedValue::Int(20)).unwrap();
    assert_eq!(heap.elements_storage(array.into()), ElementsStorage::Dense);
    assert_eq!(heap.array_length(array.into()), 21);
    assert_eq!(heap.get_element(array.into(), 1), None);
    assert_eq!(heap.get_element(array.into(), 20), Some(TaggedValue::Int(20)));
}

#[test]
fn test_sparse_write_moves_elements_to_dictionary() {
    let (mut ctx, realm) = context();
    let array = ctx.factory(realm).unwrap().new_js_array().unwrap();
    let heap = ctx.heap_mut();
    heap.set_element(array.into(), 0, TaggedValue::Int(1)).unwrap();
    heap.set_element(array.into(), 100_000, TaggedValue::Int(2)).unwrap();

    assert_eq!(heap.elements_storage(array.into()), ElementsStorage::Dictionary);
    assert!(heap.shape_snapshot(array.into()).has_dictionary_elements());
    assert_eq!(heap.array_length(array.into()), 100_001);
    assert_eq!(heap.get_element(array.into(), 0), Some(TaggedValue::Int(1)));
    assert_eq!(heap.get_element(array.into(), 100_000), Some(TaggedValue::Int(2)));
    assert_eq!(
        heap.own_property_keys(array.into())
            .into_iter()
            .filter(PropertyKey::is_index)
            .collect::<Vec<_>>(),
        vec![PropertyKey::Index(0), PropertyKey::Index(100_000)]
    );
}

#[test]
fn test_non_default_element_attributes_use_dictionary() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    heap.define_element(obj.into(), 0, TaggedValue::Int(1), PropertyAttributes::frozen())
        .unwrap();
    assert_eq!(heap.elements_storage(obj.into()), ElementsStorage::Dictionary);
    assert!(!heap.set_element(obj.into(), 0, TaggedValue::Int(2)).unwrap());
    assert!(!heap.delete_element(obj.into(), 0).unwrap());
}

#[test]
fn test_index_keys_route_to_elements() {
    let (mut ctx, realm) = context();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let heap = ctx.heap_mut();
    heap.add_property(obj.into(), PropertyKey::Index(3), TaggedValue::Int(3), PropertyAttributes::data())
        .unwrap();
    assert_eq!(heap.property_storage(obj.into()), PropertyStorage::EmptyShape);
    assert_eq!(heap.get_element(obj.into(), 3), Some(TaggedValue::Int(3)));
}

// ============================================================================
// Shared objects
// ============================================================================

#[test]
fn test_shared_objects_refuse_attribute_changes() {
    let (mut ctx, _realm) = context();
    let spec = SendableClassSpec {
        fields: vec![key("x")],
        ..SendableClassSpec::default()
    };
    let instance = {
        let factory = ctx.shared_factory().unwrap();
        let class = factory.define_sendable_class(&spec, TaggedValue::NULL).unwrap();
        factory
            .new_shared_object_by_constructor(class.constructor, class.constructor.into())
            .unwrap()
    };
    let heap = ctx.heap_mut();
    let obj = instance.into();

    assert!(heap.set_property(obj, key("x"), TaggedValue::Int(1)).unwrap());
    assert_eq!(heap.get_own_value(obj, &key("x")), Some(TaggedValue::Int(1)));

    let frozen = PropertyAttributes::frozen();
    assert!(matches!(heap.change_attributes(obj, &key("x"), frozen), Err(HeapError::TypeError(_))));
    assert!(matches!(heap.delete_property(obj, &key("x")), Err(HeapError::TypeError(_))));
    assert!(matches!(
        heap.add_property(obj, key("y"), TaggedValue::Int(2), PropertyAttributes::data()),
        Err(HeapError::TypeError(_))
    ));
}

#[test]
fn test_shared_object_rejects_local_values() {
    let (mut ctx, realm) = context();
    let spec = SendableClassSpec {
        fields: vec![key("x")],
        ..SendableClassSpec::default()
    };
    let instance = {
        let factory = ctx.shared_factory().unwrap();
        let class = factory.define_sendable_class(&spec, TaggedValue::NULL).unwrap();
        factory
            .new_shared_object_by_constructor(class.constructor, class.constructor.into())
            .unwrap()
    };
    let local = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let err = ctx
        .heap_mut()
        .set_property(instance.into(), key("x"), local.into())
        .unwrap_err();
    assert!(matches!(err, HeapError::TypeError(_)));
}
