//! Shared heap and sendable class tests

use otter_heap::layout::js_object;
use otter_heap::{
    ElementsStorage, FunctionKind, HeapConfig, HeapContext, HeapError, HeapRef, JsType, PropertyKey,
    PropertyStorage, SendableClassSpec, SharedHeap, SharedObjectFactory, TaggedValue, verify_shared_closure,
};
use std::sync::Arc;

fn class_spec(fields: &[&str], elements: &[(u32, i32)]) -> SendableClassSpec {
    SendableClassSpec {
        fields: fields.iter().map(|&f| PropertyKey::from(f)).collect(),
        elements: elements.iter().map(|&(i, v)| (i, TaggedValue::Int(v))).collect(),
        length: 0,
    }
}

fn context(shared: &Arc<SharedHeap>) -> HeapContext {
    let mut ctx = HeapContext::new(Arc::clone(shared)).unwrap();
    ctx.create_realm().unwrap();
    ctx
}

#[test]
fn test_sendable_instance_graph_is_closed() {
    let heap = SharedHeap::default();
    let factory = SharedObjectFactory::new(&heap).unwrap();
    let class = factory
        .define_sendable_class(&class_spec(&["a", "b"], &[(0, 1)]), TaggedValue::NULL)
        .unwrap();
    let instance = factory
        .new_shared_object_by_constructor(class.constructor, class.constructor.into())
        .unwrap();

    assert!(verify_shared_closure(&heap, instance).is_ok());
    assert!(verify_shared_closure(&heap, class.constructor).is_ok());
    assert!(verify_shared_closure(&heap, class.prototype).is_ok());
}

#[test]
fn test_static_elements_are_copied_per_instance() {
    let shared = Arc::new(SharedHeap::default());
    let mut ctx = context(&shared);
    let factory = SharedObjectFactory::new(&shared).unwrap();
    let class = factory
        .define_sendable_class(&class_spec(&["x"], &[(0, 10), (2, 30)]), TaggedValue::NULL)
        .unwrap();
    let first = factory
        .new_shared_object_by_constructor(class.constructor, class.constructor.into())
        .unwrap();
    let second = factory
        .new_shared_object_by_constructor(class.constructor, class.constructor.into())
        .unwrap();

    let heap = ctx.heap_mut();
    assert_eq!(heap.elements_storage(first.into()), ElementsStorage::Dictionary);
    assert_eq!(heap.get_element(first.into(), 0), Some(TaggedValue::Int(10)));
    assert_eq!(heap.get_element(first.into(), 2), Some(TaggedValue::Int(30)));
    assert_eq!(heap.get_element(first.into(), 1), None);
    assert!(
        !heap
            .field(first.into(), js_object::ELEMENTS)
            .same_word(heap.field(second.into(), js_object::ELEMENTS))
    );
}

#[test]
fn test_derived_class_elements_win_on_merge() {
    let shared = Arc::new(SharedHeap::default());
    let ctx = context(&shared);
    let factory = SharedObjectFactory::new(&shared).unwrap();
    let base = factory
        .define_sendable_class(&class_spec(&["x"], &[(0, 1), (1, 1)]), TaggedValue::NULL)
        .unwrap();
    let derived = factory
        .define_sendable_class(&class_spec(&["x"], &[(1, 2), (5, 2)]), base.prototype.into())
        .unwrap();
    let instance = factory
        .new_shared_object_by_constructor(base.constructor, derived.constructor.into())
        .unwrap();

    let heap = ctx.heap();
    assert_eq!(heap.get_element(instance.into(), 0), Some(TaggedValue::Int(1)));
    assert_eq!(heap.get_element(instance.into(), 1), Some(TaggedValue::Int(2)));
    assert_eq!(heap.get_element(instance.into(), 5), Some(TaggedValue::Int(2)));
    assert_eq!(heap.prototype_of(instance.into()), TaggedValue::from(derived.prototype));
}

#[test]
fn test_large_sendable_class_uses_template_dictionary() {
    let config = HeapConfig {
        max_fast_properties: 2,
        ..HeapConfig::default()
    };
    let shared = Arc::new(SharedHeap::new(config));
    let mut ctx = context(&shared);
    let factory = SharedObjectFactory::new(&shared).unwrap();
    let class = factory
        .define_sendable_class(&class_spec(&["a", "b", "c"], &[]), TaggedValue::NULL)
        .unwrap();
    let first = factory
        .new_shared_object_by_constructor(class.constructor, class.constructor.into())
        .unwrap();
    let second = factory
        .new_shared_object_by_constructor(class.constructor, class.constructor.into())
        .unwrap();

    let heap = ctx.heap_mut();
    assert_eq!(heap.property_storage(first.into()), PropertyStorage::Dictionary);
    assert!(heap.set_property(first.into(), "b".into(), TaggedValue::Int(7)).unwrap());
    assert_eq!(heap.get_own_value(first.into(), &"b".into()), Some(TaggedValue::Int(7)));
    assert_ne!(heap.get_own_value(second.into(), &"b".into()), Some(TaggedValue::Int(7)));
    assert!(verify_shared_closure(&shared, first).is_ok());
}

#[test]
fn test_sendable_field_keys_are_checked() {
    let heap = SharedHeap::default();
    let factory = SharedObjectFactory::new(&heap).unwrap();
    let spec = SendableClassSpec {
        fields: vec![PropertyKey::Index(0)],
        ..SendableClassSpec::default()
    };
    let err = factory.define_sendable_class(&spec, TaggedValue::NULL).unwrap_err();
    assert!(matches!(err, HeapError::TypeError(_)));
}

#[test]
fn test_duplicate_sendable_fields_are_rejected() {
    for max_fast_properties in [1024, 2] {
        let heap = SharedHeap::new(HeapConfig {
            max_fast_properties,
            ..HeapConfig::default()
        });
        let factory = SharedObjectFactory::new(&heap).unwrap();
        let err = factory
            .define_sendable_class(&class_spec(&["x", "y", "x"], &[]), TaggedValue::NULL)
            .unwrap_err();
        assert_eq!(err.to_string(), "TypeError: duplicate sendable field x");
    }
}

#[test]
fn test_oversized_fast_limit_still_builds_sendable_classes() {
    let shared = Arc::new(SharedHeap::new(HeapConfig {
        max_fast_properties: 5000,
        ..HeapConfig::default()
    }));
    let mut ctx = context(&shared);
    let factory = SharedObjectFactory::new(&shared).unwrap();
    let names: Vec<String> = (0..1100).map(|i| format!("f{i}")).collect();
    let fields: Vec<&str> = names.iter().map(String::as_str).collect();
    let class = factory
        .define_sendable_class(&class_spec(&fields, &[]), TaggedValue::NULL)
        .unwrap();
    let instance = factory
        .new_shared_object_by_constructor(class.constructor, class.constructor.into())
        .unwrap();

    let heap = ctx.heap_mut();
    assert_eq!(heap.property_storage(instance.into()), PropertyStorage::Dictionary);
    assert!(heap.set_property(instance.into(), "f1099".into(), TaggedValue::Int(1)).unwrap());
    assert_eq!(heap.get_own_value(instance.into(), &"f1099".into()), Some(TaggedValue::Int(1)));
}

#[test]
fn test_unknown_new_target_is_rejected() {
    let heap = SharedHeap::default();
    let factory = SharedObjectFactory::new(&heap).unwrap();
    let class = factory
        .define_sendable_class(&class_spec(&[], &[]), TaggedValue::NULL)
        .unwrap();
    let unrelated = factory.new_shared_array(0).unwrap();
    let err = factory
        .new_shared_object_by_constructor(class.constructor, unrelated.into())
        .unwrap_err();
    assert_eq!(err.to_string(), "TypeError: newTarget is not a sendable class");
}

#[test]
fn test_local_prototype_is_rejected() {
    let shared = Arc::new(SharedHeap::default());
    let mut ctx = context(&shared);
    let realm = 0;
    let local = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    let factory = SharedObjectFactory::new(&shared).unwrap();
    let err = factory
        .define_sendable_class(&class_spec(&["x"], &[]), local.into())
        .unwrap_err();
    assert!(matches!(err, HeapError::TypeError(_)));
}

#[test]
fn test_shared_functions_and_containers() {
    let heap = SharedHeap::default();
    let factory = SharedObjectFactory::new(&heap).unwrap();

    let method = factory.new_shared_method(FunctionKind::Async, 2).unwrap();
    let func = factory.new_s_function(method).unwrap();
    assert_eq!(heap.type_of(func), JsType::JsSharedAsyncFunction);
    let copy = factory.clone_s_function(func).unwrap();
    assert_ne!(copy, func);
    assert_eq!(heap.type_of(copy), JsType::JsSharedAsyncFunction);

    let array = factory.new_shared_array(3).unwrap();
    assert_eq!(heap.type_of(array), JsType::JsSharedArray);
    let buffer = factory.new_sendable_array_buffer(16).unwrap();
    let map = factory.new_shared_map().unwrap();
    let set = factory.new_shared_set().unwrap();
    for obj in [func, array, buffer, map, set] {
        assert!(heap.with_shape(heap.shape_of(obj), |s| s.is_shared()));
        assert!(verify_shared_closure(&heap, obj).is_ok());
        assert!(heap.references(obj).iter().all(|r| r.is_shared()));
    }
}

#[test]
fn test_contexts_share_sendable_classes() {
    let shared = Arc::new(SharedHeap::default());
    let class = SharedObjectFactory::new(&shared)
        .unwrap()
        .define_sendable_class(&class_spec(&["x"], &[]), TaggedValue::NULL)
        .unwrap();

    let instances: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let shared = Arc::clone(&shared);
                scope.spawn(move || {
                    let mut ctx = context(&shared);
                    let realm = 0;
                    let mut factory = ctx.factory(realm).unwrap();
                    factory
                        .new_js_object_by_new_target(class.constructor.into(), class.constructor.into())
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(instances.len(), 2);
    assert!(instances.iter().all(|r| r.is_shared()));
    assert_ne!(instances[0], instances[1]);
    let ctx = context(&shared);
    assert_eq!(ctx.heap().shape_of(instances[0]), ctx.heap().shape_of(instances[1]));
}
