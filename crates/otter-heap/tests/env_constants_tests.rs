//! Global environment constant tests
//!
//! Shared roots are built once per shared heap; every realm gets its own
//! prototypes and class shapes.

use otter_heap::{
    ConstantString, ErrorType, FunctionKind, HeapContext, JsType, PropertyKey, SharedHeap, ShapeRef, TaggedValue,
};
use std::sync::Arc;

#[test]
fn test_realms_share_roots_but_not_prototypes() {
    let shared = Arc::new(SharedHeap::default());
    let mut first = HeapContext::new(Arc::clone(&shared)).unwrap();
    let mut second = HeapContext::new(Arc::clone(&shared)).unwrap();
    let a = first.create_realm().unwrap();
    let b = first.create_realm().unwrap();
    let c = second.create_realm().unwrap();

    let a = first.constants(a).unwrap();
    let b = first.constants(b).unwrap();
    let c = second.constants(c).unwrap();

    assert!(Arc::ptr_eq(a.shared(), b.shared()));
    assert!(Arc::ptr_eq(a.shared(), c.shared()));
    assert!(!Arc::ptr_eq(a.realm(), b.realm()));
    assert_ne!(a.realm().object_prototype(), b.realm().object_prototype());
    assert_ne!(a.realm().object_class(), b.realm().object_class());
    assert_eq!(a.shared().empty_array(), c.shared().empty_array());
}

#[test]
fn test_realm_registry_lookup_and_removal() {
    let mut ctx = HeapContext::new(Arc::new(SharedHeap::default())).unwrap();
    let first = ctx.create_realm().unwrap();
    let second = ctx.create_realm().unwrap();
    assert_ne!(first, second);
    assert_eq!(ctx.realms().len(), 2);

    let removed = ctx.remove_realm(first).unwrap();
    assert_eq!(removed.id, first);
    assert!(ctx.constants(first).is_none());
    assert!(ctx.factory(first).is_none());
    assert!(ctx.constants(second).is_some());

    let third = ctx.create_realm().unwrap();
    assert!(third != first && third != second);
    assert_eq!(ctx.realms().ids().collect::<Vec<_>>(), vec![second, third]);
}

#[test]
fn test_shared_roots_hold_only_shared_values() {
    let shared = Arc::new(SharedHeap::default());
    let roots = shared.roots().unwrap();
    for value in roots.iter_roots() {
        assert!(value.is_shareable(), "{value} is a local root");
    }
    assert!(Arc::ptr_eq(&roots, &shared.roots().unwrap()));
}

#[test]
fn test_constant_strings_are_interned() {
    let shared = Arc::new(SharedHeap::default());
    let roots = shared.roots().unwrap();
    let length = roots.string(ConstantString::Length);
    assert_eq!(length, roots.string(ConstantString::Length));
    assert_ne!(length, roots.string(ConstantString::Name));
    let text = shared.with_cell(length, |cell| cell.text().map(str::to_owned));
    assert_eq!(text.as_deref(), Some("length"));
    assert_eq!(ConstantString::Length.key(), PropertyKey::from("length"));
}

#[test]
fn test_record_shapes_cover_every_non_object_type() {
    let shared = Arc::new(SharedHeap::default());
    let roots = shared.roots().unwrap();
    for &ty in JsType::ALL {
        if ty == JsType::Invalid || ty.is_ecma_object() {
            continue;
        }
        let ShapeRef::Shared(id) = roots.record_shape(ty) else {
            panic!("record shape of {ty} is local");
        };
        shared.with_shape(id, |shape| assert_eq!(shape.ty(), ty));
    }
}

#[test]
fn test_realm_classes_chain_to_their_prototypes() {
    let mut ctx = HeapContext::new(Arc::new(SharedHeap::default())).unwrap();
    let realm = ctx.create_realm().unwrap();
    let constants = ctx.constants(realm).unwrap();
    let roots = constants.realm();
    let heap = ctx.heap();

    let object_proto = TaggedValue::from(roots.object_prototype());
    assert!(heap.with_shape(roots.object_class(), |s| s.proto().same_word(object_proto)));
    assert!(heap.with_shape(roots.null_proto_object_class(), |s| s.proto().is_null()));
    assert!(heap.prototype_of(roots.object_prototype().into()).is_null());

    let error_proto = TaggedValue::from(roots.error_prototype(ErrorType::Error));
    let type_error_proto = roots.error_prototype(ErrorType::TypeError);
    assert!(heap.prototype_of(type_error_proto.into()).same_word(error_proto));
    assert!(heap.with_shape(roots.error_class(ErrorType::RangeError), |s| s.ty() == JsType::JsRangeError));

    let function_proto = TaggedValue::from(roots.function_prototype());
    for &kind in FunctionKind::ALL {
        let shape = roots.function_class(kind);
        assert!(heap.with_shape(shape, |s| s.is_callable() && s.proto().same_word(function_proto)));
    }
    assert!(heap.with_shape(roots.function_class(FunctionKind::ClassConstructor), |s| s.is_class_constructor()));
    assert!(heap.with_shape(roots.array_class(), |s| s.lookup(&"length".into()).is_some()));
}
