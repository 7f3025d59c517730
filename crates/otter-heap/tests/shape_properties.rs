//! Property-based tests for shapes, storage modes and the value codec

use otter_heap::value::HEAP_REF_BASE;
use otter_heap::{
    HeapContext, JsType, PropertyAttributes, PropertyKey, PropertyStorage, ShapeArena, SharedHeap, TaggedValue,
};
use proptest::prelude::*;
use std::sync::Arc;

fn unique_keys(names: Vec<String>) -> Vec<PropertyKey> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen.into_iter().map(PropertyKey::from).collect()
}

#[derive(Debug, Clone)]
enum Op {
    Set(usize, i32),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..8, any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => (0usize..8).prop_map(Op::Delete),
    ]
}

fn tagged_value() -> impl Strategy<Value = TaggedValue> {
    prop_oneof![
        any::<i32>().prop_map(TaggedValue::Int),
        any::<f64>().prop_map(TaggedValue::Double),
        any::<bool>().prop_map(TaggedValue::Bool),
        Just(TaggedValue::UNDEFINED),
        Just(TaggedValue::NULL),
        Just(TaggedValue::HOLE),
        (0u32..1 << 24, any::<bool>()).prop_filter_map("heap word", |(index, shared)| {
            TaggedValue::decode(HEAP_REF_BASE + ((u64::from(index) << 1) | u64::from(shared)))
        }),
    ]
}

proptest! {
    #[test]
    fn prop_identical_histories_share_shapes(
        names in prop::collection::vec("[a-z]{1,3}", 0..12),
        inline in 0u32..6,
    ) {
        let keys = unique_keys(names);
        let mut arena = ShapeArena::new(false, 7);
        let root = arena.create_root(JsType::JsObject, inline, TaggedValue::NULL);
        let attrs = PropertyAttributes::data();

        let mut first = root;
        for key in &keys {
            first = arena.add_transition(first, key.clone(), attrs);
        }
        let created = arena.len();
        let mut second = root;
        for key in &keys {
            second = arena.add_transition(second, key.clone(), attrs);
        }
        prop_assert_eq!(first, second);
        prop_assert_eq!(arena.len(), created);
        prop_assert_eq!(arena.shapes_in_tree(first) as usize, keys.len() + 1);
    }

    #[test]
    fn prop_transitions_only_extend_the_layout(
        names in prop::collection::vec("[a-z]{1,4}", 1..16),
        inline in 0u32..6,
    ) {
        let keys = unique_keys(names);
        let mut arena = ShapeArena::new(false, 7);
        let mut shape = arena.create_root(JsType::JsObject, inline, TaggedValue::NULL);

        for (count, key) in keys.iter().enumerate() {
            let next = arena.add_transition(shape, key.clone(), PropertyAttributes::data());
            let (before, after) = (arena.get(shape), arena.get(next));
            prop_assert_eq!(after.number_of_props() as usize, count + 1);
            prop_assert_eq!(after.inline_capacity(), before.inline_capacity());
            prop_assert_eq!(after.parent(), Some(shape));
            for earlier in &keys[..count] {
                prop_assert_eq!(after.lookup(earlier), before.lookup(earlier));
            }
            let (offset, placed) = after.lookup(key).unwrap();
            prop_assert_eq!(offset, count);
            prop_assert_eq!(placed.is_inlined(), (count as u32) < inline);
            shape = next;
        }
    }

    #[test]
    fn prop_dictionary_mode_is_one_way(ops in prop::collection::vec(op(), 1..40)) {
        let mut ctx = HeapContext::new(Arc::new(SharedHeap::default())).unwrap();
        let realm = ctx.create_realm().unwrap();
        let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap().into();
        let heap = ctx.heap_mut();

        let key = |k: usize| PropertyKey::from(format!("k{k}"));
        let mut model: Vec<(usize, i32)> = Vec::new();
        let mut dictionary = false;
        for op in ops {
            match op {
                Op::Set(k, v) => {
                    prop_assert!(heap.set_property(obj, key(k), TaggedValue::Int(v)).unwrap());
                    match model.iter_mut().find(|(existing, _)| *existing == k) {
                        Some(entry) => entry.1 = v,
                        None => model.push((k, v)),
                    }
                }
                Op::Delete(k) => {
                    prop_assert!(heap.delete_property(obj, &key(k)).unwrap());
                    model.retain(|(existing, _)| *existing != k);
                }
            }

            let storage = heap.property_storage(obj);
            if dictionary {
                prop_assert_eq!(storage, PropertyStorage::Dictionary);
            }
            dictionary = storage == PropertyStorage::Dictionary;

            for k in 0..8 {
                let expected = model.iter().find(|(existing, _)| *existing == k).map(|&(_, v)| TaggedValue::Int(v));
                prop_assert_eq!(heap.get_own_value(obj, &key(k)), expected);
            }
            let keys: Vec<PropertyKey> = model.iter().map(|&(k, _)| key(k)).collect();
            prop_assert_eq!(heap.own_property_keys(obj), keys);
        }
    }

    #[test]
    fn prop_value_words_decode_to_the_same_value(value in tagged_value()) {
        let word = value.encode();
        let decoded = TaggedValue::decode(word).unwrap();
        prop_assert!(decoded.same_word(value));
        prop_assert_eq!(decoded.encode(), word);
        prop_assert_eq!(decoded.is_shareable(), value.is_shareable());
    }
}
