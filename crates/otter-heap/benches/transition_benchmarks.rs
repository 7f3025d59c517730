//! Shape transition and storage mode benchmarks
//!
//! Compares fast-mode property adds against dictionary-mode objects.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use otter_heap::{HeapContext, HeapRef, JsType, PropertyAttributes, PropertyKey, ShapeArena, SharedHeap, TaggedValue};
use std::hint::black_box;
use std::sync::Arc;

fn keys(count: usize) -> Vec<PropertyKey> {
    (0..count).map(|i| PropertyKey::from(format!("prop{i}"))).collect()
}

fn context_with_object() -> (HeapContext, HeapRef) {
    let mut ctx = HeapContext::new(Arc::new(SharedHeap::default())).unwrap();
    let realm = ctx.create_realm().unwrap();
    let obj = ctx.factory(realm).unwrap().new_empty_js_object().unwrap();
    (ctx, obj.into())
}

/// Benchmark: walking a transition chain that already exists
fn bench_transition_chain(c: &mut Criterion) {
    let keys = keys(32);
    let mut arena = ShapeArena::new(false, 7);
    let root = arena.create_root(JsType::JsObject, 4, TaggedValue::NULL);

    c.bench_function("transition_chain_create_32", |b| {
        b.iter_batched(
            || ShapeArena::new(false, 7),
            |mut arena| {
                let mut shape = arena.create_root(JsType::JsObject, 4, TaggedValue::NULL);
                for key in &keys {
                    shape = arena.add_transition(shape, key.clone(), PropertyAttributes::data());
                }
                black_box(shape)
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("transition_chain_cached_32", |b| {
        b.iter(|| {
            let mut shape = root;
            for key in &keys {
                shape = arena.add_transition(shape, key.clone(), PropertyAttributes::data());
            }
            black_box(shape)
        });
    });
}

/// Benchmark: property adds on a fresh object, fast mode vs dictionary mode
fn bench_property_adds(c: &mut Criterion) {
    for count in [8usize, 64] {
        let keys = keys(count);
        c.bench_function(&format!("set_{count}_props"), |b| {
            b.iter_batched(
                context_with_object,
                |(mut ctx, obj)| {
                    let heap = ctx.heap_mut();
                    for (i, key) in keys.iter().enumerate() {
                        let _ = heap.set_property(obj, key.clone(), TaggedValue::Int(i as i32));
                    }
                    black_box(heap.property_storage(obj))
                },
                BatchSize::PerIteration,
            );
        });
    }
}

/// Benchmark: reads after a delete moved the object to dictionary mode
fn bench_reads_by_mode(c: &mut Criterion) {
    let keys = keys(16);

    let (mut fast_ctx, fast) = context_with_object();
    let (mut dict_ctx, dict) = context_with_object();
    for (i, key) in keys.iter().enumerate() {
        let _ = fast_ctx.heap_mut().set_property(fast, key.clone(), TaggedValue::Int(i as i32));
        let _ = dict_ctx.heap_mut().set_property(dict, key.clone(), TaggedValue::Int(i as i32));
    }
    let extra = PropertyKey::from("extra");
    let _ = dict_ctx.heap_mut().set_property(dict, extra.clone(), TaggedValue::UNDEFINED);
    let _ = dict_ctx.heap_mut().delete_property(dict, &extra);

    for (name, ctx, obj) in [("fast_get_16_props", &fast_ctx, fast), ("dictionary_get_16_props", &dict_ctx, dict)] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut sum = 0i32;
                for key in &keys {
                    if let Some(TaggedValue::Int(v)) = ctx.heap().get_own_value(obj, key) {
                        sum += v;
                    }
                }
                black_box(sum)
            });
        });
    }
}

criterion_group!(benches, bench_transition_chain, bench_property_adds, bench_reads_by_mode);
criterion_main!(benches);
