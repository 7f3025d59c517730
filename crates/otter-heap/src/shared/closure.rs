use super::SharedHeap;
use crate::error::{HeapError, HeapResult};
use crate::shape::Shape;
use crate::value::{HeapRef, SharedRef};
use rustc_hash::FxHashSet;

/// Check that everything reachable from `root` lives in the shared heap
///
/// Walks the graph through the body iterator. Fails on the first local
/// reference, or on a JS object whose shape is not flagged shared.
pub fn verify_shared_closure(heap: &SharedHeap, root: SharedRef) -> HeapResult<()> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![root];
    while let Some(obj) = stack.pop() {
        if !seen.insert(obj) {
            continue;
        }
        if heap.type_of(obj).is_ecma_object() && !heap.with_shape(heap.shape_of(obj), Shape::is_shared) {
            return Err(HeapError::type_error(format!(
                "shared object {obj:?} has an unshared shape"
            )));
        }
        let mut local = None;
        heap.visit_references(obj, |target| match target {
            HeapRef::Shared(next) => stack.push(next),
            HeapRef::Local(l) => {
                local.get_or_insert(l);
            }
        });
        if let Some(l) = local {
            return Err(HeapError::type_error(format!(
                "shared object {obj:?} references local object {l:?}"
            )));
        }
    }
    tracing::debug!(target: "otter::heap::shared", visited = seen.len(), "shared closure verified");
    Ok(())
}
