//! Heap error types

use otter_heap_gc::MemSpace;
use thiserror::Error;

/// Heap operation errors
///
/// Contract violations (unknown type tag in the initializer dispatch, a
/// shared shape headed for a local space, a corrupted shape) panic instead.
#[derive(Debug, Error)]
pub enum HeapError {
    /// No space could satisfy an allocation
    #[error("OutOfMemory: {requested} bytes requested from {space} space")]
    OutOfMemory {
        /// Space that was exhausted
        space: MemSpace,
        /// Requested size in bytes
        requested: usize,
    },

    /// Type error raised through the object model
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Range error raised through the object model
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Layout metadata does not match the registry
    #[error("layout metadata mismatch for {type_name}: {detail}")]
    Metadata {
        /// Type or table being checked
        type_name: String,
        /// What differs
        detail: String,
    },

    /// Metadata JSON could not be parsed
    #[error("metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl HeapError {
    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a range error
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Create a metadata mismatch
    pub fn metadata(type_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Metadata {
            type_name: type_name.into(),
            detail: detail.into(),
        }
    }

    /// Whether this is resource exhaustion
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

/// Result type for heap operations
pub type HeapResult<T> = Result<T, HeapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let oom = HeapError::OutOfMemory {
            space: MemSpace::Young,
            requested: 64,
        };
        assert_eq!(oom.to_string(), "OutOfMemory: 64 bytes requested from young space");
        assert!(oom.is_out_of_memory());
        assert_eq!(
            HeapError::type_error("x is not extensible").to_string(),
            "TypeError: x is not extensible"
        );
    }
}
