//! # Otter Heap
//!
//! Object model and allocation core of the Otter VM.
//!
//! ## Design
//!
//! - **Tagged values**: a closed sum type with one raw 64-bit codec
//! - **Shapes**: arena-allocated hidden classes with cached transitions,
//!   in-object slots and a one-way fallback to dictionary mode
//! - **Two domains**: context-local cells and shared cells are addressed by
//!   distinct handle types; a shared cell only stores shareable values
//! - **Object factory**: the single allocation gateway, routing every object
//!   to a memory space and initializing every declared field
//! - **Layout registry**: per-type field tables checked against versioned
//!   JSON metadata

#![warn(clippy::all)]

pub mod body;
pub mod cell;
pub mod config;
pub mod context;
pub mod dictionary;
pub mod env_constants;
pub mod error;
pub mod factory;
pub mod heap;
pub mod layout;
pub mod layout_info;
pub mod property;
pub mod realm;
pub mod shape;
pub mod shared;
pub mod storage;
pub mod types;
pub mod value;

pub use body::{SlotRange, body_ranges, for_each_reference};
pub use cell::{CellBody, HeapCell};
pub use config::HeapConfig;
pub use context::HeapContext;
pub use dictionary::{DictEntry, Dictionary, DictionaryKind};
pub use env_constants::{ConstantString, GlobalEnvConstants, RealmRoots, SharedRoots};
pub use error::{HeapError, HeapResult};
pub use factory::{CompletionType, ErrorType, FunctionKind, ObjectFactory};
pub use heap::ObjectHeap;
pub use layout::{ClassLayout, layout_of};
pub use layout_info::LayoutInfo;
pub use property::{PropertyAttributes, PropertyKey, Representation};
pub use realm::{RealmId, RealmRecord, RealmRegistry};
pub use shape::{Shape, ShapeArena, ShapeFlags, ShapeId, ShapeRef};
pub use shared::{SendableClass, SendableClassSpec, SharedHeap, SharedObjectFactory, verify_shared_closure};
pub use storage::{ElementsStorage, PropertyEntry, PropertyStorage};
pub use types::JsType;
pub use value::{HeapRef, LocalRef, SharedRef, TaggedValue};
pub use otter_heap_gc::MemSpace;
