//! # Otter Heap Spaces
//!
//! Memory spaces and the allocation interface used by the object heap.
//!
//! ## Design
//!
//! - **Local spaces**: young, old, non-movable, huge and read-only regions owned
//!   by one runtime thread, no synchronization
//! - **Shared spaces**: old, non-movable and read-only regions visible to every
//!   runtime thread, guarded by a lock
//! - **Write barrier**: card marking for old-to-young stores
//!
//! Allocation never collects. A request that no space can satisfy returns
//! `None` and the caller turns it into an out-of-memory error.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod allocator;
pub mod barrier;
pub mod heap;
pub mod space;

pub use allocator::{BumpSpace, HugeSpace, align_object_size};
pub use barrier::{BarrierStats, CARD_SIZE, CardTable, WriteBarrier};
pub use heap::{LocalSpaces, SharedSpaces, SpaceConfig, SpaceStats};
pub use space::{HeapAddress, MemSpace};
