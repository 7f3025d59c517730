//! Space sets for one runtime thread and for the shared heap

use crate::allocator::{BumpSpace, HugeSpace, align_object_size};
use crate::space::{HeapAddress, MemSpace};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Space configuration
#[derive(Debug, Clone)]
pub struct SpaceConfig {
    /// Young space size (default: 4MB)
    pub young_size: usize,
    /// Old space size (default: 32MB)
    pub old_size: usize,
    /// Non-movable space size (default: 4MB)
    pub non_movable_size: usize,
    /// Read-only space size (default: 1MB)
    pub read_only_size: usize,
    /// Total huge space limit (default: 64MB)
    pub huge_limit: usize,
    /// Objects larger than this go to the huge space (default: 256KB)
    pub huge_threshold: usize,
    /// Shared old space size (default: 32MB)
    pub shared_old_size: usize,
    /// Shared non-movable space size (default: 4MB)
    pub shared_non_movable_size: usize,
    /// Shared read-only space size (default: 1MB)
    pub shared_read_only_size: usize,
    /// GC trigger ratio (default: 0.75)
    pub gc_trigger_ratio: f64,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            young_size: 4 * 1024 * 1024,             // 4MB
            old_size: 32 * 1024 * 1024,              // 32MB
            non_movable_size: 4 * 1024 * 1024,       // 4MB
            read_only_size: 1024 * 1024,             // 1MB
            huge_limit: 64 * 1024 * 1024,            // 64MB
            huge_threshold: 256 * 1024,              // 256KB
            shared_old_size: 32 * 1024 * 1024,       // 32MB
            shared_non_movable_size: 4 * 1024 * 1024, // 4MB
            shared_read_only_size: 1024 * 1024,      // 1MB
            gc_trigger_ratio: 0.75,
        }
    }
}

/// Per-space usage snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpaceStats {
    /// Bytes used in the space
    pub used: usize,
    /// Allocations served by the space
    pub objects: usize,
}

/// Spaces owned by one runtime thread
#[derive(Debug)]
pub struct LocalSpaces {
    config: SpaceConfig,
    young: BumpSpace,
    old: BumpSpace,
    non_movable: BumpSpace,
    read_only: BumpSpace,
    huge: HugeSpace,
    allocated: usize,
}

impl LocalSpaces {
    /// Create local spaces with default config
    pub fn new() -> Self {
        Self::with_config(SpaceConfig::default())
    }

    /// Create local spaces with custom config
    pub fn with_config(config: SpaceConfig) -> Self {
        Self {
            young: BumpSpace::new(MemSpace::Young, config.young_size),
            old: BumpSpace::new(MemSpace::Old, config.old_size),
            non_movable: BumpSpace::new(MemSpace::NonMovable, config.non_movable_size),
            read_only: BumpSpace::new(MemSpace::ReadOnly, config.read_only_size),
            huge: HugeSpace::new(MemSpace::Huge, config.huge_limit),
            allocated: 0,
            config,
        }
    }

    /// Allocate in the young space, falling back to old when it is full
    pub fn allocate_young_or_huge(&mut self, size: usize) -> Option<HeapAddress> {
        if size > self.config.huge_threshold {
            return self.allocate_huge(size);
        }
        let addr = match self.young.allocate(size) {
            Some(addr) => Some(addr),
            // Young space full and no minor GC here, promote directly
            None => self.old.allocate(size),
        };
        self.account(addr, size)
    }

    /// Allocate in the old space
    pub fn allocate_old_or_huge(&mut self, size: usize) -> Option<HeapAddress> {
        if size > self.config.huge_threshold {
            return self.allocate_huge(size);
        }
        let addr = self.old.allocate(size);
        self.account(addr, size)
    }

    /// Allocate in the non-movable space
    pub fn allocate_non_movable_or_huge(&mut self, size: usize) -> Option<HeapAddress> {
        if size > self.config.huge_threshold {
            return self.allocate_huge(size);
        }
        let addr = self.non_movable.allocate(size);
        self.account(addr, size)
    }

    /// Allocate in the read-only space
    pub fn allocate_read_only_or_huge(&mut self, size: usize) -> Option<HeapAddress> {
        if size > self.config.huge_threshold {
            return self.allocate_huge(size);
        }
        let addr = self.read_only.allocate(size);
        self.account(addr, size)
    }

    fn allocate_huge(&mut self, size: usize) -> Option<HeapAddress> {
        let addr = self.huge.allocate(size);
        self.account(addr, size)
    }

    fn account(&mut self, addr: Option<HeapAddress>, size: usize) -> Option<HeapAddress> {
        match addr {
            Some(addr) => {
                self.allocated += align_object_size(size);
                Some(addr)
            }
            None => {
                #[cfg(feature = "gc_logging")]
                tracing::warn!(
                    target: "otter::gc",
                    requested = size,
                    allocated = self.allocated,
                    "local space exhausted"
                );
                None
            }
        }
    }

    /// Get current allocated bytes
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Check if GC should be triggered
    pub fn should_gc(&self) -> bool {
        let allocated = self.allocated as f64;
        let threshold =
            (self.config.young_size + self.config.old_size) as f64 * self.config.gc_trigger_ratio;
        allocated > threshold
    }

    /// Usage of one local space
    pub fn stats(&self, space: MemSpace) -> SpaceStats {
        let bump = match space {
            MemSpace::Young => &self.young,
            MemSpace::Old => &self.old,
            MemSpace::NonMovable => &self.non_movable,
            MemSpace::ReadOnly => &self.read_only,
            MemSpace::Huge => {
                return SpaceStats {
                    used: self.huge.used(),
                    objects: self.huge.region_count(),
                };
            }
            _ => return SpaceStats::default(),
        };
        SpaceStats {
            used: bump.used(),
            objects: bump.object_count(),
        }
    }

    /// Get config
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }
}

impl Default for LocalSpaces {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct SharedRegions {
    old: BumpSpace,
    non_movable: BumpSpace,
    read_only: BumpSpace,
}

/// Spaces shared by every runtime thread
///
/// Huge shared objects are served from the shared old space; there is no
/// separate shared huge space.
#[derive(Debug)]
pub struct SharedSpaces {
    regions: Mutex<SharedRegions>,
    allocated: AtomicUsize,
}

impl SharedSpaces {
    /// Create shared spaces sized from a config
    pub fn with_config(config: &SpaceConfig) -> Self {
        Self {
            regions: Mutex::new(SharedRegions {
                old: BumpSpace::new(MemSpace::SharedOld, config.shared_old_size),
                non_movable: BumpSpace::new(
                    MemSpace::SharedNonMovable,
                    config.shared_non_movable_size,
                ),
                read_only: BumpSpace::new(MemSpace::SharedReadOnly, config.shared_read_only_size),
            }),
            allocated: AtomicUsize::new(0),
        }
    }

    /// Allocate in the shared old space
    pub fn allocate_old_or_huge(&self, size: usize) -> Option<HeapAddress> {
        let addr = self.regions.lock().old.allocate(size);
        self.account(addr, size)
    }

    /// Allocate in the shared non-movable space
    pub fn allocate_non_movable(&self, size: usize) -> Option<HeapAddress> {
        let addr = self.regions.lock().non_movable.allocate(size);
        self.account(addr, size)
    }

    /// Allocate in the shared read-only space
    pub fn allocate_read_only(&self, size: usize) -> Option<HeapAddress> {
        let addr = self.regions.lock().read_only.allocate(size);
        self.account(addr, size)
    }

    fn account(&self, addr: Option<HeapAddress>, size: usize) -> Option<HeapAddress> {
        if addr.is_some() {
            self.allocated
                .fetch_add(align_object_size(size), Ordering::Relaxed);
        } else {
            #[cfg(feature = "gc_logging")]
            tracing::warn!(target: "otter::gc", requested = size, "shared space exhausted");
        }
        addr
    }

    /// Get current allocated bytes
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Usage of one shared space
    pub fn stats(&self, space: MemSpace) -> SpaceStats {
        let regions = self.regions.lock();
        let bump = match space {
            MemSpace::SharedOld => &regions.old,
            MemSpace::SharedNonMovable => &regions.non_movable,
            MemSpace::SharedReadOnly => &regions.read_only,
            _ => return SpaceStats::default(),
        };
        SpaceStats {
            used: bump.used(),
            objects: bump.object_count(),
        }
    }
}

impl Default for SharedSpaces {
    fn default() -> Self {
        Self::with_config(&SpaceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_routing() {
        let mut spaces = LocalSpaces::new();

        assert_eq!(spaces.allocate_young_or_huge(32).unwrap().space, MemSpace::Young);
        assert_eq!(spaces.allocate_old_or_huge(32).unwrap().space, MemSpace::Old);
        assert_eq!(
            spaces.allocate_non_movable_or_huge(32).unwrap().space,
            MemSpace::NonMovable
        );
        assert_eq!(
            spaces.allocate_read_only_or_huge(32).unwrap().space,
            MemSpace::ReadOnly
        );
        assert_eq!(spaces.allocate_old_or_huge(1 << 20).unwrap().space, MemSpace::Huge);
        assert_eq!(spaces.allocated(), 4 * 32 + (1 << 20));
    }

    #[test]
    fn test_young_promotes_when_full() {
        let mut spaces = LocalSpaces::with_config(SpaceConfig {
            young_size: 64,
            ..SpaceConfig::default()
        });

        assert_eq!(spaces.allocate_young_or_huge(64).unwrap().space, MemSpace::Young);
        assert_eq!(spaces.allocate_young_or_huge(8).unwrap().space, MemSpace::Old);
    }

    #[test]
    fn test_shared_routing() {
        let spaces = SharedSpaces::default();

        assert_eq!(spaces.allocate_old_or_huge(1 << 20).unwrap().space, MemSpace::SharedOld);
        assert_eq!(
            spaces.allocate_read_only(16).unwrap().space,
            MemSpace::SharedReadOnly
        );
        assert_eq!(spaces.stats(MemSpace::SharedReadOnly).objects, 1);
    }
}
