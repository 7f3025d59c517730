//! Bump allocation for regular spaces and per-object regions for huge objects

use crate::space::{HeapAddress, MemSpace};

/// Round a request up to the 8-byte object alignment
pub const fn align_object_size(size: usize) -> usize {
    (size + 7) & !7
}

/// Contiguous bump-allocated space
#[derive(Debug)]
pub struct BumpSpace {
    space: MemSpace,
    capacity: usize,
    top: usize,
    objects: usize,
}

impl BumpSpace {
    /// Create an empty space of a fixed capacity
    pub fn new(space: MemSpace, capacity: usize) -> Self {
        Self {
            space,
            capacity,
            top: 0,
            objects: 0,
        }
    }

    /// Allocate memory (returns None if the space is exhausted)
    pub fn allocate(&mut self, size: usize) -> Option<HeapAddress> {
        let aligned_size = align_object_size(size);
        if self.top + aligned_size > self.capacity {
            return None;
        }
        let offset = self.top;
        self.top += aligned_size;
        self.objects += 1;
        Some(HeapAddress::new(self.space, offset))
    }

    /// Reset the space (after a collection evacuated it)
    pub fn reset(&mut self) {
        self.top = 0;
        self.objects = 0;
    }

    /// Space identifier
    pub fn space(&self) -> MemSpace {
        self.space
    }

    /// Bytes handed out so far
    pub fn used(&self) -> usize {
        self.top
    }

    /// Bytes still available
    pub fn available(&self) -> usize {
        self.capacity - self.top
    }

    /// Number of allocations since the last reset
    pub fn object_count(&self) -> usize {
        self.objects
    }
}

/// Huge object space: every allocation gets its own region
#[derive(Debug)]
pub struct HugeSpace {
    space: MemSpace,
    limit: usize,
    regions: Vec<usize>,
    used: usize,
}

impl HugeSpace {
    /// Create a huge space with a total byte limit
    pub fn new(space: MemSpace, limit: usize) -> Self {
        Self {
            space,
            limit,
            regions: Vec::new(),
            used: 0,
        }
    }

    /// Allocate a region (returns None once the limit is reached)
    pub fn allocate(&mut self, size: usize) -> Option<HeapAddress> {
        let aligned_size = align_object_size(size);
        if self.used + aligned_size > self.limit {
            return None;
        }
        let offset = self.used;
        self.regions.push(aligned_size);
        self.used += aligned_size;
        Some(HeapAddress::new(self.space, offset))
    }

    /// Bytes handed out so far
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of live regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_alignment() {
        let mut space = BumpSpace::new(MemSpace::Young, 1024);

        let a = space.allocate(12).unwrap();
        let b = space.allocate(1).unwrap();

        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 16);
        assert_eq!(space.used(), 24);
        assert_eq!(space.object_count(), 2);
    }

    #[test]
    fn test_bump_exhaustion() {
        let mut space = BumpSpace::new(MemSpace::Old, 64);

        assert!(space.allocate(64).is_some());
        assert!(space.allocate(8).is_none());
        space.reset();
        assert_eq!(space.allocate(8).map(|a| a.offset), Some(0));
    }

    #[test]
    fn test_huge_regions() {
        let mut huge = HugeSpace::new(MemSpace::Huge, 1 << 20);

        let a = huge.allocate(100_000).unwrap();
        let b = huge.allocate(100_000).unwrap();

        assert_ne!(a, b);
        assert_eq!(huge.region_count(), 2);
        assert!(huge.allocate(1 << 20).is_none());
    }
}
