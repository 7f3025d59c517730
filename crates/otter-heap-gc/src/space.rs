//! Memory space identifiers and addresses

use std::fmt;

/// Memory space an object lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemSpace {
    /// Nursery, bump allocated and evacuated by minor collections
    Young,
    /// Tenured objects
    Old,
    /// Objects that must never move (copy-on-write arrays, machine code)
    NonMovable,
    /// Objects above the huge threshold, one region each
    Huge,
    /// Immutable constants
    ReadOnly,
    /// Shared tenured objects
    SharedOld,
    /// Shared objects that must never move
    SharedNonMovable,
    /// Shared immutable constants
    SharedReadOnly,
}

impl MemSpace {
    /// Every space, in declaration order
    pub const ALL: [MemSpace; 8] = [
        MemSpace::Young,
        MemSpace::Old,
        MemSpace::NonMovable,
        MemSpace::Huge,
        MemSpace::ReadOnly,
        MemSpace::SharedOld,
        MemSpace::SharedNonMovable,
        MemSpace::SharedReadOnly,
    ];

    /// Whether objects in this space are reachable from every runtime thread
    pub const fn is_shared(self) -> bool {
        matches!(
            self,
            MemSpace::SharedOld | MemSpace::SharedNonMovable | MemSpace::SharedReadOnly
        )
    }

    /// Whether a compacting collector may relocate objects in this space
    pub const fn is_movable(self) -> bool {
        matches!(self, MemSpace::Young | MemSpace::Old | MemSpace::SharedOld)
    }

    /// Whether objects in this space are immutable after initialization
    pub const fn is_read_only(self) -> bool {
        matches!(self, MemSpace::ReadOnly | MemSpace::SharedReadOnly)
    }

    /// Whether this is the nursery
    pub const fn is_young(self) -> bool {
        matches!(self, MemSpace::Young)
    }

    /// Short lowercase name used in logs and errors
    pub const fn name(self) -> &'static str {
        match self {
            MemSpace::Young => "young",
            MemSpace::Old => "old",
            MemSpace::NonMovable => "non-movable",
            MemSpace::Huge => "huge",
            MemSpace::ReadOnly => "read-only",
            MemSpace::SharedOld => "shared-old",
            MemSpace::SharedNonMovable => "shared-non-movable",
            MemSpace::SharedReadOnly => "shared-read-only",
        }
    }
}

impl fmt::Display for MemSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Location of an allocation: the space plus the byte offset inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapAddress {
    /// Space holding the allocation
    pub space: MemSpace,
    /// Byte offset from the start of the space, always 8-byte aligned
    pub offset: usize,
}

impl HeapAddress {
    /// Create an address
    pub const fn new(space: MemSpace, offset: usize) -> Self {
        Self { space, offset }
    }
}

impl fmt::Display for HeapAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#x}", self.space, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_classification() {
        let shared: Vec<_> = MemSpace::ALL.iter().filter(|s| s.is_shared()).collect();
        assert_eq!(shared.len(), 3);
        assert!(MemSpace::Young.is_movable());
        assert!(!MemSpace::NonMovable.is_movable());
        assert!(!MemSpace::Huge.is_movable());
        assert!(MemSpace::SharedReadOnly.is_read_only());
        assert!(!MemSpace::SharedOld.is_read_only());
    }

    #[test]
    fn test_address_display() {
        let addr = HeapAddress::new(MemSpace::Old, 0x40);
        assert_eq!(addr.to_string(), "old+0x40");
    }
}
