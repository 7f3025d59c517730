//! Tagged values
//!
//! `TaggedValue` is the closed sum every slot of every heap object holds. The
//! 64-bit word form exists for the binary layout contract and the few places
//! that key on identity (prototype transitions, dictionary hashing); the only
//! way back from a word is [`TaggedValue::decode`].
//!
//! Word layout:
//! - integers: `TAG_INT | (i as u32)`
//! - doubles: IEEE bits plus `DOUBLE_ENCODE_OFFSET`, NaN canonicalized
//! - specials: small constants below `HEAP_REF_BASE`
//! - heap references: `HEAP_REF_BASE + (index << 1 | domain)`

use std::fmt;

/// Tag bits of a small integer
pub const TAG_INT: u64 = 0xFFFF_0000_0000_0000;
/// Offset added to double bits so they never collide with references
pub const DOUBLE_ENCODE_OFFSET: u64 = 1 << 48;
/// Canonical quiet NaN
const CANONICAL_NAN_BITS: u64 = 0x7FF8_0000_0000_0000;

pub const VALUE_NULL: u64 = 0x02;
pub const VALUE_HOLE: u64 = 0x05;
pub const VALUE_FALSE: u64 = 0x06;
pub const VALUE_TRUE: u64 = 0x07;
pub const VALUE_UNDEFINED: u64 = 0x0A;
pub const VALUE_EXCEPTION: u64 = 0x12;
pub const VALUE_UNINITIALIZED: u64 = 0x1A;

/// Lowest word that encodes a heap reference
pub const HEAP_REF_BASE: u64 = 0x1000;
const SHARED_DOMAIN_BIT: u64 = 1;

/// Handle to an object owned by one runtime context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalRef(u32);

impl LocalRef {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Arena index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an object in the shared heap
///
/// There is no conversion between `SharedRef` and `LocalRef`; a value moves
/// between domains only by being allocated in the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedRef(u32);

impl SharedRef {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Arena index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reference to a heap object in either domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeapRef {
    Local(LocalRef),
    Shared(SharedRef),
}

impl HeapRef {
    pub const fn is_shared(self) -> bool {
        matches!(self, HeapRef::Shared(_))
    }

    pub const fn as_local(self) -> Option<LocalRef> {
        match self {
            HeapRef::Local(r) => Some(r),
            HeapRef::Shared(_) => None,
        }
    }

    pub const fn as_shared(self) -> Option<SharedRef> {
        match self {
            HeapRef::Shared(r) => Some(r),
            HeapRef::Local(_) => None,
        }
    }
}

impl From<LocalRef> for HeapRef {
    fn from(r: LocalRef) -> Self {
        HeapRef::Local(r)
    }
}

impl From<SharedRef> for HeapRef {
    fn from(r: SharedRef) -> Self {
        HeapRef::Shared(r)
    }
}

/// Singleton sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Singleton {
    Undefined,
    Null,
    /// Absent element or not-yet-assigned slot
    Hole,
    /// Marks an abrupt completion
    Exception,
    /// Free-slot filler before initialization
    Uninitialized,
}

/// A managed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaggedValue {
    Int(i32),
    Double(f64),
    Bool(bool),
    Singleton(Singleton),
    Heap(HeapRef),
}

impl TaggedValue {
    pub const UNDEFINED: TaggedValue = TaggedValue::Singleton(Singleton::Undefined);
    pub const NULL: TaggedValue = TaggedValue::Singleton(Singleton::Null);
    pub const HOLE: TaggedValue = TaggedValue::Singleton(Singleton::Hole);
    pub const EXCEPTION: TaggedValue = TaggedValue::Singleton(Singleton::Exception);
    pub const UNINITIALIZED: TaggedValue = TaggedValue::Singleton(Singleton::Uninitialized);
    pub const TRUE: TaggedValue = TaggedValue::Bool(true);
    pub const FALSE: TaggedValue = TaggedValue::Bool(false);

    pub const fn is_undefined(self) -> bool {
        matches!(self, TaggedValue::Singleton(Singleton::Undefined))
    }

    pub const fn is_null(self) -> bool {
        matches!(self, TaggedValue::Singleton(Singleton::Null))
    }

    pub const fn is_hole(self) -> bool {
        matches!(self, TaggedValue::Singleton(Singleton::Hole))
    }

    pub const fn is_exception(self) -> bool {
        matches!(self, TaggedValue::Singleton(Singleton::Exception))
    }

    pub const fn is_uninitialized(self) -> bool {
        matches!(self, TaggedValue::Singleton(Singleton::Uninitialized))
    }

    pub const fn is_int(self) -> bool {
        matches!(self, TaggedValue::Int(_))
    }

    pub const fn is_double(self) -> bool {
        matches!(self, TaggedValue::Double(_))
    }

    pub const fn is_number(self) -> bool {
        matches!(self, TaggedValue::Int(_) | TaggedValue::Double(_))
    }

    pub const fn is_heap(self) -> bool {
        matches!(self, TaggedValue::Heap(_))
    }

    /// Inline scalar or singleton, never a reference
    pub const fn is_primitive_word(self) -> bool {
        !self.is_heap()
    }

    pub const fn as_int(self) -> Option<i32> {
        match self {
            TaggedValue::Int(i) => Some(i),
            _ => None,
        }
    }

    pub const fn as_number(self) -> Option<f64> {
        match self {
            TaggedValue::Int(i) => Some(i as f64),
            TaggedValue::Double(d) => Some(d),
            _ => None,
        }
    }

    pub const fn as_bool(self) -> Option<bool> {
        match self {
            TaggedValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub const fn heap_ref(self) -> Option<HeapRef> {
        match self {
            TaggedValue::Heap(r) => Some(r),
            _ => None,
        }
    }

    pub const fn local_ref(self) -> Option<LocalRef> {
        match self {
            TaggedValue::Heap(HeapRef::Local(r)) => Some(r),
            _ => None,
        }
    }

    pub const fn shared_ref(self) -> Option<SharedRef> {
        match self {
            TaggedValue::Heap(HeapRef::Shared(r)) => Some(r),
            _ => None,
        }
    }

    /// Whether a shared object may hold this value
    pub const fn is_shareable(self) -> bool {
        !matches!(self, TaggedValue::Heap(HeapRef::Local(_)))
    }

    /// Word form
    pub fn encode(self) -> u64 {
        match self {
            TaggedValue::Int(i) => TAG_INT | (i as u32 as u64),
            TaggedValue::Double(d) => {
                let bits = if d.is_nan() {
                    CANONICAL_NAN_BITS
                } else {
                    d.to_bits()
                };
                bits + DOUBLE_ENCODE_OFFSET
            }
            TaggedValue::Bool(true) => VALUE_TRUE,
            TaggedValue::Bool(false) => VALUE_FALSE,
            TaggedValue::Singleton(Singleton::Undefined) => VALUE_UNDEFINED,
            TaggedValue::Singleton(Singleton::Null) => VALUE_NULL,
            TaggedValue::Singleton(Singleton::Hole) => VALUE_HOLE,
            TaggedValue::Singleton(Singleton::Exception) => VALUE_EXCEPTION,
            TaggedValue::Singleton(Singleton::Uninitialized) => VALUE_UNINITIALIZED,
            TaggedValue::Heap(HeapRef::Local(r)) => HEAP_REF_BASE + ((r.0 as u64) << 1),
            TaggedValue::Heap(HeapRef::Shared(r)) => {
                HEAP_REF_BASE + (((r.0 as u64) << 1) | SHARED_DOMAIN_BIT)
            }
        }
    }

    /// Decode a word; `None` for words no value encodes to
    pub fn decode(raw: u64) -> Option<TaggedValue> {
        if raw & TAG_INT == TAG_INT {
            return Some(TaggedValue::Int(raw as u32 as i32));
        }
        if raw >= DOUBLE_ENCODE_OFFSET {
            return Some(TaggedValue::Double(f64::from_bits(raw - DOUBLE_ENCODE_OFFSET)));
        }
        if raw >= HEAP_REF_BASE {
            let payload = raw - HEAP_REF_BASE;
            let index = u32::try_from(payload >> 1).ok()?;
            let heap = if payload & SHARED_DOMAIN_BIT != 0 {
                HeapRef::Shared(SharedRef(index))
            } else {
                HeapRef::Local(LocalRef(index))
            };
            return Some(TaggedValue::Heap(heap));
        }
        match raw {
            VALUE_TRUE => Some(TaggedValue::TRUE),
            VALUE_FALSE => Some(TaggedValue::FALSE),
            VALUE_UNDEFINED => Some(TaggedValue::UNDEFINED),
            VALUE_NULL => Some(TaggedValue::NULL),
            VALUE_HOLE => Some(TaggedValue::HOLE),
            VALUE_EXCEPTION => Some(TaggedValue::EXCEPTION),
            VALUE_UNINITIALIZED => Some(TaggedValue::UNINITIALIZED),
            _ => None,
        }
    }

    /// Identity comparison on the word form (NaN equals NaN, +0 differs from -0)
    pub fn same_word(self, other: TaggedValue) -> bool {
        self.encode() == other.encode()
    }
}

impl Default for TaggedValue {
    fn default() -> Self {
        TaggedValue::UNDEFINED
    }
}

impl From<i32> for TaggedValue {
    fn from(i: i32) -> Self {
        TaggedValue::Int(i)
    }
}

impl From<f64> for TaggedValue {
    fn from(d: f64) -> Self {
        TaggedValue::Double(d)
    }
}

impl From<bool> for TaggedValue {
    fn from(b: bool) -> Self {
        TaggedValue::Bool(b)
    }
}

impl From<HeapRef> for TaggedValue {
    fn from(r: HeapRef) -> Self {
        TaggedValue::Heap(r)
    }
}

impl From<LocalRef> for TaggedValue {
    fn from(r: LocalRef) -> Self {
        TaggedValue::Heap(HeapRef::Local(r))
    }
}

impl From<SharedRef> for TaggedValue {
    fn from(r: SharedRef) -> Self {
        TaggedValue::Heap(HeapRef::Shared(r))
    }
}

impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaggedValue::Int(i) => write!(f, "{i}"),
            TaggedValue::Double(d) => write!(f, "{d}"),
            TaggedValue::Bool(b) => write!(f, "{b}"),
            TaggedValue::Singleton(Singleton::Undefined) => f.write_str("undefined"),
            TaggedValue::Singleton(Singleton::Null) => f.write_str("null"),
            TaggedValue::Singleton(Singleton::Hole) => f.write_str("<hole>"),
            TaggedValue::Singleton(Singleton::Exception) => f.write_str("<exception>"),
            TaggedValue::Singleton(Singleton::Uninitialized) => f.write_str("<uninitialized>"),
            TaggedValue::Heap(HeapRef::Local(r)) => write!(f, "<local #{}>", r.index()),
            TaggedValue::Heap(HeapRef::Shared(r)) => write!(f, "<shared #{}>", r.index()),
        }
    }
}
