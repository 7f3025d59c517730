//! Property keys and packed property attributes

use crate::value::HeapRef;
use std::fmt;
use std::sync::Arc;

/// Property key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    /// String property key
    String(Arc<str>),
    /// Symbol property key (the symbol object)
    Symbol(HeapRef),
    /// Integer index (for elements)
    Index(u32),
}

impl PropertyKey {
    /// Create a string property key
    pub fn string(s: &str) -> Self {
        Self::String(Arc::from(s))
    }

    /// Create an index property key
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether a shared shape may use this key
    pub fn is_shareable(&self) -> bool {
        !matches!(self, Self::Symbol(HeapRef::Local(_)))
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(HeapRef::Local(r)) => write!(f, "Symbol(#{})", r.index()),
            Self::Symbol(HeapRef::Shared(r)) => write!(f, "Symbol(shared #{})", r.index()),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Storage representation of a property value
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Not yet decided
    None = 0,
    /// Small integer
    Int = 1,
    /// Unboxed double
    Double = 2,
    /// Any tagged value
    Tagged = 3,
}

impl Representation {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Representation::None,
            1 => Representation::Int,
            2 => Representation::Double,
            _ => Representation::Tagged,
        }
    }

    /// Representation a value would need
    pub fn of(value: crate::value::TaggedValue) -> Self {
        match value {
            crate::value::TaggedValue::Int(_) => Representation::Int,
            crate::value::TaggedValue::Double(_) => Representation::Double,
            _ => Representation::Tagged,
        }
    }
}

/// Most named properties a fast (shape-described) object may carry
pub const MAX_FAST_PROPS_CAPACITY: u32 = 1 << OFFSET_BITS;

const WRITABLE: u32 = 1 << 0;
const ENUMERABLE: u32 = 1 << 1;
const CONFIGURABLE: u32 = 1 << 2;
const ACCESSOR: u32 = 1 << 3;
const INLINED: u32 = 1 << 4;
const REPRESENTATION_SHIFT: u32 = 5;
const REPRESENTATION_MASK: u32 = 0b11 << REPRESENTATION_SHIFT;
const OFFSET_SHIFT: u32 = 7;
const OFFSET_BITS: u32 = 10;
const OFFSET_MASK: u32 = ((1 << OFFSET_BITS) - 1) << OFFSET_SHIFT;

/// Packed property attributes
///
/// Bits: writable, enumerable, configurable, accessor, inlined,
/// representation (2 bits), layout offset (10 bits).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyAttributes(u32);

impl PropertyAttributes {
    /// Default data property attributes (writable, enumerable, configurable)
    pub const fn data() -> Self {
        Self(WRITABLE | ENUMERABLE | CONFIGURABLE)
    }

    /// Data property with explicit flags
    pub const fn data_with(writable: bool, enumerable: bool, configurable: bool) -> Self {
        let mut bits = 0;
        if writable {
            bits |= WRITABLE;
        }
        if enumerable {
            bits |= ENUMERABLE;
        }
        if configurable {
            bits |= CONFIGURABLE;
        }
        Self(bits)
    }

    /// Accessor property with explicit flags
    pub const fn accessor(enumerable: bool, configurable: bool) -> Self {
        Self(Self::data_with(false, enumerable, configurable).0 | ACCESSOR)
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self(0)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// From raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn is_writable(self) -> bool {
        self.0 & WRITABLE != 0
    }

    pub const fn is_enumerable(self) -> bool {
        self.0 & ENUMERABLE != 0
    }

    pub const fn is_configurable(self) -> bool {
        self.0 & CONFIGURABLE != 0
    }

    pub const fn is_accessor(self) -> bool {
        self.0 & ACCESSOR != 0
    }

    pub const fn is_inlined(self) -> bool {
        self.0 & INLINED != 0
    }

    pub const fn representation(self) -> Representation {
        Representation::from_bits((self.0 & REPRESENTATION_MASK) >> REPRESENTATION_SHIFT)
    }

    pub const fn offset(self) -> u32 {
        (self.0 & OFFSET_MASK) >> OFFSET_SHIFT
    }

    pub const fn with_writable(self, writable: bool) -> Self {
        if writable {
            Self(self.0 | WRITABLE)
        } else {
            Self(self.0 & !WRITABLE)
        }
    }

    pub const fn with_configurable(self, configurable: bool) -> Self {
        if configurable {
            Self(self.0 | CONFIGURABLE)
        } else {
            Self(self.0 & !CONFIGURABLE)
        }
    }

    pub const fn with_inlined(self, inlined: bool) -> Self {
        if inlined {
            Self(self.0 | INLINED)
        } else {
            Self(self.0 & !INLINED)
        }
    }

    pub const fn with_representation(self, rep: Representation) -> Self {
        Self((self.0 & !REPRESENTATION_MASK) | ((rep as u32) << REPRESENTATION_SHIFT))
    }

    /// Set the layout offset; panics when it does not fit the offset field
    pub const fn with_offset(self, offset: u32) -> Self {
        assert!(offset < MAX_FAST_PROPS_CAPACITY, "property offset out of range");
        Self((self.0 & !OFFSET_MASK) | (offset << OFFSET_SHIFT))
    }

    /// Writable, enumerable, configurable data property
    pub const fn is_default(self) -> bool {
        self.0 & (WRITABLE | ENUMERABLE | CONFIGURABLE | ACCESSOR)
            == WRITABLE | ENUMERABLE | CONFIGURABLE
    }

    /// The bits a transition edge is keyed on: flags and representation,
    /// without the derived offset and inline placement
    pub const fn transition_bits(self) -> u32 {
        self.0 & (WRITABLE | ENUMERABLE | CONFIGURABLE | ACCESSOR | REPRESENTATION_MASK)
    }
}

impl Default for PropertyAttributes {
    fn default() -> Self {
        Self::data()
    }
}

impl fmt::Debug for PropertyAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAttributes")
            .field("writable", &self.is_writable())
            .field("enumerable", &self.is_enumerable())
            .field("configurable", &self.is_configurable())
            .field("accessor", &self.is_accessor())
            .field("inlined", &self.is_inlined())
            .field("representation", &self.representation())
            .field("offset", &self.offset())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data() {
        let attrs = PropertyAttributes::data();
        assert!(attrs.is_writable() && attrs.is_enumerable() && attrs.is_configurable());
        assert!(!attrs.is_accessor());
        assert!(attrs.is_default());
        assert_eq!(attrs.representation(), Representation::None);
    }

    #[test]
    fn test_offset_packing() {
        let attrs = PropertyAttributes::data()
            .with_offset(1023)
            .with_inlined(true)
            .with_representation(Representation::Double);

        assert_eq!(attrs.offset(), 1023);
        assert!(attrs.is_inlined());
        assert_eq!(attrs.representation(), Representation::Double);
        assert_eq!(
            attrs.transition_bits(),
            PropertyAttributes::data()
                .with_representation(Representation::Double)
                .transition_bits()
        );
    }

    #[test]
    #[should_panic(expected = "property offset out of range")]
    fn test_offset_overflow() {
        let _ = PropertyAttributes::data().with_offset(MAX_FAST_PROPS_CAPACITY);
    }

    #[test]
    fn test_accessor_is_not_default() {
        let attrs = PropertyAttributes::accessor(true, true);
        assert!(attrs.is_accessor());
        assert!(!attrs.is_writable());
        assert!(!attrs.is_default());
    }

    #[test]
    fn test_key_shareability() {
        use crate::value::{LocalRef, SharedRef};
        assert!(PropertyKey::from("x").is_shareable());
        assert!(PropertyKey::Symbol(HeapRef::Shared(SharedRef::new(0))).is_shareable());
        assert!(!PropertyKey::Symbol(HeapRef::Local(LocalRef::new(0))).is_shareable());
    }
}
