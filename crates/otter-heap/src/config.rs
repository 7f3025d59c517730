//! Heap configuration

use crate::property::MAX_FAST_PROPS_CAPACITY;
use otter_heap_gc::SpaceConfig;

/// Object model configuration
#[derive(Debug, Clone)]
pub struct HeapConfig {
    /// Space sizes for the local and shared heaps
    pub spaces: SpaceConfig,
    /// In-object property slots for ordinary objects (default: 4)
    pub default_inline_capacity: u32,
    /// Out-of-line property array growth step (default: 4)
    pub properties_grow_step: u32,
    /// Named properties before an object goes to dictionary mode (default: 1024)
    ///
    /// Values above [`MAX_FAST_PROPS_CAPACITY`] act as that capacity.
    pub max_fast_properties: u32,
    /// Shapes under one root before further objects go to dictionary mode (default: 4096)
    pub max_shapes_per_root: u32,
    /// Largest index gap past capacity kept dense (default: 1024)
    pub max_element_gap: u32,
    /// Instantiations observed before object-size tracking completes (default: 7)
    pub size_tracking_count: u8,
    /// Literal arrays at most this long share a copy-on-write backing store (default: 10)
    pub max_cow_literal_length: u32,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            spaces: SpaceConfig::default(),
            default_inline_capacity: 4,
            properties_grow_step: 4,
            max_fast_properties: 1024,
            max_shapes_per_root: 4096,
            max_element_gap: 1024,
            size_tracking_count: 7,
            max_cow_literal_length: 10,
        }
    }
}

impl HeapConfig {
    /// Named properties a fast-mode object may hold under this configuration
    pub fn fast_property_limit(&self) -> u32 {
        self.max_fast_properties.min(MAX_FAST_PROPS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_property_limit_fits_the_offset_field() {
        let mut config = HeapConfig::default();
        assert_eq!(config.fast_property_limit(), 1024);
        config.max_fast_properties = 8;
        assert_eq!(config.fast_property_limit(), 8);
        config.max_fast_properties = 5000;
        assert_eq!(config.fast_property_limit(), MAX_FAST_PROPS_CAPACITY);
    }
}
