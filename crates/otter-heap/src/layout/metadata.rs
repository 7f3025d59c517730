//! Layout metadata documents and conformance checks
//!
//! Tooling describes each heap object kind with a versioned JSON document.
//! Offsets in a document are relative to the first field the class declares
//! itself, so a document stays valid when a parent class grows.

use super::{ClassLayout, layout_registry};
use crate::dictionary;
use crate::error::{HeapError, HeapResult};
use crate::types::JsType;
use serde::{Deserialize, Serialize};

/// One field of a type document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

/// Layout document of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetadata {
    pub name: String,
    pub offsets: Vec<FieldMetadata>,
    pub end_offset: usize,
    pub parents: Vec<String>,
}

impl TypeMetadata {
    /// Document describing a layout class
    pub fn from_class(class: &ClassLayout) -> Self {
        let own = class.own_fields();
        let base = own.first().map_or(0, |f| f.offset);
        let end_offset = if own.is_empty() {
            0
        } else {
            class.end_offset() - base
        };
        Self {
            name: class.name.to_string(),
            offsets: own
                .iter()
                .map(|f| FieldMetadata {
                    name: f.name.to_string(),
                    offset: f.offset - base,
                    size: f.size(),
                })
                .collect(),
            end_offset,
            parents: class.parents().iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn to_json(&self) -> HeapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The ordered list of type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEnumMetadata {
    pub type_enum: Vec<String>,
}

impl TypeEnumMetadata {
    pub fn current() -> Self {
        Self {
            type_enum: JsType::ALL.iter().map(|ty| ty.name().to_string()).collect(),
        }
    }
}

/// Fixed boundaries of the string and plain-object ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRangeMetadata {
    pub string_first: String,
    pub string_last: String,
    pub js_object_first: String,
    pub js_object_last: String,
}

/// Dictionary table geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryLayoutMetadata {
    pub key_index: usize,
    pub value_index: usize,
    pub details_index: usize,
    pub entry_size: usize,
    pub header_size: usize,
}

/// Parse any metadata document
pub fn parse<T: for<'de> Deserialize<'de>>(json: &str) -> HeapResult<T> {
    Ok(serde_json::from_str(json)?)
}

/// Check a type document against the registry
///
/// Field count, order, relative offsets, sizes, the end offset, and the
/// parent chain must all match. Every field the document names is checked.
pub fn check_type(meta: &TypeMetadata) -> HeapResult<()> {
    let Some(class) = layout_registry().class(&meta.name) else {
        return Err(HeapError::metadata(&meta.name, "unknown type"));
    };
    let actual = TypeMetadata::from_class(class);

    if meta.offsets.len() != actual.offsets.len() {
        return Err(HeapError::metadata(
            &meta.name,
            format!(
                "field count {} does not match layout {}",
                meta.offsets.len(),
                actual.offsets.len()
            ),
        ));
    }
    for (expected, field) in meta.offsets.iter().zip(&actual.offsets) {
        if expected.name != field.name {
            return Err(HeapError::metadata(
                &meta.name,
                format!("expected field {} but layout has {}", expected.name, field.name),
            ));
        }
        if expected.offset != field.offset || expected.size != field.size {
            return Err(HeapError::metadata(
                &meta.name,
                format!(
                    "field {} at {}+{} but layout has {}+{}",
                    field.name, expected.offset, expected.size, field.offset, field.size
                ),
            ));
        }
    }
    if meta.end_offset != actual.end_offset {
        return Err(HeapError::metadata(
            &meta.name,
            format!(
                "end offset {} does not match layout {}",
                meta.end_offset, actual.end_offset
            ),
        ));
    }
    if meta.parents != actual.parents {
        return Err(HeapError::metadata(
            &meta.name,
            format!("parents {:?} do not match layout {:?}", meta.parents, actual.parents),
        ));
    }
    Ok(())
}

/// Check the declared order of the type enumeration
pub fn check_type_enum(meta: &TypeEnumMetadata) -> HeapResult<()> {
    if meta.type_enum.len() != JsType::COUNT {
        return Err(HeapError::metadata(
            "type_enum",
            format!("{} names for {} tags", meta.type_enum.len(), JsType::COUNT),
        ));
    }
    for (index, (name, ty)) in meta.type_enum.iter().zip(JsType::ALL).enumerate() {
        if name != ty.name() {
            return Err(HeapError::metadata(
                "type_enum",
                format!("tag {index} is {} but the document says {name}", ty.name()),
            ));
        }
    }
    Ok(())
}

/// Check the string and plain-object range boundaries
pub fn check_type_range(meta: &TypeRangeMetadata) -> HeapResult<()> {
    let expected = [
        ("string_first", &meta.string_first, JsType::STRING_FIRST),
        ("string_last", &meta.string_last, JsType::STRING_LAST),
        ("js_object_first", &meta.js_object_first, JsType::JS_OBJECT_FIRST),
        ("js_object_last", &meta.js_object_last, JsType::JS_OBJECT_LAST),
    ];
    for (key, value, ty) in expected {
        if value != ty.name() {
            return Err(HeapError::metadata(
                "type_range",
                format!("{key} is {} but the document says {value}", ty.name()),
            ));
        }
    }
    Ok(())
}

/// Check dictionary geometry constants
pub fn check_dictionary_layout(meta: &DictionaryLayoutMetadata) -> HeapResult<()> {
    let actual = DictionaryLayoutMetadata {
        key_index: dictionary::ENTRY_KEY_INDEX,
        value_index: dictionary::ENTRY_VALUE_INDEX,
        details_index: dictionary::ENTRY_DETAILS_INDEX,
        entry_size: dictionary::ENTRY_SIZE,
        header_size: dictionary::TABLE_HEADER_SIZE,
    };
    if *meta != actual {
        return Err(HeapError::metadata(
            "dictionary_layout",
            format!("{meta:?} does not match {actual:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_offsets() {
        let meta = TypeMetadata::from_class(layout_registry().of(JsType::JsArray));
        assert_eq!(meta.offsets[0], FieldMetadata { name: "Length".into(), offset: 0, size: 4 });
        assert_eq!(meta.offsets[1].offset, 8);
        assert_eq!(meta.end_offset, 16);
    }

    #[test]
    fn test_empty_class_has_zero_end_offset() {
        let meta = TypeMetadata::from_class(layout_registry().of(JsType::JsError));
        assert!(meta.offsets.is_empty());
        assert_eq!(meta.end_offset, 0);
    }

    #[test]
    fn test_generated_documents_pass() {
        for class in layout_registry().classes() {
            check_type(&TypeMetadata::from_class(class)).unwrap();
        }
        check_type_enum(&TypeEnumMetadata::current()).unwrap();
    }

    #[test]
    fn test_reordered_fields_fail() {
        let mut meta = TypeMetadata::from_class(layout_registry().of(JsType::JsObject));
        meta.offsets.swap(0, 1);
        let err = check_type(&meta).unwrap_err();
        assert!(matches!(err, HeapError::Metadata { .. }));
    }
}
