// crates/iec61850-rs/src/error.rs

use crate::types::BasicType;
use alloc::string::String;
use core::fmt;

/// Errors raised while building or mutating an object model.
#[derive(Debug)]
pub enum ModelError {
    /// A sibling with the same name already exists under `parent`.
    DuplicateName { parent: String, name: String },

    /// A value was written to a structured attribute.
    NotScalar { attribute: String },

    /// A child attribute was added to a scalar attribute.
    NotStructured {
        attribute: String,
        basic_type: BasicType,
    },

    /// The engine response could not be decoded.
    Document(serde_json::Error),

    /// The engine response decoded but did not have the expected shape.
    UnexpectedResponse(&'static str),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Document(e)
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::DuplicateName { parent, name } => {
                write!(f, "Duplicate name '{}' under '{}'", name, parent)
            }
            ModelError::NotScalar { attribute } => {
                write!(f, "Attribute '{}' is structured and holds no value", attribute)
            }
            ModelError::NotStructured {
                attribute,
                basic_type,
            } => write!(
                f,
                "Attribute '{}' of type {} cannot own sub-attributes",
                attribute, basic_type
            ),
            ModelError::Document(e) => write!(f, "Engine document error: {}", e),
            ModelError::UnexpectedResponse(msg) => write!(f, "Unexpected engine response: {}", msg),
        }
    }
}

impl core::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display_names_parent_and_child() {
        let err = ModelError::DuplicateName {
            parent: "LLN0".to_string(),
            name: "Mod".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate name 'Mod' under 'LLN0'");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ModelError = json_err.into();
        assert!(matches!(err, ModelError::Document(_)));
    }
}
