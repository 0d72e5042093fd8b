// crates/iec61850-rs/src/model/object.rs

//! Data objects and data attributes, the lower two levels of the tree.

use super::insert_unique;
use crate::error::ModelError;
use crate::types::{BasicType, FunctionalConstraint, Quality, Timestamp, TriggerOptions};
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Classification used when an object type declares no `cdc`.
pub const UNKNOWN_CDC: &str = "UNKNOWN";

// --- Data Attributes ---

/// Payload of a data attribute. Scalar and structured are exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeContent {
    Scalar(Option<Value>),
    Structured(BTreeMap<String, DataAttribute>),
}

/// A leaf value or a structured attribute owning sub-attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataAttribute {
    pub name: String,
    pub basic_type: BasicType,
    pub fc: FunctionalConstraint,
    pub trigger_options: TriggerOptions,
    pub quality: Quality,
    pub timestamp: Option<Timestamp>,
    /// `type` attribute of the declaration (enumeration or attribute type id).
    pub type_ref: Option<String>,
    content: AttributeContent,
}

impl DataAttribute {
    /// Creates a scalar attribute with no value yet.
    ///
    /// A `Struct` basic type is still given scalar content here; use
    /// [`DataAttribute::structured`] for attributes that own children.
    pub fn scalar(name: &str, basic_type: BasicType, fc: FunctionalConstraint) -> Self {
        Self {
            name: name.to_string(),
            basic_type,
            fc,
            trigger_options: TriggerOptions::empty(),
            quality: Quality::GOOD,
            timestamp: None,
            type_ref: None,
            content: AttributeContent::Scalar(None),
        }
    }

    /// Creates a structured attribute with no children yet.
    pub fn structured(name: &str, fc: FunctionalConstraint) -> Self {
        Self {
            content: AttributeContent::Structured(BTreeMap::new()),
            ..Self::scalar(name, BasicType::Struct, fc)
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        if let AttributeContent::Scalar(slot) = &mut self.content {
            *slot = Some(value);
        }
        self
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.content, AttributeContent::Structured(_))
    }

    pub fn content(&self) -> &AttributeContent {
        &self.content
    }

    /// Current value, `None` for structured attributes and unset leaves.
    pub fn value(&self) -> Option<&Value> {
        match &self.content {
            AttributeContent::Scalar(v) => v.as_ref(),
            AttributeContent::Structured(_) => None,
        }
    }

    /// Replaces the current value of a scalar attribute.
    pub fn set_value(&mut self, value: Value) -> Result<(), ModelError> {
        match &mut self.content {
            AttributeContent::Scalar(slot) => {
                *slot = Some(value);
                Ok(())
            }
            AttributeContent::Structured(_) => Err(ModelError::NotScalar {
                attribute: self.name.clone(),
            }),
        }
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    pub fn touch(&mut self, timestamp: Timestamp) {
        self.timestamp = Some(timestamp);
    }

    /// Adds a sub-attribute to a structured attribute.
    pub fn add_child(&mut self, child: DataAttribute) -> Result<(), ModelError> {
        match &mut self.content {
            AttributeContent::Structured(children) => {
                insert_unique(children, &self.name, child.name.clone(), child)
            }
            AttributeContent::Scalar(_) => Err(ModelError::NotStructured {
                attribute: self.name.clone(),
                basic_type: self.basic_type,
            }),
        }
    }

    pub fn child(&self, name: &str) -> Option<&DataAttribute> {
        match &self.content {
            AttributeContent::Structured(children) => children.get(name),
            AttributeContent::Scalar(_) => None,
        }
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut DataAttribute> {
        match &mut self.content {
            AttributeContent::Structured(children) => children.get_mut(name),
            AttributeContent::Scalar(_) => None,
        }
    }

    /// Sub-attributes in name order. Empty for scalar attributes.
    pub fn children(&self) -> impl Iterator<Item = &DataAttribute> {
        let children = match &self.content {
            AttributeContent::Structured(children) => Some(children.values()),
            AttributeContent::Scalar(_) => None,
        };
        children.into_iter().flatten()
    }
}

// --- Data Objects ---

/// A slot under a data object: a nested object or an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectChild {
    Object(DataObject),
    Attribute(DataAttribute),
}

impl ObjectChild {
    pub fn name(&self) -> &str {
        match self {
            ObjectChild::Object(o) => &o.name,
            ObjectChild::Attribute(a) => &a.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    pub name: String,
    /// Common data class, or [`UNKNOWN_CDC`].
    pub cdc: String,
    pub description: Option<String>,
    pub type_ref: Option<String>,
    children: BTreeMap<String, ObjectChild>,
}

impl DataObject {
    pub fn new(name: &str, cdc: &str) -> Self {
        Self {
            name: name.to_string(),
            cdc: cdc.to_string(),
            description: None,
            type_ref: None,
            children: BTreeMap::new(),
        }
    }

    /// Adds a sub-object or attribute. Objects and attributes share one
    /// namespace, so a name can never address both.
    pub fn add_child(&mut self, child: ObjectChild) -> Result<(), ModelError> {
        let name = child.name().to_string();
        insert_unique(&mut self.children, &self.name, name, child)
    }

    pub fn add_object(&mut self, object: DataObject) -> Result<(), ModelError> {
        self.add_child(ObjectChild::Object(object))
    }

    pub fn add_attribute(&mut self, attribute: DataAttribute) -> Result<(), ModelError> {
        self.add_child(ObjectChild::Attribute(attribute))
    }

    pub fn child(&self, name: &str) -> Option<&ObjectChild> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ObjectChild> {
        self.children.get_mut(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &ObjectChild> {
        self.children.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&DataAttribute> {
        match self.children.get(name)? {
            ObjectChild::Attribute(a) => Some(a),
            ObjectChild::Object(_) => None,
        }
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut DataAttribute> {
        match self.children.get_mut(name)? {
            ObjectChild::Attribute(a) => Some(a),
            ObjectChild::Object(_) => None,
        }
    }

    pub fn object(&self, name: &str) -> Option<&DataObject> {
        match self.children.get(name)? {
            ObjectChild::Object(o) => Some(o),
            ObjectChild::Attribute(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
