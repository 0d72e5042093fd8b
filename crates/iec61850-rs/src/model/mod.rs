// crates/iec61850-rs/src/model/mod.rs

//! The device tree. Every node exclusively owns its children and sibling
//! names are unique; inserting a duplicate is an error, never an overwrite.

pub mod control;
pub mod device;
pub mod node;
pub mod object;

pub use control::{
    ControlOptions, DataSet, Fcda, GseControl, LogControl, OptionValue, ReportControl, SmvControl,
};
pub use device::Device;
pub use node::{AccessPoint, LogicalDevice, LogicalNode};
pub use object::{AttributeContent, DataAttribute, DataObject, ObjectChild, UNKNOWN_CDC};

use crate::error::ModelError;
use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::string::{String, ToString};

/// Inserts `value` under `name`, rejecting an existing sibling.
pub(crate) fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    parent: &str,
    name: String,
    value: T,
) -> Result<(), ModelError> {
    match map.entry(name) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
        Entry::Occupied(slot) => Err(ModelError::DuplicateName {
            parent: parent.to_string(),
            name: slot.key().clone(),
        }),
    }
}
