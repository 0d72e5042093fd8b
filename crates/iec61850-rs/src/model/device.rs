// crates/iec61850-rs/src/model/device.rs

use super::insert_unique;
use super::node::{AccessPoint, LogicalDevice};
use crate::error::ModelError;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Root of one configured device (IED). Owns the whole tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Device {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub revision: String,
    pub description: Option<String>,
    access_points: BTreeMap<String, AccessPoint>,
}

impl Device {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_access_point(&mut self, access_point: AccessPoint) -> Result<(), ModelError> {
        insert_unique(
            &mut self.access_points,
            &self.name,
            access_point.name.clone(),
            access_point,
        )
    }

    pub fn access_point(&self, name: &str) -> Option<&AccessPoint> {
        self.access_points.get(name)
    }

    pub fn access_point_mut(&mut self, name: &str) -> Option<&mut AccessPoint> {
        self.access_points.get_mut(name)
    }

    pub fn access_points(&self) -> impl Iterator<Item = &AccessPoint> {
        self.access_points.values()
    }

    /// Every logical device across all access points.
    pub fn logical_devices(&self) -> impl Iterator<Item = &LogicalDevice> {
        self.access_points.values().flat_map(AccessPoint::logical_devices)
    }
}
