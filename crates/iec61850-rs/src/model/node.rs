// crates/iec61850-rs/src/model/node.rs

//! Access points, logical devices and logical nodes.

use super::control::{DataSet, GseControl, LogControl, ReportControl, SmvControl};
use super::insert_unique;
use super::object::DataObject;
use crate::error::ModelError;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};

// --- Logical Nodes ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogicalNode {
    pub prefix: String,
    pub class: String,
    pub inst: String,
    pub description: Option<String>,
    /// Id of the node type template this node was expanded from.
    pub type_ref: String,
    data_objects: BTreeMap<String, DataObject>,
    data_sets: BTreeMap<String, DataSet>,
    report_controls: BTreeMap<String, ReportControl>,
    gse_controls: BTreeMap<String, GseControl>,
    smv_controls: BTreeMap<String, SmvControl>,
    log_controls: BTreeMap<String, LogControl>,
}

impl LogicalNode {
    pub fn new(prefix: &str, class: &str, inst: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            class: class.to_string(),
            inst: inst.to_string(),
            ..Default::default()
        }
    }

    /// The zero-instance node, `LLN0`.
    pub fn lln0() -> Self {
        Self::new("", "LLN0", "")
    }

    /// Composite name: prefix, class and instance concatenated.
    pub fn name(&self) -> String {
        format!("{}{}{}", self.prefix, self.class, self.inst)
    }

    pub fn add_data_object(&mut self, object: DataObject) -> Result<(), ModelError> {
        let parent = self.name();
        insert_unique(&mut self.data_objects, &parent, object.name.clone(), object)
    }

    pub fn data_object(&self, name: &str) -> Option<&DataObject> {
        self.data_objects.get(name)
    }

    pub fn data_object_mut(&mut self, name: &str) -> Option<&mut DataObject> {
        self.data_objects.get_mut(name)
    }

    pub fn data_objects(&self) -> impl Iterator<Item = &DataObject> {
        self.data_objects.values()
    }

    pub fn add_data_set(&mut self, data_set: DataSet) -> Result<(), ModelError> {
        let parent = self.name();
        insert_unique(&mut self.data_sets, &parent, data_set.name.clone(), data_set)
    }

    pub fn data_set(&self, name: &str) -> Option<&DataSet> {
        self.data_sets.get(name)
    }

    pub fn data_sets(&self) -> impl Iterator<Item = &DataSet> {
        self.data_sets.values()
    }

    pub fn add_report_control(&mut self, control: ReportControl) -> Result<(), ModelError> {
        let parent = self.name();
        insert_unique(&mut self.report_controls, &parent, control.name.clone(), control)
    }

    pub fn report_control(&self, name: &str) -> Option<&ReportControl> {
        self.report_controls.get(name)
    }

    pub fn report_controls(&self) -> impl Iterator<Item = &ReportControl> {
        self.report_controls.values()
    }

    pub fn add_gse_control(&mut self, control: GseControl) -> Result<(), ModelError> {
        let parent = self.name();
        insert_unique(&mut self.gse_controls, &parent, control.name.clone(), control)
    }

    pub fn gse_control(&self, name: &str) -> Option<&GseControl> {
        self.gse_controls.get(name)
    }

    pub fn gse_controls(&self) -> impl Iterator<Item = &GseControl> {
        self.gse_controls.values()
    }

    pub fn add_smv_control(&mut self, control: SmvControl) -> Result<(), ModelError> {
        let parent = self.name();
        insert_unique(&mut self.smv_controls, &parent, control.name.clone(), control)
    }

    pub fn smv_control(&self, name: &str) -> Option<&SmvControl> {
        self.smv_controls.get(name)
    }

    pub fn smv_controls(&self) -> impl Iterator<Item = &SmvControl> {
        self.smv_controls.values()
    }

    pub fn add_log_control(&mut self, control: LogControl) -> Result<(), ModelError> {
        let parent = self.name();
        insert_unique(&mut self.log_controls, &parent, control.name.clone(), control)
    }

    pub fn log_control(&self, name: &str) -> Option<&LogControl> {
        self.log_controls.get(name)
    }

    pub fn log_controls(&self) -> impl Iterator<Item = &LogControl> {
        self.log_controls.values()
    }
}

// --- Logical Devices ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogicalDevice {
    pub inst: String,
    pub description: Option<String>,
    logical_nodes: BTreeMap<String, LogicalNode>,
}

impl LogicalDevice {
    pub fn new(inst: &str) -> Self {
        Self {
            inst: inst.to_string(),
            ..Default::default()
        }
    }

    /// Adds a node keyed by its composite name.
    pub fn add_logical_node(&mut self, node: LogicalNode) -> Result<(), ModelError> {
        insert_unique(&mut self.logical_nodes, &self.inst, node.name(), node)
    }

    pub fn logical_node(&self, name: &str) -> Option<&LogicalNode> {
        self.logical_nodes.get(name)
    }

    pub fn logical_node_mut(&mut self, name: &str) -> Option<&mut LogicalNode> {
        self.logical_nodes.get_mut(name)
    }

    pub fn logical_nodes(&self) -> impl Iterator<Item = &LogicalNode> {
        self.logical_nodes.values()
    }
}

// --- Access Points ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccessPoint {
    pub name: String,
    pub description: Option<String>,
    logical_devices: BTreeMap<String, LogicalDevice>,
}

impl AccessPoint {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_logical_device(&mut self, device: LogicalDevice) -> Result<(), ModelError> {
        insert_unique(&mut self.logical_devices, &self.name, device.inst.clone(), device)
    }

    pub fn logical_device(&self, inst: &str) -> Option<&LogicalDevice> {
        self.logical_devices.get(inst)
    }

    pub fn logical_device_mut(&mut self, inst: &str) -> Option<&mut LogicalDevice> {
        self.logical_devices.get_mut(inst)
    }

    pub fn logical_devices(&self) -> impl Iterator<Item = &LogicalDevice> {
        self.logical_devices.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_names() {
        assert_eq!(LogicalNode::lln0().name(), "LLN0");
        assert_eq!(LogicalNode::new("Q0", "XCBR", "1").name(), "Q0XCBR1");
    }

    #[test]
    fn test_logical_nodes_are_keyed_by_composite_name() {
        let mut ld = LogicalDevice::new("PROT");
        ld.add_logical_node(LogicalNode::new("", "PTOC", "1")).unwrap();
        assert!(ld.logical_node("PTOC1").is_some());
        assert!(matches!(
            ld.add_logical_node(LogicalNode::new("", "PTOC", "1")),
            Err(ModelError::DuplicateName { .. })
        ));
        assert_eq!(ld.logical_nodes().count(), 1);
    }
}
