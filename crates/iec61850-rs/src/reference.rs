// crates/iec61850-rs/src/reference.rs

//! Object references: the textual address of a node in a device tree.
//!
//! An address has the form `{device}{ldInst}/{ln}.{do}[.{sdo}...].{da}[.{bda}...]`.
//! The logical device and logical node are separated by `/`; every other
//! level is joined with `.`. Access point names are not part of the
//! address, so lookups try each access point in turn.

use crate::model::{
    DataAttribute, DataObject, Device, LogicalDevice, LogicalNode, ObjectChild,
};
use alloc::string::String;
use alloc::vec::Vec;

/// A node reachable by address.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Node(&'a LogicalNode),
    Object(&'a DataObject),
    Attribute(&'a DataAttribute),
}

impl<'a> NodeRef<'a> {
    pub fn as_attribute(self) -> Option<&'a DataAttribute> {
        match self {
            NodeRef::Attribute(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(self) -> Option<&'a DataObject> {
        match self {
            NodeRef::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Builds the address of a node from its ancestor names.
///
/// `segments` are the names below the logical node (objects, attributes).
pub fn compose(device: &str, ld_inst: &str, ln: &str, segments: &[&str]) -> String {
    let len = device.len()
        + ld_inst.len()
        + ln.len()
        + 1
        + segments.iter().map(|s| s.len() + 1).sum::<usize>();
    let mut address = String::with_capacity(len);
    address.push_str(device);
    address.push_str(ld_inst);
    address.push('/');
    address.push_str(ln);
    for segment in segments {
        address.push('.');
        address.push_str(segment);
    }
    address
}

/// An address split into its logical device, logical node and path below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address<'a> {
    /// Everything before the `/`, device name prefix included.
    pub ld: &'a str,
    pub ln: &'a str,
    pub path: Vec<&'a str>,
}

impl<'a> Address<'a> {
    /// Splits an address. Returns `None` when the `/` is missing or any
    /// segment is empty.
    pub fn parse(address: &'a str) -> Option<Self> {
        let (ld, rest) = address.split_once('/')?;
        let mut segments = rest.split('.');
        let ln = segments.next()?;
        let path: Vec<&str> = segments.collect();
        if ld.is_empty() || ln.is_empty() || path.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self { ld, ln, path })
    }

    /// Logical device names to try, prefix-stripped first.
    fn ld_candidates(&self, device_name: &str) -> impl Iterator<Item = &'a str> {
        let stripped = self
            .ld
            .strip_prefix(device_name)
            .filter(|s| !s.is_empty() && !device_name.is_empty());
        stripped.into_iter().chain(core::iter::once(self.ld))
    }
}

fn descend<'d>(ld: &'d LogicalDevice, address: &Address<'_>) -> Option<NodeRef<'d>> {
    let node = ld.logical_node(address.ln)?;
    let Some((first, rest)) = address.path.split_first() else {
        return Some(NodeRef::Node(node));
    };
    let mut current = NodeRef::Object(node.data_object(first)?);
    for segment in rest {
        current = match current {
            NodeRef::Object(object) => match object.child(segment)? {
                ObjectChild::Object(o) => NodeRef::Object(o),
                ObjectChild::Attribute(a) => NodeRef::Attribute(a),
            },
            NodeRef::Attribute(attribute) => NodeRef::Attribute(attribute.child(segment)?),
            NodeRef::Node(_) => return None,
        };
    }
    Some(current)
}

fn descend_attribute_mut<'d>(
    ld: &'d mut LogicalDevice,
    address: &Address<'_>,
) -> Option<&'d mut DataAttribute> {
    let (first, rest) = address.path.split_first()?;
    let mut object = ld.logical_node_mut(address.ln)?.data_object_mut(first)?;
    let mut segments = rest.iter();
    loop {
        let segment = segments.next()?;
        match object.child_mut(segment)? {
            ObjectChild::Object(o) => object = o,
            ObjectChild::Attribute(a) => {
                let mut attribute = a;
                for segment in segments {
                    attribute = attribute.child_mut(segment)?;
                }
                return Some(attribute);
            }
        }
    }
}

impl Device {
    /// Resolves an address to a logical node, data object or attribute.
    ///
    /// Descent is guided by the tree: each segment is looked up among the
    /// children of the node reached so far.
    pub fn resolve(&self, address: &str) -> Option<NodeRef<'_>> {
        let address = Address::parse(address)?;
        for ap in self.access_points() {
            for ld_name in address.ld_candidates(&self.name) {
                if let Some(found) = ap.logical_device(ld_name).and_then(|ld| descend(ld, &address)) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Resolves an address to a data attribute.
    pub fn lookup(&self, address: &str) -> Option<&DataAttribute> {
        self.resolve(address).and_then(NodeRef::as_attribute)
    }

    /// Mutable counterpart of [`Device::lookup`].
    pub fn lookup_mut(&mut self, address: &str) -> Option<&mut DataAttribute> {
        let parsed = Address::parse(address)?;
        let (ap_name, ld_name) = self.access_points().find_map(|ap| {
            parsed.ld_candidates(&self.name).find_map(|ld_name| {
                let ld = ap.logical_device(ld_name)?;
                descend(ld, &parsed)?.as_attribute()?;
                Some((ap.name.clone(), ld_name))
            })
        })?;
        let ld = self.access_point_mut(&ap_name)?.logical_device_mut(ld_name)?;
        descend_attribute_mut(ld, &parsed)
    }

    /// Every addressable node with its address, in tree order.
    pub fn walk(&self) -> Vec<(String, NodeRef<'_>)> {
        let mut out = Vec::new();
        for ld in self.logical_devices() {
            for ln in ld.logical_nodes() {
                let ln_name = ln.name();
                out.push((compose(&self.name, &ld.inst, &ln_name, &[]), NodeRef::Node(ln)));
                for object in ln.data_objects() {
                    let mut path = Vec::new();
                    walk_object(&self.name, &ld.inst, &ln_name, object, &mut path, &mut out);
                }
            }
        }
        out
    }

    /// Addresses of every scalar leaf attribute.
    pub fn leaf_references(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter_map(|(address, node)| match node {
                NodeRef::Attribute(a) if !a.is_structured() => Some(address),
                _ => None,
            })
            .collect()
    }

    /// Address of an attribute held by this device, found by identity.
    ///
    /// Returns `None` for an attribute that is not part of this tree, even
    /// if an equal one is.
    pub fn address_of(&self, attribute: &DataAttribute) -> Option<String> {
        self.walk().into_iter().find_map(|(address, node)| match node {
            NodeRef::Attribute(a) if core::ptr::eq(a, attribute) => Some(address),
            _ => None,
        })
    }
}

fn walk_object<'d>(
    device: &str,
    ld: &str,
    ln: &str,
    object: &'d DataObject,
    path: &mut Vec<&'d str>,
    out: &mut Vec<(String, NodeRef<'d>)>,
) {
    path.push(&object.name);
    out.push((compose(device, ld, ln, &path[..]), NodeRef::Object(object)));
    for child in object.children() {
        match child {
            ObjectChild::Object(o) => walk_object(device, ld, ln, o, path, out),
            ObjectChild::Attribute(a) => walk_attribute(device, ld, ln, a, path, out),
        }
    }
    path.pop();
}

fn walk_attribute<'d>(
    device: &str,
    ld: &str,
    ln: &str,
    attribute: &'d DataAttribute,
    path: &mut Vec<&'d str>,
    out: &mut Vec<(String, NodeRef<'d>)>,
) {
    path.push(&attribute.name);
    out.push((compose(device, ld, ln, &path[..]), NodeRef::Attribute(attribute)));
    for child in attribute.children() {
        walk_attribute(device, ld, ln, child, path, out);
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessPoint, DataAttribute};
    use crate::types::{BasicType, FunctionalConstraint};
    use crate::value::Value;

    fn device() -> Device {
        let mut mag = DataAttribute::structured("mag", FunctionalConstraint::MX);
        mag.add_child(DataAttribute::scalar("f", BasicType::Float32, FunctionalConstraint::MX))
            .unwrap();
        let mut tot_w = DataObject::new("TotW", "MV");
        tot_w.add_attribute(mag).unwrap();

        let mut mmxu = LogicalNode::new("", "MMXU", "1");
        mmxu.add_data_object(tot_w).unwrap();
        let mut ld = LogicalDevice::new("MEAS");
        ld.add_logical_node(mmxu).unwrap();
        let mut ap = AccessPoint::new("S1");
        ap.add_logical_device(ld).unwrap();
        let mut device = Device::new("IED1");
        device.add_access_point(ap).unwrap();
        device
    }

    #[test]
    fn test_compose() {
        assert_eq!(compose("IED1", "MEAS", "MMXU1", &["TotW", "mag", "f"]), "IED1MEAS/MMXU1.TotW.mag.f");
        assert_eq!(compose("IED1", "MEAS", "LLN0", &[]), "IED1MEAS/LLN0");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Address::parse("IED1MEAS.MMXU1.TotW").is_none());
        assert!(Address::parse("/MMXU1.TotW").is_none());
        assert!(Address::parse("IED1MEAS/").is_none());
        assert!(Address::parse("IED1MEAS/MMXU1..f").is_none());
        let parsed = Address::parse("IED1MEAS/MMXU1.TotW.mag.f").unwrap();
        assert_eq!(parsed.ld, "IED1MEAS");
        assert_eq!(parsed.ln, "MMXU1");
        assert_eq!(parsed.path, ["TotW", "mag", "f"]);
    }

    #[test]
    fn test_lookup_with_and_without_device_prefix() {
        let device = device();
        let f = device.lookup("IED1MEAS/MMXU1.TotW.mag.f").unwrap();
        assert_eq!(f.basic_type, BasicType::Float32);
        assert!(device.lookup("MEAS/MMXU1.TotW.mag.f").is_some());
        assert!(device.lookup("IED1MEAS/MMXU1.TotW.mag").is_some());
        assert!(device.lookup("IED1MEAS/MMXU1.TotW").is_none());
        assert!(device.lookup("IED1MEAS/MMXU1.TotW.mag.f.extra").is_none());
        assert!(device.lookup("IED1MEAS/MMXU1").is_none());
        assert!(device.lookup("IED1MEAS.MMXU1.TotW.mag.f").is_none());
    }

    #[test]
    fn test_address_of_finds_by_identity() {
        let device = device();
        let f = device.lookup("MEAS/MMXU1.TotW.mag.f").unwrap();
        assert_eq!(device.address_of(f).as_deref(), Some("IED1MEAS/MMXU1.TotW.mag.f"));
        let mag = device.lookup("IED1MEAS/MMXU1.TotW.mag").unwrap();
        assert_eq!(device.address_of(mag).as_deref(), Some("IED1MEAS/MMXU1.TotW.mag"));

        let detached = f.clone();
        assert!(device.address_of(&detached).is_none());
    }

    #[test]
    fn test_lookup_mut_writes_through() {
        let mut device = device();
        let f = device.lookup_mut("IED1MEAS/MMXU1.TotW.mag.f").unwrap();
        f.set_value(Value::Float(50.0)).unwrap();
        let f = device.lookup("IED1MEAS/MMXU1.TotW.mag.f").unwrap();
        assert_eq!(f.value(), Some(&Value::Float(50.0)));
        assert!(device.lookup_mut("IED1MEAS/MMXU1.TotW").is_none());
    }

    #[test]
    fn test_walk_round_trips_every_node() {
        let device = device();
        let nodes = device.walk();
        assert_eq!(nodes.len(), 4);
        for (address, node) in &nodes {
            let found = device.resolve(address).unwrap();
            match (node, found) {
                (NodeRef::Node(a), NodeRef::Node(b)) => assert!(core::ptr::eq(*a, b)),
                (NodeRef::Object(a), NodeRef::Object(b)) => assert!(core::ptr::eq(*a, b)),
                (NodeRef::Attribute(a), NodeRef::Attribute(b)) => assert!(core::ptr::eq(*a, b)),
                _ => panic!("{} resolved to a different kind of node", address),
            }
        }
        assert_eq!(device.leaf_references(), ["IED1MEAS/MMXU1.TotW.mag.f"]);
    }
}
