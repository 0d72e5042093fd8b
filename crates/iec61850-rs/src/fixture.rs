// crates/iec61850-rs/src/fixture.rs

//! A small fixed device for environments without a configuration file.

use crate::error::ModelError;
use crate::model::{AccessPoint, DataAttribute, DataObject, Device, LogicalDevice, LogicalNode};
use crate::types::{BasicType, ControlModel, DbPos, FunctionalConstraint as Fc, Quality};
use crate::value::Value;
use alloc::string::ToString;
use log::debug;

/// Access point holding the fixture's logical devices.
pub const DEFAULT_ACCESS_POINT: &str = "S1";

fn status(name: &str, basic_type: BasicType, value: Value) -> DataAttribute {
    DataAttribute::scalar(name, basic_type, Fc::ST).with_value(value)
}

fn quality() -> DataAttribute {
    status("q", BasicType::Quality, Value::UInt(Quality::GOOD.bits().into()))
}

fn time() -> DataAttribute {
    DataAttribute::scalar("t", BasicType::Timestamp, Fc::ST)
}

fn object(
    name: &str,
    cdc: &str,
    desc: &str,
    attributes: impl IntoIterator<Item = DataAttribute>,
) -> Result<DataObject, ModelError> {
    let mut object = DataObject::new(name, cdc);
    object.description = Some(desc.to_string());
    for attribute in attributes {
        object.add_attribute(attribute)?;
    }
    Ok(object)
}

fn measurement(name: &str, desc: &str, magnitude: f64) -> Result<DataObject, ModelError> {
    let mut mag = DataAttribute::structured("mag", Fc::MX);
    let f = DataAttribute::scalar("f", BasicType::Float32, Fc::MX).with_value(Value::Float(magnitude));
    mag.add_child(f)?;
    let mut q = quality();
    q.fc = Fc::MX;
    let mut t = time();
    t.fc = Fc::MX;
    object(name, "MV", desc, [mag, q, t])
}

fn node(
    class: &str,
    inst: &str,
    desc: &str,
    objects: impl IntoIterator<Item = DataObject>,
) -> Result<LogicalNode, ModelError> {
    let mut node = LogicalNode::new("", class, inst);
    node.description = Some(desc.to_string());
    for object in objects {
        node.add_data_object(object)?;
    }
    Ok(node)
}

fn mode(with_status: bool) -> Result<DataObject, ModelError> {
    let st_val = status("stVal", BasicType::Enum, Value::Int(1));
    if with_status {
        object("Mod", "ENC", "Mode", [st_val, quality(), time()])
    } else {
        object("Mod", "ENC", "Mode", [st_val])
    }
}

/// Builds the default device: a protection logical device (`LLN0`, an
/// overcurrent node `PTOC1`, a breaker `XCBR1`) and a measurement logical
/// device (`MMXU1`).
pub fn default_device(name: &str) -> Result<Device, ModelError> {
    let beh = object(
        "Beh",
        "ENS",
        "Behaviour",
        [status("stVal", BasicType::Enum, Value::Int(1)), quality()],
    )?;
    let lln0 = node("LLN0", "", "Logical Node Zero", [mode(true)?, beh])?;

    let op = object(
        "Op",
        "ACT",
        "Operate",
        ["general", "phsA", "phsB", "phsC"]
            .into_iter()
            .map(|n| status(n, BasicType::Boolean, Value::Boolean(false)))
            .chain([quality(), time()]),
    )?;
    let ptoc = node("PTOC", "1", "Overcurrent Protection", [mode(false)?, op])?;

    let ctl_model = DataAttribute::scalar("ctlModel", BasicType::Enum, Fc::CF)
        .with_value(Value::Int(ControlModel::DirectWithNormalSecurity as i64));
    let pos = object(
        "Pos",
        "DPC",
        "Position",
        [
            status("stVal", BasicType::Dbpos, Value::Int(DbPos::On as i64)),
            quality(),
            time(),
            ctl_model,
        ],
    )?;
    let xcbr = node("XCBR", "1", "Circuit Breaker", [pos])?;

    let mmxu = node(
        "MMXU",
        "1",
        "Measurement Unit",
        [
            measurement("TotW", "Total Active Power", 1.10)?,
            measurement("Hz", "Frequency", 2.20)?,
        ],
    )?;

    let mut prot = LogicalDevice::new("PROT");
    prot.description = Some("Protection LD".to_string());
    prot.add_logical_node(lln0)?;
    prot.add_logical_node(ptoc)?;
    prot.add_logical_node(xcbr)?;

    let mut meas = LogicalDevice::new("MEAS");
    meas.description = Some("Measurement LD".to_string());
    meas.add_logical_node(mmxu)?;

    let mut access_point = AccessPoint::new(DEFAULT_ACCESS_POINT);
    access_point.add_logical_device(prot)?;
    access_point.add_logical_device(meas)?;

    let mut device = Device::new(name);
    device.description = Some("Default simulated IED".to_string());
    device.add_access_point(access_point)?;
    debug!("Built default device '{}'", name);
    Ok(device)
}
