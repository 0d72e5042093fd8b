// crates/iec61850-rs/src/engine.rs

//! Request/response surface of the external protocol engine.
//!
//! The engine is a separate process that serves the model over the wire.
//! This module only builds the documents it consumes and decodes its
//! replies; transport is left to the caller.

use crate::error::ModelError;
use crate::model::{
    ControlOptions, DataAttribute, DataObject, DataSet, Device, GseControl, LogControl,
    LogicalNode, ObjectChild, OptionValue, ReportControl, SmvControl,
};
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};

// --- Configuration ---

fn default_ip_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    102
}

fn default_max_connections() -> u32 {
    10
}

/// Listener settings passed along with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_ip_address")]
    pub ip_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip_address: default_ip_address(),
            port: default_port(),
            max_connections: default_max_connections(),
        }
    }
}

// --- Model Document ---

fn options_document(options: &ControlOptions) -> Json {
    options
        .iter()
        .map(|(key, value)| {
            let value = match value {
                OptionValue::Flag(b) => Json::Bool(*b),
                OptionValue::Text(s) => Json::String(s.clone()),
            };
            (key.clone(), value)
        })
        .collect::<Map<String, Json>>()
        .into()
}

fn attribute_document(attribute: &DataAttribute) -> Json {
    let mut doc = Map::new();
    doc.insert("name".into(), attribute.name.as_str().into());
    doc.insert("type".into(), attribute.basic_type.protocol_code().into());
    doc.insert("fc".into(), attribute.fc.as_str().into());
    if attribute.is_structured() {
        let children: Map<String, Json> = attribute
            .children()
            .map(|c| (c.name.clone(), attribute_document(c)))
            .collect();
        doc.insert("attributes".into(), children.into());
    } else {
        doc.insert(
            "value".into(),
            attribute.value().map_or(Json::Null, Value::to_json),
        );
        doc.insert("quality".into(), attribute.quality.bits().into());
        doc.insert(
            "timestamp".into(),
            attribute.timestamp.map_or(Json::Null, |t| t.as_millis().into()),
        );
    }
    doc.into()
}

fn object_document(object: &DataObject) -> Json {
    let children: Map<String, Json> = object
        .children()
        .map(|child| {
            let doc = match child {
                ObjectChild::Object(o) => object_document(o),
                ObjectChild::Attribute(a) => attribute_document(a),
            };
            (child.name().to_string(), doc)
        })
        .collect();
    json!({
        "name": object.name,
        "cdc": object.cdc,
        "description": object.description,
        "attributes": children,
    })
}

fn data_set_document(data_set: &DataSet) -> Json {
    json!({
        "name": data_set.name,
        "description": data_set.description,
        "fcdas": data_set.fcda_references(),
    })
}

fn report_document(rc: &ReportControl) -> Json {
    json!({
        "name": rc.name,
        "description": rc.description,
        "buffered": rc.buffered,
        "dataset": rc.data_set,
        "rptid": rc.rpt_id,
        "buf_time": rc.buf_time,
        "intg_pd": rc.intg_pd,
        "trigger_options": rc.trigger_options.bits(),
        "options": options_document(&rc.options),
    })
}

fn gse_document(gc: &GseControl) -> Json {
    json!({
        "name": gc.name,
        "description": gc.description,
        "dataset": gc.data_set,
        "gocbname": gc.name,
        "app_id": gc.app_id,
        "options": options_document(&gc.options),
    })
}

fn smv_document(sc: &SmvControl) -> Json {
    json!({
        "name": sc.name,
        "description": sc.description,
        "dataset": sc.data_set,
        "smvcbname": sc.name,
        "smv_id": sc.smv_id,
        "smprate": sc.smp_rate,
        "smpmod": sc.smp_mod,
        "options": options_document(&sc.options),
    })
}

fn log_document(lc: &LogControl) -> Json {
    json!({
        "name": lc.name,
        "description": lc.description,
        "dataset": lc.data_set,
        "logname": lc.log_name,
        "log_ena": lc.log_ena,
        "intg_pd": lc.intg_pd,
        "options": options_document(&lc.options),
    })
}

fn keyed<'a, T: 'a>(
    items: impl Iterator<Item = &'a T>,
    name: impl Fn(&T) -> String,
    doc: impl Fn(&T) -> Json,
) -> Json {
    items
        .map(|item| (name(item), doc(item)))
        .collect::<Map<String, Json>>()
        .into()
}

fn node_document(ln: &LogicalNode) -> Json {
    json!({
        "name": ln.name(),
        "class": ln.class,
        "description": ln.description,
        "data_objects": keyed(ln.data_objects(), |o| o.name.clone(), object_document),
        "data_sets": keyed(ln.data_sets(), |d| d.name.clone(), data_set_document),
        "report_controls": keyed(ln.report_controls(), |c| c.name.clone(), report_document),
        "gse_controls": keyed(ln.gse_controls(), |c| c.name.clone(), gse_document),
        "smv_controls": keyed(ln.smv_controls(), |c| c.name.clone(), smv_document),
        "log_controls": keyed(ln.log_controls(), |c| c.name.clone(), log_document),
    })
}

/// Renders a device in the generic document form of the engine's
/// `server.load_model` action.
///
/// Access points are flattened: logical devices from every access point
/// share one map. When two access points declare the same instance the
/// first one is kept.
pub fn model_document(device: &Device) -> Json {
    let mut logical_devices = Map::new();
    for ld in device.logical_devices() {
        if logical_devices.contains_key(&ld.inst) {
            warn!(
                "Logical device '{}' appears in more than one access point of '{}'; keeping the first",
                ld.inst, device.name
            );
            continue;
        }
        let doc = json!({
            "name": ld.inst,
            "description": ld.description,
            "logical_nodes": keyed(ld.logical_nodes(), LogicalNode::name, node_document),
        });
        logical_devices.insert(ld.inst.clone(), doc);
    }
    json!({
        "name": device.name,
        "manufacturer": device.manufacturer,
        "model": device.model,
        "revision": device.revision,
        "description": device.description,
        "logical_devices": logical_devices,
    })
}

// --- Requests ---

/// An action understood by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineRequest {
    LoadModel { model: Json, config: ServerConfig },
    SetDataValue { reference: String, value: Json },
    GetValues { references: Vec<String> },
    GetClients,
}

impl EngineRequest {
    pub fn load_model(device: &Device, config: ServerConfig) -> Self {
        EngineRequest::LoadModel {
            model: model_document(device),
            config,
        }
    }

    pub fn set_data_value(reference: &str, value: &Value) -> Self {
        EngineRequest::SetDataValue {
            reference: reference.to_string(),
            value: value.to_json(),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            EngineRequest::LoadModel { .. } => "server.load_model",
            EngineRequest::SetDataValue { .. } => "server.set_data_value",
            EngineRequest::GetValues { .. } => "server.get_values",
            EngineRequest::GetClients => "server.get_clients",
        }
    }

    pub fn payload(&self) -> Json {
        match self {
            EngineRequest::LoadModel { model, config } => {
                json!({ "model": model, "config": config })
            }
            EngineRequest::SetDataValue { reference, value } => {
                json!({ "reference": reference, "value": value })
            }
            EngineRequest::GetValues { references } => json!({ "references": references }),
            EngineRequest::GetClients => json!({}),
        }
    }

    /// The full request message with correlation `id`.
    pub fn to_envelope(&self, id: &str) -> Json {
        json!({
            "id": id,
            "type": "request",
            "action": self.action(),
            "payload": self.payload(),
        })
    }
}

// --- Responses ---

/// Runtime state of one attribute as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    #[serde(default)]
    pub value: Json,
    #[serde(default)]
    pub quality: u16,
    /// ISO-8601 text as sent by the engine.
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: String,
    #[serde(default)]
    pub connected_at: String,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: BTreeMap<String, AttributeSnapshot>,
}

#[derive(Deserialize)]
struct ClientsResponse {
    #[serde(default)]
    clients: Vec<ClientInfo>,
}

/// Decodes the data of a `server.get_values` response.
pub fn parse_values_response(data: &Json) -> Result<BTreeMap<String, AttributeSnapshot>, ModelError> {
    if !data.is_object() {
        return Err(ModelError::UnexpectedResponse("get_values data is not an object"));
    }
    let response = ValuesResponse::deserialize(data)?;
    Ok(response.values)
}

/// Decodes the data of a `server.get_clients` response.
pub fn parse_clients_response(data: &Json) -> Result<Vec<ClientInfo>, ModelError> {
    if !data.is_object() {
        return Err(ModelError::UnexpectedResponse("get_clients data is not an object"));
    }
    let response = ClientsResponse::deserialize(data)?;
    Ok(response.clients)
}
