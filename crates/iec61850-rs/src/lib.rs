#![cfg_attr(not(feature = "std"), no_std)]

//! In-memory IEC 61850 object model: devices, logical nodes, data objects
//! and typed data attributes, addressable by object reference.

// 'alloc' backs every owned collection in the tree
extern crate alloc;

// --- Foundation Modules ---
pub mod error;
pub mod types;
pub mod value;

// --- Object Model ---
pub mod model;
pub mod reference;

// --- Construction & Export ---
pub mod engine;
pub mod fixture;

// --- Top-level Exports ---
pub use error::ModelError;
pub use types::{
    BasicType, ControlModel, DbPos, FunctionalConstraint, Quality, Timestamp, TriggerOptions,
    Validity, ValueKind,
};
pub use value::{CoercionError, Value};
pub use model::{
    AccessPoint, AttributeContent, ControlOptions, DataAttribute, DataObject, DataSet, Device,
    Fcda, GseControl, LogControl, LogicalDevice, LogicalNode, ObjectChild, OptionValue,
    ReportControl, SmvControl, UNKNOWN_CDC,
};
pub use reference::{Address, NodeRef};
pub use engine::{model_document, AttributeSnapshot, ClientInfo, EngineRequest, ServerConfig};
pub use fixture::default_device;
