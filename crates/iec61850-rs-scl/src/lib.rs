// crates/iec61850-rs-scl/src/lib.rs

#![doc = "Builds the iec61850-rs object model from IEC 61850 SCL files."]
#![doc = ""]
#![doc = "Type templates (`DataTypeTemplates`) are indexed and expanded into the"]
#![doc = "structural tree of every `IED`, then the instance data of the document"]
#![doc = "is applied on top. Recoverable problems are collected as warnings."]
#![doc = ""]
#![doc = "It supports:"]
#![doc = "- `load_scl_from_str`: Template defaults plus instance values (`.scd`/`.cid`)."]
#![doc = "- `load_scl_template_defaults_from_str`: Template defaults only (`.icd`)."]
#![doc = "- `load_scl_from_path`: Either of the above, read from a file."]
#![doc = "- `ModelManager`: Devices of an application, kept by name."]

// --- Crate Modules ---

mod builder;
mod controls;
mod error;
mod manager;
mod overlay;
mod parser;
mod templates;
mod xml;

// --- Public API Re-exports ---

pub use error::{ParseWarning, SclError, WarningKind};
pub use manager::ModelManager;
pub use parser::{
    ParseReport, ValueMode, load_scl_from_path, load_scl_from_str,
    load_scl_template_defaults_from_str,
};
pub use templates::TemplateKind;
