// crates/iec61850-rs/src/model/control.rs

//! Data sets and the control blocks that publish them.

use crate::types::{FunctionalConstraint, TriggerOptions};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// One protocol option of a control block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Flag(bool),
    Text(String),
}

/// Flat option map of a control block. The key set differs per kind.
pub type ControlOptions = BTreeMap<String, OptionValue>;

// --- Data Sets ---

/// A member of a data set. Never resolved against the tree, since it may
/// point into another device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fcda {
    pub ld_inst: String,
    pub prefix: String,
    pub ln_class: String,
    pub ln_inst: String,
    pub do_name: String,
    pub da_name: String,
    pub fc: FunctionalConstraint,
}

impl Fcda {
    /// `LD/prefixClassInst.DO[.DA]`
    pub fn reference(&self) -> String {
        let mut reference = format!(
            "{}/{}{}{}.{}",
            self.ld_inst, self.prefix, self.ln_class, self.ln_inst, self.do_name
        );
        if !self.da_name.is_empty() {
            reference.push('.');
            reference.push_str(&self.da_name);
        }
        reference
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataSet {
    pub name: String,
    pub description: Option<String>,
    /// Members in document order.
    pub fcdas: Vec<Fcda>,
}

impl DataSet {
    pub fn fcda_references(&self) -> Vec<String> {
        self.fcdas.iter().map(Fcda::reference).collect()
    }
}

// --- Control Blocks ---

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportControl {
    pub name: String,
    pub description: Option<String>,
    pub data_set: Option<String>,
    pub rpt_id: String,
    pub buffered: bool,
    /// Milliseconds.
    pub buf_time: u32,
    /// Integrity period in milliseconds.
    pub intg_pd: u32,
    pub conf_rev: u32,
    pub trigger_options: TriggerOptions,
    /// `RptEnabled/@max`.
    pub max_clients: Option<u32>,
    /// `OptFields` flags.
    pub options: ControlOptions,
}

/// GOOSE publication control block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GseControl {
    pub name: String,
    pub description: Option<String>,
    pub data_set: Option<String>,
    pub app_id: String,
    pub conf_rev: u32,
    pub options: ControlOptions,
}

/// Sampled value stream control block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmvControl {
    pub name: String,
    pub description: Option<String>,
    pub data_set: Option<String>,
    pub smv_id: String,
    pub smp_rate: u32,
    pub nof_asdu: u32,
    pub smp_mod: String,
    pub multicast: bool,
    pub conf_rev: u32,
    /// `SmvOpts` flags.
    pub options: ControlOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogControl {
    pub name: String,
    pub description: Option<String>,
    pub data_set: Option<String>,
    pub log_name: String,
    pub log_ena: bool,
    pub reason_code: bool,
    pub buf_time: u32,
    pub intg_pd: u32,
    pub trigger_options: TriggerOptions,
    pub options: ControlOptions,
}
