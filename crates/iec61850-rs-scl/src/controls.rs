// crates/iec61850-rs-scl/src/controls.rs

//! Extracts data sets and control blocks from a logical node element.
//!
//! Data set members are copied as declared and never resolved against the
//! tree. A control block naming a data set missing from its node is kept
//! and reported.

use crate::error::{Diagnostics, WarningKind};
use crate::xml::Element;
use iec61850_rs::{
    ControlOptions, DataSet, Fcda, FunctionalConstraint, GseControl, LogControl, LogicalNode,
    ModelError, OptionValue, ReportControl, SmvControl, TriggerOptions,
};
use std::str::FromStr;

pub(crate) struct ControlExtractor<'d> {
    diagnostics: &'d mut Diagnostics,
}

fn is_true(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn option_value(value: &str) -> OptionValue {
    match value.trim() {
        "true" => OptionValue::Flag(true),
        "false" => OptionValue::Flag(false),
        other => OptionValue::Text(other.to_string()),
    }
}

/// Every attribute of an option element (`OptFields`, `SmvOpts`, ...).
fn options_from(element: Option<&Element>) -> ControlOptions {
    element
        .map(|e| {
            e.attributes()
                .map(|(k, v)| (k.to_string(), option_value(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// `TrgOps` flags. `gi` defaults to true when the element is present.
fn trigger_options_from(element: Option<&Element>) -> TriggerOptions {
    let Some(trg_ops) = element else {
        return TriggerOptions::empty();
    };
    let mut options = TriggerOptions::empty();
    for (attr, flag) in [
        ("dchg", TriggerOptions::DATA_CHANGE),
        ("qchg", TriggerOptions::QUALITY_CHANGE),
        ("dupd", TriggerOptions::DATA_UPDATE),
        ("period", TriggerOptions::INTEGRITY),
    ] {
        if trg_ops.attr(attr).is_some_and(is_true) {
            options |= flag;
        }
    }
    if trg_ops.attr("gi").is_none_or(is_true) {
        options |= TriggerOptions::GENERAL_INTERROGATION;
    }
    options
}

fn text(element: &Element, attr: &str) -> String {
    element.attr(attr).unwrap_or_default().to_string()
}

fn optional_text(element: &Element, attr: &str) -> Option<String> {
    element.attr_non_empty(attr).map(str::to_string)
}

impl<'d> ControlExtractor<'d> {
    pub fn new(diagnostics: &'d mut Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Parses a numeric attribute. Absent yields `default`; malformed text
    /// is reported and yields `default` too.
    fn number<T: FromStr + Copy>(
        &mut self,
        element: &Element,
        attr: &str,
        default: T,
        context: &str,
    ) -> T {
        match element.attr(attr) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                self.diagnostics.warn(
                    WarningKind::MalformedNumber,
                    context,
                    format!("{} '{}' = '{}' is not a number", element.name, attr, raw),
                );
                default
            }),
        }
    }

    fn duplicate(&mut self, context: &str, result: Result<(), ModelError>) {
        if let Err(e) = result {
            self.diagnostics.warn(WarningKind::DuplicateName, context, e.to_string());
        }
    }

    fn named<'e>(&mut self, element: &'e Element, context: &str) -> Option<&'e str> {
        let name = element.attr_non_empty("name");
        if name.is_none() {
            self.diagnostics.warn(
                WarningKind::MissingAttribute,
                context,
                format!("{} without a name skipped", element.name),
            );
        }
        name
    }

    /// Extracts every data set and control block of `ln` into `node`.
    pub fn extract(&mut self, ln: &Element, node: &mut LogicalNode, context: &str) {
        for element in ln.find_all("DataSet") {
            if let Some(data_set) = self.data_set(element, context) {
                let result = node.add_data_set(data_set);
                self.duplicate(context, result);
            }
        }
        for element in ln.find_all("ReportControl") {
            if let Some(control) = self.report_control(element, context) {
                self.check_data_set(node, "ReportControl", &control.name, control.data_set.as_deref(), context);
                let result = node.add_report_control(control);
                self.duplicate(context, result);
            }
        }
        for element in ln.find_all("GSEControl") {
            if let Some(control) = self.gse_control(element, context) {
                self.check_data_set(node, "GSEControl", &control.name, control.data_set.as_deref(), context);
                let result = node.add_gse_control(control);
                self.duplicate(context, result);
            }
        }
        for element in ln.find_all("SampledValueControl") {
            if let Some(control) = self.smv_control(element, context) {
                self.check_data_set(
                    node,
                    "SampledValueControl",
                    &control.name,
                    control.data_set.as_deref(),
                    context,
                );
                let result = node.add_smv_control(control);
                self.duplicate(context, result);
            }
        }
        for element in ln.find_all("LogControl") {
            if let Some(control) = self.log_control(element, context) {
                self.check_data_set(node, "LogControl", &control.name, control.data_set.as_deref(), context);
                let result = node.add_log_control(control);
                self.duplicate(context, result);
            }
        }
    }

    fn check_data_set(
        &mut self,
        node: &LogicalNode,
        kind: &str,
        name: &str,
        data_set: Option<&str>,
        context: &str,
    ) {
        if let Some(data_set) = data_set {
            if node.data_set(data_set).is_none() {
                self.diagnostics.warn(
                    WarningKind::DanglingDataSet,
                    context,
                    format!(
                        "{} '{}' names data set '{}' which this node does not define",
                        kind, name, data_set
                    ),
                );
            }
        }
    }

    fn data_set(&mut self, element: &Element, context: &str) -> Option<DataSet> {
        let name = self.named(element, context)?;
        let fcdas = element
            .find_all("FCDA")
            .into_iter()
            .map(|fcda| {
                let fc = match fcda.attr_non_empty("fc") {
                    None => FunctionalConstraint::Unspecified,
                    Some(raw) => FunctionalConstraint::from_scl(raw).unwrap_or_else(|| {
                        self.diagnostics.warn(
                            WarningKind::UnknownFunctionalConstraint,
                            context,
                            format!("FCDA in '{}' has fc '{}'", name, raw),
                        );
                        FunctionalConstraint::Unspecified
                    }),
                };
                Fcda {
                    ld_inst: text(fcda, "ldInst"),
                    prefix: text(fcda, "prefix"),
                    ln_class: text(fcda, "lnClass"),
                    ln_inst: text(fcda, "lnInst"),
                    do_name: text(fcda, "doName"),
                    da_name: text(fcda, "daName"),
                    fc,
                }
            })
            .collect();
        Some(DataSet {
            name: name.to_string(),
            description: optional_text(element, "desc"),
            fcdas,
        })
    }

    fn report_control(&mut self, element: &Element, context: &str) -> Option<ReportControl> {
        let name = self.named(element, context)?;
        Some(ReportControl {
            name: name.to_string(),
            description: optional_text(element, "desc"),
            data_set: optional_text(element, "datSet"),
            rpt_id: text(element, "rptID"),
            buffered: element.attr("buffered").is_some_and(is_true),
            buf_time: self.number(element, "bufTime", 0, context),
            intg_pd: self.number(element, "intgPd", 0, context),
            conf_rev: self.number(element, "confRev", 0, context),
            trigger_options: trigger_options_from(element.find("TrgOps")),
            max_clients: element
                .find("RptEnabled")
                .map(|rpt| self.number(rpt, "max", 1, context)),
            options: options_from(element.find("OptFields")),
        })
    }

    fn gse_control(&mut self, element: &Element, context: &str) -> Option<GseControl> {
        let name = self.named(element, context)?;
        let mut options = ControlOptions::new();
        for key in ["type", "fixedOffs", "securityEnable"] {
            if let Some(value) = element.attr(key) {
                options.insert(key.to_string(), option_value(value));
            }
        }
        Some(GseControl {
            name: name.to_string(),
            description: optional_text(element, "desc"),
            data_set: optional_text(element, "datSet"),
            app_id: text(element, "appID"),
            conf_rev: self.number(element, "confRev", 0, context),
            options,
        })
    }

    fn smv_control(&mut self, element: &Element, context: &str) -> Option<SmvControl> {
        let name = self.named(element, context)?;
        let mut options = options_from(element.find("SmvOpts"));
        if let Some(security) = element.attr("securityEnable") {
            options.insert("securityEnable".to_string(), option_value(security));
        }
        Some(SmvControl {
            name: name.to_string(),
            description: optional_text(element, "desc"),
            data_set: optional_text(element, "datSet"),
            smv_id: text(element, "smvID"),
            smp_rate: self.number(element, "smpRate", 0, context),
            nof_asdu: self.number(element, "nofASDU", 0, context),
            smp_mod: element
                .attr_non_empty("smpMod")
                .unwrap_or("SmpPerPeriod")
                .to_string(),
            multicast: element.attr("multicast").is_none_or(is_true),
            conf_rev: self.number(element, "confRev", 0, context),
            options,
        })
    }

    fn log_control(&mut self, element: &Element, context: &str) -> Option<LogControl> {
        let name = self.named(element, context)?;
        Some(LogControl {
            name: name.to_string(),
            description: optional_text(element, "desc"),
            data_set: optional_text(element, "datSet"),
            log_name: text(element, "logName"),
            log_ena: element.attr("logEna").is_none_or(is_true),
            reason_code: element.attr("reasonCode").is_none_or(is_true),
            buf_time: self.number(element, "bufTime", 0, context),
            intg_pd: self.number(element, "intgPd", 0, context),
            trigger_options: trigger_options_from(element.find("TrgOps")),
            options: ControlOptions::new(),
        })
    }
}
