// crates/iec61850-rs-scl/src/parser.rs

use crate::builder::TreeBuilder;
use crate::controls::ControlExtractor;
use crate::error::{Diagnostics, ParseWarning, SclError, WarningKind};
use crate::overlay::Overlay;
use crate::templates::TemplateIndex;
use crate::xml::{Element, parse_document};
use iec61850_rs::{AccessPoint, Device, LogicalDevice, LogicalNode};
use log::{debug, info};
use std::path::Path;

/// Which value sources are applied while building a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueMode {
    /// Template defaults, then the instance data of the document.
    #[default]
    Configured,
    /// Template defaults only; `DOI` elements are ignored.
    Template,
}

/// The outcome of a parse that did not fail outright.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseReport {
    /// Devices in document order.
    pub devices: Vec<Device>,
    /// Every recoverable problem, in the order it was found.
    pub warnings: Vec<ParseWarning>,
}

impl ParseReport {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Template branches abandoned because they referenced themselves.
    pub fn cycles(&self) -> impl Iterator<Item = &ParseWarning> {
        self.warnings
            .iter()
            .filter(|w| w.kind == WarningKind::TemplateCycle)
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Address of every leaf attribute across all devices.
    pub fn references(&self) -> Vec<String> {
        self.devices.iter().flat_map(Device::leaf_references).collect()
    }
}

/// Parses an SCL document (`.scd`/`.cid`) and applies its instance data.
///
/// This is the normal way to load the configuration a device runs with.
///
/// # Errors
/// Returns an `SclError` if the XML is not well-formed or the `SCL` root
/// or `DataTypeTemplates` section is missing. Everything else is reported
/// as a warning in the returned `ParseReport`.
pub fn load_scl_from_str(xml_content: &str) -> Result<ParseReport, SclError> {
    load_from_str_internal(xml_content, ValueMode::Configured)
}

/// Parses an SCL document using only the values declared in its type
/// templates, ignoring instance data. Suited to `.icd` capability files.
///
/// # Errors
/// Same as [`load_scl_from_str`].
pub fn load_scl_template_defaults_from_str(xml_content: &str) -> Result<ParseReport, SclError> {
    load_from_str_internal(xml_content, ValueMode::Template)
}

/// Reads and parses an SCL file.
///
/// # Errors
/// Returns `SclError::Io` if the file cannot be read, otherwise the same
/// errors as [`load_scl_from_str`].
pub fn load_scl_from_path(path: impl AsRef<Path>, mode: ValueMode) -> Result<ParseReport, SclError> {
    let path = path.as_ref();
    let xml_content = std::fs::read_to_string(path)?;
    info!("Loading SCL file {}", path.display());
    load_from_str_internal(&xml_content, mode)
}

fn load_from_str_internal(xml_content: &str, mode: ValueMode) -> Result<ParseReport, SclError> {
    // 1. Build the element tree. Any syntax error is fatal.
    let root = parse_document(xml_content)?;
    if root.name != "SCL" {
        return Err(SclError::MissingElement { element: "SCL" });
    }
    let templates = root
        .find("DataTypeTemplates")
        .ok_or(SclError::MissingElement {
            element: "DataTypeTemplates",
        })?;

    // 2. Index the templates once; the index is read-only from here on.
    let mut diagnostics = Diagnostics::default();
    let index = TemplateIndex::build(templates, &mut diagnostics);

    // 3. Build each device.
    let mut devices: Vec<Device> = Vec::new();
    for ied in root.find_all("IED") {
        let Some(name) = ied.attr_non_empty("name") else {
            diagnostics.warn(WarningKind::MissingAttribute, "SCL", "IED without a name skipped");
            continue;
        };
        if devices.iter().any(|d| d.name == name) {
            diagnostics.warn(
                WarningKind::DuplicateName,
                "SCL",
                format!("IED '{}' is defined more than once; keeping the first", name),
            );
            continue;
        }
        let device = DeviceLoader {
            index: &index,
            diagnostics: &mut diagnostics,
            mode,
        }
        .load(ied, name);
        info!(
            "Loaded IED {} with {} logical devices",
            device.name,
            device.logical_devices().count()
        );
        devices.push(device);
    }

    Ok(ParseReport {
        devices,
        warnings: diagnostics.into_warnings(),
    })
}

/// Builds one device from its `IED` element.
struct DeviceLoader<'a, 'b> {
    index: &'b TemplateIndex<'a>,
    diagnostics: &'b mut Diagnostics,
    mode: ValueMode,
}

impl<'a, 'b> DeviceLoader<'a, 'b> {
    fn load(&mut self, ied: &'a Element, name: &str) -> Device {
        let mut device = Device::new(name);
        device.manufacturer = ied.attr("manufacturer").unwrap_or_default().to_string();
        device.model = ied.attr("type").unwrap_or_default().to_string();
        device.revision = ied.attr("configVersion").unwrap_or_default().to_string();
        device.description = ied.attr_non_empty("desc").map(str::to_string);

        for ap in ied.find_all("AccessPoint") {
            let Some(ap_name) = ap.attr_non_empty("name") else {
                self.diagnostics
                    .warn(WarningKind::MissingAttribute, name, "AccessPoint without a name skipped");
                continue;
            };
            let mut access_point = AccessPoint::new(ap_name);
            access_point.description = ap.attr_non_empty("desc").map(str::to_string);
            // An access point without a server is a client-only port.
            if let Some(server) = ap.find("Server") {
                for ld in server.find_all("LDevice") {
                    let Some(inst) = ld.attr_non_empty("inst") else {
                        self.diagnostics
                            .warn(WarningKind::MissingAttribute, name, "LDevice without inst skipped");
                        continue;
                    };
                    let context = format!("{}/{}", name, inst);
                    let logical_device = self.load_logical_device(ld, inst, &context);
                    if let Err(e) = access_point.add_logical_device(logical_device) {
                        self.diagnostics
                            .warn(WarningKind::DuplicateName, name, e.to_string());
                    }
                }
            }
            if let Err(e) = device.add_access_point(access_point) {
                self.diagnostics.warn(WarningKind::DuplicateName, name, e.to_string());
            }
        }
        device
    }

    fn load_logical_device(&mut self, ld: &'a Element, inst: &str, context: &str) -> LogicalDevice {
        let mut logical_device = LogicalDevice::new(inst);
        logical_device.description = ld.attr_non_empty("desc").map(str::to_string);

        let nodes = ld
            .find("LN0")
            .into_iter()
            .map(|ln0| (ln0, true))
            .chain(ld.find_all("LN").into_iter().map(|ln| (ln, false)));
        for (element, is_ln0) in nodes {
            let Some(node) = self.load_logical_node(element, is_ln0, context) else {
                continue;
            };
            if let Err(e) = logical_device.add_logical_node(node) {
                self.diagnostics.warn(WarningKind::DuplicateName, context, e.to_string());
            }
        }
        logical_device
    }

    fn load_logical_node(&mut self, ln: &'a Element, is_ln0: bool, context: &str) -> Option<LogicalNode> {
        let ln_type = ln.attr_non_empty("lnType");
        let expanded = match ln_type {
            Some(id) => {
                let result = TreeBuilder::new(self.index, self.diagnostics).expand_node_type(id);
                match result {
                    Ok(node) => Some(node),
                    Err(e) => {
                        self.diagnostics.warn(
                            WarningKind::MissingTemplate,
                            context,
                            format!("{} lnType: {}; node kept without data objects", ln.name, e),
                        );
                        None
                    }
                }
            }
            None => {
                self.diagnostics.warn(
                    WarningKind::MissingAttribute,
                    context,
                    format!("{} without lnType kept without data objects", ln.name),
                );
                None
            }
        };
        let mut node = expanded.unwrap_or_default();

        if is_ln0 {
            node.prefix = String::new();
            node.class = "LLN0".to_string();
            node.inst = String::new();
        } else {
            // The instance's lnClass wins over the one declared by the type.
            if let Some(class) = ln.attr_non_empty("lnClass") {
                node.class = class.to_string();
            }
            if node.class.is_empty() {
                self.diagnostics
                    .warn(WarningKind::MissingAttribute, context, "LN without lnClass skipped");
                return None;
            }
            node.prefix = ln.attr("prefix").unwrap_or_default().to_string();
            node.inst = ln.attr("inst").unwrap_or_default().to_string();
        }
        node.type_ref = ln_type.unwrap_or_default().to_string();

        let node_context = format!("{}/{}", context, node.name());
        if self.mode == ValueMode::Configured {
            Overlay::new(self.index, self.diagnostics).apply_node(ln, &mut node, &node_context);
        } else if let Some(desc) = ln.attr_non_empty("desc") {
            node.description = Some(desc.to_string());
        }
        ControlExtractor::new(self.diagnostics).extract(ln, &mut node, &node_context);

        debug!(
            "Built {} with {} data objects",
            node_context,
            node.data_objects().count()
        );
        Some(node)
    }
}
