// crates/iec61850-rs-scl/src/builder.rs

//! Expands type templates into the structural tree.
//!
//! Node types expand into data objects, object types into sub-objects and
//! attributes, and attribute types into sub-attributes. The functional
//! constraint and trigger options declared on a `DA` flow down to every
//! descendant that does not declare its own.

use crate::error::{Diagnostics, WarningKind};
use crate::overlay::assign_literal;
use crate::templates::{TemplateIndex, TemplateKind};
use crate::xml::Element;
use iec61850_rs::{
    BasicType, DataAttribute, DataObject, FunctionalConstraint, LogicalNode, TriggerOptions,
    UNKNOWN_CDC,
};
use log::debug;
use std::fmt;

/// Why a template could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExpansionError {
    NotFound { kind: TemplateKind, id: String },
    /// The template is already being expanded further up. `chain` lists
    /// the active templates from the outermost one to the repeated one.
    Cycle { chain: Vec<String> },
}

impl fmt::Display for ExpansionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionError::NotFound { kind, id } => write!(f, "{} '{}' not found", kind, id),
            ExpansionError::Cycle { chain } => {
                write!(f, "template cycle: {}", chain.join(" -> "))
            }
        }
    }
}

/// Inherited from the enclosing `DA` while expanding attribute types.
#[derive(Debug, Clone, Copy, Default)]
struct Inherited {
    fc: FunctionalConstraint,
    trigger_options: TriggerOptions,
}

pub(crate) struct TreeBuilder<'a, 'b> {
    index: &'b TemplateIndex<'a>,
    diagnostics: &'b mut Diagnostics,
    /// Templates currently being expanded, outermost first.
    active: Vec<(TemplateKind, &'a str)>,
}

impl<'a, 'b> TreeBuilder<'a, 'b> {
    pub fn new(index: &'b TemplateIndex<'a>, diagnostics: &'b mut Diagnostics) -> Self {
        Self {
            index,
            diagnostics,
            active: Vec::new(),
        }
    }

    /// Looks up a template and marks it active.
    fn enter(&mut self, kind: TemplateKind, id: &'a str) -> Result<&'a Element, ExpansionError> {
        if self.active.contains(&(kind, id)) {
            let chain = self
                .active
                .iter()
                .chain(std::iter::once(&(kind, id)))
                .map(|(k, i)| format!("{} '{}'", k, i))
                .collect();
            return Err(ExpansionError::Cycle { chain });
        }
        let template = self.index.get(kind, id).ok_or_else(|| ExpansionError::NotFound {
            kind,
            id: id.to_string(),
        })?;
        self.active.push((kind, id));
        Ok(template)
    }

    fn exit(&mut self) {
        self.active.pop();
    }

    fn warn_expansion(&mut self, context: &str, what: &str, err: &ExpansionError) {
        let kind = match err {
            ExpansionError::NotFound { .. } => WarningKind::MissingTemplate,
            ExpansionError::Cycle { .. } => WarningKind::TemplateCycle,
        };
        self.diagnostics
            .warn(kind, context, format!("{} skipped: {}", what, err));
    }

    // --- Node Types ---

    /// Expands an `LNodeType` into a logical node with empty prefix and
    /// instance. The class comes from the template's `lnClass`.
    pub fn expand_node_type(&mut self, id: &'a str) -> Result<LogicalNode, ExpansionError> {
        let template = self.enter(TemplateKind::NodeType, id)?;
        let context = format!("LNodeType '{}'", id);
        let mut node = LogicalNode::new("", template.attr("lnClass").unwrap_or_default(), "");
        node.type_ref = id.to_string();

        for decl in template.find_all("DO") {
            let (Some(name), Some(type_id)) = (decl.attr_non_empty("name"), decl.attr_non_empty("type"))
            else {
                self.diagnostics.warn(
                    WarningKind::MissingAttribute,
                    &context,
                    "DO without name or type skipped",
                );
                continue;
            };
            match self.expand_object_type(name, type_id) {
                Ok(object) => {
                    if let Err(e) = node.add_data_object(object) {
                        self.diagnostics.warn(WarningKind::DuplicateName, &context, e.to_string());
                    }
                }
                Err(e) => self.warn_expansion(&context, &format!("DO '{}'", name), &e),
            }
        }

        self.exit();
        debug!("Expanded {} into {} data objects", context, node.data_objects().count());
        Ok(node)
    }

    // --- Object Types ---

    /// Expands a `DOType` into a data object named `name`.
    pub fn expand_object_type(&mut self, name: &str, id: &'a str) -> Result<DataObject, ExpansionError> {
        let template = self.enter(TemplateKind::ObjectType, id)?;
        let context = format!("DOType '{}'", id);
        let cdc = template.attr_non_empty("cdc").unwrap_or(UNKNOWN_CDC);
        let mut object = DataObject::new(name, cdc);
        object.type_ref = Some(id.to_string());
        object.description = template.attr_non_empty("desc").map(str::to_string);

        for decl in &template.children {
            let result = match decl.name.as_str() {
                "SDO" => {
                    let (Some(sdo_name), Some(type_id)) =
                        (decl.attr_non_empty("name"), decl.attr_non_empty("type"))
                    else {
                        self.diagnostics.warn(
                            WarningKind::MissingAttribute,
                            &context,
                            "SDO without name or type skipped",
                        );
                        continue;
                    };
                    match self.expand_object_type(sdo_name, type_id) {
                        Ok(sdo) => object.add_object(sdo),
                        Err(e) => {
                            self.warn_expansion(&context, &format!("SDO '{}'", sdo_name), &e);
                            continue;
                        }
                    }
                }
                "DA" => match self.expand_attribute(decl, Inherited::default(), &context) {
                    Some(attribute) => object.add_attribute(attribute),
                    None => continue,
                },
                _ => continue,
            };
            if let Err(e) = result {
                self.diagnostics.warn(WarningKind::DuplicateName, &context, e.to_string());
            }
        }

        self.exit();
        Ok(object)
    }

    // --- Attribute Types ---

    /// Expands a `DAType` into a structured attribute named `name`.
    pub fn expand_attribute_type(
        &mut self,
        name: &str,
        id: &'a str,
        fc: FunctionalConstraint,
    ) -> Result<DataAttribute, ExpansionError> {
        self.expand_attribute_type_with(
            name,
            id,
            Inherited {
                fc,
                trigger_options: TriggerOptions::empty(),
            },
        )
    }

    fn expand_attribute_type_with(
        &mut self,
        name: &str,
        id: &'a str,
        inherited: Inherited,
    ) -> Result<DataAttribute, ExpansionError> {
        let template = self.enter(TemplateKind::AttributeType, id)?;
        let context = format!("DAType '{}'", id);
        let mut attribute = DataAttribute::structured(name, inherited.fc);
        attribute.trigger_options = inherited.trigger_options;
        attribute.type_ref = Some(id.to_string());

        for decl in template.find_all("BDA") {
            if let Some(child) = self.expand_attribute(decl, inherited, &context) {
                if let Err(e) = attribute.add_child(child) {
                    self.diagnostics.warn(WarningKind::DuplicateName, &context, e.to_string());
                }
            }
        }

        self.exit();
        Ok(attribute)
    }

    /// Builds the attribute declared by a `DA` or `BDA` element.
    ///
    /// Returns `None` when the declaration has no name or closes a cycle.
    fn expand_attribute(
        &mut self,
        decl: &'a Element,
        inherited: Inherited,
        context: &str,
    ) -> Option<DataAttribute> {
        let Some(name) = decl.attr_non_empty("name") else {
            self.diagnostics.warn(
                WarningKind::MissingAttribute,
                context,
                format!("{} without a name skipped", decl.name),
            );
            return None;
        };

        let fc = match decl.attr_non_empty("fc") {
            Some(raw) => FunctionalConstraint::from_scl(raw).unwrap_or_else(|| {
                self.diagnostics.warn(
                    WarningKind::UnknownFunctionalConstraint,
                    context,
                    format!("'{}' on '{}'; inheriting '{}'", raw, name, inherited.fc),
                );
                inherited.fc
            }),
            None => inherited.fc,
        };
        let own = Inherited {
            fc: fc.or_inherit(inherited.fc),
            trigger_options: inherited.trigger_options | trigger_options(decl),
        };

        let b_type = decl.attr("bType").unwrap_or_default();
        let type_ref = decl.attr_non_empty("type");
        let basic_type = BasicType::from_scl(b_type);

        let mut attribute = if basic_type.is_structured() {
            match type_ref {
                Some(id) => match self.expand_attribute_type_with(name, id, own) {
                    Ok(structured) => structured,
                    Err(e @ ExpansionError::Cycle { .. }) => {
                        self.warn_expansion(context, &format!("'{}'", name), &e);
                        return None;
                    }
                    Err(e) => {
                        self.diagnostics.warn(
                            WarningKind::MissingTemplate,
                            context,
                            format!("'{}' kept as an unknown leaf: {}", name, e),
                        );
                        unknown_leaf(name, own, Some(id))
                    }
                },
                None => {
                    self.diagnostics.warn(
                        WarningKind::MissingTemplate,
                        context,
                        format!("structured '{}' names no type; kept as an unknown leaf", name),
                    );
                    unknown_leaf(name, own, None)
                }
            }
        } else {
            if basic_type == BasicType::Unknown {
                self.diagnostics.warn(
                    WarningKind::UnknownBasicType,
                    context,
                    format!("'{}' has bType '{}'", name, b_type),
                );
            }
            let mut leaf = DataAttribute::scalar(name, basic_type, own.fc);
            leaf.trigger_options = own.trigger_options;
            leaf.type_ref = type_ref.map(str::to_string);
            leaf
        };

        // Template default value.
        if let Some(val) = decl.find("Val") {
            if attribute.is_structured() {
                self.diagnostics.warn(
                    WarningKind::CoercionFailed,
                    context,
                    format!("Val on structured '{}' ignored", name),
                );
            } else {
                assign_literal(&mut attribute, val.text(), self.index, self.diagnostics, context);
            }
        }
        Some(attribute)
    }
}

fn unknown_leaf(name: &str, inherited: Inherited, type_ref: Option<&str>) -> DataAttribute {
    let mut leaf = DataAttribute::scalar(name, BasicType::Unknown, inherited.fc);
    leaf.trigger_options = inherited.trigger_options;
    leaf.type_ref = type_ref.map(str::to_string);
    leaf
}

fn trigger_options(decl: &Element) -> TriggerOptions {
    let mut options = TriggerOptions::empty();
    for (attr, flag) in [
        ("dchg", TriggerOptions::DATA_CHANGE),
        ("qchg", TriggerOptions::QUALITY_CHANGE),
        ("dupd", TriggerOptions::DATA_UPDATE),
    ] {
        if decl.attr(attr).is_some_and(|v| v.trim() == "true") {
            options |= flag;
        }
    }
    options
}
