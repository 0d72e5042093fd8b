// crates/iec61850-rs-scl/src/overlay.rs

//! Applies instance data (`DOI`/`SDI`/`DAI`/`Val`) to an expanded node.
//!
//! The structural tree is the only source of shape: instance elements are
//! matched by name against it and never create nodes.

use crate::error::{Diagnostics, WarningKind};
use crate::templates::TemplateIndex;
use crate::xml::Element;
use iec61850_rs::{
    BasicType, CoercionError, DataAttribute, DataObject, LogicalNode, ObjectChild, Value,
};

/// Coerces a literal into the attribute's basic type. Enumerations also
/// accept the symbolic names of their `EnumType`.
pub(crate) fn coerce_literal(
    attribute: &DataAttribute,
    literal: &str,
    index: &TemplateIndex<'_>,
) -> Result<Value, CoercionError> {
    match Value::coerce(literal, attribute.basic_type) {
        Err(e) if attribute.basic_type == BasicType::Enum => attribute
            .type_ref
            .as_deref()
            .and_then(|enum_id| index.enum_ordinal(enum_id, literal))
            .map(Value::Int)
            .ok_or(e),
        other => other,
    }
}

/// Stores a literal as the attribute's value. A literal that does not
/// coerce is reported and stored as text.
pub(crate) fn assign_literal(
    attribute: &mut DataAttribute,
    literal: &str,
    index: &TemplateIndex<'_>,
    diagnostics: &mut Diagnostics,
    context: &str,
) {
    let value = coerce_literal(attribute, literal, index).unwrap_or_else(|e| {
        diagnostics.warn(
            WarningKind::CoercionFailed,
            context,
            format!("{} on '{}'; keeping the text", e, attribute.name),
        );
        Value::Text(literal.to_string())
    });
    if let Err(e) = attribute.set_value(value) {
        diagnostics.warn(WarningKind::CoercionFailed, context, e.to_string());
    }
}

pub(crate) struct Overlay<'a, 'b> {
    index: &'b TemplateIndex<'a>,
    diagnostics: &'b mut Diagnostics,
}

impl<'a, 'b> Overlay<'a, 'b> {
    pub fn new(index: &'b TemplateIndex<'a>, diagnostics: &'b mut Diagnostics) -> Self {
        Self { index, diagnostics }
    }

    fn unmatched(&mut self, context: &str, element: &Element, name: &str) {
        self.diagnostics.warn(
            WarningKind::UnmatchedInstance,
            context,
            format!("{} '{}' matches nothing in the type; skipped", element.name, name),
        );
    }

    fn name_of<'e>(&mut self, element: &'e Element, context: &str) -> Option<&'e str> {
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

    /// Applies every `DOI` of a logical node element.
    pub fn apply_node(&mut self, ln: &Element, node: &mut LogicalNode, context: &str) {
        if let Some(desc) = ln.attr_non_empty("desc") {
            node.description = Some(desc.to_string());
        }
        for doi in ln.find_all("DOI") {
            let Some(name) = self.name_of(doi, context) else {
                continue;
            };
            match node.data_object_mut(name) {
                Some(object) => {
                    let path = format!("{}.{}", context, name);
                    self.apply_object(doi, object, &path);
                }
                None => self.unmatched(context, doi, name),
            }
        }
    }

    /// Applies a `DOI` or object-level `SDI` to a data object.
    pub fn apply_object(&mut self, instance: &Element, object: &mut DataObject, context: &str) {
        if let Some(desc) = instance.attr_non_empty("desc") {
            object.description = Some(desc.to_string());
        }
        for child in &instance.children {
            let is_dai = match child.name.as_str() {
                "DAI" => true,
                "SDI" => false,
                _ => continue,
            };
            let Some(name) = self.name_of(child, context) else {
                continue;
            };
            let path = format!("{}.{}", context, name);
            match (object.child_mut(name), is_dai) {
                (Some(ObjectChild::Attribute(attribute)), true) => {
                    self.apply_attribute(child, attribute, &path)
                }
                (Some(ObjectChild::Attribute(attribute)), false) => {
                    self.apply_structured(child, attribute, &path)
                }
                (Some(ObjectChild::Object(sub)), false) => self.apply_object(child, sub, &path),
                (Some(ObjectChild::Object(_)), true) | (None, _) => {
                    self.unmatched(context, child, name)
                }
            }
        }
    }

    /// Applies an attribute-level `SDI` to a structured attribute.
    fn apply_structured(&mut self, instance: &Element, attribute: &mut DataAttribute, context: &str) {
        for child in &instance.children {
            let is_dai = match child.name.as_str() {
                "DAI" => true,
                "SDI" => false,
                _ => continue,
            };
            let Some(name) = self.name_of(child, context) else {
                continue;
            };
            let path = format!("{}.{}", context, name);
            match attribute.child_mut(name) {
                Some(sub) if is_dai => self.apply_attribute(child, sub, &path),
                Some(sub) => self.apply_structured(child, sub, &path),
                None => self.unmatched(context, child, name),
            }
        }
    }

    /// Applies a `DAI`: its `Val` becomes the attribute's value.
    fn apply_attribute(&mut self, instance: &Element, attribute: &mut DataAttribute, context: &str) {
        let Some(val) = instance.find("Val") else {
            return;
        };
        if attribute.is_structured() {
            self.diagnostics.warn(
                WarningKind::CoercionFailed,
                context,
                "Val on a structured attribute ignored",
            );
            return;
        }
        assign_literal(attribute, val.text(), self.index, self.diagnostics, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::xml::parse_document;
    use iec61850_rs::DbPos;

    const TEMPLATES: &str = r#"
        <DataTypeTemplates>
            <LNodeType id="XCBR_T" lnClass="XCBR">
                <DO name="Pos" type="DPC_T"/>
                <DO name="Beh" type="ENS_T"/>
            </LNodeType>
            <DOType id="DPC_T" cdc="DPC">
                <DA name="stVal" bType="Dbpos" fc="ST"/>
                <DA name="ctlNum" bType="INT8U" fc="ST"/>
                <DA name="origin" bType="Struct" type="Originator" fc="ST"/>
                <SDO name="sub" type="ENS_T"/>
            </DOType>
            <DOType id="ENS_T" cdc="ENS">
                <DA name="stVal" bType="Enum" type="BehKind" fc="ST"/>
            </DOType>
            <DAType id="Originator">
                <BDA name="orCat" bType="Enum" type="OrCat"/>
                <BDA name="orIdent" bType="Octet64"/>
            </DAType>
            <EnumType id="BehKind"><EnumVal ord="1">on</EnumVal><EnumVal ord="3">test</EnumVal></EnumType>
            <EnumType id="OrCat"><EnumVal ord="2">station-control</EnumVal></EnumType>
        </DataTypeTemplates>"#;

    fn overlay(instance: &str) -> (LogicalNode, Vec<crate::ParseWarning>) {
        let root = parse_document(TEMPLATES).unwrap();
        let ln = parse_document(instance).unwrap();
        let mut diagnostics = Diagnostics::default();
        let index = TemplateIndex::build(&root, &mut diagnostics);
        let mut node = TreeBuilder::new(&index, &mut diagnostics)
            .expand_node_type("XCBR_T")
            .unwrap();
        Overlay::new(&index, &mut diagnostics).apply_node(&ln, &mut node, "IED1/PROT/XCBR1");
        (node, diagnostics.into_warnings())
    }

    #[test]
    fn test_dbpos_literal_decodes() {
        let (node, warnings) = overlay(
            r#"<LN lnClass="XCBR" inst="1"><DOI name="Pos" desc="Breaker"><DAI name="stVal"><Val>2</Val></DAI></DOI></LN>"#,
        );
        let pos = node.data_object("Pos").unwrap();
        assert_eq!(pos.description.as_deref(), Some("Breaker"));
        let st_val = pos.attribute("stVal").unwrap();
        assert_eq!(st_val.value().and_then(Value::as_dbpos), Some(DbPos::On));
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_nested_instances() {
        let (node, _) = overlay(
            r#"<LN><DOI name="Pos">
                 <SDI name="origin">
                   <DAI name="orCat"><Val>station-control</Val></DAI>
                   <DAI name="orIdent"><Val>HMI</Val></DAI>
                 </SDI>
                 <SDI name="sub"><DAI name="stVal"><Val>test</Val></DAI></SDI>
               </DOI></LN>"#,
        );
        let pos = node.data_object("Pos").unwrap();
        let origin = pos.attribute("origin").unwrap();
        assert_eq!(origin.child("orCat").unwrap().value(), Some(&Value::Int(2)));
        assert_eq!(
            origin.child("orIdent").unwrap().value(),
            Some(&Value::Text("HMI".to_string()))
        );
        let sub = pos.object("sub").unwrap();
        assert_eq!(sub.attribute("stVal").unwrap().value(), Some(&Value::Int(3)));
    }

    #[test]
    fn test_coercion_failure_keeps_text() {
        let (node, warnings) = overlay(
            r#"<LN><DOI name="Pos"><DAI name="ctlNum"><Val>lots</Val></DAI></DOI></LN>"#,
        );
        let ctl_num = node.data_object("Pos").unwrap().attribute("ctlNum").unwrap();
        assert_eq!(ctl_num.value(), Some(&Value::Text("lots".to_string())));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::CoercionFailed);
        assert_eq!(warnings[0].context, "IED1/PROT/XCBR1.Pos.ctlNum");
    }

    #[test]
    fn test_unmatched_instances_are_skipped() {
        let (node, warnings) = overlay(
            r#"<LN>
                 <DOI name="Nope"><DAI name="stVal"><Val>1</Val></DAI></DOI>
                 <DOI name="Pos">
                   <DAI name="missing"><Val>1</Val></DAI>
                   <DAI name="sub"><Val>1</Val></DAI>
                   <SDI name="origin"><DAI name="ghost"><Val>1</Val></DAI></SDI>
                   <DAI name="origin"><Val>1</Val></DAI>
                 </DOI>
               </LN>"#,
        );
        assert!(node.data_object("Nope").is_none());
        let pos = node.data_object("Pos").unwrap();
        assert!(pos.child("missing").is_none());
        assert!(pos.attribute("origin").unwrap().child("ghost").is_none());
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            [
                WarningKind::UnmatchedInstance,
                WarningKind::UnmatchedInstance,
                WarningKind::UnmatchedInstance,
                WarningKind::UnmatchedInstance,
                WarningKind::CoercionFailed,
            ]
        );
    }
}
