// crates/iec61850-rs-scl/src/templates.rs

//! Index of the `DataTypeTemplates` section.

use crate::error::{Diagnostics, WarningKind};
use crate::xml::Element;
use std::collections::BTreeMap;
use std::fmt;

/// The four kinds of type template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemplateKind {
    NodeType,
    ObjectType,
    AttributeType,
    EnumType,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::NodeType,
        TemplateKind::ObjectType,
        TemplateKind::AttributeType,
        TemplateKind::EnumType,
    ];

    /// SCL tag name of the template element.
    pub fn tag(self) -> &'static str {
        match self {
            TemplateKind::NodeType => "LNodeType",
            TemplateKind::ObjectType => "DOType",
            TemplateKind::AttributeType => "DAType",
            TemplateKind::EnumType => "EnumType",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Read-only lookup from (kind, id) to the template element.
///
/// Borrows the document; built once per parse and never shared between
/// documents.
#[derive(Debug, Default)]
pub(crate) struct TemplateIndex<'a> {
    entries: BTreeMap<TemplateKind, BTreeMap<&'a str, &'a Element>>,
}

impl<'a> TemplateIndex<'a> {
    /// Indexes every template under `templates`. A repeated id is reported
    /// and the first definition kept.
    pub fn build(templates: &'a Element, diagnostics: &mut Diagnostics) -> Self {
        let mut entries = BTreeMap::new();
        for kind in TemplateKind::ALL {
            let by_id: &mut BTreeMap<&'a str, &'a Element> = entries.entry(kind).or_default();
            for element in templates.find_all(kind.tag()) {
                let Some(id) = element.attr_non_empty("id") else {
                    diagnostics.warn(
                        WarningKind::MissingAttribute,
                        "DataTypeTemplates",
                        format!("{} without an id", kind),
                    );
                    continue;
                };
                if by_id.contains_key(id) {
                    diagnostics.warn(
                        WarningKind::DuplicateName,
                        "DataTypeTemplates",
                        format!("{} '{}' is defined more than once; keeping the first", kind, id),
                    );
                    continue;
                }
                by_id.insert(id, element);
            }
        }
        let index = Self { entries };
        log::debug!("Indexed {} type templates", index.len());
        index
    }

    pub fn get(&self, kind: TemplateKind, id: &str) -> Option<&'a Element> {
        self.entries.get(&kind)?.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Ordinal of `name` in enumeration `enum_id`.
    pub fn enum_ordinal(&self, enum_id: &str, name: &str) -> Option<i64> {
        let enum_type = self.get(TemplateKind::EnumType, enum_id)?;
        enum_type
            .find_all("EnumVal")
            .into_iter()
            .find(|v| v.text() == name.trim())
            .and_then(|v| v.attr("ord"))
            .and_then(|ord| ord.trim().parse().ok())
    }
}
