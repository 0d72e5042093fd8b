// crates/iec61850-rs-scl/src/error.rs

use log::warn;
use quick_xml::Error as XmlError;
use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use std::fmt;
use std::io;

/// Errors that abort the parse of a whole document.
#[derive(Debug)]
pub enum SclError {
    /// The document is not well-formed XML.
    XmlParsing(XmlError),

    /// An attribute could not be read (e.g., a duplicate or unquoted attribute).
    XmlAttribute(AttrError),

    /// An entity or character reference could not be expanded.
    XmlEscape(EscapeError),

    /// The file could not be read.
    Io(io::Error),

    /// A required top-level element was missing (e.g., DataTypeTemplates).
    MissingElement { element: &'static str },

    /// The element structure is broken (unclosed tags, a second root, no root).
    MalformedDocument(String),
}

impl From<XmlError> for SclError {
    fn from(e: XmlError) -> Self {
        SclError::XmlParsing(e)
    }
}

impl From<AttrError> for SclError {
    fn from(e: AttrError) -> Self {
        SclError::XmlAttribute(e)
    }
}

impl From<EscapeError> for SclError {
    fn from(e: EscapeError) -> Self {
        SclError::XmlEscape(e)
    }
}

impl From<io::Error> for SclError {
    fn from(e: io::Error) -> Self {
        SclError::Io(e)
    }
}

impl fmt::Display for SclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SclError::XmlParsing(e) => write!(f, "XML parsing error: {}", e),
            SclError::XmlAttribute(e) => write!(f, "XML attribute error: {}", e),
            SclError::XmlEscape(e) => write!(f, "XML escape error: {}", e),
            SclError::Io(e) => write!(f, "I/O error: {}", e),
            SclError::MissingElement { element } => {
                write!(f, "Missing required XML element: {}", element)
            }
            SclError::MalformedDocument(msg) => write!(f, "Malformed document: {}", msg),
        }
    }
}

impl std::error::Error for SclError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SclError::XmlParsing(e) => Some(e),
            SclError::XmlAttribute(e) => Some(e),
            SclError::XmlEscape(e) => Some(e),
            SclError::Io(e) => Some(e),
            _ => None,
        }
    }
}

// --- Recoverable Problems ---

/// Category of an element-local problem. None of these stop the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A referenced type template id does not exist.
    MissingTemplate,
    /// A sibling with the same name was already present; the first is kept.
    DuplicateName,
    /// A literal did not fit the attribute's basic type; kept as text.
    CoercionFailed,
    /// An instance element names nothing in the structural tree.
    UnmatchedInstance,
    /// A control block names a data set absent from its logical node.
    DanglingDataSet,
    /// A numeric control-block field did not parse; defaulted to zero.
    MalformedNumber,
    /// A required attribute was absent; the element was skipped.
    MissingAttribute,
    /// A `bType` outside the known set.
    UnknownBasicType,
    /// An `fc` outside the known set.
    UnknownFunctionalConstraint,
    /// A template references itself, directly or indirectly.
    TemplateCycle,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningKind::MissingTemplate => "missing template",
            WarningKind::DuplicateName => "duplicate name",
            WarningKind::CoercionFailed => "coercion failed",
            WarningKind::UnmatchedInstance => "unmatched instance",
            WarningKind::DanglingDataSet => "dangling data set",
            WarningKind::MalformedNumber => "malformed number",
            WarningKind::MissingAttribute => "missing attribute",
            WarningKind::UnknownBasicType => "unknown basic type",
            WarningKind::UnknownFunctionalConstraint => "unknown functional constraint",
            WarningKind::TemplateCycle => "template cycle",
        };
        f.write_str(s)
    }
}

/// A recoverable problem and where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub kind: WarningKind,
    /// Path of the parent element (device, logical node, template id, ...).
    pub context: String,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.context, self.message)
    }
}

/// Collects warnings while a document is processed.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    warnings: Vec<ParseWarning>,
}

impl Diagnostics {
    /// Logs and records a warning.
    pub(crate) fn warn(&mut self, kind: WarningKind, context: &str, message: impl Into<String>) {
        let warning = ParseWarning {
            kind,
            context: context.to_string(),
            message: message.into(),
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub(crate) fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }
}
