// crates/iec61850-rs-scl/src/xml.rs

//! A small owned element tree with namespace-agnostic lookups.
//!
//! SCL files are written both with a default namespace (`<SCL xmlns=...>`)
//! and with explicit prefixes (`<scl:SCL>`). Lookups match on the local
//! name so the rest of the parser never sees the difference.

use crate::error::SclError;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Element {
    /// Local tag name, without prefix.
    pub name: String,
    pub prefix: Option<String>,
    attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    text: String,
}

impl Element {
    /// Value of an unprefixed attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of an attribute, treating an empty string as absent.
    pub fn attr_non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Concatenated character data directly inside this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First child with local name `name`. An unprefixed child wins over
    /// a prefixed one; otherwise document order decides.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.prefix.is_none() && c.name == name)
            .or_else(|| self.children.iter().find(|c| c.name == name))
    }

    /// All children with local name `name`, in document order.
    ///
    /// Unprefixed matches are returned when there are any; otherwise the
    /// prefixed ones.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let exact: Vec<&Element> = self
            .children
            .iter()
            .filter(|c| c.prefix.is_none() && c.name == name)
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        self.children.iter().filter(|c| c.name == name).collect()
    }

    /// Child with local name `name` whose `id` attribute equals `id`.
    pub fn find_by_id(&self, name: &str, id: &str) -> Option<&Element> {
        self.find_all(name)
            .into_iter()
            .find(|c| c.attr("id") == Some(id))
    }
}

// Frees deep trees without one stack frame per nesting level.
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = core::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

fn split_name(raw: &[u8]) -> (String, Option<String>) {
    let raw = String::from_utf8_lossy(raw);
    match raw.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (raw.into_owned(), None),
    }
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, SclError> {
    let (name, prefix) = split_name(start.name().as_ref());
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (local, _) = split_name(key);
        let value = unescape(&String::from_utf8_lossy(&attr.value))?.into_owned();
        attributes.push((local, value));
    }
    Ok(Element {
        name,
        prefix,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Hands a finished element to its parent, or makes it the root.
fn attach(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), SclError> {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_string();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(SclError::MalformedDocument(format!(
                "second root element <{}>",
                element.name
            )));
        }
    }
    Ok(())
}

/// Parses a document into its root element.
///
/// Character data is accumulated per element and trimmed when the element
/// closes, so entity references inside a value keep their surrounding
/// spaces.
///
/// # Errors
/// Returns an `SclError` when the XML is not well-formed or contains no
/// root element.
pub(crate) fn parse_document(xml: &str) -> Result<Element, SclError> {
    let mut reader = Reader::from_str(xml);

    // Open elements, innermost last. The reader checks that end tags
    // match their start tags.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(open_element(&e)?),
            Event::Empty(e) => {
                let element = open_element(&e)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(e) => {
                let Some(element) = stack.pop() else {
                    return Err(SclError::MalformedDocument(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                };
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                if let Some(element) = stack.last_mut() {
                    let raw = t.decode().map_err(quick_xml::Error::from)?;
                    element.text.push_str(&unescape(&raw)?);
                }
            }
            Event::CData(c) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(element) = stack.last_mut() {
                    let name = r.decode().map_err(quick_xml::Error::from)?;
                    element.text.push_str(&unescape(&format!("&{};", name))?);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(SclError::MalformedDocument(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| SclError::MalformedDocument("document has no root element".to_string()))
}
