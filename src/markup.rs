//! # Configuration Markup Parser
//!
//! The configuration documents (`gallery.yaml`, `images.yaml`, `image.yaml`)
//! are written in a deliberately small, YAML-looking markup. This module turns
//! such a document into a [`RawDocument`]. It is not a YAML parser: there are
//! no anchors, no flow collections, no quoting rules and only two levels of
//! nesting.
//!
//! ## Accepted shapes
//!
//! ```text
//! # comments and blank lines are skipped
//! name: Contoso
//! replicaLocations:
//!   - eastus
//!   - westeurope
//! repos:
//!   - url: https://example.com
//!     secret: token
//!   - url: https://example.org
//! network:
//!   name: vnet
//!   subnet: default
//! ```
//!
//! `name` is a scalar holding the rest of its line. `replicaLocations` is a
//! list of scalars. `repos` is a list of objects, where a repeated subkey
//! starts a new element. `network` is an object.
//!
//! The parser keeps a single piece of state while scanning: the most recently
//! opened key. Anything deeper than `document -> key -> list/object` fails
//! with [`Error::MalformedDocument`] instead of being truncated.

use std::fmt;

use crate::error::{Error, Result};

/// Name used in diagnostics when text is parsed without a file behind it.
const INLINE_SOURCE: &str = "<inline>";

/// One element of a list value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// `- value`
    Scalar(String),
    /// Consecutive `- key: value` / indented `key: value` lines.
    Object(Vec<(String, String)>),
}

/// The value bound to a top-level key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<Element>),
    Object(Vec<(String, String)>),
}

impl Value {
    /// Returns the scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// True when the value carries no data (empty scalar or collection).
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Scalar(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Object(fields) => fields.is_empty(),
        }
    }
}

/// An ordered set of top-level key/value pairs produced from one document.
///
/// A key that is declared twice keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    entries: Vec<(String, Value)>,
}

impl RawDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace a value, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

fn set_field(fields: &mut Vec<(String, String)>, key: &str, value: &str) {
    match fields.iter_mut().find(|(k, _)| k == key) {
        Some(field) => field.1 = value.to_string(),
        None => fields.push((key.to_string(), value.to_string())),
    }
}

/// Parse markup text that does not come from a file.
pub fn parse(text: &str) -> Result<RawDocument> {
    parse_source(text, INLINE_SOURCE)
}

/// Parse markup text, naming `source_name` in any diagnostic.
pub fn parse_source(text: &str, source_name: &str) -> Result<RawDocument> {
    let mut doc = RawDocument::new();
    let mut open_key: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
        let fail = |message: &str| Error::MalformedDocument {
            source_name: source_name.to_string(),
            line: index + 1,
            content: line.trim_end().to_string(),
            message: message.to_string(),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix('-') {
            let parent = open_key
                .as_deref()
                .ok_or_else(|| fail("list item found without a parent key"))?;
            let item = item.trim();
            if item.is_empty() {
                return Err(fail("list item has no value"));
            }

            if doc.get(parent).is_none() {
                doc.insert(parent, Value::List(Vec::new()));
            }
            let Some(Value::List(items)) = doc.get_mut(parent) else {
                return Err(fail("list item found under a key that already holds an object"));
            };

            match item.split_once(':') {
                Some((sub_key, sub_value)) => {
                    let (sub_key, sub_value) = (sub_key.trim(), sub_value.trim());
                    if sub_key.is_empty() {
                        return Err(fail("list item property has no key"));
                    }
                    if sub_value.is_empty() {
                        return Err(fail("nested values inside list items are not supported"));
                    }
                    // A repeated subkey closes the current element and starts another.
                    let start_new = match items.last() {
                        Some(Element::Object(fields)) => fields.iter().any(|(k, _)| k == sub_key),
                        _ => true,
                    };
                    if start_new {
                        items.push(Element::Object(Vec::new()));
                    }
                    if let Some(Element::Object(fields)) = items.last_mut() {
                        set_field(fields, sub_key, sub_value);
                    }
                }
                None => items.push(Element::Scalar(item.to_string())),
            }
        } else if let Some((key, value)) = line.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(fail("property has no key"));
            }

            let indented = line.starts_with(char::is_whitespace);
            if indented {
                let parent = open_key.as_deref().ok_or_else(|| {
                    fail("line appears to be a property of an object but no key found in previous lines")
                })?;
                if value.is_empty() {
                    return Err(fail(
                        "line appears to be a property of an object but no value found",
                    ));
                }

                if doc.get(parent).is_none() {
                    doc.insert(parent, Value::Object(Vec::new()));
                }
                match doc.get_mut(parent) {
                    Some(Value::Object(fields)) => set_field(fields, key, value),
                    Some(Value::List(items)) => match items.last_mut() {
                        Some(Element::Object(fields)) => set_field(fields, key, value),
                        _ => {
                            return Err(fail("property found after a list item that is not an object"))
                        }
                    },
                    _ => return Err(fail("property found under a key that holds a scalar")),
                }
            } else if value.is_empty() {
                open_key = Some(key.to_string());
            } else {
                doc.insert(key, Value::Scalar(value.to_string()));
                open_key = None;
            }
        } else {
            return Err(fail("line does not contain a colon or is misformatted"));
        }
    }

    Ok(doc)
}

/// Renders the document back into markup that [`parse`] reads as the same
/// document.
impl fmt::Display for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            match value {
                Value::Scalar(s) => writeln!(f, "{}: {}", key, s)?,
                Value::Object(fields) => {
                    writeln!(f, "{}:", key)?;
                    for (k, v) in fields {
                        writeln!(f, "  {}: {}", k, v)?;
                    }
                }
                Value::List(items) => {
                    writeln!(f, "{}:", key)?;
                    for item in items {
                        match item {
                            Element::Scalar(s) => writeln!(f, "  - {}", s)?,
                            Element::Object(fields) => {
                                for (i, (k, v)) in fields.iter().enumerate() {
                                    let marker = if i == 0 { "- " } else { "  " };
                                    writeln!(f, "  {}{}: {}", marker, k, v)?;
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
