//! Builder for constructing binary XML documents from an element tree.
//!
//! The tree is flattened into start/end events and every name and value is
//! interned into the string table in first-seen order.

use crate::document::{EndElement, StartElement, XmlDocument, XmlEvent};
use crate::element::Attribute;
use crate::string_pool::StringInterner;
use crate::Result;

/// An attribute value in the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    String(String),
    Bool(bool),
}

impl AttrValue {
    /// The literal text of the value, as it would appear in XML source.
    pub fn literal(&self) -> &str {
        match self {
            AttrValue::String(s) => s,
            AttrValue::Bool(true) => "true",
            AttrValue::Bool(false) => "false",
        }
    }
}

/// An element being built, before flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Tag name of the element.
    pub name: String,
    /// Attributes in output order.
    pub attributes: Vec<(String, AttrValue)>,
    /// Child elements.
    pub children: Vec<XmlNode>,
    /// Line of the opening tag; assigned by the builder when absent.
    pub line: Option<u32>,
    /// Line of the closing tag; assigned by the builder when absent.
    pub end_line: Option<u32>,
}

impl XmlNode {
    /// Create a new node with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            line: None,
            end_line: None,
        }
    }

    /// Add a string attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), AttrValue::String(value.into())));
        self
    }

    /// Add a boolean attribute.
    pub fn bool_attr(mut self, name: impl Into<String>, value: bool) -> Self {
        self.attributes.push((name.into(), AttrValue::Bool(value)));
        self
    }

    /// Add a child node.
    pub fn child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple children.
    pub fn children(mut self, children: impl IntoIterator<Item = XmlNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Pin the line of the opening tag.
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Pin the line of the closing tag.
    pub fn end_at_line(mut self, line: u32) -> Self {
        self.end_line = Some(line);
        self
    }
}

/// Builder for binary XML documents.
///
/// # Example
///
/// ```
/// use axmlpack_resxml::builder::{XmlBuilder, XmlNode};
///
/// let root = XmlNode::new("webviewproviders")
///     .child(XmlNode::new("webviewprovider")
///         .attr("description", "Chrome")
///         .attr("packageName", "com.android.chrome")
///         .bool_attr("availableByDefault", true));
///
/// let bytes = XmlBuilder::new(root).build()?.encode()?;
/// assert_eq!(&bytes[..4], &[0x03, 0x00, 0x08, 0x00]);
/// # Ok::<(), axmlpack_resxml::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct XmlBuilder {
    root: XmlNode,
    first_line: u32,
    seed: Vec<String>,
}

impl XmlBuilder {
    /// Create a new builder with the given root node.
    pub fn new(root: XmlNode) -> Self {
        Self {
            root,
            first_line: 1,
            seed: Vec::new(),
        }
    }

    /// Place these strings at the front of the string table, in order, before
    /// anything collected from the tree. Keeps the indices of an existing pool
    /// stable when a document is regenerated with additions.
    pub fn seed_strings<S: Into<String>>(mut self, strings: impl IntoIterator<Item = S>) -> Self {
        self.seed = strings.into_iter().map(Into::into).collect();
        self
    }

    /// Line assigned to the root when it has none; later lines count up from here.
    pub fn first_line(mut self, line: u32) -> Self {
        self.first_line = line;
        self
    }

    /// The root node.
    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    /// Flatten the tree into a document.
    pub fn build(&self) -> Result<XmlDocument> {
        let mut interner = StringInterner::new();
        for s in &self.seed {
            interner.intern(s);
        }
        collect_strings(&self.root, &mut interner);

        let mut events = Vec::new();
        let mut next_line = self.first_line;
        flatten_node(&self.root, &mut interner, &mut events, &mut next_line);

        Ok(XmlDocument::with_events(interner.into_table(), events))
    }
}

/// Intern names and values in pre-order: element name, attribute names, attribute values.
fn collect_strings(node: &XmlNode, interner: &mut StringInterner) {
    interner.intern(&node.name);
    for (name, _) in &node.attributes {
        interner.intern(name);
    }
    for (_, value) in &node.attributes {
        interner.intern(value.literal());
    }
    for child in &node.children {
        collect_strings(child, interner);
    }
}

fn flatten_node(
    node: &XmlNode,
    interner: &mut StringInterner,
    events: &mut Vec<XmlEvent>,
    next_line: &mut u32,
) {
    let line = node.line.unwrap_or(*next_line);
    *next_line = line.saturating_add(1);

    let name = interner.intern(&node.name);
    let attributes = node
        .attributes
        .iter()
        .map(|(attr_name, value)| {
            let attr_name = interner.intern(attr_name);
            let raw = interner.intern(value.literal());
            match value {
                AttrValue::String(_) => Attribute::string(attr_name, raw),
                AttrValue::Bool(b) => Attribute::boolean(attr_name, *b).with_raw_value(Some(raw)),
            }
        })
        .collect();

    events.push(XmlEvent::Start(StartElement { line, name, attributes }));

    for child in &node.children {
        flatten_node(child, interner, events, next_line);
    }

    let end_line = match node.end_line {
        Some(end_line) => end_line,
        None if node.children.is_empty() => line,
        None => {
            let end_line = *next_line;
            *next_line = end_line.saturating_add(1);
            end_line
        }
    };
    if end_line >= *next_line {
        *next_line = end_line.saturating_add(1);
    }

    events.push(XmlEvent::End(EndElement { line: end_line, name }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataType;

    fn sample() -> XmlNode {
        XmlNode::new("config")
            .attr("name", "test")
            .child(XmlNode::new("setting").attr("key", "a").bool_attr("enabled", true))
            .child(XmlNode::new("setting").attr("key", "b").bool_attr("enabled", false))
    }

    #[test]
    fn test_string_order() {
        let doc = XmlBuilder::new(sample()).build().unwrap();
        let strings: Vec<&str> = doc.strings().iter().collect();
        assert_eq!(
            strings,
            vec!["config", "name", "test", "setting", "key", "enabled", "a", "true", "b", "false"]
        );
    }

    #[test]
    fn test_events_balance() {
        let doc = XmlBuilder::new(sample()).build().unwrap();
        assert!(doc.validate().is_ok());

        let starts = doc.events().iter().filter(|e| matches!(e, XmlEvent::Start(_))).count();
        let ends = doc.events().iter().filter(|e| matches!(e, XmlEvent::End(_))).count();
        assert_eq!(starts, 3);
        assert_eq!(ends, 3);
    }

    #[test]
    fn test_line_numbers() {
        let doc = XmlBuilder::new(sample()).first_line(10).build().unwrap();
        let lines: Vec<u32> = doc
            .events()
            .iter()
            .map(|e| match e {
                XmlEvent::Start(s) => s.line,
                XmlEvent::End(e) => e.line,
            })
            .collect();
        // config opens on 10, settings sit on 11 and 12, config closes on 13
        assert_eq!(lines, vec![10, 11, 11, 12, 12, 13]);
    }

    #[test]
    fn test_pinned_lines() {
        let root = XmlNode::new("a")
            .at_line(5)
            .child(XmlNode::new("b").at_line(7).end_at_line(9));
        let doc = XmlBuilder::new(root).build().unwrap();
        let lines: Vec<u32> = doc
            .events()
            .iter()
            .map(|e| match e {
                XmlEvent::Start(s) => s.line,
                XmlEvent::End(e) => e.line,
            })
            .collect();
        assert_eq!(lines, vec![5, 7, 9, 10]);
    }

    #[test]
    fn test_seed_strings_keep_indices() {
        let doc = XmlBuilder::new(sample())
            .seed_strings(["setting", "enabled", "unused"])
            .build()
            .unwrap();
        let strings: Vec<&str> = doc.strings().iter().collect();
        assert_eq!(
            strings,
            vec!["setting", "enabled", "unused", "config", "name", "test", "key", "a", "true", "b", "false"]
        );

        let XmlEvent::Start(setting) = &doc.events()[1] else {
            panic!("expected start element");
        };
        assert_eq!(setting.name, 0);
        assert_eq!(setting.attributes[1].name, 1);
    }

    #[test]
    fn test_bool_attribute_encoding() {
        let doc = XmlBuilder::new(sample()).build().unwrap();
        let XmlEvent::Start(setting) = &doc.events()[1] else {
            panic!("expected start element");
        };

        let enabled = setting.attributes[1];
        assert_eq!(enabled.value.kind().unwrap(), DataType::IntBoolean);
        assert_eq!(enabled.value.data, 0xFFFF_FFFF);
        assert_eq!(doc.strings().get(enabled.raw_value.unwrap()), Some("true"));

        let key = setting.attributes[0];
        assert_eq!(key.value.kind().unwrap(), DataType::String);
        assert_eq!(key.raw_value, Some(key.value.data));
        assert_eq!(doc.strings().get(key.value.data), Some("a"));
    }

    #[test]
    fn test_build_and_encode() {
        let bytes = XmlBuilder::new(sample()).build().unwrap().encode().unwrap();
        let declared = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(declared as usize, bytes.len());
    }
}
