//! Parse XML text into a binary XML builder.
//!
//! Only the subset the encoder supports is accepted: elements and attributes
//! without namespaces and no text content. Attribute values `true` and `false`
//! become boolean attributes; every other value is a string.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::builder::{AttrValue, XmlBuilder, XmlNode};
use crate::{Error, Result};

impl XmlBuilder {
    /// Parse XML text and create a builder that can produce binary XML.
    ///
    /// Line numbers of the source tags are kept in the output.
    ///
    /// # Example
    ///
    /// ```
    /// use axmlpack_resxml::builder::XmlBuilder;
    ///
    /// let xml = r#"<?xml version="1.0" encoding="utf-8"?>
    /// <webviewproviders>
    ///     <webviewprovider description="Chrome" packageName="com.android.chrome"
    ///         availableByDefault="true" />
    /// </webviewproviders>"#;
    ///
    /// let builder = XmlBuilder::from_xml(xml).unwrap();
    /// let bytes = builder.build().unwrap().encode().unwrap();
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = parse_xml_to_node(xml)?;
        Ok(Self::new(root))
    }

    /// Parse XML bytes and create a builder.
    pub fn from_xml_bytes(xml: &[u8]) -> Result<Self> {
        let xml_str = std::str::from_utf8(xml).map_err(|e| Error::Xml(e.to_string()))?;
        Self::from_xml(xml_str)
    }
}

/// Maps byte positions in the source to 1-based line numbers.
struct LineCounter<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> LineCounter<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    /// Line of the first non-whitespace byte at or after `pos`. Positions must not go backwards.
    fn line_at(&mut self, pos: usize) -> u32 {
        let mut target = pos.min(self.source.len());
        while target < self.source.len() && self.source[target].is_ascii_whitespace() {
            target += 1;
        }
        if target > self.pos {
            let newlines = count_newlines(&self.source[self.pos..target]);
            self.line = self.line.saturating_add(newlines);
            self.pos = target;
        }
        self.line
    }
}

fn count_newlines(bytes: &[u8]) -> u32 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u32
}

/// Parse XML text into an XmlNode tree.
fn parse_xml_to_node(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut lines = LineCounter::new(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event_start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let line = lines.line_at(event_start);
                let node = element_to_node(&e)?.at_line(line);
                if root.is_some() && stack.is_empty() {
                    return Err(Error::Xml(format!("second root element <{}> at line {}", node.name, line)));
                }
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                // Self-closing element opens and closes on the same line.
                let line = lines.line_at(event_start);
                let node = element_to_node(&e)?.at_line(line).end_at_line(line);
                attach(node, &mut stack, &mut root, line)?;
            }
            Ok(Event::End(_)) => {
                let line = lines.line_at(event_start);
                if let Some(node) = stack.pop() {
                    attach(node.end_at_line(line), &mut stack, &mut root, line)?;
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                if !text.trim().is_empty() {
                    let line = lines.line_at(event_start);
                    return Err(Error::Xml(format!("text content at line {} is not supported", line)));
                }
            }
            Ok(Event::CData(_)) => {
                let line = lines.line_at(event_start);
                return Err(Error::Xml(format!("CDATA at line {} is not supported", line)));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // Ignore other events (declarations, comments, etc.)
            Err(e) => return Err(Error::Xml(format!("XML parse error: {}", e))),
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!("element <{}> is never closed", open.name)));
    }

    root.ok_or_else(|| Error::Xml("No root element found in XML".to_string()))
}

/// Hang a finished node on its parent, or make it the root.
fn attach(node: XmlNode, stack: &mut [XmlNode], root: &mut Option<XmlNode>, line: u32) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_some() {
        return Err(Error::Xml(format!("second root element <{}> at line {}", node.name, line)));
    } else {
        *root = Some(node);
    }
    Ok(())
}

fn element_to_node(e: &BytesStart<'_>) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    if name.contains(':') {
        return Err(Error::Xml(format!("namespaced element <{}> is not supported", name)));
    }

    let mut node = XmlNode::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.contains(':') {
            return Err(Error::Xml(format!(
                "namespaced attribute '{}' on <{}> is not supported",
                key, node.name
            )));
        }

        let value = attr.unescape_value().map_err(|e| Error::Xml(e.to_string()))?;
        let value = match value.as_ref() {
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            other => AttrValue::String(other.to_string()),
        };
        node.attributes.push((key, value));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, XmlEvent};

    const WEBVIEW_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- providers -->
<webviewproviders>
    <webviewprovider description="Chrome" packageName="com.android.chrome" availableByDefault="true" />
    <webviewprovider description="Android WebView" packageName="com.android.webview"
        availableByDefault="true">
    </webviewprovider>
</webviewproviders>
"#;

    fn lines(builder: &XmlBuilder) -> Vec<u32> {
        builder
            .build()
            .unwrap()
            .events()
            .iter()
            .map(|e| match e {
                XmlEvent::Start(s) => s.line,
                XmlEvent::End(e) => e.line,
            })
            .collect()
    }

    #[test]
    fn test_from_xml_simple() {
        let builder = XmlBuilder::from_xml(r#"<Root version="1.0"/>"#).unwrap();
        let root = builder.root();
        assert_eq!(root.name, "Root");
        assert_eq!(root.attributes, vec![("version".to_string(), AttrValue::String("1.0".to_string()))]);
        assert!(builder.build().unwrap().encode().is_ok());
    }

    #[test]
    fn test_from_xml_nested() {
        let xml = r#"<A>
            <B attr="1">
                <C/>
                <D attr="2"/>
            </B>
            <E/>
        </A>"#;

        let builder = XmlBuilder::from_xml(xml).unwrap();
        let root = builder.root();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "B");
        assert_eq!(root.children[0].children.len(), 2);
        assert_eq!(root.children[1].name, "E");
    }

    #[test]
    fn test_line_numbers_from_source() {
        let builder = XmlBuilder::from_xml(WEBVIEW_XML).unwrap();
        assert_eq!(lines(&builder), vec![3, 4, 4, 5, 7, 8]);
    }

    #[test]
    fn test_boolean_values() {
        let doc = XmlBuilder::from_xml(WEBVIEW_XML).unwrap().build().unwrap();
        let XmlEvent::Start(chrome) = &doc.events()[1] else {
            panic!("expected start element");
        };

        assert_eq!(chrome.attributes.len(), 3);
        assert_eq!(chrome.attributes[2].value.kind().unwrap(), DataType::IntBoolean);
        assert_eq!(chrome.attributes[2].value.data, 0xFFFF_FFFF);
        assert_eq!(chrome.attributes[0].value.kind().unwrap(), DataType::String);
    }

    #[test]
    fn test_from_xml_empty() {
        assert!(XmlBuilder::from_xml("").is_err());
    }

    #[test]
    fn test_text_content_rejected() {
        let result = XmlBuilder::from_xml("<Root><Child>Hello</Child></Root>");
        assert!(matches!(result, Err(Error::Xml(_))));
    }

    #[test]
    fn test_namespaces_rejected() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"/>"#;
        assert!(matches!(XmlBuilder::from_xml(xml), Err(Error::Xml(_))));

        assert!(matches!(XmlBuilder::from_xml("<a:b/>"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        assert!(matches!(XmlBuilder::from_xml("<a/><b/>"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_from_xml_bytes() {
        let builder = XmlBuilder::from_xml_bytes(WEBVIEW_XML.as_bytes()).unwrap();
        assert_eq!(builder.root().name, "webviewproviders");
        assert!(XmlBuilder::from_xml_bytes(&[0xFF, 0xFE]).is_err());
    }
}
