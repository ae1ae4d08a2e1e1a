//! Whole-document assembly.

use std::io::Write;

use crate::chunk::{ChunkType, ChunkWriter};
use crate::element::{encode_end_element, encode_start_element, Attribute, DataType};
use crate::error::Imbalance;
use crate::string_pool::{encode_string_pool, validate_strings, StringTable};
use crate::Result;

/// Opening of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    /// Source line, metadata only.
    pub line: u32,
    /// String index of the element name.
    pub name: u32,
    pub attributes: Vec<Attribute>,
}

/// Closing of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndElement {
    pub line: u32,
    pub name: u32,
}

/// One event in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start(StartElement),
    End(EndElement),
}

/// Counts over a document's table and events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub strings: usize,
    pub elements: usize,
    pub attributes: usize,
}

/// A string table plus the element events that reference it.
///
/// # Example
///
/// ```
/// use axmlpack_resxml::{Attribute, StringTable, XmlDocument};
///
/// let mut strings = StringTable::new();
/// let root = strings.push("config");
/// let enabled = strings.push("enabled");
///
/// let mut doc = XmlDocument::new(strings);
/// doc.start(1, root, vec![Attribute::boolean(enabled, true)]);
/// doc.end(1, root);
///
/// let bytes = doc.encode()?;
/// assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize, bytes.len());
/// # Ok::<(), axmlpack_resxml::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    strings: StringTable,
    events: Vec<XmlEvent>,
}

impl XmlDocument {
    /// Create a document with no events over the given string table.
    pub fn new(strings: StringTable) -> Self {
        Self {
            strings,
            events: Vec::new(),
        }
    }

    /// Create a document from a string table and a ready-made event list.
    pub fn with_events(strings: StringTable, events: Vec<XmlEvent>) -> Self {
        Self { strings, events }
    }

    /// Append a start element event.
    pub fn start(&mut self, line: u32, name: u32, attributes: Vec<Attribute>) -> &mut Self {
        self.push(XmlEvent::Start(StartElement { line, name, attributes }))
    }

    /// Append an end element event.
    pub fn end(&mut self, line: u32, name: u32) -> &mut Self {
        self.push(XmlEvent::End(EndElement { line, name }))
    }

    /// Append an event.
    pub fn push(&mut self, event: XmlEvent) -> &mut Self {
        self.events.push(event);
        self
    }

    /// The string table.
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// The events in document order.
    pub fn events(&self) -> &[XmlEvent] {
        &self.events
    }

    /// Check string lengths, nesting, string references and attribute types.
    pub fn validate(&self) -> Result<()> {
        validate_strings(&self.strings)?;

        let mut open: Vec<u32> = Vec::new();
        let mut roots = 0usize;

        for event in &self.events {
            match event {
                XmlEvent::Start(start) => {
                    self.check_start(start)?;
                    if open.is_empty() {
                        roots += 1;
                        if roots > 1 {
                            return Err(Imbalance::MultipleRoots {
                                name: start.name,
                                line: start.line,
                            }
                            .into());
                        }
                    }
                    open.push(start.name);
                }
                XmlEvent::End(end) => {
                    self.strings.check_index(end.name)?;
                    match open.pop() {
                        None => {
                            return Err(Imbalance::UnexpectedEnd {
                                name: end.name,
                                line: end.line,
                            }
                            .into());
                        }
                        Some(expected) if expected != end.name => {
                            return Err(Imbalance::MismatchedEnd {
                                expected,
                                found: end.name,
                                line: end.line,
                            }
                            .into());
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        if !open.is_empty() {
            return Err(Imbalance::Unclosed { depth: open.len() }.into());
        }

        Ok(())
    }

    fn check_start(&self, start: &StartElement) -> Result<()> {
        self.strings.check_index(start.name)?;
        for attr in &start.attributes {
            self.strings.check_index(attr.name)?;
            if let Some(raw) = attr.raw_value {
                self.strings.check_index(raw)?;
            }
            if attr.value.kind()? == DataType::String {
                self.strings.check_index(attr.value.data)?;
            }
        }
        Ok(())
    }

    /// Encode the whole document.
    ///
    /// The document is validated first; on error nothing is encoded. On
    /// success the size in the document header equals the returned length.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let mut writer = ChunkWriter::new(ChunkType::Xml, &[])?;
        writer.write(encode_string_pool(&self.strings)?.as_bytes());

        for event in &self.events {
            let chunk = match event {
                XmlEvent::Start(start) => encode_start_element(start.line, start.name, &start.attributes)?,
                XmlEvent::End(end) => encode_end_element(end.line, end.name)?,
            };
            writer.write(chunk.as_bytes());
        }

        Ok(writer.finish()?.into_bytes())
    }

    /// Encode the document and write it to `sink` in one piece.
    ///
    /// Nothing is written if encoding fails. Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<usize> {
        let bytes = self.encode()?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(bytes.len())
    }

    /// Count strings, elements and attributes. Does not encode; the size is
    /// the length of whatever [`XmlDocument::encode`] returned.
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats {
            strings: self.strings.len(),
            ..Default::default()
        };
        for event in &self.events {
            if let XmlEvent::Start(start) = event {
                stats.elements += 1;
                stats.attributes += start.attributes.len();
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use byteorder::{ByteOrder, LittleEndian};

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        LittleEndian::read_u32(&bytes[offset..offset + 4])
    }

    /// Walk the chunks following the document header and return (type, size) pairs.
    fn child_chunks(bytes: &[u8]) -> Vec<(u16, usize)> {
        let mut chunks = Vec::new();
        let mut pos = 8;
        while pos < bytes.len() {
            let ty = LittleEndian::read_u16(&bytes[pos..pos + 2]);
            let size = u32_at(bytes, pos + 4) as usize;
            chunks.push((ty, size));
            pos += size;
        }
        assert_eq!(pos, bytes.len());
        chunks
    }

    fn two_string_doc() -> XmlDocument {
        let strings: StringTable = ["a", "b"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![Attribute::string(1, 0)]).end(1, 0);
        doc
    }

    #[test]
    fn test_empty_document() {
        let bytes = XmlDocument::default().encode().unwrap();

        assert_eq!(bytes.len(), 36);
        assert_eq!(LittleEndian::read_u16(&bytes[0..2]), 0x0003);
        assert_eq!(LittleEndian::read_u16(&bytes[2..4]), 8);
        assert_eq!(u32_at(&bytes, 4), 36);
        assert_eq!(child_chunks(&bytes), vec![(0x0001, 28)]);
        assert_eq!(u32_at(&bytes, 8 + 8), 0); // stringCount
    }

    #[test]
    fn test_literal_scenario() {
        let bytes = two_string_doc().encode().unwrap();

        // Pool: 28 header + 8 offsets + 8 records
        assert_eq!(u32_at(&bytes, 8 + 20), 36);
        assert_eq!(
            child_chunks(&bytes),
            vec![(0x0001, 44), (0x0102, 52), (0x0103, 24)]
        );
        assert_eq!(u32_at(&bytes, 4) as usize, bytes.len());
        assert_eq!(bytes.len(), 8 + 44 + 52 + 24);
    }

    #[test]
    fn test_events_emitted_in_order() {
        let strings: StringTable = ["root", "child"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![])
            .start(2, 1, vec![])
            .end(2, 1)
            .start(3, 1, vec![])
            .end(3, 1)
            .end(4, 0);

        let bytes = doc.encode().unwrap();
        let types: Vec<u16> = child_chunks(&bytes).into_iter().map(|(ty, _)| ty).collect();
        assert_eq!(types, vec![0x0001, 0x0102, 0x0102, 0x0103, 0x0102, 0x0103, 0x0103]);
    }

    #[test]
    fn test_unclosed_element() {
        let strings: StringTable = ["a"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![]);

        assert!(matches!(
            doc.encode(),
            Err(Error::UnbalancedStructure(Imbalance::Unclosed { depth: 1 }))
        ));
    }

    #[test]
    fn test_unexpected_end() {
        let strings: StringTable = ["a"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.end(3, 0);

        assert!(matches!(
            doc.encode(),
            Err(Error::UnbalancedStructure(Imbalance::UnexpectedEnd { name: 0, line: 3 }))
        ));
    }

    #[test]
    fn test_mismatched_end() {
        let strings: StringTable = ["a", "b"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![]).start(2, 1, vec![]).end(3, 0).end(4, 1);

        assert!(matches!(
            doc.encode(),
            Err(Error::UnbalancedStructure(Imbalance::MismatchedEnd {
                expected: 1,
                found: 0,
                line: 3
            }))
        ));
    }

    #[test]
    fn test_multiple_roots() {
        let strings: StringTable = ["a"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![]).end(1, 0).start(2, 0, vec![]).end(2, 0);

        assert!(matches!(
            doc.encode(),
            Err(Error::UnbalancedStructure(Imbalance::MultipleRoots { .. }))
        ));
    }

    #[test]
    fn test_string_index_out_of_range() {
        let strings: StringTable = ["a"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![Attribute::string(0, 5)]).end(1, 0);

        assert!(matches!(
            doc.encode(),
            Err(Error::StringIndexOutOfRange { index: 5, count: 1 })
        ));
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let strings: StringTable = ["a".repeat(130)].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![]).end(1, 0);

        let mut sink = Vec::new();
        assert!(matches!(
            doc.write_to(&mut sink),
            Err(Error::EncodingOverflow { chars: 130, .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unbalanced_writes_nothing() {
        let strings: StringTable = ["a"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![]);

        let mut sink = Vec::new();
        assert!(matches!(doc.write_to(&mut sink), Err(Error::UnbalancedStructure(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_to_sink() {
        let doc = two_string_doc();
        let mut sink = Vec::new();
        let written = doc.write_to(&mut sink).unwrap();

        assert_eq!(written, sink.len());
        assert_eq!(sink, doc.encode().unwrap());
    }

    #[test]
    fn test_stats() {
        let stats = two_string_doc().stats();
        assert_eq!(
            stats,
            DocumentStats {
                strings: 2,
                elements: 1,
                attributes: 1,
            }
        );
    }

    #[test]
    fn test_stats_on_unencodable_document() {
        let strings: StringTable = ["root", "x"].into_iter().collect();
        let mut doc = XmlDocument::new(strings);
        doc.start(1, 0, vec![Attribute::string(1, 1)]);

        assert!(doc.encode().is_err());
        assert_eq!(doc.stats().elements, 1);
        assert_eq!(doc.stats().attributes, 1);
    }
}
