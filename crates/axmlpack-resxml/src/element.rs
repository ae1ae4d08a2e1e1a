//! Start and end element chunks.

use std::mem::size_of;

use zerocopy::IntoBytes;

use crate::chunk::{
    AttrExt, AttributeRecord, ChunkBuffer, ChunkType, ChunkWriter, EndElementExt, NodeHeader, ResValue,
    U16Le, U32Le, NO_ENTRY,
};
use crate::{Error, Result};

/// Data word for a boolean `true`.
pub const BOOL_TRUE: u32 = 0xFFFF_FFFF;
/// Data word for a boolean `false`.
pub const BOOL_FALSE: u32 = 0;

/// Attribute value types this encoder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    /// Data is an index into the string table.
    String = 0x03,
    /// Data is [`BOOL_TRUE`] or [`BOOL_FALSE`].
    IntBoolean = 0x12,
}

impl DataType {
    /// Look up a data type by its raw tag.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x03 => Some(Self::String),
            0x12 => Some(Self::IntBoolean),
            _ => None,
        }
    }
}

/// A tagged attribute value: a type tag and a 4-byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedValue {
    pub data_type: u8,
    pub data: u32,
}

impl TypedValue {
    /// Build a value from a raw type tag and payload. Tags other than
    /// [`DataType`] variants are rejected when encoded.
    pub const fn new(data_type: u8, data: u32) -> Self {
        Self { data_type, data }
    }

    /// A string value referring to string table index `index`.
    pub const fn string(index: u32) -> Self {
        Self::new(DataType::String as u8, index)
    }

    /// A boolean value.
    pub const fn boolean(value: bool) -> Self {
        Self::new(DataType::IntBoolean as u8, if value { BOOL_TRUE } else { BOOL_FALSE })
    }

    /// The checked data type.
    pub fn kind(&self) -> Result<DataType> {
        DataType::from_raw(self.data_type).ok_or(Error::UnsupportedAttributeType(self.data_type))
    }
}

/// An attribute without namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// String index of the attribute name.
    pub name: u32,
    /// String index of the literal value as written in the source, if any.
    pub raw_value: Option<u32>,
    pub value: TypedValue,
}

impl Attribute {
    /// A string attribute whose raw value is the same string.
    pub const fn string(name: u32, value: u32) -> Self {
        Self {
            name,
            raw_value: Some(value),
            value: TypedValue::string(value),
        }
    }

    /// A boolean attribute with no raw value.
    pub const fn boolean(name: u32, value: bool) -> Self {
        Self {
            name,
            raw_value: None,
            value: TypedValue::boolean(value),
        }
    }

    /// Replace the raw value string index.
    pub const fn with_raw_value(mut self, raw_value: Option<u32>) -> Self {
        self.raw_value = raw_value;
        self
    }

    fn to_record(self) -> Result<AttributeRecord> {
        self.value.kind()?;
        Ok(AttributeRecord {
            ns: U32Le::new(NO_ENTRY),
            name: U32Le::new(self.name),
            raw_value: U32Le::new(self.raw_value.unwrap_or(NO_ENTRY)),
            typed_value: ResValue {
                size: U16Le::new(size_of::<ResValue>() as u16),
                res0: 0,
                data_type: self.value.data_type,
                data: U32Le::new(self.value.data),
            },
        })
    }
}

/// Encode a start element chunk. Attributes are written in the given order.
pub fn encode_start_element(line: u32, name: u32, attributes: &[Attribute]) -> Result<ChunkBuffer> {
    let attribute_count =
        u16::try_from(attributes.len()).map_err(|_| Error::TooManyAttributes(attributes.len()))?;

    let records = attributes
        .iter()
        .map(|attr| attr.to_record())
        .collect::<Result<Vec<_>>>()?;

    let node = NodeHeader {
        line_number: U32Le::new(line),
        comment: U32Le::new(NO_ENTRY),
    };
    let ext = AttrExt {
        ns: U32Le::new(NO_ENTRY),
        name: U32Le::new(name),
        attribute_start: U16Le::new(size_of::<AttrExt>() as u16),
        attribute_size: U16Le::new(size_of::<AttributeRecord>() as u16),
        attribute_count: U16Le::new(attribute_count),
        id_index: U16Le::new(0),
        class_index: U16Le::new(0),
        style_index: U16Le::new(0),
    };

    let mut writer = ChunkWriter::new(ChunkType::XmlStartElement, node.as_bytes())?;
    writer.write_record(&ext);
    for record in &records {
        writer.write_record(record);
    }
    writer.finish()
}

/// Encode an end element chunk.
pub fn encode_end_element(line: u32, name: u32) -> Result<ChunkBuffer> {
    let node = NodeHeader {
        line_number: U32Le::new(line),
        comment: U32Le::new(NO_ENTRY),
    };
    let ext = EndElementExt {
        ns: U32Le::new(NO_ENTRY),
        name: U32Le::new(name),
    };

    let mut writer = ChunkWriter::new(ChunkType::XmlEndElement, node.as_bytes())?;
    writer.write_record(&ext);
    writer.finish()
}
