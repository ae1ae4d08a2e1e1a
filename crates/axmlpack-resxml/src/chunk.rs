//! Chunk layout shared by every record in a binary XML document.
//!
//! Every chunk starts with the same three fields: a 16-bit type tag, a 16-bit
//! header size and a 32-bit total size. [`ChunkWriter`] is the only place that
//! writes them, so the size field always matches the encoded length.
//!
//! All multi-byte fields are little-endian regardless of the host.

use std::mem::size_of;

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Little-endian `u16` field.
pub type U16Le = U16<LittleEndian>;
/// Little-endian `u32` field.
pub type U32Le = U32<LittleEndian>;

/// Absent string reference (namespace, raw value, comment). Reads as -1 when signed.
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;

/// Chunk type tags used by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ChunkType {
    StringPool = 0x0001,
    Xml = 0x0003,
    XmlStartElement = 0x0102,
    XmlEndElement = 0x0103,
}

impl ChunkType {
    /// Look up a chunk type by its raw tag.
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x0001 => Some(Self::StringPool),
            0x0003 => Some(Self::Xml),
            0x0102 => Some(Self::XmlStartElement),
            0x0103 => Some(Self::XmlEndElement),
            _ => None,
        }
    }
}

/// Common header at the start of every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ChunkHeader {
    /// Chunk type tag.
    pub chunk_type: U16Le,
    /// Size of the chunk header, including this common part.
    pub header_size: U16Le,
    /// Total size of the chunk, header included.
    pub size: U32Le,
}

impl ChunkHeader {
    /// Size of the common header in bytes.
    pub const SIZE: usize = size_of::<Self>();
}

/// String pool header fields following the common header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct StringPoolHeader {
    pub string_count: U32Le,
    pub style_count: U32Le,
    pub flags: U32Le,
    /// Offset from the chunk start to the string records.
    pub strings_start: U32Le,
    pub styles_start: U32Le,
}

/// Node header fields shared by start and end element chunks.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct NodeHeader {
    /// Source line, metadata only.
    pub line_number: U32Le,
    pub comment: U32Le,
}

/// Extension of a start element chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct AttrExt {
    pub ns: U32Le,
    pub name: U32Le,
    /// Byte offset from the start of this extension to the first attribute.
    pub attribute_start: U16Le,
    /// Byte stride between attributes.
    pub attribute_size: U16Le,
    pub attribute_count: U16Le,
    pub id_index: U16Le,
    pub class_index: U16Le,
    pub style_index: U16Le,
}

/// Typed attribute value.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ResValue {
    pub size: U16Le,
    pub res0: u8,
    pub data_type: u8,
    pub data: U32Le,
}

/// One attribute of a start element chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct AttributeRecord {
    pub ns: U32Le,
    pub name: U32Le,
    pub raw_value: U32Le,
    pub typed_value: ResValue,
}

/// Extension of an end element chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct EndElementExt {
    pub ns: U32Le,
    pub name: U32Le,
}

const _: () = assert!(size_of::<ChunkHeader>() == 8);
const _: () = assert!(size_of::<StringPoolHeader>() == 20);
const _: () = assert!(size_of::<NodeHeader>() == 8);
const _: () = assert!(size_of::<AttrExt>() == 20);
const _: () = assert!(size_of::<ResValue>() == 8);
const _: () = assert!(size_of::<AttributeRecord>() == 20);
const _: () = assert!(size_of::<EndElementExt>() == 8);

/// Round `len` up to the next multiple of four.
#[inline]
pub const fn align4(len: usize) -> usize {
    (len + 3) & !3
}

/// Incrementally writes one chunk.
///
/// The header size is taken from the header tail passed to [`ChunkWriter::new`]
/// and the total size is filled in by [`ChunkWriter::finish`].
#[derive(Debug)]
pub struct ChunkWriter {
    header: ChunkHeader,
    buf: Vec<u8>,
}

impl ChunkWriter {
    /// Start a chunk of the given type. `header_tail` holds the type-specific
    /// header fields that follow the common header.
    pub fn new(chunk_type: ChunkType, header_tail: &[u8]) -> Result<Self> {
        let header_size = ChunkHeader::SIZE + header_tail.len();
        let raw_header_size = u16::try_from(header_size).map_err(|_| Error::HeaderTooLarge(header_size))?;
        let header = ChunkHeader {
            chunk_type: U16Le::new(chunk_type as u16),
            header_size: U16Le::new(raw_header_size),
            size: U32Le::new(0),
        };

        let mut buf = Vec::with_capacity(header_size);
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(header_tail);
        Ok(Self { header, buf })
    }

    /// Append payload bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a plain-old-data record.
    pub fn write_record<T: IntoBytes + Immutable>(&mut self, record: &T) {
        self.buf.extend_from_slice(record.as_bytes());
    }

    /// Fill in the total size and seal the chunk.
    pub fn finish(mut self) -> Result<ChunkBuffer> {
        let len = self.buf.len();
        let size = u32::try_from(len).map_err(|_| Error::ChunkTooLarge(len))?;
        self.header.size = U32Le::new(size);
        self.buf[..ChunkHeader::SIZE].copy_from_slice(self.header.as_bytes());
        Ok(ChunkBuffer {
            header: self.header,
            bytes: self.buf,
        })
    }
}

/// One fully encoded chunk: header plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBuffer {
    header: ChunkHeader,
    bytes: Vec<u8>,
}

impl ChunkBuffer {
    /// The common header of this chunk.
    pub fn header(&self) -> ChunkHeader {
        self.header
    }

    /// The chunk type, if it is one this crate knows.
    pub fn chunk_type(&self) -> Option<ChunkType> {
        ChunkType::from_raw(self.header().chunk_type.get())
    }

    /// Total size recorded in the header.
    pub fn declared_size(&self) -> u32 {
        self.header().size.get()
    }

    /// Length of the encoded chunk in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a sealed chunk.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the chunk and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for ChunkBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
