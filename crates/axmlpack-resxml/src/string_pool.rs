//! String table and string pool chunk encoding.
//!
//! Strings are stored in the UTF-8 flavour of the pool: each record is a
//! one-byte character count, a one-byte byte count, the UTF-8 bytes and a
//! terminating zero. The record region is zero-padded to a 4-byte boundary and
//! preceded by one offset per string, measured from the start of that region.

use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};
use indexmap::IndexSet;
use zerocopy::IntoBytes;

use crate::chunk::{align4, ChunkBuffer, ChunkHeader, ChunkType, ChunkWriter, StringPoolHeader, U32Le};
use crate::{Error, Result};

/// Pool flag marking UTF-8 string records.
pub const UTF8_FLAG: u32 = 1 << 8;

/// Longest string the single-byte length prefix can describe.
pub const MAX_STRING_LEN: usize = 0x7F;

/// Ordered strings referenced by index from the rest of the document.
///
/// Indices follow insertion order and never change. Duplicates are kept as
/// separate entries; use [`StringInterner`] when sharing indices is wanted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
}

impl StringTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string and return its index.
    pub fn push(&mut self, s: impl Into<String>) -> u32 {
        let index = self.strings.len() as u32;
        self.strings.push(s.into());
        index
    }

    /// Get a string by index.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table holds no strings.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over the strings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Check that `index` refers to a string in this table.
    pub fn check_index(&self, index: u32) -> Result<()> {
        if (index as usize) < self.strings.len() {
            Ok(())
        } else {
            Err(Error::StringIndexOutOfRange {
                index,
                count: self.strings.len(),
            })
        }
    }
}

impl<S: Into<String>> FromIterator<S> for StringTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            strings: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Deduplicating string collector for building a [`StringTable`].
#[derive(Debug, Clone, Default)]
pub struct StringInterner {
    strings: IndexSet<String>,
}

impl StringInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `s`, appending it if not already present.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(index) = self.strings.get_index_of(s) {
            return index as u32;
        }
        let (index, _) = self.strings.insert_full(s.to_string());
        index as u32
    }

    /// Number of distinct strings collected so far.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Finish collecting and produce the table.
    pub fn into_table(self) -> StringTable {
        self.strings.into_iter().collect()
    }
}

/// Check that every string fits the single-byte length prefix.
pub fn validate_strings(table: &StringTable) -> Result<()> {
    for (index, s) in table.iter().enumerate() {
        let chars = s.chars().count();
        let bytes = s.len();
        if chars > MAX_STRING_LEN || bytes > MAX_STRING_LEN {
            return Err(Error::EncodingOverflow { index, chars, bytes });
        }
    }
    Ok(())
}

/// Encode a string table as a string pool chunk.
///
/// Fails with [`Error::EncodingOverflow`] before producing any output if a
/// string is longer than [`MAX_STRING_LEN`] characters or bytes.
pub fn encode_string_pool(table: &StringTable) -> Result<ChunkBuffer> {
    validate_strings(table)?;

    let mut offsets = Vec::with_capacity(table.len());
    let mut records = Vec::new();
    for s in table.iter() {
        offsets.push(records.len() as u32);
        // Lengths were checked above, both fit in a byte.
        records.push(s.chars().count() as u8);
        records.push(s.len() as u8);
        records.extend_from_slice(s.as_bytes());
        records.push(0);
    }
    records.resize(align4(records.len()), 0);

    let mut index = vec![0u8; offsets.len() * 4];
    LittleEndian::write_u32_into(&offsets, &mut index);

    let header_size = ChunkHeader::SIZE + size_of::<StringPoolHeader>();
    let strings_start = header_size + index.len();
    let header = StringPoolHeader {
        string_count: U32Le::new(table.len() as u32),
        style_count: U32Le::new(0),
        flags: U32Le::new(UTF8_FLAG),
        strings_start: U32Le::new(strings_start as u32),
        styles_start: U32Le::new(0),
    };

    let mut writer = ChunkWriter::new(ChunkType::StringPool, header.as_bytes())?;
    writer.write(&index);
    writer.write(&records);
    writer.finish()
}
