//! Error types for binary XML encoding.

use thiserror::Error;

/// Errors that can occur when encoding a binary XML document.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while writing the finished document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A string is too long for the single-byte UTF-8 length prefix.
    #[error(
        "string {index} too long for the string pool: {chars} chars, {bytes} bytes (max {max})",
        max = crate::string_pool::MAX_STRING_LEN
    )]
    EncodingOverflow {
        index: usize,
        chars: usize,
        bytes: usize,
    },

    /// Start and end events do not form a single well-nested tree.
    #[error("unbalanced structure: {0}")]
    UnbalancedStructure(Imbalance),

    /// Attribute value type other than string or boolean.
    #[error("unsupported attribute data type 0x{0:02x}")]
    UnsupportedAttributeType(u8),

    /// A string reference points past the end of the string table.
    #[error("string index {index} out of range (string table size: {count})")]
    StringIndexOutOfRange { index: u32, count: usize },

    /// An element carries more attributes than the 16-bit count can hold.
    #[error("too many attributes on one element: {0}")]
    TooManyAttributes(usize),

    /// A chunk grew past the 32-bit size field.
    #[error("chunk of {0} bytes exceeds the 32-bit size field")]
    ChunkTooLarge(usize),

    /// A chunk header does not fit the 16-bit header size field.
    #[error("chunk header of {0} bytes exceeds the 16-bit header size field")]
    HeaderTooLarge(usize),

    /// XML text could not be read or uses features the format subset lacks.
    #[error("XML error: {0}")]
    Xml(String),
}

/// The way a sequence of start/end events fails to nest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Imbalance {
    /// An end event arrived while no element was open.
    #[error("end of element {name} at line {line} with no open element")]
    UnexpectedEnd { name: u32, line: u32 },

    /// An end event names a different element than the innermost open one.
    #[error("end of element {found} at line {line} while element {expected} is open")]
    MismatchedEnd { expected: u32, found: u32, line: u32 },

    /// A second top-level element was started.
    #[error("second root element {name} at line {line}")]
    MultipleRoots { name: u32, line: u32 },

    /// Elements were still open after the last event.
    #[error("{depth} element(s) left open at end of document")]
    Unclosed { depth: usize },
}

impl From<Imbalance> for Error {
    fn from(imbalance: Imbalance) -> Self {
        Error::UnbalancedStructure(imbalance)
    }
}

/// Result type for binary XML operations.
pub type Result<T> = std::result::Result<T, Error>;
