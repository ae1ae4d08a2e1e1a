//! Encoder for Android compiled binary XML.
//!
//! Android ships resource XML files in a compiled, chunk-based binary form
//! (`ResXMLTree`). This crate writes a strict subset of that format: a UTF-8
//! string pool followed by start/end element chunks, wrapped in a document
//! chunk. Attributes are limited to strings and booleans, and there are no
//! namespaces, text nodes or resource maps.
//!
//! # Layout
//!
//! ```text
//! Xml chunk (type 0x0003, header 8)
//! ├── StringPool chunk (type 0x0001, header 28)
//! ├── StartElement chunk (type 0x0102, header 16) + attributes
//! ├── ...
//! └── EndElement chunk (type 0x0103, header 16, size 24)
//! ```
//!
//! # Example
//!
//! ```
//! use axmlpack_resxml::builder::{XmlBuilder, XmlNode};
//!
//! let root = XmlNode::new("webviewproviders")
//!     .child(XmlNode::new("webviewprovider")
//!         .attr("description", "Android WebView")
//!         .attr("packageName", "com.android.webview")
//!         .bool_attr("availableByDefault", true));
//!
//! let doc = XmlBuilder::new(root).build()?;
//! let bytes = doc.encode()?;
//! std::fs::write(std::env::temp_dir().join("config_webview_packages.xml"), bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub mod builder;
pub mod chunk;
pub mod document;
pub mod element;
#[cfg(feature = "xml-input")]
mod from_xml;
pub mod string_pool;

pub use builder::{AttrValue, XmlBuilder, XmlNode};
pub use chunk::{ChunkBuffer, ChunkHeader, ChunkType};
pub use document::{DocumentStats, EndElement, StartElement, XmlDocument, XmlEvent};
pub use element::{encode_end_element, encode_start_element, Attribute, DataType, TypedValue};
pub use error::{Error, Imbalance, Result};
pub use string_pool::{encode_string_pool, StringInterner, StringTable};
