//! axmlpack - Android binary XML generation library.
//!
//! This crate provides a unified interface for producing compiled Android
//! resource XML without the platform build tools.
//!
//! # Crates
//!
//! - [`axmlpack_resxml`] - Chunk encoder for the binary XML format
//!
//! # Example
//!
//! ```no_run
//! use axmlpack::prelude::*;
//!
//! // Chrome first, then the AOSP WebView
//! let config = WebViewConfig::default();
//! let bytes = config.encode()?;
//! std::fs::write("config_webview_packages.xml", bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub mod webview;

// Re-export the encoder crate
pub use axmlpack_resxml as resxml;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::webview::{WebViewConfig, WebViewProvider};
    pub use axmlpack_resxml::{Attribute, StringTable, XmlBuilder, XmlDocument, XmlEvent, XmlNode};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
