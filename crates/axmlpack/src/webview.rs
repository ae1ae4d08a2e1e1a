//! WebView provider list (`config_webview_packages.xml`).
//!
//! The framework reads this resource to decide which packages may serve as the
//! system WebView implementation. The compiled form is a single
//! `webviewproviders` element holding one `webviewprovider` per candidate.

use std::collections::HashSet;

use axmlpack_resxml::builder::{XmlBuilder, XmlNode};
use axmlpack_resxml::XmlDocument;

use crate::{Error, Result};

/// Root element name.
pub const ROOT_TAG: &str = "webviewproviders";
/// Provider element name.
pub const PROVIDER_TAG: &str = "webviewprovider";

const ATTR_DESCRIPTION: &str = "description";
const ATTR_PACKAGE_NAME: &str = "packageName";
const ATTR_AVAILABLE_BY_DEFAULT: &str = "availableByDefault";
const ATTR_IS_FALLBACK: &str = "isFallback";

/// Line of the root element in the stock resource.
pub const DEFAULT_FIRST_LINE: u32 = 17;

/// String pool of the stock AOSP resource, in its original order.
///
/// The default config keeps these indices and appends new strings after them.
pub const STOCK_STRINGS: [&str; 8] = [
    ROOT_TAG,
    ATTR_DESCRIPTION,
    ATTR_PACKAGE_NAME,
    ATTR_AVAILABLE_BY_DEFAULT,
    PROVIDER_TAG,
    "Android WebView",
    "com.android.webview",
    "true",
];

/// One package that may provide the WebView implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WebViewProvider {
    /// Name shown in developer options.
    pub description: String,
    /// Android package name.
    pub package_name: String,
    /// Whether the provider is usable without the user picking it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub available_by_default: bool,
    /// Whether the provider is the fallback used when nothing else is installed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_fallback: bool,
    /// Source line of the opening tag; counted from the root when absent.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub line: Option<u32>,
    /// Source line of the closing tag; same as the opening line when absent.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub end_line: Option<u32>,
}

impl WebViewProvider {
    /// Create a provider that is available by default.
    pub fn new(description: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            package_name: package_name.into(),
            available_by_default: true,
            is_fallback: false,
            line: None,
            end_line: None,
        }
    }

    /// Set whether the provider is available by default.
    pub fn available_by_default(mut self, available: bool) -> Self {
        self.available_by_default = available;
        self
    }

    /// Mark the provider as the fallback.
    pub fn fallback(mut self, is_fallback: bool) -> Self {
        self.is_fallback = is_fallback;
        self
    }

    /// Pin the source lines of the opening and closing tags.
    pub fn at_lines(mut self, line: u32, end_line: u32) -> Self {
        self.line = Some(line);
        self.end_line = Some(end_line);
        self
    }

    /// Google Chrome.
    pub fn chrome() -> Self {
        Self::new("Chrome", "com.android.chrome")
    }

    /// The AOSP WebView.
    pub fn android_webview() -> Self {
        Self::new("Android WebView", "com.android.webview")
    }

    fn to_node(&self) -> XmlNode {
        let mut node = XmlNode::new(PROVIDER_TAG)
            .attr(ATTR_DESCRIPTION, self.description.as_str())
            .attr(ATTR_PACKAGE_NAME, self.package_name.as_str())
            .bool_attr(ATTR_AVAILABLE_BY_DEFAULT, self.available_by_default);

        if self.is_fallback {
            node = node.bool_attr(ATTR_IS_FALLBACK, true);
        }
        if let Some(line) = self.line {
            node = node.at_line(line).end_at_line(self.end_line.unwrap_or(line));
        }
        node
    }
}

/// The full provider list, in preference order.
///
/// # Example
///
/// ```
/// use axmlpack::webview::{WebViewConfig, WebViewProvider};
///
/// let config = WebViewConfig::new(vec![
///     WebViewProvider::chrome(),
///     WebViewProvider::android_webview(),
/// ]);
/// let bytes = config.encode()?;
/// assert_eq!(bytes.len(), 540);
/// # Ok::<(), axmlpack::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebViewConfig {
    pub providers: Vec<WebViewProvider>,
    /// Source line recorded for the root element.
    pub first_line: u32,
    /// Source line of the root's closing tag; counted on when absent.
    pub end_line: Option<u32>,
    /// Strings placed at the front of the pool before the tree's own.
    pub strings: Vec<String>,
}

impl Default for WebViewConfig {
    /// Chrome first, then the AOSP WebView, laid out exactly like the stock
    /// resource patched in place: same pool order and source lines.
    fn default() -> Self {
        Self::new(vec![
            WebViewProvider::chrome().at_lines(18, 18),
            WebViewProvider::android_webview().at_lines(19, 20),
        ])
        .end_line(21)
        .seed_strings(STOCK_STRINGS)
    }
}

impl WebViewConfig {
    /// Create a config with the given providers.
    pub fn new(providers: Vec<WebViewProvider>) -> Self {
        Self {
            providers,
            first_line: DEFAULT_FIRST_LINE,
            end_line: None,
            strings: Vec::new(),
        }
    }

    /// Set the line recorded for the root element. Pinned lines move with it.
    pub fn first_line(mut self, line: u32) -> Self {
        let from = self.first_line;
        let shift = |pinned: Option<u32>| pinned.map(|l| l.saturating_sub(from).saturating_add(line));
        for provider in &mut self.providers {
            provider.line = shift(provider.line);
            provider.end_line = shift(provider.end_line);
        }
        self.end_line = shift(self.end_line);
        self.first_line = line;
        self
    }

    /// Pin the line of the root's closing tag.
    pub fn end_line(mut self, line: u32) -> Self {
        self.end_line = Some(line);
        self
    }

    /// Put these strings first in the pool, in order.
    pub fn seed_strings<S: Into<String>>(mut self, strings: impl IntoIterator<Item = S>) -> Self {
        self.strings = strings.into_iter().map(Into::into).collect();
        self
    }

    /// Check that the list is usable: not empty, no blank or repeated package names.
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(Error::InvalidConfig("no providers".to_string()));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.package_name.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "provider '{}' has an empty package name",
                    provider.description
                )));
            }
            if !seen.insert(provider.package_name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate package name '{}'",
                    provider.package_name
                )));
            }
        }
        Ok(())
    }

    /// Build the binary XML document.
    pub fn to_document(&self) -> Result<XmlDocument> {
        self.validate()?;

        let mut root = XmlNode::new(ROOT_TAG).children(self.providers.iter().map(WebViewProvider::to_node));
        if let Some(end_line) = self.end_line {
            root = root.end_at_line(end_line);
        }
        let doc = XmlBuilder::new(root)
            .first_line(self.first_line)
            .seed_strings(&self.strings)
            .build()?;
        Ok(doc)
    }

    /// Build and encode the document.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_document()?.encode()?)
    }
}
