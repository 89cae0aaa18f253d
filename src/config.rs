//! Compilation options
//!
//! A [`TemplateConfig`] is passed explicitly to every compilation. It can be
//! built in code or loaded from TOML:
//!
//! ```toml
//! self_closing = "xml"
//! escape_html_by_default = true
//! custom_escape = "html_escape"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which tags are written as `<tag />`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfClosingPolicy {
    /// Any tag without content
    Xml,
    /// Only the HTML void elements, whose content is dropped
    #[default]
    HtmlVoidList,
}

/// Tags closed as `<tag />` under [`SelfClosingPolicy::HtmlVoidList`]
pub const VOID_TAGS: &[&str] = &["meta", "img", "link", "br", "hr", "input", "area", "base"];

impl SelfClosingPolicy {
    /// Whether `tag` with `has_content` renders self-closed
    pub fn self_closes(self, tag: &str, has_content: bool) -> bool {
        match self {
            SelfClosingPolicy::Xml => !has_content,
            SelfClosingPolicy::HtmlVoidList => VOID_TAGS.contains(&tag),
        }
    }
}

/// Options controlling how a template compiles
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    pub self_closing: SelfClosingPolicy,

    /// Whether a bare `=` line escapes its output like `&=`
    #[serde(alias = "escape_html")]
    pub escape_html_by_default: bool,

    /// Built-in used instead of `html_escape` for escaped output
    pub custom_escape: Option<String>,

    /// Fail on unknown `!!!` keywords instead of emitting nothing
    pub strict_doctype: bool,

    /// Fold adjacent literals after compiling
    pub optimize: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            self_closing: SelfClosingPolicy::HtmlVoidList,
            escape_html_by_default: false,
            custom_escape: None,
            strict_doctype: false,
            optimize: true,
        }
    }
}

impl TemplateConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_self_closing(mut self, policy: SelfClosingPolicy) -> Self {
        self.self_closing = policy;
        self
    }

    /// Shorthand for [`SelfClosingPolicy::Xml`]
    pub fn xml(self) -> Self {
        self.with_self_closing(SelfClosingPolicy::Xml)
    }

    pub fn with_escape_html_by_default(mut self, escape: bool) -> Self {
        self.escape_html_by_default = escape;
        self
    }

    /// Escape output with the named built-in instead of `html_escape`
    pub fn with_custom_escape(mut self, name: impl Into<String>) -> Self {
        self.custom_escape = Some(name.into());
        self
    }

    pub fn with_strict_doctype(mut self, strict: bool) -> Self {
        self.strict_doctype = strict;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}
