//! Settings that drive extraction and file classification.
//!
//! The defaults follow the XAML/`.resw` conventions: elements are marked with
//! `x:Uid`, strings live in `Text`, `Header`, `Content`, `ToolTipService.ToolTip`
//! and `PlaceholderText`, and string tables are files named `*Resources.resw`.
//!
//! ```toml
//! identifier = "{http://schemas.microsoft.com/winfx/2006/xaml}Uid"
//! attributes = ["Text", "Header", "Content", "ToolTipService.ToolTip", "Description"]
//! markup_patterns = ["*.xaml"]
//! resource_patterns = ["*Resources.resw"]
//! dry_run = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::Error, formats::PathMatcher, types::QualifiedName};

/// The XAML language namespace that `x:` is bound to.
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

/// Attributes carrying user-visible text when nothing else is configured.
pub const DEFAULT_ATTRIBUTES: &[&str] = &[
    "Text",
    "Header",
    "Content",
    "ToolTipService.ToolTip",
    "PlaceholderText",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Attribute whose presence marks an element for externalization.
    pub identifier: QualifiedName,
    /// Attributes whose values become resource entries.
    pub attributes: Vec<QualifiedName>,
    /// File-name globs selecting markup documents.
    pub markup_patterns: Vec<String>,
    /// File-name globs selecting resource documents.
    pub resource_patterns: Vec<String>,
    /// Compute the report without writing any resource file.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier: QualifiedName::namespaced(XAML_NAMESPACE, "Uid"),
            attributes: DEFAULT_ATTRIBUTES
                .iter()
                .map(|name| QualifiedName::local(*name))
                .collect(),
            markup_patterns: vec!["*.xaml".to_string()],
            resource_patterns: vec!["*Resources.resw".to_string()],
            dry_run: false,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML string; missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.identifier.local.trim().is_empty() {
            return Err(Error::validation("identifier attribute name is empty"));
        }
        if self.attributes.is_empty() {
            return Err(Error::validation("no localizable attributes configured"));
        }
        if self.attributes.contains(&self.identifier) {
            return Err(Error::validation(format!(
                "identifier `{}` cannot also be a localizable attribute",
                self.identifier
            )));
        }
        self.path_matcher().map(|_| ())
    }

    pub fn is_localizable(&self, name: &QualifiedName) -> bool {
        self.attributes.contains(name)
    }

    /// Compiles the markup and resource patterns.
    pub fn path_matcher(&self) -> Result<PathMatcher, Error> {
        PathMatcher::new(&self.markup_patterns, &self.resource_patterns)
    }

    /// Replaces the identifier attribute.
    pub fn with_identifier(mut self, identifier: QualifiedName) -> Self {
        self.identifier = identifier;
        self
    }

    /// Adds one localizable attribute, ignoring duplicates.
    pub fn with_attribute(mut self, attribute: QualifiedName) -> Self {
        if !self.attributes.contains(&attribute) {
            self.attributes.push(attribute);
        }
        self
    }

    pub fn with_markup_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.markup_patterns.push(pattern.into());
        self
    }

    pub fn with_resource_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.resource_patterns.push(pattern.into());
        self
    }

    /// Enables/disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
