//! The two document formats handled by reswsync.
//!
//! This module re-exports the main type for each format and provides the
//! [`DocumentKind`] enum plus [`PathMatcher`] for telling them apart by path.

pub mod markup;
pub mod resw;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

// Reexporting the formats for easier access
pub use markup::{Attribute, Element, MarkupDocument};
pub use resw::{ResourceDocument, ResourceEntry};

use crate::Error;

/// Role a candidate file plays in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// XAML-like markup scanned for identifiers.
    Markup,
    /// `.resw` string table that receives new entries.
    Resource,
}

/// Implements [`std::fmt::Display`] for [`DocumentKind`].
///
/// # Example
/// ```rust
/// use reswsync::formats::DocumentKind;
/// assert_eq!(DocumentKind::Markup.to_string(), "markup");
/// assert_eq!(DocumentKind::Resource.to_string(), "resource");
/// ```
impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Markup => write!(f, "markup"),
            DocumentKind::Resource => write!(f, "resource"),
        }
    }
}

/// Accepts `"markup"`/`"xaml"` and `"resource"`/`"resw"`, case-insensitively.
///
/// # Example
/// ```rust
/// use reswsync::formats::DocumentKind;
/// use std::str::FromStr;
/// assert_eq!(DocumentKind::from_str("XAML").unwrap(), DocumentKind::Markup);
/// assert_eq!(DocumentKind::from_str("resw").unwrap(), DocumentKind::Resource);
/// assert!(DocumentKind::from_str("csv").is_err());
/// ```
impl FromStr for DocumentKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "markup" | "xaml" => Ok(DocumentKind::Markup),
            "resource" | "resw" => Ok(DocumentKind::Resource),
            other => Err(Error::validation(format!("unknown document kind `{}`", other))),
        }
    }
}

/// Compiled file-name patterns for both document kinds.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    markup: GlobSet,
    resource: GlobSet,
}

impl PathMatcher {
    pub fn new(markup_patterns: &[String], resource_patterns: &[String]) -> Result<Self, Error> {
        Ok(Self {
            markup: build_glob_set(markup_patterns)?,
            resource: build_glob_set(resource_patterns)?,
        })
    }

    /// Classifies `path` by its file name. Resource patterns are checked first so a
    /// table is never scanned as markup.
    pub fn classify(&self, path: &Path) -> Option<DocumentKind> {
        let name = path.file_name()?;
        if self.resource.is_match(name) {
            Some(DocumentKind::Resource)
        } else if self.markup.is_match(name) {
            Some(DocumentKind::Markup)
        } else {
            None
        }
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
