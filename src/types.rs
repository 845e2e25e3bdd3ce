//! Core types shared by the extractor, the merger and the batch orchestrator.

use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt::Display,
    path::PathBuf,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An XML name resolved against its namespace.
///
/// Written in Clark notation: `{namespace}local` for namespaced names and plain
/// `local` for names without a namespace (the usual case for XAML attributes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    /// Namespace URI, `None` when the name is not bound to any namespace.
    pub namespace: Option<String>,

    /// Local part of the name, e.g. `Uid` or `ToolTipService.ToolTip`.
    pub local: String,
}

impl QualifiedName {
    /// A name without namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// A name bound to `namespace`.
    pub fn namespaced(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

impl FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let name = match s.strip_prefix('{') {
            Some(rest) => {
                let (ns, local) = rest.split_once('}').ok_or_else(|| {
                    Error::validation(format!("unterminated namespace in name `{}`", s))
                })?;
                if ns.is_empty() {
                    QualifiedName::local(local)
                } else {
                    QualifiedName::namespaced(ns, local)
                }
            }
            None => QualifiedName::local(s),
        };
        if name.local.is_empty() {
            return Err(Error::validation(format!("empty local name in `{}`", s)));
        }
        Ok(name)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualifiedName> for String {
    fn from(value: QualifiedName) -> Self {
        value.to_string()
    }
}

/// Key of one externalized string: `{identifier}.{attributeLocalName}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(identifier: &str, attribute_local: &str) -> Self {
        ResourceKey(format!("{}.{}", identifier, attribute_local))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Outcome of a successful [`KeywordMapping::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was new.
    Inserted,
    /// The key was already present with the same value.
    Unchanged,
}

/// A key that is already mapped to a different value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: ResourceKey,
    pub existing: String,
    pub rejected: String,
}

impl Display for KeyCollision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "key collision on `{}`: keeping {:?}, rejecting {:?}",
            self.key, self.existing, self.rejected
        )
    }
}

/// Resource keys and their source values, collected over one batch run.
///
/// Iteration follows first-insertion order so new resource entries are appended
/// in the order they appear in the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMapping {
    entries: Vec<(ResourceKey, String)>,
    index: HashMap<ResourceKey, usize>,
}

impl KeywordMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key` unless it is already present.
    ///
    /// The first value for a key wins: re-inserting the same value is a no-op,
    /// a different value is reported as a [`KeyCollision`] and not stored.
    pub fn insert(
        &mut self,
        key: ResourceKey,
        value: String,
    ) -> Result<InsertOutcome, KeyCollision> {
        if let Some(&i) = self.index.get(&key) {
            let existing = &self.entries[i].1;
            if *existing == value {
                return Ok(InsertOutcome::Unchanged);
            }
            return Err(KeyCollision {
                key,
                existing: existing.clone(),
                rejected: value,
            });
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(InsertOutcome::Inserted)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

/// Failure categories surfaced in a [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed markup or resource document.
    Parse,
    /// Resource document without the expected root container.
    Structural,
    /// Empty identifier or key collision; only the offending pair is skipped.
    Validation,
    /// The document could not be read or written.
    Io,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Parse => write!(f, "parse"),
            DiagnosticKind::Structural => write!(f, "structural"),
            DiagnosticKind::Validation => write!(f, "validation"),
            DiagnosticKind::Io => write!(f, "io"),
        }
    }
}

/// One recoverable problem found while processing a single document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Identity of the document (markup source id or resource file path).
    pub source: String,
    /// 1-based line of the offending element, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Turns a per-file error into a diagnostic for `source`.
    pub fn from_error(source: impl Into<String>, error: &Error) -> Self {
        Self::new(error.diagnostic_kind(), source, error.to_string())
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: [{}] {}", self.source, line, self.kind, self.message),
            None => write!(f, "{}: [{}] {}", self.source, self.kind, self.message),
        }
    }
}

/// Entries added to one resource file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MergeResult {
    pub path: PathBuf,
    pub added: usize,
}

impl MergeResult {
    pub fn is_changed(&self) -> bool {
        self.added > 0
    }
}

/// Outcome of one batch run, handed back to the host for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Report {
    /// Sum of `added` over `changed_files`.
    pub total_added: usize,
    /// Resource files that gained at least one entry.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub changed_files: Vec<MergeResult>,
    /// Per-file and per-pair problems, in the order they were found.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<Diagnostic>,
    /// Set when no markup yielded any key, so no resource file was opened.
    #[serde(default)]
    pub nothing_to_do: bool,
}

impl Report {
    pub(crate) fn record(&mut self, result: MergeResult) {
        if result.is_changed() {
            self.total_added += result.added;
            self.changed_files.push(result);
        }
    }

    /// Added count for `path`, 0 when the file was not changed.
    pub fn added_for(&self, path: impl AsRef<std::path::Path>) -> usize {
        self.changed_files
            .iter()
            .find(|r| r.path == path.as_ref())
            .map_or(0, |r| r.added)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(Error::Serialize)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nothing_to_do {
            writeln!(f, "No localizable strings found")?;
        } else {
            writeln!(f, "You added {} strings to Resources", self.total_added)?;
        }
        for changed in &self.changed_files {
            writeln!(f, "  {}: +{}", changed.path.display(), changed.added)?;
        }
        for failure in &self.failures {
            writeln!(f, "  {}", failure)?;
        }
        Ok(())
    }
}
