//! Runs extraction over a set of markup documents and merges the result into
//! every resource table.
//!
//! No failure aborts a run: unreadable or malformed documents, tables without
//! a `root`, empty identifiers and key collisions all end up as entries in
//! [`Report::failures`] while the remaining inputs are still processed.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use ignore::WalkBuilder;

use crate::{
    config::Config,
    error::Error,
    extract::{Extraction, Extractor},
    formats::{DocumentKind, MarkupDocument, PathMatcher},
    merge::merge_file,
    types::{Diagnostic, Report},
};

/// Raw text of one markup document and the identity it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSource {
    pub id: String,
    pub text: String,
}

impl MarkupSource {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Runs one batch: extract keys from `markup_sources`, then merge them into
/// every table in `resource_targets`.
pub fn run<P: AsRef<Path>>(
    config: &Config,
    markup_sources: &[MarkupSource],
    resource_targets: &[P],
) -> Report {
    let span = tracing::info_span!(
        "run",
        markup = markup_sources.len(),
        targets = resource_targets.len()
    );
    let _guard = span.enter();

    let extractor = Extractor::new(config);
    let mut extraction = Extraction::default();
    for source in markup_sources {
        match MarkupDocument::parse(&source.text) {
            Ok(doc) => {
                extractor.extract_into(&source.id, &doc, &mut extraction);
            }
            Err(e) => {
                tracing::warn!(source = %source.id, error = %e, "skipping markup");
                extraction
                    .diagnostics
                    .push(Diagnostic::from_error(&source.id, &e));
            }
        }
    }

    let mut report = Report {
        failures: extraction.diagnostics,
        ..Report::default()
    };

    if extraction.keywords.is_empty() {
        tracing::info!("no localizable strings found");
        report.nothing_to_do = true;
        return report;
    }

    for target in resource_targets {
        let target = target.as_ref();
        match merge_file(target, &extraction.keywords, config.dry_run) {
            Ok(result) => report.record(result),
            Err(e) => {
                tracing::warn!(path = %target.display(), error = %e, "skipping resource file");
                report
                    .failures
                    .push(Diagnostic::from_error(target.display().to_string(), &e));
            }
        }
    }

    tracing::info!(
        keys = extraction.keywords.len(),
        total_added = report.total_added,
        changed = report.changed_files.len(),
        failures = report.failures.len(),
        "run finished"
    );
    report
}

/// Like [`run`], reading the markup documents from disk first.
///
/// A markup file that cannot be read is reported as an I/O failure.
pub fn run_paths<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    markup_paths: &[P],
    resource_targets: &[Q],
) -> Report {
    let mut sources = Vec::with_capacity(markup_paths.len());
    let mut unreadable = Vec::new();
    for path in markup_paths {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => sources.push(MarkupSource::new(path.display().to_string(), text)),
            Err(e) => {
                let e = Error::Io(e);
                tracing::warn!(path = %path.display(), error = %e, "cannot read markup");
                unreadable.push(Diagnostic::from_error(path.display().to_string(), &e));
            }
        }
    }

    let mut report = run(config, &sources, resource_targets);
    if !unreadable.is_empty() {
        unreadable.append(&mut report.failures);
        report.failures = unreadable;
    }
    report
}

/// A node of the host's project tree.
pub trait ProjectNode: Sized {
    /// File behind this node, `None` for purely virtual nodes.
    fn path(&self) -> Option<&Path>;

    fn children(&self) -> &[Self];
}

/// Plain project tree for hosts that do not have their own node type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectItem {
    pub path: Option<PathBuf>,
    pub children: Vec<ProjectItem>,
}

impl ProjectItem {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            children: Vec::new(),
        }
    }

    pub fn folder(path: impl Into<PathBuf>, children: Vec<ProjectItem>) -> Self {
        Self {
            path: Some(path.into()),
            children,
        }
    }

    pub fn virtual_folder(children: Vec<ProjectItem>) -> Self {
        Self {
            path: None,
            children,
        }
    }
}

impl ProjectNode for ProjectItem {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Every path in the tree, intermediate nodes included, in pre-order.
///
/// Duplicates are kept; [`partition_candidates`] decides what to do with them.
pub fn flatten_project<N: ProjectNode>(roots: &[N]) -> Vec<PathBuf> {
    fn visit<N: ProjectNode>(node: &N, out: &mut Vec<PathBuf>) {
        if let Some(path) = node.path() {
            out.push(path.to_path_buf());
        }
        for child in node.children() {
            visit(child, out);
        }
    }

    let mut out = Vec::new();
    for root in roots {
        visit(root, &mut out);
    }
    out
}

/// Candidate files split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub markup: Vec<PathBuf>,
    pub resources: Vec<PathBuf>,
}

/// Classifies `paths`, keeping the first occurrence of each and dropping paths
/// that match neither kind.
pub fn partition_candidates<I>(matcher: &PathMatcher, paths: I) -> Candidates
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut seen = HashSet::new();
    let mut candidates = Candidates::default();
    for path in paths {
        let Some(kind) = matcher.classify(&path) else {
            continue;
        };
        if !seen.insert(path.clone()) {
            continue;
        }
        match kind {
            DocumentKind::Markup => candidates.markup.push(path),
            DocumentKind::Resource => candidates.resources.push(path),
        }
    }
    candidates
}

/// Runs over the files of a project tree.
pub fn run_project<N: ProjectNode>(config: &Config, roots: &[N]) -> Result<Report, Error> {
    let matcher = config.path_matcher()?;
    let candidates = partition_candidates(&matcher, flatten_project(roots));
    Ok(run_paths(config, &candidates.markup, &candidates.resources))
}

/// Finds candidate files below `root`, honouring `.gitignore` files.
pub fn discover<P: AsRef<Path>>(root: P, matcher: &PathMatcher) -> Candidates {
    let walker = WalkBuilder::new(root.as_ref())
        .git_ignore(true)
        .git_exclude(true)
        .hidden(false)
        .ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for dent in walker {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if dent.file_type().is_some_and(|t| t.is_file()) {
            files.push(dent.into_path());
        }
    }
    partition_candidates(matcher, files)
}

/// Runs over every matching file below `root`.
pub fn run_directory<P: AsRef<Path>>(config: &Config, root: P) -> Result<Report, Error> {
    let matcher = config.path_matcher()?;
    let candidates = discover(root, &matcher);
    tracing::debug!(
        markup = candidates.markup.len(),
        resources = candidates.resources.len(),
        "discovered candidates"
    );
    Ok(run_paths(config, &candidates.markup, &candidates.resources))
}
