//! Adds missing keys to `.resw` string tables.

use std::path::Path;

use crate::{
    error::Error,
    formats::ResourceDocument,
    traits::Parser,
    types::{KeywordMapping, MergeResult},
};

/// Appends every key of `keywords` that `target` lacks, in mapping order.
///
/// Existing entries are never touched, whatever their value. Returns the number
/// of entries added.
pub fn merge(target: &mut ResourceDocument, keywords: &KeywordMapping) -> usize {
    let mut added = 0;
    for (key, value) in keywords.iter() {
        if target.append(key.as_str(), value) {
            added += 1;
        }
    }
    added
}

/// Merges `keywords` into the table stored at `path`.
///
/// The file is rewritten only when at least one entry was added and `dry_run`
/// is off; otherwise it is left exactly as it was.
pub fn merge_file<P: AsRef<Path>>(
    path: P,
    keywords: &KeywordMapping,
    dry_run: bool,
) -> Result<MergeResult, Error> {
    let path = path.as_ref();
    let mut document = ResourceDocument::read_from(path)?;
    let added = merge(&mut document, keywords);

    if added == 0 {
        tracing::debug!(path = %path.display(), "all keys already present");
    } else if dry_run {
        tracing::info!(path = %path.display(), added, "dry run, not writing");
    } else {
        document.write_to(path)?;
        tracing::info!(path = %path.display(), added, "updated resource file");
    }

    Ok(MergeResult {
        path: path.to_path_buf(),
        added,
    })
}
