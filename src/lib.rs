#![forbid(unsafe_code)]
//! Keeps `.resw` string tables in sync with `x:Uid`-marked XAML.
//!
//! Every element carrying an identifier (`x:Uid="Save"`) and a localizable
//! attribute (`Content="Save"`) needs a `Save.Content` entry in the project's
//! `Resources.resw` files. This crate finds those pairs and appends the missing
//! entries, leaving everything already in the tables untouched.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use reswsync::{Config, MarkupSource, run};
//!
//! let page = std::fs::read_to_string("Views/MainPage.xaml")?;
//! let report = run(
//!     &Config::default(),
//!     &[MarkupSource::new("Views/MainPage.xaml", page)],
//!     &["Strings/en-US/Resources.resw"],
//! );
//! println!("{report}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - [`extract`]: collects `{identifier}.{attribute}` keys from one markup document
//! - [`merge`]: appends missing keys to one resource table
//! - [`batch`]: runs both over many files and builds a [`Report`]
//! - [`formats`]: the markup tree and the byte-preserving `.resw` model

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod formats;
pub mod merge;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    batch::{
        Candidates, MarkupSource, ProjectItem, ProjectNode, discover, flatten_project,
        partition_candidates, run, run_directory, run_paths, run_project,
    },
    config::Config,
    error::Error,
    extract::{Extraction, Extractor, extract},
    formats::{DocumentKind, MarkupDocument, ResourceDocument},
    merge::{merge, merge_file},
    types::{
        Diagnostic, DiagnosticKind, KeywordMapping, MergeResult, QualifiedName, Report,
        ResourceKey,
    },
};
