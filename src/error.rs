//! All error types for the reswsync crate.
//!
//! These are returned from all fallible operations (parsing markup and resource
//! documents, loading configuration, writing resource files).

use thiserror::Error;

use crate::types::DiagnosticKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid resource structure: {0}")]
    Structural(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid path pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new malformed-document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::Malformed(message.into())
    }

    /// Creates a new structural error
    pub fn structural(message: impl Into<String>) -> Self {
        Error::Structural(message.into())
    }

    /// Creates a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Classifies this error for reporting as a per-file failure.
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            Error::XmlParse(_) | Error::Malformed(_) => DiagnosticKind::Parse,
            Error::Structural(_) => DiagnosticKind::Structural,
            Error::Validation(_) | Error::Config(_) | Error::InvalidPattern(_) => {
                DiagnosticKind::Validation
            }
            Error::Io(_) | Error::Serialize(_) => DiagnosticKind::Io,
        }
    }
}
