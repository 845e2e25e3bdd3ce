//! Collects resource keys from marked-up elements.
//!
//! Every element carrying the configured identifier attribute (`x:Uid` by
//! default) contributes one `{identifier}.{attribute}` key per localizable
//! attribute it sets. Rejected pairs become [`Diagnostic`]s; extraction of the
//! rest of the document carries on.

use crate::{
    config::Config,
    formats::{Element, MarkupDocument},
    types::{Diagnostic, DiagnosticKind, InsertOutcome, KeywordMapping, ResourceKey},
};

/// Keys and diagnostics gathered from one or more markup documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub keywords: KeywordMapping,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Extractor<'a> {
    config: &'a Config,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Extracts from a single document.
    pub fn extract(&self, source: &str, doc: &MarkupDocument) -> Extraction {
        let mut extraction = Extraction::default();
        self.extract_into(source, doc, &mut extraction);
        extraction
    }

    /// Adds the keys of `doc` to `out`, checking them against keys already there.
    ///
    /// Returns the number of keys that were new.
    pub fn extract_into(&self, source: &str, doc: &MarkupDocument, out: &mut Extraction) -> usize {
        let mut added = 0;
        for element in doc.elements() {
            added += self.extract_element(source, element, out);
        }
        tracing::debug!(source, added, total = out.keywords.len(), "extracted keys");
        added
    }

    fn extract_element(&self, source: &str, element: &Element, out: &mut Extraction) -> usize {
        let Some(id) = element.attribute(&self.config.identifier) else {
            return 0;
        };

        if id.trim().is_empty() {
            let diagnostic = Diagnostic::new(
                DiagnosticKind::Validation,
                source,
                format!(
                    "identifier cannot be empty on element `{}`",
                    element.name.local
                ),
            )
            .with_line(element.line);
            tracing::warn!(%diagnostic, "rejected element");
            out.diagnostics.push(diagnostic);
            return 0;
        }

        let mut added = 0;
        for attr in &element.attributes {
            if !self.config.is_localizable(&attr.name) {
                continue;
            }
            let key = ResourceKey::new(id, &attr.name.local);
            match out.keywords.insert(key, attr.value.clone()) {
                Ok(InsertOutcome::Inserted) => added += 1,
                Ok(InsertOutcome::Unchanged) => {}
                Err(collision) => {
                    let diagnostic =
                        Diagnostic::new(DiagnosticKind::Validation, source, collision.to_string())
                            .with_line(element.line);
                    tracing::warn!(%diagnostic, "rejected key");
                    out.diagnostics.push(diagnostic);
                }
            }
        }
        added
    }
}

/// Extracts keys from one document with `config`.
pub fn extract(source: &str, doc: &MarkupDocument, config: &Config) -> Extraction {
    Extractor::new(config).extract(source, doc)
}
