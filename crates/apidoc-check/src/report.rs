//! Summary of a checked snapshot.

use std::collections::BTreeMap;
use std::io::{self, Write};

use apidoc_schemas::{Diagnostic, ElementRecord, Validation};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Outcome of checking one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Package name of the snapshot.
    pub snapshot: String,
    /// Number of top-level elements.
    pub elements: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Top-level element count per kind. Both type alias codes count as
    /// `type alias`.
    pub kinds: BTreeMap<String, usize>,
    /// Deepest type expression in the snapshot.
    pub max_type_depth: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub(crate) fn new(
        snapshot: &str,
        records: &[ElementRecord],
        validation: Validation,
    ) -> Self {
        let kinds = records
            .iter()
            .map(|record| match record.kind {
                Some(tag) => tag.canonical().to_string(),
                None => "missing".to_owned(),
            })
            .counts()
            .into_iter()
            .collect();
        Self {
            snapshot: snapshot.to_owned(),
            elements: records.len(),
            errors: validation.errors().count(),
            warnings: validation.warnings().count(),
            kinds,
            max_type_depth: validation.max_type_depth,
            diagnostics: validation.diagnostics,
        }
    }

    /// Returns true if there are no errors, and no warnings either when
    /// `deny_warnings` is set.
    pub fn passes(&self, deny_warnings: bool) -> bool {
        self.errors == 0 && (!deny_warnings || self.warnings == 0)
    }

    /// Writes a human-readable report: a summary line, the per-kind counts
    /// and one line per diagnostic.
    pub fn write_text(&self, mut out: impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{}: {} elements, {} errors, {} warnings, max type depth {}",
            self.snapshot,
            self.elements,
            self.errors,
            self.warnings,
            self.max_type_depth,
        )?;
        if !self.kinds.is_empty() {
            let kinds = self
                .kinds
                .iter()
                .map(|(kind, count)| format!("{kind}: {count}"))
                .join(", ");
            writeln!(out, "  {kinds}")?;
        }
        for diag in &self.diagnostics {
            writeln!(out, "{diag}")?;
        }
        Ok(())
    }
}
