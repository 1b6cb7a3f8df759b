//! Validation and normalization of API reference snapshots.
//!
//! A snapshot is produced by an external extractor and may be malformed or
//! come from a newer extractor version. This crate reads one snapshot,
//! validates every top-level element, and either reports what it found
//! ([`check`]) or writes a cleaned snapshot that holds only the valid
//! elements ([`normalize`]).
//!
//! Top-level elements share no mutable state, so they are validated in
//! parallel against one read-only symbol table.
//!
//! ## Usage
//!
//! ```no_run
//! use apidoc_check::{CheckOptions, check};
//!
//! let input = std::io::stdin().lock();
//! let mut output = Vec::new();
//! let report = check(input, &mut output, &CheckOptions::default()).unwrap();
//! assert!(report.passes(false));
//! ```

mod error;
mod report;

use std::io::{Read, Write};

use apidoc_schemas::{
    Comment, DocElement, ElementRecord, Issue, Snapshot, SymbolTable,
    Validation, validate_element,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

#[doc(inline)]
pub use crate::error::CheckError;
#[doc(inline)]
pub use crate::report::Report;

/// How [`check`] writes its report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// One summary line followed by one line per diagnostic.
    Text,
}

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Also drop elements and members marked `@hidden` or `@internal`.
    pub drop_hidden: bool,
}

/// Parses a whole snapshot. Type expressions may nest to any depth, so the
/// parser's recursion limit is off and the stack grows on demand.
fn read_snapshot(mut input: impl Read) -> Result<Snapshot, CheckError> {
    let mut json = String::new();
    input.read_to_string(&mut json).map_err(CheckError::read)?;

    let mut de = serde_json::Deserializer::from_str(&json);
    de.disable_recursion_limit();
    let stacked = serde_stacker::Deserializer::new(&mut de);
    let snapshot = Snapshot::deserialize(stacked).map_err(CheckError::parse)?;
    de.end().map_err(CheckError::parse)?;
    Ok(snapshot)
}

fn write_json<T: Serialize>(
    mut output: impl Write,
    value: &T,
) -> Result<(), CheckError> {
    serde_json::to_writer_pretty(&mut output, value)
        .map_err(CheckError::encode)?;
    writeln!(output).map_err(CheckError::write)
}

/// Validates every top-level element in parallel. Diagnostics keep
/// producer order.
fn validate_snapshot(snapshot: &Snapshot) -> Validation {
    let table = SymbolTable::build(snapshot);
    debug!(symbols = table.len(), "built symbol table");

    let per_element: Vec<Validation> = snapshot
        .children
        .par_iter()
        .map(|record| validate_element(record, Some(&table)))
        .collect();

    let mut validation = Validation::default();
    for element in per_element {
        validation.merge(element);
    }
    log_skipped(&validation);
    validation
}

fn log_skipped(validation: &Validation) {
    for diag in &validation.diagnostics {
        if let Issue::UnknownKind { raw } = diag.issue {
            warn!(path = %diag.path, raw, "skipping element of unknown kind");
        }
    }
}

/// Reads a snapshot, validates it and writes a report.
///
/// Diagnostics never make this fail; inspect the returned [`Report`].
///
/// # Errors
///
/// Returns [`CheckError`] if:
/// - Reading from input fails ([`CheckError::is_io`])
/// - The input is not a snapshot ([`CheckError::is_deserialization`])
/// - Writing the report fails ([`CheckError::is_io`],
///   [`CheckError::is_serialization`])
pub fn check(
    input: impl Read,
    mut output: impl Write,
    options: &CheckOptions,
) -> Result<Report, CheckError> {
    let _span = debug_span!("check").entered();

    let snapshot = read_snapshot(input)?;
    let validation = validate_snapshot(&snapshot);
    let report = Report::new(&snapshot.name, &snapshot.children, validation);
    debug!(
        elements = report.elements,
        errors = report.errors,
        warnings = report.warnings,
        "checked snapshot"
    );

    match options.format {
        ReportFormat::Json => write_json(&mut output, &report)?,
        ReportFormat::Text => {
            report.write_text(&mut output).map_err(CheckError::write)?;
        }
    }
    Ok(report)
}

/// Reads a snapshot and writes it back holding only valid elements.
///
/// Invalid elements and elements of unknown kind are dropped, as are fields
/// that do not apply to an element's kind. The returned report lists why.
///
/// # Errors
///
/// Same as [`check`].
pub fn normalize(
    input: impl Read,
    output: impl Write,
    options: &NormalizeOptions,
) -> Result<Report, CheckError> {
    let _span = debug_span!("normalize").entered();

    let snapshot = read_snapshot(input)?;
    let name = snapshot.name.clone();
    let kind = snapshot.kind;
    let records = snapshot.children.clone();

    let conversion = snapshot.into_elements();
    log_skipped(&conversion.validation);
    let mut elements = conversion.elements;
    if options.drop_hidden {
        elements = drop_hidden(elements);
    }
    debug!(
        kept = elements.len(),
        dropped = records.len() - elements.len(),
        "normalized snapshot"
    );

    let cleaned = Snapshot {
        name,
        kind,
        children: elements.into_iter().map(ElementRecord::from).collect(),
    };
    write_json(output, &cleaned)?;
    Ok(Report::new(&cleaned.name, &records, conversion.validation))
}

fn is_hidden(comment: Option<&Comment>) -> bool {
    comment.is_some_and(Comment::is_hidden)
}

/// Removes hidden elements and hidden members, descending into namespaces.
fn drop_hidden(elements: Vec<DocElement>) -> Vec<DocElement> {
    elements
        .into_iter()
        .filter(|element| !is_hidden(element.header().comment.as_ref()))
        .map(|mut element| {
            match &mut element {
                DocElement::Namespace { children, .. } => {
                    *children = drop_hidden(std::mem::take(children));
                }
                DocElement::Interface { members, .. }
                | DocElement::Class { members, .. }
                | DocElement::Props {
                    members: Some(members),
                    ..
                } => {
                    members.retain(|m| !is_hidden(m.comment.as_ref()));
                }
                _ => {}
            }
            element
        })
        .collect()
}

/// Writes the JSON Schema of the snapshot format.
///
/// # Errors
///
/// Returns [`CheckError`] if writing fails.
pub fn write_json_schema(output: impl Write) -> Result<(), CheckError> {
    let schema = schemars::schema_for!(Snapshot);
    write_json(output, &schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "name": "expo-camera",
        "children": [
            {"name": "Camera", "kind": 128, "allowOverwrites": false, "children": [
                {"name": "zoom", "kind": 1024, "type": {"type": "intrinsic", "name": "number"}},
                {"name": "legacyZoom", "kind": 1024,
                 "comment": {"summary": [], "modifierTags": ["@hidden"]},
                 "type": {"type": "intrinsic", "name": "number"}}
            ]},
            {"name": "reloadAsync", "kind": 64, "signatures": []},
            {"name": "Internal", "kind": 4194304,
             "comment": {"summary": [], "modifierTags": ["@internal"]},
             "type": {"type": "intrinsic", "name": "string"}},
            {"name": "Future", "kind": 8388608}
        ]
    }"#;

    #[test]
    fn check_reports_without_failing() {
        let mut out = Vec::new();
        let report =
            check(SNAPSHOT.as_bytes(), &mut out, &CheckOptions::default())
                .unwrap();

        assert_eq!(report.snapshot, "expo-camera");
        assert_eq!(report.elements, 4);
        assert_eq!(report.errors, 1);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.kinds["type alias"], 1);

        let parsed: Report = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn check_writes_text() {
        let options = CheckOptions {
            format: ReportFormat::Text,
        };
        let mut out = Vec::new();
        check(SNAPSHOT.as_bytes(), &mut out, &options).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("expo-camera: 4 elements, 1 errors"));
        assert!(text.contains("error: reloadAsync (function)"));
    }

    #[test]
    fn check_rejects_non_snapshots() {
        let err = check(
            "not a snapshot".as_bytes(),
            Vec::new(),
            &CheckOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_deserialization());
    }

    #[test]
    fn normalize_keeps_valid_elements() {
        let mut out = Vec::new();
        let report = normalize(
            SNAPSHOT.as_bytes(),
            &mut out,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(report.errors, 1);

        let cleaned: Snapshot = serde_json::from_slice(&out).unwrap();
        let names: Vec<_> =
            cleaned.children.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Camera", "Internal"]);
        assert_eq!(cleaned.children[0].children.as_ref().unwrap().len(), 2);
        // The legacy code survives normalization.
        assert_eq!(cleaned.children[1].kind.unwrap().raw(), 4_194_304);
    }

    #[test]
    fn normalize_drops_hidden() {
        let mut out = Vec::new();
        normalize(
            SNAPSHOT.as_bytes(),
            &mut out,
            &NormalizeOptions { drop_hidden: true },
        )
        .unwrap();

        let cleaned: Snapshot = serde_json::from_slice(&out).unwrap();
        assert_eq!(cleaned.children.len(), 1);
        let members = cleaned.children[0].children.as_ref().unwrap();
        let names: Vec<_> = members.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["zoom"]);
    }

    #[test]
    fn schema_is_json() {
        let mut out = Vec::new();
        write_json_schema(&mut out).unwrap();
        let schema: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(schema["title"], "Snapshot");
    }
}
