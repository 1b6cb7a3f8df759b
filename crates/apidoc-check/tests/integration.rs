//! Integration tests for apidoc-check.
//!
//! These tests run the public API over snapshot fixtures in
//! `tests/fixtures`.

use std::fs::File;

use apidoc_check::{
    CheckOptions, NormalizeOptions, Report, ReportFormat, check, normalize,
};
use apidoc_schemas::{DocElement, DocKind, Issue, Severity, Snapshot};

fn fixture(name: &str) -> File {
    File::open(format!("tests/fixtures/{name}"))
        .expect("fixture should exist")
}

fn check_fixture(name: &str) -> Report {
    let mut output = Vec::new();
    let report = check(fixture(name), &mut output, &CheckOptions::default())
        .expect("check() should succeed");

    let written: Report = serde_json::from_slice(&output)
        .expect("check() should output a JSON report");
    assert_eq!(written, report);
    report
}

/// A well-formed snapshot passes with no diagnostics at all.
#[test]
fn test_valid_snapshot() {
    let report = check_fixture("camera.json");

    assert!(
        report.diagnostics.is_empty(),
        "unexpected diagnostics: {:#?}",
        report.diagnostics
    );
    assert!(report.passes(true));
    assert_eq!(report.snapshot, "expo-camera");
    assert_eq!(report.elements, 8);
    assert_eq!(report.kinds["class"], 2);
    // `CameraProps` uses the legacy code, `FlashMode` the current one.
    assert_eq!(report.kinds["type alias"], 2);
    assert_eq!(report.max_type_depth, 4);
}

/// Every element of a well-formed snapshot converts to its typed shape.
#[test]
fn test_valid_snapshot_shapes() {
    let snapshot: Snapshot = serde_json::from_reader(fixture("camera.json"))
        .expect("fixture should parse");
    let conversion = snapshot.into_elements();

    let shapes: Vec<_> = conversion
        .elements
        .iter()
        .map(|element| (element.name(), element.shape_name()))
        .collect();
    assert_eq!(
        shapes,
        [
            ("CameraType", "enum"),
            ("BaseView", "class"),
            ("Camera", "class"),
            ("CameraProps", "props"),
            ("FlashMode", "type alias"),
            ("PictureOptions", "interface"),
            ("requestCameraPermissionsAsync", "method"),
            ("defaultProps", "default props"),
        ]
    );

    let camera = &conversion.elements[2];
    assert_eq!(camera.members().len(), 4);
    let DocElement::Class {
        allow_overwrites, ..
    } = camera
    else {
        panic!("Camera should be a class");
    };
    assert!(*allow_overwrites);
}

/// A malformed snapshot yields one diagnostic per violation, in element
/// order, and the check itself still succeeds.
#[test]
fn test_malformed_snapshot() {
    let report = check_fixture("malformed.json");

    let found: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.path.as_str(), &d.issue))
        .collect();
    assert_eq!(
        found,
        [
            ("reloadAsync", &Issue::MissingSignatures),
            ("Session", &Issue::MissingAllowOverwrites),
            (
                "Recorder",
                &Issue::DuplicateMember {
                    member: "start".to_owned()
                }
            ),
            (
                "Recorder.stop",
                &Issue::UnresolvedReference {
                    reference: "Missing.stop".to_owned()
                }
            ),
            ("Quality.low", &Issue::EnumValueWithoutValue),
            ("Options", &Issue::MissingChildren),
            ("Untyped", &Issue::MissingType),
            ("orphan", &Issue::MissingKind),
            (
                "zoom",
                &Issue::UnexpectedKind {
                    placement: apidoc_schemas::Placement::TopLevel
                }
            ),
            ("FutureThing", &Issue::UnknownKind { raw: 8_388_608 }),
            (
                "VERSION",
                &Issue::IgnoredField {
                    field: "signatures".to_owned()
                }
            ),
        ]
    );
    assert_eq!(report.errors, 8);
    assert_eq!(report.warnings, 3);
    assert!(!report.passes(false));

    let session = &report.diagnostics[1];
    assert_eq!(session.severity, Severity::Error);
    assert_eq!(session.kind, Some(DocKind::Class.into()));
}

/// The text report carries the summary and one line per diagnostic.
#[test]
fn test_text_report() {
    let mut output = Vec::new();
    let options = CheckOptions {
        format: ReportFormat::Text,
    };
    check(fixture("malformed.json"), &mut output, &options)
        .expect("check() should succeed");
    let text = String::from_utf8(output).expect("text report is UTF-8");

    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("expo-broken: 10 elements, 8 errors, 3 warnings, max type depth 1")
    );
    assert!(text.contains(
        "error: reloadAsync (method): callable has no signatures"
    ));
    assert!(text.contains("warning: FutureThing (unknown(8388608))"));
    assert_eq!(text.lines().count(), 2 + 11);
}

/// Normalizing keeps only valid elements and strips ignored fields.
#[test]
fn test_normalize_malformed() {
    let mut output = Vec::new();
    let report = normalize(
        fixture("malformed.json"),
        &mut output,
        &NormalizeOptions::default(),
    )
    .expect("normalize() should succeed");
    assert_eq!(report.errors, 8);

    let cleaned: Snapshot =
        serde_json::from_slice(&output).expect("output should be a snapshot");
    assert_eq!(cleaned.name, "expo-broken");
    assert_eq!(cleaned.children.len(), 1);
    let version = &cleaned.children[0];
    assert_eq!(version.name, "VERSION");
    assert!(version.signatures.is_none());
    assert_eq!(version.default_value.as_deref(), Some("'1.0'"));
}

/// Normalizing a valid snapshot changes nothing.
#[test]
fn test_normalize_valid_is_identity() {
    let original: Snapshot = serde_json::from_reader(fixture("camera.json"))
        .expect("fixture should parse");

    let mut output = Vec::new();
    normalize(
        fixture("camera.json"),
        &mut output,
        &NormalizeOptions::default(),
    )
    .expect("normalize() should succeed");

    let cleaned: Snapshot =
        serde_json::from_slice(&output).expect("output should be a snapshot");
    assert_eq!(cleaned, original);
}

/// Type expressions nested fifty levels deep survive checking and
/// normalization.
#[test]
fn test_deep_type_expressions() {
    let report = check_fixture("deep_types.json");
    assert!(report.passes(true));
    assert_eq!(report.max_type_depth, 50);

    let mut output = Vec::new();
    normalize(
        fixture("deep_types.json"),
        &mut output,
        &NormalizeOptions::default(),
    )
    .expect("normalize() should succeed");
    let cleaned: Snapshot =
        serde_json::from_slice(&output).expect("output should be a snapshot");
    let ty = cleaned.children[0].ty.as_ref().expect("alias keeps its type");
    assert_eq!(ty.depth(), 50);
}

/// Builds a snapshot holding one type alias whose type nests `depth` levels.
/// Each level is `open`, the next level, then `close`; the innermost level
/// is an intrinsic.
fn nested_snapshot(depth: usize, open: &str, close: &str) -> String {
    let leaf = r#"{"type": "intrinsic", "name": "string"}"#;
    let ty = format!(
        "{}{leaf}{}",
        open.repeat(depth - 1),
        close.repeat(depth - 1)
    );
    format!(
        r#"{{"name": "deep", "children": [
            {{"name": "Nested", "kind": 2097152, "type": {ty}}}
        ]}}"#
    )
}

/// Nesting far past the JSON parser's default recursion limit still loads
/// and is measured exactly.
#[test]
fn test_very_deep_type_expressions() {
    let arrays =
        nested_snapshot(1000, r#"{"type": "array", "elementType": "#, "}");
    let unions = nested_snapshot(
        1000,
        r#"{"type": "union", "types": ["#,
        r#", {"type": "literal", "value": null}]}"#,
    );

    for json in [arrays, unions] {
        let report =
            check(json.as_bytes(), Vec::new(), &CheckOptions::default())
                .expect("deep snapshot should load");
        assert!(report.passes(true), "{:#?}", report.diagnostics);
        assert_eq!(report.elements, 1);
        assert_eq!(report.max_type_depth, 1000);
    }
}
