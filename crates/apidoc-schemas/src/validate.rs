//! Structural validation of snapshots.
//!
//! Snapshots come from a separate tool and may be malformed. Validation
//! checks the per-kind field-presence rules and reports every violation it
//! finds as a [`Diagnostic`]; it never stops at the first one.
//!
//! | shape     | requires                                                |
//! |-----------|---------------------------------------------------------|
//! | method    | non-empty `signatures`                                  |
//! | interface | `children` (may be empty)                               |
//! | class     | `children`, `allowOverwrites`; unique member names unless overwrites are allowed |
//! | enum      | `children`, each with `defaultValue` or `type`          |
//! | type alias, default props | `type`                                  |
//!
//! Unknown kind codes are warnings and the element is skipped. Absent
//! documentation, defaults and type parameters are never diagnosed.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::kind::{DocKind, KindTag};
use crate::record::{ElementRecord, Snapshot};
use crate::symbols::SymbolTable;
use crate::type_expr::{TypeExpr, TypeVariant};

/// How serious a diagnostic is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The element violates a shape rule and is dropped by conversion.
    Error,
    /// The element is usable; something was skipped or left unresolved.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Where a record appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    TopLevel,
    Member,
    EnumValue,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::TopLevel => f.write_str("top-level element"),
            Placement::Member => f.write_str("member"),
            Placement::EnumValue => f.write_str("enum value"),
        }
    }
}

/// The rule a diagnostic reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Issue {
    MissingKind,
    UnknownKind { raw: u32 },
    UnexpectedKind { placement: Placement },
    MissingSignatures,
    MissingChildren,
    MissingAllowOverwrites,
    DuplicateMember { member: String },
    EnumValueWithoutValue,
    MissingType,
    IgnoredField { field: String },
    UnresolvedReference { reference: String },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::UnknownKind { .. }
            | Issue::IgnoredField { .. }
            | Issue::UnresolvedReference { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingKind => f.write_str("no kind tag"),
            Issue::UnknownKind { raw } => {
                write!(f, "unknown kind tag {raw}; skipped")
            }
            Issue::UnexpectedKind { placement } => {
                write!(f, "kind is not valid for a {placement}")
            }
            Issue::MissingSignatures => {
                f.write_str("callable has no signatures")
            }
            Issue::MissingChildren => f.write_str("children list is missing"),
            Issue::MissingAllowOverwrites => {
                f.write_str("class does not declare allowOverwrites")
            }
            Issue::DuplicateMember { member } => write!(
                f,
                "member `{member}` is defined twice and allowOverwrites is false"
            ),
            Issue::EnumValueWithoutValue => {
                f.write_str("enum value has neither defaultValue nor type")
            }
            Issue::MissingType => f.write_str("type is missing"),
            Issue::IgnoredField { field } => write!(
                f,
                "field `{field}` does not apply to this kind; ignored"
            ),
            Issue::UnresolvedReference { reference } => write!(
                f,
                "back-reference `{reference}` does not resolve in this snapshot"
            ),
        }
    }
}

/// One validation finding, naming the offending element and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path of the element, e.g. `Camera.takePictureAsync`.
    pub path: String,
    pub kind: Option<KindTag>,
    #[serde(flatten)]
    pub issue: Issue,
}

impl Diagnostic {
    pub fn new(
        path: impl Into<String>,
        kind: Option<KindTag>,
        issue: Issue,
    ) -> Self {
        Self {
            severity: issue.severity(),
            path: path.into(),
            kind,
            issue,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.path)?;
        if let Some(kind) = self.kind {
            write!(f, " ({kind})")?;
        }
        write!(f, ": {}", self.issue)
    }
}

/// Result of validating one element or a whole snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub diagnostics: Vec<Diagnostic>,
    /// Deepest type expression seen.
    pub max_type_depth: usize,
}

impl Validation {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Returns true if no error was reported. Warnings are allowed.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Appends another validation, keeping diagnostic order.
    pub fn merge(&mut self, other: Validation) {
        self.diagnostics.extend(other.diagnostics);
        self.max_type_depth = self.max_type_depth.max(other.max_type_depth);
    }
}

/// Typed shape a top-level record converts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Namespace,
    Enum,
    Method,
    Accessor,
    Props,
    DefaultProps,
    TypeAlias,
    Interface,
    Class,
    Constant,
}

impl Shape {
    /// Picks the shape for a known kind, or `None` if the kind cannot be a
    /// top-level element.
    pub(crate) fn for_kind(kind: DocKind, name: &str) -> Option<Self> {
        let shape = match kind.canonical() {
            DocKind::Namespace | DocKind::Module | DocKind::Project => {
                Shape::Namespace
            }
            DocKind::Enum => Shape::Enum,
            DocKind::Function | DocKind::Method => Shape::Method,
            DocKind::Accessor => Shape::Accessor,
            DocKind::Class => Shape::Class,
            DocKind::Interface => Shape::Interface,
            DocKind::Variable if name == "defaultProps" => Shape::DefaultProps,
            DocKind::Variable => Shape::Constant,
            DocKind::TypeAlias if name.ends_with("Props") => Shape::Props,
            DocKind::TypeAlias => Shape::TypeAlias,
            _ => return None,
        };
        Some(shape)
    }

    /// Optional wire fields this shape keeps. `variant`, `comment` and
    /// `flags` apply to every shape.
    fn fields(self) -> &'static [&'static str] {
        match self {
            Shape::Namespace | Shape::Enum => &["children"],
            Shape::Method => &["signatures"],
            Shape::Accessor => &["getSignature", "setSignatures"],
            Shape::Props => &["type", "children", "extendedTypes"],
            Shape::DefaultProps | Shape::Constant => &["type", "defaultValue"],
            Shape::TypeAlias => &["type", "typeParameter"],
            Shape::Interface => &[
                "children",
                "typeParameter",
                "extendedTypes",
                "implementedTypes",
            ],
            Shape::Class => &[
                "type",
                "children",
                "typeParameter",
                "extendedTypes",
                "implementedTypes",
                "allowOverwrites",
            ],
        }
    }
}

/// Typed shape of a member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberShape {
    Property,
    Method,
    Accessor,
}

impl MemberShape {
    /// Picks the shape from the kind, or from the populated fields when the
    /// producer omitted the kind.
    fn for_record(record: &ElementRecord) -> Result<Self, Issue> {
        let Some(tag) = record.kind else {
            return Ok(if record.signatures.is_some() {
                MemberShape::Method
            } else if record.get_signature.is_some()
                || record.set_signatures.is_some()
            {
                MemberShape::Accessor
            } else {
                MemberShape::Property
            });
        };
        match tag.known() {
            None => Err(Issue::UnknownKind { raw: tag.raw() }),
            Some(kind) if kind.is_callable() => Ok(MemberShape::Method),
            Some(DocKind::Accessor) => Ok(MemberShape::Accessor),
            Some(
                DocKind::Property
                | DocKind::Variable
                | DocKind::Parameter
                | DocKind::EnumMember,
            ) => Ok(MemberShape::Property),
            Some(_) => Err(Issue::UnexpectedKind {
                placement: Placement::Member,
            }),
        }
    }

    fn fields(self) -> &'static [&'static str] {
        match self {
            MemberShape::Property => &[
                "type",
                "defaultValue",
                "overwrites",
                "implementationOf",
                "inheritedFrom",
            ],
            MemberShape::Method => &[
                "signatures",
                "overwrites",
                "implementationOf",
                "inheritedFrom",
            ],
            MemberShape::Accessor => &[
                "getSignature",
                "setSignatures",
                "overwrites",
                "implementationOf",
                "inheritedFrom",
            ],
        }
    }
}

/// Picks the shape of a top-level or namespace child record.
pub(crate) fn element_shape(record: &ElementRecord) -> Result<Shape, Issue> {
    let tag = record.kind.ok_or(Issue::MissingKind)?;
    let kind = tag.known().ok_or(Issue::UnknownKind { raw: tag.raw() })?;
    Shape::for_kind(kind, &record.name).ok_or(Issue::UnexpectedKind {
        placement: Placement::TopLevel,
    })
}

/// Picks the shape of a class, interface or props member.
pub(crate) fn member_shape(
    record: &ElementRecord,
) -> Result<MemberShape, Issue> {
    MemberShape::for_record(record)
}

/// Checks that a record may appear as an enum value.
pub(crate) fn enum_value_kind(record: &ElementRecord) -> Result<(), Issue> {
    let Some(tag) = record.kind else {
        return Ok(());
    };
    match tag.known() {
        None => Err(Issue::UnknownKind { raw: tag.raw() }),
        Some(DocKind::EnumMember | DocKind::Property | DocKind::Variable) => {
            Ok(())
        }
        Some(_) => Err(Issue::UnexpectedKind {
            placement: Placement::EnumValue,
        }),
    }
}

const COMMON_FIELDS: [&str; 3] = ["variant", "comment", "flags"];
const ENUM_VALUE_FIELDS: [&str; 2] = ["type", "defaultValue"];

/// Joins a parent path and a child name with a dot.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}.{name}")
    }
}

/// Accumulates diagnostics while walking records.
///
/// Checking continues below an element that has errors, so one pass
/// reports every violation in the tree.
struct Checker<'t> {
    table: Option<&'t SymbolTable>,
    validation: Validation,
}

impl<'t> Checker<'t> {
    fn new(table: Option<&'t SymbolTable>) -> Self {
        Self {
            table,
            validation: Validation::default(),
        }
    }

    fn report(&mut self, path: &str, kind: Option<KindTag>, issue: Issue) {
        self.validation
            .diagnostics
            .push(Diagnostic::new(path, kind, issue));
    }

    fn ignored_fields(
        &mut self,
        record: &ElementRecord,
        path: &str,
        allowed: &[&str],
    ) {
        for field in record.present_fields() {
            if !COMMON_FIELDS.contains(&field) && !allowed.contains(&field) {
                self.report(
                    path,
                    record.kind,
                    Issue::IgnoredField {
                        field: field.to_owned(),
                    },
                );
            }
        }
    }

    /// Walks every type expression owned by `record`, recording depth and
    /// checking the members of inline declarations under their own paths.
    fn types(&mut self, record: &ElementRecord, path: &str) {
        let path: Rc<str> = Rc::from(path);
        let mut stack: Vec<(&TypeExpr, usize, Rc<str>)> = record
            .own_types()
            .into_iter()
            .rev()
            .map(|root| (root, 1, Rc::clone(&path)))
            .collect();

        while let Some((node, depth, path)) = stack.pop() {
            self.validation.max_type_depth =
                self.validation.max_type_depth.max(depth);

            let mut next: Vec<(&TypeExpr, Rc<str>)> = node
                .operands()
                .into_iter()
                .map(|ty| (ty, Rc::clone(&path)))
                .collect();
            if let Some(decl) = &node.declaration {
                let own = decl.own_types().into_iter();
                next.extend(own.map(|ty| (ty, Rc::clone(&path))));
                for member in decl.children.iter().flatten() {
                    let member_path: Rc<str> =
                        child_path(&path, &member.name).into();
                    if node.variant() == TypeVariant::Reflection {
                        self.member_fields(member, &member_path);
                    }
                    let own = member.own_types().into_iter();
                    next.extend(own.map(|ty| (ty, Rc::clone(&member_path))));
                }
            }
            // Reversed so the first child is popped first.
            stack.extend(
                next.into_iter().rev().map(|(ty, path)| (ty, depth + 1, path)),
            );
        }
    }

    /// Resolves a back-reference unless the member is external or no table
    /// is available.
    fn reference(&mut self, record: &ElementRecord, path: &str, name: &str) {
        let Some(table) = self.table else {
            return;
        };
        if !record.flags.is_external && !table.contains(name) {
            self.report(
                path,
                record.kind,
                Issue::UnresolvedReference {
                    reference: name.to_owned(),
                },
            );
        }
    }

    /// Checks a top-level (or namespace child) record and everything below.
    fn element(&mut self, record: &ElementRecord, path: &str) {
        let kind = record.kind;
        let shape = match element_shape(record) {
            Ok(shape) => shape,
            Err(issue) => {
                self.report(path, kind, issue);
                return;
            }
        };

        self.ignored_fields(record, path, shape.fields());
        match shape {
            Shape::Method => {
                if record.signatures.as_ref().is_none_or(Vec::is_empty) {
                    self.report(path, kind, Issue::MissingSignatures);
                }
            }
            Shape::Enum | Shape::Interface => {
                if record.children.is_none() {
                    self.report(path, kind, Issue::MissingChildren);
                }
            }
            Shape::Class => {
                if record.children.is_none() {
                    self.report(path, kind, Issue::MissingChildren);
                }
                match record.allow_overwrites {
                    None => {
                        self.report(path, kind, Issue::MissingAllowOverwrites);
                    }
                    Some(false) => self.duplicates(record, path),
                    Some(true) => {}
                }
            }
            Shape::TypeAlias | Shape::DefaultProps => {
                if record.ty.is_none() {
                    self.report(path, kind, Issue::MissingType);
                }
            }
            Shape::Namespace
            | Shape::Accessor
            | Shape::Props
            | Shape::Constant => {}
        }
        self.types(record, path);

        for child in record.children.iter().flatten() {
            let child_path = child_path(path, &child.name);
            match shape {
                Shape::Namespace => self.element(child, &child_path),
                Shape::Enum => self.enum_value(child, &child_path),
                Shape::Interface | Shape::Class | Shape::Props => {
                    self.member_fields(child, &child_path);
                    self.types(child, &child_path);
                }
                // Reported as ignored above.
                Shape::Method
                | Shape::Accessor
                | Shape::DefaultProps
                | Shape::TypeAlias
                | Shape::Constant => {}
            }
        }
    }

    /// Reports each member name that appears more than once, whether the
    /// members are static or not.
    fn duplicates(&mut self, record: &ElementRecord, path: &str) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for child in record.children.iter().flatten() {
            let name = child.name.as_str();
            if !seen.insert(name) && reported.insert(name) {
                self.report(
                    path,
                    record.kind,
                    Issue::DuplicateMember {
                        member: child.name.clone(),
                    },
                );
            }
        }
    }

    /// Checks a member's own fields without walking its types.
    fn member_fields(&mut self, record: &ElementRecord, path: &str) {
        let shape = match member_shape(record) {
            Ok(shape) => shape,
            Err(issue) => {
                self.report(path, record.kind, issue);
                return;
            }
        };

        self.ignored_fields(record, path, shape.fields());
        if shape == MemberShape::Method
            && record.signatures.as_ref().is_none_or(Vec::is_empty)
        {
            self.report(path, record.kind, Issue::MissingSignatures);
        }
        if let Some(inherited) = &record.inherited_from {
            self.reference(record, path, &inherited.name);
        }
        if let Some(name) = record
            .overwrites
            .as_ref()
            .and_then(|ty| ty.name.as_deref())
        {
            self.reference(record, path, name);
        }
    }

    fn enum_value(&mut self, record: &ElementRecord, path: &str) {
        if let Err(issue) = enum_value_kind(record) {
            self.report(path, record.kind, issue);
            return;
        }
        self.ignored_fields(record, path, &ENUM_VALUE_FIELDS);
        if record.default_value.is_none() && record.ty.is_none() {
            self.report(path, record.kind, Issue::EnumValueWithoutValue);
        }
        self.types(record, path);
    }
}

/// Validates one top-level record and everything below it.
///
/// Back-references are checked only when a `table` is given.
pub fn validate_element(
    record: &ElementRecord,
    table: Option<&SymbolTable>,
) -> Validation {
    let mut checker = Checker::new(table);
    checker.element(record, &record.name);
    checker.validation
}

impl Snapshot {
    /// Validates every top-level element, resolving back-references against
    /// this snapshot.
    pub fn validate(&self) -> Validation {
        let table = SymbolTable::build(self);
        let mut validation = Validation::default();
        for record in &self.children {
            validation.merge(validate_element(record, Some(&table)));
        }
        validation
    }
}
