//! Kind tags identifying the syntactic category of a documented element.
//!
//! The numeric codes mirror the reflection tool that produces snapshots.
//! They are persisted and compared by external tooling, so a code never
//! changes meaning once published.
//!
//! Two codes denote a type alias: [`DocKind::TypeAlias`] (2097152) and
//! [`DocKind::TypeAliasLegacy`] (4194304, emitted by older tool versions).
//! They interpret as the same concept ([`KindTag::is_type_alias`]) but stay
//! distinct values in stored data: `KindTag` equality is raw equality.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A kind code known to this crate.
///
/// The declaration order below is the numeric order of the codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum DocKind {
    Project = 1,
    Module = 2,
    Namespace = 4,
    Enum = 8,
    EnumMember = 16,
    Variable = 32,
    Function = 64,
    Class = 128,
    Interface = 256,
    Constructor = 512,
    Property = 1024,
    Method = 2048,
    CallSignature = 4096,
    IndexSignature = 8192,
    ConstructorSignature = 16384,
    Parameter = 32768,
    TypeLiteral = 65536,
    TypeParameter = 131_072,
    Accessor = 262_144,
    GetSignature = 524_288,
    SetSignature = 1_048_576,
    TypeAlias = 2_097_152,
    TypeAliasLegacy = 4_194_304,
}

impl DocKind {
    /// Every known kind, in ascending code order.
    pub const ALL: [DocKind; 23] = [
        DocKind::Project,
        DocKind::Module,
        DocKind::Namespace,
        DocKind::Enum,
        DocKind::EnumMember,
        DocKind::Variable,
        DocKind::Function,
        DocKind::Class,
        DocKind::Interface,
        DocKind::Constructor,
        DocKind::Property,
        DocKind::Method,
        DocKind::CallSignature,
        DocKind::IndexSignature,
        DocKind::ConstructorSignature,
        DocKind::Parameter,
        DocKind::TypeLiteral,
        DocKind::TypeParameter,
        DocKind::Accessor,
        DocKind::GetSignature,
        DocKind::SetSignature,
        DocKind::TypeAlias,
        DocKind::TypeAliasLegacy,
    ];

    /// Returns the numeric code of this kind.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up the kind for a numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Returns true for either type alias code.
    pub const fn is_type_alias(self) -> bool {
        matches!(self, DocKind::TypeAlias | DocKind::TypeAliasLegacy)
    }

    /// Maps a kind to the representative of its concept.
    ///
    /// Only the legacy type alias code is remapped.
    #[must_use]
    pub const fn canonical(self) -> Self {
        match self {
            DocKind::TypeAliasLegacy => DocKind::TypeAlias,
            other => other,
        }
    }

    /// Returns true if both kinds denote the same concept.
    pub fn same_concept(self, other: DocKind) -> bool {
        self.canonical() == other.canonical()
    }

    /// Human-readable label, as used in diagnostics and reports.
    pub const fn label(self) -> &'static str {
        match self {
            DocKind::Project => "project",
            DocKind::Module => "module",
            DocKind::Namespace => "namespace",
            DocKind::Enum => "enum",
            DocKind::EnumMember => "enum member",
            DocKind::Variable => "variable",
            DocKind::Function => "function",
            DocKind::Class => "class",
            DocKind::Interface => "interface",
            DocKind::Constructor => "constructor",
            DocKind::Property => "property",
            DocKind::Method => "method",
            DocKind::CallSignature => "call signature",
            DocKind::IndexSignature => "index signature",
            DocKind::ConstructorSignature => "constructor signature",
            DocKind::Parameter => "parameter",
            DocKind::TypeLiteral => "type literal",
            DocKind::TypeParameter => "type parameter",
            DocKind::Accessor => "accessor",
            DocKind::GetSignature => "get signature",
            DocKind::SetSignature => "set signature",
            DocKind::TypeAlias => "type alias",
            DocKind::TypeAliasLegacy => "type alias (legacy)",
        }
    }

    /// Returns true for kinds that describe callables carrying signatures.
    pub const fn is_callable(self) -> bool {
        matches!(
            self,
            DocKind::Function | DocKind::Method | DocKind::Constructor
        )
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The kind code as stored in a snapshot.
///
/// Any `u32` deserializes, including codes this crate does not know, so a
/// snapshot from a newer producer still loads. Validation reports unknown
/// codes as warnings.
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
    JsonSchema,
    TS,
)]
#[serde(transparent)]
pub struct KindTag(u32);

impl KindTag {
    /// Wraps a raw code.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw code.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the known kind for this code, if any.
    pub fn known(self) -> Option<DocKind> {
        DocKind::from_code(self.0)
    }

    /// Returns true if this code denotes the same concept as `kind`.
    ///
    /// Unlike `==`, both type alias codes match `DocKind::TypeAlias`.
    pub fn is(self, kind: DocKind) -> bool {
        self.known().is_some_and(|known| known.same_concept(kind))
    }

    /// Returns true for either type alias code.
    pub fn is_type_alias(self) -> bool {
        self.known().is_some_and(DocKind::is_type_alias)
    }

    /// Returns the tag of the concept's representative code.
    ///
    /// Used for grouping; stored data keeps the original code.
    #[must_use]
    pub fn canonical(self) -> Self {
        self.known()
            .map_or(self, |known| Self(known.canonical().code()))
    }
}

impl From<DocKind> for KindTag {
    fn from(kind: DocKind) -> Self {
        Self(kind.code())
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.known() {
            Some(kind) => f.write_str(kind.label()),
            None => write!(f, "unknown({})", self.0),
        }
    }
}
