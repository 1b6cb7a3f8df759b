//! The wide interchange record and the snapshot root.
//!
//! Producers emit one broad record shape for every documented element and
//! member: all fields any shape uses, each optional. [`crate::DocElement`]
//! is the typed view; [`ElementRecord`] is what crosses the boundary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use ts_rs::TS;

use crate::comment::Comment;
use crate::kind::KindTag;
use crate::signature::{Flags, Signature, TypeParameter};
use crate::type_expr::TypeExpr;

/// One documented element or member as it appears on the wire.
#[skip_serializing_none]
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS,
)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub name: String,

    /// Kind code. Optional for members; required for top-level elements.
    pub kind: Option<KindTag>,

    /// Producer's reflection variant, e.g. `declaration`.
    pub variant: Option<String>,

    pub comment: Option<Comment>,

    #[serde(default, skip_serializing_if = "Flags::is_empty")]
    pub flags: Flags,

    /// Declared type: the value type of a property, constant or enum value,
    /// the aliased type of a type alias.
    #[serde(rename = "type")]
    pub ty: Option<TypeExpr>,

    /// Source text of an initializer or enum value.
    pub default_value: Option<String>,

    /// Members, enum values or namespace children, in declaration order.
    pub children: Option<Vec<ElementRecord>>,

    /// Call signatures; overloads appear in declaration order.
    pub signatures: Option<Vec<Signature>>,

    /// Getter of an accessor. Producers emit one signature or a list.
    pub get_signature: Option<OneOrMany<Signature>>,

    pub set_signatures: Option<Vec<Signature>>,

    pub type_parameter: Option<Vec<TypeParameter>>,

    /// Extended types, in declaration order.
    pub extended_types: Option<Vec<TypeExpr>>,

    /// Implemented types, in declaration order.
    pub implemented_types: Option<Vec<TypeExpr>>,

    /// Set on classes: a later merge step may redefine members with the
    /// same name.
    pub allow_overwrites: Option<bool>,

    /// The inherited member this one replaces.
    pub overwrites: Option<TypeExpr>,

    /// The interface member this one implements.
    pub implementation_of: Option<TypeExpr>,

    /// The ancestor this member was inherited from.
    pub inherited_from: Option<InheritedFrom>,
}

/// Either a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }
}

/// Non-owning back-reference to the ancestor a member came from.
///
/// `name` is resolved through [`crate::SymbolTable`], never embedded.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, TS,
)]
pub struct InheritedFrom {
    #[serde(rename = "type", default)]
    pub kind: ReferenceMarker,
    pub name: String,
}

impl InheritedFrom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: ReferenceMarker::Reference,
            name: name.into(),
        }
    }
}

/// The only discriminant a back-reference may carry.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    TS,
)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceMarker {
    #[default]
    Reference,
}

/// One complete extraction run: the documented elements of a package.
#[skip_serializing_none]
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Snapshot {
    #[serde(default)]
    pub name: String,
    pub kind: Option<KindTag>,
    /// Top-level elements, in producer order.
    #[serde(default)]
    pub children: Vec<ElementRecord>,
}

impl ElementRecord {
    /// Creates a record with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Wire names of the optional fields that are populated, excluding
    /// `kind`.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("variant", self.variant.is_some()),
            ("comment", self.comment.is_some()),
            ("flags", !self.flags.is_empty()),
            ("type", self.ty.is_some()),
            ("defaultValue", self.default_value.is_some()),
            ("children", self.children.is_some()),
            ("signatures", self.signatures.is_some()),
            ("getSignature", self.get_signature.is_some()),
            ("setSignatures", self.set_signatures.is_some()),
            ("typeParameter", self.type_parameter.is_some()),
            ("extendedTypes", self.extended_types.is_some()),
            ("implementedTypes", self.implemented_types.is_some()),
            ("allowOverwrites", self.allow_overwrites.is_some()),
            ("overwrites", self.overwrites.is_some()),
            ("implementationOf", self.implementation_of.is_some()),
            ("inheritedFrom", self.inherited_from.is_some()),
        ];
        fields
            .into_iter()
            .filter_map(|(field, present)| present.then_some(field))
            .collect()
    }

    /// Type expressions held directly by this record, not counting its
    /// children or back-references.
    pub fn own_types(&self) -> Vec<&TypeExpr> {
        let mut out: Vec<&TypeExpr> = self.ty.iter().collect();
        let signatures = self
            .signatures
            .iter()
            .flatten()
            .chain(self.get_signature.iter().flat_map(OneOrMany::as_slice))
            .chain(self.set_signatures.iter().flatten());
        for sig in signatures {
            out.extend(sig.types());
        }
        for tp in self.type_parameter.iter().flatten() {
            out.extend(tp.ty.iter().chain(tp.default.iter()));
        }
        out.extend(self.extended_types.iter().flatten());
        out.extend(self.implemented_types.iter().flatten());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::DocKind;

    #[test]
    fn get_signature_accepts_one_or_many() {
        let one: ElementRecord = serde_json::from_str(
            r#"{"name":"size","kind":262144,"getSignature":{"name":"size","type":{"type":"intrinsic","name":"number"}}}"#,
        )
        .unwrap();
        let many: ElementRecord = serde_json::from_str(
            r#"{"name":"size","kind":262144,"getSignature":[{"name":"size"}]}"#,
        )
        .unwrap();

        assert!(matches!(one.get_signature, Some(OneOrMany::One(_))));
        assert!(matches!(many.get_signature, Some(OneOrMany::Many(_))));
        assert_eq!(one.get_signature.unwrap().as_slice().len(), 1);
    }

    #[test]
    fn absent_fields_stay_absent() {
        let json = r#"{"name":"VERSION","kind":32}"#;
        let record: ElementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, Some(DocKind::Variable.into()));
        assert!(record.present_fields().is_empty());
        assert_eq!(serde_json::to_string(&record).unwrap(), json);
    }

    #[test]
    fn field_order_is_irrelevant() {
        let a: ElementRecord =
            serde_json::from_str(r#"{"kind":128,"name":"A","children":[]}"#)
                .unwrap();
        let b: ElementRecord =
            serde_json::from_str(r#"{"children":[],"name":"A","kind":128}"#)
                .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn inherited_from_requires_reference() {
        let ok: InheritedFrom =
            serde_json::from_str(r#"{"type":"reference","name":"Base.size"}"#)
                .unwrap();
        assert_eq!(ok, InheritedFrom::new("Base.size"));

        let bad = serde_json::from_str::<InheritedFrom>(
            r#"{"type":"union","name":"Base.size"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn present_fields_reports_populated_options() {
        let record = ElementRecord {
            signatures: Some(vec![]),
            allow_overwrites: Some(false),
            ..ElementRecord::named("x")
        };
        assert_eq!(
            record.present_fields(),
            ["signatures", "allowOverwrites"]
        );
    }
}
