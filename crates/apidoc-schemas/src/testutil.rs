//! Shared proptest strategies for schema tests.

use proptest::prelude::*;

use crate::comment::{Comment, CommentContent};
use crate::kind::DocKind;
use crate::record::{ElementRecord, Snapshot};
use crate::signature::{Flags, Parameter, Signature};
use crate::type_expr::{LiteralValue, TemplateSpan, TypeExpr};

/// Strategy for generating arbitrary identifier-like names.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,19}"
}

/// Literal values that survive a JSON round trip exactly. Floats are left
/// out because not every `f64` prints back to the same bits.
pub fn arb_literal() -> impl Strategy<Value = LiteralValue> {
    prop_oneof![
        Just(LiteralValue::Null),
        any::<bool>().prop_map(LiteralValue::Bool),
        any::<i64>().prop_map(LiteralValue::Integer),
        "[ -~]{0,12}".prop_map(LiteralValue::String),
    ]
}

/// Strategy for type expression trees up to a few levels deep.
pub fn arb_type_expr() -> impl Strategy<Value = TypeExpr> {
    let leaf = prop_oneof![
        prop::sample::select(vec!["string", "number", "boolean", "void"])
            .prop_map(TypeExpr::intrinsic),
        arb_literal().prop_map(TypeExpr::literal),
        arb_name().prop_map(|name| TypeExpr::reference(name, vec![])),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(TypeExpr::union),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(TypeExpr::tuple),
            inner.clone().prop_map(TypeExpr::array),
            (arb_name(), prop::collection::vec(inner.clone(), 1..3))
                .prop_map(|(name, args)| TypeExpr::reference(name, args)),
            inner.clone().prop_map(|t| TypeExpr::type_operator("keyof", t)),
            (inner.clone(), inner.clone())
                .prop_map(|(o, i)| TypeExpr::indexed_access(o, i)),
            (inner.clone(), inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, e, t, f)| TypeExpr::conditional(c, e, t, f)),
            (arb_name(), inner.clone(), arb_name()).prop_map(
                |(head, ty, text)| {
                    TypeExpr::template_literal(
                        head,
                        vec![TemplateSpan(ty, text)],
                    )
                }
            ),
        ]
    })
}

prop_compose! {
    /// Strategy for comments with a plain-text summary.
    pub fn arb_comment()(
        summary in "[a-zA-Z ]{0,30}",
        deprecated in any::<bool>(),
    ) -> Comment {
        let mut comment = Comment {
            summary: vec![CommentContent::text(summary)],
            ..Comment::default()
        };
        if deprecated {
            comment.modifier_tags.insert("@deprecated".to_owned());
        }
        comment
    }
}

prop_compose! {
    pub fn arb_signature()(
        name in arb_name(),
        params in prop::collection::vec((arb_name(), arb_type_expr()), 0..3),
        returns in arb_type_expr(),
    ) -> Signature {
        let parameters = params
            .into_iter()
            .map(|(name, ty)| Parameter::new(name, ty))
            .collect();
        Signature::new(name, parameters, returns)
    }
}

prop_compose! {
    /// Strategy for class members: properties or methods.
    pub fn arb_member()(
        name in arb_name(),
        ty in arb_type_expr(),
        signatures in prop::option::of(
            prop::collection::vec(arb_signature(), 1..3),
        ),
        is_static in any::<bool>(),
    ) -> ElementRecord {
        let (kind, ty) = match signatures {
            Some(_) => (DocKind::Method, None),
            None => (DocKind::Property, Some(ty)),
        };
        ElementRecord {
            kind: Some(kind.into()),
            ty,
            signatures,
            flags: Flags { is_static, ..Flags::default() },
            ..ElementRecord::named(name)
        }
    }
}

/// Strategy for valid top-level records of several shapes.
pub fn arb_element() -> impl Strategy<Value = ElementRecord> {
    let function = (arb_name(), prop::collection::vec(arb_signature(), 1..3))
        .prop_map(|(name, signatures)| ElementRecord {
            kind: Some(DocKind::Function.into()),
            signatures: Some(signatures),
            ..ElementRecord::named(name)
        });
    let alias = (arb_name(), arb_type_expr(), any::<bool>()).prop_map(
        |(name, ty, legacy)| {
            let kind = if legacy {
                DocKind::TypeAliasLegacy
            } else {
                DocKind::TypeAlias
            };
            ElementRecord {
                kind: Some(kind.into()),
                ty: Some(ty),
                ..ElementRecord::named(name)
            }
        },
    );
    let class = (
        arb_name(),
        prop::collection::vec(arb_member(), 0..4),
        prop::option::of(arb_comment()),
    )
        .prop_map(|(name, members, comment)| ElementRecord {
            kind: Some(DocKind::Class.into()),
            comment,
            children: Some(members),
            // Generated member names may collide.
            allow_overwrites: Some(true),
            ..ElementRecord::named(name)
        });
    prop_oneof![function, alias, class]
}

prop_compose! {
    pub fn arb_snapshot()(
        name in arb_name(),
        children in prop::collection::vec(arb_element(), 0..5),
    ) -> Snapshot {
        Snapshot {
            name,
            kind: Some(DocKind::Project.into()),
            children,
        }
    }
}
