//! Callable shapes: signatures, parameters, type parameters and flags.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use ts_rs::TS;

use crate::comment::Comment;
use crate::kind::KindTag;
use crate::type_expr::TypeExpr;

/// Returns true if the flag is unset (for serde `skip_serializing_if`).
#[expect(
    clippy::trivially_copy_pass_by_ref,
    reason = "Serde's skip_serializing_if passes by reference."
)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Modifier flags of a member or parameter.
///
/// Flags form an unordered set: unset flags are omitted on the wire and
/// absent flags read as unset.
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
#[expect(
    clippy::struct_excessive_bools,
    reason = "Mirrors the producer's flag object one field per flag."
)]
pub struct Flags {
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_optional: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_rest: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_readonly: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_const: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_protected: bool,
}

impl Flags {
    /// Returns true if no flag is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A parameter of a signature.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub comment: Option<Comment>,
    #[serde(default, skip_serializing_if = "Flags::is_empty")]
    pub flags: Flags,
    /// Source text of the default value.
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            comment: None,
            flags: Flags::default(),
            default_value: None,
        }
    }
}

/// A generic parameter of a signature or type alias.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
pub struct TypeParameter {
    pub name: String,
    pub kind: KindTag,
    /// How the parameter is declared, e.g. `typeParam`.
    pub variant: Option<String>,
    /// Constraint (`T extends C`).
    #[serde(rename = "type")]
    pub ty: Option<TypeExpr>,
    /// Default (`T = D`).
    pub default: Option<TypeExpr>,
}

/// One callable shape. Overloaded functions carry several.
#[skip_serializing_none]
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS,
)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Empty for anonymous signatures of inline declarations.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub kind: Option<KindTag>,
    /// Parameters, in call order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Return type.
    #[serde(rename = "type")]
    pub ty: Option<TypeExpr>,
    pub comment: Option<Comment>,
    pub type_parameter: Option<Vec<TypeParameter>>,
}

impl Signature {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        returns: TypeExpr,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            ty: Some(returns),
            ..Self::default()
        }
    }

    /// Types held by this signature: parameter types, the return type and
    /// type parameter constraints and defaults.
    pub fn types(&self) -> impl Iterator<Item = &TypeExpr> {
        let params = self.parameters.iter().map(|p| &p.ty);
        let generics = self
            .type_parameter
            .iter()
            .flatten()
            .flat_map(|tp| tp.ty.iter().chain(tp.default.iter()));
        params.chain(self.ty.iter()).chain(generics)
    }

    pub(crate) fn fmt_parameters(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let rest = if param.flags.is_rest { "..." } else { "" };
            let optional = if param.flags.is_optional { "?" } else { "" };
            write!(f, "{rest}{}{optional}: {}", param.name, param.ty)?;
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    /// Renders `name<T>(a: A, b?: B): R`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(generics) = self.type_parameter.as_deref()
            && !generics.is_empty()
        {
            f.write_str("<")?;
            for (i, tp) in generics.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&tp.name)?;
                if let Some(constraint) = &tp.ty {
                    write!(f, " extends {constraint}")?;
                }
                if let Some(default) = &tp.default {
                    write!(f, " = {default}")?;
                }
            }
            f.write_str(">")?;
        }
        f.write_str("(")?;
        self.fmt_parameters(f)?;
        f.write_str("): ")?;
        match &self.ty {
            Some(ret) => write!(f, "{ret}"),
            None => f.write_str("void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::DocKind;

    #[test]
    fn display_renders_generics_and_flags() {
        let mut options = Parameter::new(
            "options",
            TypeExpr::reference("Options", vec![]),
        );
        options.flags.is_optional = true;
        let mut rest =
            Parameter::new("args", TypeExpr::array(TypeExpr::intrinsic("T")));
        rest.flags.is_rest = true;

        let sig = Signature {
            type_parameter: Some(vec![TypeParameter {
                name: "T".to_owned(),
                kind: DocKind::TypeParameter.into(),
                variant: Some("typeParam".to_owned()),
                ty: Some(TypeExpr::intrinsic("object")),
                default: None,
            }]),
            ..Signature::new(
                "run",
                vec![options, rest],
                TypeExpr::reference(
                    "Promise",
                    vec![TypeExpr::intrinsic("void")],
                ),
            )
        };

        assert_eq!(
            sig.to_string(),
            "run<T extends object>(options?: Options, ...args: T[]): Promise<void>"
        );
    }

    #[test]
    fn unset_flags_are_omitted() {
        let param = Parameter::new("x", TypeExpr::intrinsic("number"));
        let json = serde_json::to_string(&param).unwrap();
        assert_eq!(
            json,
            r#"{"name":"x","type":{"type":"intrinsic","name":"number"}}"#
        );

        let parsed: Parameter = serde_json::from_str(
            r#"{"name":"x","type":{"type":"intrinsic","name":"number"},"flags":{"isOptional":true}}"#,
        )
        .unwrap();
        assert!(parsed.flags.is_optional);
        assert!(!parsed.flags.is_rest);
    }

    #[test]
    fn parameter_order_is_preserved() {
        let sig = Signature::new(
            "f",
            vec![
                Parameter::new("b", TypeExpr::intrinsic("string")),
                Parameter::new("a", TypeExpr::intrinsic("string")),
            ],
            TypeExpr::intrinsic("void"),
        );
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        let names: Vec<_> =
            parsed.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn types_lists_params_return_and_generics() {
        let sig = Signature {
            type_parameter: Some(vec![TypeParameter {
                name: "T".to_owned(),
                kind: DocKind::TypeParameter.into(),
                variant: None,
                ty: None,
                default: Some(TypeExpr::intrinsic("unknown")),
            }]),
            ..Signature::new(
                "f",
                vec![Parameter::new("a", TypeExpr::intrinsic("string"))],
                TypeExpr::intrinsic("void"),
            )
        };
        let rendered: Vec<_> = sig.types().map(ToString::to_string).collect();
        assert_eq!(rendered, ["string", "void", "unknown"]);
    }
}
