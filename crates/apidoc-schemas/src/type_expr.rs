//! Recursive type expressions.
//!
//! A [`TypeExpr`] is a discriminant string (`type` on the wire) plus the
//! children that discriminant uses. The shape is a tree: self-referencing
//! aliases appear as named references, never as embedded copies.
//!
//! Nesting depth is unbounded. Traversal ([`TypeExpr::walk`],
//! [`TypeExpr::depth`]) runs on an explicit work stack so deeply generic
//! signatures do not grow the call stack.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;
use ts_rs::TS;

use crate::comment::Comment;
use crate::kind::KindTag;
use crate::record::ElementRecord;
use crate::signature::{Parameter, Signature};

/// A type expression node.
///
/// Which fields are populated depends on [`TypeExpr::kind`]; see
/// [`TypeVariant`]. Unrecognized discriminants load unchanged.
#[skip_serializing_none]
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS,
)]
#[serde(rename_all = "camelCase")]
pub struct TypeExpr {
    /// Discriminant, e.g. `union`, `reference`, `array`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Name of an intrinsic, reference, named tuple member or inferred type.
    pub name: Option<String>,

    /// Members of a union or intersection, in declaration order.
    pub types: Option<Vec<TypeExpr>>,

    /// Element of a named tuple member.
    pub element: Option<Box<TypeExpr>>,

    /// Tuple elements, by position.
    pub elements: Option<Vec<TypeExpr>>,

    /// Wrapped type of an array, optional or rest type.
    pub element_type: Option<Box<TypeExpr>>,

    /// Queried entity of a `typeof` query.
    pub query_type: Option<Box<TypeExpr>>,

    /// Generic arguments of a reference, by position.
    pub type_arguments: Option<Vec<TypeExpr>>,

    pub check_type: Option<Box<TypeExpr>>,
    pub extends_type: Option<Box<TypeExpr>>,
    pub true_type: Option<Box<TypeExpr>>,
    pub false_type: Option<Box<TypeExpr>>,

    /// Inline object, function or type-literal reflection.
    pub declaration: Option<Box<Declaration>>,

    /// Value of a literal type. A present `null` is `Some(LiteralValue::Null)`.
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schemars(with = "Option<LiteralValue>")]
    #[ts(type = "string | number | boolean | null")]
    pub value: Option<LiteralValue>,

    /// Operator of a type operator: `keyof`, `readonly`, `unique`.
    pub operator: Option<String>,

    /// Package a reference resolves into.
    pub package: Option<String>,

    /// Object side of an indexed access.
    pub object_type: Option<Box<TypeExpr>>,

    /// Index side of an indexed access or key set of a mapped type.
    pub index_type: Option<Box<TypeExpr>>,

    /// Fully qualified name of a reference.
    pub qualified_name: Option<String>,

    /// Leading text of a template literal.
    pub head: Option<String>,

    /// Interleaved `(type, text)` spans following `head`.
    pub tail: Option<Vec<TemplateSpan>>,

    /// Operand of a type operator.
    pub target: Option<Box<TypeExpr>>,

    /// Key variable of a mapped type (`P` in `[P in K]`).
    pub parameter: Option<String>,

    /// Key constraint of a mapped type (`K` in `[P in K]`).
    pub parameter_type: Option<Box<TypeExpr>>,

    /// Value template of a mapped type.
    pub template_type: Option<Box<TypeExpr>>,

    /// Whether a type predicate is an `asserts` predicate.
    pub asserts: Option<bool>,

    /// Narrowed type of a type predicate.
    pub target_type: Option<Box<TypeExpr>>,
}

/// Deserializes a field that is present on the wire, keeping `null` as a
/// value instead of mapping it to `None`.
fn deserialize_present<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<LiteralValue>, D::Error> {
    LiteralValue::deserialize(d).map(Some)
}

/// Value of a literal type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Integer(n) => write!(f, "{n}"),
            LiteralValue::Float(n) => write!(f, "{n}"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// One `(type, text)` span of a template literal tail.
///
/// Serialized as a two-element array, matching the producer's encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
pub struct TemplateSpan(pub TypeExpr, pub String);

/// Inline reflection embedded in a type expression.
#[skip_serializing_none]
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS,
)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub name: Option<String>,
    pub kind: Option<KindTag>,
    pub index_signature: Option<Signature>,
    pub signatures: Option<Vec<Signature>>,
    pub parameters: Option<Vec<Parameter>>,
    /// Properties of an inline object type, in declaration order.
    pub children: Option<Vec<ElementRecord>>,
    pub comment: Option<Comment>,
}

/// Classification of a [`TypeExpr`] discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVariant {
    Intrinsic,
    Reference,
    Union,
    Intersection,
    Array,
    Tuple,
    NamedTupleMember,
    Conditional,
    IndexedAccess,
    Mapped,
    TypeOperator,
    Literal,
    Query,
    Reflection,
    TemplateLiteral,
    Optional,
    Rest,
    Predicate,
    Inferred,
    Unknown,
    /// A discriminant this crate does not recognize.
    Other,
}

impl TypeVariant {
    /// Classifies a wire discriminant.
    pub fn from_discriminant(kind: &str) -> Self {
        match kind {
            "intrinsic" => Self::Intrinsic,
            "reference" => Self::Reference,
            "union" => Self::Union,
            "intersection" => Self::Intersection,
            "array" => Self::Array,
            "tuple" => Self::Tuple,
            "namedTupleMember" => Self::NamedTupleMember,
            "conditional" => Self::Conditional,
            "indexedAccess" => Self::IndexedAccess,
            "mapped" => Self::Mapped,
            "typeOperator" => Self::TypeOperator,
            "literal" => Self::Literal,
            "query" => Self::Query,
            "reflection" => Self::Reflection,
            "templateLiteral" => Self::TemplateLiteral,
            "optional" => Self::Optional,
            "rest" => Self::Rest,
            "predicate" => Self::Predicate,
            "inferred" => Self::Inferred,
            "unknown" => Self::Unknown,
            _ => Self::Other,
        }
    }
}

impl TypeExpr {
    fn with_kind(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            ..Self::default()
        }
    }

    /// A built-in type such as `string` or `void`.
    pub fn intrinsic(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::with_kind("intrinsic")
        }
    }

    /// A named reference with optional generic arguments.
    pub fn reference(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self {
            name: Some(name.into()),
            type_arguments: (!args.is_empty()).then_some(args),
            ..Self::with_kind("reference")
        }
    }

    pub fn union(types: Vec<TypeExpr>) -> Self {
        Self {
            types: Some(types),
            ..Self::with_kind("union")
        }
    }

    pub fn intersection(types: Vec<TypeExpr>) -> Self {
        Self {
            types: Some(types),
            ..Self::with_kind("intersection")
        }
    }

    pub fn array(element: TypeExpr) -> Self {
        Self {
            element_type: Some(Box::new(element)),
            ..Self::with_kind("array")
        }
    }

    pub fn tuple(elements: Vec<TypeExpr>) -> Self {
        Self {
            elements: Some(elements),
            ..Self::with_kind("tuple")
        }
    }

    pub fn literal(value: LiteralValue) -> Self {
        Self {
            value: Some(value),
            ..Self::with_kind("literal")
        }
    }

    /// `check extends extends ? when_true : when_false`
    pub fn conditional(
        check: TypeExpr,
        extends: TypeExpr,
        when_true: TypeExpr,
        when_false: TypeExpr,
    ) -> Self {
        Self {
            check_type: Some(Box::new(check)),
            extends_type: Some(Box::new(extends)),
            true_type: Some(Box::new(when_true)),
            false_type: Some(Box::new(when_false)),
            ..Self::with_kind("conditional")
        }
    }

    /// `object[index]`
    pub fn indexed_access(object: TypeExpr, index: TypeExpr) -> Self {
        Self {
            object_type: Some(Box::new(object)),
            index_type: Some(Box::new(index)),
            ..Self::with_kind("indexedAccess")
        }
    }

    /// `{ [parameter in keys]: template }`
    pub fn mapped(
        parameter: impl Into<String>,
        keys: TypeExpr,
        template: TypeExpr,
    ) -> Self {
        Self {
            parameter: Some(parameter.into()),
            parameter_type: Some(Box::new(keys)),
            template_type: Some(Box::new(template)),
            ..Self::with_kind("mapped")
        }
    }

    /// `operator target`, e.g. `keyof T`.
    pub fn type_operator(
        operator: impl Into<String>,
        target: TypeExpr,
    ) -> Self {
        Self {
            operator: Some(operator.into()),
            target: Some(Box::new(target)),
            ..Self::with_kind("typeOperator")
        }
    }

    /// `typeof queried`
    pub fn query(queried: TypeExpr) -> Self {
        Self {
            query_type: Some(Box::new(queried)),
            ..Self::with_kind("query")
        }
    }

    pub fn template_literal(
        head: impl Into<String>,
        tail: Vec<TemplateSpan>,
    ) -> Self {
        Self {
            head: Some(head.into()),
            tail: Some(tail),
            ..Self::with_kind("templateLiteral")
        }
    }

    pub fn reflection(declaration: Declaration) -> Self {
        Self {
            declaration: Some(Box::new(declaration)),
            ..Self::with_kind("reflection")
        }
    }

    /// Classifies the discriminant.
    pub fn variant(&self) -> TypeVariant {
        TypeVariant::from_discriminant(&self.kind)
    }

    /// Direct structural children, in display order.
    ///
    /// Includes the types held by an inline declaration's signatures,
    /// parameters and properties. Back-references are not children.
    pub fn children(&self) -> Vec<&TypeExpr> {
        let mut out = self.operands();
        if let Some(decl) = &self.declaration {
            out.extend(decl.types());
        }
        out
    }

    /// Direct children other than those reached through a declaration.
    pub fn operands(&self) -> Vec<&TypeExpr> {
        let mut out: Vec<&TypeExpr> = Vec::new();
        out.extend(self.types.iter().flatten());
        out.extend(self.element.as_deref());
        out.extend(self.elements.iter().flatten());
        out.extend(self.element_type.as_deref());
        out.extend(self.query_type.as_deref());
        out.extend(self.type_arguments.iter().flatten());
        out.extend(self.check_type.as_deref());
        out.extend(self.extends_type.as_deref());
        out.extend(self.true_type.as_deref());
        out.extend(self.false_type.as_deref());
        out.extend(self.object_type.as_deref());
        out.extend(self.index_type.as_deref());
        out.extend(self.tail.iter().flatten().map(|span| &span.0));
        out.extend(self.target.as_deref());
        out.extend(self.parameter_type.as_deref());
        out.extend(self.template_type.as_deref());
        out.extend(self.target_type.as_deref());
        out
    }

    /// Visits every node in pre-order with its depth (the root is depth 1).
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a TypeExpr, usize)) {
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            // Reversed so the first child is popped first.
            for child in node.children().into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Height of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        self.walk(|_, depth| max = max.max(depth));
        max
    }

    /// Names of every reference in the tree, in pre-order.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(|node, _| {
            if node.variant() == TypeVariant::Reference {
                names.extend(node.name.as_deref());
            }
        });
        names
    }

    /// Returns true if this node needs parentheses when used as an array
    /// element or operator operand.
    fn needs_parens(&self) -> bool {
        match self.variant() {
            TypeVariant::Union
            | TypeVariant::Intersection
            | TypeVariant::Conditional => true,
            TypeVariant::Reflection => self
                .declaration
                .as_ref()
                .is_some_and(|decl| decl.signatures.is_some()),
            _ => false,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_parens() {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl Declaration {
    /// Types of the declaration's signatures and parameters, leaving out
    /// its children.
    pub fn own_types(&self) -> Vec<&TypeExpr> {
        let mut out = Vec::new();
        for sig in self
            .index_signature
            .iter()
            .chain(self.signatures.iter().flatten())
        {
            out.extend(sig.types());
        }
        out.extend(self.parameters.iter().flatten().map(|p| &p.ty));
        out
    }

    /// Types held directly by this declaration.
    pub fn types(&self) -> Vec<&TypeExpr> {
        let mut out = self.own_types();
        for child in self.children.iter().flatten() {
            out.extend(child.own_types());
        }
        out
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    items: &[TypeExpr],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_declaration(
    f: &mut fmt::Formatter<'_>,
    decl: &Declaration,
) -> fmt::Result {
    if let Some(sig) = decl.signatures.as_ref().and_then(|s| s.first()) {
        f.write_str("(")?;
        sig.fmt_parameters(f)?;
        f.write_str(") => ")?;
        return match &sig.ty {
            Some(ret) => write!(f, "{ret}"),
            None => f.write_str("void"),
        };
    }
    let children = decl.children.as_deref().unwrap_or_default();
    if children.is_empty() && decl.index_signature.is_none() {
        return f.write_str("object");
    }
    f.write_str("{ ")?;
    if let Some(index) = &decl.index_signature {
        f.write_str("[")?;
        index.fmt_parameters(f)?;
        f.write_str("]: ")?;
        match &index.ty {
            Some(ty) => write!(f, "{ty}")?,
            None => f.write_str("unknown")?,
        }
        f.write_str("; ")?;
    }
    for child in children {
        let optional = if child.flags.is_optional { "?" } else { "" };
        write!(f, "{}{optional}: ", child.name)?;
        match &child.ty {
            Some(ty) => write!(f, "{ty}")?,
            None => f.write_str("unknown")?,
        }
        f.write_str("; ")?;
    }
    f.write_str("}")
}

impl fmt::Display for TypeExpr {
    /// Renders TypeScript-like type text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("unknown");
        match self.variant() {
            TypeVariant::Intrinsic | TypeVariant::Unknown => f.write_str(name),
            TypeVariant::Reference => {
                f.write_str(name)?;
                if let Some(args) = &self.type_arguments {
                    f.write_str("<")?;
                    write_joined(f, args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeVariant::Union => {
                let types = self.types.as_deref().unwrap_or_default();
                write_joined(f, types, " | ")
            }
            TypeVariant::Intersection => {
                let types = self.types.as_deref().unwrap_or_default();
                write_joined(f, types, " & ")
            }
            TypeVariant::Array => match &self.element_type {
                Some(element) => {
                    element.fmt_operand(f)?;
                    f.write_str("[]")
                }
                None => f.write_str("unknown[]"),
            },
            TypeVariant::Tuple => {
                f.write_str("[")?;
                let elements = self.elements.as_deref().unwrap_or_default();
                write_joined(f, elements, ", ")?;
                f.write_str("]")
            }
            TypeVariant::NamedTupleMember => {
                write!(f, "{name}: ")?;
                match &self.element {
                    Some(element) => write!(f, "{element}"),
                    None => f.write_str("unknown"),
                }
            }
            TypeVariant::Conditional => {
                let part = |t: &Option<Box<TypeExpr>>| match t.as_deref() {
                    Some(t) => t.to_string(),
                    None => "unknown".to_owned(),
                };
                write!(
                    f,
                    "{} extends {} ? {} : {}",
                    part(&self.check_type),
                    part(&self.extends_type),
                    part(&self.true_type),
                    part(&self.false_type),
                )
            }
            TypeVariant::IndexedAccess => {
                match &self.object_type {
                    Some(object) => object.fmt_operand(f)?,
                    None => f.write_str("unknown")?,
                }
                match &self.index_type {
                    Some(index) => write!(f, "[{index}]"),
                    None => f.write_str("[unknown]"),
                }
            }
            TypeVariant::Mapped => {
                let parameter = self.parameter.as_deref().unwrap_or("K");
                write!(f, "{{ [{parameter} in ")?;
                match &self.parameter_type {
                    Some(keys) => write!(f, "{keys}")?,
                    None => f.write_str("string")?,
                }
                f.write_str("]: ")?;
                match &self.template_type {
                    Some(template) => write!(f, "{template}")?,
                    None => f.write_str("unknown")?,
                }
                f.write_str(" }")
            }
            TypeVariant::TypeOperator => {
                let operator = self.operator.as_deref().unwrap_or("keyof");
                write!(f, "{operator} ")?;
                match &self.target {
                    Some(target) => target.fmt_operand(f),
                    None => f.write_str("unknown"),
                }
            }
            TypeVariant::Literal => match &self.value {
                Some(value) => write!(f, "{value}"),
                None => f.write_str("unknown"),
            },
            TypeVariant::Query => match &self.query_type {
                Some(queried) => write!(f, "typeof {queried}"),
                None => f.write_str("typeof unknown"),
            },
            TypeVariant::Reflection => match &self.declaration {
                Some(decl) => write_declaration(f, decl),
                None => f.write_str("object"),
            },
            TypeVariant::TemplateLiteral => {
                f.write_str("`")?;
                f.write_str(self.head.as_deref().unwrap_or_default())?;
                for TemplateSpan(ty, text) in self.tail.iter().flatten() {
                    write!(f, "${{{ty}}}{text}")?;
                }
                f.write_str("`")
            }
            TypeVariant::Optional => match &self.element_type {
                Some(element) => {
                    element.fmt_operand(f)?;
                    f.write_str("?")
                }
                None => f.write_str("unknown?"),
            },
            TypeVariant::Rest => match &self.element_type {
                Some(element) => {
                    f.write_str("...")?;
                    element.fmt_operand(f)
                }
                None => f.write_str("...unknown[]"),
            },
            TypeVariant::Predicate => {
                if self.asserts == Some(true) {
                    f.write_str("asserts ")?;
                }
                f.write_str(name)?;
                match &self.target_type {
                    Some(target) => write!(f, " is {target}"),
                    None => Ok(()),
                }
            }
            TypeVariant::Inferred => write!(f, "infer {name}"),
            TypeVariant::Other => match &self.name {
                Some(name) => f.write_str(name),
                None => f.write_str(&self.kind),
            },
        }
    }
}
