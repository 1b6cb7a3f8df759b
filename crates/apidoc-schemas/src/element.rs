//! Typed view of documented elements.
//!
//! [`ElementRecord`] carries every field any kind might use. [`DocElement`]
//! has one variant per shape, each holding only the fields that shape
//! reads. Conversion from a record validates it first; fields that do not
//! apply to the shape are dropped, and children with unknown kinds are
//! skipped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comment::Comment;
use crate::kind::KindTag;
use crate::record::{ElementRecord, InheritedFrom, OneOrMany, Snapshot};
use crate::signature::{Flags, Signature, TypeParameter};
use crate::symbols::SymbolTable;
use crate::type_expr::TypeExpr;
use crate::validate::{
    self, Diagnostic, MemberShape, Shape, Validation, validate_element,
};

/// Fields every element shape carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub tag: KindTag,
    pub variant: Option<String>,
    pub comment: Option<Comment>,
    pub flags: Flags,
}

impl Header {
    pub fn new(name: impl Into<String>, tag: impl Into<KindTag>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            variant: None,
            comment: None,
            flags: Flags::default(),
        }
    }
}

/// A documented element, one variant per shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ElementRecord", try_from = "ElementRecord")]
pub enum DocElement {
    /// Namespace or module grouping other elements.
    Namespace {
        header: Header,
        children: Vec<DocElement>,
    },
    Enum {
        header: Header,
        values: Vec<EnumValue>,
    },
    /// Free function or method; never without a signature.
    Method {
        header: Header,
        signatures: Vec<Signature>,
    },
    Accessor {
        header: Header,
        get_signature: Option<OneOrMany<Signature>>,
        set_signatures: Vec<Signature>,
    },
    /// Props type alias of a component.
    Props {
        header: Header,
        ty: Option<TypeExpr>,
        members: Option<Vec<Member>>,
        extended_types: Vec<TypeExpr>,
    },
    /// The `defaultProps` constant of a component.
    DefaultProps {
        header: Header,
        ty: TypeExpr,
        default_value: Option<String>,
    },
    TypeAlias {
        header: Header,
        ty: TypeExpr,
        type_parameters: Vec<TypeParameter>,
    },
    Interface {
        header: Header,
        members: Vec<Member>,
        type_parameters: Vec<TypeParameter>,
        extended_types: Vec<TypeExpr>,
        implemented_types: Vec<TypeExpr>,
    },
    Class {
        header: Header,
        ty: Option<TypeExpr>,
        members: Vec<Member>,
        type_parameters: Vec<TypeParameter>,
        extended_types: Vec<TypeExpr>,
        implemented_types: Vec<TypeExpr>,
        allow_overwrites: bool,
    },
    Constant {
        header: Header,
        ty: Option<TypeExpr>,
        default_value: Option<String>,
    },
}

/// A member of a class, interface or props definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    /// Members may omit their kind; the body is then inferred from fields.
    pub tag: Option<KindTag>,
    pub variant: Option<String>,
    pub comment: Option<Comment>,
    pub flags: Flags,
    pub overwrites: Option<TypeExpr>,
    pub implementation_of: Option<TypeExpr>,
    pub inherited_from: Option<InheritedFrom>,
    pub body: MemberBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberBody {
    Property {
        ty: Option<TypeExpr>,
        default_value: Option<String>,
    },
    Method {
        signatures: Vec<Signature>,
    },
    Accessor {
        get_signature: Option<OneOrMany<Signature>>,
        set_signatures: Vec<Signature>,
    },
}

/// One value of an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub tag: Option<KindTag>,
    pub variant: Option<String>,
    pub comment: Option<Comment>,
    pub flags: Flags,
    pub ty: Option<TypeExpr>,
    pub default_value: Option<String>,
}

impl EnumValue {
    /// Text to show for the value: the initializer if present, otherwise
    /// the rendered type.
    pub fn display_value(&self) -> Option<String> {
        self.default_value
            .clone()
            .or_else(|| self.ty.as_ref().map(ToString::to_string))
    }
}

impl DocElement {
    pub fn header(&self) -> &Header {
        match self {
            DocElement::Namespace { header, .. }
            | DocElement::Enum { header, .. }
            | DocElement::Method { header, .. }
            | DocElement::Accessor { header, .. }
            | DocElement::Props { header, .. }
            | DocElement::DefaultProps { header, .. }
            | DocElement::TypeAlias { header, .. }
            | DocElement::Interface { header, .. }
            | DocElement::Class { header, .. }
            | DocElement::Constant { header, .. } => header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn tag(&self) -> KindTag {
        self.header().tag
    }

    /// Short name of the shape, e.g. `default props`.
    pub fn shape_name(&self) -> &'static str {
        match self {
            DocElement::Namespace { .. } => "namespace",
            DocElement::Enum { .. } => "enum",
            DocElement::Method { .. } => "method",
            DocElement::Accessor { .. } => "accessor",
            DocElement::Props { .. } => "props",
            DocElement::DefaultProps { .. } => "default props",
            DocElement::TypeAlias { .. } => "type alias",
            DocElement::Interface { .. } => "interface",
            DocElement::Class { .. } => "class",
            DocElement::Constant { .. } => "constant",
        }
    }

    /// Members of a class, interface or props definition.
    pub fn members(&self) -> &[Member] {
        match self {
            DocElement::Interface { members, .. }
            | DocElement::Class { members, .. } => members,
            DocElement::Props {
                members: Some(members),
                ..
            } => members,
            _ => &[],
        }
    }
}

impl fmt::Display for DocElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.shape_name(), self.name())
    }
}

/// A record that could not be converted, with the reasons.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidElement {
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for InvalidElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid element `{}`", self.name)?;
        for diag in &self.diagnostics {
            write!(f, "\n  {diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidElement {}

// -------------------------------------------------------------------------
// Record -> typed
// -------------------------------------------------------------------------

impl TryFrom<ElementRecord> for DocElement {
    type Error = InvalidElement;

    /// Validates the record, then converts it. Back-references are not
    /// resolved here; see [`Snapshot::into_elements`].
    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        let validation = validate_element(&record, None);
        let name = record.name.clone();
        if validation.is_valid()
            && let Some(element) = build_element(record)
        {
            return Ok(element);
        }
        Err(InvalidElement {
            name,
            diagnostics: validation.diagnostics,
        })
    }
}

fn header(record: &mut ElementRecord, tag: KindTag) -> Header {
    Header {
        name: std::mem::take(&mut record.name),
        tag,
        variant: record.variant.take(),
        comment: record.comment.take(),
        flags: record.flags,
    }
}

/// Builds the typed element. Returns `None` for records that would fail
/// validation or whose kind is not recognized.
fn build_element(mut record: ElementRecord) -> Option<DocElement> {
    let shape = validate::element_shape(&record).ok()?;
    let tag = record.kind?;
    let header = header(&mut record, tag);
    let children = record.children.take();
    let element = match shape {
        Shape::Namespace => DocElement::Namespace {
            header,
            children: children
                .into_iter()
                .flatten()
                .filter_map(build_element)
                .collect(),
        },
        Shape::Enum => DocElement::Enum {
            header,
            values: children?
                .into_iter()
                .filter_map(build_enum_value)
                .collect(),
        },
        Shape::Method => DocElement::Method {
            header,
            signatures: record.signatures.filter(|s| !s.is_empty())?,
        },
        Shape::Accessor => DocElement::Accessor {
            header,
            get_signature: record.get_signature,
            set_signatures: record.set_signatures.unwrap_or_default(),
        },
        Shape::Props => DocElement::Props {
            header,
            ty: record.ty,
            members: children.map(build_members),
            extended_types: record.extended_types.unwrap_or_default(),
        },
        Shape::DefaultProps => DocElement::DefaultProps {
            header,
            ty: record.ty?,
            default_value: record.default_value,
        },
        Shape::TypeAlias => DocElement::TypeAlias {
            header,
            ty: record.ty?,
            type_parameters: record.type_parameter.unwrap_or_default(),
        },
        Shape::Interface => DocElement::Interface {
            header,
            members: build_members(children?),
            type_parameters: record.type_parameter.unwrap_or_default(),
            extended_types: record.extended_types.unwrap_or_default(),
            implemented_types: record.implemented_types.unwrap_or_default(),
        },
        Shape::Class => DocElement::Class {
            header,
            ty: record.ty,
            members: build_members(children?),
            type_parameters: record.type_parameter.unwrap_or_default(),
            extended_types: record.extended_types.unwrap_or_default(),
            implemented_types: record.implemented_types.unwrap_or_default(),
            allow_overwrites: record.allow_overwrites?,
        },
        Shape::Constant => DocElement::Constant {
            header,
            ty: record.ty,
            default_value: record.default_value,
        },
    };
    Some(element)
}

fn build_members(records: Vec<ElementRecord>) -> Vec<Member> {
    records.into_iter().filter_map(build_member).collect()
}

fn build_member(record: ElementRecord) -> Option<Member> {
    let body = match validate::member_shape(&record).ok()? {
        MemberShape::Property => MemberBody::Property {
            ty: record.ty,
            default_value: record.default_value,
        },
        MemberShape::Method => MemberBody::Method {
            signatures: record.signatures.filter(|s| !s.is_empty())?,
        },
        MemberShape::Accessor => MemberBody::Accessor {
            get_signature: record.get_signature,
            set_signatures: record.set_signatures.unwrap_or_default(),
        },
    };
    Some(Member {
        name: record.name,
        tag: record.kind,
        variant: record.variant,
        comment: record.comment,
        flags: record.flags,
        overwrites: record.overwrites,
        implementation_of: record.implementation_of,
        inherited_from: record.inherited_from,
        body,
    })
}

fn build_enum_value(record: ElementRecord) -> Option<EnumValue> {
    validate::enum_value_kind(&record).ok()?;
    if record.default_value.is_none() && record.ty.is_none() {
        return None;
    }
    Some(EnumValue {
        name: record.name,
        tag: record.kind,
        variant: record.variant,
        comment: record.comment,
        flags: record.flags,
        ty: record.ty,
        default_value: record.default_value,
    })
}

// -------------------------------------------------------------------------
// Typed -> record
// -------------------------------------------------------------------------

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

fn header_record(header: Header) -> ElementRecord {
    ElementRecord {
        name: header.name,
        kind: Some(header.tag),
        variant: header.variant,
        comment: header.comment,
        flags: header.flags,
        ..ElementRecord::default()
    }
}

fn member_records(members: Vec<Member>) -> Vec<ElementRecord> {
    members.into_iter().map(ElementRecord::from).collect()
}

impl From<DocElement> for ElementRecord {
    fn from(element: DocElement) -> Self {
        match element {
            DocElement::Namespace { header, children } => ElementRecord {
                children: Some(
                    children.into_iter().map(ElementRecord::from).collect(),
                ),
                ..header_record(header)
            },
            DocElement::Enum { header, values } => ElementRecord {
                children: Some(
                    values.into_iter().map(ElementRecord::from).collect(),
                ),
                ..header_record(header)
            },
            DocElement::Method { header, signatures } => ElementRecord {
                signatures: Some(signatures),
                ..header_record(header)
            },
            DocElement::Accessor {
                header,
                get_signature,
                set_signatures,
            } => ElementRecord {
                get_signature,
                set_signatures: non_empty(set_signatures),
                ..header_record(header)
            },
            DocElement::Props {
                header,
                ty,
                members,
                extended_types,
            } => ElementRecord {
                ty,
                children: members.map(member_records),
                extended_types: non_empty(extended_types),
                ..header_record(header)
            },
            DocElement::DefaultProps {
                header,
                ty,
                default_value,
            } => ElementRecord {
                ty: Some(ty),
                default_value,
                ..header_record(header)
            },
            DocElement::TypeAlias {
                header,
                ty,
                type_parameters,
            } => ElementRecord {
                ty: Some(ty),
                type_parameter: non_empty(type_parameters),
                ..header_record(header)
            },
            DocElement::Interface {
                header,
                members,
                type_parameters,
                extended_types,
                implemented_types,
            } => ElementRecord {
                children: Some(member_records(members)),
                type_parameter: non_empty(type_parameters),
                extended_types: non_empty(extended_types),
                implemented_types: non_empty(implemented_types),
                ..header_record(header)
            },
            DocElement::Class {
                header,
                ty,
                members,
                type_parameters,
                extended_types,
                implemented_types,
                allow_overwrites,
            } => ElementRecord {
                ty,
                children: Some(member_records(members)),
                type_parameter: non_empty(type_parameters),
                extended_types: non_empty(extended_types),
                implemented_types: non_empty(implemented_types),
                allow_overwrites: Some(allow_overwrites),
                ..header_record(header)
            },
            DocElement::Constant {
                header,
                ty,
                default_value,
            } => ElementRecord {
                ty,
                default_value,
                ..header_record(header)
            },
        }
    }
}

impl From<Member> for ElementRecord {
    fn from(member: Member) -> Self {
        let mut record = ElementRecord {
            name: member.name,
            kind: member.tag,
            variant: member.variant,
            comment: member.comment,
            flags: member.flags,
            overwrites: member.overwrites,
            implementation_of: member.implementation_of,
            inherited_from: member.inherited_from,
            ..ElementRecord::default()
        };
        match member.body {
            MemberBody::Property { ty, default_value } => {
                record.ty = ty;
                record.default_value = default_value;
            }
            MemberBody::Method { signatures } => {
                record.signatures = Some(signatures);
            }
            MemberBody::Accessor {
                get_signature,
                set_signatures,
            } => {
                record.get_signature = get_signature;
                record.set_signatures = non_empty(set_signatures);
            }
        }
        record
    }
}

impl From<EnumValue> for ElementRecord {
    fn from(value: EnumValue) -> Self {
        ElementRecord {
            name: value.name,
            kind: value.tag,
            variant: value.variant,
            comment: value.comment,
            flags: value.flags,
            ty: value.ty,
            default_value: value.default_value,
            ..ElementRecord::default()
        }
    }
}

// -------------------------------------------------------------------------
// Whole snapshots
// -------------------------------------------------------------------------

/// Typed elements of a snapshot plus everything validation reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    /// Valid top-level elements, in producer order.
    pub elements: Vec<DocElement>,
    pub validation: Validation,
}

impl Snapshot {
    /// Converts every top-level element, dropping those with errors and
    /// those of unknown kind. Back-references are resolved against this
    /// snapshot.
    pub fn into_elements(self) -> Conversion {
        let table = SymbolTable::build(&self);
        let mut conversion = Conversion::default();
        for record in self.children {
            let validation = validate_element(&record, Some(&table));
            if validation.is_valid()
                && let Some(element) = build_element(record)
            {
                conversion.elements.push(element);
            }
            conversion.validation.merge(validation);
        }
        conversion
    }
}
