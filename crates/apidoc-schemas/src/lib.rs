//! Data model for API reference snapshots.
//!
//! A snapshot is the output of a documentation extractor run over one
//! package: a tree of documented elements (classes, functions, type
//! aliases, enums and so on) with their comments, signatures and type
//! expressions. This crate defines:
//!
//! - the wire format ([`Snapshot`], [`ElementRecord`]) as the extractor
//!   emits it, one broad record shape with optional fields;
//! - the typed view ([`DocElement`]) with one variant per shape;
//! - stable kind codes ([`DocKind`], [`KindTag`]);
//! - structural validation that reports every violation in a snapshot.
//!
//! JSON Schema and TypeScript declarations are derived from the Rust types.

mod comment;
mod element;
mod kind;
mod record;
mod signature;
mod symbols;
#[cfg(test)]
mod testutil;
mod type_expr;
mod validate;

#[doc(inline)]
pub use comment::*;
#[doc(inline)]
pub use element::*;
#[doc(inline)]
pub use kind::*;
#[doc(inline)]
pub use record::*;
#[doc(inline)]
pub use signature::*;
#[doc(inline)]
pub use symbols::*;
#[doc(inline)]
pub use type_expr::*;
#[doc(inline)]
pub use validate::{
    Diagnostic, Issue, Placement, Severity, Validation, validate_element,
};
