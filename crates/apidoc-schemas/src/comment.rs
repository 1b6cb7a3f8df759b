//! Natural-language documentation attached to documented elements.
//!
//! Content sequences render as-is, so their order is preserved exactly.
//! Block tags may repeat (two `@param` blocks are two entries). Modifier tags
//! form an unordered set.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use ts_rs::TS;

/// Documentation comment of an element, signature or parameter.
#[skip_serializing_none]
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS,
)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Name of the documented value, when the comment documents a return.
    pub name: Option<String>,

    /// Main description, in rendering order.
    #[serde(default)]
    pub summary: Vec<CommentContent>,

    /// Description of the return value.
    pub returns: Option<String>,

    /// Block tags such as `@param`, `@example` or `@returns`, in source
    /// order. Tag names are not unique.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_tags: Vec<CommentTag>,

    /// Modifier tags such as `@deprecated` or `@hidden`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub modifier_tags: BTreeSet<String>,
}

/// A block tag with its content.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
pub struct CommentTag {
    /// Tag name including the `@`, e.g. `@param`.
    pub tag: String,
    /// Associated name, e.g. the parameter a `@param` block documents.
    pub name: Option<String>,
    #[serde(default)]
    pub content: Vec<CommentContent>,
}

/// One fragment of comment content.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
pub struct CommentContent {
    /// Fragment kind: `text`, `code` or `inline-tag`.
    pub kind: String,
    pub text: String,
    /// Inline tag name (e.g. `@link`) for `inline-tag` fragments.
    pub tag: Option<String>,
    /// Display text of a cross-link.
    pub ts_link_text: Option<String>,
}

impl CommentContent {
    /// Creates a plain text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_owned(),
            text: text.into(),
            tag: None,
            ts_link_text: None,
        }
    }

    /// Creates a code fragment.
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            kind: "code".to_owned(),
            ..Self::text(text)
        }
    }

    /// Creates an inline `@link` to `target`.
    pub fn link(target: impl Into<String>, text: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            kind: "inline-tag".to_owned(),
            tag: Some("@link".to_owned()),
            ts_link_text: Some(text.into()),
            text: target,
        }
    }

    /// Text shown to a reader: the link text for links, else the raw text.
    pub fn display_text(&self) -> &str {
        self.ts_link_text.as_deref().unwrap_or(&self.text)
    }
}

impl Comment {
    /// Creates a comment whose summary is a single text fragment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            summary: vec![CommentContent::text(text)],
            ..Self::default()
        }
    }

    /// Concatenates the summary fragments into plain text.
    pub fn summary_text(&self) -> String {
        self.summary
            .iter()
            .map(CommentContent::display_text)
            .collect()
    }

    /// Returns the block tags named `tag`, in source order.
    pub fn block_tags<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a CommentTag> + 'a {
        self.block_tags.iter().filter(move |block| block.tag == tag)
    }

    /// Returns true if the modifier tag is present.
    pub fn has_modifier(&self, tag: &str) -> bool {
        self.modifier_tags.contains(tag)
    }

    pub fn is_deprecated(&self) -> bool {
        self.has_modifier("@deprecated")
            || self.block_tags("@deprecated").next().is_some()
    }

    /// Returns true if the element is excluded from published docs.
    pub fn is_hidden(&self) -> bool {
        self.has_modifier("@hidden") || self.has_modifier("@internal")
    }
}
