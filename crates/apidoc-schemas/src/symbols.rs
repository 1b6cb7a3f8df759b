//! Snapshot-wide lookup table for back-references.
//!
//! `inheritedFrom` and `overwrites` name another element of the same
//! snapshot. They are relations, not ownership: the table maps dotted
//! qualified names to what they denote, and is built once per snapshot.

use std::collections::HashMap;

use crate::kind::KindTag;
use crate::record::{ElementRecord, Snapshot};

/// What a qualified name denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Full dotted path, e.g. `Camera.takePictureAsync`.
    pub path: String,
    pub kind: Option<KindTag>,
    /// Full path of the enclosing element, if any.
    pub parent: Option<String>,
}

/// Qualified name index over a snapshot.
///
/// Besides full paths, every unambiguous dotted suffix resolves too, so
/// `Base.size` finds `ns.Base.size`. A suffix shared by two paths resolves
/// to nothing.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolEntry>,
    /// Suffix to full path; `None` marks an ambiguous suffix.
    suffixes: HashMap<String, Option<String>>,
}

impl SymbolTable {
    /// Indexes every element and member of the snapshot.
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut table = Self::default();
        let mut stack: Vec<(&ElementRecord, Option<String>)> = snapshot
            .children
            .iter()
            .rev()
            .map(|record| (record, None))
            .collect();

        while let Some((record, parent)) = stack.pop() {
            let path = match &parent {
                Some(parent) => format!("{parent}.{}", record.name),
                None => record.name.clone(),
            };
            for child in record.children.iter().flatten().rev() {
                stack.push((child, Some(path.clone())));
            }
            table.insert(SymbolEntry {
                path,
                kind: record.kind,
                parent,
            });
        }
        table
    }

    fn insert(&mut self, entry: SymbolEntry) {
        let path = entry.path.clone();
        for (i, _) in path.match_indices('.') {
            let suffix = &path[i + 1..];
            self.suffixes
                .entry(suffix.to_owned())
                .and_modify(|existing| {
                    if existing.as_deref() != Some(path.as_str()) {
                        *existing = None;
                    }
                })
                .or_insert_with(|| Some(path.clone()));
        }
        // The first definition of a path wins; later duplicates are
        // overwritten members and resolve to the same place.
        self.entries.entry(path).or_insert(entry);
    }

    /// Resolves a full path or an unambiguous suffix.
    pub fn resolve(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name).or_else(|| {
            let full = self.suffixes.get(name)?.as_deref()?;
            self.entries.get(full)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Number of distinct full paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
