//! Highlight categories, spans, and fact sets
//!
//! Defines the fixed category vocabulary, the immutable span value produced
//! by classification, and the deduplicating set those spans are collected in.

use std::collections::{btree_set, BTreeSet};
use std::fmt;

/// Highlight categories understood by the host surface.
///
/// The vocabulary is fixed; hosts map each category's display name onto one
/// of their own highlight groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Keyword,
    Statement,
    String,
    Type,
    Conditional,
    Function,
    Comment,
    Label,
    Repeat,
}

impl Category {
    /// All categories, in declaration order
    pub const ALL: [Category; 9] = [
        Category::Keyword,
        Category::Statement,
        Category::String,
        Category::Type,
        Category::Conditional,
        Category::Function,
        Category::Comment,
        Category::Label,
        Category::Repeat,
    ];

    /// Stable name hosts use to pick a highlight group
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Keyword => "Keyword",
            Category::Statement => "Statement",
            Category::String => "String",
            Category::Type => "Type",
            Category::Conditional => "Conditional",
            Category::Function => "Function",
            Category::Comment => "Comment",
            Category::Label => "Label",
            Category::Repeat => "Repeat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single highlighted token span.
///
/// Line and column are 1-based. Length is the on-screen extent in
/// characters; a span never crosses a line break, so multi-line tokens are
/// clamped to the line they start on by the classifier. The full
/// (line, column, length, category) tuple is the identity of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSpan {
    /// 1-based line number
    pub line: u32,
    /// 1-based column of the first highlighted character
    pub column: u32,
    /// Extent in characters
    pub length: u32,
    /// Highlight category
    pub category: Category,
}

impl SourceSpan {
    pub fn new(category: Category, line: u32, column: u32, length: u32) -> Self {
        Self {
            line,
            column,
            length,
            category,
        }
    }
}

/// The set of spans computed in one classification pass over one buffer
/// snapshot.
///
/// Inserting the same span twice is a no-op: several tree nodes may land on
/// the same visual highlight without producing duplicate marks. Iteration is
/// in span order, which keeps reconciliation output reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    spans: BTreeSet<SourceSpan>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact; returns false if it was already present
    pub fn insert(&mut self, span: SourceSpan) -> bool {
        self.spans.insert(span)
    }

    pub fn contains(&self, span: &SourceSpan) -> bool {
        self.spans.contains(span)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, SourceSpan> {
        self.spans.iter()
    }
}

impl FromIterator<SourceSpan> for FactSet {
    fn from_iter<I: IntoIterator<Item = SourceSpan>>(iter: I) -> Self {
        Self {
            spans: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FactSet {
    type Item = &'a SourceSpan;
    type IntoIter = btree_set::Iter<'a, SourceSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}
