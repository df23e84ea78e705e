//! Span classification over parsed Go trees
//!
//! Walks every node reachable from the tree root, anonymous keyword tokens
//! included, and maps node kinds onto highlight categories through a lookup
//! table. The output is a fresh [`FactSet`] each pass; classification carries
//! no state between cycles and never touches the ledger.

use tree_sitter::{Node, Tree};

use crate::span::{Category, FactSet, SourceSpan};

/// How a table entry derives its highlight length
#[derive(Debug, Clone, Copy)]
enum LengthRule {
    /// Keyword tokens have a known on-screen width
    Fixed(u32),
    /// Width of the token's own text, clamped to its first line
    TokenText,
}

/// Node-kind dispatch table (tree-sitter-go grammar kinds).
///
/// Adding a construct is a data change: a new row, no new control flow.
/// Kinds not listed here contribute no facts.
const KIND_TABLE: &[(&str, Category, LengthRule)] = &[
    ("package", Category::Statement, LengthRule::Fixed(7)),
    ("import", Category::Statement, LengthRule::Fixed(6)),
    ("var", Category::Keyword, LengthRule::Fixed(3)),
    ("const", Category::Keyword, LengthRule::Fixed(5)),
    ("type", Category::Keyword, LengthRule::Fixed(4)),
    ("struct", Category::Keyword, LengthRule::Fixed(6)),
    ("interface", Category::Keyword, LengthRule::Fixed(9)),
    ("func", Category::Keyword, LengthRule::Fixed(4)),
    ("return", Category::Keyword, LengthRule::Fixed(6)),
    ("break", Category::Keyword, LengthRule::TokenText),
    ("continue", Category::Keyword, LengthRule::TokenText),
    ("goto", Category::Keyword, LengthRule::TokenText),
    ("fallthrough", Category::Keyword, LengthRule::TokenText),
    ("go", Category::Statement, LengthRule::Fixed(2)),
    ("defer", Category::Statement, LengthRule::Fixed(5)),
    ("for", Category::Repeat, LengthRule::Fixed(3)),
    ("range", Category::Repeat, LengthRule::Fixed(5)),
    ("switch", Category::Conditional, LengthRule::Fixed(6)),
    ("select", Category::Conditional, LengthRule::Fixed(6)),
    ("if", Category::Conditional, LengthRule::Fixed(2)),
    ("case", Category::Label, LengthRule::Fixed(4)),
    ("chan", Category::Type, LengthRule::Fixed(4)),
    ("map", Category::Type, LengthRule::Fixed(3)),
    ("type_identifier", Category::Type, LengthRule::TokenText),
    (
        "interpreted_string_literal",
        Category::String,
        LengthRule::TokenText,
    ),
    ("raw_string_literal", Category::String, LengthRule::TokenText),
    ("comment", Category::Comment, LengthRule::TokenText),
];

fn rule_for(kind: &str) -> Option<(Category, LengthRule)> {
    KIND_TABLE
        .iter()
        .find(|(k, _, _)| *k == kind)
        .map(|&(_, category, rule)| (category, rule))
}

/// Classify every node reachable from the tree root into highlight facts.
///
/// Total over the kind table: unknown kinds are skipped, and the walk
/// recurses into every subtree, so nested type expressions (field types,
/// return types, map/channel element types) are each classified at their own
/// span. Partial trees, including ones containing error nodes, are
/// classified as-is. The `range` token of a range loop is matched by kind
/// like any other row, so malformed range forms simply yield no marker fact.
pub fn classify(tree: &Tree, source: &str) -> FactSet {
    let mut facts = FactSet::new();
    let mut cursor = tree.root_node().walk();

    loop {
        classify_node(cursor.node(), source, &mut facts);

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return facts;
            }
        }
    }
}

fn classify_node(node: Node, source: &str, facts: &mut FactSet) {
    let kind = node.kind();

    // Function and method names are identified structurally rather than by
    // kind: the name child is a plain identifier, which carries no category
    // anywhere else in the grammar.
    if kind == "function_declaration" || kind == "method_declaration" {
        if let Some(name) = node.child_by_field_name("name") {
            if let Some(length) = token_display_len(&name, source) {
                facts.insert(span_at(&name, Category::Function, length));
            }
        }
    }

    let Some((category, rule)) = rule_for(kind) else {
        return;
    };
    let length = match rule {
        LengthRule::Fixed(len) => len,
        LengthRule::TokenText => match token_display_len(&node, source) {
            Some(len) => len,
            None => return,
        },
    };
    facts.insert(span_at(&node, category, length));
}

fn span_at(node: &Node, category: Category, length: u32) -> SourceSpan {
    let start = node.start_position();
    SourceSpan::new(category, start.row as u32 + 1, start.column as u32 + 1, length)
}

/// Character width of a token up to its first line break.
///
/// Raw string literals and general comments may span lines; a mark never
/// does, so the highlight covers the line the token starts on. Zero-width
/// tokens (missing nodes in partial trees) yield no fact.
fn token_display_len(node: &Node, source: &str) -> Option<u32> {
    let text = node.utf8_text(source.as_bytes()).ok()?;
    let first_line = text.split('\n').next().unwrap_or(text);
    let length = first_line.chars().count() as u32;
    (length > 0).then_some(length)
}
