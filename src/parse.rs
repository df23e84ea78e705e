//! Go parser management
//!
//! Owns the tree-sitter parser configured with the Go grammar and exposes
//! the parse step the engine consumes. Every cycle re-parses the buffer from
//! scratch; no tree is cached between cycles.

use tree_sitter::{LanguageError, Parser, Tree};

use crate::engine::SourceParser;

/// Tree-sitter parser configured for Go
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a parser with the Go grammar loaded
    pub fn new() -> Result<Self, LanguageError> {
        let language = tree_sitter::Language::from(tree_sitter_go::LANGUAGE);
        let mut parser = Parser::new();
        parser.set_language(&language)?;
        Ok(Self { parser })
    }
}

impl SourceParser for GoParser {
    fn parse(&mut self, source: &str) -> Option<Tree> {
        // A tree containing error nodes is still usable for classification;
        // None means the parser produced nothing at all for this cycle.
        self.parser.parse(source, None)
    }
}
