//! Syntax tree and parsing primitives.
//!
//! This crate provides three entry points over the same lossless rowan tree:
//! - [`parse_java`]: a whole compilation unit.
//! - [`parse_java_statement_fragment`]: a single statement, used to validate
//!   synthesized code before it is written into a document.
//! - [`parse_java_expression_fragment`]: a single expression.

pub mod ast;
mod lexer;
mod parser;
mod syntax_kind;

pub use ast::*;
pub use lexer::{is_ident_continue, is_ident_start, lex, Lexer, Token};
pub use parser::{
    parse_java, parse_java_expression_fragment, parse_java_statement_fragment,
    JavaFragmentParseResult, JavaParseResult, SyntaxElement, SyntaxNode, SyntaxToken,
};
pub use syntax_kind::{JavaLanguage, SyntaxKind};
pub use text_size::{TextRange, TextSize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

/// Range of `node` without leading and trailing trivia.
///
/// The parser attaches whitespace to whichever node is open when it is
/// consumed, so raw node ranges often end in a newline or indentation.
pub fn significant_range(node: &SyntaxNode) -> TextRange {
    let mut tokens = node
        .descendants_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !t.kind().is_trivia() && !t.text_range().is_empty());
    let Some(first) = tokens.next() else {
        return TextRange::empty(node.text_range().start());
    };
    let last = tokens.last().unwrap_or_else(|| first.clone());
    TextRange::new(first.text_range().start(), last.text_range().end())
}

/// Text of `node` without leading and trailing trivia.
pub fn significant_text(node: &SyntaxNode) -> String {
    let range = significant_range(node);
    let start = node.text_range().start();
    let text = node.text().to_string();
    let local = range - start;
    text[local].to_string()
}
