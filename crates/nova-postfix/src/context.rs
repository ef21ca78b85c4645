//! Postfix marker detection and prefix expression contexts.
//!
//! Given the caret, [`resolve`] finds the `.name` marker typed just before it,
//! parses the document without the marker and walks up from the token the
//! marker is attached to. Every enclosing expression that ends at that token
//! becomes a [`PrefixExpressionContext`], innermost first. The walk stops at
//! the first node that extends past the anchor, at a statement, or at a
//! function boundary.

use nova_core::{TextRange, TextSize};
use nova_syntax::{
    is_ident_continue, is_ident_start, parse_java, significant_range, significant_text, AstNode,
    Expression, SyntaxKind, SyntaxNode, SyntaxToken,
};
use smol_str::SmolStr;

use crate::document::SourceMap;
use crate::semantics::{Resolution, SemanticModel, Type};

/// The `.name` text typed after an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostfixMarker {
    /// Identifier after the dot. Empty right after typing the dot.
    pub name: SmolStr,
    /// Document range of the dot and the identifier.
    pub range: TextRange,
}

impl PostfixMarker {
    pub fn detect(text: &str, caret: TextSize) -> Option<Self> {
        let caret_idx = u32::from(caret) as usize;
        let before = text.get(..caret_idx)?;
        let name_start = before
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_ident_continue(*c))
            .last()
            .map_or(caret_idx, |(idx, _)| idx);
        let name = &before[name_start..];
        if name.chars().next().is_some_and(|c| !is_ident_start(c)) {
            return None;
        }
        if !before[..name_start].ends_with('.') {
            return None;
        }
        let dot = TextSize::from((name_start - 1) as u32);
        Some(Self {
            name: SmolStr::new(name),
            range: TextRange::new(dot, caret),
        })
    }

    /// Maps an offset in the marker-free text back into the document.
    fn to_document(&self, offset: TextSize) -> TextSize {
        if offset > self.range.start() {
            offset + self.range.len()
        } else {
            offset
        }
    }

    fn range_to_document(&self, range: TextRange) -> TextRange {
        TextRange::new(self.to_document(range.start()), self.to_document(range.end()))
    }
}

/// One expression the marker could apply to.
///
/// Holds nodes of the tree it was resolved from; it is only meaningful while
/// the document is still at [`PostfixContext::version`].
#[derive(Debug, Clone)]
pub struct PrefixExpressionContext {
    pub expression: Expression,
    /// Document range of the expression, without the marker.
    pub range: TextRange,
    pub text: String,
    /// The expression is the whole body of an expression statement.
    pub can_be_statement: bool,
    pub ty: Type,
    pub resolution: Resolution,
    /// The expression names a type rather than a value.
    pub is_type_usage: bool,
    pub statement: Option<SyntaxNode>,
    /// Document range of [`Self::statement`]; `None` when it is not physical source.
    pub statement_range: Option<TextRange>,
    pub function: Option<SyntaxNode>,
}

impl PrefixExpressionContext {
    pub fn kind(&self) -> SyntaxKind {
        self.expression.kind()
    }
}

#[derive(Debug, Clone)]
pub struct PostfixContext {
    pub marker: PostfixMarker,
    /// Document offset where the anchor token ends.
    pub anchor: TextSize,
    /// Innermost first.
    pub contexts: Vec<PrefixExpressionContext>,
    pub version: u64,
}

impl PostfixContext {
    pub fn innermost(&self) -> Option<&PrefixExpressionContext> {
        self.contexts.first()
    }

    pub fn outermost(&self) -> Option<&PrefixExpressionContext> {
        self.contexts.last()
    }

    /// Index of the context covering exactly `range`.
    pub fn position_of(&self, range: TextRange) -> Option<usize> {
        self.contexts.iter().position(|ctx| ctx.range == range)
    }
}

/// Resolves the contexts for a marker ending at `caret`.
///
/// Returns `None` when there is no marker before the caret. A marker that is
/// not attached to any expression yields an empty context list.
pub fn resolve(
    text: &str,
    caret: TextSize,
    version: u64,
    source_map: &SourceMap,
    model: &dyn SemanticModel,
) -> Option<PostfixContext> {
    let marker = PostfixMarker::detect(text, caret)?;
    let dot = u32::from(marker.range.start()) as usize;
    let end = u32::from(marker.range.end()) as usize;
    let stripped = format!("{}{}", &text[..dot], &text[end..]);
    let parse = parse_java(&stripped);
    let root = parse.syntax();

    let Some(anchor) = anchor_token(&root, marker.range.start()) else {
        tracing::trace!(target = "nova.postfix", "no anchor token before marker");
        return Some(PostfixContext {
            anchor: marker.range.start(),
            marker,
            contexts: Vec::new(),
            version,
        });
    };
    let anchor_end = anchor.text_range().end();

    let mut contexts = Vec::new();
    for node in anchor.parent_ancestors() {
        let kind = node.kind();
        if kind.is_statement()
            || kind.is_function()
            || matches!(kind, SyntaxKind::ClassBody | SyntaxKind::InterfaceBody)
        {
            break;
        }
        let range = significant_range(&node);
        if range.end() != anchor_end {
            break;
        }
        let Some(expression) = Expression::cast(node) else {
            continue;
        };
        contexts.push(build_context(expression, range, &marker, source_map, model));
    }

    tracing::trace!(
        target = "nova.postfix",
        marker = %marker.name,
        contexts = contexts.len(),
        "resolved postfix contexts"
    );
    Some(PostfixContext {
        anchor: marker.to_document(anchor_end),
        marker,
        contexts,
        version,
    })
}

fn anchor_token(root: &SyntaxNode, offset: TextSize) -> Option<SyntaxToken> {
    let mut token = root.token_at_offset(offset).left_biased()?;
    while token.kind().is_trivia() || token.kind() == SyntaxKind::Eof {
        token = token.prev_token()?;
    }
    // A token that starts at the dot belongs after the marker.
    (token.text_range().end() <= offset).then_some(token)
}

fn build_context(
    expression: Expression,
    range: TextRange,
    marker: &PostfixMarker,
    source_map: &SourceMap,
    model: &dyn SemanticModel,
) -> PrefixExpressionContext {
    let node = expression.syntax();
    let can_be_statement = node
        .parent()
        .is_some_and(|parent| parent.kind() == SyntaxKind::ExpressionStatement);
    let statement = node
        .ancestors()
        .skip(1)
        .take_while(|n| !n.kind().is_function())
        .find(|n| n.kind().is_statement() && n.kind() != SyntaxKind::Block);
    let statement_range = statement
        .as_ref()
        .map(|stmt| marker.range_to_document(significant_range(stmt)))
        .filter(|range| source_map.is_physical(*range));
    let function = node.ancestors().skip(1).find(|n| n.kind().is_function());

    let resolution = model.resolve_reference(&expression);
    let (ty, is_type_usage) = match &resolution {
        Resolution::Type(ty) => (ty.clone(), true),
        Resolution::Value(ty) => (ty.clone(), false),
        Resolution::Unresolved => (Type::Unresolved, false),
    };

    PrefixExpressionContext {
        range: marker.range_to_document(range),
        text: significant_text(node),
        expression,
        can_be_statement,
        ty,
        resolution,
        is_type_usage,
        statement,
        statement_range,
        function,
    }
}
