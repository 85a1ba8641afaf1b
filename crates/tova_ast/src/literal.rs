//! Literal values shared by expressions and patterns.

use tova_base::Symbol;

use crate::expr::Expr;

/// One part of an interpolated string literal: either literal text or a
/// nested expression, mirroring [`tova_lexer`]'s `StringPart` one layer up
/// the pipeline (the parser re-parses each interpolation token stream into
/// a full `Expr`).
#[derive(Debug, Clone)]
pub enum TemplatePart<'a> {
    Text(Symbol),
    Expr(&'a Expr<'a>),
}

/// A literal value.
#[derive(Debug, Clone)]
pub enum Literal<'a> {
    Number(Symbol),
    /// A single-quoted string: plain text, never interpolated.
    String(Symbol),
    /// A double/triple-quoted or `f"..."` string, possibly interpolated.
    Template(&'a [TemplatePart<'a>]),
    Bool(bool),
    Nil,
}
