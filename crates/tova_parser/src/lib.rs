//! # tova_parser
//!
//! Recursive-descent parser turning a [`tova_lexer`] token vector into a
//! [`tova_ast::Program`]. One [`parser::Parser`] struct carries the cursor
//! and diagnostics; each grammar concern (expressions, patterns, column
//! expressions, JSX, declarations, statements) lives in its own module as a
//! trait implemented for `Parser`, so the precedence grid in [`expr`] can
//! call down into [`pattern`] and [`jsx`] without those modules needing to
//! know about each other.
//!
//! Error recovery is two-tiered (spec-independent, see [`parser`]'s module
//! doc): a statement-level resynchronization that skips to the next
//! recognizable statement start, and a top-level one that skips to the next
//! block/declaration keyword. In non-tolerant mode the first error aborts
//! the parse; in tolerant mode (editor tooling) the parser keeps going and
//! collects every diagnostic it can.

pub mod column;
pub mod decl;
pub mod expr;
pub mod jsx;
pub mod parser;
pub mod pattern;
pub mod stmt;

pub use column::ColumnParsing;
pub use decl::DeclParsing;
pub use expr::ExprParsing;
pub use jsx::JsxParsing;
pub use parser::{parse_program, ParseFailure, ParseOutcome, Parser};
pub use pattern::PatternParsing;
pub use stmt::StmtParsing;
