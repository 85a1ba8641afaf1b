#![cfg_attr(docsrs, feature(doc_cfg))]

//! # tova_base
//!
//! Pure structural atoms shared across the Tova compiler:
//!
//! - [`Arena`] — bump allocation for stable AST references
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`Position`]/[`Location`] — source location tracking (line/column/file)
//! - [`LocatedError`]/[`Result`] — errors with a source position
//! - [`Diagnostic`]/[`DiagnosticBag`] — the `{severity, code, message, location}`
//!   shape produced by every later stage
//!
//! This crate has no knowledge of Tova syntax or JavaScript. It is generic
//! infrastructure that the lexer, parser, analyzer, and code generator all
//! build on.

pub mod arena;
pub mod diagnostic;
pub mod error;
pub mod intern;
pub mod span;

pub use arena::Arena;
pub use diagnostic::{Diagnostic, DiagnosticBag, DiagnosticCode, Severity};
pub use error::{LocatedError, Result};
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::{Location, Position};
