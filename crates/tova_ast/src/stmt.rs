//! Statement grammar.

use tova_base::{Location, Symbol};

use crate::decl::Decl;
use crate::expr::{CompoundAssignOpKind, Expr};
use crate::pattern::Pattern;
use crate::types::TypeExpr;

/// A braced sequence of statements.
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub statements: &'a [Stmt<'a>],
    pub location: Location,
}

/// An optional loop label: `outer: loop { ... }`.
pub type Label = Option<Symbol>;

#[derive(Debug, Clone)]
pub struct ForStmt<'a> {
    pub label: Label,
    pub pattern: Pattern<'a>,
    pub iterable: &'a Expr<'a>,
    /// `when` guard: skips (via `continue`) iterations failing the guard.
    pub guard: Option<&'a Expr<'a>>,
    pub is_async: bool,
    pub body: Block<'a>,
    /// `for ... else { ... }`: runs if the loop completes without `break`.
    pub else_branch: Option<Block<'a>>,
}

#[derive(Debug, Clone)]
pub struct MatchStmtArm<'a> {
    pub pattern: Pattern<'a>,
    pub guard: Option<&'a Expr<'a>>,
    pub body: Block<'a>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub enum Stmt<'a> {
    /// A top-level or nested item declaration (function, type, etc.)
    /// appearing in statement position inside a block body.
    Decl { decl: Decl<'a>, location: Location },

    /// `var name: Type = expr` / `let name: Type = expr`.
    Let {
        mutable: bool,
        name: Symbol,
        type_annotation: Option<TypeExpr<'a>>,
        value: Option<&'a Expr<'a>>,
        location: Location,
    },
    /// `let {a, b} = expr` / `let [a, b] = expr`: destructuring binding.
    LetDestructure {
        mutable: bool,
        pattern: Pattern<'a>,
        value: &'a Expr<'a>,
        location: Location,
    },
    /// `target = expr`.
    Assign {
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
        location: Location,
    },
    CompoundAssign {
        op: CompoundAssignOpKind,
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
        location: Location,
    },
    Expr { expr: &'a Expr<'a>, location: Location },
    Block { block: Block<'a>, location: Location },
    Return { value: Option<&'a Expr<'a>>, location: Location },

    If {
        condition: &'a Expr<'a>,
        then_branch: Block<'a>,
        /// `elif` chains desugar into nested `else_branch` blocks containing
        /// a single `If` statement.
        else_branch: Option<Block<'a>>,
        location: Location,
    },
    For { stmt: ForStmt<'a>, location: Location },
    While {
        label: Label,
        condition: &'a Expr<'a>,
        body: Block<'a>,
        location: Location,
    },
    Loop {
        label: Label,
        body: Block<'a>,
        location: Location,
    },
    Match {
        subject: &'a Expr<'a>,
        arms: &'a [MatchStmtArm<'a>],
        location: Location,
    },
    Break { label: Label, location: Location },
    Continue { label: Label, location: Location },

    /// `guard cond else { body }`: `body` must diverge (return/break/continue/throw).
    Guard {
        condition: &'a Expr<'a>,
        else_branch: Block<'a>,
        location: Location,
    },
    /// `with expr as name { body }`: emits try/finally calling `close`/`dispose`.
    With {
        resource: &'a Expr<'a>,
        binding: Symbol,
        body: Block<'a>,
        location: Location,
    },
    /// `defer { body }`: runs `body` when the enclosing function returns.
    Defer { body: Block<'a>, location: Location },
    TryCatch {
        try_block: Block<'a>,
        catch_binding: Option<Symbol>,
        catch_block: Block<'a>,
        finally_block: Option<Block<'a>>,
        location: Location,
    },
}

impl<'a> Stmt<'a> {
    pub fn location(&self) -> Location {
        match self {
            Stmt::Decl { location, .. }
            | Stmt::Let { location, .. }
            | Stmt::LetDestructure { location, .. }
            | Stmt::Assign { location, .. }
            | Stmt::CompoundAssign { location, .. }
            | Stmt::Expr { location, .. }
            | Stmt::Block { location, .. }
            | Stmt::Return { location, .. }
            | Stmt::If { location, .. }
            | Stmt::For { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Loop { location, .. }
            | Stmt::Match { location, .. }
            | Stmt::Break { location, .. }
            | Stmt::Continue { location, .. }
            | Stmt::Guard { location, .. }
            | Stmt::With { location, .. }
            | Stmt::Defer { location, .. }
            | Stmt::TryCatch { location, .. } => *location,
        }
    }
}
