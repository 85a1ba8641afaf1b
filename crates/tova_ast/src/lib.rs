//! # tova_ast
//!
//! The arena-allocated AST node family the parser produces and the
//! analyzer/code generator consume: ~90 tagged variants across
//! [`expr::Expr`], [`stmt::Stmt`], [`decl::Decl`], [`pattern::Pattern`],
//! and [`jsx::JsxNode`], each carrying a [`tova_base::Location`].
//!
//! Every node family gets its own bump arena (mirroring how a single
//! compilation hands out `&'a Expr<'a>`/`&'a Term<'a>` references from
//! dedicated arenas rather than one untyped heap); [`Arenas`] bundles them
//! for the parser to thread through.

pub mod block;
pub mod decl;
pub mod expr;
pub mod jsx;
pub mod literal;
pub mod pattern;
pub mod stmt;
pub mod types;

pub use block::{
    BenchBlock, Block, BlockBody, BrowserBlock, CliBlock, DataBlock, DeployBlock, Program,
    SecurityBlock, ServerBlock, SharedBlock, TestBlock, TopLevelItem,
};
pub use decl::{
    AiDecl, ComponentDecl, ComputedDecl, DbDecl, Decl, EffectDecl, FieldDecl, FunctionDecl,
    HttpMethod, ImplDecl, ImportDecl, InterfaceDecl, MethodSignature, MiddlewareDecl, RouteDecl,
    SseDecl, StateDecl, StoreDecl, TraitDecl, TypeDecl, VariantDecl, WebsocketDecl,
};
pub use expr::{
    BinaryOpKind, CallArg, ColumnExpr, Comprehension, ComprehensionClause, CompoundAssignOpKind,
    Expr, MatchArm, UnaryOpKind,
};
pub use jsx::{EventModifier, JsxAttribute, JsxAttributeValue, JsxChild, JsxNode, TransitionKind};
pub use literal::{Literal, TemplatePart};
pub use pattern::{ObjectPatternField, Pattern};
pub use stmt::{Block as StmtBlock, ForStmt, Label, MatchStmtArm, Stmt};
pub use types::{Param, TypeExpr};

use tova_base::{Arena, Symbol};

/// The bundle of per-node-type arenas a single compilation allocates from.
///
/// One arena per element type that a parser rule hands out as `&'a T` or
/// `&'a [T]`, following the same one-arena-per-family shape as the node
/// arenas rather than funnelling every auxiliary slice through a single
/// untyped byte arena.
pub struct Arenas<'a> {
    pub exprs: Arena<Expr<'a>>,
    pub stmts: Arena<Stmt<'a>>,
    pub decls: Arena<Decl<'a>>,
    pub patterns: Arena<Pattern<'a>>,
    pub jsx: Arena<JsxNode<'a>>,
    pub items: Arena<TopLevelItem<'a>>,
    /// Backs every `&'a [Symbol]` slice (column paths, import name lists,
    /// type parameter lists).
    pub symbols: Arena<Symbol>,
    pub types: Arena<TypeExpr<'a>>,
    pub params: Arena<Param<'a>>,
    pub call_args: Arena<CallArg<'a>>,
    pub match_arms: Arena<MatchArm<'a>>,
    pub match_stmt_arms: Arena<MatchStmtArm<'a>>,
    pub template_parts: Arena<TemplatePart<'a>>,
    pub comprehension_clauses: Arena<ComprehensionClause<'a>>,
    pub binary_ops: Arena<BinaryOpKind>,
    pub dict_entries: Arena<(Expr<'a>, Expr<'a>)>,
    pub config_entries: Arena<(Symbol, Expr<'a>)>,
    pub object_pattern_fields: Arena<ObjectPatternField<'a>>,
    pub function_decls: Arena<FunctionDecl<'a>>,
    pub variant_decls: Arena<VariantDecl<'a>>,
    pub field_decls: Arena<FieldDecl<'a>>,
    pub method_signatures: Arena<MethodSignature<'a>>,
    pub jsx_attributes: Arena<JsxAttribute<'a>>,
    pub jsx_children: Arena<JsxChild<'a>>,
    pub event_modifiers: Arena<EventModifier>,
}

impl<'a> Arenas<'a> {
    pub fn new() -> Self {
        Self {
            exprs: Arena::new(),
            stmts: Arena::new(),
            decls: Arena::new(),
            patterns: Arena::new(),
            jsx: Arena::new(),
            items: Arena::new(),
            symbols: Arena::new(),
            types: Arena::new(),
            params: Arena::new(),
            call_args: Arena::new(),
            match_arms: Arena::new(),
            match_stmt_arms: Arena::new(),
            template_parts: Arena::new(),
            comprehension_clauses: Arena::new(),
            binary_ops: Arena::new(),
            dict_entries: Arena::new(),
            config_entries: Arena::new(),
            object_pattern_fields: Arena::new(),
            function_decls: Arena::new(),
            variant_decls: Arena::new(),
            field_decls: Arena::new(),
            method_signatures: Arena::new(),
            jsx_attributes: Arena::new(),
            jsx_children: Arena::new(),
            event_modifiers: Arena::new(),
        }
    }
}

impl<'a> Default for Arenas<'a> {
    fn default() -> Self {
        Self::new()
    }
}
