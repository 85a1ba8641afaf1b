//! Declaration grammar: functions, types, traits, impls, and the
//! browser/server-specific declarations (`state`, `route`, ...).

use tova_base::{Location, Symbol};

use crate::expr::Expr;
use crate::stmt::Block;
use crate::types::{Param, TypeExpr};

/// A function declaration: `fn name(params) -> Type { body }`.
#[derive(Debug, Clone)]
pub struct FunctionDecl<'a> {
    pub name: Symbol,
    pub params: &'a [Param<'a>],
    pub return_type: Option<TypeExpr<'a>>,
    pub body: Block<'a>,
    pub is_async: bool,
    pub is_pub: bool,
    pub docstring: Option<Symbol>,
    pub location: Location,
}

/// One field of a `type` variant (`Circle { radius: Float }`) or a plain
/// struct-shaped type.
#[derive(Debug, Clone)]
pub struct FieldDecl<'a> {
    pub name: Symbol,
    pub type_annotation: Option<TypeExpr<'a>>,
    pub location: Location,
}

/// One variant of a `type` declaration (`Circle(Float)` or `Circle { radius: Float }`).
#[derive(Debug, Clone)]
pub struct VariantDecl<'a> {
    pub name: Symbol,
    pub fields: &'a [FieldDecl<'a>],
    pub location: Location,
}

/// `type Name<T> = Variant | Variant | ...` or a plain struct type with one
/// implicit variant sharing the type's name.
#[derive(Debug, Clone)]
pub struct TypeDecl<'a> {
    pub name: Symbol,
    pub type_params: &'a [Symbol],
    pub variants: &'a [VariantDecl<'a>],
    pub is_pub: bool,
    pub docstring: Option<Symbol>,
    pub location: Location,
}

/// A method signature required by a `trait`/`interface`.
#[derive(Debug, Clone)]
pub struct MethodSignature<'a> {
    pub name: Symbol,
    pub params: &'a [Param<'a>],
    pub return_type: Option<TypeExpr<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct TraitDecl<'a> {
    pub name: Symbol,
    pub methods: &'a [MethodSignature<'a>],
    pub is_pub: bool,
    pub location: Location,
}

/// `interface` behaves identically to `trait` at the AST level; the
/// distinction is purely vocabulary the analyzer treats the same way.
pub type InterfaceDecl<'a> = TraitDecl<'a>;

/// `impl Trait for Type { ... }` or an inherent `impl Type { ... }`.
#[derive(Debug, Clone)]
pub struct ImplDecl<'a> {
    pub trait_name: Option<Symbol>,
    pub type_name: Symbol,
    pub methods: &'a [FunctionDecl<'a>],
    pub location: Location,
}

/// `state name = init` (browser-only).
#[derive(Debug, Clone)]
pub struct StateDecl<'a> {
    pub name: Symbol,
    pub type_annotation: Option<TypeExpr<'a>>,
    pub initial: &'a Expr<'a>,
    pub location: Location,
}

/// `computed name = expr` (browser-only).
#[derive(Debug, Clone)]
pub struct ComputedDecl<'a> {
    pub name: Symbol,
    pub body: &'a Expr<'a>,
    pub location: Location,
}

/// `effect { body }` (browser-only).
#[derive(Debug, Clone)]
pub struct EffectDecl<'a> {
    pub body: Block<'a>,
    pub location: Location,
}

/// `component Name(props) { body }` (browser-only).
#[derive(Debug, Clone)]
pub struct ComponentDecl<'a> {
    pub name: Symbol,
    pub props: &'a [Param<'a>],
    pub body: Block<'a>,
    pub location: Location,
}

/// `style { css }` (browser-only): a component's scoped stylesheet, holding
/// the raw CSS text verbatim as lexed (not parsed as Tova source).
#[derive(Debug, Clone)]
pub struct StyleDecl {
    pub css: Symbol,
    pub location: Location,
}

/// `store name { body }` (browser-only): a shared reactive container.
#[derive(Debug, Clone)]
pub struct StoreDecl<'a> {
    pub name: Symbol,
    pub body: Block<'a>,
    pub location: Location,
}

/// `route METHOD "/path" => handler` (server-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

#[derive(Debug, Clone)]
pub struct RouteDecl<'a> {
    pub method: HttpMethod,
    pub path: Symbol,
    pub handler: &'a Expr<'a>,
    pub location: Location,
}

/// `middleware name { body }` (server-only).
#[derive(Debug, Clone)]
pub struct MiddlewareDecl<'a> {
    pub name: Symbol,
    pub body: Block<'a>,
    pub location: Location,
}

/// `websocket "/path" { body }` (server-only).
#[derive(Debug, Clone)]
pub struct WebsocketDecl<'a> {
    pub path: Symbol,
    pub body: Block<'a>,
    pub location: Location,
}

/// `sse "/path" { body }` (server-only).
#[derive(Debug, Clone)]
pub struct SseDecl<'a> {
    pub path: Symbol,
    pub body: Block<'a>,
    pub location: Location,
}

/// `db name { engine: "postgres", ... }` (server-only).
#[derive(Debug, Clone)]
pub struct DbDecl<'a> {
    pub name: Symbol,
    pub config: &'a [(Symbol, Expr<'a>)],
    pub location: Location,
}

/// `ai name { model: "...", ... }` (server-only).
#[derive(Debug, Clone)]
pub struct AiDecl<'a> {
    pub name: Symbol,
    pub config: &'a [(Symbol, Expr<'a>)],
    pub location: Location,
}

/// `import name from "path"` / `import {a, b} from "path"`.
#[derive(Debug, Clone)]
pub struct ImportDecl<'a> {
    pub names: &'a [Symbol],
    pub source: Symbol,
    pub location: Location,
}

/// Any declaration-position item.
#[derive(Debug, Clone)]
pub enum Decl<'a> {
    Function(FunctionDecl<'a>),
    Type(TypeDecl<'a>),
    Trait(TraitDecl<'a>),
    Interface(InterfaceDecl<'a>),
    Impl(ImplDecl<'a>),
    Import(ImportDecl<'a>),
    State(StateDecl<'a>),
    Computed(ComputedDecl<'a>),
    Effect(EffectDecl<'a>),
    Component(ComponentDecl<'a>),
    Store(StoreDecl<'a>),
    Style(StyleDecl),
    Route(RouteDecl<'a>),
    Middleware(MiddlewareDecl<'a>),
    Websocket(WebsocketDecl<'a>),
    Sse(SseDecl<'a>),
    Db(DbDecl<'a>),
    Ai(AiDecl<'a>),
}

impl<'a> Decl<'a> {
    pub fn location(&self) -> Location {
        match self {
            Decl::Function(d) => d.location,
            Decl::Type(d) => d.location,
            Decl::Trait(d) => d.location,
            Decl::Interface(d) => d.location,
            Decl::Impl(d) => d.location,
            Decl::Import(d) => d.location,
            Decl::State(d) => d.location,
            Decl::Computed(d) => d.location,
            Decl::Effect(d) => d.location,
            Decl::Component(d) => d.location,
            Decl::Store(d) => d.location,
            Decl::Style(d) => d.location,
            Decl::Route(d) => d.location,
            Decl::Middleware(d) => d.location,
            Decl::Websocket(d) => d.location,
            Decl::Sse(d) => d.location,
            Decl::Db(d) => d.location,
            Decl::Ai(d) => d.location,
        }
    }

    /// `true` for declarations valid only inside a `client`/`browser` scope
    /// (spec invariant checked by the analyzer's context-restriction pass).
    pub fn is_browser_only(&self) -> bool {
        matches!(
            self,
            Decl::State(_) | Decl::Computed(_) | Decl::Effect(_) | Decl::Component(_) | Decl::Store(_) | Decl::Style(_)
        )
    }

    /// `true` for declarations valid only inside a `server` scope.
    pub fn is_server_only(&self) -> bool {
        matches!(
            self,
            Decl::Route(_) | Decl::Middleware(_) | Decl::Websocket(_) | Decl::Sse(_) | Decl::Db(_)
        )
    }
}
