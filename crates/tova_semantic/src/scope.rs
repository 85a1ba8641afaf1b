//! The scope tree: `{parent, kind, bindings}` per spec §3, with `lookup`
//! walking the parent chain and `getContext` finding the nearest enclosing
//! `server`/`browser`/`shared` kind.
//!
//! Unlike the teacher's `ScopeStack` (a flat `Vec` of `HashMap`s, popped as
//! code generation unwinds), the analyzer keeps every scope alive for the
//! whole pass so the returned tree can be introspected afterward by LSP/doc
//! tooling — so this is a parent-linked arena of scopes addressed by index
//! rather than a stack.

use std::collections::HashMap;

use tova_base::{Location, Symbol};

/// The kind of a scope, mirroring spec §3's `Scope.kind` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
    Server,
    Browser,
    Shared,
    Test,
    Bench,
    Security,
    Cli,
    Data,
    Deploy,
}

impl ScopeKind {
    /// `true` for the three kinds `getContext` can return besides `Module`.
    pub fn is_context_kind(self) -> bool {
        matches!(self, ScopeKind::Server | ScopeKind::Browser | ScopeKind::Shared)
    }
}

/// What a name in a scope was bound by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Var,
    Param,
    Function,
    Type,
    Trait,
    /// A destructured `let`/`var` binding — always immutable per spec §4.3
    /// ("assigning to ... a destructured binding is an error").
    Destructured,
    /// A registered peer `server` block, resolved as a namespace binding
    /// for `peer.fn(args)` calls.
    Peer,
    Builtin,
    /// A name brought in by an `import` declaration.
    Import,
}

impl BindingKind {
    /// `true` if this binding may appear as an assignment/compound-assign
    /// target.
    pub fn is_mutable_kind(self) -> bool {
        matches!(self, BindingKind::Var)
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: Symbol,
    pub kind: BindingKind,
    pub location: Location,
}

#[derive(Debug)]
struct ScopeNode {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    bindings: HashMap<Symbol, Binding>,
}

/// An index into a [`ScopeTree`]. Scope 0 is always the module scope.
pub type ScopeId = usize;

/// The scope tree built up over one analysis pass.
#[derive(Debug)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![ScopeNode { parent: None, kind: ScopeKind::Module, bindings: HashMap::new() }],
        }
    }

    pub fn module_scope() -> ScopeId {
        0
    }

    /// Creates a child scope of `kind` under `parent`.
    pub fn push_child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.nodes.push(ScopeNode { parent: Some(parent), kind, bindings: HashMap::new() });
        self.nodes.len() - 1
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.nodes[scope].kind
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.nodes[scope].parent
    }

    /// Defines `binding` in `scope`. Returns the existing binding if `name`
    /// was already bound in this exact scope (spec §4.3 duplicate check);
    /// the caller decides whether that's an error.
    pub fn define(&mut self, scope: ScopeId, binding: Binding) -> Option<Binding> {
        self.nodes[scope].bindings.insert(binding.name, binding)
    }

    /// Walks the parent chain looking for `name`.
    pub fn lookup(&self, scope: ScopeId, name: Symbol) -> Option<&Binding> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            if let Some(binding) = self.nodes[id].bindings.get(&name) {
                return Some(binding);
            }
            cursor = self.nodes[id].parent;
        }
        None
    }

    /// Checks only `scope` itself, not its ancestors.
    pub fn lookup_local(&self, scope: ScopeId, name: Symbol) -> Option<&Binding> {
        self.nodes[scope].bindings.get(&name)
    }

    /// Like [`Self::lookup`], but also returns the id of the scope that
    /// actually owns the binding — used to mark a binding "used" at its
    /// defining scope rather than the reader's scope.
    pub fn lookup_with_scope(&self, scope: ScopeId, name: Symbol) -> Option<(ScopeId, &Binding)> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            if let Some(binding) = self.nodes[id].bindings.get(&name) {
                return Some((id, binding));
            }
            cursor = self.nodes[id].parent;
        }
        None
    }

    /// All scope ids in the tree, for a final sweep over every binding
    /// (e.g. the unused-binding check).
    pub fn iter_scopes(&self) -> impl Iterator<Item = ScopeId> {
        0..self.nodes.len()
    }

    /// The bindings defined directly in `scope`, not its ancestors.
    pub fn bindings(&self, scope: ScopeId) -> impl Iterator<Item = &Binding> {
        self.nodes[scope].bindings.values()
    }

    /// The nearest enclosing `server`/`browser`/`shared` kind, or `Module`
    /// if none encloses `scope`.
    pub fn get_context(&self, scope: ScopeId) -> ScopeKind {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let kind = self.nodes[id].kind;
            if kind.is_context_kind() {
                return kind;
            }
            cursor = self.nodes[id].parent;
        }
        ScopeKind::Module
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u32) -> Symbol {
        // Symbol has no public constructor outside tova_base; tests here
        // only need distinct, stable handles, which `Symbol::EMPTY`'s
        // `Default`/index-free API doesn't provide, so binding identity is
        // exercised through the interner-backed analyzer tests instead.
        let _ = n;
        Symbol::default()
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut tree = ScopeTree::new();
        let child = tree.push_child(ScopeTree::module_scope(), ScopeKind::Function);
        let name = sym(1);
        tree.define(ScopeTree::module_scope(), Binding { name, kind: BindingKind::Function, location: dummy_location() });
        assert!(tree.lookup(child, name).is_some());
        assert!(tree.lookup_local(child, name).is_none());
    }

    #[test]
    fn get_context_finds_nearest_server_browser_shared() {
        let mut tree = ScopeTree::new();
        let server = tree.push_child(ScopeTree::module_scope(), ScopeKind::Server);
        let func = tree.push_child(server, ScopeKind::Function);
        let block = tree.push_child(func, ScopeKind::Block);
        assert_eq!(tree.get_context(block), ScopeKind::Server);
        assert_eq!(tree.get_context(ScopeTree::module_scope()), ScopeKind::Module);
    }

    #[test]
    fn define_returns_previous_binding_on_duplicate() {
        let mut tree = ScopeTree::new();
        let name = sym(2);
        let first = Binding { name, kind: BindingKind::Let, location: dummy_location() };
        let second = Binding { name, kind: BindingKind::Var, location: dummy_location() };
        assert!(tree.define(ScopeTree::module_scope(), first).is_none());
        assert!(tree.define(ScopeTree::module_scope(), second).is_some());
    }

    fn dummy_location() -> Location {
        Location::new(1, 1, Symbol::EMPTY)
    }
}
