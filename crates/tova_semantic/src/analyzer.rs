//! The three-pass analyzer (spec §4.3): block-context pre-pass,
//! declaration pass, body pass.

use std::collections::{HashMap, HashSet};

use tova_ast::{
    BinaryOpKind, Block, CallArg, Comprehension, ComprehensionClause, Decl, Expr, ForStmt,
    FunctionDecl, ImplDecl, Param, Pattern, Program, Stmt, StmtBlock, TopLevelItem, TypeExpr,
};
use tova_base::{Diagnostic, DiagnosticBag, DiagnosticCode, Interner, Location, Symbol};

use crate::builtins::register_builtins;
use crate::gradual::{annotation_type, literal_type, GradualType};
use crate::scope::{Binding, BindingKind, ScopeId, ScopeKind, ScopeTree};
use crate::type_registry::TypeRegistry;

/// `{tolerant, strict}` as named by spec §4.3's analyzer entry point.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// In tolerant mode errors accumulate instead of aborting the pass.
    pub tolerant: bool,
    /// In strict mode gradual type violations are errors, not warnings.
    pub strict: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { tolerant: false, strict: false }
    }
}

/// `{errors, warnings, scope, typeRegistry}` per spec §4.3.
pub struct AnalysisResult<'a> {
    pub diagnostics: DiagnosticBag,
    pub scopes: ScopeTree,
    pub types: TypeRegistry<'a>,
}

/// Runs all three passes over `program`, returning the scope tree, type
/// registry, and every diagnostic collected. In non-tolerant mode the
/// result's diagnostics hold at most one error: the first raised, which
/// halts the remaining passes.
pub fn analyze<'a>(program: &'a Program<'a>, interner: &mut Interner, options: AnalysisOptions) -> AnalysisResult<'a> {
    let mut analyzer = Analyzer::new(interner, options);
    analyzer.run(program);
    analyzer.finish()
}

fn block_scope_kind(block: &Block<'_>) -> ScopeKind {
    match block {
        Block::Server(_) => ScopeKind::Server,
        Block::Browser(_) => ScopeKind::Browser,
        Block::Shared(_) => ScopeKind::Shared,
        Block::Test(_) => ScopeKind::Test,
        Block::Bench(_) => ScopeKind::Bench,
        Block::Cli(_) => ScopeKind::Cli,
        Block::Data(_) => ScopeKind::Data,
        Block::Security(_) => ScopeKind::Security,
        Block::Deploy(_) => ScopeKind::Deploy,
    }
}

/// `true` when `block`'s statements, taken as a function-like body, return
/// on every control-flow path. Conservative: loops and `guard` are never
/// treated as diverging on their own, so this only ever under-warns, never
/// over-warns, for `MissingReturnOnSomePath`.
fn block_always_diverges(block: &StmtBlock<'_>) -> bool {
    match block.statements.last() {
        None => false,
        Some(stmt) => stmt_always_diverges(stmt),
    }
}

fn stmt_always_diverges(stmt: &Stmt<'_>) -> bool {
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::If { then_branch, else_branch, .. } => else_branch
            .as_ref()
            .is_some_and(|eb| block_always_diverges(then_branch) && block_always_diverges(eb)),
        Stmt::Match { arms, .. } => !arms.is_empty() && arms.iter().all(|arm| block_always_diverges(&arm.body)),
        Stmt::TryCatch { try_block, catch_block, finally_block, .. } => {
            let finally_diverges = finally_block.as_ref().is_some_and(block_always_diverges);
            finally_diverges || (block_always_diverges(try_block) && block_always_diverges(catch_block))
        }
        Stmt::Block { block, .. } => block_always_diverges(block),
        _ => false,
    }
}

struct Analyzer<'a, 'i> {
    interner: &'i mut Interner,
    options: AnalysisOptions,
    diagnostics: DiagnosticBag,
    scopes: ScopeTree,
    types: TypeRegistry<'a>,
    /// Flat name -> declaration map used only for arity/param/return-type
    /// checks; duplicate names are already flagged by scope-level binding.
    functions: HashMap<Symbol, &'a FunctionDecl<'a>>,
    /// Registered `server` peers, by name, to the set of function names
    /// they expose for `peer.fn(...)` RPC resolution.
    peers: HashMap<Symbol, HashSet<Symbol>>,
    impls: Vec<&'a ImplDecl<'a>>,
    label_stack: Vec<Symbol>,
    return_type_stack: Vec<Option<TypeExpr<'a>>>,
    current_server: Option<Symbol>,
    used: HashSet<(ScopeId, Symbol)>,
    self_symbol: Symbol,
}

impl<'a, 'i> Analyzer<'a, 'i> {
    fn new(interner: &'i mut Interner, options: AnalysisOptions) -> Self {
        let self_symbol = interner.intern("self");
        Self {
            interner,
            options,
            diagnostics: DiagnosticBag::new(),
            scopes: ScopeTree::new(),
            types: TypeRegistry::new(),
            functions: HashMap::new(),
            peers: HashMap::new(),
            impls: Vec::new(),
            label_stack: Vec::new(),
            return_type_stack: Vec::new(),
            current_server: None,
            used: HashSet::new(),
            self_symbol,
        }
    }

    fn finish(self) -> AnalysisResult<'a> {
        AnalysisResult { diagnostics: self.diagnostics, scopes: self.scopes, types: self.types }
    }

    fn aborted(&self) -> bool {
        !self.options.tolerant && self.diagnostics.has_errors()
    }

    fn error(&mut self, code: DiagnosticCode, message: String, location: Location) {
        self.diagnostics.push_error(Diagnostic::error(code, message, location));
    }

    fn warning(&mut self, code: DiagnosticCode, message: String, location: Location) {
        self.diagnostics.push_warning(Diagnostic::warning(code, message, location));
    }

    /// Gradual-type violations: an error in strict mode, a warning (same
    /// code) otherwise.
    fn type_check_violation(&mut self, code: DiagnosticCode, message: String, location: Location) {
        if self.options.strict {
            self.error(code, message, location);
        } else {
            self.warning(code, message, location);
        }
    }

    fn run(&mut self, program: &'a Program<'a>) {
        register_builtins(&mut self.scopes, self.interner, ScopeTree::module_scope(), program.file);

        self.pre_pass(program);
        if self.aborted() {
            return;
        }

        let block_scopes = self.declaration_pass(program);
        if self.aborted() {
            return;
        }
        self.check_trait_conformance();
        if self.aborted() {
            return;
        }

        self.body_pass(program, &block_scopes);
        if self.aborted() {
            return;
        }
        self.check_unused_bindings();
    }

    // ---- pass 1: block-context pre-pass ----

    fn pre_pass(&mut self, program: &'a Program<'a>) {
        for item in program.items {
            if let TopLevelItem::Block(Block::Server(server)) = item {
                if let Some(name) = server.name {
                    self.peers.entry(name).or_default();
                    let binding = Binding { name, kind: BindingKind::Peer, location: server.location };
                    if self.scopes.define(ScopeTree::module_scope(), binding).is_some() {
                        self.error(
                            DiagnosticCode::DuplicateDefinition,
                            format!("duplicate peer server block '{}'", self.interner.resolve(name)),
                            server.location,
                        );
                    }
                }
            }
            if self.aborted() {
                return;
            }
        }
    }

    // ---- pass 2: declaration pass ----

    fn declaration_pass(&mut self, program: &'a Program<'a>) -> Vec<(ScopeId, &'a Block<'a>)> {
        let mut block_scopes = Vec::new();
        for item in program.items {
            match item {
                TopLevelItem::Decl(decl) => self.hoist_decl(decl, ScopeTree::module_scope(), None),
                TopLevelItem::Block(block) => {
                    let kind = block_scope_kind(block);
                    let scope = self.scopes.push_child(ScopeTree::module_scope(), kind);
                    let server_name = match block {
                        Block::Server(s) => s.name,
                        _ => None,
                    };
                    for stmt in block.body().items {
                        if let Stmt::Decl { decl, .. } = stmt {
                            self.hoist_decl(decl, scope, server_name);
                        }
                    }
                    block_scopes.push((scope, block));
                }
            }
            if self.aborted() {
                break;
            }
        }
        block_scopes
    }

    fn hoist_decl(&mut self, decl: &'a Decl<'a>, scope: ScopeId, server_name: Option<Symbol>) {
        self.check_context_restriction(decl, scope);

        let (name, kind) = match decl {
            Decl::Function(f) => {
                self.functions.insert(f.name, f);
                if let Some(server) = server_name {
                    self.peers.entry(server).or_default().insert(f.name);
                }
                (Some(f.name), BindingKind::Function)
            }
            Decl::Type(t) => {
                self.types.register_type(t);
                for variant in t.variants {
                    self.define_checked(scope, variant.name, BindingKind::Type, variant.location);
                }
                (Some(t.name), BindingKind::Type)
            }
            Decl::Trait(t) | Decl::Interface(t) => {
                self.types.register_trait(t.name, t.methods);
                (Some(t.name), BindingKind::Trait)
            }
            Decl::Impl(i) => {
                for method in i.methods {
                    self.types.register_method(i.type_name, i.trait_name, method, self.self_symbol);
                }
                self.impls.push(i);
                (None, BindingKind::Function)
            }
            Decl::Import(i) => {
                for name in i.names {
                    self.define_checked(scope, *name, BindingKind::Import, i.location);
                }
                (None, BindingKind::Import)
            }
            Decl::State(s) => (Some(s.name), BindingKind::Var),
            Decl::Computed(c) => (Some(c.name), BindingKind::Let),
            Decl::Effect(_) => (None, BindingKind::Let),
            Decl::Component(c) => (Some(c.name), BindingKind::Function),
            Decl::Store(s) => (Some(s.name), BindingKind::Let),
            Decl::Style(_) => (None, BindingKind::Let),
            Decl::Route(_) => (None, BindingKind::Function),
            Decl::Middleware(m) => (Some(m.name), BindingKind::Function),
            Decl::Websocket(_) | Decl::Sse(_) => (None, BindingKind::Function),
            Decl::Db(d) => (Some(d.name), BindingKind::Let),
            Decl::Ai(a) => (Some(a.name), BindingKind::Let),
        };

        if let Some(name) = name {
            self.define_checked(scope, name, kind, decl.location());
        }
    }

    fn define_checked(&mut self, scope: ScopeId, name: Symbol, kind: BindingKind, location: Location) {
        let binding = Binding { name, kind, location };
        if self.scopes.define(scope, binding).is_some() {
            self.error(
                DiagnosticCode::DuplicateDefinition,
                format!("'{}' is already defined in this scope", self.interner.resolve(name)),
                location,
            );
        }
    }

    fn check_context_restriction(&mut self, decl: &Decl<'_>, scope: ScopeId) {
        let context = self.scopes.get_context(scope);
        if decl.is_browser_only() && context != ScopeKind::Browser {
            self.error(
                DiagnosticCode::BlockKindViolation,
                "this declaration is only legal inside a 'browser' block".to_string(),
                decl.location(),
            );
        }
        if decl.is_server_only() && context != ScopeKind::Server {
            self.error(
                DiagnosticCode::BlockKindViolation,
                "this declaration is only legal inside a 'server' block".to_string(),
                decl.location(),
            );
        }
    }

    fn check_trait_conformance(&mut self) {
        let impls = std::mem::take(&mut self.impls);
        for imp in &impls {
            let Some(trait_name) = imp.trait_name else { continue };
            let Some(trait_info) = self.types.get_trait(trait_name) else {
                self.error(
                    DiagnosticCode::UndefinedIdentifier,
                    format!("undefined trait '{}'", self.interner.resolve(trait_name)),
                    imp.location,
                );
                continue;
            };
            let required: Vec<(Symbol, usize)> =
                trait_info.methods.iter().map(|m| (m.name, m.params.len())).collect();
            for (method_name, required_arity) in required {
                match imp.methods.iter().find(|m| m.name == method_name) {
                    None => self.type_check_violation(
                        DiagnosticCode::TraitConformanceMissing,
                        format!(
                            "'{}' does not implement required method '{}' of trait '{}'",
                            self.interner.resolve(imp.type_name),
                            self.interner.resolve(method_name),
                            self.interner.resolve(trait_name)
                        ),
                        imp.location,
                    ),
                    Some(method) if method.params.len() != required_arity => self.type_check_violation(
                        DiagnosticCode::ArityMismatch,
                        format!(
                            "'{}::{}' has {} parameter(s), trait '{}' requires {}",
                            self.interner.resolve(imp.type_name),
                            self.interner.resolve(method_name),
                            method.params.len(),
                            self.interner.resolve(trait_name),
                            required_arity
                        ),
                        method.location,
                    ),
                    Some(_) => {}
                }
                if self.aborted() {
                    self.impls = impls;
                    return;
                }
            }
        }
        self.impls = impls;
    }

    // ---- pass 3: body pass ----

    fn body_pass(&mut self, program: &'a Program<'a>, block_scopes: &[(ScopeId, &'a Block<'a>)]) {
        for item in program.items {
            if let TopLevelItem::Decl(decl) = item {
                self.walk_decl_body(decl, ScopeTree::module_scope());
                if self.aborted() {
                    return;
                }
            }
        }
        for (scope, block) in block_scopes {
            self.current_server = match block {
                Block::Server(s) => s.name,
                _ => None,
            };
            self.walk_stmts(block.body().items, *scope, true);
            self.current_server = None;
            if self.aborted() {
                return;
            }
        }
    }

    fn walk_decl_body(&mut self, decl: &'a Decl<'a>, scope: ScopeId) {
        match decl {
            Decl::Function(f) => self.walk_function(f, scope),
            Decl::Impl(i) => {
                for m in i.methods {
                    self.walk_function(m, scope);
                }
            }
            Decl::State(s) => self.walk_expr(s.initial, scope),
            Decl::Computed(c) => self.walk_expr(c.body, scope),
            Decl::Effect(e) => self.walk_nested_block(&e.body, scope),
            Decl::Component(c) => {
                let child = self.scopes.push_child(scope, ScopeKind::Function);
                self.define_params(c.props, child);
                self.walk_stmts(c.body.statements, child, false);
            }
            Decl::Store(s) => self.walk_nested_block(&s.body, scope),
            Decl::Style(_) => {}
            Decl::Route(r) => self.walk_expr(r.handler, scope),
            Decl::Middleware(m) => self.walk_nested_block(&m.body, scope),
            Decl::Websocket(w) => self.walk_nested_block(&w.body, scope),
            Decl::Sse(s) => self.walk_nested_block(&s.body, scope),
            Decl::Db(d) => {
                for (_, expr) in d.config {
                    self.walk_expr(expr, scope);
                }
            }
            Decl::Ai(a) => {
                for (_, expr) in a.config {
                    self.walk_expr(expr, scope);
                }
            }
            Decl::Type(_) | Decl::Trait(_) | Decl::Interface(_) | Decl::Import(_) => {}
        }
    }

    fn walk_nested_block(&mut self, block: &'a StmtBlock<'a>, scope: ScopeId) {
        let child = self.scopes.push_child(scope, ScopeKind::Function);
        self.walk_stmts(block.statements, child, false);
    }

    fn walk_function(&mut self, f: &'a FunctionDecl<'a>, parent_scope: ScopeId) {
        let child = self.scopes.push_child(parent_scope, ScopeKind::Function);
        self.define_params(f.params, child);
        self.return_type_stack.push(f.return_type.clone());
        self.walk_stmts(f.body.statements, child, false);
        if let Some(return_type) = &f.return_type {
            let is_open = matches!(return_type, TypeExpr::Optional { .. } | TypeExpr::Wildcard { .. });
            if !is_open && !block_always_diverges(&f.body) {
                self.warning(
                    DiagnosticCode::MissingReturnOnSomePath,
                    format!("function '{}' does not return on every path", self.interner.resolve(f.name)),
                    f.location,
                );
            }
        }
        self.return_type_stack.pop();
    }

    fn define_params(&mut self, params: &'a [Param<'a>], scope: ScopeId) {
        for param in params {
            self.define_checked(scope, param.name, BindingKind::Param, param.location);
            if let Some(default) = param.default {
                self.walk_expr(default, scope);
            }
        }
    }

    fn walk_stmts(&mut self, stmts: &'a [Stmt<'a>], scope: ScopeId, pre_hoisted: bool) {
        for stmt in stmts {
            self.walk_stmt(stmt, scope, pre_hoisted);
            if self.aborted() {
                return;
            }
        }
    }

    fn walk_stmt(&mut self, stmt: &'a Stmt<'a>, scope: ScopeId, pre_hoisted: bool) {
        match stmt {
            Stmt::Decl { decl, .. } => {
                if !pre_hoisted {
                    self.hoist_decl(decl, scope, self.current_server);
                }
                self.walk_decl_body(decl, scope);
            }
            Stmt::Let { mutable, name, value, location, .. } => {
                if let Some(v) = *value {
                    self.walk_expr(v, scope);
                }
                let kind = if *mutable { BindingKind::Var } else { BindingKind::Let };
                self.define_checked(scope, *name, kind, *location);
            }
            Stmt::LetDestructure { pattern, value, location, .. } => {
                self.walk_expr(*value, scope);
                self.define_pattern_bindings(pattern, scope, BindingKind::Destructured, *location);
            }
            Stmt::Assign { target, value, location } => {
                self.walk_expr(*value, scope);
                self.check_assignable(*target, scope, *location);
                self.walk_expr(*target, scope);
            }
            Stmt::CompoundAssign { target, value, location, .. } => {
                self.walk_expr(*value, scope);
                self.check_assignable(*target, scope, *location);
                self.check_compound_assign_requires_var(*target, scope, *location);
                self.walk_expr(*target, scope);
            }
            Stmt::Expr { expr, .. } => self.walk_expr(*expr, scope),
            Stmt::Block { block, .. } => {
                let child = self.scopes.push_child(scope, ScopeKind::Block);
                self.walk_stmts(block.statements, child, false);
            }
            Stmt::Return { value, .. } => self.walk_return(*value, scope, stmt.location()),
            Stmt::If { condition, then_branch, else_branch, .. } => {
                self.walk_expr(*condition, scope);
                let then_scope = self.scopes.push_child(scope, ScopeKind::Block);
                self.walk_stmts(then_branch.statements, then_scope, false);
                if let Some(eb) = else_branch {
                    let else_scope = self.scopes.push_child(scope, ScopeKind::Block);
                    self.walk_stmts(eb.statements, else_scope, false);
                }
            }
            Stmt::For { stmt: for_stmt, .. } => self.walk_for(for_stmt, scope),
            Stmt::While { label, condition, body, .. } => {
                self.walk_expr(*condition, scope);
                self.walk_labeled_loop_body(*label, body, scope);
            }
            Stmt::Loop { label, body, .. } => self.walk_labeled_loop_body(*label, body, scope),
            Stmt::Match { subject, arms, .. } => {
                self.walk_expr(*subject, scope);
                for arm in *arms {
                    let arm_scope = self.scopes.push_child(scope, ScopeKind::Block);
                    self.define_pattern_bindings(&arm.pattern, arm_scope, BindingKind::Destructured, arm.location);
                    if let Some(g) = arm.guard {
                        self.walk_expr(g, arm_scope);
                    }
                    self.walk_stmts(arm.body.statements, arm_scope, false);
                }
            }
            Stmt::Break { label, location } => self.check_label(*label, *location),
            Stmt::Continue { label, location } => self.check_label(*label, *location),
            Stmt::Guard { condition, else_branch, .. } => {
                self.walk_expr(*condition, scope);
                let else_scope = self.scopes.push_child(scope, ScopeKind::Block);
                self.walk_stmts(else_branch.statements, else_scope, false);
            }
            Stmt::With { resource, binding, body, location } => {
                self.walk_expr(*resource, scope);
                let child = self.scopes.push_child(scope, ScopeKind::Block);
                self.define_checked(child, *binding, BindingKind::Let, *location);
                self.walk_stmts(body.statements, child, false);
            }
            Stmt::Defer { body, .. } => self.walk_nested_block_as_block(body, scope),
            Stmt::TryCatch { try_block, catch_binding, catch_block, finally_block, location } => {
                self.walk_nested_block_as_block(try_block, scope);
                let catch_scope = self.scopes.push_child(scope, ScopeKind::Block);
                if let Some(binding) = catch_binding {
                    self.define_checked(catch_scope, *binding, BindingKind::Let, *location);
                }
                self.walk_stmts(catch_block.statements, catch_scope, false);
                if let Some(f) = finally_block {
                    self.walk_nested_block_as_block(f, scope);
                }
            }
        }
    }

    fn walk_nested_block_as_block(&mut self, block: &'a StmtBlock<'a>, scope: ScopeId) {
        let child = self.scopes.push_child(scope, ScopeKind::Block);
        self.walk_stmts(block.statements, child, false);
    }

    fn walk_for(&mut self, stmt: &'a ForStmt<'a>, scope: ScopeId) {
        self.walk_expr(stmt.iterable, scope);
        let body_scope = self.scopes.push_child(scope, ScopeKind::Block);
        self.define_pattern_bindings(&stmt.pattern, body_scope, BindingKind::Let, stmt.body.location);
        if let Some(guard) = stmt.guard {
            self.walk_expr(guard, body_scope);
        }
        if let Some(label) = stmt.label {
            self.label_stack.push(label);
        }
        self.walk_stmts(stmt.body.statements, body_scope, false);
        if stmt.label.is_some() {
            self.label_stack.pop();
        }
        if let Some(else_branch) = &stmt.else_branch {
            let else_scope = self.scopes.push_child(scope, ScopeKind::Block);
            self.walk_stmts(else_branch.statements, else_scope, false);
        }
    }

    fn walk_labeled_loop_body(&mut self, label: Option<Symbol>, body: &'a StmtBlock<'a>, scope: ScopeId) {
        let child = self.scopes.push_child(scope, ScopeKind::Block);
        if let Some(label) = label {
            self.label_stack.push(label);
        }
        self.walk_stmts(body.statements, child, false);
        if label.is_some() {
            self.label_stack.pop();
        }
    }

    fn check_label(&mut self, label: Option<Symbol>, location: Location) {
        if let Some(label) = label {
            if !self.label_stack.contains(&label) {
                self.error(
                    DiagnosticCode::UndefinedLabel,
                    format!("label '{}' does not name an enclosing loop", self.interner.resolve(label)),
                    location,
                );
            }
        }
    }

    fn walk_return(&mut self, value: Option<&'a Expr<'a>>, scope: ScopeId, location: Location) {
        if let Some(v) = value {
            self.walk_expr(v, scope);
        }
        let Some(Some(expected_annotation)) = self.return_type_stack.last() else { return };
        let Some(v) = value else { return };
        let expected = annotation_type(expected_annotation, self.interner);
        let actual = self.literal_expr_type(v);
        if expected == GradualType::Unknown || actual == GradualType::Unknown {
            return;
        }
        if actual.narrows_to(expected) {
            self.type_check_violation(
                DiagnosticCode::NarrowingWithoutCast,
                "implicit Float -> Int narrowing; use 'as Int'".to_string(),
                location,
            );
        } else if !actual.compatible_with(expected) {
            self.type_check_violation(
                DiagnosticCode::ReturnTypeMismatch,
                "return value does not match the declared return type".to_string(),
                location,
            );
        }
    }

    fn check_assignable(&mut self, target: &Expr<'_>, scope: ScopeId, location: Location) {
        if let Expr::Identifier { name, .. } = target {
            if let Some(binding) = self.scopes.lookup(scope, *name) {
                if !binding.kind.is_mutable_kind() {
                    self.error(
                        DiagnosticCode::ImmutableReassignment,
                        format!("cannot assign to immutable binding '{}'", self.interner.resolve(*name)),
                        location,
                    );
                }
            }
        }
    }

    fn check_compound_assign_requires_var(&mut self, target: &Expr<'_>, scope: ScopeId, location: Location) {
        if let Expr::Identifier { name, .. } = target {
            if let Some(binding) = self.scopes.lookup(scope, *name) {
                if binding.kind != BindingKind::Var {
                    self.error(
                        DiagnosticCode::ImmutableReassignment,
                        format!("compound assignment to '{}' requires 'var'", self.interner.resolve(*name)),
                        location,
                    );
                }
            }
        }
    }

    fn define_pattern_bindings(&mut self, pattern: &Pattern<'_>, scope: ScopeId, kind: BindingKind, fallback_location: Location) {
        let _ = fallback_location;
        match pattern {
            Pattern::Wildcard { .. } | Pattern::Literal { .. } => {}
            Pattern::StringConcat { rest, location, .. } => self.define_checked(scope, *rest, kind, *location),
            Pattern::Variant { fields, .. } => {
                for field in *fields {
                    self.define_pattern_bindings(field, scope, kind, pattern.location());
                }
            }
            Pattern::Binding { name, location } => self.define_checked(scope, *name, kind, *location),
            Pattern::Range { low, high, .. } => {
                self.define_pattern_bindings(*low, scope, kind, pattern.location());
                self.define_pattern_bindings(*high, scope, kind, pattern.location());
            }
            Pattern::Object { fields, .. } => {
                for field in *fields {
                    match field.pattern {
                        Some(inner) => self.define_pattern_bindings(inner, scope, kind, field.location),
                        None => self.define_checked(scope, field.name, kind, field.location),
                    }
                }
            }
            Pattern::Array { elements, rest, location } => {
                for element in *elements {
                    self.define_pattern_bindings(element, scope, kind, *location);
                }
                if let Some(rest) = rest {
                    self.define_checked(scope, *rest, kind, *location);
                }
            }
            Pattern::Tuple { elements, location } => {
                for element in *elements {
                    self.define_pattern_bindings(element, scope, kind, *location);
                }
            }
        }
    }

    fn walk_comprehension(&mut self, comp: &'a Comprehension<'a>, scope: ScopeId) {
        let mut current = scope;
        for clause in comp.clauses {
            match clause {
                ComprehensionClause::For { pattern, iterable } => {
                    self.walk_expr(*iterable, current);
                    let child = self.scopes.push_child(current, ScopeKind::Block);
                    self.define_pattern_bindings(pattern, child, BindingKind::Let, comp.location);
                    current = child;
                }
                ComprehensionClause::If { condition } => self.walk_expr(*condition, current),
            }
        }
        self.walk_expr(comp.element, current);
        if let Some(value) = comp.value {
            self.walk_expr(value, current);
        }
    }

    fn walk_expr(&mut self, expr: &'a Expr<'a>, scope: ScopeId) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Identifier { name, location } => self.resolve_identifier(*name, scope, *location),
            Expr::Binary { op, left, right, location } => {
                self.walk_expr(*left, scope);
                self.walk_expr(*right, scope);
                self.check_binary_operand_types(*op, *left, *right, *location);
            }
            Expr::Unary { operand, .. } => self.walk_expr(*operand, scope),
            Expr::ChainedComparison { operands, .. } => {
                for operand in *operands {
                    self.walk_expr(operand, scope);
                }
            }
            Expr::Call { callee, args, location } => self.walk_call(*callee, *args, scope, *location),
            Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => self.walk_expr(*object, scope),
            Expr::Index { object, index, .. } => {
                self.walk_expr(*object, scope);
                self.walk_expr(*index, scope);
            }
            Expr::Slice { object, low, high, step, .. } => {
                self.walk_expr(*object, scope);
                for e in [*low, *high, *step].into_iter().flatten() {
                    self.walk_expr(e, scope);
                }
            }
            Expr::Pipe { left, target, .. } => {
                self.walk_expr(*left, scope);
                self.walk_expr(*target, scope);
            }
            Expr::Lambda { params, body, .. } => {
                let child = self.scopes.push_child(scope, ScopeKind::Function);
                self.define_params(*params, child);
                self.walk_expr(*body, child);
            }
            Expr::Match { subject, arms, .. } => {
                self.walk_expr(*subject, scope);
                for arm in *arms {
                    let arm_scope = self.scopes.push_child(scope, ScopeKind::Block);
                    self.define_pattern_bindings(&arm.pattern, arm_scope, BindingKind::Destructured, arm.location);
                    if let Some(guard) = arm.guard {
                        self.walk_expr(guard, arm_scope);
                    }
                    self.walk_expr(arm.body, arm_scope);
                }
            }
            Expr::Spread { inner, .. } | Expr::Propagate { inner, .. } | Expr::Await { inner, .. } => {
                self.walk_expr(*inner, scope)
            }
            Expr::Yield { inner, .. } => {
                if let Some(inner) = *inner {
                    self.walk_expr(inner, scope);
                }
            }
            Expr::If { condition, then_branch, else_branch, .. } => {
                self.walk_expr(*condition, scope);
                self.walk_expr(*then_branch, scope);
                if let Some(e) = *else_branch {
                    self.walk_expr(e, scope);
                }
            }
            Expr::Is { subject, pattern, location } => {
                self.walk_expr(*subject, scope);
                self.define_pattern_bindings(pattern, scope, BindingKind::Destructured, *location);
            }
            Expr::Membership { value, iterable, .. } => {
                self.walk_expr(*value, scope);
                self.walk_expr(*iterable, scope);
            }
            Expr::CompoundAssign { target, value, location, .. } => {
                self.walk_expr(*value, scope);
                self.check_assignable(*target, scope, *location);
                self.check_compound_assign_requires_var(*target, scope, *location);
                self.walk_expr(*target, scope);
            }
            Expr::ListComprehension { comprehension, .. } | Expr::DictComprehension { comprehension, .. } => {
                self.walk_comprehension(comprehension, scope);
            }
            Expr::Range { low, high, .. } => {
                self.walk_expr(*low, scope);
                self.walk_expr(*high, scope);
            }
            Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => {
                for e in *elements {
                    self.walk_expr(e, scope);
                }
            }
            Expr::Dict { entries, .. } => {
                for (k, v) in *entries {
                    self.walk_expr(k, scope);
                    self.walk_expr(v, scope);
                }
            }
            Expr::Column { .. } => {}
            Expr::Jsx { node, .. } => self.walk_jsx(*node, scope),
            Expr::As { inner, .. } => self.walk_expr(*inner, scope),
        }
    }

    fn walk_jsx(&mut self, node: &'a tova_ast::JsxNode<'a>, scope: ScopeId) {
        use tova_ast::{JsxAttribute, JsxAttributeValue, JsxChild, JsxNode};
        let attributes: Option<&'a [JsxAttribute<'a>]> = match node {
            JsxNode::Element { attributes, .. } => Some(*attributes),
            JsxNode::Fragment { .. } => None,
        };
        if let Some(attributes) = attributes {
            for attr in attributes {
                match attr {
                    JsxAttribute::Plain { value: JsxAttributeValue::Expr(e), .. } => self.walk_expr(*e, scope),
                    JsxAttribute::Event { handler, .. } => self.walk_expr(*handler, scope),
                    JsxAttribute::ClassDirective { condition, .. } => self.walk_expr(*condition, scope),
                    JsxAttribute::BindDirective { target, .. } => self.walk_expr(*target, scope),
                    JsxAttribute::TransitionDirective { config: Some(c), .. } => self.walk_expr(*c, scope),
                    JsxAttribute::Spread { value, .. } => self.walk_expr(*value, scope),
                    _ => {}
                }
            }
        }
        let children: Option<&'a [JsxChild<'a>]> = match node {
            JsxNode::Element { children, .. } => *children,
            JsxNode::Fragment { children, .. } => Some(*children),
        };
        let Some(children) = children else { return };
        for child in children {
            self.walk_jsx_child(child, scope);
        }
    }

    fn walk_jsx_child(&mut self, child: &'a tova_ast::JsxChild<'a>, scope: ScopeId) {
        use tova_ast::JsxChild;
        match child {
            JsxChild::Text { .. } => {}
            JsxChild::Expr { value, .. } => self.walk_expr(*value, scope),
            JsxChild::Element { node, .. } => self.walk_jsx(*node, scope),
            JsxChild::For { pattern, iterable, key, body, .. } => {
                self.walk_expr(*iterable, scope);
                let child_scope = self.scopes.push_child(scope, ScopeKind::Block);
                self.define_pattern_bindings(pattern, child_scope, BindingKind::Let, iterable.location());
                if let Some(key) = *key {
                    self.walk_expr(key, child_scope);
                }
                for c in *body {
                    self.walk_jsx_child(c, child_scope);
                }
            }
            JsxChild::If { condition, then_branch, else_branch, .. } => {
                self.walk_expr(*condition, scope);
                for c in *then_branch {
                    self.walk_jsx_child(c, scope);
                }
                if let Some(else_branch) = else_branch {
                    for c in *else_branch {
                        self.walk_jsx_child(c, scope);
                    }
                }
            }
        }
    }

    fn resolve_identifier(&mut self, name: Symbol, scope: ScopeId, location: Location) {
        match self.scopes.lookup_with_scope(scope, name) {
            Some((owner_scope, _binding)) => {
                self.used.insert((owner_scope, name));
            }
            None => {
                self.error(
                    DiagnosticCode::UndefinedIdentifier,
                    format!("undefined identifier '{}'", self.interner.resolve(name)),
                    location,
                );
            }
        }
    }

    fn walk_call(&mut self, callee: &'a Expr<'a>, args: &'a [CallArg<'a>], scope: ScopeId, location: Location) {
        if let Expr::Member { object, property, .. } = callee {
            if let Expr::Identifier { name, .. } = object {
                if matches!(self.scopes.lookup(scope, *name), Some(b) if b.kind == BindingKind::Peer) {
                    self.check_peer_call(*name, *property, location);
                    for arg in args {
                        self.walk_expr(arg.value, scope);
                    }
                    return;
                }
            }
        }
        self.walk_expr(callee, scope);
        for arg in args {
            self.walk_expr(arg.value, scope);
        }
        self.check_call_arity(callee, args, location);
    }

    fn check_peer_call(&mut self, peer_name: Symbol, fn_name: Symbol, location: Location) {
        if Some(peer_name) == self.current_server {
            self.warning(
                DiagnosticCode::SelfReferencingServerCall,
                format!("server '{}' calling itself", self.interner.resolve(peer_name)),
                location,
            );
            return;
        }
        match self.peers.get(&peer_name) {
            Some(functions) if functions.contains(&fn_name) => {}
            Some(_) => {
                self.error(
                    DiagnosticCode::UnknownPeerFunction,
                    format!(
                        "peer server '{}' has no function '{}'",
                        self.interner.resolve(peer_name),
                        self.interner.resolve(fn_name)
                    ),
                    location,
                );
            }
            None => {
                self.error(
                    DiagnosticCode::UndefinedIdentifier,
                    format!("'{}' is not a registered peer server", self.interner.resolve(peer_name)),
                    location,
                );
            }
        }
    }

    fn check_call_arity(&mut self, callee: &'a Expr<'a>, args: &'a [CallArg<'a>], location: Location) {
        let Expr::Identifier { name, .. } = callee else { return };
        if self.interner.resolve(*name) == "throw" {
            self.warning(
                DiagnosticCode::ThrowInPlaceOfErr,
                "use 'Err(...)' instead of a bare 'throw' call".to_string(),
                location,
            );
        }
        let Some(function) = self.functions.get(name).copied() else { return };
        let declared = function.params.len();
        let given = args.len();
        if declared != given {
            self.type_check_violation(
                DiagnosticCode::ArityMismatch,
                format!(
                    "'{}' expects {} argument(s), found {}",
                    self.interner.resolve(*name),
                    declared,
                    given
                ),
                location,
            );
            return;
        }
        for (param, arg) in function.params.iter().zip(args.iter()) {
            self.check_arg_type(param, arg, location);
        }
    }

    fn check_arg_type(&mut self, param: &Param<'_>, arg: &CallArg<'_>, location: Location) {
        let Some(annotation) = &param.type_annotation else { return };
        let expected = annotation_type(annotation, self.interner);
        let actual = self.literal_expr_type(arg.value);
        if expected == GradualType::Unknown || actual == GradualType::Unknown {
            return;
        }
        if actual.narrows_to(expected) {
            self.type_check_violation(
                DiagnosticCode::NarrowingWithoutCast,
                format!("implicit narrowing passed to parameter '{}'", self.interner.resolve(param.name)),
                location,
            );
        } else if !actual.compatible_with(expected) {
            self.type_check_violation(
                DiagnosticCode::OperandKindMismatch,
                format!("argument type does not match parameter '{}'", self.interner.resolve(param.name)),
                location,
            );
        }
    }

    fn check_binary_operand_types(&mut self, op: BinaryOpKind, left: &Expr<'_>, right: &Expr<'_>, location: Location) {
        let lt = self.literal_expr_type(left);
        let rt = self.literal_expr_type(right);
        if lt == GradualType::Unknown || rt == GradualType::Unknown {
            return;
        }
        let ok = match op {
            BinaryOpKind::Add => lt.is_numeric_or_string() && rt.is_numeric_or_string(),
            BinaryOpKind::Sub | BinaryOpKind::Mul | BinaryOpKind::Div | BinaryOpKind::Mod | BinaryOpKind::Pow => {
                lt.is_numeric() && rt.is_numeric()
            }
            _ => true,
        };
        if ok {
            return;
        }
        let message = "operand types are incompatible with this operator".to_string();
        if self.options.strict {
            self.error(DiagnosticCode::OperandKindMismatch, message, location);
        } else {
            self.warning(DiagnosticCode::BinaryOperatorTypeMismatch, message, location);
        }
    }

    fn literal_expr_type(&self, expr: &Expr<'_>) -> GradualType {
        match expr {
            Expr::Literal { value, .. } => literal_type(value, self.interner),
            Expr::As { type_annotation, .. } => annotation_type(type_annotation, self.interner),
            _ => GradualType::Unknown,
        }
    }

    fn check_unused_bindings(&mut self) {
        let mut unused = Vec::new();
        for scope in self.scopes.iter_scopes() {
            for binding in self.scopes.bindings(scope) {
                let checked = matches!(
                    binding.kind,
                    BindingKind::Let | BindingKind::Var | BindingKind::Param | BindingKind::Destructured
                );
                if checked && !self.used.contains(&(scope, binding.name)) {
                    unused.push((binding.name, binding.location));
                }
            }
        }
        for (name, location) in unused {
            self.warning(
                DiagnosticCode::UnusedBinding,
                format!("'{}' is never read", self.interner.resolve(name)),
                location,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses `source` and runs the analyzer over it, leaking the arenas
    /// (fine for a test process) so the returned `AnalysisResult` can
    /// outlive the function body.
    fn analyze_source(source: &str, options: AnalysisOptions) -> (DiagnosticBag, Interner) {
        let arenas: &'static tova_ast::Arenas<'static> = Box::leak(Box::new(tova_ast::Arenas::new()));
        let mut interner = Interner::new();
        let file = interner.intern("test.tova");
        let registry = tova_registry::BlockRegistry::standard();
        let tokens = tova_lexer::tokenize(source, &mut interner).expect("lexing should succeed");
        let outcome = tova_parser::parse_program(&tokens, file, arenas, &mut interner, &registry, true).expect("tolerant parse never hard-fails");
        let program: &'static Program<'static> = Box::leak(Box::new(outcome.program));
        let result = analyze(program, &mut interner, options);
        (result.diagnostics, interner)
    }

    fn tolerant_options() -> AnalysisOptions {
        AnalysisOptions { tolerant: true, strict: false }
    }

    #[test]
    fn undeclared_identifier_is_an_error() {
        let (diagnostics, _) = analyze_source("pub fn f() {\n  return undeclared\n}\n", tolerant_options());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn declared_parameter_resolves_cleanly() {
        let (diagnostics, _) = analyze_source("pub fn f(x) {\n  return x\n}\n", tolerant_options());
        assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.errors.len());
    }

    #[test]
    fn duplicate_top_level_binding_is_an_error() {
        let source = "pub fn f() {\n  return 1\n}\npub fn f() {\n  return 2\n}\n";
        let (diagnostics, _) = analyze_source(source, tolerant_options());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn reassigning_a_let_binding_is_immutable_reassignment() {
        let source = "pub fn f() {\n  let x = 1\n  x = 2\n  return x\n}\n";
        let (diagnostics, _) = analyze_source(source, tolerant_options());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn reassigning_a_var_binding_is_allowed() {
        let source = "pub fn f() {\n  var x = 1\n  x = 2\n  return x\n}\n";
        let (diagnostics, _) = analyze_source(source, tolerant_options());
        assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.errors.len());
    }
}
