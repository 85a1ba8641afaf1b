//! Browser-target emission: `state`/`computed`/`effect`/`store` reactive
//! bindings and `component` scaffolding.
//!
//! A `state name = init` pair lowers to a signal pair, `const [name, setName]
//! = createSignal(init)`, so every other module (`jsx`, this one) can assume
//! that naming convention when it needs to call a state variable's setter.
//! `computed`/`effect` wrap their body in a thunk passed to `createComputed`/
//! `createEffect`; both are assumed external reactivity-runtime globals, the
//! same "runtime collaborator" treatment `server` gives the router.
//!
//! `component Name(props) { body }` becomes a plain function taking a single
//! `__props` object; each declared prop gets a getter (`const p = () =>
//! __props.p;`) so a prop read inside JSX composes with the same
//! `SignalScope` machinery as `state`. `App`, if declared, is auto-mounted
//! on `DOMContentLoaded`.
//!
//! A `style { ... }` block nested directly in a component's body is scoped
//! via `css::scope_stylesheet` against the component's name, injected once
//! per mount with `tova_inject_css`, and stamped onto the component's
//! top-level returned JSX root via `tova_scope_root` so the root element
//! carries the matching `data-tova-<id>` attribute. A style block buried
//! inside a nested `if`/`while`/block isn't detected — only a component's
//! direct top-level statements are scanned, the same narrowing this module
//! already accepts for signal-write rewriting in nested control flow.

use tova_ast::{ComponentDecl, ComputedDecl, Decl, EffectDecl, Expr, StateDecl, StoreDecl, Stmt};
use tova_base::Interner;

use crate::emitter::{Emitter, Helper};
use crate::expr::{compound_op_js, emit_expr};
use crate::jsx::{capitalize, emit_jsx_node};
use crate::reactive::{emit_reactive_expr, SignalScope};
use crate::stmt::emit_stmt;
use crate::strings::{js_ident, js_string_literal};

/// Emits every browser-only declaration in `decls`. Plain declarations
/// (functions, types, imports) are routed through `decl::emit_decls` by the
/// caller instead.
pub fn emit_browser_decls(emitter: &mut Emitter, decls: &[&Decl<'_>], interner: &Interner) {
    let mut scope = SignalScope::new();
    for decl in decls.iter() {
        match decl {
            Decl::State(s) => scope.insert(s.name),
            Decl::Computed(c) => scope.insert(c.name),
            Decl::Store(s) => scope.insert(s.name),
            _ => {}
        }
    }

    let mut has_app = false;
    for decl in decls.iter() {
        match decl {
            Decl::State(s) => emit_state(emitter, s, interner),
            Decl::Computed(c) => emit_computed(emitter, c, &scope, interner),
            Decl::Effect(e) => emit_effect(emitter, e, &scope, interner),
            Decl::Store(s) => emit_store(emitter, s, &scope, interner),
            Decl::Component(c) => {
                has_app = has_app || interner.resolve(c.name) == "App";
                emit_component(emitter, c, &scope, interner);
            }
            _ => {} // routed through `decl::emit_decls` by the caller
        }
    }

    if has_app {
        emit_auto_mount(emitter);
    }
}

fn emit_state(emitter: &mut Emitter, decl: &StateDecl<'_>, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let setter = format!("set{}", capitalize(interner.resolve(decl.name)));
    let initial_js = emit_expr(emitter, decl.initial, interner);
    emitter.line(&format!("const [{name}, {setter}] = createSignal({initial_js});"));
}

fn emit_computed(emitter: &mut Emitter, decl: &ComputedDecl<'_>, scope: &SignalScope, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let body_js = emit_reactive_expr(emitter, decl.body, scope, interner);
    emitter.line(&format!("const {name} = createComputed(() => ({body_js}));"));
}

fn emit_effect(emitter: &mut Emitter, decl: &EffectDecl<'_>, scope: &SignalScope, interner: &Interner) {
    emitter.line("createEffect(() => {");
    emitter.indented(|e| emit_reactive_block(e, &decl.body, scope, interner));
    emitter.line("});");
}

/// Lowers a store to an IIFE returning an object exposing each member's
/// getter (and, for `state` members, setter) by name — the same
/// object-literal-of-members shape `decl`'s type/impl fusion already uses
/// for sum-type methods, applied here to a store's reactive members.
fn emit_store(emitter: &mut Emitter, decl: &StoreDecl<'_>, outer_scope: &SignalScope, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let mut scope = outer_scope.clone();
    for stmt in decl.body.statements.iter() {
        match stmt {
            Stmt::Decl { decl: Decl::State(s), .. } => scope.insert(s.name),
            Stmt::Decl { decl: Decl::Computed(c), .. } => scope.insert(c.name),
            _ => {}
        }
    }

    emitter.line(&format!("const {name} = (() => {{"));
    emitter.indented(|e| {
        let mut exposed: Vec<String> = Vec::new();
        for stmt in decl.body.statements.iter() {
            match stmt {
                Stmt::Decl { decl: Decl::State(s), .. } => {
                    emit_state(e, s, interner);
                    let member = js_ident(interner.resolve(s.name));
                    exposed.push(member);
                    exposed.push(format!("set{}", capitalize(interner.resolve(s.name))));
                }
                Stmt::Decl { decl: Decl::Computed(c), .. } => {
                    emit_computed(e, c, &scope, interner);
                    exposed.push(js_ident(interner.resolve(c.name)));
                }
                Stmt::Decl { decl: Decl::Function(f), .. } => {
                    crate::decl::emit_function_decl(e, f, interner);
                    exposed.push(js_ident(interner.resolve(f.name)));
                }
                other => emit_reactive_stmt(e, other, &scope, interner),
            }
        }
        e.write_indent_prefix();
        e.raw("return {\n");
        e.indented(|e2| {
            for member in &exposed {
                e2.line(&format!("{member},"));
            }
        });
        e.line("};");
    });
    emitter.line("})();");
}

fn emit_component(emitter: &mut Emitter, decl: &ComponentDecl<'_>, outer_scope: &SignalScope, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let mut scope = outer_scope.clone();
    for prop in decl.props.iter() {
        scope.insert(prop.name);
    }
    let mut style: Option<(String, String)> = None;
    for stmt in decl.body.statements.iter() {
        match stmt {
            Stmt::Decl { decl: Decl::State(s), .. } => scope.insert(s.name),
            Stmt::Decl { decl: Decl::Computed(c), .. } => scope.insert(c.name),
            Stmt::Decl { decl: Decl::Style(s), .. } => {
                let css_text = interner.resolve(s.css);
                style = Some(crate::css::scope_stylesheet(interner.resolve(decl.name), css_text));
            }
            _ => {}
        }
    }

    emitter.line(&format!("function {name}(__props) {{"));
    emitter.indented(|e| {
        for prop in decl.props.iter() {
            let prop_name = js_ident(interner.resolve(prop.name));
            e.line(&format!("const {prop_name} = () => __props.{prop_name};"));
        }
        if let Some((id, css)) = &style {
            e.require(Helper::InjectCss);
            e.line(&format!("tova_inject_css({}, {});", js_string_literal(id), js_string_literal(css)));
        }
        for stmt in decl.body.statements.iter() {
            match stmt {
                Stmt::Decl { decl: Decl::Style(_), .. } => {} // injected once above, ahead of the body
                Stmt::Return { value: Some(Expr::Jsx { node, .. }), .. } if style.is_some() => {
                    let (id, _) = style.as_ref().expect("style.is_some() checked above");
                    let js = emit_jsx_node(e, node, &scope, interner);
                    e.require(Helper::InjectCss);
                    e.line(&format!("return tova_scope_root({}, {js});", js_string_literal(id)));
                }
                other => emit_reactive_stmt(e, other, &scope, interner),
            }
        }
    });
    emitter.line("}");
}

fn emit_auto_mount(emitter: &mut Emitter) {
    emitter.line("document.addEventListener('DOMContentLoaded', () => {");
    emitter.indented(|e| e.line("tova_mount(App({}), document.body);"));
    emitter.line("});");
}

/// Emits a block, rewriting signal reads/writes via `scope` and recursing
/// through the handful of control-flow statements likely to wrap a
/// component/effect/store body (`if`, nested blocks, `while`, `loop`).
/// Anything else (`for`, `match`, `guard`, `with`, `defer`, `try/catch`)
/// falls back to the plain, scope-unaware statement emitter — a signal
/// write buried inside one of those isn't rewritten to a setter call, a
/// documented narrowing rather than full dataflow-aware lowering.
fn emit_reactive_block(emitter: &mut Emitter, block: &tova_ast::StmtBlock<'_>, scope: &SignalScope, interner: &Interner) {
    for stmt in block.statements.iter() {
        emit_reactive_stmt(emitter, stmt, scope, interner);
    }
}

fn emit_reactive_stmt(emitter: &mut Emitter, stmt: &Stmt<'_>, scope: &SignalScope, interner: &Interner) {
    match stmt {
        // Browser-only decls nested inside a component/effect/store body:
        // `decl::emit_decls`'s generic `Stmt::Decl` handling deliberately
        // no-ops these (routed here instead), so they need to be
        // intercepted before falling through to the plain emitter.
        Stmt::Decl { decl: Decl::State(s), .. } => emit_state(emitter, s, interner),
        Stmt::Decl { decl: Decl::Computed(c), .. } => emit_computed(emitter, c, scope, interner),
        Stmt::Decl { decl: Decl::Effect(e), .. } => emit_effect(emitter, e, scope, interner),
        Stmt::Decl { decl: Decl::Component(c), .. } => emit_component(emitter, c, scope, interner),
        Stmt::Decl { decl: Decl::Store(s), .. } => emit_store(emitter, s, scope, interner),
        // A style block buried in nested control flow isn't scoped; see
        // the module doc comment's narrowing note.
        Stmt::Decl { decl: Decl::Style(_), .. } => {}
        Stmt::Return { value: Some(Expr::Jsx { node, .. }), .. } => {
            let js = emit_jsx_node(emitter, node, scope, interner);
            emitter.line(&format!("return {js};"));
        }
        Stmt::Assign { target, value, .. } => match target {
            Expr::Identifier { name, .. } if scope.contains(*name) => {
                let setter = format!("set{}", capitalize(interner.resolve(*name)));
                let value_js = emit_reactive_expr(emitter, value, scope, interner);
                emitter.line(&format!("{setter}({value_js});"));
            }
            _ => emit_stmt(emitter, stmt, interner),
        },
        Stmt::CompoundAssign { op, target, value, .. } => match target {
            Expr::Identifier { name, .. } if scope.contains(*name) => {
                let setter = format!("set{}", capitalize(interner.resolve(*name)));
                let value_js = emit_reactive_expr(emitter, value, scope, interner);
                emitter.line(&format!("{setter}((__prev) => __prev {} ({value_js}));", compound_op_js(*op)));
            }
            _ => emit_stmt(emitter, stmt, interner),
        },
        Stmt::Block { block, .. } => {
            emitter.line("{");
            emitter.indented(|e| emit_reactive_block(e, block, scope, interner));
            emitter.line("}");
        }
        Stmt::If { condition, then_branch, else_branch, .. } => {
            let cond_js = emit_reactive_expr(emitter, condition, scope, interner);
            emitter.line(&format!("if ({cond_js}) {{"));
            emitter.indented(|e| emit_reactive_block(e, then_branch, scope, interner));
            match else_branch {
                Some(branch) => {
                    emitter.line("} else {");
                    emitter.indented(|e| emit_reactive_block(e, branch, scope, interner));
                    emitter.line("}");
                }
                None => emitter.line("}"),
            }
        }
        Stmt::While { label, condition, body, .. } => {
            if let Some(l) = label {
                emitter.line(&format!("{}:", js_ident(interner.resolve(*l))));
            }
            let cond_js = emit_reactive_expr(emitter, condition, scope, interner);
            emitter.line(&format!("while ({cond_js}) {{"));
            emitter.indented(|e| emit_reactive_block(e, body, scope, interner));
            emitter.line("}");
        }
        Stmt::Loop { label, body, .. } => {
            if let Some(l) = label {
                emitter.line(&format!("{}:", js_ident(interner.resolve(*l))));
            }
            emitter.line("while (true) {");
            emitter.indented(|e| emit_reactive_block(e, body, scope, interner));
            emitter.line("}");
        }
        _ => emit_stmt(emitter, stmt, interner),
    }
}
