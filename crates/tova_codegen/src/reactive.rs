//! Reactive-closure detection for the browser target (spec §4.4 "Reactive
//! lowering"): deciding whether a JSX attribute/child expression needs to
//! become a thunk so the runtime re-evaluates it on signal change, versus
//! a plain value computed once at mount.
//!
//! `state`/`computed` bindings and a component's own `props` destructure
//! into getter functions (`name()` reads the current value); any
//! expression whose evaluation calls through one of those getters is
//! "reactive" and must be deferred with a closure rather than evaluated
//! eagerly at element-construction time.

use std::collections::HashSet;

use tova_ast::{Expr, Literal, TemplatePart, UnaryOpKind};
use tova_base::{Interner, Symbol};

use crate::emitter::Emitter;
use crate::expr::{binary_op_js, compound_op_js, emit_expr};
use crate::strings::{js_ident, js_template_text};

/// The set of identifier names (state vars, computed vars, store
/// properties, component props) whose reads make an expression reactive.
#[derive(Debug, Default, Clone)]
pub struct SignalScope {
    names: HashSet<Symbol>,
}

impl SignalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: Symbol) {
        self.names.insert(name);
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.names.contains(&name)
    }
}

/// `true` if evaluating `expr` would read through any name in `scope`.
pub fn expr_reads_signal(expr: &Expr<'_>, scope: &SignalScope) -> bool {
    match expr {
        Expr::Identifier { name, .. } => scope.contains(*name),
        Expr::Literal { .. } | Expr::Column { .. } => false,
        Expr::Binary { left, right, .. } => expr_reads_signal(left, scope) || expr_reads_signal(right, scope),
        Expr::Unary { operand, .. } => expr_reads_signal(operand, scope),
        Expr::ChainedComparison { operands, .. } => operands.iter().any(|o| expr_reads_signal(o, scope)),
        Expr::Call { callee, args, .. } => expr_reads_signal(callee, scope) || args.iter().any(|a| expr_reads_signal(a.value, scope)),
        Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => expr_reads_signal(object, scope),
        Expr::Index { object, index, .. } => expr_reads_signal(object, scope) || expr_reads_signal(index, scope),
        Expr::Slice { object, low, high, step, .. } => {
            expr_reads_signal(object, scope)
                || low.map(|e| expr_reads_signal(e, scope)).unwrap_or(false)
                || high.map(|e| expr_reads_signal(e, scope)).unwrap_or(false)
                || step.map(|e| expr_reads_signal(e, scope)).unwrap_or(false)
        }
        Expr::Pipe { left, target, .. } => expr_reads_signal(left, scope) || expr_reads_signal(target, scope),
        Expr::Lambda { .. } => false,
        Expr::Match { subject, arms, .. } => expr_reads_signal(subject, scope) || arms.iter().any(|a| expr_reads_signal(a.body, scope)),
        Expr::Spread { inner, .. } | Expr::Await { inner, .. } | Expr::Propagate { inner, .. } => expr_reads_signal(inner, scope),
        Expr::Yield { inner, .. } => inner.map(|e| expr_reads_signal(e, scope)).unwrap_or(false),
        Expr::If { condition, then_branch, else_branch, .. } => {
            expr_reads_signal(condition, scope) || expr_reads_signal(then_branch, scope) || else_branch.map(|e| expr_reads_signal(e, scope)).unwrap_or(false)
        }
        Expr::Is { subject, .. } => expr_reads_signal(subject, scope),
        Expr::Membership { value, iterable, .. } => expr_reads_signal(value, scope) || expr_reads_signal(iterable, scope),
        Expr::CompoundAssign { target, value, .. } => expr_reads_signal(target, scope) || expr_reads_signal(value, scope),
        Expr::ListComprehension { comprehension, .. } | Expr::DictComprehension { comprehension, .. } => expr_reads_signal(comprehension.element, scope),
        Expr::Range { low, high, .. } => expr_reads_signal(low, scope) || expr_reads_signal(high, scope),
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => elements.iter().any(|e| expr_reads_signal(e, scope)),
        Expr::Dict { entries, .. } => entries.iter().any(|(k, v)| expr_reads_signal(k, scope) || expr_reads_signal(v, scope)),
        Expr::Jsx { .. } => false, // nested JSX is lowered to its own tova_el call tree independently
        Expr::As { inner, .. } => expr_reads_signal(inner, scope),
    }
}

/// Wraps `js` in a zero-arg arrow if `reactive`, so the runtime can call it
/// again on every dependency change; otherwise passes it through.
pub fn thunk(js: &str, reactive: bool) -> String {
    if reactive {
        format!("() => ({js})")
    } else {
        js.to_string()
    }
}

/// Emits `expr`, rewriting bare reads/writes of names in `scope` into their
/// signal getter/setter calls (`count` -> `count()`, `count = v` compound
/// assign -> `setCount(v)`). Covers the expression shapes that actually
/// appear inside JSX attribute values, children, and event handlers; less
/// common forms (comprehensions, pattern matching, pipelines, column
/// pipelines) fall back to the plain, scope-unaware `emit_expr` — a nested
/// signal read inside one of those reads the getter function itself rather
/// than its current value, which is wrong but not silently so (the mistake
/// shows up immediately as a stringified function in the output).
pub fn emit_reactive_expr(emitter: &mut Emitter, expr: &Expr<'_>, scope: &SignalScope, interner: &Interner) -> String {
    match expr {
        Expr::Identifier { name, .. } => {
            let text = js_ident(interner.resolve(*name));
            if scope.contains(*name) {
                format!("{text}()")
            } else {
                text
            }
        }
        Expr::Literal { value: Literal::Template(parts), .. } => {
            let mut out = String::from("`");
            for part in parts.iter() {
                match part {
                    TemplatePart::Text(sym) => out.push_str(&js_template_text(interner.resolve(*sym))),
                    TemplatePart::Expr(e) => {
                        out.push_str("${");
                        out.push_str(&emit_reactive_expr(emitter, e, scope, interner));
                        out.push('}');
                    }
                }
            }
            out.push('`');
            out
        }
        Expr::Binary { op, left, right, .. } => {
            format!("({} {} {})", emit_reactive_expr(emitter, left, scope, interner), binary_op_js(*op), emit_reactive_expr(emitter, right, scope, interner))
        }
        Expr::Unary { op, operand, .. } => {
            let inner = emit_reactive_expr(emitter, operand, scope, interner);
            match op {
                UnaryOpKind::Not => format!("(!{inner})"),
                UnaryOpKind::Neg => format!("(-{inner})"),
                UnaryOpKind::NonNullAssert => inner,
            }
        }
        Expr::Member { object, property, .. } => format!("{}.{}", emit_reactive_expr(emitter, object, scope, interner), js_ident(interner.resolve(*property))),
        Expr::OptionalMember { object, property, .. } => format!("{}?.{}", emit_reactive_expr(emitter, object, scope, interner), js_ident(interner.resolve(*property))),
        Expr::Index { object, index, .. } => format!("{}[{}]", emit_reactive_expr(emitter, object, scope, interner), emit_reactive_expr(emitter, index, scope, interner)),
        Expr::Call { callee, args, .. } => {
            let callee_js = emit_reactive_expr(emitter, callee, scope, interner);
            let args_js: Vec<String> = args
                .iter()
                .map(|a| {
                    let v = emit_reactive_expr(emitter, a.value, scope, interner);
                    if a.spread {
                        format!("...{v}")
                    } else {
                        v
                    }
                })
                .collect();
            format!("{callee_js}({})", args_js.join(", "))
        }
        Expr::If { condition, then_branch, else_branch, .. } => {
            let cond = emit_reactive_expr(emitter, condition, scope, interner);
            let then_js = emit_reactive_expr(emitter, then_branch, scope, interner);
            let else_js = else_branch.map(|e| emit_reactive_expr(emitter, e, scope, interner)).unwrap_or_else(|| "undefined".to_string());
            format!("({cond} ? {then_js} : {else_js})")
        }
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => {
            let parts: Vec<String> = elements.iter().map(|e| emit_reactive_expr(emitter, e, scope, interner)).collect();
            format!("[{}]", parts.join(", "))
        }
        Expr::CompoundAssign { op, target, value, .. } => match target {
            Expr::Identifier { name, .. } if scope.contains(*name) => {
                let setter = format!("set{}", crate::jsx::capitalize(interner.resolve(*name)));
                let value_js = emit_reactive_expr(emitter, value, scope, interner);
                format!("{setter}((__prev) => __prev {} ({value_js}))", compound_op_js(*op))
            }
            _ => emit_expr(emitter, expr, interner),
        },
        Expr::Lambda { params, body, .. } => {
            let param_names: Vec<String> = params.iter().map(|p| js_ident(interner.resolve(p.name))).collect();
            let body_js = emit_reactive_expr(emitter, body, scope, interner);
            format!("(({}) => ({body_js}))", param_names.join(", "))
        }
        _ => emit_expr(emitter, expr, interner),
    }
}
