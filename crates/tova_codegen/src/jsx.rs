//! JSX lowering, shared by every target that can produce markup (mainly
//! `browser`, but a server handler may still build a node tree to render
//! to a string).
//!
//! A node lowers to a plain `tova_el(tag, props, children)`/
//! `tova_fragment(children)` data literal (see `emitter::Helper`) rather
//! than calling into a framework-specific `createElement`, so the runtime
//! stays a small hand-rolled reconciler instead of a dependency.
//!
//! `on:name.mod1.mod2={handler}` composes its guard checks in a fixed
//! order — key match, then self-only, then `stopPropagation`, then
//! `preventDefault` — before calling the handler; `.once`/`.capture`
//! affect how the listener is *registered*, not the handler body, so they
//! ride along as sibling `onNameOnce`/`onNameCapture` boolean props for
//! the runtime's listener-attachment step to read instead.
//!
//! Every emission function threads a `SignalScope` (see `reactive`) so an
//! attribute/child/handler expression that reads a `state`/`computed`/prop
//! name gets rewritten to call its getter and, for attribute/child
//! positions, gets wrapped in a thunk the runtime can re-invoke. A non-JSX
//! caller (a plain `<Tag/>` expression outside a component) passes an empty
//! scope, so nothing looks reactive there.

use tova_ast::{Expr, EventModifier, JsxAttribute, JsxAttributeValue, JsxChild, JsxNode, TransitionKind};
use tova_base::{Interner, Symbol};

use crate::emitter::{Emitter, Helper};
use crate::expr::emit_expr;
use crate::pattern::compile_pattern;
use crate::reactive::{emit_reactive_expr, expr_reads_signal, thunk, SignalScope};
use crate::strings::{js_ident, js_string_literal};

pub fn emit_jsx_node(emitter: &mut Emitter, node: &JsxNode<'_>, scope: &SignalScope, interner: &Interner) -> String {
    match node {
        JsxNode::Element { tag, attributes, children, .. } => emit_element(emitter, *tag, attributes, *children, scope, interner),
        JsxNode::Fragment { children, .. } => {
            emitter.require(Helper::TovaFragment);
            format!("tova_fragment({})", emit_children_array(emitter, Some(children), scope, interner))
        }
    }
}

fn emit_element(emitter: &mut Emitter, tag: Symbol, attributes: &[JsxAttribute<'_>], children: Option<&[JsxChild<'_>]>, scope: &SignalScope, interner: &Interner) -> String {
    let tag_js = js_string_literal(interner.resolve(tag));
    let props = emit_attributes(emitter, attributes, scope, interner);
    let children_js = emit_children_array(emitter, children, scope, interner);
    emitter.require(Helper::TovaEl);
    format!("tova_el({tag_js}, {{{}}}, {children_js})", props.join(", "))
}

/// Emits a value that may read a signal, wrapping it in a thunk when it does
/// so the runtime re-evaluates it on change instead of capturing a stale
/// snapshot taken at construction time.
fn emit_reactive_value(emitter: &mut Emitter, expr: &Expr<'_>, scope: &SignalScope, interner: &Interner) -> String {
    let reactive = expr_reads_signal(expr, scope);
    let js = emit_reactive_expr(emitter, expr, scope, interner);
    thunk(&js, reactive)
}

fn emit_attributes(emitter: &mut Emitter, attributes: &[JsxAttribute<'_>], scope: &SignalScope, interner: &Interner) -> Vec<String> {
    let mut props = Vec::new();
    let mut class_literal: Option<String> = None;
    let mut class_conditions: Vec<(String, String)> = Vec::new();

    for attr in attributes.iter() {
        match attr {
            JsxAttribute::Plain { name, value, .. } => {
                let key = interner.resolve(*name);
                let value_js = match value {
                    JsxAttributeValue::StringLiteral(sym) => js_string_literal(interner.resolve(*sym)),
                    JsxAttributeValue::Expr(e) => emit_reactive_value(emitter, e, scope, interner),
                    JsxAttributeValue::Bare => "true".to_string(),
                };
                if key == "class" || key == "className" {
                    class_literal = Some(value_js);
                } else {
                    props.push(format!("{}: {value_js}", remap_attr_name(key)));
                }
            }
            JsxAttribute::Event { name, modifiers, handler, .. } => {
                let event_name = format!("on{}", capitalize(interner.resolve(*name)));
                let handler_js = emit_event_handler(emitter, modifiers, handler, scope, interner);
                props.push(format!("{event_name}: {handler_js}"));
                if modifiers.contains(&EventModifier::Once) {
                    props.push(format!("{event_name}Once: true"));
                }
                if modifiers.contains(&EventModifier::Capture) {
                    props.push(format!("{event_name}Capture: true"));
                }
            }
            JsxAttribute::ClassDirective { name, condition, .. } => {
                let cond_js = emit_reactive_value(emitter, condition, scope, interner);
                class_conditions.push((interner.resolve(*name).to_string(), cond_js));
            }
            JsxAttribute::BindDirective { name, target, .. } => {
                let prop_name = interner.resolve(*name);
                let target_js = emit_reactive_expr(emitter, target, scope, interner);
                props.push(format!("{prop_name}: {target_js}"));
                if let Some(setter) = bind_setter_js(target, interner) {
                    let dom_prop = if prop_name == "checked" { "checked" } else { "value" };
                    let event_name = if prop_name == "checked" { "onChange" } else { "onInput" };
                    props.push(format!("{event_name}: (__e) => {setter}(__e.target.{dom_prop})"));
                }
            }
            JsxAttribute::TransitionDirective { kind, name, config, .. } => {
                let key = match kind {
                    TransitionKind::In => "__tovaTransitionIn",
                    TransitionKind::Out => "__tovaTransitionOut",
                    TransitionKind::Bidirectional => "__tovaTransition",
                };
                let name_js = js_string_literal(interner.resolve(*name));
                let config_js = config.map(|c| emit_expr(emitter, c, interner)).unwrap_or_else(|| "undefined".to_string());
                props.push(format!("{key}: {{ name: {name_js}, config: {config_js} }}"));
            }
            JsxAttribute::Spread { value, .. } => {
                let v = emit_expr(emitter, value, interner);
                props.push(format!("...{v}"));
            }
        }
    }

    if class_literal.is_some() || !class_conditions.is_empty() {
        let mut parts: Vec<String> = Vec::new();
        if let Some(lit) = class_literal {
            parts.push(lit);
        }
        for (name, cond) in class_conditions {
            parts.push(format!("({cond} ? {} : \"\")", js_string_literal(&name)));
        }
        props.push(format!("className: [{}].filter(Boolean).join(' ')", parts.join(", ")));
    }

    props
}

/// `bind:value={count}` assumes `count`/`setCount` is a signal pair (the
/// same naming convention `browser`'s `state` lowering produces), so the
/// setter name is derived textually. A bind target that isn't a bare
/// identifier (e.g. `bind:value={form.name}`) gets the read-only half of
/// the binding only; wiring an assignment back through an arbitrary
/// lvalue is left unsupported.
fn bind_setter_js(target: &Expr<'_>, interner: &Interner) -> Option<String> {
    match target {
        Expr::Identifier { name, .. } => Some(format!("set{}", capitalize(interner.resolve(*name)))),
        _ => None,
    }
}

fn emit_event_handler(emitter: &mut Emitter, modifiers: &[EventModifier], handler: &Expr<'_>, scope: &SignalScope, interner: &Interner) -> String {
    let handler_js = emit_reactive_expr(emitter, handler, scope, interner);
    let mut body = Emitter::new();
    for modifier in modifiers.iter() {
        match modifier {
            EventModifier::Key(sym) => body.line(&format!("if (__e.key !== {}) return;", js_string_literal(interner.resolve(*sym)))),
            EventModifier::SelfOnly => body.line("if (__e.target !== __e.currentTarget) return;"),
            EventModifier::Stop => body.line("__e.stopPropagation();"),
            EventModifier::Prevent => body.line("__e.preventDefault();"),
            EventModifier::Once | EventModifier::Capture => {} // registration-time flags, not handler logic
        }
    }
    body.line(&format!("({handler_js})(__e);"));
    emitter.absorb_helpers_from(&body);
    format!("(__e) => {{\n{}}}", body.finish())
}

fn emit_children_array(emitter: &mut Emitter, children: Option<&[JsxChild<'_>]>, scope: &SignalScope, interner: &Interner) -> String {
    match children {
        None => "[]".to_string(),
        Some(list) => {
            let parts: Vec<String> = list
                .iter()
                .map(|child| {
                    let (spread, js) = emit_child_item(emitter, child, scope, interner);
                    if spread {
                        format!("...{js}")
                    } else {
                        js
                    }
                })
                .collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// Lowers one child; the `bool` says whether the result is an array to be
/// spread into the parent's children list (`for`/`if`, which can produce
/// zero or more nodes) rather than a single node.
fn emit_child_item(emitter: &mut Emitter, child: &JsxChild<'_>, scope: &SignalScope, interner: &Interner) -> (bool, String) {
    match child {
        JsxChild::Text { value, .. } => (false, js_string_literal(interner.resolve(*value))),
        JsxChild::Expr { value, .. } => (false, emit_reactive_value(emitter, value, scope, interner)),
        JsxChild::Element { node, .. } => (false, emit_jsx_node(emitter, node, scope, interner)),
        JsxChild::For { pattern, iterable, key, body, .. } => {
            let iter_js = emit_expr(emitter, iterable, interner);
            let mut closure = Emitter::new();
            let compiled = compile_pattern(pattern, "__item", interner);
            for (name, accessor) in &compiled.bindings {
                closure.line(&format!("const {name} = {accessor};"));
            }
            let fragment_js = {
                closure.require(Helper::TovaFragment);
                let body_js = emit_children_array(&mut closure, Some(body), scope, interner);
                format!("tova_fragment({body_js})")
            };
            let node_js = match key {
                Some(key_expr) => {
                    let key_js = emit_expr(&mut closure, key_expr, interner);
                    format!("{{ ...{fragment_js}, key: {key_js} }}")
                }
                None => fragment_js,
            };
            closure.line(&format!("return {node_js};"));
            emitter.absorb_helpers_from(&closure);
            (true, format!("{iter_js}.map((__item) => {{\n{}}})", closure.finish()))
        }
        JsxChild::If { condition, then_branch, else_branch, .. } => {
            let cond_js = emit_reactive_expr(emitter, condition, scope, interner);
            let then_js = emit_children_array(emitter, Some(then_branch), scope, interner);
            let else_js = match else_branch {
                Some(branch) => emit_children_array(emitter, Some(branch), scope, interner),
                None => "[]".to_string(),
            };
            (true, format!("({cond_js} ? {then_js} : {else_js})"))
        }
    }
}

fn remap_attr_name(key: &str) -> String {
    match key {
        "for" => "htmlFor".to_string(),
        _ => js_ident(key),
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
