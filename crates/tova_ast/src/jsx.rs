//! JSX node family.

use tova_base::{Location, Symbol};

use crate::expr::Expr;
use crate::pattern::Pattern;

/// An event handler modifier chain: `on:click.stop.prevent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventModifier {
    Stop,
    Prevent,
    SelfOnly,
    Once,
    Capture,
    Key(Symbol),
}

/// The value carried by an attribute.
#[derive(Debug, Clone)]
pub enum JsxAttributeValue<'a> {
    StringLiteral(Symbol),
    Expr(&'a Expr<'a>),
    /// Present (truthy) with no value, e.g. `disabled`.
    Bare,
}

/// One JSX attribute or directive.
#[derive(Debug, Clone)]
pub enum JsxAttribute<'a> {
    /// A plain `name="value"` or `name={expr}` attribute.
    Plain {
        name: Symbol,
        value: JsxAttributeValue<'a>,
        location: Location,
    },
    /// `on:name[.modifier...]={handler}`.
    Event {
        name: Symbol,
        modifiers: &'a [EventModifier],
        handler: &'a Expr<'a>,
        location: Location,
    },
    /// `class:name={cond}`.
    ClassDirective {
        name: Symbol,
        condition: &'a Expr<'a>,
        location: Location,
    },
    /// `bind:name={target}`.
    BindDirective {
        name: Symbol,
        target: &'a Expr<'a>,
        location: Location,
    },
    /// `in:name`/`out:name`/`transition:name`, with an optional config
    /// expression.
    TransitionDirective {
        kind: TransitionKind,
        name: Symbol,
        config: Option<&'a Expr<'a>>,
        location: Location,
    },
    /// `{...expr}`.
    Spread { value: &'a Expr<'a>, location: Location },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    In,
    Out,
    Bidirectional,
}

/// One child of a JSX element or fragment.
#[derive(Debug, Clone)]
pub enum JsxChild<'a> {
    Text { value: Symbol, location: Location },
    Expr { value: &'a Expr<'a>, location: Location },
    Element { node: &'a JsxNode<'a>, location: Location },
    /// `for item in iter [key={expr}] { children }`.
    For {
        pattern: Pattern<'a>,
        iterable: &'a Expr<'a>,
        key: Option<&'a Expr<'a>>,
        body: &'a [JsxChild<'a>],
        location: Location,
    },
    /// `if cond { children } else { children }`.
    If {
        condition: &'a Expr<'a>,
        then_branch: &'a [JsxChild<'a>],
        else_branch: Option<&'a [JsxChild<'a>]>,
        location: Location,
    },
}

/// A JSX element or fragment.
#[derive(Debug, Clone)]
pub enum JsxNode<'a> {
    Element {
        tag: Symbol,
        attributes: &'a [JsxAttribute<'a>],
        /// `None` for a self-closing tag (`<br />`).
        children: Option<&'a [JsxChild<'a>]>,
        location: Location,
    },
    Fragment {
        children: &'a [JsxChild<'a>],
        location: Location,
    },
}

impl<'a> JsxNode<'a> {
    pub fn location(&self) -> Location {
        match self {
            JsxNode::Element { location, .. } | JsxNode::Fragment { location, .. } => *location,
        }
    }
}
