//! The output buffer shared by every emission pass: indentation tracking
//! plus the one-shot-helper bookkeeping described in spec §4.4's "Emitter
//! outputs" ("any one-shot helpers ... included exactly once per target").

use std::collections::BTreeSet;
use std::fmt::Write as _;

/// A helper function/constructor the emitter may need to prepend to a
/// target's output. Tracked as a set so each is written at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Helper {
    Propagate,
    SumTypeConstructors,
    MatchHelpers,
    TovaEl,
    TovaFragment,
    InjectCss,
}

impl Helper {
    fn source(self) -> &'static str {
        match self {
            Helper::Propagate => {
                "class __TovaPropagate {\n  constructor(value) { this.value = value; this.__tova_propagate = true; }\n}\nfunction __propagate(value) {\n  if (value && typeof value === 'object' && '__tag' in value && value.__tag === 'Err') {\n    throw new __TovaPropagate(value);\n  }\n  if (value && typeof value === 'object' && '__tag' in value && value.__tag === 'None') {\n    throw new __TovaPropagate(value);\n  }\n  return value && typeof value === 'object' && '__tag' in value ? value.__value : value;\n}\n"
            }
            Helper::SumTypeConstructors => {
                "function Ok(value) { return { __tag: 'Ok', __value: value, __fields: [value], isOk: () => true, isErr: () => false, unwrap: () => value, unwrapOr: () => value }; }\nfunction Err(error) { return { __tag: 'Err', __value: error, __fields: [error], isOk: () => false, isErr: () => true, unwrap: () => { throw new Error('called unwrap() on an Err value'); }, unwrapOr: (d) => d }; }\nfunction Some(value) { return { __tag: 'Some', __value: value, __fields: [value], isSome: () => true, isNone: () => false, unwrap: () => value, unwrapOr: () => value }; }\nconst None = { __tag: 'None', __fields: [], isSome: () => false, isNone: () => true, unwrap: () => { throw new Error('called unwrap() on a None value'); }, unwrapOr: (d) => d };\n"
            }
            Helper::MatchHelpers => {
                "function __matchTag(v) { return v && typeof v === 'object' && '__tag' in v ? v.__tag : undefined; }\n"
            }
            Helper::TovaEl => {
                "function tova_el(tag, props, children) { return { tag, props: props || {}, children: children || [] }; }\n"
            }
            Helper::TovaFragment => "function tova_fragment(children) { return { tag: null, props: {}, children: children || [] }; }\n",
            Helper::InjectCss => {
                "const __tova_css_refs = new Map();\nfunction tova_inject_css(id, css) {\n  const entry = __tova_css_refs.get(id);\n  if (entry) { entry.count += 1; return () => __tova_release_css(id); }\n  const node = document.createElement('style');\n  node.setAttribute('data-tova-style', id);\n  node.textContent = css;\n  document.head.appendChild(node);\n  __tova_css_refs.set(id, { node, count: 1 });\n  return () => __tova_release_css(id);\n}\nfunction __tova_release_css(id) {\n  const entry = __tova_css_refs.get(id);\n  if (!entry) return;\n  entry.count -= 1;\n  if (entry.count <= 0) { entry.node.remove(); __tova_css_refs.delete(id); }\n}\nfunction tova_scope_root(id, node) {\n  if (node && typeof node === 'object') { node.props = { ...(node.props || {}), ['data-tova-' + id]: '' }; }\n  return node;\n}\n"
            }
        }
    }
}

/// An indentation-aware string builder. Every emission function writes
/// into one of these rather than returning fresh `String`s to concatenate,
/// so indentation stays consistent across nested blocks.
#[derive(Debug, Default)]
pub struct Emitter {
    buf: String,
    indent: usize,
    helpers: BTreeSet<Helper>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, helper: Helper) {
        self.helpers.insert(helper);
    }

    /// Pulls every helper requirement recorded on a scratch `Emitter` (one
    /// built to assemble an IIFE body, then discarded after `.finish()`)
    /// into `self`, so a helper required deep inside a nested expression
    /// still reaches the top-level prelude.
    pub fn absorb_helpers_from(&mut self, other: &Emitter) {
        self.helpers.extend(other.helpers.iter().copied());
    }

    pub fn indented<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Appends `text` with no trailing newline, prefixed with the current
    /// indent only if the buffer is at the start of a line.
    pub fn write_indent_prefix(&mut self) {
        for _ in 0..self.indent {
            self.buf.push_str("  ");
        }
    }

    pub fn writeln_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        self.write_indent_prefix();
        self.buf.write_fmt(args).unwrap();
        self.buf.push('\n');
    }

    /// Finishes the buffer, prepending every helper this pass required, in
    /// a stable order, each written exactly once.
    pub fn finish(self) -> String {
        let mut out = String::new();
        for helper in &self.helpers {
            out.push_str(helper.source());
        }
        out.push_str(&self.buf);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty() && self.helpers.is_empty()
    }
}

/// Shorthand for `emitter.writeln_fmt(format_args!(...))`, matching the
/// teacher's `writeln!(output, ...)` call sites but routed through the
/// indent-aware buffer.
#[macro_export]
macro_rules! emit_line {
    ($emitter:expr, $($arg:tt)*) => {
        $emitter.writeln_fmt(format_args!($($arg)*))
    };
}
