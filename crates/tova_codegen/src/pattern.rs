//! Pattern-to-JavaScript compilation (spec §4.4 "Match").
//!
//! Every sum-type value (whether a user `type` variant or a built-in
//! `Ok/Err/Some/None` constructor) is represented at runtime as a tagged
//! object `{ __tag: "Name", __fields: [v0, v1, ...] }`. A pattern compiles
//! to a predicate testing `__match` (the subject, bound once by the
//! caller) plus a list of `const` bindings extracting captured parts.

use tova_ast::{Literal, ObjectPatternField, Pattern};
use tova_base::Interner;

use crate::strings::{js_ident, js_string_literal};

/// One compiled pattern: a boolean predicate and the bindings it captures.
#[derive(Debug, Default)]
pub struct CompiledPattern {
    /// Conjuncts to join with `&&`; empty means "always matches".
    pub predicate_terms: Vec<String>,
    /// `(binding name, accessor expression)` pairs emitted as
    /// `const name = accessor;` ahead of the arm body.
    pub bindings: Vec<(String, String)>,
}

impl CompiledPattern {
    pub fn predicate(&self) -> String {
        if self.predicate_terms.is_empty() {
            "true".to_string()
        } else {
            self.predicate_terms.join(" && ")
        }
    }
}

/// Compiles `pattern` against the JS expression `subject` (already bound to
/// a temporary so it's evaluated once).
pub fn compile_pattern(pattern: &Pattern<'_>, subject: &str, interner: &Interner) -> CompiledPattern {
    let mut out = CompiledPattern::default();
    compile_into(pattern, subject, interner, &mut out);
    out
}

fn compile_into(pattern: &Pattern<'_>, subject: &str, interner: &Interner, out: &mut CompiledPattern) {
    match pattern {
        Pattern::Wildcard { .. } => {}
        Pattern::Binding { name, .. } => {
            let name = js_ident(interner.resolve(*name));
            out.bindings.push((name, subject.to_string()));
        }
        Pattern::Literal { value, .. } => {
            out.predicate_terms.push(format!("{subject} === {}", literal_js(value, interner)));
        }
        Pattern::StringConcat { prefix, rest, .. } => {
            let prefix_lit = js_string_literal(interner.resolve(*prefix));
            out.predicate_terms.push(format!("typeof {subject} === 'string' && {subject}.startsWith({prefix_lit})"));
            let rest_name = js_ident(interner.resolve(*rest));
            out.bindings.push((rest_name, format!("{subject}.slice({}.length)", prefix_lit)));
        }
        Pattern::Range { low, high, inclusive, .. } => {
            let lo = pattern_literal_js(low, interner);
            let hi = pattern_literal_js(high, interner);
            let upper_op = if *inclusive { "<=" } else { "<" };
            out.predicate_terms.push(format!("{subject} >= {lo} && {subject} {upper_op} {hi}"));
        }
        Pattern::Variant { name, fields, .. } => {
            let tag = js_string_literal(interner.resolve(*name));
            out.predicate_terms.push(format!("__matchTag({subject}) === {tag}"));
            for (index, field) in fields.iter().enumerate() {
                let accessor = format!("{subject}.__fields[{index}]");
                compile_into(field, &accessor, interner, out);
            }
        }
        Pattern::Object { fields, .. } => {
            out.predicate_terms.push(format!("{subject} !== null && typeof {subject} === 'object'"));
            for field in fields.iter() {
                compile_object_field(field, subject, interner, out);
            }
        }
        Pattern::Array { elements, rest, .. } => {
            out.predicate_terms.push(format!("Array.isArray({subject})"));
            if rest.is_none() {
                out.predicate_terms.push(format!("{subject}.length === {}", elements.len()));
            } else {
                out.predicate_terms.push(format!("{subject}.length >= {}", elements.len()));
            }
            for (index, element) in elements.iter().enumerate() {
                let accessor = format!("{subject}[{index}]");
                compile_into(element, &accessor, interner, out);
            }
            if let Some(rest_name) = rest {
                let name = js_ident(interner.resolve(*rest_name));
                out.bindings.push((name, format!("{subject}.slice({})", elements.len())));
            }
        }
        Pattern::Tuple { elements, .. } => {
            for (index, element) in elements.iter().enumerate() {
                let accessor = format!("{subject}[{index}]");
                compile_into(element, &accessor, interner, out);
            }
        }
    }
}

fn compile_object_field(field: &ObjectPatternField<'_>, subject: &str, interner: &Interner, out: &mut CompiledPattern) {
    let key = interner.resolve(field.name);
    let accessor = format!("{subject}.{}", js_ident(key));
    match field.pattern {
        Some(nested) => compile_into(nested, &accessor, interner, out),
        None => out.bindings.push((js_ident(key), accessor)),
    }
}

fn literal_js(literal: &Literal<'_>, interner: &Interner) -> String {
    match literal {
        Literal::Number(sym) => interner.resolve(*sym).to_string(),
        Literal::String(sym) => js_string_literal(interner.resolve(*sym)),
        Literal::Template(_) => "\"\"".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Nil => "null".to_string(),
    }
}

/// Range pattern bounds are themselves nested `Pattern`s, but only the
/// `Literal` shape is meaningful there; anything else signals a malformed
/// range the parser should already have rejected.
fn pattern_literal_js(pattern: &Pattern<'_>, interner: &Interner) -> String {
    match pattern {
        Pattern::Literal { value, .. } => literal_js(value, interner),
        _ => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    fn emit_shared(source: &str) -> String {
        let arenas: &'static tova_ast::Arenas<'static> = Box::leak(Box::new(tova_ast::Arenas::new()));
        let mut interner = tova_base::Interner::new();
        let file = interner.intern("test.tova");
        let registry = tova_registry::BlockRegistry::standard();
        let tokens = tova_lexer::tokenize(source, &mut interner).expect("lexing should succeed");
        let outcome = tova_parser::parse_program(&tokens, file, arenas, &mut interner, &registry, false).expect("parse should succeed");
        let compiled = crate::compile_program(&outcome.program, &interner);
        compiled.shared.expect("module-mode compile always populates shared")
    }

    #[test]
    fn variant_pattern_checks_the_runtime_tag() {
        let source = "\
pub fn describe(r) {\n\
  match r {\n\
    Ok(v) => {\n\
      return v\n\
    }\n\
    Err(e) => {\n\
      return e\n\
    }\n\
  }\n\
}\n";
        let js = emit_shared(source);
        assert!(js.contains("__matchTag("), "matching a built-in sum-type variant should check its runtime tag");
        assert!(js.contains("\"Ok\"") || js.contains("'Ok'"));
        assert!(js.contains("\"Err\"") || js.contains("'Err'"));
    }

    #[test]
    fn array_pattern_with_rest_checks_length_and_slices_the_remainder() {
        let source = "\
pub fn head_tail(xs) {\n\
  match xs {\n\
    [first, ...rest] => {\n\
      return first\n\
    }\n\
  }\n\
}\n";
        let js = emit_shared(source);
        assert!(js.contains("Array.isArray("));
        assert!(js.contains(".length >= 1"));
        assert!(js.contains(".slice(1)"));
    }

    #[test]
    fn literal_pattern_compiles_to_strict_equality() {
        let source = "\
pub fn classify(n) {\n\
  match n {\n\
    0 => {\n\
      return \"zero\"\n\
    }\n\
    _ => {\n\
      return \"other\"\n\
    }\n\
  }\n\
}\n";
        let js = emit_shared(source);
        assert!(js.contains("=== 0"));
    }
}
