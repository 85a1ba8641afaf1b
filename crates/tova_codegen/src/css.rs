//! CSS scoping (spec §4.4 "CSS scoping").
//!
//! A plain `&str -> String` text transform, called from `browser::emit_component`
//! for a component's nested `style` block — see the Open Question decisions
//! in `DESIGN.md` for why the AST carries the CSS as raw text rather than a
//! parsed stylesheet.
//!
//! Given a stylesheet and the hash of its owning component, every
//! non-`:global(...)` selector gets an `[data-tova-<hash>]` attribute
//! appended to its rightmost compound selector, matching how scoped CSS
//! libraries avoid rewriting descendant combinators. `@media`/`@supports`/
//! `@layer` bodies are scoped recursively; their own prelude is left
//! alone. `@keyframes` bodies are left entirely verbatim — `from`/`to`/
//! percentage blocks aren't selectors, so recursing into them the same way
//! would scope the keyframe names themselves.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// An 8-hex-digit id derived from the component name and its raw CSS text,
/// stable across runs given the same inputs.
pub fn scope_id(component_name: &str, css: &str) -> String {
    let mut hasher = DefaultHasher::new();
    component_name.hash(&mut hasher);
    css.hash(&mut hasher);
    format!("{:08x}", (hasher.finish() & 0xffff_ffff) as u32)
}

/// Rewrites `css` so every rule is scoped to `[data-tova-<id>]`, and
/// returns the rewritten stylesheet alongside the id used.
pub fn scope_stylesheet(component_name: &str, css: &str) -> (String, String) {
    let id = scope_id(component_name, css);
    let scoped = scope_block(css, &id);
    (id, scoped)
}

fn scope_block(css: &str, id: &str) -> String {
    let mut out = String::with_capacity(css.len() + css.len() / 4);
    let bytes = css.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match find_rule_boundaries(css, i) {
            Some((prelude, body_start, body_end, rest_start)) => {
                let prelude_trimmed = prelude.trim();
                if prelude_trimmed.starts_with('@') {
                    out.push_str(prelude);
                    out.push('{');
                    let inner = &css[body_start + 1..body_end];
                    if is_keyframes_at_rule(prelude_trimmed) {
                        // `from`/`to`/`50%` blocks aren't selectors; scoping
                        // them would rewrite keyframe names into attribute
                        // selectors, so the body is left verbatim.
                        out.push_str(inner);
                    } else {
                        out.push_str(&scope_block(inner, id));
                    }
                    out.push('}');
                } else {
                    out.push_str(&scope_selector_list(prelude_trimmed, id));
                    out.push_str(" {");
                    out.push_str(&css[body_start + 1..body_end]);
                    out.push('}');
                }
                i = rest_start;
            }
            None => {
                out.push_str(&css[i..]);
                break;
            }
        }
    }
    out
}

/// Finds the next `prelude { body }` rule starting at or after `from`.
/// Returns `(prelude, body_start_index_of_'{', body_end_index_of_'}', index_after_'}')`.
fn find_rule_boundaries(css: &str, from: usize) -> Option<(&str, usize, usize, usize)> {
    let open = css[from..].find('{')? + from;
    let mut depth = 1usize;
    let mut close = open + 1;
    for (offset, ch) in css[open + 1..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = open + 1 + offset;
                    break;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    Some((&css[from..open], open, close, close + 1))
}

fn is_keyframes_at_rule(prelude: &str) -> bool {
    let name = prelude.split_whitespace().next().unwrap_or("");
    name == "@keyframes" || name.ends_with("-keyframes")
}

/// Scopes a comma-separated selector list, leaving `:global(...)`
/// selectors untouched (stripping the wrapper itself).
fn scope_selector_list(selectors: &str, id: &str) -> String {
    selectors
        .split(',')
        .map(|s| scope_one_selector(s.trim(), id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn scope_one_selector(selector: &str, id: &str) -> String {
    if let Some(inner) = selector.strip_prefix(":global(").and_then(|s| s.strip_suffix(')')) {
        return inner.to_string();
    }
    // Append the scope attribute to the rightmost compound selector only
    // (after the last combinator), leaving ancestor selectors unscoped so
    // descendant matches still work against unscoped markup from slots.
    match selector.rfind(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~') {
        Some(split) => {
            let (head, tail) = selector.split_at(split + 1);
            format!("{head}{}", append_attr(tail, id))
        }
        None => append_attr(selector, id),
    }
}

/// Inserts the scope attribute before a compound selector's first
/// pseudo-class/pseudo-element (`:hover`, `::before`, ...) rather than
/// after it, so the attribute still matches the base element/class.
fn append_attr(compound: &str, id: &str) -> String {
    match compound.find(':') {
        Some(pos) => {
            let (base, pseudo_part) = compound.split_at(pos);
            format!("{base}[data-tova-{id}]{pseudo_part}")
        }
        None => format!("{compound}[data-tova-{id}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_simple_selector() {
        let (id, out) = scope_stylesheet("Card", "p { color: red; }");
        assert_eq!(out, format!("p[data-tova-{id}] {{ color: red; }}"));
    }

    #[test]
    fn leaves_global_selectors_unwrapped() {
        let (_, out) = scope_stylesheet("Card", ":global(body) { margin: 0; }");
        assert_eq!(out, "body { margin: 0; }");
    }

    #[test]
    fn scopes_inside_media_query() {
        let (id, out) = scope_stylesheet("Card", "@media (min-width: 1px) { p { color: red; } }");
        assert_eq!(out, format!("@media (min-width: 1px) {{p[data-tova-{id}] {{ color: red; }}}}"));
    }

    #[test]
    fn stable_id_for_same_input() {
        let a = scope_id("Card", "p { color: red; }");
        let b = scope_id("Card", "p { color: red; }");
        assert_eq!(a, b);
    }

    #[test]
    fn keyframes_inner_selectors_are_left_unscoped() {
        let (_, out) = scope_stylesheet("Card", "@keyframes spin { from { } to { } }");
        assert_eq!(out, "@keyframes spin { from { } to { } }");
    }

    #[test]
    fn scope_attribute_precedes_pseudo_class() {
        let (id, out) = scope_stylesheet("Card", ".card:hover { color: red }");
        assert_eq!(out, format!(".card[data-tova-{id}]:hover {{ color: red }}"));
    }

    #[test]
    fn distinct_inputs_produce_distinct_ids() {
        let a = scope_id("Card", "p { color: red; }");
        let b = scope_id("Card", "p { color: blue; }");
        assert_ne!(a, b);
    }
}
