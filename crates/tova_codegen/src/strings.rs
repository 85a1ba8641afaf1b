//! String/identifier escaping shared by every emission pass.

/// Wraps `text` as a double-quoted JS string literal, escaping the
/// characters that would otherwise break out of it. Source strings are
/// already unescaped by the lexer, so this is the one place that needs to
/// re-escape for JS's own grammar.
pub fn js_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Wraps `text` as a backtick template literal body segment, escaping only
/// what would break out of a template literal (backtick and `${`).
pub fn js_template_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reserved JS identifiers that need a suffix when used as bare source
/// identifiers (Tova's own keyword set is disjoint from JS's, but a few
/// stdlib-sounding names collide).
const JS_RESERVED: &[&str] = &[
    "delete", "new", "class", "extends", "super", "this", "typeof", "instanceof", "void", "in",
    "of", "function", "var", "let", "const", "export", "import", "default", "yield", "debugger",
];

/// Mangles `name` if it collides with a JS reserved word the Tova grammar
/// itself doesn't reserve.
pub fn js_ident(name: &str) -> String {
    if JS_RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}
