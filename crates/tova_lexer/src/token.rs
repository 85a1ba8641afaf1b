//! Token types for the Tova lexer and parser.
//!
//! This module defines the vocabulary of Tova at the token level: the
//! keyword table, the operator grid, and the two string-literal token
//! shapes (plain and template).
//!
//! ## Token Categories
//!
//! | Category | Examples |
//! |----------|----------|
//! | **Keywords** | `fn`, `state`, `route`, `match` |
//! | **Operators** | `+= |> ?. ?? ..=` |
//! | **Delimiters** | `( ) { } [ ] , ;` |
//! | **Literals** | numbers, strings, string templates |

use tova_base::{Position, Symbol};

/// A keyword or punctuation/literal tag. Reclassification from
/// [`TokenKind::Identifier`] to a keyword variant happens once, against the
/// keyword table in [`crate::keyword::lookup_keyword`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    /// Single-quoted string: accepts escapes, never interpolates.
    String,
    /// Double-quoted, triple-quoted, or `f"..."` string; carries a
    /// [`StringTemplate`] payload even when it has no `{expr}` parts.
    StringTemplate,
    /// A `///` doc comment line.
    Docstring,
    /// A `style { ... }` block's body, captured verbatim (brace-balanced,
    /// not tokenized as Tova source) by the lexer the moment it sees
    /// `style` followed by `{`; the token's value is the raw CSS text with
    /// the outer braces stripped.
    RawCss,
    Identifier,

    // Keywords
    Var,
    Let,
    Fn,
    Return,
    If,
    Elif,
    Else,
    For,
    While,
    Loop,
    Match,
    Type,
    Trait,
    Interface,
    Impl,
    Import,
    From,
    Export,
    Pub,
    As,
    And,
    Or,
    Not,
    In,
    Is,
    True,
    False,
    Nil,
    Server,
    Browser,
    Client,
    Shared,
    Route,
    Middleware,
    State,
    Computed,
    Effect,
    Component,
    Store,
    Style,
    Test,
    Bench,
    With,
    Defer,
    Guard,
    Async,
    Await,
    Yield,
    Break,
    Continue,

    // Comparison / equality
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    Lt,
    Gt,
    Eq,

    // Compound assignment
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,

    // Logical
    AmpAmp,
    PipePipe,
    Bang,

    /// `|>` pipe operator.
    PipeForward,

    // Dots / ranges
    Dot,
    DotDot,
    DotDotEq,
    DotDotDot,

    // Colons
    ColonColon,
    Colon,

    // Optional chain / nil-coalesce / propagation
    QuestionDot,
    QuestionQuestion,
    Question,

    // Arrows
    FatArrow,
    Arrow,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,

    Newline,
    Eof,
}

impl TokenKind {
    /// Reserved words recognized by [`crate::keyword::lookup_keyword`],
    /// matching spec §4.1 verbatim.
    pub const KEYWORDS: &'static [(&'static str, TokenKind)] = &[
        ("var", TokenKind::Var),
        ("let", TokenKind::Let),
        ("fn", TokenKind::Fn),
        ("return", TokenKind::Return),
        ("if", TokenKind::If),
        ("elif", TokenKind::Elif),
        ("else", TokenKind::Else),
        ("for", TokenKind::For),
        ("while", TokenKind::While),
        ("loop", TokenKind::Loop),
        ("match", TokenKind::Match),
        ("type", TokenKind::Type),
        ("trait", TokenKind::Trait),
        ("interface", TokenKind::Interface),
        ("impl", TokenKind::Impl),
        ("import", TokenKind::Import),
        ("from", TokenKind::From),
        ("export", TokenKind::Export),
        ("pub", TokenKind::Pub),
        ("as", TokenKind::As),
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("not", TokenKind::Not),
        ("in", TokenKind::In),
        ("is", TokenKind::Is),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("nil", TokenKind::Nil),
        ("server", TokenKind::Server),
        ("browser", TokenKind::Browser),
        ("client", TokenKind::Client),
        ("shared", TokenKind::Shared),
        ("route", TokenKind::Route),
        ("middleware", TokenKind::Middleware),
        ("state", TokenKind::State),
        ("computed", TokenKind::Computed),
        ("effect", TokenKind::Effect),
        ("component", TokenKind::Component),
        ("store", TokenKind::Store),
        ("style", TokenKind::Style),
        ("test", TokenKind::Test),
        ("bench", TokenKind::Bench),
        ("with", TokenKind::With),
        ("defer", TokenKind::Defer),
        ("guard", TokenKind::Guard),
        ("async", TokenKind::Async),
        ("await", TokenKind::Await),
        ("yield", TokenKind::Yield),
        ("break", TokenKind::Break),
        ("continue", TokenKind::Continue),
    ];

    /// `true` for keywords that may also head a top-level block
    /// (`server`, `browser`, `shared`, `test`, `bench`); the block registry
    /// checks for these during top-level dispatch (spec §4.2).
    pub fn is_keyword_block_head(self) -> bool {
        matches!(
            self,
            TokenKind::Server | TokenKind::Browser | TokenKind::Shared | TokenKind::Test | TokenKind::Bench
        )
    }
}

/// One part of a [`StringTemplate`]: literal text or a nested expression.
#[derive(Debug, Clone)]
pub enum StringPart {
    Text(String),
    /// A nested token sub-stream for `{expr}`, lexed with the same rules
    /// as the top-level source (spec §3: "each `expr` part holds a nested
    /// token stream lexed with the same rules").
    Expr(Vec<Token>),
}

/// The payload of a [`TokenKind::StringTemplate`] token: a non-empty,
/// alternating sequence of text and expression parts.
#[derive(Debug, Clone, Default)]
pub struct StringTemplate {
    pub parts: Vec<StringPart>,
}

impl StringTemplate {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            parts: vec![StringPart::Text(text.into())],
        }
    }

    /// `true` if any part is an interpolated expression rather than plain text.
    pub fn has_interpolation(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, StringPart::Expr(_)))
    }
}

/// An immutable lexed token: `{kind, value, line, column}` (spec §3).
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw lexeme for identifiers/keywords/operators, the textual
    /// literal for numbers, or the interned empty symbol for tokens with
    /// no meaningful text (`Newline`, `Eof`).
    pub value: Symbol,
    pub position: Position,
    /// Present only for `StringTemplate` tokens.
    pub template: Option<StringTemplate>,
}

impl Token {
    pub fn new(kind: TokenKind, value: Symbol, position: Position) -> Self {
        Self {
            kind,
            value,
            position,
            template: None,
        }
    }

    pub fn with_template(kind: TokenKind, value: Symbol, position: Position, template: StringTemplate) -> Self {
        Self {
            kind,
            value,
            position,
            template: Some(template),
        }
    }

    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_base::Interner;

    #[test]
    fn token_carries_line_and_column() {
        let mut interner = Interner::new();
        let sym = interner.intern("x");
        let tok = Token::new(TokenKind::Identifier, sym, Position::new(3, 4));
        assert_eq!(tok.line(), 3);
        assert_eq!(tok.column(), 4);
    }

    #[test]
    fn keywords_table_contains_all_listed_reserved_words() {
        let names: Vec<&str> = TokenKind::KEYWORDS.iter().map(|(s, _)| *s).collect();
        for kw in [
            "var", "let", "fn", "return", "if", "elif", "else", "for", "while", "loop", "match",
            "type", "trait", "interface", "impl", "import", "from", "export", "pub", "as", "and",
            "or", "not", "in", "is", "true", "false", "nil", "server", "browser", "client",
            "shared", "route", "middleware", "state", "computed", "effect", "component", "store",
            "test", "bench", "with", "defer", "guard", "async", "await", "yield", "break",
            "continue",
        ] {
            assert!(names.contains(&kw), "missing keyword: {kw}");
        }
    }

    #[test]
    fn string_template_text_only_has_no_interpolation() {
        let t = StringTemplate::text_only("hello");
        assert!(!t.has_interpolation());
    }

    #[test]
    fn is_keyword_block_head_flags_block_keywords() {
        assert!(TokenKind::Server.is_keyword_block_head());
        assert!(TokenKind::Browser.is_keyword_block_head());
        assert!(!TokenKind::Fn.is_keyword_block_head());
    }
}
