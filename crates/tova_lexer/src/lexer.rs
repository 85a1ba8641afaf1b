//! The Tova tokenizer.
//!
//! [`tokenize`] consumes a source string and filename-bearing [`Interner`]
//! symbol table and produces a token vector terminated by [`TokenKind::Eof`].
//! The lexer is stateless between runs: each call to [`tokenize`] starts
//! fresh, and failures are fatal (unlike the parser/analyzer, which can run
//! in a tolerant, accumulate-and-continue mode).

use tova_base::{Interner, LocatedError, Position, Result, Symbol};

use crate::keyword::lookup_keyword;
use crate::token::{StringPart, StringTemplate, Token, TokenKind};

/// Tokenizes `source`, interning identifiers and string text into `interner`.
pub fn tokenize(source: &str, interner: &mut Interner) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    lexer.run(interner)
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    position: Position,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            position: Position::start(),
        }
    }

    fn run(&mut self, interner: &mut Interner) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token(interner)?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.position.advance_line();
        } else {
            self.position.advance_column(1);
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut offset = 0;
        for expected in s.chars() {
            if self.peek_at(offset) != Some(expected) {
                return false;
            }
            offset += 1;
        }
        true
    }

    fn error(&self, message: impl Into<String>) -> LocatedError {
        LocatedError::new(message, self.position)
    }

    /// Produces the next token, skipping whitespace (but not newlines) and
    /// comments first.
    fn next_token(&mut self, interner: &mut Interner) -> Result<Token> {
        loop {
            match self.peek() {
                None => return Ok(Token::new(TokenKind::Eof, Symbol::EMPTY, self.position)),
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    let start = self.position;
                    self.advance();
                    return Ok(Token::new(TokenKind::Newline, Symbol::EMPTY, start));
                }
                Some('/') if self.peek_at(1) == Some('/') && self.peek_at(2) == Some('/') => {
                    return self.lex_docstring(interner);
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    self.skip_line_comment();
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment()?;
                }
                Some(c) if c.is_ascii_digit() => return self.lex_number(interner),
                Some('"') => return self.lex_double_quoted(interner, false),
                Some('\'') => return self.lex_single_quoted(interner),
                Some('f') if self.peek_at(1) == Some('"') => {
                    self.advance();
                    return self.lex_double_quoted(interner, true);
                }
                Some(c) if c.is_alphabetic() || c == '_' => return self.lex_identifier(interner),
                Some(_) => return self.lex_operator(interner),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn lex_docstring(&mut self, interner: &mut Interner) -> Result<Token> {
        let start = self.position;
        self.advance(); // /
        self.advance(); // /
        self.advance(); // /
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        let sym = interner.intern(text.trim());
        Ok(Token::new(TokenKind::Docstring, sym, start))
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.position;
        self.advance(); // /
        self.advance(); // *
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => return Err(self.error_at("unterminated block comment", start)),
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    fn error_at(&self, message: impl Into<String>, position: Position) -> LocatedError {
        LocatedError::new(message, position)
    }

    fn lex_number(&mut self, interner: &mut Interner) -> Result<Token> {
        let start = self.position;
        let mut text = String::new();

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X') | Some('b') | Some('B') | Some('o') | Some('O')) {
            text.push(self.advance().unwrap());
            text.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() || c == '_' {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let sym = interner.intern(&text);
            return Ok(Token::new(TokenKind::Number, sym, start));
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let save_pos = self.pos;
            let save_position = self.position;
            let mut exponent = String::new();
            exponent.push(self.advance().unwrap());
            if matches!(self.peek(), Some('+') | Some('-')) {
                exponent.push(self.advance().unwrap());
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() || c == '_' {
                        exponent.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                text.push_str(&exponent);
            } else {
                self.pos = save_pos;
                self.position = save_position;
            }
        }

        let sym = interner.intern(&text);
        Ok(Token::new(TokenKind::Number, sym, start))
    }

    fn lex_identifier(&mut self, interner: &mut Interner) -> Result<Token> {
        let start = self.position;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = lookup_keyword(&text).unwrap_or(TokenKind::Identifier);
        if kind == TokenKind::Style {
            if let Some(css) = self.try_lex_style_body(start)? {
                let sym = interner.intern(&css);
                return Ok(Token::new(TokenKind::RawCss, sym, start));
            }
        }
        let sym = interner.intern(&text);
        Ok(Token::new(kind, sym, start))
    }

    /// After a `style` keyword, consumes ` { ... }` verbatim as raw CSS
    /// text (brace-balanced, nested `@media`/`@keyframes` bodies included),
    /// skipping leading whitespace/newlines to find the opening brace.
    /// Returns `None`, consuming nothing, if no `{` precedes the next
    /// non-whitespace character — the caller then emits a bare `Style`
    /// token and normal tokenization continues.
    fn try_lex_style_body(&mut self, start: Position) -> Result<Option<String>> {
        let save_pos = self.pos;
        let save_position = self.position;
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r') | Some('\n')) {
            self.advance();
        }
        if self.peek() != Some('{') {
            self.pos = save_pos;
            self.position = save_position;
            return Ok(None);
        }
        self.advance(); // opening '{'
        let mut depth = 1usize;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at("unterminated style block", start)),
                Some('{') => {
                    depth += 1;
                    text.push('{');
                    self.advance();
                }
                Some('}') => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    text.push('}');
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Ok(Some(text))
    }

    fn lex_single_quoted(&mut self, interner: &mut Interner) -> Result<Token> {
        let start = self.position;
        self.advance(); // opening '
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at("unterminated string", start)),
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    text.push(self.lex_escape(start)?);
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        let sym = interner.intern(&text);
        Ok(Token::new(TokenKind::String, sym, start))
    }

    /// Lexes a `"..."` or `"""..."""` string, handling `{expr}` interpolation
    /// and, for triple-quoted strings, dedenting inner lines.
    fn lex_double_quoted(&mut self, interner: &mut Interner, _is_f_string: bool) -> Result<Token> {
        let start = self.position;
        let triple = self.starts_with("\"\"\"");
        if triple {
            self.advance();
            self.advance();
            self.advance();
        } else {
            self.advance();
        }

        let dedent = if triple { self.lookahead_triple_dedent() } else { 0 };

        let mut parts: Vec<StringPart> = Vec::new();
        let mut current_text = String::new();
        let mut at_line_start = false;

        if triple && self.peek() == Some('\n') {
            self.advance();
            at_line_start = true;
        }

        loop {
            if at_line_start {
                let mut skipped = 0;
                while skipped < dedent && matches!(self.peek(), Some(' ') | Some('\t')) {
                    self.advance();
                    skipped += 1;
                }
                at_line_start = false;
            }

            let closing = if triple { self.starts_with("\"\"\"") } else { self.peek() == Some('"') };
            if closing {
                if triple {
                    self.advance();
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                }
                if current_text.ends_with('\n') && triple {
                    current_text.pop();
                }
                break;
            }

            match self.peek() {
                None => return Err(self.error_at("unterminated string", start)),
                Some('\n') if !triple => return Err(self.error_at("unterminated string", start)),
                Some('\n') => {
                    current_text.push('\n');
                    self.advance();
                    at_line_start = true;
                }
                Some('\\') => {
                    self.advance();
                    current_text.push(self.lex_escape(start)?);
                }
                Some('{') => {
                    if !current_text.is_empty() || parts.is_empty() {
                        parts.push(StringPart::Text(std::mem::take(&mut current_text)));
                    }
                    self.advance();
                    let expr_tokens = self.lex_interpolation_expr(interner, start)?;
                    parts.push(StringPart::Expr(expr_tokens));
                }
                Some(c) => {
                    current_text.push(c);
                    self.advance();
                }
            }
        }

        if !current_text.is_empty() || parts.is_empty() {
            parts.push(StringPart::Text(current_text));
        }

        let template = StringTemplate { parts };
        let sym = interner.intern("");
        Ok(Token::with_template(TokenKind::StringTemplate, sym, start, template))
    }

    /// Scans ahead (without consuming) from just past the opening `"""` to
    /// find the minimum leading whitespace of non-empty inner lines.
    fn lookahead_triple_dedent(&self) -> usize {
        let mut offset = 0usize;
        let mut lines: Vec<String> = vec![String::new()];
        loop {
            let c = match self.peek_at(offset) {
                Some(c) => c,
                None => break,
            };
            if c == '"' && self.peek_at(offset + 1) == Some('"') && self.peek_at(offset + 2) == Some('"') {
                break;
            }
            if c == '\\' {
                offset += 1;
                if self.peek_at(offset).is_some() {
                    offset += 1;
                }
                continue;
            }
            if c == '\n' {
                lines.push(String::new());
            } else {
                lines.last_mut().unwrap().push(c);
            }
            offset += 1;
        }

        // Drop the first and last line: those hold the content surrounding
        // the stripped leading/trailing newline, not an "inner" line.
        let inner = if lines.len() > 2 { &lines[1..lines.len() - 1] } else { &lines[..] };

        inner
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.chars().take_while(|c| *c == ' ' || *c == '\t').count())
            .min()
            .unwrap_or(0)
    }

    fn lex_escape(&mut self, string_start: Position) -> Result<char> {
        match self.advance() {
            None => Err(self.error_at("unterminated string", string_start)),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('{') => Ok('{'),
            Some(other) => Ok(other),
        }
    }

    /// Recursively tokenizes a `{expr}` interpolation body, stopping at the
    /// matching `}` (tracking nested braces and strings).
    fn lex_interpolation_expr(&mut self, interner: &mut Interner, string_start: Position) -> Result<Vec<Token>> {
        let mut depth = 1usize;
        let mut body = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at("unterminated interpolation", string_start)),
                Some('{') => {
                    depth += 1;
                    body.push(self.advance().unwrap());
                }
                Some('}') => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    body.push('}');
                }
                Some('"') => {
                    let qstart = self.pos;
                    let quote_position = self.position;
                    self.advance();
                    body.push('"');
                    loop {
                        match self.peek() {
                            None => return Err(self.error_at("unterminated interpolation", string_start)),
                            Some('"') => {
                                body.push(self.advance().unwrap());
                                break;
                            }
                            Some('\\') => {
                                body.push(self.advance().unwrap());
                                if let Some(c) = self.peek() {
                                    body.push(c);
                                    self.advance();
                                }
                            }
                            Some(c) => {
                                body.push(c);
                                self.advance();
                            }
                        }
                    }
                    let _ = (qstart, quote_position);
                }
                Some(c) => {
                    body.push(c);
                    self.advance();
                }
            }
        }
        tokenize(&body, interner)
    }

    fn lex_operator(&mut self, interner: &mut Interner) -> Result<Token> {
        let start = self.position;

        const THREE: &[(&str, TokenKind)] = &[("..=", TokenKind::DotDotEq), ("...", TokenKind::DotDotDot)];
        const TWO: &[(&str, TokenKind)] = &[
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
            ("&&", TokenKind::AmpAmp),
            ("||", TokenKind::PipePipe),
            ("|>", TokenKind::PipeForward),
            ("**", TokenKind::StarStar),
            ("::", TokenKind::ColonColon),
            ("?.", TokenKind::QuestionDot),
            ("??", TokenKind::QuestionQuestion),
            ("=>", TokenKind::FatArrow),
            ("->", TokenKind::Arrow),
            ("..", TokenKind::DotDot),
        ];
        const ONE: &[(char, TokenKind)] = &[
            ('<', TokenKind::Lt),
            ('>', TokenKind::Gt),
            ('=', TokenKind::Eq),
            ('+', TokenKind::Plus),
            ('-', TokenKind::Minus),
            ('*', TokenKind::Star),
            ('/', TokenKind::Slash),
            ('%', TokenKind::Percent),
            ('!', TokenKind::Bang),
            ('.', TokenKind::Dot),
            (':', TokenKind::Colon),
            ('?', TokenKind::Question),
            ('(', TokenKind::LParen),
            (')', TokenKind::RParen),
            ('{', TokenKind::LBrace),
            ('}', TokenKind::RBrace),
            ('[', TokenKind::LBracket),
            (']', TokenKind::RBracket),
            (',', TokenKind::Comma),
            (';', TokenKind::Semicolon),
        ];

        for (text, kind) in THREE {
            if self.starts_with(text) {
                for _ in 0..3 {
                    self.advance();
                }
                let sym = interner.intern(text);
                return Ok(Token::new(*kind, sym, start));
            }
        }
        for (text, kind) in TWO {
            if self.starts_with(text) {
                self.advance();
                self.advance();
                let sym = interner.intern(text);
                return Ok(Token::new(*kind, sym, start));
            }
        }

        if self.peek() == Some('&') {
            return Err(self.error("bare '&' is not an operator; did you mean '&&'?"));
        }
        if self.peek() == Some('|') {
            return Err(self.error("bare '|' is not an operator; did you mean '||'?"));
        }

        if let Some(c) = self.peek() {
            if let Some((_, kind)) = ONE.iter().find(|(ch, _)| *ch == c) {
                self.advance();
                let sym = interner.intern(&c.to_string());
                return Ok(Token::new(*kind, sym, start));
            }
        }

        Err(self.error(format!("unexpected character '{}'", self.peek().unwrap_or('\0'))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        tokenize(source, &mut interner).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_emits_newline() {
        assert_eq!(kinds("  a \n b"), vec![Identifier, Newline, Identifier, Eof]);
    }

    #[test]
    fn line_comment_discarded() {
        assert_eq!(kinds("a // comment\nb"), vec![Identifier, Newline, Identifier, Eof]);
    }

    #[test]
    fn docstring_emits_token_with_trimmed_text() {
        let mut interner = Interner::new();
        let toks = tokenize("/// hello world", &mut interner).unwrap();
        assert_eq!(toks[0].kind, Docstring);
        assert_eq!(interner.resolve(toks[0].value), "hello world");
    }

    #[test]
    fn block_comment_nests() {
        assert_eq!(kinds("a /* outer /* inner */ still outer */ b"), vec![Identifier, Identifier, Eof]);
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        let mut interner = Interner::new();
        assert!(tokenize("/* never closes", &mut interner).is_err());
    }

    #[test]
    fn keyword_reclassifies_identifier() {
        assert_eq!(kinds("fn server state"), vec![Fn, Server, State, Eof]);
    }

    #[test]
    fn decimal_number_with_underscores_and_exponent() {
        let mut interner = Interner::new();
        let toks = tokenize("1_000.25e-3", &mut interner).unwrap();
        assert_eq!(toks[0].kind, Number);
        assert_eq!(interner.resolve(toks[0].value), "1_000.25e-3");
    }

    #[test]
    fn hex_binary_octal_prefixes() {
        assert_eq!(kinds("0xFF 0b101 0o17"), vec![Number, Number, Number, Eof]);
    }

    #[test]
    fn leading_minus_is_a_separate_operator() {
        assert_eq!(kinds("-5"), vec![Minus, Number, Eof]);
    }

    #[test]
    fn single_quoted_string_never_interpolates() {
        let mut interner = Interner::new();
        let toks = tokenize("'a{b}'", &mut interner).unwrap();
        assert_eq!(toks[0].kind, String);
        assert_eq!(interner.resolve(toks[0].value), "a{b}");
    }

    #[test]
    fn double_quoted_string_supports_escapes() {
        let mut interner = Interner::new();
        let toks = tokenize(r#""line1\nline2""#, &mut interner).unwrap();
        let template = toks[0].template.as_ref().unwrap();
        match &template.parts[0] {
            StringPart::Text(t) => assert_eq!(t, "line1\nline2"),
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn double_quoted_string_interpolates_expr() {
        let mut interner = Interner::new();
        let toks = tokenize(r#""hi {name}!""#, &mut interner).unwrap();
        let template = toks[0].template.as_ref().unwrap();
        assert!(template.has_interpolation());
        assert_eq!(template.parts.len(), 3);
        match &template.parts[1] {
            StringPart::Expr(exprs) => assert_eq!(exprs[0].kind, Identifier),
            _ => panic!("expected expr part"),
        }
    }

    #[test]
    fn f_string_is_identical_to_double_quoted() {
        let mut interner = Interner::new();
        let toks = tokenize(r#"f"hi {name}""#, &mut interner).unwrap();
        assert_eq!(toks[0].kind, StringTemplate);
        assert!(toks[0].template.as_ref().unwrap().has_interpolation());
    }

    #[test]
    fn triple_quoted_strips_leading_and_trailing_newline() {
        let mut interner = Interner::new();
        let toks = tokenize("\"\"\"\nhello\n\"\"\"", &mut interner).unwrap();
        let template = toks[0].template.as_ref().unwrap();
        match &template.parts[0] {
            StringPart::Text(t) => assert_eq!(t, "hello"),
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn triple_quoted_dedents_by_minimum_common_indent() {
        let mut interner = Interner::new();
        let source = "\"\"\"\n    line one\n    line two\n\"\"\"";
        let toks = tokenize(source, &mut interner).unwrap();
        let template = toks[0].template.as_ref().unwrap();
        match &template.parts[0] {
            StringPart::Text(t) => assert_eq!(t, "line one\nline two"),
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let mut interner = Interner::new();
        assert!(tokenize("\"never closes", &mut interner).is_err());
    }

    #[test]
    fn maximal_munch_operators() {
        assert_eq!(
            kinds("== != <= >= += -= *= /= && || |> ** :: ?. ?? => -> .. ..= ..."),
            vec![
                EqEq, NotEq, LtEq, GtEq, PlusEq, MinusEq, StarEq, SlashEq, AmpAmp, PipePipe,
                PipeForward, StarStar, ColonColon, QuestionDot, QuestionQuestion, FatArrow, Arrow,
                DotDot, DotDotEq, DotDotDot, Eof
            ]
        );
    }

    #[test]
    fn bare_ampersand_is_an_error() {
        let mut interner = Interner::new();
        let err = tokenize("a & b", &mut interner).unwrap_err();
        assert!(err.message.contains("&&"));
    }

    #[test]
    fn bare_pipe_is_an_error() {
        let mut interner = Interner::new();
        let err = tokenize("a | b", &mut interner).unwrap_err();
        assert!(err.message.contains("||"));
    }

    #[test]
    fn single_char_delimiters_and_punctuation() {
        assert_eq!(kinds("(){}[],;:?.!"), vec![
            LParen, RParen, LBrace, RBrace, LBracket, RBracket, Comma, Semicolon, Colon, Question, Dot, Bang, Eof
        ]);
    }
}
