//! Pattern grammar: `match` arms, `let` destructuring, and `for` bindings.

use tova_ast::{Literal, ObjectPatternField, Pattern};
use tova_base::{DiagnosticCode, Symbol};
use tova_lexer::TokenKind;

use crate::parser::Parser;

pub trait PatternParsing<'src, 'a> {
    fn parse_pattern(&mut self) -> Result<Pattern<'a>, ()>;
}

impl<'src, 'a> PatternParsing<'src, 'a> for Parser<'src, 'a> {
    fn parse_pattern(&mut self) -> Result<Pattern<'a>, ()> {
        let base = self.parse_pattern_primary()?;
        if self.check(TokenKind::DotDot) || self.check(TokenKind::DotDotEq) {
            let inclusive = self.check(TokenKind::DotDotEq);
            let location = self.current_location();
            self.advance();
            let high = self.parse_pattern_primary()?;
            return Ok(Pattern::Range {
                low: self.arenas.patterns.alloc(base),
                high: self.arenas.patterns.alloc(high),
                inclusive,
                location,
            });
        }
        Ok(base)
    }
}

impl<'src, 'a> Parser<'src, 'a> {
    fn parse_pattern_primary(&mut self) -> Result<Pattern<'a>, ()> {
        let location = self.current_location();
        match self.peek_kind() {
            TokenKind::Identifier => {
                let text = self.resolve(self.peek().value);
                if text == "_" {
                    self.advance();
                    return Ok(Pattern::Wildcard { location });
                }
                let name = self.peek().value;
                // An uppercase-leading identifier followed by `(` is a
                // variant constructor pattern; everything else is a binding.
                let is_variant_shape = text.starts_with(|c: char| c.is_uppercase())
                    && matches!(self.kind_at(1), TokenKind::LParen);
                self.advance();
                if is_variant_shape {
                    self.expect(TokenKind::LParen, "expected '(' after variant pattern name")?;
                    let mut fields = Vec::new();
                    while !self.check(TokenKind::RParen) && !self.is_at_end() {
                        fields.push(self.parse_pattern()?);
                        if !self.check(TokenKind::RParen) {
                            self.expect(TokenKind::Comma, "expected ',' between variant pattern fields")?;
                        }
                    }
                    self.expect(TokenKind::RParen, "expected ')' to close variant pattern")?;
                    let fields = self.arenas.patterns.alloc_slice(fields);
                    return Ok(Pattern::Variant { name, fields, location });
                }
                if text.starts_with(|c: char| c.is_uppercase()) {
                    return Ok(Pattern::Variant { name, fields: &[], location });
                }
                Ok(Pattern::Binding { name, location })
            }
            TokenKind::Number => {
                let sym = self.peek().value;
                self.advance();
                Ok(Pattern::Literal { value: Literal::Number(sym), location })
            }
            TokenKind::String => {
                let sym = self.peek().value;
                self.advance();
                Ok(Pattern::Literal { value: Literal::String(sym), location })
            }
            TokenKind::StringTemplate => {
                // Block names and simple string patterns never interpolate
                // in pattern position; `a + rest` string-concat patterns are
                // written with the `+` operator, not interpolation syntax.
                let sym = self.expect_plain_string()?;
                if self.check(TokenKind::Plus) {
                    self.advance();
                    let rest_tok = self.expect(TokenKind::Identifier, "expected identifier after '+' in string-concat pattern")?.clone();
                    return Ok(Pattern::StringConcat { prefix: sym, rest: rest_tok.value, location });
                }
                Ok(Pattern::Literal { value: Literal::String(sym), location })
            }
            TokenKind::True => {
                self.advance();
                Ok(Pattern::Literal { value: Literal::Bool(true), location })
            }
            TokenKind::False => {
                self.advance();
                Ok(Pattern::Literal { value: Literal::Bool(false), location })
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Pattern::Literal { value: Literal::Nil, location })
            }
            TokenKind::Minus => {
                // Negative numeric literal pattern.
                self.advance();
                let num = self.expect(TokenKind::Number, "expected number after unary '-' in pattern")?.clone();
                let text = format!("-{}", self.resolve(num.value));
                let sym = self.interner.intern(&text);
                Ok(Pattern::Literal { value: Literal::Number(sym), location })
            }
            TokenKind::LBrace => self.parse_object_pattern(location),
            TokenKind::LBracket => self.parse_array_pattern(location),
            TokenKind::LParen => self.parse_tuple_pattern(location),
            _ => self.error(DiagnosticCode::IllegalPattern, format!("unexpected token in pattern position: {:?}", self.peek_kind())),
        }
    }

    fn parse_object_pattern(&mut self, location: tova_base::Location) -> Result<Pattern<'a>, ()> {
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_newlines();
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let field_location = self.current_location();
            let name_tok = self.expect(TokenKind::Identifier, "expected field name in object pattern")?.clone();
            let pattern = if self.check(TokenKind::Colon) {
                self.advance();
                Some(self.arenas.patterns.alloc(self.parse_pattern()?))
            } else {
                None
            };
            fields.push(ObjectPatternField { name: name_tok.value, pattern, location: field_location });
            self.skip_newlines();
            if !self.check(TokenKind::RBrace) {
                self.expect(TokenKind::Comma, "expected ',' between object pattern fields")?;
                self.skip_newlines();
            }
        }
        self.expect(TokenKind::RBrace, "expected '}' to close object pattern")?;
        let fields = self.arenas.patterns.alloc_slice(fields);
        Ok(Pattern::Object { fields, location })
    }

    fn parse_array_pattern(&mut self, location: tova_base::Location) -> Result<Pattern<'a>, ()> {
        self.expect(TokenKind::LBracket, "expected '['")?;
        let mut elements = Vec::new();
        let mut rest: Option<Symbol> = None;
        while !self.check(TokenKind::RBracket) && !self.is_at_end() {
            if self.check(TokenKind::DotDotDot) {
                self.advance();
                let tok = self.expect(TokenKind::Identifier, "expected binding name after '...' in array pattern")?.clone();
                rest = Some(tok.value);
            } else {
                elements.push(self.parse_pattern()?);
            }
            if !self.check(TokenKind::RBracket) {
                self.expect(TokenKind::Comma, "expected ',' between array pattern elements")?;
            }
        }
        self.expect(TokenKind::RBracket, "expected ']' to close array pattern")?;
        let elements = self.arenas.patterns.alloc_slice(elements);
        Ok(Pattern::Array { elements, rest, location })
    }

    fn parse_tuple_pattern(&mut self, location: tova_base::Location) -> Result<Pattern<'a>, ()> {
        self.expect(TokenKind::LParen, "expected '('")?;
        let mut elements = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            elements.push(self.parse_pattern()?);
            if !self.check(TokenKind::RParen) {
                self.expect(TokenKind::Comma, "expected ',' between tuple pattern elements")?;
            }
        }
        self.expect(TokenKind::RParen, "expected ')' to close tuple pattern")?;
        let elements = self.arenas.patterns.alloc_slice(elements);
        Ok(Pattern::Tuple { elements, location })
    }
}
