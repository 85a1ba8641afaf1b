//! JSX grammar: elements, fragments, attributes/directives, and children.
//!
//! There is no dedicated JSX text token; a run of plain-text children is
//! reconstructed from the underlying token lexemes, joined with single
//! spaces, up to the next `{` or `<`.

use tova_ast::{
    EventModifier, Expr, JsxAttribute, JsxAttributeValue, JsxChild, JsxNode, TransitionKind,
};
use tova_base::{DiagnosticCode, Location, Symbol};
use tova_lexer::TokenKind;

use crate::expr::ExprParsing;
use crate::parser::Parser;

pub trait JsxParsing<'src, 'a> {
    /// Parses `<Tag ...>...</Tag>`, `<Tag ... />`, or `<>...</>`, assuming
    /// the current token is the leading `<`.
    fn parse_jsx(&mut self) -> Result<&'a Expr<'a>, ()>;
}

impl<'src, 'a> JsxParsing<'src, 'a> for Parser<'src, 'a> {
    fn parse_jsx(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        let node = self.parse_jsx_node()?;
        let node = self.arenas.jsx.alloc(node);
        Ok(self.arenas.exprs.alloc(Expr::Jsx { node, location }))
    }
}

impl<'src, 'a> Parser<'src, 'a> {
    fn parse_jsx_node(&mut self) -> Result<JsxNode<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Lt, "expected '<' to start a JSX node")?;

        if self.check(TokenKind::Gt) {
            self.advance();
            let children = self.parse_jsx_children()?;
            self.expect_closing_tag(None)?;
            return Ok(JsxNode::Fragment { children, location });
        }

        let tag_tok = self.expect(TokenKind::Identifier, "expected a tag name after '<'")?.clone();
        let tag = tag_tok.value;
        let attributes = self.parse_jsx_attributes()?;

        if self.check(TokenKind::Slash) {
            self.advance();
            self.expect(TokenKind::Gt, "expected '>' to close self-closing tag")?;
            return Ok(JsxNode::Element { tag, attributes, children: None, location });
        }

        self.expect(TokenKind::Gt, "expected '>' to close opening tag")?;
        let children = self.parse_jsx_children()?;
        self.expect_closing_tag(Some(tag))?;
        Ok(JsxNode::Element { tag, attributes, children: Some(children), location })
    }

    /// Consumes `</Tag>` or `</>`, assuming children have already been
    /// consumed and the current token is the leading `<` of the close tag.
    fn expect_closing_tag(&mut self, tag: Option<Symbol>) -> Result<(), ()> {
        self.expect(TokenKind::Lt, "expected a closing tag")?;
        self.expect(TokenKind::Slash, "expected '/' in closing tag")?;
        if let Some(tag) = tag {
            let close_tok = self.expect(TokenKind::Identifier, "expected a tag name in closing tag")?.clone();
            if close_tok.value != tag {
                return self.error(
                    DiagnosticCode::ExpectedButGot,
                    format!(
                        "closing tag '</{}>' does not match opening tag '<{}>'",
                        self.resolve(close_tok.value),
                        self.resolve(tag)
                    ),
                );
            }
        }
        self.expect(TokenKind::Gt, "expected '>' to close closing tag")?;
        Ok(())
    }

    fn parse_jsx_attributes(&mut self) -> Result<&'a [JsxAttribute<'a>], ()> {
        let mut attributes = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Gt | TokenKind::Slash | TokenKind::Eof) {
            attributes.push(self.parse_jsx_attribute()?);
        }
        Ok(self.arenas.jsx_attributes.alloc_slice(attributes))
    }

    fn parse_jsx_attribute(&mut self) -> Result<JsxAttribute<'a>, ()> {
        let location = self.current_location();
        if self.check(TokenKind::LBrace) {
            self.advance();
            self.expect(TokenKind::DotDotDot, "expected '...' in spread attribute")?;
            let value = self.parse_expr()?;
            self.expect(TokenKind::RBrace, "expected '}' to close spread attribute")?;
            return Ok(JsxAttribute::Spread { value, location });
        }

        let head_tok = self.expect(TokenKind::Identifier, "expected an attribute name")?.clone();
        let head = self.resolve(head_tok.value);

        if self.check(TokenKind::Colon) {
            self.advance();
            return self.parse_jsx_directive(&head, location);
        }

        let value = self.parse_jsx_attribute_value()?;
        Ok(JsxAttribute::Plain { name: head_tok.value, value, location })
    }

    fn parse_jsx_directive(&mut self, namespace: &str, location: Location) -> Result<JsxAttribute<'a>, ()> {
        let name_tok = self.expect(TokenKind::Identifier, "expected a name after directive namespace")?.clone();
        let name = name_tok.value;
        match namespace {
            "on" => {
                let mut modifiers = Vec::new();
                while self.check(TokenKind::Dot) {
                    self.advance();
                    let modifier_tok = self.expect(TokenKind::Identifier, "expected an event modifier after '.'")?.clone();
                    modifiers.push(self.event_modifier(modifier_tok.value));
                }
                self.expect(TokenKind::Eq, "expected '=' after event name/modifiers")?;
                let handler = self.parse_jsx_brace_expr()?;
                let modifiers = self.arenas.event_modifiers.alloc_slice(modifiers);
                Ok(JsxAttribute::Event { name, modifiers, handler, location })
            }
            "class" => {
                self.expect(TokenKind::Eq, "expected '=' after class directive name")?;
                let condition = self.parse_jsx_brace_expr()?;
                Ok(JsxAttribute::ClassDirective { name, condition, location })
            }
            "bind" => {
                self.expect(TokenKind::Eq, "expected '=' after bind directive name")?;
                let target = self.parse_jsx_brace_expr()?;
                Ok(JsxAttribute::BindDirective { name, target, location })
            }
            "in" | "out" | "transition" => {
                let kind = match namespace {
                    "in" => TransitionKind::In,
                    "out" => TransitionKind::Out,
                    _ => TransitionKind::Bidirectional,
                };
                let config = if self.check(TokenKind::Eq) {
                    self.advance();
                    Some(self.parse_jsx_brace_expr()?)
                } else {
                    None
                };
                Ok(JsxAttribute::TransitionDirective { kind, name, config, location })
            }
            _ => self.error(
                DiagnosticCode::IllegalJsxAttribute,
                format!("unknown directive namespace '{}:'", namespace),
            ),
        }
    }

    fn event_modifier(&self, name: Symbol) -> EventModifier {
        match self.resolve(name).as_str() {
            "stop" => EventModifier::Stop,
            "prevent" => EventModifier::Prevent,
            "self" => EventModifier::SelfOnly,
            "once" => EventModifier::Once,
            "capture" => EventModifier::Capture,
            _ => EventModifier::Key(name),
        }
    }

    /// `"text"` or `{expr}`; bare, un-braced expressions are not accepted
    /// as attribute values.
    fn parse_jsx_attribute_value(&mut self) -> Result<JsxAttributeValue<'a>, ()> {
        if !self.check(TokenKind::Eq) {
            return Ok(JsxAttributeValue::Bare);
        }
        self.advance();
        if matches!(self.peek_kind(), TokenKind::String | TokenKind::StringTemplate) {
            let sym = self.expect_plain_string()?;
            return Ok(JsxAttributeValue::StringLiteral(sym));
        }
        Ok(JsxAttributeValue::Expr(self.parse_jsx_brace_expr()?))
    }

    fn parse_jsx_brace_expr(&mut self) -> Result<&'a Expr<'a>, ()> {
        self.expect(TokenKind::LBrace, "expected '{' before expression")?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::RBrace, "expected '}' to close expression")?;
        Ok(value)
    }

    fn parse_jsx_children(&mut self) -> Result<&'a [JsxChild<'a>], ()> {
        let mut children = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Lt if self.kind_at(1) == TokenKind::Slash => break,
                TokenKind::Lt => {
                    let location = self.current_location();
                    let node = self.parse_jsx_node()?;
                    let node = self.arenas.jsx.alloc(node);
                    children.push(JsxChild::Element { node, location });
                }
                TokenKind::LBrace => {
                    let location = self.current_location();
                    let value = self.parse_jsx_brace_expr()?;
                    children.push(JsxChild::Expr { value, location });
                }
                TokenKind::For => children.push(self.parse_jsx_for_child()?),
                TokenKind::If => children.push(self.parse_jsx_if_child()?),
                _ => children.push(self.parse_jsx_text_child()?),
            }
        }
        Ok(self.arenas.jsx_children.alloc_slice(children))
    }

    fn parse_jsx_for_child(&mut self) -> Result<JsxChild<'a>, ()> {
        use crate::pattern::PatternParsing;
        let location = self.current_location();
        self.advance(); // `for`
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::In, "expected 'in' in JSX for-loop")?;
        let iterable = self.parse_expr()?;
        let key = if self.check(TokenKind::Identifier) && self.resolve(self.peek().value) == "key" {
            self.advance();
            Some(self.parse_jsx_brace_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "expected '{' to start JSX for-loop body")?;
        let body = self.parse_jsx_children()?;
        self.expect(TokenKind::RBrace, "expected '}' to close JSX for-loop body")?;
        Ok(JsxChild::For { pattern, iterable, key, body, location })
    }

    fn parse_jsx_if_child(&mut self) -> Result<JsxChild<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `if`
        let condition = self.parse_expr()?;
        self.expect(TokenKind::LBrace, "expected '{' to start JSX if-branch body")?;
        let then_branch = self.parse_jsx_children()?;
        self.expect(TokenKind::RBrace, "expected '}' to close JSX if-branch body")?;
        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::LBrace, "expected '{' to start JSX else-branch body")?;
            let children = self.parse_jsx_children()?;
            self.expect(TokenKind::RBrace, "expected '}' to close JSX else-branch body")?;
            Some(children)
        } else {
            None
        };
        Ok(JsxChild::If { condition, then_branch, else_branch, location })
    }

    /// Joins the lexemes of a run of tokens that aren't `<`, `{`, `for`, or
    /// `if` into one text child, mirroring how the lexer's raw lexemes
    /// already carry the source text for each token.
    fn parse_jsx_text_child(&mut self) -> Result<JsxChild<'a>, ()> {
        let location = self.current_location();
        let mut words = Vec::new();
        while !matches!(
            self.peek_kind(),
            TokenKind::Lt | TokenKind::LBrace | TokenKind::For | TokenKind::If | TokenKind::Eof
        ) {
            if self.check(TokenKind::Newline) {
                self.advance();
                continue;
            }
            let tok = self.advance().clone();
            words.push(self.resolve(tok.value));
        }
        let text = self.interner.intern(&words.join(" "));
        Ok(JsxChild::Text { value: text, location })
    }
}
