//! Statement grammar: bindings, control flow, and declarations appearing
//! in statement position inside a block body.

use tova_ast::{Expr, ForStmt, Label, MatchStmtArm, Stmt, StmtBlock};
use tova_base::DiagnosticCode;
use tova_lexer::TokenKind;

use crate::decl::DeclParsing;
use crate::expr::ExprParsing;
use crate::parser::Parser;
use crate::pattern::PatternParsing;

/// Identifiers recognized as statement-position control constructs with no
/// dedicated keyword token.
const TRY_KEYWORD: &str = "try";

pub trait StmtParsing<'src, 'a> {
    fn parse_stmt(&mut self) -> Result<Stmt<'a>, ()>;
}

impl<'src, 'a> StmtParsing<'src, 'a> for Parser<'src, 'a> {
    fn parse_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();

        if self.labeled_loop_follows() {
            return self.parse_labeled_loop();
        }

        match self.peek_kind() {
            TokenKind::Pub
            | TokenKind::Fn
            | TokenKind::Type
            | TokenKind::Trait
            | TokenKind::Interface
            | TokenKind::Impl
            | TokenKind::Import => {
                let decl = self.parse_top_level_decl()?;
                Ok(Stmt::Decl { decl, location })
            }
            TokenKind::State => Ok(Stmt::Decl { decl: self.parse_state_decl()?, location }),
            TokenKind::Computed => Ok(Stmt::Decl { decl: self.parse_computed_decl()?, location }),
            TokenKind::Effect => Ok(Stmt::Decl { decl: self.parse_effect_decl()?, location }),
            TokenKind::Component => Ok(Stmt::Decl { decl: self.parse_component_decl()?, location }),
            TokenKind::Store => Ok(Stmt::Decl { decl: self.parse_store_decl()?, location }),
            TokenKind::RawCss => Ok(Stmt::Decl { decl: self.parse_style_decl()?, location }),
            TokenKind::Route => Ok(Stmt::Decl { decl: self.parse_route_decl()?, location }),
            TokenKind::Middleware => Ok(Stmt::Decl { decl: self.parse_middleware_decl()?, location }),
            TokenKind::Var | TokenKind::Let => self.parse_let_stmt(),
            TokenKind::LBrace => self.parse_block_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(None),
            TokenKind::While => self.parse_while_stmt(None),
            TokenKind::Loop => self.parse_loop_stmt(None),
            TokenKind::Match => self.parse_match_stmt(),
            TokenKind::Break => self.parse_break_stmt(),
            TokenKind::Continue => self.parse_continue_stmt(),
            TokenKind::Guard => self.parse_guard_stmt(),
            TokenKind::With => self.parse_with_stmt(),
            TokenKind::Defer => self.parse_defer_stmt(),
            TokenKind::Identifier => self.parse_identifier_led_stmt(),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }
}

impl<'src, 'a> Parser<'src, 'a> {
    fn labeled_loop_follows(&self) -> bool {
        self.check(TokenKind::Identifier)
            && self.kind_at(1) == TokenKind::Colon
            && matches!(self.kind_at(2), TokenKind::For | TokenKind::While | TokenKind::Loop)
    }

    fn parse_labeled_loop(&mut self) -> Result<Stmt<'a>, ()> {
        let label_tok = self.expect(TokenKind::Identifier, "expected a label name")?.clone();
        self.advance(); // `:`
        let label = Some(label_tok.value);
        match self.peek_kind() {
            TokenKind::For => self.parse_for_stmt(label),
            TokenKind::While => self.parse_while_stmt(label),
            TokenKind::Loop => self.parse_loop_stmt(label),
            _ => unreachable!("labeled_loop_follows guarantees a loop keyword here"),
        }
    }

    /// Dispatches identifiers that lead an identifier-text recognized
    /// construct (`websocket`/`sse`/`db`/`ai`/`try`) before falling back to
    /// a plain expression/assignment statement.
    fn parse_identifier_led_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        let text = self.resolve(self.peek().value);
        match text.as_str() {
            "websocket" if matches!(self.kind_at(1), TokenKind::String | TokenKind::StringTemplate) => {
                Ok(Stmt::Decl { decl: self.parse_websocket_decl()?, location })
            }
            "sse" if matches!(self.kind_at(1), TokenKind::String | TokenKind::StringTemplate) => {
                Ok(Stmt::Decl { decl: self.parse_sse_decl()?, location })
            }
            "db" if self.kind_at(1) == TokenKind::Identifier && self.kind_at(2) == TokenKind::LBrace => {
                Ok(Stmt::Decl { decl: self.parse_db_decl()?, location })
            }
            "ai" if self.kind_at(1) == TokenKind::Identifier && self.kind_at(2) == TokenKind::LBrace => {
                Ok(Stmt::Decl { decl: self.parse_ai_decl()?, location })
            }
            TRY_KEYWORD if self.kind_at(1) == TokenKind::LBrace => self.parse_try_stmt(),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    pub(crate) fn parse_stmt_block(&mut self) -> Result<StmtBlock<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::LBrace, "expected '{' to start a block")?;
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() && !self.stop {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "expected '}' to close block")?;
        let statements = self.arenas.stmts.alloc_slice(stmts);
        Ok(StmtBlock { statements, location })
    }

    fn parse_block_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        let block = self.parse_stmt_block()?;
        Ok(Stmt::Block { block, location })
    }

    fn parse_let_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        let mutable = self.check(TokenKind::Var);
        self.advance(); // `var` or `let`

        if matches!(self.peek_kind(), TokenKind::LBrace | TokenKind::LBracket) {
            let pattern = self.parse_pattern()?;
            self.expect(TokenKind::Eq, "expected '=' after destructuring pattern")?;
            let value = self.parse_expr()?;
            return Ok(Stmt::LetDestructure { mutable, pattern, value, location });
        }

        let name_tok = self.expect(TokenKind::Identifier, "expected a binding name")?.clone();
        let type_annotation = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        let value = if self.check(TokenKind::Eq) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::Let { mutable, name: name_tok.value, type_annotation, value, location })
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `return`
        let value = if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(Stmt::Return { value, location })
    }

    /// `elif` chains desugar into a single-statement `else_branch` block
    /// wrapping a nested `If` statement.
    fn parse_if_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `if`
        let condition = self.parse_expr()?;
        let then_branch = self.parse_stmt_block()?;
        let else_branch = if self.check(TokenKind::Elif) {
            let elif_location = self.current_location();
            let nested = self.parse_elif_stmt()?;
            let statements = self.arenas.stmts.alloc_slice(vec![nested]);
            Some(StmtBlock { statements, location: elif_location })
        } else if self.check(TokenKind::Else) {
            self.advance();
            Some(self.parse_stmt_block()?)
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch, location })
    }

    /// Like [`Self::parse_if_stmt`] but entered with `elif` as the leading
    /// token instead of `if`.
    fn parse_elif_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `elif`
        let condition = self.parse_expr()?;
        let then_branch = self.parse_stmt_block()?;
        let else_branch = if self.check(TokenKind::Elif) {
            let elif_location = self.current_location();
            let nested = self.parse_elif_stmt()?;
            let statements = self.arenas.stmts.alloc_slice(vec![nested]);
            Some(StmtBlock { statements, location: elif_location })
        } else if self.check(TokenKind::Else) {
            self.advance();
            Some(self.parse_stmt_block()?)
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch, location })
    }

    fn parse_for_stmt(&mut self, label: Label) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `for`
        let is_async = if self.check(TokenKind::Await) {
            self.advance();
            true
        } else {
            false
        };
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::In, "expected 'in' after for-loop pattern")?;
        let iterable = self.parse_expr()?;
        let guard = if self.check(TokenKind::Identifier) && self.resolve(self.peek().value) == "when" {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let body = self.parse_stmt_block()?;
        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Some(self.parse_stmt_block()?)
        } else {
            None
        };
        let stmt = ForStmt { label, pattern, iterable, guard, is_async, body, else_branch };
        Ok(Stmt::For { stmt, location })
    }

    fn parse_while_stmt(&mut self, label: Label) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `while`
        let condition = self.parse_expr()?;
        let body = self.parse_stmt_block()?;
        Ok(Stmt::While { label, condition, body, location })
    }

    fn parse_loop_stmt(&mut self, label: Label) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `loop`
        let body = self.parse_stmt_block()?;
        Ok(Stmt::Loop { label, body, location })
    }

    fn parse_match_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `match`
        let subject = self.parse_expr()?;
        self.expect(TokenKind::LBrace, "expected '{' after 'match' subject")?;
        self.skip_newlines();
        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let arm_location = self.current_location();
            let pattern = self.parse_pattern()?;
            let guard = if self.check(TokenKind::If) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect(TokenKind::FatArrow, "expected '=>' after match pattern")?;
            let body = self.parse_stmt_block()?;
            arms.push(MatchStmtArm { pattern, guard, body, location: arm_location });
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "expected '}' to close 'match' statement")?;
        let arms = self.arenas.match_stmt_arms.alloc_slice(arms);
        Ok(Stmt::Match { subject, arms, location })
    }

    fn parse_break_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `break`
        let label = self.parse_optional_label_reference();
        Ok(Stmt::Break { label, location })
    }

    fn parse_continue_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `continue`
        let label = self.parse_optional_label_reference();
        Ok(Stmt::Continue { label, location })
    }

    fn parse_optional_label_reference(&mut self) -> Label {
        if self.check(TokenKind::Identifier) {
            let tok = self.advance().clone();
            Some(tok.value)
        } else {
            None
        }
    }

    fn parse_guard_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `guard`
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Else, "expected 'else' after 'guard' condition")?;
        let else_branch = self.parse_stmt_block()?;
        Ok(Stmt::Guard { condition, else_branch, location })
    }

    fn parse_with_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `with`
        let resource = self.parse_expr()?;
        self.expect(TokenKind::As, "expected 'as' after 'with' resource expression")?;
        let binding_tok = self.expect(TokenKind::Identifier, "expected a binding name after 'as'")?.clone();
        let body = self.parse_stmt_block()?;
        Ok(Stmt::With { resource, binding: binding_tok.value, body, location })
    }

    fn parse_defer_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `defer`
        let body = self.parse_stmt_block()?;
        Ok(Stmt::Defer { body, location })
    }

    fn parse_try_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `try`
        let try_block = self.parse_stmt_block()?;
        self.expect_identifier_text("catch", "expected 'catch' after 'try' block")?;
        let catch_binding = if self.check(TokenKind::As) {
            self.advance();
            let tok = self.expect(TokenKind::Identifier, "expected a binding name after 'as'")?.clone();
            Some(tok.value)
        } else {
            None
        };
        let catch_block = self.parse_stmt_block()?;
        let finally_block = if self.peek_kind() == TokenKind::Identifier && self.resolve(self.peek().value) == "finally" {
            self.advance();
            Some(self.parse_stmt_block()?)
        } else {
            None
        };
        Ok(Stmt::TryCatch { try_block, catch_binding, catch_block, finally_block, location })
    }

    fn expect_identifier_text(&mut self, text: &str, context: &str) -> Result<(), ()> {
        if self.check(TokenKind::Identifier) && self.resolve(self.peek().value) == text {
            self.advance();
            Ok(())
        } else {
            let message = format!("{context}, found {:?}", self.peek_kind());
            self.error(DiagnosticCode::ExpectedButGot, message)
        }
    }

    /// A bare expression statement, or one headed by `=`/a compound-assign
    /// operator already folded into the expression by [`crate::expr`]'s
    /// assignment tier.
    fn parse_expr_or_assign_stmt(&mut self) -> Result<Stmt<'a>, ()> {
        let location = self.current_location();
        let expr = self.parse_expr()?;
        if self.check(TokenKind::Eq) {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign { target: expr, value, location });
        }
        if let Expr::CompoundAssign { op, target, value, .. } = expr {
            return Ok(Stmt::CompoundAssign { op: *op, target: *target, value: *value, location });
        }
        Ok(Stmt::Expr { expr, location })
    }
}
