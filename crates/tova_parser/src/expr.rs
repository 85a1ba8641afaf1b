//! Expression grammar: the full precedence grid from lowest to highest
//! binding power.
//!
//! ```text
//! assignment (compound `+=` etc, right-assoc)
//! pipe (`|>`, left-assoc)
//! or
//! and
//! equality (`==` `!=`)
//! comparison (`< > <= >=`, chained)
//! is / in / not in
//! range (`..` `..=`)
//! additive (`+` `-` `++`)
//! multiplicative (`*` `/` `%`)
//! power (`**`, right-assoc)
//! unary (`not` `-` `!`)
//! propagation postfix (`?`)
//! postfix (member/index/slice/call/optional-chain, left-assoc)
//! primary
//! ```

use tova_ast::{
    BinaryOpKind, CallArg, Comprehension, ComprehensionClause, CompoundAssignOpKind, Expr, Literal,
    MatchArm, Param, TemplatePart, TypeExpr,
};
use tova_base::DiagnosticCode;
use tova_lexer::{StringPart, TokenKind};

use crate::column::ColumnParsing;
use crate::jsx::JsxParsing;
use crate::pattern::PatternParsing;
use crate::parser::Parser;

/// Call targets whose argument list is parsed with column-expression
/// syntax (`.col`) enabled, per the table-pipeline grammar.
const COLUMN_CONTEXT_FUNCTIONS: &[&str] =
    &["where", "select", "derive", "group_by", "sort_by", "drop_nil", "fill_nil"];

pub trait ExprParsing<'src, 'a> {
    fn parse_expr(&mut self) -> Result<&'a Expr<'a>, ()>;
}

impl<'src, 'a> ExprParsing<'src, 'a> for Parser<'src, 'a> {
    fn parse_expr(&mut self) -> Result<&'a Expr<'a>, ()> {
        self.parse_assignment()
    }
}

impl<'src, 'a> Parser<'src, 'a> {
    fn alloc(&self, e: Expr<'a>) -> &'a Expr<'a> {
        self.arenas.exprs.alloc(e)
    }

    fn parse_assignment(&mut self) -> Result<&'a Expr<'a>, ()> {
        let target = self.parse_pipe()?;
        let op = match self.peek_kind() {
            TokenKind::PlusEq => Some(CompoundAssignOpKind::Add),
            TokenKind::MinusEq => Some(CompoundAssignOpKind::Sub),
            TokenKind::StarEq => Some(CompoundAssignOpKind::Mul),
            TokenKind::SlashEq => Some(CompoundAssignOpKind::Div),
            _ => None,
        };
        let Some(op) = op else { return Ok(target) };
        let location = self.current_location();
        self.advance();
        let value = self.parse_assignment()?;
        Ok(self.alloc(Expr::CompoundAssign { op, target, value, location }))
    }

    fn parse_pipe(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut left = self.parse_or()?;
        while self.check(TokenKind::PipeForward) {
            let location = self.current_location();
            self.advance();
            let target = self.parse_or()?;
            left = self.alloc(Expr::Pipe { left, target, location });
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::Or | TokenKind::PipePipe) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_and()?;
            left = self.alloc(Expr::Binary { op: BinaryOpKind::Or, left, right, location });
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut left = self.parse_equality()?;
        while matches!(self.peek_kind(), TokenKind::And | TokenKind::AmpAmp) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_equality()?;
            left = self.alloc(Expr::Binary { op: BinaryOpKind::And, left, right, location });
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOpKind::Eq,
                TokenKind::NotEq => BinaryOpKind::NotEq,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_comparison()?;
            left = self.alloc(Expr::Binary { op, left, right, location });
        }
        Ok(left)
    }

    /// `a < b < c` is flattened into a single [`Expr::ChainedComparison`]
    /// rather than nested binaries, so the code generator can bind the
    /// middle operand once.
    fn parse_comparison(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        let first: &'a Expr<'a> = self.parse_is_in()?;
        let mut operands: Vec<&'a Expr<'a>> = vec![first];
        let mut ops = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOpKind::Lt,
                TokenKind::Gt => BinaryOpKind::Gt,
                TokenKind::LtEq => BinaryOpKind::LtEq,
                TokenKind::GtEq => BinaryOpKind::GtEq,
                _ => break,
            };
            self.advance();
            let next = self.parse_is_in()?;
            ops.push(op);
            operands.push(next);
        }
        if ops.is_empty() {
            return Ok(first);
        }
        if ops.len() == 1 {
            return Ok(self.alloc(Expr::Binary { op: ops[0], left: operands[0], right: operands[1], location }));
        }
        let operands: Vec<Expr<'a>> = operands.into_iter().map(|e| (*e).clone()).collect();
        let operands = self.arenas.exprs.alloc_slice(operands);
        let ops = self.arenas.binary_ops.alloc_slice(ops);
        Ok(self.alloc(Expr::ChainedComparison { operands, ops, location }))
    }

    /// `expr is Pattern` / `expr [not] in iterable`.
    fn parse_is_in(&mut self) -> Result<&'a Expr<'a>, ()> {
        let left = self.parse_range()?;
        let location = self.current_location();
        if self.check(TokenKind::Is) {
            self.advance();
            let pattern = self.parse_pattern()?;
            return Ok(self.alloc(Expr::Is { subject: left, pattern, location }));
        }
        if self.check(TokenKind::Not) && self.kind_at(1) == TokenKind::In {
            self.advance();
            self.advance();
            let iterable = self.parse_range()?;
            return Ok(self.alloc(Expr::Membership { value: left, iterable, negated: true, location }));
        }
        if self.check(TokenKind::In) {
            self.advance();
            let iterable = self.parse_range()?;
            return Ok(self.alloc(Expr::Membership { value: left, iterable, negated: false, location }));
        }
        Ok(left)
    }

    fn parse_range(&mut self) -> Result<&'a Expr<'a>, ()> {
        let low = self.parse_additive()?;
        if matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotEq) {
            let inclusive = self.check(TokenKind::DotDotEq);
            let location = self.current_location();
            self.advance();
            let high = self.parse_additive()?;
            return Ok(self.alloc(Expr::Range { low, high, inclusive, location }));
        }
        Ok(low)
    }

    fn parse_additive(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut left = self.parse_multiplicative()?;
        loop {
            // `+` is re-tagged `Concat` by the analyzer once operand types
            // are known; the parser always produces `Add` here.
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOpKind::Add,
                TokenKind::Minus => BinaryOpKind::Sub,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.alloc(Expr::Binary { op, left, right, location });
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOpKind::Mul,
                TokenKind::Slash => BinaryOpKind::Div,
                TokenKind::Percent => BinaryOpKind::Mod,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_power()?;
            left = self.alloc(Expr::Binary { op, left, right, location });
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<&'a Expr<'a>, ()> {
        let left = self.parse_unary()?;
        if self.check(TokenKind::StarStar) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_power()?; // right-associative
            return Ok(self.alloc(Expr::Binary { op: BinaryOpKind::Pow, left, right, location }));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<&'a Expr<'a>, ()> {
        if self.in_column_context && self.check(TokenKind::Minus) && self.kind_at(1) == TokenKind::Dot {
            return self.parse_negated_column_expr();
        }
        let op = match self.peek_kind() {
            TokenKind::Not => Some(tova_ast::UnaryOpKind::Not),
            TokenKind::Minus => Some(tova_ast::UnaryOpKind::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let location = self.current_location();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(Expr::Unary { op, operand, location }));
        }
        self.parse_propagate()
    }

    /// `expr?`: postfix error propagation. Disabled if the `?` is followed
    /// by a newline or EOF (spec §4.2: a bare trailing `?` at line-end binds
    /// to nothing and is a syntax error rather than silently absorbed).
    fn parse_propagate(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut expr = self.parse_postfix()?;
        while self.check(TokenKind::Question) && !matches!(self.kind_at(1), TokenKind::Newline | TokenKind::Eof) {
            let location = self.current_location();
            self.advance();
            expr = self.alloc(Expr::Propagate { inner: expr, location });
        }
        Ok(expr)
    }

    fn parse_postfix(&mut self) -> Result<&'a Expr<'a>, ()> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let location = self.current_location();
                    self.advance();
                    let name_tok = self.expect(TokenKind::Identifier, "expected property name after '.'")?.clone();
                    expr = self.alloc(Expr::Member { object: expr, property: name_tok.value, location });
                }
                TokenKind::QuestionDot => {
                    let location = self.current_location();
                    self.advance();
                    let name_tok = self.expect(TokenKind::Identifier, "expected property name after '?.'")?.clone();
                    expr = self.alloc(Expr::OptionalMember { object: expr, property: name_tok.value, location });
                }
                TokenKind::Bang => {
                    // Postfix non-null assertion.
                    let location = self.current_location();
                    self.advance();
                    expr = self.alloc(Expr::Unary { op: tova_ast::UnaryOpKind::NonNullAssert, operand: expr, location });
                }
                TokenKind::As => {
                    let location = self.current_location();
                    self.advance();
                    let type_annotation = self.parse_type_annotation()?;
                    expr = self.alloc(Expr::As { inner: expr, type_annotation, location });
                }
                TokenKind::LBracket => {
                    expr = self.parse_index_or_slice(expr)?;
                }
                TokenKind::LParen => {
                    expr = self.parse_call(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_index_or_slice(&mut self, object: &'a Expr<'a>) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `[`
        let low = if self.check(TokenKind::Colon) { None } else { Some(self.parse_expr()?) };
        if self.check(TokenKind::Colon) {
            self.advance();
            let high = if matches!(self.peek_kind(), TokenKind::Colon | TokenKind::RBracket) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            let step = if self.check(TokenKind::Colon) {
                self.advance();
                if self.check(TokenKind::RBracket) { None } else { Some(self.parse_expr()?) }
            } else {
                None
            };
            self.expect(TokenKind::RBracket, "expected ']' to close slice")?;
            return Ok(self.alloc(Expr::Slice { object, low, high, step, location }));
        }
        self.expect(TokenKind::RBracket, "expected ']' to close index")?;
        let index = low.expect("non-slice index must have parsed an expression");
        Ok(self.alloc(Expr::Index { object, index, location }))
    }

    fn parse_call(&mut self, callee: &'a Expr<'a>) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `(`

        let enable_columns = matches!(callee, Expr::Identifier { name, .. }
            if COLUMN_CONTEXT_FUNCTIONS.contains(&self.resolve(*name).as_str()));
        let previous_column_context = self.in_column_context;
        if enable_columns {
            self.in_column_context = true;
        }

        let mut args = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_call_arg()?);
            self.skip_newlines();
            if !self.check(TokenKind::RParen) {
                self.expect(TokenKind::Comma, "expected ',' between call arguments")?;
                self.skip_newlines();
            }
        }
        self.in_column_context = previous_column_context;
        self.expect(TokenKind::RParen, "expected ')' to close call arguments")?;
        let args = self.arenas.call_args.alloc_slice(args);
        Ok(self.alloc(Expr::Call { callee, args, location }))
    }

    fn parse_call_arg(&mut self) -> Result<CallArg<'a>, ()> {
        let location = self.current_location();
        if self.check(TokenKind::DotDotDot) {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(CallArg { name: None, value, spread: true, location });
        }
        if self.check(TokenKind::Identifier) && self.kind_at(1) == TokenKind::Colon {
            let name_tok = self.advance().clone();
            self.advance(); // `:`
            let value = self.parse_expr()?;
            return Ok(CallArg { name: Some(name_tok.value), value, spread: false, location });
        }
        let value = self.parse_expr()?;
        Ok(CallArg { name: None, value, spread: false, location })
    }

    fn parse_primary(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        match self.peek_kind() {
            TokenKind::Number => {
                let sym = self.peek().value;
                self.advance();
                Ok(self.alloc(Expr::Literal { value: Literal::Number(sym), location }))
            }
            TokenKind::String => {
                let sym = self.peek().value;
                self.advance();
                Ok(self.alloc(Expr::Literal { value: Literal::String(sym), location }))
            }
            TokenKind::StringTemplate => self.parse_string_template_literal(),
            TokenKind::True => {
                self.advance();
                Ok(self.alloc(Expr::Literal { value: Literal::Bool(true), location }))
            }
            TokenKind::False => {
                self.advance();
                Ok(self.alloc(Expr::Literal { value: Literal::Bool(false), location }))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(self.alloc(Expr::Literal { value: Literal::Nil, location }))
            }
            TokenKind::Dot if self.in_column_context => self.parse_column_expr(),
            TokenKind::DotDotDot => {
                self.advance();
                let inner = self.parse_expr()?;
                Ok(self.alloc(Expr::Spread { inner, location }))
            }
            TokenKind::Await => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(self.alloc(Expr::Await { inner, location }))
            }
            TokenKind::Yield => {
                self.advance();
                let inner = if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(self.alloc(Expr::Yield { inner, location }))
            }
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Match => self.parse_match_expr(),
            TokenKind::Fn => self.parse_fn_lambda(),
            TokenKind::LParen => self.parse_paren_or_lambda_or_tuple(),
            TokenKind::LBracket => self.parse_array_or_comprehension(),
            TokenKind::LBrace => self.parse_dict_or_comprehension(),
            TokenKind::Lt => self.parse_jsx(),
            TokenKind::Identifier => {
                let name_tok = self.advance().clone();
                if self.check(TokenKind::FatArrow) {
                    self.advance();
                    let param = Param { name: name_tok.value, type_annotation: None, default: None, location };
                    let params = self.arenas.params.alloc_slice(vec![param]);
                    let body = self.parse_expr()?;
                    return Ok(self.alloc(Expr::Lambda { params, body, location }));
                }
                Ok(self.alloc(Expr::Identifier { name: name_tok.value, location }))
            }
            _ => self.error(DiagnosticCode::UnexpectedToken, format!("unexpected token in expression position: {:?}", self.peek_kind())),
        }
    }

    fn parse_string_template_literal(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        let tok = self.advance().clone();
        let template = tok.template.expect("StringTemplate token always carries a template");
        let mut parts = Vec::with_capacity(template.parts.len());
        for part in template.parts {
            match part {
                StringPart::Text(text) => {
                    let sym = self.interner.intern(&text);
                    parts.push(TemplatePart::Text(sym));
                }
                StringPart::Expr(sub_tokens) => {
                    let sub_file = self.file;
                    let mut sub_parser = Parser {
                        tokens: &sub_tokens,
                        pos: 0,
                        file: sub_file,
                        arenas: self.arenas,
                        interner: self.interner,
                        registry: self.registry,
                        diagnostics: tova_base::DiagnosticBag::new(),
                        tolerant: self.tolerant,
                        stop: false,
                        in_column_context: false,
                        pending_docstring: None,
                    };
                    let expr = sub_parser.parse_expr();
                    let sub_diagnostics = sub_parser.diagnostics;
                    self.diagnostics.extend(sub_diagnostics);
                    let expr = expr?;
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }
        let parts = self.arenas.template_parts.alloc_slice(parts);
        Ok(self.alloc(Expr::Literal { value: Literal::Template(parts), location }))
    }

    fn parse_if_expr(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `if`
        let condition = self.parse_expr()?;
        self.expect(TokenKind::LBrace, "expected '{' after 'if' condition")?;
        let then_branch = self.parse_expr()?;
        self.skip_newlines();
        self.expect(TokenKind::RBrace, "expected '}' to close 'if' expression body")?;
        self.skip_newlines();
        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::LBrace, "expected '{' after 'else'")?;
            let value = self.parse_expr()?;
            self.skip_newlines();
            self.expect(TokenKind::RBrace, "expected '}' to close 'else' expression body")?;
            Some(value)
        } else {
            None
        };
        Ok(self.alloc(Expr::If { condition, then_branch, else_branch, location }))
    }

    fn parse_match_expr(&mut self) -> Result<&'a Expr<'a>, ()> {
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
            let body = self.parse_expr()?;
            arms.push(MatchArm { pattern, guard, body, location: arm_location });
            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            }
        }
        self.expect(TokenKind::RBrace, "expected '}' to close 'match' expression")?;
        let arms = self.arenas.match_arms.alloc_slice(arms);
        Ok(self.alloc(Expr::Match { subject, arms, location }))
    }

    fn parse_fn_lambda(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `fn`
        let params = self.parse_param_list()?;
        let body = self.parse_expr()?;
        Ok(self.alloc(Expr::Lambda { params, body, location }))
    }

    /// Disambiguates `(params) => expr` from a parenthesized expression or
    /// tuple literal by scanning ahead for the matching `)` and checking
    /// whether `=>` follows it.
    fn parse_paren_or_lambda_or_tuple(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        if self.paren_group_is_lambda() {
            let params = self.parse_param_list()?;
            self.expect(TokenKind::FatArrow, "expected '=>' after lambda parameter list")?;
            let body = self.parse_expr()?;
            return Ok(self.alloc(Expr::Lambda { params, body, location }));
        }

        self.advance(); // `(`
        self.skip_newlines();
        if self.check(TokenKind::RParen) {
            self.advance();
            let elements = self.arenas.exprs.alloc_slice(Vec::new());
            return Ok(self.alloc(Expr::Tuple { elements, location }));
        }
        let first = self.parse_expr()?;
        self.skip_newlines();
        if self.check(TokenKind::Comma) {
            let mut elements = vec![first.clone()];
            while self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                if self.check(TokenKind::RParen) {
                    break;
                }
                elements.push(self.parse_expr()?.clone());
                self.skip_newlines();
            }
            self.expect(TokenKind::RParen, "expected ')' to close tuple")?;
            let elements = self.arenas.exprs.alloc_slice(elements);
            return Ok(self.alloc(Expr::Tuple { elements, location }));
        }
        self.expect(TokenKind::RParen, "expected ')' to close parenthesized expression")?;
        Ok(first)
    }

    /// Scans from the current `(` to its matching `)` (respecting nesting)
    /// and reports whether `=>` follows, without consuming any tokens.
    fn paren_group_is_lambda(&self) -> bool {
        let mut depth: i32 = 0;
        let mut offset = 0;
        loop {
            let kind = self.kind_at(offset);
            match kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.kind_at(offset + 1) == TokenKind::FatArrow;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    pub(crate) fn parse_param_list(&mut self) -> Result<&'a [Param<'a>], ()> {
        self.expect(TokenKind::LParen, "expected '(' to start parameter list")?;
        let mut params = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let param_location = self.current_location();
            let name_tok = self.expect(TokenKind::Identifier, "expected parameter name")?.clone();
            let type_annotation = if self.check(TokenKind::Colon) {
                self.advance();
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            let default = if self.check(TokenKind::Eq) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param { name: name_tok.value, type_annotation, default, location: param_location });
            self.skip_newlines();
            if !self.check(TokenKind::RParen) {
                self.expect(TokenKind::Comma, "expected ',' between parameters")?;
                self.skip_newlines();
            }
        }
        self.expect(TokenKind::RParen, "expected ')' to close parameter list")?;
        Ok(self.arenas.params.alloc_slice(params))
    }

    pub(crate) fn parse_type_annotation(&mut self) -> Result<TypeExpr<'a>, ()> {
        let location = self.current_location();
        let base = if self.check(TokenKind::Identifier) && self.resolve(self.peek().value) == "_" {
            self.advance();
            TypeExpr::Wildcard { location }
        } else if self.check(TokenKind::LBracket) {
            self.advance();
            let element = self.parse_type_annotation()?;
            self.expect(TokenKind::RBracket, "expected ']' to close array type")?;
            TypeExpr::Array { element: self.arenas.types.alloc(element), location }
        } else if self.check(TokenKind::LParen) {
            self.advance();
            let mut params = Vec::new();
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                params.push(self.parse_type_annotation()?);
                if !self.check(TokenKind::RParen) {
                    self.expect(TokenKind::Comma, "expected ',' between function type parameters")?;
                }
            }
            self.expect(TokenKind::RParen, "expected ')' to close function type parameter list")?;
            self.expect(TokenKind::Arrow, "expected '->' in function type")?;
            let returns = self.parse_type_annotation()?;
            let params = self.arenas.types.alloc_slice(params);
            TypeExpr::Function { params, returns: self.arenas.types.alloc(returns), location }
        } else {
            let name_tok = self.expect(TokenKind::Identifier, "expected a type name")?.clone();
            if self.check(TokenKind::Lt) {
                self.advance();
                let mut args = Vec::new();
                while !self.check(TokenKind::Gt) && !self.is_at_end() {
                    args.push(self.parse_type_annotation()?);
                    if !self.check(TokenKind::Gt) {
                        self.expect(TokenKind::Comma, "expected ',' between type arguments")?;
                    }
                }
                self.expect(TokenKind::Gt, "expected '>' to close generic type arguments")?;
                let args = self.arenas.types.alloc_slice(args);
                TypeExpr::Generic { name: name_tok.value, args, location }
            } else {
                TypeExpr::Named { name: name_tok.value, location }
            }
        };
        if self.check(TokenKind::Question) {
            self.advance();
            return Ok(TypeExpr::Optional { inner: self.arenas.types.alloc(base), location });
        }
        Ok(base)
    }

    fn parse_array_or_comprehension(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `[`
        self.skip_newlines();
        if self.check(TokenKind::RBracket) {
            self.advance();
            let elements = self.arenas.exprs.alloc_slice(Vec::new());
            return Ok(self.alloc(Expr::Array { elements, location }));
        }
        let first = self.parse_expr()?;
        self.skip_newlines();
        if self.check(TokenKind::For) {
            let clauses = self.parse_comprehension_clauses()?;
            self.expect(TokenKind::RBracket, "expected ']' to close list comprehension")?;
            let comprehension = Comprehension { element: first, value: None, clauses, location };
            return Ok(self.alloc(Expr::ListComprehension { comprehension, location }));
        }
        let mut elements = vec![first.clone()];
        while self.check(TokenKind::Comma) {
            self.advance();
            self.skip_newlines();
            if self.check(TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expr()?.clone());
            self.skip_newlines();
        }
        self.expect(TokenKind::RBracket, "expected ']' to close array literal")?;
        let elements = self.arenas.exprs.alloc_slice(elements);
        Ok(self.alloc(Expr::Array { elements, location }))
    }

    fn parse_dict_or_comprehension(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `{`
        self.skip_newlines();
        if self.check(TokenKind::RBrace) {
            self.advance();
            let entries = self.arenas.dict_entries.alloc_slice(Vec::new());
            return Ok(self.alloc(Expr::Dict { entries, location }));
        }
        let key = self.parse_expr()?;
        self.expect(TokenKind::Colon, "expected ':' between dict key and value")?;
        let value = self.parse_expr()?;
        self.skip_newlines();
        if self.check(TokenKind::For) {
            let clauses = self.parse_comprehension_clauses()?;
            self.expect(TokenKind::RBrace, "expected '}' to close dict comprehension")?;
            let comprehension = Comprehension { element: key, value: Some(value), clauses, location };
            return Ok(self.alloc(Expr::DictComprehension { comprehension, location }));
        }
        let mut entries = vec![((*key).clone(), (*value).clone())];
        while self.check(TokenKind::Comma) {
            self.advance();
            self.skip_newlines();
            if self.check(TokenKind::RBrace) {
                break;
            }
            let k = (*self.parse_expr()?).clone();
            self.expect(TokenKind::Colon, "expected ':' between dict key and value")?;
            let v = (*self.parse_expr()?).clone();
            entries.push((k, v));
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "expected '}' to close dict literal")?;
        let entries = self.arenas.dict_entries.alloc_slice(entries);
        Ok(self.alloc(Expr::Dict { entries, location }))
    }

    fn parse_comprehension_clauses(&mut self) -> Result<&'a [ComprehensionClause<'a>], ()> {
        let mut clauses = Vec::new();
        loop {
            if self.check(TokenKind::For) {
                self.advance();
                let pattern = self.parse_pattern()?;
                self.expect(TokenKind::In, "expected 'in' in comprehension clause")?;
                let iterable = self.parse_expr()?;
                clauses.push(ComprehensionClause::For { pattern, iterable });
            } else if self.check(TokenKind::If) {
                self.advance();
                let condition = self.parse_expr()?;
                clauses.push(ComprehensionClause::If { condition });
            } else {
                break;
            }
            self.skip_newlines();
        }
        Ok(self.arenas.comprehension_clauses.alloc_slice(clauses))
    }
}
