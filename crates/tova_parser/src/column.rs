//! Column expressions: the leading-`.` syntax used inside table-pipeline
//! call arguments (`where`, `select`, `derive`, `group_by`, `sort_by`,
//! `drop_nil`, `fill_nil`), enabled only while [`Parser::in_column_context`]
//! is set.

use tova_ast::{ColumnExpr, Expr};
use tova_base::Symbol;
use tova_lexer::TokenKind;

use crate::expr::ExprParsing;
use crate::parser::Parser;

pub trait ColumnParsing<'src, 'a> {
    /// Parses `.col`, `.col.sub`, or `.col = expr`, assuming the current
    /// token is the leading `.`.
    fn parse_column_expr(&mut self) -> Result<&'a Expr<'a>, ()>;

    /// Parses `-.col`, assuming the current token is `-` followed by `.`.
    fn parse_negated_column_expr(&mut self) -> Result<&'a Expr<'a>, ()>;
}

impl<'src, 'a> ColumnParsing<'src, 'a> for Parser<'src, 'a> {
    fn parse_column_expr(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        let path = self.parse_column_path()?;
        if self.check(TokenKind::Eq) {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(self.arenas.exprs.alloc(Expr::Column {
                expr: ColumnExpr::Assignment { path, value, location },
                location,
            }));
        }
        Ok(self.arenas.exprs.alloc(Expr::Column { expr: ColumnExpr::Column { path, location }, location }))
    }

    fn parse_negated_column_expr(&mut self) -> Result<&'a Expr<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Minus, "expected '-' before negated column expression")?;
        let path = self.parse_column_path()?;
        Ok(self.arenas.exprs.alloc(Expr::Column { expr: ColumnExpr::Negated { path, location }, location }))
    }
}

impl<'src, 'a> Parser<'src, 'a> {
    fn parse_column_path(&mut self) -> Result<&'a [Symbol], ()> {
        self.expect(TokenKind::Dot, "expected '.' to start a column expression")?;
        let mut path = Vec::new();
        let first = self.expect(TokenKind::Identifier, "expected column name after '.'")?.clone();
        path.push(first.value);
        while self.check(TokenKind::Dot) && self.kind_at(1) == TokenKind::Identifier {
            self.advance();
            let seg = self.advance().clone();
            path.push(seg.value);
        }
        Ok(self.arenas.symbols.alloc_slice(path))
    }
}
