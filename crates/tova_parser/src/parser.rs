//! The parser cursor: token access, error recording, and the two levels of
//! error recovery from spec §4.2.

use tova_ast::{Arenas, Block, BlockBody, Program, Stmt, TopLevelItem};
use tova_base::{Diagnostic, DiagnosticBag, DiagnosticCode, Interner, Location, Symbol};
use tova_lexer::{StringPart, Token, TokenKind};
use tova_registry::{BlockKind, BlockRegistry, BlockTrigger};

use crate::decl::DeclParsing;
use crate::stmt::StmtParsing;

/// Tokens that may legally start a statement; used to find the next
/// synchronization point after a parse error inside a block body.
pub(crate) const STATEMENT_START: &[TokenKind] = &[
    TokenKind::Var,
    TokenKind::Let,
    TokenKind::Fn,
    TokenKind::Return,
    TokenKind::If,
    TokenKind::For,
    TokenKind::While,
    TokenKind::Loop,
    TokenKind::Match,
    TokenKind::Type,
    TokenKind::Trait,
    TokenKind::Interface,
    TokenKind::Impl,
    TokenKind::Break,
    TokenKind::Continue,
    TokenKind::Guard,
    TokenKind::With,
    TokenKind::Defer,
    TokenKind::Pub,
    TokenKind::Import,
];

/// Tokens that may legally start a top-level item.
pub(crate) const TOP_LEVEL_START: &[TokenKind] = &[
    TokenKind::Server,
    TokenKind::Browser,
    TokenKind::Shared,
    TokenKind::Test,
    TokenKind::Bench,
    TokenKind::Fn,
    TokenKind::Type,
    TokenKind::Trait,
    TokenKind::Interface,
    TokenKind::Impl,
    TokenKind::Import,
    TokenKind::Pub,
];

/// The outcome of a successful parse: a program plus whatever diagnostics
/// accumulated (non-empty only in tolerant mode).
pub struct ParseOutcome<'a> {
    pub program: Program<'a>,
    pub diagnostics: DiagnosticBag,
}

/// The outcome of a failed, non-tolerant parse: the first error encountered.
pub struct ParseFailure {
    pub diagnostics: DiagnosticBag,
}

pub struct Parser<'src, 'a> {
    pub(crate) tokens: &'src [Token],
    pub(crate) pos: usize,
    pub(crate) file: Symbol,
    pub(crate) arenas: &'a Arenas<'a>,
    pub(crate) interner: &'src mut Interner,
    pub(crate) registry: &'src BlockRegistry,
    pub(crate) diagnostics: DiagnosticBag,
    pub(crate) tolerant: bool,
    /// Set once a non-tolerant error is recorded; every outer loop checks
    /// this and stops producing further items.
    pub(crate) stop: bool,
    /// `true` while parsing a table-pipeline call argument (`where`,
    /// `select`, `derive`, `group_by`, `sort_by`, `drop_nil`, `fill_nil`),
    /// enabling leading-`.` column expressions.
    pub(crate) in_column_context: bool,
    /// Docstring text pending attachment to the next declaration.
    pub(crate) pending_docstring: Option<Symbol>,
}

/// Parses a full token vector into a [`Program`].
pub fn parse_program<'a>(
    tokens: &[Token],
    file: Symbol,
    arenas: &'a Arenas<'a>,
    interner: &mut Interner,
    registry: &BlockRegistry,
    tolerant: bool,
) -> Result<ParseOutcome<'a>, ParseFailure> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        file,
        arenas,
        interner,
        registry,
        diagnostics: DiagnosticBag::new(),
        tolerant,
        stop: false,
        in_column_context: false,
        pending_docstring: None,
    };
    let program = parser.parse_program_inner();

    if !tolerant && parser.diagnostics.has_errors() {
        return Err(ParseFailure { diagnostics: parser.diagnostics });
    }
    Ok(ParseOutcome { program, diagnostics: parser.diagnostics })
}

impl<'src, 'a> Parser<'src, 'a> {
    fn parse_program_inner(&mut self) -> Program<'a> {
        let start_location = self.current_location();
        let mut items = Vec::new();

        self.skip_newlines();
        while !self.is_at_end() && !self.stop {
            self.collect_leading_docstrings();
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            match self.parse_top_level_item() {
                Ok(item) => items.push(item),
                Err(()) => {
                    if self.stop {
                        break;
                    }
                    self.synchronize_top_level();
                }
            }
            self.skip_newlines();
        }

        let items = self.arenas.items.alloc_slice(items);
        Program { file: self.file, items, location: start_location }
    }

    fn parse_top_level_item(&mut self) -> Result<TopLevelItem<'a>, ()> {
        let kind = self.peek_kind();

        if let Some(plugin) = self.registry.lookup_keyword(kind) {
            let block = self.parse_block(plugin.kind)?;
            return Ok(TopLevelItem::Block(block));
        }

        if kind == TokenKind::Identifier {
            let text = self.resolve(self.peek().value).to_string();
            if let Some(plugin) = self.registry.lookup_identifier(&text) {
                if self.identifier_block_follows() {
                    let block = self.parse_block(plugin.kind)?;
                    return Ok(TopLevelItem::Block(block));
                }
            }
        }

        let decl = self.parse_top_level_decl()?;
        Ok(TopLevelItem::Decl(decl))
    }

    /// Looks past the current identifier for `["name"] {`, the shape every
    /// identifier-strategy block requires.
    fn identifier_block_follows(&self) -> bool {
        let mut offset = 1;
        if matches!(self.kind_at(offset), TokenKind::StringTemplate | TokenKind::String) {
            offset += 1;
        }
        self.kind_at(offset) == TokenKind::LBrace
    }

    fn parse_block(&mut self, kind: BlockKind) -> Result<Block<'a>, ()> {
        let location = self.current_location();
        self.advance(); // keyword or identifier

        let name = if matches!(self.peek_kind(), TokenKind::StringTemplate | TokenKind::String) {
            Some(self.expect_plain_string()?)
        } else {
            None
        };

        self.expect(TokenKind::LBrace, "expected '{' to open block body")?;
        let body = self.parse_block_body()?;

        Ok(self.build_block(kind, name, body, location))
    }

    fn build_block(&self, kind: BlockKind, name: Option<Symbol>, body: BlockBody<'a>, location: Location) -> Block<'a> {
        use tova_ast::*;
        match kind {
            BlockKind::Server => Block::Server(ServerBlock { name, body, location }),
            BlockKind::Browser => Block::Browser(BrowserBlock { name, body, location }),
            BlockKind::Shared => Block::Shared(SharedBlock { name, body, location }),
            BlockKind::Test => Block::Test(TestBlock { name, body, location }),
            BlockKind::Bench => Block::Bench(BenchBlock { name, body, location }),
            BlockKind::Cli => Block::Cli(CliBlock { name, body, location }),
            BlockKind::Data => Block::Data(DataBlock { name, body, location }),
            BlockKind::Security => Block::Security(SecurityBlock { name, body, location }),
            BlockKind::Deploy => Block::Deploy(DeployBlock { name, body, location }),
        }
    }

    pub(crate) fn parse_block_body(&mut self) -> Result<BlockBody<'a>, ()> {
        let location = self.current_location();
        let mut stmts: Vec<Stmt<'a>> = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() && !self.stop {
            self.collect_leading_docstrings();
            self.skip_newlines();
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                break;
            }
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => {
                    if self.stop {
                        break;
                    }
                    self.synchronize_statement();
                }
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "expected '}' to close block body")?;
        let items = self.arenas.stmts.alloc_slice(stmts);
        Ok(BlockBody { items, location })
    }

    /// Level 1 recovery: skip to the next newline followed by a known
    /// statement-starting keyword, or a top-level-closing brace.
    fn synchronize_statement(&mut self) {
        while !self.is_at_end() {
            if self.peek_kind() == TokenKind::RBrace {
                return;
            }
            if self.peek_kind() == TokenKind::Newline {
                self.advance();
                if STATEMENT_START.contains(&self.peek_kind()) || self.peek_kind() == TokenKind::RBrace {
                    return;
                }
                continue;
            }
            self.advance();
        }
    }

    /// Level 2 recovery: synchronize to the next top-level keyword.
    fn synchronize_top_level(&mut self) {
        while !self.is_at_end() {
            if TOP_LEVEL_START.contains(&self.peek_kind()) {
                return;
            }
            self.advance();
        }
    }

    /// Joins a run of consecutive `///` docstring tokens into one symbol,
    /// attached to the next-parsed declaration (spec §4.2 docstring
    /// attachment).
    fn collect_leading_docstrings(&mut self) {
        let mut lines = Vec::new();
        while self.check(TokenKind::Docstring) {
            lines.push(self.resolve(self.peek().value));
            self.advance();
            // A docstring run tolerates no blank line between entries.
            if self.check(TokenKind::Newline) && self.kind_at(1) == TokenKind::Docstring {
                self.advance();
            }
        }
        if !lines.is_empty() {
            self.pending_docstring = Some(self.interner.intern(&lines.join("\n")));
        }
    }

    pub(crate) fn take_docstring(&mut self) -> Option<Symbol> {
        self.pending_docstring.take()
    }

    // ---- cursor primitives ----

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn kind_at(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos - 1]
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    pub(crate) fn current_location(&self) -> Location {
        Location::from_position(self.peek().position, self.file)
    }

    pub(crate) fn location_at(&self, token: &Token) -> Location {
        Location::from_position(token.position, self.file)
    }

    pub(crate) fn resolve(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    /// Consumes `kind` or records an `ExpectedButGot` error.
    pub(crate) fn expect(&mut self, kind: TokenKind, context: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let message = format!("{context}, found {:?}", self.peek_kind());
            self.error(DiagnosticCode::ExpectedButGot, message)
        }
    }

    /// Records an error diagnostic at the current token. Returns `Err(())`
    /// always, for `?`-style propagation at call sites; the caller decides
    /// whether to recover (tolerant) or let the abort ripple up (strict).
    pub(crate) fn error<T>(&mut self, code: DiagnosticCode, message: impl Into<String>) -> Result<T, ()> {
        let location = self.current_location();
        self.diagnostics.push_error(Diagnostic::error(code, message, location));
        if !self.tolerant {
            self.stop = true;
        }
        Err(())
    }

    /// Reads a plain string's text, whether it lexed as a single-quoted
    /// `String` token or a (possibly non-interpolating) `StringTemplate`.
    pub(crate) fn expect_plain_string(&mut self) -> Result<Symbol, ()> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::String => {
                self.advance();
                Ok(tok.value)
            }
            TokenKind::StringTemplate => {
                self.advance();
                let template = tok.template.as_ref().expect("StringTemplate token always carries a template");
                if template.has_interpolation() {
                    return self.error(DiagnosticCode::IllegalPattern, "block names must not interpolate");
                }
                let text: String = template
                    .parts
                    .iter()
                    .map(|p| match p {
                        StringPart::Text(t) => t.as_str(),
                        StringPart::Expr(_) => "",
                    })
                    .collect();
                Ok(self.interner.intern(&text))
            }
            _ => self.error(DiagnosticCode::ExpectedButGot, "expected a string literal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_ast::Decl;

    fn parse(source: &str, tolerant: bool) -> Result<(Program<'static>, DiagnosticBag), ParseFailure> {
        let arenas: &'static Arenas<'static> = Box::leak(Box::new(Arenas::new()));
        let mut interner = Interner::new();
        let file = interner.intern("test.tova");
        let registry = BlockRegistry::standard();
        let tokens = tova_lexer::tokenize(source, &mut interner).expect("lexing should succeed");
        parse_program(&tokens, file, arenas, &mut interner, &registry, tolerant).map(|o| (o.program, o.diagnostics))
    }

    #[test]
    fn bare_function_is_module_mode() {
        let (program, _) = parse("pub fn greet(name) {\n  return name\n}\n", false).expect("parse should succeed");
        assert!(program.is_module_mode());
        assert_eq!(program.items.len(), 1);
        assert!(matches!(&program.items[0], TopLevelItem::Decl(Decl::Function(_))));
    }

    #[test]
    fn server_block_is_not_module_mode() {
        let (program, _) = parse("server {\n  fn handler() {\n    return 1\n  }\n}\n", false).expect("parse should succeed");
        assert!(!program.is_module_mode());
        assert_eq!(program.blocks().count(), 1);
    }

    #[test]
    fn style_block_collapses_into_a_single_style_decl() {
        let source = "browser {\n  component Card() {\n    style {\n      p { color: red; }\n    }\n    return <div></div>\n  }\n}\n";
        let (program, _) = parse(source, false).expect("parse should succeed");
        let Block::Browser(browser) = program.blocks().next().expect("one browser block") else {
            panic!("expected a browser block")
        };
        let component = browser.body.items.iter().find_map(|stmt| match stmt {
            Stmt::Decl { decl: Decl::Component(c), .. } => Some(c),
            _ => None,
        });
        let component = component.expect("component decl present");
        let style_count = component.body.statements.iter().filter(|s| matches!(s, Stmt::Decl { decl: Decl::Style(_), .. })).count();
        assert_eq!(style_count, 1);
    }

    #[test]
    fn tolerant_mode_recovers_past_a_bad_statement() {
        let source = "pub fn f() {\n  let = \n  return 1\n}\n";
        let (_, diagnostics) = parse(source, true).expect("tolerant parse never hard-fails");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn non_tolerant_mode_aborts_on_first_error() {
        let source = "pub fn f() {\n  let = \n  return 1\n}\n";
        let result = parse(source, false);
        assert!(result.is_err());
    }
}
