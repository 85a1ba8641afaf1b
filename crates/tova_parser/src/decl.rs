//! Declaration grammar: functions, types, traits, impls, imports, and the
//! browser/server-specific declarations (`state`, `route`, ...) that appear
//! in statement position inside a block body.

use tova_ast::{
    AiDecl, ComponentDecl, ComputedDecl, Decl, DbDecl, EffectDecl, Expr, FieldDecl, FunctionDecl,
    HttpMethod, ImplDecl, ImportDecl, MethodSignature, MiddlewareDecl, RouteDecl, SseDecl,
    StateDecl, StoreDecl, StyleDecl, TraitDecl, TypeDecl, VariantDecl, WebsocketDecl,
};
use tova_base::{DiagnosticCode, Symbol};
use tova_lexer::TokenKind;

use crate::expr::ExprParsing;
use crate::parser::Parser;

pub trait DeclParsing<'src, 'a> {
    /// Parses a `fn`/`type`/`trait`/`interface`/`impl`/`import` item, with
    /// an optional leading `pub`.
    fn parse_top_level_decl(&mut self) -> Result<Decl<'a>, ()>;
}

impl<'src, 'a> DeclParsing<'src, 'a> for Parser<'src, 'a> {
    fn parse_top_level_decl(&mut self) -> Result<Decl<'a>, ()> {
        let docstring = self.take_docstring();
        let is_pub = if self.check(TokenKind::Pub) {
            self.advance();
            true
        } else {
            false
        };
        let is_async = if self.check(TokenKind::Async) {
            self.advance();
            true
        } else {
            false
        };

        match self.peek_kind() {
            TokenKind::Fn => Ok(Decl::Function(self.parse_function_decl(is_pub, is_async, docstring)?)),
            TokenKind::Type => Ok(Decl::Type(self.parse_type_decl(is_pub, docstring)?)),
            TokenKind::Trait => Ok(Decl::Trait(self.parse_trait_decl(is_pub)?)),
            TokenKind::Interface => Ok(Decl::Interface(self.parse_trait_decl(is_pub)?)),
            TokenKind::Impl => Ok(Decl::Impl(self.parse_impl_decl()?)),
            TokenKind::Import => Ok(Decl::Import(self.parse_import_decl()?)),
            _ => self.error(DiagnosticCode::UnexpectedToken, format!("expected a declaration, found {:?}", self.peek_kind())),
        }
    }
}

impl<'src, 'a> Parser<'src, 'a> {
    fn parse_function_decl(
        &mut self,
        is_pub: bool,
        is_async: bool,
        docstring: Option<Symbol>,
    ) -> Result<FunctionDecl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Fn, "expected 'fn'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a function name")?.clone();
        let params = self.parse_param_list()?;
        let return_type = if self.check(TokenKind::Arrow) {
            self.advance();
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        let body = self.parse_stmt_block()?;
        Ok(FunctionDecl { name: name_tok.value, params, return_type, body, is_async, is_pub, docstring, location })
    }

    fn parse_type_decl(&mut self, is_pub: bool, docstring: Option<Symbol>) -> Result<TypeDecl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Type, "expected 'type'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a type name")?.clone();

        let mut type_params = Vec::new();
        if self.check(TokenKind::Lt) {
            self.advance();
            while !self.check(TokenKind::Gt) && !self.is_at_end() {
                let param_tok = self.expect(TokenKind::Identifier, "expected a type parameter name")?.clone();
                type_params.push(param_tok.value);
                if !self.check(TokenKind::Gt) {
                    self.expect(TokenKind::Comma, "expected ',' between type parameters")?;
                }
            }
            self.expect(TokenKind::Gt, "expected '>' to close type parameter list")?;
        }

        self.expect(TokenKind::Eq, "expected '=' after type name")?;
        self.skip_newlines();
        let variants = self.parse_variant_list()?;
        let type_params = self.arenas.symbols.alloc_slice(type_params);
        Ok(TypeDecl { name: name_tok.value, type_params, variants, is_pub, docstring, location })
    }

    fn parse_variant_list(&mut self) -> Result<&'a [VariantDecl<'a>], ()> {
        let mut variants = Vec::new();
        loop {
            if !self.check(TokenKind::Identifier) {
                break;
            }
            variants.push(self.parse_variant()?);
            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        Ok(self.arenas.variant_decls.alloc_slice(variants))
    }

    fn parse_variant(&mut self) -> Result<VariantDecl<'a>, ()> {
        let location = self.current_location();
        let name_tok = self.expect(TokenKind::Identifier, "expected a variant name")?.clone();
        let fields: &'a [FieldDecl<'a>] = if self.check(TokenKind::LParen) {
            self.advance();
            let mut fields = Vec::new();
            let mut index = 0usize;
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                let field_location = self.current_location();
                let type_annotation = Some(self.parse_type_annotation()?);
                let positional_name = self.interner.intern(&index.to_string());
                fields.push(FieldDecl { name: positional_name, type_annotation, location: field_location });
                index += 1;
                if !self.check(TokenKind::RParen) {
                    self.expect(TokenKind::Comma, "expected ',' between tuple variant fields")?;
                }
            }
            self.expect(TokenKind::RParen, "expected ')' to close tuple variant")?;
            self.arenas.field_decls.alloc_slice(fields)
        } else if self.check(TokenKind::LBrace) {
            self.advance();
            self.skip_newlines();
            let mut fields = Vec::new();
            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let field_location = self.current_location();
                let field_name = self.expect(TokenKind::Identifier, "expected a field name")?.clone();
                self.expect(TokenKind::Colon, "expected ':' after field name")?;
                let type_annotation = Some(self.parse_type_annotation()?);
                fields.push(FieldDecl { name: field_name.value, type_annotation, location: field_location });
                self.skip_newlines();
                if self.check(TokenKind::Comma) {
                    self.advance();
                    self.skip_newlines();
                }
            }
            self.expect(TokenKind::RBrace, "expected '}' to close struct variant")?;
            self.arenas.field_decls.alloc_slice(fields)
        } else {
            &[]
        };
        Ok(VariantDecl { name: name_tok.value, fields, location })
    }

    fn parse_trait_decl(&mut self, is_pub: bool) -> Result<TraitDecl<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `trait` or `interface`
        let name_tok = self.expect(TokenKind::Identifier, "expected a trait name")?.clone();
        self.expect(TokenKind::LBrace, "expected '{' to open trait body")?;
        self.skip_newlines();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let method_location = self.current_location();
            self.expect(TokenKind::Fn, "expected a method signature")?;
            let method_name = self.expect(TokenKind::Identifier, "expected a method name")?.clone();
            let params = self.parse_param_list()?;
            let return_type = if self.check(TokenKind::Arrow) {
                self.advance();
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            methods.push(MethodSignature { name: method_name.value, params, return_type, location: method_location });
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "expected '}' to close trait body")?;
        let methods = self.arenas.method_signatures.alloc_slice(methods);
        Ok(TraitDecl { name: name_tok.value, methods, is_pub, location })
    }

    fn parse_impl_decl(&mut self) -> Result<ImplDecl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Impl, "expected 'impl'")?;
        let first_tok = self.expect(TokenKind::Identifier, "expected a trait or type name after 'impl'")?.clone();
        let (trait_name, type_name) = if self.check(TokenKind::For) {
            self.advance();
            let type_tok = self.expect(TokenKind::Identifier, "expected a type name after 'for'")?.clone();
            (Some(first_tok.value), type_tok.value)
        } else {
            (None, first_tok.value)
        };
        self.expect(TokenKind::LBrace, "expected '{' to open impl body")?;
        self.skip_newlines();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let is_async = if self.check(TokenKind::Async) {
                self.advance();
                true
            } else {
                false
            };
            methods.push(self.parse_function_decl(false, is_async, None)?);
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "expected '}' to close impl body")?;
        let methods = self.arenas.function_decls.alloc_slice(methods);
        Ok(ImplDecl { trait_name, type_name, methods, location })
    }

    fn parse_import_decl(&mut self) -> Result<ImportDecl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Import, "expected 'import'")?;
        let mut names = Vec::new();
        if self.check(TokenKind::LBrace) {
            self.advance();
            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let name_tok = self.expect(TokenKind::Identifier, "expected an imported name")?.clone();
                names.push(name_tok.value);
                if !self.check(TokenKind::RBrace) {
                    self.expect(TokenKind::Comma, "expected ',' between imported names")?;
                }
            }
            self.expect(TokenKind::RBrace, "expected '}' to close import list")?;
        } else {
            let name_tok = self.expect(TokenKind::Identifier, "expected an imported name")?.clone();
            names.push(name_tok.value);
        }
        self.expect(TokenKind::From, "expected 'from' after imported names")?;
        let source = self.expect_plain_string()?;
        let names = self.arenas.symbols.alloc_slice(names);
        Ok(ImportDecl { names, source, location })
    }

    // ---- browser-only declarations ----

    pub(crate) fn parse_state_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::State, "expected 'state'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a state name")?.clone();
        let type_annotation = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        self.expect(TokenKind::Eq, "expected '=' after state name")?;
        let initial = self.parse_expr()?;
        Ok(Decl::State(StateDecl { name: name_tok.value, type_annotation, initial, location }))
    }

    pub(crate) fn parse_computed_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Computed, "expected 'computed'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a computed name")?.clone();
        self.expect(TokenKind::Eq, "expected '=' after computed name")?;
        let body = self.parse_expr()?;
        Ok(Decl::Computed(ComputedDecl { name: name_tok.value, body, location }))
    }

    pub(crate) fn parse_effect_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Effect, "expected 'effect'")?;
        let body = self.parse_stmt_block()?;
        Ok(Decl::Effect(EffectDecl { body, location }))
    }

    pub(crate) fn parse_component_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Component, "expected 'component'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a component name")?.clone();
        let props = self.parse_param_list()?;
        let body = self.parse_stmt_block()?;
        Ok(Decl::Component(ComponentDecl { name: name_tok.value, props, body, location }))
    }

    /// The lexer collapses the entire `style { ... }` construct into a
    /// single [`TokenKind::RawCss`] token, so parsing is just reading its
    /// payload — the braces were already consumed verbatim.
    pub(crate) fn parse_style_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        let tok = self.expect(TokenKind::RawCss, "expected a style block")?.clone();
        Ok(Decl::Style(StyleDecl { css: tok.value, location }))
    }

    pub(crate) fn parse_store_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Store, "expected 'store'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a store name")?.clone();
        let body = self.parse_stmt_block()?;
        Ok(Decl::Store(StoreDecl { name: name_tok.value, body, location }))
    }

    // ---- server-only declarations ----

    pub(crate) fn parse_route_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Route, "expected 'route'")?;
        let method_tok = self.expect(TokenKind::Identifier, "expected an HTTP method")?.clone();
        let method = match self.resolve(method_tok.value).to_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            "HEAD" => HttpMethod::Head,
            other => {
                return self.error(DiagnosticCode::UnexpectedToken, format!("unknown HTTP method '{other}'"));
            }
        };
        let path = self.expect_plain_string()?;
        self.expect(TokenKind::FatArrow, "expected '=>' after route path")?;
        let handler = self.parse_expr()?;
        Ok(Decl::Route(RouteDecl { method, path, handler, location }))
    }

    pub(crate) fn parse_middleware_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.expect(TokenKind::Middleware, "expected 'middleware'")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a middleware name")?.clone();
        let body = self.parse_stmt_block()?;
        Ok(Decl::Middleware(MiddlewareDecl { name: name_tok.value, body, location }))
    }

    pub(crate) fn parse_websocket_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `websocket`
        let path = self.expect_plain_string()?;
        let body = self.parse_stmt_block()?;
        Ok(Decl::Websocket(WebsocketDecl { path, body, location }))
    }

    pub(crate) fn parse_sse_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `sse`
        let path = self.expect_plain_string()?;
        let body = self.parse_stmt_block()?;
        Ok(Decl::Sse(SseDecl { path, body, location }))
    }

    pub(crate) fn parse_db_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `db`
        let name_tok = self.expect(TokenKind::Identifier, "expected a db connection name")?.clone();
        let config = self.parse_config_block()?;
        Ok(Decl::Db(DbDecl { name: name_tok.value, config, location }))
    }

    pub(crate) fn parse_ai_decl(&mut self) -> Result<Decl<'a>, ()> {
        let location = self.current_location();
        self.advance(); // `ai`
        let name_tok = self.expect(TokenKind::Identifier, "expected an ai connection name")?.clone();
        let config = self.parse_config_block()?;
        Ok(Decl::Ai(AiDecl { name: name_tok.value, config, location }))
    }

    fn parse_config_block(&mut self) -> Result<&'a [(Symbol, Expr<'a>)], ()> {
        self.expect(TokenKind::LBrace, "expected '{' to open a config block")?;
        self.skip_newlines();
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let key_tok = self.expect(TokenKind::Identifier, "expected a config key")?.clone();
            self.expect(TokenKind::Colon, "expected ':' after config key")?;
            let value = (*self.parse_expr()?).clone();
            entries.push((key_tok.value, value));
            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            }
        }
        self.expect(TokenKind::RBrace, "expected '}' to close config block")?;
        Ok(self.arenas.config_entries.alloc_slice(entries))
    }
}
