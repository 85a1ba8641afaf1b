//! Server-target emission: routes, the `/rpc/<name>` auto-surface,
//! middleware, websocket/SSE handlers, and db/ai declarations.
//!
//! The router, websocket/SSE transport, and db/ai clients are external
//! runtime collaborators the emitted code imports (spec's Non-goals name
//! "the JS runtime libraries (reactivity, router, I/O)" as out of scope),
//! so this module only emits *calls* against an assumed global
//! `tova_router` object and `tova_ws`/`tova_sse`/`tova_db`/`tova_ai`
//! factory functions — never an implementation of routing or transport.
//!
//! `cli`/`data`/`security` blocks have no dedicated runtime surface of
//! their own; their declarations are ordinary functions/values a server
//! process can call, so their bodies are folded into the same server
//! buffer as plain declarations rather than routed through a separate
//! emitter.

use std::collections::HashSet;

use tova_ast::{Decl, Expr, FunctionDecl, HttpMethod};
use tova_base::{Interner, Symbol};

use crate::decl::emit_decls;
use crate::emitter::Emitter;
use crate::expr::emit_expr;
use crate::stmt::emit_block;
use crate::strings::js_ident;

/// Emits every server-only declaration in `decls`, plus every plain
/// declaration folded in from sibling `cli`/`data`/`security` blocks.
/// `peer_names` is the set of sibling named `server` blocks, used to
/// decide which functions need to become `async` for a cross-server
/// `peer.fn(...)` call.
pub fn emit_server_decls(emitter: &mut Emitter, decls: &[&Decl<'_>], peer_names: &HashSet<Symbol>, interner: &Interner) {
    // `Decl::Function` is excluded here and emitted below via
    // `emit_peer_aware_function` instead, since only that path detects
    // cross-server `peer.fn(...)` calls and marks the function `async`.
    let plain: Vec<&Decl<'_>> = decls
        .iter()
        .copied()
        .filter(|d| !matches!(d, Decl::Function(_) | Decl::Route(_) | Decl::Middleware(_) | Decl::Websocket(_) | Decl::Sse(_) | Decl::Db(_) | Decl::Ai(_)))
        .collect();
    emit_decls(emitter, &plain, interner);

    let rpc_names: Vec<&str> = decls
        .iter()
        .filter_map(|d| match d {
            Decl::Function(f) => Some(interner.resolve(f.name)),
            _ => None,
        })
        .collect();

    for decl in decls.iter() {
        match decl {
            Decl::Function(f) => emit_peer_aware_function(emitter, f, peer_names, interner),
            Decl::Route(r) => emit_route(emitter, r, interner),
            Decl::Middleware(m) => {
                emitter.line(&format!("tova_router.use((req, res, next) => {{"));
                emitter.indented(|e| emit_block(e, &m.body, interner));
                emitter.line("});");
            }
            Decl::Websocket(w) => {
                let path = crate::strings::js_string_literal(interner.resolve(w.path));
                emitter.line(&format!("tova_ws({path}, (socket) => {{"));
                emitter.indented(|e| emit_block(e, &w.body, interner));
                emitter.line("});");
            }
            Decl::Sse(s) => {
                let path = crate::strings::js_string_literal(interner.resolve(s.path));
                emitter.line(&format!("tova_sse({path}, (stream) => {{"));
                emitter.indented(|e| emit_block(e, &s.body, interner));
                emitter.line("});");
            }
            Decl::Db(db) => emit_config_call(emitter, "tova_db", db.name, db.config, interner),
            Decl::Ai(ai) => emit_config_call(emitter, "tova_ai", ai.name, ai.config, interner),
            _ => {} // already emitted via `emit_decls` above
        }
    }

    for name in rpc_names {
        emit_rpc_surface(emitter, name);
    }
}

fn emit_peer_aware_function(emitter: &mut Emitter, decl: &FunctionDecl<'_>, peer_names: &HashSet<Symbol>, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let params: Vec<String> = decl.params.iter().map(|p| js_ident(interner.resolve(p.name))).collect();
    let is_async = decl.is_async || block_calls_peer(&decl.body, peer_names);
    let keyword = if is_async { "async function" } else { "function" };
    emitter.line(&format!("{keyword} {name}({}) {{", params.join(", ")));
    emitter.indented(|e| emit_block(e, &decl.body, interner));
    emitter.line("}");
}

fn emit_route(emitter: &mut Emitter, route: &tova_ast::RouteDecl<'_>, interner: &Interner) {
    let method = match route.method {
        HttpMethod::Get => "get",
        HttpMethod::Post => "post",
        HttpMethod::Put => "put",
        HttpMethod::Patch => "patch",
        HttpMethod::Delete => "delete",
        HttpMethod::Options => "options",
        HttpMethod::Head => "head",
    };
    let path = crate::strings::js_string_literal(interner.resolve(route.path));
    let handler_js = emit_expr(emitter, route.handler, interner);
    emitter.line(&format!("tova_router.{method}({path}, {handler_js});"));
}

fn emit_rpc_surface(emitter: &mut Emitter, name: &str) {
    emitter.line(&format!("tova_router.post('/rpc/{name}', async (req) => {{"));
    emitter.indented(|e| {
        e.line("const __args = await req.json();");
        e.line(&format!("return {name}(...Object.values(__args));"));
    });
    emitter.line("});");
}

fn emit_config_call(emitter: &mut Emitter, factory: &str, name: Symbol, config: &[(Symbol, Expr<'_>)], interner: &Interner) {
    let var_name = js_ident(interner.resolve(name));
    let entries: Vec<String> = config
        .iter()
        .map(|(key, value)| format!("{}: {}", js_ident(interner.resolve(*key)), emit_expr(emitter, value, interner)))
        .collect();
    emitter.line(&format!("const {var_name} = {factory}({{{}}});", entries.join(", ")));
}

/// `true` if `block` contains a call whose callee is `peer.fn(...)` for a
/// `peer` in `peer_names` — the syntactic trigger spec describes for
/// making the enclosing function `async`.
fn block_calls_peer(block: &tova_ast::StmtBlock<'_>, peers: &HashSet<Symbol>) -> bool {
    block.statements.iter().any(|s| stmt_calls_peer(s, peers))
}

fn stmt_calls_peer(stmt: &tova_ast::Stmt<'_>, peers: &HashSet<Symbol>) -> bool {
    use tova_ast::Stmt;
    match stmt {
        Stmt::Decl { .. } => false,
        Stmt::Let { value, .. } => value.map(|v| expr_calls_peer(v, peers)).unwrap_or(false),
        Stmt::LetDestructure { value, .. } => expr_calls_peer(value, peers),
        Stmt::Assign { target, value, .. } => expr_calls_peer(target, peers) || expr_calls_peer(value, peers),
        Stmt::CompoundAssign { target, value, .. } => expr_calls_peer(target, peers) || expr_calls_peer(value, peers),
        Stmt::Expr { expr, .. } => expr_calls_peer(expr, peers),
        Stmt::Block { block, .. } => block_calls_peer(block, peers),
        Stmt::Return { value, .. } => value.map(|v| expr_calls_peer(v, peers)).unwrap_or(false),
        Stmt::If { condition, then_branch, else_branch, .. } => {
            expr_calls_peer(condition, peers) || block_calls_peer(then_branch, peers) || else_branch.as_ref().map(|b| block_calls_peer(b, peers)).unwrap_or(false)
        }
        Stmt::For { stmt, .. } => {
            expr_calls_peer(stmt.iterable, peers) || block_calls_peer(&stmt.body, peers) || stmt.else_branch.as_ref().map(|b| block_calls_peer(b, peers)).unwrap_or(false)
        }
        Stmt::While { condition, body, .. } => expr_calls_peer(condition, peers) || block_calls_peer(body, peers),
        Stmt::Loop { body, .. } => block_calls_peer(body, peers),
        Stmt::Match { subject, arms, .. } => expr_calls_peer(subject, peers) || arms.iter().any(|a| block_calls_peer(&a.body, peers)),
        Stmt::Break { .. } | Stmt::Continue { .. } => false,
        Stmt::Guard { condition, else_branch, .. } => expr_calls_peer(condition, peers) || block_calls_peer(else_branch, peers),
        Stmt::With { resource, body, .. } => expr_calls_peer(resource, peers) || block_calls_peer(body, peers),
        Stmt::Defer { body, .. } => block_calls_peer(body, peers),
        Stmt::TryCatch { try_block, catch_block, finally_block, .. } => {
            block_calls_peer(try_block, peers) || block_calls_peer(catch_block, peers) || finally_block.as_ref().map(|b| block_calls_peer(b, peers)).unwrap_or(false)
        }
    }
}

fn expr_calls_peer(expr: &Expr<'_>, peers: &HashSet<Symbol>) -> bool {
    match expr {
        Expr::Call { callee, args, .. } => {
            let is_peer_call = match &**callee {
                Expr::Member { object, .. } => match &**object {
                    Expr::Identifier { name, .. } => peers.contains(name),
                    _ => false,
                },
                _ => false,
            };
            is_peer_call || expr_calls_peer(callee, peers) || args.iter().any(|a| expr_calls_peer(a.value, peers))
        }
        Expr::Literal { .. } | Expr::Identifier { .. } | Expr::Column { .. } => false,
        Expr::Binary { left, right, .. } => expr_calls_peer(left, peers) || expr_calls_peer(right, peers),
        Expr::Unary { operand, .. } => expr_calls_peer(operand, peers),
        Expr::ChainedComparison { operands, .. } => operands.iter().any(|o| expr_calls_peer(o, peers)),
        Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => expr_calls_peer(object, peers),
        Expr::Index { object, index, .. } => expr_calls_peer(object, peers) || expr_calls_peer(index, peers),
        Expr::Slice { object, low, high, step, .. } => {
            expr_calls_peer(object, peers)
                || low.map(|e| expr_calls_peer(e, peers)).unwrap_or(false)
                || high.map(|e| expr_calls_peer(e, peers)).unwrap_or(false)
                || step.map(|e| expr_calls_peer(e, peers)).unwrap_or(false)
        }
        Expr::Pipe { left, target, .. } => expr_calls_peer(left, peers) || expr_calls_peer(target, peers),
        Expr::Lambda { .. } => false,
        Expr::Match { subject, arms, .. } => expr_calls_peer(subject, peers) || arms.iter().any(|a| expr_calls_peer(a.body, peers)),
        Expr::Spread { inner, .. } | Expr::Await { inner, .. } | Expr::Propagate { inner, .. } => expr_calls_peer(inner, peers),
        Expr::Yield { inner, .. } => inner.map(|e| expr_calls_peer(e, peers)).unwrap_or(false),
        Expr::If { condition, then_branch, else_branch, .. } => {
            expr_calls_peer(condition, peers) || expr_calls_peer(then_branch, peers) || else_branch.map(|e| expr_calls_peer(e, peers)).unwrap_or(false)
        }
        Expr::Is { subject, .. } => expr_calls_peer(subject, peers),
        Expr::Membership { value, iterable, .. } => expr_calls_peer(value, peers) || expr_calls_peer(iterable, peers),
        Expr::CompoundAssign { target, value, .. } => expr_calls_peer(target, peers) || expr_calls_peer(value, peers),
        Expr::ListComprehension { comprehension, .. } | Expr::DictComprehension { comprehension, .. } => expr_calls_peer(comprehension.element, peers),
        Expr::Range { low, high, .. } => expr_calls_peer(low, peers) || expr_calls_peer(high, peers),
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => elements.iter().any(|e| expr_calls_peer(e, peers)),
        Expr::Dict { entries, .. } => entries.iter().any(|(k, v)| expr_calls_peer(k, peers) || expr_calls_peer(v, peers)),
        Expr::Jsx { .. } => false,
        Expr::As { inner, .. } => expr_calls_peer(inner, peers),
    }
}
