//! JS code generation: walks a semantically-checked `Program` and emits
//! one JS module per target its blocks populate.
//!
//! `shared { ... }` content (and, in module mode, every top-level `pub`
//! declaration) is emitted once into a target's `Emitter` *before* that
//! target's own declarations, so helper requirements and `const`
//! declarations from both land in a single buffer and get deduplicated by
//! `Emitter::finish` rather than risking a double `const` when two targets
//! both pull in the same helper.

pub mod browser;
pub mod css;
pub mod decl;
pub mod devirt;
pub mod emitter;
pub mod expr;
pub mod jsx;
pub mod pattern;
pub mod reactive;
pub mod server;
pub mod stmt;
pub mod strings;

use std::collections::HashSet;

use tova_ast::{Block, Decl, Program, Stmt, TopLevelItem};
use tova_base::{Interner, Symbol};

use emitter::Emitter;

/// One emitted JS module per target a program's blocks touch. Absent
/// fields mean the program had no block of that kind.
#[derive(Debug, Default, Clone)]
pub struct CompiledOutput {
    pub shared: Option<String>,
    pub server: Option<String>,
    pub browser: Option<String>,
    pub test: Option<String>,
    pub bench: Option<String>,
}

/// Compiles a checked `Program` to its target JS modules.
///
/// Module-mode files (no blocks at all) emit every top-level `pub`
/// declaration as `shared`; nothing else is populated. `deploy` blocks
/// never produce codegen output here — their `env`/config reads feed
/// `tova_deploy`'s manifest inferencer instead.
pub fn compile_program(program: &Program<'_>, interner: &Interner) -> CompiledOutput {
    if program.is_module_mode() {
        let decls = module_decls(program);
        let mut emitter = Emitter::new();
        decl::emit_decls(&mut emitter, &decls, interner);
        return CompiledOutput { shared: non_empty(emitter), ..Default::default() };
    }

    let peer_names: HashSet<Symbol> = program
        .blocks()
        .filter_map(|b| match b {
            Block::Server(s) => s.name,
            _ => None,
        })
        .collect();

    let shared_stmts = block_items(program, |b| matches!(b, Block::Shared(_)));
    let shared_decls = decls_of(&shared_stmts);
    let shared_loose = loose_of(&shared_stmts);

    let mut out = CompiledOutput::default();

    let mut shared_only = Emitter::new();
    decl::emit_decls(&mut shared_only, &shared_decls, interner);
    for stmt in &shared_loose {
        stmt::emit_stmt(&mut shared_only, stmt, interner);
    }
    out.shared = non_empty(shared_only);

    let server_stmts = block_items(program, |b| matches!(b, Block::Server(_) | Block::Cli(_) | Block::Data(_) | Block::Security(_)));
    if !server_stmts.is_empty() {
        let mut e = Emitter::new();
        decl::emit_decls(&mut e, &shared_decls, interner);
        for stmt in &shared_loose {
            stmt::emit_stmt(&mut e, stmt, interner);
        }
        let server_decls = decls_of(&server_stmts);
        server::emit_server_decls(&mut e, &server_decls, &peer_names, interner);
        for stmt in loose_of(&server_stmts) {
            stmt::emit_stmt(&mut e, stmt, interner);
        }
        out.server = non_empty(e);
    }

    let browser_stmts = block_items(program, |b| matches!(b, Block::Browser(_)));
    if !browser_stmts.is_empty() {
        let mut e = Emitter::new();
        decl::emit_decls(&mut e, &shared_decls, interner);
        for stmt in &shared_loose {
            stmt::emit_stmt(&mut e, stmt, interner);
        }
        let browser_decls = decls_of(&browser_stmts);
        // `decl::emit_decls` no-ops browser-only forms, `emit_browser_decls`
        // no-ops everything else — together they partition the block.
        decl::emit_decls(&mut e, &browser_decls, interner);
        browser::emit_browser_decls(&mut e, &browser_decls, interner);
        for stmt in loose_of(&browser_stmts) {
            stmt::emit_stmt(&mut e, stmt, interner);
        }
        out.browser = non_empty(e);
    }

    let test_stmts = block_items(program, |b| matches!(b, Block::Test(_)));
    if !test_stmts.is_empty() {
        let mut e = Emitter::new();
        decl::emit_decls(&mut e, &shared_decls, interner);
        decl::emit_decls(&mut e, &decls_of(&test_stmts), interner);
        for stmt in loose_of(&test_stmts) {
            stmt::emit_stmt(&mut e, stmt, interner);
        }
        out.test = non_empty(e);
    }

    let bench_stmts = block_items(program, |b| matches!(b, Block::Bench(_)));
    if !bench_stmts.is_empty() {
        let mut e = Emitter::new();
        decl::emit_decls(&mut e, &shared_decls, interner);
        decl::emit_decls(&mut e, &decls_of(&bench_stmts), interner);
        for stmt in loose_of(&bench_stmts) {
            stmt::emit_stmt(&mut e, stmt, interner);
        }
        out.bench = non_empty(e);
    }

    out
}

fn non_empty(emitter: Emitter) -> Option<String> {
    if emitter.is_empty() {
        None
    } else {
        Some(emitter.finish())
    }
}

fn module_decls<'a>(program: &'a Program<'a>) -> Vec<&'a Decl<'a>> {
    program
        .items
        .iter()
        .filter_map(|item| match item {
            TopLevelItem::Decl(d) => Some(d),
            TopLevelItem::Block(_) => None,
        })
        .collect()
}

fn block_items<'a>(program: &'a Program<'a>, pred: impl Fn(&Block<'a>) -> bool) -> Vec<&'a Stmt<'a>> {
    program.blocks().filter(|b| pred(b)).flat_map(|b| b.body().items.iter()).collect()
}

fn decls_of<'a>(stmts: &[&'a Stmt<'a>]) -> Vec<&'a Decl<'a>> {
    stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::Decl { decl, .. } => Some(decl),
            _ => None,
        })
        .collect()
}

fn loose_of<'a>(stmts: &[&'a Stmt<'a>]) -> Vec<&'a Stmt<'a>> {
    stmts.iter().copied().filter(|s| !matches!(s, Stmt::Decl { .. })).collect()
}
