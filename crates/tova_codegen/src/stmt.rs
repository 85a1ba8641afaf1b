//! Statement and block emission, shared by every target.
//!
//! `guard` lowers to an early `if (!cond) { elseBody }`; `with` to a
//! try/finally calling `close`/`dispose` on the bound resource; `defer` to
//! a finally hook appended to the nearest enclosing try. Labeled
//! loops/`break`/`continue` carry their label straight through, matching
//! JS's own labeled-statement grammar.
//!
//! `for ... else` has no JS equivalent, so a bare (unlabeled) `break`
//! written directly inside such a loop needs to also flip a completion
//! flag before leaving. `BreakCtx` carries that flag's name down through
//! the body and is cleared whenever a nested loop is entered, since that
//! loop's own bare breaks target itself, not the outer one.

use tova_ast::{CompoundAssignOpKind, Expr, ForStmt, Stmt};
use tova_base::Interner;

use crate::emitter::{Emitter, Helper};
use crate::expr::emit_expr;
use crate::pattern::compile_pattern;
use crate::strings::js_ident;

type BreakCtx<'a> = Option<&'a str>;

pub fn emit_block(emitter: &mut Emitter, block: &tova_ast::StmtBlock<'_>, interner: &Interner) {
    emit_block_ctx(emitter, block, interner, None);
}

fn emit_block_ctx(emitter: &mut Emitter, block: &tova_ast::StmtBlock<'_>, interner: &Interner, ctx: BreakCtx<'_>) {
    let stmts = block.statements;
    let mut i = 0;
    while i < stmts.len() {
        if let Some(consumed) = crate::devirt::try_scalar_replace(emitter, &stmts[i..], interner) {
            i += consumed;
            continue;
        }
        emit_stmt_ctx(emitter, &stmts[i], interner, ctx);
        i += 1;
    }
}

pub fn emit_stmt(emitter: &mut Emitter, stmt: &Stmt<'_>, interner: &Interner) {
    emit_stmt_ctx(emitter, stmt, interner, None);
}

fn emit_stmt_ctx(emitter: &mut Emitter, stmt: &Stmt<'_>, interner: &Interner, ctx: BreakCtx<'_>) {
    match stmt {
        Stmt::Decl { decl, .. } => crate::decl::emit_decls(emitter, &[decl], interner),
        Stmt::Let { name, value, .. } => {
            let name_js = js_ident(interner.resolve(*name));
            match value {
                Some(v) => {
                    let v_js = emit_expr(emitter, v, interner);
                    emitter.line(&format!("let {name_js} = {v_js};"));
                }
                None => emitter.line(&format!("let {name_js};")),
            }
        }
        Stmt::LetDestructure { pattern, value, .. } => {
            let v_js = emit_expr(emitter, value, interner);
            emitter.line(&format!("const __destr = {v_js};"));
            let compiled = compile_pattern(pattern, "__destr", interner);
            for (name, accessor) in &compiled.bindings {
                emitter.line(&format!("let {name} = {accessor};"));
            }
        }
        Stmt::Assign { target, value, .. } => {
            let t_js = emit_expr(emitter, target, interner);
            let v_js = emit_expr(emitter, value, interner);
            emitter.line(&format!("{t_js} = {v_js};"));
        }
        Stmt::CompoundAssign { op, target, value, .. } => {
            let t_js = emit_expr(emitter, target, interner);
            let v_js = emit_expr(emitter, value, interner);
            emitter.line(&format!("{t_js} {} {v_js};", compound_op_js(*op)));
        }
        Stmt::Expr { expr, .. } => {
            let e_js = emit_expr(emitter, expr, interner);
            emitter.line(&format!("{e_js};"));
        }
        Stmt::Block { block, .. } => {
            emitter.line("{");
            emitter.indented(|e| emit_block_ctx(e, block, interner, ctx));
            emitter.line("}");
        }
        Stmt::Return { value, .. } => match value {
            Some(v) => {
                let v_js = emit_expr(emitter, v, interner);
                emitter.line(&format!("return {v_js};"));
            }
            None => emitter.line("return;"),
        },
        Stmt::If { condition, then_branch, else_branch, .. } => {
            let c_js = emit_expr(emitter, condition, interner);
            emitter.line(&format!("if ({c_js}) {{"));
            emitter.indented(|e| emit_block_ctx(e, then_branch, interner, ctx));
            match else_branch {
                Some(else_block) => {
                    emitter.line("} else {");
                    emitter.indented(|e| emit_block_ctx(e, else_block, interner, ctx));
                    emitter.line("}");
                }
                None => emitter.line("}"),
            }
        }
        Stmt::For { stmt, .. } => emit_for(emitter, stmt, interner),
        Stmt::While { label, condition, body, .. } => {
            let c_js = emit_expr(emitter, condition, interner);
            emit_label_prefix(emitter, label, interner);
            emitter.line(&format!("while ({c_js}) {{"));
            emitter.indented(|e| emit_block_ctx(e, body, interner, None));
            emitter.line("}");
        }
        Stmt::Loop { label, body, .. } => {
            emit_label_prefix(emitter, label, interner);
            emitter.line("while (true) {");
            emitter.indented(|e| emit_block_ctx(e, body, interner, None));
            emitter.line("}");
        }
        Stmt::Match { subject, arms, .. } => emit_match_stmt(emitter, subject, arms, interner, ctx),
        Stmt::Break { label, .. } => match label {
            Some(l) => emitter.line(&format!("break {};", js_ident(interner.resolve(*l)))),
            None => match ctx {
                Some(flag) => {
                    emitter.line(&format!("{flag} = true;"));
                    emitter.line("break;");
                }
                None => emitter.line("break;"),
            },
        },
        Stmt::Continue { label, .. } => match label {
            Some(l) => emitter.line(&format!("continue {};", js_ident(interner.resolve(*l)))),
            None => emitter.line("continue;"),
        },
        Stmt::Guard { condition, else_branch, .. } => {
            let c_js = emit_expr(emitter, condition, interner);
            emitter.line(&format!("if (!({c_js})) {{"));
            emitter.indented(|e| emit_block_ctx(e, else_branch, interner, ctx));
            emitter.line("}");
        }
        Stmt::With { resource, binding, body, .. } => {
            let r_js = emit_expr(emitter, resource, interner);
            let name = js_ident(interner.resolve(*binding));
            emitter.line(&format!("const {name} = {r_js};"));
            emitter.line("try {");
            emitter.indented(|e| emit_block_ctx(e, body, interner, ctx));
            emitter.line("} finally {");
            emitter.indented(|e| {
                e.line(&format!("if (typeof {name}.close === 'function') {name}.close();"));
                e.line(&format!("else if (typeof {name}.dispose === 'function') {name}.dispose();"));
            });
            emitter.line("}");
        }
        Stmt::Defer { body, .. } => {
            emitter.line("__tova_defer(() => {");
            emitter.indented(|e| emit_block_ctx(e, body, interner, None));
            emitter.line("});");
        }
        Stmt::TryCatch { try_block, catch_binding, catch_block, finally_block, .. } => {
            emitter.line("try {");
            emitter.indented(|e| emit_block_ctx(e, try_block, interner, ctx));
            let binding = catch_binding.map(|s| js_ident(interner.resolve(s))).unwrap_or_else(|| "__err".to_string());
            emitter.line(&format!("}} catch ({binding}) {{"));
            emitter.indented(|e| emit_block_ctx(e, catch_block, interner, ctx));
            match finally_block {
                Some(fin) => {
                    emitter.line("} finally {");
                    emitter.indented(|e| emit_block_ctx(e, fin, interner, ctx));
                    emitter.line("}");
                }
                None => emitter.line("}"),
            }
        }
    }
}

fn emit_label_prefix(emitter: &mut Emitter, label: &Option<tova_base::Symbol>, interner: &Interner) {
    if let Some(l) = label {
        emitter.line(&format!("{}:", js_ident(interner.resolve(*l))));
    }
}

fn emit_for(emitter: &mut Emitter, stmt: &ForStmt<'_>, interner: &Interner) {
    let iterable_js = emit_expr(emitter, stmt.iterable, interner);
    let has_else = stmt.else_branch.is_some();
    if has_else {
        emitter.line("let __for_broke = false;");
    }
    emit_label_prefix(emitter, &stmt.label, interner);
    let keyword = if stmt.is_async { "for await" } else { "for" };
    emitter.line(&format!("{keyword} (const __for_item of {iterable_js}) {{"));
    emitter.indented(|e| {
        let compiled = compile_pattern(&stmt.pattern, "__for_item", interner);
        for (name, accessor) in &compiled.bindings {
            e.line(&format!("const {name} = {accessor};"));
        }
        if let Some(guard) = stmt.guard {
            let guard_js = emit_expr(e, guard, interner);
            e.line(&format!("if (!({guard_js})) continue;"));
        }
        let ctx = if has_else { Some("__for_broke") } else { None };
        emit_block_ctx(e, &stmt.body, interner, ctx);
    });
    emitter.line("}");
    if let Some(else_block) = &stmt.else_branch {
        emitter.line("if (!__for_broke) {");
        emitter.indented(|e| emit_block_ctx(e, else_block, interner, None));
        emitter.line("}");
    }
}

fn emit_match_stmt(emitter: &mut Emitter, subject: &Expr<'_>, arms: &[tova_ast::MatchStmtArm<'_>], interner: &Interner, ctx: BreakCtx<'_>) {
    let subject_js = emit_expr(emitter, subject, interner);
    emitter.line(&format!("const __m = {subject_js};"));
    for (index, arm) in arms.iter().enumerate() {
        let compiled = compile_pattern(&arm.pattern, "__m", interner);
        let mut cond = compiled.predicate();
        let keyword = if index == 0 { "if" } else { "else if" };
        if let Some(guard) = arm.guard {
            let guard_js = emit_expr(emitter, guard, interner);
            cond = format!("({cond}) && ({guard_js})");
        }
        emitter.line(&format!("{keyword} ({cond}) {{"));
        emitter.indented(|e| {
            for (name, accessor) in &compiled.bindings {
                e.line(&format!("const {name} = {accessor};"));
            }
            emit_block_ctx(e, &arm.body, interner, ctx);
        });
    }
    emitter.line("}");
    emitter.require(Helper::MatchHelpers);
}

fn compound_op_js(op: CompoundAssignOpKind) -> &'static str {
    match op {
        CompoundAssignOpKind::Add => "+=",
        CompoundAssignOpKind::Sub => "-=",
        CompoundAssignOpKind::Mul => "*=",
        CompoundAssignOpKind::Div => "/=",
    }
}

/// `true` if `block` (or anything nested inside it) contains a `?`
/// propagation expression, meaning the enclosing function must be wrapped
/// in a try/catch that turns a thrown `__TovaPropagate` into its own
/// early `Err`/`None` return.
pub fn contains_propagate(block: &tova_ast::StmtBlock<'_>) -> bool {
    block.statements.iter().any(stmt_has_propagate)
}

fn stmt_has_propagate(stmt: &Stmt<'_>) -> bool {
    match stmt {
        Stmt::Decl { .. } => false,
        Stmt::Let { value, .. } => value.map(expr_has_propagate).unwrap_or(false),
        Stmt::LetDestructure { value, .. } => expr_has_propagate(value),
        Stmt::Assign { target, value, .. } => expr_has_propagate(target) || expr_has_propagate(value),
        Stmt::CompoundAssign { target, value, .. } => expr_has_propagate(target) || expr_has_propagate(value),
        Stmt::Expr { expr, .. } => expr_has_propagate(expr),
        Stmt::Block { block, .. } => contains_propagate(block),
        Stmt::Return { value, .. } => value.map(expr_has_propagate).unwrap_or(false),
        Stmt::If { condition, then_branch, else_branch, .. } => {
            expr_has_propagate(condition) || contains_propagate(then_branch) || else_branch.as_ref().map(contains_propagate).unwrap_or(false)
        }
        Stmt::For { stmt, .. } => {
            expr_has_propagate(stmt.iterable) || contains_propagate(&stmt.body) || stmt.else_branch.as_ref().map(contains_propagate).unwrap_or(false)
        }
        Stmt::While { condition, body, .. } => expr_has_propagate(condition) || contains_propagate(body),
        Stmt::Loop { body, .. } => contains_propagate(body),
        Stmt::Match { subject, arms, .. } => expr_has_propagate(subject) || arms.iter().any(|a| contains_propagate(&a.body)),
        Stmt::Break { .. } | Stmt::Continue { .. } => false,
        Stmt::Guard { condition, else_branch, .. } => expr_has_propagate(condition) || contains_propagate(else_branch),
        Stmt::With { resource, body, .. } => expr_has_propagate(resource) || contains_propagate(body),
        Stmt::Defer { body, .. } => contains_propagate(body),
        Stmt::TryCatch { try_block, catch_block, finally_block, .. } => {
            contains_propagate(try_block) || contains_propagate(catch_block) || finally_block.as_ref().map(contains_propagate).unwrap_or(false)
        }
    }
}

fn expr_has_propagate(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::Propagate { .. } => true,
        Expr::Literal { .. } | Expr::Identifier { .. } => false,
        Expr::Binary { left, right, .. } => expr_has_propagate(left) || expr_has_propagate(right),
        Expr::Unary { operand, .. } => expr_has_propagate(operand),
        Expr::ChainedComparison { operands, .. } => operands.iter().any(expr_has_propagate),
        Expr::Call { callee, args, .. } => expr_has_propagate(callee) || args.iter().any(|a| expr_has_propagate(a.value)),
        Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => expr_has_propagate(object),
        Expr::Index { object, index, .. } => expr_has_propagate(object) || expr_has_propagate(index),
        Expr::Slice { object, low, high, step, .. } => {
            expr_has_propagate(object)
                || low.map(expr_has_propagate).unwrap_or(false)
                || high.map(expr_has_propagate).unwrap_or(false)
                || step.map(expr_has_propagate).unwrap_or(false)
        }
        Expr::Pipe { left, target, .. } => expr_has_propagate(left) || expr_has_propagate(target),
        Expr::Lambda { .. } => false, // a nested lambda's own `?` belongs to its own function wrapper
        Expr::Match { subject, arms, .. } => expr_has_propagate(subject) || arms.iter().any(|a| expr_has_propagate(a.body)),
        Expr::Spread { inner, .. } | Expr::Await { inner, .. } => expr_has_propagate(inner),
        Expr::Yield { inner, .. } => inner.map(expr_has_propagate).unwrap_or(false),
        Expr::If { condition, then_branch, else_branch, .. } => {
            expr_has_propagate(condition) || expr_has_propagate(then_branch) || else_branch.map(expr_has_propagate).unwrap_or(false)
        }
        Expr::Is { subject, .. } => expr_has_propagate(subject),
        Expr::Membership { value, iterable, .. } => expr_has_propagate(value) || expr_has_propagate(iterable),
        Expr::CompoundAssign { target, value, .. } => expr_has_propagate(target) || expr_has_propagate(value),
        Expr::ListComprehension { comprehension, .. } | Expr::DictComprehension { comprehension, .. } => expr_has_propagate(comprehension.element),
        Expr::Range { low, high, .. } => expr_has_propagate(low) || expr_has_propagate(high),
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => elements.iter().any(expr_has_propagate),
        Expr::Dict { entries, .. } => entries.iter().any(|(k, v)| expr_has_propagate(k) || expr_has_propagate(v)),
        Expr::Column { .. } => false,
        Expr::Jsx { .. } => false,
        Expr::As { inner, .. } => expr_has_propagate(inner),
    }
}
