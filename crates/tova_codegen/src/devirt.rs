//! Narrow, syntax-driven devirtualization peepholes.
//!
//! All three fire on an exact, statically-recognizable shape right at the
//! call site (or, for [`try_scalar_replace`], across one binding plus its
//! immediately following uses) — there is no general dataflow tracking
//! here. A value that escapes through anything these checks don't
//! recognize is left as an ordinary constructed object.

use tova_ast::{CallArg, Expr, Stmt};
use tova_base::{Interner, Symbol};

use crate::emitter::Emitter;
use crate::expr::{binary_op_js, emit_expr};

const SCALAR_CONSTRUCTORS: &[&str] = &["Ok", "Err", "Some"];

/// `Ctor(value).value` / `.error` skips constructing the wrapper object
/// entirely when the constructor and the unwrap happen in the same
/// expression.
pub fn try_inline_constructor_member(object: &Expr<'_>, property: Symbol, interner: &Interner) -> Option<String> {
    let inner = scalar_ctor_inner(object, interner)?;
    let prop_name = interner.resolve(property);
    if prop_name != "value" && prop_name != "error" {
        return None;
    }
    let mut scratch = Emitter::new();
    Some(emit_expr(&mut scratch, inner, interner))
}

/// `Ctor(value).unwrap()` / `.unwrapOr(default)` / `.isOk()` / `.isErr()` /
/// `.isSome()` / `.isNone()` on an immediately-constructed value: the same
/// elision as [`try_inline_constructor_member`], extended to the method
/// forms the runtime objects also carry.
pub fn try_inline_constructor_method(callee: &Expr<'_>, args: &[CallArg<'_>], interner: &Interner, emitter: &mut Emitter) -> Option<String> {
    let Expr::Member { object, property, .. } = callee else { return None };
    let ctor_name = scalar_ctor_name(object, interner)?;
    let inner = scalar_ctor_inner(object, interner)?;
    let is_ok = ctor_name == "Ok" || ctor_name == "Some";
    match interner.resolve(*property) {
        "unwrap" if args.is_empty() && is_ok => Some(emit_expr(emitter, inner, interner)),
        "isOk" | "isSome" if args.is_empty() => Some(is_ok.to_string()),
        "isErr" | "isNone" if args.is_empty() => Some((!is_ok).to_string()),
        "unwrapOr" if is_ok => {
            let [arg] = args else { return None };
            if arg.spread {
                return None;
            }
            let inner_js = emit_expr(emitter, inner, interner);
            emit_expr(emitter, arg.value, interner);
            Some(inner_js)
        }
        "unwrapOr" => {
            let [arg] = args else { return None };
            if arg.spread {
                return None;
            }
            emit_expr(emitter, inner, interner);
            Some(emit_expr(emitter, arg.value, interner))
        }
        _ => None,
    }
}

fn scalar_ctor_name<'a>(expr: &'a Expr<'a>, interner: &Interner) -> Option<&'a str> {
    let Expr::Call { callee, .. } = expr else { return None };
    let Expr::Identifier { name, .. } = callee else { return None };
    let ctor_name = interner.resolve(*name);
    SCALAR_CONSTRUCTORS.contains(&ctor_name).then_some(ctor_name)
}

fn scalar_ctor_inner<'a>(expr: &'a Expr<'a>, interner: &Interner) -> Option<&'a Expr<'a>> {
    scalar_ctor_name(expr, interner)?;
    let Expr::Call { args, .. } = expr else { return None };
    let [single_arg] = args else { return None };
    if single_arg.spread {
        return None;
    }
    Some(single_arg.value)
}

/// `x.map(f).map(g)` fuses into a single `.map` call composing `f` and `g`,
/// avoiding the intermediate array/option allocation.
pub fn try_fuse_map_chain(callee: &Expr<'_>, args: &[CallArg<'_>], interner: &Interner, emitter: &mut Emitter) -> Option<String> {
    let Expr::Member { object: outer_object, property: outer_prop, .. } = callee else { return None };
    if interner.resolve(*outer_prop) != "map" {
        return None;
    }
    let [outer_fn_arg] = args else { return None };
    let Expr::Call { callee: inner_callee, args: inner_args, .. } = outer_object else { return None };
    let Expr::Member { object: base, property: inner_prop, .. } = inner_callee else { return None };
    if interner.resolve(*inner_prop) != "map" {
        return None;
    }
    let [inner_fn_arg] = inner_args else { return None };

    let base_js = emit_expr(emitter, base, interner);
    let f_js = emit_expr(emitter, inner_fn_arg.value, interner);
    let g_js = emit_expr(emitter, outer_fn_arg.value, interner);
    Some(format!("{base_js}.map((__x) => ({g_js})(({f_js})(__x)))"))
}

/// Two-step scalar replacement: a binding of the shape
/// `let r = if cond { Ok(x) } else { Err(e) }` (constructor/polarity may be
/// swapped, and `Some` stands in for `Ok`) whose only subsequent uses probe
/// or unwrap `r` — `r.isOk()`, `r.isErr()`, `r.unwrap()`, `r.unwrapOr(d)` —
/// collapses into two plain locals (`r__ok`, `r__v`) and never constructs
/// the tagged object at all.
///
/// Returns the number of leading statements in `stmts` it consumed, having
/// already written their replacement to `emitter`. `None` means the shape
/// didn't match (or a later statement uses `r` in some way this pass
/// doesn't understand), and the caller should fall back to ordinary
/// per-statement emission.
pub fn try_scalar_replace(emitter: &mut Emitter, stmts: &[Stmt<'_>], interner: &Interner) -> Option<usize> {
    let first = stmts.first()?;
    let (name, condition, then_inner, else_inner, then_is_ok) = match_scalar_binding(first, interner)?;
    let rest = &stmts[1..];
    if !rest.iter().all(|s| stmt_is_safe(s, name, interner)) {
        return None;
    }

    let base = interner.resolve(name);
    let cond_var = format!("{base}__cond");
    let ok_var = format!("{base}__ok");
    let v_var = format!("{base}__v");

    let cond_js = emit_expr(emitter, condition, interner);
    emitter.line(&format!("let {cond_var} = {cond_js};"));
    let ok_expr = if then_is_ok { cond_var.clone() } else { format!("!{cond_var}") };
    emitter.line(&format!("let {ok_var} = {ok_expr};"));
    let then_js = emit_expr(emitter, then_inner, interner);
    let else_js = emit_expr(emitter, else_inner, interner);
    emitter.line(&format!("let {v_var} = {cond_var} ? {then_js} : {else_js};"));

    for stmt in rest {
        emit_scalar_stmt(emitter, stmt, name, &ok_var, &v_var, interner);
    }
    Some(stmts.len())
}

/// `(name, condition, then_inner, else_inner, then_branch_is_ok)` for a
/// `let`/assign binding whose value is an `if`/`else` expression with a
/// scalar constructor call on each arm.
fn match_scalar_binding<'a>(stmt: &'a Stmt<'a>, interner: &Interner) -> Option<(Symbol, &'a Expr<'a>, &'a Expr<'a>, &'a Expr<'a>, bool)> {
    match stmt {
        Stmt::Let { name, value: Some(value), .. } => build_scalar_binding(*name, value, interner),
        Stmt::Assign { target: Expr::Identifier { name, .. }, value, .. } => build_scalar_binding(*name, value, interner),
        _ => None,
    }
}

fn build_scalar_binding<'a>(name: Symbol, value: &'a Expr<'a>, interner: &Interner) -> Option<(Symbol, &'a Expr<'a>, &'a Expr<'a>, &'a Expr<'a>, bool)> {
    let Expr::If { condition, then_branch, else_branch: Some(else_branch), .. } = value else { return None };
    let then_name = scalar_ctor_name(then_branch, interner)?;
    let else_name = scalar_ctor_name(else_branch, interner)?;
    let then_is_ok = then_name == "Ok" || then_name == "Some";
    let else_is_ok = else_name == "Ok" || else_name == "Some";
    if then_is_ok == else_is_ok {
        return None;
    }
    let then_inner = scalar_ctor_inner(then_branch, interner)?;
    let else_inner = scalar_ctor_inner(else_branch, interner)?;
    Some((name, condition, then_inner, else_inner, then_is_ok))
}

/// Whether every use of `name` inside `stmt` is one this pass knows how to
/// rewrite (or `stmt` doesn't mention `name` at all, in which case it's
/// emitted unchanged).
fn stmt_is_safe(stmt: &Stmt<'_>, name: Symbol, interner: &Interner) -> bool {
    match stmt {
        Stmt::Let { value: Some(value), .. } => expr_is_safe(value, name, interner),
        Stmt::Let { value: None, .. } => true,
        Stmt::Assign { target, value, .. } => !expr_mentions(target, name) && expr_is_safe(value, name, interner),
        Stmt::Expr { expr, .. } => expr_is_safe(expr, name, interner),
        Stmt::Return { value: Some(value), .. } => expr_is_safe(value, name, interner),
        Stmt::Return { value: None, .. } => true,
        Stmt::If { condition, then_branch, else_branch, .. } => {
            expr_is_safe(condition, name, interner)
                && then_branch.statements.iter().all(|s| stmt_is_safe(s, name, interner))
                && else_branch.as_ref().map_or(true, |b| b.statements.iter().all(|s| stmt_is_safe(s, name, interner)))
        }
        Stmt::Block { block, .. } => block.statements.iter().all(|s| stmt_is_safe(s, name, interner)),
        _ => !stmt_mentions(stmt, name),
    }
}

fn emit_scalar_stmt(emitter: &mut Emitter, stmt: &Stmt<'_>, name: Symbol, ok_var: &str, v_var: &str, interner: &Interner) {
    match stmt {
        Stmt::Let { name: bound, value: Some(value), .. } => {
            let v_js = emit_scalar_expr(emitter, value, name, ok_var, v_var, interner);
            emitter.line(&format!("let {} = {v_js};", crate::strings::js_ident(interner.resolve(*bound))));
        }
        Stmt::Assign { target, value, .. } => {
            let t_js = emit_expr(emitter, target, interner);
            let v_js = emit_scalar_expr(emitter, value, name, ok_var, v_var, interner);
            emitter.line(&format!("{t_js} = {v_js};"));
        }
        Stmt::Expr { expr, .. } => {
            let e_js = emit_scalar_expr(emitter, expr, name, ok_var, v_var, interner);
            emitter.line(&format!("{e_js};"));
        }
        Stmt::Return { value: Some(value), .. } => {
            let v_js = emit_scalar_expr(emitter, value, name, ok_var, v_var, interner);
            emitter.line(&format!("return {v_js};"));
        }
        Stmt::If { condition, then_branch, else_branch, .. } => {
            let c_js = emit_scalar_expr(emitter, condition, name, ok_var, v_var, interner);
            emitter.line(&format!("if ({c_js}) {{"));
            emitter.indented(|e| {
                for s in then_branch.statements.iter() {
                    emit_scalar_stmt(e, s, name, ok_var, v_var, interner);
                }
            });
            match else_branch {
                Some(else_block) => {
                    emitter.line("} else {");
                    emitter.indented(|e| {
                        for s in else_block.statements.iter() {
                            emit_scalar_stmt(e, s, name, ok_var, v_var, interner);
                        }
                    });
                    emitter.line("}");
                }
                None => emitter.line("}"),
            }
        }
        Stmt::Block { block, .. } => {
            emitter.line("{");
            emitter.indented(|e| {
                for s in block.statements.iter() {
                    emit_scalar_stmt(e, s, name, ok_var, v_var, interner);
                }
            });
            emitter.line("}");
        }
        other => crate::stmt::emit_stmt(emitter, other, interner),
    }
}

fn emit_scalar_expr(emitter: &mut Emitter, expr: &Expr<'_>, name: Symbol, ok_var: &str, v_var: &str, interner: &Interner) -> String {
    if !expr_mentions(expr, name) {
        return emit_expr(emitter, expr, interner);
    }
    match expr {
        Expr::Call { callee: Expr::Member { object, property, .. }, args, .. } if is_identifier(object, name) => {
            match interner.resolve(*property) {
                "isOk" | "isSome" => ok_var.to_string(),
                "isErr" | "isNone" => format!("!{ok_var}"),
                "unwrap" => v_var.to_string(),
                "unwrapOr" => {
                    let default_js = args.first().map(|a| emit_scalar_expr(emitter, a.value, name, ok_var, v_var, interner)).unwrap_or_default();
                    format!("({ok_var} ? {v_var} : {default_js})")
                }
                _ => emit_expr(emitter, expr, interner),
            }
        }
        Expr::Binary { op, left, right, .. } => {
            let l = emit_scalar_expr(emitter, left, name, ok_var, v_var, interner);
            let r = emit_scalar_expr(emitter, right, name, ok_var, v_var, interner);
            format!("({l} {} {r})", binary_op_js(*op))
        }
        Expr::Unary { op, operand, .. } => {
            let v = emit_scalar_expr(emitter, operand, name, ok_var, v_var, interner);
            match op {
                tova_ast::UnaryOpKind::Not => format!("(!{v})"),
                tova_ast::UnaryOpKind::Neg => format!("(-{v})"),
                tova_ast::UnaryOpKind::NonNullAssert => v,
            }
        }
        Expr::If { condition, then_branch, else_branch, .. } => {
            let c = emit_scalar_expr(emitter, condition, name, ok_var, v_var, interner);
            let t = emit_scalar_expr(emitter, then_branch, name, ok_var, v_var, interner);
            let e = match else_branch {
                Some(e) => emit_scalar_expr(emitter, e, name, ok_var, v_var, interner),
                None => "undefined".to_string(),
            };
            format!("({c} ? {t} : {e})")
        }
        _ => emit_expr(emitter, expr, interner),
    }
}

fn is_identifier(expr: &Expr<'_>, name: Symbol) -> bool {
    matches!(expr, Expr::Identifier { name: n, .. } if *n == name)
}

/// `true` if `stmt` (or anything nested inside it) reads `name` anywhere,
/// mirroring `stmt::contains_propagate`'s shape.
fn stmt_mentions(stmt: &Stmt<'_>, name: Symbol) -> bool {
    match stmt {
        Stmt::Decl { .. } => false,
        Stmt::Let { value, .. } => value.is_some_and(|v| expr_mentions(v, name)),
        Stmt::LetDestructure { value, .. } => expr_mentions(value, name),
        Stmt::Assign { target, value, .. } | Stmt::CompoundAssign { target, value, .. } => expr_mentions(target, name) || expr_mentions(value, name),
        Stmt::Expr { expr, .. } => expr_mentions(expr, name),
        Stmt::Block { block, .. } => block.statements.iter().any(|s| stmt_mentions(s, name)),
        Stmt::Return { value, .. } => value.is_some_and(|v| expr_mentions(v, name)),
        Stmt::If { condition, then_branch, else_branch, .. } => {
            expr_mentions(condition, name)
                || then_branch.statements.iter().any(|s| stmt_mentions(s, name))
                || else_branch.as_ref().is_some_and(|b| b.statements.iter().any(|s| stmt_mentions(s, name)))
        }
        Stmt::For { stmt, .. } => {
            expr_mentions(stmt.iterable, name)
                || stmt.guard.is_some_and(|g| expr_mentions(g, name))
                || stmt.body.statements.iter().any(|s| stmt_mentions(s, name))
                || stmt.else_branch.as_ref().is_some_and(|b| b.statements.iter().any(|s| stmt_mentions(s, name)))
        }
        Stmt::While { condition, body, .. } => expr_mentions(condition, name) || body.statements.iter().any(|s| stmt_mentions(s, name)),
        Stmt::Loop { body, .. } => body.statements.iter().any(|s| stmt_mentions(s, name)),
        Stmt::Match { subject, arms, .. } => {
            expr_mentions(subject, name)
                || arms.iter().any(|a| a.guard.is_some_and(|g| expr_mentions(g, name)) || a.body.statements.iter().any(|s| stmt_mentions(s, name)))
        }
        Stmt::Break { .. } | Stmt::Continue { .. } => false,
        Stmt::Guard { condition, else_branch, .. } => expr_mentions(condition, name) || else_branch.statements.iter().any(|s| stmt_mentions(s, name)),
        Stmt::With { resource, body, .. } => expr_mentions(resource, name) || body.statements.iter().any(|s| stmt_mentions(s, name)),
        Stmt::Defer { body, .. } => body.statements.iter().any(|s| stmt_mentions(s, name)),
        Stmt::TryCatch { try_block, catch_block, finally_block, .. } => {
            try_block.statements.iter().any(|s| stmt_mentions(s, name))
                || catch_block.statements.iter().any(|s| stmt_mentions(s, name))
                || finally_block.as_ref().is_some_and(|b| b.statements.iter().any(|s| stmt_mentions(s, name)))
        }
    }
}

/// `true` if `name` is read anywhere inside `expr`, mirroring
/// `stmt::expr_has_propagate`'s shape.
fn expr_mentions(expr: &Expr<'_>, name: Symbol) -> bool {
    match expr {
        Expr::Literal { .. } => false,
        Expr::Identifier { name: n, .. } => *n == name,
        Expr::Binary { left, right, .. } => expr_mentions(left, name) || expr_mentions(right, name),
        Expr::Unary { operand, .. } => expr_mentions(operand, name),
        Expr::ChainedComparison { operands, .. } => operands.iter().any(|e| expr_mentions(e, name)),
        Expr::Call { callee, args, .. } => expr_mentions(callee, name) || args.iter().any(|a| expr_mentions(a.value, name)),
        Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => expr_mentions(object, name),
        Expr::Index { object, index, .. } => expr_mentions(object, name) || expr_mentions(index, name),
        Expr::Slice { object, low, high, step, .. } => {
            expr_mentions(object, name)
                || low.is_some_and(|e| expr_mentions(e, name))
                || high.is_some_and(|e| expr_mentions(e, name))
                || step.is_some_and(|e| expr_mentions(e, name))
        }
        Expr::Pipe { left, target, .. } => expr_mentions(left, name) || expr_mentions(target, name),
        Expr::Lambda { body, .. } => expr_mentions(body, name),
        Expr::Match { subject, arms, .. } => {
            expr_mentions(subject, name) || arms.iter().any(|a| a.guard.is_some_and(|g| expr_mentions(g, name)) || expr_mentions(a.body, name))
        }
        Expr::Spread { inner, .. } | Expr::Await { inner, .. } => expr_mentions(inner, name),
        Expr::Propagate { inner, .. } => expr_mentions(inner, name),
        Expr::Yield { inner, .. } => inner.is_some_and(|e| expr_mentions(e, name)),
        Expr::If { condition, then_branch, else_branch, .. } => {
            expr_mentions(condition, name) || expr_mentions(then_branch, name) || else_branch.is_some_and(|e| expr_mentions(e, name))
        }
        Expr::Is { subject, .. } => expr_mentions(subject, name),
        Expr::Membership { value, iterable, .. } => expr_mentions(value, name) || expr_mentions(iterable, name),
        Expr::CompoundAssign { target, value, .. } => expr_mentions(target, name) || expr_mentions(value, name),
        Expr::ListComprehension { comprehension, .. } | Expr::DictComprehension { comprehension, .. } => {
            expr_mentions(comprehension.element, name)
                || comprehension.value.is_some_and(|v| expr_mentions(v, name))
                || comprehension.clauses.iter().any(|c| match c {
                    tova_ast::ComprehensionClause::For { iterable, .. } => expr_mentions(iterable, name),
                    tova_ast::ComprehensionClause::If { condition } => expr_mentions(condition, name),
                })
        }
        Expr::Range { low, high, .. } => expr_mentions(low, name) || expr_mentions(high, name),
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => elements.iter().any(|e| expr_mentions(e, name)),
        Expr::Dict { entries, .. } => entries.iter().any(|(k, v)| expr_mentions(k, name) || expr_mentions(v, name)),
        Expr::Column { expr, .. } => match expr {
            tova_ast::ColumnExpr::Column { .. } | tova_ast::ColumnExpr::Negated { .. } => false,
            tova_ast::ColumnExpr::Assignment { value, .. } => expr_mentions(value, name),
        },
        Expr::Jsx { .. } => true, // conservative: this pass never descends into JSX
        Expr::As { inner, .. } => expr_mentions(inner, name),
    }
}

/// Whether every read of `name` inside `expr` is one of the recognized
/// probe/unwrap shapes (or `expr` doesn't mention `name` at all).
fn expr_is_safe(expr: &Expr<'_>, name: Symbol, interner: &Interner) -> bool {
    if !expr_mentions(expr, name) {
        return true;
    }
    match expr {
        Expr::Call { callee: Expr::Member { object, property, .. }, args, .. } if is_identifier(object, name) => match interner.resolve(*property) {
            "isOk" | "isErr" | "isSome" | "isNone" => args.is_empty(),
            "unwrap" => args.is_empty(),
            "unwrapOr" => matches!(args, [arg] if !arg.spread && expr_is_safe(arg.value, name, interner)),
            _ => false,
        },
        Expr::Binary { left, right, .. } => expr_is_safe(left, name, interner) && expr_is_safe(right, name, interner),
        Expr::Unary { operand, .. } => expr_is_safe(operand, name, interner),
        Expr::If { condition, then_branch, else_branch, .. } => {
            expr_is_safe(condition, name, interner) && expr_is_safe(then_branch, name, interner) && else_branch.map_or(true, |e| expr_is_safe(e, name, interner))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    /// Compiles `source` as a bare module (no `server`/`browser` blocks)
    /// and returns its `shared` output, exercising the devirtualization
    /// peepholes the same way `crate::compile_program` does in production.
    fn emit_shared(source: &str) -> String {
        let arenas: &'static tova_ast::Arenas<'static> = Box::leak(Box::new(tova_ast::Arenas::new()));
        let mut interner = tova_base::Interner::new();
        let file = interner.intern("test.tova");
        let registry = tova_registry::BlockRegistry::standard();
        let tokens = tova_lexer::tokenize(source, &mut interner).expect("lexing should succeed");
        let outcome = tova_parser::parse_program(&tokens, file, arenas, &mut interner, &registry, false).expect("parse should succeed");
        let compiled = crate::compile_program(&outcome.program, &interner);
        compiled.shared.expect("module-mode compile always populates shared")
    }

    #[test]
    fn immediately_unwrapped_ok_skips_constructing_the_wrapper() {
        let js = emit_shared("pub fn f(x) {\n  return Ok(x).unwrap()\n}\n");
        assert!(!js.contains("Ok("), "unwrap on a freshly-constructed Ok should inline to its inner value");
    }

    #[test]
    fn is_ok_probe_on_a_fresh_constructor_inlines_to_a_boolean_literal() {
        let js = emit_shared("pub fn f(x) {\n  return Ok(x).isOk()\n}\n");
        assert!(js.contains("true"));
        assert!(!js.contains("Ok("));
    }

    #[test]
    fn is_err_probe_on_a_fresh_err_inlines_to_true() {
        let js = emit_shared("pub fn f(e) {\n  return Err(e).isErr()\n}\n");
        assert!(js.contains("true"));
        assert!(!js.contains("Err("));
    }

    #[test]
    fn chained_map_calls_fuse_into_one() {
        let js = emit_shared("pub fn f(xs) {\n  return xs.map((x) => x + 1).map((y) => y * 2)\n}\n");
        let map_calls = js.matches(".map(").count();
        assert_eq!(map_calls, 1, "two chained .map calls should fuse into a single call: {js}");
    }
}
