//! Base expression emitter, shared by every target.
//!
//! Most expressions lower to a single JS expression string. A few need
//! statement-level scaffolding they don't have room for inline (`match`,
//! chained comparisons with side-effecting middle operands) and lower to
//! an IIFE (`(() => { ... })()`) instead — rare enough in practice that the
//! extra closure is not worth a separate statement-vs-expression emitter
//! split.

use tova_ast::{BinaryOpKind, CallArg, ColumnExpr, CompoundAssignOpKind, Expr, Literal, UnaryOpKind};
use tova_base::Interner;

use crate::devirt;
use crate::emitter::{Emitter, Helper};
use crate::pattern::compile_pattern;
use crate::strings::{js_ident, js_string_literal, js_template_text};

pub fn emit_expr(emitter: &mut Emitter, expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Literal { value, .. } => literal_js(emitter, value, interner),
        Expr::Identifier { name, .. } => js_ident(interner.resolve(*name)),
        Expr::Binary { op, left, right, .. } => {
            let l = emit_expr(emitter, left, interner);
            let r = emit_expr(emitter, right, interner);
            format!("({l} {} {r})", binary_op_js(*op))
        }
        Expr::Unary { op, operand, .. } => {
            let v = emit_expr(emitter, operand, interner);
            match op {
                UnaryOpKind::Not => format!("(!{v})"),
                UnaryOpKind::Neg => format!("(-{v})"),
                UnaryOpKind::NonNullAssert => v,
            }
        }
        Expr::ChainedComparison { operands, ops, .. } => emit_chained_comparison(emitter, operands, ops, interner),
        Expr::Call { callee, args, .. } => emit_call(emitter, callee, args, interner),
        Expr::Member { object, property, .. } => {
            if let Some(inlined) = devirt::try_inline_constructor_member(object, *property, interner) {
                return inlined;
            }
            let o = emit_expr(emitter, object, interner);
            format!("{o}.{}", js_ident(interner.resolve(*property)))
        }
        Expr::OptionalMember { object, property, .. } => {
            let o = emit_expr(emitter, object, interner);
            format!("{o}?.{}", js_ident(interner.resolve(*property)))
        }
        Expr::Index { object, index, .. } => {
            let o = emit_expr(emitter, object, interner);
            let i = emit_expr(emitter, index, interner);
            format!("{o}[{i}]")
        }
        Expr::Slice { object, low, high, step, .. } => emit_slice(emitter, object, *low, *high, *step, interner),
        Expr::Pipe { left, target, .. } => emit_pipe(emitter, left, target, interner),
        Expr::Lambda { params, body, .. } => {
            let names: Vec<String> = params.iter().map(|p| js_ident(interner.resolve(p.name))).collect();
            let body_js = emit_expr(emitter, body, interner);
            format!("(({}) => ({body_js}))", names.join(", "))
        }
        Expr::Match { subject, arms, .. } => emit_match_expr(emitter, subject, arms, interner),
        Expr::Spread { inner, .. } => format!("...{}", emit_expr(emitter, inner, interner)),
        Expr::Propagate { inner, .. } => {
            emitter.require(Helper::Propagate);
            format!("__propagate({})", emit_expr(emitter, inner, interner))
        }
        Expr::Await { inner, .. } => format!("(await {})", emit_expr(emitter, inner, interner)),
        Expr::Yield { inner, .. } => match inner {
            Some(inner) => format!("(yield {})", emit_expr(emitter, inner, interner)),
            None => "(yield)".to_string(),
        },
        Expr::If { condition, then_branch, else_branch, .. } => {
            let c = emit_expr(emitter, condition, interner);
            let t = emit_expr(emitter, then_branch, interner);
            let e = match else_branch {
                Some(e) => emit_expr(emitter, e, interner),
                None => "undefined".to_string(),
            };
            format!("({c} ? {t} : {e})")
        }
        Expr::Is { subject, pattern, .. } => {
            let s = emit_expr(emitter, subject, interner);
            let compiled = compile_pattern(pattern, "__is", interner);
            format!("((__is) => ({}))({s})", compiled.predicate())
        }
        Expr::Membership { value, iterable, negated, .. } => {
            let v = emit_expr(emitter, value, interner);
            let it = emit_expr(emitter, iterable, interner);
            let test = format!("__tova_includes({it}, {v})");
            emitter.require(Helper::MatchHelpers);
            if *negated {
                format!("(!{test})")
            } else {
                test
            }
        }
        Expr::CompoundAssign { op, target, value, .. } => {
            let t = emit_expr(emitter, target, interner);
            let v = emit_expr(emitter, value, interner);
            format!("({t} {} {v})", compound_op_js(*op))
        }
        Expr::ListComprehension { comprehension, .. } => emit_list_comprehension(emitter, comprehension, interner),
        Expr::DictComprehension { comprehension, .. } => emit_dict_comprehension(emitter, comprehension, interner),
        Expr::Range { low, high, inclusive, .. } => {
            let l = emit_expr(emitter, low, interner);
            let h = emit_expr(emitter, high, interner);
            let upper = if *inclusive { format!("{h} + 1") } else { h };
            format!("__tova_range({l}, {upper})")
        }
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => {
            let items: Vec<String> = elements.iter().map(|e| emit_expr(emitter, e, interner)).collect();
            format!("[{}]", items.join(", "))
        }
        Expr::Dict { entries, .. } => {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("[{}, {}]", emit_expr(emitter, k, interner), emit_expr(emitter, v, interner)))
                .collect();
            format!("new Map([{}])", items.join(", "))
        }
        Expr::Column { expr, .. } => emit_column(emitter, expr, interner),
        Expr::Jsx { node, .. } => crate::jsx::emit_jsx_node(emitter, node, &crate::reactive::SignalScope::new(), interner),
        Expr::As { inner, .. } => emit_expr(emitter, inner, interner),
    }
}

pub(crate) fn literal_js(emitter: &mut Emitter, literal: &Literal<'_>, interner: &Interner) -> String {
    match literal {
        Literal::Number(sym) => interner.resolve(*sym).to_string(),
        Literal::String(sym) => js_string_literal(interner.resolve(*sym)),
        Literal::Bool(b) => b.to_string(),
        Literal::Nil => "null".to_string(),
        Literal::Template(parts) => {
            let mut out = String::from("`");
            for part in parts.iter() {
                match part {
                    tova_ast::TemplatePart::Text(sym) => out.push_str(&js_template_text(interner.resolve(*sym))),
                    tova_ast::TemplatePart::Expr(e) => {
                        out.push_str("${");
                        out.push_str(&emit_expr(emitter, e, interner));
                        out.push('}');
                    }
                }
            }
            out.push('`');
            out
        }
    }
}

pub(crate) fn binary_op_js(op: BinaryOpKind) -> &'static str {
    match op {
        BinaryOpKind::Or => "||",
        BinaryOpKind::And => "&&",
        BinaryOpKind::Eq => "===",
        BinaryOpKind::NotEq => "!==",
        BinaryOpKind::Lt => "<",
        BinaryOpKind::Gt => ">",
        BinaryOpKind::LtEq => "<=",
        BinaryOpKind::GtEq => ">=",
        BinaryOpKind::Add | BinaryOpKind::Concat => "+",
        BinaryOpKind::Sub => "-",
        BinaryOpKind::Mul => "*",
        BinaryOpKind::Div => "/",
        BinaryOpKind::Mod => "%",
        BinaryOpKind::Pow => "**",
        // Lowered separately below; never reached through binary_op_js.
        BinaryOpKind::Range | BinaryOpKind::RangeInclusive => "..",
    }
}

pub(crate) fn compound_op_js(op: CompoundAssignOpKind) -> &'static str {
    match op {
        CompoundAssignOpKind::Add => "+=",
        CompoundAssignOpKind::Sub => "-=",
        CompoundAssignOpKind::Mul => "*=",
        CompoundAssignOpKind::Div => "/=",
    }
}

fn emit_chained_comparison(emitter: &mut Emitter, operands: &[Expr<'_>], ops: &[BinaryOpKind], interner: &Interner) -> String {
    let temps: Vec<String> = (0..operands.len()).map(|i| format!("__cc{i}")).collect();
    let values: Vec<String> = operands.iter().map(|e| emit_expr(emitter, e, interner)).collect();
    let comparisons: Vec<String> = ops
        .iter()
        .enumerate()
        .map(|(i, op)| format!("{} {} {}", temps[i], binary_op_js(*op), temps[i + 1]))
        .collect();
    format!("((({}) => ({}))({}))", temps.join(", "), comparisons.join(" && "), values.join(", "))
}

fn emit_call(emitter: &mut Emitter, callee: &Expr<'_>, args: &[CallArg<'_>], interner: &Interner) -> String {
    if let Some(inlined) = devirt::try_fuse_map_chain(callee, args, interner, emitter) {
        return inlined;
    }
    if let Some(inlined) = devirt::try_inline_constructor_method(callee, args, interner, emitter) {
        return inlined;
    }
    let callee_js = emit_expr(emitter, callee, interner);
    let args_js: Vec<String> = args
        .iter()
        .map(|a| {
            let v = emit_expr(emitter, a.value, interner);
            if a.spread {
                format!("...{v}")
            } else {
                v
            }
        })
        .collect();
    format!("{callee_js}({})", args_js.join(", "))
}

fn emit_slice(emitter: &mut Emitter, object: &Expr<'_>, low: Option<&Expr<'_>>, high: Option<&Expr<'_>>, step: Option<&Expr<'_>>, interner: &Interner) -> String {
    let o = emit_expr(emitter, object, interner);
    let lo = low.map(|e| emit_expr(emitter, e, interner)).unwrap_or_else(|| "undefined".to_string());
    let hi = high.map(|e| emit_expr(emitter, e, interner)).unwrap_or_else(|| "undefined".to_string());
    match step {
        Some(step) => {
            let st = emit_expr(emitter, step, interner);
            format!("__tova_slice({o}, {lo}, {hi}, {st})")
        }
        None => format!("{o}.slice({lo}, {hi})"),
    }
}

fn emit_pipe(emitter: &mut Emitter, left: &Expr<'_>, target: &Expr<'_>, interner: &Interner) -> String {
    let l = emit_expr(emitter, left, interner);
    match target {
        Expr::Call { callee, args, .. } => {
            let callee_js = emit_expr(emitter, callee, interner);
            let mut args_js: Vec<String> = vec![l];
            args_js.extend(args.iter().map(|a| emit_expr(emitter, a.value, interner)));
            format!("{callee_js}({})", args_js.join(", "))
        }
        _ => {
            let t = emit_expr(emitter, target, interner);
            format!("{t}({l})")
        }
    }
}

fn emit_match_expr(emitter: &mut Emitter, subject: &Expr<'_>, arms: &[tova_ast::MatchArm<'_>], interner: &Interner) -> String {
    let subject_js = emit_expr(emitter, subject, interner);
    let mut body = Emitter::new();
    body.line(&format!("const __m = {subject_js};"));
    for arm in arms.iter() {
        let compiled = compile_pattern(&arm.pattern, "__m", interner);
        let mut cond = compiled.predicate();
        if let Some(guard) = arm.guard {
            let guard_js = emit_expr(&mut body, guard, interner);
            cond = format!("({cond}) && ({guard_js})");
        }
        body.line(&format!("if ({cond}) {{"));
        body.indented(|e| {
            for (name, accessor) in &compiled.bindings {
                e.line(&format!("const {name} = {accessor};"));
            }
            let value = emit_expr(e, arm.body, interner);
            e.line(&format!("return {value};"));
        });
        body.line("}");
    }
    body.line("throw new Error('no match arm satisfied');");
    emitter.require(Helper::MatchHelpers);
    emitter.absorb_helpers_from(&body);
    format!("(() => {{\n{}}})()", body.finish())
}

fn emit_list_comprehension(emitter: &mut Emitter, comp: &tova_ast::Comprehension<'_>, interner: &Interner) -> String {
    let mut body = Emitter::new();
    body.line("const __out = [];");
    emit_comprehension_clauses(&mut body, comp.clauses, interner, &|e: &mut Emitter| {
        let value = emit_expr(e, comp.element, interner);
        e.line(&format!("__out.push({value});"));
    });
    body.line("return __out;");
    emitter.absorb_helpers_from(&body);
    format!("(() => {{\n{}}})()", body.finish())
}

fn emit_dict_comprehension(emitter: &mut Emitter, comp: &tova_ast::Comprehension<'_>, interner: &Interner) -> String {
    let value_expr = comp.value.unwrap_or(comp.element);
    let mut body = Emitter::new();
    body.line("const __out = new Map();");
    emit_comprehension_clauses(&mut body, comp.clauses, interner, &|e: &mut Emitter| {
        let key = emit_expr(e, comp.element, interner);
        let value = emit_expr(e, value_expr, interner);
        e.line(&format!("__out.set({key}, {value});"));
    });
    body.line("return __out;");
    emitter.absorb_helpers_from(&body);
    format!("(() => {{\n{}}})()", body.finish())
}

fn emit_comprehension_clauses(body: &mut Emitter, clauses: &[tova_ast::ComprehensionClause<'_>], interner: &Interner, emit_body: &dyn Fn(&mut Emitter)) {
    match clauses.split_first() {
        None => emit_body(body),
        Some((first, rest)) => match first {
            tova_ast::ComprehensionClause::For { pattern, iterable } => {
                let iter_js = emit_expr(body, iterable, interner);
                body.line(&format!("for (const __item of {iter_js}) {{"));
                body.indented(|e| {
                    let compiled = compile_pattern(pattern, "__item", interner);
                    for (name, accessor) in &compiled.bindings {
                        e.line(&format!("const {name} = {accessor};"));
                    }
                    emit_comprehension_clauses(e, rest, interner, emit_body);
                });
                body.line("}");
            }
            tova_ast::ComprehensionClause::If { condition } => {
                let cond_js = emit_expr(body, condition, interner);
                body.line(&format!("if ({cond_js}) {{"));
                body.indented(|e| emit_comprehension_clauses(e, rest, interner, emit_body));
                body.line("}");
            }
        },
    }
}

fn emit_column(emitter: &mut Emitter, expr: &ColumnExpr<'_>, interner: &Interner) -> String {
    match expr {
        ColumnExpr::Column { path, .. } => column_path_js(path, interner),
        ColumnExpr::Negated { path, .. } => format!("(-{})", column_path_js(path, interner)),
        ColumnExpr::Assignment { path, value, .. } => {
            let v = emit_expr(emitter, value, interner);
            format!("({} = {v})", column_path_js(path, interner))
        }
    }
}

fn column_path_js(path: &[tova_base::Symbol], interner: &Interner) -> String {
    let mut segments = path.iter().map(|s| js_ident(interner.resolve(*s)));
    let first = segments.next().unwrap_or_default();
    let mut out = format!("__row.{first}");
    for seg in segments {
        out.push('.');
        out.push_str(&seg);
    }
    out
}
