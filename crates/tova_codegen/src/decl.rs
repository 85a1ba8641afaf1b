//! Declaration emission shared by every target: functions, sum types
//! (fused with their `impl` methods), traits/interfaces, and imports.
//!
//! A `type` declaration's variants become plain JS factory functions. Each
//! variant's runtime shape is a single object literal carrying `__tag`,
//! the positional `__fields` array match compilation reads from, and each
//! declared field again by name so plain member access (`shape.radius`)
//! just works. `impl` methods for that type are folded directly into the
//! same object literal as method shorthand, so `shape.area()` is an
//! ordinary JS method call with no dispatch table involved.

use tova_ast::{Decl, FunctionDecl, ImplDecl, TraitDecl, TypeDecl};
use tova_base::Interner;

use crate::emitter::{Emitter, Helper};
use crate::stmt::{contains_propagate, emit_block};
use crate::strings::js_ident;

/// Emits every top-level declaration in `decls`, resolving `impl` blocks
/// against the `type` they extend before emitting the type's factories.
pub fn emit_decls(emitter: &mut Emitter, decls: &[&Decl<'_>], interner: &Interner) {
    let impls: Vec<&ImplDecl<'_>> = decls
        .iter()
        .filter_map(|d| match d {
            Decl::Impl(i) => Some(i),
            _ => None,
        })
        .collect();

    for decl in decls {
        match decl {
            Decl::Function(f) => emit_function_decl(emitter, f, interner),
            Decl::Type(t) => emit_type_decl(emitter, t, &impls, interner),
            Decl::Trait(t) | Decl::Interface(t) => emit_trait_decl(emitter, t, interner),
            Decl::Impl(_) => {} // folded into its type's factory above
            Decl::Import(_) => {} // resolved by the driver, which decides module wiring
            Decl::State(_) | Decl::Computed(_) | Decl::Effect(_) | Decl::Component(_) | Decl::Store(_) | Decl::Style(_) => {
                // browser-only forms; routed through `reactive`/`jsx` by the caller instead
            }
            Decl::Route(_) | Decl::Middleware(_) | Decl::Websocket(_) | Decl::Sse(_) | Decl::Db(_) | Decl::Ai(_) => {
                // server-only forms; routed through `server` by the caller instead
            }
        }
    }
}

pub fn emit_function_decl(emitter: &mut Emitter, decl: &FunctionDecl<'_>, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let params: Vec<String> = decl.params.iter().map(|p| js_ident(interner.resolve(p.name))).collect();
    let keyword = if decl.is_async { "async function" } else { "function" };
    emitter.line(&format!("{keyword} {name}({}) {{", params.join(", ")));
    emitter.indented(|e| emit_function_body(e, &decl.body, interner));
    emitter.line("}");
}

/// Wraps the body in a try/catch turning a thrown `__TovaPropagate` into
/// an early return only when the body actually contains a `?` expression
/// — the common case of a propagate-free function stays a plain block.
fn emit_function_body(emitter: &mut Emitter, body: &tova_ast::StmtBlock<'_>, interner: &Interner) {
    if contains_propagate(body) {
        emitter.require(Helper::Propagate);
        emitter.line("try {");
        emitter.indented(|e| emit_block(e, body, interner));
        emitter.line("} catch (__e) {");
        emitter.indented(|e| {
            e.line("if (__e instanceof __TovaPropagate) return __e.value;");
            e.line("throw __e;");
        });
        emitter.line("}");
    } else {
        emit_block(emitter, body, interner);
    }
}

fn emit_type_decl(emitter: &mut Emitter, decl: &TypeDecl<'_>, impls: &[&ImplDecl<'_>], interner: &Interner) {
    let type_name = interner.resolve(decl.name);
    let methods: Vec<&FunctionDecl<'_>> = impls
        .iter()
        .filter(|i| interner.resolve(i.type_name) == type_name)
        .flat_map(|i| i.methods.iter())
        .collect();

    for variant in decl.variants.iter() {
        let ctor_name = js_ident(interner.resolve(variant.name));
        let field_names: Vec<String> = variant.fields.iter().map(|f| js_ident(interner.resolve(f.name))).collect();
        emitter.line(&format!("function {ctor_name}({}) {{", field_names.join(", ")));
        emitter.indented(|e| {
            e.write_indent_prefix();
            e.raw("return {\n");
            e.indented(|e| {
                e.line(&format!("__tag: '{ctor_name}',"));
                e.line(&format!("__fields: [{}],", field_names.join(", ")));
                for field in &field_names {
                    e.line(&format!("{field},"));
                }
                for method in &methods {
                    emit_method_shorthand(e, method, interner);
                }
            });
            e.line("};");
        });
        emitter.line("}");
    }
}

fn emit_method_shorthand(emitter: &mut Emitter, decl: &FunctionDecl<'_>, interner: &Interner) {
    let name = js_ident(interner.resolve(decl.name));
    let params: Vec<String> = decl.params.iter().map(|p| js_ident(interner.resolve(p.name))).collect();
    let prefix = if decl.is_async { "async " } else { "" };
    emitter.line(&format!("{prefix}{name}({}) {{", params.join(", ")));
    emitter.indented(|e| emit_function_body(e, &decl.body, interner));
    emitter.line("},");
}

/// Traits/interfaces are a structural contract the analyzer checks; they
/// have no runtime representation of their own in the emitted output.
fn emit_trait_decl(emitter: &mut Emitter, decl: &TraitDecl<'_>, interner: &Interner) {
    emitter.line(&format!("// trait {} — checked structurally, no runtime output", interner.resolve(decl.name)));
}
