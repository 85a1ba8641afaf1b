//! Per-compilation type registry: `type` declarations, `trait`/`interface`
//! method tables, and `impl` method registrations tagged with
//! `isAssociated` (spec §4.3 pass 2). Borrows directly from the AST arena
//! rather than copying node data, matching spec §5's "per-compilation type
//! registry" that is built once and read-only for the rest of the pass.

use std::collections::HashMap;

use tova_ast::{FunctionDecl, MethodSignature, TypeDecl};
use tova_base::Symbol;

/// One `type` declaration's variants and type parameters.
#[derive(Debug, Clone)]
pub struct TypeInfo<'a> {
    pub decl: &'a TypeDecl<'a>,
}

/// One `trait`/`interface` declaration's required method signatures.
#[derive(Debug, Clone)]
pub struct TraitInfo<'a> {
    pub name: Symbol,
    pub methods: &'a [MethodSignature<'a>],
}

/// One method registered by an `impl` block, tagged with whether its first
/// parameter is `self` (an instance method) or not (an associated/static
/// function, e.g. a constructor).
#[derive(Debug, Clone, Copy)]
pub struct MethodEntry<'a> {
    pub type_name: Symbol,
    pub trait_name: Option<Symbol>,
    pub method: &'a FunctionDecl<'a>,
    pub is_associated: bool,
}

#[derive(Debug, Default)]
pub struct TypeRegistry<'a> {
    types: HashMap<Symbol, TypeInfo<'a>>,
    traits: HashMap<Symbol, TraitInfo<'a>>,
    /// Methods registered per type, in declaration order, so the code
    /// generator can emit them deterministically.
    methods: HashMap<Symbol, Vec<MethodEntry<'a>>>,
}

impl<'a> TypeRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&mut self, decl: &'a TypeDecl<'a>) -> Option<TypeInfo<'a>> {
        self.types.insert(decl.name, TypeInfo { decl })
    }

    pub fn register_trait(&mut self, name: Symbol, methods: &'a [MethodSignature<'a>]) -> Option<TraitInfo<'a>> {
        self.traits.insert(name, TraitInfo { name, methods })
    }

    /// Registers one `impl` method, deriving `isAssociated` from whether its
    /// first parameter is named `self`.
    pub fn register_method(&mut self, type_name: Symbol, trait_name: Option<Symbol>, method: &'a FunctionDecl<'a>, self_symbol: Symbol) {
        let is_associated = method
            .params
            .first()
            .map(|p| p.name != self_symbol)
            .unwrap_or(true);
        self.methods.entry(type_name).or_default().push(MethodEntry {
            type_name,
            trait_name,
            method,
            is_associated,
        });
    }

    pub fn get_type(&self, name: Symbol) -> Option<&TypeInfo<'a>> {
        self.types.get(&name)
    }

    pub fn get_trait(&self, name: Symbol) -> Option<&TraitInfo<'a>> {
        self.traits.get(&name)
    }

    pub fn methods_of(&self, type_name: Symbol) -> &[MethodEntry<'a>] {
        self.methods.get(&type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Methods of `type_name` implementing `trait_name`, by method name.
    pub fn trait_method_names(&self, type_name: Symbol, trait_name: Symbol) -> Vec<Symbol> {
        self.methods_of(type_name)
            .iter()
            .filter(|m| m.trait_name == Some(trait_name))
            .map(|m| m.method.name)
            .collect()
    }
}
