//! Built-in names registered into the module scope before the declaration
//! pass runs (spec §4.3 pass 1: "Register built-in names ... into the
//! module scope").

use tova_base::{Interner, Location, Symbol};

use crate::scope::{Binding, BindingKind, ScopeId, ScopeTree};

/// Stdlib functions available in every scope, independent of which block
/// kinds the file uses.
const CORE_FUNCTIONS: &[&str] = &[
    "print", "len", "range", "map", "filter", "reduce", "sum", "min", "max", "sort", "reverse",
    "keys", "values", "entries", "parseInt", "parseFloat", "toString", "now", "sleep", "env",
];

/// Sum-type constructors, always in scope (spec §4.4 names them as
/// devirtualization targets, so they must resolve everywhere).
const CONSTRUCTOR_NAMES: &[&str] = &["Ok", "Err", "Some", "None"];

/// Interns and defines every built-in name into `scope` (the module scope).
pub fn register_builtins(tree: &mut ScopeTree, interner: &mut Interner, scope: ScopeId, file: Symbol) {
    let location = Location::new(1, 1, file);
    for name in CORE_FUNCTIONS.iter().chain(CONSTRUCTOR_NAMES) {
        let symbol = interner.intern(name);
        tree.define(scope, Binding { name: symbol, kind: BindingKind::Builtin, location });
    }
}
