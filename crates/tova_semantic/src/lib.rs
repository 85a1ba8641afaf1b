//! # tova_semantic
//!
//! Binding resolution, context restriction, and gradual type checking over
//! a parsed [`tova_ast::Program`]. [`analyzer::analyze`] is the entry point:
//! it runs the three-pass walk described in its own module doc and returns
//! an [`analyzer::AnalysisResult`] holding the collected diagnostics, the
//! scope tree built along the way, and the per-compilation type registry.
//!
//! [`scope`] and [`type_registry`] are the two tables the analyzer builds;
//! [`gradual`] is the structural (non-inferring) type model the analyzer
//! checks annotations and literals against; [`builtins`] seeds the module
//! scope with stdlib names before any user binding is resolved.

pub mod analyzer;
pub mod builtins;
pub mod gradual;
pub mod scope;
pub mod type_registry;

pub use analyzer::{analyze, AnalysisOptions, AnalysisResult};
pub use gradual::{annotation_type, literal_type, GradualType};
pub use scope::{Binding, BindingKind, ScopeId, ScopeKind, ScopeTree};
pub use type_registry::{MethodEntry, TraitInfo, TypeInfo, TypeRegistry};
