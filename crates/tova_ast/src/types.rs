//! Type annotation syntax. These are gradual: the analyzer checks them
//! structurally rather than performing Hindley-Milner inference.

use tova_base::{Location, Symbol};

/// A type annotation as written in source (`Int`, `List<T>`, `Int?`,
/// `(Int, Str) -> Bool`, `_`).
#[derive(Debug, Clone)]
pub enum TypeExpr<'a> {
    /// A bare name: `Int`, `Str`, `MyType`.
    Named { name: Symbol, location: Location },
    /// `Name<Arg, ...>`.
    Generic {
        name: Symbol,
        args: &'a [TypeExpr<'a>],
        location: Location,
    },
    /// `T?`: shorthand for an optional/nilable type.
    Optional { inner: &'a TypeExpr<'a>, location: Location },
    /// `[T]`: array/list type.
    Array { element: &'a TypeExpr<'a>, location: Location },
    /// `(A, B) -> C`.
    Function {
        params: &'a [TypeExpr<'a>],
        returns: &'a TypeExpr<'a>,
        location: Location,
    },
    /// `_`: the gradual wildcard, compatible with anything.
    Wildcard { location: Location },
}

impl<'a> TypeExpr<'a> {
    pub fn location(&self) -> Location {
        match self {
            TypeExpr::Named { location, .. }
            | TypeExpr::Generic { location, .. }
            | TypeExpr::Optional { location, .. }
            | TypeExpr::Array { location, .. }
            | TypeExpr::Function { location, .. }
            | TypeExpr::Wildcard { location } => *location,
        }
    }
}

/// A function/method parameter: `name: Type = default`.
#[derive(Debug, Clone)]
pub struct Param<'a> {
    pub name: Symbol,
    pub type_annotation: Option<TypeExpr<'a>>,
    pub default: Option<&'a crate::expr::Expr<'a>>,
    pub location: Location,
}
