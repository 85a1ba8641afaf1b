//! The structural type model backing spec §4.3's "Types (gradual)" checks.
//!
//! This is not inference: a [`GradualType`] is derived only from a literal's
//! own shape or a written annotation. Anything else (a variable read, a
//! call result, a member access) is [`GradualType::Unknown`], which is
//! compatible with everything — gradual subtyping means the analyzer never
//! rejects code it simply doesn't have enough static information about.

use tova_ast::{Literal, TypeExpr};
use tova_base::Interner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradualType {
    Int,
    Float,
    Str,
    Bool,
    Nil,
    /// A named type this model doesn't special-case (a user `type` name, a
    /// generic, an array, a function type).
    Unknown,
}

impl GradualType {
    pub fn is_numeric(self) -> bool {
        matches!(self, GradualType::Int | GradualType::Float | GradualType::Unknown)
    }

    /// `+` accepts numeric or string operands (spec §4.4 base emitter).
    pub fn is_numeric_or_string(self) -> bool {
        matches!(self, GradualType::Str) || self.is_numeric()
    }

    /// Gradual subtyping: `Unknown` is compatible with anything, and a type
    /// is always compatible with itself.
    pub fn compatible_with(self, other: GradualType) -> bool {
        self == GradualType::Unknown || other == GradualType::Unknown || self == other
    }

    /// `true` only for the one narrowing spec §4.3 singles out:
    /// `Float -> Int` without an explicit `as` cast.
    pub fn narrows_to(self, target: GradualType) -> bool {
        self == GradualType::Float && target == GradualType::Int
    }
}

pub fn literal_type(literal: &Literal<'_>, interner: &Interner) -> GradualType {
    match literal {
        Literal::Number(sym) => {
            let text = interner.resolve(*sym);
            if text.contains(['.', 'e', 'E']) {
                GradualType::Float
            } else {
                GradualType::Int
            }
        }
        Literal::String(_) | Literal::Template(_) => GradualType::Str,
        Literal::Bool(_) => GradualType::Bool,
        Literal::Nil => GradualType::Nil,
    }
}

/// Reads a written type annotation structurally. `Optional` unwraps to its
/// inner type (nilability is not tracked as a distinct dimension here);
/// `Generic`/`Array`/`Function`/`Wildcard` are all `Unknown`.
pub fn annotation_type(annotation: &TypeExpr<'_>, interner: &Interner) -> GradualType {
    match annotation {
        TypeExpr::Named { name, .. } => match interner.resolve(*name) {
            "Int" => GradualType::Int,
            "Float" => GradualType::Float,
            "Str" | "String" => GradualType::Str,
            "Bool" => GradualType::Bool,
            _ => GradualType::Unknown,
        },
        TypeExpr::Optional { inner, .. } => annotation_type(*inner, interner),
        TypeExpr::Generic { .. } | TypeExpr::Array { .. } | TypeExpr::Function { .. } | TypeExpr::Wildcard { .. } => {
            GradualType::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_compatible_with_everything() {
        assert!(GradualType::Unknown.compatible_with(GradualType::Int));
        assert!(GradualType::Str.compatible_with(GradualType::Unknown));
    }

    #[test]
    fn only_float_to_int_narrows() {
        assert!(GradualType::Float.narrows_to(GradualType::Int));
        assert!(!GradualType::Int.narrows_to(GradualType::Float));
        assert!(!GradualType::Str.narrows_to(GradualType::Int));
    }

    #[test]
    fn literal_number_with_dot_is_float() {
        let mut interner = Interner::new();
        let sym = interner.intern("3.14");
        assert_eq!(literal_type(&Literal::Number(sym), &interner), GradualType::Float);
    }

    #[test]
    fn literal_number_without_dot_is_int() {
        let mut interner = Interner::new();
        let sym = interner.intern("42");
        assert_eq!(literal_type(&Literal::Number(sym), &interner), GradualType::Int);
    }
}
