//! Expression grammar.

use tova_base::{Location, Symbol};

use crate::literal::Literal;
use crate::pattern::Pattern;
use crate::types::{Param, TypeExpr};

/// Binary operators, in the precedence tiers the parser's Pratt grid
/// assigns them (assignment is handled separately as a statement form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Range,
    RangeInclusive,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// String concatenation (`++`); distinct from numeric `Add` so the code
    /// generator can lower both to JS `+` without ambiguity at this layer.
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Not,
    Neg,
    /// `!` used as a non-null assertion rather than logical negation;
    /// disambiguated by the parser from context (postfix vs prefix).
    NonNullAssert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundAssignOpKind {
    Add,
    Sub,
    Mul,
    Div,
}

/// One positional or named call argument.
#[derive(Debug, Clone)]
pub struct CallArg<'a> {
    pub name: Option<Symbol>,
    pub value: &'a Expr<'a>,
    /// `true` for `...expr` spread arguments.
    pub spread: bool,
    pub location: Location,
}

/// One arm of a `match` expression.
#[derive(Debug, Clone)]
pub struct MatchArm<'a> {
    pub pattern: Pattern<'a>,
    /// `pattern if guard => body`.
    pub guard: Option<&'a Expr<'a>>,
    pub body: &'a Expr<'a>,
    pub location: Location,
}

/// A clause in a list/dict comprehension: `for x in iter` or `if cond`.
#[derive(Debug, Clone)]
pub enum ComprehensionClause<'a> {
    For { pattern: Pattern<'a>, iterable: &'a Expr<'a> },
    If { condition: &'a Expr<'a> },
}

/// A list or dict comprehension body.
#[derive(Debug, Clone)]
pub struct Comprehension<'a> {
    pub element: &'a Expr<'a>,
    /// Present only for dict comprehensions (`{k: v for ...}`).
    pub value: Option<&'a Expr<'a>>,
    pub clauses: &'a [ComprehensionClause<'a>],
    pub location: Location,
}

/// A column-pipeline expression body: `where(.age > 18)`, `derive(.full = .a + .b)`.
#[derive(Debug, Clone)]
pub enum ColumnExpr<'a> {
    /// `.col` or `.col.sub` (row-relative member access).
    Column { path: &'a [Symbol], location: Location },
    /// `.col = expr`.
    Assignment {
        path: &'a [Symbol],
        value: &'a Expr<'a>,
        location: Location,
    },
    /// `-.col`.
    Negated { path: &'a [Symbol], location: Location },
}

/// An expression node. Every variant carries a [`Location`].
#[derive(Debug, Clone)]
pub enum Expr<'a> {
    Literal {
        value: Literal<'a>,
        location: Location,
    },
    Identifier {
        name: Symbol,
        location: Location,
    },
    Binary {
        op: BinaryOpKind,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        location: Location,
    },
    Unary {
        op: UnaryOpKind,
        operand: &'a Expr<'a>,
        location: Location,
    },
    /// `a < b < c`, flattened into its operand chain plus the comparison at
    /// each step; the middle operand is evaluated once by the code
    /// generator even though it conceptually appears twice.
    ChainedComparison {
        operands: &'a [Expr<'a>],
        ops: &'a [BinaryOpKind],
        location: Location,
    },
    Call {
        callee: &'a Expr<'a>,
        args: &'a [CallArg<'a>],
        location: Location,
    },
    Member {
        object: &'a Expr<'a>,
        property: Symbol,
        location: Location,
    },
    /// `a?.b` / `a?.[i]` / `a?.(args)`.
    OptionalMember {
        object: &'a Expr<'a>,
        property: Symbol,
        location: Location,
    },
    Index {
        object: &'a Expr<'a>,
        index: &'a Expr<'a>,
        location: Location,
    },
    Slice {
        object: &'a Expr<'a>,
        low: Option<&'a Expr<'a>>,
        high: Option<&'a Expr<'a>>,
        step: Option<&'a Expr<'a>>,
        location: Location,
    },
    /// `lhs |> f(args)`.
    Pipe {
        left: &'a Expr<'a>,
        target: &'a Expr<'a>,
        location: Location,
    },
    Lambda {
        params: &'a [Param<'a>],
        body: &'a Expr<'a>,
        location: Location,
    },
    Match {
        subject: &'a Expr<'a>,
        arms: &'a [MatchArm<'a>],
        location: Location,
    },
    /// `...expr`, valid inside array/dict literals and call arguments.
    Spread {
        inner: &'a Expr<'a>,
        location: Location,
    },
    /// `expr?`: the propagation postfix.
    Propagate {
        inner: &'a Expr<'a>,
        location: Location,
    },
    Await {
        inner: &'a Expr<'a>,
        location: Location,
    },
    Yield {
        inner: Option<&'a Expr<'a>>,
        location: Location,
    },
    /// `if cond { a } else { b }` used as an expression.
    If {
        condition: &'a Expr<'a>,
        then_branch: &'a Expr<'a>,
        else_branch: Option<&'a Expr<'a>>,
        location: Location,
    },
    /// `expr is Variant(...)` / `expr is Type`.
    Is {
        subject: &'a Expr<'a>,
        pattern: Pattern<'a>,
        location: Location,
    },
    /// `expr in iterable` / `expr not in iterable`.
    Membership {
        value: &'a Expr<'a>,
        iterable: &'a Expr<'a>,
        negated: bool,
        location: Location,
    },
    /// `lhs += rhs` etc, used where assignment appears in expression
    /// position (e.g. inside a `for` loop header).
    CompoundAssign {
        op: CompoundAssignOpKind,
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
        location: Location,
    },
    ListComprehension {
        comprehension: Comprehension<'a>,
        location: Location,
    },
    DictComprehension {
        comprehension: Comprehension<'a>,
        location: Location,
    },
    Range {
        low: &'a Expr<'a>,
        high: &'a Expr<'a>,
        inclusive: bool,
        location: Location,
    },
    Tuple {
        elements: &'a [Expr<'a>],
        location: Location,
    },
    Array {
        elements: &'a [Expr<'a>],
        location: Location,
    },
    Dict {
        entries: &'a [(Expr<'a>, Expr<'a>)],
        location: Location,
    },
    Column {
        expr: ColumnExpr<'a>,
        location: Location,
    },
    /// A nested `<Tag .../>` JSX expression; boxed in [`crate::jsx::JsxNode`]
    /// so the `expr` module doesn't need to depend on the JSX grammar.
    Jsx {
        node: &'a crate::jsx::JsxNode<'a>,
        location: Location,
    },
    /// A cast/type assertion, `expr as Type`.
    As {
        inner: &'a Expr<'a>,
        type_annotation: TypeExpr<'a>,
        location: Location,
    },
}

impl<'a> Expr<'a> {
    pub fn location(&self) -> Location {
        match self {
            Expr::Literal { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::ChainedComparison { location, .. }
            | Expr::Call { location, .. }
            | Expr::Member { location, .. }
            | Expr::OptionalMember { location, .. }
            | Expr::Index { location, .. }
            | Expr::Slice { location, .. }
            | Expr::Pipe { location, .. }
            | Expr::Lambda { location, .. }
            | Expr::Match { location, .. }
            | Expr::Spread { location, .. }
            | Expr::Propagate { location, .. }
            | Expr::Await { location, .. }
            | Expr::Yield { location, .. }
            | Expr::If { location, .. }
            | Expr::Is { location, .. }
            | Expr::Membership { location, .. }
            | Expr::CompoundAssign { location, .. }
            | Expr::ListComprehension { location, .. }
            | Expr::DictComprehension { location, .. }
            | Expr::Range { location, .. }
            | Expr::Tuple { location, .. }
            | Expr::Array { location, .. }
            | Expr::Dict { location, .. }
            | Expr::Column { location, .. }
            | Expr::Jsx { location, .. }
            | Expr::As { location, .. } => *location,
        }
    }

    /// `true` for `state`/`computed`/store-property reads, used upstream by
    /// reactive-closure detection; the expression tree itself stays inert,
    /// this just names what the code generator's `readsSignal` walks.
    pub fn is_identifier_named(&self, name: Symbol) -> bool {
        matches!(self, Expr::Identifier { name: n, .. } if *n == name)
    }
}
