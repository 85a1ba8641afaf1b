//! The diagnostic shape shared by the lexer, parser, analyzer, and CLI.
//!
//! A [`Diagnostic`] is `{ severity, code, message, location }`, rendered as
//! `file:line:column: severity: code: message`. The taxonomy in
//! [`DiagnosticCode`] enumerates every lexical, syntactic, binding, type,
//! and warning-level diagnostic the pipeline can produce.

use crate::intern::{Interner, Symbol};
use crate::span::Location;
use std::fmt;

/// Diagnostic severity. There are exactly two: errors abort a strict,
/// non-tolerant compile; warnings never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The full diagnostic taxonomy, grouped by the pipeline stage that raises
/// each code. IDE integrations (hover, quick-fix) key off this rather than
/// parsing the message string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    // Lexical
    UnterminatedString,
    UnterminatedInterpolation,
    UnterminatedComment,
    UnexpectedCharacter,
    AmbiguousOperator,

    // Syntactic
    UnexpectedToken,
    ExpectedButGot,
    UnclosedBlock,
    TrailingComma,
    IllegalPattern,
    IllegalJsxAttribute,

    // Binding
    UndefinedIdentifier,
    DuplicateDefinition,
    ImmutableReassignment,
    UndefinedLabel,
    BlockKindViolation,

    // Type
    ArityMismatch,
    OperandKindMismatch,
    ReturnTypeMismatch,
    NarrowingWithoutCast,
    TraitConformanceMissing,

    // Semantic warnings
    UnusedBinding,
    SelfReferencingServerCall,
    ThrowInPlaceOfErr,
    BinaryOperatorTypeMismatch,
    MissingReturnOnSomePath,
    UnknownPeerFunction,
}

impl DiagnosticCode {
    /// The stable string form used in `file:line:col: severity: CODE: message`.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedString => "E_UNTERMINATED_STRING",
            DiagnosticCode::UnterminatedInterpolation => "E_UNTERMINATED_INTERPOLATION",
            DiagnosticCode::UnterminatedComment => "E_UNTERMINATED_COMMENT",
            DiagnosticCode::UnexpectedCharacter => "E_UNEXPECTED_CHARACTER",
            DiagnosticCode::AmbiguousOperator => "E_AMBIGUOUS_OPERATOR",
            DiagnosticCode::UnexpectedToken => "E_UNEXPECTED_TOKEN",
            DiagnosticCode::ExpectedButGot => "E_EXPECTED_BUT_GOT",
            DiagnosticCode::UnclosedBlock => "E_UNCLOSED_BLOCK",
            DiagnosticCode::TrailingComma => "E_TRAILING_COMMA",
            DiagnosticCode::IllegalPattern => "E_ILLEGAL_PATTERN",
            DiagnosticCode::IllegalJsxAttribute => "E_ILLEGAL_JSX_ATTRIBUTE",
            DiagnosticCode::UndefinedIdentifier => "E_UNDEFINED_IDENTIFIER",
            DiagnosticCode::DuplicateDefinition => "E_DUPLICATE_DEFINITION",
            DiagnosticCode::ImmutableReassignment => "E_IMMUTABLE_REASSIGNMENT",
            DiagnosticCode::UndefinedLabel => "E_UNDEFINED_LABEL",
            DiagnosticCode::BlockKindViolation => "E_BLOCK_KIND_VIOLATION",
            DiagnosticCode::ArityMismatch => "E_ARITY_MISMATCH",
            DiagnosticCode::OperandKindMismatch => "E_OPERAND_KIND_MISMATCH",
            DiagnosticCode::ReturnTypeMismatch => "E_RETURN_TYPE_MISMATCH",
            DiagnosticCode::NarrowingWithoutCast => "E_NARROWING_WITHOUT_CAST",
            DiagnosticCode::TraitConformanceMissing => "E_TRAIT_CONFORMANCE_MISSING",
            DiagnosticCode::UnusedBinding => "W_UNUSED_BINDING",
            DiagnosticCode::SelfReferencingServerCall => "W_SELF_REFERENCING_SERVER_CALL",
            DiagnosticCode::ThrowInPlaceOfErr => "W_THROW_IN_PLACE_OF_ERR",
            DiagnosticCode::BinaryOperatorTypeMismatch => "W_BINARY_OPERATOR_TYPE_MISMATCH",
            DiagnosticCode::MissingReturnOnSomePath => "W_MISSING_RETURN_ON_SOME_PATH",
            DiagnosticCode::UnknownPeerFunction => "E_UNKNOWN_PEER_FUNCTION",
        }
    }
}

/// A single diagnostic: `{ severity, code, message, location }`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location,
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            location,
        }
    }

    /// Renders `file:line:column: severity: code: message` using the given
    /// interner to resolve the file name symbol.
    pub fn format(&self, interner: &Interner) -> String {
        format!(
            "{}:{}:{}: {}: {}: {}",
            interner.resolve(self.location.file),
            self.location.line,
            self.location.column,
            self.severity,
            self.code.as_str(),
            self.message
        )
    }
}

/// An accumulator for diagnostics produced during one pipeline stage.
///
/// In tolerant mode, every error/warning is pushed here and the stage keeps
/// going with conservative assumptions. In non-tolerant (strict) mode, the
/// first call to [`DiagnosticBag::push_error`] raises immediately via
/// [`DiagnosticBag::first_error`]; callers check that after each push.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosticBag {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&mut self, diag: Diagnostic) {
        debug_assert_eq!(diag.severity, Severity::Error);
        self.errors.push(diag);
    }

    pub fn push_warning(&mut self, diag: Diagnostic) {
        debug_assert_eq!(diag.severity, Severity::Warning);
        self.warnings.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.errors.first()
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Synthesizes a [`Symbol`] for an unnamed source (REPL/test fixtures).
    pub fn anonymous_file(interner: &mut Interner) -> Symbol {
        interner.intern("<anonymous>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Location;

    #[test]
    fn diagnostic_format_matches_file_line_column_shape() {
        let mut interner = Interner::new();
        let file = interner.intern("main.tova");
        let diag = Diagnostic::error(
            DiagnosticCode::UndefinedIdentifier,
            "undefined identifier 'x'",
            Location::new(3, 5, file),
        );
        let rendered = diag.format(&interner);
        assert_eq!(
            rendered,
            "main.tova:3:5: error: E_UNDEFINED_IDENTIFIER: undefined identifier 'x'"
        );
    }

    #[test]
    fn bag_tracks_errors_and_warnings_separately() {
        let mut interner = Interner::new();
        let file = interner.intern("x.tova");
        let mut bag = DiagnosticBag::new();
        bag.push_error(Diagnostic::error(DiagnosticCode::ArityMismatch, "nope", Location::new(1, 1, file)));
        bag.push_warning(Diagnostic::warning(DiagnosticCode::UnusedBinding, "unused", Location::new(2, 1, file)));
        assert!(bag.has_errors());
        assert_eq!(bag.errors.len(), 1);
        assert_eq!(bag.warnings.len(), 1);
        assert_eq!(bag.first_error().unwrap().code.as_str(), "E_ARITY_MISMATCH");
    }

    #[test]
    fn bag_extend_merges_both_lists() {
        let mut interner = Interner::new();
        let file = interner.intern("x.tova");
        let mut a = DiagnosticBag::new();
        a.push_error(Diagnostic::error(DiagnosticCode::ArityMismatch, "a", Location::new(1, 1, file)));
        let mut b = DiagnosticBag::new();
        b.push_warning(Diagnostic::warning(DiagnosticCode::UnusedBinding, "b", Location::new(1, 1, file)));
        a.extend(b);
        assert_eq!(a.errors.len(), 1);
        assert_eq!(a.warnings.len(), 1);
    }
}
