//! Source location tracking for tokens, AST nodes, and diagnostics.
//!
//! Tova locations are line/column pairs (both 1-based), not byte offsets:
//! every diagnostic is rendered as `file:line:column`, and the parser's
//! error-recovery synchronization scans for the next line that starts with
//! a known statement keyword, so positions need to stay human-readable
//! rather than byte-precise.
//!
//! ```
//! use tova_base::{Position, Location, Symbol, Interner};
//!
//! let mut interner = Interner::new();
//! let file = interner.intern("main.tova");
//!
//! let start = Position::new(1, 1);
//! let end = Position::new(1, 8);
//! let loc = Location::new(start.line, start.column, file);
//! assert_eq!(loc.line, 1);
//! let _ = end;
//! ```

use crate::intern::Symbol;

/// A 1-based line/column pair within a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Creates a position. Per the lexer's invariants, `line` and `column`
    /// should both be `>= 1`; this constructor does not enforce it so that
    /// callers building synthetic positions for tests stay unencumbered.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position of the very first character of a file.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Advances to the next line, resetting the column.
    pub fn advance_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    /// Advances the column by `n` characters on the current line.
    pub fn advance_column(&mut self, n: u32) {
        self.column += n;
    }
}

/// A source location attached to every AST node: a position plus the file
/// it came from. Tokens carry only a [`Position`] (the file is implicit —
/// one token stream is always one file); AST nodes carry a full `Location`
/// because diagnostics, source maps, and the LSP surface all need to name
/// the file a node came from once multiple modules are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub file: Symbol,
}

impl Location {
    pub fn new(line: u32, column: u32, file: Symbol) -> Self {
        Self { line, column, file }
    }

    pub fn from_position(position: Position, file: Symbol) -> Self {
        Self {
            line: position.line,
            column: position.column,
            file,
        }
    }

    pub fn position(self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Combines two locations, keeping the earlier one — used when building
    /// the span of a compound expression from its first sub-expression.
    /// Both locations must share a file; if they don't, `self` wins since
    /// cross-file merges only happen for synthetic nodes that don't matter
    /// for diagnostics.
    pub fn merge(self, other: Location) -> Location {
        if (self.line, self.column) <= (other.line, other.column) {
            self
        } else {
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_start_is_one_one() {
        let p = Position::start();
        assert_eq!(p.line, 1);
        assert_eq!(p.column, 1);
    }

    #[test]
    fn advance_line_resets_column() {
        let mut p = Position::new(1, 5);
        p.advance_line();
        assert_eq!(p.line, 2);
        assert_eq!(p.column, 1);
    }

    #[test]
    fn advance_column_accumulates() {
        let mut p = Position::new(1, 1);
        p.advance_column(3);
        p.advance_column(2);
        assert_eq!(p.column, 6);
    }

    #[test]
    fn location_merge_keeps_earlier() {
        let file = Symbol::EMPTY;
        let a = Location::new(5, 1, file);
        let b = Location::new(3, 1, file);
        let merged = a.merge(b);
        assert_eq!(merged.line, 3);
    }

    #[test]
    fn location_from_position_carries_file() {
        let file = Symbol::EMPTY;
        let loc = Location::from_position(Position::new(2, 4), file);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 4);
        assert_eq!(loc.file, file);
    }
}
