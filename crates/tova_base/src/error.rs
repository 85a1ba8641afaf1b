//! A located error: a message plus the [`Position`] it occurred at.
//!
//! ```
//! use tova_base::{LocatedError, Position, Result};
//!
//! fn parse_number(s: &str) -> Result<i32> {
//!     s.parse().map_err(|_| LocatedError::new(
//!         format!("invalid number: '{}'", s),
//!         Position::new(1, 1),
//!     ))
//! }
//!
//! let err = parse_number("abc").unwrap_err();
//! assert!(err.to_string().contains("invalid number"));
//! ```

use crate::span::Position;
use std::fmt;

/// An error annotated with the source position where it occurred.
///
/// Display format is `{message} at {line}:{column}`, matching the
/// `file:line:column: severity: message` diagnostic format once the
/// caller prepends a file name and severity.
#[derive(Debug, Clone)]
pub struct LocatedError {
    pub message: String,
    pub position: Position,
}

impl LocatedError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.position.line, self.position.column)
    }
}

impl std::error::Error for LocatedError {}

/// Alias for `std::result::Result<T, LocatedError>`.
pub type Result<T> = std::result::Result<T, LocatedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_error_display() {
        let err = LocatedError::new("test error", Position::new(5, 10));
        let display = format!("{}", err);
        assert!(display.contains("test error"));
        assert!(display.contains("5:10"));
    }
}
