//! Error and diagnostic types for the TrackVisu core.
//!
//! Two classes of problems exist:
//! - [`CoreError`] is returned when an operation is invoked on data it cannot
//!   work with (an empty track or trajectory). The caller must guard against it.
//! - [`Diagnostic`] records a non-fatal anomaly found while decoding a scenario
//!   document. Decoding always produces a best-effort value alongside them.

use thiserror::Error;

/// Fatal errors of the geometry and interpolation engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Operation requires data that is not there (e.g. zero segments)
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl CoreError {
    /// Creates an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// A non-fatal anomaly reported while decoding a document.
///
/// Line numbers are 1-based and refer to the original document text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// Unexpected section header, missing header row or missing separator
    #[error("line {line}: malformed record: {message}")]
    MalformedRecord { line: usize, message: String },

    /// A field could not be parsed and was replaced by zero
    #[error("line {line}, column {column}: could not parse {token:?}, using 0")]
    NumericParseFailure {
        line: usize,
        column: usize,
        token: String,
    },

    /// A trajectory row matched neither the 11 nor the 12 column layout
    #[error("line {line}: unsupported row with {columns} columns, orientation set to identity")]
    UnsupportedRowShape { line: usize, columns: usize },
}

impl Diagnostic {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            message: message.into(),
        }
    }

    /// Line the diagnostic refers to.
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::MalformedRecord { line, .. }
            | Diagnostic::NumericParseFailure { line, .. }
            | Diagnostic::UnsupportedRowShape { line, .. } => *line,
        }
    }
}

/// Result of a fault-tolerant decode: the value plus everything that went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Decoded<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// True if decoding found no anomalies.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drops the diagnostics.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::NumericParseFailure {
            line: 4,
            column: 2,
            token: "abc".to_string(),
        };
        assert_eq!(d.to_string(), "line 4, column 2: could not parse \"abc\", using 0");
        assert_eq!(d.line(), 4);
    }

    #[test]
    fn test_decoded_map_keeps_diagnostics() {
        let decoded = Decoded::new(2, vec![Diagnostic::malformed(1, "bad header")]);
        let mapped = decoded.map(|v| v * 10);
        assert_eq!(mapped.value, 20);
        assert!(!mapped.is_clean());
    }
}
