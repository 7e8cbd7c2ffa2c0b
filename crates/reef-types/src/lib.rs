//! Shared types used across reef crates.
//!
//! Kept deliberately small: byte spans, diagnostic severities, analysis
//! confidence, and the diagnostic record itself. Everything here is plain
//! data that can cross a process boundary, hence the serde derives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Whether a query chain was proven to originate from a genuine context
/// queryable set (`Definite`) or merely passes through an abstraction the
/// resolver cannot vouch for (`Potential`).
///
/// Confidence selects between the error/warning halves of a paired
/// diagnostic code and carries no other state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Definite,
    Potential,
}

impl Confidence {
    pub fn is_definite(self) -> bool {
        matches!(self, Confidence::Definite)
    }
}

/// Serialize-only: `code` points into the static code table, so a
/// deserialized diagnostic would have nowhere to borrow it from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn info(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn span_len_saturates() {
        assert_eq!(Span::new(4, 2).len(), 0);
        assert!(Span::new(4, 4).is_empty());
        assert_eq!(Span::new(2, 6).len(), 4);
    }

    #[test]
    fn constructors_fix_severity() {
        let d = Diagnostic::warning("X", "msg", None);
        assert_eq!(d.severity, Severity::Warning);
        let d = Diagnostic::info("X", "msg", Some(Span::new(0, 1)));
        assert_eq!(d.severity, Severity::Info);
    }
}
