// src/diagnostics.rs
//! Structured diagnostics shared by every pipeline stage.
//!
//! Each stage defines its own `thiserror` + `miette::Diagnostic` error enum
//! with stable codes; this module provides the severity model, the uniform
//! `Diagnostic` record those enums collapse into, and the ordered collection
//! a compilation accumulates.

use std::fmt::Display;

use crate::location::SourceRange;
use crate::SourceManager;

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

/// Extra information attached to a diagnostic, with its own location
/// (e.g. "previous definition here").
#[derive(Debug, Clone)]
pub struct Note {
    pub message: String,
    pub range: SourceRange,
}

/// One reported problem: a stable code, severity, formatted message, the
/// primary source range, and any attached notes. Rendering into text is a
/// separate concern; miette handles it when the caller wants it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub range: SourceRange,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    /// Collapses any miette-enabled error into the uniform record.
    pub fn new<E>(error: &E, range: SourceRange) -> Self
    where
        E: miette::Diagnostic + Display,
    {
        let code = error.code().map(|c| c.to_string()).unwrap_or_default();
        let severity = match error.severity() {
            Some(miette::Severity::Advice) => Severity::Note,
            Some(miette::Severity::Warning) => Severity::Warning,
            _ => Severity::Error,
        };
        Diagnostic {
            code,
            severity,
            message: error.to_string(),
            range,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, message: impl Into<String>, range: SourceRange) -> Self {
        self.notes.push(Note {
            message: message.into(),
            range,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

/// An insertion-ordered diagnostic collection.
#[derive(Debug, Default)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diag: Diagnostic) {
        self.list.push(diag);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.list.extend(other.list);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.list.iter().any(Diagnostic::is_error)
    }

    /// The diagnostics sorted by document order, for callers that want
    /// location-stable output across elaboration orders.
    pub fn sorted(&self, sm: &SourceManager) -> Vec<&Diagnostic> {
        let mut out: Vec<&Diagnostic> = self.list.iter().collect();
        out.sort_by(|a, b| {
            if a.range.start == b.range.start {
                std::cmp::Ordering::Equal
            } else if sm.is_before_in_compilation_unit(a.range.start, b.range.start) {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Greater
            }
        });
        out
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic as MietteDiagnostic;
    use thiserror::Error;

    #[derive(Debug, Error, MietteDiagnostic)]
    enum TestError {
        #[error("something bad: {what}")]
        #[diagnostic(code(E9999))]
        Bad { what: String },

        #[error("merely suspicious")]
        #[diagnostic(code(W9998), severity(Warning))]
        Suspicious,
    }

    #[test]
    fn collapse_preserves_code_and_severity() {
        let d = Diagnostic::new(
            &TestError::Bad { what: "x".into() },
            SourceRange::NONE,
        );
        assert_eq!(d.code, "E9999");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "something bad: x");
        assert!(d.is_error());

        let w = Diagnostic::new(&TestError::Suspicious, SourceRange::NONE);
        assert_eq!(w.severity, Severity::Warning);
        assert!(!w.is_error());
    }

    #[test]
    fn collection_tracks_errors() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());
        diags.add(Diagnostic::new(&TestError::Suspicious, SourceRange::NONE));
        assert!(!diags.has_errors());
        diags.add(Diagnostic::new(
            &TestError::Bad { what: "y".into() },
            SourceRange::NONE,
        ));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
    }
}
