//! User-facing diagnostics (spec §6.4, §7).
//!
//! Diagnostics are data, not [`std::error::Error`]: they accumulate in a
//! module's diagnostic list and are rendered after the fact, never
//! propagated with `?`. Internal "impossible state" errors (reserved type
//! never defined, tuple index out of range) are a separate tier — each
//! downstream crate defines its own `thiserror` enum for those and
//! surfaces them through `anyhow::Result`, aborting compilation.

use std::fmt::{self, Display, Formatter};

use crate::location::Location;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// The closed set of diagnostic kinds the checker must emit (spec §7),
/// plus `SyntaxError` for the parser's own tier ("parser-level errors
/// are reported once and continue to the next statement boundary" —
/// spec §7 — a distinct category from the checker's closed set, but
/// one still rendered through the same `{severity, code, message,
/// location}` format of §6.4).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiagnosticCode {
    UnresolvedImport,
    DuplicateDeclaration,
    TypeMismatch,
    PropertyNotFound,
    ArityMismatch,
    InvalidAssignment,
    NameConflict,
    InvalidOverride,
    CannotInfer,
    UnknownType,
    CyclicTypeAlias,
    SyntaxError,
}

impl Display for DiagnosticCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            DiagnosticCode::UnresolvedImport => "unresolved-import",
            DiagnosticCode::DuplicateDeclaration => "duplicate-declaration",
            DiagnosticCode::TypeMismatch => "type-mismatch",
            DiagnosticCode::PropertyNotFound => "property-not-found",
            DiagnosticCode::ArityMismatch => "arity-mismatch",
            DiagnosticCode::InvalidAssignment => "invalid-assignment",
            DiagnosticCode::NameConflict => "name-conflict",
            DiagnosticCode::InvalidOverride => "invalid-override",
            DiagnosticCode::CannotInfer => "cannot-infer",
            DiagnosticCode::UnknownType => "unknown-type",
            DiagnosticCode::CyclicTypeAlias => "cyclic-type-alias",
            DiagnosticCode::SyntaxError => "syntax-error",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: Some(location),
        }
    }

    #[must_use]
    pub fn error_without_location(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            location: Some(location),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}: {} [{}]", self.severity, self.message, self.code),
            None => write!(f, "{}: {} [{}]", self.severity, self.message, self.code),
        }
    }
}
