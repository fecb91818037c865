//! Error taxonomy for the harness.
//!
//! Each pipeline stage fails with its own error struct so callers can tell
//! *where* a case broke: [`ValidationError`] (canonical input is
//! inconsistent), [`TranslationError`] (no alternate analogue),
//! [`ReconciliationError`] (alternate output cannot be mapped back) and
//! [`SolverError`] (either engine failed). [`PfxError`] wraps them together
//! with I/O, parse and configuration failures for uniform handling at API
//! boundaries.
//!
//! ```ignore
//! use pfx_core::{PfxError, PfxResult};
//!
//! fn export(path: &str) -> PfxResult<()> {
//!     let network = load_network(path)?;
//!     let translation = translate(&network, symmetry)?;
//!     Ok(())
//! }
//! ```

use crate::ComponentId;
use std::fmt;
use thiserror::Error;

/// One offending component found by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Component category (may be a category name the model does not know)
    pub category: String,
    pub id: Option<ComponentId>,
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category)?;
        if let Some(id) = self.id {
            write!(f, " {}", id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " ({})", field)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Canonical input failed the model-consistency checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn single(
        category: impl Into<String>,
        id: Option<ComponentId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            issues: vec![ValidationIssue {
                category: category.into(),
                id,
                field: None,
                message: message.into(),
            }],
        }
    }

    pub fn first(&self) -> Option<&ValidationIssue> {
        self.issues.first()
    }

    /// Category of the first offending component.
    pub fn category(&self) -> Option<&str> {
        self.first().map(|issue| issue.category.as_str())
    }

    /// Identifier of the first offending component.
    pub fn id(&self) -> Option<ComponentId> {
        self.first().and_then(|issue| issue.id)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => write!(f, "invalid input"),
            [only] => write!(f, "invalid input: {}", only),
            [first, rest @ ..] => write!(
                f,
                "invalid input: {} (and {} more issue{})",
                first,
                rest.len(),
                if rest.len() == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A canonical component has no faithful alternate representation, or the
/// produced index map is not a bijection.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot translate {category}{}: {reason}", fmt_id(.id))]
pub struct TranslationError {
    pub category: String,
    pub id: Option<ComponentId>,
    pub reason: String,
}

impl TranslationError {
    pub fn new(
        category: impl Into<String>,
        id: Option<ComponentId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            id,
            reason: reason.into(),
        }
    }
}

/// Alternate solver output cannot be mapped back onto the canonical ids.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot reconcile {category}{}: {reason}", fmt_id(.id))]
pub struct ReconciliationError {
    pub category: String,
    pub id: Option<ComponentId>,
    pub reason: String,
}

impl ReconciliationError {
    pub fn new(
        category: impl Into<String>,
        id: Option<ComponentId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            id,
            reason: reason.into(),
        }
    }
}

fn fmt_id(id: &Option<ComponentId>) -> String {
    match id {
        Some(id) => format!(" {}", id),
        None => String::new(),
    }
}

/// Why a solver run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErrorKind {
    /// Iteration cap reached without meeting the tolerance
    NotConverged,
    /// The engine rejected its input
    InvalidInput,
    /// The engine could not be started or was not found
    Unavailable,
    /// The engine ran but its output violated the exchange protocol
    Protocol,
    /// Timed out or killed
    Aborted,
}

impl SolverErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverErrorKind::NotConverged => "not converged",
            SolverErrorKind::InvalidInput => "invalid input",
            SolverErrorKind::Unavailable => "unavailable",
            SolverErrorKind::Protocol => "protocol violation",
            SolverErrorKind::Aborted => "aborted",
        }
    }
}

/// Either engine failed to produce a result.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{solver} solver failed ({}): {message}", .kind.as_str())]
pub struct SolverError {
    /// Engine label, e.g. `canonical` or `alternate`
    pub solver: String,
    pub kind: SolverErrorKind,
    pub message: String,
}

impl SolverError {
    pub fn new(solver: impl Into<String>, kind: SolverErrorKind, message: impl Into<String>) -> Self {
        Self {
            solver: solver.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Unified error type for all pfx operations.
#[derive(Error, Debug)]
pub enum PfxError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    /// I/O errors (file access, pipes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl PfxError {
    /// Short stage label used in batch manifests.
    pub fn stage(&self) -> &'static str {
        match self {
            PfxError::Validation(_) => "validation",
            PfxError::Translation(_) => "translation",
            PfxError::Reconciliation(_) => "reconciliation",
            PfxError::Solver(_) => "solver",
            PfxError::Io(_) => "io",
            PfxError::Parse(_) => "parse",
            PfxError::Config(_) => "config",
            PfxError::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Results using PfxError.
pub type PfxResult<T> = Result<T, PfxError>;

impl From<anyhow::Error> for PfxError {
    fn from(err: anyhow::Error) -> Self {
        PfxError::Other(err.to_string())
    }
}

impl From<String> for PfxError {
    fn from(s: String) -> Self {
        PfxError::Other(s)
    }
}

impl From<&str> for PfxError {
    fn from(s: &str) -> Self {
        PfxError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for PfxError {
    fn from(err: serde_json::Error) -> Self {
        PfxError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_component() {
        let err = ValidationError::single("line", Some(ComponentId::new(7)), "to_node 99 does not exist");
        assert_eq!(err.category(), Some("line"));
        assert_eq!(err.id(), Some(ComponentId::new(7)));
        assert_eq!(
            err.to_string(),
            "invalid input: line 7: to_node 99 does not exist"
        );
    }

    #[test]
    fn test_validation_error_counts_remaining_issues() {
        let mut err = ValidationError::single("node", Some(ComponentId::new(1)), "u_rated must be positive");
        err.issues.push(ValidationIssue {
            category: "source".into(),
            id: Some(ComponentId::new(2)),
            field: Some("u_ref".into()),
            message: "required field missing".into(),
        });
        assert!(err.to_string().ends_with("(and 1 more issue)"));
    }

    #[test]
    fn test_translation_error_display() {
        let err = TranslationError::new("link", Some(ComponentId::new(5)), "no alternate analogue");
        assert_eq!(err.to_string(), "cannot translate link 5: no alternate analogue");

        let err = TranslationError::new("index map", None, "row bus[3] has no owner");
        assert_eq!(err.to_string(), "cannot translate index map: row bus[3] has no owner");
    }

    #[test]
    fn test_error_conversion() {
        let err: PfxError = ReconciliationError::new("node", Some(ComponentId::new(1)), "missing row").into();
        assert_eq!(err.stage(), "reconciliation");
        assert!(err.to_string().contains("node 1"));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PfxError = io_err.into();
        assert!(matches!(err, PfxError::Io(_)));

        let err: PfxError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.stage(), "parse");
    }

    #[test]
    fn test_solver_error_display() {
        let err = SolverError::new("alternate", SolverErrorKind::NotConverged, "20 iterations");
        assert_eq!(
            err.to_string(),
            "alternate solver failed (not converged): 20 iterations"
        );
    }
}
