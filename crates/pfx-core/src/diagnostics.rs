//! Issue collection for validation passes.
//!
//! The validator reports everything it finds in one pass instead of stopping
//! at the first problem. Each issue names the component category and, when
//! known, the component id and field:
//!
//! - Severity levels (Warning, Error)
//! - Category is the component category (`line`, `source`, ...) or a check
//!   group such as `topology`
//! - Errors are turned into a [`ValidationError`] by [`Diagnostics::into_result`]
//!
//! # Example
//!
//! ```
//! use pfx_core::diagnostics::Diagnostics;
//! use pfx_core::ComponentId;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("topology", None, "node 4 is not connected to a source");
//! diag.add_field_error("line", Some(ComponentId::new(7)), "to_node", "node 99 does not exist");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert!(diag.into_result().is_err());
//! ```

use crate::error::{ValidationError, ValidationIssue};
use crate::ComponentId;
use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the case can still be exported
    Warning,
    /// The case must not reach a solver
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Component category or check group
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ComponentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            id: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn with_id(mut self, id: Option<ComponentId>) -> Self {
        self.id = id;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}", severity, self.category)?;
        if let Some(id) = self.id {
            write!(f, " {}", id)?;
        }
        write!(f, "] ")?;
        if let Some(field) = &self.field {
            write!(f, "{}: ", field)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Collection of diagnostic issues for one validation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw issue directly
    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, id: Option<ComponentId>, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_id(id));
    }

    pub fn add_error(&mut self, category: &str, id: Option<ComponentId>, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_id(id));
    }

    pub fn add_field_error(
        &mut self,
        category: &str,
        id: Option<ComponentId>,
        field: &str,
        message: &str,
    ) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Error, category, message)
                .with_id(id)
                .with_field(field),
        );
    }

    /// Count warning issues
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Count error issues
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// Keep the diagnostics when there are only warnings, otherwise turn the
    /// errors into a [`ValidationError`].
    pub fn into_result(self) -> Result<Diagnostics, ValidationError> {
        if !self.has_errors() {
            return Ok(self);
        }
        let issues = self
            .errors()
            .map(|issue| ValidationIssue {
                category: issue.category.clone(),
                id: issue.id,
                field: issue.field.clone(),
                message: issue.message.clone(),
            })
            .collect();
        Err(ValidationError { issues })
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
