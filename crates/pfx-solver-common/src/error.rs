//! Error types and exit codes for solver communication.

use pfx_core::{SolverError, SolverErrorKind};
use thiserror::Error;

/// Exit codes of a solver shim executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Results were written to stdout
    Success = 0,
    /// Malformed request or a network the engine rejects
    InvalidInput = 1,
    /// The engine ran but did not converge
    SolverError = 2,
    /// The shim gave up (time limit, interrupt)
    Aborted = 3,
    /// Segfault (SIGSEGV) - native crash
    Segfault = 139,
}

impl ExitCode {
    /// Convert from raw exit code to ExitCode enum.
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ExitCode::Success,
            1 => ExitCode::InvalidInput,
            2 => ExitCode::SolverError,
            3 => ExitCode::Aborted,
            139 => ExitCode::Segfault,
            _ => ExitCode::SolverError, // Unknown codes treated as solver error
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

/// Errors that can occur while exchanging data with a solver process.
#[derive(Debug, Error)]
pub enum SolverProcessError {
    /// Program is neither a path nor on the search path.
    #[error("Solver program '{program}' not found")]
    NotFound { program: String },

    /// Solver process failed to start.
    #[error("Failed to start solver process: {0}")]
    ProcessStart(#[source] std::io::Error),

    /// Solver process exited unsuccessfully.
    #[error("Solver process failed with exit code {exit_code:?}: {message}")]
    ProcessFailed { exit_code: ExitCode, message: String },

    /// Killed by a signal, so no exit code.
    #[error("Solver process was terminated: {message}")]
    Terminated { message: String },

    /// Response did not follow the exchange protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolverProcessError {
    /// Taxonomy kind of this failure.
    pub fn kind(&self) -> SolverErrorKind {
        match self {
            SolverProcessError::NotFound { .. } | SolverProcessError::ProcessStart(_) => {
                SolverErrorKind::Unavailable
            }
            SolverProcessError::ProcessFailed { exit_code, .. } => match exit_code {
                ExitCode::InvalidInput => SolverErrorKind::InvalidInput,
                ExitCode::Aborted | ExitCode::Segfault => SolverErrorKind::Aborted,
                ExitCode::SolverError | ExitCode::Success => SolverErrorKind::NotConverged,
            },
            SolverProcessError::Terminated { .. } => SolverErrorKind::Aborted,
            SolverProcessError::Protocol(_)
            | SolverProcessError::Json(_)
            | SolverProcessError::Io(_) => SolverErrorKind::Protocol,
        }
    }

    /// Convert into the solver error of the engine labelled `solver`.
    pub fn into_solver_error(self, solver: &str) -> SolverError {
        SolverError::new(solver, self.kind(), self.to_string())
    }
}

pub type SolverProcessResult<T> = Result<T, SolverProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_to_kinds() {
        let failed = |code| SolverProcessError::ProcessFailed {
            exit_code: ExitCode::from_raw(code),
            message: String::new(),
        };
        assert_eq!(failed(1).kind(), SolverErrorKind::InvalidInput);
        assert_eq!(failed(2).kind(), SolverErrorKind::NotConverged);
        assert_eq!(failed(3).kind(), SolverErrorKind::Aborted);
        assert_eq!(failed(42).kind(), SolverErrorKind::NotConverged);
        assert_eq!(
            SolverProcessError::NotFound {
                program: "missing".into()
            }
            .kind(),
            SolverErrorKind::Unavailable
        );
    }

    #[test]
    fn conversion_keeps_the_message() {
        let err = SolverProcessError::Protocol("missing results".into()).into_solver_error("alternate");
        assert_eq!(err.solver, "alternate");
        assert_eq!(err.kind, SolverErrorKind::Protocol);
        assert!(err.message.contains("missing results"));
    }
}
