//! Solver adapters and the JSON exchange protocol for pfx engines.
//!
//! The harness never links a power-flow engine. Each engine is a shim
//! executable that reads one request from stdin and writes one response to
//! stdout, so engine crashes stay out of the harness process and engines
//! written in any language can be plugged in.
//!
//! # Architecture
//!
//! ```text
//! pfx ──stdin──> canonical shim  (Network + CalculationParams)
//!     <─stdout── output dataset
//!     <─stderr── (logs/errors)
//!
//! pfx ──stdin──> alternate shim  (AltNetwork + AltSolverOptions)
//!     <─stdout── res_* tables
//! ```
//!
//! Exit codes follow [`ExitCode`]; a non-converged calculation exits with 2
//! and maps to [`SolverErrorKind::NotConverged`](pfx_core::SolverErrorKind).
//!
//! # Built-in engines
//!
//! [`FlatCanonicalSolver`] and [`FlatAlternateSolver`] are in-process flat
//! profile engines. They do not solve the network equations but agree with
//! each other through a correct translation, which makes them the engines of
//! choice for tests and dry runs.
//!
//! # Protocol Version
//!
//! Breaking changes to the message layout increment [`PROTOCOL_VERSION`].

pub mod adapters;
pub mod error;
pub mod flat;
pub mod protocol;
pub mod subprocess;

pub use adapters::{CommandAlternateSolver, CommandCanonicalSolver};
pub use error::{ExitCode, SolverProcessError};
pub use flat::{FlatAlternateSolver, FlatCanonicalSolver};
pub use protocol::PROTOCOL_VERSION;
pub use subprocess::{is_solver_installed, SolverCommand, SolverProcess};

use pfx_core::{AlternateSolver, CanonicalSolver, SolverError};
use serde::{Deserialize, Serialize};

/// Engine selection as written in configuration files.
///
/// ```toml
/// [canonical]
/// kind = "command"
/// program = "pgm-shim"
/// args = ["--threads", "1"]
///
/// [alternate]
/// kind = "flat"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EngineSpec {
    /// Built-in flat profile engine.
    #[default]
    Flat,
    /// Shim executable speaking the JSON protocol.
    Command(SolverCommand),
}

impl EngineSpec {
    pub fn describe(&self) -> String {
        match self {
            EngineSpec::Flat => "flat (built-in)".to_string(),
            EngineSpec::Command(command) if command.args.is_empty() => command.program.clone(),
            EngineSpec::Command(command) => {
                format!("{} {}", command.program, command.args.join(" "))
            }
        }
    }

    /// Instantiate a canonical engine. Fails when a shim cannot be found.
    pub fn canonical(&self) -> Result<Box<dyn CanonicalSolver>, SolverError> {
        Ok(match self {
            EngineSpec::Flat => Box::new(FlatCanonicalSolver),
            EngineSpec::Command(command) => Box::new(CommandCanonicalSolver::new(command.clone())?),
        })
    }

    pub fn alternate(&self) -> Result<Box<dyn AlternateSolver>, SolverError> {
        Ok(match self {
            EngineSpec::Flat => Box::new(FlatAlternateSolver),
            EngineSpec::Command(command) => Box::new(CommandAlternateSolver::new(command.clone())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_core::SolverErrorKind;

    #[test]
    fn engine_spec_from_json() {
        let flat: EngineSpec = serde_json::from_str(r#"{"kind": "flat"}"#).unwrap();
        assert_eq!(flat, EngineSpec::Flat);

        let command: EngineSpec =
            serde_json::from_str(r#"{"kind": "command", "program": "pgm-shim", "args": ["-v"]}"#)
                .unwrap();
        assert_eq!(
            command,
            EngineSpec::Command(SolverCommand::new("pgm-shim").with_args(["-v"]))
        );
        assert_eq!(command.describe(), "pgm-shim -v");
    }

    #[test]
    fn flat_engines_instantiate() {
        assert_eq!(EngineSpec::Flat.canonical().unwrap().name(), "flat");
        assert_eq!(EngineSpec::Flat.alternate().unwrap().name(), "flat");
    }

    #[test]
    fn missing_command_is_unavailable() {
        let spec = EngineSpec::Command(SolverCommand::new("/nonexistent/pfx-shim"));
        let err = spec.canonical().err().unwrap();
        assert_eq!(err.kind, SolverErrorKind::Unavailable);
    }
}
