//! Solver contracts implemented on top of shim subprocesses.

use crate::error::SolverProcessError;
use crate::protocol::{AlternateRequest, AlternateResponse, CanonicalRequest, CanonicalResponse};
use crate::subprocess::{SolverCommand, SolverProcess};
use pfx_core::alternate::{AltNetwork, RawResultSet};
use pfx_core::{
    AltSolverOptions, AlternateSolver, CalculationParams, CanonicalSolver, Network, ResultSet,
    SolverError,
};
use tracing::info;

/// Canonical engine behind a shim executable.
pub struct CommandCanonicalSolver {
    name: String,
    process: SolverProcess,
}

impl CommandCanonicalSolver {
    pub fn new(command: SolverCommand) -> Result<Self, SolverError> {
        let process = SolverProcess::new(command).map_err(|e| e.into_solver_error("canonical"))?;
        Ok(Self {
            name: "canonical".to_string(),
            process,
        })
    }
}

impl CanonicalSolver for CommandCanonicalSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn calculate_power_flow(
        &self,
        network: &Network,
        params: &CalculationParams,
    ) -> Result<ResultSet, SolverError> {
        info!(
            program = %self.process.binary_path().display(),
            mode = %params.symmetry,
            method = params.method.as_str(),
            "running canonical solver"
        );
        let request = CanonicalRequest::new(network, params);
        self.process
            .exchange::<_, CanonicalResponse>(&request)
            .and_then(|response| response.into_result_set(params.symmetry))
            .map_err(|e: SolverProcessError| e.into_solver_error(&self.name))
    }
}

/// Alternate engine behind a shim executable.
pub struct CommandAlternateSolver {
    name: String,
    process: SolverProcess,
}

impl CommandAlternateSolver {
    pub fn new(command: SolverCommand) -> Result<Self, SolverError> {
        let process = SolverProcess::new(command).map_err(|e| e.into_solver_error("alternate"))?;
        Ok(Self {
            name: "alternate".to_string(),
            process,
        })
    }
}

impl AlternateSolver for CommandAlternateSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_power_flow(
        &self,
        network: &AltNetwork,
        options: &AltSolverOptions,
    ) -> Result<RawResultSet, SolverError> {
        info!(
            program = %self.process.binary_path().display(),
            symmetric = options.symmetric,
            algorithm = %options.algorithm,
            "running alternate solver"
        );
        let request = AlternateRequest::new(network, options);
        self.process
            .exchange::<_, AlternateResponse>(&request)
            .and_then(AlternateResponse::into_raw_results)
            .map_err(|e| e.into_solver_error(&self.name))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pfx_core::{CalculationSymmetry, ComponentId, ComponentType, Node, SolverErrorKind};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> SolverCommand {
        let path = dir.path().join("engine.sh");
        fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        SolverCommand::new(path.to_string_lossy())
    }

    fn network() -> Network {
        let mut network = Network::new();
        network.node.push(Node::new(ComponentId::new(1), 400.0));
        network
    }

    #[test]
    fn canonical_results_come_back_typed() {
        let dir = TempDir::new().unwrap();
        let command = script(
            &dir,
            r#"echo '{"protocol_version": 1, "data": {"node": [{"id": 1, "energized": 1, "u_pu": 1.0, "u": 400.0, "u_angle": 0.0, "p": 0.0, "q": 0.0}]}}'"#,
        );
        let solver = CommandCanonicalSolver::new(command).unwrap();
        let params = CalculationParams::new(CalculationSymmetry::Symmetric);
        let result = solver.calculate_power_flow(&network(), &params).unwrap();
        assert_eq!(result.ids(ComponentType::Node), vec![ComponentId::new(1)]);
    }

    #[test]
    fn non_convergence_is_reported_as_solver_error() {
        let dir = TempDir::new().unwrap();
        let solver = CommandCanonicalSolver::new(script(&dir, "echo 'max iterations' >&2\nexit 2"))
            .unwrap();
        let params = CalculationParams::new(CalculationSymmetry::Symmetric);
        let err = solver.calculate_power_flow(&network(), &params).unwrap_err();
        assert_eq!(err.solver, "canonical");
        assert_eq!(err.kind, SolverErrorKind::NotConverged);
        assert!(err.message.contains("max iterations"));
    }

    #[test]
    fn alternate_tables_come_back_raw() {
        let dir = TempDir::new().unwrap();
        let command = script(
            &dir,
            r#"echo '{"protocol_version": 1, "tables": {"res_bus": {"columns": ["vm_pu"], "index": [0], "data": [[1.01]]}}}'"#,
        );
        let solver = CommandAlternateSolver::new(command).unwrap();
        let params = CalculationParams::new(CalculationSymmetry::Symmetric);
        let options = AltSolverOptions::for_params(&params).unwrap();
        let raw = solver
            .run_power_flow(&AltNetwork::default(), &options)
            .unwrap();
        assert_eq!(raw.table("res_bus").unwrap().view().get(0, "vm_pu"), Some(1.01));
    }

    #[test]
    fn missing_shim_is_unavailable() {
        let err = CommandAlternateSolver::new(SolverCommand::new("/nonexistent/alt-engine"))
            .err()
            .unwrap();
        assert_eq!(err.kind, SolverErrorKind::Unavailable);
    }
}
