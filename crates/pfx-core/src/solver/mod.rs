//! Solver contracts.
//!
//! Both engines are black boxes behind a trait: the canonical engine takes a
//! [`Network`] and returns a canonical [`ResultSet`]; the alternate engine
//! takes an [`AltNetwork`] and returns raw row tables. Implementations live
//! elsewhere (subprocess adapters in `pfx-solver-common`, in-process
//! reference engines in tests).

mod method;

pub use method::CalculationMethod;

use crate::alternate::{AltNetwork, RawResultSet};
use crate::error::{PfxError, SolverError};
use crate::result::{CalculationSymmetry, ResultSet};
use crate::Network;
use serde::{Deserialize, Serialize};

/// Default iteration cap handed to both engines.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Parameters of one canonical power-flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationParams {
    pub symmetry: CalculationSymmetry,
    pub method: CalculationMethod,
    /// Convergence tolerance on the voltage mismatch (p.u.)
    pub error_tolerance: f64,
    pub max_iterations: u32,
}

impl CalculationParams {
    pub fn new(symmetry: CalculationSymmetry) -> Self {
        Self {
            symmetry,
            method: CalculationMethod::default(),
            error_tolerance: 1e-8,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_method(mut self, method: CalculationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_error_tolerance(mut self, error_tolerance: f64) -> Self {
        self.error_tolerance = error_tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Run options of the alternate engine (`runpp` / `runpp_3ph` keywords).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltSolverOptions {
    pub symmetric: bool,
    pub algorithm: String,
    /// Convergence tolerance on the power mismatch (MVA)
    pub tolerance_mva: f64,
    pub max_iteration: u32,
    pub calculate_voltage_angles: bool,
    /// `pi` or `t`
    pub trafo_model: String,
    pub init: String,
    pub voltage_depend_loads: bool,
    pub trafo_loading: String,
}

impl AltSolverOptions {
    /// Options matching a canonical run: symmetric runs use the `pi`
    /// transformer model with voltage angles, asymmetric runs the `t` model
    /// without.
    pub fn for_params(params: &CalculationParams) -> Result<Self, PfxError> {
        let algorithm = params.method.alternate_algorithm().ok_or_else(|| {
            PfxError::Config(format!(
                "calculation method '{}' has no alternate engine counterpart",
                params.method.as_str()
            ))
        })?;
        let symmetric = params.symmetry.is_symmetric();
        Ok(Self {
            symmetric,
            algorithm: algorithm.to_string(),
            tolerance_mva: params.error_tolerance,
            max_iteration: params.max_iterations,
            calculate_voltage_angles: symmetric,
            trafo_model: if symmetric { "pi" } else { "t" }.to_string(),
            init: "auto".to_string(),
            voltage_depend_loads: true,
            trafo_loading: "power".to_string(),
        })
    }
}

/// The engine under test, fed the canonical model directly.
pub trait CanonicalSolver {
    fn name(&self) -> &str;

    fn calculate_power_flow(
        &self,
        network: &Network,
        params: &CalculationParams,
    ) -> Result<ResultSet, SolverError>;
}

/// The trusted reference engine, fed the translated table model.
pub trait AlternateSolver {
    fn name(&self) -> &str;

    fn run_power_flow(
        &self,
        network: &AltNetwork,
        options: &AltSolverOptions,
    ) -> Result<RawResultSet, SolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternate_options_follow_calculation_mode() {
        let params = CalculationParams::new(CalculationSymmetry::Symmetric)
            .with_error_tolerance(1e-8)
            .with_max_iterations(20);
        let options = AltSolverOptions::for_params(&params).unwrap();
        assert_eq!(options.algorithm, "nr");
        assert_eq!(options.trafo_model, "pi");
        assert!(options.calculate_voltage_angles);
        assert_eq!(options.max_iteration, 20);

        let params = CalculationParams::new(CalculationSymmetry::Asymmetric);
        let options = AltSolverOptions::for_params(&params).unwrap();
        assert!(!options.symmetric);
        assert_eq!(options.trafo_model, "t");
        assert!(!options.calculate_voltage_angles);
    }

    #[test]
    fn linear_method_has_no_alternate_counterpart() {
        let params = CalculationParams::new(CalculationSymmetry::Symmetric)
            .with_method(CalculationMethod::Linear);
        assert!(matches!(
            AltSolverOptions::for_params(&params),
            Err(PfxError::Config(_))
        ));
    }
}
