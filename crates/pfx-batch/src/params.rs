use pfx_core::comparison::ComparisonTolerance;
use pfx_core::solver::DEFAULT_MAX_ITERATIONS;
use pfx_core::{CalculationMethod, CalculationParams, CalculationSymmetry};
use serde::{Deserialize, Serialize};

/// SPDX header written next to every fixture file unless configured otherwise.
pub const DEFAULT_LICENSE_TEXT: &str =
    "SPDX-FileCopyrightText: Contributors to the project\n\nSPDX-License-Identifier: MPL-2.0";

/// Solvers converge this much tighter than the fixture tolerance.
pub const SOLVER_TOLERANCE_DIVISOR: f64 = 1000.0;

/// Tolerance metadata stored as `params.json` in every fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureParams {
    pub calculation_method: CalculationMethod,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for FixtureParams {
    fn default() -> Self {
        Self {
            calculation_method: CalculationMethod::NewtonRaphson,
            rtol: 1e-5,
            atol: 1e-5,
        }
    }
}

impl FixtureParams {
    pub fn with_tolerance(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_method(mut self, method: CalculationMethod) -> Self {
        self.calculation_method = method;
        self
    }

    /// Parameters handed to both solvers for one run.
    pub fn solver_params(&self, symmetry: CalculationSymmetry, max_iterations: u32) -> CalculationParams {
        CalculationParams::new(symmetry)
            .with_method(self.calculation_method)
            .with_error_tolerance(self.rtol / SOLVER_TOLERANCE_DIVISOR)
            .with_max_iterations(max_iterations)
    }

    pub fn comparison_tolerance(&self) -> ComparisonTolerance {
        ComparisonTolerance::uniform(self.rtol, self.atol)
    }
}

/// Per-case tolerance override, optionally limited to one calculation mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToleranceOverride {
    #[serde(default)]
    pub mode: Option<CalculationSymmetry>,
    #[serde(default)]
    pub rtol: Option<f64>,
    #[serde(default)]
    pub atol: Option<f64>,
}

impl ToleranceOverride {
    pub fn for_mode(mode: CalculationSymmetry, rtol: f64, atol: f64) -> Self {
        Self {
            mode: Some(mode),
            rtol: Some(rtol),
            atol: Some(atol),
        }
    }

    pub fn applies_to(&self, symmetry: CalculationSymmetry) -> bool {
        self.mode.map_or(true, |mode| mode == symmetry)
    }

    pub fn apply(&self, params: &mut FixtureParams) {
        if let Some(rtol) = self.rtol {
            params.rtol = rtol;
        }
        if let Some(atol) = self.atol {
            params.atol = atol;
        }
    }
}

pub fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}
