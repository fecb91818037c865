//! One case through the whole pipeline.
//!
//! validate → translate → canonical solve → alternate solve → reconcile →
//! compare. Everything happens in memory; the caller decides whether the
//! resulting [`Fixture`] is written.

use crate::fixture::{Fixture, FixtureWriter};
use crate::params::{default_max_iterations, FixtureParams};
use anyhow::Result;
use pfx_core::comparison::{compare_result_sets, ComparisonReport};
use pfx_core::{
    AltSolverOptions, AlternateSolver, CalculationSymmetry, CanonicalSolver, Diagnostics, Network,
    PfxError,
};
use pfx_io::helpers::assert_valid_input;
use pfx_io::translate::{reconcile, Translator, DEFAULT_FREQUENCY_HZ};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A built fixture with what was learned while building it.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub fixture: Fixture,
    pub report: ComparisonReport,
    pub diagnostics: Diagnostics,
}

pub struct FixtureExporter<'a> {
    canonical: &'a dyn CanonicalSolver,
    alternate: &'a dyn AlternateSolver,
    max_iterations: u32,
    frequency: f64,
}

impl<'a> FixtureExporter<'a> {
    pub fn new(canonical: &'a dyn CanonicalSolver, alternate: &'a dyn AlternateSolver) -> Self {
        Self {
            canonical,
            alternate,
            max_iterations: default_max_iterations(),
            frequency: DEFAULT_FREQUENCY_HZ,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Run both engines on `network` and reconcile the alternate results.
    pub fn build(
        &self,
        network: Network,
        symmetry: CalculationSymmetry,
        params: FixtureParams,
    ) -> Result<ExportOutcome, PfxError> {
        let start = Instant::now();
        let diagnostics = assert_valid_input(&network, symmetry)?;

        let translation = Translator::new(symmetry)
            .with_frequency(self.frequency)
            .translate(&network)?;
        debug!(
            rows = translation.network.row_count(),
            components = translation.index.len(),
            "translated case"
        );

        let solver_params = params.solver_params(symmetry, self.max_iterations);
        let canonical = self
            .canonical
            .calculate_power_flow(&network, &solver_params)?;
        let options = AltSolverOptions::for_params(&solver_params)?;
        let raw = self.alternate.run_power_flow(&translation.network, &options)?;
        let alternate = reconcile(&raw, &translation)?;

        let report = compare_result_sets(&canonical, &alternate, &params.comparison_tolerance());
        if report.is_match() {
            info!(
                mode = %symmetry,
                compared = report.compared_values,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "engines agree"
            );
        } else {
            warn!(
                mode = %symmetry,
                mismatches = report.mismatches.len(),
                structural = report.structural.len(),
                "engines disagree: {}",
                report.summary()
            );
        }

        Ok(ExportOutcome {
            fixture: Fixture {
                input: network,
                symmetry,
                canonical,
                alternate,
                params,
            },
            report,
            diagnostics,
        })
    }

    /// Build and write a fixture into `dir`; nothing is written when building fails.
    pub fn export(
        &self,
        network: Network,
        symmetry: CalculationSymmetry,
        params: FixtureParams,
        writer: &FixtureWriter,
        dir: &Path,
    ) -> Result<(ExportOutcome, Vec<PathBuf>)> {
        let outcome = self.build(network, symmetry, params)?;
        let written = writer.write(&outcome.fixture, dir)?;
        Ok((outcome, written))
    }
}
