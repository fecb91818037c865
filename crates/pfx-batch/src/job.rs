use crate::params::FixtureParams;
use crate::registry::CaseRegistry;
use pfx_core::CalculationSymmetry;
use serde::{Deserialize, Serialize};

/// Directory prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "pp";

/// Fixture directory name: `<prefix>-<sym|asym>-<case>`.
pub fn directory_name(prefix: &str, symmetry: CalculationSymmetry, case: &str) -> String {
    format!("{}-{}-{}", prefix, symmetry.as_str(), case)
}

/// One case exported in one calculation mode.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureJob {
    pub job_id: String,
    pub case: String,
    pub symmetry: CalculationSymmetry,
    pub params: FixtureParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureJobRecord {
    pub job_id: String,
    pub case: String,
    pub mode: String,
    pub status: String,
    /// Pipeline stage that failed
    pub stage: Option<String>,
    pub error: Option<String>,
    pub comparison: Option<String>,
    pub output: String,
}

impl FixtureJobRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Jobs for every case and mode of `registry`, optionally limited to one mode.
///
/// Jobs follow registry order; within a case the symmetric job comes first.
pub fn jobs_from_registry(
    registry: &CaseRegistry,
    prefix: &str,
    base: &FixtureParams,
    only: Option<CalculationSymmetry>,
) -> Vec<FixtureJob> {
    let mut jobs = Vec::new();
    for case in registry.iter() {
        for symmetry in CalculationSymmetry::ALL {
            if !case.modes.contains(&symmetry) || only.is_some_and(|mode| mode != symmetry) {
                continue;
            }
            jobs.push(FixtureJob {
                job_id: directory_name(prefix, symmetry, &case.name),
                case: case.name.clone(),
                symmetry,
                params: case.params(base, symmetry),
            });
        }
    }
    jobs
}
