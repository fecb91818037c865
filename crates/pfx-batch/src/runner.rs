use crate::exporter::FixtureExporter;
use crate::fixture::FixtureWriter;
use crate::job::{FixtureJob, FixtureJobRecord};
use crate::manifest::{write_batch_manifest, BatchManifest, BATCH_MANIFEST_FILE};
use crate::registry::CaseRegistry;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use pfx_core::{AlternateSolver, CanonicalSolver, PfxError};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Settings of one export run.
pub struct BatchRunnerConfig {
    pub jobs: Vec<FixtureJob>,
    pub output_root: PathBuf,
    pub license_text: String,
    pub max_iterations: u32,
    pub frequency: f64,
    /// Treat engine disagreement as a failed case instead of a warning
    pub strict: bool,
}

/// Outcome of a run, for logging and the process exit status.
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<FixtureJobRecord>,
}

/// Export every job in order, one case at a time.
///
/// A failing case is recorded and the run continues; the manifest lists
/// every job.
pub fn run_batch(
    config: &BatchRunnerConfig,
    registry: &CaseRegistry,
    canonical: &dyn CanonicalSolver,
    alternate: &dyn AlternateSolver,
) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let exporter = FixtureExporter::new(canonical, alternate)
        .with_max_iterations(config.max_iterations)
        .with_frequency(config.frequency);
    let writer = FixtureWriter::new(config.license_text.clone());

    let job_records: Vec<FixtureJobRecord> = config
        .jobs
        .iter()
        .map(|job| run_job(job, config, registry, &exporter, &writer))
        .collect();

    let success = job_records.iter().filter(|record| record.is_ok()).count();
    let failure = job_records.len() - success;

    let manifest = BatchManifest {
        created_at: Utc::now(),
        canonical_solver: canonical.name().to_string(),
        alternate_solver: alternate.name().to_string(),
        num_cases: job_records.len(),
        success,
        failure,
        cases: job_records.clone(),
    };
    let manifest_path = config.output_root.join(BATCH_MANIFEST_FILE);
    write_batch_manifest(&manifest_path, &manifest)?;
    info!(success, failure, manifest = %manifest_path.display(), "export finished");
    Ok(BatchSummary {
        success,
        failure,
        manifest_path,
        jobs: job_records,
    })
}

fn run_job(
    job: &FixtureJob,
    config: &BatchRunnerConfig,
    registry: &CaseRegistry,
    exporter: &FixtureExporter<'_>,
    writer: &FixtureWriter,
) -> FixtureJobRecord {
    let output_dir = config.output_root.join(&job.job_id);
    info!(job = %job.job_id, case = %job.case, mode = %job.symmetry, "exporting case");

    let mut comparison = None;
    let mut stage = "setup";
    let mut runner = || -> Result<()> {
        let case = registry
            .get(&job.case)
            .ok_or_else(|| anyhow!("case '{}' is not registered", job.case))?;
        let network = case.network(job.symmetry)?;
        let outcome = exporter.build(network, job.symmetry, job.params.clone())?;
        comparison = Some(outcome.report.summary());
        if config.strict && !outcome.report.is_match() {
            stage = "comparison";
            return Err(anyhow!("engines disagree: {}", outcome.report.summary()));
        }
        stage = "write";
        writer.write(&outcome.fixture, &output_dir)?;
        Ok(())
    };
    let status = runner();
    let (status_label, stage, error) = match status {
        Ok(()) => ("ok".to_string(), None, None),
        Err(err) => {
            let stage = err
                .downcast_ref::<PfxError>()
                .map(|e| e.stage())
                .unwrap_or(stage);
            error!(job = %job.job_id, stage, "case failed: {err:#}");
            ("error".to_string(), Some(stage.to_string()), Some(format!("{err:#}")))
        }
    };
    FixtureJobRecord {
        job_id: job.job_id.clone(),
        case: job.case.clone(),
        mode: job.symmetry.as_str().to_string(),
        status: status_label,
        stage,
        error,
        comparison,
        output: output_dir.display().to_string(),
    }
}
