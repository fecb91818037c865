use crate::commands::case_registry;
use anyhow::{anyhow, bail, Result};
use pfx_batch::{jobs_from_registry, run_batch, BatchRunnerConfig, BatchSummary, FixtureParams};
use pfx_cli::{Commands, PfxConfig};
use pfx_core::CalculationMethod;
use tracing::info;

fn print_summary(summary: &BatchSummary) {
    println!(
        "Exported {} of {} fixture(s); manifest: {}",
        summary.success,
        summary.jobs.len(),
        summary.manifest_path.display()
    );
    for job in summary.jobs.iter().filter(|job| !job.is_ok()) {
        println!(
            "  failed {} [{}]: {}",
            job.job_id,
            job.stage.as_deref().unwrap_or("unknown"),
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub fn handle(command: &Commands, config: &PfxConfig) -> Result<()> {
    let Commands::Export {
        out,
        prefix,
        cases,
        manifest,
        mode,
        rtol,
        atol,
        max_iter,
        method,
        strict,
    } = command
    else {
        return Err(anyhow!("export handler called with a different command"));
    };

    let mut registry = case_registry(config.export.case_manifest.as_deref(), manifest.as_deref())?;
    if !cases.is_empty() {
        registry = registry.select(cases)?;
    }

    let calculation_method = match method {
        Some(name) => CalculationMethod::from_str(name)?,
        None => config.solver.calculation_method,
    };
    let base = FixtureParams::default()
        .with_method(calculation_method)
        .with_tolerance(
            rtol.unwrap_or(config.solver.rtol),
            atol.unwrap_or(config.solver.atol),
        );
    let prefix = prefix.as_deref().unwrap_or(&config.export.prefix);
    let jobs = jobs_from_registry(&registry, prefix, &base, mode.map(Into::into));
    if jobs.is_empty() {
        bail!("no case supports the requested calculation mode");
    }

    let canonical = config.engines.canonical.canonical()?;
    let alternate = config.engines.alternate.alternate()?;
    info!(
        "exporting {} fixture(s) with canonical engine {} and alternate engine {}",
        jobs.len(),
        config.engines.canonical.describe(),
        config.engines.alternate.describe()
    );

    let runner = BatchRunnerConfig {
        jobs,
        output_root: out.clone().unwrap_or_else(|| config.export.output_root.clone()),
        license_text: config.export.license_text.clone(),
        max_iterations: max_iter.unwrap_or(config.solver.max_iterations),
        frequency: config.solver.frequency,
        strict: *strict,
    };
    let summary = run_batch(&runner, &registry, canonical.as_ref(), alternate.as_ref())?;
    print_summary(&summary);
    if summary.failure > 0 {
        bail!("{} of {} fixture(s) failed", summary.failure, summary.jobs.len());
    }
    Ok(())
}
