use anyhow::{bail, Context, Result};
use pfx_batch::load_fixture;
use pfx_core::comparison::compare_result_sets;
use pfx_io::helpers::assert_valid_input;
use std::path::PathBuf;
use tracing::{info, warn};

/// Re-validate each fixture's input and compare its two stored outputs.
pub fn handle(fixtures: &[PathBuf]) -> Result<()> {
    let mut failed = 0;
    for dir in fixtures {
        let fixture = load_fixture(dir)
            .with_context(|| format!("loading fixture '{}'", dir.display()))?;
        let report = match assert_valid_input(&fixture.input, fixture.symmetry) {
            Ok(_) => compare_result_sets(
                &fixture.canonical,
                &fixture.alternate,
                &fixture.params.comparison_tolerance(),
            ),
            Err(err) => {
                warn!("{}: {}", dir.display(), err);
                println!("FAIL {}: {}", dir.display(), err);
                failed += 1;
                continue;
            }
        };
        if report.is_match() {
            info!("{}: {}", dir.display(), report.summary());
            println!("ok   {} ({})", dir.display(), report.summary());
        } else {
            failed += 1;
            println!("FAIL {}: {}", dir.display(), report.summary());
            for issue in &report.structural {
                println!("    {issue}");
            }
            for mismatch in &report.mismatches {
                println!("    {mismatch}");
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} fixture(s) failed the check", failed, fixtures.len());
    }
    Ok(())
}
