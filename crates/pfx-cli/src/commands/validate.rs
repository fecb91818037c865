use anyhow::{bail, Result};
use pfx_core::{CalculationSymmetry, Diagnostics};
use pfx_io::helpers::{validate_network, ValidationConfig};
use pfx_io::importers::load_network;
use std::path::Path;
use tracing::info;

pub fn handle(input: &Path, symmetry: CalculationSymmetry) -> Result<()> {
    info!("validating {} ({} calculation)", input.display(), symmetry);
    let network = load_network(input)?;
    let mut diag = Diagnostics::new();
    validate_network(&network, symmetry, &mut diag, &ValidationConfig::default());
    print!("{diag}");
    if diag.has_errors() {
        bail!("{} is not a valid {} input", input.display(), symmetry);
    }
    Ok(())
}
