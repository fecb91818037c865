use crate::commands::cases::print_json;
use anyhow::{Context, Result};
use pfx_cli::PfxConfig;
use pfx_core::CalculationSymmetry;
use pfx_io::exporters::{export_alt_network_to_pandapower, pandapower_net_value, ExportMetadata};
use pfx_io::helpers::assert_valid_input;
use pfx_io::importers::load_network;
use pfx_io::translate::Translator;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn handle(
    input: &Path,
    symmetry: CalculationSymmetry,
    out: Option<&Path>,
    index_out: Option<&Path>,
    config: &PfxConfig,
) -> Result<()> {
    let network = load_network(input)?;
    assert_valid_input(&network, symmetry)?;
    let translation = Translator::new(symmetry)
        .with_frequency(config.solver.frequency)
        .translate(&network)?;
    info!(
        "translated {} component(s) into {} row(s)",
        translation.index.len(),
        translation.network.row_count()
    );

    let metadata = ExportMetadata::now(input.display().to_string());
    match out {
        Some(path) => {
            export_alt_network_to_pandapower(&translation.network, path, Some(&metadata))?;
            info!("wrote pandapower network to {}", path.display());
        }
        None => print_json(&pandapower_net_value(&translation.network, Some(&metadata))?)?,
    }

    if let Some(path) = index_out {
        let entries = serde_json::to_string_pretty(&translation.index.entries())
            .context("serializing index map")?;
        fs::write(path, entries)
            .with_context(|| format!("writing index map '{}'", path.display()))?;
        info!("wrote index map to {}", path.display());
    }
    Ok(())
}
