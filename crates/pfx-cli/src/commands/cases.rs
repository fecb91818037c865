use crate::commands::case_registry;
use anyhow::{Context, Result};
use pfx_cli::{CasesFormat, PfxConfig};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;

#[derive(Serialize)]
struct CaseSummary {
    name: String,
    modes: Vec<&'static str>,
    source: String,
}

pub fn handle(manifest: Option<&Path>, format: CasesFormat, config: &PfxConfig) -> Result<()> {
    let registry = case_registry(config.export.case_manifest.as_deref(), manifest)?;
    let cases: Vec<CaseSummary> = registry
        .iter()
        .map(|case| CaseSummary {
            name: case.name.clone(),
            modes: case.modes.iter().map(|mode| mode.as_str()).collect(),
            source: case.describe_source(),
        })
        .collect();
    match format {
        CasesFormat::Plain => print_case_table(&cases),
        CasesFormat::Json => print_json(&cases),
    }
}

fn print_case_table(cases: &[CaseSummary]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "CASE\tMODES\tSOURCE")?;
    for case in cases {
        writeln!(writer, "{}\t{}\t{}", case.name, case.modes.join(","), case.source)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), value).context("writing JSON to stdout")?;
    println!();
    Ok(())
}
