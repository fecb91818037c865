//! Fixture files on disk.
//!
//! A fixture directory holds the canonical input, the canonical engine's
//! output, the reconciled alternate output and the tolerance parameters,
//! each with a `.license` companion:
//!
//! ```text
//! pp-sym-line/
//!   input.json                 input.json.license
//!   pgm_sym_output.json        pgm_sym_output.json.license
//!   sym_output.json            sym_output.json.license
//!   params.json                params.json.license
//! ```

use crate::params::FixtureParams;
use anyhow::{anyhow, Context, Result};
use pfx_core::{CalculationSymmetry, Network, ResultSet};
use pfx_io::exporters::{network_to_json, result_set_to_json};
use pfx_io::importers::{load_network, load_result_set};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const INPUT_FILE: &str = "input.json";
pub const PARAMS_FILE: &str = "params.json";
pub const LICENSE_SUFFIX: &str = ".license";

/// Canonical engine output file (`pgm_sym_output.json`).
pub fn canonical_output_file(symmetry: CalculationSymmetry) -> String {
    format!("pgm_{}.json", symmetry.output_type())
}

/// Reconciled alternate output file (`sym_output.json`).
pub fn alternate_output_file(symmetry: CalculationSymmetry) -> String {
    format!("{}.json", symmetry.output_type())
}

/// Data files of a fixture in the given mode, without license companions.
pub fn fixture_files(symmetry: CalculationSymmetry) -> [String; 4] {
    [
        INPUT_FILE.to_string(),
        canonical_output_file(symmetry),
        alternate_output_file(symmetry),
        PARAMS_FILE.to_string(),
    ]
}

/// One complete fixture in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub input: Network,
    pub symmetry: CalculationSymmetry,
    pub canonical: ResultSet,
    pub alternate: ResultSet,
    pub params: FixtureParams,
}

/// Writes fixtures with a fixed license text.
#[derive(Debug, Clone)]
pub struct FixtureWriter {
    license_text: String,
}

impl FixtureWriter {
    pub fn new(license_text: impl Into<String>) -> Self {
        Self {
            license_text: license_text.into(),
        }
    }

    pub fn license_text(&self) -> &str {
        &self.license_text
    }

    /// Write `fixture` into `dir`, replacing any earlier fixture there.
    ///
    /// Every document is serialized before the first file is touched.
    /// Returns the written paths, license companions included.
    pub fn write(&self, fixture: &Fixture, dir: &Path) -> Result<Vec<PathBuf>> {
        let [input_name, canonical_name, alternate_name, params_name] =
            fixture_files(fixture.symmetry);
        let documents = [
            (input_name, network_to_json(&fixture.input)?),
            (canonical_name, result_set_to_json(&fixture.canonical)?),
            (alternate_name, result_set_to_json(&fixture.alternate)?),
            (
                params_name,
                serde_json::to_string_pretty(&fixture.params).context("serializing fixture params")?,
            ),
        ];

        fs::create_dir_all(dir)
            .with_context(|| format!("creating fixture directory '{}'", dir.display()))?;
        remove_stale_files(dir)?;

        let mut written = Vec::with_capacity(documents.len() * 2);
        for (name, contents) in documents {
            let path = dir.join(&name);
            fs::write(&path, contents)
                .with_context(|| format!("writing fixture file '{}'", path.display()))?;
            let license = dir.join(format!("{}{}", name, LICENSE_SUFFIX));
            fs::write(&license, &self.license_text)
                .with_context(|| format!("writing license file '{}'", license.display()))?;
            written.push(path);
            written.push(license);
        }
        debug!(dir = %dir.display(), files = written.len(), "wrote fixture");
        Ok(written)
    }
}

/// Remove fixture files of either mode so a new export fully supersedes the old one.
fn remove_stale_files(dir: &Path) -> Result<()> {
    for symmetry in CalculationSymmetry::ALL {
        for name in fixture_files(symmetry) {
            for candidate in [name.clone(), format!("{}{}", name, LICENSE_SUFFIX)] {
                let path = dir.join(candidate);
                if path.is_file() {
                    fs::remove_file(&path)
                        .with_context(|| format!("removing stale file '{}'", path.display()))?;
                }
            }
        }
    }
    Ok(())
}

/// Read a fixture back; the mode follows from which output files exist.
pub fn load_fixture(dir: &Path) -> Result<Fixture> {
    let symmetry = CalculationSymmetry::ALL
        .into_iter()
        .find(|symmetry| dir.join(canonical_output_file(*symmetry)).is_file())
        .ok_or_else(|| anyhow!("'{}' contains no canonical output file", dir.display()))?;

    let input = load_network(dir.join(INPUT_FILE))
        .with_context(|| format!("reading fixture input in '{}'", dir.display()))?;
    let canonical = load_result_set(dir.join(canonical_output_file(symmetry)))
        .with_context(|| format!("reading canonical output in '{}'", dir.display()))?;
    let alternate = load_result_set(dir.join(alternate_output_file(symmetry)))
        .with_context(|| format!("reading alternate output in '{}'", dir.display()))?;
    let params_path = dir.join(PARAMS_FILE);
    let params_text = fs::read_to_string(&params_path)
        .with_context(|| format!("reading '{}'", params_path.display()))?;
    let params: FixtureParams = serde_json::from_str(&params_text)
        .with_context(|| format!("parsing '{}'", params_path.display()))?;

    Ok(Fixture {
        input,
        symmetry,
        canonical,
        alternate,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_LICENSE_TEXT;
    use pfx_core::{ComponentId, Node};
    use tempfile::TempDir;

    fn fixture(symmetry: CalculationSymmetry) -> Fixture {
        let mut input = Network::new();
        input.node.push(Node::new(ComponentId::new(1), 400.0));
        Fixture {
            input,
            symmetry,
            canonical: ResultSet::new(symmetry),
            alternate: ResultSet::new(symmetry),
            params: FixtureParams::default(),
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(
            canonical_output_file(CalculationSymmetry::Asymmetric),
            "pgm_asym_output.json"
        );
        assert_eq!(alternate_output_file(CalculationSymmetry::Symmetric), "sym_output.json");
    }

    #[test]
    fn writes_every_file_with_a_license() {
        let dir = TempDir::new().unwrap();
        let writer = FixtureWriter::new(DEFAULT_LICENSE_TEXT);
        let written = writer
            .write(&fixture(CalculationSymmetry::Symmetric), dir.path())
            .unwrap();
        assert_eq!(written.len(), 8);
        for name in fixture_files(CalculationSymmetry::Symmetric) {
            assert!(dir.path().join(&name).is_file(), "{name}");
            let license = fs::read_to_string(dir.path().join(format!("{name}.license"))).unwrap();
            assert_eq!(license, DEFAULT_LICENSE_TEXT);
        }
        let params = fs::read_to_string(dir.path().join(PARAMS_FILE)).unwrap();
        assert!(params.contains("\n  \"calculation_method\": \"newton_raphson\""));
    }

    #[test]
    fn rewrite_supersedes_the_other_mode() {
        let dir = TempDir::new().unwrap();
        let writer = FixtureWriter::new("license");
        writer
            .write(&fixture(CalculationSymmetry::Symmetric), dir.path())
            .unwrap();
        writer
            .write(&fixture(CalculationSymmetry::Asymmetric), dir.path())
            .unwrap();
        assert!(!dir.path().join("pgm_sym_output.json").exists());
        assert!(!dir.path().join("sym_output.json.license").exists());
        assert!(dir.path().join("pgm_asym_output.json").exists());
    }

    #[test]
    fn fixture_reads_back() {
        let dir = TempDir::new().unwrap();
        let original = fixture(CalculationSymmetry::Asymmetric);
        FixtureWriter::new("license")
            .write(&original, dir.path())
            .unwrap();
        let loaded = load_fixture(dir.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn empty_directory_is_not_a_fixture() {
        let dir = TempDir::new().unwrap();
        assert!(load_fixture(dir.path()).is_err());
    }
}
