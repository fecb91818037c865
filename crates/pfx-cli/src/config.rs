//! `pfx.toml` configuration.
//!
//! Lookup order: the `--config` path, `./pfx.toml`, then
//! `<user config dir>/pfx/pfx.toml`. A missing file means defaults.
//!
//! ```toml
//! [export]
//! output_root = "fixtures"
//! prefix = "pp"
//!
//! [solver]
//! rtol = 1e-5
//! atol = 1e-5
//! max_iterations = 20
//!
//! [engines.canonical]
//! kind = "command"
//! program = "pgm-shim"
//! args = ["--threads", "1"]
//! ```

use anyhow::{Context, Result};
use pfx_batch::{DEFAULT_LICENSE_TEXT, DEFAULT_PREFIX};
use pfx_core::CalculationMethod;
use pfx_io::translate::DEFAULT_FREQUENCY_HZ;
use pfx_solver_common::EngineSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "pfx.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PfxConfig {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub engines: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Written to every `.license` companion file
    #[serde(default = "default_license_text")]
    pub license_text: String,
    /// Case manifest loaded on every run
    #[serde(default)]
    pub case_manifest: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            prefix: default_prefix(),
            license_text: default_license_text(),
            case_manifest: None,
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("fixtures")
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_license_text() -> String {
    DEFAULT_LICENSE_TEXT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    #[serde(default)]
    pub calculation_method: CalculationMethod,
    #[serde(default = "default_tolerance")]
    pub rtol: f64,
    #[serde(default = "default_tolerance")]
    pub atol: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// System frequency in Hz used for line susceptance conversion
    #[serde(default = "default_frequency")]
    pub frequency: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            calculation_method: CalculationMethod::default(),
            rtol: default_tolerance(),
            atol: default_tolerance(),
            max_iterations: default_max_iterations(),
            frequency: default_frequency(),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-5
}

fn default_max_iterations() -> u32 {
    pfx_batch::params::default_max_iterations()
}

fn default_frequency() -> f64 {
    DEFAULT_FREQUENCY_HZ
}

/// Which engines produce the two sides of a fixture.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub canonical: EngineSpec,
    #[serde(default)]
    pub alternate: EngineSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// First existing configuration file in lookup order.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("pfx").join(CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Load the configuration; an explicitly named file must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<(PfxConfig, Option<PathBuf>)> {
    let Some(path) = resolve_config_path(explicit) else {
        return Ok((PfxConfig::default(), None));
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("parsing config '{}'", path.display()))?;
    Ok((config, Some(path)))
}

pub fn parse_config(contents: &str) -> Result<PfxConfig> {
    Ok(toml::from_str(contents)?)
}
