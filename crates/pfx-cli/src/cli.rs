use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use pfx_core::CalculationSymmetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pfx", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (defaults to the configured level, then info)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (defaults to ./pfx.toml, then the user config directory)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export validation fixtures for registered cases
    Export {
        /// Output root; one directory per case and mode is created below it
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
        /// Fixture directory prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Export only these cases (repeatable)
        #[arg(long = "case")]
        cases: Vec<String>,
        /// Case manifest adding file-based cases (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        manifest: Option<PathBuf>,
        /// Export only one calculation mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Relative comparison tolerance
        #[arg(long)]
        rtol: Option<f64>,
        /// Absolute comparison tolerance
        #[arg(long)]
        atol: Option<f64>,
        /// Solver iteration cap
        #[arg(long)]
        max_iter: Option<u32>,
        /// Canonical calculation method (e.g. newton_raphson)
        #[arg(long)]
        method: Option<String>,
        /// Fail cases whose engines disagree instead of exporting them
        #[arg(long)]
        strict: bool,
    },
    /// List registered cases
    Cases {
        /// Case manifest adding file-based cases (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        manifest: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = CasesFormat::Plain)]
        format: CasesFormat,
    },
    /// Validate a canonical input dataset
    Validate {
        /// Canonical input JSON
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = ModeArg::Sym)]
        mode: ModeArg,
    },
    /// Translate a canonical input dataset and dump the alternate network as pandapower JSON
    Translate {
        /// Canonical input JSON
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = ModeArg::Sym)]
        mode: ModeArg,
        /// Output file (stdout when omitted)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// Also write the component index map next to the output
        #[arg(long, value_hint = ValueHint::FilePath)]
        index_out: Option<PathBuf>,
    },
    /// Re-compare the stored outputs of exported fixtures
    Check {
        /// Fixture directories
        #[arg(required = true, value_hint = ValueHint::DirPath)]
        fixtures: Vec<PathBuf>,
    },
}

/// Calculation mode on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Sym,
    Asym,
}

impl From<ModeArg> for CalculationSymmetry {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sym => CalculationSymmetry::Symmetric,
            ModeArg::Asym => CalculationSymmetry::Asymmetric,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CasesFormat {
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_flags_parse() {
        let cli = Cli::try_parse_from([
            "pfx", "export", "--case", "line", "--case", "shunt", "--mode", "asym", "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Export {
                cases,
                mode,
                strict,
                ..
            } => {
                assert_eq!(cases, ["line", "shunt"]);
                assert_eq!(mode, Some(ModeArg::Asym));
                assert!(strict);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_requires_a_fixture() {
        assert!(Cli::try_parse_from(["pfx", "check"]).is_err());
    }
}
