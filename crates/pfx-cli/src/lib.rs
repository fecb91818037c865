pub mod cli;
pub mod config;

pub use cli::{CasesFormat, Cli, Commands, ModeArg};
pub use config::{load_config, PfxConfig};
