use clap::Parser;
use pfx_cli::{load_config, Cli, Commands};
use std::io;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    // The log level may come from the config, so load it before installing the subscriber.
    let loaded = load_config(cli.config.as_deref());
    let level = cli.log_level.unwrap_or_else(|| {
        loaded
            .as_ref()
            .ok()
            .and_then(|(config, _)| config.logging.level.parse::<Level>().ok())
            .unwrap_or(Level::INFO)
    });
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = loaded.and_then(|(config, path)| {
        if let Some(path) = &path {
            info!("using config {}", path.display());
        }
        match &cli.command {
            Commands::Export { .. } => commands::export::handle(&cli.command, &config),
            Commands::Cases { manifest, format } => {
                commands::cases::handle(manifest.as_deref(), *format, &config)
            }
            Commands::Validate { input, mode } => commands::validate::handle(input, (*mode).into()),
            Commands::Translate {
                input,
                mode,
                out,
                index_out,
            } => commands::translate::handle(
                input,
                (*mode).into(),
                out.as_deref(),
                index_out.as_deref(),
                &config,
            ),
            Commands::Check { fixtures } => commands::check::handle(fixtures),
        }
    });

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
