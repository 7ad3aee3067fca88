//! # taskdesk
//!
//! Command-line front end for the in-memory task, user and project manager.
//!
//! ```bash
//! # Walk through the built-in workflow
//! taskdesk demo
//!
//! # Replay a request script and keep the result
//! taskdesk run requests.json --export-json state.json --export-csv tasks.csv
//! ```
//!
//! Responses are printed to stdout as JSON envelopes; logs go to stderr.
//! Nothing is kept between runs except the export files.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskdesk::cli::Cli;
use taskdesk::cmd::*;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Demo => cmd_demo(config),
        Commands::Run {
            script,
            export_json,
            export_csv,
        } => cmd_run(
            config,
            &script,
            export_json.as_deref(),
            export_csv.as_deref(),
        ),
        Commands::Completions { .. } => Ok(()),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
