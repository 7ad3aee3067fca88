use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// In-memory task, user and project manager.
/// Every command runs in a fresh session; only explicit exports are written.
#[derive(Parser)]
#[command(name = "taskdesk", version, about = "Task, user and project management")]
pub struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}
