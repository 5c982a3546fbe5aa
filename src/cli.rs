//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Dockforge - Synthesize container deployment configuration from templates
#[derive(Parser, Debug)]
#[command(name = "dockforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enable applications (set <APP>__ENABLED='true')
    Enable(commands::enable::EnableArgs),

    /// Disable applications (set <APP>__ENABLED='false')
    Disable(commands::enable::DisableArgs),

    /// Create and refresh environment variables for all added applications
    Sync(commands::sync::SyncArgs),

    /// Synthesize the merged manifest for all enabled applications
    Generate(commands::generate::GenerateArgs),

    /// Read and write variables in the live env files
    Env(commands::env::EnvArgs),

    /// List applications by status
    List(commands::list::ListArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .format_timestamp(None)
            .init();

        let output = dockforge::output::OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Enable(args) => commands::enable::execute_enable(args),
            Commands::Disable(args) => commands::enable::execute_disable(args),
            Commands::Sync(args) => commands::sync::execute(args),
            Commands::Generate(args) => commands::generate::execute(args),
            Commands::Env(args) => commands::env::execute(args),
            Commands::List(args) => commands::list::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
