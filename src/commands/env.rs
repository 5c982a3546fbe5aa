//! # Env Command Implementation
//!
//! Direct access to the variable store: read or write one variable in the
//! live env file, or an app-specific file via the `APP:VARIABLE` form.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use dockforge::layout::Layout;
use dockforge::vars;

/// Arguments for the env command
#[derive(Args, Debug)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub action: EnvAction,
}

#[derive(Subcommand, Debug)]
pub enum EnvAction {
    /// Print the parsed value of a variable
    Get {
        /// Variable name, optionally APP:VARIABLE for an app-specific file
        key: String,
    },
    /// Set a variable (single-quoted)
    Set {
        /// Variable name, optionally APP:VARIABLE for an app-specific file
        key: String,
        /// Value to store
        value: String,
        /// Write the value verbatim instead of single-quoting it
        #[arg(long)]
        literal: bool,
    },
    /// Remove a variable
    Unset {
        /// Variable name, optionally APP:VARIABLE for an app-specific file
        key: String,
    },
}

/// Execute the `env` command.
pub fn execute(args: EnvArgs) -> Result<()> {
    let layout = Layout::discover()?;

    match args.action {
        EnvAction::Get { key } => {
            let (key, file) = resolve(&layout, &key);
            println!("{}", vars::get(&key, &file)?);
        }
        EnvAction::Set {
            key,
            value,
            literal,
        } => {
            let (key, file) = resolve(&layout, &key);
            if literal {
                vars::set_literal(&key, &value, &file)?;
            } else {
                vars::set(&key, &value, &file)?;
            }
        }
        EnvAction::Unset { key } => {
            let (key, file) = resolve(&layout, &key);
            vars::unset(&key, &file)?;
        }
    }
    Ok(())
}

/// Split an `APP:VARIABLE` spec into a key and its owning file.
fn resolve(layout: &Layout, spec: &str) -> (String, PathBuf) {
    match spec.split_once(':') {
        Some((app, key)) if !app.is_empty() => (key.to_string(), layout.app_env_file(app)),
        _ => (spec.to_string(), layout.env_file()),
    }
}
