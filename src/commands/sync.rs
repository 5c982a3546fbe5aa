//! # Sync Command Implementation
//!
//! Brings every derived env file up to date: bootstraps the live env file,
//! instantiates templates and merges newly-introduced variables for every
//! added application, and rewrites the files into canonical form. The
//! staleness tracker makes an already-current sync a cheap no-op.

use anyhow::Result;
use clap::Args;

use dockforge::layout::Layout;
use dockforge::synth::appvars;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Re-derive everything even when nothing changed
    #[arg(short, long)]
    pub force: bool,

    /// Only sync the named applications
    #[arg(value_name = "APP")]
    pub apps: Vec<String>,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs) -> Result<()> {
    let layout = Layout::discover()?;

    if args.apps.is_empty() {
        appvars::create_all(&layout, args.force)?;
    } else {
        for app in &args.apps {
            appvars::create_app(&layout, app)?;
        }
        dockforge::synth::update::update_env(&layout, args.force)?;
    }
    Ok(())
}
