//! # Generate Command Implementation
//!
//! Synthesizes the merged container manifest: ensures app variables are
//! current, selects the ordered fragment list for every enabled
//! application, and hands it to the external merge command. The result is
//! persisted as the live manifest file.

use anyhow::Result;
use clap::Args;

use dockforge::layout::Layout;
use dockforge::synth::manifest;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Re-synthesize even when nothing changed
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `generate` command.
pub fn execute(args: GenerateArgs) -> Result<()> {
    let layout = Layout::discover()?;
    manifest::generate(&layout, args.force)?;
    Ok(())
}
