//! # Enable / Disable Command Implementation
//!
//! Flips the `<APP>__ENABLED` flag for one or more applications. Enabling
//! an app that was never added introduces the flag; disabling keeps the
//! app added so its variables survive.

use anyhow::Result;
use clap::Args;

use dockforge::layout::Layout;
use dockforge::{apps, suggestions};

/// Arguments for the enable command
#[derive(Args, Debug)]
pub struct EnableArgs {
    /// Application names (e.g. SONARR, SONARR__4K)
    #[arg(required = true, value_name = "APP")]
    pub apps: Vec<String>,
}

/// Arguments for the disable command
#[derive(Args, Debug)]
pub struct DisableArgs {
    /// Application names (e.g. SONARR, SONARR__4K)
    #[arg(required = true, value_name = "APP")]
    pub apps: Vec<String>,
}

/// Execute the `enable` command.
pub fn execute_enable(args: EnableArgs) -> Result<()> {
    let layout = Layout::discover()?;
    let apps_upper = validate(&layout, &args.apps)?;
    apps::enable(&layout, &apps_upper)?;
    Ok(())
}

/// Execute the `disable` command.
pub fn execute_disable(args: DisableArgs) -> Result<()> {
    let layout = Layout::discover()?;
    let apps_upper = validate(&layout, &args.apps)?;
    apps::disable(&layout, &apps_upper)?;
    Ok(())
}

fn validate(layout: &Layout, names: &[String]) -> Result<Vec<String>> {
    let mut validated = Vec::new();
    for name in names {
        let upper = name.trim().to_uppercase();
        if !dockforge::naming::is_valid_app_name(&upper) {
            return Err(suggestions::invalid_app_name(name));
        }
        if !apps::is_builtin(layout, &upper) {
            let builtin = apps::list_builtin(layout)?;
            return Err(suggestions::unknown_app(name, &builtin));
        }
        validated.push(upper);
    }
    Ok(validated)
}
