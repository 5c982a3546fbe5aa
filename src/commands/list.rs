//! # List Command Implementation
//!
//! Prints applications by status. The default listing shows every
//! built-in application with its state; the filtered listings print bare
//! names, one per line, for scripting.

use anyhow::Result;
use clap::{Args, ValueEnum};

use dockforge::apps;
use dockforge::layout::Layout;
use dockforge::output::OutputConfig;

/// Which applications to list
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFilter {
    /// Every built-in application with its state
    All,
    /// Applications with a template directory
    Builtin,
    /// Applications with an __ENABLED variable
    Added,
    /// Applications with a truthy __ENABLED variable
    Enabled,
    /// Added applications that are not enabled
    Disabled,
    /// Built-in applications marked deprecated
    Deprecated,
    /// Applications referenced anywhere in the configuration
    Referenced,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Which applications to list
    #[arg(value_enum, default_value = "all")]
    pub filter: ListFilter,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, output: &OutputConfig) -> Result<()> {
    let layout = Layout::discover()?;

    let listing = match args.filter {
        ListFilter::All => return print_status(&layout, output),
        ListFilter::Builtin => apps::list_builtin(&layout)?,
        ListFilter::Added => apps::list_added(&layout)?,
        ListFilter::Enabled => apps::list_enabled(&layout)?,
        ListFilter::Disabled => apps::list_disabled(&layout)?,
        ListFilter::Deprecated => apps::list_deprecated(&layout)?,
        ListFilter::Referenced => apps::list_referenced(&layout)?,
    };

    for app in listing {
        println!("{app}");
    }
    Ok(())
}

fn print_status(layout: &Layout, output: &OutputConfig) -> Result<()> {
    for app in apps::list_builtin(layout)? {
        let nice = apps::nice_name(layout, &app);
        let line = if apps::is_deprecated(layout, &app) {
            output
                .deprecated_style()
                .apply_to(format!("{app}  {nice} [deprecated]"))
        } else if apps::is_enabled(layout, &app) {
            output
                .enabled_style()
                .apply_to(format!("{app}  {nice} [enabled]"))
        } else if apps::is_added(layout, &app) {
            output
                .disabled_style()
                .apply_to(format!("{app}  {nice} [disabled]"))
        } else {
            output.disabled_style().apply_to(format!("{app}  {nice}"))
        };
        println!("{line}");
    }
    Ok(())
}
