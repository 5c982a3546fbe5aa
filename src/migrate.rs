//! Variable-name migration.
//!
//! Templates may ship a `<base>.migrate` file listing renames, one per
//! line: the new variable name followed by the old one, whitespace
//! separated, `#` comments allowed. Migration preserves the old value,
//! never clobbers an existing target, removes the old definition, and
//! rewrites `$VAR`/`${VAR}` references in the override manifest when the
//! rename touched the global env file.
//!
//! A `APP:VARIABLE` form on either side addresses the app-specific env
//! file instead of the global one.

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use regex::Regex;

use crate::error::Result;
use crate::layout::Layout;
use crate::template;
use crate::vars;

/// Apply the migration table of `app_name`, if the template ships one.
pub fn migrate_app_vars(layout: &Layout, app_name: &str) -> Result<()> {
    let Some(migrate_file) = template::instance_file(layout, app_name, "*.migrate")? else {
        return Ok(());
    };

    for line in fs::read_to_string(&migrate_file)?.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(to_var), Some(from_var)) = (parts.next(), parts.next()) else {
            continue;
        };

        if let Err(e) = migrate_var(layout, from_var, to_var) {
            warn!("Failed to migrate variable {from_var} to {to_var}: {e}");
        }
    }
    Ok(())
}

/// Rename one variable while preserving its value.
pub fn migrate_var(layout: &Layout, from_var: &str, to_var: &str) -> Result<()> {
    let (from_key, from_file) = resolve(layout, from_var);
    let (to_key, to_file) = resolve(layout, to_var);

    let value = vars::get_literal(&from_key, &from_file)?;
    if value.is_empty() {
        return Ok(()); // Nothing to carry over.
    }

    if !vars::get(&to_key, &to_file)?.is_empty() {
        debug!("Migration target {to_var} already exists, skipping.");
        return Ok(());
    }

    info!("Migrating variable {from_var} to {to_var}.");
    vars::set_literal(&to_key, &value, &to_file)?;
    vars::unset(&from_key, &from_file)?;

    if from_file == layout.env_file() {
        rename_override_refs(layout, &from_key, &to_key)?;
    }
    Ok(())
}

/// Split an `APP:VARIABLE` spec into a key and its owning file.
fn resolve(layout: &Layout, spec: &str) -> (String, PathBuf) {
    match spec.split_once(':') {
        Some((app, key)) if !app.is_empty() => {
            (key.to_string(), layout.app_env_file(app))
        }
        _ => (spec.to_string(), layout.env_file()),
    }
}

/// Rewrite `$FROM` / `${FROM}` references in the override manifest.
fn rename_override_refs(layout: &Layout, from_var: &str, to_var: &str) -> Result<()> {
    let override_file = layout.override_file();
    let content = match fs::read_to_string(&override_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let re = Regex::new(&format!(r"([$]\{{?){}\b", regex::escape(from_var)))?;
    if re.is_match(&content) {
        info!(
            "Renaming variable {from_var} to {to_var} in '{}'.",
            override_file.display()
        );
        let rewritten = re.replace_all(&content, format!("${{1}}{to_var}"));
        fs::write(&override_file, rewritten.as_bytes())?;
    }
    Ok(())
}
