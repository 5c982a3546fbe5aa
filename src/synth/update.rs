//! Stage 3: canonical env-file update.
//!
//! Rewrites the live env file section by section — the global scope first,
//! then one scope per referenced application — and then rewrites every
//! referenced app-specific env file the same way. Each scope is rendered
//! by the formatter against its default backbone, so template ordering and
//! comments survive while live values and user additions are kept.
//!
//! Staleness gating: the global file is rewritten when it changed, when
//! the referenced-app set changed, or on force; an app-specific file is
//! additionally rewritten when its app's enablement value changed since
//! the last pass (the header carries a `(Disabled)` tag that has to track
//! it).

use log::{info, warn};

use crate::apps;
use crate::error::Result;
use crate::format;
use crate::layout::{Layout, ENV_FILE_NAME};
use crate::staleness::MarkerStore;
use crate::template;
use crate::vars;

const MARKER_PREFIX: &str = "envfmt_";
const REFERENCED_MARKER: &str = "referenced_apps";

fn store(layout: &Layout) -> MarkerStore {
    MarkerStore::new(layout.markers_dir(), MARKER_PREFIX)
}

fn enabled_marker(app_name: &str) -> String {
    format!("enabled_{}", app_name.to_lowercase())
}

/// Rewrite the live env files into canonical form.
pub fn update_env(layout: &Layout, force: bool) -> Result<()> {
    let env_file = layout.env_file();
    let referenced = apps::list_referenced(layout)?;

    if !force && !needs_update(layout, &referenced) {
        info!(
            "Environment variable file '{}' already updated.",
            env_file.display()
        );
        return Ok(());
    }

    info!("Updating '{}'.", env_file.display());

    let all_lines = vars::read_lines(&env_file)?;
    let mut updated: Vec<String> = Vec::new();

    // Global scope first, against the installed backbone when present.
    let global_lines = apps::app_var_lines("", &all_lines);
    let example = layout.env_example_file();
    let backbone = example.is_file().then_some(example.as_path());
    updated.extend(format::format_lines(layout, &global_lines, backbone, "")?);

    // One scope per referenced app, against its instantiated .env template.
    for app_name in &referenced {
        let app_lines = apps::app_var_lines(app_name, &all_lines);
        let default_file = if apps::is_user_defined(layout, app_name) {
            None
        } else {
            template::instance_file(layout, app_name, ENV_FILE_NAME)?
        };
        updated.extend(format::format_lines(
            layout,
            &app_lines,
            default_file.as_deref(),
            app_name,
        )?);
    }

    let mut content = updated.join("\n");
    if !updated.is_empty() {
        content.push('\n');
    }
    std::fs::write(&env_file, content)?;

    // App-specific env files get the same treatment.
    for app_name in &referenced {
        if let Err(e) = update_app_env(layout, app_name, force) {
            warn!("Failed to update env file for {app_name}: {e}");
        }
    }

    mark_updated(layout, &referenced);
    Ok(())
}

fn update_app_env(layout: &Layout, app_name: &str, force: bool) -> Result<()> {
    let store = store(layout);
    let app_env_file = layout.app_env_file(app_name);

    let enabled_value = vars::get(&format!("{app_name}__ENABLED"), &layout.env_file())?;
    let fresh = !store.is_stale_optional(&app_env_file)
        && !store.list_changed(&enabled_marker(app_name), &[enabled_value.clone()]);
    if !force && fresh {
        info!("'{}' already updated.", app_env_file.display());
        return Ok(());
    }

    let default_file = template::instance_file(layout, app_name, ".env.app.*")?;
    if !app_env_file.is_file() && default_file.is_none() {
        // Nothing to canonicalize for this app; still record enablement
        // so the next staleness check can pass.
        store.record_list(&enabled_marker(app_name), &[enabled_value])?;
        return Ok(());
    }

    let current_lines = vars::var_lines(&app_env_file)?;
    let formatted = format::format_lines(
        layout,
        &current_lines,
        default_file.as_deref(),
        app_name,
    )?;

    let mut content = formatted.join("\n");
    if !formatted.is_empty() {
        content.push('\n');
    }

    if app_env_file.is_file() {
        info!("Updating '{}'.", app_env_file.display());
    } else {
        info!("Creating '{}'.", app_env_file.display());
    }
    std::fs::write(&app_env_file, content)?;

    store.commit(&app_env_file)?;
    store.record_list(&enabled_marker(app_name), &[enabled_value])?;
    Ok(())
}

/// Whether the canonical update pass must run.
pub fn needs_update(layout: &Layout, referenced: &[String]) -> bool {
    let store = store(layout);
    if store.is_stale(&layout.env_file()) {
        return true;
    }
    if store.list_changed(REFERENCED_MARKER, referenced) {
        return true;
    }
    for app_name in referenced {
        let enabled_value = vars::get(&format!("{app_name}__ENABLED"), &layout.env_file())
            .unwrap_or_default();
        if store.is_stale_optional(&layout.app_env_file(app_name))
            || store.list_changed(&enabled_marker(app_name), &[enabled_value])
        {
            return true;
        }
    }
    false
}

/// Record fresh markers after a successful pass.
pub fn mark_updated(layout: &Layout, referenced: &[String]) {
    let store = store(layout);
    if let Err(e) = store.commit(&layout.env_file()) {
        warn!("Failed to commit env format marker: {e}");
    }
    if let Err(e) = store.record_list(REFERENCED_MARKER, referenced) {
        warn!("Failed to record referenced-app marker: {e}");
    }
}
