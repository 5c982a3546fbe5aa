//! Application status queries and listings.
//!
//! "Added" means the app has an `__ENABLED` variable in the live env file;
//! "enabled" means that variable is truthy; "built-in" means a template
//! directory exists for the lower-cased base name; "user defined" means the
//! app has variables but no template. Referenced apps are the union of
//! apps owning any live variable, apps with an app-specific env file, and
//! apps named in the override manifest.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::{info, warn};
use regex::Regex;

use crate::error::Result;
use crate::labels;
use crate::layout::{Layout, APP_ENV_FILE_PREFIX};
use crate::naming;
use crate::template;
use crate::vars;

/// Whether a string value represents true.
pub fn is_true(val: &str) -> bool {
    matches!(
        val.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

/// Whether the application has a template directory for its base name.
pub fn is_builtin(layout: &Layout, app_name: &str) -> bool {
    layout.template_dir(naming::base_name(app_name)).is_dir()
}

/// Whether the app's `__ENABLED` variable is truthy in the live env file.
pub fn is_enabled(layout: &Layout, app_name: &str) -> bool {
    let key = format!("{}__ENABLED", app_name.to_uppercase());
    vars::get(&key, &layout.env_file())
        .map(|v| is_true(&v))
        .unwrap_or(false)
}

/// Whether the app is built-in and has an `__ENABLED` variable (any value).
pub fn is_added(layout: &Layout, app_name: &str) -> bool {
    let upper = app_name.to_uppercase();
    is_builtin(layout, &upper)
        && vars::exists(&format!("{upper}__ENABLED"), &layout.env_file()).unwrap_or(false)
}

/// Whether the app has variables but no template backing it.
pub fn is_user_defined(layout: &Layout, app_name: &str) -> bool {
    let upper = app_name.to_uppercase();
    if is_builtin(layout, &upper) {
        return false;
    }
    vars::exists(&format!("{upper}__ENABLED"), &layout.env_file()).unwrap_or(false)
}

/// Whether the app's template is marked deprecated in its labels file.
pub fn is_deprecated(layout: &Layout, app_name: &str) -> bool {
    app_labels(layout, app_name)
        .map(|l| l.deprecated)
        .unwrap_or(false)
}

/// Whether the app is referenced anywhere in the configuration.
pub fn is_referenced(layout: &Layout, app_name: &str) -> bool {
    list_referenced(layout)
        .map(|apps| apps.iter().any(|a| a == &app_name.to_uppercase()))
        .unwrap_or(false)
}

fn app_labels(layout: &Layout, app_name: &str) -> Option<labels::AppLabels> {
    let path = template::instance_file(layout, app_name, "*.labels.yml").ok()??;
    labels::parse(&path).ok()
}

/// Human-readable application name: label metadata first, title-cased
/// fallback otherwise.
pub fn nice_name(layout: &Layout, app_name: &str) -> String {
    app_labels(layout, app_name)
        .and_then(|l| l.nice_name)
        .unwrap_or_else(|| naming::fallback_nice_name(app_name))
}

/// Application description from label metadata.
pub fn description(layout: &Layout, app_name: &str) -> String {
    if is_user_defined(layout, app_name) {
        return format!(
            "{} is a user defined application",
            nice_name(layout, app_name)
        );
    }
    app_labels(layout, app_name)
        .and_then(|l| l.description)
        .unwrap_or_else(|| "! Missing description !".to_string())
}

/// Sorted list of all built-in applications (upper-cased directory names).
pub fn list_builtin(layout: &Layout) -> Result<Vec<String>> {
    let apps_dir = layout.templates_dir().join(crate::layout::TEMPLATE_APPS_DIR);
    let mut builtin = Vec::new();

    let entries = match fs::read_dir(&apps_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(builtin),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() && !name.starts_with('.') {
            builtin.push(name.to_uppercase());
        }
    }

    builtin.sort();
    Ok(builtin)
}

fn added_filter(layout: &Layout, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let env_vars = vars::list(&layout.env_file())?;
    let mut apps = Vec::new();
    for (key, val) in &env_vars {
        if let Some(app) = key.strip_suffix("__ENABLED") {
            if naming::is_valid_app_name(app) && is_builtin(layout, app) && keep(val) {
                apps.push(app.to_string());
            }
        }
    }
    apps.sort();
    Ok(apps)
}

/// Sorted list of added applications (built-in, `__ENABLED` present).
pub fn list_added(layout: &Layout) -> Result<Vec<String>> {
    added_filter(layout, |_| true)
}

/// Sorted list of enabled applications.
pub fn list_enabled(layout: &Layout) -> Result<Vec<String>> {
    added_filter(layout, is_true)
}

/// Sorted list of added-but-disabled applications.
pub fn list_disabled(layout: &Layout) -> Result<Vec<String>> {
    added_filter(layout, |v| !is_true(v))
}

/// Sorted list of built-in applications marked deprecated.
pub fn list_deprecated(layout: &Layout) -> Result<Vec<String>> {
    Ok(list_builtin(layout)?
        .into_iter()
        .filter(|app| is_deprecated(layout, app))
        .collect())
}

/// Sorted list of referenced applications: apps owning any variable in
/// the live env file, apps with an app env file, and apps named in the
/// override manifest.
///
/// Every variable's owner is referenced — enabled or not — so a
/// canonical rewrite never drops a disabled app's section.
pub fn list_referenced(layout: &Layout) -> Result<Vec<String>> {
    let mut referenced: BTreeSet<String> = BTreeSet::new();

    for key in vars::list(&layout.env_file())?.keys() {
        if let Some(app) = naming::app_for_var(key) {
            referenced.insert(app);
        }
    }

    if let Ok(entries) = fs::read_dir(&layout.compose_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(app) = name.strip_prefix(APP_ENV_FILE_PREFIX) {
                referenced.insert(app.to_uppercase());
            }
        }
    }

    if let Ok(content) = fs::read_to_string(layout.override_file()) {
        let re = Regex::new(&format!(
            r"{}([a-z0-9_]+)",
            regex::escape(APP_ENV_FILE_PREFIX)
        ))
        .expect("override scan regex");
        for caps in re.captures_iter(&content) {
            referenced.insert(caps[1].to_uppercase());
        }
    }

    Ok(referenced
        .into_iter()
        .filter(|app| naming::is_valid_app_name(app))
        .collect())
}

/// Set `<APP>__ENABLED='true'` for each named built-in app.
pub fn enable(layout: &Layout, app_names: &[String]) -> Result<()> {
    set_enabled(layout, app_names, true)
}

/// Set `<APP>__ENABLED='false'` for each named built-in app.
pub fn disable(layout: &Layout, app_names: &[String]) -> Result<()> {
    set_enabled(layout, app_names, false)
}

fn set_enabled(layout: &Layout, app_names: &[String], enabled: bool) -> Result<()> {
    let env_file = layout.env_file();
    let value = if enabled { "true" } else { "false" };

    for app_name in app_names {
        let upper = naming::strip_colons(app_name.trim()).to_uppercase();
        if is_builtin(layout, &upper) {
            let key = format!("{upper}__ENABLED");
            info!(
                "Setting {key}='{value}' in '{}' for '{}'",
                env_file.display(),
                nice_name(layout, &upper)
            );
            vars::set(&key, value, &env_file)?;
        } else {
            warn!("Application '{}' does not exist.", nice_name(layout, &upper));
        }
    }
    Ok(())
}

/// Filter env lines to the ones owned by `app_name`, or to globals when
/// `app_name` is empty, normalized to `KEY=<rest verbatim>`.
///
/// Ownership uses the single classification rule from [`naming::classify`],
/// so a variable with a deeper instance prefix (`SONARR__4K__*`) never
/// leaks into the base app's section.
pub fn app_var_lines(app_name: &str, lines: &[String]) -> Vec<String> {
    let mut selected = Vec::new();
    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((raw_key, rest)) = trimmed.split_once('=') else {
            continue;
        };
        let key = raw_key.trim_end();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            continue;
        }

        let owner = naming::app_for_var(key);
        let matches = match (app_name.is_empty(), &owner) {
            (true, None) => true,
            (false, Some(app)) => app == app_name,
            _ => false,
        };
        if matches {
            selected.push(format!("{key}={rest}"));
        }
    }
    selected
}

/// Create the directories a `<base>.folders` file asks for.
///
/// Each non-comment line is a path, possibly with `${...}` references,
/// expanded against the global and app env variables. Creation failures
/// are logged per folder and do not abort.
pub fn create_folders(layout: &Layout, app_name: &str) -> Result<()> {
    let Some(folders_file) = template::instance_file(layout, app_name, "*.folders")? else {
        return Ok(());
    };

    let mut env = vars::list(&layout.env_file())?;
    env.extend(vars::list(&layout.app_env_file(app_name))?);

    let mut to_create = Vec::new();
    for line in fs::read_to_string(&folders_file)?.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let expanded = vars::expand(line, &env);
        if expanded.is_empty() {
            continue;
        }
        let path = Path::new(&expanded);
        if !path.exists() {
            to_create.push(path.to_path_buf());
        }
    }

    if !to_create.is_empty() {
        info!(
            "Creating config folders for '{}'.",
            nice_name(layout, app_name)
        );
        for folder in to_create {
            if let Err(e) = fs::create_dir_all(&folder) {
                warn!("Could not create folder '{}': {e}", folder.display());
            }
        }
    }
    Ok(())
}
