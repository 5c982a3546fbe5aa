//! Stage 1: environment bootstrap.
//!
//! Creates the compose directory and the live env file when missing, fills
//! in absent default variables, and recomputes the platform-derived
//! globals (home directory, volume roots contracted back to variable
//! references, identity and timezone defaults).

use std::collections::BTreeMap;
use std::fs;

use log::{info, warn};

use crate::defaults;
use crate::error::Result;
use crate::layout::Layout;
use crate::merge;
use crate::vars;

/// Variables seeded into a brand-new env file.
///
/// The user's own `.env.example` backbone, when installed, is merged on
/// top of these during every sanitize pass.
const DEFAULT_ENV: &str = "\
# Global Variables
DOCKER_HOSTNAME=''
TZ=''
PUID=''
PGID=''
DOCKER_GID=''
DOCKER_CONFIG_FOLDER=''
DOCKER_COMPOSE_FOLDER=''
DOCKER_VOLUME_CONFIG='${DOCKER_CONFIG_FOLDER?}'
DOCKER_VOLUME_STORAGE='${HOME?}/storage'
DOCKER_VOLUME_STORAGE2=''
DOCKER_VOLUME_STORAGE3=''
DOCKER_VOLUME_STORAGE4=''
DOCKER_MULTIPLE_STORAGE='false'
DOCKER_STORAGE_ON='true'
DOCKER_STORAGE2_ON='false'
DOCKER_STORAGE3_ON='false'
DOCKER_STORAGE4_ON='false'
";

/// Globals recomputed when empty.
const EMPTY_DEFAULTS: &[&str] = &["DOCKER_HOSTNAME", "TZ"];

/// Globals recomputed when empty or still carrying a placeholder.
const PLACEHOLDER_DEFAULTS: &[&str] = &["DOCKER_GID", "PGID", "PUID"];

/// Volume variables contracted back to `${...}` references.
const VOLUME_VARS: &[&str] = &[
    "DOCKER_VOLUME_CONFIG",
    "DOCKER_VOLUME_STORAGE",
    "DOCKER_VOLUME_STORAGE2",
    "DOCKER_VOLUME_STORAGE3",
    "DOCKER_VOLUME_STORAGE4",
];

/// Ensure the live env file exists and is sane.
pub fn ensure_env(layout: &Layout) -> Result<()> {
    if !layout.compose_dir.is_dir() {
        info!("Creating folder '{}'.", layout.compose_dir.display());
        fs::create_dir_all(&layout.compose_dir)?;
    }

    let env_file = layout.env_file();
    if !env_file.is_file() {
        warn!(
            "File '{}' not found. Seeding defaults.",
            env_file.display()
        );
        fs::write(&env_file, DEFAULT_ENV)?;
    }

    sanitize_env(layout)
}

/// Merge missing defaults and recompute platform-derived globals.
pub fn sanitize_env(layout: &Layout) -> Result<()> {
    let env_file = layout.env_file();

    merge::merge_new_only_content(&env_file, DEFAULT_ENV)?;
    if layout.env_example_file().is_file() {
        merge::merge_new_only(&env_file, &layout.env_example_file())?;
    }

    let env_vars = vars::list(&env_file)?;
    let mut updates: Vec<(String, String)> = Vec::new();

    // HOME mirrors the detected home directory so `${HOME?}` references
    // in volume variables resolve consistently.
    let home = dirs::home_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !home.is_empty() && env_vars.get("HOME").map(String::as_str) != Some(home.as_str()) {
        updates.push(("HOME".to_string(), home.clone()));
    }

    let config_folder = layout.config_volume_root.to_string_lossy().into_owned();
    if env_vars.get("DOCKER_CONFIG_FOLDER").map(String::as_str) != Some(config_folder.as_str()) {
        updates.push(("DOCKER_CONFIG_FOLDER".to_string(), config_folder.clone()));
    }
    let compose_folder = layout.compose_dir.to_string_lossy().into_owned();
    if env_vars.get("DOCKER_COMPOSE_FOLDER").map(String::as_str) != Some(compose_folder.as_str()) {
        updates.push(("DOCKER_COMPOSE_FOLDER".to_string(), compose_folder.clone()));
    }

    for key in EMPTY_DEFAULTS {
        if env_vars.get(*key).map(String::as_str).unwrap_or("").is_empty() {
            let default = defaults::default_value(layout, key);
            if default != "''" {
                updates.push((key.to_string(), default));
            }
        }
    }
    for key in PLACEHOLDER_DEFAULTS {
        let current = env_vars.get(*key).map(String::as_str).unwrap_or("");
        if current.is_empty() || current.contains('x') {
            let default = defaults::default_value(layout, key);
            if default != "''" {
                updates.push((key.to_string(), default));
            }
        }
    }

    // Volume paths: expand, then contract back to references so user
    // files stay portable across home or config root moves.
    let mut context: BTreeMap<String, String> = env_vars.clone();
    context.insert("HOME".to_string(), home.clone());
    context.insert("DOCKER_CONFIG_FOLDER".to_string(), config_folder.clone());

    let mut reference_vars = BTreeMap::new();
    reference_vars.insert("HOME".to_string(), home);
    reference_vars.insert("DOCKER_CONFIG_FOLDER".to_string(), config_folder);

    for key in VOLUME_VARS {
        let current = env_vars.get(*key).map(String::as_str).unwrap_or("");
        if current.is_empty() {
            continue;
        }
        let expanded = vars::expand(current, &context);
        let contracted = vars::contract(&expanded, &reference_vars);
        if current != contracted {
            updates.push((key.to_string(), format!("\"{contracted}\"")));
        }
    }

    if !updates.is_empty() {
        info!("Setting variables in '{}':", env_file.display());
        for (key, value) in &updates {
            info!("   {key}={value}");
            if key == "HOME" || key.ends_with("_FOLDER") {
                vars::set(key, value, &env_file)?;
            } else {
                vars::set_literal(key, value, &env_file)?;
            }
        }
    }

    Ok(())
}
