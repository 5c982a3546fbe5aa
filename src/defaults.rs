//! Default values for application and global variables.
//!
//! Resolution order for an app variable: the app's instantiated `.env`
//! template first, then the well-known per-suffix defaults. Global
//! variables fall back to computed platform values, then to the default
//! env backbone in the config directory. Returned strings are raw literals
//! (quoting included) ready for [`crate::vars::set_literal`].

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::layout::{Layout, ENV_FILE_NAME};
use crate::naming::{self, VarClass};
use crate::template;
use crate::vars;

/// Default literal value for a variable key, or an empty-quoted literal.
pub fn default_value(layout: &Layout, key: &str) -> String {
    match naming::classify(key) {
        VarClass::Global => global_default(layout, key),
        class => {
            let app = class.app_name().expect("non-global class has an app");
            app_default(layout, &app, key)
        }
    }
}

fn app_default(layout: &Layout, app_name: &str, key: &str) -> String {
    // The app's own .env template wins when it defines the key.
    if let Ok(Some(def_file)) = template::instance_file(layout, app_name, ENV_FILE_NAME) {
        if let Ok(true) = vars::exists(key, &def_file) {
            if let Ok(literal) = vars::get_literal(key, &def_file) {
                return literal;
            }
        }
    }

    let suffix = key
        .strip_prefix(app_name)
        .and_then(|s| s.strip_prefix("__"))
        .unwrap_or(key);

    match suffix {
        "CONTAINER_NAME" => format!("'{}'", app_name.to_lowercase()),
        "ENABLED" => "'false'".to_string(),
        "HOSTNAME" => format!("'{}'", crate::apps::nice_name(layout, app_name)),
        "NETWORK_MODE" => "''".to_string(),
        "RESTART" => "'unless-stopped'".to_string(),
        "TAG" => "'latest'".to_string(),
        _ => {
            // PORT_8989 defaults to its own number.
            if let Some(port) = suffix.strip_prefix("PORT_") {
                if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
                    return format!("'{port}'");
                }
            }
            "''".to_string()
        }
    }
}

fn global_default(layout: &Layout, key: &str) -> String {
    match key {
        "DOCKER_COMPOSE_FOLDER" => layout.compose_dir.to_string_lossy().into_owned(),
        "DOCKER_CONFIG_FOLDER" => layout.config_volume_root.to_string_lossy().into_owned(),
        "DOCKER_HOSTNAME" => format!("'{}'", detect_hostname()),
        "TZ" => format!("'{}'", detect_timezone()),
        "PUID" => format!("'{}'", detect_uid()),
        "PGID" => format!("'{}'", detect_gid()),
        "DOCKER_GID" => format!("'{}'", lookup_group_id("docker").unwrap_or_else(detect_gid)),
        _ => {
            // Fall back to the default env backbone, if installed.
            if let Ok(literal) = vars::get_literal(key, &layout.env_example_file()) {
                if !literal.is_empty() {
                    let trimmed = literal.trim();
                    if trimmed.contains('$')
                        || trimmed.starts_with('\'')
                        || trimmed.starts_with('"')
                    {
                        return literal;
                    }
                    return format!("'{trimmed}'");
                }
            }
            "''".to_string()
        }
    }
}

fn detect_hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.is_empty() {
            return name;
        }
    }
    fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn detect_timezone() -> String {
    if let Ok(tz) = fs::read_to_string("/etc/timezone") {
        let tz = tz.trim();
        if !tz.is_empty() {
            return tz.to_string();
        }
    }
    // /etc/localtime usually links into the zoneinfo database.
    if let Ok(link) = fs::read_link("/etc/localtime") {
        let link = link.to_string_lossy().into_owned();
        if let Some((_, zone)) = link.split_once("zoneinfo/") {
            return zone.to_string();
        }
    }
    "Etc/UTC".to_string()
}

#[cfg(unix)]
fn detect_uid() -> String {
    use std::os::unix::fs::MetadataExt;
    dirs::home_dir()
        .and_then(|home| fs::metadata(home).ok())
        .map(|m| m.uid().to_string())
        .unwrap_or_else(|| "1000".to_string())
}

#[cfg(not(unix))]
fn detect_uid() -> String {
    "1000".to_string()
}

#[cfg(unix)]
fn detect_gid() -> String {
    use std::os::unix::fs::MetadataExt;
    dirs::home_dir()
        .and_then(|home| fs::metadata(home).ok())
        .map(|m| m.gid().to_string())
        .unwrap_or_else(|| "1000".to_string())
}

#[cfg(not(unix))]
fn detect_gid() -> String {
    "1000".to_string()
}

fn lookup_group_id(group: &str) -> Option<String> {
    lookup_group_id_in(group, Path::new("/etc/group"))
}

fn lookup_group_id_in(group: &str, group_file: &Path) -> Option<String> {
    let content = fs::read_to_string(group_file).ok()?;
    let re = Regex::new(&format!(r"(?m)^{}:[^:]*:(\d+):", regex::escape(group))).ok()?;
    re.captures(&content).map(|caps| caps[1].to_string())
}
