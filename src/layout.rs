//! Settings file and directory layout resolution.
//!
//! All paths the engine touches are derived from a [`Layout`]: the compose
//! directory (live env files and synthesized manifest), the state directory
//! (templates, materialized instances, staleness markers), and the config
//! directory (settings file, default env backbone).
//!
//! Settings live in a small TOML file (`dockforge.toml`) under the platform
//! config directory. Paths in the settings file may reference
//! `${XDG_CONFIG_HOME}` and `${HOME}`, which are expanded at load time.
//! Tests and scripts can bypass the settings file entirely with the
//! `DOCKFORGE_CONFIG_DIR`, `DOCKFORGE_STATE_DIR`, and `DOCKFORGE_COMPOSE_DIR`
//! environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of the settings file under the config directory.
pub const SETTINGS_FILE_NAME: &str = "dockforge.toml";

/// Live environment file name inside the compose directory.
pub const ENV_FILE_NAME: &str = ".env";

/// Default-variable backbone file inside the config directory.
pub const ENV_EXAMPLE_FILE_NAME: &str = ".env.example";

/// Prefix of per-application env files inside the compose directory.
pub const APP_ENV_FILE_PREFIX: &str = ".env.app.";

/// Synthesized manifest file name.
pub const MANIFEST_FILE_NAME: &str = "docker-compose.yml";

/// User-maintained override manifest file name.
pub const OVERRIDE_FILE_NAME: &str = "docker-compose.override.yml";

/// Subdirectory of the template tree holding one folder per base app.
pub const TEMPLATE_APPS_DIR: &str = "apps";

/// On-disk settings, deserialized from `dockforge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory path settings.
    pub paths: PathSettings,
}

/// Directory path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Root for per-container configuration volumes.
    pub config_folder: String,
    /// Directory holding the live env files and the synthesized manifest.
    pub compose_folder: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            config_folder: "${XDG_CONFIG_HOME}".to_string(),
            compose_folder: "${XDG_CONFIG_HOME}/compose".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when the
    /// file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Expand `${XDG_CONFIG_HOME}` and `${HOME}` references in a settings path.
pub fn expand_settings_path(value: &str) -> PathBuf {
    let config_home = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    let expanded = value
        .replace("${XDG_CONFIG_HOME}", &config_home.to_string_lossy())
        .replace("${HOME}", &home.to_string_lossy());
    PathBuf::from(expanded)
}

/// Resolved directory layout for one configuration root.
///
/// Cheap to clone; every path accessor is a pure join.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Directory holding the live env files and the synthesized manifest.
    pub compose_dir: PathBuf,
    /// Directory holding the settings file and the default env backbone.
    pub config_dir: PathBuf,
    /// Directory holding templates, instances, and staleness markers.
    pub state_dir: PathBuf,
    /// Root for per-container configuration volumes.
    pub config_volume_root: PathBuf,
    /// CPU architecture used to select architecture fragments.
    pub arch: String,
}

impl Layout {
    /// Resolve the layout from environment overrides, the settings file,
    /// and the platform directories, in that order of precedence.
    pub fn discover() -> Result<Self> {
        let config_dir = match env::var_os("DOCKFORGE_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dockforge"),
        };

        let settings = Settings::load(&config_dir.join(SETTINGS_FILE_NAME))?;

        let compose_dir = match env::var_os("DOCKFORGE_COMPOSE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => expand_settings_path(&settings.paths.compose_folder),
        };
        let state_dir = match env::var_os("DOCKFORGE_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dockforge"),
        };

        Ok(Self {
            compose_dir,
            config_dir,
            state_dir,
            config_volume_root: expand_settings_path(&settings.paths.config_folder),
            arch: detect_arch(),
        })
    }

    /// Build a layout rooted under a single directory. Used by tests.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            compose_dir: root.join("compose"),
            config_dir: root.join("config"),
            state_dir: root.join("state"),
            config_volume_root: root.join("config"),
            arch: detect_arch(),
        }
    }

    /// The live global env file.
    pub fn env_file(&self) -> PathBuf {
        self.compose_dir.join(ENV_FILE_NAME)
    }

    /// The default env backbone, if the user installed one.
    pub fn env_example_file(&self) -> PathBuf {
        self.config_dir.join(ENV_EXAMPLE_FILE_NAME)
    }

    /// The per-application env file for an app name.
    pub fn app_env_file(&self, app_name: &str) -> PathBuf {
        self.compose_dir
            .join(format!("{APP_ENV_FILE_PREFIX}{}", app_name.to_lowercase()))
    }

    /// The synthesized manifest file.
    pub fn manifest_file(&self) -> PathBuf {
        self.compose_dir.join(MANIFEST_FILE_NAME)
    }

    /// The user-maintained override manifest file.
    pub fn override_file(&self) -> PathBuf {
        self.compose_dir.join(OVERRIDE_FILE_NAME)
    }

    /// Root of the template tree.
    pub fn templates_dir(&self) -> PathBuf {
        self.state_dir.join("templates")
    }

    /// Template directory for a lower-cased base application name.
    pub fn template_dir(&self, base_app: &str) -> PathBuf {
        self.templates_dir()
            .join(TEMPLATE_APPS_DIR)
            .join(base_app.to_lowercase())
    }

    /// Root of the materialized instance tree.
    pub fn instances_dir(&self) -> PathBuf {
        self.state_dir.join("instances")
    }

    /// Instance directory for an application name (base or instanced).
    pub fn instance_dir(&self, app_name: &str) -> PathBuf {
        self.instances_dir().join(app_name.to_lowercase())
    }

    /// Directory holding staleness markers.
    pub fn markers_dir(&self) -> PathBuf {
        self.state_dir.join("markers")
    }
}

/// Normalized CPU architecture name used in fragment file names.
pub fn detect_arch() -> String {
    // Rust already reports x86_64 / aarch64, the names the template
    // catalog uses.
    env::consts::ARCH.to_string()
}
