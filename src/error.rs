//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `dockforge` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the engine. Each variant corresponds to a specific
//!   type of error and includes contextual information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the application to simplify function signatures.
//!
//! Missing templates, missing merge sources, and missing defaults are *not*
//! errors; those conditions are modelled as `Option` returns at the call
//! sites. The variants below cover the genuinely failing cases:
//!
//! - Variable file read/write failures.
//! - Template instantiation failures.
//! - Merge operation failures.
//! - Staleness-marker persistence failures.
//! - A mandatory manifest fragment missing for an enabled application.
//! - The external manifest-merge command failing.
//! - I/O, YAML, TOML, regex, and glob errors from the underlying crates.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dockforge operations
#[derive(Error, Debug)]
pub enum Error {
    /// An application name failed validation.
    ///
    /// Carries the offending name; reserved-instance collisions and
    /// malformed identifiers both end up here.
    #[error("'{name}' is not a valid application name")]
    InvalidAppName { name: String },

    /// An error occurred while reading or writing a variable file.
    #[error("Variable store error for {}: {message}", file.display())]
    VarStore { file: PathBuf, message: String },

    /// An error occurred while materializing an application instance file.
    #[error("Template instantiation error for {app}: {message}")]
    Template { app: String, message: String },

    /// An error occurred during a merge-new-only operation.
    #[error("Merge error ({} <- {}): {message}", target.display(), source_path.display())]
    Merge {
        target: PathBuf,
        source_path: PathBuf,
        message: String,
    },

    /// An error occurred while persisting or reading a staleness marker.
    #[error("Staleness marker error: {message}")]
    Marker { message: String },

    /// A mandatory manifest fragment is missing for an enabled application.
    ///
    /// Optional fragments (hostname, ports, storage, devices) are skipped
    /// when absent; the architecture and main fragments are not.
    #[error("Mandatory fragment missing for enabled application: {}", path.display())]
    FragmentMissing { path: PathBuf },

    /// The external manifest-merge command failed.
    #[error("Manifest merge command failed: {message}")]
    MergeCommand { message: String },

    /// Manifest synthesis was requested with no enabled applications.
    #[error("No enabled applications found")]
    NoEnabledApps,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("Settings parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Shorthand for a `VarStore` error.
    pub fn var_store(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VarStore {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a `Template` error.
    pub fn template(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            app: app.into(),
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_app_name() {
        let error = Error::InvalidAppName {
            name: "sonarr 4k".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("not a valid application name"));
        assert!(display.contains("sonarr 4k"));
    }

    #[test]
    fn test_error_display_var_store() {
        let error = Error::var_store("/tmp/.env", "truncated line");
        let display = format!("{}", error);
        assert!(display.contains("Variable store error"));
        assert!(display.contains("/tmp/.env"));
        assert!(display.contains("truncated line"));
    }

    #[test]
    fn test_error_display_template() {
        let error = Error::template("SONARR__4K", "unreadable template");
        let display = format!("{}", error);
        assert!(display.contains("Template instantiation error"));
        assert!(display.contains("SONARR__4K"));
    }

    #[test]
    fn test_error_display_merge() {
        let error = Error::Merge {
            target: PathBuf::from(".env"),
            source_path: PathBuf::from("sonarr.env"),
            message: "append failed".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Merge error"));
        assert!(display.contains("sonarr.env"));
        assert!(display.contains("append failed"));
    }

    #[test]
    fn test_error_display_fragment_missing() {
        let error = Error::FragmentMissing {
            path: PathBuf::from("/state/instances/sonarr/sonarr.x86_64.yml"),
        };
        let display = format!("{}", error);
        assert!(display.contains("Mandatory fragment missing"));
        assert!(display.contains("sonarr.x86_64.yml"));
    }

    #[test]
    fn test_error_display_no_enabled_apps() {
        let display = format!("{}", Error::NoEnabledApps);
        assert!(display.contains("No enabled applications"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_str = "invalid: [unclosed";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: Error = yaml_error.into();
        let display = format!("{}", error);
        assert!(display.contains("YAML parsing error"));
    }

    #[test]
    fn test_error_from_regex_error() {
        let regex_error = regex::Error::Syntax("Invalid regex".to_string());
        let error: Error = regex_error.into();
        let display = format!("{}", error);
        assert!(display.contains("Regex error"));
    }
}
