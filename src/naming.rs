//! Application-name and variable-name classification.
//!
//! Every variable-classification decision in the engine goes through this
//! module. The functions here are pure and total: the same name always
//! classifies identically, no matter which component asks.
//!
//! ## Name shapes
//!
//! An application name is `BASE` or `BASE__INSTANCE`, uppercase by
//! convention. `BASE` must match `[A-Z][A-Z0-9]*`; an instance suffix must
//! not collide with the reserved suffix set (`ENABLED`, `TAG`, `PORT`, ...),
//! because those suffixes name per-app variables rather than instances.
//!
//! A variable key either has no `__` (a global variable) or belongs to the
//! longest application-name prefix with a non-reserved instance suffix:
//!
//! ```text
//! SONARR__CONTAINER_NAME      -> app SONARR
//! SONARR__4K__CONTAINER_NAME  -> app SONARR__4K
//! RADARR__ENABLED__OPTS       -> app RADARR  (ENABLED is reserved)
//! DOCKER_VOLUME_STORAGE       -> global
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// Instance suffixes that can never name an application instance.
///
/// These are the per-application variable suffixes; `SONARR__ENABLED` is the
/// enablement flag of `SONARR`, not an instance called `ENABLED`.
pub const RESERVED_INSTANCE_NAMES: &[&str] = &[
    "CONTAINER", "DEVICE", "DEVICES", "ENABLED", "ENVIRONMENT", "HOSTNAME", "NETWORK", "PORT",
    "RESTART", "STORAGE", "STORAGE2", "STORAGE3", "STORAGE4", "TAG",
];

/// Classification of a variable key by its name shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarClass {
    /// No `__` in the key; the variable is global.
    Global,
    /// The key belongs to a base application (no instance suffix, or a
    /// reserved suffix that fell back to the base).
    App { base: String },
    /// The key belongs to a named instance of a base application.
    AppInstance { base: String, instance: String },
}

impl VarClass {
    /// The owning application name, if any (`BASE` or `BASE__INSTANCE`).
    pub fn app_name(&self) -> Option<String> {
        match self {
            VarClass::Global => None,
            VarClass::App { base } => Some(base.clone()),
            VarClass::AppInstance { base, instance } => Some(format!("{base}__{instance}")),
        }
    }
}

fn app_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z][A-Z0-9]*(?:__[A-Z0-9]+)?)__[A-Za-z0-9]").unwrap())
}

fn app_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]*(__[A-Z0-9]+)?$").unwrap())
}

/// Classify a variable key as global, app-owned, or app-instance-owned.
///
/// Applies the longest-prefix rule, then falls back to the base application
/// when the captured instance suffix is reserved. This is the single
/// classification rule; callers must not re-derive it ad hoc.
pub fn classify(key: &str) -> VarClass {
    if !key.contains("__") {
        return VarClass::Global;
    }

    let Some(caps) = app_prefix_re().captures(key) else {
        return VarClass::Global;
    };
    let candidate = &caps[1];

    match candidate.split_once("__") {
        None => VarClass::App {
            base: candidate.to_string(),
        },
        Some((base, instance)) if is_reserved_instance(instance) => VarClass::App {
            base: base.to_string(),
        },
        Some((base, instance)) => VarClass::AppInstance {
            base: base.to_string(),
            instance: instance.to_string(),
        },
    }
}

/// The application name a variable key belongs to, if any.
///
/// `app_for_var("SONARR__4K__CONTAINER_NAME")` is `Some("SONARR__4K")`;
/// `app_for_var("DOCKER_VOLUME_STORAGE")` is `None`.
pub fn app_for_var(key: &str) -> Option<String> {
    classify(key).app_name()
}

/// Whether a variable key is global (owned by no application).
pub fn is_global_var(key: &str) -> bool {
    classify(key) == VarClass::Global
}

/// Whether an instance suffix is in the reserved set.
pub fn is_reserved_instance(name: &str) -> bool {
    let upper = name.to_uppercase();
    RESERVED_INSTANCE_NAMES.contains(&upper.as_str())
}

/// Strip a single leading or trailing `:` from an app name argument.
///
/// The CLI accepts `APP:` to address an app-specific variable file; the
/// colon is not part of the name.
pub fn strip_colons(name: &str) -> &str {
    name.strip_suffix(':')
        .or_else(|| name.strip_prefix(':'))
        .unwrap_or(name)
}

/// Validate an application name.
///
/// The stripped name must match `^[A-Z][A-Z0-9]*(__[A-Z0-9]+)?$`, and an
/// instance suffix, if present, must not be reserved.
pub fn is_valid_app_name(name: &str) -> bool {
    let name = strip_colons(name.trim());
    if !app_name_re().is_match(name) {
        return false;
    }
    match instance_name(name) {
        Some(instance) => !is_reserved_instance(instance),
        None => true,
    }
}

/// The base application name with any instance suffix removed.
pub fn base_name(app_name: &str) -> &str {
    app_name.split("__").next().unwrap_or(app_name)
}

/// The instance suffix of an application name, if present.
pub fn instance_name(app_name: &str) -> Option<&str> {
    app_name.split_once("__").map(|(_, instance)| instance)
}

/// Title-case a single word (`RADARR` -> `Radarr`).
pub fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable fallback name when no label metadata exists.
///
/// `SONARR__4K` becomes `Sonarr 4k`.
pub fn fallback_nice_name(app_name: &str) -> String {
    app_name
        .to_uppercase()
        .split("__")
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_global() {
        assert_eq!(classify("DOCKER_VOLUME_STORAGE"), VarClass::Global);
        assert_eq!(classify("TZ"), VarClass::Global);
    }

    #[test]
    fn test_classify_app() {
        assert_eq!(
            classify("SONARR__CONTAINER_NAME"),
            VarClass::App {
                base: "SONARR".to_string()
            }
        );
    }

    #[test]
    fn test_classify_app_instance() {
        assert_eq!(
            classify("SONARR__4K__CONTAINER_NAME"),
            VarClass::AppInstance {
                base: "SONARR".to_string(),
                instance: "4K".to_string()
            }
        );
    }

    #[test]
    fn test_classify_reserved_instance_falls_back_to_base() {
        // ENABLED is reserved, so RADARR__ENABLED__OPTS belongs to RADARR.
        assert_eq!(
            classify("RADARR__ENABLED__OPTS"),
            VarClass::App {
                base: "RADARR".to_string()
            }
        );
    }

    #[test]
    fn test_app_for_var() {
        assert_eq!(
            app_for_var("SONARR__4K__CONTAINER_NAME").as_deref(),
            Some("SONARR__4K")
        );
        assert_eq!(app_for_var("SONARR__ENABLED").as_deref(), Some("SONARR"));
        assert_eq!(app_for_var("DOCKER_VOLUME_STORAGE"), None);
        assert_eq!(app_for_var("HOME"), None);
    }

    #[test]
    fn test_is_valid_app_name() {
        assert!(is_valid_app_name("SONARR"));
        assert!(is_valid_app_name("SONARR__4K"));
        assert!(is_valid_app_name("APP2"));
        assert!(!is_valid_app_name("SONARR__ENABLED")); // reserved instance
        assert!(!is_valid_app_name("1APP")); // must start with a letter
        assert!(!is_valid_app_name("SONARR 4K")); // no spaces
        assert!(!is_valid_app_name("sonarr")); // uppercase only
        assert!(!is_valid_app_name(""));
    }

    #[test]
    fn test_is_valid_app_name_strips_colons() {
        assert!(is_valid_app_name("SONARR:"));
        assert!(is_valid_app_name(":SONARR"));
        assert!(!is_valid_app_name("SONARR::"));
    }

    #[test]
    fn test_base_and_instance_name() {
        assert_eq!(base_name("SONARR__4K"), "SONARR");
        assert_eq!(base_name("SONARR"), "SONARR");
        assert_eq!(instance_name("SONARR__4K"), Some("4K"));
        assert_eq!(instance_name("SONARR"), None);
    }

    #[test]
    fn test_fallback_nice_name() {
        assert_eq!(fallback_nice_name("RADARR"), "Radarr");
        assert_eq!(fallback_nice_name("RADARR__4K"), "Radarr 4k");
    }

    #[test]
    fn test_reserved_instances() {
        assert!(is_reserved_instance("ENABLED"));
        assert!(is_reserved_instance("storage3"));
        assert!(!is_reserved_instance("4K"));
    }
}
