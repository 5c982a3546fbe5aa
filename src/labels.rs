//! Template label metadata (`<base>.labels.yml`).
//!
//! Each template directory may carry a labels file describing the app for
//! humans: a nice name, a one-paragraph description, and a deprecation
//! flag. The file is a manifest-shaped YAML document so template authors
//! can keep it next to the fragments:
//!
//! ```yaml
//! services:
//!   sonarr:
//!     labels:
//!       io.dockforge.appinfo.nicename: Sonarr
//!       io.dockforge.appinfo.description: Smart PVR for newsgroup users
//!       io.dockforge.appinfo.deprecated: "false"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

const NICE_NAME_LABEL: &str = "io.dockforge.appinfo.nicename";
const DESCRIPTION_LABEL: &str = "io.dockforge.appinfo.description";
const DEPRECATED_LABEL: &str = "io.dockforge.appinfo.deprecated";

#[derive(Debug, Deserialize)]
struct LabelsFile {
    #[serde(default)]
    services: BTreeMap<String, ServiceLabels>,
}

#[derive(Debug, Deserialize)]
struct ServiceLabels {
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

/// Parsed label metadata for one application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppLabels {
    /// Human-readable application name.
    pub nice_name: Option<String>,
    /// One-paragraph description.
    pub description: Option<String>,
    /// Whether the template is marked deprecated.
    pub deprecated: bool,
}

/// Parse a labels file. Unknown labels are ignored; values are trimmed of
/// stray quoting.
pub fn parse(path: &Path) -> Result<AppLabels> {
    let content = fs::read_to_string(path)?;
    let file: LabelsFile = serde_yaml::from_str(&content)?;

    let mut labels = AppLabels::default();
    for service in file.services.values() {
        if let Some(name) = service.labels.get(NICE_NAME_LABEL) {
            labels.nice_name = Some(trim_label(name));
        }
        if let Some(desc) = service.labels.get(DESCRIPTION_LABEL) {
            labels.description = Some(trim_label(desc));
        }
        if let Some(dep) = service.labels.get(DEPRECATED_LABEL) {
            labels.deprecated = trim_label(dep).eq_ignore_ascii_case("true");
        }
    }
    Ok(labels)
}

fn trim_label(value: &str) -> String {
    value.trim_matches(['"', '\'', ' ']).to_string()
}
