//! Stage 4: manifest synthesis.
//!
//! Selects the ordered fragment list for every enabled application, hands
//! it to the external merge command, and persists the synthesized manifest.
//! Required per-app config folders are created first, and deprecated
//! enabled apps produce warnings.
//!
//! Staleness gating: the manifest is re-synthesized when it is missing,
//! when it or the live env file changed, or when any enabled app's env
//! file changed since the last successful merge.

use std::fs;

use log::{info, warn};

use crate::apps;
use crate::error::{Error, Result};
use crate::fragments;
use crate::layout::Layout;
use crate::staleness::MarkerStore;
use crate::synth::appvars;

const MARKER_PREFIX: &str = "manifest_";

fn store(layout: &Layout) -> MarkerStore {
    MarkerStore::new(layout.markers_dir(), MARKER_PREFIX)
}

/// Synthesize the merged manifest for all enabled applications.
pub fn generate(layout: &Layout, force: bool) -> Result<()> {
    if !needs_generate(layout, force) {
        info!(
            "Enabled app templates already merged to '{}'.",
            layout.manifest_file().display()
        );
        return Ok(());
    }

    // App variables have to be current before fragments are selected.
    appvars::create_all(layout, force)?;

    let enabled = apps::list_enabled(layout)?;
    if enabled.is_empty() {
        return Err(Error::NoEnabledApps);
    }

    info!(
        "Merging enabled app templates to '{}'.",
        layout.manifest_file().display()
    );

    for app_name in &enabled {
        if apps::is_deprecated(layout, app_name) {
            warn!(
                "'{}' IS DEPRECATED! Consider disabling it.",
                apps::nice_name(layout, app_name)
            );
        }
        if let Err(e) = apps::create_folders(layout, app_name) {
            warn!("Failed to create config folders for {app_name}: {e}");
        }
    }

    let selected = fragments::select(layout, &enabled)?;
    let merged = fragments::merge(layout, &selected)?;
    fs::write(layout.manifest_file(), merged)?;

    info!("Merging '{}' complete.", layout.manifest_file().display());
    mark_generated(layout, &enabled);
    Ok(())
}

/// Whether manifest synthesis must run.
pub fn needs_generate(layout: &Layout, force: bool) -> bool {
    if force {
        return true;
    }
    if !layout.manifest_file().is_file() {
        return true;
    }

    let store = store(layout);
    if store.is_stale(&layout.manifest_file()) {
        return true;
    }
    if store.is_stale(&layout.env_file()) {
        return true;
    }

    let enabled = apps::list_enabled(layout).unwrap_or_default();
    enabled
        .iter()
        .any(|app| store.is_stale_optional(&layout.app_env_file(app)))
}

/// Record fresh markers after a successful merge.
fn mark_generated(layout: &Layout, enabled: &[String]) {
    let store = store(layout);
    // Stale markers from a previous enablement set would leak; start over.
    if let Err(e) = store.clear() {
        warn!("Failed to clear manifest markers: {e}");
    }
    for path in [layout.manifest_file(), layout.env_file()] {
        if let Err(e) = store.commit(&path) {
            warn!("Failed to commit marker for '{}': {e}", path.display());
        }
    }
    for app_name in enabled {
        if let Err(e) = store.commit(&layout.app_env_file(app_name)) {
            warn!("Failed to commit marker for {app_name}: {e}");
        }
    }
}
