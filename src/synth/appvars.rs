//! Stage 2: application variable creation.
//!
//! For every added application, instantiates the app's env templates and
//! merges newly-introduced variables into the live files, without ever
//! touching existing values. The whole stage is gated by the staleness
//! tracker: a run where nothing relevant changed (env files, the added-app
//! set, the template tree) is a cheap no-op.
//!
//! One application failing does not abort the others; the failure is
//! logged and the loop continues.

use std::time::SystemTime;

use log::{error, info, warn};

use crate::apps;
use crate::error::{Error, Result};
use crate::layout::{Layout, APP_ENV_FILE_PREFIX, ENV_FILE_NAME};
use crate::merge;
use crate::migrate;
use crate::naming;
use crate::staleness::{self, MarkerStore};
use crate::synth::{bootstrap, update};
use crate::template;

const MARKER_PREFIX: &str = "appvars_";
const ADDED_APPS_MARKER: &str = "added_apps";
const SYNC_SENTINEL: &str = "last_synced";

fn store(layout: &Layout) -> MarkerStore {
    MarkerStore::new(layout.markers_dir(), MARKER_PREFIX)
}

/// Create environment variables for all added applications.
pub fn create_all(layout: &Layout, force: bool) -> Result<()> {
    bootstrap::ensure_env(layout)?;

    let added = apps::list_added(layout)?;

    if !needs_create(layout, force, &[]) {
        info!("Environment variables already created for all added apps.");
        return Ok(());
    }

    if added.is_empty() {
        info!(
            "'{}' does not contain any added apps.",
            layout.env_file().display()
        );
        return Ok(());
    }

    info!("Creating environment variables for added apps.");
    for app_name in &added {
        if let Err(e) = create_app(layout, app_name) {
            error!("Failed to create variables for {app_name}: {e}");
        }
    }

    update::update_env(layout, force)?;
    mark_created_all(layout, &added);
    Ok(())
}

/// Create environment variables for a single application.
pub fn create_app(layout: &Layout, app_name_raw: &str) -> Result<()> {
    let app_upper = naming::strip_colons(app_name_raw.trim()).to_uppercase();
    let nice = apps::nice_name(layout, &app_upper);

    if !naming::is_valid_app_name(&app_upper) {
        return Err(Error::InvalidAppName { name: app_upper });
    }

    if !apps::is_builtin(layout, &app_upper) {
        warn!("Application '{nice}' does not exist.");
        return Ok(());
    }

    if !needs_create(layout, false, std::slice::from_ref(&app_upper)) {
        info!("Environment variables already created for '{nice}'.");
        return Ok(());
    }

    info!("Creating environment variables for '{nice}'.");

    // Variables destined for the global env file.
    if let Some(global_template) = template::instance_file(layout, &app_upper, ENV_FILE_NAME)? {
        merge::merge_new_only(&layout.env_file(), &global_template)?;
    }

    // Variables destined for the app-specific env file.
    if let Some(app_template) = template::instance_file(layout, &app_upper, ".env.app.*")? {
        merge::merge_new_only(&layout.app_env_file(&app_upper), &app_template)?;
    }

    migrate::migrate_app_vars(layout, &app_upper)?;

    mark_created_app(layout, &app_upper);
    Ok(())
}

/// Whether app variable creation must run.
///
/// With an empty `apps` slice the check runs in bulk mode: the live env
/// file, the recorded added-app set, and the template tree (against the
/// bulk sentinel) all have to be unchanged. With specific apps it runs in
/// precise mode per app: added state, the app env file, and the app's
/// template subtree against the newest of the bulk and per-app sentinels.
pub fn needs_create(layout: &Layout, force: bool, app_names: &[String]) -> bool {
    if force {
        return true;
    }
    let store = store(layout);

    if store.is_stale(&layout.env_file()) {
        return true;
    }

    if app_names.is_empty() {
        let added = apps::list_added(layout).unwrap_or_default();
        if store.list_changed(ADDED_APPS_MARKER, &added) {
            return true;
        }
        let Some(synced) = store.sentinel_time(SYNC_SENTINEL) else {
            return true;
        };
        if staleness::any_newer_than(&layout.templates_dir(), synced) {
            return true;
        }
        return app_env_files_newer_than(layout, synced);
    }

    for app_name in app_names {
        let app_upper = app_name.to_uppercase();
        if !apps::is_added(layout, &app_upper) {
            return true;
        }
        if store.is_stale_optional(&layout.app_env_file(&app_upper)) {
            return true;
        }

        let newest_sentinel = [
            store.sentinel_time(SYNC_SENTINEL),
            store.sentinel_time(&app_sentinel(&app_upper)),
        ]
        .into_iter()
        .flatten()
        .max();
        let Some(synced) = newest_sentinel else {
            return true;
        };

        let template_dir = layout.template_dir(naming::base_name(&app_upper));
        if staleness::any_newer_than(&template_dir, synced) {
            return true;
        }
    }
    false
}

/// Record fresh markers after a successful bulk run.
pub fn mark_created_all(layout: &Layout, added: &[String]) {
    let store = store(layout);
    commit_quiet(&store, layout);
    if let Err(e) = store.record_list(ADDED_APPS_MARKER, added) {
        warn!("Failed to record added-app marker: {e}");
    }
    if let Err(e) = store.touch_sentinel(SYNC_SENTINEL) {
        warn!("Failed to touch sync sentinel: {e}");
    }
    for app_name in added {
        mark_created_app(layout, app_name);
    }
}

/// Record fresh markers after a successful single-app run.
pub fn mark_created_app(layout: &Layout, app_name: &str) {
    let store = store(layout);
    let app_upper = app_name.to_uppercase();
    if let Err(e) = store.touch_sentinel(&app_sentinel(&app_upper)) {
        warn!("Failed to touch sentinel for {app_upper}: {e}");
    }
    if let Err(e) = store.commit(&layout.app_env_file(&app_upper)) {
        warn!("Failed to commit app env marker for {app_upper}: {e}");
    }
}

fn commit_quiet(store: &MarkerStore, layout: &Layout) {
    if let Err(e) = store.commit(&layout.env_file()) {
        warn!("Failed to commit env marker: {e}");
    }
}

fn app_sentinel(app_upper: &str) -> String {
    format!("{SYNC_SENTINEL}_{app_upper}")
}

/// Whether any `.env.app.*` file in the compose directory is newer than
/// the last bulk sync.
fn app_env_files_newer_than(layout: &Layout, synced: std::time::SystemTime) -> bool {
    let pattern = glob::Pattern::new(&format!("{APP_ENV_FILE_PREFIX}*")).expect("app env pattern");
    let Ok(entries) = std::fs::read_dir(&layout.compose_dir) else {
        return false;
    };
    entries
        .flatten()
        .filter(|e| pattern.matches(&e.file_name().to_string_lossy()))
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .any(|mtime| mtime > synced)
}

/// Timestamp of the last bulk sync, if any. Exposed for status output.
pub fn last_synced(layout: &Layout) -> Option<SystemTime> {
    store(layout).sentinel_time(SYNC_SENTINEL)
}
