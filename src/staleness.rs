//! Staleness tracking for derived files.
//!
//! Regenerating env files and the merged manifest is expensive, so the
//! engine only re-derives when something relevant actually changed. A
//! [`MarkerStore`] persists, per tracked file, a byte-for-byte copy with a
//! synchronized modification time; for logical lists (such as "the sorted
//! set of enabled application names") it persists a serialized textual
//! form; and for bulk scans it keeps empty sentinel files whose own
//! modification time records "last synced at".
//!
//! The file check is two-stage: modification times first, then a content
//! comparison as fallback. Build tooling and filesystems frequently touch
//! files without changing bytes; when that happens the marker's timestamp
//! is silently resynchronized and the file reported fresh. Only a genuine
//! content difference (or a missing marker, or a missing tracked file)
//! reports stale. The on-disk marker representation is private to this
//! module; the contract is `is_stale`/`commit`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A keyed store of staleness markers under one directory.
///
/// Markers are namespaced by a fixed prefix so independent regeneration
/// units (app variables, env formatting, manifest merge) can share the
/// directory without colliding.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
    prefix: String,
}

impl MarkerStore {
    /// Create a store rooted at `dir` with the given marker prefix.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    fn marker_for(&self, tracked: &Path) -> PathBuf {
        let base = tracked
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.named(&base)
    }

    /// Marker path for a logical (non-file) name.
    fn named(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, name))
    }

    /// Whether `tracked` changed since the marker was last committed.
    ///
    /// Missing tracked file or missing marker both report stale. A pure
    /// timestamp change with identical bytes resynchronizes the marker and
    /// reports fresh.
    pub fn is_stale(&self, tracked: &Path) -> bool {
        self.check(tracked, false)
    }

    /// Like [`is_stale`](Self::is_stale), but a tracked file that is
    /// missing *and* has no marker is reported fresh. Used for optional
    /// dependencies where absence is a steady state, not a change.
    pub fn is_stale_optional(&self, tracked: &Path) -> bool {
        self.check(tracked, true)
    }

    fn check(&self, tracked: &Path, missing_ok: bool) -> bool {
        let marker = self.marker_for(tracked);
        let tracked_meta = fs::metadata(tracked);
        let marker_meta = fs::metadata(&marker);

        match (&tracked_meta, &marker_meta) {
            (Err(_), Err(_)) => return !missing_ok,
            (Err(_), Ok(_)) | (Ok(_), Err(_)) => return true,
            (Ok(_), Ok(_)) => {}
        }

        let tracked_mtime = tracked_meta.and_then(|m| m.modified());
        let marker_mtime = marker_meta.and_then(|m| m.modified());
        match (tracked_mtime, marker_mtime) {
            (Ok(a), Ok(b)) if a == b => false,
            (Ok(a), Ok(_)) => {
                // mtime moved; fall back to a content comparison.
                if files_equal(tracked, &marker) {
                    // Touch without a change: resync the marker quietly.
                    let _ = set_mtime(&marker, a);
                    debug!(
                        "marker resynced for '{}' (touch without content change)",
                        tracked.display()
                    );
                    false
                } else {
                    true
                }
            }
            _ => true,
        }
    }

    /// Record the current content and modification time of `tracked`.
    ///
    /// A missing tracked file leaves the store unchanged.
    pub fn commit(&self, tracked: &Path) -> Result<()> {
        let meta = match fs::metadata(tracked) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        fs::create_dir_all(&self.dir)?;
        let marker = self.marker_for(tracked);
        fs::copy(tracked, &marker).map_err(|e| Error::Marker {
            message: format!("cannot copy '{}': {e}", tracked.display()),
        })?;

        let mtime = meta.modified()?;
        set_mtime(&marker, mtime)?;
        Ok(())
    }

    /// Record a logical list under `name`.
    pub fn record_list(&self, name: &str, items: &[String]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.named(name), items.join("\n"))?;
        Ok(())
    }

    /// Whether the recorded list under `name` differs from `items`.
    /// A missing record counts as changed.
    pub fn list_changed(&self, name: &str, items: &[String]) -> bool {
        match fs::read_to_string(self.named(name)) {
            Ok(stored) => stored.trim() != items.join("\n").trim(),
            Err(_) => true,
        }
    }

    /// Create or refresh an empty sentinel whose mtime records "now".
    pub fn touch_sentinel(&self, name: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.named(name);
        fs::write(&path, b"")?;
        Ok(())
    }

    /// Modification time of a sentinel, if it exists.
    pub fn sentinel_time(&self, name: &str) -> Option<SystemTime> {
        fs::metadata(self.named(name)).and_then(|m| m.modified()).ok()
    }

    /// Remove every marker carrying this store's prefix.
    pub fn clear(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(&self.prefix)
            {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Newest modification time of any file under `dir`, recursively.
pub fn newest_under(dir: &Path) -> Option<SystemTime> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .max()
}

/// Whether any file under `dir` is newer than `instant`.
pub fn any_newer_than(dir: &Path, instant: SystemTime) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .any(|mtime| mtime > instant)
}

fn files_equal(a: &Path, b: &Path) -> bool {
    match (fs::read(a), fs::read(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

fn set_mtime(path: &Path, mtime: SystemTime) -> Result<()> {
    let file = fs::File::options().write(true).open(path)?;
    file.set_modified(mtime)?;
    Ok(())
}
