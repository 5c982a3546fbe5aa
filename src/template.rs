//! Instance templater.
//!
//! Materializes per-application-instance copies of template files,
//! substituting the `<__INSTANCE>`, `<__Instance>`, and `<__instance>`
//! placeholders, and keeps a verbatim `.original` snapshot of the template
//! bytes each instance file was produced from.
//!
//! The snapshot is the single source of truth for whether an instance file
//! is current: an instance file is current iff its snapshot is
//! byte-identical to the live template. Any mismatch (including template
//! deletion) triggers re-materialization or removal. Callers get the
//! guarantee that after [`instance_file`] returns a path, the snapshot
//! matches the template that produced it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::naming;

/// Extension appended to an instance file to name its template snapshot.
pub const SNAPSHOT_EXT: &str = "original";

/// Resolve (and materialize, when needed) an instance file for `app_name`.
///
/// `file_pattern` names a template file relative to the app's template
/// directory, with `*` standing for the lower-cased base name on the
/// template side and the lower-cased full app name on the instance side
/// (`"*.ports.yml"`, `"*.labels.yml"`, `".env"`, `".env.app.*"`).
///
/// Returns `Ok(None)` — not an error — when the template directory or the
/// specific template file does not exist; any previously materialized
/// instance artifacts for that case are removed, modelling template
/// removal or rename. When the stored snapshot matches the live template
/// the existing instance path is returned with zero writes.
pub fn instance_file(layout: &Layout, app_name: &str, file_pattern: &str) -> Result<Option<PathBuf>> {
    let base = naming::base_name(app_name).to_lowercase();
    let app_lower = app_name.to_lowercase();
    let instance = naming::instance_name(app_name);

    let template_dir = layout.template_dir(&base);
    let template_path = template_dir.join(file_pattern.replace('*', &base));

    let instance_dir = layout.instance_dir(app_name);
    let instance_path = instance_dir.join(file_pattern.replace('*', &app_lower));
    let snapshot_path = snapshot_path_for(&instance_path);

    if !template_dir.is_dir() {
        // Template directory gone: the whole instance folder is stale.
        remove_dir_if_present(&instance_dir)?;
        return Ok(None);
    }

    let template_bytes = match fs::read(&template_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // This one template file gone: drop its instance artifacts.
            remove_file_if_present(&instance_path)?;
            remove_file_if_present(&snapshot_path)?;
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::template(
                app_name,
                format!("cannot read template '{}': {e}", template_path.display()),
            ))
        }
    };

    if instance_path.is_file() {
        if let Ok(snapshot) = fs::read(&snapshot_path) {
            if snapshot == template_bytes {
                return Ok(Some(instance_path));
            }
        }
    }

    debug!(
        "materializing instance file '{}' from '{}'",
        instance_path.display(),
        template_path.display()
    );

    fs::create_dir_all(&instance_dir)?;

    let content = substitute_placeholders(
        &String::from_utf8_lossy(&template_bytes),
        instance.unwrap_or(""),
    );
    fs::write(&instance_path, content)?;
    fs::write(&snapshot_path, &template_bytes)?;

    Ok(Some(instance_path))
}

/// Remove every materialized artifact for an application instance.
pub fn remove_instance(layout: &Layout, app_name: &str) -> Result<()> {
    remove_dir_if_present(&layout.instance_dir(app_name))
}

/// Path of the snapshot paired with an instance file.
pub fn snapshot_path_for(instance_path: &Path) -> PathBuf {
    let mut name = instance_path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(SNAPSHOT_EXT);
    instance_path.with_file_name(name)
}

/// Substitute the three placeholder forms with the instance name.
///
/// For base (non-instanced) applications every placeholder erases to the
/// empty string; otherwise `<__INSTANCE>` becomes `__NAME`, `<__Instance>`
/// becomes `__Name`, and `<__instance>` becomes `__name`.
fn substitute_placeholders(content: &str, instance: &str) -> String {
    let (upper, title, lower) = if instance.is_empty() {
        (String::new(), String::new(), String::new())
    } else {
        (
            format!("__{}", instance.to_uppercase()),
            format!("__{}", naming::title_case(instance)),
            format!("__{}", instance.to_lowercase()),
        )
    };

    content
        .replace("<__INSTANCE>", &upper)
        .replace("<__Instance>", &title)
        .replace("<__instance>", &lower)
}

fn remove_file_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout_with_template(content: &str) -> (TempDir, Layout) {
        let temp = TempDir::new().unwrap();
        let layout = Layout::rooted_at(temp.path());
        let dir = layout.template_dir("sonarr");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sonarr.ports.yml"), content).unwrap();
        (temp, layout)
    }

    #[test]
    fn test_instantiates_base_app_erases_placeholders() {
        let (_temp, layout) = layout_with_template("name: sonarr<__instance>\n");

        let path = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "name: sonarr\n");
        assert!(snapshot_path_for(&path).is_file());
    }

    #[test]
    fn test_instantiates_instance_substitutes_three_forms() {
        let (_temp, layout) =
            layout_with_template("a: x<__INSTANCE>\nb: x<__Instance>\nc: x<__instance>\n");

        let path = instance_file(&layout, "SONARR__4K", "*.ports.yml")
            .unwrap()
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a: x__4K\nb: x__4k\nc: x__4k\n");
        // The instance file lands under the instance (not base) directory.
        assert!(path.starts_with(layout.instance_dir("SONARR__4K")));
    }

    #[test]
    fn test_unchanged_template_performs_zero_writes() {
        let (_temp, layout) = layout_with_template("name: sonarr\n");

        let first = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        let before = fs::metadata(&first).unwrap().modified().unwrap();

        let second = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        let after = fs::metadata(&second).unwrap().modified().unwrap();

        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[test]
    fn test_changed_template_rematerializes() {
        let (_temp, layout) = layout_with_template("v: 1\n");

        let path = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v: 1\n");

        fs::write(
            layout.template_dir("sonarr").join("sonarr.ports.yml"),
            "v: 2\n",
        )
        .unwrap();

        let path = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v: 2\n");
        assert_eq!(
            fs::read_to_string(snapshot_path_for(&path)).unwrap(),
            "v: 2\n"
        );
    }

    #[test]
    fn test_deleted_template_file_removes_instance_artifacts() {
        let (_temp, layout) = layout_with_template("v: 1\n");

        let path = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        let snapshot = snapshot_path_for(&path);
        assert!(path.is_file() && snapshot.is_file());

        fs::remove_file(layout.template_dir("sonarr").join("sonarr.ports.yml")).unwrap();

        let result = instance_file(&layout, "SONARR", "*.ports.yml").unwrap();
        assert!(result.is_none());
        assert!(!path.exists());
        assert!(!snapshot.exists());
    }

    #[test]
    fn test_deleted_template_dir_removes_instance_dir() {
        let (_temp, layout) = layout_with_template("v: 1\n");

        instance_file(&layout, "SONARR", "*.ports.yml").unwrap();
        assert!(layout.instance_dir("SONARR").is_dir());

        fs::remove_dir_all(layout.template_dir("sonarr")).unwrap();

        let result = instance_file(&layout, "SONARR", "*.ports.yml").unwrap();
        assert!(result.is_none());
        assert!(!layout.instance_dir("SONARR").exists());
    }

    #[test]
    fn test_missing_snapshot_forces_rematerialization() {
        let (_temp, layout) = layout_with_template("v: 1\n");

        let path = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        fs::remove_file(snapshot_path_for(&path)).unwrap();

        let path = instance_file(&layout, "SONARR", "*.ports.yml")
            .unwrap()
            .unwrap();
        // Snapshot was rewritten from the live template.
        assert_eq!(
            fs::read_to_string(snapshot_path_for(&path)).unwrap(),
            "v: 1\n"
        );
    }

    #[test]
    fn test_dotfile_pattern_maps_names() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::rooted_at(temp.path());
        let dir = layout.template_dir("sonarr");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".env.app.sonarr"), "SONARR__PORT_8989='8989'\n").unwrap();

        let path = instance_file(&layout, "SONARR__4K", ".env.app.*")
            .unwrap()
            .unwrap();
        assert!(path.ends_with("sonarr__4k/.env.app.sonarr__4k"));
    }
}
