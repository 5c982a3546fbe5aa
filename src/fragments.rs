//! Manifest fragment selection and assembly.
//!
//! For each enabled application, in sorted application-name order, selects
//! the ordered list of manifest fragment files to hand to the external
//! merge command. Ordering within one application is significant — later
//! fragments override or extend earlier ones in the merge — and is fixed:
//!
//! ```text
//! arch base -> hostname/ports (bridge) | netmode -> storage slots
//!           -> devices -> main
//! ```
//!
//! A missing architecture or main fragment for an enabled application is
//! fatal; the optional fragments are logged and skipped.

use std::path::PathBuf;
use std::process::Command;

use log::{debug, info, warn};

use crate::apps;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::template;
use crate::vars;

/// Storage slot suffixes; slot 1 has no number.
const STORAGE_SLOTS: &[&str] = &["", "2", "3", "4"];

/// Environment variable overriding the external merge command (tests).
pub const MERGE_CMD_ENV: &str = "DOCKFORGE_MERGE_CMD";

/// Build the ordered fragment list for all `enabled` applications.
pub fn select(layout: &Layout, enabled: &[String]) -> Result<Vec<PathBuf>> {
    let env_file = layout.env_file();
    let mut sorted: Vec<&String> = enabled.iter().collect();
    sorted.sort();

    let mut fragments = Vec::new();
    for app_name in sorted {
        select_for_app(layout, app_name, &mut fragments)?;
        info!(
            "All configurations for '{}' are included.",
            apps::nice_name(layout, app_name)
        );
    }
    debug!(
        "selected {} fragments from '{}'",
        fragments.len(),
        env_file.display()
    );
    Ok(fragments)
}

fn select_for_app(layout: &Layout, app_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let env_file = layout.env_file();

    // Architecture base fragment is mandatory.
    let arch_pattern = format!("*.{}.yml", layout.arch);
    out.push(mandatory(layout, app_name, &arch_pattern)?);

    // Bridge (or unset) networking takes the hostname and ports fragments;
    // any other mode takes the netmode fragment.
    let net_mode = vars::get(&format!("{app_name}__NETWORK_MODE"), &env_file)?;
    if net_mode.is_empty() || net_mode == "bridge" {
        push_optional(layout, app_name, "*.hostname.yml", out)?;
        push_optional(layout, app_name, "*.ports.yml", out)?;
    } else {
        push_optional(layout, app_name, "*.netmode.yml", out)?;
    }

    // Storage slots. Slots 2-4 are gated by the multiple-storage flag; the
    // app-specific on-flag overrides the global one; an empty volume path
    // disables the slot.
    let multiple_storage = apps::is_true(&vars::get("DOCKER_MULTIPLE_STORAGE", &env_file)?);
    for slot in STORAGE_SLOTS {
        if !slot.is_empty() && !multiple_storage {
            continue;
        }
        let mut on = vars::get(&format!("{app_name}__STORAGE{slot}_ON"), &env_file)?;
        if on.is_empty() {
            on = vars::get(&format!("DOCKER_STORAGE{slot}_ON"), &env_file)?;
        }
        if !apps::is_true(&on) {
            continue;
        }
        let volume = vars::get(&format!("DOCKER_VOLUME_STORAGE{slot}"), &env_file)?;
        if volume.is_empty() {
            continue;
        }
        push_optional(layout, app_name, &format!("*.storage{slot}.yml"), out)?;
    }

    // Devices fragment.
    if apps::is_true(&vars::get(&format!("{app_name}__DEVICES"), &env_file)?) {
        push_optional(layout, app_name, "*.devices.yml", out)?;
    }

    // Main fragment always comes last and is mandatory.
    out.push(mandatory(layout, app_name, "*.yml")?);
    Ok(())
}

fn mandatory(layout: &Layout, app_name: &str, pattern: &str) -> Result<PathBuf> {
    match template::instance_file(layout, app_name, pattern)? {
        Some(path) if path.is_file() => Ok(path),
        _ => {
            let expected = layout
                .instance_dir(app_name)
                .join(pattern.replace('*', &app_name.to_lowercase()));
            Err(Error::FragmentMissing { path: expected })
        }
    }
}

fn push_optional(
    layout: &Layout,
    app_name: &str,
    pattern: &str,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    match template::instance_file(layout, app_name, pattern)? {
        Some(path) if path.is_file() => out.push(path),
        _ => debug!("no {pattern} fragment for {app_name}, skipping"),
    }
    Ok(())
}

/// Hand the ordered fragment list to the external merge command and return
/// the synthesized manifest text.
///
/// The default command is `docker compose config` with the fragment paths
/// joined into `COMPOSE_FILE`. `DOCKFORGE_MERGE_CMD` overrides it with a
/// program that receives the fragment paths as arguments.
pub fn merge(layout: &Layout, fragments: &[PathBuf]) -> Result<String> {
    let output = match std::env::var(MERGE_CMD_ENV) {
        Ok(cmdline) if !cmdline.is_empty() => {
            let mut parts = cmdline.split_whitespace();
            let program = parts.next().ok_or_else(|| Error::MergeCommand {
                message: format!("{MERGE_CMD_ENV} is empty"),
            })?;
            Command::new(program)
                .args(parts)
                .args(fragments)
                .output()
                .map_err(|e| Error::MergeCommand {
                    message: format!("cannot run '{program}': {e}"),
                })?
        }
        _ => {
            let joined = std::env::join_paths(fragments)
                .map_err(|e| Error::MergeCommand {
                    message: format!("cannot join fragment paths: {e}"),
                })?;
            Command::new("docker")
                .args(["compose", "--project-directory"])
                .arg(&layout.compose_dir)
                .arg("config")
                .env("COMPOSE_FILE", joined)
                .output()
                .map_err(|e| Error::MergeCommand {
                    message: format!("cannot run 'docker compose config': {e}"),
                })?
        }
    };

    if !output.status.success() {
        warn!("manifest merge stderr: {}", String::from_utf8_lossy(&output.stderr));
        return Err(Error::MergeCommand {
            message: format!("merge command exited with {}", output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout_with_fragments(files: &[&str]) -> (TempDir, Layout) {
        let temp = TempDir::new().unwrap();
        let mut layout = Layout::rooted_at(temp.path());
        layout.arch = "x86_64".to_string();
        let dir = layout.template_dir("sonarr");
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), format!("# {file}\n")).unwrap();
        }
        fs::create_dir_all(&layout.compose_dir).unwrap();
        (temp, layout)
    }

    fn names(fragments: &[PathBuf]) -> Vec<String> {
        fragments
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_bridge_order_is_arch_hostname_ports_main() {
        let (_temp, layout) = layout_with_fragments(&[
            "sonarr.yml",
            "sonarr.x86_64.yml",
            "sonarr.hostname.yml",
            "sonarr.ports.yml",
        ]);

        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(
            names(&fragments),
            vec![
                "sonarr.x86_64.yml",
                "sonarr.hostname.yml",
                "sonarr.ports.yml",
                "sonarr.yml",
            ]
        );
    }

    #[test]
    fn test_missing_optional_fragments_are_skipped() {
        let (_temp, layout) = layout_with_fragments(&["sonarr.yml", "sonarr.x86_64.yml"]);

        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(names(&fragments), vec!["sonarr.x86_64.yml", "sonarr.yml"]);
    }

    #[test]
    fn test_missing_arch_fragment_is_fatal() {
        let (_temp, layout) = layout_with_fragments(&["sonarr.yml"]);

        let err = select(&layout, &["SONARR".to_string()]).unwrap_err();
        assert!(matches!(err, Error::FragmentMissing { path } if path
            .to_string_lossy()
            .contains("sonarr.x86_64.yml")));
    }

    #[test]
    fn test_missing_main_fragment_is_fatal() {
        let (_temp, layout) = layout_with_fragments(&["sonarr.x86_64.yml"]);

        let err = select(&layout, &["SONARR".to_string()]).unwrap_err();
        assert!(matches!(err, Error::FragmentMissing { path } if path
            .to_string_lossy()
            .ends_with("sonarr.yml")));
    }

    #[test]
    fn test_host_netmode_takes_netmode_fragment() {
        let (_temp, layout) = layout_with_fragments(&[
            "sonarr.yml",
            "sonarr.x86_64.yml",
            "sonarr.hostname.yml",
            "sonarr.ports.yml",
            "sonarr.netmode.yml",
        ]);
        vars::set("SONARR__NETWORK_MODE", "host", &layout.env_file()).unwrap();

        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(
            names(&fragments),
            vec!["sonarr.x86_64.yml", "sonarr.netmode.yml", "sonarr.yml"]
        );
    }

    #[test]
    fn test_storage_slots_gated_by_flags() {
        let (_temp, layout) = layout_with_fragments(&[
            "sonarr.yml",
            "sonarr.x86_64.yml",
            "sonarr.storage.yml",
            "sonarr.storage2.yml",
        ]);
        let env = layout.env_file();
        vars::set("DOCKER_STORAGE_ON", "true", &env).unwrap();
        vars::set("DOCKER_VOLUME_STORAGE", "/mnt/storage", &env).unwrap();
        vars::set("DOCKER_STORAGE2_ON", "true", &env).unwrap();
        vars::set("DOCKER_VOLUME_STORAGE2", "/mnt/storage2", &env).unwrap();

        // Slot 2 stays off until multiple storage is enabled.
        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(
            names(&fragments),
            vec!["sonarr.x86_64.yml", "sonarr.storage.yml", "sonarr.yml"]
        );

        vars::set("DOCKER_MULTIPLE_STORAGE", "true", &env).unwrap();
        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(
            names(&fragments),
            vec![
                "sonarr.x86_64.yml",
                "sonarr.storage.yml",
                "sonarr.storage2.yml",
                "sonarr.yml",
            ]
        );
    }

    #[test]
    fn test_app_storage_flag_overrides_global() {
        let (_temp, layout) =
            layout_with_fragments(&["sonarr.yml", "sonarr.x86_64.yml", "sonarr.storage.yml"]);
        let env = layout.env_file();
        vars::set("DOCKER_STORAGE_ON", "true", &env).unwrap();
        vars::set("DOCKER_VOLUME_STORAGE", "/mnt/storage", &env).unwrap();
        vars::set("SONARR__STORAGE_ON", "false", &env).unwrap();

        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(names(&fragments), vec!["sonarr.x86_64.yml", "sonarr.yml"]);
    }

    #[test]
    fn test_devices_fragment() {
        let (_temp, layout) =
            layout_with_fragments(&["sonarr.yml", "sonarr.x86_64.yml", "sonarr.devices.yml"]);
        vars::set("SONARR__DEVICES", "true", &layout.env_file()).unwrap();

        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();
        assert_eq!(
            names(&fragments),
            vec!["sonarr.x86_64.yml", "sonarr.devices.yml", "sonarr.yml"]
        );
    }

    #[test]
    fn test_apps_are_processed_in_sorted_order() {
        let (_temp, layout) = layout_with_fragments(&["sonarr.yml", "sonarr.x86_64.yml"]);
        let radarr = layout.template_dir("radarr");
        fs::create_dir_all(&radarr).unwrap();
        fs::write(radarr.join("radarr.yml"), "# main\n").unwrap();
        fs::write(radarr.join("radarr.x86_64.yml"), "# arch\n").unwrap();

        let fragments = select(
            &layout,
            &["SONARR".to_string(), "RADARR".to_string()],
        )
        .unwrap();
        assert_eq!(
            names(&fragments),
            vec![
                "radarr.x86_64.yml",
                "radarr.yml",
                "sonarr.x86_64.yml",
                "sonarr.yml",
            ]
        );
    }

    #[test]
    #[serial_test::serial(merge_cmd)]
    fn test_merge_with_override_command() {
        let (_temp, layout) = layout_with_fragments(&["sonarr.yml", "sonarr.x86_64.yml"]);
        let fragments = select(&layout, &["SONARR".to_string()]).unwrap();

        std::env::set_var(MERGE_CMD_ENV, "cat");
        let merged = merge(&layout, &fragments).unwrap();
        std::env::remove_var(MERGE_CMD_ENV);

        assert!(merged.contains("# sonarr.x86_64.yml"));
        assert!(merged.contains("# sonarr.yml"));
    }
}
