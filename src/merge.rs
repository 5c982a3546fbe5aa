//! Merge-new-only engine for variable files.
//!
//! Copies variables that exist in a template-derived source file but not in
//! a live target file. Additive and idempotent: existing target lines are
//! never rewritten or reordered, and a second run with unchanged inputs is
//! a no-op because every source key already exists in the target.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};
use regex::Regex;

use crate::error::Result;
use crate::vars;

/// Merge variables from `source` into `target`, adding only new keys.
///
/// - A missing source is a no-op (warn, not an error).
/// - A missing target is created empty first.
/// - Source lines are appended verbatim, after a single newline separator
///   when the target is non-empty (a blank line when the target already
///   ends with one).
/// - Duplicates inside the source are deduplicated against the evolving
///   key set, not just the on-disk target.
///
/// Returns the keys that were added, in source order.
pub fn merge_new_only(target: &Path, source: &Path) -> Result<Vec<String>> {
    let source_content = match fs::read_to_string(source) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("File '{}' does not exist.", source.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    merge_new_only_content(target, &source_content)
}

/// [`merge_new_only`] with the source supplied as in-memory content.
pub fn merge_new_only_content(target: &Path, source_content: &str) -> Result<Vec<String>> {
    if !target.exists() {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, b"")?;
    }

    let mut known_keys: std::collections::BTreeSet<String> =
        vars::list(target)?.into_keys().collect();

    let re = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)=").expect("variable line regex");

    let mut new_lines = Vec::new();
    let mut added = Vec::new();
    for line in source_content.lines() {
        if let Some(caps) = re.captures(line) {
            let key = caps[1].to_string();
            if known_keys.insert(key.clone()) {
                new_lines.push(line.to_string());
                added.push(key);
            }
        }
    }

    if new_lines.is_empty() {
        return Ok(added);
    }

    info!("Adding variables to '{}':", target.display());
    for line in &new_lines {
        info!("   {line}");
    }

    let mut content = fs::read_to_string(target)?;
    if !content.is_empty() {
        // One newline: terminates an unterminated last line, or opens a
        // blank separator line otherwise.
        content.push('\n');
    }
    for line in &new_lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(target, content)?;

    Ok(added)
}
