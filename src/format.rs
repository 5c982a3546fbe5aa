//! Canonical formatting of variable files.
//!
//! [`format_lines`] rebuilds one scope (the global section or one app's
//! section) of a variable file: an optional comment-block header, the
//! default/template backbone copied verbatim with live values substituted
//! in place, and any user-introduced variables appended under a generated
//! heading. Every key present in either the backbone or the live lines
//! appears exactly once in the output, and re-formatting an already
//! canonical scope is a fixed point modulo header regeneration.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::apps;
use crate::error::Result;
use crate::layout::Layout;

const GLOBAL_VARS_HEADING: &str = "Global Variables";
const DEPRECATED_TAG: &str = " [*DEPRECATED*]";
const DISABLED_TAG: &str = " (Disabled)";
const USER_DEFINED_TAG: &str = " (User Defined)";
const USER_DEFINED_VARS_TAG: &str = " (User Defined Variables)";

/// Width the description header wraps at.
pub const HEADER_WRAP_WIDTH: usize = 75;

/// Format one scope of a variable file.
///
/// - `current_lines`: the live, normalized `KEY=...` lines for this scope.
/// - `default_file`: the backbone to copy verbatim, when one exists.
/// - `app_name`: empty for the global scope, else the owning app.
///
/// The output carries no trailing newline handling; callers join with
/// `"\n"` and terminate the file themselves.
pub fn format_lines(
    layout: &Layout,
    current_lines: &[String],
    default_file: Option<&Path>,
    app_name: &str,
) -> Result<Vec<String>> {
    let app_upper = app_name.to_uppercase();
    let app_is_user_defined = !app_upper.is_empty() && apps::is_user_defined(layout, &app_upper);

    let mut formatted: Vec<String> = Vec::new();

    if !app_upper.is_empty() {
        let nice = apps::nice_name(layout, &app_upper);
        let mut title = nice.clone();
        if app_is_user_defined {
            title.push_str(USER_DEFINED_TAG);
        } else {
            if apps::is_deprecated(layout, &app_upper) {
                title.push_str(DEPRECATED_TAG);
            }
            if !apps::is_enabled(layout, &app_upper) {
                title.push_str(DISABLED_TAG);
            }
        }

        let mut heading = vec![String::new(), title, String::new()];
        heading.extend(word_wrap(
            &apps::description(layout, &app_upper),
            HEADER_WRAP_WIDTH,
        ));
        heading.push(String::new());

        for line in heading {
            formatted.push(format!("### {line}"));
        }
    }

    if let Some(default_file) = default_file {
        if default_file.is_file() {
            let content = fs::read_to_string(default_file)?;
            formatted.extend(
                content
                    .trim_end_matches('\n')
                    .lines()
                    .map(str::to_string),
            );
            if !formatted.is_empty() {
                formatted.push(String::new());
            }
        }
    }

    // Index backbone variable lines by key so live values can overwrite
    // them in place, preserving backbone ordering.
    let var_re = Regex::new(r"^([A-Za-z0-9_]+)=").expect("backbone key regex");
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, line) in formatted.iter().enumerate() {
        if let Some(caps) = var_re.captures(line) {
            index.insert(caps[1].to_string(), i);
        }
    }

    if current_lines.is_empty() {
        formatted.push(String::new());
        return Ok(formatted);
    }

    let mut remaining: Vec<&String> = Vec::new();
    for line in current_lines {
        match line.split_once('=') {
            Some((key, _)) if index.contains_key(key) => {
                formatted[index[key]] = line.clone();
            }
            Some(_) => remaining.push(line),
            None => {}
        }
    }

    if !remaining.is_empty() {
        // A scope that is itself fully user-defined already says so in its
        // header; a second heading would be redundant.
        if app_upper.is_empty() || !app_is_user_defined {
            let title = if app_upper.is_empty() {
                format!("{GLOBAL_VARS_HEADING}{USER_DEFINED_TAG}")
            } else {
                format!("{}{USER_DEFINED_VARS_TAG}", apps::nice_name(layout, &app_upper))
            };
            formatted.push("###".to_string());
            formatted.push(format!("### {title}"));
            formatted.push("###".to_string());
        }

        for line in remaining {
            match line.split_once('=') {
                Some((key, _)) if index.contains_key(key) => {
                    formatted[index[key]] = line.clone();
                }
                Some((key, _)) => {
                    formatted.push(line.clone());
                    index.insert(key.to_string(), formatted.len() - 1);
                }
                None => {}
            }
        }
    }
    formatted.push(String::new());

    Ok(formatted)
}

/// Wrap text at `width` columns, breaking on word boundaries.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
