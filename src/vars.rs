//! Flat `KEY=VALUE` variable store.
//!
//! Reads and writes newline-separated variable files (`.env` and friends),
//! preserving everything it does not understand. Parsing is permissive: a
//! line is a variable iff it matches `^\s*[A-Za-z_][A-Za-z0-9_]*=`; anything
//! else passes through untouched wherever file content is copied verbatim.
//!
//! Value extraction honors a single matching leading/trailing quote
//! (greedy to the *last* occurrence of that quote character), otherwise
//! reads up to the first unquoted `" #"` sequence, otherwise to end of line
//! trimmed of trailing whitespace.
//!
//! A missing file behaves as an empty store for reads; writes create parent
//! directories as needed.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use regex::Regex;

use crate::error::Result;

/// Regex matching a variable definition line for `key`, anchored at start.
fn key_line_re(key: &str) -> Regex {
    Regex::new(&format!(r"^\s*{}\s*=", regex::escape(key))).expect("escaped key regex")
}

fn any_var_re() -> Regex {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=(.*)$").expect("variable line regex")
}

/// Read a file as lines, treating a missing file as empty.
pub fn read_lines(file: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(file) {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_lines(lines: &[String], file: &Path) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(file, content)?;
    Ok(())
}

/// Return the full definition line for `key`, if present.
pub fn get_line(key: &str, file: &Path) -> Result<Option<String>> {
    let re = key_line_re(key);
    Ok(read_lines(file)?.into_iter().find(|l| re.is_match(l)))
}

/// Return the raw right-hand side of the definition (everything after the
/// first `=`), or an empty string when the variable is absent.
pub fn get_literal(key: &str, file: &Path) -> Result<String> {
    match get_line(key, file)? {
        Some(line) => Ok(line
            .split_once('=')
            .map(|(_, rhs)| rhs.to_string())
            .unwrap_or_default()),
        None => Ok(String::new()),
    }
}

/// Return the parsed value of `key`, or an empty string when absent.
pub fn get(key: &str, file: &Path) -> Result<String> {
    Ok(parse_value(&get_literal(key, file)?))
}

/// Parse a raw right-hand side into a value.
///
/// Quote handling is greedy: a leading `'` or `"` pairs with the *last*
/// occurrence of the same character. Unquoted values end at the first
/// `" #"` (space then hash) or at end of line, trailing whitespace trimmed.
pub fn parse_value(raw: &str) -> String {
    let val = raw.trim_start_matches([' ', '\t']);

    if val.len() >= 2 {
        let quote = val.as_bytes()[0];
        if quote == b'"' || quote == b'\'' {
            if let Some(last) = val.rfind(quote as char) {
                if last > 0 {
                    return val[1..last].to_string();
                }
            }
        }
    }

    if let Some(idx) = val.find(" #") {
        return val[..idx].trim_end_matches([' ', '\t']).to_string();
    }
    val.trim_end_matches([' ', '\t']).to_string()
}

/// Whether `key` is defined in `file`.
pub fn exists(key: &str, file: &Path) -> Result<bool> {
    Ok(get_line(key, file)?.is_some())
}

/// Set `key` to `value`, single-quoting the value.
///
/// Embedded single quotes are escaped the shell way (`'"'"'`) so the file
/// stays sourceable.
pub fn set(key: &str, value: &str, file: &Path) -> Result<()> {
    let escaped = value.replace('\'', r#"'"'"'"#);
    set_line(key, &format!("{key}='{escaped}'"), file)
}

/// Set `key` to the raw `literal`, written verbatim after the `=`.
pub fn set_literal(key: &str, literal: &str, file: &Path) -> Result<()> {
    set_line(key, &format!("{key}={literal}"), file)
}

/// Replace the first definition of `key` with `new_line`, drop any
/// duplicate definitions, and append when absent. All other lines are
/// preserved verbatim and in order.
fn set_line(key: &str, new_line: &str, file: &Path) -> Result<()> {
    let re = key_line_re(key);
    let mut lines = Vec::new();
    let mut found = false;

    for line in read_lines(file)? {
        if re.is_match(&line) {
            if !found {
                lines.push(new_line.to_string());
                found = true;
            }
            // Drop later occurrences so the key stays unique.
        } else {
            lines.push(line);
        }
    }

    if !found {
        lines.push(new_line.to_string());
    }

    write_lines(&lines, file)
}

/// Remove every definition of `key` from `file`. A no-op when absent.
pub fn unset(key: &str, file: &Path) -> Result<()> {
    let re = key_line_re(key);
    let lines = read_lines(file)?;
    let kept: Vec<String> = lines.iter().filter(|l| !re.is_match(l)).cloned().collect();

    if kept.len() != lines.len() {
        write_lines(&kept, file)?;
    }
    Ok(())
}

/// Map every defined key to its parsed value.
///
/// Later duplicate definitions win, matching what a shell sourcing the file
/// would see. Insertion order is not part of the contract.
pub fn list(file: &Path) -> Result<BTreeMap<String, String>> {
    let re = any_var_re();
    let mut vars = BTreeMap::new();
    for line in read_lines(file)? {
        if let Some(caps) = re.captures(&line) {
            vars.insert(caps[1].to_string(), parse_value(&caps[2]));
        }
    }
    Ok(vars)
}

/// Normalized variable lines (`KEY=<rest verbatim>`) from a file.
///
/// Whitespace around the key is dropped; the right-hand side is preserved
/// exactly, comments included. Non-variable lines are skipped.
pub fn var_lines(file: &Path) -> Result<Vec<String>> {
    let re = any_var_re();
    let mut lines = Vec::new();
    for line in read_lines(file)? {
        if let Some(caps) = re.captures(&line) {
            lines.push(format!("{}={}", &caps[1], &caps[2]));
        }
    }
    Ok(lines)
}

/// Expand `${KEY}` and `${KEY?}` references against `vars`, repeating until
/// a fixpoint or a bounded number of passes.
pub fn expand(s: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = s.to_string();
    for _ in 0..10 {
        let mut changed = false;
        for (key, val) in vars {
            for pattern in [format!("${{{key}?}}"), format!("${{{key}}}")] {
                if out.contains(&pattern) {
                    out = out.replace(&pattern, val);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    out
}

/// Replace literal occurrences of variable *values* with `${KEY?}`
/// references.
///
/// Longer values are substituted first so that a specific path contracts
/// before its parent (`DOCKER_CONFIG_FOLDER` before `HOME`); ties break on
/// key order for determinism.
pub fn contract(s: &str, vars: &BTreeMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = vars.iter().filter(|(_, v)| !v.is_empty()).collect();
    pairs.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    let mut out = s.to_string();
    for (key, val) in pairs {
        out = out.replace(val.as_str(), &format!("${{{key}?}}"));
    }
    out
}
