//! # Error Suggestions
//!
//! Helper functions for generating error messages with hints. Errors
//! should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Unknown application: {}", name);
//!
//! // Use:
//! return Err(suggestions::unknown_app(&name, &builtin));
//! ```

/// Generate an error for an unknown application name.
///
/// Includes a "did you mean" hint when a close built-in match exists, and
/// points at the list command.
pub fn unknown_app(name: &str, builtin: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = builtin.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(&name.to_uppercase(), &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown application: {name}{did_you_mean}\n\n\
         hint: Run 'dockforge list builtin' to see the template catalog\n\
         hint: Instances of a built-in app use the BASE__INSTANCE form (e.g. SONARR__4K)"
    )
}

/// Generate an error for an invalid application name.
pub fn invalid_app_name(name: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "'{name}' is not a valid application name\n\n\
         hint: Names are uppercase, start with a letter, and may carry one __INSTANCE suffix\n\
         hint: Instance suffixes must not collide with variable suffixes like ENABLED or TAG"
    )
}

/// Generate an error for a missing compose directory.
pub fn compose_dir_missing(path: &std::path::Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Compose directory not found: {path}\n\n\
         hint: Run 'dockforge sync' to bootstrap the environment\n\
         hint: Set DOCKFORGE_COMPOSE_DIR or edit dockforge.toml to point elsewhere",
        path = path.display()
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
