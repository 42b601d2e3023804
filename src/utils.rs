//! Small path and name helpers shared across commands and the engine.

use std::path::PathBuf;

/// Convert a branch name to a valid directory name by replacing `/`
/// with `-`, so `feature/login` does not create nested directories.
pub fn sanitize_path(name: &str) -> String {
    name.replace('/', "-")
}

/// Normalize a site name for use in database identifiers: lowercase,
/// non-alphanumerics become `_`, runs of `_` collapse, and leading or
/// trailing `_` are trimmed.
pub fn sanitize_site_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;

    for ch in name.chars() {
        let mapped = if ch.is_ascii_alphanumeric() {
            last_underscore = false;
            Some(ch.to_ascii_lowercase())
        } else if last_underscore {
            None
        } else {
            last_underscore = true;
            Some('_')
        };
        if let Some(c) = mapped {
            out.push(c);
        }
    }

    out.trim_matches('_').to_string()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = std::env::var_os("HOME") {
            let rest = rest.trim_start_matches('/');
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
