//! Worktree-local ephemeral state (`.arbor.local`).
//!
//! The file lives inside a worktree, is never committed, and currently
//! defines a single key: `db_suffix`. Unknown keys are preserved on
//! write so future state survives older binaries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Local state file name inside a worktree.
pub const LOCAL_STATE_FILE: &str = ".arbor.local";

/// Worktree-local state.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LocalState {
    pub db_suffix: String,
}

/// Read local state from `.arbor.local`. A missing file is an empty
/// state; a malformed file is an error.
pub fn read_local_state(worktree_path: &Path) -> Result<LocalState> {
    let state_path = worktree_path.join(LOCAL_STATE_FILE);

    let content = match fs::read_to_string(&state_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LocalState::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", state_path.display()));
        }
    };

    if content.trim().is_empty() {
        return Ok(LocalState::default());
    }

    serde_yaml::from_str(&content).with_context(|| format!("parsing {}", state_path.display()))
}

/// Write local state to `.arbor.local`, merging with any pre-existing
/// keys and atomically replacing the file.
pub fn write_local_state(worktree_path: &Path, state: &LocalState) -> Result<()> {
    let state_path = worktree_path.join(LOCAL_STATE_FILE);

    let mut existing: Mapping = match fs::read_to_string(&state_path) {
        Ok(content) if !content.trim().is_empty() => serde_yaml::from_str(&content)
            .with_context(|| format!("parsing existing {}", state_path.display()))?,
        _ => Mapping::new(),
    };

    if !state.db_suffix.is_empty() {
        existing.insert(
            Value::String("db_suffix".to_string()),
            Value::String(state.db_suffix.clone()),
        );
    }

    let content =
        serde_yaml::to_string(&Value::Mapping(existing)).context("serializing local state")?;

    atomic_write(&state_path, content.as_bytes())
        .with_context(|| format!("writing {}", state_path.display()))
}

/// Migrate a legacy `db_suffix` key out of `arbor.yaml` into
/// `.arbor.local`. Idempotent: a no-op when `arbor.yaml` is absent or
/// carries no suffix. Returns whether a migration happened.
pub fn migrate_db_suffix(worktree_path: &Path) -> Result<bool> {
    let config_path = worktree_path.join(crate::config::PROJECT_CONFIG_FILE);

    let content = match fs::read_to_string(&config_path) {
        Ok(c) if !c.trim().is_empty() => c,
        _ => return Ok(false),
    };

    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    let suffix = match value.get("db_suffix").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => return Ok(false),
    };

    write_local_state(
        worktree_path,
        &LocalState {
            db_suffix: suffix,
        },
    )?;

    // Drop the top-level key line-by-line so comments and ordering in
    // the rest of the file survive.
    let remaining: Vec<&str> = content
        .split('\n')
        .filter(|line| !line.starts_with("db_suffix:"))
        .collect();
    fs::write(&config_path, remaining.join("\n"))
        .with_context(|| format!("writing {}", config_path.display()))?;

    Ok(true)
}

/// Write `bytes` through a uniquely-named sibling temp file and rename.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("state");
    let tmp_path = dir.join(format!(".{base}.{}.tmp", std::process::id()));

    fs::write(&tmp_path, bytes).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        e
    })?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        e
    })
}
