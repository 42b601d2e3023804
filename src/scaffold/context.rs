//! Mutable execution context threaded through step execution.
//!
//! The fixed identity fields are plain immutable members; everything
//! steps mutate (`vars`, `env`, `db_suffix`) sits behind one
//! readers-writer lock so a future parallel executor stays safe.
//! Templates never see the lock: they render against an owned snapshot.

use crate::log_warning;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct SharedState {
    env: HashMap<String, String>,
    vars: HashMap<String, String>,
    db_suffix: String,
}

/// Execution context for one scaffold or cleanup run.
#[derive(Debug)]
pub struct ScaffoldContext {
    /// Absolute path of the worktree being scaffolded.
    pub worktree_path: PathBuf,
    /// Branch checked out in the worktree.
    pub branch: String,
    /// Repository name.
    pub repo_name: String,
    /// Project site name from configuration.
    pub site_name: String,
    /// Active preset name (informational).
    pub preset: String,
    /// Basename of the worktree directory.
    pub path: String,
    /// Basename of the worktree's parent directory.
    pub repo_path: String,

    shared: RwLock<SharedState>,
}

impl ScaffoldContext {
    pub fn new(
        worktree_path: impl Into<PathBuf>,
        branch: impl Into<String>,
        repo_name: impl Into<String>,
        site_name: impl Into<String>,
        preset: impl Into<String>,
    ) -> Self {
        let worktree_path = worktree_path.into();
        let path = basename(&worktree_path);
        let repo_path = worktree_path
            .parent()
            .map(basename)
            .unwrap_or_default();

        Self {
            worktree_path,
            branch: branch.into(),
            repo_name: repo_name.into(),
            site_name: site_name.into(),
            preset: preset.into(),
            path,
            repo_path,
            shared: RwLock::new(SharedState::default()),
        }
    }

    /// Store a context variable for later template use.
    pub fn set_var(&self, key: impl Into<String>, value: impl Into<String>) {
        self.shared
            .write()
            .expect("scaffold context lock poisoned")
            .vars
            .insert(key.into(), value.into());
    }

    /// Read back a context variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.shared
            .read()
            .expect("scaffold context lock poisoned")
            .vars
            .get(key)
            .cloned()
    }

    /// Store a context environment entry (reserved for future steps).
    pub fn set_env(&self, key: impl Into<String>, value: impl Into<String>) {
        self.shared
            .write()
            .expect("scaffold context lock poisoned")
            .env
            .insert(key.into(), value.into());
    }

    pub fn get_env(&self, key: &str) -> Option<String> {
        self.shared
            .read()
            .expect("scaffold context lock poisoned")
            .env
            .get(key)
            .cloned()
    }

    /// Set the database suffix for this invocation.
    ///
    /// The first non-empty value wins: later non-empty writes are
    /// rejected with a warning so every database created in one run
    /// shares the same suffix. Empty writes are no-ops. Returns the
    /// suffix in effect afterwards.
    pub fn set_db_suffix(&self, value: impl Into<String>) -> String {
        let value = value.into();
        let mut shared = self
            .shared
            .write()
            .expect("scaffold context lock poisoned");

        if value.is_empty() {
            return shared.db_suffix.clone();
        }
        if !shared.db_suffix.is_empty() {
            if shared.db_suffix != value {
                log_warning!(
                    "db suffix already set to '{}'; ignoring '{}'",
                    shared.db_suffix,
                    value
                );
            }
            return shared.db_suffix.clone();
        }

        shared.db_suffix = value.clone();
        value
    }

    /// Forcibly replace the suffix. Only the db.create retry path may
    /// use this, and only for a suffix it generated itself.
    pub(crate) fn reset_db_suffix(&self, value: impl Into<String>) {
        self.shared
            .write()
            .expect("scaffold context lock poisoned")
            .db_suffix = value.into();
    }

    pub fn get_db_suffix(&self) -> String {
        self.shared
            .read()
            .expect("scaffold context lock poisoned")
            .db_suffix
            .clone()
    }

    /// Owned, point-in-time mapping of the template-visible context:
    /// the built-ins merged with `vars`, read under one lock hold.
    pub fn snapshot_for_template(&self) -> HashMap<String, String> {
        let shared = self
            .shared
            .read()
            .expect("scaffold context lock poisoned");

        let mut snapshot = HashMap::with_capacity(shared.vars.len() + 6);
        snapshot.insert("Path".to_string(), self.path.clone());
        snapshot.insert("RepoPath".to_string(), self.repo_path.clone());
        snapshot.insert("RepoName".to_string(), self.repo_name.clone());
        snapshot.insert("SiteName".to_string(), self.site_name.clone());
        snapshot.insert("Branch".to_string(), self.branch.clone());
        snapshot.insert("DbSuffix".to_string(), shared.db_suffix.clone());

        for (k, v) in &shared.vars {
            snapshot.insert(k.clone(), v.clone());
        }

        snapshot
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}
