//! Project discovery: resolve the repository, its configuration, and
//! the centralized worktree base for the current CLI invocation.

use crate::config::{self, Config};
use crate::git;
use crate::utils::expand_tilde;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker error so the CLI maps config problems to their exit code.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// Environment variable overriding the worktree base directory.
pub const WORKTREE_BASE_ENV: &str = "ARBOR_WORKTREE_BASE";

/// Default worktree base under the user's home.
pub const DEFAULT_WORKTREE_BASE: &str = "~/worktrees";

/// Everything a command needs to know about the project, derived once
/// per invocation and immutable afterwards.
#[derive(Debug)]
pub struct ProjectContext {
    /// Absolute path of the project root (main checkout).
    pub project_path: PathBuf,
    /// Absolute path of the shared `.git` directory.
    pub git_dir: PathBuf,
    /// Directory under which this project's worktrees live.
    pub worktree_base: PathBuf,
    /// Project name (root directory basename).
    pub project_name: String,
    /// Default branch for new worktrees.
    pub default_branch: String,
    /// Resolved project configuration.
    pub config: Config,
}

impl ProjectContext {
    /// Discover the project from the current working directory.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Discover the project from `dir`.
    pub fn discover_from(dir: &Path) -> Result<Self> {
        if !git::is_git_repository(dir) {
            anyhow::bail!("Not inside a Git repository");
        }

        let project_path = git::get_project_root(dir)?;
        let git_dir = git::get_git_common_dir(dir)?;

        let project_name = project_path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Failed to determine project name")?
            .to_string();

        let config = config::load_project(&project_path)
            .map_err(|e| ConfigError(format!("{e:#}")))?;

        let default_branch = if config.default_branch.is_empty() {
            git::detect_default_branch(&project_path)?
        } else {
            config.default_branch.clone()
        };

        let worktree_base = resolve_worktree_base(&project_name);

        Ok(Self {
            project_path,
            git_dir,
            worktree_base,
            project_name,
            default_branch,
            config,
        })
    }

    /// Site name from config, falling back to the project name.
    pub fn site_name(&self) -> &str {
        if self.config.site_name.is_empty() {
            &self.project_name
        } else {
            &self.config.site_name
        }
    }
}

/// The per-project worktree directory: `$ARBOR_WORKTREE_BASE` or
/// `~/worktrees`, with `~` expanded, plus the project name.
fn resolve_worktree_base(project_name: &str) -> PathBuf {
    let base = std::env::var(WORKTREE_BASE_ENV)
        .unwrap_or_else(|_| DEFAULT_WORKTREE_BASE.to_string());
    expand_tilde(&base).join(project_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_worktree_base_default() {
        std::env::remove_var(WORKTREE_BASE_ENV);
        std::env::set_var("HOME", "/home/tester");

        let base = resolve_worktree_base("shop");
        assert_eq!(base, PathBuf::from("/home/tester/worktrees/shop"));
    }

    #[test]
    fn test_resolve_worktree_base_env_override() {
        std::env::set_var(WORKTREE_BASE_ENV, "/srv/worktrees");

        let base = resolve_worktree_base("shop");
        assert_eq!(base, PathBuf::from("/srv/worktrees/shop"));

        std::env::remove_var(WORKTREE_BASE_ENV);
    }

    #[test]
    fn test_discover_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectContext::discover_from(dir.path()).is_err());
    }
}
