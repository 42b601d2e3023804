//! Driver for the host `git` binary.
//!
//! The scaffold engine never calls git; this module serves the CLI
//! layer: worktree creation/removal, repository discovery, and branch
//! queries. Everything shells out: there is no in-process git.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Marker error so the CLI can map git failures to their exit code.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GitError(pub String);

/// Marker error for a branch without a worktree.
#[derive(Debug, Error)]
#[error("no worktree found for branch '{0}'")]
pub struct WorktreeNotFound(pub String);

/// One entry from `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    /// Short branch name, or `None` for a detached HEAD.
    pub branch: Option<String>,
}

fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        ))
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn is_git_repository(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// The shared `.git` directory, resolved to an absolute path.
pub fn get_git_common_dir(dir: &Path) -> Result<PathBuf> {
    let out = git(dir, &["rev-parse", "--git-common-dir"])?;
    let path = PathBuf::from(out.trim());
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(dir.join(path))
    }
}

/// The project root: parent of the shared `.git` directory.
pub fn get_project_root(dir: &Path) -> Result<PathBuf> {
    let common = get_git_common_dir(dir)?;
    let root = common
        .parent()
        .context("Failed to determine project root directory")?;
    Ok(root.to_path_buf())
}

pub fn get_current_branch(dir: &Path) -> Result<String> {
    let out = git(dir, &["symbolic-ref", "--short", "HEAD"])
        .context("Could not determine current branch (maybe detached HEAD?)")?;
    let branch = out.trim().to_string();
    if branch.is_empty() {
        return Err(GitError("empty branch name returned".to_string()).into());
    }
    Ok(branch)
}

/// Best-guess default branch: `origin/HEAD` if set, else the first of
/// `main`, `master`, `develop` that exists locally.
pub fn detect_default_branch(dir: &Path) -> Result<String> {
    if let Ok(out) = git(dir, &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"]) {
        if let Some(branch) = out.trim().strip_prefix("origin/") {
            return Ok(branch.to_string());
        }
    }

    for candidate in ["main", "master", "develop"] {
        if branch_exists(dir, candidate)? {
            return Ok(candidate.to_string());
        }
    }

    Ok(crate::config::DEFAULT_BRANCH.to_string())
}

pub fn branch_exists(dir: &Path, branch: &str) -> Result<bool> {
    let status = Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Failed to check branch existence")?;
    Ok(status.success())
}

/// Create a worktree at `path` for `branch`, creating the branch from
/// `base` when it does not exist yet.
pub fn worktree_add(dir: &Path, path: &Path, branch: &str, base: Option<&str>) -> Result<()> {
    let path_str = path.to_string_lossy().into_owned();
    let mut args: Vec<&str> = vec!["worktree", "add"];

    if let Some(base) = base {
        args.extend(["-b", branch, path_str.as_str(), base]);
    } else {
        args.extend([path_str.as_str(), branch]);
    }

    git(dir, &args).map(|_| ())
}

pub fn worktree_remove(dir: &Path, path: &Path, force: bool) -> Result<()> {
    let path_str = path.to_string_lossy().into_owned();
    let mut args: Vec<&str> = vec!["worktree", "remove"];
    if force {
        args.push("--force");
    }
    args.push(path_str.as_str());

    git(dir, &args).map(|_| ())
}

pub fn worktree_list(dir: &Path) -> Result<Vec<WorktreeEntry>> {
    let out = git(dir, &["worktree", "list", "--porcelain"])?;
    Ok(parse_worktree_porcelain(&out))
}

/// Find the worktree checked out on `branch`, if any.
pub fn find_worktree_for_branch(dir: &Path, branch: &str) -> Result<Option<PathBuf>> {
    let entries = worktree_list(dir)?;
    Ok(entries
        .into_iter()
        .find(|e| e.branch.as_deref() == Some(branch))
        .map(|e| e.path))
}

/// Parse `git worktree list --porcelain` output. Entries are separated
/// by blank lines; `worktree` and `branch` attribute lines matter,
/// everything else (`HEAD`, `bare`, `detached`, ...) is skipped.
fn parse_worktree_porcelain(output: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current_path: Option<PathBuf> = None;
    let mut current_branch: Option<String> = None;

    for line in output.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if let Some(path) = current_path.take() {
                entries.push(WorktreeEntry {
                    path,
                    branch: current_branch.take(),
                });
            }
            current_branch = None;
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            current_path = Some(PathBuf::from(path));
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            let short = branch_ref
                .strip_prefix("refs/heads/")
                .unwrap_or(branch_ref);
            current_branch = Some(short.to_string());
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_worktree_porcelain() {
        let output = "\
worktree /projects/shop
HEAD 1234567890abcdef1234567890abcdef12345678
branch refs/heads/main

worktree /worktrees/shop/feature-login
HEAD abcdef1234567890abcdef1234567890abcdef12
branch refs/heads/feature/login

worktree /worktrees/shop/detached-state
HEAD 777777
detached
";
        let entries = parse_worktree_porcelain(output);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].path, PathBuf::from("/projects/shop"));
        assert_eq!(entries[0].branch.as_deref(), Some("main"));
        assert_eq!(entries[1].branch.as_deref(), Some("feature/login"));
        assert_eq!(entries[2].branch, None);
    }

    #[test]
    fn test_parse_worktree_porcelain_empty() {
        assert!(parse_worktree_porcelain("").is_empty());
    }

    #[test]
    fn test_parse_worktree_porcelain_no_trailing_blank() {
        let output = "worktree /p\nbranch refs/heads/x";
        let entries = parse_worktree_porcelain(output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].branch.as_deref(), Some("x"));
    }

    #[test]
    fn test_git_error_display() {
        let err = GitError("worktree add failed".to_string());
        assert_eq!(err.to_string(), "worktree add failed");
    }
}
