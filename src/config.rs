//! Project configuration (`arbor.yaml`) structures and persistence.
//!
//! Reads use serde; unknown keys are accepted silently so configs can
//! carry forward-compatible fields. Writes never re-marshal the whole
//! document: `save_project` edits the owned scalar keys line-by-line so
//! comments, unknown keys, and ordering survive untouched.

use crate::scaffold::condition::ConditionMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "arbor.yaml";

/// Process exit codes, kept in one place so the CLI and tests agree.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const WORKTREE_NOT_FOUND: i32 = 3;
    pub const GIT_OPERATION_FAILED: i32 = 4;
    pub const CONFIGURATION_ERROR: i32 = 5;
    pub const SCAFFOLD_STEP_FAILED: i32 = 6;
}

/// Fallback default branch when neither config nor git knows better.
pub const DEFAULT_BRANCH: &str = "main";

/// The project configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Human-friendly project name used in database names and templates.
    pub site_name: String,

    /// Preset name; empty means detect from the worktree contents.
    pub preset: String,

    /// Default branch for new worktrees.
    pub default_branch: String,

    /// Scaffold pipeline configuration.
    pub scaffold: ScaffoldConfig,

    /// Cleanup pipeline configuration.
    pub cleanup: CleanupConfig,

    /// Tool-specific configuration.
    pub tools: HashMap<String, ToolConfig>,

    /// Sync configuration (reserved for the sync command).
    pub sync: SyncConfig,
}

/// Scaffold pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScaffoldConfig {
    /// Checks that must all pass before any step executes.
    pub pre_flight: Option<PreFlight>,

    /// User-declared steps, appended after (or replacing) the preset's.
    pub steps: Vec<StepConfig>,

    /// Replace the preset's steps instead of appending to them.
    /// (`override` is a Rust keyword, hence the rename.)
    #[serde(rename = "override")]
    pub override_steps: bool,
}

/// Pre-flight gate evaluated before scaffold execution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PreFlight {
    pub condition: ConditionMap,
}

/// One declared scaffold step.
///
/// This is the wide, permissive shape loaded from YAML; each step
/// factory picks the subset of fields it cares about and validates it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepConfig {
    pub name: String,

    /// Tri-state: unset means enabled.
    pub enabled: Option<bool>,

    pub args: Vec<String>,
    pub command: String,
    pub condition: ConditionMap,
    pub from: String,
    pub to: String,
    pub key: String,
    pub keys: Vec<String>,
    pub value: String,
    pub store_as: String,
    pub file: String,
    pub source: String,
    pub source_file: String,

    /// Database engine for db steps (`mysql`, `pgsql`, `sqlite`).
    #[serde(rename = "type")]
    pub step_type: String,
}

impl StepConfig {
    /// Named step with everything else defaulted, for tests and presets.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Whether the step is enabled (unset counts as enabled).
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// One declared cleanup step. Cleanup entries are reduced: only a name
/// and an optional condition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CleanupStep {
    pub name: String,
    pub condition: ConditionMap,
}

/// Cleanup pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CleanupConfig {
    pub steps: Vec<CleanupStep>,
}

/// Tool-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolConfig {
    pub version_file: String,
}

/// Sync configuration, reserved for the sync command.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    pub upstream: String,
    pub strategy: String,
    pub remote: String,
    /// Tri-state so unset can be told apart from false.
    pub auto_stash: Option<bool>,
}

/// Load project configuration from `arbor.yaml` in `path`.
pub fn load_project(path: &Path) -> Result<Config> {
    let config_path = path.join(PROJECT_CONFIG_FILE);
    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("{PROJECT_CONFIG_FILE} not found in {}", path.display()))?;

    parse_project(&content)
        .with_context(|| format!("parsing {}", config_path.display()))
}

/// Parse project configuration from YAML text.
pub fn parse_project(content: &str) -> Result<Config> {
    serde_yaml::from_str(content).context("invalid YAML")
}

/// Save the owned scalar keys of the project configuration back to
/// `arbor.yaml`, preserving comments, unknown keys, and ordering.
///
/// Only top-level scalars the tool owns are written; structured
/// sections (`scaffold`, `cleanup`, ...) are user-authored and never
/// rewritten.
pub fn save_project(path: &Path, config: &Config) -> Result<()> {
    let config_path = path.join(PROJECT_CONFIG_FILE);
    let mut content = fs::read_to_string(&config_path).unwrap_or_default();

    if !config.site_name.is_empty() {
        content = upsert_scalar(&content, "site_name", &config.site_name);
    }
    if !config.preset.is_empty() {
        content = upsert_scalar(&content, "preset", &config.preset);
    }
    if !config.default_branch.is_empty() {
        content = upsert_scalar(&content, "default_branch", &config.default_branch);
    }

    fs::write(&config_path, content)
        .with_context(|| format!("writing {}", config_path.display()))?;
    Ok(())
}

/// Replace the first top-level `key:` line with `key: value`, or append
/// one. Indented occurrences (nested keys) are left alone, and a
/// trailing `# ...` comment on the replaced line is carried over.
fn upsert_scalar(content: &str, key: &str, value: &str) -> String {
    let prefix = format!("{key}:");
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let mut updated = false;

    for line in lines.iter_mut() {
        if !updated && line.starts_with(&prefix) {
            *line = match trailing_comment(line) {
                Some(comment) => format!("{key}: {value}  {comment}"),
                None => format!("{key}: {value}"),
            };
            updated = true;
        }
    }

    let mut result = if updated {
        lines.join("\n")
    } else {
        let mut joined = content.to_string();
        if !joined.is_empty() && !joined.ends_with('\n') {
            joined.push('\n');
        }
        joined.push_str(&format!("{key}: {value}\n"));
        joined
    };

    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// The trailing comment on a data line: a `#` preceded by whitespace,
/// outside any quoted scalar.
fn trailing_comment(line: &str) -> Option<&str> {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev_ws = false;

    for (i, ch) in line.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double && prev_ws => {
                return Some(line[i..].trim_end());
            }
            _ => {}
        }
        prev_ws = ch == ' ' || ch == '\t';
    }

    None
}
