//! CLI command implementations.
//!
//! Each module is one subcommand: a clap args struct plus a `run`
//! function that wires project discovery, the git driver, and the
//! scaffold engine together. Business logic lives in the engine; these
//! stay thin.

pub mod info;
pub mod init;
pub mod list;
pub mod remove;
pub mod scaffold;
pub mod work;

use crate::output::{CliOutput, OutputConfig};
use crate::project::ProjectContext;
use crate::scaffold::{ScaffoldContext, ScaffoldManager, StepRegistry};
use std::path::Path;

/// The manager every command uses: built-in steps, built-in presets.
pub(crate) fn build_manager() -> ScaffoldManager {
    ScaffoldManager::new(StepRegistry::builtin()).with_default_presets()
}

/// Build the engine context for one worktree.
pub(crate) fn build_scaffold_context(
    project: &ProjectContext,
    manager: &ScaffoldManager,
    worktree: &Path,
    branch: &str,
) -> ScaffoldContext {
    let preset = if project.config.preset.is_empty() {
        manager.detect_preset(worktree).unwrap_or_default().to_string()
    } else {
        project.config.preset.clone()
    };

    ScaffoldContext::new(
        worktree,
        branch,
        project.project_name.clone(),
        project.site_name().to_string(),
        preset,
    )
}

pub(crate) fn build_output(quiet: bool, verbose: bool) -> CliOutput {
    CliOutput::new(OutputConfig::new(quiet, verbose))
}
