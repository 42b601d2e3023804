//! `arbor info`: show the resolved project context.

use crate::git;
use crate::local_state;
use crate::logging::init_logging;
use crate::output::Output;
use crate::project::ProjectContext;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(name = "info")]
#[command(about = "Show the resolved project context")]
pub struct Args {
    #[arg(short, long, help = "Be verbose")]
    pub verbose: bool,
}

pub fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, false);
    let mut output = super::build_output(false, args.verbose);

    let project = ProjectContext::discover()?;
    let manager = super::build_manager();

    output.detail("Project", &project.project_name);
    output.detail("Root", &project.project_path.display().to_string());
    output.detail("Git dir", &project.git_dir.display().to_string());
    output.detail("Default branch", &project.default_branch);
    output.detail("Site name", project.site_name());
    output.detail(
        "Worktree base",
        &project.worktree_base.display().to_string(),
    );

    let preset = if project.config.preset.is_empty() {
        match manager.detect_preset(&project.project_path) {
            Some(name) => format!("{name} (detected)"),
            None => "(none)".to_string(),
        }
    } else {
        project.config.preset.clone()
    };
    output.detail("Preset", &preset);

    let worktrees = git::worktree_list(&project.project_path)?;
    output.detail("Worktrees", &worktrees.len().to_string());

    // When invoked inside a worktree, surface its ephemeral state too.
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let state = local_state::read_local_state(&cwd).unwrap_or_default();
    if !state.db_suffix.is_empty() {
        output.detail("Db suffix", &state.db_suffix);
    }

    Ok(())
}
