//! `arbor list`: show the project's worktrees.

use crate::git;
use crate::logging::init_logging;
use crate::output::Output;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(name = "list")]
#[command(about = "List worktrees for the current project")]
pub struct Args {
    #[arg(short, long, help = "Be verbose")]
    pub verbose: bool,
}

pub fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, false);
    let mut output = super::build_output(false, args.verbose);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    if !git::is_git_repository(&cwd) {
        anyhow::bail!("Not inside a Git repository");
    }
    let root = git::get_project_root(&cwd)?;

    let entries = git::worktree_list(&root)?;
    for entry in entries {
        let branch = entry.branch.as_deref().unwrap_or("(detached)");
        output.list_item(&format!("{}  {}", branch, entry.path.display()));
    }

    Ok(())
}
