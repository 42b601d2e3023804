//! `arbor remove <branch>`: run cleanup steps, then remove the
//! branch's worktree.

use crate::git::{self, WorktreeNotFound};
use crate::logging::init_logging;
use crate::output::Output;
use crate::project::ProjectContext;
use crate::scaffold::StepOptions;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "remove")]
#[command(about = "Run cleanup steps and remove a branch's worktree")]
#[command(long_about = "\
Runs the project's cleanup step list inside the worktree (dropping
per-worktree databases, unlinking sites), then removes the worktree via
git. The branch itself is left alone.")]
pub struct Args {
    /// Branch whose worktree should be removed.
    pub branch: String,

    /// Pass --force to `git worktree remove` (discards dirty state).
    #[arg(short, long)]
    pub force: bool,

    /// Report the cleanup steps without executing them.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Be verbose; show per-step detail")]
    pub verbose: bool,

    #[arg(short, long, help = "Suppress routine output")]
    pub quiet: bool,
}

pub fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);
    let mut output = super::build_output(args.quiet, args.verbose);

    let project = ProjectContext::discover()?;

    let worktree_path = git::find_worktree_for_branch(&project.project_path, &args.branch)?
        .ok_or_else(|| WorktreeNotFound(args.branch.clone()))?;

    let manager = super::build_manager();
    let ctx = super::build_scaffold_context(&project, &manager, &worktree_path, &args.branch);
    let opts = StepOptions {
        dry_run: args.dry_run,
        verbose: args.verbose,
        quiet: args.quiet,
    };

    output.progress(&format!("Cleaning up worktree {}", worktree_path.display()));
    manager.run_cleanup(&ctx, &project.config, opts, &mut output)?;

    if args.dry_run {
        output.info(&format!(
            "[dry-run] Would remove worktree {}",
            worktree_path.display()
        ));
        return Ok(());
    }

    git::worktree_remove(&project.project_path, &worktree_path, args.force)?;

    output.success(&format!("Removed worktree {}", worktree_path.display()));
    Ok(())
}
