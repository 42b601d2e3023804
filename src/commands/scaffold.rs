//! `arbor scaffold`: run the scaffold pipeline in the current worktree.

use crate::git;
use crate::logging::init_logging;
use crate::output::Output;
use crate::project::ProjectContext;
use crate::scaffold::StepOptions;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(name = "scaffold")]
#[command(about = "Run the scaffold pipeline in the current worktree")]
pub struct Args {
    /// Report the steps that would run without executing them.
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
    let worktree = std::env::current_dir().context("Failed to get current directory")?;
    let branch = git::get_current_branch(&worktree)?;

    let manager = super::build_manager();
    let ctx = super::build_scaffold_context(&project, &manager, &worktree, &branch);
    let opts = StepOptions {
        dry_run: args.dry_run,
        verbose: args.verbose,
        quiet: args.quiet,
    };

    manager.run_scaffold(&ctx, &project.config, opts, &mut output)?;

    output.success("Scaffold complete");
    Ok(())
}
