//! `arbor work <branch>`: create (or reuse) a worktree for a branch
//! and scaffold it.

use crate::git;
use crate::logging::init_logging;
use crate::output::Output;
use crate::project::ProjectContext;
use crate::scaffold::StepOptions;
use crate::utils::sanitize_path;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(name = "work")]
#[command(about = "Create a worktree for a branch and scaffold it")]
#[command(long_about = "\
Creates a worktree for <branch> under the centralized worktree base
directory, creating the branch from the default branch when it does not
exist yet, then runs the project's scaffold pipeline inside it.")]
pub struct Args {
    /// Branch to work on.
    pub branch: String,

    /// Base branch for a newly created branch (defaults to the
    /// project's default branch).
    #[arg(long)]
    pub base: Option<String>,

    /// Create the worktree but skip scaffolding.
    #[arg(long)]
    pub no_scaffold: bool,

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

    let worktree_path = project.worktree_base.join(sanitize_path(&args.branch));

    if let Some(existing) = git::find_worktree_for_branch(&project.project_path, &args.branch)? {
        anyhow::bail!(
            "branch '{}' is already checked out at {}",
            args.branch,
            existing.display()
        );
    }
    if worktree_path.exists() {
        anyhow::bail!("worktree path {} already exists", worktree_path.display());
    }

    std::fs::create_dir_all(&project.worktree_base).with_context(|| {
        format!(
            "Failed to create worktree base {}",
            project.worktree_base.display()
        )
    })?;

    let base = if git::branch_exists(&project.project_path, &args.branch)? {
        None
    } else {
        Some(
            args.base
                .clone()
                .unwrap_or_else(|| project.default_branch.clone()),
        )
    };

    output.progress(&format!(
        "Creating worktree for '{}' at {}",
        args.branch,
        worktree_path.display()
    ));
    git::worktree_add(
        &project.project_path,
        &worktree_path,
        &args.branch,
        base.as_deref(),
    )?;

    if !args.no_scaffold {
        let manager = super::build_manager();
        let ctx = super::build_scaffold_context(&project, &manager, &worktree_path, &args.branch);
        let opts = StepOptions {
            dry_run: args.dry_run,
            verbose: args.verbose,
            quiet: args.quiet,
        };
        manager.run_scaffold(&ctx, &project.config, opts, &mut output)?;
    }

    output.success(&format!("Worktree ready: {}", worktree_path.display()));
    Ok(())
}
