//! arbor: multi-branch development with centralized git worktrees and
//! a declarative scaffolding pipeline.

use anyhow::Result;
use arbor::commands;
use arbor::config::exit_codes;
use arbor::git::{GitError, WorktreeNotFound};
use arbor::project::ConfigError;
use arbor::scaffold::ScaffoldError;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(version = arbor::VERSION_DISPLAY)]
#[command(about = "Multi-branch development with git worktrees and scaffolding")]
#[command(long_about = "\
arbor manages one worktree per branch under a centralized base
directory. Creating a worktree runs the project's declared scaffold
steps (dependency install, env setup, per-worktree database); removing
it reverses them through the cleanup steps.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a worktree for a branch and scaffold it.
    Work(commands::work::Args),
    /// Run the scaffold pipeline in the current worktree.
    Scaffold(commands::scaffold::Args),
    /// Run cleanup steps and remove a branch's worktree.
    Remove(commands::remove::Args),
    /// List worktrees for the current project.
    List(commands::list::Args),
    /// Create arbor.yaml for the current project.
    Init(commands::init::Args),
    /// Show the resolved project context.
    Info(commands::info::Args),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Work(args) => commands::work::run(args),
        Commands::Scaffold(args) => commands::scaffold::run(args),
        Commands::Remove(args) => commands::remove::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Init(args) => commands::init::run(args),
        Commands::Info(args) => commands::info::run(args),
    };

    std::process::exit(report(result));
}

fn report(result: Result<()>) -> i32 {
    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code_for(&err)
        }
    }
}

/// Map an error chain to the documented exit codes.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ScaffoldError>().is_some() {
        exit_codes::SCAFFOLD_STEP_FAILED
    } else if err.downcast_ref::<WorktreeNotFound>().is_some() {
        exit_codes::WORKTREE_NOT_FOUND
    } else if err.downcast_ref::<GitError>().is_some() {
        exit_codes::GIT_OPERATION_FAILED
    } else if err.downcast_ref::<ConfigError>().is_some() {
        exit_codes::CONFIGURATION_ERROR
    } else {
        exit_codes::GENERAL_ERROR
    }
}
