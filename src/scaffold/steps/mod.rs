//! The closed set of scaffold step variants.
//!
//! Every step exposes the same three operations: a name, a cheap
//! shared-access condition, and a run that mutates the context through
//! its accessors. The executor drives them in declared order.

mod bash_run;
mod binary;
mod command_run;
mod database;
mod env_copy;
mod env_read;
mod env_write;
mod file_copy;

pub use bash_run::BashRunStep;
pub use binary::BinaryStep;
pub use command_run::CommandRunStep;
pub use database::{DbCreateStep, DbDestroyStep, DbEngine};
pub use env_copy::EnvCopyStep;
pub use env_read::EnvReadStep;
pub use env_write::EnvWriteStep;
pub use file_copy::FileCopyStep;

use super::context::ScaffoldContext;
use super::error::Result;

/// Options threaded into every step run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepOptions {
    /// Report what would run without invoking anything.
    pub dry_run: bool,
    /// Emit per-step detail.
    pub verbose: bool,
    /// Suppress routine output.
    pub quiet: bool,
}

/// One scaffold step, tagged by variant.
#[derive(Debug)]
pub enum Step {
    Binary(BinaryStep),
    BashRun(BashRunStep),
    CommandRun(CommandRunStep),
    FileCopy(FileCopyStep),
    EnvRead(EnvReadStep),
    EnvWrite(EnvWriteStep),
    EnvCopy(EnvCopyStep),
    DbCreate(DbCreateStep),
    DbDestroy(DbDestroyStep),
}

impl Step {
    /// The step's display name.
    pub fn name(&self) -> &str {
        match self {
            Step::Binary(s) => s.name(),
            Step::BashRun(_) => "bash.run",
            Step::CommandRun(_) => "command.run",
            Step::FileCopy(_) => "file.copy",
            Step::EnvRead(_) => "env.read",
            Step::EnvWrite(_) => "env.write",
            Step::EnvCopy(_) => "env.copy",
            Step::DbCreate(_) => "db.create",
            Step::DbDestroy(_) => "db.destroy",
        }
    }

    /// Whether the step should run against this context. Needs only
    /// shared access and stays cheap.
    pub fn condition(&self, ctx: &ScaffoldContext) -> bool {
        match self {
            Step::Binary(s) => s.condition(ctx),
            Step::FileCopy(s) => s.condition(ctx),
            Step::BashRun(_)
            | Step::CommandRun(_)
            | Step::EnvRead(_)
            | Step::EnvWrite(_)
            | Step::EnvCopy(_)
            | Step::DbCreate(_)
            | Step::DbDestroy(_) => true,
        }
    }

    /// Execute the step. Context mutation goes through the context's
    /// locked accessors.
    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        match self {
            Step::Binary(s) => s.run(ctx, opts),
            Step::BashRun(s) => s.run(ctx, opts),
            Step::CommandRun(s) => s.run(ctx, opts),
            Step::FileCopy(s) => s.run(ctx, opts),
            Step::EnvRead(s) => s.run(ctx, opts),
            Step::EnvWrite(s) => s.run(ctx, opts),
            Step::EnvCopy(s) => s.run(ctx, opts),
            Step::DbCreate(s) => s.run(ctx, opts),
            Step::DbDestroy(s) => s.run(ctx, opts),
        }
    }
}

/// A step paired with its declared enabled flag, ready for execution.
#[derive(Debug)]
pub struct ConfiguredStep {
    pub step: Step,
    pub enabled: bool,
}

impl ConfiguredStep {
    pub fn enabled(step: Step) -> Self {
        Self {
            step,
            enabled: true,
        }
    }
}
