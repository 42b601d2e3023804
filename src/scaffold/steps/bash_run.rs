//! Step that runs a templated command string through `bash -c`.

use crate::exec::CommandRunner;
use crate::log_debug;
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;
use crate::scaffold::template;

#[derive(Debug)]
pub struct BashRunStep {
    command: String,
    store_as: String,
    runner: CommandRunner,
}

impl BashRunStep {
    pub fn new(command: impl Into<String>, store_as: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            store_as: store_as.into(),
            runner: CommandRunner::new(),
        }
    }

    pub fn with_runner(mut self, runner: CommandRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let snapshot = ctx.snapshot_for_template();
        let command = template::render(&self.command, &snapshot)?;

        if opts.verbose {
            log_debug!("bash -c {command}");
        }

        let result = self
            .runner
            .run_bash(&ctx.worktree_path, &command)
            .map_err(|e| ScaffoldError::Spawn {
                command: "bash".to_string(),
                reason: format!("{e:#}"),
            })?;

        if !result.success {
            return Err(ScaffoldError::CommandFailed {
                command: "bash.run".to_string(),
                code: result.code.unwrap_or(-1),
                output: result.output_tail().to_string(),
            });
        }

        if !self.store_as.is_empty() {
            ctx.set_var(&self.store_as, result.output.trim_end().to_string());
        }

        Ok(())
    }
}
