//! Step that runs a raw command string through `sh -c`, untemplated.

use crate::exec::CommandRunner;
use crate::log_debug;
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;

#[derive(Debug)]
pub struct CommandRunStep {
    command: String,
    store_as: String,
    runner: CommandRunner,
}

impl CommandRunStep {
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
        if opts.verbose {
            log_debug!("sh -c {}", self.command);
        }

        let result = self
            .runner
            .run_shell(&ctx.worktree_path, &self.command)
            .map_err(|e| ScaffoldError::Spawn {
                command: "sh".to_string(),
                reason: format!("{e:#}"),
            })?;

        if !result.success {
            return Err(ScaffoldError::CommandFailed {
                command: "command.run".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockCommander;
    use std::sync::Arc;

    fn make_ctx() -> ScaffoldContext {
        ScaffoldContext::new("/worktrees/shop/main", "main", "shop", "shop", "")
    }

    #[test]
    fn test_command_is_not_templated() {
        let ctx = make_ctx();
        let mock = Arc::new(MockCommander::new());
        let step = CommandRunStep::new("echo {{ .Branch }}", "")
            .with_runner(CommandRunner::with_commander(mock.clone()));

        step.run(&ctx, &StepOptions::default()).unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].command, "sh");
        assert_eq!(calls[0].args, vec!["-c", "echo {{ .Branch }}"]);
    }

    #[test]
    fn test_store_as_captures_output() {
        let ctx = make_ctx();
        let mock = Arc::new(MockCommander::new());
        mock.respond("hostname", "buildbox\n");
        let step = CommandRunStep::new("hostname", "Host")
            .with_runner(CommandRunner::with_commander(mock));

        step.run(&ctx, &StepOptions::default()).unwrap();

        assert_eq!(ctx.get_var("Host"), Some("buildbox".to_string()));
    }
}
