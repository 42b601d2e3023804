//! Sequential step execution with per-step result tracking.
//!
//! Steps run in declared order: preset steps first, then user config
//! steps. The first failure halts the run; remaining steps are not
//! attempted. The data model (locked context, per-file env locks) would
//! tolerate parallel execution, but scheduling is deliberately
//! sequential: producer steps must finish before their consumers.

use super::context::ScaffoldContext;
use super::error::{Result, ScaffoldError};
use super::steps::{ConfiguredStep, StepOptions};
use crate::output::Output;

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Ran,
    SkippedDisabled,
    SkippedCondition,
    DryRun,
    Failed,
}

/// Per-step record retained for reporting and tests.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub step_name: String,
    pub status: StepStatus,
    pub error: Option<String>,
}

pub struct StepExecutor<'a> {
    steps: Vec<ConfiguredStep>,
    ctx: &'a ScaffoldContext,
    opts: StepOptions,
    results: Vec<ExecutionResult>,
}

impl<'a> StepExecutor<'a> {
    pub fn new(steps: Vec<ConfiguredStep>, ctx: &'a ScaffoldContext, opts: StepOptions) -> Self {
        Self {
            steps,
            ctx,
            opts,
            results: Vec::new(),
        }
    }

    /// Run every step in order. Returns the first failure, wrapped with
    /// the failing step's name.
    pub fn execute(&mut self, output: &mut dyn Output) -> Result<()> {
        self.results = Vec::with_capacity(self.steps.len());

        for i in 0..self.steps.len() {
            let name = self.steps[i].step.name().to_string();

            if !self.steps[i].enabled {
                output.debug(&format!("Skipping step (disabled): {name}"));
                self.record(name, StepStatus::SkippedDisabled, None);
                continue;
            }

            if !self.steps[i].step.condition(self.ctx) {
                output.debug(&format!("Skipping step (condition not met): {name}"));
                self.record(name, StepStatus::SkippedCondition, None);
                continue;
            }

            if self.opts.dry_run {
                output.info(&format!("[dry-run] Would execute: {name}"));
                self.record(name, StepStatus::DryRun, None);
                continue;
            }

            output.progress(&format!("Running step: {name}"));
            match self.steps[i].step.run(self.ctx, &self.opts) {
                Ok(()) => self.record(name, StepStatus::Ran, None),
                Err(e) => {
                    self.record(name.clone(), StepStatus::Failed, Some(e.to_string()));
                    return Err(ScaffoldError::for_step(name, e));
                }
            }
        }

        Ok(())
    }

    fn record(&mut self, step_name: String, status: StepStatus, error: Option<String>) {
        self.results.push(ExecutionResult {
            step_name,
            status,
            error,
        });
    }

    /// Results recorded so far, in execution order.
    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{CommandRunner, MockCommander};
    use crate::output::TestOutput;
    use crate::scaffold::steps::{BashRunStep, EnvWriteStep, FileCopyStep, Step};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn make_ctx(dir: &std::path::Path) -> ScaffoldContext {
        ScaffoldContext::new(dir, "main", "shop", "shop", "")
    }

    fn bash_step(command: &str, mock: &Arc<MockCommander>) -> ConfiguredStep {
        ConfiguredStep::enabled(Step::BashRun(
            BashRunStep::new(command, "")
                .with_runner(CommandRunner::with_commander(mock.clone())),
        ))
    }

    #[test]
    fn test_steps_run_in_declared_order() {
        let dir = tempdir().unwrap();
        let ctx = make_ctx(dir.path());
        let mock = Arc::new(MockCommander::new());

        let steps = vec![
            bash_step("echo first", &mock),
            bash_step("echo second", &mock),
            bash_step("echo third", &mock),
        ];

        let mut executor = StepExecutor::new(steps, &ctx, StepOptions::default());
        executor.execute(&mut TestOutput::new()).unwrap();

        let lines = mock.command_lines();
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
        assert!(lines[2].contains("third"));
        assert!(executor
            .results()
            .iter()
            .all(|r| r.status == StepStatus::Ran));
    }

    #[test]
    fn test_failure_halts_remaining_steps() {
        let dir = tempdir().unwrap();
        let ctx = make_ctx(dir.path());
        let mock = Arc::new(MockCommander::new());
        mock.respond_failure("boom", 1, "went wrong");

        let steps = vec![
            bash_step("echo ok", &mock),
            bash_step("boom", &mock),
            bash_step("echo never", &mock),
        ];

        let mut executor = StepExecutor::new(steps, &ctx, StepOptions::default());
        let err = executor.execute(&mut TestOutput::new()).unwrap_err();

        assert!(err.to_string().contains("step 'bash.run' failed"));

        // The third step's run was never invoked.
        assert_eq!(mock.calls().len(), 2);

        let results = executor.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, StepStatus::Ran);
        assert_eq!(results[1].status, StepStatus::Failed);
        assert!(results[1].error.as_deref().unwrap().contains("went wrong"));
    }

    #[test]
    fn test_disabled_step_is_skipped() {
        let dir = tempdir().unwrap();
        let ctx = make_ctx(dir.path());
        let mock = Arc::new(MockCommander::new());

        let mut disabled = bash_step("echo off", &mock);
        disabled.enabled = false;
        let steps = vec![disabled, bash_step("echo on", &mock)];

        let mut executor = StepExecutor::new(steps, &ctx, StepOptions::default());
        executor.execute(&mut TestOutput::new()).unwrap();

        assert_eq!(mock.calls().len(), 1);
        assert_eq!(executor.results()[0].status, StepStatus::SkippedDisabled);
        assert_eq!(executor.results()[1].status, StepStatus::Ran);
    }

    #[test]
    fn test_condition_gating() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("present"), "").unwrap();
        let ctx = make_ctx(dir.path());

        let steps = vec![
            ConfiguredStep::enabled(Step::FileCopy(FileCopyStep::new("present", "copy1"))),
            ConfiguredStep::enabled(Step::FileCopy(FileCopyStep::new("absent", "copy2"))),
        ];

        let mut executor = StepExecutor::new(steps, &ctx, StepOptions::default());
        executor.execute(&mut TestOutput::new()).unwrap();

        assert_eq!(executor.results()[0].status, StepStatus::Ran);
        assert_eq!(executor.results()[1].status, StepStatus::SkippedCondition);
        assert!(dir.path().join("copy1").exists());
        assert!(!dir.path().join("copy2").exists());
    }

    #[test]
    fn test_dry_run_invokes_nothing() {
        let dir = tempdir().unwrap();
        let ctx = make_ctx(dir.path());
        let mock = Arc::new(MockCommander::new());

        let steps = vec![
            bash_step("echo one", &mock),
            ConfiguredStep::enabled(Step::EnvWrite(EnvWriteStep::new("K", "v", ""))),
        ];

        let opts = StepOptions {
            dry_run: true,
            ..Default::default()
        };
        let mut executor = StepExecutor::new(steps, &ctx, opts);
        executor.execute(&mut TestOutput::new()).unwrap();

        assert!(mock.calls().is_empty());
        assert!(!dir.path().join(".env").exists());
        assert!(executor
            .results()
            .iter()
            .all(|r| r.status == StepStatus::DryRun));
    }

    #[test]
    fn test_producer_consumer_ordering() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "API_KEY=abc123\n").unwrap();
        let ctx = make_ctx(dir.path());

        let steps = vec![
            ConfiguredStep::enabled(Step::EnvRead(
                crate::scaffold::steps::EnvReadStep::new("API_KEY", "Ak", ""),
            )),
            ConfiguredStep::enabled(Step::EnvWrite(EnvWriteStep::new(
                "MIRRORED",
                "{{ .Ak }}",
                "",
            ))),
        ];

        let mut executor = StepExecutor::new(steps, &ctx, StepOptions::default());
        executor.execute(&mut TestOutput::new()).unwrap();

        let env = crate::envfile::read_env_file(dir.path(), ".env");
        assert_eq!(env["MIRRORED"], "abc123");
    }
}
