//! Step that runs a named external program in the worktree.

use crate::exec::CommandRunner;
use crate::log_debug;
use crate::scaffold::condition::{evaluate, ConditionMap};
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;
use crate::scaffold::template;

/// Runs `binary` with templated arguments. The binary may be a
/// space-separated command like `php artisan`.
#[derive(Debug)]
pub struct BinaryStep {
    name: String,
    binary: String,
    args: Vec<String>,
    condition: ConditionMap,
    store_as: String,
    runner: CommandRunner,
}

impl BinaryStep {
    pub fn new(
        name: impl Into<String>,
        binary: impl Into<String>,
        args: Vec<String>,
        condition: ConditionMap,
        store_as: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            binary: binary.into(),
            args,
            condition,
            store_as: store_as.into(),
            runner: CommandRunner::new(),
        }
    }

    pub fn with_runner(mut self, runner: CommandRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A declared condition map wins; otherwise the binary's first word
    /// must resolve in PATH.
    pub fn condition(&self, ctx: &ScaffoldContext) -> bool {
        if !self.condition.is_empty() {
            return evaluate(&self.condition, &ctx.worktree_path);
        }

        match self.binary.split_whitespace().next() {
            Some(program) => which::which(program).is_ok(),
            None => false,
        }
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let snapshot = ctx.snapshot_for_template();

        // Best effort: an argument whose template fails to render is
        // passed through untouched.
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| template::render(arg, &snapshot).unwrap_or_else(|_| arg.clone()))
            .collect();

        if opts.verbose {
            log_debug!("Running: {} {}", self.binary, args.join(" "));
        }

        let result = self
            .runner
            .run_binary(&ctx.worktree_path, &self.binary, &args)
            .map_err(|e| ScaffoldError::Spawn {
                command: self.binary.clone(),
                reason: format!("{e:#}"),
            })?;

        if !result.success {
            return Err(ScaffoldError::CommandFailed {
                command: self.name.clone(),
                code: result.code.unwrap_or(-1),
                output: result.output_tail().to_string(),
            });
        }

        if !self.store_as.is_empty() {
            ctx.set_var(&self.store_as, result.output.trim_end().to_string());
            if opts.verbose {
                log_debug!("Stored output as {}", self.store_as);
            }
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
        ScaffoldContext::new("/worktrees/shop/main", "main", "shop", "shop", "laravel")
    }

    fn mock_step(binary: &str, args: &[&str], store_as: &str) -> (BinaryStep, Arc<MockCommander>) {
        let mock = Arc::new(MockCommander::new());
        let step = BinaryStep::new(
            "test.step",
            binary,
            args.iter().map(|s| s.to_string()).collect(),
            ConditionMap::new(),
            store_as,
        )
        .with_runner(CommandRunner::with_commander(mock.clone()));
        (step, mock)
    }

    #[test]
    fn test_condition_checks_path_for_first_word() {
        let ctx = make_ctx();
        let (step, _) = mock_step("sh -c", &[], "");
        assert!(step.condition(&ctx));

        let (step, _) = mock_step("definitely-not-a-command-xyz", &[], "");
        assert!(!step.condition(&ctx));
    }

    #[test]
    fn test_condition_map_overrides_path_check() {
        let ctx = make_ctx();
        let condition: ConditionMap =
            serde_yaml::from_str("file_exists: does-not-exist-here").unwrap();
        let step = BinaryStep::new(
            "test.step",
            "sh",
            Vec::new(),
            condition,
            "",
        );
        assert!(!step.condition(&ctx));
    }

    #[test]
    fn test_run_templates_args() {
        let ctx = make_ctx();
        ctx.set_db_suffix("swift_runner");
        let (step, mock) = mock_step("herd", &["link", "--secure", "{{ .SiteName }}"], "");

        step.run(&ctx, &StepOptions::default()).unwrap();

        let lines = mock.command_lines();
        assert_eq!(lines, vec!["herd link --secure shop"]);
    }

    #[test]
    fn test_run_leaves_unrenderable_args_untouched() {
        let ctx = make_ctx();
        let (step, mock) = mock_step("echo", &["{{ .DoesNotExist }}"], "");

        step.run(&ctx, &StepOptions::default()).unwrap();

        assert_eq!(mock.command_lines(), vec!["echo {{ .DoesNotExist }}"]);
    }

    #[test]
    fn test_run_failure_carries_output_tail() {
        let ctx = make_ctx();
        let (step, mock) = mock_step("composer", &["install"], "");
        mock.respond_failure("composer install", 2, "memory exhausted");

        let err = step.run(&ctx, &StepOptions::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("status 2"));
        assert!(msg.contains("memory exhausted"));
    }

    #[test]
    fn test_store_as_trims_trailing_whitespace() {
        let ctx = make_ctx();
        let (step, mock) = mock_step("git", &["rev-parse", "HEAD"], "Sha");
        mock.respond("rev-parse", "abc123\n");

        step.run(&ctx, &StepOptions::default()).unwrap();

        assert_eq!(ctx.get_var("Sha"), Some("abc123".to_string()));
    }
}
