//! Composition of preset and user steps, suffix seeding, and the
//! scaffold/cleanup entry points.

use super::context::ScaffoldContext;
use super::error::{Result, ScaffoldError};
use super::executor::{ExecutionResult, StepExecutor};
use super::preflight::run_preflight;
use super::registry::StepRegistry;
use super::steps::{ConfiguredStep, StepOptions};
use super::words;
use crate::config::{CleanupStep, Config, StepConfig};
use crate::local_state::{self, LocalState};
use crate::output::Output;
use crate::presets::Preset;
use std::path::Path;

pub struct ScaffoldManager {
    presets: Vec<Box<dyn Preset>>,
    registry: StepRegistry,
}

impl ScaffoldManager {
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            presets: Vec::new(),
            registry,
        }
    }

    /// Register the compiled-in presets, in detection order.
    pub fn with_default_presets(mut self) -> Self {
        for preset in crate::presets::default_presets() {
            self.presets.push(preset);
        }
        self
    }

    pub fn register_preset(&mut self, preset: Box<dyn Preset>) {
        self.presets.push(preset);
    }

    pub fn get_preset(&self, name: &str) -> Option<&dyn Preset> {
        self.presets
            .iter()
            .find(|p| p.name() == name)
            .map(|p| &**p)
    }

    /// First preset whose detection matches the worktree.
    pub fn detect_preset(&self, path: &Path) -> Option<&str> {
        self.presets
            .iter()
            .find(|p| p.detect(path))
            .map(|p| p.name())
    }

    fn resolve_preset(&self, cfg: &Config, worktree: &Path) -> Option<&dyn Preset> {
        if !cfg.preset.is_empty() {
            return self.get_preset(&cfg.preset);
        }
        self.detect_preset(worktree)
            .and_then(|name| self.get_preset(name))
    }

    /// Compose the scaffold step list: preset defaults first, then the
    /// user's steps: unless `scaffold.override` replaces the preset's
    /// contribution entirely.
    pub fn steps_for_scaffold(&self, cfg: &Config, worktree: &Path) -> Result<Vec<ConfiguredStep>> {
        let mut steps = Vec::new();

        if !cfg.scaffold.override_steps {
            if let Some(preset) = self.resolve_preset(cfg, worktree) {
                for step_cfg in preset.default_steps() {
                    steps.push(self.configure(step_cfg)?);
                }
            }
        }

        for step_cfg in &cfg.scaffold.steps {
            steps.push(self.configure(step_cfg.clone())?);
        }

        Ok(steps)
    }

    /// Compose the cleanup step list: preset cleanup first, then the
    /// user's cleanup steps. No override mechanism here.
    pub fn steps_for_cleanup(&self, cfg: &Config, worktree: &Path) -> Result<Vec<ConfiguredStep>> {
        let mut steps = Vec::new();

        if let Some(preset) = self.resolve_preset(cfg, worktree) {
            for cleanup_cfg in preset.cleanup_steps() {
                steps.push(self.configure(widen_cleanup(cleanup_cfg))?);
            }
        }

        for cleanup_cfg in &cfg.cleanup.steps {
            steps.push(self.configure(widen_cleanup(cleanup_cfg.clone()))?);
        }

        Ok(steps)
    }

    fn configure(&self, cfg: StepConfig) -> Result<ConfiguredStep> {
        let enabled = cfg.is_enabled();
        let name = cfg.name.clone();
        let step = self.registry.create(&name, cfg)?;
        Ok(ConfiguredStep { step, enabled })
    }

    /// Run the scaffold pipeline for a worktree.
    pub fn run_scaffold(
        &self,
        ctx: &ScaffoldContext,
        cfg: &Config,
        opts: StepOptions,
        output: &mut dyn Output,
    ) -> Result<Vec<ExecutionResult>> {
        // Legacy configs kept db_suffix inside arbor.yaml.
        if !opts.dry_run {
            local_state::migrate_db_suffix(&ctx.worktree_path)
                .map_err(|e| ScaffoldError::State(format!("{e:#}")))?;
        }

        self.seed_suffix(ctx, opts.dry_run)?;

        if let Some(pre_flight) = &cfg.scaffold.pre_flight {
            run_preflight(&pre_flight.condition, &ctx.worktree_path, opts.quiet)?;
        }

        let steps = self.steps_for_scaffold(cfg, &ctx.worktree_path)?;
        let mut executor = StepExecutor::new(steps, ctx, opts);
        let run = executor.execute(output);
        let results = executor.results().to_vec();
        run.map(|()| results)
    }

    /// Run the cleanup pipeline for a worktree. No pre-flight; the
    /// suffix is read from local state but never generated.
    pub fn run_cleanup(
        &self,
        ctx: &ScaffoldContext,
        cfg: &Config,
        opts: StepOptions,
        output: &mut dyn Output,
    ) -> Result<Vec<ExecutionResult>> {
        let state = local_state::read_local_state(&ctx.worktree_path)
            .map_err(|e| ScaffoldError::State(format!("{e:#}")))?;
        if !state.db_suffix.is_empty() {
            ctx.set_db_suffix(state.db_suffix);
        }

        let steps = self.steps_for_cleanup(cfg, &ctx.worktree_path)?;
        let mut executor = StepExecutor::new(steps, ctx, opts);
        let run = executor.execute(output);
        let results = executor.results().to_vec();
        run.map(|()| results)
    }

    /// Seed the invocation's db suffix: reuse the persisted one, or
    /// generate and persist a fresh one so every step sees the same
    /// value: even with `scaffold.override: true`.
    fn seed_suffix(&self, ctx: &ScaffoldContext, dry_run: bool) -> Result<()> {
        let state = local_state::read_local_state(&ctx.worktree_path)
            .map_err(|e| ScaffoldError::State(format!("{e:#}")))?;

        if !state.db_suffix.is_empty() {
            ctx.set_db_suffix(state.db_suffix);
            return Ok(());
        }

        let suffix = ctx.set_db_suffix(words::generate());
        if !dry_run {
            local_state::write_local_state(
                &ctx.worktree_path,
                &LocalState { db_suffix: suffix },
            )
            .map_err(|e| ScaffoldError::State(format!("{e:#}")))?;
        }
        Ok(())
    }
}

/// Widen a reduced cleanup entry into a full step config. `herd`
/// cleanup means unlinking the site.
fn widen_cleanup(cleanup: CleanupStep) -> StepConfig {
    let args = if cleanup.name == "herd" {
        vec!["unlink".to_string()]
    } else {
        Vec::new()
    };

    StepConfig {
        name: cleanup.name,
        args,
        condition: cleanup.condition,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleanupConfig, ScaffoldConfig};
    use crate::output::TestOutput;
    use tempfile::tempdir;

    fn manager() -> ScaffoldManager {
        ScaffoldManager::new(StepRegistry::builtin()).with_default_presets()
    }

    fn make_ctx(dir: &std::path::Path) -> ScaffoldContext {
        ScaffoldContext::new(dir, "main", "shop", "shop", "laravel")
    }

    fn config_with_steps(yaml: &str) -> Config {
        crate::config::parse_project(yaml).unwrap()
    }

    #[test]
    fn test_detect_preset() {
        let dir = tempdir().unwrap();
        let m = manager();
        assert_eq!(m.detect_preset(dir.path()), None);

        std::fs::write(dir.path().join("artisan"), "").unwrap();
        std::fs::write(dir.path().join("composer.json"), "{}").unwrap();
        assert_eq!(m.detect_preset(dir.path()), Some("laravel"));
    }

    #[test]
    fn test_steps_append_user_after_preset() {
        let dir = tempdir().unwrap();
        let m = manager();
        let cfg = config_with_steps(
            "preset: laravel\nscaffold:\n  steps:\n    - name: bash.run\n      command: echo extra\n",
        );

        let steps = m.steps_for_scaffold(&cfg, dir.path()).unwrap();
        let preset_len = crate::presets::Laravel.default_steps().len();
        assert_eq!(steps.len(), preset_len + 1);
        assert_eq!(steps[preset_len].step.name(), "bash.run");
    }

    #[test]
    fn test_override_replaces_preset_steps() {
        let dir = tempdir().unwrap();
        let m = manager();
        let cfg = config_with_steps(
            "preset: laravel\nscaffold:\n  override: true\n  steps:\n    - name: bash.run\n      command: echo only\n",
        );

        let steps = m.steps_for_scaffold(&cfg, dir.path()).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step.name(), "bash.run");
    }

    #[test]
    fn test_unknown_step_surfaces_from_composition() {
        let dir = tempdir().unwrap();
        let m = manager();
        let cfg = config_with_steps("scaffold:\n  steps:\n    - name: not.a.step\n");

        let err = m.steps_for_scaffold(&cfg, dir.path()).unwrap_err();
        assert!(matches!(err, ScaffoldError::UnknownStep(_)));
    }

    #[test]
    fn test_cleanup_widens_herd_to_unlink() {
        let cleanup = CleanupStep {
            name: "herd".to_string(),
            ..Default::default()
        };
        let cfg = widen_cleanup(cleanup);
        assert_eq!(cfg.args, vec!["unlink"]);
    }

    #[test]
    fn test_run_scaffold_seeds_and_persists_suffix() {
        let dir = tempdir().unwrap();
        let m = manager();
        let ctx = make_ctx(dir.path());
        let cfg = config_with_steps("scaffold:\n  override: true\n  steps: []\n");

        m.run_scaffold(&ctx, &cfg, StepOptions::default(), &mut TestOutput::new())
            .unwrap();

        let suffix = ctx.get_db_suffix();
        assert!(!suffix.is_empty());
        let state = local_state::read_local_state(dir.path()).unwrap();
        assert_eq!(state.db_suffix, suffix);
    }

    #[test]
    fn test_run_scaffold_reuses_persisted_suffix() {
        let dir = tempdir().unwrap();
        local_state::write_local_state(
            dir.path(),
            &LocalState {
                db_suffix: "swift_runner".to_string(),
            },
        )
        .unwrap();

        let m = manager();
        let ctx = make_ctx(dir.path());
        let cfg = config_with_steps("scaffold:\n  override: true\n  steps: []\n");

        m.run_scaffold(&ctx, &cfg, StepOptions::default(), &mut TestOutput::new())
            .unwrap();

        assert_eq!(ctx.get_db_suffix(), "swift_runner");
    }

    #[test]
    fn test_run_scaffold_migrates_legacy_suffix() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::config::PROJECT_CONFIG_FILE),
            "db_suffix: clear_data\n",
        )
        .unwrap();

        let m = manager();
        let ctx = make_ctx(dir.path());
        let cfg = config_with_steps("scaffold:\n  override: true\n  steps: []\n");

        m.run_scaffold(&ctx, &cfg, StepOptions::default(), &mut TestOutput::new())
            .unwrap();

        assert_eq!(ctx.get_db_suffix(), "clear_data");
        let remaining =
            std::fs::read_to_string(dir.path().join(crate::config::PROJECT_CONFIG_FILE)).unwrap();
        assert!(!remaining.contains("db_suffix"));
    }

    #[test]
    fn test_run_scaffold_preflight_aborts_before_steps() {
        let dir = tempdir().unwrap();
        let m = manager();
        let ctx = make_ctx(dir.path());
        let cfg = config_with_steps(
            "scaffold:\n  pre_flight:\n    condition:\n      file_exists: .env.op\n  override: true\n  steps:\n    - name: env.write\n      key: SHOULD_NOT\n      value: exist\n",
        );

        let opts = StepOptions {
            quiet: true,
            ..Default::default()
        };
        let err = m
            .run_scaffold(&ctx, &cfg, opts, &mut TestOutput::new())
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::PreFlight { .. }));
        assert!(!dir.path().join(".env").exists());
    }

    #[test]
    fn test_run_scaffold_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let m = manager();
        let ctx = make_ctx(dir.path());
        let cfg = config_with_steps(
            "scaffold:\n  override: true\n  steps:\n    - name: env.write\n      key: K\n      value: v\n",
        );

        let opts = StepOptions {
            dry_run: true,
            ..Default::default()
        };
        let results = m
            .run_scaffold(&ctx, &cfg, opts, &mut TestOutput::new())
            .unwrap();

        assert!(!dir.path().join(".env").exists());
        assert!(!dir.path().join(crate::local_state::LOCAL_STATE_FILE).exists());
        assert_eq!(
            results[0].status,
            crate::scaffold::executor::StepStatus::DryRun
        );
    }

    #[test]
    fn test_run_cleanup_reads_suffix_without_generating() {
        let dir = tempdir().unwrap();
        let m = manager();
        let ctx = make_ctx(dir.path());
        let cfg = Config {
            scaffold: ScaffoldConfig::default(),
            cleanup: CleanupConfig { steps: Vec::new() },
            ..Default::default()
        };

        m.run_cleanup(&ctx, &cfg, StepOptions::default(), &mut TestOutput::new())
            .unwrap();

        assert!(ctx.get_db_suffix().is_empty());
        assert!(!dir.path().join(crate::local_state::LOCAL_STATE_FILE).exists());
    }
}
