//! Step name → factory registry.
//!
//! Built explicitly at process start and handed to the manager by
//! reference: no global mutable state, so tests can construct fresh
//! registries with custom factories.

use super::error::{Result, ScaffoldError};
use super::steps::{
    BashRunStep, BinaryStep, CommandRunStep, DbCreateStep, DbDestroyStep, DbEngine, EnvCopyStep,
    EnvReadStep, EnvWriteStep, FileCopyStep, Step,
};
use crate::config::StepConfig;
use std::collections::BTreeMap;

type Factory = Box<dyn Fn(StepConfig) -> Result<Step> + Send + Sync>;

#[derive(Default)]
pub struct StepRegistry {
    factories: BTreeMap<String, Factory>,
}

impl StepRegistry {
    /// An empty registry. Most callers want [`StepRegistry::builtin`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in step registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register_binary("php", "php");
        registry.register_binary("php.composer", "composer");
        registry.register_binary("php.laravel", "php artisan");
        registry.register_binary("php.laravel.artisan", "php artisan");
        registry.register_binary("node.npm", "npm");
        registry.register_binary("node.yarn", "yarn");
        registry.register_binary("node.pnpm", "pnpm");
        registry.register_binary("node.bun", "bun");
        registry.register_binary("herd", "herd");
        registry.register_binary("herd.link", "herd link");

        registry.register("bash.run", |cfg| {
            require(&cfg.command, "bash.run requires `command`")?;
            Ok(Step::BashRun(BashRunStep::new(cfg.command, cfg.store_as)))
        });

        registry.register("command.run", |cfg| {
            require(&cfg.command, "command.run requires `command`")?;
            Ok(Step::CommandRun(CommandRunStep::new(
                cfg.command,
                cfg.store_as,
            )))
        });

        registry.register("file.copy", |cfg| {
            require(&cfg.from, "file.copy requires `from`")?;
            require(&cfg.to, "file.copy requires `to`")?;
            Ok(Step::FileCopy(FileCopyStep::new(cfg.from, cfg.to)))
        });

        registry.register("env.read", |cfg| {
            require(&cfg.key, "env.read requires `key`")?;
            Ok(Step::EnvRead(EnvReadStep::new(
                cfg.key,
                &cfg.store_as,
                &cfg.file,
            )))
        });

        registry.register("env.write", |cfg| {
            require(&cfg.key, "env.write requires `key`")?;
            Ok(Step::EnvWrite(EnvWriteStep::new(
                cfg.key, cfg.value, &cfg.file,
            )))
        });

        registry.register("env.copy", |cfg| {
            require(&cfg.source, "env.copy requires `source`")?;
            let mut keys = cfg.keys;
            if keys.is_empty() && !cfg.key.is_empty() {
                keys = vec![cfg.key];
            }
            if keys.is_empty() {
                return Err(ScaffoldError::Config(
                    "env.copy requires `keys` or `key`".to_string(),
                ));
            }
            Ok(Step::EnvCopy(EnvCopyStep::new(
                cfg.source,
                &cfg.source_file,
                &cfg.file,
                keys,
            )))
        });

        registry.register("db.create", |cfg| {
            let engine = parse_engine(&cfg.step_type)?;
            Ok(Step::DbCreate(
                DbCreateStep::new(engine, cfg.args).with_store_as(cfg.store_as),
            ))
        });

        registry.register("db.destroy", |cfg| {
            let engine = parse_engine(&cfg.step_type)?;
            Ok(Step::DbDestroy(DbDestroyStep::new(engine)))
        });

        registry
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(StepConfig) -> Result<Step> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Register a name as a plain binary invocation.
    pub fn register_binary(&mut self, name: &str, binary: &str) {
        let step_name = name.to_string();
        let binary = binary.to_string();
        self.register(name, move |cfg| {
            Ok(Step::Binary(BinaryStep::new(
                step_name.clone(),
                binary.clone(),
                cfg.args,
                cfg.condition,
                cfg.store_as,
            )))
        });
    }

    /// Produce a step from its configuration.
    pub fn create(&self, name: &str, cfg: StepConfig) -> Result<Step> {
        match self.factories.get(name) {
            Some(factory) => factory(cfg),
            None => Err(ScaffoldError::UnknownStep(name.to_string())),
        }
    }

    /// Registered names, sorted.
    pub fn registered(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

fn require(field: &str, message: &str) -> Result<()> {
    if field.is_empty() {
        return Err(ScaffoldError::Config(message.to_string()));
    }
    Ok(())
}

fn parse_engine(step_type: &str) -> Result<Option<DbEngine>> {
    if step_type.is_empty() {
        return Ok(None);
    }
    DbEngine::parse(step_type)
        .map(Some)
        .ok_or_else(|| ScaffoldError::Config(format!("unknown database type '{step_type}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(name: &str) -> StepConfig {
        StepConfig::named(name)
    }

    #[test]
    fn test_unknown_step_is_structured_error() {
        let registry = StepRegistry::builtin();
        let err = registry.create("nope.never", cfg("nope.never")).unwrap_err();
        assert!(matches!(err, ScaffoldError::UnknownStep(_)));
        assert!(err.to_string().contains("nope.never"));
    }

    #[test]
    fn test_builtin_names_registered() {
        let registry = StepRegistry::builtin();
        let names = registry.registered();
        for expected in [
            "php",
            "php.composer",
            "php.laravel",
            "node.npm",
            "node.yarn",
            "node.pnpm",
            "node.bun",
            "herd",
            "herd.link",
            "bash.run",
            "command.run",
            "file.copy",
            "env.read",
            "env.write",
            "env.copy",
            "db.create",
            "db.destroy",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_binary_factory_produces_binary_step() {
        let registry = StepRegistry::builtin();
        let mut config = cfg("php.composer");
        config.args = vec!["install".to_string()];

        let step = registry.create("php.composer", config).unwrap();
        assert!(matches!(step, Step::Binary(_)));
        assert_eq!(step.name(), "php.composer");
    }

    #[test]
    fn test_bash_run_requires_command() {
        let registry = StepRegistry::builtin();
        let err = registry.create("bash.run", cfg("bash.run")).unwrap_err();
        assert!(matches!(err, ScaffoldError::Config(_)));
    }

    #[test]
    fn test_env_read_requires_key() {
        let registry = StepRegistry::builtin();
        let err = registry.create("env.read", cfg("env.read")).unwrap_err();
        assert!(matches!(err, ScaffoldError::Config(_)));
    }

    #[test]
    fn test_env_copy_accepts_single_key_alias() {
        let registry = StepRegistry::builtin();
        let mut config = cfg("env.copy");
        config.source = "../main".to_string();
        config.key = "APP_KEY".to_string();

        let step = registry.create("env.copy", config).unwrap();
        assert!(matches!(step, Step::EnvCopy(_)));
    }

    #[test]
    fn test_db_create_rejects_unknown_type() {
        let registry = StepRegistry::builtin();
        let mut config = cfg("db.create");
        config.step_type = "mongodb".to_string();

        let err = registry.create("db.create", config).unwrap_err();
        assert!(matches!(err, ScaffoldError::Config(_)));
    }

    #[test]
    fn test_custom_registration_wins() {
        let mut registry = StepRegistry::new();
        registry.register("custom.step", |cfg| {
            Ok(Step::CommandRun(CommandRunStep::new(cfg.command, "")))
        });

        let mut config = cfg("custom.step");
        config.command = "true".to_string();
        let step = registry.create("custom.step", config).unwrap();
        assert_eq!(step.name(), "command.run");
    }
}
