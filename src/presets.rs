//! Code-defined default step lists per project type.
//!
//! A preset contributes scaffold and cleanup steps for a project kind
//! and can detect itself from the worktree contents. Presets register
//! into the scaffold manager at startup; `arbor.yaml`'s `preset` key
//! overrides detection.

use crate::config::{CleanupStep, StepConfig};
use crate::scaffold::condition::ConditionMap;
use std::path::Path;

pub trait Preset: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this preset applies to the given worktree.
    fn detect(&self, path: &Path) -> bool;

    fn default_steps(&self) -> Vec<StepConfig>;

    fn cleanup_steps(&self) -> Vec<CleanupStep>;
}

/// The presets compiled into the binary, in detection order.
pub fn default_presets() -> Vec<Box<dyn Preset>> {
    vec![Box::new(Laravel), Box::new(LaravelSharedDb)]
}

fn condition(yaml: &str) -> ConditionMap {
    serde_yaml::from_str(yaml).expect("static preset condition")
}

/// Standard Laravel project: per-worktree database, fresh migrations,
/// Herd site link.
pub struct Laravel;

impl Preset for Laravel {
    fn name(&self) -> &str {
        "laravel"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("artisan").exists() && path.join("composer.json").exists()
    }

    fn default_steps(&self) -> Vec<StepConfig> {
        vec![
            StepConfig {
                name: "php.composer".into(),
                args: vec!["install".into()],
                condition: condition("file_exists: composer.lock"),
                ..Default::default()
            },
            StepConfig {
                name: "php.composer".into(),
                args: vec!["update".into()],
                condition: condition("not: {file_exists: composer.lock}"),
                ..Default::default()
            },
            StepConfig {
                name: "file.copy".into(),
                from: ".env.example".into(),
                to: ".env".into(),
                ..Default::default()
            },
            StepConfig {
                name: "php.laravel.artisan".into(),
                args: vec!["key:generate".into(), "--no-interaction".into()],
                condition: condition("env_file_missing: APP_KEY"),
                ..Default::default()
            },
            StepConfig {
                name: "db.create".into(),
                ..Default::default()
            },
            StepConfig {
                name: "env.write".into(),
                key: "DB_DATABASE".into(),
                value: "{{ .SiteName }}_{{ .DbSuffix }}".into(),
                ..Default::default()
            },
            StepConfig {
                name: "node.npm".into(),
                args: vec!["ci".into()],
                condition: condition("file_exists: package-lock.json"),
                ..Default::default()
            },
            StepConfig {
                name: "php.laravel.artisan".into(),
                args: vec![
                    "migrate:fresh".into(),
                    "--seed".into(),
                    "--no-interaction".into(),
                ],
                ..Default::default()
            },
            StepConfig {
                name: "node.npm".into(),
                args: vec!["run".into(), "build".into()],
                condition: condition("file_exists: package-lock.json"),
                ..Default::default()
            },
            StepConfig {
                name: "php.laravel.artisan".into(),
                args: vec!["storage:link".into(), "--no-interaction".into()],
                ..Default::default()
            },
            StepConfig {
                name: "herd".into(),
                args: vec!["link".into(), "--secure".into(), "{{ .SiteName }}".into()],
                ..Default::default()
            },
        ]
    }

    fn cleanup_steps(&self) -> Vec<CleanupStep> {
        vec![
            CleanupStep {
                name: "db.destroy".into(),
                ..Default::default()
            },
            CleanupStep {
                name: "herd".into(),
                ..Default::default()
            },
        ]
    }
}

/// Laravel variant where every worktree shares one database. Useful
/// when parallel worktrees need access to the same data. Activated only
/// via `arbor.yaml`, never by detection.
pub struct LaravelSharedDb;

impl Preset for LaravelSharedDb {
    fn name(&self) -> &str {
        "laravel-shared-db"
    }

    fn detect(&self, _path: &Path) -> bool {
        false
    }

    fn default_steps(&self) -> Vec<StepConfig> {
        vec![
            StepConfig {
                name: "php.composer".into(),
                args: vec!["install".into()],
                condition: condition("file_exists: composer.lock"),
                ..Default::default()
            },
            StepConfig {
                name: "php.composer".into(),
                args: vec!["update".into()],
                condition: condition("not: {file_exists: composer.lock}"),
                ..Default::default()
            },
            StepConfig {
                name: "file.copy".into(),
                from: ".env.example".into(),
                to: ".env".into(),
                ..Default::default()
            },
            StepConfig {
                name: "php.laravel.artisan".into(),
                args: vec!["key:generate".into(), "--no-interaction".into()],
                condition: condition("env_file_missing: APP_KEY"),
                ..Default::default()
            },
            // No db.create and no DB_DATABASE write: the shared
            // database name in .env.example must survive as-is.
            StepConfig {
                name: "node.npm".into(),
                args: vec!["ci".into()],
                condition: condition("file_exists: package-lock.json"),
                ..Default::default()
            },
            StepConfig {
                name: "node.npm".into(),
                args: vec!["run".into(), "build".into()],
                condition: condition("file_exists: package-lock.json"),
                ..Default::default()
            },
            StepConfig {
                name: "php.laravel.artisan".into(),
                args: vec!["storage:link".into(), "--no-interaction".into()],
                ..Default::default()
            },
            StepConfig {
                name: "herd".into(),
                args: vec!["link".into(), "--secure".into(), "{{ .SiteName }}".into()],
                ..Default::default()
            },
        ]
    }

    fn cleanup_steps(&self) -> Vec<CleanupStep> {
        // No db.destroy: the shared database outlives any one worktree.
        vec![CleanupStep {
            name: "herd".into(),
            ..Default::default()
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_laravel_detection() {
        let dir = tempdir().unwrap();
        let preset = Laravel;
        assert!(!preset.detect(dir.path()));

        fs::write(dir.path().join("artisan"), "").unwrap();
        assert!(!preset.detect(dir.path()));

        fs::write(dir.path().join("composer.json"), "{}").unwrap();
        assert!(preset.detect(dir.path()));
    }

    #[test]
    fn test_shared_db_never_detects() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("artisan"), "").unwrap();
        fs::write(dir.path().join("composer.json"), "{}").unwrap();
        assert!(!LaravelSharedDb.detect(dir.path()));
    }

    #[test]
    fn test_laravel_steps_include_database_lifecycle() {
        let steps = Laravel.default_steps();
        let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"db.create"));
        assert!(names.contains(&"env.write"));

        let cleanup = Laravel.cleanup_steps();
        assert!(cleanup.iter().any(|s| s.name == "db.destroy"));
    }

    #[test]
    fn test_shared_db_omits_database_lifecycle() {
        let steps = LaravelSharedDb.default_steps();
        assert!(!steps.iter().any(|s| s.name == "db.create"));
        assert!(!steps.iter().any(|s| s.name == "env.write"));

        let cleanup = LaravelSharedDb.cleanup_steps();
        assert!(!cleanup.iter().any(|s| s.name == "db.destroy"));
    }

    #[test]
    fn test_default_presets_order() {
        let presets = default_presets();
        assert_eq!(presets[0].name(), "laravel");
        assert_eq!(presets[1].name(), "laravel-shared-db");
    }

    #[test]
    fn test_producers_precede_consumers_in_laravel() {
        let steps = Laravel.default_steps();
        let create = steps.iter().position(|s| s.name == "db.create").unwrap();
        let write = steps
            .iter()
            .position(|s| s.name == "env.write" && s.key == "DB_DATABASE")
            .unwrap();
        assert!(create < write);
    }
}
