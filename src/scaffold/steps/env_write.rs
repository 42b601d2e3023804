//! Step that writes a templated `key=value` into an env-file.

use crate::envfile;
use crate::log_debug;
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;
use crate::scaffold::template;

#[derive(Debug)]
pub struct EnvWriteStep {
    key: String,
    value: String,
    file: String,
}

impl EnvWriteStep {
    /// `file` defaults to `.env`.
    pub fn new(key: impl Into<String>, value: impl Into<String>, file: &str) -> Self {
        let file = if file.is_empty() { ".env" } else { file };
        Self {
            key: key.into(),
            value: value.into(),
            file: file.to_string(),
        }
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let snapshot = ctx.snapshot_for_template();
        let value = template::render(&self.value, &snapshot)?;

        let path = ctx.worktree_path.join(&self.file);
        envfile::write_key(&path, &self.key, &value)
            .map_err(|e| ScaffoldError::io(format!("updating {}", path.display()), e))?;

        if opts.verbose {
            log_debug!("Wrote {}={} to {}", self.key, value, self.file);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn make_ctx(dir: &std::path::Path) -> ScaffoldContext {
        ScaffoldContext::new(dir, "main", "shop", "myapp", "")
    }

    #[test]
    fn test_creates_file_with_templated_value() {
        let dir = tempdir().unwrap();
        let ctx = make_ctx(dir.path());
        ctx.set_db_suffix("swift_runner");

        EnvWriteStep::new("DB_DATABASE", "{{ .SiteName }}_{{ .DbSuffix }}", "")
            .run(&ctx, &StepOptions::default())
            .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join(".env")).unwrap(),
            "DB_DATABASE=myapp_swift_runner\n"
        );
    }

    #[test]
    fn test_updates_existing_key_in_place() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            "# db settings\nDB_DATABASE=old\nDB_HOST=localhost\n",
        )
        .unwrap();
        let ctx = make_ctx(dir.path());

        EnvWriteStep::new("DB_DATABASE", "myapp_updated", "")
            .run(&ctx, &StepOptions::default())
            .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join(".env")).unwrap(),
            "# db settings\nDB_DATABASE=myapp_updated\nDB_HOST=localhost\n"
        );
    }

    #[test]
    fn test_template_failure_fails_before_touching_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "KEEP=1\n").unwrap();
        let ctx = make_ctx(dir.path());

        let err = EnvWriteStep::new("X", "{{ .Missing }}", "")
            .run(&ctx, &StepOptions::default())
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::Template { .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join(".env")).unwrap(),
            "KEEP=1\n"
        );
    }

    #[test]
    fn test_custom_file_in_subdirectory() {
        let dir = tempdir().unwrap();
        let ctx = make_ctx(dir.path());

        EnvWriteStep::new("K", "v", "config/.env.local")
            .run(&ctx, &StepOptions::default())
            .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("config/.env.local")).unwrap(),
            "K=v\n"
        );
    }
}
