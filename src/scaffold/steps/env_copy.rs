//! Step that copies env keys from another worktree's env-file.
//!
//! All-or-nothing: if any requested key is missing in the source, the
//! target file is not modified. Copied values are written verbatim -
//! no template substitution.

use crate::envfile;
use crate::log_debug;
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;
use std::path::PathBuf;

#[derive(Debug)]
pub struct EnvCopyStep {
    source: String,
    source_file: String,
    file: String,
    keys: Vec<String>,
}

impl EnvCopyStep {
    /// `source_file` and `file` default to `.env`.
    pub fn new(source: impl Into<String>, source_file: &str, file: &str, keys: Vec<String>) -> Self {
        let source_file = if source_file.is_empty() {
            ".env"
        } else {
            source_file
        };
        let file = if file.is_empty() { ".env" } else { file };

        Self {
            source: source.into(),
            source_file: source_file.to_string(),
            file: file.to_string(),
            keys,
        }
    }

    fn source_dir(&self, ctx: &ScaffoldContext) -> PathBuf {
        let source = PathBuf::from(&self.source);
        if source.is_absolute() {
            source
        } else {
            ctx.worktree_path.join(source)
        }
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let source_dir = self.source_dir(ctx);
        let source_path = source_dir.join(&self.source_file);

        if !source_path.exists() {
            return Err(ScaffoldError::MissingSource(
                source_path.display().to_string(),
            ));
        }

        let source_env = envfile::read_env_file(&source_dir, &self.source_file);

        let mut missing = Vec::new();
        let mut pairs = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            match source_env.get(key) {
                Some(value) => pairs.push((key.clone(), value.clone())),
                None => missing.push(key.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(ScaffoldError::KeysNotFound { keys: missing });
        }

        let target = ctx.worktree_path.join(&self.file);
        envfile::write_keys(&target, &pairs)
            .map_err(|e| ScaffoldError::io(format!("updating {}", target.display()), e))?;

        if opts.verbose {
            log_debug!(
                "Copied {} key(s) from {} to {}",
                pairs.len(),
                source_path.display(),
                self.file
            );
        }

        Ok(())
    }
}
