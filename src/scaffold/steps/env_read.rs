//! Step that reads a key from an env-file into a context variable.

use crate::envfile;
use crate::log_debug;
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;

#[derive(Debug)]
pub struct EnvReadStep {
    key: String,
    store_as: String,
    file: String,
}

impl EnvReadStep {
    /// `store_as` defaults to `key`; `file` defaults to `.env`.
    pub fn new(key: impl Into<String>, store_as: &str, file: &str) -> Self {
        let key = key.into();
        let store_as = if store_as.is_empty() {
            key.clone()
        } else {
            store_as.to_string()
        };
        let file = if file.is_empty() { ".env" } else { file };

        Self {
            key,
            store_as,
            file: file.to_string(),
        }
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let env = envfile::read_env_file(&ctx.worktree_path, &self.file);

        match env.get(&self.key) {
            Some(value) => {
                ctx.set_var(&self.store_as, value.clone());
                if opts.verbose {
                    log_debug!("Read {} from {} as {}", self.key, self.file, self.store_as);
                }
                Ok(())
            }
            None => Err(ScaffoldError::KeyNotFound {
                key: self.key.clone(),
                file: self.file.clone(),
            }),
        }
    }
}
