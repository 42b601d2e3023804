//! Step that copies one file to another inside the worktree.

use crate::log_debug;
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;
use std::fs;

/// Byte-for-byte copy of `from` to `to`, both relative to the worktree.
/// No templating of file contents, not atomic.
#[derive(Debug)]
pub struct FileCopyStep {
    from: String,
    to: String,
}

impl FileCopyStep {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Runs only when the source exists.
    pub fn condition(&self, ctx: &ScaffoldContext) -> bool {
        ctx.worktree_path.join(&self.from).exists()
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let from_path = ctx.worktree_path.join(&self.from);
        let to_path = ctx.worktree_path.join(&self.to);

        if opts.verbose {
            log_debug!("Copying {} to {}", self.from, self.to);
        }

        fs::copy(&from_path, &to_path).map_err(|e| {
            ScaffoldError::io(
                format!("copying {} to {}", from_path.display(), to_path.display()),
                e,
            )
        })?;

        Ok(())
    }
}
