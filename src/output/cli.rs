//! CLI output implementation that writes directly to stdout/stderr.

use super::{Output, OutputConfig};

/// Output format:
/// - `info()` → `println!("{msg}")`
/// - `progress()` → `println!("--> {msg}")`
/// - `warning()` → `eprintln!("Warning: {msg}")`
/// - `error()` → `eprintln!("Error: {msg}")`
#[derive(Debug)]
pub struct CliOutput {
    config: OutputConfig,
}

impl CliOutput {
    /// Create a new CLI output with the given configuration.
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Create a CLI output with default (non-quiet, non-verbose) settings.
    pub fn default_output() -> Self {
        Self::new(OutputConfig::default())
    }
}

impl Output for CliOutput {
    fn info(&mut self, msg: &str) {
        if !self.config.quiet {
            println!("{msg}");
        }
    }

    fn success(&mut self, msg: &str) {
        if !self.config.quiet {
            println!("{msg}");
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("Warning: {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("Error: {msg}");
    }

    fn debug(&mut self, msg: &str) {
        if self.config.verbose {
            println!("Debug: {msg}");
        }
    }

    fn progress(&mut self, msg: &str) {
        if !self.config.quiet {
            println!("--> {msg}");
        }
    }

    fn detail(&mut self, key: &str, value: &str) {
        if !self.config.quiet {
            println!("  {key}: {value}");
        }
    }

    fn list_item(&mut self, item: &str) {
        if !self.config.quiet {
            println!(" - {item}");
        }
    }

    fn raw(&mut self, content: &str) {
        print!("{content}");
    }

    fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    fn is_verbose(&self) -> bool {
        self.config.verbose
    }
}
