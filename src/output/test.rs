//! Test output implementation for verifying engine output in tests.
//!
//! Captures all output as structured data for easy assertions.

use super::{Output, OutputConfig};

/// A single output entry captured during testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEntry {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    Debug(String),
    Progress(String),
    Detail { key: String, value: String },
    ListItem(String),
    Raw(String),
}

/// Test output implementation that captures all output for assertions.
#[derive(Debug, Default)]
pub struct TestOutput {
    config: OutputConfig,
    entries: Vec<OutputEntry>,
}

impl TestOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    /// Create a test output in verbose mode.
    pub fn verbose() -> Self {
        Self::with_config(OutputConfig::new(false, true))
    }

    /// Get all captured output entries.
    pub fn entries(&self) -> &[OutputEntry] {
        &self.entries
    }

    /// Get all warning messages.
    pub fn warnings(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                OutputEntry::Warning(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Get all error messages.
    pub fn errors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                OutputEntry::Error(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check whether any captured entry of any kind contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| match e {
            OutputEntry::Info(s)
            | OutputEntry::Success(s)
            | OutputEntry::Warning(s)
            | OutputEntry::Error(s)
            | OutputEntry::Debug(s)
            | OutputEntry::Progress(s)
            | OutputEntry::ListItem(s)
            | OutputEntry::Raw(s) => s.contains(needle),
            OutputEntry::Detail { key, value } => key.contains(needle) || value.contains(needle),
        })
    }

    /// Check whether no errors were captured.
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }
}

impl Output for TestOutput {
    fn info(&mut self, msg: &str) {
        self.entries.push(OutputEntry::Info(msg.to_string()));
    }

    fn success(&mut self, msg: &str) {
        self.entries.push(OutputEntry::Success(msg.to_string()));
    }

    fn warning(&mut self, msg: &str) {
        self.entries.push(OutputEntry::Warning(msg.to_string()));
    }

    fn error(&mut self, msg: &str) {
        self.entries.push(OutputEntry::Error(msg.to_string()));
    }

    fn debug(&mut self, msg: &str) {
        self.entries.push(OutputEntry::Debug(msg.to_string()));
    }

    fn progress(&mut self, msg: &str) {
        self.entries.push(OutputEntry::Progress(msg.to_string()));
    }

    fn detail(&mut self, key: &str, value: &str) {
        self.entries.push(OutputEntry::Detail {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn list_item(&mut self, item: &str) {
        self.entries.push(OutputEntry::ListItem(item.to_string()));
    }

    fn raw(&mut self, content: &str) {
        self.entries.push(OutputEntry::Raw(content.to_string()));
    }

    fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    fn is_verbose(&self) -> bool {
        self.config.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_entries_in_order() {
        let mut out = TestOutput::new();
        out.info("first");
        out.warning("second");
        out.error("third");

        assert_eq!(out.entries().len(), 3);
        assert_eq!(out.entries()[0], OutputEntry::Info("first".to_string()));
        assert_eq!(out.warnings(), vec!["second"]);
        assert_eq!(out.errors(), vec!["third"]);
    }

    #[test]
    fn test_contains_searches_all_kinds() {
        let mut out = TestOutput::new();
        out.detail("Database", "shop_swift_runner");
        assert!(out.contains("swift_runner"));
        assert!(!out.contains("absent"));
    }
}
