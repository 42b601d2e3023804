//! Condition DSL for gating steps and the pre-flight check.
//!
//! A condition is a YAML mapping of predicate name to value. Multiple
//! keys in one mapping are joined by AND; an empty mapping is true;
//! unknown keys are false (fail closed). Evaluation never mutates
//! state, and I/O errors count as "condition not met".

use crate::envfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A condition mapping as loaded verbatim from YAML.
pub type ConditionMap = BTreeMap<String, ConditionValue>;

/// A condition value: bool, string, list of strings, or nested mapping.
///
/// Typing errors (numbers, mixed lists) surface during YAML
/// deserialization, not during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    String(String),
    List(Vec<String>),
    Map(ConditionMap),
}

impl ConditionValue {
    /// Coerce a string or list value into a list of strings.
    pub fn as_strings(&self) -> Option<Vec<&str>> {
        match self {
            ConditionValue::String(s) => Some(vec![s.as_str()]),
            ConditionValue::List(items) => Some(items.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// The nested mapping, for `not` and `env_file_contains`.
    pub fn as_map(&self) -> Option<&ConditionMap> {
        match self {
            ConditionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    fn as_single_string(&self) -> Option<&str> {
        match self {
            ConditionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Evaluate a condition mapping against a worktree.
pub fn evaluate(condition: &ConditionMap, worktree: &Path) -> bool {
    condition
        .iter()
        .all(|(key, value)| evaluate_entry(key, value, worktree))
}

fn evaluate_entry(key: &str, value: &ConditionValue, worktree: &Path) -> bool {
    match key {
        "file_exists" => match value.as_strings() {
            Some(paths) => paths.iter().all(|p| worktree.join(p).exists()),
            None => false,
        },
        "env_exists" => match value.as_strings() {
            Some(names) => names.iter().all(|n| std::env::var_os(n).is_some()),
            None => false,
        },
        "command_exists" => match value.as_strings() {
            Some(names) => names.iter().all(|n| which::which(n).is_ok()),
            None => false,
        },
        "env_file_contains" => {
            let Some(map) = value.as_map() else {
                return false;
            };
            let file = map
                .get("file")
                .and_then(ConditionValue::as_single_string)
                .unwrap_or(".env");
            let Some(env_key) = map.get("key").and_then(ConditionValue::as_single_string) else {
                return false;
            };
            envfile::read_env_value(worktree, file, env_key)
                .map(|v| !v.is_empty())
                .unwrap_or(false)
        }
        "env_file_missing" => {
            // "missing" means absent or empty, always against `.env`.
            let Some(env_key) = value.as_single_string() else {
                return false;
            };
            envfile::read_env_value(worktree, ".env", env_key)
                .map(|v| v.is_empty())
                .unwrap_or(true)
        }
        "os" => match value.as_strings() {
            Some(names) => names.iter().any(|n| os_matches(n)),
            None => false,
        },
        "not" => match value.as_map() {
            Some(nested) => !evaluate(nested, worktree),
            None => false,
        },
        _ => false,
    }
}

fn os_matches(name: &str) -> bool {
    // Configs written against the Go original use GOOS names.
    let normalized = match name {
        "darwin" => "macos",
        other => other,
    };
    normalized == std::env::consts::OS
}
