//! Pre-flight gate evaluated before any scaffold step runs.
//!
//! Pass/fail comes from the condition evaluator; on failure the user
//! gets a grouped breakdown of what is missing instead of a bare "no".

use super::condition::{evaluate, ConditionMap, ConditionValue};
use super::error::{Result, ScaffoldError};
use crate::output::run_with_spinner;
use std::path::Path;

/// Run the pre-flight condition. A spinner is shown unless `quiet`.
pub fn run_preflight(condition: &ConditionMap, worktree: &Path, quiet: bool) -> Result<()> {
    if condition.is_empty() {
        return Ok(());
    }

    let check = || check_preflight(condition, worktree);
    if quiet {
        check()
    } else {
        run_with_spinner("Running pre-flight checks", check)
    }
}

fn check_preflight(condition: &ConditionMap, worktree: &Path) -> Result<()> {
    if evaluate(condition, worktree) {
        return Ok(());
    }
    Err(ScaffoldError::PreFlight {
        report: build_report(condition, worktree),
    })
}

/// Itemize the first failing entries by kind: env vars, commands, files.
fn build_report(condition: &ConditionMap, worktree: &Path) -> String {
    let mut sections = Vec::new();

    if let Some(value) = condition.get("env_exists") {
        let missing = missing_env_vars(value);
        if !missing.is_empty() {
            sections.push(format_section("Missing environment variables", &missing));
        }
    }

    if let Some(value) = condition.get("command_exists") {
        let missing = missing_commands(value);
        if !missing.is_empty() {
            sections.push(format_section("Missing commands", &missing));
        }
    }

    if let Some(value) = condition.get("file_exists") {
        let missing = missing_files(value, worktree);
        if !missing.is_empty() {
            sections.push(format_section("Missing files", &missing));
        }
    }

    if sections.is_empty() {
        return "Condition not satisfied".to_string();
    }
    sections.join("\n\n")
}

fn format_section(title: &str, items: &[String]) -> String {
    format!("{title}:\n  - {}", items.join("\n  - "))
}

fn missing_env_vars(value: &ConditionValue) -> Vec<String> {
    value
        .as_strings()
        .unwrap_or_default()
        .into_iter()
        .filter(|name| std::env::var_os(name).is_none())
        .map(str::to_string)
        .collect()
}

fn missing_commands(value: &ConditionValue) -> Vec<String> {
    value
        .as_strings()
        .unwrap_or_default()
        .into_iter()
        .filter(|name| which::which(name).is_err())
        .map(str::to_string)
        .collect()
}

fn missing_files(value: &ConditionValue, worktree: &Path) -> Vec<String> {
    value
        .as_strings()
        .unwrap_or_default()
        .into_iter()
        .filter(|path| !worktree.join(path).exists())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cond(yaml: &str) -> ConditionMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_empty_condition_passes() {
        let dir = tempdir().unwrap();
        run_preflight(&ConditionMap::new(), dir.path(), true).unwrap();
    }

    #[test]
    fn test_satisfied_condition_passes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "").unwrap();
        run_preflight(&cond("file_exists: .env\ncommand_exists: sh"), dir.path(), true).unwrap();
    }

    #[test]
    fn test_failure_groups_missing_items() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env.op"), "").unwrap();
        std::env::remove_var("ARBOR_PF_VAULT");
        std::env::remove_var("ARBOR_PF_ITEM");

        let condition = cond(
            "env_exists: [ARBOR_PF_VAULT, ARBOR_PF_ITEM]\n\
             command_exists: definitely-not-a-command-xyz\n\
             file_exists: .env.op",
        );

        let err = run_preflight(&condition, dir.path(), true).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("pre-flight checks failed"));
        assert!(msg.contains("Missing environment variables:"));
        assert!(msg.contains("- ARBOR_PF_VAULT"));
        assert!(msg.contains("- ARBOR_PF_ITEM"));
        assert!(msg.contains("Missing commands:"));
        assert!(msg.contains("- definitely-not-a-command-xyz"));
        // The file that exists is not reported.
        assert!(!msg.contains("Missing files:"));
        assert!(msg.contains("Please resolve these issues and try again"));
    }

    #[test]
    fn test_failure_without_itemizable_kind_still_reports() {
        let dir = tempdir().unwrap();
        let err = run_preflight(&cond("env_file_contains: {key: APP_KEY}"), dir.path(), true)
            .unwrap_err();
        assert!(err.to_string().contains("pre-flight checks failed"));
    }
}
