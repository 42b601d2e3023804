//! Spinner helper for long-running checks.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Run `f` behind a spinner labelled `label`.
///
/// The spinner is only rendered when stderr is a terminal; otherwise the
/// label is printed as plain text before `f` runs. The spinner is cleared
/// on completion either way, so the caller owns the final success or
/// failure line.
pub fn run_with_spinner<T, E>(label: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    if !std::io::stderr().is_terminal() {
        eprintln!("{label}...");
        return f();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("static spinner template")
            .tick_chars("⠇⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = f();
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_returns_ok() {
        let result: Result<i32, ()> = run_with_spinner("checking", || Ok(42));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_spinner_returns_err() {
        let result: Result<(), String> = run_with_spinner("checking", || Err("boom".to_string()));
        assert_eq!(result, Err("boom".to_string()));
    }
}
