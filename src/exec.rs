//! Subprocess execution for scaffold steps.
//!
//! The `Commander` trait abstracts process spawning so steps can be
//! exercised in tests without touching the system. The production
//! implementation runs the child in a given working directory with the
//! parent environment inherited and captures stdout and stderr into one
//! buffer.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

/// Maximum subprocess output carried inside error messages.
pub const ERROR_OUTPUT_TAIL: usize = 2048;

/// Outcome of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the child exited with status 0.
    pub success: bool,
    /// Exit code, if the child exited normally.
    pub code: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
}

impl CommandOutput {
    /// The trailing slice of output suitable for error reports.
    pub fn output_tail(&self) -> &str {
        tail(&self.output, ERROR_OUTPUT_TAIL)
    }
}

/// Interface for executing commands.
///
/// A spawn failure (binary missing, permission denied) is an `Err`; a
/// non-zero exit is an `Ok` with `success == false` so callers decide
/// whether that is fatal.
pub trait Commander: Send + Sync {
    fn run(&self, dir: &Path, command: &str, args: &[String]) -> Result<CommandOutput>;

    /// Whether `program` resolves in PATH. Test doubles override this to
    /// simulate missing clients.
    fn available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Production implementation backed by `std::process::Command`.
pub struct SystemCommander;

impl Commander for SystemCommander {
    fn run(&self, dir: &Path, command: &str, args: &[String]) -> Result<CommandOutput> {
        // Children must not inherit stdin: a package manager might block
        // waiting for input that will never come.
        let result = Command::new(command)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to spawn: {command}"))?;

        let mut output = String::from_utf8_lossy(&result.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&result.stderr));

        Ok(CommandOutput {
            success: result.status.success(),
            code: result.status.code(),
            output,
        })
    }
}

/// Convenience wrapper with the invocation patterns steps need.
#[derive(Clone)]
pub struct CommandRunner {
    commander: Arc<dyn Commander>,
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner").finish_non_exhaustive()
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    /// Runner backed by the real system.
    pub fn new() -> Self {
        Self {
            commander: Arc::new(SystemCommander),
        }
    }

    /// Runner backed by a custom commander (tests use `MockCommander`).
    pub fn with_commander(commander: Arc<dyn Commander>) -> Self {
        Self { commander }
    }

    /// Run a binary with arguments. The binary may contain spaces
    /// (e.g. `php artisan`); the extra words become leading arguments.
    pub fn run_binary(&self, dir: &Path, binary: &str, args: &[String]) -> Result<CommandOutput> {
        let mut parts = binary.split_whitespace();
        let command = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty binary command"))?;

        let mut all_args: Vec<String> = parts.map(str::to_string).collect();
        all_args.extend(args.iter().cloned());

        self.commander.run(dir, command, &all_args)
    }

    /// Run a command string through `bash -c`.
    pub fn run_bash(&self, dir: &Path, command: &str) -> Result<CommandOutput> {
        self.commander
            .run(dir, "bash", &["-c".to_string(), command.to_string()])
    }

    /// Run a command string through `sh -c`. More portable than bash.
    pub fn run_shell(&self, dir: &Path, command: &str) -> Result<CommandOutput> {
        self.commander
            .run(dir, "sh", &["-c".to_string(), command.to_string()])
    }

    /// Whether `program` resolves in PATH (per the backing commander).
    pub fn available(&self, program: &str) -> bool {
        self.commander.available(program)
    }
}

/// Return the trailing `max` bytes of `s`, aligned to a char boundary.
pub fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// One recorded invocation, for assertions against a `MockCommander`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub args: Vec<String>,
    pub dir: std::path::PathBuf,
}

/// A canned response matched against the full command line.
struct CannedResponse {
    needle: String,
    output: CommandOutput,
}

/// Test double that records every invocation and replies with canned
/// responses. The first response whose `needle` appears in the joined
/// command line wins; unmatched invocations succeed with empty output.
#[derive(Default)]
pub struct MockCommander {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<Vec<CannedResponse>>,
    unavailable: Mutex<Vec<String>>,
}

impl MockCommander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a program as absent from PATH for `available` checks.
    pub fn set_unavailable(&self, program: &str) {
        self.unavailable
            .lock()
            .expect("mock unavailable poisoned")
            .push(program.to_string());
    }

    /// Register a successful canned response.
    pub fn respond(&self, needle: &str, output: &str) {
        self.responses
            .lock()
            .expect("mock responses poisoned")
            .push(CannedResponse {
                needle: needle.to_string(),
                output: CommandOutput {
                    success: true,
                    code: Some(0),
                    output: output.to_string(),
                },
            });
    }

    /// Register a failing canned response.
    pub fn respond_failure(&self, needle: &str, code: i32, output: &str) {
        self.responses
            .lock()
            .expect("mock responses poisoned")
            .push(CannedResponse {
                needle: needle.to_string(),
                output: CommandOutput {
                    success: false,
                    code: Some(code),
                    output: output.to_string(),
                },
            });
    }

    /// All recorded invocations, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock calls poisoned").clone()
    }

    /// Recorded command lines joined with spaces, for substring asserts.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| {
                let mut line = c.command.clone();
                for arg in &c.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            })
            .collect()
    }
}

impl Commander for MockCommander {
    fn run(&self, dir: &Path, command: &str, args: &[String]) -> Result<CommandOutput> {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .push(RecordedCall {
                command: command.to_string(),
                args: args.to_vec(),
                dir: dir.to_path_buf(),
            });

        let line = {
            let mut line = command.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            line
        };

        let responses = self.responses.lock().expect("mock responses poisoned");
        for canned in responses.iter() {
            if line.contains(&canned.needle) {
                return Ok(canned.output.clone());
            }
        }

        Ok(CommandOutput {
            success: true,
            code: Some(0),
            output: String::new(),
        })
    }

    fn available(&self, program: &str) -> bool {
        !self
            .unavailable
            .lock()
            .expect("mock unavailable poisoned")
            .iter()
            .any(|p| p == program)
    }
}
