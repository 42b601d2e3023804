//! Error taxonomy for the scaffold engine.
//!
//! Steps wrap their underlying failures with the offending key or path;
//! the executor wraps with the failing step's name. The CLI maps these
//! to exit codes: the engine itself never exits or panics, except for
//! lock poisoning, which is an unrecoverable invariant violation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// A step name with no registered factory.
    #[error("unknown step '{0}'")]
    UnknownStep(String),

    /// A step configuration missing a required field or carrying an
    /// invalid value.
    #[error("invalid step configuration: {0}")]
    Config(String),

    /// Template parse failure or reference to a name absent from the
    /// snapshot.
    #[error("invalid template '{template}': {reason}")]
    Template { template: String, reason: String },

    /// `env.read`: the requested key is absent.
    #[error("key '{key}' not found in {file}")]
    KeyNotFound { key: String, file: String },

    /// `env.copy`: at least one requested key is absent (all-or-nothing).
    #[error("keys not found in source: {}", .keys.join(", "))]
    KeysNotFound { keys: Vec<String> },

    /// `env.copy`: the source env-file itself is missing.
    #[error("source file '{0}' does not exist")]
    MissingSource(String),

    /// Pre-flight gate failed; `report` is the grouped breakdown.
    #[error("pre-flight checks failed:\n\n{report}\n\nPlease resolve these issues and try again")]
    PreFlight { report: String },

    /// A child process could not be spawned at all.
    #[error("failed to launch '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// A child process exited non-zero. `output` carries the tail of
    /// its combined stdout and stderr.
    #[error("'{command}' exited with status {code}:\n{output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    /// A required database client is not installed. Fatal for
    /// `db.create`; `db.destroy` logs and skips instead.
    #[error("required client '{0}' not found in PATH")]
    ClientMissing(String),

    /// Neither the step `type` nor `.env` `DB_CONNECTION` named a
    /// usable database engine.
    #[error("could not determine database engine; set `type` on the step or DB_CONNECTION in .env")]
    UnknownEngine,

    /// Worktree-local state could not be read or written.
    #[error("local state error: {0}")]
    State(String),

    /// Filesystem failure with the operation that caused it.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A step failed; `source` is the step-local error.
    #[error("step '{name}' failed: {source}")]
    Step {
        name: String,
        #[source]
        source: Box<ScaffoldError>,
    },
}

impl ScaffoldError {
    /// Wrap an I/O error with a human-readable operation description.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a step-local error with the step's name.
    pub fn for_step(name: impl Into<String>, source: ScaffoldError) -> Self {
        Self::Step {
            name: name.into(),
            source: Box::new(source),
        }
    }
}
