//! arbor: multi-branch development with centralized git worktrees and a
//! declarative scaffolding pipeline.
//!
//! A project is linked once; thereafter `arbor work <branch>` creates a
//! worktree under the centralized base directory and runs the project's
//! scaffold preset against it. `arbor remove <branch>` reverses the setup
//! via the cleanup step list before the worktree disappears.

pub mod commands;
pub mod config;
pub mod envfile;
pub mod exec;
pub mod git;
pub mod local_state;
pub mod logging;
pub mod output;
pub mod presets;
pub mod project;
pub mod scaffold;
pub mod utils;

/// Version without build metadata, for clap attributes.
pub const VERSION: &str = env!("ARBOR_VERSION");

/// Version with branch/hash suffix on dev builds, for `arbor --version`.
pub const VERSION_DISPLAY: &str = env!("ARBOR_VERSION_DISPLAY");
