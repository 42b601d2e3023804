//! Database create and destroy steps.
//!
//! Database names are `{prefix}_{suffix}` where the prefix comes from a
//! `--prefix` argument or the sanitized site name, and the suffix is the
//! invocation-wide `adjective_noun` token. The suffix is generated at
//! most once per invocation and persisted to the worktree's local state
//! so cleanup can find every database it belongs to.

use crate::envfile;
use crate::exec::CommandRunner;
use crate::local_state::{self, LocalState};
use crate::scaffold::context::ScaffoldContext;
use crate::scaffold::error::{Result, ScaffoldError};
use crate::scaffold::steps::StepOptions;
use crate::scaffold::words;
use crate::utils::sanitize_site_name;
use crate::{log_debug, log_warning};
use std::fs;

/// PostgreSQL identifier limit; MySQL allows 64, so the lower bound wins.
const MAX_DB_NAME_LEN: usize = 63;

/// How often `db.create` retries a name that already exists.
const CREATE_ATTEMPTS: u32 = 5;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEngine {
    Mysql,
    Pgsql,
    Sqlite,
}

impl DbEngine {
    /// Parse an engine name as written in step config or `.env`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mysql" | "mariadb" => Some(DbEngine::Mysql),
            "pgsql" | "postgres" | "postgresql" => Some(DbEngine::Pgsql),
            "sqlite" => Some(DbEngine::Sqlite),
            _ => None,
        }
    }

    /// The command-line client for this engine, if it has one.
    fn client(&self) -> Option<&'static str> {
        match self {
            DbEngine::Mysql => Some("mysql"),
            DbEngine::Pgsql => Some("psql"),
            DbEngine::Sqlite => None,
        }
    }
}

/// Resolve the engine: explicit `type` wins, then `.env` `DB_CONNECTION`.
fn resolve_engine(explicit: Option<DbEngine>, ctx: &ScaffoldContext) -> Result<DbEngine> {
    if let Some(engine) = explicit {
        return Ok(engine);
    }
    envfile::read_env_value(&ctx.worktree_path, ".env", "DB_CONNECTION")
        .as_deref()
        .and_then(DbEngine::parse)
        .ok_or(ScaffoldError::UnknownEngine)
}

/// Connection flags read from the worktree `.env`, with client defaults.
struct ConnectionParams {
    user: String,
    password: String,
    host: String,
    port: String,
}

fn connection_params(ctx: &ScaffoldContext, engine: DbEngine) -> ConnectionParams {
    let env = envfile::read_env_file(&ctx.worktree_path, ".env");
    let get = |key: &str, default: &str| {
        env.get(key)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    let (default_user, default_port) = match engine {
        DbEngine::Mysql => ("root", "3306"),
        DbEngine::Pgsql => ("postgres", "5432"),
        DbEngine::Sqlite => ("", ""),
    };

    ConnectionParams {
        user: get("DB_USERNAME", default_user),
        password: get("DB_PASSWORD", ""),
        host: get("DB_HOST", "127.0.0.1"),
        port: get("DB_PORT", default_port),
    }
}

fn client_args(params: &ConnectionParams, engine: DbEngine) -> Vec<String> {
    match engine {
        DbEngine::Mysql => {
            let mut args = vec![
                "-u".to_string(),
                params.user.clone(),
                "-h".to_string(),
                params.host.clone(),
                "-P".to_string(),
                params.port.clone(),
            ];
            if !params.password.is_empty() {
                args.push(format!("-p{}", params.password));
            }
            args
        }
        DbEngine::Pgsql => vec![
            "-U".to_string(),
            params.user.clone(),
            "-h".to_string(),
            params.host.clone(),
            "-p".to_string(),
            params.port.clone(),
        ],
        DbEngine::Sqlite => Vec::new(),
    }
}

/// Compose `{prefix}_{suffix}`, truncating the prefix portion to keep
/// the whole name within the PostgreSQL limit.
fn compose_db_name(prefix: &str, suffix: &str) -> String {
    let name = if prefix.is_empty() {
        suffix.to_string()
    } else {
        format!("{prefix}_{suffix}")
    };
    if name.len() <= MAX_DB_NAME_LEN {
        return name;
    }

    let keep = MAX_DB_NAME_LEN.saturating_sub(suffix.len() + 1);
    let trimmed: String = prefix.chars().take(keep).collect();
    let trimmed = trimmed.trim_end_matches('_');
    if trimmed.is_empty() {
        suffix.chars().take(MAX_DB_NAME_LEN).collect()
    } else {
        format!("{trimmed}_{suffix}")
    }
}

/// Pull the value following `--prefix` out of a step's args.
fn prefix_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--prefix")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn persist_suffix(ctx: &ScaffoldContext, suffix: &str) -> Result<()> {
    local_state::write_local_state(
        &ctx.worktree_path,
        &LocalState {
            db_suffix: suffix.to_string(),
        },
    )
    .map_err(|e| ScaffoldError::State(format!("{e:#}")))
}

/// Creates a database named after the site and the shared suffix.
#[derive(Debug)]
pub struct DbCreateStep {
    engine: Option<DbEngine>,
    args: Vec<String>,
    store_as: String,
    runner: CommandRunner,
}

impl DbCreateStep {
    pub fn new(engine: Option<DbEngine>, args: Vec<String>) -> Self {
        Self {
            engine,
            args,
            store_as: String::new(),
            runner: CommandRunner::new(),
        }
    }

    /// Store the created database name as a context variable.
    pub fn with_store_as(mut self, store_as: impl Into<String>) -> Self {
        self.store_as = store_as.into();
        self
    }

    pub fn with_runner(mut self, runner: CommandRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let engine = resolve_engine(self.engine, ctx)?;

        // Shared-suffix rule: reuse the invocation's suffix when one is
        // already set; otherwise generate and persist one now.
        let existing = ctx.get_db_suffix();
        let generated_here = existing.is_empty();
        let mut suffix = if generated_here {
            let fresh = ctx.set_db_suffix(words::generate());
            persist_suffix(ctx, &fresh)?;
            fresh
        } else {
            existing
        };

        let prefix = prefix_arg(&self.args)
            .map(str::to_string)
            .unwrap_or_else(|| sanitize_site_name(&ctx.site_name));

        let mut attempt = 1;
        loop {
            let db_name = compose_db_name(&prefix, &suffix);
            if opts.verbose {
                log_debug!("Creating database '{db_name}'");
            }

            match self.create_database(ctx, engine, &db_name)? {
                CreateOutcome::Created => {
                    if !self.store_as.is_empty() {
                        ctx.set_var(&self.store_as, db_name);
                    }
                    return Ok(());
                }
                CreateOutcome::AlreadyExists { code, output } => {
                    if attempt >= CREATE_ATTEMPTS {
                        return Err(ScaffoldError::CommandFailed {
                            command: "db.create".to_string(),
                            code,
                            output,
                        });
                    }
                    attempt += 1;
                    // Only a suffix generated by this step may be
                    // regenerated; an inherited one is authoritative.
                    if generated_here {
                        suffix = words::generate();
                        ctx.reset_db_suffix(&suffix);
                        persist_suffix(ctx, &suffix)?;
                        log_debug!("Database exists, retrying with suffix '{suffix}'");
                    }
                }
            }
        }
    }

    fn create_database(
        &self,
        ctx: &ScaffoldContext,
        engine: DbEngine,
        db_name: &str,
    ) -> Result<CreateOutcome> {
        let statement = match engine {
            DbEngine::Mysql => format!("CREATE DATABASE IF NOT EXISTS `{db_name}`"),
            DbEngine::Pgsql => format!("CREATE DATABASE \"{db_name}\""),
            DbEngine::Sqlite => {
                // No server: the database is a file under database/.
                let db_dir = ctx.worktree_path.join("database");
                fs::create_dir_all(&db_dir)
                    .map_err(|e| ScaffoldError::io("creating database directory", e))?;
                let db_file = db_dir.join(format!("{db_name}.sqlite"));
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&db_file)
                    .map_err(|e| {
                        ScaffoldError::io(format!("creating {}", db_file.display()), e)
                    })?;
                return Ok(CreateOutcome::Created);
            }
        };

        let client = engine.client().expect("server engines have a client");
        if !self.runner.available(client) {
            return Err(ScaffoldError::ClientMissing(client.to_string()));
        }

        let params = connection_params(ctx, engine);
        let mut args = client_args(&params, engine);
        match engine {
            DbEngine::Mysql => args.extend(["-e".to_string(), statement]),
            DbEngine::Pgsql => args.extend(["-c".to_string(), statement]),
            DbEngine::Sqlite => unreachable!(),
        }

        let result = self
            .runner
            .run_binary(&ctx.worktree_path, client, &args)
            .map_err(|e| ScaffoldError::Spawn {
                command: client.to_string(),
                reason: format!("{e:#}"),
            })?;

        if result.success {
            return Ok(CreateOutcome::Created);
        }
        if result.output.contains("already exists") {
            return Ok(CreateOutcome::AlreadyExists {
                code: result.code.unwrap_or(-1),
                output: result.output_tail().to_string(),
            });
        }
        Err(ScaffoldError::CommandFailed {
            command: "db.create".to_string(),
            code: result.code.unwrap_or(-1),
            output: result.output_tail().to_string(),
        })
    }
}

enum CreateOutcome {
    Created,
    AlreadyExists { code: i32, output: String },
}

/// Drops every database carrying the invocation's suffix.
///
/// Missing clients and missing suffixes are non-fatal: cleanup should
/// never block a worktree removal over tooling gaps.
#[derive(Debug)]
pub struct DbDestroyStep {
    engine: Option<DbEngine>,
    runner: CommandRunner,
}

impl DbDestroyStep {
    pub fn new(engine: Option<DbEngine>) -> Self {
        Self {
            engine,
            runner: CommandRunner::new(),
        }
    }

    pub fn with_runner(mut self, runner: CommandRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn run(&self, ctx: &ScaffoldContext, opts: &StepOptions) -> Result<()> {
        let mut suffix = ctx.get_db_suffix();
        if suffix.is_empty() {
            suffix = local_state::read_local_state(&ctx.worktree_path)
                .map_err(|e| ScaffoldError::State(format!("{e:#}")))?
                .db_suffix;
        }
        if suffix.is_empty() {
            log_debug!("No db suffix recorded; nothing to clean up");
            return Ok(());
        }

        let engine = match resolve_engine(self.engine, ctx) {
            Ok(engine) => engine,
            Err(_) => {
                log_warning!("Could not determine database engine; skipping db.destroy");
                return Ok(());
            }
        };

        let client = match engine.client() {
            Some(client) => client,
            None => return Ok(()), // sqlite: worktree removal takes the file
        };
        if !self.runner.available(client) {
            log_warning!("'{client}' not found in PATH; skipping db.destroy");
            return Ok(());
        }

        let params = connection_params(ctx, engine);
        let base_args = client_args(&params, engine);

        let databases = self.enumerate(ctx, engine, &base_args, &suffix)?;
        for db_name in databases {
            if opts.verbose {
                log_debug!("Dropping database '{db_name}'");
            }
            self.drop_database(ctx, engine, &base_args, &db_name)?;
        }

        Ok(())
    }

    fn enumerate(
        &self,
        ctx: &ScaffoldContext,
        engine: DbEngine,
        base_args: &[String],
        suffix: &str,
    ) -> Result<Vec<String>> {
        let mut args = base_args.to_vec();
        let client = match engine {
            DbEngine::Mysql => {
                args.extend([
                    "-N".to_string(),
                    "-e".to_string(),
                    format!("SHOW DATABASES LIKE '%_{suffix}'"),
                ]);
                "mysql"
            }
            DbEngine::Pgsql => {
                args.extend([
                    "-t".to_string(),
                    "-A".to_string(),
                    "-c".to_string(),
                    format!(
                        "SELECT datname FROM pg_database \
                         WHERE datname LIKE '%_{suffix}' AND NOT datistemplate"
                    ),
                ]);
                "psql"
            }
            DbEngine::Sqlite => return Ok(Vec::new()),
        };

        let result = self
            .runner
            .run_binary(&ctx.worktree_path, client, &args)
            .map_err(|e| ScaffoldError::Spawn {
                command: client.to_string(),
                reason: format!("{e:#}"),
            })?;

        if !result.success {
            return Err(ScaffoldError::CommandFailed {
                command: "db.destroy".to_string(),
                code: result.code.unwrap_or(-1),
                output: result.output_tail().to_string(),
            });
        }

        Ok(result
            .output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn drop_database(
        &self,
        ctx: &ScaffoldContext,
        engine: DbEngine,
        base_args: &[String],
        db_name: &str,
    ) -> Result<()> {
        let mut args = base_args.to_vec();
        let client = match engine {
            DbEngine::Mysql => {
                args.extend([
                    "-e".to_string(),
                    format!("DROP DATABASE IF EXISTS `{db_name}`"),
                ]);
                "mysql"
            }
            DbEngine::Pgsql => {
                args.extend([
                    "-c".to_string(),
                    format!("DROP DATABASE IF EXISTS \"{db_name}\""),
                ]);
                "psql"
            }
            DbEngine::Sqlite => return Ok(()),
        };

        let result = self
            .runner
            .run_binary(&ctx.worktree_path, client, &args)
            .map_err(|e| ScaffoldError::Spawn {
                command: client.to_string(),
                reason: format!("{e:#}"),
            })?;

        if !result.success {
            return Err(ScaffoldError::CommandFailed {
                command: "db.destroy".to_string(),
                code: result.code.unwrap_or(-1),
                output: result.output_tail().to_string(),
            });
        }
        Ok(())
    }
}
