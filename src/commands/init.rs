//! `arbor init`: write a starter `arbor.yaml` for the current project.

use crate::config::{self, Config};
use crate::git;
use crate::logging::init_logging;
use crate::output::Output;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(name = "init")]
#[command(about = "Create arbor.yaml for the current project")]
#[command(long_about = "\
Writes a starter arbor.yaml at the project root. The preset is detected
from the project contents unless given explicitly; the site name
defaults to the project directory name.")]
pub struct Args {
    /// Site name used in database names and templates.
    #[arg(long)]
    pub site_name: Option<String>,

    /// Preset to pin instead of relying on detection.
    #[arg(long)]
    pub preset: Option<String>,

    /// Overwrite settings in an existing arbor.yaml.
    #[arg(long)]
    pub force: bool,

    #[arg(short, long, help = "Be verbose")]
    pub verbose: bool,
}

pub fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, false);
    let mut output = super::build_output(false, args.verbose);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    if !git::is_git_repository(&cwd) {
        anyhow::bail!("Not inside a Git repository");
    }
    let root = git::get_project_root(&cwd)?;

    let config_path = root.join(config::PROJECT_CONFIG_FILE);
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to update it)",
            config_path.display()
        );
    }

    let project_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .context("Failed to determine project name")?
        .to_string();

    let manager = super::build_manager();
    let preset = args
        .preset
        .or_else(|| manager.detect_preset(&root).map(str::to_string))
        .unwrap_or_default();

    let config = Config {
        site_name: args.site_name.unwrap_or(project_name),
        preset: preset.clone(),
        default_branch: git::detect_default_branch(&root)?,
        ..Default::default()
    };

    config::save_project(&root, &config)?;

    output.detail("Site name", &config.site_name);
    if preset.is_empty() {
        output.detail("Preset", "(none detected)");
    } else {
        output.detail("Preset", &preset);
    }
    output.detail("Default branch", &config.default_branch);
    output.success(&format!("Wrote {}", config_path.display()));
    Ok(())
}
