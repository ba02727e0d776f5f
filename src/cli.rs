//! CLI argument parsing and credential resolution.

use clap::{Parser, Subcommand};
use console::{Term, style};
use secrecy::SecretString;
use std::env;

use crate::{
    analyzer::version::ReleaseType,
    config::DEFAULT_CONFIG_FILE,
    error::Error,
    result::Result,
};

/// Global CLI arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = "", global = true)]
    /// GitHub personal access token. Falls back to GITHUB_TOKEN env var.
    pub github_token: String,

    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    /// Path to the configuration file.
    pub config: String,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Release operation subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default castoff.toml to the working directory.
    Init,

    /// Compute the next version and publish a release.
    Release(ReleaseArgs),
}

/// Flags accepted by the `release` subcommand.
#[derive(clap::Args, Debug)]
pub struct ReleaseArgs {
    #[arg(long = "type", value_enum)]
    /// Bump type; defaults to the configured release strategy.
    pub release_type: Option<ReleaseType>,

    #[arg(long, default_value_t = false)]
    /// Publish the release as a draft.
    pub draft: bool,

    #[arg(long, default_value_t = false)]
    /// Compute and report the release without performing any writes.
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    /// Non-interactive mode: skip the confirmation prompt.
    pub ci: bool,
}

impl Args {
    /// Resolve the GitHub token: flag first, then the environment.
    pub fn get_token(&self) -> Result<SecretString> {
        if !self.github_token.is_empty() {
            return Ok(SecretString::from(self.github_token.clone()));
        }

        if let Ok(token) = env::var("GITHUB_TOKEN")
            && !token.is_empty()
        {
            return Ok(SecretString::from(token));
        }

        Err(Error::Authentication(
            "no github token provided".to_string(),
        ))
    }
}

/// Ask the operator to confirm the computed release. Declining is not an
/// error; the run simply stops before any side effect.
pub fn confirm_release(tag_name: &str) -> Result<bool> {
    let term = Term::stdout();
    term.write_str(&format!(
        "create release {}? [y/N] ",
        style(tag_name).cyan().bold()
    ))?;

    let answer = term.read_line()?;

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
