//! Error kinds for release runs.
//!
//! One enum covers the whole pipeline: authentication, repository
//! inspection, version math, manifest bumping, and remote publication.
//! Errors are terminal for the current run — nothing is retried. Each
//! variant carries a short machine message; [`Error::hints`] adds the
//! human-readable remediation steps the CLI prints before exiting non-zero.

use thiserror::Error;

/// Unified error type for castoff operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("no git remote configured")]
    NoRemote,

    #[error("invalid remote format: {0}")]
    InvalidRemoteFormat(String),

    #[error("repository operation failed: {0}")]
    Repository(String),

    #[error("no commits found since the last release")]
    NoCommits,

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("manifest bump failed: {0}")]
    ManifestBump(String),

    #[error("no version files found for workspace: {0}")]
    NoVersionFilesFound(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("no packages changed since the last release")]
    NoPackagesChanged,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Remediation hints rendered by the CLI alongside the error message.
    pub fn hints(&self) -> Vec<&'static str> {
        match self {
            Error::Authentication(_) => vec![
                "set the GITHUB_TOKEN environment variable or pass --github-token",
                "verify the token is valid and has the repo scope",
            ],
            Error::NoRemote => {
                vec!["add a remote first: git remote add origin <url>"]
            }
            Error::InvalidRemoteFormat(_) => vec![
                "only github.com remotes are supported",
                "expected a remote like https://github.com/<owner>/<repo>.git",
            ],
            Error::Repository(_) => vec![
                "check that the working directory is a valid git repository",
            ],
            Error::NoCommits => {
                vec!["commit changes before running a release"]
            }
            Error::InvalidVersion(_) => vec![
                "versions must be valid semver, e.g. 1.2.3 or 1.2.3-beta.1",
            ],
            Error::ManifestBump(_) => vec![
                "check that every workspace manifest exists and parses",
            ],
            Error::NoVersionFilesFound(_) => vec![
                "expected pyproject.toml, setup.py, or __init__.py in the workspace",
            ],
            Error::Publish(_) => vec![
                "verify the token has permission to create releases",
                "a release may already exist for the computed tag",
            ],
            Error::NoPackagesChanged => vec![
                "no changed file matched a configured workspace",
                "check the project.workspaces globs in castoff.toml",
            ],
            Error::Config(_) => {
                vec!["run `castoff init` to generate a default castoff.toml"]
            }
            Error::Io(_) => vec![],
        }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Repository(err.message().to_string())
    }
}
