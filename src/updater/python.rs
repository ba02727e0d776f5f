//! Version updates for Python workspaces.
//!
//! Uses targeted single-line substitution instead of full TOML or AST
//! parsing: the edit is format-preserving and dependency-light, at the cost
//! that a declaration not matching the expected quoting style is skipped
//! rather than reported.

use async_trait::async_trait;
use log::*;
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::{
    error::Error,
    result::Result,
    updater::{ManifestUpdater, workspace},
};

static TOML_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^version\s*=\s*"[^"]*""#).unwrap()
});

static SETUP_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^version\s*=\s*['"][^'"]*['"]"#).unwrap()
});

static INIT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^__version__\s*=\s*['"][^'"]*['"]"#).unwrap()
});

/// Rewrites version declarations across the Python version-file trio.
pub struct PythonUpdater;

#[async_trait]
impl ManifestUpdater for PythonUpdater {
    /// Apply the substitution to each workspace's `pyproject.toml`,
    /// `setup.py`, and `__init__.py`.
    ///
    /// A workspace where none of the three files exist fails the whole
    /// batch with [`Error::NoVersionFilesFound`].
    async fn update(
        &self,
        root: &Path,
        workspaces: &[String],
        version: &Version,
    ) -> Result<Vec<PathBuf>> {
        let dirs = workspace::resolve_workspace_dirs(root, workspaces)?;

        if dirs.is_empty() {
            return Err(Error::NoVersionFilesFound(
                "no directory matched the configured workspaces".to_string(),
            ));
        }

        let mut updated = vec![];

        for dir in dirs {
            let workspace_dir = root.join(&dir);
            let mut found_any = false;

            let candidates = [
                (workspace_dir.join("pyproject.toml"), &*TOML_VERSION),
                (workspace_dir.join("setup.py"), &*SETUP_VERSION),
                (workspace_dir.join("__init__.py"), &*INIT_VERSION),
            ];

            for (path, pattern) in candidates {
                if !path.is_file() {
                    continue;
                }
                found_any = true;

                if substitute(&path, pattern, version).await? {
                    updated.push(path);
                }
            }

            if !found_any {
                let label = if dir.as_os_str().is_empty() {
                    ".".to_string()
                } else {
                    dir.display().to_string()
                };
                return Err(Error::NoVersionFilesFound(label));
            }
        }

        Ok(updated)
    }
}

async fn substitute(
    path: &Path,
    pattern: &Regex,
    version: &Version,
) -> Result<bool> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::ManifestBump(format!("failed to read {}: {e}", path.display()))
    })?;

    if !pattern.is_match(&content) {
        // Known precision gap: a declaration that does not match the
        // expected quoting style is skipped, not reported.
        debug!("no version line matched in {}, skipping", path.display());
        return Ok(false);
    }

    let replacement = if path.ends_with("__init__.py") {
        format!("__version__ = \"{version}\"")
    } else {
        format!("version = \"{version}\"")
    };

    info!("updating {} to version {version}", path.display());
    let updated = pattern.replace(&content, replacement.as_str());

    tokio::fs::write(path, updated.as_bytes()).await.map_err(|e| {
        Error::ManifestBump(format!("failed to write {}: {e}", path.display()))
    })?;

    Ok(true)
}
