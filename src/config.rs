//! Configuration loading and parsing for `castoff.toml` files.
//!
//! The config is loaded once at startup and passed by reference into the
//! release pipeline — nothing in the core caches it.

use semver::Version;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::{error::Error, result::Result};

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "castoff.toml";

/// Repository shape: one package or a workspace-based monorepo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Monorepo,
    #[default]
    SinglePackage,
}

/// Package ecosystem whose manifests get their versions bumped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Nodejs,
    Python,
}

/// How the release type is chosen when `--type` is not passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStrategy {
    /// Derive the bump from the commits since the last release.
    #[default]
    Auto,
    /// Use `--type`, defaulting to a patch bump.
    Manual,
}

/// Versioning policy for monorepos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersioningStrategy {
    /// All workspaces share one version, bumped and released together.
    #[default]
    Fixed,
    /// Each package versions on its own, released based on what changed.
    Independent,
}

/// The `[project]` section: what the repository contains.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Repository shape.
    #[serde(rename = "type")]
    pub kind: ProjectType,
    /// Package ecosystem.
    pub environment: Environment,
    /// Package manager in use (informational, e.g. "npm" or "poetry").
    pub package_manager: String,
    /// Workspace globs relative to the repository root.
    pub workspaces: Vec<String>,
    /// Current shared version, used as the base for fixed-strategy bumps.
    pub version: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            kind: ProjectType::default(),
            environment: Environment::default(),
            package_manager: "npm".to_string(),
            workspaces: vec![".".to_string()],
            version: "0.1.0".to_string(),
        }
    }
}

/// The `[release]` section: how releases are computed and tagged.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseSection {
    /// Bump selection strategy.
    pub strategy: ReleaseStrategy,
    /// Fixed or independent versioning.
    pub versioning_strategy: VersioningStrategy,
    /// Identifier attached to prerelease versions (e.g. "beta").
    pub pre_release_identifier: String,
}

impl Default for ReleaseSection {
    fn default() -> Self {
        Self {
            strategy: ReleaseStrategy::default(),
            versioning_strategy: VersioningStrategy::default(),
            pre_release_identifier: "beta".to_string(),
        }
    }
}

/// Root configuration structure for `castoff.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    pub release: ReleaseSection,
}

impl ProjectConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.project.workspaces.is_empty() {
            return Err(Error::Config(
                "project.workspaces must list at least one path".to_string(),
            ));
        }

        Version::parse(&self.project.version).map_err(|e| {
            Error::Config(format!(
                "project.version {:?} is not valid semver: {e}",
                self.project.version
            ))
        })?;

        Ok(())
    }
}
