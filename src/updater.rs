//! Manifest version bumping across package ecosystems.

use async_trait::async_trait;
use semver::Version;
use std::path::{Path, PathBuf};

use crate::{config::Environment, result::Result};

pub mod node;
pub mod python;
pub mod workspace;

/// Rewrites version declarations in place for one ecosystem.
#[async_trait]
pub trait ManifestUpdater: Send + Sync {
    /// Set every matching manifest under the given workspace globs to
    /// `version`, returning the files that were rewritten.
    async fn update(
        &self,
        root: &Path,
        workspaces: &[String],
        version: &Version,
    ) -> Result<Vec<PathBuf>>;
}

/// Select the updater for the configured environment.
pub fn for_environment(env: Environment) -> Box<dyn ManifestUpdater> {
    match env {
        Environment::Nodejs => Box::new(node::NodeUpdater),
        Environment::Python => Box::new(python::PythonUpdater),
    }
}
