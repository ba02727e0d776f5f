//! package.json version updates for Node.js workspaces.

use async_trait::async_trait;
use futures_util::future::try_join_all;
use log::*;
use semver::Version;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use crate::{
    error::Error,
    result::Result,
    updater::{ManifestUpdater, workspace},
};

/// Rewrites the `version` field of every workspace `package.json`.
pub struct NodeUpdater;

#[async_trait]
impl ManifestUpdater for NodeUpdater {
    /// Bump all resolved manifests as one parallel batch.
    ///
    /// All-or-nothing: any single read, parse, or write failure fails the
    /// whole batch. Serialization is stable 2-space-indented JSON with key
    /// order preserved.
    async fn update(
        &self,
        root: &Path,
        workspaces: &[String],
        version: &Version,
    ) -> Result<Vec<PathBuf>> {
        let manifests = workspace::resolve_manifest_paths(
            root,
            workspaces,
            "package.json",
        )?;

        if manifests.is_empty() {
            return Err(Error::ManifestBump(
                "no package.json matched the configured workspaces"
                    .to_string(),
            ));
        }

        let updated = try_join_all(
            manifests.iter().map(|path| bump_manifest(path, version)),
        )
        .await?;

        Ok(updated)
    }
}

async fn bump_manifest(path: &Path, version: &Version) -> Result<PathBuf> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::ManifestBump(format!("failed to read {}: {e}", path.display()))
    })?;

    let mut doc: Value = serde_json::from_str(&content).map_err(|e| {
        Error::ManifestBump(format!("failed to parse {}: {e}", path.display()))
    })?;

    if !doc.is_object() {
        return Err(Error::ManifestBump(format!(
            "{} is not a json object",
            path.display()
        )));
    }

    info!("updating {} to version {version}", path.display());
    doc["version"] = json!(version.to_string());

    let mut formatted = serde_json::to_string_pretty(&doc).map_err(|e| {
        Error::ManifestBump(format!(
            "failed to serialize {}: {e}",
            path.display()
        ))
    })?;
    formatted.push('\n');

    tokio::fs::write(path, formatted).await.map_err(|e| {
        Error::ManifestBump(format!("failed to write {}: {e}", path.display()))
    })?;

    Ok(path.to_path_buf())
}
