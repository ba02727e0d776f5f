//! Workspace glob resolution.

use glob::glob;
use log::*;
use std::path::{Component, Path, PathBuf};

use crate::{config::Environment, error::Error, result::Result};

// Vendor and build output directories never count as workspaces.
const IGNORED_DIRS: [&str; 4] = ["node_modules", ".git", "dist", "build"];

fn is_ignored(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(
            component,
            Component::Normal(name)
                if IGNORED_DIRS.contains(&name.to_string_lossy().as_ref())
        )
    })
}

/// Resolve workspace globs to directories, relative to `root`.
///
/// The pattern `.` resolves to the root itself (an empty relative path).
/// Results keep the order of the configured patterns and are deduplicated.
pub fn resolve_workspace_dirs(
    root: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = vec![];

    for pattern in patterns {
        let full = root.join(pattern);
        let full = full.to_string_lossy();

        let paths = glob(&full).map_err(|e| {
            Error::Config(format!("invalid workspace pattern {pattern}: {e}"))
        })?;

        for entry in paths {
            let path = entry.map_err(|e| {
                Error::Config(format!(
                    "failed to resolve workspace pattern {pattern}: {e}"
                ))
            })?;

            if !path.is_dir() || is_ignored(&path) {
                continue;
            }

            let rel = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or(path);

            if !dirs.contains(&rel) {
                dirs.push(rel);
            }
        }
    }

    Ok(dirs)
}

/// Resolve workspace globs to concrete manifest files named `manifest`.
pub fn resolve_manifest_paths(
    root: &Path,
    patterns: &[String],
    manifest: &str,
) -> Result<Vec<PathBuf>> {
    let dirs = resolve_workspace_dirs(root, patterns)?;
    let mut paths = vec![];

    for dir in dirs {
        let candidate = root.join(&dir).join(manifest);
        if candidate.is_file() {
            paths.push(candidate);
        }
    }

    Ok(paths)
}

/// Read a workspace's declared package name and version from its manifest.
///
/// Returns `(None, None)` when no manifest exists; a manifest that fails to
/// parse is logged and treated the same way.
pub fn package_metadata(
    root: &Path,
    dir: &Path,
    env: Environment,
) -> (Option<String>, Option<String>) {
    match env {
        Environment::Nodejs => {
            let path = root.join(dir).join("package.json");
            let Ok(content) = std::fs::read_to_string(&path) else {
                return (None, None);
            };
            match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(doc) => (
                    doc.get("name")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    doc.get("version")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                ),
                Err(e) => {
                    warn!("unreadable manifest {}: {e}", path.display());
                    (None, None)
                }
            }
        }
        Environment::Python => {
            let path = root.join(dir).join("pyproject.toml");
            let Ok(content) = std::fs::read_to_string(&path) else {
                return (None, None);
            };
            match toml::from_str::<toml::Value>(&content) {
                Ok(doc) => {
                    let project = doc.get("project");
                    (
                        project
                            .and_then(|p| p.get("name"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string),
                        project
                            .and_then(|p| p.get("version"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string),
                    )
                }
                Err(e) => {
                    warn!("unreadable manifest {}: {e}", path.display());
                    (None, None)
                }
            }
        }
    }
}
