//! Project initialization command.

use log::*;
use std::fs;
use std::path::Path;

use crate::{cli, error::Error, result::Result};

const CONFIG_TEMPLATE: &str = r#"# castoff configuration

[project]
# "monorepo" or "single-package"
type = "single-package"
# "nodejs" or "python"
environment = "nodejs"
package_manager = "npm"
# workspace globs, relative to the repository root
workspaces = ["."]
# current version, used as the base for the next fixed-strategy release
version = "0.1.0"

[release]
# "auto" derives the bump from commits, "manual" relies on --type
strategy = "auto"
# "fixed" releases all workspaces under one version, "independent" per package
versioning_strategy = "fixed"
pre_release_identifier = "beta"
"#;

/// Write a default config file, refusing to overwrite an existing one.
pub fn execute(args: &cli::Args) -> Result<()> {
    let path = Path::new(&args.config);

    if path.exists() {
        return Err(Error::Config(format!(
            "{} already exists, remove it first to re-initialize",
            path.display()
        )));
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    info!("wrote {}", path.display());

    Ok(())
}
