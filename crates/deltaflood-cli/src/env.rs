use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Load `.env` (or `.env.{name}` when an environment is named) from `dir`.
///
/// A missing `.env` is fine; a missing named environment file is an error.
pub fn load_env_file(dir: &Path, env: Option<&str>) -> Result<Option<PathBuf>> {
    let path = match env {
        Some(name) => dir.join(format!(".env.{}", name)),
        None => dir.join(".env"),
    };

    if !path.exists() {
        if env.is_some() {
            anyhow::bail!("Environment file not found: {}", path.display());
        }
        return Ok(None);
    }

    dotenvy::from_path(&path)
        .with_context(|| format!("Failed to load environment from {}", path.display()))?;
    debug!(path = %path.display(), "Loaded environment file");
    Ok(Some(path))
}
