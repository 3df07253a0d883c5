//! Configuration and cache directory paths
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/diff-sync/`, `~/.cache/diff-sync/`
//! - macOS: `~/Library/Application Support/diff-sync/`, `~/Library/Caches/diff-sync/`
//! - Windows: `%APPDATA%\diff-sync\`, `%LOCALAPPDATA%\diff-sync\`

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const APP_NAME: &str = "diff-sync";

/// Get the application config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
    Ok(dir)
}

/// Get the application cache directory (log files live here in release builds)
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
    Ok(dir)
}

/// Path of the global config file. Does not create anything.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_path_shape() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with("diff-sync/config.toml"));
        }
    }

    #[test]
    fn test_cache_dir_exists() {
        // Headless CI machines may have no cache dir at all
        if let Ok(dir) = cache_dir() {
            assert!(dir.exists());
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
