//! Locate and read the configuration file.

use crate::paths::global_config_path;
use std::{env, path::PathBuf};

const CONFIG_FILE: &str = ".diff-sync.toml";

/// Candidate config file locations, in lookup order:
/// 1. `.diff-sync.toml` in the current working directory
/// 2. `~/.diff-sync.toml`
/// 3. `<config dir>/diff-sync/config.toml`
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(home) = env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(CONFIG_FILE));
    }
    if let Some(global) = global_config_path() {
        candidates.push(global);
    }
    candidates
}

/// Load the first readable config file from the default locations.
pub fn load_config_file() -> Option<(PathBuf, String)> {
    load_config_file_from(&config_candidates())
}

/// Load the first readable file among `candidates`.
pub fn load_config_file_from(candidates: &[PathBuf]) -> Option<(PathBuf, String)> {
    for path in candidates {
        if let Ok(content) = std::fs::read_to_string(path) {
            log::debug!("Loaded config from {}", path.display());
            return Some((path.clone(), content));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        std::fs::write(&first, "debounce_ms = 10").unwrap();
        std::fs::write(&second, "debounce_ms = 20").unwrap();

        let (path, content) =
            load_config_file_from(&[missing, first.clone(), second]).unwrap();
        assert_eq!(path, first);
        assert_eq!(content, "debounce_ms = 10");
    }

    #[test]
    fn test_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_file_from(&[dir.path().join("nope.toml")]).is_none());
    }

    #[test]
    fn test_cwd_is_checked_first() {
        assert_eq!(config_candidates()[0], PathBuf::from(CONFIG_FILE));
    }
}
