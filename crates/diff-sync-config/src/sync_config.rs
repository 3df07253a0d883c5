//! Engine configuration
//!
//! Configuration loaded from `.diff-sync.toml`. Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timing, budget and tool settings for a diff-sync session
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period before a non-forced refresh runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum spacing between the end of one refresh and the start of the next
    #[serde(default = "default_min_refresh_interval_ms")]
    pub min_refresh_interval_ms: u64,

    /// Low-frequency poll while tracking the working tree
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Watch events are ignored for this long after stage/unstage
    #[serde(default = "default_ignore_window_ms")]
    pub ignore_window_ms: u64,

    /// Per-file diff line ceiling
    #[serde(default = "default_max_render_lines")]
    pub max_render_lines: usize,

    /// Untracked files larger than this (bytes) get no line count
    #[serde(default = "default_untracked_size_ceiling")]
    pub untracked_size_ceiling: u64,

    /// Explicit path to `git`; looked up on the search path when unset
    #[serde(default)]
    pub git_executable: Option<PathBuf>,

    /// Explicit path to `gh`; looked up on the search path when unset
    #[serde(default)]
    pub gh_executable: Option<PathBuf>,

    /// Directories searched after `PATH` and appended to the child's `PATH`
    #[serde(default = "default_extra_search_paths")]
    pub extra_search_paths: Vec<PathBuf>,
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_min_refresh_interval_ms() -> u64 {
    400
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_ignore_window_ms() -> u64 {
    750
}

fn default_max_render_lines() -> usize {
    10_000
}

fn default_untracked_size_ceiling() -> u64 {
    1024 * 1024
}

fn default_extra_search_paths() -> Vec<PathBuf> {
    ["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin", "/bin"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_refresh_interval_ms: default_min_refresh_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            ignore_window_ms: default_ignore_window_ms(),
            max_render_lines: default_max_render_lines(),
            untracked_size_ceiling: default_untracked_size_ceiling(),
            git_executable: None,
            gh_executable: None,
            extra_search_paths: default_extra_search_paths(),
        }
    }
}

impl SyncConfig {
    /// Load config from CWD first, then home directory, then the platform
    /// config directory, or use defaults
    pub fn load() -> Self {
        match crate::load_config_file() {
            Some((path, content)) => Self::parse_or_default(&path, &content),
            None => {
                log::debug!("Using default sync config");
                Self::default()
            }
        }
    }

    fn parse_or_default(path: &Path, content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => {
                log::info!("Loaded sync config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.min_refresh_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ignore_window(&self) -> Duration {
        Duration::from_millis(self.ignore_window_ms)
    }
}
