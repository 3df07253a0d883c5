//! Configuration and file management for diff-sync
//!
//! This crate provides:
//! - Platform config and cache directories
//! - Configuration file discovery (TOML)
//! - Engine configuration (SyncConfig)

pub mod config_file;
pub mod paths;
pub mod sync_config;

pub use config_file::{config_candidates, load_config_file, load_config_file_from};
pub use sync_config::SyncConfig;
