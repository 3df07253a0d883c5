//! Version-control subprocess client
//!
//! This crate provides a trait-based client for the external `git` and `gh`
//! tools, plus the operations the diff engine builds on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              VcsClient trait                     │
//! │  - run(args, cwd) -> {stdout, stderr, exit}      │
//! │  - run_checked(args, cwd, accepted exit codes)   │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │ CliClient       │         │ status / commands   │
//! │ (tokio process) │◄────────│ (git & gh commands) │
//! └─────────────────┘         └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use diff_sync_config::SyncConfig;
//! use vcs_client::{status_entries, CliClient};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), vcs_client::VcsError> {
//! let config = SyncConfig::default();
//! let git = CliClient::git(&config);
//!
//! let entries = status_entries(&git, Path::new("."), config.untracked_size_ceiling).await?;
//! for entry in entries {
//!     println!("{} {}", entry.status_code, entry.display_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli_client;
pub mod client;
pub mod commands;
pub mod error;
pub mod status;
pub mod types;

pub use cli_client::CliClient;
pub use client::VcsClient;
pub use commands::{diff_text, pr_diff_text, stage, unstage};
pub use error::VcsError;
pub use status::{parse_numstat, parse_status_records, status_entries};
pub use types::CommandOutput;
