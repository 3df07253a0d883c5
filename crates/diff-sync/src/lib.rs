//! # diff-sync
//!
//! Keeps a live, structured view of a repository's uncommitted changes, or of
//! a pull request's diff, in sync with the repository.
//!
//! A session is a single tokio task fed by one action queue. Control
//! requests ([`SessionHandle`]) and background events (debounce timers,
//! polling, the `index`/`HEAD` watcher, finished tool invocations) are all
//! [`SessionAction`]s, reduced one at a time by [`reducer::reduce`]. Results
//! carry the tag of the request that produced them; anything superseded in
//! the meantime is dropped instead of published.
//!
//! ```no_run
//! use diff_model::ChangeScope;
//! use diff_sync::{SessionContext, SessionHandle};
//! use diff_sync_config::SyncConfig;
//! use std::sync::Arc;
//! use vcs_client::CliClient;
//!
//! # async fn example() {
//! let config = SyncConfig::load();
//! let git = Arc::new(CliClient::git(&config));
//! let gh = Arc::new(CliClient::gh(&config));
//!
//! let session = SessionHandle::spawn(config, git, gh);
//! session.set_visible(true, SessionContext::working_tree(".", ChangeScope::All));
//!
//! let mut snapshots = session.subscribe();
//! while snapshots.changed().await.is_ok() {
//!     let snapshot = snapshots.borrow().clone();
//!     println!("{} changed paths", snapshot.entries.len());
//! }
//! # }
//! ```

pub mod actions;
pub mod dispatcher;
pub mod reducer;
pub mod session;
pub mod state;
pub mod watcher;

pub use actions::{DiffSelection, Mutation, SessionAction, SessionContext, SessionMode};
pub use dispatcher::Dispatcher;
pub use session::SessionHandle;
pub use state::{SessionSnapshot, SessionState, SessionTiming};
