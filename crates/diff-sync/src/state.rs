//! Session state
//!
//! [`SessionState`] is owned by the session task and only changed by the
//! reducer. Observers see immutable [`SessionSnapshot`]s.

use crate::actions::{DiffSelection, SessionContext};
use chrono::{DateTime, Utc};
use diff_model::{ChangeEntry, ChangeScope, DiffDocument};
use diff_sync_config::SyncConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Scheduling knobs the reducer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub debounce: Duration,
    pub min_refresh_interval: Duration,
    pub ignore_window: Duration,
}

impl SessionTiming {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_refresh_interval: config.min_refresh_interval(),
            ignore_window: config.ignore_window(),
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub timing: SessionTiming,
    pub visible: bool,
    pub context: Option<SessionContext>,

    // Published content
    pub entries: Arc<Vec<ChangeEntry>>,
    pub document: Option<Arc<DiffDocument>>,
    pub selection: Option<DiffSelection>,
    pub status_error: Option<String>,
    pub diff_error: Option<String>,
    /// Wall-clock time of the last applied status result
    pub refreshed_at: Option<DateTime<Utc>>,

    // Status refresh: Idle -> Refreshing -> Idle
    pub refreshing: bool,
    /// A request arrived while refreshing or while the debounce was waiting on one
    pub pending: bool,
    pub pending_force: bool,
    pub status_tag: u64,
    pub last_refresh_finished: Option<Instant>,

    // Debounce timer; only the latest generation may fire
    pub debounce_generation: u64,
    pub debounce_armed: bool,

    // Diff load: Idle -> LoadingDiff -> Idle
    pub loading_diff: bool,
    pub diff_tag: u64,

    /// Watch events before this instant are self-inflicted
    pub ignore_until: Option<Instant>,
    pub watching: bool,
    pub polling: bool,

    /// Bumped on every publish
    pub revision: u64,
}

impl SessionState {
    pub fn new(timing: SessionTiming) -> Self {
        Self {
            timing,
            visible: false,
            context: None,
            entries: Arc::new(Vec::new()),
            document: None,
            selection: None,
            status_error: None,
            diff_error: None,
            refreshed_at: None,
            refreshing: false,
            pending: false,
            pending_force: false,
            status_tag: 0,
            last_refresh_finished: None,
            debounce_generation: 0,
            debounce_armed: false,
            loading_diff: false,
            diff_tag: 0,
            ignore_until: None,
            watching: false,
            polling: false,
            revision: 0,
        }
    }

    pub fn scope(&self) -> ChangeScope {
        self.context
            .as_ref()
            .map(SessionContext::scope)
            .unwrap_or_default()
    }

    /// Visible and showing the working tree
    pub fn is_live(&self) -> bool {
        self.visible
            && self
                .context
                .as_ref()
                .is_some_and(SessionContext::tracks_working_tree)
    }

    pub fn entry(&self, path: &str) -> Option<&ChangeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            revision: self.revision,
            visible: self.visible,
            context: self.context.clone(),
            entries: Arc::clone(&self.entries),
            document: self.document.clone(),
            selection: self.selection.clone(),
            refreshing: self.refreshing,
            loading_diff: self.loading_diff,
            status_error: self.status_error.clone(),
            diff_error: self.diff_error.clone(),
            refreshed_at: self.refreshed_at,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionTiming::default())
    }
}

/// Immutable view of a session, published after every visible change
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub revision: u64,
    pub visible: bool,
    pub context: Option<SessionContext>,
    pub entries: Arc<Vec<ChangeEntry>>,
    pub document: Option<Arc<DiffDocument>>,
    pub selection: Option<DiffSelection>,
    pub refreshing: bool,
    pub loading_diff: bool,
    pub status_error: Option<String>,
    pub diff_error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Entries visible in the active scope
    pub fn visible_entries(&self) -> impl Iterator<Item = &ChangeEntry> {
        let scope = self
            .context
            .as_ref()
            .map(SessionContext::scope)
            .unwrap_or_default();
        self.entries.iter().filter(move |e| e.in_scope(scope))
    }

    /// Nothing in flight and the first results (or errors) are in
    pub fn is_settled(&self) -> bool {
        let Some(context) = &self.context else {
            return false;
        };
        if self.refreshing || self.loading_diff {
            return false;
        }
        let status_done = !context.tracks_working_tree() || self.refreshed_at.is_some();
        let diff_done =
            self.selection.is_none() || self.document.is_some() || self.diff_error.is_some();
        status_done && diff_done
    }
}
