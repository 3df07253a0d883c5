//! Session actions
//!
//! Everything that can change a session arrives as a [`SessionAction`]:
//! control requests from the host, and events reported back by timers,
//! the filesystem watcher and tool invocations.

use chrono::{DateTime, Utc};
use diff_model::{ChangeEntry, ChangeScope, DiffDocument, DiffSource};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// What a session is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionMode {
    /// Live working tree, filtered by scope
    WorkingTree { scope: ChangeScope },
    /// A pull request's diff; no status listing, watch or polling
    PullRequest { number: u64 },
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::WorkingTree { scope } => write!(f, "working tree, {}", scope),
            SessionMode::PullRequest { number } => write!(f, "PR #{}", number),
        }
    }
}

/// Repository plus mode; changing either resets the session content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub repo_root: PathBuf,
    pub mode: SessionMode,
}

impl SessionContext {
    pub fn working_tree(repo_root: impl Into<PathBuf>, scope: ChangeScope) -> Self {
        Self {
            repo_root: repo_root.into(),
            mode: SessionMode::WorkingTree { scope },
        }
    }

    pub fn pull_request(repo_root: impl Into<PathBuf>, number: u64) -> Self {
        Self {
            repo_root: repo_root.into(),
            mode: SessionMode::PullRequest { number },
        }
    }

    /// Active filter scope; pull requests always show everything
    pub fn scope(&self) -> ChangeScope {
        match self.mode {
            SessionMode::WorkingTree { scope } => scope,
            SessionMode::PullRequest { .. } => ChangeScope::All,
        }
    }

    pub fn tracks_working_tree(&self) -> bool {
        matches!(self.mode, SessionMode::WorkingTree { .. })
    }

    /// Source tag for a document loaded for `selection`
    pub fn source_for(&self, selection: &DiffSelection) -> DiffSource {
        match selection {
            DiffSelection::PullRequest(number) => DiffSource::PullRequest { number: *number },
            _ => DiffSource::WorkingTree {
                scope: self.scope(),
            },
        }
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.repo_root.display(), self.mode)
    }
}

/// Target of a diff load
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiffSelection {
    /// All changes in the active scope
    WorkingTree,
    /// One changed path, relative to the repository root
    Path(String),
    PullRequest(u64),
}

impl fmt::Display for DiffSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSelection::WorkingTree => f.write_str("working tree"),
            DiffSelection::Path(path) => f.write_str(path),
            DiffSelection::PullRequest(number) => write!(f, "PR #{}", number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Stage,
    Unstage,
}

/// Watch notification, already reduced to what the session cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// `index` or `HEAD` was written
    Changed,
    /// `index` or `HEAD` was deleted or renamed over; the watch must be re-established
    Removed,
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    // Control surface
    SetVisible {
        visible: bool,
        context: SessionContext,
    },
    RequestRefresh {
        force: bool,
    },
    LoadDiff(DiffSelection),
    ClearSelection,
    Stage(String),
    Unstage(String),
    Shutdown,

    // Events
    DebounceElapsed {
        generation: u64,
    },
    PollTick,
    Watch(WatchEventKind),
    StatusLoaded {
        tag: u64,
        finished_at: DateTime<Utc>,
        result: Result<Vec<ChangeEntry>, String>,
    },
    DiffLoaded {
        tag: u64,
        selection: DiffSelection,
        result: Result<Arc<DiffDocument>, String>,
    },
    MutationFinished {
        path: String,
        mutation: Mutation,
        result: Result<(), String>,
    },
}

impl SessionAction {
    /// Variant name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SetVisible { .. } => "SetVisible",
            SessionAction::RequestRefresh { .. } => "RequestRefresh",
            SessionAction::LoadDiff(_) => "LoadDiff",
            SessionAction::ClearSelection => "ClearSelection",
            SessionAction::Stage(_) => "Stage",
            SessionAction::Unstage(_) => "Unstage",
            SessionAction::Shutdown => "Shutdown",
            SessionAction::DebounceElapsed { .. } => "DebounceElapsed",
            SessionAction::PollTick => "PollTick",
            SessionAction::Watch(_) => "Watch",
            SessionAction::StatusLoaded { .. } => "StatusLoaded",
            SessionAction::DiffLoaded { .. } => "DiffLoaded",
            SessionAction::MutationFinished { .. } => "MutationFinished",
        }
    }
}
