//! Repository control-directory watcher
//!
//! Watches a repository's git directory and reports writes to its `index` and
//! `HEAD` files to the session. Git replaces both files by renaming a lock
//! file over them; renames and removals are reported separately and the
//! session asks for a rewatch.

use crate::actions::{SessionAction, WatchEventKind};
use crate::dispatcher::Dispatcher;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::path::{Path, PathBuf};

const WATCHED_FILES: [&str; 2] = ["index", "HEAD"];

/// Locate the git control directory for `repo_root`.
///
/// `.git` is either the directory itself or, for worktrees and submodules, a
/// file containing `gitdir: <path>`; relative paths resolve against the root.
pub fn control_dir(repo_root: &Path) -> io::Result<PathBuf> {
    let dot_git = repo_root.join(".git");
    let metadata = std::fs::metadata(&dot_git)?;
    if metadata.is_dir() {
        return Ok(dot_git);
    }

    let content = std::fs::read_to_string(&dot_git)?;
    let target = content
        .lines()
        .find_map(|line| line.strip_prefix("gitdir:"))
        .map(str::trim)
        .filter(|target| !target.is_empty())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} has no gitdir line", dot_git.display()),
            )
        })?;

    let target = PathBuf::from(target);
    Ok(if target.is_absolute() {
        target
    } else {
        repo_root.join(target)
    })
}

/// Reduce a notify event to what the session reacts to
pub fn classify(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Access(_) => None,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
            Some(WatchEventKind::Removed)
        }
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            Some(WatchEventKind::Changed)
        }
    }
}

/// Whether `path` names one of the watched control files
pub fn is_control_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| WATCHED_FILES.contains(&name))
}

/// Watch on one repository's `index` and `HEAD`; dropping it stops the watch
///
/// The control directory itself is watched non-recursively so files that do
/// not exist yet (a fresh repository has no `index`) are still seen once
/// created. Lock files and other entries are filtered out by name.
pub struct ControlDirWatcher {
    watcher: RecommendedWatcher,
    control_dir: PathBuf,
}

impl ControlDirWatcher {
    pub fn new(control_dir: PathBuf, dispatcher: Dispatcher) -> notify::Result<Self> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let relevant =
                    event.paths.is_empty() || event.paths.iter().any(|p| is_control_file(p));
                if !relevant {
                    return;
                }
                if let Some(kind) = classify(&event.kind) {
                    log::trace!("Watch event {:?} on {:?}", event.kind, event.paths);
                    dispatcher.dispatch(SessionAction::Watch(kind));
                }
            }
            Err(e) => log::warn!("Watch error: {}", e),
        })?;

        let mut this = Self {
            watcher,
            control_dir,
        };
        this.watcher.watch(&this.control_dir, RecursiveMode::NonRecursive)?;
        log::info!("Watching {}", this.control_dir.display());
        Ok(this)
    }

    pub fn control_dir(&self) -> &Path {
        &self.control_dir
    }

    /// Re-establish the watch after a control file was replaced
    pub fn rewatch(&mut self) -> notify::Result<()> {
        // The old watch may already be gone
        let _ = self.watcher.unwatch(&self.control_dir);
        self.watcher.watch(&self.control_dir, RecursiveMode::NonRecursive)
    }
}
