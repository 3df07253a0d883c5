//! Session task
//!
//! One tokio task per session owns the [`SessionState`] and processes
//! actions strictly in arrival order:
//!
//! ```text
//!  SessionHandle ──┐
//!  timers ─────────┤   mpsc    ┌─────────┐  effects  ┌──────────────┐
//!  watcher ────────┼─────────▶ │ reduce  │ ────────▶ │ execute      │
//!  tool tasks ─────┘           └─────────┘           │ spawn / arm  │
//!        ▲                                           │ publish      │
//!        └──────────────── Dispatcher ───────────────┴──────────────┘
//! ```
//!
//! Observers never touch the state; they read [`SessionSnapshot`]s from a
//! `watch` channel.

use crate::actions::{DiffSelection, Mutation, SessionAction, SessionContext};
use crate::dispatcher::Dispatcher;
use crate::reducer::{reduce, Effect};
use crate::state::{SessionSnapshot, SessionState, SessionTiming};
use crate::watcher::{control_dir, ControlDirWatcher};
use chrono::Utc;
use diff_model::{parse_unified_with_limit, DiffDocument, DiffSource};
use diff_sync_config::SyncConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use vcs_client::{diff_text, pr_diff_text, stage, status_entries, unstage, VcsClient};

/// Control surface of a running session
///
/// Every method only queues an action and returns immediately. Dropping the
/// handle stops the session; [`SessionHandle::shutdown`] also waits for it.
pub struct SessionHandle {
    dispatcher: Dispatcher,
    snapshots: watch::Receiver<Arc<SessionSnapshot>>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a hidden session. Must be called from within a tokio runtime.
    pub fn spawn(config: SyncConfig, git: Arc<dyn VcsClient>, gh: Arc<dyn VcsClient>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(action_tx);

        let state = SessionState::new(SessionTiming::from_config(&config));
        let (publisher, snapshots) = watch::channel(Arc::new(state.snapshot()));

        let worker = SessionWorker {
            state,
            dispatcher: dispatcher.clone(),
            git,
            gh,
            config,
            publisher,
            debounce_task: None,
            poll_task: None,
            watcher: None,
        };

        Self {
            dispatcher,
            snapshots,
            worker: Some(tokio::spawn(worker.run(action_rx))),
        }
    }

    pub fn set_visible(&self, visible: bool, context: SessionContext) {
        self.dispatcher.dispatch(SessionAction::SetVisible { visible, context });
    }

    pub fn request_refresh(&self, force: bool) {
        self.dispatcher.dispatch(SessionAction::RequestRefresh { force });
    }

    pub fn load_diff(&self, selection: DiffSelection) {
        self.dispatcher.dispatch(SessionAction::LoadDiff(selection));
    }

    pub fn clear_selection(&self) {
        self.dispatcher.dispatch(SessionAction::ClearSelection);
    }

    pub fn stage(&self, path: impl Into<String>) {
        self.dispatcher.dispatch(SessionAction::Stage(path.into()));
    }

    pub fn unstage(&self, path: impl Into<String>) {
        self.dispatcher.dispatch(SessionAction::Unstage(path.into()));
    }

    /// Receiver that is notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Tear the session down and wait for its task to finish
    pub async fn shutdown(mut self) {
        self.dispatcher.dispatch(SessionAction::Shutdown);
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                log::error!("Session task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // The task and its background jobs hold dispatchers of their own, so
        // the queue never closes by itself
        if self.worker.is_some() {
            self.dispatcher.dispatch(SessionAction::Shutdown);
        }
    }
}

struct SessionWorker {
    state: SessionState,
    dispatcher: Dispatcher,
    git: Arc<dyn VcsClient>,
    gh: Arc<dyn VcsClient>,
    config: SyncConfig,
    publisher: watch::Sender<Arc<SessionSnapshot>>,
    debounce_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
    watcher: Option<ControlDirWatcher>,
}

impl SessionWorker {
    async fn run(mut self, mut action_rx: mpsc::UnboundedReceiver<SessionAction>) {
        log::info!("Session task started");

        while let Some(action) = action_rx.recv().await {
            let shutdown = matches!(action, SessionAction::Shutdown);
            log::trace!("Session action: {}", action.name());

            let effects = reduce(&mut self.state, action, Instant::now());
            self.execute(effects);

            if shutdown {
                break;
            }
        }

        self.cancel_debounce();
        self.stop_polling();
        self.watcher = None;
        log::info!("Session task stopped");
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        let mut publish = false;

        for effect in effects {
            match effect {
                Effect::FetchStatus { tag, repo_root } => self.fetch_status(tag, repo_root),
                Effect::FetchDiff {
                    tag,
                    repo_root,
                    selection,
                    source,
                    untracked,
                } => self.fetch_diff(tag, repo_root, selection, source, untracked),
                Effect::ArmDebounce { generation, delay } => self.arm_debounce(generation, delay),
                Effect::CancelDebounce => self.cancel_debounce(),
                Effect::StartWatch { repo_root } => self.start_watch(&repo_root),
                Effect::Rewatch => self.rewatch(),
                Effect::StopWatch => {
                    if self.watcher.take().is_some() {
                        log::debug!("Stopped watching");
                    }
                }
                Effect::StartPolling => self.start_polling(),
                Effect::StopPolling => self.stop_polling(),
                Effect::Mutate {
                    repo_root,
                    path,
                    mutation,
                } => self.mutate(repo_root, path, mutation),
                Effect::Publish => publish = true,
            }
        }

        // At most one snapshot per action
        if publish {
            self.publish();
        }
    }

    fn publish(&mut self) {
        self.state.revision = self.state.revision.saturating_add(1);
        self.publisher.send_replace(Arc::new(self.state.snapshot()));
    }

    fn fetch_status(&self, tag: u64, repo_root: PathBuf) {
        let git = Arc::clone(&self.git);
        let dispatcher = self.dispatcher.clone();
        let ceiling = self.config.untracked_size_ceiling;

        tokio::spawn(async move {
            let result = status_entries(git.as_ref(), &repo_root, ceiling)
                .await
                .map_err(|e| {
                    log::warn!("Status listing failed: {}", e);
                    e.user_message()
                });
            dispatcher.dispatch(SessionAction::StatusLoaded {
                tag,
                finished_at: Utc::now(),
                result,
            });
        });
    }

    fn fetch_diff(
        &self,
        tag: u64,
        repo_root: PathBuf,
        selection: DiffSelection,
        source: DiffSource,
        untracked: bool,
    ) {
        let git = Arc::clone(&self.git);
        let gh = Arc::clone(&self.gh);
        let dispatcher = self.dispatcher.clone();
        let line_limit = self.config.max_render_lines;

        tokio::spawn(async move {
            let text = match source {
                DiffSource::PullRequest { number } => {
                    pr_diff_text(gh.as_ref(), &repo_root, number).await
                }
                DiffSource::WorkingTree { scope } => {
                    let path = match &selection {
                        DiffSelection::Path(path) => Some(path.as_str()),
                        _ => None,
                    };
                    diff_text(git.as_ref(), &repo_root, scope, path, untracked).await
                }
            };

            let result = match text {
                Ok(text) => parse_document(text, source, line_limit).await,
                Err(e) => {
                    log::warn!("Diff for {} failed: {}", selection, e);
                    Err(e.user_message())
                }
            };
            dispatcher.dispatch(SessionAction::DiffLoaded {
                tag,
                selection,
                result,
            });
        });
    }

    fn arm_debounce(&mut self, generation: u64, delay: Duration) {
        self.cancel_debounce();
        let dispatcher = self.dispatcher.clone();
        self.debounce_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            dispatcher.dispatch(SessionAction::DebounceElapsed { generation });
        }));
    }

    fn cancel_debounce(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
    }

    fn start_watch(&mut self, repo_root: &Path) {
        self.watcher = None;

        let dir = match control_dir(repo_root) {
            Ok(dir) => dir,
            Err(e) => {
                log::warn!(
                    "No git directory for {}, relying on polling: {}",
                    repo_root.display(),
                    e
                );
                return;
            }
        };

        match ControlDirWatcher::new(dir, self.dispatcher.clone()) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => log::warn!("Could not watch {}: {}", repo_root.display(), e),
        }
    }

    fn rewatch(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            if let Err(e) = watcher.rewatch() {
                log::warn!("Rewatch failed: {}", e);
            }
        }
    }

    fn start_polling(&mut self) {
        self.stop_polling();

        let period = self.config.poll_interval();
        if period.is_zero() {
            log::warn!("Polling disabled: poll interval is zero");
            return;
        }

        let dispatcher = self.dispatcher.clone();
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if dispatcher.is_closed() {
                    break;
                }
                dispatcher.dispatch(SessionAction::PollTick);
            }
        }));
    }

    fn stop_polling(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }

    fn mutate(&self, repo_root: PathBuf, path: String, mutation: Mutation) {
        let git = Arc::clone(&self.git);
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let result = match mutation {
                Mutation::Stage => stage(git.as_ref(), &repo_root, &path).await,
                Mutation::Unstage => unstage(git.as_ref(), &repo_root, &path).await,
            }
            .map_err(|e| e.user_message());

            dispatcher.dispatch(SessionAction::MutationFinished {
                path,
                mutation,
                result,
            });
        });
    }
}

/// Parse on the blocking pool; large diffs must not stall the runtime
async fn parse_document(
    text: String,
    source: DiffSource,
    line_limit: usize,
) -> Result<Arc<DiffDocument>, String> {
    tokio::task::spawn_blocking(move || parse_unified_with_limit(&text, source, line_limit))
        .await
        .map(Arc::new)
        .map_err(|e| format!("Diff parser failed: {}", e))
}
