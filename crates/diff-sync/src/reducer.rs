//! Session reducer
//!
//! Pure state transitions for the refresh coordinator. The reducer never
//! performs I/O; it returns [`Effect`]s for the session task to execute and
//! takes the current instant as an argument so every decision is replayable.

use crate::actions::{
    DiffSelection, Mutation, SessionAction, SessionContext, SessionMode, WatchEventKind,
};
use crate::state::SessionState;
use chrono::{DateTime, Utc};
use diff_model::{ChangeEntry, DiffDocument, DiffSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Side effects requested by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStatus {
        tag: u64,
        repo_root: PathBuf,
    },
    FetchDiff {
        tag: u64,
        repo_root: PathBuf,
        selection: DiffSelection,
        source: DiffSource,
        untracked: bool,
    },
    ArmDebounce {
        generation: u64,
        delay: Duration,
    },
    CancelDebounce,
    StartWatch {
        repo_root: PathBuf,
    },
    Rewatch,
    StopWatch,
    StartPolling,
    StopPolling,
    Mutate {
        repo_root: PathBuf,
        path: String,
        mutation: Mutation,
    },
    Publish,
}

/// Apply `action` to `state` at time `now`
pub fn reduce(state: &mut SessionState, action: SessionAction, now: Instant) -> Vec<Effect> {
    match action {
        SessionAction::SetVisible {
            visible: true,
            context,
        } => show(state, context),
        SessionAction::SetVisible { visible: false, .. } | SessionAction::Shutdown => hide(state),
        SessionAction::RequestRefresh { force } => request_refresh(state, force),
        SessionAction::LoadDiff(selection) => load_diff(state, selection),
        SessionAction::ClearSelection => {
            clear_selection(state);
            vec![Effect::Publish]
        }
        SessionAction::Stage(path) => mutate(state, path, Mutation::Stage, now),
        SessionAction::Unstage(path) => mutate(state, path, Mutation::Unstage, now),
        SessionAction::DebounceElapsed { generation } => debounce_elapsed(state, generation, now),
        SessionAction::PollTick => {
            if state.is_live() && state.polling {
                request_refresh(state, false)
            } else {
                vec![]
            }
        }
        SessionAction::Watch(kind) => watch_event(state, kind, now),
        SessionAction::StatusLoaded {
            tag,
            finished_at,
            result,
        } => status_loaded(state, tag, finished_at, result, now),
        SessionAction::DiffLoaded {
            tag,
            selection,
            result,
        } => diff_loaded(state, tag, selection, result),
        SessionAction::MutationFinished {
            path,
            mutation,
            result,
        } => mutation_finished(state, path, mutation, result),
    }
}

fn show(state: &mut SessionState, context: SessionContext) -> Vec<Effect> {
    let same_context = state.context.as_ref() == Some(&context);
    if state.visible && same_context {
        return vec![];
    }

    let mut effects = Vec::new();
    if state.visible {
        effects.extend(teardown(state));
    }
    if !same_context {
        log::info!("Session context: {}", context);
        reset_content(state);
    }

    state.visible = true;
    state.context = Some(context.clone());

    match context.mode {
        SessionMode::WorkingTree { .. } => {
            state.watching = true;
            state.polling = true;
            effects.push(Effect::StartWatch {
                repo_root: context.repo_root.clone(),
            });
            effects.push(Effect::StartPolling);
            effects.extend(request_refresh(state, true));
        }
        SessionMode::PullRequest { number } => {
            effects.extend(load_diff(state, DiffSelection::PullRequest(number)));
        }
    }

    effects.push(Effect::Publish);
    effects
}

fn hide(state: &mut SessionState) -> Vec<Effect> {
    if !state.visible {
        return vec![];
    }
    let mut effects = teardown(state);
    state.visible = false;
    effects.push(Effect::Publish);
    effects
}

/// Stop timers, watch and polling; supersede everything in flight.
fn teardown(state: &mut SessionState) -> Vec<Effect> {
    let mut effects = vec![Effect::CancelDebounce];
    if state.watching {
        state.watching = false;
        effects.push(Effect::StopWatch);
    }
    if state.polling {
        state.polling = false;
        effects.push(Effect::StopPolling);
    }

    state.debounce_armed = false;
    state.pending = false;
    state.pending_force = false;
    state.status_tag += 1;
    state.diff_tag += 1;
    state.refreshing = false;
    state.loading_diff = false;
    effects
}

fn reset_content(state: &mut SessionState) {
    state.entries = Arc::new(Vec::new());
    state.document = None;
    state.selection = None;
    state.status_error = None;
    state.diff_error = None;
    state.refreshed_at = None;
    state.last_refresh_finished = None;
    state.ignore_until = None;
}

fn request_refresh(state: &mut SessionState, force: bool) -> Vec<Effect> {
    let Some(context) = state.context.clone() else {
        return vec![];
    };
    if !state.visible {
        log::debug!("Refresh requested while hidden, ignoring");
        return vec![];
    }

    if let SessionMode::PullRequest { number } = context.mode {
        return load_diff(state, DiffSelection::PullRequest(number));
    }

    if state.refreshing {
        log::debug!("Refresh in flight, coalescing request (force: {})", force);
        state.pending = true;
        state.pending_force |= force;
        return vec![];
    }

    if force {
        state.debounce_armed = false;
        let mut effects = vec![Effect::CancelDebounce];
        effects.extend(start_refresh(state));
        return effects;
    }

    // Non-forced requests share one quiet period; min spacing is checked when it fires
    arm_debounce(state, state.timing.debounce)
}

fn arm_debounce(state: &mut SessionState, delay: Duration) -> Vec<Effect> {
    state.debounce_generation += 1;
    state.debounce_armed = true;
    vec![Effect::ArmDebounce {
        generation: state.debounce_generation,
        delay,
    }]
}

fn debounce_elapsed(state: &mut SessionState, generation: u64, now: Instant) -> Vec<Effect> {
    if !state.debounce_armed || generation != state.debounce_generation {
        log::debug!("Ignoring superseded debounce timer {}", generation);
        return vec![];
    }
    if !state.is_live() {
        state.debounce_armed = false;
        return vec![];
    }
    if state.refreshing {
        state.debounce_armed = false;
        state.pending = true;
        return vec![];
    }

    if let Some(finished) = state.last_refresh_finished {
        let since = now.saturating_duration_since(finished);
        let min = state.timing.min_refresh_interval;
        if since < min {
            log::debug!("Refresh rate limited, waiting {:?}", min - since);
            return arm_debounce(state, min - since);
        }
    }

    state.debounce_armed = false;
    start_refresh(state)
}

fn start_refresh(state: &mut SessionState) -> Vec<Effect> {
    let Some(repo_root) = state.context.as_ref().map(|c| c.repo_root.clone()) else {
        return vec![];
    };
    state.status_tag += 1;
    state.refreshing = true;
    log::debug!("Starting status refresh {}", state.status_tag);
    vec![
        Effect::FetchStatus {
            tag: state.status_tag,
            repo_root,
        },
        Effect::Publish,
    ]
}

fn status_loaded(
    state: &mut SessionState,
    tag: u64,
    finished_at: DateTime<Utc>,
    result: Result<Vec<ChangeEntry>, String>,
    now: Instant,
) -> Vec<Effect> {
    if tag != state.status_tag {
        log::debug!(
            "Dropping stale status result {} (latest {})",
            tag,
            state.status_tag
        );
        return vec![];
    }

    state.refreshing = false;
    state.last_refresh_finished = Some(now);
    state.refreshed_at = Some(finished_at);

    let mut effects = Vec::new();
    match result {
        Ok(entries) => {
            log::debug!("Status refresh {} found {} changes", tag, entries.len());
            state.entries = Arc::new(entries);
            state.status_error = None;
            effects.extend(reconcile_selection(state));
        }
        Err(message) => {
            log::warn!("Status refresh failed: {}", message);
            state.entries = Arc::new(Vec::new());
            state.status_error = Some(message);
        }
    }

    if state.pending {
        let force = state.pending_force;
        state.pending = false;
        state.pending_force = false;
        effects.extend(request_refresh(state, force));
    }

    effects.push(Effect::Publish);
    effects
}

/// Drop a path selection that vanished or left the scope; reload the rest.
fn reconcile_selection(state: &mut SessionState) -> Vec<Effect> {
    match state.selection.clone() {
        Some(DiffSelection::Path(path)) => {
            let scope = state.scope();
            let still_listed = state
                .entry(&path)
                .is_some_and(|entry| entry.in_scope(scope));
            if still_listed {
                load_diff(state, DiffSelection::Path(path))
            } else {
                log::info!("Selected path {} is no longer changed, clearing", path);
                clear_selection(state);
                vec![]
            }
        }
        Some(selection @ DiffSelection::WorkingTree) => load_diff(state, selection),
        _ => vec![],
    }
}

fn clear_selection(state: &mut SessionState) {
    state.selection = None;
    state.document = None;
    state.diff_error = None;
    state.loading_diff = false;
    state.diff_tag += 1;
}

fn load_diff(state: &mut SessionState, selection: DiffSelection) -> Vec<Effect> {
    if let Some(SessionMode::PullRequest { number }) = state.context.as_ref().map(|c| c.mode) {
        if !matches!(selection, DiffSelection::PullRequest(_)) {
            log::warn!("Ignoring selection {} while showing PR #{}", selection, number);
            return vec![];
        }
    }

    state.selection = Some(selection.clone());
    let Some(context) = state.context.clone() else {
        return vec![Effect::Publish];
    };
    if !state.visible {
        // Loaded when the session is shown again
        return vec![Effect::Publish];
    }

    let untracked = match &selection {
        DiffSelection::Path(path) => state.entry(path).is_some_and(ChangeEntry::is_untracked),
        _ => false,
    };

    state.diff_tag += 1;
    state.loading_diff = true;
    state.diff_error = None;
    log::debug!("Loading diff {} for {}", state.diff_tag, selection);

    vec![
        Effect::FetchDiff {
            tag: state.diff_tag,
            repo_root: context.repo_root.clone(),
            source: context.source_for(&selection),
            selection,
            untracked,
        },
        Effect::Publish,
    ]
}

fn diff_loaded(
    state: &mut SessionState,
    tag: u64,
    selection: DiffSelection,
    result: Result<Arc<DiffDocument>, String>,
) -> Vec<Effect> {
    if tag != state.diff_tag || state.selection.as_ref() != Some(&selection) {
        log::debug!(
            "Dropping stale diff for {} (tag {}, latest {})",
            selection,
            tag,
            state.diff_tag
        );
        return vec![];
    }

    state.loading_diff = false;
    match result {
        Ok(document) => {
            state.document = Some(document);
            state.diff_error = None;
        }
        Err(message) => {
            log::warn!("Diff load for {} failed: {}", selection, message);
            state.document = None;
            state.diff_error = Some(message);
        }
    }
    vec![Effect::Publish]
}

fn mutate(state: &mut SessionState, path: String, mutation: Mutation, now: Instant) -> Vec<Effect> {
    let Some(context) = state.context.as_ref() else {
        log::warn!("{:?} {} without a session context", mutation, path);
        return vec![];
    };
    if !context.tracks_working_tree() {
        log::warn!("{:?} is not available for pull requests", mutation);
        return vec![];
    }
    let repo_root = context.repo_root.clone();

    state.ignore_until = Some(now + state.timing.ignore_window);
    vec![Effect::Mutate {
        repo_root,
        path,
        mutation,
    }]
}

fn mutation_finished(
    state: &mut SessionState,
    path: String,
    mutation: Mutation,
    result: Result<(), String>,
) -> Vec<Effect> {
    if let Err(message) = result {
        log::warn!("{:?} {} failed: {}", mutation, path, message);
        state.status_error = Some(message);
    }
    let mut effects = request_refresh(state, true);
    effects.push(Effect::Publish);
    effects
}

fn watch_event(state: &mut SessionState, kind: WatchEventKind, now: Instant) -> Vec<Effect> {
    if !state.is_live() || !state.watching {
        return vec![];
    }

    let mut effects = Vec::new();
    if kind == WatchEventKind::Removed {
        effects.push(Effect::Rewatch);
    }

    if state.ignore_until.is_some_and(|until| now < until) {
        log::debug!("Watch event inside ignore window");
        return effects;
    }

    effects.extend(request_refresh(state, false));
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionTiming;
    use diff_model::{ChangeScope, DiffSource};
    use pretty_assertions::assert_eq;

    const MS: Duration = Duration::from_millis(1);

    fn timing() -> SessionTiming {
        SessionTiming {
            debounce: 150 * MS,
            min_refresh_interval: 400 * MS,
            ignore_window: 750 * MS,
        }
    }

    fn context() -> SessionContext {
        SessionContext::working_tree("/repo", ChangeScope::All)
    }

    fn shown(now: Instant) -> SessionState {
        let mut state = SessionState::new(timing());
        reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: context(),
            },
            now,
        );
        state
    }

    fn status_ok(tag: u64, entries: Vec<ChangeEntry>) -> SessionAction {
        SessionAction::StatusLoaded {
            tag,
            finished_at: Utc::now(),
            result: Ok(entries),
        }
    }

    fn fetches_status(effects: &[Effect]) -> Option<u64> {
        effects.iter().find_map(|e| match e {
            Effect::FetchStatus { tag, .. } => Some(*tag),
            _ => None,
        })
    }

    fn fetches_diff(effects: &[Effect]) -> Option<(u64, DiffSelection)> {
        effects.iter().find_map(|e| match e {
            Effect::FetchDiff { tag, selection, .. } => Some((*tag, selection.clone())),
            _ => None,
        })
    }

    fn debounce_armed(effects: &[Effect]) -> Option<(u64, Duration)> {
        effects.iter().find_map(|e| match e {
            Effect::ArmDebounce { generation, delay } => Some((*generation, *delay)),
            _ => None,
        })
    }

    fn document(source: DiffSource) -> Arc<DiffDocument> {
        Arc::new(DiffDocument::new(source))
    }

    #[test]
    fn test_show_starts_watch_poll_and_forced_refresh() {
        let mut state = SessionState::new(timing());
        let effects = reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: context(),
            },
            Instant::now(),
        );

        assert!(effects.contains(&Effect::StartWatch {
            repo_root: PathBuf::from("/repo")
        }));
        assert!(effects.contains(&Effect::StartPolling));
        assert_eq!(fetches_status(&effects), Some(1));
        assert!(state.refreshing);

        // Showing again with the same context is a no-op
        let again = reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: context(),
            },
            Instant::now(),
        );
        assert!(again.is_empty());
    }

    #[test]
    fn test_requests_during_flight_coalesce() {
        let now = Instant::now();
        let mut state = shown(now);

        assert!(reduce(&mut state, SessionAction::RequestRefresh { force: false }, now).is_empty());
        assert!(reduce(&mut state, SessionAction::RequestRefresh { force: true }, now).is_empty());
        assert!(reduce(&mut state, SessionAction::RequestRefresh { force: false }, now).is_empty());
        assert!(state.pending && state.pending_force);

        // One forced follow-up, immediately
        let effects = reduce(&mut state, status_ok(1, vec![]), now);
        assert_eq!(fetches_status(&effects), Some(2));
        assert!(!state.pending && !state.pending_force);
    }

    #[test]
    fn test_pending_non_forced_request_goes_through_debounce() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, SessionAction::RequestRefresh { force: false }, now);

        let effects = reduce(&mut state, status_ok(1, vec![]), now);
        assert_eq!(fetches_status(&effects), None);
        assert_eq!(debounce_armed(&effects), Some((1, 150 * MS)));
    }

    #[test]
    fn test_debounce_rearmed_by_each_request() {
        let t0 = Instant::now();
        let mut state = shown(t0);
        reduce(&mut state, status_ok(1, vec![]), t0);

        let first = reduce(&mut state, SessionAction::RequestRefresh { force: false }, t0);
        let second = reduce(
            &mut state,
            SessionAction::RequestRefresh { force: false },
            t0 + 50 * MS,
        );
        let (g1, _) = debounce_armed(&first).unwrap();
        let (g2, _) = debounce_armed(&second).unwrap();
        assert!(g2 > g1);

        let stale = reduce(
            &mut state,
            SessionAction::DebounceElapsed { generation: g1 },
            t0 + 500 * MS,
        );
        assert!(stale.is_empty());

        let fired = reduce(
            &mut state,
            SessionAction::DebounceElapsed { generation: g2 },
            t0 + 500 * MS,
        );
        assert_eq!(fetches_status(&fired), Some(2));
    }

    #[test]
    fn test_min_interval_after_last_refresh() {
        let t0 = Instant::now();
        let mut state = shown(t0);
        reduce(&mut state, status_ok(1, vec![]), t0);

        let armed = reduce(&mut state, SessionAction::RequestRefresh { force: false }, t0);
        let (generation, _) = debounce_armed(&armed).unwrap();

        let early = reduce(
            &mut state,
            SessionAction::DebounceElapsed { generation },
            t0 + 150 * MS,
        );
        let (next, delay) = debounce_armed(&early).unwrap();
        assert_eq!(delay, 250 * MS);
        assert_eq!(fetches_status(&early), None);

        let fired = reduce(
            &mut state,
            SessionAction::DebounceElapsed { generation: next },
            t0 + 400 * MS,
        );
        assert_eq!(fetches_status(&fired), Some(2));
    }

    #[test]
    fn test_forced_request_bypasses_debounce() {
        let t0 = Instant::now();
        let mut state = shown(t0);
        reduce(&mut state, status_ok(1, vec![]), t0);

        reduce(&mut state, SessionAction::RequestRefresh { force: false }, t0);
        let effects = reduce(&mut state, SessionAction::RequestRefresh { force: true }, t0 + MS);
        assert!(effects.contains(&Effect::CancelDebounce));
        assert_eq!(fetches_status(&effects), Some(2));
        assert!(!state.debounce_armed);
    }

    #[test]
    fn test_only_latest_diff_is_applied() {
        let now = Instant::now();
        let mut state = shown(now);
        let entries = vec![
            ChangeEntry::new(" M", "a.rs", None),
            ChangeEntry::new(" M", "b.rs", None),
        ];
        reduce(&mut state, status_ok(1, entries), now);

        let a = DiffSelection::Path("a.rs".into());
        let b = DiffSelection::Path("b.rs".into());
        let load_a = reduce(&mut state, SessionAction::LoadDiff(a.clone()), now);
        let load_b = reduce(&mut state, SessionAction::LoadDiff(b.clone()), now);
        let (tag_a, _) = fetches_diff(&load_a).unwrap();
        let (tag_b, _) = fetches_diff(&load_b).unwrap();
        assert!(tag_b > tag_a);

        let source = DiffSource::WorkingTree {
            scope: ChangeScope::All,
        };
        let late = reduce(
            &mut state,
            SessionAction::DiffLoaded {
                tag: tag_a,
                selection: a,
                result: Ok(document(source)),
            },
            now,
        );
        assert!(late.is_empty());
        assert!(state.document.is_none());
        assert!(state.loading_diff);

        let applied = reduce(
            &mut state,
            SessionAction::DiffLoaded {
                tag: tag_b,
                selection: b.clone(),
                result: Ok(document(source)),
            },
            now,
        );
        assert_eq!(applied, vec![Effect::Publish]);
        assert!(state.document.is_some());
        assert!(!state.loading_diff);

        // A result for the latest tag but another target is dropped too
        let mismatched = reduce(
            &mut state,
            SessionAction::DiffLoaded {
                tag: tag_b,
                selection: DiffSelection::WorkingTree,
                result: Err("nope".into()),
            },
            now,
        );
        assert!(mismatched.is_empty());
        assert_eq!(state.diff_error, None);
    }

    #[test]
    fn test_untracked_selection_flag() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, status_ok(1, vec![ChangeEntry::new("??", "new.txt", None)]), now);

        let selection = DiffSelection::Path("new.txt".into());
        let effects = reduce(&mut state, SessionAction::LoadDiff(selection), now);
        assert!(effects.iter().any(|e| matches!(e, Effect::FetchDiff { untracked: true, .. })));
    }

    #[test]
    fn test_refresh_clears_vanished_selection_and_reloads_valid_one() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(
            &mut state,
            status_ok(
                1,
                vec![
                    ChangeEntry::new(" M", "keep.rs", None),
                    ChangeEntry::new(" M", "gone.rs", None),
                ],
            ),
            now,
        );

        reduce(&mut state, SessionAction::LoadDiff(DiffSelection::Path("keep.rs".into())), now);
        reduce(&mut state, SessionAction::RequestRefresh { force: true }, now);
        let keep = vec![ChangeEntry::new(" M", "keep.rs", None)];
        let effects = reduce(&mut state, status_ok(2, keep), now);
        assert_eq!(
            fetches_diff(&effects).map(|(_, s)| s),
            Some(DiffSelection::Path("keep.rs".into()))
        );

        reduce(&mut state, SessionAction::LoadDiff(DiffSelection::Path("keep.rs".into())), now);
        reduce(&mut state, SessionAction::RequestRefresh { force: true }, now);
        let effects = reduce(&mut state, status_ok(3, vec![]), now);
        assert_eq!(fetches_diff(&effects), None);
        assert_eq!(state.selection, None);
        assert!(!state.loading_diff);
    }

    #[test]
    fn test_selection_out_of_scope_is_cleared() {
        let now = Instant::now();
        let mut state = SessionState::new(timing());
        reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: SessionContext::working_tree("/repo", ChangeScope::Staged),
            },
            now,
        );
        state.selection = Some(DiffSelection::Path("a.rs".into()));

        reduce(&mut state, status_ok(1, vec![ChangeEntry::new(" M", "a.rs", None)]), now);
        assert_eq!(state.selection, None);
    }

    #[test]
    fn test_status_failure_clears_entries() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, status_ok(1, vec![ChangeEntry::new(" M", "a.rs", None)]), now);
        reduce(&mut state, SessionAction::RequestRefresh { force: true }, now);

        reduce(
            &mut state,
            SessionAction::StatusLoaded {
                tag: 2,
                finished_at: Utc::now(),
                result: Err("fatal: not a git repository".into()),
            },
            now,
        );
        assert!(state.entries.is_empty());
        assert_eq!(state.status_error.as_deref(), Some("fatal: not a git repository"));
        assert!(!state.refreshing);
    }

    #[test]
    fn test_hide_tears_down_and_drops_in_flight_results() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, SessionAction::RequestRefresh { force: false }, now);

        let effects = reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: false,
                context: context(),
            },
            now,
        );
        assert!(effects.contains(&Effect::StopWatch));
        assert!(effects.contains(&Effect::StopPolling));
        assert!(effects.contains(&Effect::CancelDebounce));
        assert!(!state.pending);

        let late = status_ok(1, vec![ChangeEntry::new(" M", "a", None)]);
        assert!(reduce(&mut state, late, now).is_empty());
        assert!(state.entries.is_empty());

        // Hidden sessions ignore triggers
        assert!(reduce(&mut state, SessionAction::PollTick, now).is_empty());
        assert!(reduce(&mut state, SessionAction::Watch(WatchEventKind::Changed), now).is_empty());
        assert!(reduce(&mut state, SessionAction::RequestRefresh { force: true }, now).is_empty());
    }

    #[test]
    fn test_context_change_resets_content() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, status_ok(1, vec![ChangeEntry::new(" M", "a.rs", None)]), now);
        state.selection = Some(DiffSelection::Path("a.rs".into()));
        state.status_error = Some("old".into());

        let effects = reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: SessionContext::working_tree("/other", ChangeScope::All),
            },
            now,
        );
        assert!(effects.contains(&Effect::StopWatch));
        assert!(effects.contains(&Effect::StartWatch {
            repo_root: PathBuf::from("/other")
        }));
        assert!(state.entries.is_empty());
        assert_eq!(state.selection, None);
        assert_eq!(state.status_error, None);
        assert_eq!(fetches_status(&effects), Some(3));
    }

    #[test]
    fn test_pull_request_mode() {
        let now = Instant::now();
        let mut state = SessionState::new(timing());
        let effects = reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: SessionContext::pull_request("/repo", 42),
            },
            now,
        );
        assert!(!effects.contains(&Effect::StartPolling));
        assert!(!effects.iter().any(|e| matches!(e, Effect::StartWatch { .. })));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::FetchDiff {
                source: DiffSource::PullRequest { number: 42 },
                ..
            }
        )));

        let refresh = reduce(&mut state, SessionAction::RequestRefresh { force: false }, now);
        assert_eq!(
            fetches_diff(&refresh),
            Some((2, DiffSelection::PullRequest(42)))
        );
        assert!(reduce(&mut state, SessionAction::Stage("a".into()), now).is_empty());
    }

    #[test]
    fn test_pull_request_mode_ignores_working_tree_selections() {
        let now = Instant::now();
        let mut state = SessionState::new(timing());
        reduce(
            &mut state,
            SessionAction::SetVisible {
                visible: true,
                context: SessionContext::pull_request("/repo", 42),
            },
            now,
        );
        let diff_tag = state.diff_tag;

        for selection in [DiffSelection::Path("src/lib.rs".into()), DiffSelection::WorkingTree] {
            let effects = reduce(&mut state, SessionAction::LoadDiff(selection), now);
            assert!(effects.is_empty());
        }
        assert_eq!(state.selection, Some(DiffSelection::PullRequest(42)));
        assert_eq!(state.diff_tag, diff_tag);
    }

    #[test]
    fn test_watch_events_inside_ignore_window() {
        let t0 = Instant::now();
        let mut state = shown(t0);
        reduce(&mut state, status_ok(1, vec![]), t0);

        let effects = reduce(&mut state, SessionAction::Stage("a.rs".into()), t0);
        assert_eq!(
            effects,
            vec![Effect::Mutate {
                repo_root: PathBuf::from("/repo"),
                path: "a.rs".into(),
                mutation: Mutation::Stage,
            }]
        );

        let ignored = reduce(
            &mut state,
            SessionAction::Watch(WatchEventKind::Changed),
            t0 + 100 * MS,
        );
        assert!(ignored.is_empty());

        let removed = reduce(
            &mut state,
            SessionAction::Watch(WatchEventKind::Removed),
            t0 + 100 * MS,
        );
        assert_eq!(removed, vec![Effect::Rewatch]);

        let later = reduce(
            &mut state,
            SessionAction::Watch(WatchEventKind::Changed),
            t0 + 800 * MS,
        );
        assert!(debounce_armed(&later).is_some());
    }

    #[test]
    fn test_mutation_result_forces_refresh() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, status_ok(1, vec![]), now);

        let effects = reduce(
            &mut state,
            SessionAction::MutationFinished {
                path: "a.rs".into(),
                mutation: Mutation::Unstage,
                result: Err("error: pathspec 'a.rs' did not match".into()),
            },
            now,
        );
        assert_eq!(fetches_status(&effects), Some(2));
        assert_eq!(
            state.status_error.as_deref(),
            Some("error: pathspec 'a.rs' did not match")
        );

        // Success clears it once the refresh lands
        reduce(&mut state, status_ok(2, vec![]), now);
        assert_eq!(state.status_error, None);
    }

    #[test]
    fn test_poll_tick_requests_debounced_refresh() {
        let now = Instant::now();
        let mut state = shown(now);
        reduce(&mut state, status_ok(1, vec![]), now);

        let effects = reduce(&mut state, SessionAction::PollTick, now + 2000 * MS);
        assert!(debounce_armed(&effects).is_some());
    }
}
