//! git and gh command lines used by the engine.

use crate::client::VcsClient;
use crate::error::VcsError;
use diff_model::ChangeScope;
use log::info;
use std::path::Path;

/// Diff commands exit with 1 when there are differences.
const DIFF_EXIT_CODES: &[i32] = &[0, 1];

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

pub fn status_args() -> Vec<String> {
    args([
        "status",
        "--porcelain=v1",
        "-z",
        "-b",
        "--untracked-files=all",
        "--find-renames",
    ])
}

/// `git diff [--cached] --numstat -z`
pub fn numstat_args(cached: bool) -> Vec<String> {
    if cached {
        args(["diff", "--cached", "--numstat", "-z"])
    } else {
        args(["diff", "--numstat", "-z"])
    }
}

/// Diff of tracked changes for a scope, optionally limited to one path.
pub fn diff_args(scope: ChangeScope, path: Option<&str>) -> Vec<String> {
    let mut argv = args(["diff"]);
    match scope {
        ChangeScope::All => argv.push("HEAD".into()),
        ChangeScope::Staged => argv.push("--cached".into()),
        ChangeScope::Unstaged => {}
    }
    argv.extend(args(["--no-color", "--no-ext-diff", "-M"]));
    if let Some(path) = path {
        argv.push("--".into());
        argv.push(path.into());
    }
    argv
}

/// Untracked files have no index entry; diff them against /dev/null.
pub fn untracked_diff_args(path: &str) -> Vec<String> {
    let mut argv = args(["diff", "--no-color", "--no-index", "--", "/dev/null"]);
    argv.push(path.into());
    argv
}

pub fn pr_diff_args(number: u64) -> Vec<String> {
    let mut argv = args(["pr", "diff"]);
    argv.push(number.to_string());
    argv.push("--color=never".into());
    argv
}

pub fn stage_args(path: &str) -> Vec<String> {
    let mut argv = args(["add", "--"]);
    argv.push(path.into());
    argv
}

pub fn unstage_args(path: &str) -> Vec<String> {
    let mut argv = args(["reset", "-q", "HEAD", "--"]);
    argv.push(path.into());
    argv
}

/// Raw working-tree diff text.
///
/// `untracked` selects the `--no-index` form, which requires a path.
pub async fn diff_text(
    git: &dyn VcsClient,
    repo_root: &Path,
    scope: ChangeScope,
    path: Option<&str>,
    untracked: bool,
) -> Result<String, VcsError> {
    let argv = match (untracked, path) {
        (true, Some(path)) => untracked_diff_args(path),
        _ => diff_args(scope, path),
    };
    let output = git
        .run_checked(&argv, Some(repo_root), DIFF_EXIT_CODES)
        .await?;
    Ok(output.stdout_lossy())
}

/// Raw diff text of a pull request.
pub async fn pr_diff_text(
    gh: &dyn VcsClient,
    repo_root: &Path,
    number: u64,
) -> Result<String, VcsError> {
    let output = gh
        .run_checked(&pr_diff_args(number), Some(repo_root), DIFF_EXIT_CODES)
        .await?;
    Ok(output.stdout_lossy())
}

pub async fn stage(git: &dyn VcsClient, repo_root: &Path, path: &str) -> Result<(), VcsError> {
    info!("Staging {}", path);
    git.run_checked(&stage_args(path), Some(repo_root), &[0])
        .await?;
    Ok(())
}

pub async fn unstage(git: &dyn VcsClient, repo_root: &Path, path: &str) -> Result<(), VcsError> {
    info!("Unstaging {}", path);
    git.run_checked(&unstage_args(path), Some(repo_root), &[0])
        .await?;
    Ok(())
}
