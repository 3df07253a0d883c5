//! Status collector
//!
//! Turns `git status --porcelain=v1 -z` output into [`ChangeEntry`] records
//! and enriches them with per-path line counts. Enrichment is best-effort:
//! a failing numstat call or an unreadable untracked file only costs counts.

use crate::client::VcsClient;
use crate::commands::{numstat_args, status_args};
use crate::error::VcsError;
use diff_model::ChangeEntry;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

/// Bytes inspected for a NUL when deciding whether a file is binary
const BINARY_SNIFF_LEN: usize = 8000;

/// Per-path (additions, deletions)
pub type LineStats = HashMap<String, (usize, usize)>;

/// List changed paths of the repository at `repo_root`.
///
/// Fails only when the listing itself fails; the returned entries are then
/// never partial.
pub async fn status_entries(
    client: &dyn VcsClient,
    repo_root: &Path,
    untracked_size_ceiling: u64,
) -> Result<Vec<ChangeEntry>, VcsError> {
    let output = client
        .run_checked(&status_args(), Some(repo_root), &[0])
        .await?;
    let text = output.stdout_utf8(client.program())?;
    let mut entries = parse_status_records(&text);

    let (unstaged, staged) = tokio::join!(
        line_stats(client, repo_root, false),
        line_stats(client, repo_root, true)
    );
    for entry in entries.iter_mut() {
        for stats in [&unstaged, &staged] {
            if let Some((added, deleted)) = stats.get(&entry.path) {
                entry.additions += added;
                entry.deletions += deleted;
            }
        }
    }

    for entry in entries.iter_mut().filter(|e| e.is_untracked()) {
        let path = repo_root.join(&entry.path);
        match count_untracked_lines(&path, untracked_size_ceiling).await {
            Ok(Some(lines)) => entry.additions = lines,
            Ok(None) => debug!("Skipping line count for {}", entry.path),
            Err(e) => warn!("Could not read untracked file {}: {}", path.display(), e),
        }
    }

    debug!("Collected {} changed paths", entries.len());
    Ok(entries)
}

async fn line_stats(client: &dyn VcsClient, repo_root: &Path, cached: bool) -> LineStats {
    let result = client
        .run_checked(&numstat_args(cached), Some(repo_root), &[0])
        .await;
    match result {
        Ok(output) => parse_numstat(&output.stdout_lossy()),
        Err(e) => {
            warn!(
                "{} line stats unavailable: {}",
                if cached { "Staged" } else { "Unstaged" },
                e
            );
            LineStats::new()
        }
    }
}

/// Parse NUL-separated porcelain v1 status records.
///
/// `##` branch records are skipped. A record whose status carries a rename
/// or copy marker in either column consumes the following record as its
/// origin path.
pub fn parse_status_records(text: &str) -> Vec<ChangeEntry> {
    let mut records = text.split('\0').filter(|r| !r.is_empty());
    let mut entries = Vec::new();

    while let Some(record) = records.next() {
        if record.starts_with("##") {
            continue;
        }

        let (Some(code), Some(path)) = (record.get(..2), record.get(3..)) else {
            debug!("Ignoring malformed status record: {:?}", record);
            continue;
        };

        let origin = if code.contains(['R', 'C']) {
            records.next().map(str::to_string)
        } else {
            None
        };

        entries.push(ChangeEntry::new(code, path, origin));
    }

    entries
}

/// Parse `git diff --numstat -z` output into per-path counts.
///
/// Binary rows (`-\t-`) count as zero. Renamed rows carry an empty path
/// followed by the old and new paths as separate records; they are keyed
/// by the new path.
pub fn parse_numstat(text: &str) -> LineStats {
    let mut stats = LineStats::new();
    let mut records = text.split('\0');

    while let Some(record) = records.next() {
        if record.is_empty() {
            continue;
        }
        let mut fields = record.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            debug!("Ignoring malformed numstat record: {:?}", record);
            continue;
        };

        let path = if path.is_empty() {
            let _old = records.next();
            match records.next() {
                Some(new) => new,
                None => continue,
            }
        } else {
            path
        };

        let added = added.parse().unwrap_or(0);
        let deleted = deleted.parse().unwrap_or(0);
        let slot = stats.entry(path.to_string()).or_insert((0, 0));
        slot.0 += added;
        slot.1 += deleted;
    }

    stats
}

/// Count lines of an untracked file.
///
/// `None` when the file exceeds `size_ceiling` bytes or looks binary.
pub async fn count_untracked_lines(
    path: &Path,
    size_ceiling: u64,
) -> std::io::Result<Option<usize>> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() || metadata.len() > size_ceiling {
        return Ok(None);
    }

    let bytes = tokio::fs::read(path).await?;
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return Ok(None);
    }

    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    let unterminated = bytes.last().is_some_and(|&b| b != b'\n');
    Ok(Some(newlines + usize::from(unterminated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandOutput;
    use async_trait::async_trait;
    use diff_model::ChangeKind;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Mock git answering by command shape
    #[derive(Debug, Clone, Default)]
    struct MockClient {
        status: Vec<u8>,
        unstaged: Option<String>,
        staged: Option<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockClient {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VcsClient for MockClient {
        fn program(&self) -> &str {
            "git"
        }

        async fn run(
            &self,
            args: &[String],
            _cwd: Option<&Path>,
        ) -> Result<CommandOutput, VcsError> {
            let joined = args.join(" ");
            self.calls.lock().unwrap().push(joined.clone());

            let numstat = |stats: &Option<String>| match stats {
                Some(text) => CommandOutput::ok(text.clone()),
                None => CommandOutput::new("", "fatal: bad revision", 128),
            };

            Ok(if args[0] == "status" {
                CommandOutput::ok(self.status.clone())
            } else if joined.contains("--cached") {
                numstat(&self.staged)
            } else {
                numstat(&self.unstaged)
            })
        }
    }

    #[test]
    fn test_parse_rename_record() {
        let entries = parse_status_records("R  new.txt\0old.txt\0");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "new.txt");
        assert_eq!(entries[0].original_path.as_deref(), Some("old.txt"));
        assert_eq!(entries[0].kind, ChangeKind::Renamed);
    }

    #[test]
    fn test_parse_mixed_records() {
        let text = "## main...origin/main [ahead 1]\0 M src/lib.rs\0A  added.rs\0?? notes.md\0UU conflict.rs\0C  copy.rs\0orig.rs\0 D gone.rs\0";
        let entries = parse_status_records(text);

        let summary: Vec<(&str, ChangeKind, Option<&str>)> = entries
            .iter()
            .map(|e| (e.path.as_str(), e.kind, e.original_path.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("src/lib.rs", ChangeKind::Modified, None),
                ("added.rs", ChangeKind::Added, None),
                ("notes.md", ChangeKind::Untracked, None),
                ("conflict.rs", ChangeKind::Conflicted, None),
                ("copy.rs", ChangeKind::Copied, Some("orig.rs")),
                ("gone.rs", ChangeKind::Deleted, None),
            ]
        );
    }

    #[test]
    fn test_rename_with_deleted_worktree_drops_origin() {
        let entries = parse_status_records("RD new.txt\0old.txt\0 M other\0");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ChangeKind::Deleted);
        assert_eq!(entries[0].original_path, None);
        assert_eq!(entries[1].path, "other");
    }

    #[test]
    fn test_paths_with_spaces_and_unicode() {
        let entries = parse_status_records(" M dir/with space/é.txt\0");
        assert_eq!(entries[0].path, "dir/with space/é.txt");
    }

    #[test]
    fn test_parse_numstat() {
        let text = "3\t1\tsrc/lib.rs\0-\t-\timage.png\02\t0\t\0old name.rs\0new name.rs\0";
        let stats = parse_numstat(text);
        assert_eq!(stats.get("src/lib.rs"), Some(&(3, 1)));
        assert_eq!(stats.get("image.png"), Some(&(0, 0)));
        assert_eq!(stats.get("new name.rs"), Some(&(2, 0)));
        assert_eq!(stats.get("old name.rs"), None);
    }

    #[tokio::test]
    async fn test_status_entries_merges_staged_and_unstaged_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.md"), "one\ntwo\nthree").unwrap();

        let client = MockClient {
            status: b"MM src/lib.rs\0?? notes.md\0".to_vec(),
            unstaged: Some("2\t1\tsrc/lib.rs\0".into()),
            staged: Some("5\t0\tsrc/lib.rs\0".into()),
            ..Default::default()
        };

        let entries = status_entries(&client, dir.path(), 1024).await.unwrap();
        assert_eq!((entries[0].additions, entries[0].deletions), (7, 1));
        assert_eq!((entries[1].additions, entries[1].deletions), (3, 0));
        assert_eq!(client.calls().len(), 3);
        assert_eq!(
            client.calls()[0],
            "status --porcelain=v1 -z -b --untracked-files=all --find-renames"
        );
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_listing() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            status: b" M a.rs\0?? missing.txt\0".to_vec(),
            unstaged: None,
            staged: None,
            ..Default::default()
        };

        let entries = status_entries(&client, dir.path(), 1024).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].additions, 0);
        assert_eq!(entries[1].additions, 0);
    }

    #[tokio::test]
    async fn test_status_requires_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            status: vec![b' ', b'M', b' ', 0xff, 0],
            ..Default::default()
        };
        let err = status_entries(&client, dir.path(), 1024).await.unwrap_err();
        assert!(matches!(err, VcsError::Undecodable { .. }));
    }

    #[tokio::test]
    async fn test_untracked_line_count_limits() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a.txt");
        let binary = dir.path().join("b.bin");
        let empty = dir.path().join("empty");
        std::fs::write(&text, "a\nb\n").unwrap();
        std::fs::write(&binary, [b'x', 0, b'\n']).unwrap();
        std::fs::write(&empty, "").unwrap();

        assert_eq!(count_untracked_lines(&text, 1024).await.unwrap(), Some(2));
        assert_eq!(count_untracked_lines(&text, 3).await.unwrap(), None);
        assert_eq!(count_untracked_lines(&binary, 1024).await.unwrap(), None);
        assert_eq!(count_untracked_lines(&empty, 1024).await.unwrap(), Some(0));
    }
}
