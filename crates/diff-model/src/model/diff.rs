//! Diff data structures representing one parsed diff request.

use super::source::DiffSource;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A complete parsed diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffDocument {
    /// The request this document answers.
    pub source: DiffSource,
    /// All files in the diff, in input order.
    pub files: Vec<DiffFile>,
}

impl DiffDocument {
    /// Create an empty document for a source.
    pub fn new(source: DiffSource) -> Self {
        Self {
            source,
            files: Vec::new(),
        }
    }

    /// Total additions across all files.
    pub fn total_additions(&self) -> usize {
        self.files.iter().map(|f| f.additions).sum()
    }

    /// Total deletions across all files.
    pub fn total_deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions).sum()
    }

    /// Find a file by its old or new path.
    pub fn file(&self, path: &str) -> Option<&DiffFile> {
        self.files.iter().find(|f| {
            f.path_new.as_deref() == Some(path) || f.path_old.as_deref() == Some(path)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A single file's diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffFile {
    /// Path before the change (absent for pure additions).
    pub path_old: Option<String>,
    /// Path after the change (absent for pure deletions).
    pub path_new: Option<String>,
    /// File status.
    pub status: FileStatus,
    /// Number of added lines, counted even when hunks are not retained.
    pub additions: usize,
    /// Number of deleted lines, counted even when hunks are not retained.
    pub deletions: usize,
    /// Change hunks.
    pub hunks: Vec<DiffHunk>,
    /// Text shown instead of hunks (binary, combined or oversized diffs).
    pub fallback_text: Option<String>,
    /// Set when the file exceeded the line budget; `hunks` is then empty.
    pub is_too_large_to_render: bool,
}

impl DiffFile {
    /// Create a new modified file diff.
    pub fn new(path_old: Option<String>, path_new: Option<String>) -> Self {
        Self {
            path_old,
            path_new,
            status: FileStatus::Modified,
            additions: 0,
            deletions: 0,
            hunks: Vec::new(),
            fallback_text: None,
            is_too_large_to_render: false,
        }
    }

    /// The path used to identify this file: the new path, else the old one.
    pub fn primary_path(&self) -> &str {
        self.path_new
            .as_deref()
            .or(self.path_old.as_deref())
            .unwrap_or_default()
    }

    /// Get the display name for the file (handles renames).
    pub fn display_name(&self) -> String {
        match (&self.path_old, &self.path_new) {
            (Some(old), Some(new)) if old != new => format!("{} → {}", old, new),
            _ => self.primary_path().to_string(),
        }
    }

    /// Whether the presentation layer should show `fallback_text` instead of hunks.
    pub fn uses_fallback(&self) -> bool {
        self.hunks.is_empty() && self.fallback_text.is_some()
    }

    /// Number of retained lines across all hunks.
    pub fn retained_lines(&self) -> usize {
        self.hunks.iter().map(|h| h.lines.len()).sum()
    }
}

/// File status in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Binary,
    CombinedUnsupported,
}

impl FileStatus {
    /// Get a single-character representation.
    pub fn as_char(&self) -> char {
        match self {
            FileStatus::Modified => 'M',
            FileStatus::Added => 'A',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::Binary => 'B',
            FileStatus::CombinedUnsupported => '*',
        }
    }
}

/// Stable identifier of a hunk: the file's primary path plus a per-file ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HunkId {
    pub file: Arc<str>,
    pub ordinal: u32,
}

impl fmt::Display for HunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.ordinal)
    }
}

/// Stable identifier of a line: its hunk plus a per-hunk ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LineId {
    pub file: Arc<str>,
    pub hunk: u32,
    pub ordinal: u32,
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}:{}", self.file, self.hunk, self.ordinal)
    }
}

/// A contiguous region of changes (hunk).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffHunk {
    pub id: HunkId,
    /// Header line as it appeared in the input (e.g. "@@ -10,5 +10,7 @@ fn example()").
    pub header: String,
    /// Old file starting line.
    pub old_start: u32,
    /// Number of lines in old version.
    pub old_count: u32,
    /// New file starting line.
    pub new_start: u32,
    /// Number of lines in new version.
    pub new_count: u32,
    /// Lines in this hunk.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Create an empty hunk.
    pub fn new(
        id: HunkId,
        header: impl Into<String>,
        old_start: u32,
        old_count: u32,
        new_start: u32,
        new_count: u32,
    ) -> Self {
        Self {
            id,
            header: header.into(),
            old_start,
            old_count,
            new_start,
            new_count,
            lines: Vec::new(),
        }
    }

    /// Identifier for the next line appended to this hunk.
    pub fn next_line_id(&self) -> LineId {
        LineId {
            file: Arc::clone(&self.id.file),
            hunk: self.id.ordinal,
            ordinal: self.lines.len() as u32,
        }
    }

    /// Number of added lines in this hunk.
    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Add).count()
    }

    /// Number of deleted lines in this hunk.
    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Delete).count()
    }
}

/// A single line in the diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffLine {
    pub id: LineId,
    /// Line type.
    pub kind: LineKind,
    /// Line number in old file (context and deletions).
    pub old_line: Option<u32>,
    /// Line number in new file (context and additions).
    pub new_line: Option<u32>,
    /// Line content without the leading marker.
    pub text: String,
}

impl DiffLine {
    /// Create a new context line.
    pub fn context(id: LineId, text: impl Into<String>, old_line: u32, new_line: u32) -> Self {
        Self {
            id,
            kind: LineKind::Context,
            old_line: Some(old_line),
            new_line: Some(new_line),
            text: text.into(),
        }
    }

    /// Create a new addition line.
    pub fn add(id: LineId, text: impl Into<String>, new_line: u32) -> Self {
        Self {
            id,
            kind: LineKind::Add,
            old_line: None,
            new_line: Some(new_line),
            text: text.into(),
        }
    }

    /// Create a new deletion line.
    pub fn delete(id: LineId, text: impl Into<String>, old_line: u32) -> Self {
        Self {
            id,
            kind: LineKind::Delete,
            old_line: Some(old_line),
            new_line: None,
            text: text.into(),
        }
    }

    /// Create a meta line such as "\ No newline at end of file".
    pub fn meta(id: LineId, text: impl Into<String>) -> Self {
        Self {
            id,
            kind: LineKind::Meta,
            old_line: None,
            new_line: None,
            text: text.into(),
        }
    }

    /// Get the line number to display (prefers new_line, falls back to old_line).
    pub fn display_line_number(&self) -> Option<u32> {
        self.new_line.or(self.old_line)
    }
}

/// Line type in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Unchanged line.
    Context,
    /// Added line (+).
    Add,
    /// Removed line (-).
    Delete,
    /// Annotation line (\).
    Meta,
}

impl LineKind {
    /// Get the prefix character for this line type.
    pub fn prefix(&self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Add => '+',
            LineKind::Delete => '-',
            LineKind::Meta => '\\',
        }
    }
}
