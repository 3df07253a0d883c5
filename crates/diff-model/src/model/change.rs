//! Changed-path records produced from a status listing.

use super::source::ChangeScope;
use serde::Serialize;

/// Kind of change for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Conflicted,
    Unknown,
}

impl ChangeKind {
    /// Derive the kind from the two status columns (index, worktree).
    ///
    /// Checked in order: conflict, added, deleted, renamed, copied, modified,
    /// untracked, unknown.
    pub fn from_status(index: char, worktree: char) -> Self {
        let either = |c: char| index == c || worktree == c;

        if either('U') || (index == 'A' && worktree == 'A') || (index == 'D' && worktree == 'D') {
            ChangeKind::Conflicted
        } else if either('A') {
            ChangeKind::Added
        } else if either('D') {
            ChangeKind::Deleted
        } else if either('R') {
            ChangeKind::Renamed
        } else if either('C') {
            ChangeKind::Copied
        } else if either('M') || either('T') {
            ChangeKind::Modified
        } else if index == '?' && worktree == '?' {
            ChangeKind::Untracked
        } else {
            ChangeKind::Unknown
        }
    }

    /// Whether records of this kind carry an origin path.
    pub fn has_origin(&self) -> bool {
        matches!(self, ChangeKind::Renamed | ChangeKind::Copied)
    }

    /// Get a single-character representation.
    pub fn as_char(&self) -> char {
        match self {
            ChangeKind::Modified => 'M',
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
            ChangeKind::Copied => 'C',
            ChangeKind::Untracked => '?',
            ChangeKind::Conflicted => 'U',
            ChangeKind::Unknown => ' ',
        }
    }
}

/// One changed path.
///
/// `original_path` is set iff `kind` is [`ChangeKind::Renamed`] or
/// [`ChangeKind::Copied`]; use [`ChangeEntry::new`] to keep that true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    /// Current path, relative to the repository root.
    pub path: String,
    /// Origin path for renames and copies.
    pub original_path: Option<String>,
    pub kind: ChangeKind,
    /// Raw two-character status code (index column, worktree column).
    pub status_code: String,
    /// Added lines (staged + unstaged, or the line count of an untracked file).
    pub additions: usize,
    /// Removed lines (staged + unstaged).
    pub deletions: usize,
}

impl ChangeEntry {
    /// Build an entry from a raw status code, deriving the kind.
    ///
    /// An origin is only kept when the derived kind is a rename or copy.
    pub fn new(
        status_code: impl Into<String>,
        path: impl Into<String>,
        origin: Option<String>,
    ) -> Self {
        let status_code = status_code.into();
        let mut chars = status_code.chars();
        let index = chars.next().unwrap_or(' ');
        let worktree = chars.next().unwrap_or(' ');
        let kind = ChangeKind::from_status(index, worktree);

        Self {
            path: path.into(),
            original_path: origin.filter(|_| kind.has_origin()),
            kind,
            status_code,
            additions: 0,
            deletions: 0,
        }
    }

    /// Status character of the index (staged) column.
    pub fn index_status(&self) -> char {
        self.status_code.chars().next().unwrap_or(' ')
    }

    /// Status character of the worktree (unstaged) column.
    pub fn worktree_status(&self) -> char {
        self.status_code.chars().nth(1).unwrap_or(' ')
    }

    pub fn is_untracked(&self) -> bool {
        self.kind == ChangeKind::Untracked
    }

    /// Whether this entry belongs to the given filter scope.
    pub fn in_scope(&self, scope: ChangeScope) -> bool {
        match scope {
            ChangeScope::All => true,
            ChangeScope::Staged => !matches!(self.index_status(), ' ' | '?' | '!'),
            ChangeScope::Unstaged => {
                self.is_untracked() || !matches!(self.worktree_status(), ' ' | '!')
            }
        }
    }

    /// Get the display name (handles renames).
    pub fn display_name(&self) -> String {
        match &self.original_path {
            Some(origin) => format!("{} → {}", origin, self.path),
            None => self.path.clone(),
        }
    }
}
