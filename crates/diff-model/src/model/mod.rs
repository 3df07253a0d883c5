//! Data models for changed paths and parsed diffs.

mod change;
mod diff;
mod source;

pub use change::{ChangeEntry, ChangeKind};
pub use diff::{DiffDocument, DiffFile, DiffHunk, DiffLine, FileStatus, HunkId, LineId, LineKind};
pub use source::{ChangeScope, DiffSource};
