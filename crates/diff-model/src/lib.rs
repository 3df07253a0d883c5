//! # diff-model
//!
//! The data model published by the diff synchronization engine, together with
//! the unified diff parser that produces it.
//!
//! ## Design Principles
//!
//! Everything in this crate is a **pure value or a pure function**. The parser
//! keeps no state between calls, so it can run on any worker thread, and the
//! model types are immutable snapshots once built:
//!
//! - [`ChangeEntry`] describes one changed path from a status listing
//! - [`DiffDocument`] is the parsed result of one diff request
//! - [`DiffFile`], [`DiffHunk`] and [`DiffLine`] address every line of it
//!
//! Malformed input never produces an error. Unsupported or oversized content
//! is degraded into [`DiffFile::fallback_text`] so a presentation layer can show
//! something without special-casing failures.
//!
//! ## Usage
//!
//! ```rust
//! use diff_model::{parse_unified, ChangeScope, DiffSource, LineKind};
//!
//! let text = "diff --git a/x.txt b/x.txt\n--- a/x.txt\n+++ b/x.txt\n@@ -1 +1 @@\n-a\n+b\n";
//! let doc = parse_unified(text, DiffSource::WorkingTree { scope: ChangeScope::All });
//!
//! let file = &doc.files[0];
//! assert_eq!(file.path_new.as_deref(), Some("x.txt"));
//! assert_eq!(file.hunks[0].lines[1].kind, LineKind::Add);
//! ```

pub mod model;
pub mod parser;

// Re-export commonly used types
pub use model::{
    ChangeEntry, ChangeKind, ChangeScope, DiffDocument, DiffFile, DiffHunk, DiffLine, DiffSource,
    FileStatus, HunkId, LineId, LineKind,
};
pub use parser::{parse_unified, parse_unified_with_limit, MAX_RENDERED_LINES};
