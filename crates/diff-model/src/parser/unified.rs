//! Parse unified diff format into a [`DiffDocument`].
//!
//! The parser is a single forward scan with one file accumulator. It never
//! fails: anything it cannot turn into hunks ends up as fallback text on the
//! file it belongs to.

use super::paths::{marker_path, split_header_paths, strip_side_prefix, unquote, DEV_NULL};
use crate::model::{
    DiffDocument, DiffFile, DiffHunk, DiffLine, DiffSource, FileStatus, HunkId, LineKind,
};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Default per-file ceiling of counted diff lines before hunks are dropped.
pub const MAX_RENDERED_LINES: usize = 10_000;

const SYNTHETIC_HUNK_HEADER: &str = "@@ -0,0 +0,0 @@";

/// Parse a unified diff string into a structured [`DiffDocument`].
///
/// # Example
/// ```
/// use diff_model::{parse_unified, DiffSource};
///
/// let doc = parse_unified("diff --git a/a b/a\n@@ -1 +1 @@\n-x\n+y\n", DiffSource::PullRequest { number: 7 });
/// assert_eq!(doc.files.len(), 1);
/// assert_eq!(doc.total_additions(), 1);
/// ```
pub fn parse_unified(text: &str, source: DiffSource) -> DiffDocument {
    parse_unified_with_limit(text, source, MAX_RENDERED_LINES)
}

/// Same as [`parse_unified`] with an explicit per-file line budget.
pub fn parse_unified_with_limit(text: &str, source: DiffSource, line_limit: usize) -> DiffDocument {
    let mut doc = DiffDocument::new(source);
    let mut current: Option<FileBuilder> = None;

    for raw in text.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush(&mut doc, current.take());
            current = Some(FileBuilder::git(rest, line_limit));
            continue;
        }

        if let Some(rest) = line
            .strip_prefix("diff --cc ")
            .or_else(|| line.strip_prefix("diff --combined "))
        {
            flush(&mut doc, current.take());
            current = Some(FileBuilder::combined(rest, line_limit));
            continue;
        }

        match current.as_mut() {
            Some(file) if !file.starts_next_plain_file(line) => file.feed(line),
            _ => {
                // Header-less `diff -u` output starts each file at its `---` line.
                // Anything else before the first header is preamble.
                if let Some(rest) = line.strip_prefix("--- ") {
                    flush(&mut doc, current.take());
                    current = Some(FileBuilder::plain(rest, line_limit));
                }
            }
        }
    }

    flush(&mut doc, current.take());
    doc
}

fn flush(doc: &mut DiffDocument, builder: Option<FileBuilder>) {
    if let Some(builder) = builder {
        doc.files.push(builder.finish());
    }
}

/// Parse `@@ -a[,b] +c[,d] @@`; omitted counts are 1.
fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    static HUNK_REGEX: OnceLock<Regex> = OnceLock::new();

    let re = HUNK_REGEX
        .get_or_init(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

    let captures = re.captures(line)?;
    let number = |idx: usize| -> Option<u32> {
        match captures.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(1),
        }
    };

    Some((number(1)?, number(2)?, number(3)?, number(4)?))
}

/// Classify a hunk body line by its marker.
fn content_line(line: &str, allow_empty: bool) -> Option<(LineKind, &str)> {
    match line.as_bytes().first() {
        Some(b'+') => Some((LineKind::Add, &line[1..])),
        Some(b'-') => Some((LineKind::Delete, &line[1..])),
        Some(b' ') => Some((LineKind::Context, &line[1..])),
        Some(b'\\') => Some((LineKind::Meta, &line[1..])),
        None if allow_empty => Some((LineKind::Context, "")),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Lines are parsed into hunks.
    Hunks,
    /// Lines are kept verbatim as fallback text (binary and combined diffs).
    Verbatim,
}

struct HunkBuilder {
    hunk: DiffHunk,
    old_cursor: u32,
    new_cursor: u32,
    old_remaining: u32,
    new_remaining: u32,
}

impl HunkBuilder {
    fn push(&mut self, kind: LineKind, text: &str, retain: bool) {
        match kind {
            LineKind::Context => {
                if retain {
                    let id = self.hunk.next_line_id();
                    self.hunk.lines.push(DiffLine::context(
                        id,
                        text,
                        self.old_cursor,
                        self.new_cursor,
                    ));
                }
                self.advance_old();
                self.advance_new();
            }
            LineKind::Add => {
                if retain {
                    let id = self.hunk.next_line_id();
                    self.hunk.lines.push(DiffLine::add(id, text, self.new_cursor));
                }
                self.advance_new();
            }
            LineKind::Delete => {
                if retain {
                    let id = self.hunk.next_line_id();
                    self.hunk
                        .lines
                        .push(DiffLine::delete(id, text, self.old_cursor));
                }
                self.advance_old();
            }
            LineKind::Meta => {
                if retain {
                    let id = self.hunk.next_line_id();
                    self.hunk.lines.push(DiffLine::meta(id, text));
                }
            }
        }
    }

    fn advance_old(&mut self) {
        self.old_cursor = self.old_cursor.saturating_add(1);
        self.old_remaining = self.old_remaining.saturating_sub(1);
    }

    fn advance_new(&mut self) {
        self.new_cursor = self.new_cursor.saturating_add(1);
        self.new_remaining = self.new_remaining.saturating_sub(1);
    }

    fn expects_lines(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    fn expects_context(&self) -> bool {
        self.old_remaining > 0 && self.new_remaining > 0
    }
}

/// Accumulates one file section.
struct FileBuilder {
    file: DiffFile,
    mode: Mode,
    /// Started from a `---` line rather than a `diff` header.
    plain: bool,
    hunk: Option<HunkBuilder>,
    next_hunk_ordinal: u32,
    /// Primary path shared by every hunk and line id of this file.
    key: Option<Arc<str>>,
    counted_lines: usize,
    line_limit: usize,
}

impl FileBuilder {
    fn new(file: DiffFile, line_limit: usize) -> Self {
        Self {
            file,
            mode: Mode::Hunks,
            plain: false,
            hunk: None,
            next_hunk_ordinal: 0,
            key: None,
            counted_lines: 0,
            line_limit,
        }
    }

    fn git(rest: &str, line_limit: usize) -> Self {
        let (old, new) = match split_header_paths(rest) {
            Some((old, new)) => (
                Some(strip_side_prefix(old, "a/")),
                Some(strip_side_prefix(new, "b/")),
            ),
            None => {
                log::debug!("Unparseable diff header paths: {}", rest);
                (None, None)
            }
        };
        Self::new(DiffFile::new(old, new), line_limit)
    }

    fn combined(rest: &str, line_limit: usize) -> Self {
        let path = unquote(rest.trim_end());
        let mut file = DiffFile::new(Some(path.clone()), Some(path));
        file.status = FileStatus::CombinedUnsupported;

        let mut builder = Self::new(file, line_limit);
        builder.mode = Mode::Verbatim;
        builder
    }

    fn plain(rest: &str, line_limit: usize) -> Self {
        let mut builder = Self::new(DiffFile::new(None, None), line_limit);
        builder.plain = true;
        builder.set_old_path(rest);
        builder
    }

    /// A header-less file ends where the next `---` line appears outside a hunk body.
    fn starts_next_plain_file(&self, line: &str) -> bool {
        self.plain
            && line.starts_with("--- ")
            && self.next_hunk_ordinal > 0
            && !self.expects_body()
    }

    fn expects_body(&self) -> bool {
        self.hunk.as_ref().is_some_and(HunkBuilder::expects_lines)
    }

    fn feed(&mut self, line: &str) {
        if self.mode == Mode::Verbatim {
            self.append_fallback(line);
            return;
        }

        if self.expects_body() {
            let allow_empty = self.hunk.as_ref().is_some_and(HunkBuilder::expects_context);
            if let Some((kind, text)) = content_line(line, allow_empty) {
                self.push_content(kind, text);
                return;
            }
        }

        if line.starts_with("@@") {
            self.open_hunk(line);
        } else if let Some(rest) = line.strip_prefix("--- ") {
            self.set_old_path(rest);
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            self.set_new_path(rest);
        } else if line.starts_with("new file mode") {
            self.file.status = FileStatus::Added;
        } else if line.starts_with("deleted file mode") {
            self.file.status = FileStatus::Deleted;
        } else if let Some(path) = line.strip_prefix("rename from ") {
            self.file.path_old = Some(unquote(path));
            self.file.status = FileStatus::Renamed;
        } else if let Some(path) = line.strip_prefix("rename to ") {
            self.file.path_new = Some(unquote(path));
            self.file.status = FileStatus::Renamed;
        } else if let Some(path) = line.strip_prefix("copy from ") {
            self.file.path_old = Some(unquote(path));
            self.file.status = FileStatus::Copied;
        } else if let Some(path) = line.strip_prefix("copy to ") {
            self.file.path_new = Some(unquote(path));
            self.file.status = FileStatus::Copied;
        } else if line.starts_with("GIT binary patch")
            || (line.starts_with("Binary files ") && line.ends_with(" differ"))
        {
            self.enter_binary(line);
        } else if let Some((kind, text)) = content_line(line, false) {
            self.push_content(kind, text);
        }
        // index, similarity and mode lines carry nothing we keep
    }

    fn set_old_path(&mut self, rest: &str) {
        let path = marker_path(rest);
        if path == DEV_NULL {
            self.file.path_old = None;
            self.file.status = FileStatus::Added;
        } else {
            self.file.path_old = Some(strip_side_prefix(path, "a/"));
        }
    }

    fn set_new_path(&mut self, rest: &str) {
        let path = marker_path(rest);
        if path == DEV_NULL {
            self.file.path_new = None;
            self.file.status = FileStatus::Deleted;
        } else {
            self.file.path_new = Some(strip_side_prefix(path, "b/"));
        }
    }

    fn enter_binary(&mut self, line: &str) {
        self.file.status = FileStatus::Binary;
        self.mode = Mode::Verbatim;
        self.append_fallback(line);
    }

    fn append_fallback(&mut self, line: &str) {
        match self.file.fallback_text.as_mut() {
            Some(text) => {
                text.push('\n');
                text.push_str(line);
            }
            None => self.file.fallback_text = Some(line.to_string()),
        }
    }

    fn key(&mut self) -> Arc<str> {
        let file = &self.file;
        Arc::clone(
            self.key
                .get_or_insert_with(|| Arc::from(file.primary_path())),
        )
    }

    fn open_hunk(&mut self, line: &str) {
        self.close_hunk();
        let (old_start, old_count, new_start, new_count) =
            parse_hunk_header(line).unwrap_or_else(|| {
                log::debug!("Unrecognized hunk header: {}", line);
                (0, 0, 0, 0)
            });
        self.start_hunk(line, old_start, old_count, new_start, new_count);
    }

    fn start_hunk(
        &mut self,
        header: &str,
        old_start: u32,
        old_count: u32,
        new_start: u32,
        new_count: u32,
    ) {
        let id = HunkId {
            file: self.key(),
            ordinal: self.next_hunk_ordinal,
        };
        self.next_hunk_ordinal += 1;

        self.hunk = Some(HunkBuilder {
            hunk: DiffHunk::new(id, header, old_start, old_count, new_start, new_count),
            old_cursor: old_start,
            new_cursor: new_start,
            old_remaining: old_count,
            new_remaining: new_count,
        });
    }

    fn close_hunk(&mut self) {
        if let Some(builder) = self.hunk.take() {
            if !self.file.is_too_large_to_render {
                self.file.hunks.push(builder.hunk);
            }
        }
    }

    fn push_content(&mut self, kind: LineKind, text: &str) {
        if self.hunk.is_none() {
            self.start_hunk(SYNTHETIC_HUNK_HEADER, 0, 0, 0, 0);
        }

        match kind {
            LineKind::Add => {
                self.file.additions += 1;
                self.count_line();
            }
            LineKind::Delete => {
                self.file.deletions += 1;
                self.count_line();
            }
            LineKind::Context => self.count_line(),
            LineKind::Meta => {}
        }

        let retain = !self.file.is_too_large_to_render;
        if let Some(hunk) = self.hunk.as_mut() {
            hunk.push(kind, text, retain);
        }
    }

    fn count_line(&mut self) {
        self.counted_lines += 1;
        if !self.file.is_too_large_to_render && self.counted_lines > self.line_limit {
            log::debug!(
                "{} exceeds {} diff lines, dropping hunks",
                self.file.primary_path(),
                self.line_limit
            );
            self.file.is_too_large_to_render = true;
            self.file.hunks.clear();
            if let Some(hunk) = self.hunk.as_mut() {
                hunk.hunk.lines.clear();
            }
        }
    }

    fn finish(mut self) -> DiffFile {
        self.close_hunk();

        if self.file.is_too_large_to_render {
            self.file.hunks.clear();
            self.file.fallback_text = Some(format!(
                "Diff too large to render ({} lines)",
                self.counted_lines
            ));
        }

        if self.file.status == FileStatus::CombinedUnsupported && self.file.fallback_text.is_none()
        {
            self.file.fallback_text = Some("Combined diff not supported".to_string());
        }

        if self.file.status == FileStatus::Modified {
            if let (Some(old), Some(new)) = (&self.file.path_old, &self.file.path_new) {
                if old != new {
                    self.file.status = FileStatus::Renamed;
                }
            }
        }

        self.file
    }
}
