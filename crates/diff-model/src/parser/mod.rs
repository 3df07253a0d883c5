//! Parse unified diff text (as printed by `git diff` or `gh pr diff`).

mod paths;
mod unified;

pub use unified::{parse_unified, parse_unified_with_limit, MAX_RENDERED_LINES};
