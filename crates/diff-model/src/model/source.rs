//! Where a diff comes from and which part of the working tree it covers.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Filter scope over the working tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeScope {
    /// Staged and unstaged changes together (compared against HEAD).
    #[default]
    All,
    /// Changes recorded in the index.
    Staged,
    /// Changes in the working tree that are not staged, untracked files included.
    Unstaged,
}

impl ChangeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeScope::All => "all",
            ChangeScope::Staged => "staged",
            ChangeScope::Unstaged => "unstaged",
        }
    }
}

impl fmt::Display for ChangeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ChangeScope::All),
            "staged" | "cached" | "index" => Ok(ChangeScope::Staged),
            "unstaged" | "worktree" => Ok(ChangeScope::Unstaged),
            other => Err(format!("unknown scope '{}'", other)),
        }
    }
}

/// The request a [`DiffDocument`](crate::DiffDocument) was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffSource {
    /// The live working tree, filtered by scope.
    WorkingTree { scope: ChangeScope },
    /// A pull request, identified by its number.
    PullRequest { number: u64 },
}

impl fmt::Display for DiffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSource::WorkingTree { scope } => write!(f, "working tree ({})", scope),
            DiffSource::PullRequest { number } => write!(f, "PR #{}", number),
        }
    }
}
