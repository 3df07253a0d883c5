//! Process-based tool runner
//!
//! Direct implementation of the `VcsClient` trait using `tokio::process`.
//! GUI-launched processes often inherit a minimal `PATH`, so the executable
//! is looked up in the configured extra directories as well and the child
//! gets those directories appended to its own `PATH`.

use crate::client::VcsClient;
use crate::error::VcsError;
use crate::types::CommandOutput;
use async_trait::async_trait;
use diff_sync_config::SyncConfig;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Runs a named tool found on the (augmented) search path
#[derive(Debug, Clone)]
pub struct CliClient {
    program: String,
    explicit: Option<PathBuf>,
    extra_search_paths: Vec<PathBuf>,
}

impl CliClient {
    pub fn new(
        program: impl Into<String>,
        explicit: Option<PathBuf>,
        extra_search_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            explicit,
            extra_search_paths,
        }
    }

    /// Client for `git`, honoring `git_executable` from the config
    pub fn git(config: &SyncConfig) -> Self {
        Self::new(
            "git",
            config.git_executable.clone(),
            config.extra_search_paths.clone(),
        )
    }

    /// Client for `gh`, honoring `gh_executable` from the config
    pub fn gh(config: &SyncConfig) -> Self {
        Self::new(
            "gh",
            config.gh_executable.clone(),
            config.extra_search_paths.clone(),
        )
    }

    fn executable(&self, path_var: Option<&OsStr>) -> Result<PathBuf, VcsError> {
        resolve_executable(
            &self.program,
            self.explicit.as_deref(),
            path_var,
            &self.extra_search_paths,
        )
        .ok_or_else(|| VcsError::ExecutableNotFound {
            program: self.program.clone(),
            searched: self.searched_description(path_var),
        })
    }

    fn searched_description(&self, path_var: Option<&OsStr>) -> String {
        if let Some(explicit) = &self.explicit {
            return explicit.display().to_string();
        }
        let mut dirs: Vec<String> = path_var
            .map(|p| std::env::split_paths(p).map(|d| d.display().to_string()).collect())
            .unwrap_or_default();
        dirs.extend(self.extra_search_paths.iter().map(|d| d.display().to_string()));
        dirs.join(":")
    }
}

/// Find the executable for `program`.
///
/// An explicit path wins when it names a file. Otherwise every `PATH` entry
/// is tried, then the extra directories.
pub fn resolve_executable(
    program: &str,
    explicit: Option<&Path>,
    path_var: Option<&OsStr>,
    extra_search_paths: &[PathBuf],
) -> Option<PathBuf> {
    if let Some(explicit) = explicit {
        return explicit.is_file().then(|| explicit.to_path_buf());
    }

    let from_path = path_var
        .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
        .unwrap_or_default();

    from_path
        .iter()
        .chain(extra_search_paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// `PATH` for the child: the inherited value followed by any extra
/// directories not already on it.
pub fn augmented_path(path_var: Option<&OsStr>, extra_search_paths: &[PathBuf]) -> OsString {
    let mut dirs: Vec<PathBuf> = path_var
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    for extra in extra_search_paths {
        if !dirs.contains(extra) {
            dirs.push(extra.clone());
        }
    }

    match std::env::join_paths(&dirs) {
        Ok(joined) => joined,
        Err(e) => {
            log::warn!("Could not build augmented PATH: {}", e);
            path_var.map(OsStr::to_os_string).unwrap_or_default()
        }
    }
}

#[async_trait]
impl VcsClient for CliClient {
    fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandOutput, VcsError> {
        let path_var = std::env::var_os("PATH");
        let executable = self.executable(path_var.as_deref())?;

        debug!("Running {} {}", executable.display(), args.join(" "));

        let mut command = tokio::process::Command::new(&executable);
        command
            .args(args)
            .env("PATH", augmented_path(path_var.as_deref(), &self.extra_search_paths))
            .env("GIT_PAGER", "cat")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let output = command.output().await.map_err(|source| VcsError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(
            "{} {} finished with {} ({} bytes)",
            self.program,
            args.first().map(String::as_str).unwrap_or_default(),
            exit_code,
            output.stdout.len()
        );

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}
