//! Tool invocation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("{program} executable not found (searched: {searched})")]
    ExecutableNotFound { program: String, searched: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {command}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        program: String,
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("{program} produced output that is not valid UTF-8")]
    Undecodable { program: String },
}

impl VcsError {
    /// Short message suitable for a status line.
    ///
    /// For failed commands this is the first non-empty line of the tool's
    /// diagnostics, or an exit-code summary when it printed nothing.
    pub fn user_message(&self) -> String {
        match self {
            VcsError::CommandFailed {
                program,
                command,
                exit_code,
                stderr,
            } => stderr
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!("`{} {}` failed with exit code {}", program, command, exit_code)
                }),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> VcsError {
        VcsError::CommandFailed {
            program: "git".into(),
            command: "status".into(),
            exit_code: 128,
            stderr: stderr.into(),
        }
    }

    #[test]
    fn test_user_message_takes_first_diagnostic_line() {
        let err = failed("\n  fatal: not a git repository (or any of the parent directories): .git\nhint: x\n");
        assert_eq!(
            err.user_message(),
            "fatal: not a git repository (or any of the parent directories): .git"
        );
    }

    #[test]
    fn test_user_message_without_diagnostics() {
        assert_eq!(
            failed("   \n").user_message(),
            "`git status` failed with exit code 128"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = VcsError::ExecutableNotFound {
            program: "gh".into(),
            searched: "/usr/bin".into(),
        };
        assert_eq!(err.user_message(), "gh executable not found (searched: /usr/bin)");
    }
}
