//! Raw subprocess results.

use crate::error::VcsError;

/// Captured output of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    /// Process exit code; -1 when the process was terminated by a signal
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self::new(stdout, String::new(), 0)
    }

    /// Stdout decoded as UTF-8, replacing invalid sequences
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stdout decoded strictly as UTF-8
    pub fn stdout_utf8(&self, program: &str) -> Result<String, VcsError> {
        String::from_utf8(self.stdout.clone()).map_err(|_| VcsError::Undecodable {
            program: program.to_string(),
        })
    }
}
