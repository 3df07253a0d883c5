//! Subprocess client trait
//!
//! This module defines the core `VcsClient` trait that all tool runners
//! must satisfy. The engine only ever talks to `git` and `gh` through it,
//! which keeps tests free of real subprocesses.

use crate::error::VcsError;
use crate::types::CommandOutput;
use async_trait::async_trait;
use std::path::Path;

/// Runs one external tool with arguments
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a client can be shared across
/// the session task and the fetch tasks it spawns.
///
/// # Example
///
/// ```rust,ignore
/// use vcs_client::VcsClient;
///
/// async fn head(client: &dyn VcsClient) -> Result<String, vcs_client::VcsError> {
///     let args = vec!["rev-parse".to_string(), "HEAD".to_string()];
///     let output = client.run_checked(&args, None, &[0]).await?;
///     Ok(output.stdout_lossy())
/// }
/// ```
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Tool name used in diagnostics (e.g. "git")
    fn program(&self) -> &str;

    /// Run the tool and capture its output, whatever the exit code
    ///
    /// # Arguments
    ///
    /// * `args` - Arguments passed verbatim to the tool
    /// * `cwd` - Working directory; the current one when `None`
    async fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandOutput, VcsError>;

    /// Run the tool and fail unless the exit code is one of `accepted`
    async fn run_checked(
        &self,
        args: &[String],
        cwd: Option<&Path>,
        accepted: &[i32],
    ) -> Result<CommandOutput, VcsError> {
        let output = self.run(args, cwd).await?;
        if accepted.contains(&output.exit_code) {
            Ok(output)
        } else {
            log::warn!(
                "{} {} exited with {}",
                self.program(),
                args.join(" "),
                output.exit_code
            );
            Err(VcsError::CommandFailed {
                program: self.program().to_string(),
                command: args.join(" "),
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}
