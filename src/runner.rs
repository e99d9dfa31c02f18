//! Test suite execution before a release is published.

use crate::error::{ReleaseError, Result};
use std::path::Path;
use std::process::Command;

/// Runs the project's test suite
pub trait TestRunner {
    /// Run the suite with `workdir` as the current directory.
    ///
    /// Any failing test must surface as [`ReleaseError::TestFailure`].
    fn run(&self, workdir: &Path) -> Result<()>;
}

/// Runs a configured command, e.g. `python -m pytest`
///
/// Output is streamed to the terminal. There is no timeout: a hung suite
/// blocks the release.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    command: Vec<String>,
}

impl CommandTestRunner {
    pub fn new(command: Vec<String>) -> Self {
        CommandTestRunner { command }
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl TestRunner for CommandTestRunner {
    fn run(&self, workdir: &Path) -> Result<()> {
        let (program, args) = match self.command.split_first() {
            Some(split) => split,
            None => {
                tracing::warn!("no test command configured, skipping tests");
                return Ok(());
            }
        };

        tracing::info!(command = %self.command_line(), "running tests");

        let status = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .status()
            .map_err(|e| {
                ReleaseError::test_failure(format!("Failed to execute '{}': {}", program, e))
            })?;

        if !status.success() {
            return Err(ReleaseError::test_failure(format!(
                "'{}' exited with code {}",
                self.command_line(),
                status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none (terminated by signal)".to_string())
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(command: &[&str]) -> CommandTestRunner {
        CommandTestRunner::new(command.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_nonexistent_program_is_test_failure() {
        let err = runner(&["/nonexistent/path/to/pytest"])
            .run(Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::TestFailure(_)));
        assert!(err.to_string().contains("Failed to execute"));
    }

    #[test]
    fn test_empty_command_skips() {
        assert!(runner(&[]).run(Path::new(".")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_passing_command() {
        assert!(runner(&["true"]).run(Path::new(".")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reports_exit_code() {
        let err = runner(&["sh", "-c", "exit 3"])
            .run(Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::TestFailure(_)));
        assert!(err.to_string().contains("code 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_workdir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        assert!(runner(&["test", "-f", "marker"]).run(dir.path()).is_ok());
    }
}
