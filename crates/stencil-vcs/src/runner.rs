//! Process execution capability
//!
//! [`CommandRunner`] is injected into every component that shells out, so
//! the upgrade state machine can be driven by a scripted fake in tests.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Captured result of one process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status (`-1` when terminated by a signal)
    pub code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    #[inline]
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output carrying only an exit status
    #[inline]
    #[must_use]
    pub fn exit(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Attach captured stderr
    #[inline]
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Whether the process exited with status 0
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// First line of stdout, trimmed
    #[inline]
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.stdout.lines().next().unwrap_or("").trim()
    }
}

/// Run an external program and capture its result
///
/// Implementations must block until the process exits. There is no timeout.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run `program` with `args` inside `cwd`
    ///
    /// # Errors
    /// Returns the spawn error if the process could not be started. A
    /// non-zero exit is not an error at this level.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        (**self).run(program, args, cwd)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        (**self).run(program, args, cwd)
    }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create new runner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_trims_and_ignores_rest() {
        let out = CommandOutput::ok("  abc123  \nsecond\n");
        assert_eq!(out.first_line(), "abc123");
        assert!(out.success());
    }

    #[test]
    fn exit_output_is_not_success() {
        let out = CommandOutput::exit(1).with_stderr("boom");
        assert!(!out.success());
        assert_eq!(out.first_line(), "");
        assert_eq!(out.stderr, "boom");
    }

    #[test]
    fn process_runner_reports_missing_binary() {
        let runner = ProcessRunner::new();
        let result = runner.run(
            "stencil-definitely-not-a-binary",
            &[],
            &std::env::temp_dir(),
        );
        assert!(result.is_err());
    }
}
