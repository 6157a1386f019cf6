//! Error types for version-control invocations

use std::io;

/// Failure of an external version-control command
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// The process could not be started at all (missing binary, bad cwd)
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Spawn error
        #[source]
        source: io::Error,
    },

    /// The process ran and exited with a non-zero status
    #[error("command `{command}` exited with status {code}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit status reported by the process
        code: i32,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The process succeeded but printed something unusable
    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput {
        /// Rendered command line
        command: String,
        /// Offending output
        output: String,
    },
}

impl VcsError {
    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Process exit status to propagate for this failure
    ///
    /// A failed command propagates its own status; anything else maps to 1.
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }

    /// The command line that failed
    #[inline]
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. }
            | Self::CommandFailed { command, .. }
            | Self::UnexpectedOutput { command, .. } => command,
        }
    }
}
