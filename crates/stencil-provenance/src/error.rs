//! Error types for provenance records

use std::path::PathBuf;

/// Errors reading or writing provenance records
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    /// Record is not valid JSON or not a JSON object with a string
    /// template reference
    #[error("invalid provenance record {path}: {source}")]
    Invalid {
        /// Record file
        path: PathBuf,
        /// Syntax or shape error
        #[source]
        source: serde_json::Error,
    },

    /// Directory has no record of its own
    #[error("no provenance record in {directory}")]
    Missing {
        /// Directory searched
        directory: PathBuf,
    },

    /// IO error reading or writing a record
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ProvenanceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid-record error for a well-formed document of the wrong shape
    pub fn invalid(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Invalid {
            path: path.into(),
            source: serde::de::Error::custom(reason),
        }
    }

    /// Whether the record's content, rather than its absence or IO, is at fault
    #[inline]
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}
