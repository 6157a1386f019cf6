//! Error types for template handling
//!
//! Provides error handling for:
//! - Resolution (reference → local template directory)
//! - Context building (declared parameters + inherited + overrides)
//! - Rendering (template tree → files)
//! - Materialization and the overall create flow

use std::path::PathBuf;
use stencil_provenance::ProvenanceError;
use stencil_vcs::VcsError;

/// Errors turning a reference into a local template directory
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Template location unreachable or not a template
    #[error("template repository not found: {location}")]
    RepositoryNotFound {
        /// Reference or location that failed
        location: String,
        /// Directories checked, clone directory last
        candidates: Vec<PathBuf>,
    },

    /// Post-clone checkout failed
    #[error("version control error: {0}")]
    Vcs(#[from] VcsError),

    /// IO error preparing the clone directory
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Create not-found error
    pub fn not_found(location: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Self::RepositoryNotFound {
            location: location.into(),
            candidates,
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this is a repository-not-found condition
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RepositoryNotFound { .. })
    }
}

/// Errors building a rendering context
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Neither declared-parameters file exists
    #[error("no template.json or cookiecutter.json in {0}")]
    MissingDeclaration(PathBuf),

    /// Declared-parameters file is not valid JSON
    #[error("invalid parameter declaration {path}: {source}")]
    InvalidDeclaration {
        /// Declaration file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// IO error reading the declaration
    #[error("io error reading {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Value is not one of a choice variable's options
    #[error("invalid value {value} for '{key}': expected one of {choices}")]
    InvalidChoice {
        /// Choice variable
        key: String,
        /// Rejected value
        value: serde_json::Value,
        /// Declared options
        choices: serde_json::Value,
    },

    /// A derived default failed to render
    #[error("cannot render default for '{key}': {source}")]
    Render {
        /// Variable whose default failed
        key: String,
        /// Rendering error
        #[source]
        source: RenderError,
    },
}

/// Errors rendering strings or template trees
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Placeholder names a variable missing from the context
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    /// Placeholder applies an unknown filter
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    /// Template has no single `{{ ... }}` project directory
    #[error("no project directory template in {0}")]
    NoProjectTemplate(PathBuf),

    /// Project directory name rendered to nothing
    #[error("project directory name rendered empty in {0}")]
    EmptyProjectName(PathBuf),

    /// Project directory exists and the policy forbids touching it
    #[error("output directory {0} already exists")]
    OutputExists(PathBuf),

    /// Bad `_copy_without_render` pattern
    #[error("invalid copy pattern '{pattern}': {source}")]
    Pattern {
        /// Pattern as declared
        pattern: String,
        /// Glob syntax error
        #[source]
        source: glob::PatternError,
    },

    /// Directory traversal failed
    #[error("cannot walk template tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error reading the template or writing output
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors materializing a project
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// Both overwrite and skip were requested
    #[error("overwrite and skip-existing are mutually exclusive")]
    ConflictingPolicy,

    /// Rendering failed
    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),

    /// Provenance record could not be written
    #[error("provenance error: {0}")]
    Provenance(#[from] ProvenanceError),

    /// IO error (invocation directory, clone cleanup)
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Errors of the create flow
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    /// Resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Ancestor records unreadable
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),

    /// Context could not be built
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Materialization failed
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// IO error normalizing paths
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl CreateError {
    /// Process exit status for this failure
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Resolve(ResolveError::Vcs(e)) => e.exit_code(),
            _ => 1,
        }
    }
}
