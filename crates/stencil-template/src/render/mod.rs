//! Rendering seam
//!
//! The engine only needs two capabilities from a template language: render
//! one string against a context, and render a whole template tree into an
//! output directory. [`PlaceholderRenderer`] is the built-in implementation.

pub mod filters;
mod placeholder;

pub use placeholder::{PlaceholderRenderer, COPY_WITHOUT_RENDER};

use crate::error::{MaterializeError, RenderError};
use std::fmt;
use std::path::{Path, PathBuf};
use stencil_provenance::Context;

/// What to do with files that already exist in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConflictPolicy {
    /// An existing project directory is an error
    #[default]
    Fail,
    /// Existing files are left untouched, missing ones are created
    SkipExisting,
    /// Existing files are replaced
    Overwrite,
}

impl ConflictPolicy {
    /// Policy from the two user flags
    ///
    /// # Errors
    /// [`MaterializeError::ConflictingPolicy`] when both flags are set.
    pub fn from_flags(overwrite: bool, skip_existing: bool) -> Result<Self, MaterializeError> {
        match (overwrite, skip_existing) {
            (true, true) => Err(MaterializeError::ConflictingPolicy),
            (true, false) => Ok(Self::Overwrite),
            (false, true) => Ok(Self::SkipExisting),
            (false, false) => Ok(Self::Fail),
        }
    }

    /// Whether an existing project directory may be written into
    #[inline]
    #[must_use]
    pub fn allows_existing(self) -> bool {
        !matches!(self, Self::Fail)
    }
}

/// Template language used to produce projects
pub trait Renderer: fmt::Debug + Send + Sync {
    /// Render a single string
    ///
    /// # Errors
    /// Undefined variables, unknown filters or engine-specific failures.
    fn render_str(&self, template: &str, context: &Context) -> Result<String, RenderError>;

    /// Render the template at `template_dir` into `output_dir`
    ///
    /// Returns the project directory that was produced.
    ///
    /// # Errors
    /// Rendering, traversal and IO failures, and
    /// [`RenderError::OutputExists`] under [`ConflictPolicy::Fail`].
    fn render_tree(
        &self,
        template_dir: &Path,
        context: &Context,
        output_dir: &Path,
        policy: ConflictPolicy,
    ) -> Result<PathBuf, RenderError>;
}
