//! Repository resolution
//!
//! Turns a template reference into a local directory holding the template:
//! abbreviation expansion, cloning network locations, registry lookup for
//! bare names, and the basename fallback used when a deep subpath guess is
//! wrong.

use crate::abbreviation::AbbreviationTable;
use crate::error::ResolveError;
use crate::reference::{repository_name, split};
use crate::registry::TemplateRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use stencil_vcs::{CommandRunner, Git};
use tracing::{debug, info, warn};

/// Files marking a directory as a template, in lookup order
pub const DECLARED_FILES: [&str; 2] = ["template.json", "cookiecutter.json"];

/// Whether `path` is a directory declaring template parameters
#[must_use]
pub fn is_template_dir(path: &Path) -> bool {
    path.is_dir() && DECLARED_FILES.iter().any(|file| path.join(file).is_file())
}

/// A reference resolved to a local template directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    /// Expanded reference, subpath included; this is what gets recorded
    pub reference: String,
    /// Network location, empty for local templates
    pub location: String,
    /// Directory holding the declared-parameters file
    pub directory: PathBuf,
    /// Whether the caller must delete [`clone`](Self::clone) after use
    pub needs_cleanup: bool,
    /// Root of the clone this template came from
    pub clone: Option<PathBuf>,
}

impl ResolvedTemplate {
    /// Directory to delete after a successful materialization, if any
    #[inline]
    #[must_use]
    pub fn cleanup_dir(&self) -> Option<&Path> {
        self.clone.as_deref().filter(|_| self.needs_cleanup)
    }
}

/// Resolves references against abbreviations, a registry and git
#[derive(Debug, Clone)]
pub struct TemplateResolver<R> {
    git: Git<R>,
    abbreviations: AbbreviationTable,
    registry: TemplateRegistry,
    keep_clones: bool,
    base_dir: Option<PathBuf>,
}

impl<R: CommandRunner> TemplateResolver<R> {
    /// Create resolver with built-in abbreviations, an empty registry and
    /// persistent clones
    #[must_use]
    pub fn new(git: Git<R>) -> Self {
        Self {
            git,
            abbreviations: AbbreviationTable::builtin(),
            registry: TemplateRegistry::new(),
            keep_clones: true,
            base_dir: None,
        }
    }

    /// With abbreviation table
    #[inline]
    #[must_use]
    pub fn with_abbreviations(mut self, abbreviations: AbbreviationTable) -> Self {
        self.abbreviations = abbreviations;
        self
    }

    /// With template registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Keep clones in the clone directory after use
    #[inline]
    #[must_use]
    pub fn with_keep_clones(mut self, keep_clones: bool) -> Self {
        self.keep_clones = keep_clones;
        self
    }

    /// Resolve relative local references against `base_dir` instead of the
    /// process working directory
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Git wrapper
    #[inline]
    #[must_use]
    pub fn git(&self) -> &Git<R> {
        &self.git
    }

    /// Abbreviation table in use
    #[inline]
    #[must_use]
    pub fn abbreviations(&self) -> &AbbreviationTable {
        &self.abbreviations
    }

    /// Template registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Resolve `reference` to a local template directory
    ///
    /// # Errors
    /// - [`ResolveError::RepositoryNotFound`] when the location cannot be
    ///   cloned or holds no template at the subpath
    /// - [`ResolveError::Vcs`] when `checkout` fails inside a fresh clone
    /// - [`ResolveError::Io`] when the clone directory cannot be prepared
    pub fn resolve(
        &self,
        reference: &str,
        checkout: Option<&str>,
        clone_dir: &Path,
    ) -> Result<ResolvedTemplate, ResolveError> {
        self.resolve_at_depth(reference, checkout, clone_dir, 0)
    }

    fn resolve_at_depth(
        &self,
        reference: &str,
        checkout: Option<&str>,
        clone_dir: &Path,
        depth: usize,
    ) -> Result<ResolvedTemplate, ResolveError> {
        let expanded = self.abbreviations.expand(reference);
        let (location, subpath) = split(&expanded);
        debug!(reference, expanded = %expanded, location = %location, subpath = %subpath, "resolving template");

        if location.is_empty() {
            self.resolve_local(&expanded, checkout, clone_dir, depth)
        } else {
            self.resolve_remote(expanded.clone(), location, &subpath, checkout, clone_dir)
        }
    }

    fn resolve_local(
        &self,
        reference: &str,
        checkout: Option<&str>,
        clone_dir: &Path,
        depth: usize,
    ) -> Result<ResolvedTemplate, ResolveError> {
        let base = self.base_dir.clone().unwrap_or_default();
        let candidates = vec![base.join(reference), clone_dir.join(reference)];
        if let Some(directory) = candidates.iter().find(|c| is_template_dir(c)) {
            return Ok(ResolvedTemplate {
                reference: reference.to_string(),
                location: String::new(),
                directory: directory.clone(),
                needs_cleanup: false,
                clone: None,
            });
        }

        if depth == 0 && is_bare_name(reference) {
            if let Some(descriptor) = self.registry.lookup(reference) {
                info!(name = reference, location = %descriptor.location, "using registered template");
                return self.resolve_at_depth(&descriptor.location, checkout, clone_dir, depth + 1);
            }
        }

        Err(ResolveError::not_found(reference, candidates))
    }

    fn resolve_remote(
        &self,
        reference: String,
        location: String,
        subpath: &str,
        checkout: Option<&str>,
        clone_dir: &Path,
    ) -> Result<ResolvedTemplate, ResolveError> {
        fs::create_dir_all(clone_dir).map_err(|e| ResolveError::io_error(clone_dir, e))?;
        let name = repository_name(&location);
        let clone = clone_dir.join(&name);
        let partial = clone_dir.join(format!(".{name}.partial"));
        remove_dir_if_exists(&partial)?;

        info!(location = %location, destination = %clone.display(), "cloning template");
        if let Err(error) = self.git.clone_repository(&location, &partial, clone_dir) {
            warn!(location = %location, %error, "clone failed");
            // a failed fetch leaves any earlier clone in place for the fallback
            remove_dir_if_exists(&partial)?;
            return Err(ResolveError::not_found(location, vec![clone]));
        }
        remove_dir_if_exists(&clone)?;
        fs::rename(&partial, &clone).map_err(|e| ResolveError::io_error(&clone, e))?;

        if let Some(checkout) = checkout {
            self.git.checkout(checkout, &clone)?;
        }

        let directory = if subpath.is_empty() {
            clone.clone()
        } else {
            clone.join(subpath)
        };
        if !is_template_dir(&directory) {
            return Err(ResolveError::not_found(location, vec![directory, clone]));
        }

        Ok(ResolvedTemplate {
            reference,
            location,
            directory,
            needs_cleanup: !self.keep_clones,
            clone: Some(clone),
        })
    }

    /// [`resolve`](Self::resolve), retrying once with `<basename>/<subpath>`
    /// as a local reference when a network template is not found and the
    /// reference carries a subpath
    ///
    /// The basename is the last candidate directory's, or the location's
    /// repository name. On success the original expanded reference is kept
    /// so that later upgrades go back to the network location.
    ///
    /// # Errors
    /// As [`resolve`](Self::resolve); when the retry fails too, the first
    /// error is returned.
    pub fn resolve_with_fallback(
        &self,
        reference: &str,
        checkout: Option<&str>,
        clone_dir: &Path,
    ) -> Result<ResolvedTemplate, ResolveError> {
        let error = match self.resolve(reference, checkout, clone_dir) {
            Err(error) if error.is_not_found() => error,
            other => return other,
        };

        let expanded = self.abbreviations.expand(reference);
        let (location, subpath) = split(&expanded);
        if location.is_empty() || subpath.is_empty() {
            return Err(error);
        }

        let basename = match &error {
            ResolveError::RepositoryNotFound { candidates, .. } => candidates
                .last()
                .and_then(|c| c.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            _ => None,
        }
        .unwrap_or_else(|| repository_name(&location));

        let fallback = format!("{basename}/{subpath}");
        info!(reference, fallback = %fallback, "template not found, retrying with local fallback");
        match self.resolve(&fallback, checkout, clone_dir) {
            Ok(mut resolved) => {
                resolved.reference = expanded;
                Ok(resolved)
            }
            Err(retry) => {
                debug!(error = %retry, "fallback failed");
                Err(error)
            }
        }
    }
}

fn is_bare_name(reference: &str) -> bool {
    !reference.is_empty()
        && !reference.starts_with('.')
        && !reference.contains(['/', '\\'])
}

fn remove_dir_if_exists(path: &Path) -> Result<(), ResolveError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| ResolveError::io_error(path, e))?;
    }
    Ok(())
}
