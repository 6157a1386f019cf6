//! Provenance store
//!
//! Reads and writes `.stencil-template.json` records and merges the chain of
//! ancestor records into an inherited [`Context`].

use crate::context::{absolutize, merge_into, persisted_subset, Context};
use crate::error::ProvenanceError;
use crate::record::ProvenanceRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default record file name
pub const RECORD_FILE: &str = ".stencil-template.json";

/// Reads, writes and chain-merges provenance records
#[derive(Debug, Clone)]
pub struct ProvenanceStore {
    file_name: String,
}

impl Default for ProvenanceStore {
    fn default() -> Self {
        Self {
            file_name: RECORD_FILE.to_string(),
        }
    }
}

impl ProvenanceStore {
    /// Create store using [`RECORD_FILE`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different record file name
    #[inline]
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Record file name
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path of the record belonging to `directory`
    #[inline]
    #[must_use]
    pub fn record_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.file_name)
    }

    /// Whether `directory` has a record of its own
    #[inline]
    #[must_use]
    pub fn exists(&self, directory: &Path) -> bool {
        self.record_path(directory).is_file()
    }

    /// Merge the records of every ancestor of `directory`, root first
    ///
    /// `directory` itself is excluded. Closer ancestors override farther ones.
    /// Missing records are skipped; the template references of ancestors are
    /// not part of the result.
    ///
    /// # Errors
    /// - [`ProvenanceError::Invalid`] for a record with bad content
    /// - [`ProvenanceError::Io`] if a record exists but cannot be read
    pub fn read_chain(&self, directory: &Path) -> Result<Context, ProvenanceError> {
        self.merge_ancestry(directory, false)
    }

    /// Context inherited by a directory about to be created inside `parent`
    ///
    /// Same as [`read_chain`](Self::read_chain) for a child of `parent`:
    /// `parent`'s own record is included.
    ///
    /// # Errors
    /// Same as [`read_chain`](Self::read_chain).
    pub fn read_chain_for_child(&self, parent: &Path) -> Result<Context, ProvenanceError> {
        self.merge_ancestry(parent, true)
    }

    fn merge_ancestry(&self, directory: &Path, include_self: bool) -> Result<Context, ProvenanceError> {
        let directory = absolutize(directory).map_err(|e| ProvenanceError::io_error(directory, e))?;
        let skip = usize::from(!include_self);
        let mut ancestors: Vec<&Path> = directory.ancestors().skip(skip).collect();
        ancestors.reverse();

        let mut context = Context::new();
        for ancestor in ancestors {
            if let Some(record) = self.read_optional(ancestor)? {
                debug!(directory = %ancestor.display(), keys = record.context.len(), "inheriting provenance");
                merge_into(&mut context, &record.context);
            }
        }
        Ok(context)
    }

    fn read_optional(&self, directory: &Path) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
        let path = self.record_path(directory);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| ProvenanceError::io_error(&path, e))?;
        ProvenanceRecord::parse(&path, &text).map(Some)
    }

    /// Read `directory`'s own record, ignoring ancestors
    ///
    /// # Errors
    /// [`ProvenanceError::Missing`] when there is no record, otherwise as
    /// [`read_chain`](Self::read_chain).
    pub fn load(&self, directory: &Path) -> Result<ProvenanceRecord, ProvenanceError> {
        self.read_optional(directory)?
            .ok_or_else(|| ProvenanceError::Missing {
                directory: directory.to_path_buf(),
            })
    }

    /// Write `directory`'s record atomically
    ///
    /// Persists the public keys of `context` whose value differs from
    /// `inherited`, plus `reference`. The file is written to a temporary
    /// sibling then renamed over any previous record.
    ///
    /// # Errors
    /// [`ProvenanceError::Io`] if the temporary file cannot be written or
    /// renamed.
    pub fn write(
        &self,
        directory: &Path,
        reference: &str,
        context: &Context,
        inherited: &Context,
    ) -> Result<PathBuf, ProvenanceError> {
        let record = ProvenanceRecord::new(reference, persisted_subset(context, inherited));
        let path = self.record_path(directory);

        let text = record
            .to_pretty_json()
            .map_err(|source| ProvenanceError::Invalid {
                path: path.clone(),
                source,
            })?;

        let mut temp = tempfile::NamedTempFile::new_in(directory)
            .map_err(|e| ProvenanceError::io_error(directory, e))?;
        temp.write_all(text.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| ProvenanceError::io_error(temp.path(), e))?;
        temp.persist(&path)
            .map_err(|e| ProvenanceError::io_error(&path, e.error))?;

        debug!(path = %path.display(), keys = record.context.len(), "wrote provenance record");
        Ok(path)
    }
}
