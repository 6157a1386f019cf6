//! Project materialization
//!
//! Renders a resolved template with a built context, then records the
//! provenance of the produced directory.

use crate::error::MaterializeError;
use crate::render::{ConflictPolicy, Renderer};
use crate::resolver::ResolvedTemplate;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use stencil_provenance::{absolutize, Context, ProvenanceStore};
use tracing::{info, warn};

/// Absolute output directory, visible to templates only
pub const OUTPUT_DIR_KEY: &str = "_output_dir";
/// Absolute invocation directory, visible to templates only
pub const CUR_DIR_KEY: &str = "_cur_dir";
/// Whether this rendering is an upgrade, visible to templates only
pub const UPGRADE_KEY: &str = "_upgrade";

/// One materialization
#[derive(Debug, Clone, Copy)]
pub struct MaterializeRequest<'a> {
    /// Template to render
    pub template: &'a ResolvedTemplate,
    /// Built context, without reserved keys
    pub context: &'a Context,
    /// Context inherited from ancestor records
    pub inherited: &'a Context,
    /// Directory the project directory is created in
    pub output_dir: &'a Path,
    /// Collision handling
    pub policy: ConflictPolicy,
    /// Whether this is an upgrade
    pub upgrade: bool,
}

/// Renders templates and writes provenance records
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    renderer: &'a dyn Renderer,
    store: &'a ProvenanceStore,
    invocation_dir: Option<&'a Path>,
}

impl<'a> Materializer<'a> {
    /// Create materializer
    #[must_use]
    pub fn new(renderer: &'a dyn Renderer, store: &'a ProvenanceStore) -> Self {
        Self {
            renderer,
            store,
            invocation_dir: None,
        }
    }

    /// Report `dir` as `_cur_dir` instead of the process working directory
    #[inline]
    #[must_use]
    pub fn with_invocation_dir(mut self, dir: &'a Path) -> Self {
        self.invocation_dir = Some(dir);
        self
    }

    /// Render the template and record its provenance
    ///
    /// Returns the project directory. A transient clone is deleted only
    /// after success; on failure no record is written and the clone stays
    /// for inspection.
    ///
    /// # Errors
    /// [`MaterializeError::Render`] and [`MaterializeError::Provenance`]
    /// from the two steps, [`MaterializeError::Io`] when the directories
    /// cannot be made absolute.
    pub fn create_or_update(&self, request: &MaterializeRequest<'_>) -> Result<PathBuf, MaterializeError> {
        let output_dir = absolutize(request.output_dir).map_err(|source| MaterializeError::Io {
            path: request.output_dir.to_path_buf(),
            source,
        })?;
        let cur_dir = match self.invocation_dir {
            Some(dir) => absolutize(dir),
            None => std::env::current_dir(),
        }
        .map_err(|source| MaterializeError::Io {
            path: PathBuf::from("."),
            source,
        })?;

        let mut render_context = request.context.clone();
        render_context.insert(
            OUTPUT_DIR_KEY.to_string(),
            Value::String(output_dir.to_string_lossy().into_owned()),
        );
        render_context.insert(
            CUR_DIR_KEY.to_string(),
            Value::String(cur_dir.to_string_lossy().into_owned()),
        );
        render_context.insert(UPGRADE_KEY.to_string(), Value::Bool(request.upgrade));

        let template = request.template;
        let project_dir =
            self.renderer
                .render_tree(&template.directory, &render_context, &output_dir, request.policy)?;

        self.store
            .write(&project_dir, &template.reference, request.context, request.inherited)?;
        info!(
            project = %project_dir.display(),
            template = %template.reference,
            upgrade = request.upgrade,
            "materialized project"
        );

        if let Some(clone) = template.cleanup_dir() {
            if let Err(error) = fs::remove_dir_all(clone) {
                warn!(clone = %clone.display(), %error, "failed to remove template clone");
            }
        }
        Ok(project_dir)
    }
}
