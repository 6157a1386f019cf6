//! Create flow
//!
//! [`Engine`] bundles the resolver, renderer and provenance store and runs
//! `resolve → build context → materialize` for new projects. The upgrade
//! orchestrator reuses the same pieces.

use crate::context::ContextBuilder;
use crate::error::CreateError;
use crate::materialize::{MaterializeRequest, Materializer};
use crate::render::{ConflictPolicy, PlaceholderRenderer, Renderer};
use crate::resolver::TemplateResolver;
use std::path::{Path, PathBuf};
use stencil_provenance::{absolutize, Context, ProvenanceStore};
use stencil_vcs::{CommandRunner, Git};
use tracing::info;

/// Parameters of one `create`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    /// Template reference, possibly abbreviated
    pub template: String,
    /// Branch, tag or commit to check out after cloning
    pub checkout: Option<String>,
    /// Directory the project directory is created in
    pub output_dir: PathBuf,
    /// Replace existing files
    pub overwrite: bool,
    /// Keep existing files
    pub skip_existing: bool,
    /// Explicit parameter values
    pub parameters: Context,
}

impl CreateRequest {
    /// Create request for `template` rendered into the current directory
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            output_dir: PathBuf::from("."),
            ..Self::default()
        }
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// With post-clone checkout
    #[inline]
    #[must_use]
    pub fn with_checkout(mut self, checkout: impl Into<String>) -> Self {
        self.checkout = Some(checkout.into());
        self
    }

    /// With conflict flags
    #[inline]
    #[must_use]
    pub fn with_policy_flags(mut self, overwrite: bool, skip_existing: bool) -> Self {
        self.overwrite = overwrite;
        self.skip_existing = skip_existing;
        self
    }

    /// With one explicit parameter
    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Template engine shared by create and upgrade
#[derive(Debug)]
pub struct Engine<R> {
    resolver: TemplateResolver<R>,
    renderer: Box<dyn Renderer>,
    store: ProvenanceStore,
    user_defaults: Context,
    clone_dir: PathBuf,
    invocation_dir: Option<PathBuf>,
}

impl<R: CommandRunner> Engine<R> {
    /// Create engine with the built-in renderer and record file name
    #[must_use]
    pub fn new(resolver: TemplateResolver<R>, clone_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            renderer: Box::new(PlaceholderRenderer::new()),
            store: ProvenanceStore::new(),
            user_defaults: Context::new(),
            clone_dir: clone_dir.into(),
            invocation_dir: None,
        }
    }

    /// With a different template language
    #[inline]
    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// With a different provenance store
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: ProvenanceStore) -> Self {
        self.store = store;
        self
    }

    /// With user-level parameter defaults
    #[inline]
    #[must_use]
    pub fn with_user_defaults(mut self, user_defaults: Context) -> Self {
        self.user_defaults = user_defaults;
        self
    }

    /// With the directory reported to templates as `_cur_dir`
    #[inline]
    #[must_use]
    pub fn with_invocation_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.invocation_dir = Some(dir.into());
        self
    }

    /// Template resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &TemplateResolver<R> {
        &self.resolver
    }

    /// Git wrapper shared with the resolver
    #[inline]
    #[must_use]
    pub fn git(&self) -> &Git<R> {
        self.resolver.git()
    }

    /// Renderer in use
    #[inline]
    #[must_use]
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Provenance store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ProvenanceStore {
        &self.store
    }

    /// Directory clones are made in
    #[inline]
    #[must_use]
    pub fn clone_dir(&self) -> &Path {
        &self.clone_dir
    }

    /// Context builder carrying the user defaults
    #[must_use]
    pub fn context_builder(&self) -> ContextBuilder<'_> {
        ContextBuilder::new(self.renderer()).with_user_defaults(self.user_defaults.clone())
    }

    /// Materializer bound to this engine's renderer and store
    #[must_use]
    pub fn materializer(&self) -> Materializer<'_> {
        let materializer = Materializer::new(self.renderer(), &self.store);
        match &self.invocation_dir {
            Some(dir) => materializer.with_invocation_dir(dir),
            None => materializer,
        }
    }

    /// Materialize a new project
    ///
    /// Returns the project directory.
    ///
    /// # Errors
    /// Conflicting flags are rejected before anything is resolved; then any
    /// resolution, context or materialization failure.
    pub fn create(&self, request: &CreateRequest) -> Result<PathBuf, CreateError> {
        let policy = ConflictPolicy::from_flags(request.overwrite, request.skip_existing)?;
        let output_dir = absolutize(&request.output_dir).map_err(|source| CreateError::Io {
            path: request.output_dir.clone(),
            source,
        })?;

        let inherited = self.store.read_chain_for_child(&output_dir)?;
        let template = self.resolver.resolve_with_fallback(
            &request.template,
            request.checkout.as_deref(),
            &self.clone_dir,
        )?;
        info!(template = %template.reference, directory = %template.directory.display(), "resolved template");

        let context = self
            .context_builder()
            .build(&template.directory, &inherited, &request.parameters)?;

        let project = self.materializer().create_or_update(&MaterializeRequest {
            template: &template,
            context: &context,
            inherited: &inherited,
            output_dir: &output_dir,
            policy,
            upgrade: false,
        })?;
        Ok(project)
    }
}
