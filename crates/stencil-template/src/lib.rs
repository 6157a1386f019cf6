//! stencil Template
//!
//! Turns a template reference into a rendered project directory:
//!
//! - [`AbbreviationTable`] / [`reference`]: expand `gh:org/repo` style
//!   aliases and split `location#subpath` references
//! - [`TemplateResolver`]: clone or locate the template, with registry
//!   lookup and a local fallback
//! - [`ContextBuilder`]: declared parameters + user defaults + inherited
//!   context + overrides
//! - [`Renderer`] / [`PlaceholderRenderer`]: `{{ name|filter }}` rendering
//! - [`Materializer`]: render, then write the provenance record
//! - [`Engine`]: the whole create flow
//!
//! # Example
//!
//! ```rust,ignore
//! use stencil_template::{CreateRequest, Engine, TemplateResolver};
//! use stencil_vcs::{Git, ProcessRunner};
//!
//! let engine = Engine::new(TemplateResolver::new(Git::new(ProcessRunner::new())), clone_dir);
//! let project = engine.create(
//!     &CreateRequest::new("gh:acme/service-template")
//!         .with_output_dir("services")
//!         .with_parameter("name", "billing"),
//! )?;
//! ```

#![warn(unreachable_pub)]

mod abbreviation;
mod context;
mod engine;
mod error;
mod materialize;
pub mod reference;
mod registry;
pub mod render;
mod resolver;

pub use abbreviation::{expand_abbreviation, AbbreviationTable, BUILTIN_ABBREVIATIONS, SLOT};
pub use context::{load_declared, ContextBuilder};
pub use engine::{CreateRequest, Engine};
pub use error::{ContextError, CreateError, MaterializeError, RenderError, ResolveError};
pub use materialize::{MaterializeRequest, Materializer, CUR_DIR_KEY, OUTPUT_DIR_KEY, UPGRADE_KEY};
pub use registry::{TemplateDescriptor, TemplateRegistry};
pub use render::{ConflictPolicy, PlaceholderRenderer, Renderer};
pub use resolver::{is_template_dir, ResolvedTemplate, TemplateResolver, DECLARED_FILES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
