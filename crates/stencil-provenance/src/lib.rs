//! stencil Provenance
//!
//! Records which template and parameters produced a directory tree, and
//! lets nested materializations inherit their ancestors' parameters.
//!
//! # Core Concepts
//!
//! - [`Context`]: ordered parameter name → value mapping
//! - [`ProvenanceRecord`]: one directory's `.stencil-template.json`
//! - [`ProvenanceStore`]: read, write and chain-merge records
//!
//! # Layout
//!
//! ```text
//! /work/.stencil-template.json          {"org": "acme", "_template": "..."}
//! /work/app/.stencil-template.json      {"name": "app", "_template": "..."}
//! /work/app/svc/                        read_chain → {"org": "acme", "name": "app"}
//! ```

#![warn(unreachable_pub)]

mod context;
mod error;
mod record;
mod store;

pub use context::{absolutize, is_private_key, merge_into, persisted_subset, Context};
pub use error::ProvenanceError;
pub use record::{ProvenanceRecord, TEMPLATE_KEY};
pub use store::{ProvenanceStore, RECORD_FILE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
