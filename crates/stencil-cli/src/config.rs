//! User configuration
//!
//! A TOML file holding abbreviations, parameter defaults, the clone cache
//! location and the template registry. A missing file means defaults.

use anyhow::Context as _;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use stencil_provenance::Context;
use stencil_template::{AbbreviationTable, Engine, TemplateDescriptor, TemplateRegistry, TemplateResolver};
use stencil_vcs::{Git, ProcessRunner};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "STENCIL_CONFIG";

/// stencil configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfig {
    /// User abbreviations, layered over the built-in ones
    pub abbreviations: IndexMap<String, String>,
    /// Parameter defaults applied before anything else
    pub default_context: Context,
    /// Where template repositories are cloned
    pub clone_dir: Option<PathBuf>,
    /// Keep clones after a successful create
    pub keep_clones: bool,
    /// Named templates
    pub templates: TemplateRegistry,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            abbreviations: IndexMap::new(),
            default_context: Context::new(),
            clone_dir: None,
            keep_clones: true,
            templates: TemplateRegistry::new(),
        }
    }
}

impl StencilConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With one abbreviation
    #[inline]
    #[must_use]
    pub fn with_abbreviation(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.abbreviations.insert(name.into(), pattern.into());
        self
    }

    /// With parameter defaults
    #[inline]
    #[must_use]
    pub fn with_default_context(mut self, context: Context) -> Self {
        self.default_context = context;
        self
    }

    /// With clone cache directory
    #[inline]
    #[must_use]
    pub fn with_clone_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.clone_dir = Some(dir.into());
        self
    }

    /// Whether clones survive a successful create
    #[inline]
    #[must_use]
    pub fn with_keep_clones(mut self, keep: bool) -> Self {
        self.keep_clones = keep;
        self
    }

    /// With one registered template
    #[inline]
    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, descriptor: TemplateDescriptor) -> Self {
        self.templates.register(name, descriptor);
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Syntax errors and fields of the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file to read: `explicit`, else `$STENCIL_CONFIG`, else
    /// `<config dir>/stencil/config.toml`
    #[must_use]
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| dirs::config_dir().map(|dir| dir.join("stencil").join("config.toml")))
    }

    /// Read `path`; a missing file gives the defaults
    ///
    /// # Errors
    /// Unreadable or invalid files.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("failed to read config {}", path.display())),
        };
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Locate and load
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match Self::locate(explicit) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Configured clone directory, else `<cache dir>/stencil/templates`
    #[must_use]
    pub fn clone_dir(&self) -> PathBuf {
        self.clone_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("stencil")
                .join("templates")
        })
    }

    /// Built-in abbreviations, then the configured ones, then `overrides`
    #[must_use]
    pub fn abbreviation_table(&self, overrides: &[(String, String)]) -> AbbreviationTable {
        AbbreviationTable::builtin()
            .merged(&self.abbreviations)
            .merged(overrides.iter().cloned())
    }

    /// Engine running the real git
    #[must_use]
    pub fn engine(&self, overrides: &[(String, String)]) -> Engine<ProcessRunner> {
        let resolver = TemplateResolver::new(Git::new(ProcessRunner::new()))
            .with_abbreviations(self.abbreviation_table(overrides))
            .with_registry(self.templates.clone())
            .with_keep_clones(self.keep_clones);
        Engine::new(resolver, self.clone_dir()).with_user_defaults(self.default_context.clone())
    }
}
