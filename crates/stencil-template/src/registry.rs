//! Template registry
//!
//! Named templates supplied as plain data (usually from the user config),
//! looked up by name or alias when a reference is a bare word.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One registered template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// One-line description shown in listings
    #[serde(default)]
    pub description: String,
    /// Template reference (abbreviations allowed)
    pub location: String,
    /// Extra names resolving to this template, in order
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TemplateDescriptor {
    /// Create descriptor
    #[inline]
    #[must_use]
    pub fn new(description: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            location: location.into(),
            aliases: Vec::new(),
        }
    }

    /// With aliases
    #[inline]
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// Registry of named templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRegistry {
    templates: IndexMap<String, TemplateDescriptor>,
}

impl TemplateRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `name`
    pub fn register(&mut self, name: impl Into<String>, descriptor: TemplateDescriptor) {
        self.templates.insert(name.into(), descriptor);
    }

    /// Find by name, then by alias in registration order
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&TemplateDescriptor> {
        self.templates.get(name).or_else(|| {
            self.templates
                .values()
                .find(|descriptor| descriptor.aliases.iter().any(|alias| alias == name))
        })
    }

    /// Number of registered templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Entries sorted by name, for listing
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &TemplateDescriptor)> {
        let mut entries: Vec<_> = self.templates.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by_key(|(name, _)| *name);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.register(
            "web",
            TemplateDescriptor::new("Web service", "gh:acme/web-template").with_aliases(["w", "www"]),
        );
        registry.register("cli", TemplateDescriptor::new("CLI tool", "/srv/templates/cli"));
        registry
    }

    #[test]
    fn lookup_by_name_and_alias() {
        let registry = registry();
        assert_eq!(registry.lookup("web").unwrap().location, "gh:acme/web-template");
        assert_eq!(registry.lookup("www").unwrap().location, "gh:acme/web-template");
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn sorted_listing() {
        let registry = registry();
        let names: Vec<_> = registry.sorted().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["cli", "web"]);
    }

    #[test]
    fn deserializes_from_config_table() {
        let registry: TemplateRegistry = serde_json::from_value(serde_json::json!({
            "lib": {"location": "gh:acme/lib", "aliases": ["l"]}
        }))
        .unwrap();
        let lib = registry.lookup("l").unwrap();
        assert_eq!(lib.description, "");
        assert_eq!(lib.location, "gh:acme/lib");
    }
}
