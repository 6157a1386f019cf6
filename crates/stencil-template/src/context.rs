//! Context building
//!
//! Combines a template's declared parameters with user defaults, the
//! context inherited from ancestor records and explicit overrides, then
//! resolves derived defaults in declaration order.

use crate::error::ContextError;
use crate::render::Renderer;
use crate::resolver::DECLARED_FILES;
use serde_json::Value;
use std::fs;
use std::path::Path;
use stencil_provenance::{is_private_key, Context};
use tracing::debug;

/// Read the declared parameters of the template at `template_dir`
///
/// `template.json` is preferred over `cookiecutter.json`. Key order is kept.
///
/// # Errors
/// - [`ContextError::MissingDeclaration`] when neither file exists
/// - [`ContextError::InvalidDeclaration`] when it is not a JSON object
pub fn load_declared(template_dir: &Path) -> Result<Context, ContextError> {
    let path = DECLARED_FILES
        .iter()
        .map(|file| template_dir.join(file))
        .find(|path| path.is_file())
        .ok_or_else(|| ContextError::MissingDeclaration(template_dir.to_path_buf()))?;

    let text = fs::read_to_string(&path).map_err(|source| ContextError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ContextError::InvalidDeclaration { path, source })
}

/// Builds the context a template is rendered with
#[derive(Debug, Clone)]
pub struct ContextBuilder<'r> {
    renderer: &'r dyn Renderer,
    user_defaults: Context,
}

impl<'r> ContextBuilder<'r> {
    /// Create builder rendering derived defaults with `renderer`
    #[must_use]
    pub fn new(renderer: &'r dyn Renderer) -> Self {
        Self {
            renderer,
            user_defaults: Context::new(),
        }
    }

    /// With user-level defaults, applied below everything else
    #[inline]
    #[must_use]
    pub fn with_user_defaults(mut self, user_defaults: Context) -> Self {
        self.user_defaults = user_defaults;
        self
    }

    /// Build the context for the template at `template_dir`
    ///
    /// Layers, lowest first: user defaults, `inherited`, `overrides`. Only
    /// declared keys are layered; undeclared public keys of `inherited` and
    /// `overrides` are appended afterwards so nested templates still see
    /// their parents' values.
    ///
    /// # Errors
    /// Declaration loading failures, [`ContextError::InvalidChoice`] and
    /// [`ContextError::Render`] for a derived default that fails to render.
    pub fn build(
        &self,
        template_dir: &Path,
        inherited: &Context,
        overrides: &Context,
    ) -> Result<Context, ContextError> {
        let mut declared = load_declared(template_dir)?;
        for layer in [&self.user_defaults, inherited, overrides] {
            apply_layer(&mut declared, layer)?;
        }

        let declared_keys: Vec<String> = declared.keys().cloned().collect();
        let mut context = Context::with_capacity(declared.len());
        for (key, value) in declared {
            let value = self.resolve_value(&key, value, &context)?;
            context.insert(key, value);
        }

        for (key, value) in inherited.iter().chain(overrides) {
            if !is_private_key(key) && !declared_keys.contains(key) {
                context.insert(key.clone(), value.clone());
            }
        }

        debug!(template = %template_dir.display(), keys = context.len(), "built context");
        Ok(context)
    }

    fn resolve_value(&self, key: &str, value: Value, resolved: &Context) -> Result<Value, ContextError> {
        if is_private_key(key) {
            return Ok(value);
        }
        match value {
            Value::Array(choices) => Ok(choices.into_iter().next().unwrap_or(Value::Null)),
            Value::String(template) => self
                .renderer
                .render_str(&template, resolved)
                .map(Value::String)
                .map_err(|source| ContextError::Render {
                    key: key.to_string(),
                    source,
                }),
            other => Ok(other),
        }
    }
}

/// Apply one layer onto the declared keys
fn apply_layer(declared: &mut Context, layer: &Context) -> Result<(), ContextError> {
    for (key, value) in layer {
        let Some(current) = declared.get_mut(key) else {
            continue;
        };
        match (current, value) {
            (Value::Array(choices), value) => {
                let Some(index) = choices.iter().position(|choice| choice == value) else {
                    return Err(ContextError::InvalidChoice {
                        key: key.clone(),
                        value: value.clone(),
                        choices: Value::Array(choices.clone()),
                    });
                };
                let chosen = choices.remove(index);
                choices.insert(0, chosen);
            }
            (Value::Object(fields), Value::Object(overlay)) => {
                for (field, field_value) in overlay {
                    fields.insert(field.clone(), field_value.clone());
                }
            }
            (current, value) => *current = value.clone(),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PlaceholderRenderer;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stencil_test_utils::TemplateFixture;

    fn ctx(value: Value) -> Context {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn defaults_and_derived_values() {
        let fixture = TemplateFixture::new();
        let context = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &Context::new(), &Context::new())
            .unwrap();

        assert_eq!(
            context,
            ctx(json!({"name": "Demo App", "project_slug": "demo_app", "license": "MIT"}))
        );
        assert_eq!(context.keys().collect::<Vec<_>>(), ["name", "project_slug", "license"]);
    }

    #[test]
    fn derived_default_may_sort_before_its_source() {
        let fixture = TemplateFixture::new();
        fixture.set_declared(&json!({"name": "Shop Front", "app_slug": "{{ name|snakecase }}"}));

        let context = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &Context::new(), &Context::new())
            .unwrap();

        assert_eq!(context["app_slug"], json!("shop_front"));
        assert_eq!(context.keys().collect::<Vec<_>>(), ["name", "app_slug"]);
    }

    #[test]
    fn layers_apply_in_precedence_order() {
        let fixture = TemplateFixture::new();
        let builder = ContextBuilder::new(&PlaceholderRenderer)
            .with_user_defaults(ctx(json!({"name": "From Config", "license": "BSD-3-Clause"})));

        let inherited = ctx(json!({"name": "Inherited"}));
        let context = builder.build(fixture.path(), &inherited, &Context::new()).unwrap();
        assert_eq!(context["name"], json!("Inherited"));
        assert_eq!(context["project_slug"], json!("inherited"));
        assert_eq!(context["license"], json!("BSD-3-Clause"));

        let overrides = ctx(json!({"name": "Override", "license": "MIT"}));
        let context = builder.build(fixture.path(), &inherited, &overrides).unwrap();
        assert_eq!(context["name"], json!("Override"));
        assert_eq!(context["license"], json!("MIT"));
    }

    #[test]
    fn explicit_derived_value_is_kept() {
        let fixture = TemplateFixture::new();
        let overrides = ctx(json!({"name": "App", "project_slug": "custom"}));
        let context = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &Context::new(), &overrides)
            .unwrap();
        assert_eq!(context["project_slug"], json!("custom"));
    }

    #[test]
    fn invalid_choice_is_rejected() {
        let fixture = TemplateFixture::new();
        let err = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &Context::new(), &ctx(json!({"license": "GPL"})))
            .unwrap_err();
        match err {
            ContextError::InvalidChoice { key, value, choices } => {
                assert_eq!(key, "license");
                assert_eq!(value, json!("GPL"));
                assert_eq!(choices, json!(["MIT", "BSD-3-Clause"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undeclared_keys_flow_through() {
        let fixture = TemplateFixture::new();
        let inherited = ctx(json!({"org": "acme", "team": "core", "_private": 1}));
        let overrides = ctx(json!({"team": "web", "retired_param": true}));

        let context = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &inherited, &overrides)
            .unwrap();
        assert_eq!(context["org"], json!("acme"));
        assert_eq!(context["team"], json!("web"));
        assert_eq!(context["retired_param"], json!(true));
        assert!(!context.contains_key("_private"));
    }

    #[test]
    fn objects_merge_shallowly_and_private_keys_stay_verbatim() {
        let fixture = TemplateFixture::new();
        fixture.set_declared(&json!({
            "name": "x",
            "db": {"host": "localhost", "port": 5432},
            "_copy_without_render": ["{{ literal }}"]
        }));

        let context = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &Context::new(), &ctx(json!({"db": {"port": 6543}})))
            .unwrap();
        assert_eq!(context["db"], json!({"host": "localhost", "port": 6543}));
        assert_eq!(context["_copy_without_render"], json!(["{{ literal }}"]));
    }

    #[test]
    fn cookiecutter_declaration_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cookiecutter.json"), r#"{"b": 1, "a": 2}"#).unwrap();
        let declared = load_declared(dir.path()).unwrap();
        assert_eq!(declared.keys().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn declaration_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_declared(dir.path()),
            Err(ContextError::MissingDeclaration(_))
        ));

        std::fs::write(dir.path().join("template.json"), "[1, 2]").unwrap();
        assert!(matches!(
            load_declared(dir.path()),
            Err(ContextError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn derived_default_with_undefined_variable() {
        let fixture = TemplateFixture::new();
        fixture.set_declared(&json!({"slug": "{{ missing }}"}));
        let err = ContextBuilder::new(&PlaceholderRenderer)
            .build(fixture.path(), &Context::new(), &Context::new())
            .unwrap_err();
        assert!(matches!(err, ContextError::Render { key, .. } if key == "slug"));
    }
}
