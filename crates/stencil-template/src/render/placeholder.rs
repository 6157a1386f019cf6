//! `{{ name|filter }}` placeholder renderer

use super::filters;
use super::{ConflictPolicy, Renderer};
use crate::error::RenderError;
use glob::Pattern;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use stencil_provenance::Context;
use tracing::{debug, info};
use walkdir::WalkDir;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(.*?)\s*\}\}").expect("placeholder regex is valid"));

/// Namespaces a variable may be written under
const NAMESPACES: [&str; 3] = ["cookiecutter.", "template.", "context."];

/// Context key listing globs of files copied without rendering
pub const COPY_WITHOUT_RENDER: &str = "_copy_without_render";

/// Built-in renderer substituting `{{ expr }}` placeholders
///
/// `expr` is a variable, optionally namespaced (`cookiecutter.name`) and
/// dotted into objects (`db.port`), followed by any number of `|filter`
/// applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    /// Create renderer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn evaluate(expr: &str, context: &Context) -> Result<String, RenderError> {
        let mut parts = expr.split('|').map(str::trim);
        let variable = parts.next().unwrap_or_default();
        let mut value = display(lookup(variable, context)?);
        for filter in parts {
            value = filters::apply(filter, &value)?;
        }
        Ok(value)
    }

    fn project_template(template_dir: &Path) -> Result<PathBuf, RenderError> {
        let entries = fs::read_dir(template_dir).map_err(|e| RenderError::io_error(template_dir, e))?;
        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RenderError::io_error(template_dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| RenderError::io_error(entry.path(), e))?
                .is_dir();
            if is_dir && entry.file_name().to_string_lossy().contains("{{") {
                candidates.push(entry.path());
            }
        }
        match candidates.as_slice() {
            [single] => Ok(single.clone()),
            _ => Err(RenderError::NoProjectTemplate(template_dir.to_path_buf())),
        }
    }

    /// Render each component of `relative`; `None` if any renders empty
    fn render_relative(&self, relative: &Path, context: &Context) -> Result<Option<PathBuf>, RenderError> {
        let mut rendered = PathBuf::new();
        for component in relative.components() {
            let Component::Normal(name) = component else {
                continue;
            };
            let name = self.render_str(&name.to_string_lossy(), context)?;
            if name.trim().is_empty() {
                return Ok(None);
            }
            rendered.push(name);
        }
        Ok(Some(rendered))
    }
}

fn lookup<'c>(variable: &str, context: &'c Context) -> Result<&'c Value, RenderError> {
    let path = NAMESPACES
        .iter()
        .find_map(|ns| variable.strip_prefix(ns))
        .unwrap_or(variable);
    let undefined = || RenderError::UndefinedVariable(variable.to_string());

    let mut segments = path.split('.');
    let head = segments.next().ok_or_else(undefined)?;
    let mut value = context.get(head).ok_or_else(undefined)?;
    for segment in segments {
        value = value.get(segment).ok_or_else(undefined)?;
    }
    Ok(value)
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn copy_patterns(context: &Context) -> Result<Vec<Pattern>, RenderError> {
    let Some(Value::Array(globs)) = context.get(COPY_WITHOUT_RENDER) else {
        return Ok(Vec::new());
    };
    globs
        .iter()
        .filter_map(Value::as_str)
        .map(|glob| {
            Pattern::new(glob).map_err(|source| RenderError::Pattern {
                pattern: glob.to_string(),
                source,
            })
        })
        .collect()
}

impl Renderer for PlaceholderRenderer {
    fn render_str(&self, template: &str, context: &Context) -> Result<String, RenderError> {
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(expr)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&Self::evaluate(expr.as_str(), context)?);
            last = whole.end();
        }
        rendered.push_str(&template[last..]);
        Ok(rendered)
    }

    fn render_tree(
        &self,
        template_dir: &Path,
        context: &Context,
        output_dir: &Path,
        policy: ConflictPolicy,
    ) -> Result<PathBuf, RenderError> {
        let project_template = Self::project_template(template_dir)?;
        let name = project_template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let project_name = self.render_str(&name, context)?;
        if project_name.trim().is_empty() {
            return Err(RenderError::EmptyProjectName(template_dir.to_path_buf()));
        }

        let project_dir = output_dir.join(&project_name);
        if project_dir.exists() && !policy.allows_existing() {
            return Err(RenderError::OutputExists(project_dir));
        }
        fs::create_dir_all(&project_dir).map_err(|e| RenderError::io_error(&project_dir, e))?;

        let verbatim = copy_patterns(context)?;
        let mut written = 0usize;
        for entry in WalkDir::new(&project_template).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(&project_template)
                .unwrap_or_else(|_| entry.path());
            let Some(rendered) = self.render_relative(relative, context)? else {
                debug!(path = %relative.display(), "skipping path rendered empty");
                continue;
            };
            let destination = project_dir.join(rendered);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&destination).map_err(|e| RenderError::io_error(&destination, e))?;
                continue;
            }
            if !entry.file_type().is_file() {
                debug!(path = %relative.display(), "skipping non-regular file");
                continue;
            }
            if destination.exists() && policy == ConflictPolicy::SkipExisting {
                debug!(path = %destination.display(), "keeping existing file");
                continue;
            }

            if let Ok(existing) = fs::metadata(&destination) {
                if existing.permissions().readonly() {
                    fs::set_permissions(&destination, owner_writable(existing.permissions()))
                        .map_err(|e| RenderError::io_error(&destination, e))?;
                }
            }

            let bytes = fs::read(entry.path()).map_err(|e| RenderError::io_error(entry.path(), e))?;
            let copy_only = verbatim.iter().any(|p| p.matches_path(relative));
            let contents = match String::from_utf8(bytes) {
                Ok(text) if !copy_only => self.render_str(&text, context)?.into_bytes(),
                Ok(text) => text.into_bytes(),
                Err(raw) => raw.into_bytes(),
            };
            fs::write(&destination, contents).map_err(|e| RenderError::io_error(&destination, e))?;

            let permissions = owner_writable(entry.metadata()?.permissions());
            fs::set_permissions(&destination, permissions)
                .map_err(|e| RenderError::io_error(&destination, e))?;
            written += 1;
        }

        info!(project = %project_dir.display(), files = written, "rendered template");
        Ok(project_dir)
    }
}

/// `permissions` plus write access for the owner, so later renders can
/// overwrite the file
#[cfg(unix)]
fn owner_writable(permissions: fs::Permissions) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(permissions.mode() | 0o200)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn owner_writable(mut permissions: fs::Permissions) -> fs::Permissions {
    permissions.set_readonly(false);
    permissions
}
