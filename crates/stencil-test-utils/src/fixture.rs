use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Project directory name used by the default fixture
pub const PROJECT_DIR: &str = "{{ project_slug }}";

/// A template directory on disk
///
/// The default template declares `name`, a derived `project_slug` and a
/// `license` choice, and renders a README and a LICENSE file.
#[derive(Debug)]
pub struct TemplateFixture {
    _root: Option<TempDir>,
    path: PathBuf,
}

impl TemplateFixture {
    /// Default template in a fresh temporary directory
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("template");
        let mut fixture = Self::at(path);
        fixture._root = Some(root);
        fixture
    }

    /// Default template written at `path`, which is not cleaned up
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let fixture = Self {
            _root: None,
            path: path.into(),
        };
        fixture.set_declared(&json!({
            "name": "Demo App",
            "project_slug": "{{ name|snakecase }}",
            "license": ["MIT", "BSD-3-Clause"]
        }));
        fixture.write_file("README.md", "# {{ name }}\n");
        fixture.write_file("LICENSE", "{{ license }}\n");
        fixture
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reference string pointing at this template
    pub fn reference(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Replace `template.json`
    pub fn set_declared(&self, declared: &Value) -> &Self {
        fs::create_dir_all(&self.path).unwrap();
        let text = serde_json::to_string_pretty(declared).unwrap();
        fs::write(self.path.join("template.json"), text).unwrap();
        self
    }

    /// Write a file relative to the project directory template
    pub fn write_file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.path.join(PROJECT_DIR).join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    pub fn remove_file(&self, relative: &str) -> &Self {
        fs::remove_file(self.path.join(PROJECT_DIR).join(relative)).unwrap();
        self
    }
}

impl Default for TemplateFixture {
    fn default() -> Self {
        Self::new()
    }
}
