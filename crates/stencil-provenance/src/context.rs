//! Parameter context and merge helpers

use indexmap::IndexMap;
use serde_json::Value;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Ordered mapping from parameter name to value
///
/// Insertion order follows the template's declaration order, which matters
/// when later defaults are derived from earlier answers.
pub type Context = IndexMap<String, Value>;

/// Private keys start with `_`; they steer rendering and are never persisted
#[inline]
#[must_use]
pub fn is_private_key(key: &str) -> bool {
    key.starts_with('_')
}

/// Overlay `overlay` onto `base`, overlay values winning
pub fn merge_into(base: &mut Context, overlay: &Context) {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
}

/// Public keys of `context` whose value differs from `inherited`
///
/// The comparison is by value: a key that an ancestor already supplies with
/// the same value is dropped, while an overridden one is kept.
#[must_use]
pub fn persisted_subset(context: &Context, inherited: &Context) -> Context {
    context
        .iter()
        .filter(|(key, _)| !is_private_key(key))
        .filter(|(key, value)| inherited.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Make `path` absolute against the current directory and drop `.`/`..`
/// components lexically, without touching symlinks
///
/// # Errors
/// Fails only if the current directory cannot be determined.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
