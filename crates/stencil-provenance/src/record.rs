//! Provenance record document

use crate::context::Context;
use crate::error::ProvenanceError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Reserved key holding the template reference that produced the directory
pub const TEMPLATE_KEY: &str = "_template";

/// One directory's provenance: the template reference plus the parameters
/// that were not already supplied by an ancestor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvenanceRecord {
    /// Resolved template reference, when recorded
    pub reference: Option<String>,
    /// Persisted parameters (never contains private keys)
    pub context: Context,
}

impl ProvenanceRecord {
    /// Create record
    #[inline]
    #[must_use]
    pub fn new(reference: impl Into<String>, context: Context) -> Self {
        Self {
            reference: Some(reference.into()),
            context,
        }
    }

    /// Parse record text read from `path`
    ///
    /// # Errors
    /// [`ProvenanceError::Invalid`] on JSON syntax errors, a top level that
    /// is not an object, or a template reference that is not a string
    pub fn parse(path: &Path, text: &str) -> Result<Self, ProvenanceError> {
        let value: Value = serde_json::from_str(text).map_err(|source| ProvenanceError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

        let Value::Object(map) = value else {
            return Err(ProvenanceError::invalid(path, "top level is not an object"));
        };

        let mut record = Self::default();
        for (key, value) in map {
            if key == TEMPLATE_KEY {
                match value {
                    Value::String(reference) => record.reference = Some(reference),
                    _ => {
                        return Err(ProvenanceError::invalid(
                            path,
                            format!("'{TEMPLATE_KEY}' is not a string"),
                        ))
                    }
                }
            } else {
                record.context.insert(key, value);
            }
        }
        Ok(record)
    }

    /// Serialize with sorted keys and a 4-space indent
    ///
    /// # Errors
    /// Only fails if a value cannot be serialized.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut sorted: BTreeMap<&str, Value> = self
            .context
            .iter()
            .map(|(k, v)| (k.as_str(), sorted_value(v)))
            .collect();
        if let Some(reference) = &self.reference {
            sorted.insert(TEMPLATE_KEY, Value::String(reference.clone()));
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        sorted.serialize(&mut serializer)?;
        buf.push(b'\n');

        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Copy of `value` with the keys of every nested object in sorted order
fn sorted_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(key, _)| key.as_str());
            Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), sorted_value(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_splits_reference_from_context() {
        let record = ProvenanceRecord::parse(
            Path::new("r.json"),
            r#"{"name": "app", "_template": "gh:org/tpl", "port": 8080}"#,
        )
        .unwrap();

        assert_eq!(record.reference.as_deref(), Some("gh:org/tpl"));
        assert_eq!(record.context.len(), 2);
        assert_eq!(record.context["port"], json!(8080));
    }

    #[test]
    fn parse_rejects_bad_syntax() {
        let err = ProvenanceRecord::parse(Path::new("r.json"), "{not json").unwrap_err();
        assert!(matches!(err, ProvenanceError::Invalid { .. }));
        assert!(err.is_invalid());
    }

    #[test]
    fn parse_rejects_non_object() {
        let err = ProvenanceRecord::parse(Path::new("r.json"), "[1, 2]").unwrap_err();
        assert!(matches!(err, ProvenanceError::Invalid { .. }));
        assert!(err.to_string().contains("top level is not an object"));

        let err = ProvenanceRecord::parse(Path::new("r.json"), r#"{"_template": 3}"#).unwrap_err();
        assert!(matches!(&err, ProvenanceError::Invalid { path, .. } if path == Path::new("r.json")));
        assert!(err.is_invalid());
    }

    #[test]
    fn pretty_json_sorts_keys() {
        let mut context = Context::new();
        context.insert("zeta".into(), json!(1));
        context.insert("alpha".into(), json!("a"));
        let record = ProvenanceRecord::new("tpl", context);

        let text = record.to_pretty_json().unwrap();
        assert_eq!(
            text,
            "{\n    \"_template\": \"tpl\",\n    \"alpha\": \"a\",\n    \"zeta\": 1\n}\n"
        );
    }

    #[test]
    fn pretty_json_sorts_nested_keys() {
        let mut context = Context::new();
        context.insert("db".into(), json!({"port": 5432, "host": "localhost"}));
        let record = ProvenanceRecord { reference: None, context };

        let text = record.to_pretty_json().unwrap();
        assert!(text.find("\"host\"").unwrap() < text.find("\"port\"").unwrap());
    }
}
