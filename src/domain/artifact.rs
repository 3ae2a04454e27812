//! Artifacts produced by workflow stages.
//!
//! The artifact `type` is an open, server-controlled tag, so it stays a plain
//! string here. Payloads arrive as untyped JSON and are folded into the closed
//! [`ArtifactContent`] / [`Value`] sums on the way in.

use serde::Deserialize;

/// One deliverable produced by a workflow stage
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artifact {
    /// File name of the artifact on the backend
    pub name: String,

    /// Declared type tag (e.g. "floor_plan_image", "virtual_tour", "json")
    #[serde(rename = "type")]
    pub kind: String,

    /// Payload, if any
    #[serde(default)]
    pub content: ArtifactContent,

    /// External reference, if any
    #[serde(default)]
    pub url: Option<String>,
}

impl Artifact {
    /// Create a new artifact
    pub fn new(name: impl Into<String>, kind: impl Into<String>, content: ArtifactContent) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            content,
            url: None,
        }
    }

    /// Attach an external reference
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Build an artifact from the body of a single-artifact fetch.
    ///
    /// The backend answers with `{type, content}`. Bodies without a `type`
    /// are treated as a bare JSON document.
    pub fn from_fetched(name: impl Into<String>, body: serde_json::Value) -> Self {
        match body {
            serde_json::Value::Object(mut map) => match map.remove("type") {
                Some(serde_json::Value::String(kind)) => {
                    let content = map
                        .remove("content")
                        .map(ArtifactContent::from)
                        .unwrap_or_default();
                    let url = match map.remove("url") {
                        Some(serde_json::Value::String(url)) => Some(url),
                        _ => None,
                    };
                    Self {
                        name: name.into(),
                        kind,
                        content,
                        url,
                    }
                }
                Some(other) => {
                    map.insert("type".to_string(), other);
                    Self::new(name, "json", ArtifactContent::from(serde_json::Value::Object(map)))
                }
                None => Self::new(name, "json", ArtifactContent::from(serde_json::Value::Object(map))),
            },
            other => Self::new(name, "json", ArtifactContent::from(other)),
        }
    }
}

/// Payload of an artifact
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum ArtifactContent {
    /// A string payload (text, base64 data, ...)
    Scalar(String),

    /// A JSON object, key order preserved
    Structured(Fields),

    /// No payload
    #[default]
    Absent,
}

impl ArtifactContent {
    /// Scalar payload, if this is one
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Structured payload, if this is one
    pub fn as_fields(&self) -> Option<&Fields> {
        match self {
            Self::Structured(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<serde_json::Value> for ArtifactContent {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Absent,
            serde_json::Value::String(s) => Self::Scalar(s),
            serde_json::Value::Object(map) => Self::Structured(Fields::from(map)),
            // Arrays are outside the wire union; keep them visible as text
            other => Self::Scalar(other.to_string()),
        }
    }
}

/// A value nested inside structured content
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum Value {
    /// Strings, numbers and booleans, as text
    Scalar(String),

    /// Nested object
    Mapping(Fields),

    /// Nested array
    Sequence(Vec<Value>),

    Null,
}

impl Value {
    /// Scalar text, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Compact single-line text for tables and summaries
    pub fn to_display_text(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::Null => "null".to_string(),
            Self::Sequence(items) => items
                .iter()
                .map(Value::to_display_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Mapping(fields) => fields
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v.to_display_text()))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::String(s) => Self::Scalar(s),
            serde_json::Value::Bool(b) => Self::Scalar(b.to_string()),
            serde_json::Value::Number(n) => Self::Scalar(n.to_string()),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Mapping(Fields::from(map)),
        }
    }
}

/// Ordered string-keyed mapping
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping insertion order
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.push((key.into(), value));
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar stored under `key`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Fields {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artifact_deserialization() {
        let artifact: Artifact = serde_json::from_value(json!({
            "name": "project_charter.json",
            "type": "json",
            "content": {"project_name": "Eco House", "budget": 750000}
        }))
        .unwrap();

        assert_eq!(artifact.kind, "json");
        assert!(artifact.url.is_none());
        let fields = artifact.content.as_fields().unwrap();
        assert_eq!(fields.get_str("project_name"), Some("Eco House"));
        assert_eq!(fields.get_str("budget"), Some("750000"));
    }

    #[test]
    fn test_missing_and_null_content_are_absent() {
        let missing: Artifact =
            serde_json::from_value(json!({"name": "a", "type": "video"})).unwrap();
        let null: Artifact =
            serde_json::from_value(json!({"name": "a", "type": "video", "content": null}))
                .unwrap();

        assert!(missing.content.is_absent());
        assert!(null.content.is_absent());
    }

    #[test]
    fn test_structured_content_keeps_key_order() {
        let content = ArtifactContent::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = content.as_fields().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_top_level_array_kept_as_text() {
        let content = ArtifactContent::from(json!(["a", "b"]));
        assert_eq!(content.as_scalar(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_from_fetched_body() {
        let artifact = Artifact::from_fetched(
            "bim_cad_documentation_plan.json",
            json!({"type": "image_base64", "content": "aGVsbG8="}),
        );
        assert_eq!(artifact.kind, "image_base64");
        assert_eq!(artifact.content.as_scalar(), Some("aGVsbG8="));

        let bare = Artifact::from_fetched("report.json", json!({"summary": "ok"}));
        assert_eq!(bare.kind, "json");
        assert_eq!(bare.content.as_fields().unwrap().get_str("summary"), Some("ok"));
    }

    #[test]
    fn test_value_display_text() {
        let value = Value::from(json!({"phase": "Design", "weeks": [4, 6]}));
        assert_eq!(value.to_display_text(), "phase: Design; weeks: 4, 6");
    }
}
