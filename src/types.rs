//! Core type definitions for CorpusDB documents and metadata.
//!
//! Document ids are caller-supplied strings or generated random tokens.
//! Metadata values use a closed tagged type rather than open JSON values,
//! so filter equality is defined per variant.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding vector type alias.
///
/// Embeddings are f32 vectors of a per-collection fixed dimension.
pub type Embedding = Vec<f32>;

/// Document identifier within a collection.
///
/// Either supplied by the caller or generated as a random unique token
/// on insert. Ids map bijectively to row indices via the collection's
/// id maps.
///
/// # Example
/// ```
/// use corpusdb::DocumentId;
///
/// let id = DocumentId::from("chunk-0001");
/// let generated = DocumentId::generate();
/// assert_ne!(generated, DocumentId::generate());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Creates a DocumentId from a caller-supplied string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random DocumentId (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document metadata: string keys mapped to tagged values.
///
/// `BTreeMap` keeps sidecar JSON output deterministic across saves.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value.
///
/// Closed set of variants instead of arbitrary JSON: filter matching is
/// exact equality per variant, with no cross-variant coercion (`Int(1)`
/// does not match `Float(1.0)`).
///
/// Serialized untagged, so sidecar JSON reads naturally:
/// `{"source": "wiki", "chunk": 3, "draft": false}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Bit comparison keeps equality total: NaN matches its own
            // bit pattern and nothing else.
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for MetadataValue {}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
        }
    }
}

/// Filter over document metadata: every key/value pair must match by
/// exact equality (logical AND). No partial or prefix matching.
///
/// # Example
///
/// ```
/// use corpusdb::MetadataFilter;
///
/// let filter = MetadataFilter::new()
///     .with("source", "wiki")
///     .with("chunk", 3i64);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataFilter(Metadata);

impl MetadataFilter {
    /// Creates an empty filter (matches every document).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key/value condition, consuming and returning the filter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns true if the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the given metadata satisfies every condition.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0
            .iter()
            .all(|(key, value)| metadata.get(key) == Some(value))
    }
}

impl From<Metadata> for MetadataFilter {
    fn from(conditions: Metadata) -> Self {
        Self(conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, MetadataValue)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_document_id_generate_is_unique() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_document_id_from_str() {
        let id = DocumentId::from("d1");
        assert_eq!(id.as_str(), "d1");
        assert_eq!(format!("{}", id), "d1");
    }

    #[test]
    fn test_document_id_serde_transparent() {
        let id = DocumentId::from("d1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"d1\"");
        let restored: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }

    #[test]
    fn test_metadata_value_equality_per_variant() {
        assert_eq!(MetadataValue::from("a"), MetadataValue::from("a"));
        assert_ne!(MetadataValue::from("a"), MetadataValue::from("b"));
        assert_eq!(MetadataValue::from(1i64), MetadataValue::from(1i64));
        // No cross-variant coercion
        assert_ne!(MetadataValue::Int(1), MetadataValue::Float(1.0));
        assert_ne!(MetadataValue::Bool(true), MetadataValue::Int(1));
    }

    #[test]
    fn test_metadata_value_float_bits() {
        assert_eq!(MetadataValue::Float(0.5), MetadataValue::Float(0.5));
        assert_eq!(
            MetadataValue::Float(f64::NAN),
            MetadataValue::Float(f64::NAN)
        );
        // 0.0 and -0.0 differ in bit pattern
        assert_ne!(MetadataValue::Float(0.0), MetadataValue::Float(-0.0));
    }

    #[test]
    fn test_metadata_value_untagged_json() {
        let m = meta(&[
            ("source", "wiki".into()),
            ("chunk", 3i64.into()),
            ("draft", false.into()),
        ]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"chunk":3,"draft":false,"source":"wiki"}"#);
        let restored: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, m);
    }

    #[test]
    fn test_filter_empty_matches_everything() {
        let filter = MetadataFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&Metadata::new()));
        assert!(filter.matches(&meta(&[("any", "value".into())])));
    }

    #[test]
    fn test_filter_all_pairs_must_match() {
        let filter = MetadataFilter::new().with("source", "A").with("topic", "fruit");

        let full = meta(&[("source", "A".into()), ("topic", "fruit".into())]);
        assert!(filter.matches(&full));

        let partial = meta(&[("source", "A".into()), ("topic", "vehicle".into())]);
        assert!(!filter.matches(&partial));

        let missing_key = meta(&[("source", "A".into())]);
        assert!(!filter.matches(&missing_key));
    }

    #[test]
    fn test_filter_from_metadata() {
        let conditions = meta(&[("source", "B".into())]);
        let filter = MetadataFilter::from(conditions);
        assert!(filter.matches(&meta(&[("source", "B".into()), ("extra", 1i64.into())])));
    }
}
