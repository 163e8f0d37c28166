// Page documents - typed view over the `{ blockSlug: { fieldName: value } }` JSON tree
// The wire shape is plain JSON; variants only exist on the Rust side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::core::strong_types::{DocumentId, PageId, RecordId};

/// `data[block_slug][field_name] = value`
pub type DocumentData = BTreeMap<String, BTreeMap<String, FieldValue>>;

/// A stored, not yet resolved media reference: an object with a numeric `id`,
/// or any `id` when tagged `type: "media"`. The original object is kept so
/// extra keys survive a round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub id: RecordId,
    pub raw: Map<String, Value>,
}

impl MediaRef {
    /// Objects that already carry a `url` are resolved media, not references.
    pub fn recognize(object: &Map<String, Value>) -> Option<Self> {
        if object.contains_key("url") {
            return None;
        }
        let tagged = match object.get("type") {
            None | Some(Value::Null) => false,
            Some(Value::String(kind)) if kind == "media" => true,
            Some(_) => return None,
        };
        let id = object.get("id").and_then(RecordId::from_json)?;
        // Untagged objects with string ids are editor content, not media
        if !tagged && id.as_i64().is_none() {
            return None;
        }
        Some(Self {
            id,
            raw: object.clone(),
        })
    }
}

/// One value inside a page document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    TextList(Vec<String>),
    Relation(RecordId),
    RelationList(Vec<RecordId>),
    Media(MediaRef),
    /// Anything without a more specific shape: nested objects, mixed arrays,
    /// rich-text trees, resolved media.
    Json(Value),
}

impl FieldValue {
    /// Classify a raw JSON value. Relation variants are never produced here:
    /// a bare id is indistinguishable from a number without the field schema.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) if items.iter().all(Value::is_string) => FieldValue::TextList(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Object(object) => match MediaRef::recognize(&object) {
                Some(media) => FieldValue::Media(media),
                None => FieldValue::Json(Value::Object(object)),
            },
            other => FieldValue::Json(other),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::TextList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Relation(id) => id.to_json(),
            FieldValue::RelationList(ids) => Value::Array(ids.iter().map(RecordId::to_json).collect()),
            FieldValue::Media(media) => Value::Object(media.raw.clone()),
            FieldValue::Json(value) => value.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Json(Value::Null))
    }

    /// Whether the value holds a collection rather than a scalar
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FieldValue::TextList(_) | FieldValue::RelationList(_) | FieldValue::Json(Value::Array(_))
        )
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::from_json(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FieldValue::from_json)
    }
}

/// The single content document of a page, keyed by the page slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub slug: String,
    pub page_id: PageId,
    pub page_slug: String,
    pub data: DocumentData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Body of `POST /documents/save-page`
#[derive(Debug, Clone, Deserialize)]
pub struct SavePageDocument {
    pub page_id: PageId,
    #[serde(default)]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: DocumentData,
}

/// `data: null` saves the same as `data: {}`
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DocumentData, D::Error> {
    Ok(Option::<DocumentData>::deserialize(deserializer)?.unwrap_or_default())
}
