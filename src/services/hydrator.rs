// Document hydration - resolves media references stored in a page document
// into live media attributes for the read path, plus the document-side half
// of field deletion.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::core::strong_types::RecordId;
use crate::error::AppResult;
use crate::infrastructure::media::MediaLookup;
use crate::models::{BlockWithFields, DocumentData, FieldType, FieldValue, MediaRef};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MediaKey {
    Id(RecordId),
    Url(String),
}

/// Walk `value`, offering every media reference to `resolve`. `Some` replaces
/// the reference, `None` keeps it. In upload position bare ids and urls count
/// as references too.
fn walk(value: &Value, upload: bool, resolve: &mut dyn FnMut(&MediaKey) -> Option<Value>) -> Value {
    match value {
        Value::Object(object) => match MediaRef::recognize(object) {
            Some(media) => resolve(&MediaKey::Id(media.id)).unwrap_or_else(|| value.clone()),
            None => Value::Object(
                object
                    .iter()
                    .map(|(key, child)| (key.clone(), walk(child, false, resolve)))
                    .collect(),
            ),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| walk(item, upload, resolve))
                .collect(),
        ),
        Value::Number(n) if upload => match n.as_i64() {
            Some(id) => resolve(&MediaKey::Id(RecordId::Int(id))).unwrap_or_else(|| value.clone()),
            None => value.clone(),
        },
        Value::String(s) if upload && !s.trim().is_empty() => {
            let key = match RecordId::from_json(value) {
                Some(RecordId::Int(id)) => MediaKey::Id(RecordId::Int(id)),
                _ => MediaKey::Url(s.clone()),
            };
            resolve(&key).unwrap_or_else(|| value.clone())
        }
        _ => value.clone(),
    }
}

/// Read-time resolver for media references. Never writes to storage.
#[derive(Clone)]
pub struct DocumentHydrator {
    media: Arc<dyn MediaLookup>,
}

impl DocumentHydrator {
    pub fn new(media: Arc<dyn MediaLookup>) -> Self {
        Self { media }
    }

    /// Replace media references in `data` with public media attributes.
    ///
    /// `structure` tells which fields are uploads. A reference by id whose
    /// media row is gone becomes `null`; an unknown url is left as it is.
    /// Hydrating an already hydrated document returns it unchanged.
    pub async fn hydrate(
        &self,
        data: &DocumentData,
        structure: &[BlockWithFields],
    ) -> AppResult<DocumentData> {
        let uploads: HashSet<(&str, &str)> = structure
            .iter()
            .flat_map(|entry| {
                entry
                    .fields
                    .iter()
                    .filter(|field| field.field_type == FieldType::Upload)
                    .map(move |field| (entry.block.slug.as_str(), field.name.as_str()))
            })
            .collect();
        let is_upload = |block: &str, field: &str| uploads.contains(&(block, field));

        // First pass: gather every reference
        let mut wanted: HashSet<MediaKey> = HashSet::new();
        for (block_slug, values) in data {
            for (field_name, value) in values {
                walk(&value.to_json(), is_upload(block_slug, field_name), &mut |key| {
                    wanted.insert(key.clone());
                    None
                });
            }
        }

        if wanted.is_empty() {
            return Ok(data.clone());
        }

        let mut resolved: HashMap<MediaKey, Option<Value>> = HashMap::new();
        for key in wanted {
            let media = match &key {
                MediaKey::Id(id) => self.media.get_media_by_id(id).await?,
                MediaKey::Url(url) => self.media.get_media_by_url(url).await?,
            };
            let replacement = match (&key, media) {
                (_, Some(media)) => Some(media.public_json()),
                (MediaKey::Id(id), None) => {
                    debug!("Media {} referenced by document no longer exists", id);
                    Some(Value::Null)
                }
                (MediaKey::Url(_), None) => None,
            };
            resolved.insert(key, replacement);
        }

        // Second pass: rewrite
        let mut hydrated = DocumentData::new();
        for (block_slug, values) in data {
            let block = hydrated.entry(block_slug.clone()).or_default();
            for (field_name, value) in values {
                let json = walk(&value.to_json(), is_upload(block_slug, field_name), &mut |key| {
                    resolved.get(key).cloned().flatten()
                });
                block.insert(field_name.clone(), FieldValue::from_json(json));
            }
        }
        Ok(hydrated)
    }
}

/// Remove `data[block_slug][field_name]`, leaving siblings and the (possibly
/// now empty) block object in place. Returns whether a value was removed.
pub fn reconcile_field_removal(data: &mut DocumentData, block_slug: &str, field_name: &str) -> bool {
    data.get_mut(block_slug)
        .map(|values| values.remove(field_name).is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strong_types::{BlockId, FieldId, MediaId, PageId};
    use crate::models::{Block, Field, Media, ValidationRules};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    struct FixedMedia(Vec<Media>);

    #[async_trait]
    impl MediaLookup for FixedMedia {
        async fn get_media_by_id(&self, id: &RecordId) -> AppResult<Option<Media>> {
            Ok(self.0.iter().find(|m| Some(m.id.value()) == id.as_i64()).cloned())
        }

        async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>> {
            Ok(self.0.iter().find(|m| m.url == url).cloned())
        }
    }

    fn media(id: i64, url: &str) -> Media {
        Media {
            id: MediaId(id),
            name: None,
            url: url.to_string(),
            width: Some(640),
            height: Some(480),
            placeholder: Some("data:image/png;base64,AAAA".to_string()),
            mime_type: Some("image/png".to_string()),
            created_at: Utc::now(),
        }
    }

    fn structure(block_slug: &str, fields: &[(&str, FieldType)]) -> Vec<BlockWithFields> {
        let now = Utc::now();
        vec![BlockWithFields {
            block: Block {
                id: BlockId(1),
                page_id: PageId(1),
                title: block_slug.to_string(),
                slug: block_slug.to_string(),
                icon: None,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
            fields: fields
                .iter()
                .enumerate()
                .map(|(i, (name, field_type))| Field {
                    id: FieldId(i as i64 + 1),
                    block_id: BlockId(1),
                    name: name.to_string(),
                    label: name.to_string(),
                    field_type: *field_type,
                    order: i as i64,
                    options: Vec::new(),
                    validation: ValidationRules::new(),
                    default_value: None,
                    is_required: false,
                    has_many: false,
                    relation_model: None,
                    placeholder: None,
                    help_text: None,
                    description: None,
                    layout: 12,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                })
                .collect(),
        }]
    }

    fn data(value: Value) -> DocumentData {
        serde_json::from_value(value).unwrap()
    }

    fn hydrator(items: Vec<Media>) -> DocumentHydrator {
        DocumentHydrator::new(Arc::new(FixedMedia(items)))
    }

    #[tokio::test]
    async fn test_resolves_references_by_object_id_and_upload_field() {
        let hydrator = hydrator(vec![media(1, "/storage/a.png"), media(2, "/storage/b.png")]);
        let structure = structure("hero", &[("image", FieldType::Upload), ("title", FieldType::Text)]);
        let raw = data(json!({
            "hero": {
                "image": 2,
                "title": "Hello",
                "gallery": [{"id": 1, "type": "media"}, {"id": 2}],
            }
        }));

        let hydrated = hydrator.hydrate(&raw, &structure).await.unwrap();
        let hero = serde_json::to_value(&hydrated["hero"]).unwrap();

        assert_eq!(hero["image"]["url"], json!("/storage/b.png"));
        assert_eq!(hero["image"]["width"], json!(640));
        assert_eq!(hero["title"], json!("Hello"));
        assert_eq!(hero["gallery"][0]["url"], json!("/storage/a.png"));
        assert_eq!(hero["gallery"][1]["id"], json!(2));
        // Stored document untouched
        assert_eq!(raw["hero"]["image"], FieldValue::from(json!(2)));
    }

    #[tokio::test]
    async fn test_numbers_outside_upload_fields_are_not_media() {
        let hydrator = hydrator(vec![media(3, "/storage/c.png")]);
        let structure = structure("stats", &[("count", FieldType::Number)]);
        let raw = data(json!({"stats": {"count": 3}}));

        let hydrated = hydrator.hydrate(&raw, &structure).await.unwrap();
        assert_eq!(hydrated, raw);
    }

    #[tokio::test]
    async fn test_upload_urls_resolve_and_unknown_urls_survive() {
        let hydrator = hydrator(vec![media(4, "/storage/known.png")]);
        let structure = structure("hero", &[("image", FieldType::Upload), ("logo", FieldType::Upload)]);
        let raw = data(json!({
            "hero": {"image": "/storage/known.png", "logo": "https://cdn.example.com/logo.svg"}
        }));

        let hydrated = hydrator.hydrate(&raw, &structure).await.unwrap();
        let hero = serde_json::to_value(&hydrated["hero"]).unwrap();
        assert_eq!(hero["image"]["id"], json!(4));
        assert_eq!(hero["logo"], json!("https://cdn.example.com/logo.svg"));
    }

    #[tokio::test]
    async fn test_dangling_references_become_null() {
        let hydrator = hydrator(vec![]);
        let structure = structure("hero", &[("image", FieldType::Upload)]);
        let raw = data(json!({
            "hero": {"image": 99, "extra": {"id": 98, "type": "media"}, "title": "kept"}
        }));

        let hydrated = hydrator.hydrate(&raw, &structure).await.unwrap();
        assert!(hydrated["hero"]["image"].is_null());
        assert!(hydrated["hero"]["extra"].is_null());
        assert_eq!(hydrated["hero"]["title"], FieldValue::from("kept"));
    }

    #[tokio::test]
    async fn test_hydration_is_idempotent() {
        let hydrator = hydrator(vec![media(1, "/storage/a.png")]);
        let structure = structure("hero", &[("image", FieldType::Upload)]);
        let raw = data(json!({
            "hero": {"image": 1, "missing": {"id": 50}, "cover": {"id": 1}}
        }));

        let once = hydrator.hydrate(&raw, &structure).await.unwrap();
        let twice = hydrator.hydrate(&once, &structure).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_richtext_blocks_with_string_ids_survive() {
        let hydrator = hydrator(vec![media(1, "/storage/a.png")]);
        let structure = structure("hero", &[("body", FieldType::Richtext)]);
        let raw = data(json!({
            "hero": {
                "body": {
                    "blocks": [
                        {"id": "sAmJ3", "type": "paragraph", "data": {"text": "hello"}},
                        {"id": "k9XwQ", "data": {"text": "untyped"}}
                    ]
                }
            }
        }));

        let hydrated = hydrator.hydrate(&raw, &structure).await.unwrap();
        assert_eq!(hydrated, raw);
    }

    #[test]
    fn test_reconcile_removes_only_the_field_key() {
        let mut doc = data(json!({"hero": {"title": "x", "subtitle": "y"}, "footer": {"subtitle": "z"}}));

        assert!(reconcile_field_removal(&mut doc, "hero", "subtitle"));
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"hero": {"title": "x"}, "footer": {"subtitle": "z"}})
        );

        // Block object stays even when emptied
        assert!(reconcile_field_removal(&mut doc, "hero", "title"));
        assert_eq!(serde_json::to_value(&doc["hero"]).unwrap(), json!({}));

        assert!(!reconcile_field_removal(&mut doc, "hero", "title"));
        assert!(!reconcile_field_removal(&mut doc, "missing", "title"));
    }
}
