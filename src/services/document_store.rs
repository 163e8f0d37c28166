// DocumentStore - one content document per page, assembled from the page's
// block/field structure on save

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::strong_types::{DocumentId, PageId, PageRef};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentDatabase;
use crate::models::{BlockWithFields, Document, DocumentData, FieldValue, Page, SavePageDocument};
use crate::services::block_registry::BlockRegistry;
use crate::services::validator::{coerce_default, validate_value};

#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<dyn ContentDatabase>,
    blocks: BlockRegistry,
}

impl DocumentStore {
    pub fn new(db: Arc<dyn ContentDatabase>, blocks: BlockRegistry) -> Self {
        Self { db, blocks }
    }

    /// The live document of a page, if one has been saved
    pub async fn get_document_for_page(&self, page: &PageRef) -> AppResult<Option<Document>> {
        self.db.find_document_for_page(page).await
    }

    pub async fn get_document(&self, id: DocumentId, with_trashed: bool) -> AppResult<Document> {
        self.db
            .get_document(id, with_trashed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("document #{} not found", id)))
    }

    /// Create the page's document or replace its data wholesale.
    pub async fn upsert_page_document(&self, page: &PageRef, data: DocumentData) -> AppResult<Document> {
        let page = self
            .db
            .get_page(page, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", page)))?;
        self.write(&page, &data).await
    }

    async fn write(&self, page: &Page, data: &DocumentData) -> AppResult<Document> {
        match self.db.find_document_for_page(&page.id.into()).await? {
            Some(existing) => {
                self.db.update_document_data(existing.id, data).await?;
                debug!("Updated document {} for page {}", existing.id, page.slug);
                self.get_document(existing.id, false).await
            }
            None => {
                let created = self
                    .db
                    .insert_document(&page.slug, page.id, &page.slug, data)
                    .await?;
                info!("Created document {} for page {}", created.id, page.slug);
                Ok(created)
            }
        }
    }

    /// Save the admin form for a page. Every live field of every live block
    /// gets a value: the submitted one, or the field's default when nothing
    /// was sent. Keys outside the current structure are dropped.
    pub async fn save_page(&self, request: SavePageDocument) -> AppResult<Document> {
        let page = self
            .db
            .get_page(&request.page_id.into(), false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("page #{} not found", request.page_id)))?;

        if !request.slug.is_empty() && request.slug != page.slug {
            return Err(AppError::invalid(
                "slug",
                format!("does not match page #{} ('{}')", page.id, page.slug),
            ));
        }

        let structure = self.blocks.structure_of(page.id).await?;
        let data = assemble_document(&structure, &request.data);
        self.write(&page, &data).await
    }

    pub async fn list_documents(
        &self,
        page_id: Option<PageId>,
        with_trashed: bool,
    ) -> AppResult<Vec<Document>> {
        self.db.list_documents(page_id, with_trashed).await
    }

    pub async fn soft_delete_document(&self, id: DocumentId) -> AppResult<()> {
        self.get_document(id, false).await?;
        self.db.set_document_deleted(id, Some(Utc::now())).await?;
        info!("Moved document {} to trash", id);
        Ok(())
    }

    pub async fn restore_document(&self, id: DocumentId) -> AppResult<Document> {
        let document = self.get_document(id, true).await?;
        if document.deleted_at.is_some() {
            if self
                .db
                .find_document_for_page(&PageRef::BySlug(document.page_slug.clone()))
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "documents.page_slug: page '{}' already has a live document",
                    document.page_slug
                )));
            }
            self.db.set_document_deleted(id, None).await?;
            info!("Restored document {}", id);
        }
        self.get_document(id, false).await
    }

    pub async fn force_delete_document(&self, id: DocumentId) -> AppResult<()> {
        if !self.db.delete_document(id).await? {
            return Err(AppError::NotFound(format!("document #{} not found", id)));
        }
        info!("Permanently deleted document {}", id);
        Ok(())
    }
}

/// Build the stored document from the submitted form data.
///
/// Validation here is advisory: a value that fails its field's checks is
/// stored as submitted and logged.
fn assemble_document(structure: &[BlockWithFields], submitted: &DocumentData) -> DocumentData {
    let mut data = DocumentData::new();

    for entry in structure {
        let sent = submitted.get(&entry.block.slug);
        let mut values = BTreeMap::new();

        for field in &entry.fields {
            let raw = sent
                .and_then(|values| values.get(&field.name))
                .filter(|value| !value.is_null());

            let value = match raw {
                None => coerce_default(field),
                Some(raw) => match validate_value(field, Some(raw)) {
                    Ok(FieldValue::Null) => raw.clone(),
                    Ok(coerced) => coerced,
                    Err(errors) => {
                        warn!(
                            "Storing unvalidated value for {}.{}: {}",
                            entry.block.slug, field.name, errors
                        );
                        raw.clone()
                    }
                },
            };
            values.insert(field.name.clone(), value);
        }
        data.insert(entry.block.slug.clone(), values);
    }

    let dropped: usize = submitted
        .iter()
        .map(|(slug, values)| match data.get(slug) {
            Some(kept) => values.keys().filter(|name| !kept.contains_key(*name)).count(),
            None => values.len(),
        })
        .sum();
    if dropped > 0 {
        debug!("Dropped {} submitted values outside the page structure", dropped);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;
    use crate::models::{NewBlock, NewField, NewPage};
    use crate::services::schema_store::FieldSchemaStore;
    use serde_json::json;

    struct Fixture {
        documents: DocumentStore,
        fields: FieldSchemaStore,
        page: Page,
        hero: crate::models::Block,
    }

    async fn fixture() -> Fixture {
        let db: Arc<dyn ContentDatabase> = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let blocks = BlockRegistry::new(db.clone());
        let page = db
            .insert_page(&NewPage {
                title: "Home".into(),
                slug: "home".into(),
                published_at: None,
            })
            .await
            .unwrap();
        let hero = blocks
            .create_block(NewBlock {
                title: "Hero".into(),
                slug: "hero".into(),
                page_id: page.id,
                icon: None,
            })
            .await
            .unwrap();
        Fixture {
            documents: DocumentStore::new(db.clone(), blocks.clone()),
            fields: FieldSchemaStore::new(db, blocks),
            page,
            hero,
        }
    }

    fn data(value: serde_json::Value) -> DocumentData {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_save_fills_defaults_and_drops_unknown_keys() {
        let fx = fixture().await;
        fx.fields
            .create_field(NewField::new(fx.hero.id, "heading", "text").with_default("Untitled"))
            .await
            .unwrap();
        fx.fields
            .create_field(NewField::new(fx.hero.id, "count", "number"))
            .await
            .unwrap();

        let saved = fx
            .documents
            .save_page(SavePageDocument {
                page_id: fx.page.id,
                slug: "home".into(),
                data: data(json!({"hero": {"count": "7", "stray": 1}, "ghost": {"x": 1}})),
            })
            .await
            .unwrap();

        assert_eq!(saved.page_slug, "home");
        assert_eq!(
            serde_json::to_value(&saved.data).unwrap(),
            json!({"hero": {"heading": "Untitled", "count": 7}})
        );
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_document() {
        let fx = fixture().await;
        fx.fields
            .create_field(NewField::new(fx.hero.id, "heading", "text"))
            .await
            .unwrap();

        let first = fx
            .documents
            .save_page(SavePageDocument {
                page_id: fx.page.id,
                slug: String::new(),
                data: data(json!({"hero": {"heading": "Welcome"}})),
            })
            .await
            .unwrap();
        let second = fx
            .documents
            .save_page(SavePageDocument {
                page_id: fx.page.id,
                slug: "home".into(),
                data: data(json!({"hero": {"heading": "Hello again"}})),
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.data["hero"]["heading"], FieldValue::from("Hello again"));
        assert_eq!(fx.documents.list_documents(Some(fx.page.id), false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_values_are_stored_as_submitted() {
        let fx = fixture().await;
        fx.fields
            .create_field(NewField::new(fx.hero.id, "count", "number"))
            .await
            .unwrap();

        let saved = fx
            .documents
            .save_page(SavePageDocument {
                page_id: fx.page.id,
                slug: "home".into(),
                data: data(json!({"hero": {"count": "many"}})),
            })
            .await
            .unwrap();
        assert_eq!(saved.data["hero"]["count"], FieldValue::from("many"));
    }

    #[tokio::test]
    async fn test_mismatched_slug_is_rejected() {
        let fx = fixture().await;
        let err = fx
            .documents
            .save_page(SavePageDocument {
                page_id: fx.page.id,
                slug: "about".into(),
                data: DocumentData::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_restore_conflicts_with_live_document() {
        let fx = fixture().await;
        let old = fx
            .documents
            .upsert_page_document(&"home".parse().unwrap(), DocumentData::new())
            .await
            .unwrap();
        fx.documents.soft_delete_document(old.id).await.unwrap();
        assert!(fx
            .documents
            .get_document_for_page(&fx.page.id.into())
            .await
            .unwrap()
            .is_none());

        fx.documents
            .upsert_page_document(&fx.page.id.into(), DocumentData::new())
            .await
            .unwrap();
        let err = fx.documents.restore_document(old.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
