// FieldSchemaStore - per-block field definitions, and field deletion that
// keeps the page document in step with the schema

use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::strong_types::{BlockId, BlockRef, DocumentId, FieldId, PageRef};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{ContentDatabase, FieldRecord};
use crate::models::field::DEFAULT_LAYOUT;
use crate::models::{Field, FieldPatch, FieldValue, NewField};
use crate::services::block_registry::BlockRegistry;
use crate::services::hydrator::reconcile_field_removal;
use crate::services::validator::{coerce_default, parse_field_type, validate_field_definition};

/// Outcome of a reconciled field deletion
#[derive(Debug, Clone, Serialize)]
pub struct FieldDeletion {
    pub field: Field,
    pub document_id: Option<DocumentId>,
    pub value_removed: bool,
}

#[derive(Clone)]
pub struct FieldSchemaStore {
    db: Arc<dyn ContentDatabase>,
    blocks: BlockRegistry,
}

impl FieldSchemaStore {
    pub fn new(db: Arc<dyn ContentDatabase>, blocks: BlockRegistry) -> Self {
        Self { db, blocks }
    }

    async fn ensure_name_free(
        &self,
        block_id: BlockId,
        name: &str,
        exclude: Option<FieldId>,
    ) -> AppResult<()> {
        if self.db.field_name_taken(block_id, name, exclude).await? {
            return Err(AppError::Conflict(format!(
                "fields(block_id, name): block #{} already has a field named '{}'",
                block_id, name
            )));
        }
        Ok(())
    }

    pub async fn create_field(&self, field: NewField) -> AppResult<Field> {
        let field_type = parse_field_type(&field.field_type)?;

        let order = match field.order {
            Some(order) => order,
            None => self
                .db
                .max_field_order(field.block_id)
                .await?
                .map_or(0, |max| max + 1),
        };
        let label = field
            .label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| field.name.clone());

        let record = FieldRecord {
            block_id: field.block_id,
            name: field.name,
            label,
            field_type,
            order,
            options: field.options,
            validation: field.validation,
            default_value: field.default_value,
            is_required: field.is_required,
            has_many: field.has_many,
            relation_model: field.relation_model,
            placeholder: field.placeholder,
            help_text: field.help_text,
            description: field.description,
            layout: field.layout.unwrap_or(DEFAULT_LAYOUT),
        };
        validate_field_definition(&record)?;

        if self.db.get_block(record.block_id, false).await?.is_none() {
            return Err(AppError::Conflict(format!(
                "fields.block_id: block #{} does not exist",
                record.block_id
            )));
        }
        self.ensure_name_free(record.block_id, &record.name, None).await?;

        let created = self.db.insert_field(&record).await?;
        info!(
            "Created {} field {} ({}) on block {}",
            created.field_type, created.name, created.id, created.block_id
        );
        Ok(created)
    }

    pub async fn get_field(&self, id: FieldId, with_trashed: bool) -> AppResult<Field> {
        self.db
            .get_field(id, with_trashed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("field #{} not found", id)))
    }

    /// Live fields of a block in display order.
    pub async fn list_fields_by_block(
        &self,
        block: &BlockRef,
        page: Option<&PageRef>,
    ) -> AppResult<Vec<Field>> {
        let block = self.blocks.resolve_block(block, page).await?;
        self.db.list_fields(block.id, false).await
    }

    /// Field name to coerced default value for every live field of a block.
    pub async fn get_fields_as_default_map(
        &self,
        block: &BlockRef,
        page: Option<&PageRef>,
    ) -> AppResult<BTreeMap<String, FieldValue>> {
        let fields = self.list_fields_by_block(block, page).await?;
        Ok(fields
            .iter()
            .map(|field| (field.name.clone(), coerce_default(field)))
            .collect())
    }

    pub async fn update_field(&self, id: FieldId, patch: FieldPatch) -> AppResult<Field> {
        let current = self.get_field(id, false).await?;
        let field_type = match &patch.field_type {
            Some(raw) => parse_field_type(raw)?,
            None => current.field_type,
        };
        let merged = patch.apply_to(&current, field_type);
        let record = FieldRecord::from(&merged);
        validate_field_definition(&record)?;

        if merged.name != current.name {
            self.ensure_name_free(current.block_id, &merged.name, Some(id)).await?;
            warn!(
                "Field #{} renamed from '{}' to '{}'; stored values under the old name are no longer addressed",
                id, current.name, merged.name
            );
        }

        self.db.update_field(id, &record).await
    }

    /// Rewrite the display order of a block's live fields. `ordered` must name
    /// each live field of the block exactly once.
    pub async fn reorder_fields(&self, block_id: BlockId, ordered: &[FieldId]) -> AppResult<Vec<Field>> {
        self.blocks.get_block(block_id, false).await?;
        let live: HashSet<FieldId> = self
            .db
            .list_fields(block_id, false)
            .await?
            .iter()
            .map(|field| field.id)
            .collect();

        let requested: HashSet<FieldId> = ordered.iter().copied().collect();
        if requested.len() != ordered.len() || requested != live {
            return Err(AppError::invalid(
                "fields",
                format!(
                    "must list each live field of block #{} exactly once",
                    block_id
                ),
            ));
        }

        for (position, id) in ordered.iter().enumerate() {
            self.db.set_field_order(*id, position as i64).await?;
        }
        self.db.list_fields(block_id, false).await
    }

    /// Hides the field from structure and defaults. The stored value is left
    /// alone here but the next page save drops it.
    pub async fn soft_delete_field(&self, id: FieldId) -> AppResult<()> {
        self.get_field(id, false).await?;
        self.db.set_field_deleted(id, Some(Utc::now())).await?;
        info!("Moved field {} to trash", id);
        Ok(())
    }

    pub async fn restore_field(&self, id: FieldId) -> AppResult<Field> {
        let field = self.get_field(id, true).await?;
        if field.deleted_at.is_some() {
            self.ensure_name_free(field.block_id, &field.name, Some(id)).await?;
            self.db.set_field_deleted(id, None).await?;
            info!("Restored field {}", id);
        }
        self.get_field(id, false).await
    }

    /// Removes the definition only, leaving any stored value orphaned.
    pub async fn force_delete_field(&self, id: FieldId) -> AppResult<()> {
        let field = self.get_field(id, true).await?;
        self.db.delete_field(id).await?;
        info!(
            "Permanently deleted field {} ({}) without touching documents",
            field.name, id
        );
        Ok(())
    }

    /// Delete a field and excise its value from the owning page's document in
    /// one transaction. A missing document or value is logged and does not
    /// block the deletion.
    #[instrument(skip(self))]
    pub async fn delete_field_and_reconcile(&self, id: FieldId) -> AppResult<FieldDeletion> {
        let field = self.get_field(id, false).await?;
        let block = self.blocks.get_block(field.block_id, true).await?;
        let document = self
            .db
            .find_document_for_page(&PageRef::ById(block.page_id))
            .await?;

        // All reads happen before the transaction takes its connection
        let mut tx = self.db.begin_transaction().await?;
        let mut value_removed = false;
        let document_id = match document {
            Some(mut document) => {
                if reconcile_field_removal(&mut document.data, &block.slug, &field.name) {
                    self.db
                        .update_document_data_tx(&mut tx, document.id, &document.data)
                        .await?;
                    value_removed = true;
                } else {
                    warn!(
                        page = %block.page_id,
                        block = %block.slug,
                        field = %field.name,
                        "Document {} has nothing to excise; deleting field anyway",
                        document.id
                    );
                }
                Some(document.id)
            }
            None => {
                warn!(
                    page = %block.page_id,
                    block = %block.slug,
                    field = %field.name,
                    "Page has no document; deleting field anyway"
                );
                None
            }
        };

        if !self.db.delete_field_tx(&mut tx, id).await? {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("field #{} not found", id)));
        }
        tx.commit().await?;

        info!(
            "Deleted field {} from block {} (document value removed: {})",
            field.name, block.slug, value_removed
        );
        Ok(FieldDeletion {
            field,
            document_id,
            value_removed,
        })
    }
}
