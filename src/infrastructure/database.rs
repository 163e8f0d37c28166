// Database Interface - persistence seam for pages, blocks, fields, documents and media
// Services talk to this trait only; SQL lives in the implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};

use crate::core::strong_types::{BlockId, DocumentId, FieldId, MediaId, PageId, PageRef};
use crate::error::{AppError, AppResult};
use crate::models::{
    Block, Document, DocumentData, Field, FieldOption, FieldType, Media, NewBlock, NewMedia,
    NewPage, Page, Seo, SeoInput, ValidationRules,
};

/// Transaction wrapper for multi-statement writes
pub struct DatabaseTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl DatabaseTransaction {
    pub fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    pub(crate) fn as_sqlite_mut(&mut self) -> &mut Transaction<'static, Sqlite> {
        &mut self.tx
    }

    /// Commit the transaction
    pub async fn commit(self) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit transaction: {}", e)))
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to rollback transaction: {}", e)))
    }
}

/// Writable attributes of a field row, shared by insert and update
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub block_id: BlockId,
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub order: i64,
    pub options: Vec<FieldOption>,
    pub validation: ValidationRules,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub has_many: bool,
    pub relation_model: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub description: Option<String>,
    pub layout: i64,
}

impl From<&Field> for FieldRecord {
    fn from(field: &Field) -> Self {
        Self {
            block_id: field.block_id,
            name: field.name.clone(),
            label: field.label.clone(),
            field_type: field.field_type,
            order: field.order,
            options: field.options.clone(),
            validation: field.validation.clone(),
            default_value: field.default_value.clone(),
            is_required: field.is_required,
            has_many: field.has_many,
            relation_model: field.relation_model.clone(),
            placeholder: field.placeholder.clone(),
            help_text: field.help_text.clone(),
            description: field.description.clone(),
            layout: field.layout,
        }
    }
}

/// Database interface trait for the content engine.
///
/// `with_trashed = false` hides soft-deleted rows. `set_*_deleted` writes the
/// `deleted_at` marker (`None` restores) and reports whether a row matched.
#[async_trait]
pub trait ContentDatabase: Send + Sync {
    // Transaction management
    async fn begin_transaction(&self) -> AppResult<DatabaseTransaction>;

    // Pages
    async fn insert_page(&self, page: &NewPage) -> AppResult<Page>;
    async fn get_page(&self, page: &PageRef, with_trashed: bool) -> AppResult<Option<Page>>;
    async fn list_pages(&self, with_trashed: bool) -> AppResult<Vec<Page>>;
    async fn update_page(&self, page: &Page) -> AppResult<Page>;
    async fn set_page_deleted(&self, id: PageId, at: Option<DateTime<Utc>>) -> AppResult<bool>;
    async fn delete_page(&self, id: PageId) -> AppResult<bool>;

    // Seo
    async fn upsert_seo(&self, page_id: PageId, seo: &SeoInput) -> AppResult<Seo>;
    async fn get_seo(&self, page_id: PageId) -> AppResult<Option<Seo>>;

    // Blocks
    async fn insert_block(&self, block: &NewBlock) -> AppResult<Block>;
    async fn get_block(&self, id: BlockId, with_trashed: bool) -> AppResult<Option<Block>>;
    async fn find_blocks_by_slug(&self, slug: &str, page_id: Option<PageId>) -> AppResult<Vec<Block>>;
    async fn list_blocks(&self, page_id: PageId, with_trashed: bool) -> AppResult<Vec<Block>>;
    async fn block_slug_taken(
        &self,
        page_id: PageId,
        slug: &str,
        exclude: Option<BlockId>,
    ) -> AppResult<bool>;
    async fn update_block(&self, block: &Block) -> AppResult<Block>;
    async fn set_block_deleted(&self, id: BlockId, at: Option<DateTime<Utc>>) -> AppResult<bool>;
    async fn delete_block(&self, id: BlockId) -> AppResult<bool>;

    // Fields
    async fn insert_field(&self, field: &FieldRecord) -> AppResult<Field>;
    async fn get_field(&self, id: FieldId, with_trashed: bool) -> AppResult<Option<Field>>;
    async fn list_fields(&self, block_id: BlockId, with_trashed: bool) -> AppResult<Vec<Field>>;
    async fn field_name_taken(
        &self,
        block_id: BlockId,
        name: &str,
        exclude: Option<FieldId>,
    ) -> AppResult<bool>;
    async fn max_field_order(&self, block_id: BlockId) -> AppResult<Option<i64>>;
    async fn update_field(&self, id: FieldId, field: &FieldRecord) -> AppResult<Field>;
    async fn set_field_order(&self, id: FieldId, order: i64) -> AppResult<bool>;
    async fn set_field_deleted(&self, id: FieldId, at: Option<DateTime<Utc>>) -> AppResult<bool>;
    async fn delete_field(&self, id: FieldId) -> AppResult<bool>;

    // Documents
    async fn insert_document(
        &self,
        slug: &str,
        page_id: PageId,
        page_slug: &str,
        data: &DocumentData,
    ) -> AppResult<Document>;
    async fn get_document(&self, id: DocumentId, with_trashed: bool) -> AppResult<Option<Document>>;
    async fn find_document_for_page(&self, page: &PageRef) -> AppResult<Option<Document>>;
    async fn list_documents(
        &self,
        page_id: Option<PageId>,
        with_trashed: bool,
    ) -> AppResult<Vec<Document>>;
    async fn update_document_data(&self, id: DocumentId, data: &DocumentData) -> AppResult<()>;
    async fn set_document_deleted(
        &self,
        id: DocumentId,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<bool>;
    async fn delete_document(&self, id: DocumentId) -> AppResult<bool>;

    // Media
    async fn insert_media(&self, media: &NewMedia) -> AppResult<Media>;
    async fn get_media(&self, id: MediaId) -> AppResult<Option<Media>>;
    async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>>;
    async fn delete_media(&self, id: MediaId) -> AppResult<bool>;

    // Transactional operations - Execute within existing transaction
    async fn update_document_data_tx(
        &self,
        tx: &mut DatabaseTransaction,
        id: DocumentId,
        data: &DocumentData,
    ) -> AppResult<()>;
    async fn delete_field_tx(&self, tx: &mut DatabaseTransaction, id: FieldId) -> AppResult<bool>;
}
