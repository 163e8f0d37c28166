use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;
use std::time::Duration;

use crate::core::strong_types::{BlockId, DocumentId, FieldId, MediaId, PageId, PageRef};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{ContentDatabase, DatabaseTransaction, FieldRecord};
use crate::models::{
    Block, Document, DocumentData, Field, FieldType, Media, NewBlock, NewMedia, NewPage, Page, Seo,
    SeoInput,
};

const PAGE_COLUMNS: &str = "id, title, slug, published_at, created_at, updated_at, deleted_at";
const BLOCK_COLUMNS: &str = "id, page_id, title, slug, icon, created_at, updated_at, deleted_at";
const FIELD_COLUMNS: &str = "id, block_id, name, label, type, sort_order, options, validation, \
     default_value, is_required, has_many, relation_model, placeholder, help_text, description, \
     layout, created_at, updated_at, deleted_at";
const DOCUMENT_COLUMNS: &str =
    "id, slug, page_id, page_slug, data, created_at, updated_at, deleted_at";
const MEDIA_COLUMNS: &str =
    "id, name, url, width, height, placeholder, mime_type, created_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        published_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS seos (
        page_id INTEGER PRIMARY KEY REFERENCES pages(id) ON DELETE CASCADE,
        title TEXT,
        description TEXT,
        keywords TEXT,
        og_image TEXT,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blocks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        icon TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS blocks_page_slug_unique ON blocks(page_id, slug) WHERE deleted_at IS NULL",
    r#"
    CREATE TABLE IF NOT EXISTS fields (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        block_id INTEGER NOT NULL REFERENCES blocks(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        label TEXT NOT NULL,
        type TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0,
        options TEXT NOT NULL DEFAULT '[]',
        validation TEXT NOT NULL DEFAULT '{}',
        default_value TEXT,
        is_required INTEGER NOT NULL DEFAULT 0,
        has_many INTEGER NOT NULL DEFAULT 0,
        relation_model TEXT,
        placeholder TEXT,
        help_text TEXT,
        description TEXT,
        layout INTEGER NOT NULL DEFAULT 12,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS fields_block_name_unique ON fields(block_id, name) WHERE deleted_at IS NULL",
    "CREATE INDEX IF NOT EXISTS fields_block_order ON fields(block_id, sort_order)",
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL,
        page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
        page_slug TEXT NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS documents_page_slug_unique ON documents(page_slug) WHERE deleted_at IS NULL",
    "CREATE INDEX IF NOT EXISTS documents_page_id ON documents(page_id)",
    r#"
    CREATE TABLE IF NOT EXISTS media (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        url TEXT NOT NULL,
        width INTEGER,
        height INTEGER,
        placeholder TEXT,
        mime_type TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS media_url ON media(url)",
];

/// SQLite implementation of the content database
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to `url` and make sure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database url {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is its own database
        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to SQLite at {}: {}", url, e))
        })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Create content tables and indexes if they are missing
    pub async fn initialize(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }
}

fn page_from_row(row: &SqliteRow) -> AppResult<Page> {
    Ok(Page {
        id: PageId(row.try_get("id")?),
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn seo_from_row(row: &SqliteRow) -> AppResult<Seo> {
    Ok(Seo {
        page_id: PageId(row.try_get("page_id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        keywords: row.try_get("keywords")?,
        og_image: row.try_get("og_image")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn block_from_row(row: &SqliteRow) -> AppResult<Block> {
    Ok(Block {
        id: BlockId(row.try_get("id")?),
        page_id: PageId(row.try_get("page_id")?),
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        icon: row.try_get("icon")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn field_from_row(row: &SqliteRow) -> AppResult<Field> {
    let raw_type: String = row.try_get("type")?;
    let field_type = FieldType::from_str(&raw_type).map_err(AppError::DatabaseError)?;
    let options: String = row.try_get("options")?;
    let validation: String = row.try_get("validation")?;

    Ok(Field {
        id: FieldId(row.try_get("id")?),
        block_id: BlockId(row.try_get("block_id")?),
        name: row.try_get("name")?,
        label: row.try_get("label")?,
        field_type,
        order: row.try_get("sort_order")?,
        options: serde_json::from_str(&options)?,
        validation: serde_json::from_str(&validation)?,
        default_value: row.try_get("default_value")?,
        is_required: row.try_get("is_required")?,
        has_many: row.try_get("has_many")?,
        relation_model: row.try_get("relation_model")?,
        placeholder: row.try_get("placeholder")?,
        help_text: row.try_get("help_text")?,
        description: row.try_get("description")?,
        layout: row.try_get("layout")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn document_from_row(row: &SqliteRow) -> AppResult<Document> {
    let data: String = row.try_get("data")?;
    Ok(Document {
        id: DocumentId(row.try_get("id")?),
        slug: row.try_get("slug")?,
        page_id: PageId(row.try_get("page_id")?),
        page_slug: row.try_get("page_slug")?,
        data: serde_json::from_str(&data)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn media_from_row(row: &SqliteRow) -> AppResult<Media> {
    Ok(Media {
        id: MediaId(row.try_get("id")?),
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        placeholder: row.try_get("placeholder")?,
        mime_type: row.try_get("mime_type")?,
        created_at: row.try_get("created_at")?,
    })
}

fn live_filter(with_trashed: bool) -> &'static str {
    if with_trashed {
        ""
    } else {
        " AND deleted_at IS NULL"
    }
}

#[async_trait]
impl ContentDatabase for SqliteDatabase {
    async fn begin_transaction(&self) -> AppResult<DatabaseTransaction> {
        let tx =
            self.pool.begin().await.map_err(|e| {
                AppError::DatabaseError(format!("Failed to begin transaction: {}", e))
            })?;
        Ok(DatabaseTransaction::new(tx))
    }

    async fn insert_page(&self, page: &NewPage) -> AppResult<Page> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO pages (title, slug, published_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&page.title)
        .bind(&page.slug)
        .bind(page.published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = PageId(result.last_insert_rowid());
        self.get_page(&PageRef::ById(id), true)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Page {} vanished after insert", id)))
    }

    async fn get_page(&self, page: &PageRef, with_trashed: bool) -> AppResult<Option<Page>> {
        let row = match page {
            PageRef::ById(id) => {
                sqlx::query(&format!(
                    "SELECT {} FROM pages WHERE id = ?{}",
                    PAGE_COLUMNS,
                    live_filter(with_trashed)
                ))
                .bind(id.value())
                .fetch_optional(&self.pool)
                .await?
            }
            PageRef::BySlug(slug) => {
                sqlx::query(&format!(
                    "SELECT {} FROM pages WHERE slug = ?{}",
                    PAGE_COLUMNS,
                    live_filter(with_trashed)
                ))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        row.as_ref().map(page_from_row).transpose()
    }

    async fn list_pages(&self, with_trashed: bool) -> AppResult<Vec<Page>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pages WHERE 1 = 1{} ORDER BY id",
            PAGE_COLUMNS,
            live_filter(with_trashed)
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(page_from_row).collect()
    }

    async fn update_page(&self, page: &Page) -> AppResult<Page> {
        let result =
            sqlx::query("UPDATE pages SET title = ?, published_at = ?, updated_at = ? WHERE id = ?")
                .bind(&page.title)
                .bind(page.published_at)
                .bind(Utc::now())
                .bind(page.id.value())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Page {} not found", page.id)));
        }
        self.get_page(&PageRef::ById(page.id), true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Page {} not found", page.id)))
    }

    async fn set_page_deleted(&self, id: PageId, at: Option<DateTime<Utc>>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE pages SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_page(&self, id: PageId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_seo(&self, page_id: PageId, seo: &SeoInput) -> AppResult<Seo> {
        sqlx::query(
            r#"
            INSERT INTO seos (page_id, title, description, keywords, og_image, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                keywords = excluded.keywords,
                og_image = excluded.og_image,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(page_id.value())
        .bind(&seo.title)
        .bind(&seo.description)
        .bind(&seo.keywords)
        .bind(&seo.og_image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_seo(page_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Seo for page {} vanished after upsert", page_id)))
    }

    async fn get_seo(&self, page_id: PageId) -> AppResult<Option<Seo>> {
        let row = sqlx::query(
            "SELECT page_id, title, description, keywords, og_image, updated_at FROM seos WHERE page_id = ?",
        )
        .bind(page_id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(seo_from_row).transpose()
    }

    async fn insert_block(&self, block: &NewBlock) -> AppResult<Block> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO blocks (page_id, title, slug, icon, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(block.page_id.value())
        .bind(&block.title)
        .bind(&block.slug)
        .bind(&block.icon)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = BlockId(result.last_insert_rowid());
        self.get_block(id, true)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Block {} vanished after insert", id)))
    }

    async fn get_block(&self, id: BlockId, with_trashed: bool) -> AppResult<Option<Block>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM blocks WHERE id = ?{}",
            BLOCK_COLUMNS,
            live_filter(with_trashed)
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(block_from_row).transpose()
    }

    async fn find_blocks_by_slug(&self, slug: &str, page_id: Option<PageId>) -> AppResult<Vec<Block>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM blocks WHERE deleted_at IS NULL AND slug = ",
            BLOCK_COLUMNS
        ));
        qb.push_bind(slug);
        if let Some(page_id) = page_id {
            qb.push(" AND page_id = ");
            qb.push_bind(page_id.value());
        }
        qb.push(" ORDER BY id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(block_from_row).collect()
    }

    async fn list_blocks(&self, page_id: PageId, with_trashed: bool) -> AppResult<Vec<Block>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM blocks WHERE page_id = ?{} ORDER BY id",
            BLOCK_COLUMNS,
            live_filter(with_trashed)
        ))
        .bind(page_id.value())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(block_from_row).collect()
    }

    async fn block_slug_taken(
        &self,
        page_id: PageId,
        slug: &str,
        exclude: Option<BlockId>,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM blocks WHERE page_id = ? AND slug = ? AND deleted_at IS NULL AND id != ?",
        )
        .bind(page_id.value())
        .bind(slug)
        .bind(exclude.map_or(0, BlockId::value))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn update_block(&self, block: &Block) -> AppResult<Block> {
        let result =
            sqlx::query("UPDATE blocks SET title = ?, slug = ?, icon = ?, updated_at = ? WHERE id = ?")
                .bind(&block.title)
                .bind(&block.slug)
                .bind(&block.icon)
                .bind(Utc::now())
                .bind(block.id.value())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Block {} not found", block.id)));
        }
        self.get_block(block.id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Block {} not found", block.id)))
    }

    async fn set_block_deleted(&self, id: BlockId, at: Option<DateTime<Utc>>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE blocks SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_block(&self, id: BlockId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_field(&self, field: &FieldRecord) -> AppResult<Field> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO fields (
                block_id, name, label, type, sort_order, options, validation, default_value,
                is_required, has_many, relation_model, placeholder, help_text, description,
                layout, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(field.block_id.value())
        .bind(&field.name)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(field.order)
        .bind(serde_json::to_string(&field.options)?)
        .bind(serde_json::to_string(&field.validation)?)
        .bind(&field.default_value)
        .bind(field.is_required)
        .bind(field.has_many)
        .bind(&field.relation_model)
        .bind(&field.placeholder)
        .bind(&field.help_text)
        .bind(&field.description)
        .bind(field.layout)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = FieldId(result.last_insert_rowid());
        self.get_field(id, true)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Field {} vanished after insert", id)))
    }

    async fn get_field(&self, id: FieldId, with_trashed: bool) -> AppResult<Option<Field>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM fields WHERE id = ?{}",
            FIELD_COLUMNS,
            live_filter(with_trashed)
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(field_from_row).transpose()
    }

    async fn list_fields(&self, block_id: BlockId, with_trashed: bool) -> AppResult<Vec<Field>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM fields WHERE block_id = ?{} ORDER BY sort_order ASC, id ASC",
            FIELD_COLUMNS,
            live_filter(with_trashed)
        ))
        .bind(block_id.value())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(field_from_row).collect()
    }

    async fn field_name_taken(
        &self,
        block_id: BlockId,
        name: &str,
        exclude: Option<FieldId>,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM fields WHERE block_id = ? AND name = ? AND deleted_at IS NULL AND id != ?",
        )
        .bind(block_id.value())
        .bind(name)
        .bind(exclude.map_or(0, FieldId::value))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn max_field_order(&self, block_id: BlockId) -> AppResult<Option<i64>> {
        let row = sqlx::query(
            "SELECT MAX(sort_order) AS max_order FROM fields WHERE block_id = ? AND deleted_at IS NULL",
        )
        .bind(block_id.value())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("max_order")?)
    }

    async fn update_field(&self, id: FieldId, field: &FieldRecord) -> AppResult<Field> {
        let result = sqlx::query(
            r#"
            UPDATE fields SET
                name = ?, label = ?, type = ?, sort_order = ?, options = ?, validation = ?,
                default_value = ?, is_required = ?, has_many = ?, relation_model = ?,
                placeholder = ?, help_text = ?, description = ?, layout = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&field.name)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(field.order)
        .bind(serde_json::to_string(&field.options)?)
        .bind(serde_json::to_string(&field.validation)?)
        .bind(&field.default_value)
        .bind(field.is_required)
        .bind(field.has_many)
        .bind(&field.relation_model)
        .bind(&field.placeholder)
        .bind(&field.help_text)
        .bind(&field.description)
        .bind(field.layout)
        .bind(Utc::now())
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Field {} not found", id)));
        }
        self.get_field(id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Field {} not found", id)))
    }

    async fn set_field_order(&self, id: FieldId, order: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE fields SET sort_order = ?, updated_at = ? WHERE id = ?")
            .bind(order)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_field_deleted(&self, id: FieldId, at: Option<DateTime<Utc>>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE fields SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_field(&self, id: FieldId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM fields WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_document(
        &self,
        slug: &str,
        page_id: PageId,
        page_slug: &str,
        data: &DocumentData,
    ) -> AppResult<Document> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO documents (slug, page_id, page_slug, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(slug)
        .bind(page_id.value())
        .bind(page_slug)
        .bind(serde_json::to_string(data)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = DocumentId(result.last_insert_rowid());
        self.get_document(id, true)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Document {} vanished after insert", id)))
    }

    async fn get_document(&self, id: DocumentId, with_trashed: bool) -> AppResult<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM documents WHERE id = ?{}",
            DOCUMENT_COLUMNS,
            live_filter(with_trashed)
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn find_document_for_page(&self, page: &PageRef) -> AppResult<Option<Document>> {
        let row = match page {
            PageRef::ById(id) => {
                sqlx::query(&format!(
                    "SELECT {} FROM documents WHERE page_id = ? AND deleted_at IS NULL ORDER BY id LIMIT 1",
                    DOCUMENT_COLUMNS
                ))
                .bind(id.value())
                .fetch_optional(&self.pool)
                .await?
            }
            PageRef::BySlug(slug) => {
                sqlx::query(&format!(
                    "SELECT {} FROM documents WHERE page_slug = ? AND deleted_at IS NULL ORDER BY id LIMIT 1",
                    DOCUMENT_COLUMNS
                ))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        row.as_ref().map(document_from_row).transpose()
    }

    async fn list_documents(
        &self,
        page_id: Option<PageId>,
        with_trashed: bool,
    ) -> AppResult<Vec<Document>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM documents WHERE 1 = 1",
            DOCUMENT_COLUMNS
        ));
        if let Some(page_id) = page_id {
            qb.push(" AND page_id = ");
            qb.push_bind(page_id.value());
        }
        qb.push(live_filter(with_trashed));
        qb.push(" ORDER BY id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(document_from_row).collect()
    }

    async fn update_document_data(&self, id: DocumentId, data: &DocumentData) -> AppResult<()> {
        let result = sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(data)?)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }

    async fn set_document_deleted(
        &self,
        id: DocumentId,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<bool> {
        let result = sqlx::query("UPDATE documents SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_document(&self, id: DocumentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_media(&self, media: &NewMedia) -> AppResult<Media> {
        let result = sqlx::query(
            "INSERT INTO media (name, url, width, height, placeholder, mime_type, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&media.name)
        .bind(&media.url)
        .bind(media.width)
        .bind(media.height)
        .bind(&media.placeholder)
        .bind(&media.mime_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = MediaId(result.last_insert_rowid());
        self.get_media(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Media {} vanished after insert", id)))
    }

    async fn get_media(&self, id: MediaId) -> AppResult<Option<Media>> {
        let row = sqlx::query(&format!("SELECT {} FROM media WHERE id = ?", MEDIA_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(media_from_row).transpose()
    }

    async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM media WHERE url = ? ORDER BY id LIMIT 1",
            MEDIA_COLUMNS
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(media_from_row).transpose()
    }

    async fn delete_media(&self, id: MediaId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_document_data_tx(
        &self,
        tx: &mut DatabaseTransaction,
        id: DocumentId,
        data: &DocumentData,
    ) -> AppResult<()> {
        let sqlite_tx = tx.as_sqlite_mut();

        let result = sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(data)?)
            .bind(Utc::now())
            .bind(id.value())
            .execute(&mut **sqlite_tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to update document {} in transaction: {}",
                    id, e
                ))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }

    async fn delete_field_tx(&self, tx: &mut DatabaseTransaction, id: FieldId) -> AppResult<bool> {
        let sqlite_tx = tx.as_sqlite_mut();

        let result = sqlx::query("DELETE FROM fields WHERE id = ?")
            .bind(id.value())
            .execute(&mut **sqlite_tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete field {} in transaction: {}", id, e))
            })?;
        Ok(result.rows_affected() > 0)
    }
}
