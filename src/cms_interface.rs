// CMS HTTP interface - admin routes for the page/block/field schema and page
// documents, plus the public page read

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    app_state::AppState,
    core::strong_types::{BlockId, BlockRef, DocumentId, FieldId, MediaId, PageId, PageRef},
    error::AppResult,
    models::{
        Block, BlockPatch, BlockWithFields, Document, Field, FieldPatch, FieldValue, Media,
        NewBlock, NewField, NewMedia, NewPage, Page, PagePatch, SavePageDocument, Seo, SeoInput,
    },
    services::{FieldDeletion, PagePayload},
};

// HTTP Request types
#[derive(Debug, Default, Deserialize)]
pub struct TrashQuery {
    #[serde(default)]
    pub with_trashed: bool,
}

#[derive(Debug, Deserialize)]
pub struct BlocksQuery {
    pub page_slug: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageScopeQuery {
    pub page_slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldsQuery {
    pub block: String,
    pub page_slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsQuery {
    pub page_id: Option<PageId>,
    #[serde(default)]
    pub with_trashed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderFieldsRequest {
    pub block_id: BlockId,
    pub field_ids: Vec<FieldId>,
}

fn page_scope(page_slug: Option<String>) -> Option<PageRef> {
    page_slug
        .filter(|slug| !slug.trim().is_empty())
        .map(PageRef::BySlug)
}

// Public

pub async fn get_public_page_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<PagePayload>> {
    Ok(Json(state.projector.get_public_page(&slug).await?))
}

// Pages

pub async fn create_page_handler(
    State(state): State<AppState>,
    Json(page): Json<NewPage>,
) -> AppResult<(StatusCode, Json<Page>)> {
    let page = state.pages.create_page(page).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn list_pages_handler(
    State(state): State<AppState>,
    Query(query): Query<TrashQuery>,
) -> AppResult<Json<Vec<Page>>> {
    Ok(Json(state.pages.list_pages(query.with_trashed).await?))
}

pub async fn get_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    Query(query): Query<TrashQuery>,
) -> AppResult<Json<Page>> {
    Ok(Json(state.pages.get_page(&id.into(), query.with_trashed).await?))
}

pub async fn update_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    Json(patch): Json<PagePatch>,
) -> AppResult<Json<Page>> {
    Ok(Json(state.pages.update_page(id, patch).await?))
}

pub async fn publish_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> AppResult<Json<Page>> {
    Ok(Json(state.pages.publish_page(id).await?))
}

pub async fn unpublish_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> AppResult<Json<Page>> {
    Ok(Json(state.pages.unpublish_page(id).await?))
}

pub async fn delete_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> AppResult<StatusCode> {
    state.pages.soft_delete_page(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> AppResult<Json<Page>> {
    Ok(Json(state.pages.restore_page(id).await?))
}

pub async fn force_delete_page_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> AppResult<StatusCode> {
    state.pages.force_delete_page(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upsert_seo_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    Json(seo): Json<SeoInput>,
) -> AppResult<Json<Seo>> {
    Ok(Json(state.pages.upsert_seo(id, seo).await?))
}

pub async fn get_seo_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> AppResult<Json<Option<Seo>>> {
    Ok(Json(state.pages.get_seo(id).await?))
}

// Blocks

pub async fn list_blocks_handler(
    State(state): State<AppState>,
    Query(query): Query<BlocksQuery>,
) -> AppResult<Json<Vec<BlockWithFields>>> {
    let page = PageRef::BySlug(query.page_slug);
    Ok(Json(state.blocks.list_blocks_for_page(&page).await?))
}

pub async fn create_block_handler(
    State(state): State<AppState>,
    Json(block): Json<NewBlock>,
) -> AppResult<(StatusCode, Json<Block>)> {
    let block = state.blocks.create_block(block).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn get_block_handler(
    State(state): State<AppState>,
    Path(id): Path<BlockId>,
    Query(query): Query<TrashQuery>,
) -> AppResult<Json<Block>> {
    Ok(Json(state.blocks.get_block(id, query.with_trashed).await?))
}

pub async fn update_block_handler(
    State(state): State<AppState>,
    Path(id): Path<BlockId>,
    Json(patch): Json<BlockPatch>,
) -> AppResult<Json<Block>> {
    Ok(Json(state.blocks.update_block(id, patch).await?))
}

pub async fn delete_block_handler(
    State(state): State<AppState>,
    Path(id): Path<BlockId>,
) -> AppResult<StatusCode> {
    state.blocks.soft_delete_block(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_block_handler(
    State(state): State<AppState>,
    Path(id): Path<BlockId>,
) -> AppResult<Json<Block>> {
    Ok(Json(state.blocks.restore_block(id).await?))
}

pub async fn force_delete_block_handler(
    State(state): State<AppState>,
    Path(id): Path<BlockId>,
) -> AppResult<StatusCode> {
    state.blocks.force_delete_block(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Fields

pub async fn get_fields_by_block_handler(
    State(state): State<AppState>,
    Path(block): Path<String>,
    Query(query): Query<PageScopeQuery>,
) -> AppResult<Json<BTreeMap<String, FieldValue>>> {
    let block = BlockRef::from(block.as_str());
    let page = page_scope(query.page_slug);
    Ok(Json(
        state
            .fields
            .get_fields_as_default_map(&block, page.as_ref())
            .await?,
    ))
}

pub async fn list_fields_handler(
    State(state): State<AppState>,
    Query(query): Query<FieldsQuery>,
) -> AppResult<Json<Vec<Field>>> {
    let block = BlockRef::from(query.block.as_str());
    let page = page_scope(query.page_slug);
    Ok(Json(
        state
            .fields
            .list_fields_by_block(&block, page.as_ref())
            .await?,
    ))
}

pub async fn create_field_handler(
    State(state): State<AppState>,
    Json(field): Json<NewField>,
) -> AppResult<(StatusCode, Json<Field>)> {
    let field = state.fields.create_field(field).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn get_field_handler(
    State(state): State<AppState>,
    Path(id): Path<FieldId>,
    Query(query): Query<TrashQuery>,
) -> AppResult<Json<Field>> {
    Ok(Json(state.fields.get_field(id, query.with_trashed).await?))
}

pub async fn update_field_handler(
    State(state): State<AppState>,
    Path(id): Path<FieldId>,
    Json(patch): Json<FieldPatch>,
) -> AppResult<Json<Field>> {
    Ok(Json(state.fields.update_field(id, patch).await?))
}

pub async fn delete_field_handler(
    State(state): State<AppState>,
    Path(id): Path<FieldId>,
) -> AppResult<Json<FieldDeletion>> {
    Ok(Json(state.fields.delete_field_and_reconcile(id).await?))
}

pub async fn soft_delete_field_handler(
    State(state): State<AppState>,
    Path(id): Path<FieldId>,
) -> AppResult<StatusCode> {
    state.fields.soft_delete_field(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_field_handler(
    State(state): State<AppState>,
    Path(id): Path<FieldId>,
) -> AppResult<Json<Field>> {
    Ok(Json(state.fields.restore_field(id).await?))
}

pub async fn force_delete_field_handler(
    State(state): State<AppState>,
    Path(id): Path<FieldId>,
) -> AppResult<StatusCode> {
    state.fields.force_delete_field(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_fields_handler(
    State(state): State<AppState>,
    Json(request): Json<ReorderFieldsRequest>,
) -> AppResult<Json<Vec<Field>>> {
    Ok(Json(
        state
            .fields
            .reorder_fields(request.block_id, &request.field_ids)
            .await?,
    ))
}

// Documents

pub async fn save_page_document_handler(
    State(state): State<AppState>,
    Json(request): Json<SavePageDocument>,
) -> AppResult<Json<Document>> {
    Ok(Json(state.documents.save_page(request).await?))
}

pub async fn list_documents_handler(
    State(state): State<AppState>,
    Query(query): Query<DocumentsQuery>,
) -> AppResult<Json<Vec<Document>>> {
    Ok(Json(
        state
            .documents
            .list_documents(query.page_id, query.with_trashed)
            .await?,
    ))
}

pub async fn delete_document_handler(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<StatusCode> {
    state.documents.soft_delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_document_handler(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<Json<Document>> {
    Ok(Json(state.documents.restore_document(id).await?))
}

pub async fn force_delete_document_handler(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<StatusCode> {
    state.documents.force_delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Media

pub async fn register_media_handler(
    State(state): State<AppState>,
    Json(media): Json<NewMedia>,
) -> AppResult<(StatusCode, Json<Media>)> {
    let media = state.media.register_media(media).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

pub async fn get_media_handler(
    State(state): State<AppState>,
    Path(id): Path<MediaId>,
) -> AppResult<Json<Media>> {
    Ok(Json(state.media.get_media(id).await?))
}

pub async fn delete_media_handler(
    State(state): State<AppState>,
    Path(id): Path<MediaId>,
) -> AppResult<StatusCode> {
    state.media.delete_media(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_cms_router(state: AppState) -> Router {
    Router::new()
        // Public read
        .route("/pages/{slug}", get(get_public_page_handler))
        // Pages
        .route("/admin/pages", post(create_page_handler).get(list_pages_handler))
        .route(
            "/admin/pages/{id}",
            get(get_page_handler)
                .patch(update_page_handler)
                .delete(delete_page_handler),
        )
        .route("/admin/pages/{id}/publish", post(publish_page_handler))
        .route("/admin/pages/{id}/unpublish", post(unpublish_page_handler))
        .route("/admin/pages/{id}/restore", post(restore_page_handler))
        .route("/admin/pages/{id}/force", delete(force_delete_page_handler))
        .route("/admin/pages/{id}/seo", put(upsert_seo_handler).get(get_seo_handler))
        // Blocks
        .route("/blocks", get(list_blocks_handler).post(create_block_handler))
        .route(
            "/blocks/{id}",
            get(get_block_handler)
                .patch(update_block_handler)
                .delete(delete_block_handler),
        )
        .route("/blocks/{id}/restore", post(restore_block_handler))
        .route("/blocks/{id}/force", delete(force_delete_block_handler))
        // Fields
        .route("/fields", get(list_fields_handler).post(create_field_handler))
        .route("/fields/by-block/{block}", get(get_fields_by_block_handler))
        .route("/fields/reorder", post(reorder_fields_handler))
        .route(
            "/fields/{id}",
            get(get_field_handler)
                .patch(update_field_handler)
                .delete(delete_field_handler),
        )
        .route("/fields/{id}/soft", delete(soft_delete_field_handler))
        .route("/fields/{id}/restore", post(restore_field_handler))
        .route("/fields/{id}/force", delete(force_delete_field_handler))
        // Documents
        .route("/documents", get(list_documents_handler))
        .route("/documents/save-page", post(save_page_document_handler))
        .route("/documents/{id}", delete(delete_document_handler))
        .route("/documents/{id}/restore", post(restore_document_handler))
        .route("/documents/{id}/force", delete(force_delete_document_handler))
        // Media
        .route("/media", post(register_media_handler))
        .route("/media/{id}", get(get_media_handler).delete(delete_media_handler))
        .with_state(state)
}
