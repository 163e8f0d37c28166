// BlockRegistry - page-scoped blocks and the page structure they form

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::strong_types::{BlockId, BlockRef, PageId, PageRef};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentDatabase;
use crate::models::{Block, BlockPatch, BlockWithFields, NewBlock, Page};
use crate::services::validator::validate_block_definition;

#[derive(Clone)]
pub struct BlockRegistry {
    db: Arc<dyn ContentDatabase>,
}

impl BlockRegistry {
    pub fn new(db: Arc<dyn ContentDatabase>) -> Self {
        Self { db }
    }

    async fn live_page(&self, page: &PageRef) -> AppResult<Page> {
        self.db
            .get_page(page, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", page)))
    }

    async fn ensure_slug_free(
        &self,
        page_id: PageId,
        slug: &str,
        exclude: Option<BlockId>,
    ) -> AppResult<()> {
        if self.db.block_slug_taken(page_id, slug, exclude).await? {
            return Err(AppError::Conflict(format!(
                "blocks(page_id, slug): page #{} already has a block with slug '{}'",
                page_id, slug
            )));
        }
        Ok(())
    }

    pub async fn create_block(&self, block: NewBlock) -> AppResult<Block> {
        validate_block_definition(&block.title, &block.slug, block.icon.as_deref())?;

        if self.db.get_page(&block.page_id.into(), false).await?.is_none() {
            return Err(AppError::Conflict(format!(
                "blocks.page_id: page #{} does not exist",
                block.page_id
            )));
        }
        self.ensure_slug_free(block.page_id, &block.slug, None).await?;

        let created = self.db.insert_block(&block).await?;
        info!(
            "Created block {} ({}) on page {}",
            created.slug, created.id, created.page_id
        );
        Ok(created)
    }

    pub async fn get_block(&self, id: BlockId, with_trashed: bool) -> AppResult<Block> {
        self.db
            .get_block(id, with_trashed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("block #{} not found", id)))
    }

    /// Resolve a block by id or slug. A bare slug shared by several pages
    /// picks the oldest live block unless `page` narrows it down.
    pub async fn resolve_block(&self, block: &BlockRef, page: Option<&PageRef>) -> AppResult<Block> {
        let page_id = match page {
            Some(page) => Some(self.live_page(page).await?.id),
            None => None,
        };

        let found = match block {
            BlockRef::ById(id) => self
                .db
                .get_block(*id, false)
                .await?
                .filter(|b| page_id.map_or(true, |page_id| b.page_id == page_id)),
            BlockRef::BySlug(slug) => {
                let mut candidates = self.db.find_blocks_by_slug(slug, page_id).await?;
                if candidates.len() > 1 {
                    warn!(
                        "Block slug '{}' is used on {} pages, resolving to block #{}",
                        slug,
                        candidates.len(),
                        candidates[0].id
                    );
                }
                (!candidates.is_empty()).then(|| candidates.remove(0))
            }
        };

        found.ok_or_else(|| AppError::NotFound(format!("{} not found", block)))
    }

    /// Live blocks of a page, each with its live fields in display order.
    pub async fn list_blocks_for_page(&self, page: &PageRef) -> AppResult<Vec<BlockWithFields>> {
        let page = self.live_page(page).await?;
        self.structure_of(page.id).await
    }

    pub(crate) async fn structure_of(&self, page_id: PageId) -> AppResult<Vec<BlockWithFields>> {
        let blocks = self.db.list_blocks(page_id, false).await?;
        let mut structure = Vec::with_capacity(blocks.len());
        for block in blocks {
            let fields = self.db.list_fields(block.id, false).await?;
            structure.push(BlockWithFields { block, fields });
        }
        Ok(structure)
    }

    /// Renaming a block's slug does not move its existing document subtree.
    pub async fn update_block(&self, id: BlockId, patch: BlockPatch) -> AppResult<Block> {
        let current = self.get_block(id, false).await?;
        let merged = patch.apply_to(&current);
        validate_block_definition(&merged.title, &merged.slug, merged.icon.as_deref())?;

        if merged.slug != current.slug {
            self.ensure_slug_free(merged.page_id, &merged.slug, Some(id)).await?;
            warn!(
                "Block #{} slug changed from '{}' to '{}'; values stored under the old slug are no longer addressed",
                id, current.slug, merged.slug
            );
        }
        self.db.update_block(&merged).await
    }

    pub async fn soft_delete_block(&self, id: BlockId) -> AppResult<()> {
        self.get_block(id, false).await?;
        self.db.set_block_deleted(id, Some(Utc::now())).await?;
        info!("Moved block {} to trash", id);
        Ok(())
    }

    pub async fn restore_block(&self, id: BlockId) -> AppResult<Block> {
        let block = self.get_block(id, true).await?;
        if block.deleted_at.is_some() {
            self.ensure_slug_free(block.page_id, &block.slug, Some(id)).await?;
            self.db.set_block_deleted(id, None).await?;
            info!("Restored block {}", id);
        }
        self.get_block(id, false).await
    }

    /// Removes the block and its fields. The page document keeps the block's
    /// subtree; only field deletion reconciles the document.
    pub async fn force_delete_block(&self, id: BlockId) -> AppResult<()> {
        let block = self.get_block(id, true).await?;
        self.db.delete_block(id).await?;
        info!(
            "Permanently deleted block {} ({}); document values under '{}' are retained",
            block.slug, id, block.slug
        );
        Ok(())
    }
}
