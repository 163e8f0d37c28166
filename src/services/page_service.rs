// PageService - page lifecycle and per-page SEO metadata

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::core::strong_types::{PageId, PageRef};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentDatabase;
use crate::models::{NewPage, Page, PagePatch, Seo, SeoInput};
use crate::services::validator::validate_page_definition;

#[derive(Clone)]
pub struct PageService {
    db: Arc<dyn ContentDatabase>,
}

impl PageService {
    pub fn new(db: Arc<dyn ContentDatabase>) -> Self {
        Self { db }
    }

    pub async fn create_page(&self, page: NewPage) -> AppResult<Page> {
        validate_page_definition(&page.title, &page.slug)?;

        // Slugs stay reserved while a page sits in the trash
        if self.db.get_page(&PageRef::BySlug(page.slug.clone()), true).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "pages.slug: a page with slug '{}' already exists",
                page.slug
            )));
        }

        let created = self.db.insert_page(&page).await?;
        info!("Created page {} ({})", created.slug, created.id);
        Ok(created)
    }

    pub async fn get_page(&self, page: &PageRef, with_trashed: bool) -> AppResult<Page> {
        self.db
            .get_page(page, with_trashed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", page)))
    }

    pub async fn list_pages(&self, with_trashed: bool) -> AppResult<Vec<Page>> {
        self.db.list_pages(with_trashed).await
    }

    pub async fn update_page(&self, id: PageId, patch: PagePatch) -> AppResult<Page> {
        let mut page = self.get_page(&id.into(), false).await?;
        if let Some(title) = patch.title {
            page.title = title;
        }
        validate_page_definition(&page.title, &page.slug)?;
        self.db.update_page(&page).await
    }

    pub async fn publish_page(&self, id: PageId) -> AppResult<Page> {
        let mut page = self.get_page(&id.into(), false).await?;
        if page.published_at.is_none() {
            page.published_at = Some(Utc::now());
            page = self.db.update_page(&page).await?;
            info!("Published page {}", page.slug);
        }
        Ok(page)
    }

    pub async fn unpublish_page(&self, id: PageId) -> AppResult<Page> {
        let mut page = self.get_page(&id.into(), false).await?;
        if page.published_at.is_some() {
            page.published_at = None;
            page = self.db.update_page(&page).await?;
            info!("Unpublished page {}", page.slug);
        }
        Ok(page)
    }

    /// Trashing a page twice is a `NotFound`; the first `deleted_at` stays.
    pub async fn soft_delete_page(&self, id: PageId) -> AppResult<()> {
        let page = self.get_page(&id.into(), false).await?;
        self.db.set_page_deleted(id, Some(Utc::now())).await?;
        info!("Moved page {} to trash", page.slug);
        Ok(())
    }

    pub async fn restore_page(&self, id: PageId) -> AppResult<Page> {
        let page = self.get_page(&id.into(), true).await?;
        if page.is_trashed() {
            self.db.set_page_deleted(id, None).await?;
            info!("Restored page {}", page.slug);
        }
        self.get_page(&id.into(), false).await
    }

    /// Permanently removes the page together with its blocks, fields, SEO
    /// record and document.
    pub async fn force_delete_page(&self, id: PageId) -> AppResult<()> {
        if !self.db.delete_page(id).await? {
            return Err(AppError::NotFound(format!("page #{} not found", id)));
        }
        info!("Permanently deleted page {}", id);
        Ok(())
    }

    pub async fn upsert_seo(&self, page_id: PageId, seo: SeoInput) -> AppResult<Seo> {
        self.get_page(&page_id.into(), false).await?;
        self.db.upsert_seo(page_id, &seo).await
    }

    pub async fn get_seo(&self, page_id: PageId) -> AppResult<Option<Seo>> {
        self.db.get_seo(page_id).await
    }
}
