// PublicProjector - the read-only view of a published page served to visitors

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::strong_types::PageRef;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentDatabase;
use crate::models::{BlockWithFields, DocumentData, Seo};
use crate::services::block_registry::BlockRegistry;
use crate::services::hydrator::DocumentHydrator;

/// Public payload for one page. `content` is `None` until a document has
/// been saved for the page.
#[derive(Debug, Clone, Serialize)]
pub struct PagePayload {
    pub title: String,
    pub slug: String,
    pub seo: Option<Seo>,
    pub content: Option<DocumentData>,
    pub structure: Vec<BlockWithFields>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PublicProjector {
    db: Arc<dyn ContentDatabase>,
    blocks: BlockRegistry,
    hydrator: DocumentHydrator,
}

impl PublicProjector {
    pub fn new(db: Arc<dyn ContentDatabase>, blocks: BlockRegistry, hydrator: DocumentHydrator) -> Self {
        Self {
            db,
            blocks,
            hydrator,
        }
    }

    /// Drafts and trashed pages answer exactly like pages that never existed.
    #[instrument(skip(self))]
    pub async fn get_public_page(&self, slug: &str) -> AppResult<PagePayload> {
        let page = self
            .db
            .get_page(&PageRef::BySlug(slug.to_string()), false)
            .await?
            .filter(|page| page.is_published())
            .ok_or_else(|| AppError::NotFound(format!("page '{}' not found", slug)))?;

        let structure = self.blocks.structure_of(page.id).await?;
        let seo = self.db.get_seo(page.id).await?;
        let content = match self.db.find_document_for_page(&page.id.into()).await? {
            Some(document) => Some(self.hydrator.hydrate(&document.data, &structure).await?),
            None => {
                debug!("Published page {} has no document yet", page.slug);
                None
            }
        };

        Ok(PagePayload {
            title: page.title,
            slug: page.slug,
            seo,
            content,
            structure,
            published_at: page.published_at,
        })
    }
}
