// MediaLibrary - registry of uploaded media that documents reference

use std::sync::Arc;
use tracing::info;

use crate::core::strong_types::MediaId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentDatabase;
use crate::infrastructure::media::MediaLookup;
use crate::models::{Media, NewMedia};

#[derive(Clone)]
pub struct MediaLibrary {
    db: Arc<dyn ContentDatabase>,
    lookup: Arc<dyn MediaLookup>,
}

impl MediaLibrary {
    pub fn new(db: Arc<dyn ContentDatabase>, lookup: Arc<dyn MediaLookup>) -> Self {
        Self { db, lookup }
    }

    pub async fn register_media(&self, media: NewMedia) -> AppResult<Media> {
        if media.url.trim().is_empty() {
            return Err(AppError::invalid("url", "is required"));
        }
        for (attribute, value) in [("width", media.width), ("height", media.height)] {
            if value.is_some_and(|v| v <= 0) {
                return Err(AppError::invalid(attribute, "must be a positive number of pixels"));
            }
        }

        let created = self.db.insert_media(&media).await?;
        info!("Registered media {} at {}", created.id, created.url);
        Ok(created)
    }

    pub async fn get_media(&self, id: MediaId) -> AppResult<Media> {
        self.db
            .get_media(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("media #{} not found", id)))
    }

    /// Documents still pointing at the media hydrate it to `null` afterwards.
    pub async fn delete_media(&self, id: MediaId) -> AppResult<()> {
        let media = self.get_media(id).await?;
        self.db.delete_media(id).await?;
        self.lookup.invalidate(&media);
        info!("Deleted media {} ({})", id, media.url);
        Ok(())
    }
}
