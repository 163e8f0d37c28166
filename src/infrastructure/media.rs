// Media lookup - the collaborator the hydrator resolves stored media references through

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::core::strong_types::{MediaId, RecordId};
use crate::error::AppResult;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::database::ContentDatabase;
use crate::models::Media;

#[async_trait]
pub trait MediaLookup: Send + Sync {
    async fn get_media_by_id(&self, id: &RecordId) -> AppResult<Option<Media>>;
    async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>>;

    /// Drop anything remembered about `media`, called after it is removed
    fn invalidate(&self, _media: &Media) {}
}

/// Lookup backed by the `media` table
pub struct DatabaseMediaLookup {
    db: Arc<dyn ContentDatabase>,
}

impl DatabaseMediaLookup {
    pub fn new(db: Arc<dyn ContentDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MediaLookup for DatabaseMediaLookup {
    async fn get_media_by_id(&self, id: &RecordId) -> AppResult<Option<Media>> {
        match id.as_i64() {
            Some(id) => self.db.get_media(MediaId(id)).await,
            None => Ok(None),
        }
    }

    async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>> {
        self.db.get_media_by_url(url).await
    }
}

/// Caching decorator. Only hits are cached so a media row registered after
/// a miss becomes visible immediately.
pub struct CachedMediaLookup {
    inner: Arc<dyn MediaLookup>,
    by_id: Cache<i64, Media>,
    by_url: Cache<String, Media>,
}

impl CachedMediaLookup {
    pub fn new(inner: Arc<dyn MediaLookup>, capacity: usize) -> Self {
        Self {
            inner,
            by_id: Cache::new(capacity),
            by_url: Cache::new(capacity),
        }
    }

    fn remember(&self, media: &Media) {
        self.by_id.insert(media.id.value(), media.clone());
        self.by_url.insert(media.url.clone(), media.clone());
    }
}

#[async_trait]
impl MediaLookup for CachedMediaLookup {
    async fn get_media_by_id(&self, id: &RecordId) -> AppResult<Option<Media>> {
        if let Some(key) = id.as_i64() {
            if let Some(cached) = self.by_id.get(&key) {
                debug!("Media cache hit for id {}", key);
                return Ok(Some(cached));
            }
        }

        let found = self.inner.get_media_by_id(id).await?;
        if let Some(media) = &found {
            self.remember(media);
        }
        Ok(found)
    }

    async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>> {
        if let Some(cached) = self.by_url.get(&url.to_string()) {
            debug!("Media cache hit for url {}", url);
            return Ok(Some(cached));
        }

        let found = self.inner.get_media_by_url(url).await?;
        if let Some(media) = &found {
            self.remember(media);
        }
        Ok(found)
    }

    fn invalidate(&self, media: &Media) {
        self.by_id.remove(&media.id.value());
        self.by_url.remove(&media.url);
        self.inner.invalidate(media);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        calls: AtomicUsize,
        media: Media,
    }

    #[async_trait]
    impl MediaLookup for CountingLookup {
        async fn get_media_by_id(&self, id: &RecordId) -> AppResult<Option<Media>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((id.as_i64() == Some(self.media.id.value())).then(|| self.media.clone()))
        }

        async fn get_media_by_url(&self, url: &str) -> AppResult<Option<Media>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((url == self.media.url).then(|| self.media.clone()))
        }
    }

    fn sample_media() -> Media {
        Media {
            id: MediaId(7),
            name: Some("cover".into()),
            url: "/storage/cover.jpg".into(),
            width: Some(800),
            height: Some(600),
            placeholder: None,
            mime_type: Some("image/jpeg".into()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_lookups() {
        let inner = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
            media: sample_media(),
        });
        let cached = CachedMediaLookup::new(inner.clone(), 16);

        assert!(cached.get_media_by_id(&RecordId::Int(7)).await.unwrap().is_some());
        assert!(cached.get_media_by_id(&RecordId::Int(7)).await.unwrap().is_some());
        // The id lookup also primed the url cache
        assert!(cached
            .get_media_by_url("/storage/cover.jpg")
            .await
            .unwrap()
            .is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached_and_invalidate_drops_hits() {
        let inner = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
            media: sample_media(),
        });
        let cached = CachedMediaLookup::new(inner.clone(), 16);

        assert!(cached.get_media_by_id(&RecordId::Int(99)).await.unwrap().is_none());
        assert!(cached.get_media_by_id(&RecordId::Int(99)).await.unwrap().is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

        cached.get_media_by_id(&RecordId::Int(7)).await.unwrap();
        cached.invalidate(&sample_media());
        cached.get_media_by_id(&RecordId::Int(7)).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }
}
