use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        database::ContentDatabase,
        media::{CachedMediaLookup, DatabaseMediaLookup, MediaLookup},
        sqlite_database::SqliteDatabase,
    },
    services::{
        BlockRegistry, DocumentHydrator, DocumentStore, FieldSchemaStore, MediaLibrary,
        PageService, PublicProjector,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pages: PageService,
    pub blocks: BlockRegistry,
    pub fields: FieldSchemaStore,
    pub documents: DocumentStore,
    pub media: MediaLibrary,
    pub projector: PublicProjector,
}

impl AppState {
    pub async fn new(config: &Config) -> AppResult<Self> {
        let database =
            SqliteDatabase::connect(&config.database.url, config.database.max_connections).await?;
        database.health_check().await?;
        Ok(Self::with_database(Arc::new(database), config.media.cache_capacity))
    }

    /// Wire every service over one database handle
    pub fn with_database(db: Arc<dyn ContentDatabase>, media_cache_capacity: usize) -> Self {
        let lookup: Arc<dyn MediaLookup> = Arc::new(CachedMediaLookup::new(
            Arc::new(DatabaseMediaLookup::new(db.clone())),
            media_cache_capacity,
        ));
        let blocks = BlockRegistry::new(db.clone());

        Self {
            pages: PageService::new(db.clone()),
            fields: FieldSchemaStore::new(db.clone(), blocks.clone()),
            documents: DocumentStore::new(db.clone(), blocks.clone()),
            media: MediaLibrary::new(db.clone(), lookup.clone()),
            projector: PublicProjector::new(db, blocks.clone(), DocumentHydrator::new(lookup)),
            blocks,
        }
    }
}
