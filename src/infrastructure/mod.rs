// Infrastructure - persistence, caching and media lookup
pub mod cache; // LRU cache wrapper
pub mod database; // Database interface and transaction wrapper
pub mod media; // Media lookup used by the hydrator
pub mod sqlite_database; // SQLite implementation

pub use cache::Cache;
pub use database::{ContentDatabase, DatabaseTransaction, FieldRecord};
pub use media::{CachedMediaLookup, DatabaseMediaLookup, MediaLookup};
pub use sqlite_database::SqliteDatabase;
