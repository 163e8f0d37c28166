pub mod block_registry;
pub mod document_store;
pub mod hydrator;
pub mod media_library;
pub mod page_service;
pub mod projector;
pub mod schema_store;
pub mod validator;

pub use block_registry::BlockRegistry;
pub use document_store::DocumentStore;
pub use hydrator::DocumentHydrator;
pub use media_library::MediaLibrary;
pub use page_service::PageService;
pub use projector::{PagePayload, PublicProjector};
pub use schema_store::{FieldDeletion, FieldSchemaStore};
