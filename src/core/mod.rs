// Core types - strongly typed ids and references

pub mod strong_types;

pub use strong_types::{BlockId, BlockRef, DocumentId, FieldId, MediaId, PageId, PageRef, RecordId};
