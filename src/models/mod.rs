// Content model - pages, blocks, fields, documents and media

pub mod block;
pub mod document;
pub mod field;
pub mod media;
pub mod page;

pub use block::{Block, BlockPatch, BlockWithFields, NewBlock};
pub use document::{Document, DocumentData, FieldValue, MediaRef, SavePageDocument};
pub use field::{Field, FieldOption, FieldPatch, FieldType, NewField, ValidationRules};
pub use media::{Media, NewMedia};
pub use page::{NewPage, Page, PagePatch, Seo, SeoInput};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent attribute (`None`) from an explicit `null`
/// (`Some(None)`) in partial-update payloads. Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
