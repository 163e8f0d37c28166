use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, Field};
use crate::core::strong_types::{BlockId, PageId};

/// A page-scoped container of fields. `slug` is the top-level key of the
/// page document and is unique within its page only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub page_id: PageId,
    pub title: String,
    pub slug: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    pub title: String,
    pub slug: String,
    pub page_id: PageId,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
}

impl BlockPatch {
    /// Merge the patch onto an existing block, keeping unspecified attributes
    pub fn apply_to(&self, block: &Block) -> Block {
        let mut merged = block.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(slug) = &self.slug {
            merged.slug = slug.clone();
        }
        if let Some(icon) = &self.icon {
            merged.icon = icon.clone();
        }
        merged
    }
}

/// Block plus its live fields in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockWithFields {
    #[serde(flatten)]
    pub block: Block,
    pub fields: Vec<Field>,
}
