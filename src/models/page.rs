use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::PageId;

/// A routable page. `published_at = None` marks a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// The slug is the page's business key and cannot be changed after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagePatch {
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seo {
    pub page_id: PageId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image: Option<String>,
}
