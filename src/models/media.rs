use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::strong_types::MediaId;

/// A stored upload as seen by the content engine. Files themselves live in
/// external storage; only the resulting url and metadata are kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub name: Option<String>,
    pub url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub placeholder: Option<String>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Media {
    /// Attributes exposed on the public read path
    pub fn public_json(&self) -> Value {
        json!({
            "id": self.id,
            "url": self.url,
            "width": self.width,
            "height": self.height,
            "placeholder": self.placeholder,
            "mime_type": self.mime_type,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedia {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}
