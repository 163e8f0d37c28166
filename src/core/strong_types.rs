// Strong Types - newtype ids and boundary references for pages, blocks, fields and media
// Replaces raw i64 ids so a block id can never be passed where a field id is expected

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(
    /// Primary key of a page row
    PageId
);
id_newtype!(
    /// Primary key of a block row
    BlockId
);
id_newtype!(
    /// Primary key of a field row
    FieldId
);
id_newtype!(
    /// Primary key of a document row
    DocumentId
);
id_newtype!(
    /// Primary key of a media row
    MediaId
);

/// Identifier stored inside a document for relation and media references.
/// Numeric ids serialize as JSON numbers, anything else as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Key(String),
}

impl RecordId {
    /// Numeric view of the id, accepting numeric strings like `"12"`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordId::Int(id) => Some(*id),
            RecordId::Key(key) => key.trim().parse().ok(),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(RecordId::Int),
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(match s.trim().parse() {
                Ok(id) => RecordId::Int(id),
                Err(_) => RecordId::Key(s.clone()),
            }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RecordId::Int(id) => serde_json::Value::from(*id),
            RecordId::Key(key) => serde_json::Value::from(key.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Key(key) => write!(f, "{}", key),
        }
    }
}

fn is_numeric(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

/// A page addressed either by primary key or by its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    ById(PageId),
    BySlug(String),
}

impl From<&str> for PageRef {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) if is_numeric(raw) => PageRef::ById(PageId(id)),
            _ => PageRef::BySlug(raw.to_string()),
        }
    }
}

impl FromStr for PageRef {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(raw.into())
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::ById(id) => write!(f, "page #{}", id),
            PageRef::BySlug(slug) => write!(f, "page '{}'", slug),
        }
    }
}

impl From<PageId> for PageRef {
    fn from(id: PageId) -> Self {
        PageRef::ById(id)
    }
}

/// A block addressed either by primary key or by its slug.
///
/// Block slugs are only unique within a page, so a bare slug resolves to the
/// oldest live block carrying it unless the caller scopes it to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    ById(BlockId),
    BySlug(String),
}

impl From<&str> for BlockRef {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) if is_numeric(raw) => BlockRef::ById(BlockId(id)),
            _ => BlockRef::BySlug(raw.to_string()),
        }
    }
}

impl FromStr for BlockRef {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(raw.into())
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRef::ById(id) => write!(f, "block #{}", id),
            BlockRef::BySlug(slug) => write!(f, "block '{}'", slug),
        }
    }
}

impl From<BlockId> for BlockRef {
    fn from(id: BlockId) -> Self {
        BlockRef::ById(id)
    }
}
