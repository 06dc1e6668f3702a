use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One conversation thread, persisted by the server.
///
/// The server serializes its ORM fields capitalized (`ID`, `CreatedAt`),
/// so both spellings are accepted on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(default, alias = "CreatedAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "UpdatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of a server-side list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
        }
    }
}
