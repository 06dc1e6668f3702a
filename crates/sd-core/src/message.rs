use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(alias = "ID")]
    pub id: u64,
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "CreatedAt")]
    pub created_at: Option<DateTime<Utc>>,
}

static LOCAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Ids for messages that exist only on the client until the server answers.
/// Millisecond timestamps, bumped so two ids in the same tick never collide.
fn next_local_id() -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut prev = LOCAL_SEQ.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LOCAL_SEQ.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

impl Message {
    pub fn new_user(content: String) -> Self {
        Self {
            id: next_local_id(),
            role: MessageRole::User,
            content,
            created_at: Some(Utc::now()),
        }
    }

    pub fn new_assistant(content: String) -> Self {
        Self {
            id: next_local_id(),
            role: MessageRole::Assistant,
            content,
            created_at: Some(Utc::now()),
        }
    }

    /// Empty assistant message that a stream fills in.
    pub fn placeholder() -> Self {
        Self::new_assistant(String::new())
    }

    pub fn append_text(&mut self, delta: &str) {
        self.content.push_str(delta);
    }
}
