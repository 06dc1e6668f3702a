use chrono::{DateTime, Utc};
use sd_core::error::ApiError;
use sd_core::message::{Message, MessageRole};
use sd_core::session::{Page, Session};
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::sse::{self, FrameStream};
use crate::wire;

/// One chat turn, addressed to a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub session_id: u64,
    pub message: String,
    /// `0` lets the server use the default config
    pub ai_config_id: u64,
    pub knowledge_ids: Vec<u64>,
}

impl ChatRequest {
    fn stream_query(&self) -> Vec<(String, String)> {
        vec![
            ("session_id".into(), self.session_id.to_string()),
            ("message".into(), self.message.clone()),
            ("ai_config_id".into(), self.ai_config_id.to_string()),
            ("knowledge_ids".into(), json!(self.knowledge_ids).to_string()),
        ]
    }
}

/// Result of a non-streaming chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: Option<Message>,
    pub session: Option<Session>,
    pub session_id: Option<u64>,
}

impl ApiClient {
    pub async fn list_sessions(&self, page: u32, page_size: u32) -> Result<Page<Session>, ApiError> {
        let body = self
            .get(
                "/chat/sessions",
                vec![
                    ("page".into(), page.to_string()),
                    ("page_size".into(), page_size.to_string()),
                ],
            )
            .await?;
        wire::decode_page(body, "sessions", page, page_size)
    }

    pub async fn session_messages(
        &self,
        session_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Message>, ApiError> {
        let body = self
            .get(
                &format!("/chat/sessions/{session_id}"),
                vec![
                    ("page".into(), page.to_string()),
                    ("page_size".into(), page_size.to_string()),
                ],
            )
            .await?;
        wire::decode_page(body, "messages", page, page_size)
    }

    pub async fn create_session(&self, title: &str) -> Result<Session, ApiError> {
        let body = self.post("/chat/sessions", json!({ "title": title })).await?;
        wire::decode_data(body)
    }

    pub async fn update_session(&self, session_id: u64, title: &str) -> Result<Session, ApiError> {
        let body = self
            .put(&format!("/chat/sessions/{session_id}"), json!({ "title": title }))
            .await?;
        wire::decode_data(body)
    }

    pub async fn delete_session(&self, session_id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/chat/sessions/{session_id}")).await?;
        Ok(())
    }

    pub async fn complete(&self, req: &ChatRequest) -> Result<Completion, ApiError> {
        let body = self.post("/chat/completions", json!(req)).await?;
        parse_completion(body)
    }

    /// Open the SSE stream for one chat turn.
    pub async fn stream_chat(&self, req: &ChatRequest) -> Result<FrameStream, ApiError> {
        let mut raw = self.events("/chat/stream", req.stream_query()).await?;

        let stream = async_stream::stream! {
            use tokio_stream::StreamExt;

            while let Some(item) = raw.next().await {
                match item {
                    Ok(data) => {
                        tracing::debug!(%data, "stream event");
                        yield Ok(sse::decode_frame(&data));
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn parse_completion(body: Value) -> Result<Completion, ApiError> {
    let session = match body.get("session") {
        Some(s) if !s.is_null() => Some(wire::decode::<Session>(s.clone())?),
        _ => None,
    };
    let session_id = body["session_id"]
        .as_u64()
        .or_else(|| session.as_ref().map(|s| s.id));

    let data = &body["data"];
    let message = if data.is_object() {
        let content = data["content"]
            .as_str()
            .or_else(|| data["message"].as_str())
            .unwrap_or("")
            .to_string();
        let mut message = Message::new_assistant(content);
        if let Some(id) = data["ID"].as_u64().or_else(|| data["id"].as_u64()) {
            message.id = id;
        }
        if data["role"].as_str() == Some("user") {
            message.role = MessageRole::User;
        }
        let created = data["CreatedAt"]
            .as_str()
            .or_else(|| data["created_at"].as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        if created.is_some() {
            message.created_at = created;
        }
        Some(message)
    } else {
        None
    };

    Ok(Completion {
        message,
        session,
        session_id,
    })
}
