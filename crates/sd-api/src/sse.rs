use sd_core::error::ApiError;
use std::pin::Pin;

/// Payload that ends a chat stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded event of a chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Text to append to the assistant message
    Delta(String),
    /// End of the turn; the server may name the session it stored it in
    Done { session_id: Option<u64> },
    /// The server gave up on the turn
    Failed(String),
    /// Nothing to apply (keep-alives, empty chunks, undecodable payloads)
    Skip,
}

pub type FrameStream =
    Pin<Box<dyn futures_core::Stream<Item = Result<StreamFrame, ApiError>> + Send>>;

/// Decode the `data:` payload of one event.
///
/// Accepts both `{"delta": {"content": "..."}}` and the server's
/// `{"content": "...", "done": false}` chunk shape; completion is either the
/// `[DONE]` sentinel or a chunk with `"done": true`.
pub fn decode_frame(data: &str) -> StreamFrame {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return StreamFrame::Done { session_id: None };
    }
    if data.is_empty() {
        return StreamFrame::Skip;
    }

    let json: serde_json::Value = match serde_json::from_str(data) {
        Ok(j) => j,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse stream payload");
            return StreamFrame::Skip;
        }
    };

    if let Some(error) = json["error"].as_str() {
        return StreamFrame::Failed(error.to_string());
    }

    let text = json["delta"]["content"]
        .as_str()
        .or_else(|| json["content"].as_str())
        .unwrap_or("");
    if !text.is_empty() {
        return StreamFrame::Delta(text.to_string());
    }

    if json["done"].as_bool() == Some(true) {
        return StreamFrame::Done {
            session_id: json["session_id"].as_u64(),
        };
    }

    StreamFrame::Skip
}
