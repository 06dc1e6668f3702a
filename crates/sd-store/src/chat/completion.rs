use sd_api::ChatRequest;
use sd_core::error::SdError;
use sd_core::message::Message;

use super::ChatStore;
use crate::report;

impl ChatStore {
    /// Send `text` without streaming and append the full reply.
    /// Blank text is ignored.
    pub async fn submit_message(&self, text: &str) -> Result<Option<Message>, SdError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let session_id = match self.current_session_id() {
            Some(id) => id,
            None => self.create_session().await?.id,
        };

        let request = {
            let mut shared = self.shared();
            shared.state.messages.push(Message::new_user(text.to_string()));
            shared.state.loading = true;
            ChatRequest {
                session_id,
                message: text.to_string(),
                ai_config_id: shared.state.current_config_id.unwrap_or(0),
                knowledge_ids: shared.state.selected_knowledge_ids.clone(),
            }
        };

        let result = self.inner.api.complete(&request).await;
        self.shared().state.loading = false;

        let completion = match result {
            Ok(completion) => completion,
            Err(e) => return Err(report(self.notifier(), "send message", e)),
        };

        // The server may answer in a different session than the one asked for
        let reported = completion.session_id.unwrap_or(session_id);
        let mut unknown_session = false;
        {
            let mut shared = self.shared();
            if let Some(message) = &completion.message {
                shared.state.messages.push(message.clone());
            }
            if reported != session_id && shared.state.current_session_id == Some(session_id) {
                shared.state.current_session_id = Some(reported);
            }
            if let Some(session) = &completion.session {
                match shared
                    .state
                    .sessions
                    .iter_mut()
                    .find(|s| s.id == reported)
                {
                    Some(slot) => *slot = session.clone(),
                    None => unknown_session = true,
                }
            }
        }

        if reported != session_id {
            tracing::debug!(session_id, reported, "reply landed in another session");
            self.persist_current(Some(reported)).await;
        }
        if unknown_session {
            let (page, page_size) = self.page_info();
            let _ = self.load_sessions(page, page_size).await;
        }
        Ok(completion.message)
    }
}
