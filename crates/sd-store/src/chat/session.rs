use sd_core::error::SdError;
use sd_core::message::Message;
use sd_core::notify::Notice;
use sd_core::session::{Page, Session};
use sd_storage::keys;

use super::ChatStore;
use crate::report;

impl ChatStore {
    pub async fn load_sessions(&self, page: u32, page_size: u32) -> Result<Page<Session>, SdError> {
        let page = match self.inner.api.list_sessions(page, page_size).await {
            Ok(page) => page,
            Err(e) => return Err(report(self.notifier(), "load sessions", e)),
        };
        tracing::debug!(count = page.items.len(), total = page.total, "sessions loaded");

        {
            let mut shared = self.shared();
            shared.state.sessions = page.items.clone();
            shared.state.total_sessions = page.total;
            shared.state.current_page = page.page;
            shared.state.page_size = page.page_size;
        }
        self.persist_sessions().await;
        Ok(page)
    }

    /// Fetch the first page of a session's messages and make it current.
    /// On failure the message list is left empty.
    pub async fn load_messages(&self, session_id: u64) -> Result<(), SdError> {
        {
            let mut shared = self.shared();
            shared.state.loading = true;
            shared.state.current_session_id = Some(session_id);
        }
        self.persist_current(Some(session_id)).await;

        let result = self
            .inner
            .api
            .session_messages(session_id, 1, self.inner.settings.message_page_size)
            .await;

        let mut shared = self.shared();
        shared.state.loading = false;
        // Another session was picked while this one loaded
        if shared.state.current_session_id != Some(session_id) {
            return Ok(());
        }
        match result {
            Ok(page) => {
                shared.state.messages = page.items;
                Ok(())
            }
            Err(e) => {
                shared.state.messages.clear();
                drop(shared);
                Err(report(self.notifier(), "load messages", e))
            }
        }
    }

    /// Switch sessions. Any active stream is cancelled and the message list
    /// cleared; `None` leaves no session current without asking the server.
    pub async fn select_session(&self, session_id: Option<u64>) -> Result<(), SdError> {
        self.cancel_stream();
        {
            let mut shared = self.shared();
            shared.state.messages.clear();
            if session_id.is_none() {
                shared.state.current_session_id = None;
            }
        }

        match session_id {
            None => {
                self.persist_current(None).await;
                Ok(())
            }
            Some(id) => self.load_messages(id).await,
        }
    }

    /// Create a session on the server and open it with a greeting.
    pub async fn create_session(&self) -> Result<Session, SdError> {
        let session = match self
            .inner
            .api
            .create_session(&self.inner.settings.default_session_title)
            .await
        {
            Ok(session) => session,
            Err(e) => return Err(report(self.notifier(), "create session", e)),
        };
        tracing::info!(session_id = session.id, "session created");

        {
            let mut shared = self.shared();
            shared.state.sessions.insert(0, session.clone());
            shared.state.total_sessions += 1;
            shared.state.current_session_id = Some(session.id);
            shared.state.messages = vec![Message::new_assistant(
                self.inner.settings.greeting.clone(),
            )];
        }
        self.persist_sessions().await;
        self.persist_current(Some(session.id)).await;
        Ok(session)
    }

    pub async fn rename_session(&self, session_id: u64, title: &str) -> Result<Session, SdError> {
        let title = title.trim();
        if title.is_empty() {
            self.notifier()
                .notify(Notice::warning("Session title cannot be empty"));
            return Err(SdError::InvalidInput("empty session title".into()));
        }

        let session = match self.inner.api.update_session(session_id, title).await {
            Ok(session) => session,
            Err(e) => return Err(report(self.notifier(), "rename session", e)),
        };

        {
            let mut shared = self.shared();
            if let Some(slot) = shared
                .state
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
            {
                *slot = session.clone();
            }
        }
        self.persist_sessions().await;
        self.notifier().notify(Notice::success("Session renamed"));
        Ok(session)
    }

    pub async fn remove_session(&self, session_id: u64) -> Result<(), SdError> {
        if let Err(e) = self.inner.api.delete_session(session_id).await {
            return Err(report(self.notifier(), "delete session", e));
        }
        tracing::info!(session_id, "session deleted");

        let was_current = self.current_session_id() == Some(session_id);
        if was_current {
            self.cancel_stream();
        }
        {
            let mut shared = self.shared();
            let before = shared.state.sessions.len();
            shared.state.sessions.retain(|s| s.id != session_id);
            if shared.state.sessions.len() < before {
                shared.state.total_sessions = shared.state.total_sessions.saturating_sub(1);
            }
            if was_current {
                shared.state.current_session_id = None;
                shared.state.messages.clear();
            }
        }
        self.persist_sessions().await;
        if was_current {
            self.persist_current(None).await;
        }
        self.notifier().notify(Notice::success("Session deleted"));
        Ok(())
    }

    /// Rehydrate the cached session list and current session id.
    pub async fn restore(&self) -> Result<(), SdError> {
        let storage = self.inner.api.storage();
        let sessions: Option<Vec<Session>> = storage.get_json(keys::CHAT_SESSIONS).await?;
        let current = storage
            .get(keys::CURRENT_CHAT_SESSION_ID)
            .await?
            .and_then(|id| id.parse::<u64>().ok());

        let mut shared = self.shared();
        if let Some(sessions) = sessions {
            shared.state.total_sessions = shared.state.total_sessions.max(sessions.len() as u64);
            shared.state.sessions = sessions;
        }
        shared.state.current_session_id = current;
        tracing::debug!(
            sessions = shared.state.sessions.len(),
            current = ?current,
            "chat state restored"
        );
        Ok(())
    }

    async fn persist_sessions(&self) {
        let sessions = self.sessions();
        if let Err(e) = self
            .inner
            .api
            .storage()
            .set_json(keys::CHAT_SESSIONS, &sessions)
            .await
        {
            tracing::warn!(error = %e, "could not cache session list");
        }
    }

    pub(super) async fn persist_current(&self, session_id: Option<u64>) {
        let storage = self.inner.api.storage();
        let result = match session_id {
            Some(id) => storage.set(keys::CURRENT_CHAT_SESSION_ID, &id.to_string()).await,
            None => storage.remove(keys::CURRENT_CHAT_SESSION_ID).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not save current session");
        }
    }
}
