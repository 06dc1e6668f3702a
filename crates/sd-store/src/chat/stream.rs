use sd_api::{ChatRequest, StreamFrame};
use sd_core::error::SdError;
use sd_core::message::Message;
use sd_core::notify::Notice;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{ActiveStream, ChatStore};

/// What happened to a stream, in order. Ends with exactly one of
/// `Complete`, `Failed` or `Cancelled`; a reader that stops draining may
/// miss the final `Cancelled`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Started { session_id: u64 },
    Delta { text: String },
    Complete {
        message: Message,
        session_id: Option<u64>,
    },
    Failed { error: String },
    Cancelled,
}

/// Handle to a running stream. Cancelling the token or aborting the task
/// returns the store to idle, same as [`ChatStore::cancel_stream`].
pub struct StreamHandle {
    pub events: mpsc::Receiver<StreamEvent>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

/// Releases the stream claim when the task ends, however it ends.
struct StreamGuard {
    store: ChatStore,
    generation: u64,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.store.release(self.generation);
    }
}

/// Deliver an event unless the reader is lagging and the stream has been
/// cancelled. False only in the latter case.
async fn emit(
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = tx.send(event) => true,
        _ = cancel.cancelled() => false,
    }
}

enum Outcome {
    Done(Option<u64>),
    Failed(String),
    Cancelled,
}

impl ChatStore {
    /// Send `text` and stream the reply into a placeholder message.
    ///
    /// Returns `Ok(None)` without doing anything when `text` is blank or a
    /// stream is already running. Creates a session first if none is
    /// current.
    pub async fn stream_message(&self, text: &str) -> Result<Option<StreamHandle>, SdError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        // Claim the stream before any await so a concurrent first message
        // cannot create a second session
        let generation = {
            let mut shared = self.shared();
            if shared.state.streaming {
                tracing::debug!("stream already active, ignoring message");
                return Ok(None);
            }
            shared.state.streaming = true;
            shared.generation += 1;
            shared.generation
        };
        let guard = StreamGuard {
            store: self.clone(),
            generation,
        };

        let session_id = match self.current_session_id() {
            Some(id) => id,
            None => self.create_session().await?.id,
        };

        let cancel = CancellationToken::new();
        let request = {
            let mut shared = self.shared();
            // Cancelled while the session was being created
            if shared.generation != generation || !shared.state.streaming {
                return Ok(None);
            }

            let placeholder = Message::placeholder();
            let placeholder_id = placeholder.id;
            shared.state.messages.push(Message::new_user(text.to_string()));
            shared.state.messages.push(placeholder);
            shared.active = Some(ActiveStream {
                generation,
                cancel: cancel.clone(),
                placeholder_id,
            });

            ChatRequest {
                session_id,
                message: text.to_string(),
                ai_config_id: shared.state.current_config_id.unwrap_or(0),
                knowledge_ids: shared.state.selected_knowledge_ids.clone(),
            }
        };
        tracing::info!(session_id, generation, "stream started");

        let (tx, rx) = mpsc::channel(256);
        let store = self.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            store.run_stream(generation, request, tx, task_cancel).await;
        });

        Ok(Some(StreamHandle {
            events: rx,
            cancel,
            task,
        }))
    }

    /// Stop the active stream, keeping whatever text already arrived.
    /// Returns whether a stream was running.
    pub fn cancel_stream(&self) -> bool {
        let active = {
            let mut shared = self.shared();
            shared.state.streaming = false;
            shared.active.take()
        };
        match active {
            Some(active) => {
                active.cancel.cancel();
                tracing::info!(generation = active.generation, "stream cancelled");
                true
            }
            None => false,
        }
    }

    async fn run_stream(
        self,
        generation: u64,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) {
        emit(
            &tx,
            &cancel,
            StreamEvent::Started {
                session_id: request.session_id,
            },
        )
        .await;

        let outcome = self.consume(generation, &request, &tx, &cancel).await;

        match outcome {
            Outcome::Done(session_id) => {
                let Some(message) = self.finish(generation) else {
                    emit(&tx, &cancel, StreamEvent::Cancelled).await;
                    return;
                };
                tracing::info!(generation, "stream finished");

                let (page, page_size) = self.page_info();
                // Failures are already reported by load_sessions
                let _ = self.load_sessions(page, page_size).await;

                let _ = tx
                    .send(StreamEvent::Complete {
                        message,
                        session_id,
                    })
                    .await;
            }
            Outcome::Failed(error) => {
                if self.finish(generation).is_none() {
                    emit(&tx, &cancel, StreamEvent::Cancelled).await;
                    return;
                }
                tracing::warn!(generation, %error, "stream failed");
                self.notifier()
                    .notify(Notice::error(format!("Chat connection interrupted: {error}")));
                let _ = tx.send(StreamEvent::Failed { error }).await;
            }
            Outcome::Cancelled => {
                if self.finish(generation).is_some() {
                    tracing::info!(generation, "stream cancelled by its handle");
                }
                emit(&tx, &cancel, StreamEvent::Cancelled).await;
            }
        }
    }

    /// Read frames until the stream ends. The connection is dropped on
    /// return.
    async fn consume(
        &self,
        generation: u64,
        request: &ChatRequest,
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Outcome {
        let opened = tokio::select! {
            _ = cancel.cancelled() => return Outcome::Cancelled,
            opened = self.inner.api.stream_chat(request) => opened,
        };
        let mut frames = match opened {
            Ok(frames) => frames,
            Err(e) => return Outcome::Failed(e.user_message()),
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Outcome::Cancelled,
                frame = frames.next() => {
                    match frame {
                        Some(Ok(StreamFrame::Delta(text))) => {
                            if !self.apply_delta(generation, &text) {
                                return Outcome::Cancelled;
                            }
                            if !emit(tx, cancel, StreamEvent::Delta { text }).await {
                                return Outcome::Cancelled;
                            }
                        }
                        Some(Ok(StreamFrame::Skip)) => {}
                        Some(Ok(StreamFrame::Done { session_id })) => return Outcome::Done(session_id),
                        Some(Ok(StreamFrame::Failed(error))) => return Outcome::Failed(error),
                        Some(Err(e)) => return Outcome::Failed(e.user_message()),
                        None => {
                            tracing::debug!(generation, "stream closed without end marker");
                            return Outcome::Done(None);
                        }
                    }
                }
            }
        }
    }

    /// Append to this stream's placeholder. False once the stream has been
    /// cancelled or superseded.
    fn apply_delta(&self, generation: u64, text: &str) -> bool {
        let mut shared = self.shared();
        let placeholder_id = match &shared.active {
            Some(active) if active.generation == generation => active.placeholder_id,
            _ => return false,
        };
        if let Some(message) = shared
            .state
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.id == placeholder_id)
        {
            message.append_text(text);
        }
        true
    }

    /// End this stream if it is still the active one, returning its
    /// assistant message.
    fn finish(&self, generation: u64) -> Option<Message> {
        let mut shared = self.shared();
        let active = match shared.active.take() {
            Some(active) if active.generation == generation => active,
            other => {
                shared.active = other;
                return None;
            }
        };
        shared.state.streaming = false;
        let message = shared
            .state
            .messages
            .iter()
            .rev()
            .find(|m| m.id == active.placeholder_id)
            .cloned()
            .unwrap_or_else(Message::placeholder);
        Some(message)
    }

    /// Drop the claim of stream `generation` unless a newer stream took over.
    fn release(&self, generation: u64) {
        let mut shared = self.shared();
        if shared.generation == generation {
            shared.active = None;
            shared.state.streaming = false;
        }
    }
}
