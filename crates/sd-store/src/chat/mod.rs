mod completion;
mod config;
mod knowledge;
mod session;
mod stream;

pub use stream::{StreamEvent, StreamHandle};

use sd_api::ApiClient;
use sd_core::config::AppConfig;
use sd_core::knowledge::KnowledgeFile;
use sd_core::message::Message;
use sd_core::model::{resolve_config, AiConfig, ModelCatalog};
use sd_core::notify::Notifier;
use sd_core::session::Session;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Everything the chat screen renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub sessions: Vec<Session>,
    pub current_session_id: Option<u64>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub streaming: bool,
    pub total_sessions: u64,
    pub current_page: u32,
    pub page_size: u32,

    pub ai_configs: Vec<AiConfig>,
    /// `None` lets the server pick its default config
    pub current_config_id: Option<u64>,
    pub models: ModelCatalog,

    pub knowledge_files: Vec<KnowledgeFile>,
    pub total_knowledge_files: u64,
    pub selected_knowledge_ids: Vec<u64>,
}

impl ChatState {
    pub fn current_session(&self) -> Option<&Session> {
        let id = self.current_session_id?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// The chosen config, else the default one.
    pub fn current_config(&self) -> Option<&AiConfig> {
        resolve_config(&self.ai_configs, self.current_config_id)
    }
}

struct ActiveStream {
    generation: u64,
    cancel: CancellationToken,
    /// Id of the assistant placeholder this stream fills
    placeholder_id: u64,
}

#[derive(Default)]
struct Shared {
    state: ChatState,
    active: Option<ActiveStream>,
    generation: u64,
}

struct Settings {
    session_page_size: u32,
    message_page_size: u32,
    knowledge_page_size: u32,
    default_session_title: String,
    greeting: String,
}

struct Inner {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    settings: Settings,
    shared: Mutex<Shared>,
}

/// Chat sessions, messages, the active stream, AI configs and knowledge
/// files. Clones share one state.
#[derive(Clone)]
pub struct ChatStore {
    inner: Arc<Inner>,
}

impl ChatStore {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, config: &AppConfig) -> Self {
        let shared = Shared {
            state: ChatState {
                current_page: 1,
                page_size: config.session_page_size,
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                api,
                notifier,
                settings: Settings {
                    session_page_size: config.session_page_size,
                    message_page_size: config.message_page_size,
                    knowledge_page_size: config.knowledge_page_size,
                    default_session_title: config.default_session_title.clone(),
                    greeting: config.greeting.clone(),
                },
                shared: Mutex::new(shared),
            }),
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        crate::lock(&self.inner.shared)
    }

    fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    pub fn snapshot(&self) -> ChatState {
        self.shared().state.clone()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.shared().state.sessions.clone()
    }

    pub fn current_session_id(&self) -> Option<u64> {
        self.shared().state.current_session_id
    }

    pub fn current_session(&self) -> Option<Session> {
        self.shared().state.current_session().cloned()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.shared().state.messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared().state.loading
    }

    pub fn is_streaming(&self) -> bool {
        self.shared().state.streaming
    }

    pub fn total_sessions(&self) -> u64 {
        self.shared().state.total_sessions
    }

    /// `(current page, page size)` of the session list.
    pub fn page_info(&self) -> (u32, u32) {
        let shared = self.shared();
        (shared.state.current_page, shared.state.page_size)
    }

    pub fn session_page_size(&self) -> u32 {
        self.inner.settings.session_page_size
    }

    pub fn knowledge_page_size(&self) -> u32 {
        self.inner.settings.knowledge_page_size
    }
}
