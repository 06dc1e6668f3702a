//! Keys persisted in [`LocalStorage`](crate::LocalStorage).

pub const TOKEN: &str = "token";
pub const USERNAME: &str = "username";
pub const THEME: &str = "theme";
pub const CHAT_SESSIONS: &str = "chatSessions";
pub const CURRENT_CHAT_SESSION_ID: &str = "currentChatSessionId";
pub const CREDENTIALS: &str = "credentials";
