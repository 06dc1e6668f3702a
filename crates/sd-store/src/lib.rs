//! Application state: the stores a front end reads from and drives.

mod auth;
mod chat;
mod nav;
mod theme;


pub use auth::{AuthState, AuthStore};
pub use chat::{ChatState, ChatStore, StreamEvent, StreamHandle};
pub use nav::navigate;
pub use theme::ThemeStore;

use sd_core::error::SdError;
use sd_core::notify::{Notice, Notifier};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Log a failed action and raise an error notice for it.
pub(crate) fn report(notifier: &dyn Notifier, action: &str, err: impl Into<SdError>) -> SdError {
    let err = err.into();
    tracing::warn!(error = %err, "could not {action}");
    notifier.notify(Notice::error(format!(
        "Could not {action}: {}",
        err.user_message()
    )));
    err
}

/// Lock store state, ignoring poisoning.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
