use sd_core::notify::{Notice, NoticeLevel, Notifier};

/// Prints notices on stderr.
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success if !self.quiet => {
                eprintln!("\x1b[32m\u{2713}\x1b[0m {}", notice.message)
            }
            NoticeLevel::Info if !self.quiet => eprintln!("\x1b[36m{}\x1b[0m", notice.message),
            NoticeLevel::Warning => eprintln!("\x1b[33m{}\x1b[0m", notice.message),
            NoticeLevel::Error => eprintln!("\x1b[31;1m[error]\x1b[0m {}", notice.message),
            _ => {}
        }
        tracing::debug!(level = ?notice.level, message = %notice.message, "notice");
    }
}
