use anyhow::Result;
use sd_core::message::{Message, MessageRole};
use sd_core::session::Session;
use sd_store::{StreamEvent, StreamHandle};
use std::io::{self, Write};

/// Print a stream as it arrives. Ctrl-C cancels it through `cancel`.
/// Returns the finished assistant message, if the stream completed.
pub async fn render_stream(
    handle: &mut StreamHandle,
    quiet: bool,
    cancel: impl Fn() -> bool,
) -> Result<Option<Message>> {
    let mut first_content = true;
    let mut finished = None;

    loop {
        let event = tokio::select! {
            event = handle.events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                if cancel() {
                    eprint!("\n\x1b[33m[cancelled]\x1b[0m");
                }
                continue;
            }
        };
        let Some(event) = event else { break };

        match event {
            StreamEvent::Started { .. } => {
                if !quiet {
                    eprint!("\x1b[90mThinking...\x1b[0m");
                    io::stderr().flush().ok();
                }
            }
            StreamEvent::Delta { text } => {
                if first_content {
                    // Clear "Thinking..."
                    if !quiet {
                        eprint!("\r\x1b[K");
                    }
                    first_content = false;
                }
                print!("{text}");
                io::stdout().flush().ok();
            }
            StreamEvent::Complete { message, .. } => {
                if first_content && !quiet {
                    eprint!("\r\x1b[K");
                }
                finished = Some(message);
            }
            StreamEvent::Failed { .. } => {
                // The notifier already printed the error
                if first_content && !quiet {
                    eprint!("\r\x1b[K");
                }
            }
            StreamEvent::Cancelled => {}
        }
    }

    println!();
    Ok(finished)
}

pub fn print_message(message: &Message) {
    match message.role {
        MessageRole::User => println!("\x1b[32;1myou>\x1b[0m {}", message.content),
        MessageRole::Assistant => println!("\x1b[36;1mai>\x1b[0m {}", message.content),
    }
}

pub fn print_sessions(sessions: &[Session], current: Option<u64>) {
    if sessions.is_empty() {
        println!("No sessions.");
        return;
    }
    for s in sessions {
        let marker = if Some(s.id) == current { " *" } else { "" };
        let updated = s
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  \x1b[90m{:>6}\x1b[0m  {}{}  \x1b[90m{}\x1b[0m",
            s.id, s.title, marker, updated
        );
        if !s.last_message.is_empty() {
            println!("          \x1b[90m{}\x1b[0m", preview(&s.last_message, 60));
        }
    }
}

/// First `max` characters of `text` on one line.
pub fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

pub fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
