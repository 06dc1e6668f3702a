use anyhow::Result;
use sd_core::message::Message;
use sd_store::{StreamEvent, StreamHandle};
use serde::Serialize;

use crate::output;
use crate::OutputFormat;

#[derive(Serialize)]
struct Reply<'a> {
    content: &'a str,
    session_id: Option<u64>,
}

#[derive(Serialize)]
struct Failure {
    error: String,
}

/// Send one message and print the assistant's reply.
pub async fn run(
    app: &super::App,
    prompt: String,
    session: Option<u64>,
    format: OutputFormat,
    quiet: bool,
    stream: bool,
) -> Result<()> {
    app.chat.select_session(session).await?;

    let json = matches!(format, OutputFormat::Json);
    let mut error = None;
    let reply = if stream {
        match app.chat.stream_message(&prompt).await? {
            Some(mut handle) => {
                // Deltas go straight to stdout only in text mode
                if json {
                    drain(&mut handle, &mut error).await
                } else {
                    output::render_stream(&mut handle, quiet, || app.chat.cancel_stream()).await?
                }
            }
            None => None,
        }
    } else {
        let reply = app.chat.submit_message(&prompt).await?;
        if let (Some(message), false) = (&reply, json) {
            println!("{}", message.content);
        }
        reply
    };

    let session_id = app.chat.current_session_id();
    match (reply, json) {
        (Some(message), true) => {
            let out = Reply {
                content: &message.content,
                session_id,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        (Some(_), false) => Ok(()),
        (None, true) => {
            let out = Failure {
                error: error.unwrap_or_else(|| "no reply".to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
            std::process::exit(1);
        }
        (None, false) => anyhow::bail!("no reply"),
    }
}

async fn drain(
    handle: &mut StreamHandle,
    error: &mut Option<String>,
) -> Option<Message> {
    let mut finished = None;
    while let Some(event) = handle.events.recv().await {
        match event {
            StreamEvent::Complete { message, .. } => finished = Some(message),
            StreamEvent::Failed { error: e } => *error = Some(e),
            StreamEvent::Cancelled => *error = Some("cancelled".to_string()),
            _ => {}
        }
    }
    finished
}
