use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;

use crate::output;

pub async fn run(app: &super::App, session: Option<u64>, stream: bool) -> Result<()> {
    println!("\x1b[1msmart-decision\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    if let Some(user) = app.auth.user() {
        println!("Logged in as \x1b[36m{}\x1b[0m", user.username);
    }
    println!("Type \x1b[33m/help\x1b[0m for commands, \x1b[33mCtrl-D\x1b[0m to exit.\n");

    let page_size = app.config.session_page_size;
    let _ = app.chat.load_sessions(1, page_size).await;
    let _ = app.chat.load_ai_configs().await;

    let session = session.or_else(|| app.chat.current_session_id());
    if session.is_some() {
        let _ = app.chat.select_session(session).await;
        for message in app.chat.messages() {
            output::print_message(&message);
        }
    }

    loop {
        eprint!("\x1b[32;1m>\x1b[0m ");
        io::stderr().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                // EOF (Ctrl-D)
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match handle_command(input, app).await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    eprintln!("\x1b[31mCommand error: {e}\x1b[0m");
                    continue;
                }
            }
        }

        if stream {
            let Ok(Some(mut handle)) = app.chat.stream_message(input).await else {
                continue;
            };
            output::render_stream(&mut handle, false, || app.chat.cancel_stream()).await?;
        } else if let Ok(Some(reply)) = app.chat.submit_message(input).await {
            println!("{}\n", reply.content);
        }
    }

    Ok(())
}

fn parse_id(arg: Option<&str>) -> Result<u64> {
    let arg = arg.ok_or_else(|| anyhow::anyhow!("missing id"))?;
    arg.parse()
        .map_err(|_| anyhow::anyhow!("not a valid id: {arg}"))
}

/// Returns false when the REPL should exit.
async fn handle_command(input: &str, app: &super::App) -> Result<bool> {
    let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
    let rest = rest.trim();
    let arg = (!rest.is_empty()).then_some(rest);

    match command {
        "/help" | "/h" => {
            println!("\x1b[1mCommands:\x1b[0m");
            println!("  /sessions [page]     List sessions");
            println!("  /new                 Start a new session");
            println!("  /switch <id>         Open a session");
            println!("  /rename <id> <title> Rename a session");
            println!("  /delete <id>         Delete a session");
            println!("  /history             Show messages of the current session");
            println!("  /configs             List AI configs");
            println!("  /use <id|default>    Choose the AI config for new messages");
            println!("  /models              List available models");
            println!("  /files [page]        List knowledge files");
            println!("  /attach <id>         Toggle a knowledge file for new messages");
            println!("  /detach              Clear attached knowledge files");
            println!("  /upload <path>       Upload a knowledge file");
            println!("  /theme               Toggle light/dark theme");
            println!("  /logout              Log out and exit");
            println!("  /exit                Exit");
            Ok(true)
        }
        "/exit" | "/quit" | "/q" => {
            println!("Goodbye!");
            Ok(false)
        }
        "/sessions" | "/s" => {
            let page = arg.map(|p| p.parse()).transpose()?.unwrap_or(1);
            let size = app.config.session_page_size;
            if let Ok(result) = app.chat.load_sessions(page, size).await {
                output::print_sessions(&result.items, app.chat.current_session_id());
                let pages = result.total.div_ceil(u64::from(size.max(1)));
                println!(
                    "\x1b[90mpage {} of {} ({} sessions)\x1b[0m",
                    result.page,
                    pages.max(1),
                    result.total
                );
            }
            Ok(true)
        }
        "/new" => {
            app.chat.select_session(None).await?;
            if app.chat.create_session().await.is_ok() {
                for message in app.chat.messages() {
                    output::print_message(&message);
                }
            }
            Ok(true)
        }
        "/switch" => {
            let id = parse_id(arg)?;
            if app.chat.select_session(Some(id)).await.is_ok() {
                for message in app.chat.messages() {
                    output::print_message(&message);
                }
            }
            Ok(true)
        }
        "/rename" => {
            let (id, title) = rest.split_once(' ').unwrap_or((rest, ""));
            let id = parse_id(Some(id))?;
            let _ = app.chat.rename_session(id, title).await;
            Ok(true)
        }
        "/delete" => {
            let id = parse_id(arg)?;
            let _ = app.chat.remove_session(id).await;
            Ok(true)
        }
        "/history" => {
            for message in app.chat.messages() {
                output::print_message(&message);
            }
            Ok(true)
        }
        "/configs" => {
            if app.chat.load_ai_configs().await.is_ok() {
                let state = app.chat.snapshot();
                let current = state.current_config().map(|c| c.id);
                for config in &state.ai_configs {
                    let marker = if Some(config.id) == current { " *" } else { "" };
                    let default = if config.is_default { " (default)" } else { "" };
                    println!(
                        "  \x1b[90m{:>4}\x1b[0m  {}{}{}  \x1b[90mtemp {} / max {}\x1b[0m",
                        config.id,
                        config,
                        default,
                        marker,
                        config.temperature,
                        config.max_tokens
                    );
                }
            }
            Ok(true)
        }
        "/use" => {
            match arg {
                Some("default") => app.chat.set_current_config(None),
                other => app.chat.set_current_config(Some(parse_id(other)?)),
            }
            match app.chat.current_config() {
                Some(config) => println!("Using {config}"),
                None => println!("Using the server default"),
            }
            Ok(true)
        }
        "/models" => {
            if let Ok(models) = app.chat.load_models().await {
                for (provider, options) in &models {
                    println!("\x1b[1m{provider}\x1b[0m");
                    for option in options {
                        println!("  {}  \x1b[90m{}\x1b[0m", option.name, option.description);
                    }
                }
            }
            Ok(true)
        }
        "/files" => {
            let page = arg.map(|p| p.parse()).transpose()?.unwrap_or(1);
            let size = app.chat.knowledge_page_size();
            if let Ok(files) = app.chat.load_knowledge_files(page, size).await {
                let selected = app.chat.selected_knowledge_ids();
                if files.items.is_empty() {
                    println!("No knowledge files.");
                }
                for file in &files.items {
                    let marker = if selected.contains(&file.id) { " [attached]" } else { "" };
                    println!(
                        "  \x1b[90m{:>4}\x1b[0m  {}  \x1b[90m{} / {}\x1b[0m{}",
                        file.id,
                        file.file_name,
                        output::format_size(file.file_size),
                        file.status,
                        marker
                    );
                }
            }
            Ok(true)
        }
        "/attach" => {
            let id = parse_id(arg)?;
            let pending = app
                .chat
                .knowledge_files()
                .into_iter()
                .find(|f| f.id == id)
                .is_some_and(|f| !f.is_ready());
            if app.chat.toggle_knowledge_file(id) {
                println!("Attached file {id}");
                if pending {
                    println!("\x1b[33mFile {id} is still being processed\x1b[0m");
                }
            } else {
                println!("Detached file {id}");
            }
            Ok(true)
        }
        "/detach" => {
            app.chat.clear_selected_knowledge();
            println!("Cleared attached files");
            Ok(true)
        }
        "/upload" => {
            let path = arg.ok_or_else(|| anyhow::anyhow!("missing path"))?;
            let _ = app.chat.upload_knowledge_file(Path::new(path)).await;
            Ok(true)
        }
        "/theme" => {
            let mode = app.theme.toggle().await?;
            println!("Theme: {mode}");
            Ok(true)
        }
        "/logout" => {
            app.chat.cancel_stream();
            app.auth.logout().await?;
            Ok(false)
        }
        _ => {
            eprintln!("Unknown command: {input}. Type /help for available commands.");
            Ok(true)
        }
    }
}
