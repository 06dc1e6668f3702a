use anyhow::Result;
use clap::Subcommand;
use std::io::{self, Write};
use std::path::PathBuf;

use sd_core::model::{AiConfigPatch, NewAiConfig};
use sd_core::route::Route;
use sd_core::user::{LoginRequest, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest};

use crate::output;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the token locally
    Login {
        /// Defaults to the remembered username
        username: Option<String>,
        #[arg(long, env = "SMART_DECISION_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Remember the username for the next login
        #[arg(long)]
        remember: bool,
    },
    /// Create an account (request a code with `send-code` first)
    Register {
        username: String,
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long, env = "SMART_DECISION_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Email a verification code
    SendCode { email: String },
    /// Check a verification code
    VerifyCode { email: String, code: String },
    /// Set a new password using an emailed code
    ResetPassword {
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long, env = "SMART_DECISION_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Update username, email or password
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, requires = "new_password")]
        current_password: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
    },
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List chat sessions
    Sessions {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Rename a session
    Rename { id: u64, title: String },
    /// Delete a session
    Delete { id: u64 },
    /// Manage AI configurations
    #[command(subcommand)]
    Configs(ConfigCommand),
    /// Manage knowledge files
    #[command(subcommand)]
    Files(FileCommand),
    /// Show or toggle the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    List,
    /// Show the server's default configuration
    Default,
    Create {
        provider: String,
        model: String,
        #[arg(long, default_value_t = 0.7)]
        temperature: f64,
        #[arg(long, default_value_t = 2048)]
        max_tokens: u32,
        #[arg(long)]
        default: bool,
    },
    Update {
        id: u64,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        default: bool,
    },
    Delete { id: u64 },
    /// List models per provider
    Models,
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    Show { id: u64 },
    Upload { path: PathBuf },
    Delete { id: u64 },
}

/// Read a secret from stdin when it was not given on the command line.
fn password(given: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("{prompt}: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        anyhow::bail!("password is required");
    }
    Ok(line)
}

async fn require_login(app: &super::App, route: Route) -> Result<()> {
    if !app.go(route.path(), route).await {
        anyhow::bail!("Not logged in. Run `smart-decision login <username>` first.");
    }
    Ok(())
}

pub async fn run(app: &super::App, command: Command) -> Result<()> {
    match command {
        Command::Login {
            username,
            password: given,
            remember,
        } => {
            let username = match username {
                Some(username) => username,
                None => match app.auth.remembered_login().await {
                    Some(remembered) => remembered.username,
                    None => anyhow::bail!("username is required"),
                },
            };
            let password = password(given, "Password")?;
            let user = app
                .auth
                .login(LoginRequest { username, password }, remember)
                .await?;
            println!("Logged in as {}", user.username);
        }
        Command::Register {
            username,
            email,
            code,
            password: given,
        } => {
            let password = password(given, "Password")?;
            app.auth
                .register(RegisterRequest {
                    username,
                    email,
                    password,
                    verification_code: code,
                })
                .await?;
        }
        Command::SendCode { email } => app.auth.send_verification_code(&email).await?,
        Command::VerifyCode { email, code } => {
            app.auth.verify_code(&email, &code).await?;
            println!("Code is valid");
        }
        Command::ResetPassword {
            email,
            code,
            password: given,
        } => {
            let new_password = password(given, "New password")?;
            app.auth
                .reset_password(ResetPasswordRequest {
                    email,
                    code,
                    new_password,
                })
                .await?;
        }
        Command::Profile {
            username,
            email,
            current_password,
            new_password,
        } => {
            require_login(app, Route::Profile).await?;
            let current = app.auth.user().map(|u| u.username).unwrap_or_default();
            let profile = app
                .auth
                .update_profile(UpdateProfileRequest {
                    username: username.unwrap_or(current),
                    email,
                    current_password,
                    new_password,
                })
                .await?;
            println!("{} <{}>", profile.username, profile.email);
        }
        Command::Logout => app.auth.logout().await?,
        Command::Whoami => match app.auth.user() {
            Some(user) if app.auth.is_authenticated() => {
                if user.email.is_empty() {
                    println!("{}", user.username);
                } else {
                    println!("{} <{}>", user.username, user.email);
                }
            }
            _ => println!("Not logged in"),
        },
        Command::Sessions { page, page_size } => {
            require_login(app, Route::Chat).await?;
            let size = page_size.unwrap_or(app.config.session_page_size);
            let result = app.chat.load_sessions(page, size).await?;
            output::print_sessions(&result.items, app.chat.current_session_id());
            println!(
                "\x1b[90mpage {} ({} of {} sessions)\x1b[0m",
                result.page,
                result.items.len(),
                app.chat.total_sessions()
            );
        }
        Command::Rename { id, title } => {
            require_login(app, Route::Chat).await?;
            let session = app.chat.rename_session(id, &title).await?;
            println!("{} {}", session.id, session.title);
        }
        Command::Delete { id } => {
            require_login(app, Route::Chat).await?;
            app.chat.remove_session(id).await?;
        }
        Command::Configs(command) => {
            require_login(app, Route::Settings).await?;
            run_config(app, command).await?;
        }
        Command::Files(command) => {
            require_login(app, Route::Chat).await?;
            run_files(app, command).await?;
        }
        Command::Theme { toggle } => {
            let mode = if toggle {
                app.theme.toggle().await?
            } else {
                app.theme.mode()
            };
            println!("{mode}");
            for (name, value) in app.theme.css_variables() {
                println!("  \x1b[90m{name}\x1b[0m {value}");
            }
        }
    }
    Ok(())
}

async fn run_config(app: &super::App, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List => {
            let configs = app.chat.load_ai_configs().await?;
            if configs.is_empty() {
                println!("No AI configs.");
            }
            for config in &configs {
                let default = if config.is_default { " (default)" } else { "" };
                println!(
                    "  \x1b[90m{:>4}\x1b[0m  {}{}  \x1b[90mtemp {} / max {}\x1b[0m",
                    config.id, config, default, config.temperature, config.max_tokens
                );
            }
        }
        ConfigCommand::Default => {
            let config = app.chat.load_default_ai_config().await?;
            println!("{} {}", config.id, config);
        }
        ConfigCommand::Create {
            provider,
            model,
            temperature,
            max_tokens,
            default,
        } => {
            let config = app
                .chat
                .create_ai_config(NewAiConfig {
                    model_name: model,
                    temperature,
                    max_tokens,
                    provider,
                    is_default: default,
                })
                .await?;
            println!("{} {}", config.id, config);
        }
        ConfigCommand::Update {
            id,
            provider,
            model,
            temperature,
            max_tokens,
            default,
        } => {
            let patch = AiConfigPatch {
                model_name: model,
                temperature,
                max_tokens,
                provider,
                is_default: default.then_some(true),
            };
            let config = app.chat.update_ai_config(id, patch).await?;
            println!("{} {}", config.id, config);
        }
        ConfigCommand::Delete { id } => app.chat.delete_ai_config(id).await?,
        ConfigCommand::Models => {
            for (provider, options) in &app.chat.load_models().await? {
                println!("\x1b[1m{provider}\x1b[0m");
                for option in options {
                    println!("  {}  \x1b[90m{}\x1b[0m", option.name, option.description);
                }
            }
        }
    }
    Ok(())
}

async fn run_files(app: &super::App, command: FileCommand) -> Result<()> {
    match command {
        FileCommand::List { page, page_size } => {
            let size = page_size.unwrap_or(app.config.knowledge_page_size);
            let files = app.chat.load_knowledge_files(page, size).await?;
            if files.items.is_empty() {
                println!("No knowledge files.");
            }
            for file in &files.items {
                println!(
                    "  \x1b[90m{:>4}\x1b[0m  {}  \x1b[90m{} / {}\x1b[0m",
                    file.id,
                    file.file_name,
                    output::format_size(file.file_size),
                    file.status
                );
            }
        }
        FileCommand::Show { id } => {
            let file = app.chat.knowledge_file(id).await?;
            println!("{}", file.file_name);
            println!("  type     {}", file.file_type);
            println!("  size     {}", output::format_size(file.file_size));
            println!("  status   {}", file.status);
            if let Some(vectors) = file.vector_count {
                println!("  vectors  {vectors}");
            }
            if let Some(at) = file.processed_at {
                println!("  ready at {}", at.format("%Y-%m-%d %H:%M"));
            }
        }
        FileCommand::Upload { path } => {
            let file = app.chat.upload_knowledge_file(&path).await?;
            println!("{} {}", file.id, file.file_name);
        }
        FileCommand::Delete { id } => app.chat.remove_knowledge_file(id).await?,
    }
    Ok(())
}
