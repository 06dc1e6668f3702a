mod commands;
mod noninteractive;
mod notifier;
mod output;
mod repl;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sd_core::route::{Location, Route, Router};

#[derive(Parser, Debug)]
#[command(
    name = "smart-decision",
    version,
    about = "Terminal client for the SmartDecision chat service"
)]
struct Cli {
    /// Non-interactive mode: send one message and print the reply
    #[arg(short, long)]
    prompt: Option<String>,

    /// Working directory
    #[arg(short = 'c', long = "cwd")]
    working_dir: Option<PathBuf>,

    /// Output format for non-interactive mode
    #[arg(short = 'f', long, default_value = "text")]
    output_format: OutputFormat,

    /// Suppress progress indicators and success notices
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Server origin, e.g. http://localhost:14020 (overrides config)
    #[arg(long)]
    server: Option<String>,

    /// Open an existing session by ID
    #[arg(long)]
    session: Option<u64>,

    /// Wait for the full reply instead of streaming it
    #[arg(long)]
    no_stream: bool,

    #[command(subcommand)]
    command: Option<commands::Command>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct App {
    pub config: sd_core::config::AppConfig,
    pub router: Arc<Router>,
    pub auth: sd_store::AuthStore,
    pub chat: sd_store::ChatStore,
    pub theme: sd_store::ThemeStore,
}

impl App {
    /// Guarded navigation; true when the router landed on `route`.
    pub async fn go(&self, path: &str, route: Route) -> bool {
        sd_store::navigate(self.router.as_ref(), &self.auth, path).await.route == route
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = sd_core::config::load_config(cli.working_dir.clone())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    if let Some(server) = cli.server.clone() {
        config.base_url = server;
    }

    let filter = if cli.debug || config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let app = build_app(config, cli.quiet).await?;

    if let Some(command) = cli.command {
        return commands::run(&app, command).await;
    }

    if !app.go("/chat", Route::Chat).await {
        anyhow::bail!("Not logged in. Run `smart-decision login <username>` first.");
    }

    if let Some(prompt) = cli.prompt {
        noninteractive::run(
            &app,
            prompt,
            cli.session,
            cli.output_format,
            cli.quiet,
            !cli.no_stream,
        )
        .await
    } else {
        repl::run(&app, cli.session, !cli.no_stream).await
    }
}

async fn build_app(config: sd_core::config::AppConfig, quiet: bool) -> Result<App> {
    let storage = sd_storage::LocalStorage::open(&config)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let router = Arc::new(Router::new(Location::new("/")));
    let notifier: Arc<dyn sd_core::notify::Notifier> =
        Arc::new(notifier::ConsoleNotifier::new(quiet));

    let api = sd_api::ApiClient::http(&config, storage.clone(), router.clone());
    let auth = sd_store::AuthStore::new(api.clone(), notifier.clone());
    let chat = sd_store::ChatStore::new(api, notifier, &config);
    let theme = sd_store::ThemeStore::new(storage);

    theme.load().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    chat.restore().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    auth.check_auth().await;

    Ok(App {
        config,
        router,
        auth,
        chat,
        theme,
    })
}
