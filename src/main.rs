use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use sigma::app::App;
use sigma::config::{Config, HOST_ENV_VAR};
use sigma::{handler, logging, tui, ui, OllamaClient, Session};

#[derive(Parser)]
#[command(name = "sigma", version)]
#[command(about = "Chat with the models of a local Ollama server")]
struct Cli {
    /// Ollama address (default: $OLLAMA_HOST, then the config file, then localhost:11434)
    #[arg(long)]
    host: Option<String>,
    /// Model to preselect when the server has it
    #[arg(short, long)]
    model: Option<String>,
    /// Where to write the log
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Ask one question, print the answer and exit
    #[arg(short, long, conflicts_with = "list_models")]
    prompt: Option<String>,
    /// Print the locally available models and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load();
    let interactive = cli.prompt.is_none() && !cli.list_models;

    let log_file = if interactive {
        config.resolve_log_file(cli.log_file.as_deref())
    } else {
        cli.log_file.clone()
    };
    logging::init(log_file.as_deref())?;

    let env_host = std::env::var(HOST_ENV_VAR).ok();
    let base_url = config.resolve_base_url(cli.host.as_deref(), env_host.as_deref());
    let preferred_model = cli.model.as_deref().or(config.default_model.as_deref());
    info!(%base_url, "starting");

    let client = OllamaClient::new(&base_url).context("could not build the HTTP client")?;
    let mut session = Session::start(Arc::new(client), preferred_model)
        .await
        .with_context(|| {
            format!("is Ollama running at {}? start it with `ollama serve`", base_url)
        })?;

    if cli.list_models {
        for name in session.registry().names() {
            println!("{}", name);
        }
        return Ok(());
    }

    if let Some(prompt) = cli.prompt {
        let reply = session.ask_once(&prompt).await?;
        println!("{}", reply);
        return Ok(());
    }

    run_tui(App::new(session, Config::config_path())).await
}

async fn run_tui(mut app: App) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
            app.poll_query().await;
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    if let Err(e) = &result {
        error!(error = %e, "terminal loop failed");
    }
    info!(turns = app.session.conversation().len(), "session ended");
    result
}
