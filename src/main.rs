use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use codeai::api::{ChatClient, DEFAULT_API_BASE};
use codeai::config::Config;
use codeai::session::{self, Mode};
use codeai::upload;

#[derive(Parser)]
#[command(name = "codeai")]
#[command(about = "Terminal chat for a CodeAI code-explanation backend")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
        /// Attach a file whose content frames the question
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let base = cli
        .api_base
        .or_else(|| config.api_base.clone())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let client = ChatClient::new(&base);

    match cli.command {
        Some(Commands::Ask { question, file }) => {
            ask_once(&client, &question, file.as_deref()).await?
        }
        Some(Commands::Health) => check_health(&client).await?,
        None => run_tui(client, &config).await?,
    }

    Ok(())
}

async fn run_tui(client: ChatClient, config: &Config) -> Result<()> {
    let mode = config
        .default_mode
        .as_deref()
        .and_then(Mode::from_str)
        .unwrap_or_default();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(client, mode);

    let result = event_loop(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::Events::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}

async fn ask_once(client: &ChatClient, question: &str, file: Option<&Path>) -> Result<()> {
    if question.trim().is_empty() {
        println!("{}", "Nothing to ask".yellow());
        return Ok(());
    }

    let context = match file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            let file_name = upload::file_name_of(&path.to_string_lossy());
            let ctx = upload::FileContext::from_file(&file_name, &content)?;
            println!("{} {}", "Attached:".bold().green(), file_name);
            Some(ctx)
        }
        None => None,
    };

    let prompt = session::compose_prompt(context.as_ref(), question.trim());

    println!("{}", "Asking CodeAI...".bold().magenta());

    match client.send(&prompt).await {
        Ok(reply) => {
            println!("\n{}", "Response:".bold().green());
            if reply.is_empty() {
                println!("{}", session::NO_RESPONSE_FALLBACK.dimmed());
            } else {
                println!("{}", reply);
            }
        }
        Err(e) => {
            println!("{}: {}", "Error querying the backend".red(), e);
            println!(
                "Make sure the CodeAI server is running at {}",
                client.base_url().bold()
            );
        }
    }

    Ok(())
}

async fn check_health(client: &ChatClient) -> Result<()> {
    match client.health().await {
        Ok(status) => {
            println!("{} {}", "Backend status:".bold().green(), status);
        }
        Err(e) => {
            println!("{}: {}", "Backend unreachable".red(), e);
            println!("Expected it at {}", client.base_url().bold());
        }
    }

    Ok(())
}
