use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use supportbot::{
    constants,
    mistral::{MistralClient, MistralSettings},
    secrets,
    tools::{self, Tool, ToolOutcome},
    web_server::{self, AppState},
};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// TOML file holding MISTRAL_API_KEY. Takes precedence over the environment.
    #[arg(long, global = true, env = "SUPPORTBOT_SECRETS", default_value_t = constants::SECRETS_FILE.clone())]
    secrets_file: String,

    /// Base URL of the Mistral API.
    #[arg(long, global = true, env = "MISTRAL_API_BASE", default_value_t = constants::MISTRAL_API_BASE.clone())]
    api_base: String,

    /// Model used for every completion.
    #[arg(long, global = true, env = "MISTRAL_MODEL", default_value_t = constants::MISTRAL_MODEL.clone())]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chatbot web UI.
    Start {
        #[arg(long, default_value_t = 9900, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "0.0.0.0", help = "Address to bind.")]
        host: String,
        #[arg(long, env = "SUPPORTBOT_ASSETS", default_value_t = constants::ASSETS_DIR.clone(), help = "Directory containing templates/ and static/.")]
        assets: String,
    },
    /// Chat with the support bot in the terminal.
    Chat,
    /// Classify a bank inquiry into a support category.
    Classify { text: String },
    /// Extract patient fields from medical notes as JSON.
    Extract { text: String },
    /// Draft a reply to a mortgage customer email.
    Email { text: String },
    /// Summarize a newsletter into bullet points.
    Summarize { text: String },
}

fn print_outcome(outcome: ToolOutcome) -> Result<()> {
    match outcome {
        ToolOutcome::Category { label } => println!("{}", label),
        ToolOutcome::Extraction(extraction) => match extraction.pretty {
            Some(pretty) => println!("{}", pretty),
            None => {
                println!("{}", extraction.raw);
                eprintln!("Invalid JSON returned. Try again.");
            }
        },
        ToolOutcome::Text { text } => println!("{}", text),
        ToolOutcome::Failed { message } => anyhow::bail!(message),
    }
    Ok(())
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,supportbot=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("supportbot starting with command: {:?}", cli.command);

    let api_key = secrets::load_api_key(&PathBuf::from(&cli.secrets_file));
    if api_key.is_none() {
        warn!("No Mistral API key configured; model requests will be refused");
    }
    let client = MistralClient::new(MistralSettings {
        base_url: cli.api_base,
        model: cli.model,
        api_key,
    });
    info!(model = client.model(), configured = client.is_configured(), "Mistral client ready");

    let (tool, input) = match cli.command {
        Commands::Start { port, host, assets } => {
            let state = AppState::new(client, assets);

            tokio::select! {
                // Wait for Ctrl-C signal for graceful shutdown
                _ = tokio::signal::ctrl_c() => {
                    let sessions = state.session_count().await;
                    info!(sessions, "Ctrl-C received, shutting down...");
                }
                res = web_server::start_web_server(&host, port, state.clone()) => {
                    res.context("Web server stopped")?;
                }
            }

            info!("Shutdown complete.");
            return Ok(());
        }
        Commands::Chat => {
            supportbot::chat::run_terminal_chat(&client)
                .await
                .context("Chat session failed")?;
            return Ok(());
        }
        Commands::Classify { text } => (Tool::Classify, text),
        Commands::Extract { text } => (Tool::Extract, text),
        Commands::Email { text } => (Tool::Email, text),
        Commands::Summarize { text } => (Tool::Summarize, text),
    };

    print_outcome(tools::run_tool(&client, tool, &input).await)
        .with_context(|| format!("{} failed", tool))
}
