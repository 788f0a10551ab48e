use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;

mod clients;
mod config;
mod errors;
mod evals;
mod media;
mod models;
mod prompts;
mod routes;
mod services;
mod timing;
mod utils;

use clients::openai::{OpenAiApi, OpenAiClient};
use config::AppConfig;
use errors::AppResult;
use evals::datasets::{generate_placeholders, generate_test_images, load_test_cases};
use evals::ids::EvalIdStore;
use evals::runner::EvalRunner;
use evals::setup::create_evals;
use routes::AppState;

#[derive(Parser)]
#[command(name = "campaign-studio", version, about = "Ad creative generation backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server (default)
    Serve,
    /// Quality evaluation tooling
    Eval {
        #[command(subcommand)]
        command: EvalCommands,
        /// Directory holding eval-ids.json, datasets/ and results/
        #[arg(long, default_value = "evals")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum EvalCommands {
    /// Create the eval configurations (idempotent)
    Setup,
    /// Generate content and grade it against the configured evals
    Run,
    /// Generate dataset images with the image API
    GenImages,
    /// Write solid-color placeholder dataset images
    GenPlaceholders,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::logger::init_logger();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await?,
        Commands::Eval { command, dir } => match command {
            EvalCommands::Setup => {
                let client = api_client()?;
                let store = EvalIdStore::new(&dir);
                let ids = create_evals(&client, &store).await?;
                info!("Eval setup complete: {}", serde_json::to_string_pretty(&ids)?);
            }
            EvalCommands::Run => {
                media::ensure_tools()?;
                let client = Arc::new(api_client()?);
                let store = EvalIdStore::new(&dir);
                let ids = store.load_required()?;
                let cases = load_test_cases(&dir.join("datasets"))?;
                EvalRunner::new(client, &dir).run_all(&ids, &cases).await?;
            }
            EvalCommands::GenImages => {
                let client = api_client()?;
                generate_test_images(&client, &dir.join("datasets")).await?;
            }
            EvalCommands::GenPlaceholders => {
                generate_placeholders(&dir.join("datasets"))?;
            }
        },
    }

    Ok(())
}

fn api_client() -> AppResult<OpenAiClient> {
    let config = AppConfig::from_env()?;
    Ok(OpenAiClient::new(&config))
}

async fn serve() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let api: Arc<dyn OpenAiApi> = Arc::new(OpenAiClient::new(&config));
    let app = routes::router(AppState::new(api));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("API server listening on http://localhost:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
