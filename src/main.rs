use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plantgo::{
    config::{ConfigLoader, GameConfig},
    game::GameState,
    identify::GeminiIdentifier,
    snapshot::{GameSnapshot, TimeOfDay},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "PlantGo! campus exploration game server")]
struct Cli {
    /// Path to a YAML game config (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the game state over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Fix plant placement instead of drawing from entropy
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Identify a plant photo; the file holds base64 or a data URL
    Identify {
        image: PathBuf,
    },
    /// Print the initial game snapshot as JSON
    Inspect {
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => ConfigLoader::new(".").load(path),
        None => Ok(GameConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Serve { host, port, seed } => {
            if seed.is_some() {
                config.seed = seed;
            }
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            web::run(WebServerConfig { config, host, port }).await?;
        }
        Command::Identify { image } => {
            let payload = fs::read_to_string(&image)
                .with_context(|| format!("Failed to read image file {}", image.display()))?;
            let identifier = GeminiIdentifier::from_config(&config.identification)?;
            let identification = identifier.identify(&payload).await?;
            println!("{}", serde_json::to_string_pretty(&identification)?);
        }
        Command::Inspect { seed } => {
            if seed.is_some() {
                config.seed = seed;
            }
            let state = GameState::from_config(&config)?;
            let snapshot = GameSnapshot::capture(&state, TimeOfDay::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}
