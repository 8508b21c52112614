//! Recipebook Mock Backend Binary

use clap::{Parser, Subcommand};
use recipebook_core::{JsonConfig, ServerConfig};
use recipebook_server::{default_seed, ServerBuilder};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipebook-server")]
#[command(about = "Recipebook mock REST backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backend
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        listen: Option<String>,

        /// Seed database file
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,
    },

    /// Write the built-in seed database
    Seed {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            listen,
            seed,
            no_cors,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            if let Some(path) = seed {
                config.seed_file = Some(path);
            }
            if no_cors {
                config.enable_cors = false;
            }

            init_logging(&config.log_level);

            let server = ServerBuilder::new().config(config).build()?;
            server.start().await?;
        }

        Commands::Seed { output } => {
            let json = serde_json::to_string_pretty(&default_seed())?;
            std::fs::write(&output, json)?;

            println!("Seed database saved to: {}", output.display());
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
