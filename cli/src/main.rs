//! Recipebook CLI - Command Line Interface

use clap::{Parser, Subcommand};
use recipebook_cli::HttpTransport;
use recipebook_core::{ClientConfig, JsonConfig, Recipe, Record, RecordId, SavedRecipe};
use recipebook_state::{CollectionStore, StoreState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipebook")]
#[command(about = "Recipebook - recipe collection client")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend URL
    #[arg(short, long)]
    api_url: Option<String>,

    /// Print the final store state as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all recipes
    List,

    /// Show one recipe
    Get {
        /// Recipe id
        id: RecordId,
    },

    /// Add a recipe
    Add {
        /// Recipe text
        recipe: String,
    },

    /// Replace a recipe's text
    Update {
        /// Recipe id
        id: RecordId,

        /// New recipe text
        recipe: String,
    },

    /// Delete a recipe
    Delete {
        /// Recipe id
        id: RecordId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    init_logging(&config.log_level);

    let transport = HttpTransport::new(&config)?;
    let store = CollectionStore::<Recipe>::spawn(Arc::new(transport), config.collection_path.clone());
    store.subscribe(|state: &StoreState<Recipe>| {
        debug!(
            loading = state.is_loading,
            records = state.records.len(),
            "store changed"
        );
    });
    store.ready().await;

    // the initial fetch failing makes every command meaningless
    if let Some(error) = store.last_error() {
        eprintln!("❌ {}", error);
        std::process::exit(1);
    }

    // outcomes land in the store state; errors are reported below
    match cli.command {
        Commands::List => print_records(&store.records()),

        Commands::Get { id } => {
            if let Ok(recipe) = store.fetch_one(id).await {
                print_record(&recipe);
            }
        }

        Commands::Add { recipe } => {
            if let Ok(created) = store.create(Recipe::new(recipe)).await {
                println!("✅ Recipe created!");
                print_record(&created);
            }
        }

        Commands::Update { id, recipe } => {
            if let Ok(updated) = store.update(Record::saved(id, Recipe::new(recipe))).await {
                println!("✅ Recipe updated!");
                print_record(&updated);
            }
        }

        Commands::Delete { id } => {
            if let Ok(removed) = store.delete(id).await {
                if removed {
                    println!("✅ Recipe {} deleted", id);
                } else {
                    println!("Recipe {} was not in the local list", id);
                }
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    }

    let failed = store.last_error();
    store.close();

    if let Some(error) = failed {
        eprintln!("❌ {}", error);
        std::process::exit(1);
    }

    Ok(())
}

fn print_records(records: &[SavedRecipe]) {
    if records.is_empty() {
        println!("No recipes found.");
        return;
    }

    println!("{:<6} {}", "Id", "Recipe");
    println!("{:-<6} {:-<40}", "", "");
    for record in records {
        println!("{:<6} {}", record.id, record.payload);
    }
}

fn print_record(record: &SavedRecipe) {
    println!("Id:     {}", record.id);
    println!("Recipe: {}", record.payload);
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
