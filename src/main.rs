use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use sentiment_sweep::config::{self, Config};
use sentiment_sweep::sentiment::aggregate::ScoreAggregator;
use sentiment_sweep::sentiment::client::LlmScoreClient;

/// sentiment-sweep: score stored social-media posts for sentiment toward
/// their keyword.
///
/// Finds rows without a sentiment score, asks the configured text-generation
/// endpoint to rate each one several times, and writes the averaged score
/// back to the row.
#[derive(Parser)]
#[command(name = "sentiment-sweep", version, about)]
struct Cli {
    /// Load settings from this env file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every unscored row in the configured tables
    Run,

    /// Create the configured tables in the local SQLite database
    Init,

    /// Score a single text without touching the database
    Score {
        /// The text to rate
        text: String,

        /// Keyword the sentiment is measured against
        #[arg(long)]
        keyword: String,
    },

    /// Show how many rows each table would score on the next run
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit env file must exist; the implicit .env is optional but
    // must parse when present
    let env_file = match cli.env_file {
        Some(ref path) => Some(config::load_env_file(path)?),
        None => config::load_default_env_file()?,
    };

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sentiment_sweep=info")),
        )
        .init();

    if let Some(path) = env_file {
        info!(path = %path.display(), "Loaded settings file");
    }

    let config = Config::load().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    match cli.command {
        Commands::Run => {
            // Scoring settings are checked before the database is touched
            let scorer = LlmScoreClient::from_config(&config)?;
            let db = sentiment_sweep::db::open(&config)
                .await
                .inspect_err(|e| error!(error = ?e, "Failed to open database"))?;

            let summary = sentiment_sweep::pipeline::run::run(db.as_ref(), &scorer, &config).await?;
            sentiment_sweep::output::terminal::display_run_summary(&summary);
        }

        Commands::Init => {
            info!("Initializing sentiment database...");
            init_database(&config)?;
        }

        Commands::Score { text, keyword } => {
            if text.trim().is_empty() || keyword.trim().is_empty() {
                anyhow::bail!("Both the text and --keyword must be non-empty");
            }
            let scorer = LlmScoreClient::from_config(&config)?;
            let aggregator = ScoreAggregator::new(&scorer, config.aggregation);
            let score = aggregator.average_score(&text, &keyword).await?;
            println!(
                "Sentiment toward {}: {}",
                keyword.bold(),
                score.to_string().bold()
            );
        }

        Commands::Status => {
            let db = sentiment_sweep::db::open(&config).await?;
            sentiment_sweep::status::show(db.as_ref(), &config).await?;
        }
    }

    Ok(())
}

/// Create the configured tables in the SQLite database (creating the file if needed).
#[cfg(feature = "sqlite")]
fn init_database(config: &Config) -> Result<()> {
    if config.uses_postgres() {
        anyhow::bail!(
            "`init` only manages the local SQLite database; \
             PostgreSQL tables are owned by the collectors that fill them."
        );
    }
    let tables = config.tables()?;
    sentiment_sweep::db::initialize_sqlite(&config.db_path, &tables)?;
    println!("Database initialized at: {}", config.db_path);
    println!("Tables ready: {}", tables.len());
    for table in &tables {
        println!("  {}", table.name);
    }
    println!("\nNext: set SENTIMENT_LLM_URL and SENTIMENT_PROMPT, then run:");
    println!("  sentiment-sweep run");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn init_database(_config: &Config) -> Result<()> {
    anyhow::bail!("`init` needs the 'sqlite' feature. Rebuild with: cargo build --features sqlite")
}
