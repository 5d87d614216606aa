mod api;
mod auth;
mod config;
mod error;
mod serve_cmd;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use growthness_core::llm::OpenAiPlanGenerator;
use growthness_db::pool;

use config::GrowthConfig;
use serve_cmd::AppState;

#[derive(Parser)]
#[command(name = "growthness", about = "Fitness tracking API with AI-generated plans")]
struct Cli {
    /// Database URL (overrides GROWTH_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a growthness config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/growthness")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the database (requires config file or env vars)
    DbInit,
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

/// Execute `growthness init`: write the config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
            token_ttl_secs: None,
        },
        llm: config::LlmSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  auth.token_secret = {}...{}", &token_secret[..8], &token_secret[56..]);
    println!();
    println!("Set OPENAI_API_KEY (or [llm] api_key) to enable plan generation.");
    println!("Next: run `growthness db-init` to create and migrate the database.");

    Ok(())
}

/// Execute `growthness db-init`: create the database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let db_config = GrowthConfig::resolve_db(cli_db_url);

    println!("Initializing growthness database...");

    pool::ensure_database_exists(&db_config).await?;
    let db_pool = pool::create_pool(&db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("growthness db-init complete.");
    Ok(())
}

/// Execute `growthness serve`: migrate, then serve until ctrl-c.
async fn cmd_serve(cli_db_url: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = GrowthConfig::resolve(cli_db_url)?;

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    if resolved.llm_config.api_key.is_none() {
        tracing::warn!("no language model API key configured; plan generation will fail");
    }
    let generator = OpenAiPlanGenerator::new(resolved.llm_config)
        .map_err(anyhow::Error::new)
        .context("failed to build the plan generator")?;

    let state = AppState {
        pool: db_pool.clone(),
        tokens: resolved.token_config,
        generator: Arc::new(generator),
    };
    let result = serve_cmd::run_serve(state, bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => cmd_init(&db_url, force)?,
        Commands::DbInit => cmd_db_init(cli.database_url.as_deref()).await?,
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), &bind, port).await?
        }
    }

    Ok(())
}
