use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kurs::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Comma-separated currency codes, e.g. "usd,eur"
    #[arg(short, long, default_value = "usd")]
    currency: String,

    /// Skip the cache read and fetch a fresh rate
    #[arg(long)]
    skip_cache: bool,

    /// Get the rate from this many days before today
    #[arg(long, default_value_t = 0)]
    days_before: i64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        None => {
            let options = kurs::RunOptions {
                currencies: cli
                    .currency
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
                skip_cache: cli.skip_cache,
                days_before: cli.days_before,
                config_path: cli.config_path,
            };
            kurs::run(&options).await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> Result<()> {
    let path = kurs::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
provider: bulletin

providers:
  bulletin:
    base_url: "https://www.cbr.ru"
  timeseries:
    base_url: "https://www.cbr.ru"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
