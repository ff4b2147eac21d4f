pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod output;
pub mod provider;
pub mod providers;
pub mod rate;
pub mod store;

use crate::cache::RateCache;
use crate::config::{AppConfig, ProviderKind};
use crate::provider::RateProvider;
use crate::providers::bulletin::{BulletinProvider, DayCache};
use crate::providers::timeseries::TimeseriesProvider;
use crate::store::RateStore;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{debug, info};

pub struct RunOptions {
    /// Currency identifiers to resolve, in output order.
    pub currencies: Vec<String>,
    /// Skip the cache read and force a live fetch for every currency.
    pub skip_cache: bool,
    /// Resolve rates for this many days before today.
    pub days_before: i64,
    pub config_path: Option<String>,
}

pub async fn run(options: &RunOptions) -> Result<()> {
    info!("Currency rates starting...");

    let config = match &options.config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    if options.currencies.is_empty() {
        anyhow::bail!("select at least one currency");
    }

    let cache_path = config.cache_dir()?;
    std::fs::create_dir_all(&cache_path).with_context(|| {
        format!("Failed to create cache directory: {}", cache_path.display())
    })?;
    let store = RateStore::open(&cache_path)
        .with_context(|| format!("Failed to open rate store at {}", cache_path.display()))?;
    let cache = RateCache::new(&store);

    let client = provider::http_client()?;
    let provider: Box<dyn RateProvider> = match config.provider {
        ProviderKind::Bulletin => Box::new(BulletinProvider::new(
            config.bulletin_base_url(),
            client,
            DayCache::new(),
        )),
        ProviderKind::Timeseries => {
            Box::new(TimeseriesProvider::new(config.timeseries_base_url(), client))
        }
    };

    let date = Utc::now().date_naive() - Duration::days(options.days_before);

    // Fail-fast: the first failing currency aborts the batch before any
    // output is rendered.
    let mut rows = Vec::new();
    for currency in &options.currencies {
        let record = cache
            .get(provider.as_ref(), currency, date, options.skip_cache)
            .await
            .with_context(|| {
                format!(
                    "failed to get rate for '{}' on {}",
                    currency,
                    date.format(rate::OUTPUT_DATE_FORMAT)
                )
            })?;
        rows.push(record.row());
    }

    output::write_rows(std::io::stdout(), &rows)
}
