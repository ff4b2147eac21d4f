//! Single-currency JSON provider: each request returns a short series of
//! dated observations for one internally-coded currency.

use crate::error::RateError;
use crate::provider::RateProvider;
use crate::rate::{EUR_CURRENCY, RateRecord, UAH_CURRENCY, USD_CURRENCY};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Timestamp format used by observation dates in the payload.
const OBSERVATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Maps a currency identifier to the provider's internal series code.
fn internal_code(currency: &str) -> Option<&'static str> {
    match currency.to_lowercase().as_str() {
        USD_CURRENCY => Some("R01235"),
        EUR_CURRENCY => Some("R01239"),
        UAH_CURRENCY => Some("R01720"),
        _ => None,
    }
}

fn default_nominal() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    curs: f64,
    #[serde(default = "default_nominal")]
    nominal: i64,
    #[serde(default)]
    diff: Option<f64>,
}

pub struct TimeseriesProvider {
    base_url: String,
    client: reqwest::Client,
}

impl TimeseriesProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateProvider for TimeseriesProvider {
    async fn fetch_rate(
        &self,
        currency: &str,
        _date: NaiveDate,
    ) -> Result<RateRecord, RateError> {
        let code = internal_code(currency)
            .ok_or_else(|| RateError::UnknownCurrency(currency.to_string()))?;

        // The timestamp busts any intermediary caching of the series.
        let url = format!(
            "{}/scripts/rates.json?val_id={}&_={}",
            self.base_url,
            code,
            Utc::now().timestamp_millis()
        );
        debug!("requesting rate series from {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let text = response.text().await?;

        let observations: Vec<Observation> = serde_json::from_str(&text).map_err(|e| {
            RateError::MalformedResponse(format!("cannot parse rate series for '{currency}': {e}"))
        })?;

        // The series is ordered oldest first; the last element is current.
        let latest = observations.last().ok_or_else(|| {
            RateError::MalformedResponse(format!("empty rate series for '{currency}'"))
        })?;

        let date = NaiveDateTime::parse_from_str(&latest.date, OBSERVATION_DATE_FORMAT)
            .map_err(|e| {
                RateError::MalformedResponse(format!(
                    "invalid observation date '{}': {e}",
                    latest.date
                ))
            })?
            .date();

        Ok(RateRecord {
            currency: currency.to_lowercase(),
            date,
            raw_value: latest.curs,
            divisor: latest.nominal,
            delta: latest.diff,
        })
    }
}
