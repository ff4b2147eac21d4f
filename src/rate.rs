//! Canonical rate record and cache key model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for cache keys and rendered rows.
pub const OUTPUT_DATE_FORMAT: &str = "%d.%m.%Y";

pub const USD_CURRENCY: &str = "usd";
pub const EUR_CURRENCY: &str = "eur";
pub const UAH_CURRENCY: &str = "uah";

/// A single quote as reported by a provider.
///
/// `raw_value` and `divisor` are kept provider-faithful: the quote applies
/// to `divisor` units of foreign currency and is never pre-divided before
/// storage. The effective per-unit rate is computed at read time so cached
/// and live results render identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub currency: String,
    pub date: NaiveDate,
    pub raw_value: f64,
    pub divisor: i64,
    /// Change versus the previous observation. Only the observation-series
    /// provider reports it; callers must not rely on it being present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

impl RateRecord {
    pub fn effective_rate(&self) -> f64 {
        self.raw_value / self.divisor as f64
    }

    /// Projects the record into its display row: formatted date, uppercase
    /// currency code, effective rate with two fractional digits and, when
    /// reported, the delta.
    pub fn row(&self) -> Vec<String> {
        let mut row = vec![
            self.date.format(OUTPUT_DATE_FORMAT).to_string(),
            self.currency.to_uppercase(),
            format!("{:.2}", self.effective_rate()),
        ];
        if let Some(delta) = self.delta {
            row.push(format!("{delta:.2}"));
        }
        row
    }
}

/// Builds the deterministic store key for a (date, currency) pair.
pub fn cache_key(date: NaiveDate, currency: &str) -> String {
    format!(
        "{}-{}",
        date.format(OUTPUT_DATE_FORMAT),
        currency.to_lowercase()
    )
}
