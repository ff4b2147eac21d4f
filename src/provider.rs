//! Rate provider contract and shared HTTP client construction.

use crate::error::RateError;
use crate::rate::RateRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

/// Identifier sent with every provider request.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";

/// Client-side request timeout; on expiry the lookup fails instead of hanging.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// A remote source of currency rates.
///
/// Implementations are idempotent and perform their own locale-specific
/// numeric parsing and charset decoding; callers never reparse payloads.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError>;
}

/// Builds the HTTP client shared by all providers for the duration of a run.
pub fn http_client() -> Result<reqwest::Client, RateError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}
