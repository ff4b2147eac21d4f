//! Failure kinds surfaced by rate lookups.

use thiserror::Error;

/// Errors that can abort a single (date, currency) lookup.
///
/// Nothing is retried or swallowed inside the core: every failure rolls back
/// any in-flight storage transaction and is returned to the caller.
#[derive(Debug, Error)]
pub enum RateError {
    /// Requested code is not recognized by the active provider
    #[error("cannot get currency rate for '{0}'")]
    UnknownCurrency(String),

    /// Timeout, connection error or non-success HTTP status
    #[error("rate provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider payload failed to parse or decode
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// An existing cache entry failed to decode. Falling back to a re-fetch
    /// would mask corruption, so this is not recoverable.
    #[error("cache entry '{key}' is corrupt: {source}")]
    CacheCorruption {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A rate record could not be serialized for the store
    #[error("cannot encode cache entry: {0}")]
    CacheEncoding(#[source] serde_json::Error),

    /// Transaction begin/commit or partition access failed
    #[error("cache storage failure: {0}")]
    Storage(#[from] fjall::Error),
}
