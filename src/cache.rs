//! Read-through cache manager: mediates between a rate provider and the
//! persistent store.

use crate::error::RateError;
use crate::provider::RateProvider;
use crate::rate::{RateRecord, cache_key};
use crate::store::RateStore;
use chrono::NaiveDate;
use tracing::debug;

/// Answers "give me the rate for (currency, date)", deciding whether to
/// trust the cache or consult the provider.
pub struct RateCache<'a> {
    store: &'a RateStore,
}

impl<'a> RateCache<'a> {
    pub fn new(store: &'a RateStore) -> Self {
        Self { store }
    }

    /// Looks up the rate for `(currency, date)`.
    ///
    /// The cache read and any write happen inside one write transaction:
    /// either a full record is committed or nothing is. A hit returns the
    /// decoded record and discards the transaction; a miss (or
    /// `bypass_cache`) fetches from the provider and overwrites the entry
    /// under the key. Provider failures roll back without mutating the
    /// store. An entry that exists but fails to decode is a hard error.
    pub async fn get(
        &self,
        provider: &dyn RateProvider,
        currency: &str,
        date: NaiveDate,
        bypass_cache: bool,
    ) -> Result<RateRecord, RateError> {
        let key = cache_key(date, currency);
        let mut tx = self.store.write_tx();

        if !bypass_cache {
            if let Some(raw) = tx.get(self.store.rates(), key.as_bytes())? {
                let record = serde_json::from_slice(&raw).map_err(|source| {
                    RateError::CacheCorruption {
                        key: key.clone(),
                        source,
                    }
                })?;
                debug!(%key, "cache hit");
                return Ok(record);
            }
            debug!(%key, "cache miss");
        }

        // Dropping `tx` on any error path below discards the transaction.
        let record = provider.fetch_rate(currency, date).await?;

        let encoded = serde_json::to_vec(&record).map_err(RateError::CacheEncoding)?;
        tx.insert(self.store.rates(), key.as_bytes(), encoded);
        tx.commit()?;
        debug!(%key, "cache fill");

        Ok(record)
    }
}
