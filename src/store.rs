//! Embedded transactional key-value store backing the rate cache.

use crate::error::RateError;
use fjall::{Config, PartitionCreateOptions, TxKeyspace, TxPartitionHandle, WriteTransaction};
use std::path::Path;

/// Name of the single partition holding cached rate entries.
const CACHE_PARTITION: &str = "cache";

/// Handle to the on-disk store, opened once per process and released on drop.
pub struct RateStore {
    keyspace: TxKeyspace,
    rates: TxPartitionHandle,
}

impl RateStore {
    /// Opens the store under `path`, creating the cache partition if it does
    /// not exist yet.
    pub fn open(path: &Path) -> Result<Self, RateError> {
        let keyspace = Config::new(path).open_transactional()?;
        let rates = keyspace.open_partition(CACHE_PARTITION, PartitionCreateOptions::default())?;
        Ok(Self { keyspace, rates })
    }

    /// Begins an atomic read-write transaction. Acquisition blocks until the
    /// single writer slot is free; dropping the transaction without
    /// committing discards every staged change.
    pub fn write_tx(&self) -> WriteTransaction {
        self.keyspace.write_tx()
    }

    /// The partition cached rate entries live in.
    pub fn rates(&self) -> &TxPartitionHandle {
        &self.rates
    }
}
