use std::sync::Arc;

use chrono::Local;
use thiserror::Error;

use crate::{
    store::{BlobStore, StoreError},
    types::UsageRecord,
};

const MAX_CHARGE_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("usage record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("usage record kept changing, gave up after {0} attempts")]
    Contended(usize),
}

/// Source of the current billing month (`YYYY-MM`).
pub trait Clock: Send + Sync {
    fn current_month(&self) -> String;
}

/// Local wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_month(&self) -> String {
        Local::now().format("%Y-%m").to_string()
    }
}

/// Monthly call counter for one external provider.
///
/// The counter is a single blob at `api_usage/{provider}.json`. A record
/// from an earlier month reads as a fresh zero counter, but the stale blob
/// is only replaced by the next charged call.
pub struct UsageLedger {
    store: Arc<dyn BlobStore>,
    key: String,
    clock: Arc<dyn Clock>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn BlobStore>, provider: &str) -> Self {
        Self {
            store,
            key: format!("api_usage/{provider}.json"),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn current_month(&self) -> String {
        self.clock.current_month()
    }

    /// Current usage. Creates and persists a zero record when none exists.
    pub async fn read(&self) -> Result<UsageRecord, LedgerError> {
        let (record, _) = self.load().await?;
        Ok(record)
    }

    /// Adds one call and overwrites the stored record with `record`.
    pub async fn increment_and_persist(&self, record: &mut UsageRecord) -> Result<(), LedgerError> {
        record.calls_made += 1;
        let body = serde_json::to_string_pretty(record)?;
        self.store.write_text(&self.key, &body).await?;
        Ok(())
    }

    pub fn has_quota(record: &UsageRecord, limit: u64) -> bool {
        record.calls_made < limit
    }

    /// Charges one call against the stored counter.
    ///
    /// The write only lands if the blob still holds what was read, otherwise
    /// the counter is re-read and the increment retried, so concurrent
    /// chargers sharing a store never lose an update.
    pub async fn charge(&self) -> Result<UsageRecord, LedgerError> {
        for _ in 0..MAX_CHARGE_ATTEMPTS {
            let (mut record, stored) = self.load().await?;
            record.calls_made += 1;
            let body = serde_json::to_string_pretty(&record)?;

            if self
                .store
                .compare_and_swap(&self.key, stored.as_deref(), &body)
                .await?
            {
                return Ok(record);
            }
        }

        Err(LedgerError::Contended(MAX_CHARGE_ATTEMPTS))
    }

    /// Returns the effective record plus the exact text it was read from.
    async fn load(&self) -> Result<(UsageRecord, Option<String>), LedgerError> {
        let month = self.clock.current_month();

        for _ in 0..MAX_CHARGE_ATTEMPTS {
            let Some(stored) = self.store.read_text(&self.key).await? else {
                let record = UsageRecord::fresh(&month);
                let body = serde_json::to_string_pretty(&record)?;
                if self
                    .store
                    .compare_and_swap(&self.key, None, &body)
                    .await?
                {
                    return Ok((record, Some(body)));
                }
                continue;
            };

            let record: UsageRecord = serde_json::from_str(&stored)?;
            if record.month != month {
                return Ok((UsageRecord::fresh(month), Some(stored)));
            }
            return Ok((record, Some(stored)));
        }

        Err(LedgerError::Contended(MAX_CHARGE_ATTEMPTS))
    }
}
