//! In-process usage store
//!
//! The store owns the normalized dataset plus everything derived from it
//! (size ladder, observed prices). A reload rebuilds all of it wholesale
//! under the write lock; readers hold an `Arc` snapshot and never observe a
//! half-built dataset.

use crate::config::ObservedPriceMethod;
use crate::error::NormalizeError;
use crate::ladder::SizeLadder;
use crate::models::{AdvisorRecord, UsageRecord};
use crate::normalizer::{Normalizer, RawBatch};
use crate::pricing::ObservedPriceTable;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Immutable result of one reload
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<UsageRecord>,
    pub advisor: Vec<AdvisorRecord>,
    pub dropped: usize,
    pub ladder: SizeLadder,
    pub observed_prices: ObservedPriceTable,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Dataset {
    /// Build the derived tables for already-normalized records
    pub fn build(
        records: Vec<UsageRecord>,
        advisor: Vec<AdvisorRecord>,
        dropped: usize,
        method: ObservedPriceMethod,
    ) -> Self {
        let ladder = SizeLadder::from_records(&records);
        let observed_prices = ObservedPriceTable::from_records(&records, method);
        Self {
            records,
            advisor,
            dropped,
            ladder,
            observed_prices,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Distinct regions seen in the usage records
    pub fn regions(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .filter_map(|r| r.region.as_deref())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.advisor.is_empty()
    }
}

/// Explicit handle to the loaded dataset
pub struct UsageStore {
    normalizer: Normalizer,
    price_method: ObservedPriceMethod,
    current: RwLock<Arc<Dataset>>,
}

impl Default for UsageStore {
    fn default() -> Self {
        Self::new(Normalizer::default(), ObservedPriceMethod::default())
    }
}

impl UsageStore {
    pub fn new(normalizer: Normalizer, price_method: ObservedPriceMethod) -> Self {
        Self {
            normalizer,
            price_method,
            current: RwLock::new(Arc::new(Dataset::default())),
        }
    }

    /// Replace the dataset with the given batches
    ///
    /// The write lock is held while normalizing, so concurrent readers wait
    /// for the new snapshot rather than seeing partial data. On error the
    /// previous dataset is kept.
    pub fn reload(&self, batches: &[RawBatch]) -> Result<Arc<Dataset>, NormalizeError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let data = self.normalizer.normalize_all(batches)?;
        let dataset = Arc::new(Dataset::build(
            data.records,
            data.advisor,
            data.dropped,
            self.price_method,
        ));
        debug!(
            batches = batches.len(),
            records = dataset.records.len(),
            dropped = dataset.dropped,
            "Store reloaded"
        );
        *current = Arc::clone(&dataset);
        Ok(dataset)
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(Dataset::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Service;

    fn batch(rows: &[&[&str]]) -> RawBatch {
        let mut batch = RawBatch::new(
            Service::Rds,
            vec![
                "db_id".to_string(),
                "instance_class".to_string(),
                "region".to_string(),
                "hours".to_string(),
                "cost_usd".to_string(),
            ],
        );
        for row in rows {
            batch.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        batch
    }

    #[test]
    fn test_reload_replaces_wholesale() {
        let store = UsageStore::default();
        assert!(store.snapshot().is_empty());

        store
            .reload(&[batch(&[
                &["db-1", "db.r5.large", "us-east-1", "720", "172.80"],
                &["db-2", "db.r5.xlarge", "us-east-1", "720", "345.60"],
            ])])
            .unwrap();
        let first = store.snapshot();
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.ladder.rank("db.r5.xlarge"), Some(2));
        assert_eq!(first.observed_prices.len(), 2);

        store
            .reload(&[batch(&[&["db-3", "db.m5.large", "eu-west-1", "10", "1"]])])
            .unwrap();
        let second = store.snapshot();
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0].resource_id, "db-3");
        // Earlier snapshots stay valid for their holders
        assert_eq!(first.records.len(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous_dataset() {
        let store = UsageStore::default();
        store
            .reload(&[batch(&[&["db-1", "db.r5.large", "us-east-1", "720", "172.80"]])])
            .unwrap();
        let wide = batch(&[&["db-2", "db.r5.large", "us-east-1", "720", "1", "extra"]]);
        assert!(store.reload(&[wide]).is_err());
        assert_eq!(store.snapshot().records[0].resource_id, "db-1");
    }

    #[test]
    fn test_clear() {
        let store = UsageStore::default();
        store
            .reload(&[batch(&[&["db-1", "db.r5.large", "us-east-1", "720", "172.80"]])])
            .unwrap();
        store.clear();
        assert!(store.snapshot().is_empty());
        assert!(store.snapshot().ladder.is_empty());
    }

    #[test]
    fn test_regions() {
        let store = UsageStore::default();
        let dataset = store
            .reload(&[batch(&[
                &["db-1", "db.r5.large", "us-east-1", "720", "1"],
                &["db-2", "db.r5.large", "", "720", "1"],
                &["db-3", "db.r5.large", "us-east-1", "720", "1"],
            ])])
            .unwrap();
        assert_eq!(dataset.regions().into_iter().collect::<Vec<_>>(), vec!["us-east-1"]);
    }
}
