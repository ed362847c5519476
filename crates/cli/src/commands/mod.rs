//! Command implementations

pub mod actions;
pub mod costs;
pub mod debug;

use crate::loader;
use anyhow::{Context, Result};
use finops_lib::{
    Normalizer, Pipeline, PipelineConfig, PipelineMetrics, StaticPriceCatalog, StructuredLogger,
    UsageStore,
};
use std::path::Path;
use std::sync::Arc;

/// Loaded store plus a configured pipeline
pub struct Session {
    pub store: UsageStore,
    pub pipeline: Pipeline,
    pub metrics: PipelineMetrics,
}

impl Session {
    pub fn open(data_dir: &Path, config: PipelineConfig, price_table: Option<&Path>) -> Result<Self> {
        let logger = StructuredLogger::new(data_dir.display().to_string());
        let metrics = PipelineMetrics::new();

        let batches = loader::load_batches(data_dir)?;
        let store = UsageStore::new(Normalizer::default(), config.observed_price_method);
        let dataset = store
            .reload(&batches)
            .context("Failed to normalize billing exports")?;
        metrics.set_records_loaded(dataset.records.len());
        metrics.inc_records_dropped(dataset.dropped);
        logger.log_store_reloaded(
            dataset.records.len(),
            dataset.dropped,
            dataset.ladder.families().count(),
            dataset.observed_prices.len(),
        );

        let mut pipeline = Pipeline::new(config)
            .context("Invalid pipeline configuration")?
            .with_logger(logger);
        if let Some(path) = price_table {
            let catalog = StaticPriceCatalog::from_path(path)
                .with_context(|| format!("Failed to load price table {}", path.display()))?;
            pipeline = pipeline.with_pricing_service(Arc::new(catalog));
        }

        Ok(Self {
            store,
            pipeline,
            metrics,
        })
    }
}
