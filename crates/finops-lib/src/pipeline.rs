//! Pipeline orchestration
//!
//! Snapshot the store, run every generator in isolation, rank and explain.
//! Configuration is validated once in `Pipeline::new`; nothing after that is
//! allowed to abort a run.

use crate::config::PipelineConfig;
use crate::error::ConfigError;
use crate::explainer::Explainer;
use crate::generators::{
    default_generators, CandidateGenerator, DownsizeGenerator, GeneratorContext,
};
use crate::models::{ActionKind, RankedAction};
use crate::nonprod::EnvironmentClassifier;
use crate::observability::{PipelineMetrics, StructuredLogger};
use crate::pricing::{PriceResolver, PricingService};
use crate::ranker::Ranker;
use crate::rollups::{advisor_comparison, AdvisorComparison};
use crate::store::{Dataset, UsageStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub records: usize,
    pub advisor_rows: usize,
    pub dropped_rows: usize,
    pub candidates: usize,
    pub candidates_by_kind: BTreeMap<ActionKind, usize>,
    pub duplicates_removed: usize,
    pub below_floor: usize,
    pub failed_generators: Vec<String>,
    pub unpriced_regions: Vec<String>,
}

/// Ranked, explained actions plus run statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub actions: Vec<RankedAction>,
    pub stats: RunStats,
}

pub struct Pipeline {
    config: PipelineConfig,
    generators: Vec<Box<dyn CandidateGenerator>>,
    pricing: Option<Arc<dyn PricingService>>,
    classifier: EnvironmentClassifier,
    explainer: Explainer,
    metrics: PipelineMetrics,
    logger: StructuredLogger,
}

impl Pipeline {
    /// Validate the configuration and build a pipeline with every generator
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            classifier: EnvironmentClassifier::new(&config.nonprod),
            config,
            generators: default_generators(),
            pricing: None,
            explainer: Explainer::default(),
            metrics: PipelineMetrics::new(),
            logger: StructuredLogger::new("pipeline"),
        })
    }

    pub fn with_pricing_service(mut self, service: Arc<dyn PricingService>) -> Self {
        self.pricing = Some(service);
        self
    }

    pub fn with_generators(mut self, generators: Vec<Box<dyn CandidateGenerator>>) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_explainer(mut self, explainer: Explainer) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the store's current snapshot
    pub fn run(&self, store: &UsageStore) -> PipelineReport {
        let dataset = store.snapshot();
        self.run_dataset(&dataset)
    }

    pub fn run_dataset(&self, dataset: &Dataset) -> PipelineReport {
        let started = Instant::now();
        self.logger.log_pipeline_started(
            dataset.records.len(),
            dataset.advisor.len(),
            self.generators.len(),
        );
        self.metrics.set_records_loaded(dataset.records.len());

        let resolver = self.resolver(dataset);
        let unpriced_regions = resolver.unpriced_regions(dataset.regions());
        for region in &unpriced_regions {
            self.logger.log_unknown_pricing_region(region);
        }

        let ctx = self.context(dataset, &resolver);

        let mut stats = RunStats {
            records: dataset.records.len(),
            advisor_rows: dataset.advisor.len(),
            dropped_rows: dataset.dropped,
            unpriced_regions,
            ..Default::default()
        };
        let mut candidates = Vec::new();
        for generator in &self.generators {
            let generator_started = Instant::now();
            match generator.generate(&ctx) {
                Ok(found) => {
                    self.logger.log_generator_completed(
                        generator.name(),
                        found.len(),
                        generator_started.elapsed().as_secs_f64() * 1000.0,
                    );
                    candidates.extend(found);
                }
                Err(e) => {
                    self.logger.log_generator_failed(generator.name(), &e);
                    self.metrics.inc_generator_failures(generator.name());
                    stats.failed_generators.push(generator.name().to_string());
                }
            }
        }
        self.metrics
            .observe_stage_latency("generate", started.elapsed().as_secs_f64());

        for candidate in &candidates {
            *stats.candidates_by_kind.entry(candidate.kind).or_default() += 1;
        }
        for (kind, count) in &stats.candidates_by_kind {
            self.metrics.inc_candidates(*kind, *count);
        }
        stats.candidates = candidates.len();

        let rank_started = Instant::now();
        let ranker = Ranker::new(
            self.config.min_actionable_savings_usd,
            self.config.keep_unquantified_actions,
        );
        let outcome = ranker.rank(candidates);
        stats.duplicates_removed = outcome.duplicates_removed;
        stats.below_floor = outcome.below_floor;
        let actions = self.explainer.explain(outcome.actions);
        self.metrics
            .observe_stage_latency("rank", rank_started.elapsed().as_secs_f64());

        self.metrics.inc_duplicates_removed(stats.duplicates_removed);
        self.metrics.inc_below_floor(stats.below_floor);
        self.metrics.set_actions_ranked(actions.len());
        self.logger
            .log_actions_ranked(actions.len(), stats.duplicates_removed, stats.below_floor);

        PipelineReport { actions, stats }
    }

    /// Our EC2 downsize targets next to the advisor's per-instance recommendations
    pub fn advisor_comparison(&self, dataset: &Dataset) -> Vec<AdvisorComparison> {
        let resolver = self.resolver(dataset);
        let ctx = self.context(dataset, &resolver);
        match DownsizeGenerator.generate(&ctx) {
            Ok(candidates) => advisor_comparison(&dataset.records, &candidates),
            Err(e) => {
                self.logger.log_generator_failed(DownsizeGenerator.name(), &e);
                Vec::new()
            }
        }
    }

    fn resolver<'a>(&'a self, dataset: &'a Dataset) -> PriceResolver<'a> {
        PriceResolver::new(
            self.config.price_strategy,
            &dataset.observed_prices,
            self.pricing.as_deref(),
        )
    }

    fn context<'a>(
        &'a self,
        dataset: &'a Dataset,
        resolver: &'a PriceResolver<'a>,
    ) -> GeneratorContext<'a> {
        GeneratorContext {
            records: &dataset.records,
            advisor: &dataset.advisor,
            ladder: &dataset.ladder,
            prices: resolver,
            config: &self.config,
            environments: &self.classifier,
        }
    }
}
