//! Savings-action pipeline for monthly cloud billing data
//!
//! This crate provides the core functionality for:
//! - Normalizing heterogeneous billing exports into canonical usage records
//! - Deriving instance size ladders and unit prices
//! - Generating, deduplicating and ranking savings actions
//! - Explaining actions and rolling costs up for leadership views

pub mod config;
pub mod error;
pub mod explainer;
pub mod generators;
pub mod ladder;
pub mod models;
pub mod nonprod;
pub mod normalizer;
pub mod observability;
pub mod pipeline;
pub mod pricing;
pub mod ranker;
pub mod rollups;
pub mod stats;
pub mod store;

pub use config::{ObservedPriceMethod, PipelineConfig, PriceStrategy};
pub use error::{ConfigError, ModelParseError, NormalizeError, PricingError};
pub use explainer::Explainer;
pub use ladder::SizeLadder;
pub use models::*;
pub use normalizer::{Normalizer, RawBatch};
pub use observability::{PipelineMetrics, StructuredLogger};
pub use pipeline::{Pipeline, PipelineReport, RunStats};
pub use pricing::{PricingService, StaticPriceCatalog};
pub use ranker::{ActionQuery, Ranker};
pub use store::{Dataset, UsageStore};
