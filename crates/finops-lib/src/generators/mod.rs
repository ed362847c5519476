//! Candidate generators
//!
//! One generator per heuristic. Each scans the normalized dataset and emits
//! zero or more `ActionCandidate`s; several generators may fire for the same
//! resource and the ranker settles the competition. Generators never fail
//! the pipeline: an error is logged and the generator contributes nothing.

mod reserved;
mod rightsizing;
mod scheduling;
mod storage;


pub use reserved::ReservedInstanceGenerator;
pub use rightsizing::{DownsizeGenerator, RetireGenerator, UpsizeGenerator};
pub use scheduling::{OffHoursGenerator, SpotGenerator};
pub use storage::{IdleVolumeGenerator, StorageReviewGenerator, StorageTierGenerator};

use crate::config::PipelineConfig;
use crate::ladder::SizeLadder;
use crate::models::{ActionCandidate, AdvisorRecord, UsageRecord};
use crate::nonprod::EnvironmentClassifier;
use crate::pricing::PriceLookup;
use anyhow::Result;

/// Everything a generator may read
pub struct GeneratorContext<'a> {
    pub records: &'a [UsageRecord],
    pub advisor: &'a [AdvisorRecord],
    pub ladder: &'a SizeLadder,
    pub prices: &'a dyn PriceLookup,
    pub config: &'a PipelineConfig,
    pub environments: &'a EnvironmentClassifier,
}

/// Trait for savings heuristics
pub trait CandidateGenerator: Send + Sync {
    /// Stable name used in logs and metrics
    fn name(&self) -> &'static str;

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>>;
}

/// The full built-in generator set, in a fixed order
pub fn default_generators() -> Vec<Box<dyn CandidateGenerator>> {
    vec![
        Box::new(IdleVolumeGenerator),
        Box::new(StorageTierGenerator),
        Box::new(StorageReviewGenerator),
        Box::new(RetireGenerator),
        Box::new(DownsizeGenerator),
        Box::new(UpsizeGenerator),
        Box::new(OffHoursGenerator),
        Box::new(SpotGenerator),
        Box::new(ReservedInstanceGenerator),
    ]
}

/// Storage class labels recognised by the storage heuristics
pub mod storage_classes {
    pub const GP2: &str = "gp2";
    pub const GP3: &str = "gp3";
    /// Previous-generation magnetic volumes
    pub const MAGNETIC: &str = "standard";
    pub const IO1: &str = "io1";
    pub const HDD: &[&str] = &["sc1", "st1"];
    pub const SNAPSHOT: &str = "snapshot";
    pub const SNAPSHOT_ARCHIVE: &str = "snapshot_archive";
}

/// Format a CPU percentage for reasons
pub(crate) fn fmt_cpu(cpu: Option<f64>) -> String {
    match cpu {
        Some(v) => format!("{:.1}%", v),
        None => "unknown".to_string(),
    }
}
