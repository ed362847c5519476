//! Error types for the savings pipeline
//!
//! Data-quality gaps are not errors: they travel as `None` through the
//! pipeline. The types here cover the failures that must be surfaced.

use thiserror::Error;

/// Failure to parse one of the closed model vocabularies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelParseError {
    #[error("unknown service '{0}' (expected rds, ec2, ebs, snapshots or advisor)")]
    UnknownService(String),
    #[error("unknown action kind '{0}'")]
    UnknownActionKind(String),
}

/// Invalid pipeline configuration; fatal before any stage runs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a ratio in [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be a percentage in [0, 100], got {value}")]
    PercentOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("idle_days_high ({high}) must be >= idle_days_medium ({medium})")]
    IdleDaysOrder { medium: u32, high: u32 },
    #[error("{lower_name} ({lower}) must not exceed {upper_name} ({upper})")]
    ThresholdOrder {
        lower_name: &'static str,
        lower: f64,
        upper_name: &'static str,
        upper: f64,
    },
    #[error("non-production vocabulary must contain at least one pattern")]
    EmptyNonProdVocabulary,
}

/// Failure while mapping a raw batch onto canonical records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("row {row} has {found} cells but the header declares {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Failure reported by an external pricing service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("pricing service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed price entry for {class} in {location}: {detail}")]
    Malformed {
        location: String,
        class: String,
        detail: String,
    },
}
