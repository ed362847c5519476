//! Pipeline configuration
//!
//! Every heuristic threshold and assumed discount lives here so that the
//! generators never carry their own constants. Several of these defaults
//! disagreed between earlier dashboard revisions; they are starting points
//! to confirm with stakeholders, not authoritative figures.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Detached volumes idle at least this long are deletion candidates (Medium)
pub const IDLE_DAYS_MEDIUM: u32 = 30;
/// Idle this long raises deletion confidence to High
pub const IDLE_DAYS_HIGH: u32 = 90;
/// Economic floor for surfaced recommendations (USD / month)
pub const MIN_ACTIONABLE_SAVINGS_USD: f64 = 25.0;
/// Share of cost saved by a 5-day / 12-hour schedule
pub const DISCOUNT_OFFHOURS: f64 = 0.65;
/// Share of cost saved moving on-demand capacity to spot
pub const DISCOUNT_SPOT: f64 = 0.60;
/// Hours threshold used when the billing period is unknown (28 days x 24)
pub const FALLBACK_FULL_MONTH_HOURS: f64 = 672.0;

/// Default substrings that mark a resource as non-production
pub const DEFAULT_NONPROD_PATTERNS: &[&str] = &["dev", "test", "staging", "qa", "perf", "uat"];

/// Where unit prices come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceStrategy {
    /// Cost / quantity observed in the loaded data
    #[default]
    Observed,
    /// External price catalog, observed prices for unmapped regions
    External,
}

/// How observed unit prices are aggregated across records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObservedPriceMethod {
    /// Average of per-record cost / quantity
    #[default]
    MeanOfRatios,
    /// Total cost / total quantity
    RatioOfSums,
}

/// Name-based environment detection vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonProdConfig {
    /// Lower-case substrings that indicate non-production
    pub patterns: Vec<String>,
    /// Lower-case substrings that veto a match; checked first
    pub exclusions: Vec<String>,
}

impl Default for NonProdConfig {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_NONPROD_PATTERNS.iter().map(|p| p.to_string()).collect(),
            exclusions: Vec::new(),
        }
    }
}

/// Named numeric assumptions for the whole pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub idle_days_medium: u32,
    pub idle_days_high: u32,
    pub discount_gp2_to_gp3: f64,
    pub discount_standard_to_gp3: f64,
    pub discount_io1_to_gp3: f64,
    pub discount_offhours: f64,
    pub discount_spot: f64,
    pub min_actionable_savings_usd: f64,
    pub high_cpu_threshold: f64,
    /// Downsize trigger and the spot "Medium" band
    pub low_cpu_threshold: f64,
    pub spot_cpu_threshold: f64,
    pub retire_cpu_threshold: f64,
    /// Share of the month's hours that counts as always-on
    pub full_month_ratio: f64,
    pub fallback_full_month_hours: f64,
    pub snapshot_archive_min_gb: f64,
    pub ri_high_utilization: f64,
    pub ri_medium_utilization: f64,
    /// Keep actions whose savings could not be quantified
    pub keep_unquantified_actions: bool,
    pub price_strategy: PriceStrategy,
    pub observed_price_method: ObservedPriceMethod,
    pub nonprod: NonProdConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            idle_days_medium: IDLE_DAYS_MEDIUM,
            idle_days_high: IDLE_DAYS_HIGH,
            discount_gp2_to_gp3: 0.20,
            discount_standard_to_gp3: 0.40,
            discount_io1_to_gp3: 0.30,
            discount_offhours: DISCOUNT_OFFHOURS,
            discount_spot: DISCOUNT_SPOT,
            min_actionable_savings_usd: MIN_ACTIONABLE_SAVINGS_USD,
            high_cpu_threshold: 90.0,
            low_cpu_threshold: 10.0,
            spot_cpu_threshold: 20.0,
            retire_cpu_threshold: 5.0,
            full_month_ratio: 0.98,
            fallback_full_month_hours: FALLBACK_FULL_MONTH_HOURS,
            snapshot_archive_min_gb: 100.0,
            ri_high_utilization: 60.0,
            ri_medium_utilization: 30.0,
            keep_unquantified_actions: true,
            price_strategy: PriceStrategy::default(),
            observed_price_method: ObservedPriceMethod::default(),
            nonprod: NonProdConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every value once, before any stage runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("discount_gp2_to_gp3", self.discount_gp2_to_gp3),
            ("discount_standard_to_gp3", self.discount_standard_to_gp3),
            ("discount_io1_to_gp3", self.discount_io1_to_gp3),
            ("discount_offhours", self.discount_offhours),
            ("discount_spot", self.discount_spot),
            ("full_month_ratio", self.full_month_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RatioOutOfRange { name, value });
            }
        }

        for (name, value) in [
            ("high_cpu_threshold", self.high_cpu_threshold),
            ("low_cpu_threshold", self.low_cpu_threshold),
            ("spot_cpu_threshold", self.spot_cpu_threshold),
            ("retire_cpu_threshold", self.retire_cpu_threshold),
            ("ri_high_utilization", self.ri_high_utilization),
            ("ri_medium_utilization", self.ri_medium_utilization),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::PercentOutOfRange { name, value });
            }
        }

        for (name, value) in [
            ("min_actionable_savings_usd", self.min_actionable_savings_usd),
            ("fallback_full_month_hours", self.fallback_full_month_hours),
            ("snapshot_archive_min_gb", self.snapshot_archive_min_gb),
        ] {
            // NaN fails this comparison too
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        if self.idle_days_high < self.idle_days_medium {
            return Err(ConfigError::IdleDaysOrder {
                medium: self.idle_days_medium,
                high: self.idle_days_high,
            });
        }

        check_order(
            "low_cpu_threshold",
            self.low_cpu_threshold,
            "high_cpu_threshold",
            self.high_cpu_threshold,
        )?;
        check_order(
            "retire_cpu_threshold",
            self.retire_cpu_threshold,
            "high_cpu_threshold",
            self.high_cpu_threshold,
        )?;
        check_order(
            "ri_medium_utilization",
            self.ri_medium_utilization,
            "ri_high_utilization",
            self.ri_high_utilization,
        )?;

        if self.nonprod.patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::EmptyNonProdVocabulary);
        }

        Ok(())
    }
}

fn check_order(
    lower_name: &'static str,
    lower: f64,
    upper_name: &'static str,
    upper: f64,
) -> Result<(), ConfigError> {
    if lower > upper {
        return Err(ConfigError::ThresholdOrder {
            lower_name,
            lower,
            upper_name,
            upper,
        });
    }
    Ok(())
}
