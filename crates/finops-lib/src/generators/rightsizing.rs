//! CPU-based rightsizing for instance-hour services

use super::{fmt_cpu, CandidateGenerator, GeneratorContext};
use crate::models::{ActionCandidate, ActionKind, Confidence, UsageRecord};
use crate::pricing::PriceLookup;
use anyhow::Result;

/// Prices of the current and recommended class in the record's region
struct PricePair {
    current: Option<f64>,
    target: Option<f64>,
}

impl PricePair {
    fn lookup(prices: &dyn PriceLookup, record: &UsageRecord, target: &str) -> Self {
        match record.region.as_deref() {
            Some(region) => Self {
                current: prices.on_demand(region, &record.resource_class),
                target: prices.on_demand(region, target),
            },
            None => Self {
                current: None,
                target: None,
            },
        }
    }

    fn any(&self) -> bool {
        self.current.is_some() || self.target.is_some()
    }

    fn confidence(&self) -> Confidence {
        if self.current.is_some() && self.target.is_some() {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }
}

/// Near-idle instances: retire or merge
pub struct RetireGenerator;

impl CandidateGenerator for RetireGenerator {
    fn name(&self) -> &'static str {
        "retire"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let threshold = ctx.config.retire_cpu_threshold;
        let candidates = ctx
            .records
            .iter()
            .filter(|r| r.service.is_compute())
            .filter(|r| r.utilization_pct.is_some_and(|cpu| cpu < threshold))
            .map(|r| {
                ActionCandidate::for_record(r, ActionKind::DeleteIdle)
                    .with_savings(r.cost_usd)
                    .with_confidence(Confidence::High)
                    .with_reason(format!(
                        "CPU {} below {:.0}%; retire or merge",
                        fmt_cpu(r.utilization_pct),
                        threshold
                    ))
            })
            .collect();
        Ok(candidates)
    }
}

/// Under-utilized (or unmeasured) instances one size down
pub struct DownsizeGenerator;

impl CandidateGenerator for DownsizeGenerator {
    fn name(&self) -> &'static str {
        "downsize"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let threshold = ctx.config.low_cpu_threshold;
        let mut candidates = Vec::new();

        for record in ctx.records.iter().filter(|r| r.service.is_compute()) {
            if record.utilization_pct.is_some_and(|cpu| cpu >= threshold) {
                continue;
            }
            let Some(target) = ctx.ladder.next_smaller(&record.resource_class) else {
                continue;
            };
            let prices = PricePair::lookup(ctx.prices, record, &target);
            if !prices.any() {
                continue;
            }
            let savings = match (prices.current, prices.target, record.quantity) {
                (Some(current), Some(smaller), Some(hours)) => Some((current - smaller) * hours),
                _ => None,
            };
            candidates.push(
                ActionCandidate::for_record(record, ActionKind::Downsize)
                    .with_reason(format!(
                        "CPU {} below {:.0}%; next size down is {}",
                        fmt_cpu(record.utilization_pct),
                        threshold,
                        target
                    ))
                    .with_confidence(prices.confidence())
                    .with_savings(savings)
                    .with_target(target),
            );
        }
        Ok(candidates)
    }
}

/// Saturated instances one size up; the "savings" is the added monthly cost
pub struct UpsizeGenerator;

impl CandidateGenerator for UpsizeGenerator {
    fn name(&self) -> &'static str {
        "upsize"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let threshold = ctx.config.high_cpu_threshold;
        let mut candidates = Vec::new();

        for record in ctx.records.iter().filter(|r| r.service.is_compute()) {
            if !record.utilization_pct.is_some_and(|cpu| cpu >= threshold) {
                continue;
            }
            let Some(target) = ctx.ladder.next_larger(&record.resource_class) else {
                continue;
            };
            let prices = PricePair::lookup(ctx.prices, record, &target);
            if !prices.any() {
                continue;
            }
            let delta = match (prices.current, prices.target, record.quantity) {
                (Some(current), Some(larger), Some(hours)) => Some((larger - current) * hours),
                _ => None,
            };
            candidates.push(
                ActionCandidate::for_record(record, ActionKind::Upsize)
                    .with_reason(format!(
                        "CPU {} at or above {:.0}%; next size up is {}",
                        fmt_cpu(record.utilization_pct),
                        threshold,
                        target
                    ))
                    .with_confidence(prices.confidence())
                    .with_savings(delta)
                    .with_target(target),
            );
        }
        Ok(candidates)
    }
}
