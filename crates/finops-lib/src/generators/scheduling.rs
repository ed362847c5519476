//! Off-hours scheduling and spot migration

use super::{fmt_cpu, CandidateGenerator, GeneratorContext};
use crate::config::PipelineConfig;
use crate::models::{ActionCandidate, ActionKind, Confidence, PurchaseOption, Service, UsageRecord};
use crate::nonprod::Environment;
use crate::stats::days_in_month;
use anyhow::Result;

/// Hours that count as "always on" for the record's billing month
pub fn full_month_hours(record: &UsageRecord, config: &PipelineConfig) -> f64 {
    match record.billing_period {
        Some(period) => days_in_month(period) as f64 * 24.0 * config.full_month_ratio,
        None => config.fallback_full_month_hours,
    }
}

/// Non-production instances running around the clock
pub struct OffHoursGenerator;

impl CandidateGenerator for OffHoursGenerator {
    fn name(&self) -> &'static str {
        "offhours"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let config = ctx.config;
        let mut candidates = Vec::new();

        for record in ctx.records.iter().filter(|r| r.service.is_compute()) {
            let environment = ctx.environments.classify(record);
            if !environment.is_nonprod() {
                continue;
            }
            let threshold = full_month_hours(record, config);
            let Some(hours) = record.quantity.filter(|h| *h >= threshold) else {
                continue;
            };
            let confidence = match environment {
                Environment::NonProdByName => Confidence::High,
                _ => Confidence::Medium,
            };
            candidates.push(
                ActionCandidate::for_record(record, ActionKind::OffhoursSchedule)
                    .with_savings(record.cost_usd.map(|c| c * config.discount_offhours))
                    .with_confidence(confidence)
                    .with_reason(format!(
                        "Non-prod running {:.0}h of {:.0}h; 5d x 12h schedule saves ~{:.0}%",
                        hours,
                        threshold,
                        config.discount_offhours * 100.0
                    )),
            );
        }
        Ok(candidates)
    }
}

/// Low-utilization on-demand EC2 capacity
pub struct SpotGenerator;

impl CandidateGenerator for SpotGenerator {
    fn name(&self) -> &'static str {
        "spot"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let config = ctx.config;
        let candidates = ctx
            .records
            .iter()
            .filter(|r| r.service == Service::Ec2 && r.purchase_option == PurchaseOption::OnDemand)
            .filter_map(|r| {
                let cpu = r.utilization_pct?;
                if cpu >= config.spot_cpu_threshold {
                    return None;
                }
                let confidence = if ctx
                    .environments
                    .matches_name(&r.resource_id, r.business_area.as_deref())
                {
                    Confidence::High
                } else if cpu < config.low_cpu_threshold {
                    Confidence::Medium
                } else {
                    Confidence::Low
                };
                Some(
                    ActionCandidate::for_record(r, ActionKind::SpotMigration)
                        .with_target(PurchaseOption::Spot.as_str())
                        .with_savings(r.cost_usd.map(|c| c * config.discount_spot))
                        .with_confidence(confidence)
                        .with_reason(format!(
                            "On-demand at CPU {}; spot assumed {:.0}% cheaper",
                            fmt_cpu(Some(cpu)),
                            config.discount_spot * 100.0
                        )),
                )
            })
            .collect();
        Ok(candidates)
    }
}
