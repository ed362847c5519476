//! Storage heuristics: idle volumes, tier migration and tier reviews

use super::storage_classes::{GP2, GP3, HDD, IO1, MAGNETIC, SNAPSHOT, SNAPSHOT_ARCHIVE};
use super::{CandidateGenerator, GeneratorContext};
use crate::models::{ActionCandidate, ActionKind, AttachState, Confidence, Service};
use crate::stats::percentile_cont;
use anyhow::Result;

/// Fraction used for the io1 IOPS percentile band
const IO1_IOPS_PERCENTILE: f64 = 0.25;

/// Detached volumes idle past the configured threshold
pub struct IdleVolumeGenerator;

impl CandidateGenerator for IdleVolumeGenerator {
    fn name(&self) -> &'static str {
        "idle_volume"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let config = ctx.config;
        let candidates = ctx
            .records
            .iter()
            .filter(|r| r.service == Service::Ebs && r.state == AttachState::Detached)
            .filter_map(|r| {
                let idle = r.idle_days?;
                if idle < config.idle_days_medium {
                    return None;
                }
                let confidence = if idle >= config.idle_days_high {
                    Confidence::High
                } else {
                    Confidence::Medium
                };
                Some(
                    ActionCandidate::for_record(r, ActionKind::DeleteIdle)
                        .with_savings(r.cost_usd)
                        .with_confidence(confidence)
                        .with_reason(format!("Detached for {} days", idle)),
                )
            })
            .collect();
        Ok(candidates)
    }
}

/// Previous-generation volume types and standard-tier snapshots
pub struct StorageTierGenerator;

impl CandidateGenerator for StorageTierGenerator {
    fn name(&self) -> &'static str {
        "storage_tier"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let config = ctx.config;
        let mut candidates = Vec::new();

        for record in ctx.records {
            match (record.service, record.resource_class.as_str()) {
                (Service::Ebs, GP2) => candidates.push(
                    ActionCandidate::for_record(record, ActionKind::MigrateStorageTier)
                        .with_target(GP3)
                        .with_savings(record.cost_usd.map(|c| c * config.discount_gp2_to_gp3))
                        .with_confidence(Confidence::High)
                        .with_reason(format!(
                            "gp2 to gp3 cost delta (assumed {:.0}%)",
                            config.discount_gp2_to_gp3 * 100.0
                        )),
                ),
                (Service::Ebs, MAGNETIC) => candidates.push(
                    ActionCandidate::for_record(record, ActionKind::MigrateStorageTier)
                        .with_target(GP3)
                        .with_savings(record.cost_usd.map(|c| c * config.discount_standard_to_gp3))
                        .with_confidence(Confidence::High)
                        .with_reason(format!(
                            "Legacy magnetic to gp3 (assumed {:.0}%)",
                            config.discount_standard_to_gp3 * 100.0
                        )),
                ),
                (Service::Snapshots, SNAPSHOT) => {
                    let Some(gb) = record
                        .quantity
                        .filter(|gb| *gb >= config.snapshot_archive_min_gb)
                    else {
                        continue;
                    };
                    let Some(region) = record.region.as_deref() else {
                        continue;
                    };
                    let standard = ctx.prices.on_demand(region, SNAPSHOT);
                    let archive = ctx.prices.on_demand(region, SNAPSHOT_ARCHIVE);
                    let (Some(standard), Some(archive)) = (standard, archive) else {
                        continue;
                    };
                    candidates.push(
                        ActionCandidate::for_record(record, ActionKind::MigrateStorageTier)
                            .with_target(SNAPSHOT_ARCHIVE)
                            .with_savings(Some(gb * (standard - archive)))
                            .with_confidence(Confidence::High)
                            .with_reason(format!(
                                "{:.0} GB in standard tier at ${:.4}/GB vs archive ${:.4}/GB",
                                gb, standard, archive
                            )),
                    );
                }
                _ => {}
            }
        }
        Ok(candidates)
    }
}

/// HDD volumes and io1 volumes that may be over-provisioned
pub struct StorageReviewGenerator;

impl CandidateGenerator for StorageReviewGenerator {
    fn name(&self) -> &'static str {
        "storage_review"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let config = ctx.config;
        let volumes = || ctx.records.iter().filter(|r| r.service == Service::Ebs);

        let io1_iops: Vec<f64> = volumes()
            .filter(|r| r.resource_class == IO1)
            .filter_map(|r| r.iops)
            .collect();
        let p25 = percentile_cont(&io1_iops, IO1_IOPS_PERCENTILE);

        let mut candidates = Vec::new();
        for record in volumes() {
            if HDD.contains(&record.resource_class.as_str()) {
                let (confidence, reason) = if record.state == AttachState::Detached {
                    (Confidence::High, "Detached HDD volume; delete if safe")
                } else {
                    (
                        Confidence::Medium,
                        "Validate throughput; consider gp3 if SSD fits",
                    )
                };
                candidates.push(
                    ActionCandidate::for_record(record, ActionKind::Review)
                        .with_confidence(confidence)
                        .with_reason(reason),
                );
                continue;
            }

            if record.resource_class != IO1 {
                continue;
            }
            let (Some(iops), Some(p25)) = (record.iops, p25) else {
                continue;
            };
            let confidence = if iops <= p25 {
                Confidence::Medium
            } else {
                Confidence::Low
            };
            candidates.push(
                ActionCandidate::for_record(record, ActionKind::Review)
                    .with_target(GP3)
                    .with_savings(record.cost_usd.map(|c| c * config.discount_io1_to_gp3))
                    .with_confidence(confidence)
                    .with_reason(format!(
                        "io1 usage {:.0} IOPS (fleet p25 {:.0}); consider gp3/io2",
                        iops, p25
                    )),
            );
        }
        Ok(candidates)
    }
}
