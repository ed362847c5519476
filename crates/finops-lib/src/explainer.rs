//! Human-readable suggestions per action kind

use crate::generators::storage_classes;
use crate::models::{ActionCandidate, ActionKind, RankedAction, Service};
use std::collections::HashMap;

/// Used when no template matches
pub const GENERIC_SUGGESTION: &str = "Review resource.";

/// Template lookup keyed by action kind, with storage-specific variants
#[derive(Debug, Clone)]
pub struct Explainer {
    templates: HashMap<ActionKind, String>,
    storage_variants: bool,
}

impl Default for Explainer {
    fn default() -> Self {
        let templates = [
            (ActionKind::DeleteIdle, "Retire or merge the idle instance."),
            (ActionKind::MigrateStorageTier, "Migrate to the current-generation tier."),
            (ActionKind::Downsize, "Move to the next smaller size in the family."),
            (ActionKind::Upsize, "Move to the next larger size; CPU is saturated."),
            (ActionKind::OffhoursSchedule, "Schedule a nights and weekends stop (5 days x 12 hours)."),
            (ActionKind::SpotMigration, "Run on spot capacity if the workload tolerates interruption."),
            (ActionKind::BuyReservedInstance, "Purchase reserved instances for the steady-state baseline."),
            (ActionKind::Review, GENERIC_SUGGESTION),
        ]
        .into_iter()
        .map(|(kind, text)| (kind, text.to_string()))
        .collect();
        Self {
            templates,
            storage_variants: true,
        }
    }
}

impl Explainer {
    /// Explainer with only the given templates and no storage variants
    pub fn with_templates(templates: HashMap<ActionKind, String>) -> Self {
        Self {
            templates,
            storage_variants: false,
        }
    }

    pub fn suggestion(&self, candidate: &ActionCandidate) -> String {
        if self.storage_variants {
            if let Some(text) = storage_suggestion(candidate) {
                return text.to_string();
            }
        }
        self.templates
            .get(&candidate.kind)
            .cloned()
            .unwrap_or_else(|| GENERIC_SUGGESTION.to_string())
    }

    /// Attach suggestions and 1-based ranks in the given order
    pub fn explain(&self, actions: Vec<ActionCandidate>) -> Vec<RankedAction> {
        actions
            .into_iter()
            .enumerate()
            .map(|(idx, c)| {
                let suggestion = self.suggestion(&c);
                RankedAction {
                    rank: idx + 1,
                    service: c.service,
                    billing_period: c.billing_period,
                    resource_id: c.resource_id,
                    business_area: c.business_area,
                    region: c.region,
                    resource_class: c.resource_class,
                    kind: c.kind,
                    target_class: c.target_class,
                    current_cost_usd: c.current_cost_usd,
                    estimated_monthly_savings_usd: c.estimated_monthly_savings_usd,
                    confidence: c.confidence,
                    reason: c.reason,
                    suggestion,
                }
            })
            .collect()
    }
}

fn storage_suggestion(candidate: &ActionCandidate) -> Option<&'static str> {
    let class = candidate.resource_class.as_str();
    match (candidate.service, candidate.kind) {
        (Service::Ebs, ActionKind::DeleteIdle) => {
            Some("Delete unattached long-idle volume (snapshot first if required).")
        }
        (Service::Ebs, ActionKind::MigrateStorageTier) if class == storage_classes::GP2 => {
            Some("Migrate gp2 to gp3 for lower $/GB.")
        }
        (Service::Ebs, ActionKind::MigrateStorageTier) if class == storage_classes::MAGNETIC => {
            Some("Migrate legacy magnetic to gp3.")
        }
        (Service::Snapshots, ActionKind::MigrateStorageTier) => {
            Some("Move standard-tier snapshots to the archive tier.")
        }
        (Service::Ebs, ActionKind::Review) if class == storage_classes::IO1 => {
            Some("Reduce IOPS tier or move to gp3/io2 per workload.")
        }
        (Service::Ebs, ActionKind::Review) if storage_classes::HDD.contains(&class) => {
            Some("Review sc1/st1; keep only if throughput profile truly requires HDD.")
        }
        (Service::Ebs, _) => Some("Review volume."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, UsageRecord};

    fn candidate(service: Service, class: &str, kind: ActionKind) -> ActionCandidate {
        let record = UsageRecord {
            service,
            billing_period: None,
            account_id: None,
            business_area: None,
            resource_id: "r-1".to_string(),
            region: None,
            resource_class: class.to_string(),
            purchase_option: Default::default(),
            state: Default::default(),
            utilization_pct: None,
            quantity: None,
            cost_usd: Some(40.0),
            idle_days: None,
            iops: None,
            environment: None,
            advisor_target_class: None,
            advisor_savings_usd: None,
        };
        ActionCandidate::for_record(&record, kind)
            .with_savings(Some(40.0))
            .with_confidence(Confidence::Medium)
    }

    #[test]
    fn test_storage_variants() {
        let explainer = Explainer::default();
        assert_eq!(
            explainer.suggestion(&candidate(Service::Ebs, "gp2", ActionKind::MigrateStorageTier)),
            "Migrate gp2 to gp3 for lower $/GB."
        );
        assert_eq!(
            explainer.suggestion(&candidate(Service::Ebs, "st1", ActionKind::Review)),
            "Review sc1/st1; keep only if throughput profile truly requires HDD."
        );
        assert_eq!(
            explainer.suggestion(&candidate(Service::Ebs, "gp3", ActionKind::DeleteIdle)),
            "Delete unattached long-idle volume (snapshot first if required)."
        );
    }

    #[test]
    fn test_compute_uses_kind_template() {
        let explainer = Explainer::default();
        assert_eq!(
            explainer.suggestion(&candidate(Service::Rds, "db.r5.large", ActionKind::DeleteIdle)),
            "Retire or merge the idle instance."
        );
    }

    #[test]
    fn test_missing_template_is_generic() {
        let explainer = Explainer::with_templates(HashMap::new());
        assert_eq!(
            explainer.suggestion(&candidate(Service::Ec2, "m5.large", ActionKind::Downsize)),
            GENERIC_SUGGESTION
        );
    }

    #[test]
    fn test_explain_assigns_ranks_in_order() {
        let ranked = Explainer::default().explain(vec![
            candidate(Service::Ec2, "m5.large", ActionKind::SpotMigration),
            candidate(Service::Ec2, "m5.large", ActionKind::Downsize),
        ]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[1].kind, ActionKind::Downsize);
        assert_eq!(ranked[0].estimated_monthly_savings_usd, Some(40.0));
    }
}
