//! Reserved-instance purchases from external advisor output

use super::{fmt_cpu, CandidateGenerator, GeneratorContext};
use crate::models::{round_cents, ActionCandidate, ActionKind, Confidence, Service};
use anyhow::Result;

pub struct ReservedInstanceGenerator;

impl CandidateGenerator for ReservedInstanceGenerator {
    fn name(&self) -> &'static str {
        "reserved_instance"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<Vec<ActionCandidate>> {
        let config = ctx.config;
        let candidates = ctx
            .advisor
            .iter()
            .filter_map(|advice| {
                let count = advice.recommended_instances.filter(|n| *n >= 1)?;
                let confidence = match advice.avg_utilization_pct {
                    Some(u) if u >= config.ri_high_utilization => Confidence::High,
                    Some(u) if u >= config.ri_medium_utilization => Confidence::Medium,
                    _ => Confidence::Low,
                };
                let kind = ActionKind::BuyReservedInstance;
                Some(ActionCandidate {
                    service: Service::Advisor,
                    billing_period: advice.billing_period,
                    resource_id: advice.resource_key(),
                    business_area: advice.business_area.clone(),
                    region: advice.region.clone(),
                    resource_class: advice.instance_type.clone(),
                    kind,
                    target_class: None,
                    current_cost_usd: advice.monthly_cost_usd,
                    estimated_monthly_savings_usd: advice.estimated_savings_usd.map(round_cents),
                    confidence,
                    reason: format!(
                        "Advisor recommends {} x {} ({}); trailing utilization {}",
                        count,
                        advice.instance_type,
                        advice.platform_flavor,
                        fmt_cpu(advice.avg_utilization_pct)
                    ),
                    priority: kind.priority(),
                })
            })
            .collect();
        Ok(candidates)
    }
}
