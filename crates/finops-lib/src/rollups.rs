//! Leadership rollups over the normalized usage and the ranked actions

use crate::models::{
    round_cents, ActionCandidate, ActionKind, RankedAction, Service, UsageRecord, UNKNOWN_LABEL,
};
use crate::ranker::amount_desc;
use crate::stats::percentile_cont;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Percentile of group sizes at or above which a group counts as sprawl
pub const SPRAWL_PERCENTILE: f64 = 0.90;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessAreaCost {
    pub business_area: String,
    pub resources: usize,
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCost {
    pub business_area: String,
    pub region: String,
    pub resources: usize,
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprawlCluster {
    pub service: Service,
    pub billing_period: Option<NaiveDate>,
    pub business_area: String,
    pub region: String,
    pub resource_count: usize,
    pub total_cost_usd: f64,
    pub total_quantity: f64,
    /// Group-size percentile the cluster met
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessAreaSavings {
    pub business_area: String,
    pub actions: usize,
    /// Unquantified actions count as zero; upsizes are excluded
    pub potential_savings_usd: f64,
    /// Monthly spend the recommended upsizes would add
    pub added_cost_usd: f64,
}

/// How the advisor's rightsizing target relates to ours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorVerdict {
    Agree,
    Different,
    NoAdvice,
}

impl AdvisorVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorVerdict::Agree => "Agree",
            AdvisorVerdict::Different => "Different",
            AdvisorVerdict::NoAdvice => "Advisor: none",
        }
    }
}

impl fmt::Display for AdvisorVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downsize candidate set against the advisor's recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorComparison {
    pub billing_period: Option<NaiveDate>,
    pub business_area: Option<String>,
    pub resource_id: String,
    pub region: Option<String>,
    pub resource_class: String,
    pub utilization_pct: Option<f64>,
    pub our_target_class: String,
    pub our_savings_usd: Option<f64>,
    pub advisor_target_class: Option<String>,
    pub advisor_savings_usd: Option<f64>,
    pub verdict: AdvisorVerdict,
}

#[derive(Default)]
struct Bucket<'a> {
    resources: BTreeSet<&'a str>,
    cost: f64,
    quantity: f64,
}

impl<'a> Bucket<'a> {
    fn add(&mut self, record: &'a UsageRecord) {
        self.resources.insert(record.resource_id.as_str());
        if let Some(cost) = record.cost_usd {
            self.cost += cost;
        }
        if let Some(quantity) = record.quantity {
            self.quantity += quantity;
        }
    }
}

fn by_cost_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.total_cmp(&a)
}

/// Total cost per business area, most expensive first
pub fn cost_by_business_area(records: &[UsageRecord]) -> Vec<BusinessAreaCost> {
    let mut buckets: BTreeMap<&str, Bucket<'_>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(record.business_area_label())
            .or_default()
            .add(record);
    }
    let mut rows: Vec<BusinessAreaCost> = buckets
        .into_iter()
        .map(|(ba, bucket)| BusinessAreaCost {
            business_area: ba.to_string(),
            resources: bucket.resources.len(),
            total_cost_usd: round_cents(bucket.cost),
        })
        .collect();
    rows.sort_by(|a, b| by_cost_desc(a.total_cost_usd, b.total_cost_usd));
    rows
}

/// Total cost per (business area, region), most expensive first
pub fn cost_by_region(records: &[UsageRecord]) -> Vec<RegionCost> {
    let mut buckets: BTreeMap<(&str, &str), Bucket<'_>> = BTreeMap::new();
    for record in records {
        buckets
            .entry((record.business_area_label(), record.region_label()))
            .or_default()
            .add(record);
    }
    let mut rows: Vec<RegionCost> = buckets
        .into_iter()
        .map(|((ba, region), bucket)| RegionCost {
            business_area: ba.to_string(),
            region: region.to_string(),
            resources: bucket.resources.len(),
            total_cost_usd: round_cents(bucket.cost),
        })
        .collect();
    rows.sort_by(|a, b| by_cost_desc(a.total_cost_usd, b.total_cost_usd));
    rows
}

/// (period, business area, region) groups with unusually many resources
///
/// Computed per service; a group is sprawl when its distinct resource count
/// is at least the continuous 90th percentile of that service's group counts.
pub fn sprawl_clusters(records: &[UsageRecord]) -> Vec<SprawlCluster> {
    type GroupKey<'a> = (Service, Option<NaiveDate>, &'a str, &'a str);
    let mut groups: BTreeMap<GroupKey<'_>, Bucket<'_>> = BTreeMap::new();
    for record in records {
        groups
            .entry((
                record.service,
                record.billing_period,
                record.business_area_label(),
                record.region_label(),
            ))
            .or_default()
            .add(record);
    }

    let mut counts_by_service: BTreeMap<Service, Vec<f64>> = BTreeMap::new();
    for ((service, ..), bucket) in &groups {
        counts_by_service
            .entry(*service)
            .or_default()
            .push(bucket.resources.len() as f64);
    }
    let thresholds: BTreeMap<Service, f64> = counts_by_service
        .into_iter()
        .filter_map(|(service, counts)| {
            percentile_cont(&counts, SPRAWL_PERCENTILE).map(|p| (service, p))
        })
        .collect();

    let mut clusters: Vec<SprawlCluster> = groups
        .into_iter()
        .filter_map(|((service, period, ba, region), bucket)| {
            let threshold = *thresholds.get(&service)?;
            let count = bucket.resources.len();
            (count as f64 >= threshold).then(|| SprawlCluster {
                service,
                billing_period: period,
                business_area: ba.to_string(),
                region: region.to_string(),
                resource_count: count,
                total_cost_usd: round_cents(bucket.cost),
                total_quantity: bucket.quantity,
                threshold,
            })
        })
        .collect();
    clusters.sort_by(|a, b| {
        b.resource_count
            .cmp(&a.resource_count)
            .then_with(|| by_cost_desc(a.total_cost_usd, b.total_cost_usd))
    });
    clusters
}

/// Potential savings per business area over a ranked action list
pub fn savings_by_business_area(actions: &[RankedAction]) -> Vec<BusinessAreaSavings> {
    let mut totals: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();
    for action in actions {
        let entry = totals
            .entry(action.business_area.as_deref().unwrap_or(UNKNOWN_LABEL))
            .or_default();
        entry.0 += 1;
        let amount = action.estimated_monthly_savings_usd.unwrap_or(0.0);
        if action.kind.adds_cost() {
            entry.2 += amount;
        } else {
            entry.1 += amount;
        }
    }
    let mut rows: Vec<BusinessAreaSavings> = totals
        .into_iter()
        .map(|(ba, (actions, savings, added))| BusinessAreaSavings {
            business_area: ba.to_string(),
            actions,
            potential_savings_usd: round_cents(savings),
            added_cost_usd: round_cents(added),
        })
        .collect();
    rows.sort_by(|a, b| by_cost_desc(a.potential_savings_usd, b.potential_savings_usd));
    rows
}

/// Join EC2 downsize candidates with the advisor columns of their records
///
/// Candidates of other kinds or services are ignored. Ordered by our
/// estimated savings, unquantified last.
pub fn advisor_comparison(
    records: &[UsageRecord],
    candidates: &[ActionCandidate],
) -> Vec<AdvisorComparison> {
    let by_key: HashMap<(Option<NaiveDate>, &str, &str), &UsageRecord> = records
        .iter()
        .filter(|r| r.service == Service::Ec2)
        .map(|r| {
            (
                (r.billing_period, r.resource_id.as_str(), r.resource_class.as_str()),
                r,
            )
        })
        .collect();

    let mut rows: Vec<AdvisorComparison> = candidates
        .iter()
        .filter(|c| c.service == Service::Ec2 && c.kind == ActionKind::Downsize)
        .filter_map(|c| {
            let ours = c.target_class.clone()?;
            let record = by_key.get(&(
                c.billing_period,
                c.resource_id.as_str(),
                c.resource_class.as_str(),
            ))?;
            let verdict = match record.advisor_target_class.as_deref() {
                None => AdvisorVerdict::NoAdvice,
                Some(theirs) if theirs.eq_ignore_ascii_case(&ours) => AdvisorVerdict::Agree,
                Some(_) => AdvisorVerdict::Different,
            };
            Some(AdvisorComparison {
                billing_period: c.billing_period,
                business_area: c.business_area.clone(),
                resource_id: c.resource_id.clone(),
                region: c.region.clone(),
                resource_class: c.resource_class.clone(),
                utilization_pct: record.utilization_pct,
                our_target_class: ours,
                our_savings_usd: c.estimated_monthly_savings_usd,
                advisor_target_class: record.advisor_target_class.clone(),
                advisor_savings_usd: record.advisor_savings_usd,
                verdict,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        amount_desc(a.our_savings_usd, b.our_savings_usd)
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });
    rows
}
