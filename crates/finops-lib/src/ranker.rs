//! Deduplication, economic floor and presentation order
//!
//! Candidates are grouped by (billing period, resource). Within a group the
//! winner is the highest priority, then the highest estimated savings with
//! unknown savings last, then a stable key. The floor is applied after
//! deduplication, so a high-priority action below the floor removes the
//! resource from the list instead of promoting a lower-priority one.

use crate::models::{ActionCandidate, ActionKind, RankedAction};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Outcome of ranking one batch of candidates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankOutcome {
    /// One action per resource and period, in presentation order
    pub actions: Vec<ActionCandidate>,
    pub duplicates_removed: usize,
    pub below_floor: usize,
}

/// Ranker settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranker {
    min_savings_usd: f64,
    keep_unquantified: bool,
}

impl Ranker {
    pub fn new(min_savings_usd: f64, keep_unquantified: bool) -> Self {
        Self {
            min_savings_usd,
            keep_unquantified,
        }
    }

    pub fn rank(&self, candidates: Vec<ActionCandidate>) -> RankOutcome {
        let total = candidates.len();
        let mut groups: BTreeMap<(Option<NaiveDate>, String), Vec<ActionCandidate>> =
            BTreeMap::new();
        for candidate in candidates {
            groups
                .entry((candidate.billing_period, candidate.resource_id.clone()))
                .or_default()
                .push(candidate);
        }

        let winners: Vec<ActionCandidate> = groups
            .into_values()
            .filter_map(|mut group| {
                group.sort_by(dedup_order);
                group.into_iter().next()
            })
            .collect();
        let duplicates_removed = total - winners.len();

        let before_floor = winners.len();
        let mut actions: Vec<ActionCandidate> = winners
            .into_iter()
            .filter(|c| self.passes_floor(c))
            .collect();
        let below_floor = before_floor - actions.len();

        actions.sort_by(presentation_order);
        RankOutcome {
            actions,
            duplicates_removed,
            below_floor,
        }
    }

    fn passes_floor(&self, candidate: &ActionCandidate) -> bool {
        match candidate.estimated_monthly_savings_usd {
            Some(savings) => savings >= self.min_savings_usd,
            None => self.keep_unquantified || self.min_savings_usd <= 0.0,
        }
    }
}

/// Nulls sort after every known amount, larger amounts first
pub(crate) fn amount_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn stable_key(a: &ActionCandidate, b: &ActionCandidate) -> Ordering {
    a.region
        .cmp(&b.region)
        .then_with(|| a.resource_id.cmp(&b.resource_id))
        .then_with(|| a.billing_period.cmp(&b.billing_period))
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.target_class.cmp(&b.target_class))
}

fn dedup_order(a: &ActionCandidate, b: &ActionCandidate) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| amount_desc(a.estimated_monthly_savings_usd, b.estimated_monthly_savings_usd))
        .then_with(|| stable_key(a, b))
}

fn presentation_order(a: &ActionCandidate, b: &ActionCandidate) -> Ordering {
    amount_desc(a.estimated_monthly_savings_usd, b.estimated_monthly_savings_usd)
        .then_with(|| amount_desc(a.current_cost_usd, b.current_cost_usd))
        .then_with(|| stable_key(a, b))
}

/// Filter over the final action list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionQuery {
    pub business_area: Option<String>,
    pub region: Option<String>,
    pub kinds: Vec<ActionKind>,
    pub limit: Option<usize>,
}

impl ActionQuery {
    pub fn business_area(mut self, business_area: impl Into<String>) -> Self {
        self.business_area = Some(business_area.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn kind(mut self, kind: ActionKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Case-insensitive on labels; keeps the original ranks
    pub fn matches(&self, action: &RankedAction) -> bool {
        let label_matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            Some(wanted) => actual
                .as_deref()
                .is_some_and(|a| a.eq_ignore_ascii_case(wanted)),
            None => true,
        };
        label_matches(&self.business_area, &action.business_area)
            && label_matches(&self.region, &action.region)
            && (self.kinds.is_empty() || self.kinds.contains(&action.kind))
    }

    pub fn apply<'a>(&self, actions: &'a [RankedAction]) -> Vec<&'a RankedAction> {
        let matching = actions.iter().filter(|a| self.matches(a));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
