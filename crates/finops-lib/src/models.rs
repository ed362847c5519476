//! Core data models for the savings pipeline

use crate::error::ModelParseError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder used wherever a region or business area is absent
pub const UNKNOWN_LABEL: &str = "(unknown)";

/// Billing source a record was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Rds,
    Ec2,
    Ebs,
    Snapshots,
    /// Reserved-instance purchase advice (not per-resource usage)
    Advisor,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::Rds,
        Service::Ec2,
        Service::Ebs,
        Service::Snapshots,
        Service::Advisor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Rds => "rds",
            Service::Ec2 => "ec2",
            Service::Ebs => "ebs",
            Service::Snapshots => "snapshots",
            Service::Advisor => "advisor",
        }
    }

    /// Instance-hour billed services that take part in rightsizing
    pub fn is_compute(&self) -> bool {
        matches!(self, Service::Rds | Service::Ec2)
    }

    /// GB-month billed services
    pub fn is_storage(&self) -> bool {
        matches!(self, Service::Ebs | Service::Snapshots)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rds" => Ok(Service::Rds),
            "ec2" => Ok(Service::Ec2),
            "ebs" => Ok(Service::Ebs),
            "snapshot" | "snapshots" => Ok(Service::Snapshots),
            "advisor" | "ta" | "trusted_advisor" => Ok(Service::Advisor),
            other => Err(ModelParseError::UnknownService(other.to_string())),
        }
    }
}

/// Attachment state of a volume, normalized to a closed vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttachState {
    Attached,
    Detached,
    #[default]
    Unknown,
}

/// How a resource is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum PurchaseOption {
    #[default]
    OnDemand,
    Spot,
    Reserved,
    SavingsPlan,
    Other,
}

impl PurchaseOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOption::OnDemand => "OnDemand",
            PurchaseOption::Spot => "Spot",
            PurchaseOption::Reserved => "Reserved",
            PurchaseOption::SavingsPlan => "SavingsPlan",
            PurchaseOption::Other => "Other",
        }
    }
}

impl fmt::Display for PurchaseOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence attached to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of savings action a generator can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    DeleteIdle,
    MigrateStorageTier,
    Downsize,
    Upsize,
    OffhoursSchedule,
    SpotMigration,
    BuyReservedInstance,
    Review,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::DeleteIdle,
        ActionKind::MigrateStorageTier,
        ActionKind::Downsize,
        ActionKind::Upsize,
        ActionKind::OffhoursSchedule,
        ActionKind::SpotMigration,
        ActionKind::BuyReservedInstance,
        ActionKind::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::DeleteIdle => "delete_idle",
            ActionKind::MigrateStorageTier => "migrate_storage_tier",
            ActionKind::Downsize => "downsize",
            ActionKind::Upsize => "upsize",
            ActionKind::OffhoursSchedule => "offhours_schedule",
            ActionKind::SpotMigration => "spot_migration",
            ActionKind::BuyReservedInstance => "buy_reserved_instance",
            ActionKind::Review => "review",
        }
    }

    /// Fixed total order used when candidates compete for one resource; higher wins.
    pub fn priority(&self) -> i32 {
        match self {
            ActionKind::DeleteIdle => 7,
            ActionKind::OffhoursSchedule => 6,
            ActionKind::MigrateStorageTier => 5,
            ActionKind::BuyReservedInstance => 4,
            ActionKind::Downsize => 3,
            ActionKind::Upsize => 2,
            ActionKind::SpotMigration => 1,
            ActionKind::Review => 0,
        }
    }

    /// Kinds whose estimate is money spent, not saved
    pub fn adds_cost(&self) -> bool {
        matches!(self, ActionKind::Upsize)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ActionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ModelParseError::UnknownActionKind(s.to_string()))
    }
}

/// One billed resource for one billing period, in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub service: Service,
    pub billing_period: Option<NaiveDate>,
    pub account_id: Option<String>,
    pub business_area: Option<String>,
    pub resource_id: String,
    pub region: Option<String>,
    /// Instance class, volume type or snapshot tier, lower-cased
    pub resource_class: String,
    pub purchase_option: PurchaseOption,
    pub state: AttachState,
    /// 14-day average CPU percent, `None` when absent or out of [0, 100]
    pub utilization_pct: Option<f64>,
    /// Hours used or GB-month billed, `None` when blank or unparseable
    pub quantity: Option<f64>,
    /// Monthly cost, `None` when blank or unparseable
    pub cost_usd: Option<f64>,
    pub idle_days: Option<u32>,
    pub iops: Option<f64>,
    /// Explicit environment tag, if the export carries one
    pub environment: Option<String>,
    /// Rightsizing target suggested by the external advisor, lower-cased
    pub advisor_target_class: Option<String>,
    pub advisor_savings_usd: Option<f64>,
}

impl UsageRecord {
    pub fn region_label(&self) -> &str {
        self.region.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn business_area_label(&self) -> &str {
        self.business_area.as_deref().unwrap_or(UNKNOWN_LABEL)
    }
}

/// Coarse operating-system family of an advised instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformFamily {
    Windows,
    Linux,
    Other,
}

/// Reserved-instance purchase advice from an external advisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorRecord {
    pub billing_period: Option<NaiveDate>,
    pub business_area: Option<String>,
    pub region: Option<String>,
    pub instance_type: String,
    pub platform_family: PlatformFamily,
    pub platform_flavor: String,
    pub recommended_instances: Option<u32>,
    pub estimated_savings_usd: Option<f64>,
    /// Trailing (six month) utilization percent
    pub avg_utilization_pct: Option<f64>,
    pub monthly_cost_usd: Option<f64>,
}

impl AdvisorRecord {
    /// Synthetic identifier; advice is per class and platform, not per resource
    pub fn resource_key(&self) -> String {
        format!(
            "ri:{}:{}:{}",
            self.region.as_deref().unwrap_or(UNKNOWN_LABEL),
            self.instance_type,
            self.platform_flavor
        )
    }
}

/// A candidate emitted by one generator; several may exist per resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCandidate {
    pub service: Service,
    pub billing_period: Option<NaiveDate>,
    pub resource_id: String,
    pub business_area: Option<String>,
    pub region: Option<String>,
    pub resource_class: String,
    pub kind: ActionKind,
    /// Recommended class for rightsizing and tier moves
    pub target_class: Option<String>,
    pub current_cost_usd: Option<f64>,
    /// `None` means recommended but not quantified
    pub estimated_monthly_savings_usd: Option<f64>,
    pub confidence: Confidence,
    pub reason: String,
    pub priority: i32,
}

impl ActionCandidate {
    /// Start a candidate from the record it was derived from
    pub fn for_record(record: &UsageRecord, kind: ActionKind) -> Self {
        Self {
            service: record.service,
            billing_period: record.billing_period,
            resource_id: record.resource_id.clone(),
            business_area: record.business_area.clone(),
            region: record.region.clone(),
            resource_class: record.resource_class.clone(),
            kind,
            target_class: None,
            current_cost_usd: record.cost_usd,
            estimated_monthly_savings_usd: None,
            confidence: Confidence::Low,
            reason: String::new(),
            priority: kind.priority(),
        }
    }

    pub fn with_savings(mut self, savings: Option<f64>) -> Self {
        self.estimated_monthly_savings_usd = savings.map(round_cents);
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_class = Some(target.into());
        self
    }
}

/// Final, deduplicated and explained action for one resource and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAction {
    pub rank: usize,
    pub service: Service,
    pub billing_period: Option<NaiveDate>,
    pub resource_id: String,
    pub business_area: Option<String>,
    pub region: Option<String>,
    pub resource_class: String,
    pub kind: ActionKind,
    pub target_class: Option<String>,
    pub current_cost_usd: Option<f64>,
    pub estimated_monthly_savings_usd: Option<f64>,
    pub confidence: Confidence,
    pub reason: String,
    pub suggestion: String,
}

/// Round a dollar amount to cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_round_trips_through_str() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
        assert_eq!(
            "offhours-schedule".parse::<ActionKind>().unwrap(),
            ActionKind::OffhoursSchedule
        );
        assert!("shutdown".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_priority_is_a_total_order() {
        let mut priorities: Vec<i32> = ActionKind::ALL.iter().map(|k| k.priority()).collect();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), ActionKind::ALL.len());
        assert!(ActionKind::DeleteIdle.priority() > ActionKind::OffhoursSchedule.priority());
        assert!(ActionKind::OffhoursSchedule.priority() > ActionKind::Downsize.priority());
        assert!(ActionKind::Downsize.priority() > ActionKind::SpotMigration.priority());
    }

    #[test]
    fn test_service_aliases() {
        assert_eq!("Snapshot".parse::<Service>().unwrap(), Service::Snapshots);
        assert_eq!("ta".parse::<Service>().unwrap(), Service::Advisor);
        assert!("lambda".parse::<Service>().is_err());
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(72.004), 72.0);
        assert_eq!(round_cents(64.999), 65.0);
    }
}
