//! Per-service column alias tables
//!
//! Aliases are matched against canonical headers (see `canonical_header`),
//! so `Business Area`, `business-area` and `BUSINESS_AREA` all resolve the
//! same way. The first alias present in a batch wins.

use crate::models::Service;
use std::collections::{BTreeMap, HashMap};

/// Canonical fields a raw column can map onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    BillingPeriod,
    AccountId,
    BusinessArea,
    ResourceId,
    Region,
    ResourceClass,
    PurchaseOption,
    State,
    Utilization,
    Quantity,
    Cost,
    IdleDays,
    Iops,
    Environment,
    Platform,
    RecommendedInstances,
    EstimatedSavings,
    AdvisorTarget,
    AdvisorSavings,
}

const COMMON: &[(Field, &[&str])] = &[
    (
        Field::BillingPeriod,
        &["billing_period", "bill_period", "usage_month", "recommendation_date", "month"],
    ),
    (
        Field::AccountId,
        &["account_id", "linked_account_id", "account_name", "account"],
    ),
    (Field::BusinessArea, &["business_area", "ba", "business_unit"]),
    (Field::Region, &["region", "region_code", "aws_region"]),
    (Field::Environment, &["environment", "env", "tag_environment"]),
    (Field::PurchaseOption, &["purchase_option", "pricing_model"]),
];

const CPU_ALIASES: &[&str] = &[
    "avg_cpu_14d",
    "fourteendayaveragecpuutilization",
    "fourteen_day_average_cpu_utilization",
    "cpu_pct",
];

const RDS: &[(Field, &[&str])] = &[
    (Field::ResourceId, &["resource_id", "db_id", "db_instance_identifier"]),
    (
        Field::ResourceClass,
        &["instance_type", "instance_class", "db_instance_class", "current_class"],
    ),
    (Field::Utilization, CPU_ALIASES),
    (
        Field::Quantity,
        &["usage_quantity", "hours", "usage_quantity_hours", "usage_hours"],
    ),
    (
        Field::Cost,
        &["public_cost", "cost_usd", "total_cost_usd", "cost", "monthly_cost_usd"],
    ),
];

const EC2: &[(Field, &[&str])] = &[
    (Field::ResourceId, &["resource_id", "instance_id"]),
    (
        Field::ResourceClass,
        &["current_instance_type", "instance_type"],
    ),
    (Field::Utilization, CPU_ALIASES),
    (
        Field::Quantity,
        &["usage_quantity_hours", "usage_quantity", "hours", "usage_hours"],
    ),
    (
        Field::Cost,
        &["total_cost_usd", "public_cost", "cost_usd", "cost", "monthly_cost_usd"],
    ),
    (
        Field::AdvisorTarget,
        &["recommended_instance_type", "ta_recommended_instance_type"],
    ),
    (
        Field::AdvisorSavings,
        &["ta_rightsize_savings_usd", "ta_estimated_monthly_savings_usd"],
    ),
];

const EBS: &[(Field, &[&str])] = &[
    (Field::ResourceId, &["resource_id", "volume_id"]),
    (Field::ResourceClass, &["volume_type"]),
    (Field::State, &["volume_state", "attach_state", "state"]),
    (
        Field::IdleDays,
        &["days_since_last_attachment", "days_since_last_attached"],
    ),
    (
        Field::Quantity,
        &["usage_storage_gb_mo", "size_gb", "usage_quantity"],
    ),
    (Field::Iops, &["usage_iops_mo", "iops"]),
    (
        Field::Cost,
        &["cost_mo_usd", "cost_mo", "monthly_cost_usd", "cost_usd", "public_cost"],
    ),
];

const SNAPSHOTS: &[(Field, &[&str])] = &[
    (Field::ResourceId, &["resource_id", "snapshot_arn", "snapshot_id"]),
    (Field::ResourceClass, &["snapshot_type", "usage_type"]),
    (Field::Quantity, &["usage_quantity_gb", "usage_quantity"]),
    (
        Field::Cost,
        &["public_cost_usd", "public_cost", "cost_usd", "cost"],
    ),
];

const ADVISOR: &[(Field, &[&str])] = &[
    (Field::ResourceClass, &["instance_type"]),
    (Field::Platform, &["platform"]),
    (
        Field::RecommendedInstances,
        &[
            "ta_rec_instances",
            "number_of_instances_to_purchase",
            "recommended_instances",
        ],
    ),
    (
        Field::EstimatedSavings,
        &[
            "ta_est_savings",
            "ta_est_savings_usd",
            "existing_savings_usd",
            "estimated_savings_usd",
        ],
    ),
    (
        Field::Utilization,
        &["avg_util_6mo_pct", "average_utilization", "avg_cpu_14d"],
    ),
    (
        Field::Cost,
        &["recurring_monthly_cost_usd", "current_cost_usd"],
    ),
];

/// Alias lists keyed by service and canonical field
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    by_service: HashMap<Service, BTreeMap<Field, Vec<String>>>,
}

impl ColumnAliases {
    /// Built-in aliases for every supported export layout
    pub fn builtin() -> Self {
        let mut aliases = Self {
            by_service: HashMap::new(),
        };
        for (service, specific) in [
            (Service::Rds, RDS),
            (Service::Ec2, EC2),
            (Service::Ebs, EBS),
            (Service::Snapshots, SNAPSHOTS),
            (Service::Advisor, ADVISOR),
        ] {
            for (field, names) in COMMON.iter().chain(specific.iter()) {
                for name in names.iter() {
                    aliases.add(service, *field, name);
                }
            }
        }
        aliases
    }

    /// Register an extra accepted column name (appended after built-ins)
    pub fn add(&mut self, service: Service, field: Field, column: &str) {
        let names = self
            .by_service
            .entry(service)
            .or_default()
            .entry(field)
            .or_default();
        let column = super::parse::canonical_header(column);
        if !names.contains(&column) {
            names.push(column);
        }
    }

    pub fn names(&self, service: Service, field: Field) -> &[String] {
        self.by_service
            .get(&service)
            .and_then(|fields| fields.get(&field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve each field to a column index of the given canonical headers
    pub fn resolve(&self, service: Service, headers: &[String]) -> BTreeMap<Field, usize> {
        let mut resolved = BTreeMap::new();
        let Some(fields) = self.by_service.get(&service) else {
            return resolved;
        };
        for (field, names) in fields {
            if let Some(idx) = names
                .iter()
                .find_map(|name| headers.iter().position(|h| h == name))
            {
                resolved.insert(*field, idx);
            }
        }
        resolved
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_first_alias_present_wins() {
        let aliases = ColumnAliases::builtin();
        let resolved = aliases.resolve(
            Service::Ebs,
            &headers(&["days_since_last_attached", "days_since_last_attachment"]),
        );
        assert_eq!(resolved.get(&Field::IdleDays), Some(&1));
    }

    #[test]
    fn test_missing_columns_are_absent() {
        let aliases = ColumnAliases::builtin();
        let resolved = aliases.resolve(Service::Rds, &headers(&["resource_id", "instance_type"]));
        assert_eq!(resolved.get(&Field::ResourceId), Some(&0));
        assert_eq!(resolved.get(&Field::ResourceClass), Some(&1));
        assert!(resolved.get(&Field::Utilization).is_none());
    }

    #[test]
    fn test_custom_alias_is_canonicalized() {
        let mut aliases = ColumnAliases::builtin();
        aliases.add(Service::Ec2, Field::BusinessArea, "Cost Center");
        assert!(aliases
            .names(Service::Ec2, Field::BusinessArea)
            .contains(&"cost_center".to_string()));
        let resolved = aliases.resolve(Service::Ec2, &headers(&["cost_center"]));
        assert_eq!(resolved.get(&Field::BusinessArea), Some(&0));
    }
}
