//! End-to-end tests: raw batches in, ranked actions out

use finops_lib::rollups::AdvisorVerdict;
use finops_lib::{
    ActionKind, Confidence, Pipeline, PipelineConfig, PriceStrategy, RawBatch, Service,
    StaticPriceCatalog, UsageStore,
};
use std::collections::HashSet;
use std::sync::Arc;

fn batch(service: Service, headers: &[&str], rows: &[&[&str]]) -> RawBatch {
    let mut batch = RawBatch::new(service, headers.iter().map(|h| h.to_string()).collect());
    for row in rows {
        batch.push_row(row.iter().map(|c| c.to_string()).collect());
    }
    batch
}

const EBS_HEADERS: &[&str] = &[
    "Billing Period",
    "Volume ID",
    "Region",
    "Volume Type",
    "Volume State",
    "Days Since Last Attachment",
    "Size GB",
    "Cost USD",
];

const COMPUTE_HEADERS: &[&str] = &[
    "billing_period",
    "resource_id",
    "business_area",
    "region",
    "instance_type",
    "avg_cpu_14d",
    "usage_quantity",
    "total_cost_usd",
];

fn load(batches: &[RawBatch]) -> UsageStore {
    let store = UsageStore::default();
    store.reload(batches).unwrap();
    store
}

fn default_pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default()).unwrap()
}

/// Mixed fleet touching every generator family
fn mixed_fleet() -> Vec<RawBatch> {
    vec![
        batch(
            Service::Ebs,
            EBS_HEADERS,
            &[
                &["2024-04", "vol-idle", "us-east-1", "gp3", "available", "95", "500", "$50.00"],
                &["2024-04", "vol-recent", "us-east-1", "gp3", "available", "40", "300", "30"],
                &["2024-04", "vol-gp2", "us-east-1", "gp2", "in-use", "", "1000", "200"],
                &["2024-04", "vol-small", "us-east-1", "gp2", "in-use", "", "100", "10"],
                &["2024-04", "vol-hdd", "us-east-1", "st1", "in-use", "", "2000", "90"],
            ],
        ),
        batch(
            Service::Rds,
            COMPUTE_HEADERS,
            &[
                &["2024-04", "db-orders", "Retail", "us-east-1", "db.r5.xlarge", "8", "720", "345.60"],
                &["2024-04", "db-peer", "Retail", "us-east-1", "db.r5.large", "50", "720", "273.60"],
            ],
        ),
        batch(
            Service::Ec2,
            COMPUTE_HEADERS,
            &[
                &["2024-04", "dev-web-01", "Retail", "us-east-1", "m5.large", "35", "720", "100"],
                &["2024-04", "dev-api-01", "Retail", "us-east-1", "m5.xlarge", "8", "720", "138.24"],
                &["2024-04", "api-02", "Retail", "us-east-1", "m5.large", "50", "720", "69.12"],
            ],
        ),
    ]
}

#[test]
fn test_idle_volume_becomes_high_confidence_delete() {
    let store = load(&mixed_fleet());
    let report = default_pipeline().run(&store);

    let action = report
        .actions
        .iter()
        .find(|a| a.resource_id == "vol-idle")
        .unwrap();
    assert_eq!(action.kind, ActionKind::DeleteIdle);
    assert_eq!(action.confidence, Confidence::High);
    assert_eq!(action.estimated_monthly_savings_usd, Some(50.0));
    assert_eq!(
        action.suggestion,
        "Delete unattached long-idle volume (snapshot first if required)."
    );

    let recent = report
        .actions
        .iter()
        .find(|a| a.resource_id == "vol-recent")
        .unwrap();
    assert_eq!(recent.confidence, Confidence::Medium);
}

#[test]
fn test_downsize_priced_from_observed_costs() {
    let store = load(&mixed_fleet());
    let report = default_pipeline().run(&store);

    let action = report
        .actions
        .iter()
        .find(|a| a.resource_id == "db-orders")
        .unwrap();
    assert_eq!(action.kind, ActionKind::Downsize);
    assert_eq!(action.target_class.as_deref(), Some("db.r5.large"));
    assert_eq!(action.estimated_monthly_savings_usd, Some(72.0));
    assert_eq!(action.confidence, Confidence::High);
}

#[test]
fn test_four_percent_cpu_is_retired_before_downsized() {
    let fleet = [batch(
        Service::Rds,
        COMPUTE_HEADERS,
        &[
            &["2024-04", "db-orders", "Retail", "us-east-1", "db.r5.xlarge", "4", "720", "345.60"],
            &["2024-04", "db-peer", "Retail", "us-east-1", "db.r5.large", "50", "720", "273.60"],
        ],
    )];
    let store = load(&fleet);

    // Below retire_cpu_threshold the retire candidate (delete_idle) outranks the $72 downsize
    let report = default_pipeline().run(&store);
    assert_eq!(report.stats.candidates_by_kind[&ActionKind::Downsize], 1);
    assert_eq!(report.stats.duplicates_removed, 1);
    assert_eq!(report.actions.len(), 1);
    let action = &report.actions[0];
    assert_eq!(action.resource_id, "db-orders");
    assert_eq!(action.kind, ActionKind::DeleteIdle);
    assert_eq!(action.estimated_monthly_savings_usd, Some(345.6));
    assert_eq!(action.confidence, Confidence::High);

    let config = PipelineConfig {
        retire_cpu_threshold: 0.0,
        ..Default::default()
    };
    let report = Pipeline::new(config).unwrap().run(&store);
    assert_eq!(report.actions.len(), 1);
    let action = &report.actions[0];
    assert_eq!(action.kind, ActionKind::Downsize);
    assert_eq!(action.target_class.as_deref(), Some("db.r5.large"));
    assert_eq!(action.estimated_monthly_savings_usd, Some(72.0));
    assert_eq!(action.confidence, Confidence::High);
}

#[test]
fn test_idle_volume_with_blank_cost_is_kept_unquantified() {
    let store = load(&[batch(
        Service::Ebs,
        EBS_HEADERS,
        &[&["2024-04", "vol-nocost", "us-east-1", "gp3", "available", "95", "500", ""]],
    )]);
    let dataset = store.snapshot();
    assert_eq!(dataset.records[0].cost_usd, None);

    let report = default_pipeline().run(&store);
    assert_eq!(report.stats.below_floor, 0);
    assert_eq!(report.actions.len(), 1);
    let action = &report.actions[0];
    assert_eq!(action.resource_id, "vol-nocost");
    assert_eq!(action.kind, ActionKind::DeleteIdle);
    assert_eq!(action.confidence, Confidence::High);
    assert_eq!(action.estimated_monthly_savings_usd, None);
    assert_eq!(action.current_cost_usd, None);
}

#[test]
fn test_nonprod_always_on_gets_offhours() {
    let store = load(&mixed_fleet());
    let report = default_pipeline().run(&store);

    let action = report
        .actions
        .iter()
        .find(|a| a.resource_id == "dev-web-01")
        .unwrap();
    assert_eq!(action.kind, ActionKind::OffhoursSchedule);
    assert_eq!(action.estimated_monthly_savings_usd, Some(65.0));
    assert_eq!(action.confidence, Confidence::High);
}

#[test]
fn test_offhours_beats_downsize_and_spot() {
    let store = load(&mixed_fleet());
    let report = default_pipeline().run(&store);

    // dev-api-01 qualifies for offhours, downsize and spot
    let actions: Vec<_> = report
        .actions
        .iter()
        .filter(|a| a.resource_id == "dev-api-01")
        .collect();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionKind::OffhoursSchedule);
    assert!(report.stats.duplicates_removed >= 2);
    assert!(report.stats.candidates_by_kind[&ActionKind::SpotMigration] >= 1);
}

#[test]
fn test_economic_floor_and_dedup_hold() {
    let store = load(&mixed_fleet());
    let config = PipelineConfig::default();
    let report = Pipeline::new(config.clone()).unwrap().run(&store);

    // vol-small would save $2 moving to gp3
    assert!(report.actions.iter().all(|a| a.resource_id != "vol-small"));
    assert!(report.stats.below_floor >= 1);

    for action in &report.actions {
        if let Some(savings) = action.estimated_monthly_savings_usd {
            assert!(savings >= config.min_actionable_savings_usd);
        }
    }

    let mut seen = HashSet::new();
    for action in &report.actions {
        assert!(seen.insert((action.billing_period, action.resource_id.clone())));
    }

    let ranks: Vec<usize> = report.actions.iter().map(|a| a.rank).collect();
    assert_eq!(ranks, (1..=report.actions.len()).collect::<Vec<_>>());
}

#[test]
fn test_unquantified_review_is_kept() {
    let store = load(&mixed_fleet());
    let report = default_pipeline().run(&store);

    let hdd = report
        .actions
        .iter()
        .find(|a| a.resource_id == "vol-hdd")
        .unwrap();
    assert_eq!(hdd.kind, ActionKind::Review);
    assert_eq!(hdd.estimated_monthly_savings_usd, None);
    // Unquantified actions sort after every quantified one
    assert_eq!(hdd.rank, report.actions.len());
}

#[test]
fn test_downsize_targets_compared_with_advisor() {
    let store = load(&[batch(
        Service::Ec2,
        &[
            "billing_period",
            "instance_id",
            "region",
            "current_instance_type",
            "avg_cpu_14d",
            "usage_quantity_hours",
            "total_cost_usd",
            "recommended_instance_type",
            "ta_rightsize_savings_usd",
        ],
        &[
            &["2024-04", "i-agree", "us-east-1", "m5.xlarge", "6", "720", "138.24", "m5.large", "60"],
            &["2024-04", "i-differ", "us-east-1", "m5.xlarge", "7", "720", "138.24", "t3.large", "80"],
            &["2024-04", "i-silent", "us-east-1", "m5.xlarge", "8", "720", "138.24", "", ""],
            &["2024-04", "i-busy", "us-east-1", "m5.large", "60", "720", "69.12", "m5.large", ""],
        ],
    )]);
    let rows = default_pipeline().advisor_comparison(&store.snapshot());

    let verdicts: Vec<(&str, AdvisorVerdict)> = rows
        .iter()
        .map(|r| (r.resource_id.as_str(), r.verdict))
        .collect();
    assert_eq!(
        verdicts,
        vec![
            ("i-agree", AdvisorVerdict::Agree),
            ("i-differ", AdvisorVerdict::Different),
            ("i-silent", AdvisorVerdict::NoAdvice),
        ]
    );
    assert!(rows.iter().all(|r| r.our_target_class == "m5.large"));
    assert!(rows.iter().all(|r| r.our_savings_usd == Some(69.12)));
    assert_eq!(rows[1].advisor_savings_usd, Some(80.0));
}

#[test]
fn test_runs_are_idempotent() {
    let store = load(&mixed_fleet());
    let pipeline = default_pipeline();
    let first = pipeline.run(&store);
    let second = pipeline.run(&store);
    assert_eq!(first.actions, second.actions);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_missing_external_price_suppresses_downsize() {
    let store = load(&mixed_fleet());
    let config = PipelineConfig {
        price_strategy: PriceStrategy::External,
        ..Default::default()
    };
    let catalog = StaticPriceCatalog::from_json(r#"{"prices": []}"#).unwrap();
    let report = Pipeline::new(config)
        .unwrap()
        .with_pricing_service(Arc::new(catalog))
        .run(&store);

    assert!(report
        .actions
        .iter()
        .all(|a| a.kind != ActionKind::Downsize));
    assert!(report.stats.unpriced_regions.is_empty());
}

#[test]
fn test_isolated_partition_falls_back_to_observed_prices() {
    let store = load(&[batch(
        Service::Rds,
        COMPUTE_HEADERS,
        &[
            &["2024-04", "db-gov", "Defense", "us-gov-west-1", "db.r5.xlarge", "8", "720", "345.60"],
            &["2024-04", "db-gov-peer", "Defense", "us-gov-west-1", "db.r5.large", "50", "720", "273.60"],
        ],
    )]);
    let config = PipelineConfig {
        price_strategy: PriceStrategy::External,
        ..Default::default()
    };
    let catalog = StaticPriceCatalog::from_json(r#"{"prices": []}"#).unwrap();
    let report = Pipeline::new(config)
        .unwrap()
        .with_pricing_service(Arc::new(catalog))
        .run(&store);

    assert_eq!(report.stats.unpriced_regions, vec!["us-gov-west-1".to_string()]);
    assert_eq!(report.actions.len(), 1);
    assert_eq!(report.actions[0].kind, ActionKind::Downsize);
    assert_eq!(report.actions[0].estimated_monthly_savings_usd, Some(72.0));
}

#[test]
fn test_out_of_range_utilization_is_treated_as_unknown() {
    let store = load(&[batch(
        Service::Rds,
        COMPUTE_HEADERS,
        &[
            &["2024-04", "db-odd", "Retail", "us-east-1", "db.r5.xlarge", "150", "720", "345.60"],
            &["2024-04", "db-peer", "Retail", "us-east-1", "db.r5.large", "50", "720", "273.60"],
        ],
    )]);
    let dataset = store.snapshot();
    let odd = dataset
        .records
        .iter()
        .find(|r| r.resource_id == "db-odd")
        .unwrap();
    assert_eq!(odd.utilization_pct, None);

    // Unknown CPU never triggers retire or upsize
    let report = default_pipeline().run(&store);
    assert!(report
        .actions
        .iter()
        .all(|a| a.kind != ActionKind::DeleteIdle && a.kind != ActionKind::Upsize));
}

#[test]
fn test_ladder_round_trip_on_loaded_classes() {
    let store = load(&mixed_fleet());
    let dataset = store.snapshot();
    for entry in dataset.ladder.entries() {
        let class = format!("{}.{}", entry.family, entry.size);
        if let Some(larger) = dataset.ladder.next_larger(&class) {
            assert_eq!(dataset.ladder.next_smaller(&larger), Some(class));
        }
    }
    assert_eq!(
        dataset.ladder.next_smaller("m5.xlarge").as_deref(),
        Some("m5.large")
    );
    assert_eq!(dataset.ladder.next_larger("m5.xlarge"), None);
}

#[test]
fn test_empty_store_yields_empty_report() {
    let report = default_pipeline().run(&UsageStore::default());
    assert!(report.actions.is_empty());
    assert_eq!(report.stats.records, 0);
    assert!(report.stats.failed_generators.is_empty());
}
