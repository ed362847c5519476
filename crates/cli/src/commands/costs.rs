//! Cost-related CLI commands

use anyhow::Result;
use colored::Colorize;
use finops_lib::rollups::{
    cost_by_business_area, cost_by_region, savings_by_business_area, sprawl_clusters,
};
use finops_lib::Service;
use tabled::Tabled;

use super::Session;
use crate::output::{format_currency, print_json, print_table, OutputFormat};

/// Row for cost by business area table
#[derive(Tabled)]
struct BusinessAreaRow {
    #[tabled(rename = "Business Area")]
    business_area: String,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "Cost")]
    cost: String,
}

/// Row for cost by region table
#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "Business Area")]
    business_area: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "Cost")]
    cost: String,
}

/// Row for sprawl table
#[derive(Tabled)]
struct SprawlRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Business Area")]
    business_area: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "P90")]
    threshold: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

/// Row for savings by business area table
#[derive(Tabled)]
struct SavingsRow {
    #[tabled(rename = "Business Area")]
    business_area: String,
    #[tabled(rename = "Actions")]
    actions: usize,
    #[tabled(rename = "Potential Savings")]
    savings: String,
    #[tabled(rename = "Added Cost")]
    added_cost: String,
}

fn heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

pub fn show_by_business_area(session: &Session, format: OutputFormat) -> Result<()> {
    let dataset = session.store.snapshot();
    let rows = cost_by_business_area(&dataset.records);

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            heading("Cost by Business Area");
            let total: f64 = rows.iter().map(|r| r.total_cost_usd).sum();
            print_table(
                rows.into_iter()
                    .map(|r| BusinessAreaRow {
                        business_area: r.business_area,
                        resources: r.resources,
                        cost: format_currency(r.total_cost_usd, "USD"),
                    })
                    .collect(),
            );
            println!("{} {}", "Total:".bold(), format_currency(total, "USD").cyan());
        }
    }
    Ok(())
}

pub fn show_by_region(
    session: &Session,
    business_area: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let dataset = session.store.snapshot();
    let rows: Vec<_> = cost_by_region(&dataset.records)
        .into_iter()
        .filter(|r| business_area.map_or(true, |ba| r.business_area.eq_ignore_ascii_case(ba)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            heading("Cost by Region");
            print_table(
                rows.into_iter()
                    .map(|r| RegionRow {
                        business_area: r.business_area,
                        region: r.region,
                        resources: r.resources,
                        cost: format_currency(r.total_cost_usd, "USD"),
                    })
                    .collect(),
            );
        }
    }
    Ok(())
}

pub fn show_sprawl(session: &Session, service: Option<Service>, format: OutputFormat) -> Result<()> {
    let dataset = session.store.snapshot();
    let clusters: Vec<_> = sprawl_clusters(&dataset.records)
        .into_iter()
        .filter(|c| service.map_or(true, |s| c.service == s))
        .collect();

    match format {
        OutputFormat::Json => print_json(&clusters)?,
        OutputFormat::Table => {
            heading("Resource Sprawl");
            print_table(
                clusters
                    .into_iter()
                    .map(|c| SprawlRow {
                        service: c.service.to_string(),
                        period: c
                            .billing_period
                            .map(|p| p.format("%Y-%m").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        business_area: c.business_area,
                        region: c.region,
                        resources: c.resource_count,
                        threshold: format!("{:.1}", c.threshold),
                        cost: format_currency(c.total_cost_usd, "USD"),
                    })
                    .collect(),
            );
        }
    }
    Ok(())
}

pub fn show_savings(session: &Session, format: OutputFormat) -> Result<()> {
    let report = session.pipeline.run(&session.store);
    let rows = savings_by_business_area(&report.actions);

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            heading("Potential Savings by Business Area");
            let total: f64 = rows.iter().map(|r| r.potential_savings_usd).sum();
            print_table(
                rows.into_iter()
                    .map(|r| SavingsRow {
                        business_area: r.business_area,
                        actions: r.actions,
                        savings: format_currency(r.potential_savings_usd, "USD"),
                        added_cost: format_currency(r.added_cost_usd, "USD"),
                    })
                    .collect(),
            );
            println!(
                "{} {}",
                "Total:".bold(),
                format_currency(total, "USD").green().bold()
            );
        }
    }
    Ok(())
}
