//! Debug and troubleshooting CLI commands

use anyhow::Result;
use colored::Colorize;
use finops_lib::pricing::PriceEntry;
use finops_lib::rollups::{AdvisorComparison, AdvisorVerdict};
use finops_lib::ActionKind;
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{
    format_currency, format_optional, format_savings, print_info, print_json, print_table,
    print_warning, OutputFormat,
};

/// Row for the size ladder table
#[derive(Tabled)]
struct LadderRow {
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Rank")]
    rank: u32,
}

/// Row for the observed price table
#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Purchase")]
    purchase_option: String,
    #[tabled(rename = "Unit Price")]
    price: String,
    #[tabled(rename = "Samples")]
    samples: usize,
}

impl From<PriceEntry> for PriceRow {
    fn from(entry: PriceEntry) -> Self {
        Self {
            region: entry.region,
            class: entry.resource_class,
            purchase_option: entry.purchase_option.to_string(),
            price: format!("${:.6}", entry.unit_price_usd),
            samples: entry.samples,
        }
    }
}

/// Row for the advisor comparison table
#[derive(Tabled)]
struct AdvisorRow {
    #[tabled(rename = "Instance")]
    resource: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Ours")]
    ours: String,
    #[tabled(rename = "Our Savings")]
    our_savings: String,
    #[tabled(rename = "Advisor")]
    advisor: String,
    #[tabled(rename = "Advisor Savings")]
    advisor_savings: String,
    #[tabled(rename = "Comparison")]
    verdict: String,
}

impl From<AdvisorComparison> for AdvisorRow {
    fn from(row: AdvisorComparison) -> Self {
        let verdict = match row.verdict {
            AdvisorVerdict::Agree => row.verdict.as_str().green().to_string(),
            AdvisorVerdict::Different => row.verdict.as_str().yellow().to_string(),
            AdvisorVerdict::NoAdvice => row.verdict.as_str().dimmed().to_string(),
        };
        Self {
            resource: row.resource_id,
            current: row.resource_class,
            ours: row.our_target_class,
            our_savings: format_savings(ActionKind::Downsize, row.our_savings_usd),
            advisor: format_optional(row.advisor_target_class.as_deref()),
            advisor_savings: row
                .advisor_savings_usd
                .map_or_else(|| "-".to_string(), |v| format_currency(v, "USD")),
            verdict,
        }
    }
}

/// Show the per-family size ladder
pub fn show_ladder(session: &Session, family: Option<&str>, format: OutputFormat) -> Result<()> {
    let dataset = session.store.snapshot();
    let entries: Vec<_> = dataset
        .ladder
        .entries()
        .into_iter()
        .filter(|e| family.map_or(true, |f| e.family.eq_ignore_ascii_case(f)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            println!("{}", "Size Ladder".bold());
            println!("{}", "=".repeat(40));
            print_table(
                entries
                    .into_iter()
                    .map(|e| LadderRow {
                        family: e.family,
                        size: e.size,
                        rank: e.rank,
                    })
                    .collect(),
            );
        }
    }
    Ok(())
}

/// Show unit prices derived from the loaded costs
pub fn show_prices(session: &Session, region: Option<&str>, format: OutputFormat) -> Result<()> {
    let dataset = session.store.snapshot();
    let entries: Vec<PriceEntry> = dataset
        .observed_prices
        .entries()
        .into_iter()
        .filter(|e| region.map_or(true, |r| e.region.eq_ignore_ascii_case(r)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            println!("{}", "Observed Unit Prices".bold());
            println!("{}", "=".repeat(60));
            print_info(&format!(
                "Method: {:?}",
                session.pipeline.config().observed_price_method
            ));
            print_table(entries.into_iter().map(PriceRow::from).collect());
        }
    }
    Ok(())
}

/// Summary of one pipeline run
#[derive(Serialize)]
struct RunSummary<'a> {
    loaded_at: Option<String>,
    #[serde(flatten)]
    stats: &'a finops_lib::RunStats,
}

/// Show what each stage produced
pub fn show_stats(session: &Session, format: OutputFormat) -> Result<()> {
    let dataset = session.store.snapshot();
    let report = session.pipeline.run_dataset(&dataset);
    let stats = &report.stats;
    let summary = RunSummary {
        loaded_at: dataset.loaded_at.map(|t| t.to_rfc3339()),
        stats,
    };

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => {
            println!("{}", "Pipeline Run".bold());
            println!("{}", "=".repeat(50));
            if let Some(loaded_at) = dataset.loaded_at {
                println!(
                    "Loaded:                 {}",
                    loaded_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
                );
            }
            println!("Records:                {}", stats.records);
            println!("Advisor rows:           {}", stats.advisor_rows);
            println!("Dropped rows:           {}", stats.dropped_rows);
            println!("Candidates:             {}", stats.candidates);
            for (kind, count) in &stats.candidates_by_kind {
                println!("  {:<22}{}", kind.as_str(), count);
            }
            println!("Duplicates removed:     {}", stats.duplicates_removed);
            println!("Below floor:            {}", stats.below_floor);
            println!("Actions:                {}", report.actions.len().to_string().green());
            for generator in &stats.failed_generators {
                print_warning(&format!("Generator '{}' failed", generator));
            }
            for region in &stats.unpriced_regions {
                print_warning(&format!("{} has no pricing location", region));
            }
        }
    }
    Ok(())
}

/// Compare our downsize targets with the advisor's recommendations
pub fn show_advisor(session: &Session, format: OutputFormat) -> Result<()> {
    let dataset = session.store.snapshot();
    let rows = session.pipeline.advisor_comparison(&dataset);

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            println!("{}", "Rightsizing vs Advisor".bold());
            println!("{}", "=".repeat(60));
            let agree = rows
                .iter()
                .filter(|r| r.verdict == AdvisorVerdict::Agree)
                .count();
            print_table(rows.into_iter().map(AdvisorRow::from).collect());
            print_info(&format!("{} targets agree with the advisor", agree));
        }
    }
    Ok(())
}

/// Print the prometheus exposition after one run
pub fn show_metrics(session: &Session) -> Result<()> {
    session.pipeline.run(&session.store);
    print!("{}", session.metrics.render());
    Ok(())
}
