//! Ranked action listing and export

use anyhow::{Context, Result};
use colored::Colorize;
use finops_lib::{ActionQuery, RankedAction};
use std::path::Path;
use tabled::Tabled;

use super::Session;
use crate::output::{
    color_confidence, color_kind, format_currency, format_optional, format_savings, print_info,
    print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for the action table
#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Action")]
    kind: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Savings/mo")]
    savings: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Suggestion")]
    suggestion: String,
}

impl From<&RankedAction> for ActionRow {
    fn from(action: &RankedAction) -> Self {
        Self {
            rank: action.rank,
            resource: action.resource_id.clone(),
            service: action.service.to_string(),
            region: format_optional(action.region.as_deref()),
            kind: color_kind(action.kind),
            target: format_optional(action.target_class.as_deref()),
            savings: format_savings(action.kind, action.estimated_monthly_savings_usd),
            confidence: color_confidence(action.confidence),
            suggestion: action.suggestion.clone(),
        }
    }
}

/// List ranked actions, or write them to `export`
pub fn list_actions(
    session: &Session,
    query: &ActionQuery,
    export: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let report = session.pipeline.run(&session.store);
    let selected = query.apply(&report.actions);

    if let Some(path) = export {
        export_actions(&selected, path)?;
        print_success(&format!(
            "Exported {} actions to {}",
            selected.len(),
            path.display()
        ));
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_json(&selected)?,
        OutputFormat::Table => {
            println!("{}", "Savings Actions".bold());
            println!("{}", "=".repeat(60));
            print_table(selected.iter().map(|a| ActionRow::from(*a)).collect());

            let (upsizes, savers): (Vec<&RankedAction>, Vec<&RankedAction>) =
                selected.iter().copied().partition(|a| a.kind.adds_cost());
            let quantified: f64 = savers
                .iter()
                .filter_map(|a| a.estimated_monthly_savings_usd)
                .sum();
            println!();
            println!(
                "{} {} across {} actions",
                "Potential Savings:".bold(),
                format_currency(quantified, "USD").green().bold(),
                savers.len()
            );
            if !upsizes.is_empty() {
                let added: f64 = upsizes
                    .iter()
                    .filter_map(|a| a.estimated_monthly_savings_usd)
                    .sum();
                println!(
                    "{} {} across {} upsizes",
                    "Added Cost:".bold(),
                    format_currency(added, "USD").red(),
                    upsizes.len()
                );
            }
            if report.stats.below_floor > 0 {
                print_info(&format!(
                    "{} actions below the ${:.0}/mo floor were hidden",
                    report.stats.below_floor,
                    session.pipeline.config().min_actionable_savings_usd
                ));
            }
            for generator in &report.stats.failed_generators {
                print_warning(&format!("Generator '{}' failed; see logs", generator));
            }
            for region in &report.stats.unpriced_regions {
                print_warning(&format!("{} priced from observed costs", region));
            }
        }
    }
    Ok(())
}

/// CSV unless the path ends in `.json`
fn export_actions(actions: &[&RankedAction], path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let json = serde_json::to_string_pretty(actions)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for action in actions {
        writer.serialize(action)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
