//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use finops_lib::{ActionKind, Confidence};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format currency
pub fn format_currency(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        _ => format!("{:.2} {}", amount, currency),
    }
}

/// Savings may be unquantified; upsize estimates are shown as added cost
pub fn format_savings(kind: ActionKind, savings: Option<f64>) -> String {
    match savings {
        Some(amount) if kind.adds_cost() => {
            format!("+{} cost", format_currency(amount, "USD")).red().to_string()
        }
        Some(amount) => format_currency(amount, "USD"),
        None => "unquantified".dimmed().to_string(),
    }
}

pub fn format_optional(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Color confidence based on value
pub fn color_confidence(confidence: Confidence) -> String {
    let label = confidence.as_str();
    match confidence {
        Confidence::High => label.green().to_string(),
        Confidence::Medium => label.yellow().to_string(),
        Confidence::Low => label.red().to_string(),
    }
}

/// Color action kinds by how firm the saving is
pub fn color_kind(kind: ActionKind) -> String {
    let label = kind.as_str();
    match kind {
        ActionKind::DeleteIdle | ActionKind::OffhoursSchedule => label.green().to_string(),
        ActionKind::Upsize => label.red().to_string(),
        ActionKind::Review => label.dimmed().to_string(),
        _ => label.cyan().to_string(),
    }
}
