//! Cell-level parsing for raw billing exports
//!
//! All helpers are lenient: anything unparseable becomes `None` (or the
//! explicit fallback bucket of a closed vocabulary) instead of an error.

use crate::models::{AttachState, PlatformFamily, PurchaseOption};
use chrono::NaiveDate;

/// Synonyms checked before the attached list; "unattached" contains "attached"
const DETACHED_SYNONYMS: &[&str] = &["available", "detached", "unattached"];
const ATTACHED_SYNONYMS: &[&str] = &["in-use", "in use", "inuse", "attached"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];

/// Canonical header form: trimmed, non-word runs collapsed to `_`, lower-case
pub fn canonical_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Parse a possibly currency-formatted number (`$1,234.50`, `12%`)
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Utilization is kept only when it lies in [0, 100]; never clamped
pub fn parse_percent(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|v| (0.0..=100.0).contains(v))
}

/// Map a free-form volume state onto the closed vocabulary
pub fn parse_state(raw: &str) -> AttachState {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return AttachState::Unknown;
    }
    if DETACHED_SYNONYMS.iter().any(|s| lowered.contains(s)) {
        AttachState::Detached
    } else if ATTACHED_SYNONYMS.iter().any(|s| lowered.contains(s)) {
        AttachState::Attached
    } else {
        AttachState::Unknown
    }
}

/// Absent purchase options are treated as on-demand
pub fn parse_purchase_option(raw: Option<&str>) -> PurchaseOption {
    let Some(raw) = raw else {
        return PurchaseOption::OnDemand;
    };
    let key: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if key.is_empty() || key == "ondemand" {
        PurchaseOption::OnDemand
    } else if key.contains("spot") {
        PurchaseOption::Spot
    } else if key.contains("savingsplan") {
        PurchaseOption::SavingsPlan
    } else if key.contains("reserved") || key == "ri" {
        PurchaseOption::Reserved
    } else {
        PurchaseOption::Other
    }
}

/// Parse a billing period; month-only values resolve to the first day
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Timestamps such as 2024-03-01T00:00:00Z keep only the date part
    let candidate = if trimmed.len() > 10 && trimmed.as_bytes()[10] == b'T' {
        &trimmed[..10]
    } else {
        trimmed
    };
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(&format!("{}-01", candidate), "%Y-%m-%d").ok()
}

/// Region segment of an ARN (`arn:aws:ec2:us-east-1:123:snapshot/snap-1`)
pub fn region_from_arn(arn: &str) -> Option<String> {
    if !arn.starts_with("arn:") {
        return None;
    }
    arn.split(':')
        .nth(3)
        .filter(|r| !r.is_empty() && r.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        .map(|r| r.to_ascii_lowercase())
}

/// Last path segment of an ARN, or the input when it has none
pub fn trailing_id(arn: &str) -> &str {
    arn.rsplit(['/', ':']).next().unwrap_or(arn)
}

/// Normalize an advisor platform string to family and flavor
pub fn normalize_platform(raw: Option<&str>) -> (PlatformFamily, String) {
    let original = raw.map(str::trim).unwrap_or("");
    let lowered = original.to_lowercase();

    let family = if lowered.contains("win") {
        PlatformFamily::Windows
    } else if lowered.contains("linux") || lowered.contains("unix") {
        PlatformFamily::Linux
    } else {
        PlatformFamily::Other
    };

    let flavor = if lowered.contains("windows") && lowered.contains("sql") {
        if lowered.contains("enterprise") {
            "Windows SQL Ent"
        } else if lowered.contains("standard") {
            "Windows SQL Std"
        } else {
            "Windows SQL"
        }
    } else if lowered.contains("windows") {
        "Windows"
    } else if lowered.contains("red hat") || lowered.contains("rhel") {
        "RHEL"
    } else if lowered.contains("suse") {
        "SUSE"
    } else if lowered.contains("amazon linux") {
        "Amazon Linux"
    } else if lowered.contains("ubuntu") {
        "Ubuntu"
    } else if original.is_empty() {
        "Unknown"
    } else {
        original
    };

    (family, flavor.to_string())
}
