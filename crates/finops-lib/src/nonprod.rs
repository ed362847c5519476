//! Name-based environment detection
//!
//! A resource is non-production when its identifier or business area contains
//! one of the configured substrings (case-insensitive). Exclusions are checked
//! first and always win.

use crate::config::NonProdConfig;
use crate::models::UsageRecord;

/// Tag values that mark non-production even without a vocabulary hit
const NONPROD_TAG_VALUES: &[&str] = &["nonprod", "non-prod", "non_prod", "sandbox"];

/// Outcome of environment detection for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Identifier or business area matched the vocabulary
    NonProdByName,
    /// Only the explicit environment tag says non-production
    NonProdByTag,
    Production,
}

impl Environment {
    pub fn is_nonprod(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

/// Compiled vocabulary matcher
#[derive(Debug, Clone)]
pub struct EnvironmentClassifier {
    patterns: Vec<String>,
    exclusions: Vec<String>,
}

impl EnvironmentClassifier {
    pub fn new(config: &NonProdConfig) -> Self {
        Self {
            patterns: clean(&config.patterns),
            exclusions: clean(&config.exclusions),
        }
    }

    /// True when any exclusion appears in any of the given labels
    pub fn is_excluded(&self, labels: &[&str]) -> bool {
        labels
            .iter()
            .map(|l| l.to_lowercase())
            .any(|l| self.exclusions.iter().any(|x| l.contains(x.as_str())))
    }

    /// Vocabulary match on identifier and business area, exclusions first
    pub fn matches_name(&self, resource_id: &str, business_area: Option<&str>) -> bool {
        let labels = [resource_id, business_area.unwrap_or("")];
        if self.is_excluded(&labels) {
            return false;
        }
        labels
            .iter()
            .map(|l| l.to_lowercase())
            .any(|l| self.patterns.iter().any(|p| l.contains(p.as_str())))
    }

    pub fn classify(&self, record: &UsageRecord) -> Environment {
        let business_area = record.business_area.as_deref();
        if self.matches_name(&record.resource_id, business_area) {
            return Environment::NonProdByName;
        }

        let Some(tag) = record.environment.as_deref() else {
            return Environment::Production;
        };
        let labels = [record.resource_id.as_str(), business_area.unwrap_or(""), tag];
        if self.is_excluded(&labels) {
            return Environment::Production;
        }
        let tag = tag.trim().to_lowercase();
        let tagged = NONPROD_TAG_VALUES.contains(&tag.as_str())
            || self.patterns.iter().any(|p| tag.contains(p.as_str()));
        if tagged {
            Environment::NonProdByTag
        } else {
            Environment::Production
        }
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttachState, PurchaseOption, Service};

    fn record(id: &str, business_area: &str, environment: Option<&str>) -> UsageRecord {
        UsageRecord {
            service: Service::Ec2,
            billing_period: None,
            account_id: None,
            business_area: Some(business_area.to_string()),
            resource_id: id.to_string(),
            region: Some("us-east-1".to_string()),
            resource_class: "m5.large".to_string(),
            purchase_option: PurchaseOption::OnDemand,
            state: AttachState::Unknown,
            utilization_pct: None,
            quantity: Some(720.0),
            cost_usd: Some(100.0),
            idle_days: None,
            iops: None,
            environment: environment.map(str::to_string),
            advisor_target_class: None,
            advisor_savings_usd: None,
        }
    }

    #[test]
    fn test_matches_identifier_case_insensitively() {
        let classifier = EnvironmentClassifier::new(&NonProdConfig::default());
        assert!(classifier.matches_name("DEV-web-01", None));
        assert!(classifier.matches_name("orders-UAT", Some("Retail")));
        assert!(!classifier.matches_name("orders-prod", Some("Retail")));
    }

    #[test]
    fn test_matches_business_area() {
        let classifier = EnvironmentClassifier::new(&NonProdConfig::default());
        assert!(classifier.matches_name("db-17", Some("QA Platform")));
    }

    #[test]
    fn test_exclusions_win() {
        let config = NonProdConfig {
            exclusions: vec!["devops".to_string()],
            ..Default::default()
        };
        let classifier = EnvironmentClassifier::new(&config);
        assert!(!classifier.matches_name("devops-runner", None));
        assert!(!classifier.matches_name("test-box", Some("DevOps")));
        assert!(classifier.matches_name("dev-web-01", Some("Retail")));
    }

    #[test]
    fn test_classify_by_tag() {
        let classifier = EnvironmentClassifier::new(&NonProdConfig::default());
        assert_eq!(
            classifier.classify(&record("web-01", "Retail", Some("NonProd"))),
            Environment::NonProdByTag
        );
        assert_eq!(
            classifier.classify(&record("web-01", "Retail", Some("production"))),
            Environment::Production
        );
        assert_eq!(
            classifier.classify(&record("dev-web-01", "Retail", None)),
            Environment::NonProdByName
        );
    }
}
