//! External price catalog
//!
//! Public pricing is keyed by a display *location* ("US East (N. Virginia)")
//! rather than a region code, so lookups go through `RegionLocations` first.
//! Isolated partitions have no public location and fall back to observed
//! prices.

use crate::error::PricingError;
use crate::models::PurchaseOption;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Region prefixes that public pricing does not cover
const UNPRICED_PARTITIONS: &[&str] = &["us-gov-", "cn-", "us-iso"];

const DEFAULT_LOCATIONS: &[(&str, &str)] = &[
    ("us-east-1", "US East (N. Virginia)"),
    ("us-east-2", "US East (Ohio)"),
    ("us-west-1", "US West (N. California)"),
    ("us-west-2", "US West (Oregon)"),
    ("ca-central-1", "Canada (Central)"),
    ("eu-west-1", "EU (Ireland)"),
    ("eu-west-2", "EU (London)"),
    ("eu-west-3", "EU (Paris)"),
    ("eu-central-1", "EU (Frankfurt)"),
    ("eu-north-1", "EU (Stockholm)"),
    ("ap-south-1", "Asia Pacific (Mumbai)"),
    ("ap-northeast-1", "Asia Pacific (Tokyo)"),
    ("ap-northeast-2", "Asia Pacific (Seoul)"),
    ("ap-southeast-1", "Asia Pacific (Singapore)"),
    ("ap-southeast-2", "Asia Pacific (Sydney)"),
    ("sa-east-1", "South America (Sao Paulo)"),
];

/// Region code to pricing location
#[derive(Debug, Clone)]
pub struct RegionLocations {
    map: HashMap<String, String>,
}

impl Default for RegionLocations {
    fn default() -> Self {
        Self {
            map: DEFAULT_LOCATIONS
                .iter()
                .map(|(r, l)| (r.to_string(), l.to_string()))
                .collect(),
        }
    }
}

impl RegionLocations {
    pub fn insert(&mut self, region: impl Into<String>, location: impl Into<String>) {
        self.map.insert(region.into(), location.into());
    }

    /// `None` for isolated partitions and unmapped regions
    pub fn resolve(&self, region: &str) -> Option<&str> {
        if UNPRICED_PARTITIONS.iter().any(|p| region.starts_with(p)) {
            return None;
        }
        self.map.get(region).map(String::as_str)
    }
}

/// An injected source of public unit prices
pub trait PricingService: Send + Sync {
    /// `Ok(None)` when the service has no price for the key
    fn unit_price(
        &self,
        location: &str,
        class: &str,
        option: PurchaseOption,
    ) -> Result<Option<f64>, PricingError>;

    /// Pricing location for a region code
    fn location_for(&self, region: &str) -> Option<String> {
        default_locations().resolve(region).map(str::to_string)
    }
}

fn default_locations() -> &'static RegionLocations {
    static DEFAULT: OnceLock<RegionLocations> = OnceLock::new();
    DEFAULT.get_or_init(RegionLocations::default)
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    locations: HashMap<String, String>,
    prices: Vec<CatalogPrice>,
}

#[derive(Debug, Deserialize)]
struct CatalogPrice {
    location: String,
    class: String,
    #[serde(default)]
    purchase_option: PurchaseOption,
    price: f64,
}

/// Price list snapshot loaded from a JSON file
#[derive(Debug, Clone, Default)]
pub struct StaticPriceCatalog {
    prices: HashMap<(String, String, PurchaseOption), f64>,
    locations: RegionLocations,
}

impl StaticPriceCatalog {
    pub fn from_json(raw: &str) -> Result<Self, PricingError> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| PricingError::Unavailable(format!("invalid price catalog: {}", e)))?;

        let mut catalog = Self::default();
        for (region, location) in file.locations {
            catalog.locations.insert(region, location);
        }
        for entry in file.prices {
            if !entry.price.is_finite() || entry.price < 0.0 {
                return Err(PricingError::Malformed {
                    location: entry.location,
                    class: entry.class,
                    detail: format!("price {} is not a non-negative number", entry.price),
                });
            }
            catalog.prices.insert(
                (entry.location, entry.class.to_lowercase(), entry.purchase_option),
                entry.price,
            );
        }
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, PricingError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PricingError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn locations(&self) -> &RegionLocations {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PricingService for StaticPriceCatalog {
    fn unit_price(
        &self,
        location: &str,
        class: &str,
        option: PurchaseOption,
    ) -> Result<Option<f64>, PricingError> {
        Ok(self
            .prices
            .get(&(location.to_string(), class.to_string(), option))
            .copied())
    }

    fn location_for(&self, region: &str) -> Option<String> {
        self.locations.resolve(region).map(str::to_string)
    }
}
