//! Price resolution
//!
//! Generators only see the `PriceLookup` trait. A missing or zero price is
//! `None` and must surface as "savings unknown", never as a zero saving.

mod catalog;
mod observed;

pub use catalog::{PricingService, RegionLocations, StaticPriceCatalog};
pub use observed::{ObservedPriceTable, PriceEntry};

use crate::config::PriceStrategy;
use crate::models::PurchaseOption;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Unit price lookup used by the candidate generators
pub trait PriceLookup {
    /// Price per hour (compute) or per GB-month (storage)
    fn price(&self, region: &str, class: &str, option: PurchaseOption) -> Option<f64>;

    fn on_demand(&self, region: &str, class: &str) -> Option<f64> {
        self.price(region, class, PurchaseOption::OnDemand)
    }
}

/// Strategy-aware resolver over the observed table and an optional service
pub struct PriceResolver<'a> {
    strategy: PriceStrategy,
    observed: &'a ObservedPriceTable,
    external: Option<&'a dyn PricingService>,
}

impl<'a> PriceResolver<'a> {
    pub fn observed(observed: &'a ObservedPriceTable) -> Self {
        Self {
            strategy: PriceStrategy::Observed,
            observed,
            external: None,
        }
    }

    /// External strategy; regions without a location use observed prices
    pub fn external(observed: &'a ObservedPriceTable, service: &'a dyn PricingService) -> Self {
        Self {
            strategy: PriceStrategy::External,
            observed,
            external: Some(service),
        }
    }

    pub fn new(
        strategy: PriceStrategy,
        observed: &'a ObservedPriceTable,
        service: Option<&'a dyn PricingService>,
    ) -> Self {
        match (strategy, service) {
            (PriceStrategy::External, Some(service)) => Self::external(observed, service),
            (PriceStrategy::External, None) => {
                warn!("External pricing requested without a pricing service, using observed prices");
                Self::observed(observed)
            }
            (PriceStrategy::Observed, _) => Self::observed(observed),
        }
    }

    pub fn strategy(&self) -> PriceStrategy {
        self.strategy
    }

    /// Regions that fall back to observed prices under the external strategy
    pub fn unpriced_regions<'r, I>(&self, regions: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'r str>,
    {
        let Some(service) = self.external else {
            return Vec::new();
        };
        regions
            .into_iter()
            .filter(|r| service.location_for(r).is_none())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl PriceLookup for PriceResolver<'_> {
    fn price(&self, region: &str, class: &str, option: PurchaseOption) -> Option<f64> {
        let Some(service) = self.external else {
            return self.observed.price(region, class, option);
        };
        let Some(location) = service.location_for(region) else {
            return self.observed.price(region, class, option);
        };
        match service.unit_price(&location, class, option) {
            Ok(Some(price)) if price.is_finite() && price > 0.0 => Some(price),
            Ok(_) => {
                debug!(region = %region, class = %class, "No external price");
                None
            }
            Err(e) => {
                warn!(region = %region, class = %class, error = %e, "Price lookup failed");
                None
            }
        }
    }
}
