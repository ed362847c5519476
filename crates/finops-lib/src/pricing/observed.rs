//! Unit prices derived from the loaded usage itself

use super::PriceLookup;
use crate::config::ObservedPriceMethod;
use crate::models::{PurchaseOption, UsageRecord};
use serde::Serialize;
use std::collections::BTreeMap;

type PriceKey = (String, String, PurchaseOption);

/// One observed price, as listed by `debug prices`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub region: String,
    pub resource_class: String,
    pub purchase_option: PurchaseOption,
    /// USD per hour or per GB-month
    pub unit_price_usd: f64,
    pub samples: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    cost: f64,
    quantity: f64,
    ratio_sum: f64,
    samples: usize,
}

/// Price per (region, class, purchase option) from cost / quantity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedPriceTable {
    prices: BTreeMap<PriceKey, (f64, usize)>,
}

impl ObservedPriceTable {
    /// Aggregate records that carry a region, known positive cost and known positive quantity
    pub fn from_records(records: &[UsageRecord], method: ObservedPriceMethod) -> Self {
        let mut acc: BTreeMap<PriceKey, Accumulator> = BTreeMap::new();
        for record in records {
            let Some(region) = record.region.as_deref() else {
                continue;
            };
            let (Some(quantity), Some(cost)) = (record.quantity, record.cost_usd) else {
                continue;
            };
            if quantity <= 0.0 || cost <= 0.0 {
                continue;
            }
            let entry = acc
                .entry((
                    region.to_string(),
                    record.resource_class.clone(),
                    record.purchase_option,
                ))
                .or_default();
            entry.cost += cost;
            entry.quantity += quantity;
            entry.ratio_sum += cost / quantity;
            entry.samples += 1;
        }

        let prices = acc
            .into_iter()
            .filter_map(|(key, a)| {
                let price = match method {
                    ObservedPriceMethod::MeanOfRatios => a.ratio_sum / a.samples as f64,
                    ObservedPriceMethod::RatioOfSums => a.cost / a.quantity,
                };
                (price.is_finite() && price > 0.0).then_some((key, (price, a.samples)))
            })
            .collect();
        Self { prices }
    }

    /// Seed or override a single price; non-positive prices are ignored
    pub fn insert(
        &mut self,
        region: impl Into<String>,
        class: impl Into<String>,
        option: PurchaseOption,
        price: f64,
    ) {
        if price.is_finite() && price > 0.0 {
            self.prices
                .insert((region.into(), class.into(), option), (price, 1));
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn entries(&self) -> Vec<PriceEntry> {
        self.prices
            .iter()
            .map(|((region, class, option), (price, samples))| PriceEntry {
                region: region.clone(),
                resource_class: class.clone(),
                purchase_option: *option,
                unit_price_usd: *price,
                samples: *samples,
            })
            .collect()
    }
}

impl PriceLookup for ObservedPriceTable {
    fn price(&self, region: &str, class: &str, option: PurchaseOption) -> Option<f64> {
        self.prices
            .get(&(region.to_string(), class.to_string(), option))
            .map(|(price, _)| *price)
    }
}
