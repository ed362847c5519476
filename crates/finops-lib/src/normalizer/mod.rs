//! Usage normalization
//!
//! Maps raw tabular batches with heterogeneous column names onto the strict
//! canonical record types. This is the only place raw column names are seen;
//! every later stage works on `UsageRecord` / `AdvisorRecord`.
//!
//! Rows without a resolvable identifier or class are not billable data and
//! are dropped (counted, not reported as errors).

mod aliases;
mod parse;

pub use aliases::{ColumnAliases, Field};
pub use parse::{
    canonical_header, normalize_platform, parse_date, parse_number, parse_percent,
    parse_purchase_option, parse_state, region_from_arn, trailing_id,
};

use crate::error::NormalizeError;
use crate::models::{AdvisorRecord, AttachState, Service, UsageRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// One raw export: header row plus string cells
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub service: Service,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawBatch {
    pub fn new(service: Service, headers: Vec<String>) -> Self {
        Self {
            service,
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of normalizing one or more batches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedData {
    pub records: Vec<UsageRecord>,
    pub advisor: Vec<AdvisorRecord>,
    /// Rows skipped for lack of an identifier or class
    pub dropped: usize,
}

impl NormalizedData {
    pub fn extend(&mut self, other: NormalizedData) {
        self.records.extend(other.records);
        self.advisor.extend(other.advisor);
        self.dropped += other.dropped;
    }
}

/// Maps raw batches onto canonical records
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: ColumnAliases,
}

/// Cell accessor for one row with resolved column positions
struct RowView<'a> {
    cells: &'a [String],
    columns: &'a BTreeMap<Field, usize>,
}

impl<'a> RowView<'a> {
    fn text(&self, field: Field) -> Option<&'a str> {
        let idx = *self.columns.get(&field)?;
        self.cells
            .get(idx)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    fn owned(&self, field: Field) -> Option<String> {
        self.text(field).map(str::to_string)
    }

    fn number(&self, field: Field) -> Option<f64> {
        self.text(field).and_then(parse_number)
    }

    /// Negative amounts count as zero; blank or unparseable ones stay unknown
    fn amount(&self, field: Field) -> Option<f64> {
        match self.number(field)? {
            v if v >= 0.0 => Some(v),
            v => {
                debug!(field = ?field, value = v, "Negative amount coerced to zero");
                Some(0.0)
            }
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: ColumnAliases) -> Self {
        Self { aliases }
    }

    /// Normalize a set of batches in order
    pub fn normalize_all(&self, batches: &[RawBatch]) -> Result<NormalizedData, NormalizeError> {
        let mut data = NormalizedData::default();
        for batch in batches {
            data.extend(self.normalize(batch)?);
        }
        Ok(data)
    }

    /// Normalize one batch
    pub fn normalize(&self, batch: &RawBatch) -> Result<NormalizedData, NormalizeError> {
        let headers: Vec<String> = batch.headers.iter().map(|h| canonical_header(h)).collect();
        let columns = self.aliases.resolve(batch.service, &headers);
        let mut data = NormalizedData::default();

        for (row_idx, cells) in batch.rows.iter().enumerate() {
            if cells.len() > headers.len() {
                return Err(NormalizeError::RowWidth {
                    row: row_idx + 1,
                    expected: headers.len(),
                    found: cells.len(),
                });
            }
            let row = RowView {
                cells,
                columns: &columns,
            };

            if batch.service == Service::Advisor {
                match advisor_record(&row) {
                    Some(record) => data.advisor.push(record),
                    None => data.dropped += 1,
                }
                continue;
            }

            match usage_record(batch.service, &row) {
                Some(record) => data.records.push(record),
                None => {
                    debug!(service = %batch.service, row = row_idx + 1, "Dropping row without identifier or class");
                    data.dropped += 1;
                }
            }
        }

        debug!(
            service = %batch.service,
            records = data.records.len(),
            advisor = data.advisor.len(),
            dropped = data.dropped,
            "Normalized batch"
        );
        Ok(data)
    }
}

fn usage_record(service: Service, row: &RowView<'_>) -> Option<UsageRecord> {
    let raw_id = row.text(Field::ResourceId)?;
    let resource_class = row.text(Field::ResourceClass)?.to_lowercase();

    let (resource_id, region) = if service == Service::Snapshots {
        let region = row
            .text(Field::Region)
            .map(str::to_string)
            .or_else(|| region_from_arn(raw_id));
        (trailing_id(raw_id).to_string(), region)
    } else {
        (raw_id.to_string(), row.owned(Field::Region))
    };
    if resource_id.is_empty() {
        return None;
    }

    let state = if service == Service::Ebs {
        row.text(Field::State).map(parse_state).unwrap_or_default()
    } else {
        AttachState::Unknown
    };

    Some(UsageRecord {
        service,
        billing_period: row.text(Field::BillingPeriod).and_then(parse_date),
        account_id: row.owned(Field::AccountId),
        business_area: row.owned(Field::BusinessArea),
        resource_id,
        region,
        resource_class,
        purchase_option: parse_purchase_option(row.text(Field::PurchaseOption)),
        state,
        utilization_pct: row.text(Field::Utilization).and_then(parse_percent),
        quantity: row.amount(Field::Quantity),
        cost_usd: row.amount(Field::Cost),
        idle_days: row
            .number(Field::IdleDays)
            .filter(|d| *d >= 0.0)
            .map(|d| d as u32),
        iops: row.number(Field::Iops).filter(|v| *v >= 0.0),
        environment: row.owned(Field::Environment),
        advisor_target_class: row.text(Field::AdvisorTarget).map(str::to_lowercase),
        advisor_savings_usd: row.number(Field::AdvisorSavings),
    })
}

fn advisor_record(row: &RowView<'_>) -> Option<AdvisorRecord> {
    let instance_type = row.text(Field::ResourceClass)?.to_lowercase();
    let (platform_family, platform_flavor) = normalize_platform(row.text(Field::Platform));

    Some(AdvisorRecord {
        billing_period: row.text(Field::BillingPeriod).and_then(parse_date),
        business_area: row.owned(Field::BusinessArea),
        region: row.owned(Field::Region),
        instance_type,
        platform_family,
        platform_flavor,
        recommended_instances: row
            .number(Field::RecommendedInstances)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32),
        estimated_savings_usd: row.number(Field::EstimatedSavings),
        avg_utilization_pct: row.text(Field::Utilization).and_then(parse_percent),
        monthly_cost_usd: row.number(Field::Cost).filter(|c| *c >= 0.0),
    })
}
