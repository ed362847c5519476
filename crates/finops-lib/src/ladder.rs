//! Size ladder
//!
//! Ordinal ranking of size variants per instance family, derived from the
//! classes actually deployed. Rank 1 is the smallest size *seen* for that
//! family, so a "next smaller" lookup always lands on a class that exists
//! somewhere in the fleet.

use crate::models::UsageRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Known size tokens, smallest first
pub const SIZE_ORDER: &[&str] = &[
    "nano", "micro", "small", "medium", "large", "xlarge", "2xlarge", "3xlarge", "4xlarge",
    "6xlarge", "8xlarge", "9xlarge", "10xlarge", "12xlarge", "16xlarge", "18xlarge", "24xlarge",
    "32xlarge", "48xlarge", "56xlarge",
];

/// A class split into `family.size` (`db.r5.xlarge` -> `db.r5` / `xlarge`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass<'a> {
    pub family: &'a str,
    pub size: &'a str,
}

/// Split on the last dot; both halves must be non-empty
pub fn parse_class(class: &str) -> Option<ParsedClass<'_>> {
    let (family, size) = class.rsplit_once('.')?;
    if family.is_empty() || size.is_empty() {
        return None;
    }
    Some(ParsedClass { family, size })
}

fn size_order(size: &str) -> Option<usize> {
    SIZE_ORDER.iter().position(|s| *s == size)
}

/// One row of the ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeRank {
    pub family: String,
    pub size: String,
    pub rank: u32,
}

/// Dense per-family rank of observed size labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeLadder {
    /// family -> sizes ordered smallest first (index + 1 = rank)
    families: BTreeMap<String, Vec<String>>,
}

impl SizeLadder {
    /// Build from distinct class labels; unknown size tokens are dropped
    pub fn from_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: BTreeMap<String, BTreeSet<(usize, String)>> = BTreeMap::new();
        for class in classes {
            let class = class.as_ref().trim().to_lowercase();
            let Some(parsed) = parse_class(&class) else {
                continue;
            };
            let Some(order) = size_order(parsed.size) else {
                continue;
            };
            seen.entry(parsed.family.to_string())
                .or_default()
                .insert((order, parsed.size.to_string()));
        }

        let families = seen
            .into_iter()
            .map(|(family, sizes)| (family, sizes.into_iter().map(|(_, s)| s).collect()))
            .collect();
        Self { families }
    }

    /// Build from the compute records of a dataset
    pub fn from_records(records: &[UsageRecord]) -> Self {
        Self::from_classes(
            records
                .iter()
                .filter(|r| r.service.is_compute())
                .map(|r| r.resource_class.as_str()),
        )
    }

    /// Position of the class within its family, 1 = smallest observed
    pub fn rank(&self, class: &str) -> Option<u32> {
        let parsed = parse_class(class)?;
        let sizes = self.families.get(parsed.family)?;
        sizes
            .iter()
            .position(|s| s == parsed.size)
            .map(|idx| idx as u32 + 1)
    }

    pub fn next_smaller(&self, class: &str) -> Option<String> {
        self.step(class, -1)
    }

    pub fn next_larger(&self, class: &str) -> Option<String> {
        self.step(class, 1)
    }

    fn step(&self, class: &str, delta: i64) -> Option<String> {
        let parsed = parse_class(class)?;
        let sizes = self.families.get(parsed.family)?;
        let idx = sizes.iter().position(|s| s == parsed.size)? as i64 + delta;
        if idx < 0 {
            return None;
        }
        sizes
            .get(idx as usize)
            .map(|size| format!("{}.{}", parsed.family, size))
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Flattened view, ordered by family then rank
    pub fn entries(&self) -> Vec<SizeRank> {
        self.families
            .iter()
            .flat_map(|(family, sizes)| {
                sizes.iter().enumerate().map(move |(idx, size)| SizeRank {
                    family: family.clone(),
                    size: size.clone(),
                    rank: idx as u32 + 1,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> SizeLadder {
        SizeLadder::from_classes([
            "db.r5.xlarge",
            "db.r5.large",
            "db.r5.4xlarge",
            "db.r5.large",
            "m5.2xlarge",
            "m5.large",
            "m5.weird",
            "gp2",
        ])
    }

    #[test]
    fn test_parse_class_splits_on_last_dot() {
        assert_eq!(
            parse_class("db.r5.xlarge"),
            Some(ParsedClass {
                family: "db.r5",
                size: "xlarge"
            })
        );
        assert_eq!(parse_class("gp2"), None);
        assert_eq!(parse_class("m5."), None);
    }

    #[test]
    fn test_rank_is_dense_per_family() {
        let ladder = ladder();
        assert_eq!(ladder.rank("db.r5.large"), Some(1));
        assert_eq!(ladder.rank("db.r5.xlarge"), Some(2));
        // 2xlarge is not deployed, so 4xlarge follows xlarge directly
        assert_eq!(ladder.rank("db.r5.4xlarge"), Some(3));
        assert_eq!(ladder.rank("m5.large"), Some(1));
        assert_eq!(ladder.rank("m5.2xlarge"), Some(2));
    }

    #[test]
    fn test_unknown_sizes_are_dropped() {
        let ladder = ladder();
        assert_eq!(ladder.rank("m5.weird"), None);
        assert_eq!(ladder.families().collect::<Vec<_>>(), vec!["db.r5", "m5"]);
    }

    #[test]
    fn test_neighbours_stop_at_observed_boundaries() {
        let ladder = ladder();
        assert_eq!(ladder.next_smaller("db.r5.xlarge").as_deref(), Some("db.r5.large"));
        assert_eq!(ladder.next_larger("db.r5.xlarge").as_deref(), Some("db.r5.4xlarge"));
        assert_eq!(ladder.next_smaller("db.r5.large"), None);
        assert_eq!(ladder.next_larger("db.r5.4xlarge"), None);
        assert_eq!(ladder.next_smaller("c5.large"), None);
    }

    #[test]
    fn test_round_trip_away_from_boundaries() {
        let ladder = ladder();
        for entry in ladder.entries() {
            let class = format!("{}.{}", entry.family, entry.size);
            if let Some(larger) = ladder.next_larger(&class) {
                assert_eq!(ladder.next_smaller(&larger).as_deref(), Some(class.as_str()));
            }
            if let Some(smaller) = ladder.next_smaller(&class) {
                assert_eq!(ladder.next_larger(&smaller).as_deref(), Some(class.as_str()));
            }
        }
    }

    #[test]
    fn test_entries_strictly_increasing() {
        let entries = ladder().entries();
        for pair in entries.windows(2) {
            if pair[0].family == pair[1].family {
                assert_eq!(pair[1].rank, pair[0].rank + 1);
            }
        }
    }
}
