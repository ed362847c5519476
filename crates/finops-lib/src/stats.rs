//! Small numeric helpers shared by generators and rollups

use chrono::{Datelike, NaiveDate};

/// Continuous percentile with linear interpolation between closest ranks
///
/// `fraction` is in [0, 1]. Returns `None` for an empty input.
pub fn percentile_cont(values: &[f64], fraction: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let fraction = fraction.clamp(0.0, 1.0);
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_cont_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_cont(&values, 0.0), Some(1.0));
        assert_eq!(percentile_cont(&values, 1.0), Some(4.0));
        assert_eq!(percentile_cont(&values, 0.5), Some(2.5));
        assert!((percentile_cont(&values, 0.25).unwrap() - 1.75).abs() < 1e-9);
        assert!((percentile_cont(&values, 0.9).unwrap() - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_cont_edge_cases() {
        assert_eq!(percentile_cont(&[], 0.5), None);
        assert_eq!(percentile_cont(&[7.0], 0.9), Some(7.0));
        assert_eq!(percentile_cont(&[3.0, 1.0, 2.0], 0.5), Some(2.0));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()), 29);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2023, 2, 14).unwrap()), 28);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), 31);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()), 30);
    }
}
