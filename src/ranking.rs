//! Ranking of records by incidence and the period-over-period growth ratio.

use chrono::NaiveDate;

use crate::transform::Record;

/// All records ordered by incidence, highest first. The sort is stable, so equal incidences keep
/// their input row order.
pub fn rank_by_incidence(records: &[Record]) -> Vec<&Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();
    ranked.sort_by(|a, b| b.incidence_per_thousand.total_cmp(&a.incidence_per_thousand));
    ranked
}

/// The first `n` ranked records of `date`.
pub fn ranked_subset<'a>(ranked: &[&'a Record], date: NaiveDate, n: usize) -> Vec<&'a Record> {
    ranked
        .iter()
        .copied()
        .filter(|r| r.date == date)
        .take(n)
        .collect()
}

/// Index of the date preceding `i`. Index 0 wraps to the last date.
pub fn previous_index(i: usize, len: usize) -> usize {
    debug_assert!(len > 0 && i < len);
    if i == 0 { len - 1 } else { i - 1 }
}

pub fn incidence_sum(subset: &[&Record]) -> f64 {
    subset.iter().map(|r| r.incidence_per_thousand).sum()
}

/// `sum(current) / sum(previous)`, or 0 when the previous sum is exactly 0.
pub fn growth_ratio(current: &[&Record], previous: &[&Record]) -> f64 {
    let prev = incidence_sum(previous);
    if prev == 0.0 {
        return 0.0;
    }
    incidence_sum(current) / prev
}
