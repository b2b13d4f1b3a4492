pub mod svg;

use chrono::NaiveDate;
use tracker::{EntityAggregate, PerDose};

/// Daily increments for the newest `max_days` data days, oldest first.
pub fn daily_series(aggregate: &EntityAggregate, max_days: usize) -> Vec<(NaiveDate, PerDose<u64>)> {
    let skip = aggregate.daily.len().saturating_sub(max_days);
    aggregate
        .daily
        .iter()
        .skip(skip)
        .map(|(date, counts)| (*date, *counts))
        .collect()
}

/// Running totals per data day.
pub fn cumulative_series(aggregate: &EntityAggregate) -> Vec<(NaiveDate, PerDose<u64>)> {
    aggregate.cumulative()
}

/// Share of `population` covered by `count`, in percent.
pub fn population_share(count: i64, population: Option<u64>) -> Option<f64> {
    match population {
        Some(p) if p > 0 => Some(count.max(0) as f64 / p as f64 * 100.0),
        _ => None,
    }
}
