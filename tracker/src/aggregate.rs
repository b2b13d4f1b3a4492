use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::records::VaccinationRecord;

/// Width of the trailing window used for the projected daily rate. Also the
/// divisor, whether or not every window day has data.
pub const RATE_WINDOW_DAYS: usize = 7;

/// Per-dose values, indexed by [`crate::records::Dose::index`].
pub type PerDose<T> = [T; 2];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityAggregate {
    /// Cumulative counts through the newest data day
    pub base: PerDose<u64>,
    pub daily: BTreeMap<NaiveDate, PerDose<u64>>,
    /// Projected doses per day, averaged over the trailing window
    pub rate: PerDose<f64>,
}

impl EntityAggregate {
    fn add(&mut self, record: &VaccinationRecord) -> Result<(), AggregateError> {
        let i = record.dose.index();
        let overflow = || AggregateError::Overflow {
            entity_id: record.entity_id.clone(),
            date: record.date,
        };
        let base = self.base[i].checked_add(record.count).ok_or_else(overflow)?;
        let daily = self.daily.entry(record.date).or_default();
        daily[i] = daily[i].checked_add(record.count).ok_or_else(overflow)?;
        self.base[i] = base;
        Ok(())
    }

    fn accumulate_rate(&mut self, window: &[NaiveDate]) {
        for date in window {
            if let Some(daily) = self.daily.get(date) {
                for i in 0..2 {
                    self.rate[i] += daily[i] as f64 / RATE_WINDOW_DAYS as f64;
                }
            }
        }
    }

    /// Running totals per day, for cumulative charts.
    pub fn cumulative(&self) -> Vec<(NaiveDate, PerDose<u64>)> {
        let mut running = [0u64; 2];
        self.daily
            .iter()
            .map(|(date, daily)| {
                running[0] += daily[0];
                running[1] += daily[1];
                (*date, running)
            })
            .collect()
    }
}

/// One full roll-up of a record batch.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregation {
    pub entities: HashMap<String, EntityAggregate>,
    pub total: EntityAggregate,
    pub last_day: NaiveDate,
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("record batch is empty")]
    Empty,
    #[error("unknown prefecture {entity_id:?} on {date}")]
    UnknownEntity { entity_id: String, date: NaiveDate },
    #[error("dose count overflows at prefecture {entity_id:?} on {date}")]
    Overflow { entity_id: String, date: NaiveDate },
}

/// Last `RATE_WINDOW_DAYS` distinct dates, ascending. Shorter when fewer exist.
pub fn trailing_window(dates: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    let skip = dates.len().saturating_sub(RATE_WINDOW_DAYS);
    dates.iter().skip(skip).copied().collect()
}

/// Rolls record batches up against a fixed catalog of prefectures.
#[derive(Debug, Clone)]
pub struct Aggregator {
    catalog: Catalog,
}

impl Aggregator {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rebuild every aggregate from scratch.
    ///
    /// Ids outside the catalog reject the whole batch. Catalog entries with
    /// no records come out as all-zero aggregates.
    pub fn aggregate(&self, records: &[VaccinationRecord]) -> Result<Aggregation, AggregateError> {
        let mut entities: HashMap<String, EntityAggregate> = self
            .catalog
            .ids()
            .map(|id| (id.to_owned(), EntityAggregate::default()))
            .collect();
        let mut total = EntityAggregate::default();
        let mut dates = BTreeSet::new();

        for record in records {
            let Some(entity) = entities.get_mut(&record.entity_id) else {
                return Err(AggregateError::UnknownEntity {
                    entity_id: record.entity_id.clone(),
                    date: record.date,
                });
            };
            entity.add(record)?;
            total.add(record)?;
            dates.insert(record.date);
        }

        let window = trailing_window(&dates);
        let last_day = *window.last().ok_or(AggregateError::Empty)?;

        for entity in entities.values_mut() {
            entity.accumulate_rate(&window);
        }
        total.accumulate_rate(&window);

        Ok(Aggregation {
            entities,
            total,
            last_day,
        })
    }
}
