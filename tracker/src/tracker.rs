use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{AggregateError, Aggregation, Aggregator, EntityAggregate, PerDose};
use crate::catalog::Catalog;
use crate::civil;
use crate::projection::{DisplayCounter, Projection, Sample};
use crate::records::VaccinationRecord;

pub const TOTAL_ID: &str = "total";

/// Something with a counter on screen: a prefecture or the national total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum Entity {
    Prefecture(String),
    Total,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Prefecture(id) => f.write_str(id),
            Entity::Total => f.write_str(TOTAL_ID),
        }
    }
}

impl FromStr for Entity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            TOTAL_ID => Entity::Total,
            id => Entity::Prefecture(id.to_owned()),
        })
    }
}

impl From<Entity> for String {
    fn from(entity: Entity) -> Self {
        entity.to_string()
    }
}

/// Aggregates of one ingestion. Never mutated once published.
#[derive(Debug)]
pub struct Epoch {
    pub generation: u64,
    pub aggregation: Aggregation,
    pub epoch_start: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
}

impl Epoch {
    pub fn aggregate(&self, entity: &Entity) -> Option<&EntityAggregate> {
        match entity {
            Entity::Prefecture(id) => self.aggregation.entities.get(id),
            Entity::Total => Some(&self.aggregation.total),
        }
    }

    pub fn projection(&self, entity: &Entity) -> Option<Projection> {
        self.aggregate(entity)
            .map(|aggregate| Projection::new(aggregate, self.epoch_start))
    }

    /// Projected count of `entity` at `now`. The total is the sum of the
    /// floored prefecture projections, not a projection of the summed rates.
    pub fn projected(&self, entity: &Entity, now: DateTime<Utc>) -> Option<PerDose<i64>> {
        match entity {
            Entity::Prefecture(_) => self.projection(entity).map(|p| p.at(now)),
            Entity::Total => Some(sum_counts(self.aggregation.entities.values().map(
                |aggregate| Projection::new(aggregate, self.epoch_start).at(now),
            ))),
        }
    }
}

fn sum_counts(values: impl IntoIterator<Item = PerDose<i64>>) -> PerDose<i64> {
    values.into_iter().fold([0, 0], |acc, v| {
        [acc[0].saturating_add(v[0]), acc[1].saturating_add(v[1])]
    })
}

/// Owns the published epoch and the on-screen counter of every entity.
///
/// Ingestion builds a complete [`Epoch`] off to the side and publishes it with
/// a single pointer swap, so readers see either the old epoch or the new one.
pub struct Tracker {
    aggregator: Aggregator,
    flash_ticks: u32,
    epoch: RwLock<Option<Arc<Epoch>>>,
    counters: Mutex<HashMap<Entity, DisplayCounter>>,
}

impl Tracker {
    pub fn new(catalog: Catalog, flash_ticks: u32) -> Self {
        Self {
            aggregator: Aggregator::new(catalog),
            flash_ticks,
            epoch: RwLock::new(None),
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.aggregator.catalog()
    }

    pub fn current_epoch(&self) -> Option<Arc<Epoch>> {
        self.epoch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-aggregate from scratch and publish the result as a new epoch.
    ///
    /// On error the current epoch stays in place.
    pub fn ingest(
        &self,
        records: &[VaccinationRecord],
        now: DateTime<Utc>,
    ) -> Result<Arc<Epoch>, AggregateError> {
        let aggregation = self.aggregator.aggregate(records)?;
        let epoch_start = civil::epoch_start(aggregation.last_day);

        let mut slot = self.epoch.write().unwrap_or_else(PoisonError::into_inner);
        let generation = slot.as_ref().map_or(1, |e| e.generation + 1);
        let epoch = Arc::new(Epoch {
            generation,
            aggregation,
            epoch_start,
            ingested_at: now,
        });
        *slot = Some(Arc::clone(&epoch));
        drop(slot);

        info!(
            generation,
            records = records.len(),
            last_day = %epoch.aggregation.last_day,
            "Published new epoch"
        );
        Ok(epoch)
    }

    pub fn aggregate(&self, entity: &Entity) -> Option<EntityAggregate> {
        self.current_epoch()?.aggregate(entity).cloned()
    }

    /// Sample one entity's counter. `None` before the first ingestion or for
    /// an entity outside the catalog.
    pub fn sample(&self, entity: &Entity, now: DateTime<Utc>) -> Option<Sample> {
        let epoch = self.current_epoch()?;
        let projected = epoch.projected(entity, now)?;
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        Some(self.sample_with(&epoch, &mut counters, entity, projected))
    }

    /// Sample every entity against the same epoch snapshot, prefectures by id
    /// and then the total. Returns that epoch's generation alongside the samples.
    ///
    /// The total is fed the sum of the prefecture values just displayed, so
    /// within a frame it always equals the sum of its parts.
    pub fn sample_all(&self, now: DateTime<Utc>) -> Option<(u64, Vec<(Entity, Sample)>)> {
        let epoch = self.current_epoch()?;
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let mut samples: Vec<(Entity, Sample)> = self
            .catalog()
            .ids()
            .filter_map(|id| {
                let entity = Entity::Prefecture(id.to_owned());
                let projected = epoch.projected(&entity, now)?;
                let sample = self.sample_with(&epoch, &mut counters, &entity, projected);
                Some((entity, sample))
            })
            .collect();

        let summed = sum_counts(samples.iter().map(|(_, sample)| sample.value));
        let total = self.sample_with(&epoch, &mut counters, &Entity::Total, summed);
        samples.push((Entity::Total, total));
        Some((epoch.generation, samples))
    }

    fn sample_with(
        &self,
        epoch: &Epoch,
        counters: &mut HashMap<Entity, DisplayCounter>,
        entity: &Entity,
        projected: PerDose<i64>,
    ) -> Sample {
        let counter = counters
            .entry(entity.clone())
            .or_insert_with(|| DisplayCounter::new(self.flash_ticks));
        let sample = counter.sample(epoch.generation, projected);
        if sample.increased {
            debug!(%entity, first = sample.value[0], second = sample.value[1], "Counter increased");
        }
        sample
    }
}
