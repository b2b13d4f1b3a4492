//! Same-day projection of cumulative counts.
//!
//! The feed only knows totals through yesterday. Between refreshes the
//! displayed number climbs from `base` towards `base + rate` over the
//! projected day, shaped by [`ease`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{EntityAggregate, PerDose};
use crate::civil;

/// Piecewise day-local easing of fractional elapsed days.
///
/// Flat for the first quarter of each day, accelerating through the second,
/// linear through the third and decelerating through the last, so that
/// `ease(n) == n` for every integer `n`.
///
/// The third-quarter segment is `2 * t - 0.75` on the absolute `t`, not on the
/// day fraction. For `t` in `[0, 1)` that is the same curve. On later days
/// the segment is displaced upward by twice the whole-day count.
pub fn ease(t: f64) -> f64 {
    let frac = t.rem_euclid(1.0);
    let v = if frac > 0.25 && frac <= 0.5 {
        4.0 * frac * frac - 2.0 * frac + 0.25
    } else if frac > 0.5 && frac <= 0.75 {
        2.0 * t - 0.75
    } else if frac > 0.75 {
        -4.0 * frac * frac + 8.0 * frac - 3.0
    } else {
        0.0
    };
    t.floor() + v
}

/// Constant parameters of one epoch's projection for a single entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub base: PerDose<u64>,
    pub rate: PerDose<f64>,
    pub epoch_start: DateTime<Utc>,
}

impl Projection {
    pub fn new(aggregate: &EntityAggregate, epoch_start: DateTime<Utc>) -> Self {
        Self {
            base: aggregate.base,
            rate: aggregate.rate,
            epoch_start,
        }
    }

    /// `floor(base + rate * ease(t))` per dose. Can fall below `base` when
    /// `now` precedes the epoch start.
    pub fn at(&self, now: DateTime<Utc>) -> PerDose<i64> {
        let eased = ease(civil::elapsed_days(self.epoch_start, now));
        [0usize, 1].map(|i| (self.base[i] as f64 + self.rate[i] * eased).floor() as i64)
    }
}

/// One reading of a [`DisplayCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub value: PerDose<i64>,
    /// Some dose moved above its previously displayed value
    pub increased: bool,
    /// Ticks left in the highlight started by the latest increase
    pub flash: u32,
}

/// The number actually on screen for one entity.
///
/// Within one epoch the value never decreases. When the epoch changes the
/// value is taken straight from the new projection, even if that is lower.
#[derive(Debug, Clone)]
pub struct DisplayCounter {
    generation: Option<u64>,
    value: PerDose<i64>,
    flash: u32,
    flash_ticks: u32,
}

impl DisplayCounter {
    pub fn new(flash_ticks: u32) -> Self {
        Self {
            generation: None,
            value: [0, 0],
            flash: 0,
            flash_ticks,
        }
    }

    pub fn value(&self) -> PerDose<i64> {
        self.value
    }

    pub fn sample(&mut self, generation: u64, projected: PerDose<i64>) -> Sample {
        let same_epoch = self.generation == Some(generation);
        let next = if same_epoch {
            [0usize, 1].map(|i| self.value[i].max(projected[i]))
        } else {
            projected
        };

        let increased = (0..2).any(|i| next[i] > self.value[i]);
        // A fresh counter has nothing on screen yet, so its first value is not
        // an increase.
        let increased = increased && self.generation.is_some();

        self.generation = Some(generation);
        self.value = next;
        if increased {
            self.flash = self.flash_ticks;
        }
        self.flash = self.flash.saturating_sub(1);

        Sample {
            value: next,
            increased,
            flash: self.flash,
        }
    }
}
