use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cancellation::CancellationToken;
use crate::tracker::{Entity, Tracker};

/// Throttles a fast polling loop down to a fixed cadence by remembering when
/// the next frame becomes eligible.
#[derive(Debug, Clone)]
pub struct FrameGate {
    period: chrono::Duration,
    next_eligible: Option<DateTime<Utc>>,
}

impl FrameGate {
    pub fn new(period: Duration) -> Self {
        Self {
            period: chrono::Duration::from_std(period).unwrap_or(chrono::Duration::zero()),
            next_eligible: None,
        }
    }

    /// Gate for `hz` frames per second. Zero disables throttling.
    pub fn per_second(hz: u32) -> Self {
        match hz {
            0 => Self::new(Duration::ZERO),
            hz => Self::new(Duration::from_secs(1) / hz),
        }
    }

    /// Whether a frame may be produced at `now`. Opening the gate pushes the
    /// next eligible instant one period past `now`.
    pub fn ready(&mut self, now: DateTime<Utc>) -> bool {
        if self.next_eligible.is_some_and(|next| now < next) {
            return false;
        }
        self.next_eligible = Some(now + self.period);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleEvent {
    pub entity: Entity,
    pub value: [i64; 2],
    pub increased: bool,
    pub flash: u32,
}

/// Everything the presentation layer needs for one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub at: DateTime<Utc>,
    pub generation: u64,
    pub events: Vec<SampleEvent>,
}

impl Frame {
    pub fn get(&self, entity: &Entity) -> Option<&SampleEvent> {
        self.events.iter().find(|e| &e.entity == entity)
    }

    pub fn total(&self) -> Option<&SampleEvent> {
        self.get(&Entity::Total)
    }
}

pub struct Ticker {
    tracker: Arc<Tracker>,
    gate: FrameGate,
}

impl Ticker {
    pub fn new(tracker: Arc<Tracker>, gate: FrameGate) -> Self {
        Self { tracker, gate }
    }

    /// Produce a frame for `now`, unless the gate is closed or nothing has
    /// been ingested yet.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Frame> {
        self.tracker.current_epoch()?;
        if !self.gate.ready(now) {
            return None;
        }
        let (generation, samples) = self.tracker.sample_all(now)?;
        let events = samples
            .into_iter()
            .map(|(entity, sample)| SampleEvent {
                entity,
                value: sample.value,
                increased: sample.increased,
                flash: sample.flash,
            })
            .collect();
        Some(Frame {
            at: now,
            generation,
            events,
        })
    }
}

/// Shortest wake-up period of the tick loop.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Poll `ticker` every `poll_every` and publish each frame it yields.
/// Periods under [`MIN_POLL_PERIOD`] are raised to it.
///
/// Runs until `token` is cancelled.
pub fn spawn_ticker(
    mut ticker: Ticker,
    poll_every: Duration,
    frames: watch::Sender<Option<Arc<Frame>>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    let poll_every = poll_every.max(MIN_POLL_PERIOD);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(?poll_every, "Ticker started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    if let Some(frame) = ticker.tick(Utc::now()) {
                        let increased = frame.events.iter().filter(|e| e.increased).count();
                        if increased > 0 {
                            debug!(increased, "Frame has rising counters");
                        }
                        frames.send_replace(Some(Arc::new(frame)));
                    }
                }
            }
        }

        info!("Ticker stopped");
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::{Catalog, Prefecture};
    use crate::civil;
    use crate::records::{Dose, VaccinationRecord};

    fn tracker() -> Arc<Tracker> {
        let catalog = Catalog::new(["01", "13"].into_iter().map(|id| Prefecture {
            id: id.to_owned(),
            name: id.to_owned(),
            population: None,
            lat: 0.0,
            lng: 0.0,
            leader_angle: 0.0,
            leader_length: 0.0,
        }))
        .unwrap();
        Arc::new(Tracker::new(catalog, 7))
    }

    fn t0() -> DateTime<Utc> {
        civil::epoch_start(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
    }

    #[test]
    fn gate_throttles_to_period() {
        let mut gate = FrameGate::per_second(6);
        let ms = chrono::Duration::milliseconds;
        assert!(gate.ready(t0()));
        assert!(!gate.ready(t0() + ms(100)));
        assert!(gate.ready(t0() + ms(170)));
        assert!(!gate.ready(t0() + ms(300)));
        assert!(gate.ready(t0() + ms(340)));
    }

    #[test]
    fn zero_rate_gate_is_always_open() {
        let mut gate = FrameGate::per_second(0);
        assert!(gate.ready(t0()));
        assert!(gate.ready(t0()));
    }

    #[test]
    fn tick_yields_nothing_before_ingestion() {
        let mut ticker = Ticker::new(tracker(), FrameGate::per_second(6));
        assert!(ticker.tick(t0()).is_none());
    }

    #[test]
    fn frame_has_every_entity_then_total() {
        let tracker = tracker();
        tracker
            .ingest(
                &[VaccinationRecord::new(
                    NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                    "13",
                    Dose::First,
                    70,
                )],
                t0(),
            )
            .unwrap();
        let mut ticker = Ticker::new(Arc::clone(&tracker), FrameGate::per_second(6));

        let frame = ticker.tick(t0()).unwrap();
        let entities: Vec<String> = frame.events.iter().map(|e| e.entity.to_string()).collect();
        assert_eq!(entities, vec!["01", "13", "total"]);
        assert_eq!(frame.total().unwrap().value, [70, 0]);
        assert_eq!(frame.generation, 1);

        // Gate closed 50ms later.
        assert!(ticker.tick(t0() + chrono::Duration::milliseconds(50)).is_none());

        // A full day later Tokyo has grown by its rate and flashes.
        let frame = ticker.tick(t0() + chrono::Duration::days(1)).unwrap();
        let tokyo = frame.get(&Entity::Prefecture("13".to_owned())).unwrap();
        assert_eq!(tokyo.value, [80, 0]);
        assert!(tokyo.increased);
        assert_eq!(tokyo.flash, 6);
        assert!(!frame.get(&Entity::Prefecture("01".to_owned())).unwrap().increased);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_ticker_publishes_until_cancelled() {
        let tracker = tracker();
        tracker
            .ingest(
                &[VaccinationRecord::new(
                    NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                    "01",
                    Dose::Second,
                    7,
                )],
                Utc::now(),
            )
            .unwrap();
        let (tx, mut rx) = watch::channel(None);
        let (shutdown, token) = crate::cancellation::channel();

        let handle = spawn_ticker(
            Ticker::new(tracker, FrameGate::per_second(0)),
            Duration::from_millis(16),
            tx,
            token,
        );

        rx.changed().await.unwrap();
        assert!(rx.borrow().as_ref().is_some_and(|f| f.events.len() == 3));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_poll_period_still_ticks() {
        let tracker = tracker();
        tracker
            .ingest(
                &[VaccinationRecord::new(
                    NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                    "13",
                    Dose::First,
                    7,
                )],
                Utc::now(),
            )
            .unwrap();
        let (tx, mut rx) = watch::channel(None);
        let (shutdown, token) = crate::cancellation::channel();

        let handle = spawn_ticker(
            Ticker::new(tracker, FrameGate::per_second(0)),
            Duration::ZERO,
            tx,
            token,
        );

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
