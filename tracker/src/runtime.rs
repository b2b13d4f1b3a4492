use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cancellation::{self, Shutdown};
use crate::feed::FeedClient;
use crate::refresh::{self, RefreshPolicy};
use crate::ticker::{self, Frame, FrameGate, Ticker};
use crate::tracker::Tracker;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Frames published per second
    pub tick_hz: u32,
    /// How often the tick loop wakes up to consult the frame gate
    pub poll_every: Duration,
    pub refresh: RefreshPolicy,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_hz: 6,
            poll_every: Duration::from_millis(16),
            refresh: RefreshPolicy::Hourly,
        }
    }
}

/// The running tick loop and refresh worker around one [`Tracker`].
pub struct TrackerRuntime {
    tracker: Arc<Tracker>,
    frames: watch::Receiver<Option<Arc<Frame>>>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl TrackerRuntime {
    /// Load the feed once, then start ticking and refreshing.
    ///
    /// A failed initial load is not fatal. The tick loop idles until the
    /// refresh worker manages to publish an epoch.
    pub async fn start(tracker: Arc<Tracker>, feed: FeedClient, options: RuntimeOptions) -> Self {
        match refresh::refresh_once(&tracker, &feed, Utc::now()).await {
            Ok(epoch) => info!(
                generation = epoch.generation,
                last_day = %epoch.aggregation.last_day,
                "Initial feed loaded"
            ),
            Err(e) if options.refresh == RefreshPolicy::Once => {
                error!(error = %e, "Initial feed load failed and periodic refresh is disabled")
            }
            Err(e) => warn!(error = %e, "Initial feed load failed; retrying at next refresh"),
        }

        let (shutdown, token) = cancellation::channel();
        let (frames_tx, frames) = watch::channel(None);

        let ticker = ticker::spawn_ticker(
            Ticker::new(Arc::clone(&tracker), FrameGate::per_second(options.tick_hz)),
            options.poll_every,
            frames_tx,
            token.clone(),
        );
        let refresher =
            refresh::spawn_refresh_worker(Arc::clone(&tracker), feed, options.refresh, token);

        Self {
            tracker,
            frames,
            shutdown,
            tasks: vec![ticker, refresher],
        }
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    /// Subscribe to published frames.
    pub fn frames(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.frames.clone()
    }

    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.frames.borrow().clone()
    }

    /// Stop both loops and wait for them to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Tracker task ended abnormally");
            }
        }
        info!("Tracker runtime stopped");
    }
}
