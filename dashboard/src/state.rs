use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracker::{Frame, Tracker};

pub struct AppState {
    pub tracker: Arc<Tracker>,
    /// Re-poll period of the counts fragment
    pub counts_poll: Duration,
    frames: watch::Receiver<Option<Arc<Frame>>>,
}

impl AppState {
    pub fn new(
        tracker: Arc<Tracker>,
        frames: watch::Receiver<Option<Arc<Frame>>>,
        counts_poll: Duration,
    ) -> Self {
        AppState {
            tracker,
            counts_poll,
            frames,
        }
    }

    /// Most recent frame from the tick loop, if one has been produced.
    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.frames.borrow().clone()
    }
}
