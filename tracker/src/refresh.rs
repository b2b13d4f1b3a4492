use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::aggregate::AggregateError;
use crate::cancellation::CancellationToken;
use crate::civil;
use crate::feed::{FeedClient, FeedError};
use crate::tracker::{Epoch, Tracker};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Re-fetch at every full hour, Tokyo time
    #[default]
    Hourly,
    /// Fetch once at startup only
    Once,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// When the next scheduled refresh after `now` should run.
pub fn next_refresh_after(now: DateTime<Utc>) -> DateTime<Utc> {
    civil::next_hour_boundary(now)
}

/// Fetch the feed and publish a new epoch. Leaves the current epoch alone on
/// any failure.
pub async fn refresh_once(
    tracker: &Tracker,
    feed: &FeedClient,
    now: DateTime<Utc>,
) -> Result<Arc<Epoch>, RefreshError> {
    let records = feed.fetch().await?;
    Ok(tracker.ingest(&records, now)?)
}

/// Refresh on every scheduled boundary until `token` is cancelled.
///
/// Failures are logged and retried at the following boundary.
pub fn spawn_refresh_worker(
    tracker: Arc<Tracker>,
    feed: FeedClient,
    policy: RefreshPolicy,
    token: CancellationToken,
) -> JoinHandle<()> {
    spawn_refresh_worker_with_clock(tracker, feed, policy, token, Utc::now)
}

/// [`spawn_refresh_worker`] reading wall-clock time from `clock`.
pub fn spawn_refresh_worker_with_clock<C>(
    tracker: Arc<Tracker>,
    feed: FeedClient,
    policy: RefreshPolicy,
    token: CancellationToken,
    clock: C,
) -> JoinHandle<()>
where
    C: Fn() -> DateTime<Utc> + Send + 'static,
{
    tokio::spawn(async move {
        if policy == RefreshPolicy::Once {
            info!("Periodic refresh disabled");
            return;
        }

        loop {
            let now = clock();
            let next = next_refresh_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %civil::to_tokyo(next), "Next feed refresh scheduled");

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            match refresh_once(&tracker, &feed, clock()).await {
                Ok(epoch) => info!(generation = epoch.generation, "Feed refreshed"),
                Err(e) => warn!(error = %e, source = ?feed.source(), "Feed refresh failed; keeping previous data"),
            }
        }

        info!("Refresh worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::{Catalog, Prefecture};
    use crate::feed::FeedSource;
    use crate::records::{Dose, VaccinationRecord};

    fn tracker() -> Tracker {
        let catalog = Catalog::new([Prefecture {
            id: "13".to_owned(),
            name: "東京都".to_owned(),
            population: None,
            lat: 0.0,
            lng: 0.0,
            leader_angle: 0.0,
            leader_length: 0.0,
        }])
        .unwrap();
        Tracker::new(catalog, 7)
    }

    #[test]
    fn policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            refresh: RefreshPolicy,
        }
        let w: Wrapper = serde_json::from_str(r#"{"refresh": "once"}"#).unwrap();
        assert_eq!(w.refresh, RefreshPolicy::Once);
    }

    #[test]
    fn next_refresh_is_next_tokyo_hour() {
        let now = DateTime::parse_from_rfc3339("2021-06-02T10:15:00+09:00")
            .unwrap()
            .with_timezone(&Utc);
        let expected = DateTime::parse_from_rfc3339("2021-06-02T11:00:00+09:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(next_refresh_after(now), expected);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_epoch() {
        let tracker = tracker();
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        tracker
            .ingest(&[VaccinationRecord::new(date, "13", Dose::First, 70)], Utc::now())
            .unwrap();

        let feed = FeedClient::new(FeedSource::File(PathBuf::from("/nonexistent/feed.json")));
        let result = refresh_once(&tracker, &feed, Utc::now()).await;
        assert!(matches!(result, Err(RefreshError::Feed(_))));

        let epoch = tracker.current_epoch().unwrap();
        assert_eq!(epoch.generation, 1);
        assert_eq!(epoch.aggregation.total.base, [70, 0]);
    }

    /// Wall clock that starts at `start` and moves with tokio's (pausable) clock.
    fn paused_clock(start: DateTime<Utc>) -> impl Fn() -> DateTime<Utc> + Send + 'static {
        let origin = tokio::time::Instant::now();
        move || start + chrono::Duration::from_std(origin.elapsed()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn hourly_worker_retries_after_failure() {
        let dir = std::env::temp_dir().join(format!("tracker-refresh-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let feed_path = dir.join("feed.json");
        std::fs::write(&feed_path, "not json").unwrap();

        let tracker = Arc::new(tracker());
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        tracker
            .ingest(&[VaccinationRecord::new(date, "13", Dose::First, 70)], Utc::now())
            .unwrap();

        let start = DateTime::parse_from_rfc3339("2021-06-02T10:15:00+09:00")
            .unwrap()
            .with_timezone(&Utc);
        let (shutdown, token) = crate::cancellation::channel();
        let handle = spawn_refresh_worker_with_clock(
            Arc::clone(&tracker),
            FeedClient::new(FeedSource::File(feed_path.clone())),
            RefreshPolicy::Hourly,
            token,
            paused_clock(start),
        );

        // 11:05. The 11:00 refresh read a corrupt feed.
        tokio::time::sleep(std::time::Duration::from_secs(50 * 60)).await;
        assert_eq!(tracker.current_epoch().unwrap().generation, 1);

        std::fs::write(
            &feed_path,
            r#"[{"date": "2021-06-02", "prefecture": "13", "status": 1, "count": 30}]"#,
        )
        .unwrap();

        // 12:05. The 12:00 refresh picked up the repaired feed.
        tokio::time::sleep(std::time::Duration::from_secs(60 * 60)).await;
        let epoch = tracker.current_epoch().unwrap();
        assert_eq!(epoch.generation, 2);
        assert_eq!(epoch.aggregation.total.base, [30, 0]);

        shutdown.cancel();
        handle.await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn once_policy_exits_immediately() {
        let (_shutdown, token) = crate::cancellation::channel();
        let feed = FeedClient::new(FeedSource::File(PathBuf::from("/nonexistent/feed.json")));
        let handle = spawn_refresh_worker(Arc::new(tracker()), feed, RefreshPolicy::Once, token);
        handle.await.unwrap();
    }
}
