use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracker::{
    Entity, FeedClient, FeedSource, RefreshPolicy, RuntimeOptions, Tracker, TrackerRuntime,
    load_catalog,
};

const PREFECTURES: &str = r#"[
    {"prefecture": "13", "name": "東京都", "population": 14047594, "lat": 35.69, "lng": 139.69, "lr": 120, "ll": 80},
    {"prefecture": "27", "name": "大阪府", "population": 8837685, "lat": 34.69, "lng": 135.52, "lr": -120, "ll": 80},
    {"prefecture": "47", "name": "沖縄県", "population": 1467480, "lat": 26.21, "lng": 127.68, "lr": 30, "ll": 60}
]"#;

const FEED: &str = r#"[
    {"date": "2021-06-01", "prefecture": "13", "status": 1, "count": 100},
    {"date": "2021-06-01", "prefecture": "13", "status": 2, "count": 50},
    {"date": "2021-06-02", "prefecture": "27", "status": 1, "count": 70}
]"#;

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("tracker-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("prefectures.json"), PREFECTURES).unwrap();
        std::fs::write(dir.join("feed.json"), FEED).unwrap();
        Self { dir }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[tokio::test]
async fn file_feed_is_aggregated_against_catalog() {
    let fixture = Fixture::new("aggregate");
    let catalog = load_catalog(&fixture.path("prefectures.json")).await.unwrap();
    let tracker = Tracker::new(catalog, 7);

    let feed = FeedClient::new(FeedSource::File(fixture.path("feed.json")));
    let records = feed.fetch().await.unwrap();
    let epoch = tracker.ingest(&records, chrono::Utc::now()).unwrap();

    assert_eq!(epoch.aggregation.last_day.to_string(), "2021-06-02");
    assert_eq!(epoch.aggregation.total.base, [170, 50]);

    let tokyo = tracker.aggregate(&Entity::Prefecture("13".to_owned())).unwrap();
    assert_eq!(tokyo.base, [100, 50]);
    assert!((tokyo.rate[0] - 100.0 / 7.0).abs() < 1e-9);

    let okinawa = tracker.aggregate(&Entity::Prefecture("47".to_owned())).unwrap();
    assert_eq!(okinawa.base, [0, 0]);
    assert_eq!(okinawa.rate, [0.0, 0.0]);
}

#[tokio::test]
async fn runtime_publishes_frames_and_shuts_down() {
    let fixture = Fixture::new("runtime");
    let catalog = load_catalog(&fixture.path("prefectures.json")).await.unwrap();
    let tracker = Arc::new(Tracker::new(catalog, 7));
    let feed = FeedClient::new(FeedSource::File(fixture.path("feed.json")));

    let runtime = TrackerRuntime::start(
        Arc::clone(&tracker),
        feed,
        RuntimeOptions {
            tick_hz: 0,
            poll_every: Duration::from_millis(5),
            refresh: RefreshPolicy::Once,
        },
    )
    .await;

    let mut frames = runtime.frames();
    tokio::time::timeout(Duration::from_secs(5), frames.wait_for(|f| f.is_some()))
        .await
        .expect("no frame within 5s")
        .unwrap();

    let frame = runtime.latest_frame().unwrap();
    assert_eq!(frame.events.len(), 4);
    assert_eq!(frame.generation, 1);

    // Long after the data's last day the projection is far above the base,
    // and the total is the sum of its parts.
    let total = frame.total().unwrap().value;
    assert!(total[0] >= 170);
    for i in 0..2 {
        let sum: i64 = frame
            .events
            .iter()
            .filter(|e| e.entity != Entity::Total)
            .map(|e| e.value[i])
            .sum();
        assert_eq!(total[i], sum);
    }

    runtime.shutdown().await;
}
