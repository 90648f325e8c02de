// tests/dashboard_flow.rs
//
// Dashboard lifecycle against a snapshot renderer: theme before data,
// rejected timelines, fetch failure, teardown.

use race_playback::dashboard::FETCH_FAILED_MESSAGE;
use race_playback::error::TimelineError;
use race_playback::playback::shared_renderer;
use race_playback::render::{PlaceholderKind, SnapshotRenderer};
use race_playback::{Dashboard, DashboardConfig, PlaybackState, Record, Theme};

fn ip_dashboard() -> (Dashboard, SnapshotRenderer) {
    let snap = SnapshotRenderer::new();
    let d = Dashboard::new(
        DashboardConfig::ip_race(),
        Theme::Dark,
        shared_renderer(snap.clone()),
    );
    (d, snap)
}

#[tokio::test]
async fn theme_before_data_only_initializes() {
    let (mut d, snap) = ip_dashboard();
    d.set_theme(Theme::Light).await.unwrap();
    assert_eq!(d.state(), PlaybackState::Idle);
    assert_eq!(d.theme(), Theme::Light);
    let s = snap.snapshot();
    assert_eq!(s.theme, Some(Theme::Light));
    assert!(s.frame.is_none() && s.placeholder.is_none());
}

#[tokio::test]
async fn garbage_year_is_rejected_not_played() {
    let (mut d, snap) = ip_dashboard();
    let recs = vec![
        Record::new("2024-01-01 00:00", "A", 1),
        Record::new("9999-12-31 23:00", "A", 1),
    ];
    let err = d.load(recs).await.unwrap_err();
    assert!(matches!(err, TimelineError::SpanTooLong { .. }), "{err}");
    assert_eq!(d.state(), PlaybackState::Idle);
    assert_eq!(snap.snapshot().placeholder.unwrap().kind, PlaceholderKind::Error);
}

#[tokio::test]
async fn sparse_dashboard_tolerates_odd_keys() {
    let snap = SnapshotRenderer::new();
    let mut d = Dashboard::new(
        DashboardConfig::country_race(),
        Theme::Dark,
        shared_renderer(snap.clone()),
    );
    let st = d
        .load(vec![Record::new("not-an-hour", "US", 1)])
        .await
        .unwrap();
    assert_eq!(st, PlaybackState::Running { cursor: 0, len: 1 });

    let mut rx = d.subscribe();
    rx.wait_for(|s| s.is_finished()).await.unwrap();
    assert_eq!(snap.snapshot().frame.unwrap().bucket_key, "not-an-hour");
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_stops_running_race() {
    let (mut d, snap) = ip_dashboard();
    let recs: Vec<Record> = (0..24)
        .map(|h| Record::new(format!("2024-01-01 {h:02}:00"), "A", 1))
        .collect();
    d.load(recs).await.unwrap();

    d.fail("upstream 502").await;
    assert_eq!(d.state(), PlaybackState::Idle);

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    let s = snap.snapshot();
    assert_eq!(s.frames_rendered, 0);
    let p = s.placeholder.unwrap();
    assert_eq!(p.kind, PlaceholderKind::Error);
    assert_eq!(p.message, FETCH_FAILED_MESSAGE);
}

#[tokio::test]
async fn shutdown_disposes_renderer() {
    let (mut d, snap) = ip_dashboard();
    d.load(Vec::new()).await.unwrap();
    assert_eq!(d.state(), PlaybackState::NoData);
    d.shutdown().await;
    assert!(snap.snapshot().disposed);
    assert_eq!(d.state(), PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn country_fixture_plays_sparse_hours() {
    use race_playback::source::{fetch_into, FileSource};
    use tokio::sync::Mutex;

    let cfg = DashboardConfig::country_race();
    let source = FileSource::new("fixtures/country_race.json", cfg.field_map());
    let snap = SnapshotRenderer::new();
    let d = Mutex::new(Dashboard::new(cfg, Theme::Dark, shared_renderer(snap.clone())));

    fetch_into(&source, &d).await;
    let mut rx = d.lock().await.subscribe();
    let last = *rx.wait_for(|s| s.is_settled()).await.unwrap();
    assert_eq!(last, PlaybackState::Finished { frames: 4 });

    let frame = snap.snapshot().frame.unwrap();
    assert_eq!(frame.bucket_key, "2024-05-01 04:00");
    let values: Vec<u64> = frame.entries.iter().map(|e| e.value).collect();
    assert_eq!(values, [29, 17, 11, 7, 4]);
    assert!(frame.entries[0].label.ends_with(" US"));
}
