//! Integration tests for the post cycle
//!
//! Runs full cycles against fake weather/poster collaborators and real stores.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use weatherbot::models::RotationState;
use weatherbot::services::{CycleError, ResetCause};
use weatherbot::store::{FileStateStore, MemoryStateStore, ReadOutcome, StateStore};

use crate::common::{
    runner, settings, FailingStore, FakePoster, FakeWeather, ForecastBuilder,
};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn weather() -> Arc<FakeWeather> {
    Arc::new(FakeWeather::new(
        ForecastBuilder::new().clear(20.0).clear(21.0).build(),
    ))
}

// =============================================================================
// Successful Cycles
// =============================================================================

#[tokio::test]
async fn test_first_cycle_posts_head_and_persists() {
    let store = Arc::new(MemoryStateStore::new());
    let poster = Arc::new(FakePoster::new());
    let runner = runner(settings(&["A", "B", "C"]), weather(), poster.clone(), store.clone());

    let report = runner.run_at(noon()).await.unwrap();

    assert_eq!(report.city, "A");
    assert_eq!(report.reset, Some(ResetCause::FirstRun));
    assert!(report.persisted);
    assert_eq!(report.post_id.as_deref(), Some("1"));
    assert_eq!(store.snapshot().await, Some(RotationState::new("A", noon())));

    let posts = poster.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].text.starts_with("Hello, A!"));
    assert!(posts[0].media.is_none());
}

#[tokio::test]
async fn test_consecutive_cycles_rotate_and_wrap() {
    let store = Arc::new(MemoryStateStore::new());
    let weather = weather();
    let runner = runner(
        settings(&["A", "B", "C"]),
        weather.clone(),
        Arc::new(FakePoster::new()),
        store.clone(),
    );

    let mut cities = Vec::new();
    for hour in 0..4 {
        let report = runner.run_at(noon() + TimeDelta::hours(hour)).await.unwrap();
        cities.push(report.city);
    }

    assert_eq!(cities, vec!["A", "B", "C", "A"]);
    assert_eq!(weather.calls(), cities);

    // The epoch set by the first cycle is kept while rotating
    let state = store.snapshot().await.unwrap();
    assert_eq!(state.last_clear_time, Some(noon()));
}

#[tokio::test]
async fn test_elapsed_interval_restarts_at_head() {
    let epoch = noon() - TimeDelta::hours(11);
    let store = Arc::new(MemoryStateStore::with_state(RotationState::new("B", epoch)));
    let runner = runner(
        settings(&["A", "B", "C"]),
        weather(),
        Arc::new(FakePoster::new()),
        store.clone(),
    );

    let report = runner.run_at(noon()).await.unwrap();

    assert_eq!(report.city, "A");
    assert_eq!(report.reset, Some(ResetCause::IntervalElapsed));
    assert_eq!(store.snapshot().await, Some(RotationState::new("A", noon())));
}

// =============================================================================
// Failed Cycles
// =============================================================================

#[tokio::test]
async fn test_weather_failure_leaves_state_untouched() {
    let epoch = noon() - TimeDelta::hours(1);
    let before = RotationState::new("A", epoch);
    let store = Arc::new(MemoryStateStore::with_state(before.clone()));
    let poster = Arc::new(FakePoster::new());
    let runner = runner(
        settings(&["A", "B", "C"]),
        Arc::new(FakeWeather::new(ForecastBuilder::new().clear(20.0).build()).failing_for("B")),
        poster.clone(),
        store.clone(),
    );

    let err = runner.run_at(noon()).await.unwrap_err();

    assert!(matches!(err, CycleError::Weather { .. }));
    assert_eq!(err.city(), "B");
    assert!(poster.posts().is_empty());
    assert_eq!(store.snapshot().await, Some(before));

    // The same city is retried on the next trigger
    let err = runner.run_at(noon() + TimeDelta::minutes(5)).await.unwrap_err();
    assert_eq!(err.city(), "B");
}

#[tokio::test]
async fn test_post_failure_leaves_state_untouched() {
    let before = RotationState::new("A", noon() - TimeDelta::hours(2));
    let store = Arc::new(MemoryStateStore::with_state(before.clone()));
    let runner = runner(
        settings(&["A", "B", "C"]),
        weather(),
        Arc::new(FakePoster::failing("Rate limit exceeded", Some(429))),
        store.clone(),
    );

    let err = runner.run_at(noon()).await.unwrap_err();

    match err {
        CycleError::Post {
            city,
            reason,
            http_status,
        } => {
            assert_eq!(city, "B");
            assert_eq!(reason, "Rate limit exceeded");
            assert_eq!(http_status, Some(429));
        }
        other => panic!("expected post failure, got {:?}", other),
    }
    assert_eq!(store.snapshot().await, Some(before));
}

#[tokio::test]
async fn test_failed_reset_cycle_does_not_record_epoch() {
    let stale = RotationState::new("C", noon() - TimeDelta::hours(30));
    let store = Arc::new(MemoryStateStore::with_state(stale.clone()));
    let runner = runner(
        settings(&["A", "B", "C"]),
        weather(),
        Arc::new(FakePoster::failing("HTTP 500", Some(500))),
        store.clone(),
    );

    assert!(runner.run_at(noon()).await.is_err());
    assert_eq!(store.snapshot().await, Some(stale));
}

#[tokio::test]
async fn test_write_failure_still_reports_post() {
    let runner = runner(
        settings(&["A", "B"]),
        weather(),
        Arc::new(FakePoster::new()),
        Arc::new(FailingStore::new(None)),
    );

    let report = runner.run_at(noon()).await.unwrap();

    assert_eq!(report.city, "A");
    assert!(!report.persisted);

    // Nothing was stored, so the next cycle selects the same city
    let report = runner.run_at(noon() + TimeDelta::hours(1)).await.unwrap();
    assert_eq!(report.city, "A");
}

// =============================================================================
// File-backed Cycles
// =============================================================================

#[tokio::test]
async fn test_corrupt_state_file_recovers_to_head() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("city_tweet_log.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let store = Arc::new(FileStateStore::new(&path));
    assert!(store.read().await.is_recovered());

    let runner = runner(
        settings(&["A", "B", "C"]),
        weather(),
        Arc::new(FakePoster::new()),
        store.clone(),
    );

    let report = runner.run_at(noon()).await.unwrap();
    assert_eq!(report.city, "A");
    assert_eq!(
        store.read().await,
        ReadOutcome::Loaded(RotationState::new("A", noon()))
    );
}

#[tokio::test]
async fn test_image_is_attached_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("its_going_to_rain.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

    let mut settings = settings(&["A"]);
    settings.image_path = image;
    let poster = Arc::new(FakePoster::new());
    let runner = runner(
        settings,
        weather(),
        poster.clone(),
        Arc::new(MemoryStateStore::new()),
    );

    runner.run_at(noon()).await.unwrap();

    let media = poster.posts()[0].media.clone().unwrap();
    assert_eq!(media.file_name, "its_going_to_rain.png");
    assert_eq!(media.mime_type, "image/png");
    assert_eq!(media.bytes.len(), 4);
}
