//! Community submission admission and consensus against the real store

mod helpers;

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use helpers::TestStore;
use pulse_common::events::{EventBus, PulseEvent, RescoreTrigger};
use pulse_engine::db::SqliteStore;
use pulse_engine::models::{AnonymousPing, Venue, VibeLevel, VibeReport};
use pulse_engine::services::community::{influence, CommunityAggregator};
use pulse_engine::store::VenueStore;
use pulse_engine::EngineError;

async fn sqlite_fixture() -> (Arc<SqliteStore>, CommunityAggregator, EventBus, Venue) {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    pulse_engine::db::init_tables(&pool).await.unwrap();
    let store = Arc::new(SqliteStore::new(pool));

    let bus = EventBus::new(16);
    let aggregator = CommunityAggregator::new(store.clone(), bus.clone());

    let venue = Venue::new("Community Venue");
    store.insert_venue(&venue).await.unwrap();

    (store, aggregator, bus, venue)
}

#[tokio::test]
async fn test_report_rate_limited_at_59_minutes() {
    let (store, aggregator, _bus, venue) = sqlite_fixture().await;
    let participant = Uuid::new_v4();

    let mut earlier = VibeReport::new(venue.id, participant, VibeLevel::Busy);
    earlier.created_at = Utc::now() - Duration::minutes(59);
    store.insert_report(&earlier).await.unwrap();

    let result = aggregator
        .submit_report(VibeReport::new(venue.id, participant, VibeLevel::Packed))
        .await;

    match result {
        Err(EngineError::RateLimited {
            venue_id,
            retry_after_minutes,
        }) => {
            assert_eq!(venue_id, venue.id);
            assert_eq!(retry_after_minutes, 1);
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }

    // The rejected report was not stored
    let reports = store
        .get_recent_reports(venue.id, Utc::now() - Duration::minutes(120))
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
}

#[tokio::test]
async fn test_report_accepted_at_61_minutes() {
    let (store, aggregator, _bus, venue) = sqlite_fixture().await;
    let participant = Uuid::new_v4();

    let mut earlier = VibeReport::new(venue.id, participant, VibeLevel::Busy);
    earlier.created_at = Utc::now() - Duration::minutes(61);
    store.insert_report(&earlier).await.unwrap();

    aggregator
        .submit_report(VibeReport::new(venue.id, participant, VibeLevel::Packed))
        .await
        .unwrap();

    let reports = store
        .get_recent_reports(venue.id, Utc::now() - Duration::minutes(120))
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
}

#[tokio::test]
async fn test_reports_from_different_participants_both_admitted() {
    let (store, aggregator, _bus, venue) = sqlite_fixture().await;

    aggregator
        .submit_report(VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Busy))
        .await
        .unwrap();
    aggregator
        .submit_report(VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Busy))
        .await
        .unwrap();

    let reports = store
        .get_recent_reports(venue.id, Utc::now() - Duration::minutes(60))
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
}

#[tokio::test]
async fn test_accepted_report_requests_rescore() {
    let (_store, aggregator, bus, venue) = sqlite_fixture().await;
    let participant = Uuid::new_v4();
    let mut rx = bus.subscribe();

    aggregator
        .submit_report(VibeReport::new(venue.id, participant, VibeLevel::Chill))
        .await
        .unwrap();

    match rx.recv().await.unwrap() {
        PulseEvent::RescoreRequested {
            venue_id, trigger, ..
        } => {
            assert_eq!(venue_id, venue.id);
            assert_eq!(trigger, RescoreTrigger::VibeReport);
        }
        other => panic!("expected RescoreRequested, got {:?}", other),
    }

    // A rate-limited retry emits nothing
    let rejected = aggregator
        .submit_report(VibeReport::new(venue.id, participant, VibeLevel::Chill))
        .await;
    assert!(rejected.is_err());
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_duplicate_ping_silently_dropped() {
    let (store, aggregator, bus, venue) = sqlite_fixture().await;
    let mut rx = bus.subscribe();

    aggregator
        .submit_ping(AnonymousPing::new(venue.id, "device-1"))
        .await;
    aggregator
        .submit_ping(AnonymousPing::new(venue.id, "device-1"))
        .await;
    aggregator
        .submit_ping(AnonymousPing::new(venue.id, "device-2"))
        .await;

    let pings = store
        .get_recent_pings(venue.id, Utc::now() - Duration::minutes(60))
        .await
        .unwrap();
    assert_eq!(pings.len(), 2);

    // One rescore request per admitted ping
    for _ in 0..2 {
        match rx.recv().await.unwrap() {
            PulseEvent::RescoreRequested { trigger, .. } => {
                assert_eq!(trigger, RescoreTrigger::Ping);
            }
            other => panic!("expected RescoreRequested, got {:?}", other),
        }
    }
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_ping_store_failure_is_swallowed() {
    let store = Arc::new(TestStore::new());
    let venue = Venue::new("Flaky Pings");
    store.add_venue(venue.clone());
    store.fail_pings_for(venue.id);

    let bus = EventBus::new(16);
    let aggregator = CommunityAggregator::new(store.clone(), bus);

    // Never errors, never panics; the ping is just lost
    aggregator
        .submit_ping(AnonymousPing::new(venue.id, "device-x"))
        .await;
    assert_eq!(store.ping_count(), 0);
}

#[tokio::test]
async fn test_consensus_tie_yields_no_label() {
    let (_store, aggregator, _bus, venue) = sqlite_fixture().await;

    let votes = [
        (VibeLevel::Busy, 3),
        (VibeLevel::Chill, 3),
        (VibeLevel::Packed, 2),
        (VibeLevel::Dead, 2),
    ];
    for (level, count) in votes {
        for _ in 0..count {
            aggregator
                .submit_report(VibeReport::new(venue.id, Uuid::new_v4(), level))
                .await
                .unwrap();
        }
    }

    let consensus = aggregator.consensus(venue.id, None).await.unwrap();
    assert_eq!(consensus.report_count, 10);
    assert_eq!(consensus.consensus_vibe, None);
    assert_eq!(consensus.data_points, 10);
    assert_eq!(consensus.vibe_votes[&VibeLevel::Busy], 3);
    assert_eq!(consensus.vibe_votes[&VibeLevel::Dead], 2);
}

#[tokio::test]
async fn test_consensus_aggregates_waits_pings_and_social() {
    let (store, aggregator, _bus, venue) = sqlite_fixture().await;

    let mut with_wait = VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Busy);
    with_wait.wait_minutes = Some(30);
    aggregator.submit_report(with_wait).await.unwrap();

    let mut with_wait = VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Busy);
    with_wait.wait_minutes = Some(10);
    aggregator.submit_report(with_wait).await.unwrap();

    // No wait on this one; it must not drag the average
    aggregator
        .submit_report(VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Busy))
        .await
        .unwrap();

    aggregator
        .submit_ping(AnonymousPing::new(venue.id, "device-a"))
        .await;
    aggregator
        .submit_ping(AnonymousPing::new(venue.id, "device-b"))
        .await;

    sqlx::query(
        "INSERT INTO social_signals (id, venue_id, platform, created_at) VALUES (?, ?, 'gram', ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(venue.id.to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(store.pool())
    .await
    .unwrap();

    let consensus = aggregator.consensus(venue.id, None).await.unwrap();
    assert_eq!(consensus.report_count, 3);
    assert_eq!(consensus.consensus_vibe, Some(VibeLevel::Busy));
    assert_eq!(consensus.average_wait_minutes, Some(20.0));
    assert_eq!(consensus.unique_ping_devices, 2);
    assert_eq!(consensus.social_signal_count, 1);
    assert_eq!(consensus.data_points, 6);
}

#[tokio::test]
async fn test_four_packed_reports_drive_influence() {
    let (_store, aggregator, _bus, venue) = sqlite_fixture().await;

    for _ in 0..4 {
        aggregator
            .submit_report(VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Packed))
            .await
            .unwrap();
    }

    let consensus = aggregator.consensus(venue.id, None).await.unwrap();
    assert_eq!(consensus.data_points, 4);
    assert_eq!(consensus.consensus_vibe, Some(VibeLevel::Packed));

    let inf = influence(&consensus);
    assert!((inf.weight - 0.2).abs() < 1e-9);
    assert_eq!(inf.adjustment, 2.0);
}

#[tokio::test]
async fn test_consensus_window_excludes_old_reports() {
    let (store, aggregator, _bus, venue) = sqlite_fixture().await;

    let mut old = VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Dead);
    old.created_at = Utc::now() - Duration::minutes(90);
    store.insert_report(&old).await.unwrap();

    aggregator
        .submit_report(VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Packed))
        .await
        .unwrap();

    let default_window = aggregator.consensus(venue.id, None).await.unwrap();
    assert_eq!(default_window.report_count, 1);
    assert_eq!(default_window.consensus_vibe, Some(VibeLevel::Packed));

    let wide_window = aggregator.consensus(venue.id, Some(120)).await.unwrap();
    assert_eq!(wide_window.report_count, 2);
}
