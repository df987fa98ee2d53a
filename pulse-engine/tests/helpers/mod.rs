//! Shared test fixtures: an in-memory programmable store and a canned
//! busyness provider.

// Not every test binary uses every fixture
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc, Weekday};
use uuid::Uuid;

use pulse_common::{Error, Result};
use pulse_engine::models::{
    ActivityTrend, AnonymousPing, ProviderReading, Score, Venue, VenueMetrics, VibeReport,
};
use pulse_engine::services::busyness::{BusynessProvider, ProviderError};
use pulse_engine::store::VenueStore;

/// Programmable in-memory store.
///
/// Tracks concurrent `get_venue` calls so batch tests can assert the
/// chunk-size concurrency bound, and injects failures per venue id.
#[derive(Default)]
pub struct TestStore {
    venues: Mutex<HashMap<Uuid, Venue>>,
    metrics: Mutex<HashMap<Uuid, VenueMetrics>>,
    reports: Mutex<Vec<VibeReport>>,
    pings: Mutex<Vec<AnonymousPing>>,
    social: Mutex<HashMap<Uuid, usize>>,
    persisted: Mutex<HashMap<Uuid, Score>>,
    history: Mutex<Vec<(Uuid, Score)>>,
    fail_metrics: Mutex<HashSet<Uuid>>,
    fail_reports: Mutex<HashSet<Uuid>>,
    fail_pings: Mutex<HashSet<Uuid>>,
    fail_persist: Mutex<HashSet<Uuid>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    eval_delay_ms: u64,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each `get_venue` call open for a moment so concurrent calls
    /// overlap observably.
    pub fn with_eval_delay(mut self, delay_ms: u64) -> Self {
        self.eval_delay_ms = delay_ms;
        self
    }

    pub fn add_venue(&self, venue: Venue) {
        self.venues.lock().unwrap().insert(venue.id, venue);
    }

    pub fn set_metrics(&self, metrics: VenueMetrics) {
        self.metrics.lock().unwrap().insert(metrics.venue_id, metrics);
    }

    pub fn add_report(&self, report: VibeReport) {
        self.reports.lock().unwrap().push(report);
    }

    pub fn add_ping(&self, ping: AnonymousPing) {
        self.pings.lock().unwrap().push(ping);
    }

    pub fn set_social_count(&self, venue_id: Uuid, count: usize) {
        self.social.lock().unwrap().insert(venue_id, count);
    }

    pub fn fail_metrics_for(&self, venue_id: Uuid) {
        self.fail_metrics.lock().unwrap().insert(venue_id);
    }

    pub fn fail_reports_for(&self, venue_id: Uuid) {
        self.fail_reports.lock().unwrap().insert(venue_id);
    }

    pub fn fail_pings_for(&self, venue_id: Uuid) {
        self.fail_pings.lock().unwrap().insert(venue_id);
    }

    pub fn fail_persist_for(&self, venue_id: Uuid) {
        self.fail_persist.lock().unwrap().insert(venue_id);
    }

    pub fn persisted_score(&self, venue_id: Uuid) -> Option<Score> {
        self.persisted.lock().unwrap().get(&venue_id).cloned()
    }

    pub fn history_for(&self, venue_id: Uuid) -> Vec<Score> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == venue_id)
            .map(|(_, score)| score.clone())
            .collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VenueStore for TestStore {
    async fn get_venue(&self, id: Uuid) -> Result<Option<Venue>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let venue = self.venues.lock().unwrap().get(&id).cloned();
        if self.eval_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.eval_delay_ms)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(venue)
    }

    async fn get_active_venues(&self) -> Result<Vec<Venue>> {
        let mut venues: Vec<Venue> = self.venues.lock().unwrap().values().cloned().collect();
        venues.sort_by(|a, b| {
            b.rich_telemetry
                .cmp(&a.rich_telemetry)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(venues)
    }

    async fn get_venue_metrics(&self, venue_id: Uuid, _now: DateTime<Utc>) -> Result<VenueMetrics> {
        if self.fail_metrics.lock().unwrap().contains(&venue_id) {
            return Err(Error::Internal("injected metrics failure".to_string()));
        }
        self.metrics
            .lock()
            .unwrap()
            .get(&venue_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No metrics for venue {}", venue_id)))
    }

    async fn get_recent_reports(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<VibeReport>> {
        if self.fail_reports.lock().unwrap().contains(&venue_id) {
            return Err(Error::Internal("injected report read failure".to_string()));
        }
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.venue_id == venue_id && r.created_at >= since)
            .cloned()
            .collect())
    }

    async fn get_recent_pings(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnonymousPing>> {
        if self.fail_pings.lock().unwrap().contains(&venue_id) {
            return Err(Error::Internal("injected ping read failure".to_string()));
        }
        Ok(self
            .pings
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.venue_id == venue_id && p.created_at >= since)
            .cloned()
            .collect())
    }

    async fn get_recent_social_signal_count(
        &self,
        venue_id: Uuid,
        _since: DateTime<Utc>,
    ) -> Result<usize> {
        Ok(self
            .social
            .lock()
            .unwrap()
            .get(&venue_id)
            .copied()
            .unwrap_or(0))
    }

    async fn insert_report(&self, report: &VibeReport) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn insert_ping(&self, ping: &AnonymousPing) -> Result<()> {
        self.pings.lock().unwrap().push(ping.clone());
        Ok(())
    }

    async fn persist_score(&self, venue_id: Uuid, score: &Score) -> Result<()> {
        if self.fail_persist.lock().unwrap().contains(&venue_id) {
            return Err(Error::Internal("injected persist failure".to_string()));
        }
        self.persisted.lock().unwrap().insert(venue_id, score.clone());
        Ok(())
    }

    async fn append_history(&self, venue_id: Uuid, score: &Score) -> Result<()> {
        self.history.lock().unwrap().push((venue_id, score.clone()));
        Ok(())
    }
}

/// Busyness provider returning a canned reading, or unavailable when
/// constructed without one.
pub struct StaticProvider {
    reading: Option<ProviderReading>,
}

impl StaticProvider {
    pub fn with_reading(current_level: u8, usual_level: u8) -> Self {
        Self {
            reading: Some(ProviderReading {
                current_level,
                usual_level,
            }),
        }
    }

    pub fn unavailable() -> Self {
        Self { reading: None }
    }
}

#[async_trait]
impl BusynessProvider for StaticProvider {
    async fn fetch(&self, _place_id: &str) -> std::result::Result<ProviderReading, ProviderError> {
        match self.reading {
            Some(reading) => Ok(reading),
            None => Err(ProviderError::NotConfigured),
        }
    }

    fn is_available(&self) -> bool {
        self.reading.is_some()
    }
}

/// Metrics for a packed Friday-night venue with a special event running.
/// Composes to the maximum score of 10.0.
pub fn peak_night_metrics(venue_id: Uuid) -> VenueMetrics {
    VenueMetrics {
        venue_id,
        active_check_ins: 80,
        last_hour_check_ins: 40,
        prior_hour_check_ins: 20,
        trend: ActivityTrend::Surging,
        wait_minutes: Some(45),
        sentiment: 0.9,
        recent_photo_count: 12,
        hour: 23,
        day_of_week: Weekday::Fri,
        special_event: true,
    }
}

/// Metrics for a quiet weekday lunchtime venue.
pub fn quiet_daytime_metrics(venue_id: Uuid) -> VenueMetrics {
    VenueMetrics {
        venue_id,
        active_check_ins: 2,
        last_hour_check_ins: 2,
        prior_hour_check_ins: 2,
        trend: ActivityTrend::Stable,
        wait_minutes: None,
        sentiment: 0.0,
        recent_photo_count: 0,
        hour: 12,
        day_of_week: Weekday::Tue,
        special_event: false,
    }
}
