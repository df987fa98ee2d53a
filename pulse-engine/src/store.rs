//! Store contract
//!
//! **[VPE-ST-010]** The engine talks to durable storage only through this
//! trait. Reads and writes are eventually consistent; no call spans a
//! transaction across the engine's multi-step logic. The SQLite
//! implementation lives in [`crate::db::sqlite_store`]; tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_common::Result;
use uuid::Uuid;

use crate::models::{AnonymousPing, Score, Venue, VenueMetrics, VibeReport};

#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Fetch a venue by id; `None` when absent
    async fn get_venue(&self, id: Uuid) -> Result<Option<Venue>>;

    /// All venues eligible for refresh, rich-telemetry venues first
    async fn get_active_venues(&self) -> Result<Vec<Venue>>;

    /// Assemble the rich-telemetry snapshot for a venue at `now`
    ///
    /// Rolling windows end at `now`; the snapshot carries the calendar
    /// context it was read at.
    async fn get_venue_metrics(&self, venue_id: Uuid, now: DateTime<Utc>) -> Result<VenueMetrics>;

    /// Vibe reports for a venue created at or after `since`
    async fn get_recent_reports(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<VibeReport>>;

    /// Anonymous pings for a venue created at or after `since`
    async fn get_recent_pings(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnonymousPing>>;

    /// Count of social mentions for a venue at or after `since`
    async fn get_recent_social_signal_count(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<usize>;

    /// Record an accepted vibe report
    async fn insert_report(&self, report: &VibeReport) -> Result<()>;

    /// Record an accepted ping
    async fn insert_ping(&self, ping: &AnonymousPing) -> Result<()>;

    /// Write the venue's current score fields
    async fn persist_score(&self, venue_id: Uuid, score: &Score) -> Result<()>;

    /// Append a score history row
    async fn append_history(&self, venue_id: Uuid, score: &Score) -> Result<()>;
}
