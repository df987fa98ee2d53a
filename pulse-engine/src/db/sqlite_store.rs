//! SQLite implementation of the venue store
//!
//! **[VPE-DB-020]** All timestamps are RFC3339 text in UTC, so window
//! comparisons work as plain string comparisons. UUIDs are stored as text.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use pulse_common::{Error, Result};

use crate::models::{
    ActivityTrend, AnonymousPing, CrowdEstimate, Score, ScoreSource, Venue, VenueMetrics,
    VibeLevel, VibeReport,
};
use crate::store::VenueStore;

/// Check-ins inside this window count as "currently active".
const ACTIVE_WINDOW_MINUTES: i64 = 30;

/// Lookback for the latest logged wait time and for sentiment.
const WAIT_WINDOW_MINUTES: i64 = 120;
const SENTIMENT_WINDOW_MINUTES: i64 = 120;

/// Lookback for recently shared photos.
const PHOTO_WINDOW_MINUTES: i64 = 60;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a venue row. Fails on duplicate id.
    pub async fn insert_venue(&self, venue: &Venue) -> Result<()> {
        let id = venue.id.to_string();
        let special_event_until = venue.special_event_until.map(|dt| dt.to_rfc3339());
        let last_source = venue.last_source.map(|s| s.as_str());
        let last_scored_at = venue.last_scored_at.map(|dt| dt.to_rfc3339());
        let created_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO venues (
                id, name, rich_telemetry, external_place_id, special_event_until,
                last_score, last_confidence, last_source, last_scored_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&venue.name)
        .bind(venue.rich_telemetry as i64)
        .bind(&venue.external_place_id)
        .bind(&special_event_until)
        .bind(venue.last_score)
        .bind(venue.last_confidence)
        .bind(last_source)
        .bind(&last_scored_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Full score history for a venue, oldest first.
    pub async fn get_history(&self, venue_id: Uuid) -> Result<Vec<Score>> {
        let rows = sqlx::query(
            r#"
            SELECT value, confidence, source, breakdown, computed_at
            FROM score_history
            WHERE venue_id = ?
            ORDER BY computed_at ASC
            "#,
        )
        .bind(venue_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(score_from_row).collect()
    }
}

#[async_trait]
impl VenueStore for SqliteStore {
    async fn get_venue(&self, id: Uuid) -> Result<Option<Venue>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, rich_telemetry, external_place_id, special_event_until,
                   last_score, last_confidence, last_source, last_scored_at
            FROM venues
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(venue_from_row).transpose()
    }

    async fn get_active_venues(&self) -> Result<Vec<Venue>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, rich_telemetry, external_place_id, special_event_until,
                   last_score, last_confidence, last_source, last_scored_at
            FROM venues
            ORDER BY rich_telemetry DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(venue_from_row).collect()
    }

    async fn get_venue_metrics(&self, venue_id: Uuid, now: DateTime<Utc>) -> Result<VenueMetrics> {
        let venue_id_str = venue_id.to_string();

        let special_event_until: Option<Option<String>> =
            sqlx::query_scalar("SELECT special_event_until FROM venues WHERE id = ?")
                .bind(&venue_id_str)
                .fetch_optional(&self.pool)
                .await?;
        let special_event_until = match special_event_until {
            Some(value) => value,
            None => return Err(Error::NotFound(format!("Venue {} not found", venue_id))),
        };
        let special_event = match special_event_until {
            Some(raw) => parse_timestamp(&raw, "venues.special_event_until")? > now,
            None => false,
        };

        let active_since = (now - Duration::minutes(ACTIVE_WINDOW_MINUTES)).to_rfc3339();
        let hour_ago = (now - Duration::minutes(60)).to_rfc3339();
        let two_hours_ago = (now - Duration::minutes(120)).to_rfc3339();

        let active_check_ins: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM check_ins WHERE venue_id = ? AND created_at >= ?",
        )
        .bind(&venue_id_str)
        .bind(&active_since)
        .fetch_one(&self.pool)
        .await?;

        let last_hour_check_ins: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM check_ins WHERE venue_id = ? AND created_at >= ?",
        )
        .bind(&venue_id_str)
        .bind(&hour_ago)
        .fetch_one(&self.pool)
        .await?;

        let prior_hour_check_ins: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM check_ins WHERE venue_id = ? AND created_at >= ? AND created_at < ?",
        )
        .bind(&venue_id_str)
        .bind(&two_hours_ago)
        .bind(&hour_ago)
        .fetch_one(&self.pool)
        .await?;

        let wait_since = (now - Duration::minutes(WAIT_WINDOW_MINUTES)).to_rfc3339();
        let wait_minutes: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT minutes FROM wait_entries
            WHERE venue_id = ? AND created_at >= ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(&venue_id_str)
        .bind(&wait_since)
        .fetch_optional(&self.pool)
        .await?;

        let sentiment_since = (now - Duration::minutes(SENTIMENT_WINDOW_MINUTES)).to_rfc3339();
        let average_rating: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(CAST(rating AS REAL)) FROM ratings WHERE venue_id = ? AND created_at >= ?",
        )
        .bind(&venue_id_str)
        .bind(&sentiment_since)
        .fetch_one(&self.pool)
        .await?;
        // Map the 1-5 star average onto [-1, 1] around the neutral 3
        let sentiment = average_rating
            .map(|avg| ((avg - 3.0) / 2.0).clamp(-1.0, 1.0))
            .unwrap_or(0.0);

        let photo_since = (now - Duration::minutes(PHOTO_WINDOW_MINUTES)).to_rfc3339();
        let recent_photo_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM venue_photos WHERE venue_id = ? AND created_at >= ?",
        )
        .bind(&venue_id_str)
        .bind(&photo_since)
        .fetch_one(&self.pool)
        .await?;

        Ok(VenueMetrics {
            venue_id,
            active_check_ins: active_check_ins as u32,
            last_hour_check_ins: last_hour_check_ins as u32,
            prior_hour_check_ins: prior_hour_check_ins as u32,
            trend: ActivityTrend::from_counts(last_hour_check_ins as u32, prior_hour_check_ins as u32),
            wait_minutes: wait_minutes.map(|m| m as u32),
            sentiment,
            recent_photo_count: recent_photo_count as u32,
            hour: now.hour(),
            day_of_week: now.weekday(),
            special_event,
        })
    }

    async fn get_recent_reports(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<VibeReport>> {
        let rows = sqlx::query(
            r#"
            SELECT id, venue_id, participant_id, vibe_level, wait_minutes, crowd_percent, created_at
            FROM vibe_reports
            WHERE venue_id = ? AND created_at >= ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(venue_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(report_from_row).collect()
    }

    async fn get_recent_pings(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnonymousPing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, venue_id, device_id, created_at
            FROM pings
            WHERE venue_id = ? AND created_at >= ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(venue_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ping_from_row).collect()
    }

    async fn get_recent_social_signal_count(
        &self,
        venue_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM social_signals WHERE venue_id = ? AND created_at >= ?",
        )
        .bind(venue_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as usize)
    }

    async fn insert_report(&self, report: &VibeReport) -> Result<()> {
        let id = report.id.to_string();
        let venue_id = report.venue_id.to_string();
        let participant_id = report.participant_id.to_string();
        let wait_minutes = report.wait_minutes.map(|m| m as i64);
        let crowd_percent = report.crowd_estimate.map(|c| c.as_percent() as i64);
        let created_at = report.created_at.to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO vibe_reports (
                id, venue_id, participant_id, vibe_level, wait_minutes, crowd_percent, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&venue_id)
        .bind(&participant_id)
        .bind(report.vibe_level.as_str())
        .bind(wait_minutes)
        .bind(crowd_percent)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_ping(&self, ping: &AnonymousPing) -> Result<()> {
        sqlx::query(
            "INSERT INTO pings (id, venue_id, device_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(ping.id.to_string())
        .bind(ping.venue_id.to_string())
        .bind(&ping.device_id)
        .bind(ping.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn persist_score(&self, venue_id: Uuid, score: &Score) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE venues
            SET last_score = ?, last_confidence = ?, last_source = ?, last_scored_at = ?
            WHERE id = ?
            "#,
        )
        .bind(score.value)
        .bind(score.confidence)
        .bind(score.source.as_str())
        .bind(score.computed_at.to_rfc3339())
        .bind(venue_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Venue {} not found", venue_id)));
        }

        Ok(())
    }

    async fn append_history(&self, venue_id: Uuid, score: &Score) -> Result<()> {
        let breakdown = score
            .breakdown
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Internal(format!("Failed to serialize breakdown: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO score_history (id, venue_id, value, confidence, source, breakdown, computed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(venue_id.to_string())
        .bind(score.value)
        .bind(score.confidence)
        .bind(score.source.as_str())
        .bind(&breakdown)
        .bind(score.computed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn parse_uuid(raw: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn venue_from_row(row: &SqliteRow) -> Result<Venue> {
    let id: String = row.get("id");
    let special_event_until: Option<String> = row.get("special_event_until");
    let last_source: Option<String> = row.get("last_source");
    let last_scored_at: Option<String> = row.get("last_scored_at");

    Ok(Venue {
        id: parse_uuid(&id, "venues.id")?,
        name: row.get("name"),
        rich_telemetry: row.get::<i64, _>("rich_telemetry") != 0,
        external_place_id: row.get("external_place_id"),
        special_event_until: special_event_until
            .map(|raw| parse_timestamp(&raw, "venues.special_event_until"))
            .transpose()?,
        last_score: row.get("last_score"),
        last_confidence: row.get("last_confidence"),
        last_source: last_source
            .map(|raw| {
                ScoreSource::parse(&raw)
                    .ok_or_else(|| Error::Internal(format!("Unknown score source: {}", raw)))
            })
            .transpose()?,
        last_scored_at: last_scored_at
            .map(|raw| parse_timestamp(&raw, "venues.last_scored_at"))
            .transpose()?,
    })
}

fn report_from_row(row: &SqliteRow) -> Result<VibeReport> {
    let id: String = row.get("id");
    let venue_id: String = row.get("venue_id");
    let participant_id: String = row.get("participant_id");
    let vibe_level: String = row.get("vibe_level");
    let created_at: String = row.get("created_at");

    Ok(VibeReport {
        id: parse_uuid(&id, "vibe_reports.id")?,
        venue_id: parse_uuid(&venue_id, "vibe_reports.venue_id")?,
        participant_id: parse_uuid(&participant_id, "vibe_reports.participant_id")?,
        vibe_level: VibeLevel::parse(&vibe_level)
            .ok_or_else(|| Error::Internal(format!("Unknown vibe level: {}", vibe_level)))?,
        wait_minutes: row.get::<Option<i64>, _>("wait_minutes").map(|m| m as u32),
        crowd_estimate: row
            .get::<Option<i64>, _>("crowd_percent")
            .and_then(|p| CrowdEstimate::from_percent(p as u8)),
        created_at: parse_timestamp(&created_at, "vibe_reports.created_at")?,
    })
}

fn ping_from_row(row: &SqliteRow) -> Result<AnonymousPing> {
    let id: String = row.get("id");
    let venue_id: String = row.get("venue_id");
    let created_at: String = row.get("created_at");

    Ok(AnonymousPing {
        id: parse_uuid(&id, "pings.id")?,
        venue_id: parse_uuid(&venue_id, "pings.venue_id")?,
        device_id: row.get("device_id"),
        created_at: parse_timestamp(&created_at, "pings.created_at")?,
    })
}

fn score_from_row(row: &SqliteRow) -> Result<Score> {
    let source: String = row.get("source");
    let breakdown: Option<String> = row.get("breakdown");
    let computed_at: String = row.get("computed_at");

    Ok(Score {
        value: row.get("value"),
        confidence: row.get("confidence"),
        source: ScoreSource::parse(&source)
            .ok_or_else(|| Error::Internal(format!("Unknown score source: {}", source)))?,
        computed_at: parse_timestamp(&computed_at, "score_history.computed_at")?,
        breakdown: breakdown
            .map(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|e| Error::Internal(format!("Failed to parse breakdown: {}", e)))
            })
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    async fn test_store() -> SqliteStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    async fn insert_check_in(store: &SqliteStore, venue_id: Uuid, at: DateTime<Utc>) {
        sqlx::query(
            "INSERT INTO check_ins (id, venue_id, participant_id, created_at) VALUES (?, ?, NULL, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(venue_id.to_string())
        .bind(at.to_rfc3339())
        .execute(store.pool())
        .await
        .unwrap();
    }

    async fn insert_rating(store: &SqliteStore, venue_id: Uuid, rating: i64, at: DateTime<Utc>) {
        sqlx::query("INSERT INTO ratings (id, venue_id, rating, created_at) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(venue_id.to_string())
            .bind(rating)
            .bind(at.to_rfc3339())
            .execute(store.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_venue_round_trip() {
        let store = test_store().await;
        let now = Utc::now();

        let mut venue = Venue::new("The Half Moon");
        venue.rich_telemetry = true;
        venue.external_place_id = Some("ext-123".to_string());
        venue.special_event_until = Some(now + Duration::hours(3));
        store.insert_venue(&venue).await.unwrap();

        let loaded = store.get_venue(venue.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, venue.id);
        assert_eq!(loaded.name, "The Half Moon");
        assert!(loaded.rich_telemetry);
        assert_eq!(loaded.external_place_id.as_deref(), Some("ext-123"));
        assert!(loaded.has_special_event(now));
        assert!(loaded.last_score.is_none());
        assert!(loaded.last_source.is_none());

        let missing = store.get_venue(Uuid::new_v4()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_active_venues_rich_first() {
        let store = test_store().await;

        let mut rich = Venue::new("Zebra Room");
        rich.rich_telemetry = true;
        let sparse_a = Venue::new("Alcove");
        let sparse_b = Venue::new("Barrel House");
        store.insert_venue(&sparse_b).await.unwrap();
        store.insert_venue(&rich).await.unwrap();
        store.insert_venue(&sparse_a).await.unwrap();

        let venues = store.get_active_venues().await.unwrap();
        let names: Vec<&str> = venues.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra Room", "Alcove", "Barrel House"]);
    }

    #[tokio::test]
    async fn test_metrics_assembly_windows() {
        let store = test_store().await;
        let now = Utc::now();

        let mut venue = Venue::new("Metrics Bar");
        venue.rich_telemetry = true;
        store.insert_venue(&venue).await.unwrap();

        // active + last hour
        insert_check_in(&store, venue.id, now - Duration::minutes(10)).await;
        // last hour only
        insert_check_in(&store, venue.id, now - Duration::minutes(40)).await;
        // prior hour
        insert_check_in(&store, venue.id, now - Duration::minutes(90)).await;
        // outside every window
        insert_check_in(&store, venue.id, now - Duration::minutes(200)).await;

        insert_rating(&store, venue.id, 5, now - Duration::minutes(30)).await;

        sqlx::query("INSERT INTO wait_entries (id, venue_id, minutes, created_at) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(venue.id.to_string())
            .bind(25_i64)
            .bind((now - Duration::minutes(15)).to_rfc3339())
            .execute(store.pool())
            .await
            .unwrap();

        sqlx::query("INSERT INTO venue_photos (id, venue_id, created_at) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(venue.id.to_string())
            .bind((now - Duration::minutes(20)).to_rfc3339())
            .execute(store.pool())
            .await
            .unwrap();

        let metrics = store.get_venue_metrics(venue.id, now).await.unwrap();
        assert_eq!(metrics.active_check_ins, 1);
        assert_eq!(metrics.last_hour_check_ins, 2);
        assert_eq!(metrics.prior_hour_check_ins, 1);
        assert_eq!(metrics.trend, ActivityTrend::Surging);
        assert_eq!(metrics.wait_minutes, Some(25));
        assert_eq!(metrics.sentiment, 1.0);
        assert_eq!(metrics.recent_photo_count, 1);
        assert!(!metrics.special_event);
        assert_eq!(metrics.hour, now.hour());
        assert_eq!(metrics.day_of_week, now.weekday());
    }

    #[tokio::test]
    async fn test_metrics_for_missing_venue() {
        let store = test_store().await;
        let result = store.get_venue_metrics(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_report_round_trip_and_window() {
        let store = test_store().await;
        let venue = Venue::new("Report Venue");
        store.insert_venue(&venue).await.unwrap();
        let now = Utc::now();

        let mut fresh = VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Packed);
        fresh.wait_minutes = Some(20);
        fresh.crowd_estimate = Some(CrowdEstimate::ThreeQuarters);
        store.insert_report(&fresh).await.unwrap();

        let mut stale = VibeReport::new(venue.id, Uuid::new_v4(), VibeLevel::Dead);
        stale.created_at = now - Duration::minutes(90);
        store.insert_report(&stale).await.unwrap();

        let recent = store
            .get_recent_reports(venue.id, now - Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, fresh.id);
        assert_eq!(recent[0].vibe_level, VibeLevel::Packed);
        assert_eq!(recent[0].wait_minutes, Some(20));
        assert_eq!(recent[0].crowd_estimate, Some(CrowdEstimate::ThreeQuarters));

        let all = store
            .get_recent_reports(venue.id, now - Duration::minutes(120))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let store = test_store().await;
        let venue = Venue::new("Ping Venue");
        store.insert_venue(&venue).await.unwrap();

        let ping = AnonymousPing::new(venue.id, "device-abc");
        store.insert_ping(&ping).await.unwrap();

        let pings = store
            .get_recent_pings(venue.id, Utc::now() - Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(pings.len(), 1);
        assert_eq!(pings[0].device_id, "device-abc");
    }

    #[tokio::test]
    async fn test_social_signal_count() {
        let store = test_store().await;
        let venue = Venue::new("Social Venue");
        store.insert_venue(&venue).await.unwrap();
        let now = Utc::now();

        for minutes in [5_i64, 15, 90] {
            sqlx::query(
                "INSERT INTO social_signals (id, venue_id, platform, created_at) VALUES (?, ?, 'gram', ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(venue.id.to_string())
            .bind((now - Duration::minutes(minutes)).to_rfc3339())
            .execute(store.pool())
            .await
            .unwrap();
        }

        let count = store
            .get_recent_social_signal_count(venue.id, now - Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_persist_score_updates_venue_row() {
        let store = test_store().await;
        let venue = Venue::new("Scored Venue");
        store.insert_venue(&venue).await.unwrap();

        let score = Score {
            value: 7.4,
            confidence: 0.95,
            source: ScoreSource::RichTelemetry,
            computed_at: Utc::now(),
            breakdown: None,
        };
        store.persist_score(venue.id, &score).await.unwrap();

        let loaded = store.get_venue(venue.id).await.unwrap().unwrap();
        assert_eq!(loaded.last_score, Some(7.4));
        assert_eq!(loaded.last_confidence, Some(0.95));
        assert_eq!(loaded.last_source, Some(ScoreSource::RichTelemetry));
        assert!(loaded.last_scored_at.is_some());

        let missing = store.persist_score(Uuid::new_v4(), &score).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_round_trip_with_breakdown() {
        let store = test_store().await;
        let venue = Venue::new("History Venue");
        store.insert_venue(&venue).await.unwrap();

        let mut breakdown = HashMap::new();
        breakdown.insert("external_level".to_string(), 75.0);
        breakdown.insert("community_data_points".to_string(), 4.0);

        let first = Score {
            value: 6.2,
            confidence: 0.6,
            source: ScoreSource::External,
            computed_at: Utc::now() - Duration::minutes(10),
            breakdown: Some(breakdown.clone()),
        };
        let second = Score {
            value: 6.8,
            confidence: 0.68,
            source: ScoreSource::Community,
            computed_at: Utc::now(),
            breakdown: None,
        };
        store.append_history(venue.id, &first).await.unwrap();
        store.append_history(venue.id, &second).await.unwrap();

        let history = store.get_history(venue.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value, 6.2);
        assert_eq!(history[0].breakdown, Some(breakdown));
        assert_eq!(history[1].source, ScoreSource::Community);
        assert!(history[1].breakdown.is_none());
    }
}
