//! Score fusion engine
//!
//! **[VPE-ENG-010]** Resolves a venue, picks the rich-telemetry or sparse
//! scoring path, fuses whatever signals are available, persists the result,
//! and announces it on the event bus.
//!
//! Failure posture: a missing venue surfaces as `VenueNotFound`, and a
//! failed persist surfaces as a store error. Everything in between degrades
//! to the fixed default score rather than failing the call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::{error, info};
use uuid::Uuid;

use pulse_common::events::{EventBus, PulseEvent};

use crate::error::EngineError;
use crate::models::{Score, ScoreSource, Venue};
use crate::services::busyness::BusynessClient;
use crate::services::community::{influence, CommunityAggregator};
use crate::services::score_calculator::{
    activity_component, clamp_and_round, compose_score, convert_external_scale, momentum_boost,
    time_of_day_multiplier, vibe_boost, wait_time_boost,
};
use crate::store::VenueStore;

/// Fixed confidence for first-party telemetry scores.
const RICH_TELEMETRY_CONFIDENCE: f64 = 0.95;

/// Sparse-path starting point before any external or community signal.
const NEUTRAL_BASE: f64 = 5.0;
const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Confidence assigned when a usable external sample replaces the base.
const EXTERNAL_CONFIDENCE: f64 = 0.6;

/// Community blending raises confidence by 0.3 x weight, up to this cap.
const BLENDED_CONFIDENCE_CAP: f64 = 0.8;

/// Community provenance takes over at this many data points.
const COMMUNITY_PROMOTION_THRESHOLD: usize = 10;

pub struct PulseEngine {
    store: Arc<dyn VenueStore>,
    busyness: Arc<BusynessClient>,
    community: Arc<CommunityAggregator>,
    bus: EventBus,
}

impl PulseEngine {
    pub fn new(
        store: Arc<dyn VenueStore>,
        busyness: Arc<BusynessClient>,
        community: Arc<CommunityAggregator>,
        bus: EventBus,
    ) -> Self {
        Self {
            store,
            busyness,
            community,
            bus,
        }
    }

    /// Compute, persist, and announce the current score for one venue.
    ///
    /// **[VPE-ENG-020]** `VenueNotFound` and store write failures propagate;
    /// every other failure degrades to [`Score::fallback`].
    pub async fn calculate(&self, venue_id: Uuid) -> Result<Score, EngineError> {
        let venue = self
            .store
            .get_venue(venue_id)
            .await?
            .ok_or(EngineError::VenueNotFound(venue_id))?;

        let now = Utc::now();
        let score = if venue.rich_telemetry {
            self.rich_path(&venue, now).await
        } else {
            self.sparse_path(&venue, now).await
        };

        self.store.persist_score(venue.id, &score).await?;
        self.bus.emit_lossy(PulseEvent::ScoreUpdated {
            venue_id: venue.id,
            value: score.value,
            confidence: score.confidence,
            source: score.source,
            timestamp: score.computed_at,
        });

        info!(
            "Scored venue {} ({}): {} [{}] confidence {:.2}",
            venue.name,
            venue.id,
            score.value,
            score.source.as_str(),
            score.confidence
        );

        Ok(score)
    }

    /// **[VPE-ENG-030]** First-party telemetry path: full metrics window,
    /// composed score, fixed high confidence, component breakdown.
    async fn rich_path(&self, venue: &Venue, now: DateTime<Utc>) -> Score {
        let metrics = match self.store.get_venue_metrics(venue.id, now).await {
            Ok(metrics) => metrics,
            Err(e) => {
                error!(
                    "Metrics read failed for venue {}, using fallback score: {}",
                    venue.id, e
                );
                return Score::fallback(now);
            }
        };

        let value = compose_score(&metrics);

        let mut breakdown = HashMap::new();
        breakdown.insert(
            "activity".to_string(),
            activity_component(metrics.active_check_ins),
        );
        breakdown.insert("momentum".to_string(), momentum_boost(metrics.trend));
        breakdown.insert(
            "vibe".to_string(),
            vibe_boost(metrics.sentiment, metrics.recent_photo_count),
        );
        breakdown.insert("wait".to_string(), wait_time_boost(metrics.wait_minutes));
        breakdown.insert(
            "time_multiplier".to_string(),
            time_of_day_multiplier(metrics.hour, metrics.day_of_week),
        );
        if metrics.special_event {
            breakdown.insert("special_event_multiplier".to_string(), 1.2);
        }

        Score {
            value,
            confidence: RICH_TELEMETRY_CONFIDENCE,
            source: ScoreSource::RichTelemetry,
            computed_at: now,
            breakdown: Some(breakdown),
        }
    }

    /// **[VPE-ENG-035]** Sparse path: neutral base, optionally replaced by
    /// the external busyness estimate, always blended with community
    /// consensus, then shaped by the time of day.
    async fn sparse_path(&self, venue: &Venue, now: DateTime<Utc>) -> Score {
        let mut base = NEUTRAL_BASE;
        let mut confidence = NEUTRAL_CONFIDENCE;
        let mut source = ScoreSource::Estimated;
        let mut external_level: Option<f64> = None;

        if let Some(place_id) = &venue.external_place_id {
            if let Some(sample) = self.busyness.get_busyness(place_id).await {
                if sample.is_usable() {
                    let level = f64::from(sample.current_level);
                    base = convert_external_scale(level);
                    confidence = EXTERNAL_CONFIDENCE;
                    source = ScoreSource::External;
                    external_level = Some(level);
                }
            }
        }

        let consensus = match self.community.consensus(venue.id, None).await {
            Ok(consensus) => consensus,
            Err(e) => {
                error!(
                    "Consensus read failed for venue {}, using fallback score: {}",
                    venue.id, e
                );
                return Score::fallback(now);
            }
        };

        if consensus.data_points >= 3 {
            let inf = influence(&consensus);
            if inf.weight > 0.0 {
                base = base * (1.0 - inf.weight) + (base + inf.adjustment) * inf.weight;
                confidence = (confidence + 0.3 * inf.weight).min(BLENDED_CONFIDENCE_CAP);
                if consensus.data_points >= COMMUNITY_PROMOTION_THRESHOLD {
                    source = ScoreSource::Community;
                }
            }
        }

        let multiplier = time_of_day_multiplier(now.hour(), now.weekday());
        let value = clamp_and_round(base * multiplier);

        let mut breakdown = HashMap::new();
        if let Some(level) = external_level {
            breakdown.insert("external_level".to_string(), level);
        }
        breakdown.insert(
            "community_data_points".to_string(),
            consensus.data_points as f64,
        );

        Score {
            value,
            confidence,
            source,
            computed_at: now,
            breakdown: Some(breakdown),
        }
    }
}
