//! Batch refresh coordination
//!
//! **[VPE-BAT-010]** Walks all eligible venues in fixed-size chunks,
//! evaluating each chunk concurrently and waiting for it to finish before
//! starting the next. One venue failing never stops its siblings or the
//! rest of the batch.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info};
use uuid::Uuid;

use pulse_common::events::{EventBus, PulseEvent};

use crate::error::EngineError;
use crate::models::{BatchSummary, NotableVenue, Score, Venue, VenueFailure, VenueOutcome};
use crate::services::engine::PulseEngine;
use crate::store::VenueStore;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Updated venues at or above this score are worth surfacing.
const NOTABLE_SCORE_THRESHOLD: f64 = 7.0;

pub struct BatchCoordinator {
    engine: Arc<PulseEngine>,
    store: Arc<dyn VenueStore>,
    bus: EventBus,
    chunk_size: usize,
}

impl BatchCoordinator {
    pub fn new(
        engine: Arc<PulseEngine>,
        store: Arc<dyn VenueStore>,
        bus: EventBus,
        chunk_size: usize,
    ) -> Self {
        Self {
            engine,
            store,
            bus,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Refresh every eligible venue.
    ///
    /// **[VPE-BAT-020]** Chunk N+1 does not start until every evaluation in
    /// chunk N has completed, bounding concurrent store and provider calls
    /// to the chunk size.
    pub async fn update_all(&self) -> Result<BatchSummary, EngineError> {
        let started = Instant::now();
        let venues = self.store.get_active_venues().await?;
        let total = venues.len();

        self.bus.emit_lossy(PulseEvent::BatchStarted {
            total_venues: total,
            timestamp: Utc::now(),
        });
        info!(
            "Batch refresh started: {} venues in chunks of {}",
            total, self.chunk_size
        );

        let mut outcomes = Vec::with_capacity(total);
        for chunk in venues.chunks(self.chunk_size) {
            let evaluations = chunk.iter().map(|venue| self.refresh_one(venue));
            outcomes.extend(join_all(evaluations).await);
        }

        let summary = summarize(outcomes, started.elapsed().as_millis() as u64);

        self.bus.emit_lossy(PulseEvent::BatchCompleted {
            total: summary.total,
            updated: summary.updated,
            failed: summary.failed,
            duration_ms: summary.duration_ms,
            timestamp: Utc::now(),
        });
        info!(
            "Batch refresh finished: {}/{} updated, {} failed, {} notable, {} ms",
            summary.updated,
            summary.total,
            summary.failed,
            summary.notable.len(),
            summary.duration_ms
        );

        Ok(summary)
    }

    /// On-demand refresh of a single venue, same persistence contract as
    /// the batch path.
    pub async fn update_venue(&self, venue_id: Uuid) -> Result<Score, EngineError> {
        let score = self.engine.calculate(venue_id).await?;
        self.store.append_history(venue_id, &score).await?;
        Ok(score)
    }

    async fn refresh_one(&self, venue: &Venue) -> VenueOutcome {
        match self.update_venue(venue.id).await {
            Ok(score) => VenueOutcome::Updated {
                venue_id: venue.id,
                name: venue.name.clone(),
                score,
            },
            Err(e) => {
                error!("Batch refresh failed for venue {}: {}", venue.id, e);
                VenueOutcome::Failed {
                    venue_id: venue.id,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Fold per-venue outcomes into the batch summary.
///
/// **[VPE-BAT-030]** `notable` keeps successfully updated venues scoring
/// 7.0 or higher, sorted descending.
fn summarize(outcomes: Vec<VenueOutcome>, duration_ms: u64) -> BatchSummary {
    let total = outcomes.len();
    let mut updated = 0;
    let mut notable = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            VenueOutcome::Updated {
                venue_id,
                name,
                score,
            } => {
                updated += 1;
                if score.value >= NOTABLE_SCORE_THRESHOLD {
                    notable.push(NotableVenue {
                        venue_id,
                        name,
                        score: score.value,
                    });
                }
            }
            VenueOutcome::Failed { venue_id, reason } => {
                failures.push(VenueFailure { venue_id, reason });
            }
        }
    }

    notable.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    BatchSummary {
        total,
        updated,
        failed: failures.len(),
        notable,
        failures,
        duration_ms,
    }
}
