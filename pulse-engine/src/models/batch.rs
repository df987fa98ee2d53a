//! Batch refresh outcome models
//!
//! **[VPE-BATCH-010]** Per-venue outcomes accumulate into a summary; the
//! coordinator folds them rather than surfacing failures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::score::Score;

/// Outcome of one venue's evaluation inside a batch
#[derive(Debug, Clone)]
pub enum VenueOutcome {
    Updated {
        venue_id: Uuid,
        name: String,
        score: Score,
    },
    Failed {
        venue_id: Uuid,
        reason: String,
    },
}

/// A successfully refreshed venue worth surfacing (score >= 7.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotableVenue {
    pub venue_id: Uuid,
    pub name: String,
    pub score: f64,
}

/// A venue whose refresh failed, with the reason recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueFailure {
    pub venue_id: Uuid,
    pub reason: String,
}

/// Result of a full refresh pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Venues attempted
    pub total: usize,

    /// Venues scored and persisted
    pub updated: usize,

    /// Venues that failed (isolated, listed in `failures`)
    pub failed: usize,

    /// High-activity venues (score >= 7.0), sorted descending by score
    pub notable: Vec<NotableVenue>,

    pub failures: Vec<VenueFailure>,

    /// Wall-clock duration of the pass
    pub duration_ms: u64,
}
