//! Score model
//!
//! **[VPE-SCORE-010]** A score is a fused 0-10 value plus confidence and
//! provenance. Scores are immutable once produced; the venue row carries the
//! most recent one and `score_history` keeps the trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use pulse_common::events::ScoreSource;

/// A computed venue score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    /// Fused score, clamped to [0.0, 10.0] and rounded to one decimal
    pub value: f64,

    /// Confidence in the value, clamped to [0.1, 1.0]
    ///
    /// Never exactly 0: "no data" stays representable without becoming
    /// indistinguishable from "impossible".
    pub confidence: f64,

    /// Which signal class dominated the score
    pub source: ScoreSource,

    /// When the score was computed
    pub computed_at: DateTime<Utc>,

    /// Per-signal contributions for audit and debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<HashMap<String, f64>>,
}

impl Score {
    /// Neutral fallback emitted when an evaluation fails unexpectedly
    ///
    /// **[VPE-ENG-040]** A single venue's failure degrades to this score
    /// instead of propagating to callers.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            value: 5.0,
            confidence: 0.3,
            source: ScoreSource::Estimated,
            computed_at: now,
            breakdown: None,
        }
    }
}
