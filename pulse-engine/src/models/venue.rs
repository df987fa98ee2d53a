//! Venue model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::score::ScoreSource;

/// A venue as the engine sees it
///
/// Owns onboarding status, the external provider place identifier, and the
/// last persisted score fields. Only the engine's persistence step mutates
/// the `last_*` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,

    /// Rich-telemetry onboarding: first-party check-ins, wait logs and
    /// ratings flow in for this venue
    pub rich_telemetry: bool,

    /// Place identifier at the external busyness provider, if linked
    pub external_place_id: Option<String>,

    /// End of the currently scheduled special event, if any
    pub special_event_until: Option<DateTime<Utc>>,

    pub last_score: Option<f64>,
    pub last_confidence: Option<f64>,
    pub last_source: Option<ScoreSource>,
    pub last_scored_at: Option<DateTime<Utc>>,
}

impl Venue {
    /// New sparse venue with no telemetry, no external link, no score yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rich_telemetry: false,
            external_place_id: None,
            special_event_until: None,
            last_score: None,
            last_confidence: None,
            last_source: None,
            last_scored_at: None,
        }
    }

    /// Whether a special event is running at `now`
    pub fn has_special_event(&self, now: DateTime<Utc>) -> bool {
        self.special_event_until.map(|until| until > now).unwrap_or(false)
    }
}
