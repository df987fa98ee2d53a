//! Rich-telemetry metrics snapshot
//!
//! `VenueMetrics` is assembled per evaluation from the store's rolling
//! windows and never persisted as an entity.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Check-in trend over the last two hourly windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTrend {
    Surging,
    Increasing,
    Stable,
    Decreasing,
}

impl ActivityTrend {
    /// Derive the trend from last-hour vs prior-hour check-in counts
    ///
    /// A prior hour of zero cannot form a ratio: five or more check-ins out
    /// of nothing reads as surging, any activity as increasing.
    pub fn from_counts(last_hour: u32, prior_hour: u32) -> Self {
        if prior_hour == 0 {
            return if last_hour >= 5 {
                ActivityTrend::Surging
            } else if last_hour > 0 {
                ActivityTrend::Increasing
            } else {
                ActivityTrend::Stable
            };
        }

        let ratio = last_hour as f64 / prior_hour as f64;
        if ratio >= 1.5 {
            ActivityTrend::Surging
        } else if ratio > 1.1 {
            ActivityTrend::Increasing
        } else if ratio < 0.6 {
            ActivityTrend::Decreasing
        } else {
            ActivityTrend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityTrend::Surging => "surging",
            ActivityTrend::Increasing => "increasing",
            ActivityTrend::Stable => "stable",
            ActivityTrend::Decreasing => "decreasing",
        }
    }
}

/// Rich-telemetry input to score composition
///
/// Counts come from rolling windows ending at the evaluation instant;
/// `hour`/`day_of_week` are the calendar context the windows were read at,
/// so the time-of-day multiplier matches the data it applies to.
#[derive(Debug, Clone)]
pub struct VenueMetrics {
    pub venue_id: Uuid,

    /// Check-ins still active (last 30 minutes)
    pub active_check_ins: u32,

    /// Check-ins within the last hour
    pub last_hour_check_ins: u32,

    /// Check-ins within the hour before that
    pub prior_hour_check_ins: u32,

    pub trend: ActivityTrend,

    /// Most recent reported wait, if anyone logged one
    pub wait_minutes: Option<u32>,

    /// Rating sentiment aggregate in [-1.0, 1.0]
    pub sentiment: f64,

    /// Photos uploaded recently (engagement artifacts)
    pub recent_photo_count: u32,

    /// Hour of day (0-23) at evaluation
    pub hour: u32,

    pub day_of_week: Weekday,

    pub special_event: bool,
}
