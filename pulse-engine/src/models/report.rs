//! Community submission models
//!
//! **[VPE-AGG-010]** Two crowd signal shapes: structured vibe reports from
//! identified participants, and anonymous presence pings from devices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crowd-reported vibe label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibeLevel {
    Dead,
    Chill,
    Busy,
    Packed,
}

impl VibeLevel {
    /// Stable string form used in database columns
    pub fn as_str(&self) -> &'static str {
        match self {
            VibeLevel::Dead => "dead",
            VibeLevel::Chill => "chill",
            VibeLevel::Busy => "busy",
            VibeLevel::Packed => "packed",
        }
    }

    /// Parse the stable string form; `None` for unknown input
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dead" => Some(VibeLevel::Dead),
            "chill" => Some(VibeLevel::Chill),
            "busy" => Some(VibeLevel::Busy),
            "packed" => Some(VibeLevel::Packed),
            _ => None,
        }
    }
}

/// Reporter's rough crowd-fullness estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrowdEstimate {
    Empty,
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl CrowdEstimate {
    /// Percent value stored in the database
    pub fn as_percent(&self) -> u8 {
        match self {
            CrowdEstimate::Empty => 0,
            CrowdEstimate::Quarter => 25,
            CrowdEstimate::Half => 50,
            CrowdEstimate::ThreeQuarters => 75,
            CrowdEstimate::Full => 100,
        }
    }

    /// Inverse of [`CrowdEstimate::as_percent`]; `None` for off-grid values
    pub fn from_percent(percent: u8) -> Option<Self> {
        match percent {
            0 => Some(CrowdEstimate::Empty),
            25 => Some(CrowdEstimate::Quarter),
            50 => Some(CrowdEstimate::Half),
            75 => Some(CrowdEstimate::ThreeQuarters),
            100 => Some(CrowdEstimate::Full),
            _ => None,
        }
    }
}

/// Structured crowd report from an identified participant
///
/// Admission rule: one accepted report per (venue, participant) per rolling
/// hour. A second report inside the window is rejected as rate-limited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeReport {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub participant_id: Uuid,
    pub vibe_level: VibeLevel,
    pub wait_minutes: Option<u32>,
    pub crowd_estimate: Option<CrowdEstimate>,
    pub created_at: DateTime<Utc>,
}

impl VibeReport {
    pub fn new(venue_id: Uuid, participant_id: Uuid, vibe_level: VibeLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            venue_id,
            participant_id,
            vibe_level,
            wait_minutes: None,
            crowd_estimate: None,
            created_at: Utc::now(),
        }
    }
}

/// Anonymous presence ping from a device
///
/// Same one-per-hour-per-device admission window as reports, but violations
/// are silently dropped rather than errored (lower-trust signal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousPing {
    pub id: Uuid,
    pub venue_id: Uuid,
    /// Opaque device identifier (hashed client-side, never a user id)
    pub device_id: String,
    pub created_at: DateTime<Utc>,
}

impl AnonymousPing {
    pub fn new(venue_id: Uuid, device_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            venue_id,
            device_id: device_id.into(),
            created_at: Utc::now(),
        }
    }
}
