//! Community consensus aggregates
//!
//! Derived on demand from raw reports and pings inside a lookback window,
//! never persisted independently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::report::VibeLevel;

/// Time-windowed aggregate of community evidence for one venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityConsensus {
    pub venue_id: Uuid,

    /// Lookback window the aggregate was computed over
    pub window_minutes: i64,

    /// Reports inside the window
    pub report_count: usize,

    /// Winning vibe label, if one label holds the unique maximum and at
    /// least 30% of votes; ties and weak pluralities yield `None`
    pub consensus_vibe: Option<VibeLevel>,

    /// Votes per label (absent labels omitted)
    pub vibe_votes: HashMap<VibeLevel, usize>,

    /// Mean of reports carrying a wait value; `None` if none did
    pub average_wait_minutes: Option<f64>,

    /// Distinct device identifiers among pings in-window
    pub unique_ping_devices: usize,

    /// Social mentions counted by the store inside the window
    pub social_signal_count: usize,

    /// reports + pings + social signals
    pub data_points: usize,
}

/// How strongly community evidence perturbs a base score
///
/// Produced from a [`CommunityConsensus`]; both fields are zero below three
/// data points (insufficient evidence).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsensusInfluence {
    /// Blend weight in [0.0, 1.0]
    pub weight: f64,

    /// Score adjustment in [-2.0, 2.0]
    pub adjustment: f64,
}

impl ConsensusInfluence {
    /// No influence (too little evidence)
    pub fn none() -> Self {
        Self { weight: 0.0, adjustment: 0.0 }
    }
}
