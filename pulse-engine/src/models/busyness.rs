//! External busyness sample model
//!
//! **[VPE-EXT-010]** The provider reports raw 0-100 levels; the derived
//! relative band, trend and confidence are computed here so the client stays
//! a thin transport + cache layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current busyness relative to the usual level for this hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeBusyness {
    Low,
    BelowAverage,
    Average,
    AboveAverage,
    High,
}

impl RelativeBusyness {
    /// Band the current/usual ratio into five levels
    ///
    /// A usual level of zero has no defined ratio: any live signal counts as
    /// busier than the unknown baseline, none as average.
    pub fn from_levels(current: u8, usual: u8) -> Self {
        if usual == 0 {
            return if current > 0 {
                RelativeBusyness::High
            } else {
                RelativeBusyness::Average
            };
        }

        let ratio = current as f64 / usual as f64;
        if ratio < 0.5 {
            RelativeBusyness::Low
        } else if ratio < 0.8 {
            RelativeBusyness::BelowAverage
        } else if ratio < 1.2 {
            RelativeBusyness::Average
        } else if ratio < 1.5 {
            RelativeBusyness::AboveAverage
        } else {
            RelativeBusyness::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelativeBusyness::Low => "low",
            RelativeBusyness::BelowAverage => "below_average",
            RelativeBusyness::Average => "average",
            RelativeBusyness::AboveAverage => "above_average",
            RelativeBusyness::High => "high",
        }
    }
}

/// Busyness direction against the hourly baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusynessTrend {
    Decreasing,
    Stable,
    Increasing,
}

impl BusynessTrend {
    /// More than 10 points above usual is increasing, more than 10 below is
    /// decreasing
    pub fn from_levels(current: u8, usual: u8) -> Self {
        let delta = current as i16 - usual as i16;
        if delta > 10 {
            BusynessTrend::Increasing
        } else if delta < -10 {
            BusynessTrend::Decreasing
        } else {
            BusynessTrend::Stable
        }
    }
}

/// Raw provider payload (levels only, pre-derivation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderReading {
    pub current_level: u8,
    pub usual_level: u8,
}

/// A cached external busyness estimate for one place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusynessSample {
    /// Live busyness level, 0-100
    pub current_level: u8,

    /// Usual level for this hour of week, 0-100
    pub usual_level: u8,

    pub relative: RelativeBusyness,
    pub trend: BusynessTrend,
    pub fetched_at: DateTime<Utc>,

    /// 0.9 with a live signal, 0.3 when the provider only has the baseline
    pub confidence: f64,
}

impl BusynessSample {
    /// Derive a full sample from a raw provider reading
    pub fn from_reading(reading: ProviderReading, fetched_at: DateTime<Utc>) -> Self {
        let confidence = if reading.current_level > 0 { 0.9 } else { 0.3 };
        Self {
            current_level: reading.current_level,
            usual_level: reading.usual_level,
            relative: RelativeBusyness::from_levels(reading.current_level, reading.usual_level),
            trend: BusynessTrend::from_levels(reading.current_level, reading.usual_level),
            fetched_at,
            confidence,
        }
    }

    /// Whether the sample carries a live signal worth scoring from
    pub fn is_usable(&self) -> bool {
        self.current_level > 0
    }
}
