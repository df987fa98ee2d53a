//! Score calculation primitives
//!
//! **[VPE-SC-010]** Pure, deterministic scoring curves. Every function here
//! is total over its documented domain: out-of-range inputs are clamped,
//! never rejected, and nothing performs I/O.
//!
//! Composition model: the activity step function *assigns* the base (it is
//! the floor before boosts, not an addend among equals); momentum, vibe and
//! wait boosts add to it; the time-of-day multiplier and special-event
//! multiplier scale the sum; the result is clamped to [0, 10] and rounded
//! to one decimal.

use crate::models::{ActivityTrend, ScoreSource, VenueMetrics};
use chrono::Weekday;

/// Anchor values for the external 0-100 scale at levels 0, 10, ..., 100
///
/// Monotone increasing with a floor of 3.0: an open venue with no signal is
/// "open but quiet", not "dead".
const EXTERNAL_SCALE_ANCHORS: [f64; 11] = [3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.2, 7.0, 7.8, 8.6, 9.5];

/// Clamp to [0, 10] and round to one decimal
///
/// Applied to every score before it becomes observable.
pub fn clamp_and_round(value: f64) -> f64 {
    (value.clamp(0.0, 10.0) * 10.0).round() / 10.0
}

/// Base score from the 30-minute active check-in count
///
/// **[VPE-SC-020]** Monotone non-decreasing step function over breakpoints
/// {0, 2, 5, 10, 15, 20, 30, 50, 75, 100} into [3.0, 9.0]. This forms the
/// floor the boosts build on.
pub fn activity_component(active_count: u32) -> f64 {
    match active_count {
        0..=1 => 3.0,
        2..=4 => 4.0,
        5..=9 => 5.0,
        10..=14 => 5.5,
        15..=19 => 6.0,
        20..=29 => 6.5,
        30..=49 => 7.0,
        50..=74 => 7.5,
        75..=99 => 8.0,
        _ => 9.0,
    }
}

/// Boost (or penalty) from the check-in trend
pub fn momentum_boost(trend: ActivityTrend) -> f64 {
    match trend {
        ActivityTrend::Surging => 1.0,
        ActivityTrend::Increasing => 0.5,
        ActivityTrend::Stable => 0.0,
        ActivityTrend::Decreasing => -0.5,
    }
}

/// Boost from rating sentiment and recent engagement artifacts
///
/// Sentiment contributes up to 0.5, artifact count up to 0.5; the sum is
/// capped at 1.0.
pub fn vibe_boost(sentiment: f64, artifact_count: u32) -> f64 {
    let sentiment_part: f64 = if sentiment > 0.7 {
        0.5
    } else if sentiment > 0.3 {
        0.3
    } else if sentiment > 0.0 {
        0.1
    } else {
        0.0
    };

    let artifact_part = if artifact_count >= 10 {
        0.5
    } else if artifact_count >= 5 {
        0.4
    } else if artifact_count >= 2 {
        0.25
    } else if artifact_count > 0 {
        0.1
    } else {
        0.0
    };

    (sentiment_part + artifact_part).min(1.0)
}

/// Boost from a reported wait time
///
/// A long wait is the strongest single busyness signal a human can report.
/// No report and a zero wait both mean no boost.
pub fn wait_time_boost(wait_minutes: Option<u32>) -> f64 {
    match wait_minutes {
        None | Some(0) => 0.0,
        Some(m) if m >= 45 => 2.0,
        Some(m) if m >= 30 => 1.5,
        Some(m) if m >= 20 => 1.0,
        Some(m) if m >= 10 => 0.7,
        Some(m) if m >= 5 => 0.5,
        Some(_) => 0.0,
    }
}

/// Calendar-context multiplier
///
/// **[VPE-SC-030]** An ordered set of calendar windows, first match wins:
///
/// 1. weekend night (Thu-Sun, 22:00-02:59) -> 1.15
/// 2. general evening (hour >= 20, or midnight) -> 1.10
/// 3. weekday happy hour (Mon-Fri, 17:00-19:59) -> 1.05
/// 4. weekday late night (Mon-Wed, 23:00/00:00/01:00) -> 0.90
/// 5. daytime (06:00-16:59) -> 0.70
/// 6. very early morning (03:00-05:59) -> 0.50
/// 7. everything else -> 1.0
///
/// The window order is normative: general evening shadows the weekday
/// late-night window at 23:00 and midnight, leaving 01:00 as the only hour
/// the 0.90 factor applies on Mon-Wed. Uncovered gaps (02:00 midweek) fall
/// through to 1.0.
pub fn time_of_day_multiplier(hour: u32, day_of_week: Weekday) -> f64 {
    let weekendish = matches!(
        day_of_week,
        Weekday::Thu | Weekday::Fri | Weekday::Sat | Weekday::Sun
    );
    if weekendish && (hour >= 22 || hour <= 2) {
        return 1.15;
    }

    if hour >= 20 || hour == 0 {
        return 1.10;
    }

    let weekday = !matches!(day_of_week, Weekday::Sat | Weekday::Sun);
    if weekday && (17..=19).contains(&hour) {
        return 1.05;
    }

    let early_week = matches!(day_of_week, Weekday::Mon | Weekday::Tue | Weekday::Wed);
    if early_week && (hour == 23 || hour <= 1) {
        return 0.90;
    }

    if (6..17).contains(&hour) {
        return 0.70;
    }

    if (3..6).contains(&hour) {
        return 0.50;
    }

    1.0
}

/// Compose a rich-telemetry score from a metrics snapshot
///
/// **[VPE-SC-040]** base = activity + momentum + vibe + wait, scaled by the
/// time-of-day multiplier and a 1.2 special-event multiplier, then clamped
/// and rounded.
pub fn compose_score(metrics: &VenueMetrics) -> f64 {
    let base = activity_component(metrics.active_check_ins)
        + momentum_boost(metrics.trend)
        + vibe_boost(metrics.sentiment, metrics.recent_photo_count)
        + wait_time_boost(metrics.wait_minutes);

    let mut scaled = base * time_of_day_multiplier(metrics.hour, metrics.day_of_week);
    if metrics.special_event {
        scaled *= 1.2;
    }

    clamp_and_round(scaled)
}

/// Convert the provider's 0-100 busyness level to the engine's 0-10 scale
///
/// **[VPE-SC-050]** Piecewise-linear interpolation across ten bands,
/// monotone increasing, range [3.0, 9.5]. Level 0 yields exactly 3.0.
pub fn convert_external_scale(level: f64) -> f64 {
    let level = level.clamp(0.0, 100.0);
    let band = (level / 10.0).floor() as usize;
    if band >= 10 {
        return EXTERNAL_SCALE_ANCHORS[10];
    }

    let lo = EXTERNAL_SCALE_ANCHORS[band];
    let hi = EXTERNAL_SCALE_ANCHORS[band + 1];
    let t = (level - band as f64 * 10.0) / 10.0;
    lo + (hi - lo) * t
}

/// Confidence in a score given evidence volume, age and source class
///
/// **[VPE-SC-060]** Base by source (rich 0.9, community 0.7, external 0.6,
/// estimated 0.5), adjusted by volume (>=20: +0.10, >=10: +0.05, <3: -0.20)
/// and by age (<15 min: +0.05, >60 min: -0.10, >120 min: a further -0.20;
/// the two staleness penalties stack). Clamped to [0.1, 1.0].
pub fn confidence(data_points: usize, age_minutes: i64, source: ScoreSource) -> f64 {
    let mut value: f64 = match source {
        ScoreSource::RichTelemetry => 0.9,
        ScoreSource::Community => 0.7,
        ScoreSource::External => 0.6,
        ScoreSource::Estimated => 0.5,
    };

    if data_points >= 20 {
        value += 0.10;
    } else if data_points >= 10 {
        value += 0.05;
    } else if data_points < 3 {
        value -= 0.20;
    }

    if age_minutes < 15 {
        value += 0.05;
    }
    if age_minutes > 60 {
        value -= 0.10;
    }
    if age_minutes > 120 {
        value -= 0.20;
    }

    value.clamp(0.1, 1.0)
}
