//! Community report ingestion and consensus
//!
//! **[VPE-AGG-010]** Crowd-sourced vibe reports and anonymous pings are
//! admitted through per-participant rate limits, then folded on demand into
//! a time-windowed [`CommunityConsensus`]. The consensus never persists on
//! its own; it is recomputed from raw rows each time the engine asks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use pulse_common::events::{EventBus, PulseEvent, RescoreTrigger};

use crate::error::EngineError;
use crate::models::{
    AnonymousPing, CommunityConsensus, ConsensusInfluence, VibeLevel, VibeReport,
};
use crate::store::VenueStore;

/// One report (or ping) per participant per venue per hour.
const ADMISSION_WINDOW_MINUTES: i64 = 60;

/// Default lookback when the caller does not specify one.
const DEFAULT_CONSENSUS_WINDOW_MINUTES: i64 = 60;

/// A vote plurality only becomes the consensus at 30% of total votes or more.
const CONSENSUS_THRESHOLD_PERCENT: usize = 30;

pub struct CommunityAggregator {
    store: Arc<dyn VenueStore>,
    bus: EventBus,
}

impl CommunityAggregator {
    pub fn new(store: Arc<dyn VenueStore>, bus: EventBus) -> Self {
        Self { store, bus }
    }

    /// Submit a structured vibe report.
    ///
    /// **[VPE-AGG-020]** Rejects with [`EngineError::RateLimited`] when the
    /// same participant already reported this venue within the trailing
    /// hour. Accepted reports request a re-score of the venue; delivery of
    /// that request is best-effort.
    ///
    /// The admission check and the insert are separate statements, so two
    /// concurrent submissions from one participant can both land inside the
    /// window. Accepted relaxation; consensus tolerates the extra vote.
    pub async fn submit_report(&self, report: VibeReport) -> Result<(), EngineError> {
        let since = report.created_at - Duration::minutes(ADMISSION_WINDOW_MINUTES);
        let recent = self.store.get_recent_reports(report.venue_id, since).await?;

        if let Some(previous) = recent
            .iter()
            .filter(|r| r.participant_id == report.participant_id)
            .max_by_key(|r| r.created_at)
        {
            let elapsed = report
                .created_at
                .signed_duration_since(previous.created_at)
                .num_minutes();
            let retry_after_minutes = (ADMISSION_WINDOW_MINUTES - elapsed).max(1);
            debug!(
                "Vibe report rate limited for venue {} (participant reported {} min ago)",
                report.venue_id, elapsed
            );
            return Err(EngineError::RateLimited {
                venue_id: report.venue_id,
                retry_after_minutes,
            });
        }

        self.store.insert_report(&report).await?;
        info!(
            "Vibe report accepted: venue {} level {}",
            report.venue_id,
            report.vibe_level.as_str()
        );

        self.bus.emit_lossy(PulseEvent::RescoreRequested {
            venue_id: report.venue_id,
            trigger: RescoreTrigger::VibeReport,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Submit an anonymous presence ping.
    ///
    /// **[VPE-AGG-030]** Same one-per-hour admission window, keyed by device
    /// instead of participant, but violations are dropped silently. Pings
    /// are a best-effort signal; this method never returns an error, and
    /// store failures are logged and swallowed.
    pub async fn submit_ping(&self, ping: AnonymousPing) {
        let since = ping.created_at - Duration::minutes(ADMISSION_WINDOW_MINUTES);

        let recent = match self.store.get_recent_pings(ping.venue_id, since).await {
            Ok(pings) => pings,
            Err(e) => {
                warn!("Dropping ping for venue {}: {}", ping.venue_id, e);
                return;
            }
        };

        if recent.iter().any(|p| p.device_id == ping.device_id) {
            debug!(
                "Duplicate ping dropped for venue {} device {}",
                ping.venue_id, ping.device_id
            );
            return;
        }

        if let Err(e) = self.store.insert_ping(&ping).await {
            warn!("Failed to store ping for venue {}: {}", ping.venue_id, e);
            return;
        }

        self.bus.emit_lossy(PulseEvent::RescoreRequested {
            venue_id: ping.venue_id,
            trigger: RescoreTrigger::Ping,
            timestamp: Utc::now(),
        });
    }

    /// Compute the windowed consensus for a venue.
    ///
    /// **[VPE-AGG-040]** A vibe label wins only when it holds the unique
    /// maximum vote count and at least 30% of all votes. Ties and weak
    /// pluralities yield no consensus.
    pub async fn consensus(
        &self,
        venue_id: uuid::Uuid,
        window_minutes: Option<i64>,
    ) -> Result<CommunityConsensus, EngineError> {
        let window = window_minutes.unwrap_or(DEFAULT_CONSENSUS_WINDOW_MINUTES);
        let since = Utc::now() - Duration::minutes(window);

        let reports = self.store.get_recent_reports(venue_id, since).await?;
        let pings = self.store.get_recent_pings(venue_id, since).await?;
        let social_signal_count = self
            .store
            .get_recent_social_signal_count(venue_id, since)
            .await?;

        let mut vibe_votes: HashMap<VibeLevel, usize> = HashMap::new();
        for report in &reports {
            *vibe_votes.entry(report.vibe_level).or_insert(0) += 1;
        }
        let consensus_vibe = winning_label(&vibe_votes, reports.len());

        let waits: Vec<f64> = reports
            .iter()
            .filter_map(|r| r.wait_minutes)
            .map(f64::from)
            .collect();
        let average_wait_minutes = if waits.is_empty() {
            None
        } else {
            Some(waits.iter().sum::<f64>() / waits.len() as f64)
        };

        let unique_ping_devices = pings
            .iter()
            .map(|p| p.device_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let data_points = reports.len() + pings.len() + social_signal_count;

        Ok(CommunityConsensus {
            venue_id,
            window_minutes: window,
            report_count: reports.len(),
            consensus_vibe,
            vibe_votes,
            average_wait_minutes,
            unique_ping_devices,
            social_signal_count,
            data_points,
        })
    }
}

/// Pick the consensus label: unique max vote count, holding >= 30% of votes.
fn winning_label(votes: &HashMap<VibeLevel, usize>, total: usize) -> Option<VibeLevel> {
    if total == 0 {
        return None;
    }
    let max = votes.values().copied().max()?;
    let mut leaders = votes.iter().filter(|(_, &count)| count == max);
    let (label, count) = leaders.next()?;
    if leaders.next().is_some() {
        // Tied plurality
        return None;
    }
    // Integer form of count/total >= 30% so the boundary is exact
    if count * 100 >= total * CONSENSUS_THRESHOLD_PERCENT {
        Some(*label)
    } else {
        None
    }
}

/// Derive the blend weight and score adjustment from a consensus.
///
/// **[VPE-AGG-050]** Weight grows with evidence volume, capped at 0.4, with
/// a +0.2 boost (cap 0.6) when the winning label carries five or more
/// votes. Fewer than three data points means no influence at all.
pub fn influence(consensus: &CommunityConsensus) -> ConsensusInfluence {
    if consensus.data_points < 3 {
        return ConsensusInfluence::none();
    }

    let mut weight = (consensus.data_points as f64 / 20.0).min(0.4);

    let winning_votes = consensus
        .consensus_vibe
        .and_then(|label| consensus.vibe_votes.get(&label))
        .copied()
        .unwrap_or(0);
    if winning_votes >= 5 {
        weight = (weight + 0.2).min(0.6);
    }

    let mut adjustment: f64 = match consensus.consensus_vibe {
        Some(VibeLevel::Packed) => 2.0,
        Some(VibeLevel::Busy) => 1.0,
        Some(VibeLevel::Chill) => 0.0,
        Some(VibeLevel::Dead) => -2.0,
        None => 0.0,
    };

    if let Some(wait) = consensus.average_wait_minutes {
        if wait >= 30.0 {
            adjustment += 1.0;
        } else if wait >= 15.0 {
            adjustment += 0.5;
        }
    }
    if consensus.unique_ping_devices >= 20 {
        adjustment += 0.5;
    }
    if consensus.social_signal_count >= 5 {
        adjustment += 0.3;
    }

    ConsensusInfluence {
        weight,
        adjustment: adjustment.clamp(-2.0, 2.0),
    }
}
