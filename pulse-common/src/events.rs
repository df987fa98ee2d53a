//! Event types for the VenuePulse event system
//!
//! Provides shared event definitions and the EventBus used to decouple
//! submission handling from score refresh. Events are broadcast in-process;
//! delivery is best-effort and lossy by design (a dropped rescore request is
//! recovered by the next periodic batch pass).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Provenance of a persisted score.
///
/// Shared vocabulary between the engine's `Score` model, the event payloads,
/// and the store's TEXT columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreSource {
    /// First-party activity telemetry (check-ins, wait logs, ratings)
    RichTelemetry,
    /// Community reports/pings were the dominant evidence
    Community,
    /// Third-party busyness estimate
    External,
    /// Neutral baseline with little or no supporting data
    Estimated,
}

impl ScoreSource {
    /// Stable string form used in database columns and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreSource::RichTelemetry => "RICH_TELEMETRY",
            ScoreSource::Community => "COMMUNITY",
            ScoreSource::External => "EXTERNAL",
            ScoreSource::Estimated => "ESTIMATED",
        }
    }

    /// Parse the stable string form; `None` for unknown input
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RICH_TELEMETRY" => Some(ScoreSource::RichTelemetry),
            "COMMUNITY" => Some(ScoreSource::Community),
            "EXTERNAL" => Some(ScoreSource::External),
            "ESTIMATED" => Some(ScoreSource::Estimated),
            _ => None,
        }
    }
}

/// What kind of community submission asked for a venue re-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescoreTrigger {
    /// A structured vibe report was accepted
    VibeReport,
    /// An anonymous presence ping was accepted
    Ping,
}

/// VenuePulse event types
///
/// Events are broadcast via [`EventBus`] and can be serialized for audit
/// logging. All events carry their emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PulseEvent {
    /// A venue's score was recomputed and persisted
    ///
    /// Triggers:
    /// - Listing caches: refresh the venue card
    /// - Notification rules: evaluate "venue is popping off" alerts
    ScoreUpdated {
        /// Venue that was re-scored
        venue_id: Uuid,
        /// Final fused score (0.0-10.0, one decimal)
        value: f64,
        /// Confidence in the score (0.1-1.0)
        confidence: f64,
        /// Provenance of the score
        source: ScoreSource,
        /// When the score was computed
        timestamp: DateTime<Utc>,
    },

    /// A community submission was accepted and the venue should be re-scored
    ///
    /// Fire-and-forget: the submission path does not wait for the refresh.
    /// Consumed by the refresh loop in the engine daemon.
    RescoreRequested {
        /// Venue to refresh
        venue_id: Uuid,
        /// Submission kind that triggered the request
        trigger: RescoreTrigger,
        /// When the submission was accepted
        timestamp: DateTime<Utc>,
    },

    /// A batch refresh pass started
    BatchStarted {
        /// Number of venues scheduled for refresh
        total_venues: usize,
        /// When the pass started
        timestamp: DateTime<Utc>,
    },

    /// A batch refresh pass finished
    ///
    /// Triggers:
    /// - Operational dashboards: track failure counts per pass
    BatchCompleted {
        /// Venues attempted
        total: usize,
        /// Venues updated successfully
        updated: usize,
        /// Venues that failed (isolated, see the summary for reasons)
        failed: usize,
        /// Wall-clock duration of the pass in milliseconds
        duration_ms: u64,
        /// When the pass finished
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast event bus shared by the engine services
///
/// Thin wrapper over `tokio::sync::broadcast`. Subscribers that fall behind
/// lose the oldest events rather than blocking emitters.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PulseEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events buffered before old events are dropped
    ///   for lagging subscribers. 100 is plenty for a single engine process;
    ///   tests typically use 10.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PulseEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` when nobody is listening. Use [`EventBus::emit_lossy`] for
    /// events where that is acceptable.
    pub fn emit(
        &self,
        event: PulseEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<PulseEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anybody is listening
    ///
    /// Used for all fire-and-forget notifications (rescore requests, score
    /// updates): the periodic batch pass recovers anything a missing
    /// subscriber would have handled.
    pub fn emit_lossy(&self, event: PulseEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
