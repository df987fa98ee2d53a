//! Data models for pulse-engine
//!
//! - [VPE-SCORE-010]: Score value/confidence/provenance invariants
//! - [VPE-AGG-010]: Community report and consensus types
//! - [VPE-EXT-010]: External busyness sample derivations

pub mod batch;
pub mod busyness;
pub mod consensus;
pub mod metrics;
pub mod report;
pub mod score;
pub mod venue;

pub use batch::{BatchSummary, NotableVenue, VenueFailure, VenueOutcome};
pub use busyness::{BusynessSample, BusynessTrend, ProviderReading, RelativeBusyness};
pub use consensus::{CommunityConsensus, ConsensusInfluence};
pub use metrics::{ActivityTrend, VenueMetrics};
pub use report::{AnonymousPing, CrowdEstimate, VibeLevel, VibeReport};
pub use score::{Score, ScoreSource};
pub use venue::Venue;
