//! Service modules for score computation and fusion
//!
//! **[VPE-COMP-010]** Component implementations

pub mod batch;
pub mod busyness;
pub mod community;
pub mod engine;
pub mod score_calculator;
pub mod ttl_cache;

pub use batch::{BatchCoordinator, DEFAULT_CHUNK_SIZE};
pub use busyness::{BusynessClient, BusynessProvider, HttpBusynessProvider, ProviderError};
pub use community::{influence, CommunityAggregator};
pub use engine::PulseEngine;
pub use ttl_cache::TtlCache;
