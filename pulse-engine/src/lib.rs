//! pulse-engine library interface
//!
//! Exposes the scoring engine, batch coordinator, and community aggregator
//! for the daemon binary and for integration testing.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use crate::error::{EngineError, Result};
pub use crate::store::VenueStore;

use std::sync::Arc;

use pulse_common::events::EventBus;

use crate::services::busyness::{BusynessClient, BusynessProvider};
use crate::services::{BatchCoordinator, CommunityAggregator, PulseEngine};

/// Assembled engine components sharing one store and one event bus
pub struct PulseApp {
    pub engine: Arc<PulseEngine>,
    pub coordinator: Arc<BatchCoordinator>,
    pub community: Arc<CommunityAggregator>,
    pub bus: EventBus,
}

impl PulseApp {
    pub fn new(
        store: Arc<dyn VenueStore>,
        provider: Arc<dyn BusynessProvider>,
        bus: EventBus,
        chunk_size: usize,
    ) -> Self {
        let busyness = Arc::new(BusynessClient::new(provider));
        let community = Arc::new(CommunityAggregator::new(store.clone(), bus.clone()));
        let engine = Arc::new(PulseEngine::new(
            store.clone(),
            busyness,
            community.clone(),
            bus.clone(),
        ));
        let coordinator = Arc::new(BatchCoordinator::new(
            engine.clone(),
            store,
            bus.clone(),
            chunk_size,
        ));

        Self {
            engine,
            coordinator,
            community,
            bus,
        }
    }
}
