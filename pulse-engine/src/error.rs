//! Error types for the scoring engine
//!
//! **[VPE-ERR-010]** Failure taxonomy: recoverable conditions (rate limits,
//! provider outages) are distinct from store failures so callers can decide
//! what degrades and what propagates.

use thiserror::Error;
use uuid::Uuid;

use crate::services::busyness::ProviderError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// **[VPE-ERR-020]** Venue id does not resolve to a known venue.
    /// This always surfaces to the caller; scoring never invents a venue.
    #[error("Venue not found: {0}")]
    VenueNotFound(Uuid),

    /// **[VPE-ERR-030]** Participant already reported for this venue within
    /// the trailing hour.
    #[error("Rate limited: one vibe report per venue per hour (retry in ~{retry_after_minutes} min)")]
    RateLimited {
        venue_id: Uuid,
        retry_after_minutes: i64,
    },

    /// External busyness provider failure. Callers on the scoring path
    /// degrade instead of surfacing this.
    #[error("Busyness provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Store failure (database unavailable, constraint violation, ...).
    #[error("Store error: {0}")]
    Store(#[from] pulse_common::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// True for conditions the caller can retry or ignore without operator
    /// attention.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::RateLimited { .. } | EngineError::Provider(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_includes_retry_hint() {
        let err = EngineError::RateLimited {
            venue_id: Uuid::new_v4(),
            retry_after_minutes: 42,
        };
        assert!(err.to_string().contains("42 min"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_store_error_is_not_recoverable() {
        let err = EngineError::Store(pulse_common::Error::NotFound("venue".to_string()));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_venue_not_found_display() {
        let id = Uuid::new_v4();
        let err = EngineError::VenueNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
