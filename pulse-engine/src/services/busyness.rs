//! External busyness provider client
//!
//! **[VPE-EXT-010]** Fetches live/usual crowd levels for venues linked to an
//! external place id, normalizes them into a [`BusynessSample`], and caches
//! results so repeated scoring passes do not hammer the provider.
//!
//! All failures degrade: the scoring path receives `None` and falls back to
//! its other signals. Nothing in this module aborts a score computation.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{BusynessSample, ProviderReading};
use crate::services::ttl_cache::TtlCache;

const DEFAULT_BASE_URL: &str = "https://api.busyness.example.com/v1";
const USER_AGENT: &str = "VenuePulse/0.1.0 (https://github.com/venuepulse/venuepulse)";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const REQUESTS_PER_SECOND: u32 = 5;

/// **[VPE-EXT-020]** Cached samples stay valid this long.
const CACHE_TTL_MINUTES: i64 = 5;

/// Errors from the external busyness provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Busyness API key not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Place not found: {0}")]
    PlaceNotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

/// Source of live/usual crowd levels for an external place id.
///
/// The HTTP implementation talks to the real provider; tests substitute
/// their own implementations.
#[async_trait]
pub trait BusynessProvider: Send + Sync {
    /// Fetch raw crowd levels for a place. Both levels are 0-100.
    async fn fetch(&self, place_id: &str) -> std::result::Result<ProviderReading, ProviderError>;

    /// Check if the provider can be queried at all (credentials present).
    fn is_available(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct LiveBusynessResponse {
    status: String,
    analysis: Option<LiveAnalysis>,
}

#[derive(Debug, Deserialize)]
struct LiveAnalysis {
    /// Live crowd level, percent of capacity estimate
    venue_live_busyness: Option<f64>,
    /// Forecast crowd level for this hour of week
    venue_forecasted_busyness: Option<f64>,
}

/// HTTP client for the busyness provider API
///
/// **[VPE-EXT-030]** Rate limited client-side so batch refreshes over many
/// venues stay inside the provider's request quota.
pub struct HttpBusynessProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl HttpBusynessProvider {
    pub fn new(api_key: String) -> std::result::Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {}", e)))?;

        // Safe: REQUESTS_PER_SECOND is a non-zero constant
        let quota = governor::Quota::per_second(NonZeroU32::new(REQUESTS_PER_SECOND).unwrap());

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limiter: governor::RateLimiter::direct(quota),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn clamp_level(raw: f64) -> u8 {
        raw.clamp(0.0, 100.0).round() as u8
    }
}

#[async_trait]
impl BusynessProvider for HttpBusynessProvider {
    async fn fetch(&self, place_id: &str) -> std::result::Result<ProviderReading, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured);
        }

        // Wait for rate limiter before making request
        self.rate_limiter.until_ready().await;

        let url = format!("{}/forecasts/live", self.base_url);
        debug!("Fetching busyness for place {}", place_id);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("place_id", place_id)])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::PlaceNotFound(place_id.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: LiveBusynessResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if payload.status != "OK" {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: format!("provider status: {}", payload.status),
            });
        }

        let analysis = payload
            .analysis
            .ok_or_else(|| ProviderError::Parse("response missing analysis block".to_string()))?;

        Ok(ProviderReading {
            current_level: Self::clamp_level(analysis.venue_live_busyness.unwrap_or(0.0)),
            usual_level: Self::clamp_level(analysis.venue_forecasted_busyness.unwrap_or(0.0)),
        })
    }

    fn is_available(&self) -> bool {
        self.is_configured()
    }
}

/// Caching facade the scoring engine talks to
///
/// **[VPE-EXT-040]** Cache-first lookup with a 5 minute TTL. A fresh entry is
/// returned without touching the provider; a miss triggers one fetch whose
/// result is cached whether the venue is busy or idle.
pub struct BusynessClient {
    provider: Arc<dyn BusynessProvider>,
    cache: TtlCache<String, BusynessSample>,
}

impl BusynessClient {
    pub fn new(provider: Arc<dyn BusynessProvider>) -> Self {
        Self {
            provider,
            cache: TtlCache::new(Duration::minutes(CACHE_TTL_MINUTES)),
        }
    }

    /// Get the current busyness sample for a place, or `None` when the
    /// provider is unconfigured, unreachable, or returns garbage.
    ///
    /// **[VPE-EXT-050]** Provider failures are logged and swallowed here.
    pub async fn get_busyness(&self, place_id: &str) -> Option<BusynessSample> {
        if let Some(sample) = self.cache.get(&place_id.to_string()).await {
            debug!("Busyness cache hit for place {}", place_id);
            return Some(sample);
        }

        if !self.provider.is_available() {
            debug!("Busyness provider not configured, skipping fetch");
            return None;
        }

        match self.provider.fetch(place_id).await {
            Ok(reading) => {
                let fetched_at = Utc::now();
                let sample = BusynessSample::from_reading(reading, fetched_at);
                self.cache
                    .put(place_id.to_string(), sample.clone(), fetched_at)
                    .await;
                Some(sample)
            }
            Err(ProviderError::NotConfigured) => {
                debug!("Busyness provider not configured, skipping fetch");
                None
            }
            Err(e) => {
                warn!("Busyness fetch failed for place {}: {}", place_id, e);
                None
            }
        }
    }

    /// Number of cached samples (fresh and stale), for diagnostics.
    pub async fn cached_samples(&self) -> usize {
        self.cache.len().await
    }
}
