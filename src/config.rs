//! Process-start configuration for the collection engine.
//!
//! Everything here is fixed for the lifetime of the process; nothing is
//! mutable at runtime. Defaults mirror the free-tier limits of the
//! OpenWeather current-weather API: 60 calls per rolling minute, collected in
//! batches of 60 with a one-minute pause between batches.

use bon::Builder;
use std::time::Duration;
use thiserror::Error;

/// Default endpoint for current-weather lookups.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Environment variable holding the remote API credential.
pub const API_KEY_ENV: &str = "OPEN_WEATHER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPEN_WEATHER_API_KEY environment variable is not set")]
    MissingApiKey,
}

/// Tunables for one collecting process.
///
/// ```
/// use skyharvest::CollectorConfig;
/// use std::time::Duration;
///
/// let config = CollectorConfig::builder()
///     .api_key("secret")
///     .batch_size(10)
///     .inter_batch_delay(Duration::from_secs(30))
///     .build();
/// assert_eq!(config.rate_limit_calls, 60);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct CollectorConfig {
    /// Credential passed to the remote weather service on every call.
    #[builder(into)]
    pub api_key: String,

    /// Base URL of the current-weather endpoint.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,

    /// Maximum outbound calls per rolling window, shared process-wide.
    #[builder(default = 60)]
    pub rate_limit_calls: usize,

    /// Length of the rolling rate-limit window.
    #[builder(default = Duration::from_secs(60))]
    pub rate_limit_window: Duration,

    /// Cities fetched concurrently per batch. Values below 1 are treated as 1.
    #[builder(default = 60)]
    pub batch_size: usize,

    /// Coarse pause between consecutive batches of one job, independent of
    /// the rate limiter.
    #[builder(default = Duration::from_secs(60))]
    pub inter_batch_delay: Duration,

    /// Upper bound on a single remote lookup; expiry counts as a transport
    /// failure for that city.
    #[builder(default = Duration::from_secs(10))]
    pub fetch_timeout: Duration,
}

impl CollectorConfig {
    /// Builds a default configuration with the credential taken from
    /// `OPEN_WEATHER_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingApiKey)?;
        Ok(Self::builder().api_key(api_key).build())
    }
}
