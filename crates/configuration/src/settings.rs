use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// The CoinGecko markets endpoint caps `per_page` at this value.
pub const MAX_TOP_N: usize = 250;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub resolver: ResolverConfig,
    pub universe: UniverseConfig,
}

/// Connection parameters for the external price provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the CoinGecko v3 API.
    pub base_url: String,
    /// The reference currency every price is quoted in (e.g. "usd").
    pub vs_currency: String,
    /// Upper bound for a single HTTP call. A timed out call is not retried.
    pub request_timeout_secs: u64,
}

/// Parameters for nearest-timestamp price resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Half-width of the window queried around each instant.
    pub tolerance_secs: u64,
    /// Freshness window for memoized lookups. `0` disables the cache.
    pub cache_ttl_secs: u64,
    /// How many assets are resolved concurrently.
    pub max_concurrent_requests: usize,
}

/// Defines which assets are compared and which serve as pivots.
#[derive(Debug, Clone, Deserialize)]
pub struct UniverseConfig {
    /// Size of the ranked listing the universe starts from.
    pub top_n: usize,
    /// Ad-hoc asset appended to the universe when the caller names none.
    pub default_target: Option<String>,
    /// Exactly two pivot ids. When omitted, the two top-ranked assets are used.
    pub pivots: Option<Vec<String>>,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ResolverConfig {
    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl UniverseConfig {
    /// The configured pivot pair, if any.
    pub fn pivot_pair(&self) -> Option<(&str, &str)> {
        match self.pivots.as_deref() {
            Some([a, b]) => Some((a.as_str(), b.as_str())),
            _ => None,
        }
    }
}

impl Config {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        if self.provider.vs_currency.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.vs_currency must not be empty".to_string(),
            ));
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.resolver.tolerance_secs == 0 {
            return Err(ConfigError::ValidationError(
                "resolver.tolerance_secs must be greater than 0".to_string(),
            ));
        }
        if self.resolver.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationError(
                "resolver.max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        if self.universe.top_n == 0 || self.universe.top_n > MAX_TOP_N {
            return Err(ConfigError::ValidationError(format!(
                "universe.top_n must be between 1 and {}, got {}",
                MAX_TOP_N, self.universe.top_n
            )));
        }
        match &self.universe.pivots {
            Some(pivots) => {
                if pivots.len() != 2 {
                    return Err(ConfigError::ValidationError(format!(
                        "universe.pivots must name exactly two assets, got {}",
                        pivots.len()
                    )));
                }
                if pivots.iter().any(|p| p.trim().is_empty()) {
                    return Err(ConfigError::ValidationError(
                        "universe.pivots must not contain empty ids".to_string(),
                    ));
                }
            }
            None if self.universe.top_n < 2 => {
                return Err(ConfigError::ValidationError(
                    "universe.top_n must be at least 2 when universe.pivots is not set".to_string(),
                ));
            }
            None => {}
        }
        Ok(())
    }
}
