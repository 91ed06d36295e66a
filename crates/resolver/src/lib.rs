//! # Price Resolver
//!
//! Turns "what did this asset cost at this instant?" into a single provider
//! call over a short window around the instant, then picks the sample closest
//! to it.
//!
//! ## Public API
//!
//! - `PriceResolver`: resolves one `(asset, instant)` pair, or a whole pair of
//!   snapshots for an asset universe.
//! - `select_closest`: the pure nearest-timestamp selection.
//! - `PriceCache`, `TtlPriceCache`, `NoCache`: the injected memoization layer.
//! - `ResolveError`: distinguishes "no data in window" from "call failed".

pub mod cache;
pub mod error;
pub mod snapshot;

pub use cache::{CacheKey, Lookup, NoCache, PriceCache, TtlPriceCache};
pub use error::ResolveError;
pub use snapshot::{ResolutionFailure, SnapshotPair};

use api_client::ApiClient;
use chrono::{DateTime, TimeDelta, Utc};
use configuration::ResolverConfig;
use core_types::{AssetId, PricePoint, PriceSample};
use std::sync::Arc;
use std::time::Duration;

/// Resolves asset prices at arbitrary instants.
pub struct PriceResolver {
    client: Arc<dyn ApiClient>,
    cache: Arc<dyn PriceCache>,
    tolerance: TimeDelta,
}

impl PriceResolver {
    /// Creates a resolver that queries `[instant - tolerance, instant + tolerance]`.
    pub fn new(client: Arc<dyn ApiClient>, cache: Arc<dyn PriceCache>, tolerance: Duration) -> Self {
        Self {
            client,
            cache,
            tolerance: TimeDelta::from_std(tolerance).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Creates a resolver with the cache described by the configuration.
    /// A TTL of zero disables caching.
    pub fn from_config(client: Arc<dyn ApiClient>, config: &ResolverConfig) -> Self {
        let cache: Arc<dyn PriceCache> = if config.cache_ttl_secs == 0 {
            Arc::new(NoCache)
        } else {
            Arc::new(TtlPriceCache::new(config.cache_ttl()))
        };
        Self::new(client, cache, config.tolerance())
    }

    /// The window queried around `instant`, clamped to the representable range.
    pub fn window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = instant
            .checked_sub_signed(self.tolerance)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = instant
            .checked_add_signed(self.tolerance)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (from, to)
    }

    /// Resolves the price of `asset` at `instant`.
    ///
    /// Returns the price of the sample closest to `instant` inside the window.
    /// `NoDataInWindow` means the provider had nothing there;
    /// `ProviderUnavailable` means the call failed and nothing is known.
    pub async fn resolve(
        &self,
        asset: &AssetId,
        instant: DateTime<Utc>,
    ) -> Result<PricePoint, ResolveError> {
        let key = CacheKey::new(asset.clone(), instant);
        if let Some(lookup) = self.cache.get(&key) {
            tracing::debug!(%asset, %instant, "Price cache hit.");
            return into_result(lookup, asset, instant);
        }

        let (from, to) = self.window(instant);
        let samples = self.client.fetch_price_range(asset, from, to).await?;

        let lookup = match select_closest(&samples, instant) {
            Some(sample) => Lookup::Found(PricePoint {
                instant,
                sampled_at: sample.timestamp,
                price: sample.price,
            }),
            None => Lookup::NotFound,
        };
        tracing::debug!(%asset, %instant, samples = samples.len(), ?lookup, "Resolved price.");

        self.cache.insert(key, lookup);
        into_result(lookup, asset, instant)
    }
}

fn into_result(
    lookup: Lookup,
    asset: &AssetId,
    instant: DateTime<Utc>,
) -> Result<PricePoint, ResolveError> {
    match lookup {
        Lookup::Found(point) => Ok(point),
        Lookup::NotFound => Err(ResolveError::NoDataInWindow {
            asset: asset.clone(),
            instant,
        }),
    }
}

/// Picks the sample whose timestamp is closest to `instant`.
///
/// Samples may arrive in any order. Equidistant samples resolve to the one
/// that comes first. Returns `None` for an empty slice.
pub fn select_closest(samples: &[PriceSample], instant: DateTime<Utc>) -> Option<&PriceSample> {
    samples
        .iter()
        .min_by_key(|sample| (sample.timestamp - instant).num_milliseconds().unsigned_abs())
}

#[cfg(test)]
pub(crate) mod test_support {
    use api_client::ApiClient;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use core_types::{Asset, AssetId, PriceSample};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed per-asset series, honouring the requested window.
    #[derive(Default)]
    pub struct SeriesClient {
        pub series: HashMap<AssetId, Vec<PriceSample>>,
        pub failing: HashSet<AssetId>,
        pub calls: AtomicUsize,
    }

    impl SeriesClient {
        pub fn with_series(mut self, asset: &str, samples: Vec<PriceSample>) -> Self {
            self.series.insert(AssetId::new(asset), samples);
            self
        }

        pub fn with_failure(mut self, asset: &str) -> Self {
            self.failing.insert(AssetId::new(asset));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApiClient for SeriesClient {
        async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<Asset>, ApiError> {
            let mut ids: Vec<_> = self.series.keys().cloned().collect();
            ids.sort();
            Ok(ids.into_iter().take(limit).map(Asset::from_id).collect())
        }

        async fn fetch_price_range(
            &self,
            asset: &AssetId,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> Result<Vec<PriceSample>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(asset) {
                return Err(ApiError::HttpStatus {
                    status: 429,
                    body: "rate limited".to_string(),
                });
            }
            Ok(self
                .series
                .get(asset)
                .map(|samples| {
                    samples
                        .iter()
                        .filter(|s| s.timestamp >= from && s.timestamp <= to)
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }
}
