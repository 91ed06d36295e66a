use crate::error::EngineError;
use analytics::{Normalizer, PerformanceTable};
use api_client::ApiClient;
use chrono::{DateTime, Utc};
use configuration::Config;
use core_types::{Asset, AssetId, PricePoint};
use resolver::{PriceResolver, ResolutionFailure};
use std::sync::Arc;

pub mod error;

/// The knobs of a comparison run that do not belong to the resolver.
#[derive(Debug, Clone)]
pub struct ComparisonSettings {
    /// Size of the ranked listing the universe starts from.
    pub top_n: usize,
    /// Explicit pivots. `None` picks the two top-ranked listed assets.
    pub pivots: Option<(AssetId, AssetId)>,
    pub max_concurrent_requests: usize,
    /// Reference currency of every native price, for labelling.
    pub vs_currency: String,
}

impl ComparisonSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_n: config.universe.top_n,
            pivots: config
                .universe
                .pivot_pair()
                .map(|(a, b)| (AssetId::new(a.trim()), AssetId::new(b.trim()))),
            max_concurrent_requests: config.resolver.max_concurrent_requests,
            vs_currency: config.provider.vs_currency.clone(),
        }
    }
}

/// What the caller wants compared.
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    /// Ad-hoc asset added to the ranked listing.
    pub target: Option<AssetId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The assets of one run and the two pivots they are denominated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub assets: Vec<Asset>,
    pub pivot_a: AssetId,
    pub pivot_b: AssetId,
}

/// An asset left out of the table, with every lookup that failed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedAsset {
    pub asset: Asset,
    pub failures: Vec<ResolutionFailure>,
}

/// The result of a successful run.
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub vs_currency: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub table: PerformanceTable,
    pub excluded: Vec<ExcludedAsset>,
}

/// The central orchestrator: listing, resolution, then normalization.
pub struct ComparisonEngine {
    client: Arc<dyn ApiClient>,
    resolver: PriceResolver,
    normalizer: Normalizer,
    settings: ComparisonSettings,
}

impl ComparisonEngine {
    pub fn new(
        client: Arc<dyn ApiClient>,
        resolver: PriceResolver,
        settings: ComparisonSettings,
    ) -> Self {
        Self {
            client,
            resolver,
            normalizer: Normalizer::new(),
            settings,
        }
    }

    /// Wires an engine and its resolver from the application configuration.
    pub fn from_config(client: Arc<dyn ApiClient>, config: &Config) -> Self {
        let resolver = PriceResolver::from_config(client.clone(), &config.resolver);
        Self::new(client, resolver, ComparisonSettings::from_config(config))
    }

    pub fn settings(&self) -> &ComparisonSettings {
        &self.settings
    }

    /// Fetches the ranked listing the universe is built from.
    pub async fn top_assets(&self) -> Result<Vec<Asset>, EngineError> {
        self.client
            .fetch_top_assets(self.settings.top_n)
            .await
            .map_err(EngineError::Universe)
    }

    /// Resolves a single price, outside of any comparison.
    pub async fn resolve_price(
        &self,
        asset: &AssetId,
        instant: DateTime<Utc>,
    ) -> Result<PricePoint, EngineError> {
        Ok(self.resolver.resolve(asset, instant).await?)
    }

    /// Runs a full comparison.
    ///
    /// A failed listing or an unusable pivot aborts the run with no partial
    /// result. Any other asset that cannot be priced is reported in
    /// `excluded` and the run goes on without it.
    pub async fn run(&self, request: &ComparisonRequest) -> Result<ComparisonOutcome, EngineError> {
        tracing::info!(
            start = %request.start,
            end = %request.end,
            target_asset = ?request.target,
            top_n = self.settings.top_n,
            "Starting comparison."
        );

        // 1. Universe
        let listing = self.top_assets().await?;
        let universe = build_universe(listing, request.target.clone(), self.settings.pivots.clone())?;
        tracing::info!(
            assets = universe.assets.len(),
            pivot_a = %universe.pivot_a,
            pivot_b = %universe.pivot_b,
            "Universe ready."
        );

        // 2. One resolution per (asset, instant)
        let ids: Vec<AssetId> = universe.assets.iter().map(|a| a.id.clone()).collect();
        let pair = self
            .resolver
            .resolve_snapshots(
                &ids,
                request.start,
                request.end,
                self.settings.max_concurrent_requests,
            )
            .await;

        // 3. Normalize; a pivot failure is fatal for the whole run.
        let table = self
            .normalizer
            .normalize(
                &universe.assets,
                &pair.start,
                &pair.end,
                &universe.pivot_a,
                &universe.pivot_b,
            )
            .inspect_err(|e| {
                tracing::error!(error = %e, "Cannot denominate the table without both pivots.");
            })?;

        let excluded = table
            .skipped
            .iter()
            .map(|id| ExcludedAsset {
                asset: universe
                    .assets
                    .iter()
                    .find(|a| &a.id == id)
                    .cloned()
                    .unwrap_or_else(|| Asset::from_id(id.clone())),
                failures: pair.failures_for(id).cloned().collect(),
            })
            .collect::<Vec<_>>();

        tracing::info!(
            rows = table.rows.len(),
            excluded = excluded.len(),
            "Comparison complete."
        );

        Ok(ComparisonOutcome {
            vs_currency: self.settings.vs_currency.clone(),
            start: request.start,
            end: request.end,
            table,
            excluded,
        })
    }
}

/// Builds the universe from the ranked listing.
///
/// The listing keeps its rank order. The target is appended unless already
/// listed. Without explicit pivots the two top-ranked assets are used.
/// Pivots missing from the listing are appended so they are always resolved.
pub fn build_universe(
    listing: Vec<Asset>,
    target: Option<AssetId>,
    pivots: Option<(AssetId, AssetId)>,
) -> Result<Universe, EngineError> {
    let (pivot_a, pivot_b) = match pivots {
        Some(pivots) => pivots,
        None => match listing.as_slice() {
            [first, second, ..] => (first.id.clone(), second.id.clone()),
            _ => return Err(EngineError::NotEnoughAssets(listing.len())),
        },
    };

    let mut assets = listing;
    for id in target.into_iter().chain([pivot_a.clone(), pivot_b.clone()]) {
        if !assets.iter().any(|a| a.id == id) {
            assets.push(Asset::from_id(id));
        }
    }

    Ok(Universe {
        assets,
        pivot_a,
        pivot_b,
    })
}
