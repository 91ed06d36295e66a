use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use configuration::ProviderConfig;
use core_types::{Asset, AssetId, PriceSample};
use reqwest::Url;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::de::DeserializeOwned;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{MarketChartResponse, MarketEntry, RawSample};

/// The generic, abstract interface for a historical price data provider.
/// This trait is the contract the resolver and the comparison engine use,
/// allowing the underlying implementation (live or in-memory) to be swapped out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetches the `limit` highest-ranked assets, best first.
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<Asset>, ApiError>;

    /// Fetches every price sample of `asset` between `from` and `to`.
    /// The samples are returned in provider order, which is not guaranteed sorted.
    async fn fetch_price_range(
        &self,
        asset: &AssetId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, ApiError>;
}

/// A concrete implementation of the `ApiClient` for the public CoinGecko v3 API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: Url,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::InvalidData(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("numeraire/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            vs_currency: config.vs_currency.clone(),
        })
    }

    /// Appends path segments to the base URL. Each segment is percent-encoded,
    /// so an ad-hoc asset id can never escape its segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidData(format!("Base URL '{}' cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}

#[async_trait]
impl ApiClient for CoinGeckoClient {
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<Asset>, ApiError> {
        let url = self.endpoint(&["coins", "markets"])?;
        let entries: Vec<MarketEntry> = self
            .get_json(
                url,
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("order", "market_cap_desc".to_string()),
                    ("per_page", limit.to_string()),
                    ("page", "1".to_string()),
                ],
            )
            .await?;

        tracing::debug!(count = entries.len(), "Fetched ranked asset listing.");
        Ok(assets_from_markets(entries))
    }

    async fn fetch_price_range(
        &self,
        asset: &AssetId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, ApiError> {
        let url = self.endpoint(&["coins", asset.as_str(), "market_chart", "range"])?;
        let chart: MarketChartResponse = self
            .get_json(
                url,
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("from", from.timestamp().to_string()),
                    ("to", to.timestamp().to_string()),
                ],
            )
            .await?;

        samples_from_chart(chart)
    }
}

/// Converts a markets listing into universe assets, keeping the rank order.
pub fn assets_from_markets(entries: Vec<MarketEntry>) -> Vec<Asset> {
    entries
        .into_iter()
        .map(|entry| Asset::new(AssetId::new(entry.id), entry.symbol.to_uppercase()))
        .collect()
}

/// Converts the raw `[ms, price]` pairs into typed samples.
///
/// Entries whose price is `null` or not representable as a `Decimal` are
/// dropped; an unrepresentable timestamp is an error.
pub fn samples_from_chart(chart: MarketChartResponse) -> Result<Vec<PriceSample>, ApiError> {
    let mut samples = Vec::with_capacity(chart.prices.len());

    for RawSample(millis, price) in chart.prices {
        let timestamp = Utc
            .timestamp_millis_opt(millis.round() as i64)
            .single()
            .ok_or_else(|| ApiError::InvalidData(format!("Invalid sample timestamp: {}", millis)))?;

        let Some(price) = price.and_then(Decimal::from_f64) else {
            tracing::debug!(%timestamp, "Dropping sample without a usable price.");
            continue;
        };

        samples.push(PriceSample { timestamp, price });
    }

    Ok(samples)
}
