use serde::Deserialize;

/// A single entry of `GET /coins/markets`.
/// There are many more fields, but the listing only needs these.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketEntry {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}

/// The response of `GET /coins/{id}/market_chart/range`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChartResponse {
    /// A missing `prices` key means no data, same as an empty list.
    #[serde(default)]
    pub prices: Vec<RawSample>,
}

/// A `[timestamp_ms, price]` pair. The price is occasionally `null`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawSample(pub f64, pub Option<f64>);
