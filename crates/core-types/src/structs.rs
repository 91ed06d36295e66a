use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An opaque identifier for a tradable asset, e.g. `"bitcoin"` or `"solana"`.
///
/// The identifier is whatever the price provider uses to address a coin; it is
/// compared verbatim and never reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wraps an identifier without validation. Use `parse` for user input.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses user-supplied input, trimming surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput(
                "asset id".to_string(),
                "identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An asset of the comparison universe together with its display symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Upper-cased ticker shown to the user (e.g. "BTC").
    pub symbol: String,
}

impl Asset {
    pub fn new(id: AssetId, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
        }
    }

    /// An ad-hoc asset whose symbol is not known from a listing.
    /// The upper-cased identifier stands in for the symbol.
    pub fn from_id(id: AssetId) -> Self {
        let symbol = id.as_str().to_uppercase();
        Self { id, symbol }
    }
}

/// A single raw `(timestamp, price)` entry of a provider's time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// A resolved price for an asset at a requested instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// The instant the price was requested for.
    pub instant: DateTime<Utc>,
    /// The timestamp of the sample that was selected.
    pub sampled_at: DateTime<Utc>,
    /// Price in the provider's reference currency.
    pub price: Decimal,
}

/// The resolved prices of a set of assets at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub instant: DateTime<Utc>,
    prices: HashMap<AssetId, PricePoint>,
}

impl PriceSnapshot {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            prices: HashMap::new(),
        }
    }

    pub fn insert(&mut self, asset: AssetId, point: PricePoint) {
        self.prices.insert(asset, point);
    }

    pub fn get(&self, asset: &AssetId) -> Option<&PricePoint> {
        self.prices.get(asset)
    }

    /// Shorthand for the price of an asset, if it was resolved.
    pub fn price_of(&self, asset: &AssetId) -> Option<Decimal> {
        self.prices.get(asset).map(|p| p.price)
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.prices.contains_key(asset)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &PricePoint)> {
        self.prices.iter()
    }
}
