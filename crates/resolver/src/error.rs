use api_client::error::ApiError;
use chrono::{DateTime, Utc};
use core_types::{AssetId, SkipReason};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// The provider answered, but no sample fell inside the tolerance window.
    #[error("No price data for '{asset}' within the window around {instant}")]
    NoDataInWindow {
        asset: AssetId,
        instant: DateTime<Utc>,
    },

    /// The call itself failed: transport error, timeout, or an error status.
    #[error("Price provider unavailable: {0}")]
    ProviderUnavailable(#[from] ApiError),
}

impl ResolveError {
    /// The reason reported for an asset excluded because of this error.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            ResolveError::NoDataInWindow { .. } => SkipReason::NoDataInWindow,
            ResolveError::ProviderUnavailable(e) => SkipReason::ProviderUnavailable(e.to_string()),
        }
    }
}
