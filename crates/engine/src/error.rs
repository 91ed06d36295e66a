use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to fetch the asset listing: {0}")]
    Universe(#[source] api_client::error::ApiError),

    #[error("The listing returned {0} assets; two are needed to pick default pivots")]
    NotEnoughAssets(usize),

    #[error("Price resolution failed: {0}")]
    Resolve(#[from] resolver::ResolveError),

    #[error("Normalization failed: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
}
