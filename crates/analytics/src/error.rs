use core_types::{AssetId, SnapshotSide};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Nothing can be denominated in a pivot that has no price.
    #[error("Pivot '{pivot}' has no price in the {side} snapshot")]
    MissingPivotData { pivot: AssetId, side: SnapshotSide },

    #[error("Pivot '{pivot}' has a zero price in the {side} snapshot")]
    ZeroPivotPrice { pivot: AssetId, side: SnapshotSide },
}
