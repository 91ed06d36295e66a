use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies which of the two snapshots of a comparison a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotSide {
    Start,
    End,
}

impl SnapshotSide {
    /// Both sides, in chronological order.
    pub const BOTH: [SnapshotSide; 2] = [SnapshotSide::Start, SnapshotSide::End];
}

impl fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSide::Start => f.write_str("start"),
            SnapshotSide::End => f.write_str("end"),
        }
    }
}

/// Why an asset could not be priced at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The provider answered, but had no samples inside the tolerance window.
    NoDataInWindow,
    /// The provider could not be reached or answered with an error status.
    ProviderUnavailable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoDataInWindow => f.write_str("no price data in window"),
            SkipReason::ProviderUnavailable(msg) => write!(f, "provider unavailable: {}", msg),
        }
    }
}
