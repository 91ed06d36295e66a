use crate::PriceResolver;
use chrono::{DateTime, Utc};
use core_types::{AssetId, PriceSnapshot, SkipReason, SnapshotSide};
use futures::stream::{self, StreamExt};

/// One asset that could not be priced at one of the two instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub asset: AssetId,
    pub side: SnapshotSide,
    pub reason: SkipReason,
}

/// The start and end snapshots of a comparison, plus everything that failed.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    pub start: PriceSnapshot,
    pub end: PriceSnapshot,
    pub failures: Vec<ResolutionFailure>,
}

impl SnapshotPair {
    pub fn snapshot(&self, side: SnapshotSide) -> &PriceSnapshot {
        match side {
            SnapshotSide::Start => &self.start,
            SnapshotSide::End => &self.end,
        }
    }

    /// Failures recorded for one asset, in start-then-end order.
    pub fn failures_for<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> impl Iterator<Item = &'a ResolutionFailure> + 'a {
        self.failures.iter().filter(move |f| &f.asset == asset)
    }
}

impl PriceResolver {
    /// Resolves every asset once at `start` and once at `end`.
    ///
    /// Up to `concurrency` assets are in flight at a time; each asset's two
    /// lookups run together. A failed lookup is recorded and never aborts the
    /// pass, so the caller decides which failures are fatal.
    pub async fn resolve_snapshots(
        &self,
        assets: &[AssetId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        concurrency: usize,
    ) -> SnapshotPair {
        let results: Vec<_> = stream::iter(assets)
            .map(|asset| async move {
                let (at_start, at_end) =
                    futures::join!(self.resolve(asset, start), self.resolve(asset, end));
                (asset, at_start, at_end)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut pair = SnapshotPair {
            start: PriceSnapshot::new(start),
            end: PriceSnapshot::new(end),
            failures: Vec::new(),
        };

        for (asset, at_start, at_end) in results {
            for (side, outcome) in [(SnapshotSide::Start, at_start), (SnapshotSide::End, at_end)] {
                match outcome {
                    Ok(point) => match side {
                        SnapshotSide::Start => pair.start.insert(asset.clone(), point),
                        SnapshotSide::End => pair.end.insert(asset.clone(), point),
                    },
                    Err(e) => {
                        tracing::warn!(%asset, %side, error = %e, "Could not resolve price.");
                        pair.failures.push(ResolutionFailure {
                            asset: asset.clone(),
                            side,
                            reason: e.skip_reason(),
                        });
                    }
                }
            }
        }

        tracing::info!(
            assets = assets.len(),
            resolved_start = pair.start.len(),
            resolved_end = pair.end.len(),
            failures = pair.failures.len(),
            "Snapshots resolved."
        );
        pair
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::SeriesClient;
    use crate::{NoCache, PriceResolver};
    use chrono::{DateTime, TimeZone, Utc};
    use core_types::{AssetId, PriceSample, SkipReason, SnapshotSide};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap()
    }

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn series(start_price: rust_decimal::Decimal, end_price: rust_decimal::Decimal) -> Vec<PriceSample> {
        vec![
            PriceSample {
                timestamp: start(),
                price: start_price,
            },
            PriceSample {
                timestamp: end(),
                price: end_price,
            },
        ]
    }

    #[tokio::test]
    async fn resolves_both_instants_and_collects_failures() {
        let client = Arc::new(
            SeriesClient::default()
                .with_series("bitcoin", series(dec!(96000), dec!(94000)))
                .with_series("ethereum", series(dec!(3700), dec!(3350)))
                // Listed only at the start instant.
                .with_series(
                    "delisted",
                    vec![PriceSample {
                        timestamp: start(),
                        price: dec!(1),
                    }],
                )
                .with_failure("flaky"),
        );
        let resolver = PriceResolver::new(client, Arc::new(NoCache), Duration::from_secs(1800));
        let assets: Vec<_> = ["bitcoin", "ethereum", "delisted", "flaky"]
            .into_iter()
            .map(AssetId::new)
            .collect();

        let pair = resolver.resolve_snapshots(&assets, start(), end(), 2).await;

        assert_eq!(pair.start.len(), 3);
        assert_eq!(pair.end.len(), 2);
        assert_eq!(pair.start.price_of(&AssetId::new("bitcoin")), Some(dec!(96000)));
        assert_eq!(pair.snapshot(SnapshotSide::End).price_of(&AssetId::new("ethereum")), Some(dec!(3350)));

        let delisted = AssetId::new("delisted");
        let failures: Vec<_> = pair.failures_for(&delisted).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].side, SnapshotSide::End);
        assert_eq!(failures[0].reason, SkipReason::NoDataInWindow);

        let flaky = AssetId::new("flaky");
        let failures: Vec<_> = pair.failures_for(&flaky).collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].side, SnapshotSide::Start);
        assert!(matches!(failures[1].reason, SkipReason::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let client = Arc::new(SeriesClient::default().with_series("bitcoin", series(dec!(1), dec!(2))));
        let resolver = PriceResolver::new(client.clone(), Arc::new(NoCache), Duration::from_secs(1800));

        let pair = resolver
            .resolve_snapshots(&[AssetId::new("bitcoin")], start(), end(), 0)
            .await;

        assert_eq!(pair.start.len(), 1);
        assert_eq!(pair.end.len(), 1);
        assert_eq!(client.calls(), 2);
    }
}
