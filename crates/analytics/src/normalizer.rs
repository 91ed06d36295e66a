use crate::error::AnalyticsError;
use crate::report::{PerformanceRow, PerformanceTable, Quote};
use core_types::{Asset, AssetId, PriceSnapshot, SnapshotSide};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A stateless calculator that re-expresses asset prices against two pivots.
#[derive(Debug, Default)]
pub struct Normalizer {}

/// The four pivot prices every ratio is computed from.
struct PivotPrices {
    a_start: Decimal,
    a_end: Decimal,
    b_start: Decimal,
    b_end: Decimal,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for computing the performance table.
    ///
    /// # Arguments
    ///
    /// * `universe` - The assets to compare, in listing order.
    /// * `start` / `end` - The resolved prices at the two instants.
    /// * `pivot_a` / `pivot_b` - The assets used as alternative numeraires.
    ///   They may be the same asset.
    ///
    /// # Returns
    ///
    /// The table, or `MissingPivotData` / `ZeroPivotPrice` if either pivot
    /// cannot be used. In that case no row at all is produced.
    pub fn normalize(
        &self,
        universe: &[Asset],
        start: &PriceSnapshot,
        end: &PriceSnapshot,
        pivot_a: &AssetId,
        pivot_b: &AssetId,
    ) -> Result<PerformanceTable, AnalyticsError> {
        let pivots = self.pivot_prices(start, end, pivot_a, pivot_b)?;

        let mut rows = Vec::with_capacity(universe.len());
        let mut skipped = Vec::new();

        for asset in universe {
            let (Some(price_start), Some(price_end)) =
                (start.price_of(&asset.id), end.price_of(&asset.id))
            else {
                skipped.push(asset.id.clone());
                continue;
            };

            match self.build_row(asset, price_start, price_end, &pivots) {
                Some(row) => rows.push(row),
                None => {
                    tracing::warn!(asset = %asset.id, "Pivot ratio out of range, skipping asset.");
                    skipped.push(asset.id.clone());
                }
            }
        }

        // Worst performers first. The sort is stable, so ties keep universe order.
        rows.sort_by(|a, b| compare_change(a.native.change_pct, b.native.change_pct));

        tracing::debug!(rows = rows.len(), skipped = skipped.len(), "Normalized snapshots.");

        Ok(PerformanceTable {
            pivot_a: label(universe, pivot_a),
            pivot_b: label(universe, pivot_b),
            rows,
            skipped,
        })
    }

    /// Checks that both pivots are usable at both instants.
    fn pivot_prices(
        &self,
        start: &PriceSnapshot,
        end: &PriceSnapshot,
        pivot_a: &AssetId,
        pivot_b: &AssetId,
    ) -> Result<PivotPrices, AnalyticsError> {
        let lookup = |snapshot: &PriceSnapshot, pivot: &AssetId, side: SnapshotSide| {
            let price = snapshot
                .price_of(pivot)
                .ok_or_else(|| AnalyticsError::MissingPivotData {
                    pivot: pivot.clone(),
                    side,
                })?;
            if price.is_zero() {
                return Err(AnalyticsError::ZeroPivotPrice {
                    pivot: pivot.clone(),
                    side,
                });
            }
            Ok(price)
        };

        Ok(PivotPrices {
            a_start: lookup(start, pivot_a, SnapshotSide::Start)?,
            a_end: lookup(end, pivot_a, SnapshotSide::End)?,
            b_start: lookup(start, pivot_b, SnapshotSide::Start)?,
            b_end: lookup(end, pivot_b, SnapshotSide::End)?,
        })
    }

    /// Computes one row. Each pivot change is derived from its own ratios,
    /// not from the native change. Returns `None` if a ratio overflows.
    fn build_row(
        &self,
        asset: &Asset,
        price_start: Decimal,
        price_end: Decimal,
        pivots: &PivotPrices,
    ) -> Option<PerformanceRow> {
        let pivot_a = Quote::new(
            price_start.checked_div(pivots.a_start)?,
            price_end.checked_div(pivots.a_end)?,
        );
        let pivot_b = Quote::new(
            price_start.checked_div(pivots.b_start)?,
            price_end.checked_div(pivots.b_end)?,
        );

        Some(PerformanceRow {
            asset: asset.id.clone(),
            symbol: asset.symbol.clone(),
            native: Quote::new(price_start, price_end),
            pivot_a,
            pivot_b,
        })
    }
}

/// Orders computed changes ascending, with non-computable ones last.
fn compare_change(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The universe entry for a pivot, or an ad-hoc label if it is not listed.
fn label(universe: &[Asset], pivot: &AssetId) -> Asset {
    universe
        .iter()
        .find(|asset| &asset.id == pivot)
        .cloned()
        .unwrap_or_else(|| Asset::from_id(pivot.clone()))
}
