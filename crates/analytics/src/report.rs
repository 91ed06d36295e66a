use core_types::{Asset, AssetId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The unit a quote is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Numeraire {
    /// The provider's reference currency (e.g. USD).
    Native,
    PivotA,
    PivotB,
}

/// The start and end value of an asset in one numeraire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub start: Decimal,
    pub end: Decimal,
    /// Percentage change from `start` to `end`.
    /// `None` when `start` is zero (or the result does not fit a `Decimal`).
    pub change_pct: Option<Decimal>,
}

impl Quote {
    pub fn new(start: Decimal, end: Decimal) -> Self {
        Self {
            start,
            end,
            change_pct: percent_change(start, end),
        }
    }

    fn rounded(&self, price_dp: u32, change_dp: u32) -> Self {
        Self {
            start: self.start.round_dp(price_dp),
            end: self.end.round_dp(price_dp),
            change_pct: self.change_pct.map(|c| c.round_dp(change_dp)),
        }
    }
}

/// `(end - start) / start * 100`, or `None` if undefined.
pub fn percent_change(start: Decimal, end: Decimal) -> Option<Decimal> {
    end.checked_sub(start)?
        .checked_div(start)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// One asset's performance across all three numeraires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub asset: AssetId,
    pub symbol: String,
    pub native: Quote,
    pub pivot_a: Quote,
    pub pivot_b: Quote,
}

impl PerformanceRow {
    pub fn quote(&self, numeraire: Numeraire) -> &Quote {
        match numeraire {
            Numeraire::Native => &self.native,
            Numeraire::PivotA => &self.pivot_a,
            Numeraire::PivotB => &self.pivot_b,
        }
    }

    /// A copy of this row rounded for presentation.
    pub fn rounded(&self, policy: &RoundingPolicy) -> Self {
        Self {
            asset: self.asset.clone(),
            symbol: self.symbol.clone(),
            native: self.native.rounded(policy.native_price_dp, policy.change_pct_dp),
            pivot_a: self.pivot_a.rounded(policy.pivot_price_dp, policy.change_pct_dp),
            pivot_b: self.pivot_b.rounded(policy.pivot_price_dp, policy.change_pct_dp),
        }
    }
}

/// Decimal places used when rows are prepared for display.
/// Rounding is banker's rounding (midpoint to even).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub native_price_dp: u32,
    pub pivot_price_dp: u32,
    pub change_pct_dp: u32,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            native_price_dp: 4,
            pivot_price_dp: 8,
            change_pct_dp: 2,
        }
    }
}

/// The output of the `Normalizer`.
///
/// `rows` hold full-precision values, ordered from the worst to the best
/// native performer. `skipped` lists the universe assets that lacked a price
/// in either snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceTable {
    pub pivot_a: Asset,
    pub pivot_b: Asset,
    pub rows: Vec<PerformanceRow>,
    pub skipped: Vec<AssetId>,
}

impl PerformanceTable {
    /// All rows rounded with `policy`, in table order.
    pub fn rounded_rows(&self, policy: &RoundingPolicy) -> Vec<PerformanceRow> {
        self.rows.iter().map(|row| row.rounded(policy)).collect()
    }

    pub fn row(&self, asset: &AssetId) -> Option<&PerformanceRow> {
        self.rows.iter().find(|row| &row.asset == asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percent_change_of_zero_start_is_none() {
        assert_eq!(percent_change(dec!(0), dec!(5)), None);
        assert_eq!(percent_change(dec!(4), dec!(5)), Some(dec!(25)));
        assert_eq!(percent_change(dec!(5), dec!(4)), Some(dec!(-20)));
    }

    #[test]
    fn rounding_uses_bankers_rounding() {
        let quote = Quote {
            start: dec!(1.00005),
            end: dec!(1.00015),
            change_pct: Some(dec!(0.125)),
        };
        let rounded = quote.rounded(4, 2);
        assert_eq!(rounded.start, dec!(1.0000));
        assert_eq!(rounded.end, dec!(1.0002));
        assert_eq!(rounded.change_pct, Some(dec!(0.12)));
    }

    #[test]
    fn row_rounding_applies_policy_per_numeraire() {
        let row = PerformanceRow {
            asset: AssetId::new("solana"),
            symbol: "SOL".to_string(),
            native: Quote::new(dec!(234.567891), dec!(190.123456)),
            pivot_a: Quote::new(dec!(0.00243512345), dec!(0.00201198765)),
            pivot_b: Quote::new(dec!(0.06337777777), dec!(0.05675555555)),
        };
        let rounded = row.rounded(&RoundingPolicy::default());

        assert_eq!(rounded.native.start, dec!(234.5679));
        assert_eq!(rounded.native.end, dec!(190.1235));
        assert_eq!(rounded.pivot_a.start, dec!(0.00243512));
        assert_eq!(rounded.pivot_b.end, dec!(0.05675556));
        assert_eq!(rounded.native.change_pct, Some(dec!(-18.95)));
        assert_eq!(rounded.quote(Numeraire::PivotA), &rounded.pivot_a);
    }
}
