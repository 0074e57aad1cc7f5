//! Issuer-side holdings as published by the fund.

use rust_decimal::Decimal;

/// One row of a fund's holdings file: issuer ticker + fraction of assets.
///
/// Order matters: collections of holdings keep the issuer's order, which is
/// usually descending by weight.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawHolding {
    pub ticker: String,
    /// Fraction of fund assets, in `[0, 1]`.
    pub weight: Decimal,
}

impl RawHolding {
    pub fn new(ticker: impl Into<String>, weight: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            weight,
        }
    }

    /// Build from a percentage on the 0–100 scale used by issuer files.
    pub fn from_percent(ticker: impl Into<String>, percent: Decimal) -> Self {
        Self::new(ticker, percent / Decimal::ONE_HUNDRED)
    }
}

/// Sum of all weights in `holdings`.
pub fn total_weight(holdings: &[RawHolding]) -> Decimal {
    holdings.iter().map(|h| h.weight).sum()
}
