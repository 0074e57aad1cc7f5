//! Coverage diagnostics produced alongside an allocation.

use std::fmt;

use rust_decimal::Decimal;

use crate::holding::{RawHolding, total_weight};

/// What the normalizer kept, dropped and adjusted.
///
/// Coverage figures are fractions of fund assets (the raw weights), so a
/// fully matched fund reports a coverage close to 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CoverageReport {
    /// Sum of every input weight.
    pub original_total: Decimal,
    /// Sum of matched, de-duplicated weights before the cap.
    pub matched_total: Decimal,
    /// Holdings with no tradable instrument.
    pub omitted: Vec<RawHolding>,
    /// Repeats of a ticker that had already matched.
    pub duplicates: Vec<RawHolding>,
    /// Matched holdings cut by the holdings cap.
    pub capped: Vec<RawHolding>,
    pub max_holdings: usize,
    /// Sum of the weights that made it into the allocation.
    pub kept_total: Decimal,
    /// Sum after rounding, before drift correction.
    pub rounded_sum: Decimal,
    /// Correction applied to a single entry so the total is exactly one.
    pub shift: Decimal,
    /// Tradable id that absorbed `shift`, if it was non-zero.
    pub shift_target: Option<String>,
}

impl CoverageReport {
    pub fn omitted_weight(&self) -> Decimal {
        total_weight(&self.omitted)
    }

    pub fn duplicate_weight(&self) -> Decimal {
        total_weight(&self.duplicates)
    }

    pub fn capped_weight(&self) -> Decimal {
        total_weight(&self.capped)
    }

    /// True if any holding was dropped for any reason.
    pub fn has_losses(&self) -> bool {
        !(self.omitted.is_empty() && self.duplicates.is_empty() && self.capped.is_empty())
    }
}

fn pct(fraction: Decimal) -> Decimal {
    (fraction * Decimal::ONE_HUNDRED).round_dp(2)
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "COVERAGE:")?;
        writeln!(
            f,
            "  Matched {}% of original holdings ({}% listed)",
            pct(self.matched_total),
            pct(self.original_total)
        )?;
        if !self.omitted.is_empty() {
            writeln!(
                f,
                "  Missing {} holdings ({}%):",
                self.omitted.len(),
                pct(self.omitted_weight())
            )?;
            for h in &self.omitted {
                let ticker = if h.ticker.is_empty() { "-" } else { &h.ticker };
                writeln!(f, "    {:10} {:>7}%", ticker, pct(h.weight))?;
            }
        }
        if !self.duplicates.is_empty() {
            writeln!(
                f,
                "  Ignored {} duplicate rows ({}%)",
                self.duplicates.len(),
                pct(self.duplicate_weight())
            )?;
        }
        if !self.capped.is_empty() {
            writeln!(
                f,
                "  Cut {} holdings beyond the cap of {} ({}%)",
                self.capped.len(),
                self.max_holdings,
                pct(self.capped_weight())
            )?;
        }
        writeln!(f, "  Now covering {}% of original holdings", pct(self.kept_total))?;
        match &self.shift_target {
            Some(id) => writeln!(
                f,
                "  Rounded sum {} corrected by {:+} on {}",
                self.rounded_sum, self.shift, id
            ),
            None => writeln!(f, "  Rounded sum {} needs no correction", self.rounded_sum),
        }
    }
}
