//! Allocation normalizer: raw fund holdings → exact-sum pie weights.
//!
//! The pipeline is
//!
//! 1. **match** holdings against the tradable universe by base symbol,
//! 2. **cap** the matched list to the first `max_holdings` entries,
//! 3. **renormalize** so the kept weights sum to one,
//! 4. **round** each weight to `precision` decimal places,
//! 5. **correct drift** left by rounding on a single entry,
//! 6. **map** tickers back to tradable ids.
//!
//! Weights are [`Decimal`], so the final "sums to one" check is exact.
//! Steps 1 and 2 lose coverage but never fail; steps 3 to 6 fail hard.

use log::{debug, info, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use rustc_hash::FxHashSet;

use crate::allocation::Allocation;
use crate::error::NormalizeError;
use crate::holding::{RawHolding, total_weight};
use crate::report::CoverageReport;
use crate::universe::InstrumentUniverse;

/// Largest supported number of decimal places.
pub const MAX_PRECISION: u32 = 10;

/// Rule used when a weight lies exactly halfway between two representable
/// values at the target precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RoundingMode {
    /// 0.0625 → 0.063 at three places.
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding: 0.0625 → 0.062 at three places.
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }

    /// Round `value` to `dp` decimal places under this rule.
    pub fn round(self, value: Decimal, dp: u32) -> Decimal {
        value.round_dp_with_strategy(dp, self.strategy())
    }
}

/// Normalizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NormalizeConfig {
    /// Decimal places kept in each final weight.
    pub precision: u32,
    /// Maximum number of distinct instruments in the allocation.
    pub max_holdings: usize,
    pub rounding: RoundingMode,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            precision: 3,
            max_holdings: 40,
            rounding: RoundingMode::default(),
        }
    }
}

impl NormalizeConfig {
    pub fn validate(&self) -> Result<(), NormalizeError> {
        if self.max_holdings == 0 {
            return Err(NormalizeError::InvalidConfig(
                "max_holdings must be >= 1".into(),
            ));
        }
        if self.precision > MAX_PRECISION {
            return Err(NormalizeError::InvalidConfig(format!(
                "precision must be <= {MAX_PRECISION}"
            )));
        }
        Ok(())
    }

    /// One unit in the last kept decimal place (0.001 at precision 3).
    pub fn unit(&self) -> Decimal {
        Decimal::new(1, self.precision)
    }
}

/// Output of a successful normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub allocation: Allocation,
    pub report: CoverageReport,
}

/// Turn raw holdings into an allocation over `universe` summing to exactly one.
///
/// Empty input yields an empty allocation and a default report; callers
/// should treat that as "nothing to submit".
///
/// ```
/// use fundpie::{normalize, InstrumentUniverse, NormalizeConfig, RawHolding};
/// use rust_decimal::Decimal;
///
/// let universe = InstrumentUniverse::from_ids(["A_US_EQ", "B_US_EQ", "C_US_EQ"]);
/// let holdings = vec![
///     RawHolding::new("A", Decimal::new(40, 2)),
///     RawHolding::new("B", Decimal::new(35, 2)),
///     RawHolding::new("C", Decimal::new(20, 2)),
/// ];
///
/// let out = normalize(&holdings, &universe, &NormalizeConfig::default()).unwrap();
/// assert_eq!(out.allocation.get("A_US_EQ"), Some(Decimal::new(421, 3)));
/// assert_eq!(out.allocation.total(), Decimal::ONE);
/// ```
pub fn normalize(
    holdings: &[RawHolding],
    universe: &InstrumentUniverse,
    config: &NormalizeConfig,
) -> Result<Normalized, NormalizeError> {
    config.validate()?;

    let mut report = CoverageReport {
        original_total: total_weight(holdings),
        max_holdings: config.max_holdings,
        ..Default::default()
    };

    if holdings.is_empty() {
        info!("No holdings given; nothing to normalize.");
        return Ok(Normalized {
            allocation: Allocation::new(),
            report,
        });
    }

    // 1. Match
    let mut kept = match_universe(holdings, universe, &mut report);
    validate_weights(&kept)?;
    report.matched_total = total_weight(&kept);
    info!(
        "Found {}% of original holdings. Missing are: {}",
        report.matched_total * Decimal::ONE_HUNDRED,
        describe(&report.omitted)
    );
    if !report.duplicates.is_empty() {
        warn!("Ignoring repeated tickers: {}", describe(&report.duplicates));
    }

    // 2. Cap
    if kept.len() > config.max_holdings {
        report.capped = kept.split_off(config.max_holdings);
        info!("Cutting off to {}.", config.max_holdings);
    }
    report.kept_total = total_weight(&kept);
    if !report.capped.is_empty() {
        info!(
            "Now covering {}% of original holdings.",
            report.kept_total * Decimal::ONE_HUNDRED
        );
    }

    // 3. Renormalize
    let perc_sum = report.kept_total;
    if perc_sum.is_zero() {
        return Err(NormalizeError::ZeroWeightSum);
    }
    let deficit = Decimal::ONE - perc_sum;
    let mut weights: Vec<Decimal> = kept
        .iter()
        .map(|h| h.weight + (h.weight / perc_sum) * deficit)
        .collect();

    // 4. Round
    for w in &mut weights {
        *w = config.rounding.round(*w, config.precision);
    }
    report.rounded_sum = weights.iter().copied().sum();
    debug!("Intermediate renormalization to {}.", report.rounded_sum);

    // 5. Drift correction
    let shift = config
        .rounding
        .round(Decimal::ONE - report.rounded_sum, config.precision);
    let tolerance = config.unit();
    if shift.abs() > tolerance {
        return Err(NormalizeError::DriftExceeded { shift, tolerance });
    }
    report.shift = shift;
    if let Some(idx) = shift_target(&weights, shift) {
        weights[idx] += shift;
        report.shift_target = Some(kept[idx].ticker.clone());
    }
    let final_sum: Decimal = weights.iter().copied().sum();
    if final_sum != Decimal::ONE {
        return Err(NormalizeError::SumMismatch(final_sum));
    }
    info!("Renormalized to {final_sum}.");

    // 6. Map
    let mut entries = Vec::with_capacity(kept.len());
    for (holding, weight) in kept.iter().zip(weights) {
        let id = universe
            .resolve(&holding.ticker)
            .map_err(|reason| NormalizeError::Unresolved {
                ticker: holding.ticker.clone(),
                reason,
            })?;
        if weight.is_zero() {
            warn!("{id} rounds to a zero weight at precision {}", config.precision);
        }
        entries.push((id.to_string(), weight));
    }
    if let Some(ticker) = report.shift_target.take() {
        report.shift_target = universe.resolve(&ticker).ok().map(str::to_string);
    }

    Ok(Normalized {
        allocation: Allocation::from_entries(entries),
        report,
    })
}

fn validate_weights(holdings: &[RawHolding]) -> Result<(), NormalizeError> {
    for h in holdings {
        if h.weight < Decimal::ZERO || h.weight > Decimal::ONE {
            return Err(NormalizeError::InvalidWeight {
                ticker: h.ticker.clone(),
                weight: h.weight,
            });
        }
    }
    Ok(())
}

/// Keep holdings whose ticker is a base symbol in `universe`, in input order.
/// Unmatched holdings and repeats of an already kept ticker go to `report`.
fn match_universe(
    holdings: &[RawHolding],
    universe: &InstrumentUniverse,
    report: &mut CoverageReport,
) -> Vec<RawHolding> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut kept = Vec::new();
    for h in holdings {
        if !universe.contains(&h.ticker) {
            report.omitted.push(h.clone());
        } else if !seen.insert(h.ticker.as_str()) {
            report.duplicates.push(h.clone());
        } else {
            kept.push(h.clone());
        }
    }
    kept
}

/// Pick the entry that absorbs the rounding shift.
///
/// A positive shift goes to the first entry holding the minimum weight. A
/// negative shift goes to the last entry strictly above the minimum, so a
/// minimal holding is never pushed down; if all entries are equal the last
/// one takes it.
fn shift_target(weights: &[Decimal], shift: Decimal) -> Option<usize> {
    if shift.is_zero() {
        return None;
    }
    let min = weights.iter().copied().min()?;
    if shift > Decimal::ZERO {
        weights.iter().position(|w| *w == min)
    } else {
        weights
            .iter()
            .rposition(|w| *w > min)
            .or(Some(weights.len() - 1))
    }
}

fn describe(holdings: &[RawHolding]) -> String {
    if holdings.is_empty() {
        return "none".into();
    }
    holdings
        .iter()
        .map(|h| format!("{} ({}%)", h.ticker, h.weight * Decimal::ONE_HUNDRED))
        .collect::<Vec<_>>()
        .join(", ")
}
