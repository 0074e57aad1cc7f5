//! Tradable instrument universe and base-symbol lookup.
//!
//! Platform instrument codes carry a venue/type suffix after the first `_`
//! (`AAPL_US_EQ`, `VUSAl_EQ`). The prefix is the issuer-side ticker used to
//! join holdings against the universe.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Resolution;

/// Separator between the base symbol and the platform suffix.
pub const SUFFIX_SEPARATOR: char = '_';

/// A tradable instrument and the issuer ticker derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrumentRecord {
    pub tradable_id: String,
    pub base_symbol: String,
}

impl InstrumentRecord {
    pub fn new(tradable_id: impl Into<String>) -> Self {
        let tradable_id = tradable_id.into();
        let base_symbol = base_symbol(&tradable_id).to_string();
        Self {
            tradable_id,
            base_symbol,
        }
    }
}

/// Strip the platform suffix: everything from the first `_` on.
///
/// ```
/// assert_eq!(fundpie::universe::base_symbol("AAPL_US_EQ"), "AAPL");
/// assert_eq!(fundpie::universe::base_symbol("BRK.B"), "BRK.B");
/// ```
pub fn base_symbol(tradable_id: &str) -> &str {
    tradable_id
        .split_once(SUFFIX_SEPARATOR)
        .map_or(tradable_id, |(prefix, _)| prefix)
}

/// The set of instruments a pie may contain, indexed by base symbol.
#[derive(Debug, Clone, Default)]
pub struct InstrumentUniverse {
    records: Vec<InstrumentRecord>,
    by_base: FxHashMap<String, Vec<usize>>,
}

impl InstrumentUniverse {
    /// Build a universe. Repeated tradable ids are kept once.
    pub fn new(records: impl IntoIterator<Item = InstrumentRecord>) -> Self {
        let mut seen = FxHashSet::default();
        let mut universe = Self::default();
        for record in records {
            if !seen.insert(record.tradable_id.clone()) {
                continue;
            }
            let idx = universe.records.len();
            universe
                .by_base
                .entry(record.base_symbol.clone())
                .or_default()
                .push(idx);
            universe.records.push(record);
        }
        universe
    }

    /// Build a universe straight from platform instrument codes.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(InstrumentRecord::new))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[InstrumentRecord] {
        &self.records
    }

    /// True if some instrument has this base symbol.
    pub fn contains(&self, base: &str) -> bool {
        self.by_base.contains_key(base)
    }

    /// All tradable ids sharing `base`, in insertion order.
    pub fn candidates(&self, base: &str) -> Vec<&str> {
        self.by_base
            .get(base)
            .map(|idxs| {
                idxs.iter()
                    .map(|&i| self.records[i].tradable_id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve a base symbol to exactly one tradable id.
    pub fn resolve(&self, base: &str) -> Result<&str, Resolution> {
        match self.candidates(base).as_slice() {
            [] => Err(Resolution::Missing),
            [only] => Ok(*only),
            many => Err(Resolution::Ambiguous(
                many.iter().map(|id| id.to_string()).collect(),
            )),
        }
    }
}

impl FromIterator<InstrumentRecord> for InstrumentUniverse {
    fn from_iter<T: IntoIterator<Item = InstrumentRecord>>(iter: T) -> Self {
        Self::new(iter)
    }
}
