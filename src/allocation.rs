//! Final pie allocation: tradable id → exact weight.

use std::fmt;

use rust_decimal::Decimal;

/// Ordered mapping from tradable instrument id to weight.
///
/// Entries keep the issuer's holding order. An allocation produced by
/// [`normalize`](crate::normalize::normalize) sums to exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    entries: Vec<(String, Decimal)>,
}

impl Allocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap pre-computed entries as-is. The sum is not checked.
    pub fn from_entries(entries: Vec<(String, Decimal)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight for a tradable id, if present.
    pub fn get(&self, tradable_id: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(id, _)| id == tradable_id)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(id, w)| (id.as_str(), *w))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|(_, w)| *w).sum()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ALLOCATION:")?;
        writeln!(f, "  {:>3}  {:16} {:>8}", "#", "Instrument", "Weight")?;
        for (i, (id, weight)) in self.entries.iter().enumerate() {
            writeln!(f, "  {:>3}  {:16} {:>8}", i + 1, id, weight)?;
        }
        writeln!(f, "  {:>3}  {:16} {:>8}", "", "TOTAL", self.total())
    }
}

/// Serializes as a JSON object in holding order.
#[cfg(feature = "serde")]
impl serde::Serialize for Allocation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, weight) in &self.entries {
            map.serialize_entry(id, weight)?;
        }
        map.end()
    }
}
