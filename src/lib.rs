//! # fundpie
//!
//! Turn a fund's published holdings into an exact-sum allocation that can be
//! submitted as a Trading 212 pie.
//!
//! ## Pipeline
//!
//! Raw holdings (issuer ticker + fraction of assets) are matched against the
//! tradable [`InstrumentUniverse`], cut to a maximum number of holdings,
//! scaled to sum to one, rounded to a fixed number of decimal places and
//! finally corrected so that the rounded weights add up to exactly `1`:
//!
//! ```
//! use fundpie::{normalize, InstrumentUniverse, NormalizeConfig, RawHolding};
//! use rust_decimal::Decimal;
//!
//! let universe = InstrumentUniverse::from_ids(["AVGO_US_EQ", "KO_US_EQ", "PEP_US_EQ"]);
//! let holdings = vec![
//!     RawHolding::from_percent("AVGO", Decimal::new(425, 2)),   // 4.25%
//!     RawHolding::from_percent("CASH", Decimal::new(100, 2)),   // not tradable
//!     RawHolding::from_percent("KO", Decimal::new(410, 2)),
//!     RawHolding::from_percent("PEP", Decimal::new(400, 2)),
//! ];
//!
//! let out = normalize(&holdings, &universe, &NormalizeConfig::default()).unwrap();
//!
//! assert_eq!(out.allocation.len(), 3);
//! assert_eq!(out.allocation.total(), Decimal::ONE);
//! assert_eq!(out.report.omitted[0].ticker, "CASH");
//! ```
//!
//! ## Exactness
//!
//! Weights are [`rust_decimal::Decimal`], never floats. The final check that
//! the allocation sums to one is an exact comparison, and any rounding drift
//! larger than one unit of the chosen precision is an error rather than
//! something silently spread over the pie.
//!
//! ## Collaborators
//!
//! The crate does no I/O of its own beyond [`FileCache`]. Prompts and caches
//! are injected through the [`Selector`] and [`CacheRepository`] traits.

pub mod allocation;
pub mod cache;
mod error;
pub mod holding;
pub mod normalize;
pub mod report;
pub mod select;
pub mod universe;

// Re-export public API
pub use allocation::Allocation;
pub use cache::{CacheRepository, FileCache, MemoryCache};
pub use error::{CacheError, NormalizeError, Resolution, SelectError};
pub use holding::RawHolding;
pub use normalize::{NormalizeConfig, Normalized, RoundingMode, normalize};
pub use report::CoverageReport;
pub use select::{FirstMatch, Selector};
pub use universe::{InstrumentRecord, InstrumentUniverse};
