//! fundpie-builder: mirror a fund's published holdings into a Trading 212 pie.
//!
//! Loads the tradable instrument list (cached on disk), reads the issuer's
//! holdings CSV, normalizes the weights to an allocation that sums to exactly
//! one, and creates the pie after confirmation, with an audit trail.

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod holdings;
pub mod prompt;
pub mod universe;
