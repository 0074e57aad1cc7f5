//! Broker trait and implementations for fundpie.
//!
//! Provides a `Broker` trait covering the two calls a pie build needs: the
//! tradable instrument list and pie creation.
//! Implementations:
//!
//! - **Trading 212** (feature `t212`): blocking REST client for the equity API
//! - **Mock** (always): in-memory broker for tests

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "t212")]
pub mod t212;

pub use error::BrokerError;
pub use types::*;

/// A brokerage connection that can list instruments and create pies.
pub trait Broker {
    /// Every instrument the account may hold.
    fn instruments(&self) -> Result<Vec<Instrument>, BrokerError>;

    /// Account identity; doubles as a connectivity check.
    fn account(&self) -> Result<Account, BrokerError>;

    /// Create a pie. Any non-success answer is an error.
    fn create_pie(&self, request: &PieRequest) -> Result<PieCreated, BrokerError>;
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn instruments(&self) -> Result<Vec<Instrument>, BrokerError> {
        (**self).instruments()
    }

    fn account(&self) -> Result<Account, BrokerError> {
        (**self).account()
    }

    fn create_pie(&self, request: &PieRequest) -> Result<PieCreated, BrokerError> {
        (**self).create_pie(request)
    }
}
