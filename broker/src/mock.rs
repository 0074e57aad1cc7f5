//! Mock broker for tests: implements the `Broker` trait with configurable behavior.
//!
//! Use this in integration tests to simulate broker responses without network calls.
//!
//! ```
//! use fundpie_broker::mock::MockBroker;
//! use fundpie_broker::Broker;
//!
//! let broker = MockBroker::builder()
//!     .with_instruments(["AAPL_US_EQ", "MSFT_US_EQ"])
//!     .with_account(1234, "USD")
//!     .build();
//!
//! assert_eq!(broker.instruments().unwrap().len(), 2);
//! ```

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// How the mock broker answers create-pie calls.
#[derive(Clone, Debug)]
pub enum PieMode {
    /// Accept every pie and assign increasing ids.
    Accept,
    /// Answer with the given HTTP status.
    Reject(u16),
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    pie_mode: PieMode,
    instruments: Vec<Instrument>,
    account: Account,
    instruments_status: Option<u16>,
}

impl MockBrokerBuilder {
    pub fn pie_mode(mut self, mode: PieMode) -> Self {
        self.pie_mode = mode;
        self
    }

    pub fn with_instruments<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instruments
            .extend(tickers.into_iter().map(Instrument::new));
        self
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.push(instrument);
        self
    }

    pub fn with_account(mut self, id: i64, currency_code: &str) -> Self {
        self.account = Account {
            id,
            currency_code: currency_code.to_string(),
        };
        self
    }

    /// Make the instrument listing fail with `status`.
    pub fn failing_instruments(mut self, status: u16) -> Self {
        self.instruments_status = Some(status);
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            pie_mode: self.pie_mode,
            instruments: self.instruments,
            account: self.account,
            instruments_status: self.instruments_status,
            next_pie_id: AtomicUsize::new(1),
            instrument_calls: AtomicUsize::new(0),
            created_pies: Mutex::new(Vec::new()),
        }
    }
}

/// A mock broker that records created pies and returns configurable responses.
pub struct MockBroker {
    pie_mode: PieMode,
    instruments: Vec<Instrument>,
    account: Account,
    instruments_status: Option<u16>,
    next_pie_id: AtomicUsize,
    instrument_calls: AtomicUsize,
    created_pies: Mutex<Vec<PieRequest>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            pie_mode: PieMode::Accept,
            instruments: Vec::new(),
            account: Account {
                id: 1,
                currency_code: "USD".into(),
            },
            instruments_status: None,
        }
    }

    /// Get all pie requests that were submitted (for assertion in tests).
    pub fn created_pies(&self) -> Vec<PieRequest> {
        self.created_pies.lock().unwrap().clone()
    }

    /// How many times the instrument list was fetched.
    pub fn instrument_calls(&self) -> usize {
        self.instrument_calls.load(Ordering::SeqCst)
    }

    fn url(endpoint: &str) -> String {
        format!("mock://equity{endpoint}")
    }
}

impl Broker for MockBroker {
    fn instruments(&self) -> Result<Vec<Instrument>, BrokerError> {
        self.instrument_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.instruments_status {
            return Err(BrokerError::Http {
                status,
                url: Self::url("/metadata/instruments"),
                body: String::new(),
            });
        }
        Ok(self.instruments.clone())
    }

    fn account(&self) -> Result<Account, BrokerError> {
        Ok(self.account.clone())
    }

    fn create_pie(&self, request: &PieRequest) -> Result<PieCreated, BrokerError> {
        // Record the request
        self.created_pies.lock().unwrap().push(request.clone());

        match &self.pie_mode {
            PieMode::Reject(status) => Err(BrokerError::Http {
                status: *status,
                url: Self::url("/pies"),
                body: "mock: pie rejected".into(),
            }),
            PieMode::Accept => {
                let id = self.next_pie_id.fetch_add(1, Ordering::SeqCst);
                Ok(PieCreated::from_response(serde_json::json!({
                    "instruments": [],
                    "settings": { "id": id, "name": request.name },
                })))
            }
        }
    }
}
