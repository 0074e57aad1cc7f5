//! Shared broker types: instruments, accounts, pie requests.

use chrono::{DateTime, Duration, Utc};
use fundpie::{Allocation, InstrumentRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::BrokerError;

/// Format used by the pies endpoint for `endDate`.
pub const END_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Default pie lifetime.
pub const DEFAULT_PIE_DAYS: i64 = 365;

/// Tradable instrument metadata, as listed by the broker.
///
/// Only `ticker` is required; the rest is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Platform instrument code, e.g. `AAPL_US_EQ`.
    pub ticker: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

impl Instrument {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            kind: None,
            isin: None,
            currency_code: None,
            name: None,
            short_name: None,
        }
    }

    pub fn with_currency(mut self, code: &str) -> Self {
        self.currency_code = Some(code.to_string());
        self
    }

    /// Join record used by the normalizer.
    pub fn record(&self) -> InstrumentRecord {
        InstrumentRecord::new(self.ticker.as_str())
    }
}

/// Account identity from the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub currency_code: String,
}

/// What the pie does with cash dividends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DividendCashAction {
    #[default]
    Reinvest,
    ToAccountCash,
}

/// Body of a create-pie request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieRequest {
    pub dividend_cash_action: DividendCashAction,
    #[serde(serialize_with = "serialize_end_date")]
    pub end_date: DateTime<Utc>,
    pub goal: Decimal,
    pub icon: String,
    pub instrument_shares: Allocation,
    pub name: String,
}

fn serialize_end_date<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(END_DATE_FORMAT))
}

impl PieRequest {
    /// A reinvesting pie with no goal, ending one year after `now`.
    pub fn new(name: impl Into<String>, shares: Allocation, now: DateTime<Utc>) -> Self {
        Self {
            dividend_cash_action: DividendCashAction::default(),
            end_date: now + Duration::days(DEFAULT_PIE_DAYS),
            goal: Decimal::ZERO,
            icon: "Bills".into(),
            instrument_shares: shares,
            name: name.into(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_goal(mut self, goal: Decimal) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_dividend_cash_action(mut self, action: DividendCashAction) -> Self {
        self.dividend_cash_action = action;
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = end_date;
        self
    }

    /// Reject requests the server would refuse or that would misstate the fund.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.name.trim().is_empty() {
            return Err(BrokerError::InvalidRequest("pie name is empty".into()));
        }
        if self.instrument_shares.is_empty() {
            return Err(BrokerError::InvalidRequest("pie has no instruments".into()));
        }
        let total = self.instrument_shares.total();
        if total != Decimal::ONE {
            return Err(BrokerError::InvalidRequest(format!(
                "instrument shares sum to {total}, expected 1"
            )));
        }
        if self.goal < Decimal::ZERO {
            return Err(BrokerError::InvalidRequest("goal must be >= 0".into()));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, BrokerError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BrokerError::InvalidRequest(format!("cannot encode pie: {e}")))
    }
}

/// A pie the broker accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct PieCreated {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// Full response body.
    pub raw: serde_json::Value,
}

impl PieCreated {
    /// Read the id and name out of a create-pie response, tolerating
    /// missing fields.
    pub fn from_response(raw: serde_json::Value) -> Self {
        let settings = raw.get("settings");
        let id = settings.and_then(|s| s.get("id")).and_then(|v| v.as_i64());
        let name = settings
            .and_then(|s| s.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self { id, name, raw }
    }
}
