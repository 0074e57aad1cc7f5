//! Trading 212 broker implementation.

pub mod client;

use std::time::Duration;

use log::info;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;
use client::T212Client;

/// Which Trading 212 environment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Practice account.
    Demo,
    /// Real money.
    Live,
}

impl Environment {
    pub fn from_demo_flag(demo: bool) -> Self {
        if demo { Environment::Demo } else { Environment::Live }
    }

    pub fn host(self) -> &'static str {
        match self {
            Environment::Demo => "demo",
            Environment::Live => "live",
        }
    }
}

/// Trading 212 equity broker implementing the generic Broker trait.
///
/// Uses the REST API for all operations. Blocking (sync) via reqwest::blocking.
pub struct T212Broker {
    client: T212Client,
}

impl T212Broker {
    pub fn new(
        api_key: &str,
        environment: Environment,
        version: u32,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let client = T212Client::new(api_key, environment, version, timeout)?;
        info!("Using Trading 212 API at {}", client.base_url());
        Ok(Self { client })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

impl Broker for T212Broker {
    fn instruments(&self) -> Result<Vec<Instrument>, BrokerError> {
        let instruments: Vec<Instrument> = self.client.get("/metadata/instruments")?;
        info!("Fetched {} instruments", instruments.len());
        Ok(instruments)
    }

    fn account(&self) -> Result<Account, BrokerError> {
        self.client.get("/account/info")
    }

    fn create_pie(&self, request: &PieRequest) -> Result<PieCreated, BrokerError> {
        request.validate()?;
        let raw: serde_json::Value = self.client.post("/pies", request)?;
        Ok(PieCreated::from_response(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_flag_maps_to_environment() {
        assert_eq!(Environment::from_demo_flag(true), Environment::Demo);
        assert_eq!(Environment::from_demo_flag(false), Environment::Live);
        assert_eq!(Environment::Live.host(), "live");
    }
}
