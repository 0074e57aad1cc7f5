//! Trading 212 equity REST client.

use std::time::Duration;

use log::{debug, error};
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Environment;
use crate::error::BrokerError;

/// Blocking Trading 212 REST client.
pub struct T212Client {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Equity API root for an environment and API version.
pub fn base_url(environment: Environment, version: u32) -> String {
    format!(
        "https://{}.trading212.com/api/v{version}/equity",
        environment.host()
    )
}

impl T212Client {
    /// Create a new client. Fails if the key is empty.
    pub fn new(
        api_key: &str,
        environment: Environment,
        version: u32,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        Self::with_base_url(api_key, &base_url(environment, version), timeout)
    }

    /// Create a client against an explicit base URL (proxies, test servers).
    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        if api_key.trim().is_empty() {
            return Err(BrokerError::Auth("API key is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an endpoint and decode the JSON body.
    pub fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, BrokerError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .map_err(|e| BrokerError::Connection(format!("GET {url} failed: {e}")))?;

        decode(check_status(resp)?)
    }

    /// POST a JSON body to an endpoint and decode the JSON answer.
    pub fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, BrokerError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!("POST {url}");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| BrokerError::Connection(format!("POST {url} failed: {e}")))?;

        decode(check_status(resp)?)
    }
}

/// Turn any non-success answer into `BrokerError::Http`.
fn check_status(resp: Response) -> Result<Response, BrokerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().unwrap_or_default();
    error!("Request {url} failed with status {status}");
    Err(BrokerError::Http {
        status: status.as_u16(),
        url,
        body,
    })
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, BrokerError> {
    let url = resp.url().to_string();
    resp.json::<T>().map_err(|e| BrokerError::Parse {
        url,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_per_environment() {
        assert_eq!(
            base_url(Environment::Demo, 0),
            "https://demo.trading212.com/api/v0/equity"
        );
        assert_eq!(
            base_url(Environment::Live, 1),
            "https://live.trading212.com/api/v1/equity"
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = T212Client::new(" ", Environment::Demo, 0, Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, BrokerError::Auth(_)));
    }

    #[test]
    fn explicit_base_url_drops_trailing_slash() {
        let client =
            T212Client::with_base_url("key", "http://localhost:8080/equity/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/equity");
    }
}
