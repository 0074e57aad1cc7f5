//! Broker error types.

/// Errors that can occur during broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with a non-success status.
    #[error("request {url} failed with status {status}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to parse response from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BrokerError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BrokerError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
