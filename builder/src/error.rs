//! Error types for the pie builder.

use std::path::PathBuf;

use fundpie::{CacheError, NormalizeError, SelectError};
use fundpie_broker::BrokerError;

/// All errors that can occur while building a pie.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("holdings error: {0}")]
    Holdings(String),

    #[error("failed to read holdings file {path}: {source}")]
    HoldingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write holdings file {path}: {source}")]
    HoldingsWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse holdings CSV: {0}")]
    HoldingsParse(#[from] csv::Error),

    #[error("holdings download failed: {0}")]
    Download(String),

    #[error("instrument cache is corrupt ({0}); delete it to refetch")]
    CorruptCache(serde_json::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("execution aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// Process exit status for a failed command: 2 when the holdings cannot
    /// become a valid allocation, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Normalize(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
