//! TOML configuration loading and validation, with environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fundpie::NormalizeConfig;
use fundpie::normalize::MAX_PRECISION;
use fundpie_broker::DividendCashAction;
use fundpie_broker::t212::{Environment, client};
use log::info;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "T212_API_KEY";
/// Environment variable selecting the demo (`true`) or live (`false`) API.
pub const ENV_DEMO: &str = "T212_DEMO";
/// Environment variable selecting the API version.
pub const ENV_API_VERSION: &str = "T212_API_VERSION";

/// Longest pie lifetime accepted in `[pie] duration_days`.
pub const MAX_PIE_DAYS: i64 = 36_500;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub holdings: HoldingsConfig,
    pub universe: UniverseConfig,
    pub normalize: NormalizeConfig,
    pub pie: PieConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Usually supplied through `T212_API_KEY` instead.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_true")]
    pub demo: bool,
    #[serde(default)]
    pub version: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            demo: default_true(),
            version: 0,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoldingsConfig {
    /// Fund product page listing the holdings download.
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default = "default_holdings_file")]
    pub file: PathBuf,
    #[serde(default = "default_symbol_column")]
    pub symbol_column: String,
    #[serde(default = "default_weight_column")]
    pub weight_column: String,
}

impl Default for HoldingsConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            file: default_holdings_file(),
            symbol_column: default_symbol_column(),
            weight_column: default_weight_column(),
        }
    }
}

fn default_holdings_file() -> PathBuf {
    PathBuf::from("data/holdings.csv")
}
fn default_symbol_column() -> String {
    "Symbol".into()
}
fn default_weight_column() -> String {
    "Percent of Assets".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniverseConfig {
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
    /// Keep only instruments quoted in this currency.
    #[serde(default)]
    pub currency_code: Option<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            cache_key: default_cache_key(),
            currency_code: None,
        }
    }
}

fn default_cache_key() -> String {
    "instruments".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PieConfig {
    #[serde(default = "default_pie_name")]
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_dividend_action")]
    pub dividend_cash_action: DividendAction,
    #[serde(default)]
    pub goal: Decimal,
    #[serde(default = "default_duration")]
    pub duration_days: i64,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            name: default_pie_name(),
            icon: default_icon(),
            dividend_cash_action: default_dividend_action(),
            goal: Decimal::ZERO,
            duration_days: default_duration(),
        }
    }
}

fn default_pie_name() -> String {
    "SCHD".into()
}
fn default_icon() -> String {
    "Bills".into()
}
fn default_dividend_action() -> DividendAction {
    DividendAction::Reinvest
}
fn default_duration() -> i64 {
    365
}

/// Dividend handling as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendAction {
    Reinvest,
    ToAccountCash,
}

impl From<DividendAction> for DividendCashAction {
    fn from(action: DividendAction) -> Self {
        match action {
            DividendAction::Reinvest => DividendCashAction::Reinvest,
            DividendAction::ToAccountCash => DividendCashAction::ToAccountCash,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file, falling back to defaults if it does not
    /// exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            toml::from_str(&contents)?
        } else {
            info!("No config at {}; using defaults", path.display());
            Config::default()
        };
        dotenvy::dotenv().ok();
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string without touching the environment.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override API settings from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.api.key = Some(key);
        }
        if let Some(demo) = lookup(ENV_DEMO) {
            self.api.demo = parse_bool(&demo)
                .ok_or_else(|| Error::Config(format!("{ENV_DEMO} must be true/false, got {demo:?}")))?;
        }
        if let Some(version) = lookup(ENV_API_VERSION) {
            self.api.version = version.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_API_VERSION} must be an integer, got {version:?}"))
            })?;
        }
        Ok(())
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.pie.name.trim().is_empty() {
            return Err(Error::Config("pie name must not be empty".into()));
        }
        if self.pie.duration_days <= 0 || self.pie.duration_days > MAX_PIE_DAYS {
            return Err(Error::Config(format!(
                "pie duration_days must be in 1..={MAX_PIE_DAYS}"
            )));
        }
        if self.pie.goal < Decimal::ZERO {
            return Err(Error::Config("pie goal must be >= 0".into()));
        }
        if self.normalize.max_holdings == 0 {
            return Err(Error::Config("max_holdings must be >= 1".into()));
        }
        if self.normalize.precision > MAX_PRECISION {
            return Err(Error::Config(format!(
                "precision must be <= {MAX_PRECISION}"
            )));
        }
        if self.holdings.symbol_column.is_empty() || self.holdings.weight_column.is_empty() {
            return Err(Error::Config("holdings column names must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        Environment::from_demo_flag(self.api.demo)
    }

    /// Equity API root for the configured environment.
    pub fn base_url(&self) -> String {
        client::base_url(self.environment(), self.api.version)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// API key, required for anything that talks to the broker.
    pub fn api_key(&self) -> Result<&str> {
        self.api
            .key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("no API key; set {ENV_API_KEY}")))
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundpie::RoundingMode;
    use rust_decimal_macros::dec;

    fn example_toml() -> &'static str {
        r#"
[api]
demo = false
version = 0
timeout_secs = 20

[holdings]
source_url = "https://www.schwabassetmanagement.com/products/schd"
file = "data/schd_holdings.csv"
symbol_column = "Symbol"
weight_column = "Percent of Assets"

[universe]
cache_key = "instruments"
currency_code = "USD"

[normalize]
precision = 3
max_holdings = 40
rounding = "half_even"

[pie]
name = "SCHD"
icon = "Bills"
dividend_cash_action = "to_account_cash"
goal = 2500
duration_days = 730

[cache]
dir = ".cache"

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert!(!config.api.demo);
        assert_eq!(config.api.timeout_secs, 20);
        assert_eq!(config.holdings.file, PathBuf::from("data/schd_holdings.csv"));
        assert_eq!(config.universe.currency_code.as_deref(), Some("USD"));
        assert_eq!(config.normalize.rounding, RoundingMode::HalfEven);
        assert_eq!(config.pie.goal, dec!(2500));
        assert_eq!(
            DividendCashAction::from(config.pie.dividend_cash_action),
            DividendCashAction::ToAccountCash
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.api.demo);
        assert_eq!(config.api.version, 0);
        assert_eq!(config.normalize, NormalizeConfig::default());
        assert_eq!(config.pie.name, "SCHD");
        assert_eq!(config.pie.icon, "Bills");
        assert_eq!(config.pie.duration_days, 365);
        assert_eq!(config.holdings.weight_column, "Percent of Assets");
        assert_eq!(config.cache.dir, PathBuf::from(".cache"));
    }

    #[test]
    fn partial_normalize_section_keeps_other_defaults() {
        let config = Config::from_toml("[normalize]\nmax_holdings = 25\n").unwrap();
        assert_eq!(config.normalize.max_holdings, 25);
        assert_eq!(config.normalize.precision, 3);
    }

    #[test]
    fn env_overrides_api_settings() {
        let mut config = Config::from_toml(example_toml()).unwrap();
        config
            .apply_env(env(&[
                (ENV_API_KEY, "secret"),
                (ENV_DEMO, "TRUE"),
                (ENV_API_VERSION, "1"),
            ]))
            .unwrap();
        assert_eq!(config.api_key().unwrap(), "secret");
        assert!(config.api.demo);
        assert_eq!(config.base_url(), "https://demo.trading212.com/api/v1/equity");
    }

    #[test]
    fn env_rejects_garbage() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[(ENV_DEMO, "maybe")])).is_err());
        assert!(config.apply_env(env(&[(ENV_API_VERSION, "v2")])).is_err());
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = Config::default();
        assert!(matches!(config.api_key(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_catches_bad_values() {
        assert!(Config::from_toml("[pie]\nname = \"\"\n").is_err());
        assert!(Config::from_toml("[pie]\nduration_days = 0\n").is_err());
        assert!(Config::from_toml("[pie]\nduration_days = 36501\n").is_err());
        assert!(Config::from_toml("[pie]\nduration_days = 100000000000000\n").is_err());
        assert!(Config::from_toml("[pie]\nduration_days = 36500\n").is_ok());
        assert!(Config::from_toml("[pie]\ngoal = -5\n").is_err());
        assert!(Config::from_toml("[normalize]\nmax_holdings = 0\n").is_err());
        assert!(Config::from_toml("[normalize]\nprecision = 12\n").is_err());
        assert!(Config::from_toml("[api]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.pie.name, "SCHD");
    }

    #[test]
    fn audit_path() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.audit_path(), PathBuf::from("./logs/audit.jsonl"));
    }
}
