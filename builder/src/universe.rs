//! Loading the tradable instrument universe, through the cache.

use fundpie::{CacheRepository, InstrumentUniverse};
use fundpie_broker::{Broker, Instrument};
use log::{info, warn};

use crate::config::UniverseConfig;
use crate::error::{Error, Result};

/// Instruments from the cache, or from the broker on a miss.
///
/// A fetched list is written back to the cache unfiltered, so changing the
/// currency filter does not require a refetch.
pub fn load_instruments(
    cache: &dyn CacheRepository,
    broker: &dyn Broker,
    config: &UniverseConfig,
) -> Result<Vec<Instrument>> {
    if let Some(text) = cache.get(&config.cache_key)? {
        let instruments: Vec<Instrument> =
            serde_json::from_str(&text).map_err(Error::CorruptCache)?;
        info!("Loaded {} instruments from cache", instruments.len());
        return Ok(instruments);
    }

    let instruments = broker.instruments()?;
    let text = serde_json::to_string(&instruments).map_err(Error::CorruptCache)?;
    cache.put(&config.cache_key, &text)?;
    info!("Cached {} instruments as {:?}", instruments.len(), config.cache_key);
    Ok(instruments)
}

/// Index instruments by base symbol, keeping only the configured currency.
pub fn build_universe(instruments: &[Instrument], config: &UniverseConfig) -> InstrumentUniverse {
    let universe: InstrumentUniverse = instruments
        .iter()
        .filter(|i| match &config.currency_code {
            Some(code) => i.currency_code.as_deref() == Some(code.as_str()),
            None => true,
        })
        .map(Instrument::record)
        .collect();
    if universe.is_empty() && !instruments.is_empty() {
        warn!(
            "No instruments left after filtering on currency {:?}",
            config.currency_code
        );
    }
    universe
}

pub fn load_universe(
    cache: &dyn CacheRepository,
    broker: &dyn Broker,
    config: &UniverseConfig,
) -> Result<InstrumentUniverse> {
    let instruments = load_instruments(cache, broker, config)?;
    Ok(build_universe(&instruments, config))
}
