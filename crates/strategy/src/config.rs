use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, OrderGateway, Result};

use crate::instrument::ConnectorConfig;
use crate::params::ParameterSet;
use crate::registry::ProviderRegistry;
use crate::Strategy;

/// Top-level strategy config file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// name = "ExampleAlgoBtc"
/// instrument = "BTCUSDT"
///
/// [strategy.params]
/// quantity = 0.5
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy name; providers dispatch on its prefix.
    pub name: String,
    /// Instrument the strategy trades, e.g. "BTCUSDT".
    pub instrument: String,
    /// Strategy-specific parameters.
    #[serde(default)]
    pub params: ParameterSet,
}

impl StrategyFileConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Distinct instruments in file order.
    pub fn instruments(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.strategies
            .iter()
            .filter(|s| seen.insert(s.instrument.as_str()))
            .map(|s| s.instrument.clone())
            .collect()
    }
}

/// Instantiate every strategy in the file. Unlike `ProviderRegistry::create`,
/// an unrecognised name is an error here: a config listing a strategy nobody
/// can build should stop the session before it starts.
pub fn build_strategies(
    registry: &ProviderRegistry,
    file_cfg: &StrategyFileConfig,
    gateway: Arc<dyn OrderGateway>,
) -> Result<Vec<Box<dyn Strategy>>> {
    file_cfg
        .strategies
        .iter()
        .map(|cfg| {
            if cfg.instrument.is_empty() {
                return Err(Error::Config(format!(
                    "strategy '{}' has an empty instrument",
                    cfg.name
                )));
            }
            let connector = ConnectorConfig::new(cfg.instrument.clone(), gateway.clone());
            let strategy = registry
                .create(&connector, &cfg.name, &cfg.params)
                .ok_or_else(|| Error::UnknownStrategy(cfg.name.clone()))?;
            info!(name = %strategy.name(), instrument = %cfg.instrument, "Registered strategy");
            Ok(strategy)
        })
        .collect()
}
