use tracing::info;

use crate::alternating::AlternatingStrategy;
use crate::instrument::ConnectorConfig;
use crate::params::ParameterSet;
use crate::Strategy;

/// Constructor for one strategy family. Receives the connector wiring and the
/// full requested strategy name.
pub type StrategyCtor = Box<dyn Fn(&ConnectorConfig, &str) -> Box<dyn Strategy> + Send + Sync>;

/// Something that knows how to build strategies by name.
pub trait StrategyProvider: Send + Sync {
    /// Label used in logs.
    fn label(&self) -> &str;

    /// Whether `create` would find a constructor for `name`.
    fn supports(&self, name: &str) -> bool;

    /// Build and configure a strategy, or `None` if `name` is not recognised.
    fn create(
        &self,
        config: &ConnectorConfig,
        name: &str,
        params: &ParameterSet,
    ) -> Option<Box<dyn Strategy>>;
}

/// Provider that dispatches on name prefix.
///
/// Entries are checked in registration order and the first prefix of the
/// requested name wins, even if a later entry has a longer matching prefix.
pub struct PrefixProvider {
    label: String,
    entries: Vec<(String, StrategyCtor)>,
}

impl PrefixProvider {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// Add a constructor for every name starting with `prefix`.
    pub fn register<F>(mut self, prefix: impl Into<String>, ctor: F) -> Self
    where
        F: Fn(&ConnectorConfig, &str) -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        self.entries.push((prefix.into(), Box::new(ctor)));
        self
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    fn resolve(&self, name: &str) -> Option<&(String, StrategyCtor)> {
        self.entries.iter().find(|(prefix, _)| name.starts_with(prefix.as_str()))
    }
}

impl StrategyProvider for PrefixProvider {
    fn label(&self) -> &str {
        &self.label
    }

    fn supports(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    fn create(
        &self,
        config: &ConnectorConfig,
        name: &str,
        params: &ParameterSet,
    ) -> Option<Box<dyn Strategy>> {
        let (prefix, ctor) = self.resolve(name)?;
        info!(provider = %self.label, %prefix, %name, "Creating strategy");
        let mut strategy = ctor(config, name);
        strategy.configure(params);
        Some(strategy)
    }
}

/// Provider for the bundled reference strategy, matched by `ExampleAlgo*`.
pub fn example_provider() -> PrefixProvider {
    PrefixProvider::new("example").register("ExampleAlgo", |config, name| {
        Box::new(AlternatingStrategy::new(config, name))
    })
}
