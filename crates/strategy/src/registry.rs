use std::sync::Arc;

use tracing::{info, warn};

use crate::instrument::ConnectorConfig;
use crate::params::ParameterSet;
use crate::provider::StrategyProvider;
use crate::Strategy;

/// Collects providers during start-up. Consumed by `build`, after which the
/// provider list cannot change.
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: Vec<Arc<dyn StrategyProvider>>,
}

impl ProviderRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: StrategyProvider + 'static>(mut self, provider: P) -> Self {
        info!(provider = %provider.label(), "Provider registered");
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers.into(),
        }
    }
}

/// Read-only table of strategy providers, queried in registration order.
///
/// Cheap to clone; hand a copy to whatever constructs strategies.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Arc<[Arc<dyn StrategyProvider>]>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// True iff some provider supports `name`.
    pub fn supports(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.supports(name))
    }

    /// Ask each provider in turn; the first strategy returned wins.
    /// `None` means no provider recognised the name.
    pub fn create(
        &self,
        config: &ConnectorConfig,
        name: &str,
        params: &ParameterSet,
    ) -> Option<Box<dyn Strategy>> {
        let created = self
            .providers
            .iter()
            .filter(|p| p.supports(name))
            .find_map(|p| p.create(config, name, params));
        if created.is_none() {
            warn!(%name, "No provider supports strategy");
        }
        created
    }
}
