pub mod alternating;
pub mod config;
pub mod instrument;
pub mod params;
pub mod provider;
pub mod registry;

pub use alternating::AlternatingStrategy;
pub use config::{build_strategies, StrategyConfig, StrategyFileConfig};
pub use instrument::{ConnectorConfig, InstrumentBase};
pub use params::{ParamValue, ParameterSet};
pub use provider::{example_provider, PrefixProvider, StrategyProvider};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};

use common::{Depth, ExecutionReport};

/// All strategy implementations must satisfy this trait.
///
/// A host delivers events to one instance at a time, in feed order. Handlers
/// return whether the event was processed; the defaults accept everything and
/// do nothing, so a strategy only overrides what it reacts to.
pub trait Strategy: Send {
    /// Name the strategy was created under.
    fn name(&self) -> &str;

    /// Apply tunables. Callable again to reconfigure; runtime state such as
    /// position or clocks must survive a second call.
    fn configure(&mut self, params: &ParameterSet);

    /// Called once per depth snapshot. May synchronously submit at most one order.
    fn on_depth_update(&mut self, _depth: &Depth) -> bool {
        true
    }

    /// Called once per execution report for this strategy's orders.
    fn on_execution_report_update(&mut self, _report: &ExecutionReport) -> bool {
        true
    }

    /// Diagnostic dump of internal state. `None` is a valid answer.
    fn describe(&self) -> Option<String> {
        None
    }

    /// Whether an external renderer can chart this strategy.
    fn has_visualization(&self) -> bool {
        false
    }
}
