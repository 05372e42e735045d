use chrono::DateTime;
use tracing::{error, info, warn};

use common::{Depth, ExecutionReport, OrderSide};

use crate::instrument::{ConnectorConfig, InstrumentBase};
use crate::params::ParameterSet;
use crate::Strategy;

pub const DEFAULT_QUANTITY: f64 = 0.01;
pub const DEFAULT_MIN_INTERVAL_MS: i64 = 10_000;

/// Reference strategy: sends a market order every time more than
/// `min_interval_ms` has passed since the last decision, flipping side each time.
///
/// The first depth only starts the clock. Since `last_side` starts at `Buy`,
/// the first order is a `Sell`. State advances on the decision to trade, so a
/// rejected submission just loses that cycle.
///
/// Parameters: `quantity` (positive float, default 0.01) and
/// `min_interval_ms` (positive integer, default 10000).
pub struct AlternatingStrategy {
    base: InstrumentBase,
    quantity: f64,
    min_interval_ms: i64,
    last_action_timestamp: Option<i64>,
    last_side: OrderSide,
    orders_sent: u64,
    send_failures: u64,
}

impl AlternatingStrategy {
    pub fn new(config: &ConnectorConfig, name: impl Into<String>) -> Self {
        Self {
            base: InstrumentBase::new(config, name),
            quantity: DEFAULT_QUANTITY,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            last_action_timestamp: None,
            last_side: OrderSide::Buy,
            orders_sent: 0,
            send_failures: 0,
        }
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn min_interval_ms(&self) -> i64 {
        self.min_interval_ms
    }

    pub fn last_side(&self) -> OrderSide {
        self.last_side
    }

    pub fn last_action_timestamp(&self) -> Option<i64> {
        self.last_action_timestamp
    }

    pub fn position(&self) -> f64 {
        self.base.position()
    }

    fn trade(&mut self, side: OrderSide) {
        let result = self.base.market_order(side, self.quantity).and_then(|request| {
            info!(strategy = %self.base.name(), %request, "Market order send");
            self.base.send_order(&request)
        });
        match result {
            Ok(()) => self.orders_sent += 1,
            Err(e) => {
                self.send_failures += 1;
                error!(
                    strategy = %self.base.name(),
                    side = %side,
                    error = %e,
                    "Error sending market order request"
                );
            }
        }
    }
}

impl Strategy for AlternatingStrategy {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn configure(&mut self, params: &ParameterSet) {
        let quantity = params.get_f64_or("quantity", DEFAULT_QUANTITY);
        self.quantity = if quantity > 0.0 {
            quantity
        } else {
            warn!(strategy = %self.base.name(), quantity, "Non-positive quantity, using default");
            DEFAULT_QUANTITY
        };

        let interval = params.get_i64_or("min_interval_ms", DEFAULT_MIN_INTERVAL_MS);
        self.min_interval_ms = if interval > 0 {
            interval
        } else {
            warn!(strategy = %self.base.name(), interval, "Non-positive interval, using default");
            DEFAULT_MIN_INTERVAL_MS
        };
    }

    fn on_depth_update(&mut self, depth: &Depth) -> bool {
        if !self.base.on_depth_update(depth) {
            return false;
        }

        let Some(last) = self.last_action_timestamp else {
            self.last_action_timestamp = Some(depth.timestamp);
            return true;
        };

        if depth.timestamp.saturating_sub(last) > self.min_interval_ms {
            self.last_action_timestamp = Some(depth.timestamp);
            self.last_side = self.last_side.opposite();
            self.trade(self.last_side);
        }
        true
    }

    fn on_execution_report_update(&mut self, report: &ExecutionReport) -> bool {
        let handled = self.base.on_execution_report_update(report);
        if handled {
            info!(strategy = %self.base.name(), %report, "Execution report received");
        }
        handled
    }

    fn describe(&self) -> Option<String> {
        let last_action = self
            .last_action_timestamp
            .and_then(DateTime::from_timestamp_millis)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        Some(format!(
            "{} quantity={} last_side={} last_action={} sent={} failed={}",
            self.base.describe(),
            self.quantity,
            self.last_side,
            last_action,
            self.orders_sent,
            self.send_failures
        ))
    }
}
