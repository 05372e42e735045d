use std::sync::Arc;

use tracing::debug;

use common::{Depth, ExecutionReport, OrderGateway, OrderRequest, OrderSide, Result};

/// What a factory needs to wire a strategy to the outside world.
#[derive(Clone)]
pub struct ConnectorConfig {
    /// The one instrument the strategy trades.
    pub instrument: String,
    /// Where order requests are sent.
    pub gateway: Arc<dyn OrderGateway>,
}

impl ConnectorConfig {
    pub fn new(instrument: impl Into<String>, gateway: Arc<dyn OrderGateway>) -> Self {
        Self {
            instrument: instrument.into(),
            gateway,
        }
    }
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("instrument", &self.instrument)
            .finish_non_exhaustive()
    }
}

/// Shared state and helpers for strategies bound to exactly one instrument.
///
/// Concrete strategies embed this and call its handlers first. Events for any
/// other instrument are ignored: the handler returns `false` and the caller
/// should stop there.
pub struct InstrumentBase {
    name: String,
    instrument: String,
    gateway: Arc<dyn OrderGateway>,
    /// Signed net quantity from fills: positive long, negative short.
    position: f64,
    last_depth_timestamp: Option<i64>,
    best_bid: Option<f64>,
    best_ask: Option<f64>,
}

impl InstrumentBase {
    pub fn new(config: &ConnectorConfig, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instrument: config.instrument.clone(),
            gateway: config.gateway.clone(),
            position: 0.0,
            last_depth_timestamp: None,
            best_bid: None,
            best_ask: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn last_depth_timestamp(&self) -> Option<i64> {
        self.last_depth_timestamp
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.best_bid
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.best_ask
    }

    /// Record the latest top of book. Returns `false` for foreign instruments.
    pub fn on_depth_update(&mut self, depth: &Depth) -> bool {
        if depth.instrument != self.instrument {
            debug!(
                strategy = %self.name,
                expected = %self.instrument,
                got = %depth.instrument,
                "Ignoring depth for other instrument"
            );
            return false;
        }
        self.last_depth_timestamp = Some(depth.timestamp);
        self.best_bid = depth.best_bid();
        self.best_ask = depth.best_ask();
        true
    }

    /// Track position from fills. Returns `false` for foreign instruments.
    pub fn on_execution_report_update(&mut self, report: &ExecutionReport) -> bool {
        if report.instrument != self.instrument {
            debug!(
                strategy = %self.name,
                expected = %self.instrument,
                got = %report.instrument,
                "Ignoring execution report for other instrument"
            );
            return false;
        }
        if report.status.is_fill() {
            self.position += report.side.sign() * report.last_quantity;
        }
        true
    }

    pub fn market_order(&self, side: OrderSide, quantity: f64) -> Result<OrderRequest> {
        OrderRequest::market(self.instrument.clone(), side, quantity)
    }

    pub fn limit_order(&self, side: OrderSide, price: f64, quantity: f64) -> Result<OrderRequest> {
        OrderRequest::limit(self.instrument.clone(), side, price, quantity)
    }

    /// Submit through the gateway. Blocks until the gateway returns.
    pub fn send_order(&self, request: &OrderRequest) -> Result<()> {
        self.gateway.submit(request)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} on {}: position={} last_depth={}",
            self.name,
            self.instrument,
            self.position,
            self.last_depth_timestamp
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use common::{Error, ExecutionStatus, PriceLevel};

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OrderRequest>>,
    }

    impl OrderGateway for Recorder {
        fn submit(&self, request: &OrderRequest) -> Result<()> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn base() -> (InstrumentBase, Arc<Recorder>) {
        let gw = Arc::new(Recorder::default());
        let cfg = ConnectorConfig::new("BTCUSDT", gw.clone());
        (InstrumentBase::new(&cfg, "ExampleAlgoTest"), gw)
    }

    fn report(instrument: &str, side: OrderSide, status: ExecutionStatus, qty: f64) -> ExecutionReport {
        ExecutionReport {
            client_order_id: "id".into(),
            instrument: instrument.into(),
            side,
            status,
            last_quantity: qty,
            last_price: Some(100.0),
            timestamp: 0,
            reject_reason: None,
        }
    }

    #[test]
    fn ignores_depth_for_other_instrument() {
        let (mut base, _) = base();
        let depth = Depth {
            instrument: "ETHUSDT".into(),
            timestamp: 10,
            bids: vec![],
            asks: vec![],
        };
        assert!(!base.on_depth_update(&depth));
        assert!(base.last_depth_timestamp().is_none());
    }

    #[test]
    fn records_top_of_book() {
        let (mut base, _) = base();
        let depth = Depth {
            instrument: "BTCUSDT".into(),
            timestamp: 42,
            bids: vec![PriceLevel { price: 99.0, quantity: 1.0 }],
            asks: vec![PriceLevel { price: 101.0, quantity: 1.0 }],
        };
        assert!(base.on_depth_update(&depth));
        assert_eq!(base.last_depth_timestamp(), Some(42));
        assert_eq!(base.best_bid(), Some(99.0));
        assert_eq!(base.best_ask(), Some(101.0));
    }

    #[test]
    fn position_follows_fills_only() {
        let (mut base, _) = base();
        assert!(base.on_execution_report_update(&report("BTCUSDT", OrderSide::Buy, ExecutionStatus::Filled, 2.0)));
        assert!(base.on_execution_report_update(&report("BTCUSDT", OrderSide::Sell, ExecutionStatus::PartiallyFilled, 0.5)));
        assert!(base.on_execution_report_update(&report("BTCUSDT", OrderSide::Sell, ExecutionStatus::Rejected, 9.0)));
        assert!(!base.on_execution_report_update(&report("ETHUSDT", OrderSide::Buy, ExecutionStatus::Filled, 9.0)));
        assert!((base.position() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn order_builders_use_own_instrument_and_validate() {
        let (base, gw) = base();
        let req = base.market_order(OrderSide::Sell, 0.25).unwrap();
        assert_eq!(req.instrument(), "BTCUSDT");
        base.send_order(&req).unwrap();
        assert_eq!(gw.sent.lock().unwrap().len(), 1);

        assert!(matches!(base.market_order(OrderSide::Buy, -1.0), Err(Error::InvalidOrder(_))));
        assert!(matches!(base.limit_order(OrderSide::Buy, -5.0, 1.0), Err(Error::InvalidOrder(_))));
    }
}
