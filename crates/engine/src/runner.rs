use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use common::{Depth, ExecutionReport};
use strategy::Strategy;

/// Called with each depth just before strategies see it.
pub type DepthHook = Box<dyn FnMut(&Depth) + Send>;

/// Owns a set of strategy instances and feeds them events one at a time.
///
/// Each event goes to every strategy in the order they were added; strategies
/// for other instruments ignore it. Nothing here spawns threads or locks a
/// strategy: serial delivery is guaranteed by `&mut self`.
pub struct StrategyRunner {
    strategies: Vec<Box<dyn Strategy>>,
    depth_hook: Option<DepthHook>,
    depths_seen: u64,
    reports_seen: u64,
}

impl StrategyRunner {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            strategies,
            depth_hook: None,
            depths_seen: 0,
            reports_seen: 0,
        }
    }

    /// Run `hook` on every depth right before delivery, e.g. to move a
    /// simulated venue's book in lockstep with what strategies observe.
    pub fn with_depth_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Depth) + Send + 'static,
    {
        self.depth_hook = Some(Box::new(hook));
        self
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    pub fn depths_seen(&self) -> u64 {
        self.depths_seen
    }

    pub fn reports_seen(&self) -> u64 {
        self.reports_seen
    }

    /// Deliver one depth snapshot. Returns how many strategies handled it.
    pub fn on_depth(&mut self, depth: &Depth) -> usize {
        self.depths_seen += 1;
        if let Some(hook) = self.depth_hook.as_mut() {
            hook(depth);
        }
        let handled = self
            .strategies
            .iter_mut()
            .map(|s| s.on_depth_update(depth))
            .filter(|&h| h)
            .count();
        if handled == 0 {
            debug!(instrument = %depth.instrument, ts = depth.timestamp, "Depth not handled by any strategy");
        }
        handled
    }

    /// Deliver one execution report. Returns how many strategies handled it.
    pub fn on_execution_report(&mut self, report: &ExecutionReport) -> usize {
        self.reports_seen += 1;
        self.strategies
            .iter_mut()
            .map(|s| s.on_execution_report_update(report))
            .filter(|&h| h)
            .count()
    }

    /// Diagnostic dump of every strategy that has something to say.
    pub fn describe_all(&self) -> Vec<String> {
        self.strategies.iter().filter_map(|s| s.describe()).collect()
    }

    /// Run the delivery loop. Call from `tokio::spawn`.
    ///
    /// Execution reports take priority over depths. The loop ends when the
    /// depth feed closes (queued reports are drained first) or when
    /// `shutdown` flips to true. Returns the runner for inspection.
    pub async fn run(
        mut self,
        mut depth_rx: mpsc::Receiver<Depth>,
        mut report_rx: mpsc::UnboundedReceiver<ExecutionReport>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        info!(strategies = self.strategies.len(), "StrategyRunner running");
        let mut shutdown_live = true;
        let mut reports_open = true;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed(), if shutdown_live => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => {
                            info!("Shutdown signal received");
                            break;
                        }
                        Ok(()) => {}
                        Err(_) => shutdown_live = false,
                    }
                }

                report = report_rx.recv(), if reports_open => {
                    match report {
                        Some(report) => {
                            self.on_execution_report(&report);
                        }
                        None => reports_open = false,
                    }
                }

                depth = depth_rx.recv() => {
                    match depth {
                        Some(depth) => {
                            self.on_depth(&depth);
                        }
                        None => {
                            info!("Depth feed closed");
                            while let Ok(report) = report_rx.try_recv() {
                                self.on_execution_report(&report);
                            }
                            break;
                        }
                    }
                }
            }
        }

        info!(
            depths = self.depths_seen,
            reports = self.reports_seen,
            "StrategyRunner stopped"
        );
        for line in self.describe_all() {
            info!("{line}");
        }
        if self.strategies.is_empty() {
            warn!("StrategyRunner had no strategies");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use common::{ExecutionStatus, OrderGateway, OrderRequest, OrderSide, Result};
    use strategy::{example_provider, ConnectorConfig, ParameterSet, ProviderRegistry};

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

    fn depth(instrument: &str, ts: i64) -> Depth {
        Depth {
            instrument: instrument.into(),
            timestamp: ts,
            bids: vec![],
            asks: vec![],
        }
    }

    fn runner(gw: Arc<Recorder>) -> StrategyRunner {
        let registry = ProviderRegistry::builder().register(example_provider()).build();
        let params = ParameterSet::new().with("quantity", 1.0);
        let btc = registry
            .create(&ConnectorConfig::new("BTCUSDT", gw.clone()), "ExampleAlgoBtc", &params)
            .unwrap();
        let eth = registry
            .create(&ConnectorConfig::new("ETHUSDT", gw), "ExampleAlgoEth", &params)
            .unwrap();
        StrategyRunner::new(vec![btc, eth])
    }

    #[test]
    fn depth_goes_only_to_matching_instrument() {
        let gw = Arc::new(Recorder::default());
        let mut r = runner(gw.clone());
        assert_eq!(r.on_depth(&depth("BTCUSDT", 0)), 1);
        assert_eq!(r.on_depth(&depth("XRPUSDT", 0)), 0);
        assert_eq!(r.on_depth(&depth("BTCUSDT", 10_001)), 1);

        let sent = gw.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].instrument(), "BTCUSDT");
        assert_eq!(sent[0].side(), OrderSide::Sell);
    }

    #[test]
    fn report_routed_by_instrument() {
        let gw = Arc::new(Recorder::default());
        let mut r = runner(gw);
        let report = ExecutionReport {
            client_order_id: "x".into(),
            instrument: "ETHUSDT".into(),
            side: OrderSide::Buy,
            status: ExecutionStatus::Filled,
            last_quantity: 1.0,
            last_price: Some(10.0),
            timestamp: 1,
            reject_reason: None,
        };
        assert_eq!(r.on_execution_report(&report), 1);
        assert_eq!(r.reports_seen(), 1);
        assert_eq!(r.describe_all().len(), 2);
    }

    #[tokio::test]
    async fn run_drains_feed_then_stops() {
        let gw = Arc::new(Recorder::default());
        let r = runner(gw.clone());
        let (depth_tx, depth_rx) = mpsc::channel(16);
        let (_report_tx, report_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(r.run(depth_rx, report_rx, shutdown_rx));
        for ts in [0, 5_000, 11_000, 21_500] {
            depth_tx.send(depth("BTCUSDT", ts)).await.unwrap();
        }
        drop(depth_tx);

        let r = handle.await.unwrap();
        assert_eq!(r.depths_seen(), 4);
        let sides: Vec<_> = gw.sent.lock().unwrap().iter().map(|o| o.side()).collect();
        assert_eq!(sides, vec![OrderSide::Sell, OrderSide::Buy]);
    }

    fn fill(instrument: &str, side: OrderSide, qty: f64) -> ExecutionReport {
        ExecutionReport {
            client_order_id: "r".into(),
            instrument: instrument.into(),
            side,
            status: ExecutionStatus::Filled,
            last_quantity: qty,
            last_price: Some(100.0),
            timestamp: 1,
            reject_reason: None,
        }
    }

    #[tokio::test]
    async fn run_delivers_reports_from_channel() {
        let gw = Arc::new(Recorder::default());
        let r = runner(gw);
        let (depth_tx, depth_rx) = mpsc::channel(4);
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(r.run(depth_rx, report_rx, shutdown_rx));
        report_tx.send(fill("BTCUSDT", OrderSide::Buy, 2.0)).unwrap();
        depth_tx.send(depth("BTCUSDT", 0)).await.unwrap();
        drop(depth_tx);

        let r = handle.await.unwrap();
        assert_eq!(r.reports_seen(), 1);
        assert!(r.describe_all()[0].contains("position=2"));
    }

    #[tokio::test]
    async fn reports_queued_at_feed_close_are_drained() {
        let gw = Arc::new(Recorder::default());
        let r = runner(gw);
        let (depth_tx, depth_rx) = mpsc::channel::<Depth>(1);
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        report_tx.send(fill("BTCUSDT", OrderSide::Sell, 1.0)).unwrap();
        report_tx.send(fill("ETHUSDT", OrderSide::Buy, 3.0)).unwrap();
        drop(depth_tx);

        let r = r.run(depth_rx, report_rx, shutdown_rx).await;
        assert_eq!(r.reports_seen(), 2);
        assert_eq!(r.depths_seen(), 0);
        let states = r.describe_all();
        assert!(states[0].contains("position=-1"));
        assert!(states[1].contains("position=3"));
    }

    #[test]
    fn depth_hook_runs_before_strategies() {
        let gw = Arc::new(Recorder::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let mut r = runner(gw).with_depth_hook(move |d| log.lock().unwrap().push(d.timestamp));
        r.on_depth(&depth("BTCUSDT", 7));
        r.on_depth(&depth("XRPUSDT", 8));
        assert_eq!(*seen.lock().unwrap(), vec![7, 8]);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let gw = Arc::new(Recorder::default());
        let r = runner(gw);
        let (_depth_tx, depth_rx) = mpsc::channel::<Depth>(1);
        let (_report_tx, report_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(r.run(depth_rx, report_rx, shutdown_rx));
        shutdown_tx.send(true).unwrap();
        let r = handle.await.unwrap();
        assert_eq!(r.depths_seen(), 0);
    }
}
