use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use common::{Depth, Error, OrderGateway, OrderRequest, OrderSide, Result};
use strategy::{example_provider, ConnectorConfig, ParameterSet, ProviderRegistry, Strategy};

const MIN_INTERVAL_MS: i64 = 10_000;
const START_TS: i64 = 1_000_000;

/// Records the depth timestamp at which each order was submitted.
#[derive(Default)]
struct Recorder {
    clock: Mutex<i64>,
    sent: Mutex<Vec<(i64, OrderSide)>>,
    reject_all: bool,
}

impl OrderGateway for Recorder {
    fn submit(&self, request: &OrderRequest) -> Result<()> {
        if self.reject_all {
            return Err(Error::OrderRejected {
                reason: "test".into(),
            });
        }
        let now = *self.clock.lock().unwrap();
        self.sent.lock().unwrap().push((now, request.side()));
        Ok(())
    }
}

fn run(gaps: &[i64], gateway: Arc<Recorder>) -> Box<dyn Strategy> {
    let registry = ProviderRegistry::builder().register(example_provider()).build();
    let cfg = ConnectorConfig::new("BTCUSDT", gateway.clone());
    let mut strategy = registry
        .create(&cfg, "ExampleAlgoProp", &ParameterSet::new().with("quantity", 1.0))
        .unwrap();

    let mut ts = START_TS;
    for gap in gaps {
        ts += gap;
        *gateway.clock.lock().unwrap() = ts;
        strategy.on_depth_update(&Depth {
            instrument: "BTCUSDT".into(),
            timestamp: ts,
            bids: vec![],
            asks: vec![],
        });
    }
    strategy
}

proptest! {
    /// The first depth never trades, whatever comes after it.
    #[test]
    fn first_update_never_trades(gaps in prop::collection::vec(1i64..30_000, 1..40)) {
        let gw = Arc::new(Recorder::default());
        run(&gaps, gw.clone());
        let first_ts = START_TS + gaps[0];
        let sent = gw.sent.lock().unwrap();
        prop_assert!(sent.iter().all(|(ts, _)| *ts != first_ts));
        if let Some((ts, _)) = sent.first() {
            prop_assert!(*ts - first_ts > MIN_INTERVAL_MS);
        }
    }

    /// Sides alternate starting with Sell, and no two orders are closer than the interval.
    #[test]
    fn orders_alternate_and_respect_interval(gaps in prop::collection::vec(1i64..30_000, 1..80)) {
        let gw = Arc::new(Recorder::default());
        run(&gaps, gw.clone());
        let sent = gw.sent.lock().unwrap().clone();

        for (i, (_, side)) in sent.iter().enumerate() {
            let expected = if i % 2 == 0 { OrderSide::Sell } else { OrderSide::Buy };
            prop_assert_eq!(*side, expected);
        }
        for pair in sent.windows(2) {
            prop_assert!(pair[1].0 - pair[0].0 > MIN_INTERVAL_MS);
        }
    }

    /// Rejections do not stall the clock: the same number of decisions happen
    /// with a rejecting gateway as with an accepting one.
    #[test]
    fn rejections_do_not_change_decisions(gaps in prop::collection::vec(1i64..30_000, 1..60)) {
        let ok = Arc::new(Recorder::default());
        let accepted = run(&gaps, ok.clone());

        let bad = Arc::new(Recorder { reject_all: true, ..Default::default() });
        let rejected = run(&gaps, bad.clone());

        prop_assert!(bad.sent.lock().unwrap().is_empty());
        let sent = ok.sent.lock().unwrap().len();
        let failed_marker = format!("failed={sent}");
        prop_assert!(rejected.describe().unwrap().contains(&failed_marker));
        prop_assert!(accepted.describe().unwrap().contains("failed=0"));
    }
}
