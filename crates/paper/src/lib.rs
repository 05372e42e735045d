use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::{
    Depth, Error, ExecutionReport, ExecutionStatus, OrderGateway, OrderRequest, OrderSide,
    OrderType, Result,
};

#[derive(Debug, Clone, Copy)]
struct TopOfBook {
    bid: Option<f64>,
    ask: Option<f64>,
    timestamp: i64,
}

#[derive(Debug, Clone)]
struct RestingOrder {
    client_order_id: String,
    instrument: String,
    side: OrderSide,
    price: f64,
    quantity: f64,
}

/// Simulated order gateway for backtests.
///
/// Market orders fill immediately against the latest known top of book with
/// configurable slippage. Limit orders fill at the touch if marketable, else
/// rest until a later depth crosses them. Every outcome is pushed as an
/// `ExecutionReport` on the report channel.
pub struct PaperGateway {
    books: RwLock<HashMap<String, TopOfBook>>,
    resting: Mutex<Vec<RestingOrder>>,
    history: Mutex<Vec<ExecutionReport>>,
    /// Slippage in basis points applied to market fills.
    slippage_bps: f64,
    report_tx: mpsc::UnboundedSender<ExecutionReport>,
}

impl PaperGateway {
    pub fn new(slippage_bps: f64, report_tx: mpsc::UnboundedSender<ExecutionReport>) -> Self {
        info!(slippage_bps, "PaperGateway initialized");
        Self {
            books: RwLock::new(HashMap::new()),
            resting: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            slippage_bps,
            report_tx,
        }
    }

    /// Record the latest top of book and fill any resting limits it crosses.
    pub fn update_depth(&self, depth: &Depth) {
        let top = TopOfBook {
            bid: depth.best_bid(),
            ask: depth.best_ask(),
            timestamp: depth.timestamp,
        };
        self.books.write().insert(depth.instrument.clone(), top);

        let crossed: Vec<RestingOrder> = {
            let mut resting = self.resting.lock();
            let (crossed, still): (Vec<_>, Vec<_>) = resting
                .drain(..)
                .partition(|o| o.instrument == depth.instrument && marketable(o.side, o.price, &top));
            *resting = still;
            crossed
        };
        for order in crossed {
            debug!(id = %order.client_order_id, price = order.price, "Resting limit crossed");
            self.publish(ExecutionReport {
                client_order_id: order.client_order_id,
                instrument: order.instrument,
                side: order.side,
                status: ExecutionStatus::Filled,
                last_quantity: order.quantity,
                last_price: Some(order.price),
                timestamp: top.timestamp,
                reject_reason: None,
            });
        }
    }

    /// Every report published so far, in order.
    pub fn history(&self) -> Vec<ExecutionReport> {
        self.history.lock().clone()
    }

    pub fn resting_orders(&self) -> usize {
        self.resting.lock().len()
    }

    fn publish(&self, report: ExecutionReport) {
        self.history.lock().push(report.clone());
        if self.report_tx.send(report).is_err() {
            warn!("Execution report channel closed, report dropped");
        }
    }
}

fn marketable(side: OrderSide, price: f64, top: &TopOfBook) -> bool {
    match side {
        OrderSide::Buy => top.ask.is_some_and(|ask| ask <= price),
        OrderSide::Sell => top.bid.is_some_and(|bid| bid >= price),
    }
}

impl OrderGateway for PaperGateway {
    fn submit(&self, request: &OrderRequest) -> Result<()> {
        let top = self
            .books
            .read()
            .get(request.instrument())
            .copied()
            .ok_or_else(|| Error::OrderRejected {
                reason: format!("no market data for '{}'", request.instrument()),
            })?;

        let touch = match request.side() {
            OrderSide::Buy => top.ask,
            OrderSide::Sell => top.bid,
        };

        let (status, last_price, last_quantity) = match request.order_type() {
            OrderType::Market => {
                let touch = touch.ok_or_else(|| Error::OrderRejected {
                    reason: format!("empty {} side for '{}'", request.side(), request.instrument()),
                })?;
                // Apply slippage: buys pay more, sells receive less
                let fill = match request.side() {
                    OrderSide::Buy => touch * (1.0 + self.slippage_bps / 10_000.0),
                    OrderSide::Sell => touch * (1.0 - self.slippage_bps / 10_000.0),
                };
                (ExecutionStatus::Filled, Some(fill), request.quantity())
            }
            OrderType::Limit { price } if marketable(request.side(), price, &top) => {
                (ExecutionStatus::Filled, touch, request.quantity())
            }
            OrderType::Limit { price } => {
                self.resting.lock().push(RestingOrder {
                    client_order_id: request.client_order_id().to_string(),
                    instrument: request.instrument().to_string(),
                    side: request.side(),
                    price,
                    quantity: request.quantity(),
                });
                (ExecutionStatus::New, None, 0.0)
            }
        };

        debug!(
            instrument = %request.instrument(),
            side = %request.side(),
            status = %status,
            price = ?last_price,
            qty = request.quantity(),
            "Paper order processed"
        );

        self.publish(ExecutionReport {
            client_order_id: request.client_order_id().to_string(),
            instrument: request.instrument().to_string(),
            side: request.side(),
            status,
            last_quantity,
            last_price,
            timestamp: top.timestamp,
            reject_reason: None,
        });
        Ok(())
    }
}
