use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Order book snapshot for a single instrument.
///
/// Bids are ordered best (highest) first, asks best (lowest) first.
/// `timestamp` is in milliseconds and non-decreasing per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depth {
    pub instrument: String,
    pub timestamp: i64,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
}

impl Depth {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit { price: f64 },
}

/// An order a strategy wants sent to the venue.
///
/// Fields are private so a request cannot change after the builder has
/// validated it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    client_order_id: String,
    instrument: String,
    side: OrderSide,
    quantity: f64,
    order_type: OrderType,
}

impl OrderRequest {
    /// Build a market order. Quantity must be finite and strictly positive.
    pub fn market(instrument: impl Into<String>, side: OrderSide, quantity: f64) -> Result<Self> {
        Self::build(instrument.into(), side, quantity, OrderType::Market)
    }

    /// Build a limit order. Price and quantity must be finite and strictly positive.
    pub fn limit(
        instrument: impl Into<String>,
        side: OrderSide,
        price: f64,
        quantity: f64,
    ) -> Result<Self> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidOrder(format!(
                "limit price must be positive, got {price}"
            )));
        }
        Self::build(instrument.into(), side, quantity, OrderType::Limit { price })
    }

    fn build(instrument: String, side: OrderSide, quantity: f64, order_type: OrderType) -> Result<Self> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::InvalidOrder(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if instrument.is_empty() {
            return Err(Error::InvalidOrder("instrument must not be empty".to_string()));
        }
        Ok(Self {
            client_order_id: uuid::Uuid::new_v4().to_string(),
            instrument,
            side,
            quantity,
            order_type,
        })
    }

    pub fn client_order_id(&self) -> &str {
        &self.client_order_id
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }
}

impl std::fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.order_type {
            OrderType::Market => write!(
                f,
                "{} {} {} @ market [{}]",
                self.side, self.quantity, self.instrument, self.client_order_id
            ),
            OrderType::Limit { price } => write!(
                f,
                "{} {} {} @ {price} [{}]",
                self.side, self.quantity, self.instrument, self.client_order_id
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Accepted by the venue, resting.
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl ExecutionStatus {
    pub fn is_fill(self) -> bool {
        matches!(self, ExecutionStatus::Filled | ExecutionStatus::PartiallyFilled)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::New => write!(f, "new"),
            ExecutionStatus::PartiallyFilled => write!(f, "partially_filled"),
            ExecutionStatus::Filled => write!(f, "filled"),
            ExecutionStatus::Cancelled => write!(f, "cancelled"),
            ExecutionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome of a previously submitted order, pushed by the execution feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub client_order_id: String,
    pub instrument: String,
    pub side: OrderSide,
    pub status: ExecutionStatus,
    /// Quantity filled by this event only.
    pub last_quantity: f64,
    /// Price of this event's fill, if any.
    pub last_price: Option<f64>,
    pub timestamp: i64,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} qty={} [{}]",
            self.status, self.side, self.instrument,
            self.last_price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            self.last_quantity, self.client_order_id
        )
    }
}
