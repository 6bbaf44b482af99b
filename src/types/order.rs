//! Order Types
//!
//! Order requests, typed orders and the execution records they produce.

use super::position::FillEffect;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Order type as it arrives on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute at the next observed price
    Market,
    /// Execute at the limit price or better
    Limit,
    /// Becomes a market order once the stop price is touched
    Stop,
    /// Becomes a limit order once the stop price is touched
    StopLimit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
            OrderType::Stop => write!(f, "stop"),
            OrderType::StopLimit => write!(f, "stop_limit"),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted and waiting for a price
    Pending,
    /// Executed in full
    Filled,
    /// Cancelled by the caller
    Cancelled,
    /// Refused at execution time (insufficient buying power)
    Rejected,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Typed order kind. Each variant carries exactly the prices it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderKind {
    Market,
    #[serde(rename_all = "camelCase")]
    Limit { limit_price: f64 },
    #[serde(rename_all = "camelCase")]
    Stop { stop_price: f64 },
    #[serde(rename_all = "camelCase")]
    StopLimit {
        stop_price: f64,
        limit_price: f64,
        /// Set once the stop price has been touched
        #[serde(default)]
        triggered: bool,
    },
}

impl OrderKind {
    /// The untyped order type for this kind.
    pub fn order_type(&self) -> OrderType {
        match self {
            OrderKind::Market => OrderType::Market,
            OrderKind::Limit { .. } => OrderType::Limit,
            OrderKind::Stop { .. } => OrderType::Stop,
            OrderKind::StopLimit { .. } => OrderType::StopLimit,
        }
    }

    /// Limit price, if this kind has one.
    pub fn limit_price(&self) -> Option<f64> {
        match self {
            OrderKind::Limit { limit_price } | OrderKind::StopLimit { limit_price, .. } => {
                Some(*limit_price)
            }
            _ => None,
        }
    }

    /// Stop price, if this kind has one.
    pub fn stop_price(&self) -> Option<f64> {
        match self {
            OrderKind::Stop { stop_price } | OrderKind::StopLimit { stop_price, .. } => {
                Some(*stop_price)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Inbound order request, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
}

impl OrderRequest {
    /// Market order request.
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
        }
    }

    /// Limit order request.
    pub fn limit(symbol: impl Into<String>, side: OrderSide, quantity: f64, limit_price: f64) -> Self {
        Self {
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            ..Self::market(symbol, side, quantity)
        }
    }

    /// Stop order request.
    pub fn stop(symbol: impl Into<String>, side: OrderSide, quantity: f64, stop_price: f64) -> Self {
        Self {
            order_type: OrderType::Stop,
            stop_price: Some(stop_price),
            ..Self::market(symbol, side, quantity)
        }
    }

    /// Stop-limit order request.
    pub fn stop_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        stop_price: f64,
        limit_price: f64,
    ) -> Self {
        Self {
            order_type: OrderType::StopLimit,
            stop_price: Some(stop_price),
            limit_price: Some(limit_price),
            ..Self::market(symbol, side, quantity)
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A validated order owned by a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID
    pub id: String,
    /// Simulation this order belongs to
    pub simulation_id: String,
    /// Symbol being traded (e.g., "AAPL", "BTC")
    pub symbol: String,
    /// Buy or sell
    pub side: OrderSide,
    /// Typed order kind with its prices
    pub kind: OrderKind,
    /// Quantity to fill, always positive
    pub quantity: f64,
    /// Current order status
    pub status: OrderStatus,
    /// When order was created (ms)
    pub created_at: i64,
    /// When order was last updated (ms)
    pub updated_at: i64,
}

impl Order {
    /// Create a new pending order.
    pub fn new(
        simulation_id: String,
        symbol: String,
        side: OrderSide,
        kind: OrderKind,
        quantity: f64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            simulation_id,
            symbol,
            side,
            kind,
            quantity,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Untyped order type.
    pub fn order_type(&self) -> OrderType {
        self.kind.order_type()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Move the order to a new status, stamping `updated_at`.
    pub fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }

    /// Check whether an observed price triggers this order.
    ///
    /// Stop-limit orders latch their `triggered` flag the first time the stop
    /// is touched and then behave as limit orders.
    pub fn should_trigger(&mut self, price: f64) -> bool {
        if !self.is_pending() {
            return false;
        }

        let side = self.side;
        let limit_hit = |limit: f64| match side {
            OrderSide::Buy => price <= limit,
            OrderSide::Sell => price >= limit,
        };
        let stop_hit = |stop: f64| match side {
            OrderSide::Buy => price >= stop,
            OrderSide::Sell => price <= stop,
        };

        match &mut self.kind {
            OrderKind::Market => true,
            OrderKind::Limit { limit_price } => limit_hit(*limit_price),
            OrderKind::Stop { stop_price } => stop_hit(*stop_price),
            OrderKind::StopLimit {
                stop_price,
                limit_price,
                triggered,
            } => {
                if !*triggered && stop_hit(*stop_price) {
                    *triggered = true;
                }
                *triggered && limit_hit(*limit_price)
            }
        }
    }
}

// =============================================================================
// Executions
// =============================================================================

/// A completed fill against an order. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Unique execution ID
    pub id: String,
    /// Order that generated this execution
    pub order_id: String,
    /// Simulation this execution belongs to
    pub simulation_id: String,
    /// Symbol traded
    pub symbol: String,
    /// Buy or sell
    pub side: OrderSide,
    /// Quantity traded
    pub quantity: f64,
    /// Execution price after slippage
    pub price: f64,
    /// Observed price the fill was priced against
    pub reference_price: f64,
    /// Per-unit slippage applied against the trader
    pub slippage: f64,
    /// Commission charged
    pub commission: f64,
    /// Venue fees (the simulated venue charges none)
    pub fees: f64,
    /// Realized P&L produced by this fill
    #[serde(default)]
    pub realized_pnl: f64,
    /// Effect on the symbol's position, once applied to the ledger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<FillEffect>,
    /// When the execution happened (ms)
    pub timestamp: i64,
}

impl Execution {
    /// Notional value at the execution price.
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Signed cash effect: -(cost + commission) for buys, proceeds - commission for sells.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -(self.notional() + self.commission + self.fees),
            OrderSide::Sell => self.notional() - self.commission - self.fees,
        }
    }
}
