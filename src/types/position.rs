//! Position Types

use super::order::OrderSide;
use serde::{Deserialize, Serialize};

/// Position side (long or short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Direction multiplier used for P&L (+1 long, -1 short).
    pub fn direction(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }

    /// Side of the position a fill on `side` opens.
    pub fn opened_by(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell => PositionSide::Short,
        }
    }

    /// Order side that adds to this position.
    pub fn increasing_side(&self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// What a fill did to the symbol's exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillEffect {
    Opened,
    Increased,
    Reduced,
    Closed,
    Reversed,
}

impl FillEffect {
    /// Whether the fill closed some existing exposure and so realized P&L.
    pub fn realizes_pnl(&self) -> bool {
        matches!(self, FillEffect::Reduced | FillEffect::Closed | FillEffect::Reversed)
    }
}

/// Net exposure in one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique position ID
    pub id: String,
    /// Symbol (e.g., "AAPL", "BTC")
    pub symbol: String,
    /// Long or short
    pub side: PositionSide,
    /// Absolute quantity held
    pub quantity: f64,
    /// Weighted-average cost of same-direction fills
    pub average_price: f64,
    /// |quantity| x last observed price
    pub market_value: f64,
    /// Mark-to-market P&L at the last observed price
    pub unrealized_pnl: f64,
    /// P&L locked in by reducing fills
    pub realized_pnl: f64,
    /// When position was opened (ms)
    pub opened_at: i64,
    /// When position was last updated (ms)
    pub updated_at: i64,
    /// When position was closed (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<i64>,
}

impl Position {
    /// Open a new position at `price`.
    pub fn open(symbol: String, side: PositionSide, quantity: f64, price: f64, at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol,
            side,
            quantity,
            average_price: price,
            market_value: quantity * price,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
            opened_at: at,
            updated_at: at,
            closed_at: None,
        }
    }

    /// Quantity with the side's sign applied.
    pub fn signed_quantity(&self) -> f64 {
        self.quantity * self.side.direction()
    }

    /// Re-mark the position at `last`.
    pub fn mark(&mut self, last: f64) {
        self.unrealized_pnl = (last - self.average_price) * self.quantity * self.side.direction();
        self.market_value = self.quantity.abs() * last;
    }
}
