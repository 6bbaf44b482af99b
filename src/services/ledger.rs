//! Position Ledger
//!
//! Net exposure per symbol with weighted-average cost. Reducing fills
//! realize P&L against the average price and never move it; a fill larger
//! than the open exposure closes it and opens the remainder the other way.

use crate::types::{FillEffect, OrderSide, Position, PositionSide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Relative size below which a leftover quantity counts as flat.
const FLAT_TOLERANCE: f64 = 1e-9;

/// True when `quantity` is float noise relative to a `held` quantity.
pub(crate) fn is_flat(quantity: f64, held: f64) -> bool {
    quantity <= held * FLAT_TOLERANCE
}

/// Result of applying one fill.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerUpdate {
    /// Open position after the fill, if any
    pub position: Option<Position>,
    /// Position removed by the fill, stamped with `closed_at`
    pub closed: Option<Position>,
    pub realized_pnl_delta: f64,
    pub effect: FillEffect,
}

/// Open positions keyed by symbol. At most one per symbol.
///
/// Serializes as a plain array of positions ordered by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Position>", into = "Vec<Position>")]
pub struct PositionBook {
    positions: BTreeMap<String, Position>,
}

impl From<Vec<Position>> for PositionBook {
    fn from(positions: Vec<Position>) -> Self {
        Self {
            positions: positions
                .into_iter()
                .map(|p| (p.symbol.clone(), p))
                .collect(),
        }
    }
}

impl From<PositionBook> for Vec<Position> {
    fn from(book: PositionBook) -> Self {
        book.positions.into_values().collect()
    }
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Position> {
        self.positions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Signed net quantity in `symbol` (0 when flat).
    pub fn net_quantity(&self, symbol: &str) -> f64 {
        self.get(symbol).map(Position::signed_quantity).unwrap_or(0.0)
    }

    /// Apply a fill of `quantity` at `price` to `symbol`.
    pub fn apply_fill(
        &mut self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
        price: f64,
        at: i64,
    ) -> LedgerUpdate {
        let Some(mut existing) = self.positions.remove(symbol) else {
            let position = Position::open(
                symbol.to_string(),
                PositionSide::opened_by(side),
                quantity,
                price,
                at,
            );
            debug!("Opened {} {} {} @ {}", position.side, quantity, symbol, price);
            self.positions.insert(symbol.to_string(), position.clone());
            return LedgerUpdate {
                position: Some(position),
                closed: None,
                realized_pnl_delta: 0.0,
                effect: FillEffect::Opened,
            };
        };

        if existing.side.increasing_side() == side {
            // Same direction: average in
            let total_qty = existing.quantity + quantity;
            existing.average_price =
                (existing.average_price * existing.quantity + price * quantity) / total_qty;
            existing.quantity = total_qty;
            existing.updated_at = at;
            debug!("Increased {} to {} @ avg {}", symbol, total_qty, existing.average_price);

            self.positions.insert(symbol.to_string(), existing.clone());
            return LedgerUpdate {
                position: Some(existing),
                closed: None,
                realized_pnl_delta: 0.0,
                effect: FillEffect::Increased,
            };
        }

        // Opposite direction: realize on the overlap
        let closed_qty = quantity.min(existing.quantity);
        let realized = (price - existing.average_price) * closed_qty * existing.side.direction();
        existing.realized_pnl += realized;
        existing.updated_at = at;

        if !is_flat(existing.quantity - quantity, existing.quantity) {
            existing.quantity -= closed_qty;
            debug!("Reduced {} to {} realizing {}", symbol, existing.quantity, realized);

            self.positions.insert(symbol.to_string(), existing.clone());
            return LedgerUpdate {
                position: Some(existing),
                closed: None,
                realized_pnl_delta: realized,
                effect: FillEffect::Reduced,
            };
        }

        let remainder = quantity - existing.quantity;
        let held = existing.quantity;
        existing.quantity = 0.0;
        existing.unrealized_pnl = 0.0;
        existing.market_value = 0.0;
        existing.closed_at = Some(at);
        debug!("Closed {} realizing {}", symbol, realized);

        if !is_flat(remainder, held) {
            let reversed = Position::open(
                symbol.to_string(),
                PositionSide::opened_by(side),
                remainder,
                price,
                at,
            );
            debug!("Reversed {} into {} {}", symbol, reversed.side, remainder);
            self.positions.insert(symbol.to_string(), reversed.clone());
            return LedgerUpdate {
                position: Some(reversed),
                closed: Some(existing),
                realized_pnl_delta: realized,
                effect: FillEffect::Reversed,
            };
        }

        LedgerUpdate {
            position: None,
            closed: Some(existing),
            realized_pnl_delta: realized,
            effect: FillEffect::Closed,
        }
    }
}
