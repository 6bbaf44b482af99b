//! Portfolio Accounting
//!
//! Cash balance and aggregate P&L for one simulation. Every balance field is
//! private to this module: the only way to move cash is `apply_execution`,
//! which also appends the execution to the log, so the balance always equals
//! the initial balance plus the signed sum of logged executions.

use crate::error::InvariantViolation;
use crate::services::ledger::PositionBook;
use crate::types::{Execution, Order, QuoteBook};
use serde::{Deserialize, Serialize};

/// Cash, positions, orders and executions of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    id: String,
    initial_balance: f64,
    current_balance: f64,
    total_pnl: f64,
    realized_pnl: f64,
    unrealized_pnl: f64,
    #[serde(default)]
    positions: PositionBook,
    #[serde(default)]
    orders: Vec<Order>,
    #[serde(default)]
    executions: Vec<Execution>,
}

impl Portfolio {
    /// Create an empty portfolio funded with `initial_balance`.
    pub fn new(id: String, initial_balance: f64) -> Self {
        Self {
            id,
            initial_balance,
            current_balance: initial_balance,
            total_pnl: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            positions: PositionBook::new(),
            orders: Vec::new(),
            executions: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Cash available to trade.
    pub fn current_balance(&self) -> f64 {
        self.current_balance
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    /// Realized plus unrealized P&L.
    pub fn total_pnl(&self) -> f64 {
        self.total_pnl
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Append-only execution log.
    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    /// Pending orders in submission order.
    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_pending())
    }

    /// Apply an execution's cash effect and append it to the log.
    ///
    /// Buys debit cost plus commission, sells credit proceeds minus
    /// commission. Returns the new balance.
    pub fn apply_execution(&mut self, execution: &Execution) -> Result<f64, InvariantViolation> {
        if execution.commission < 0.0 {
            return Err(InvariantViolation::NegativeCommission(execution.commission));
        }

        let balance = self.current_balance + execution.cash_delta();
        if !balance.is_finite() {
            return Err(InvariantViolation::NonFiniteBalance);
        }

        self.current_balance = balance;
        self.executions.push(execution.clone());
        Ok(balance)
    }

    /// Add a realized P&L delta.
    pub fn apply_realized_pnl(&mut self, delta: f64) {
        self.realized_pnl += delta;
        self.recalculate();
    }

    /// Re-mark every open position that has a quote and re-sum unrealized P&L.
    ///
    /// Positions without a quote keep their previous mark.
    pub fn recompute_unrealized(&mut self, quotes: &QuoteBook) {
        for position in self.positions.iter_mut() {
            if let Some(quote) = quotes.get(&position.symbol) {
                position.mark(quote.last);
            }
        }
        self.recalculate();
    }

    /// Re-mark a single symbol at `last`.
    pub(crate) fn mark_symbol(&mut self, symbol: &str, last: f64) {
        if let Some(position) = self.positions.iter_mut().find(|p| p.symbol == symbol) {
            position.mark(last);
        }
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.unrealized_pnl = self.positions.iter().map(|p| p.unrealized_pnl).sum();
        self.total_pnl = self.realized_pnl + self.unrealized_pnl;
    }

    pub(crate) fn positions_mut(&mut self) -> &mut PositionBook {
        &mut self.positions
    }

    pub(crate) fn push_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub(crate) fn order_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == order_id)
    }

    /// Return to the initial balance with empty positions, orders and executions.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.id), self.initial_balance);
    }
}
