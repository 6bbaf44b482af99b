//! Performance Analyzer
//!
//! Read-only metrics over a portfolio and the latest quotes. Nothing here
//! mutates state, so repeated calls against unchanged input are identical.

use crate::services::accounting::Portfolio;
use crate::types::{OrderSide, QuoteBook};
use serde::{Deserialize, Serialize};

/// How winning trades are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRateMethod {
    /// Every sell execution is a win, over all executions.
    /// Undercounts short-side wins.
    #[default]
    SellHeuristic,
    /// Closing executions with positive realized P&L, over all closing executions.
    RealizedPnl,
}

impl WinRateMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sell_heuristic" | "sell" => Some(WinRateMethod::SellHeuristic),
            "realized_pnl" | "realized" => Some(WinRateMethod::RealizedPnl),
            _ => None,
        }
    }
}

/// Portfolio performance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Cash plus |quantity| x last over open positions
    pub portfolio_value: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub win_rate: f64,
    pub total_commission: f64,
    pub open_positions: u32,
    /// Sum of |quantity| x last
    pub gross_exposure: f64,
    /// Long market value minus short market value
    pub net_exposure: f64,
    /// Gross exposure as a percentage of portfolio value
    pub exposure_percent: f64,
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole != 0.0 && whole.is_finite() {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Compute performance metrics for `portfolio` at `quotes`.
///
/// A position without a quote is valued at its average price.
pub fn analyze(portfolio: &Portfolio, quotes: &QuoteBook, method: WinRateMethod) -> PerformanceMetrics {
    let mut gross_exposure = 0.0;
    let mut net_exposure = 0.0;
    for position in portfolio.positions().iter() {
        let last = quotes
            .get(&position.symbol)
            .map(|q| q.last)
            .unwrap_or(position.average_price);
        let value = position.quantity.abs() * last;
        gross_exposure += value;
        net_exposure += value * position.side.direction();
    }

    let portfolio_value = portfolio.current_balance() + gross_exposure;
    let total_return = portfolio_value - portfolio.initial_balance();

    let executions = portfolio.executions();
    let (total_trades, winning_trades) = match method {
        WinRateMethod::SellHeuristic => (
            executions.len() as u64,
            executions.iter().filter(|e| e.side == OrderSide::Sell).count() as u64,
        ),
        WinRateMethod::RealizedPnl => {
            let closing: Vec<_> = executions
                .iter()
                .filter(|e| e.effect.is_some_and(|fx| fx.realizes_pnl()))
                .collect();
            (
                closing.len() as u64,
                closing.iter().filter(|e| e.realized_pnl > 0.0).count() as u64,
            )
        }
    };

    PerformanceMetrics {
        portfolio_value,
        total_return,
        total_return_percent: percent(total_return, portfolio.initial_balance()),
        realized_pnl: portfolio.realized_pnl(),
        unrealized_pnl: portfolio.unrealized_pnl(),
        total_trades,
        winning_trades,
        win_rate: percent(winning_trades as f64, total_trades as f64),
        total_commission: executions.iter().map(|e| e.commission).sum(),
        open_positions: portfolio.positions().len() as u32,
        gross_exposure,
        net_exposure,
        exposure_percent: percent(gross_exposure, portfolio_value),
    }
}
