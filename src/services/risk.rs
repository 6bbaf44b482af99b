//! Risk Checks
//!
//! Pre-trade checks of a priced fill against the simulation's settings.
//! Only fills that add exposure are checked; reducing or closing a position
//! is always allowed so a trader can get out of a breached limit.

use crate::error::ExecutionRejection;
use crate::services::accounting::Portfolio;
use crate::services::execution::FillQuote;
use crate::services::ledger::is_flat;
use crate::types::{OrderSide, PositionSide, SimulationSettings};
use chrono::{DateTime, NaiveDate};

/// Exposure a fill would leave behind, when it adds any.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResultingExposure {
    side: PositionSide,
    quantity: f64,
}

fn resulting_exposure(
    portfolio: &Portfolio,
    symbol: &str,
    side: OrderSide,
    quantity: f64,
) -> Option<ResultingExposure> {
    match portfolio.positions().get(symbol) {
        None => Some(ResultingExposure {
            side: PositionSide::opened_by(side),
            quantity,
        }),
        Some(existing) if existing.side.increasing_side() == side => Some(ResultingExposure {
            side: existing.side,
            quantity: existing.quantity + quantity,
        }),
        Some(existing) if !is_flat(quantity - existing.quantity, existing.quantity) => {
            Some(ResultingExposure {
                side: PositionSide::opened_by(side),
                quantity: quantity - existing.quantity,
            })
        }
        Some(_) => None,
    }
}

fn utc_date(timestamp_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|dt| dt.date_naive())
}

/// P&L since midnight UTC: today's realized net of commission plus open marks.
pub fn daily_pnl(portfolio: &Portfolio, now_ms: i64) -> f64 {
    let today = utc_date(now_ms);
    let realized_today: f64 = portfolio
        .executions()
        .iter()
        .filter(|e| utc_date(e.timestamp) == today)
        .map(|e| e.realized_pnl - e.commission - e.fees)
        .sum();
    realized_today + portfolio.unrealized_pnl()
}

/// Check a priced fill against the simulation's risk settings.
pub fn check_fill(
    settings: &SimulationSettings,
    portfolio: &Portfolio,
    symbol: &str,
    side: OrderSide,
    quantity: f64,
    fill: &FillQuote,
    now_ms: i64,
) -> Result<(), ExecutionRejection> {
    let Some(exposure) = resulting_exposure(portfolio, symbol, side, quantity) else {
        return Ok(());
    };

    if exposure.side == PositionSide::Short && !settings.allow_short_selling {
        return Err(ExecutionRejection::ShortSellingDisabled);
    }

    if settings.max_positions_per_symbol == 0 {
        return Err(ExecutionRejection::PositionLimitPerSymbol {
            symbol: symbol.to_string(),
            max: settings.max_positions_per_symbol,
        });
    }

    let limits = &settings.risk_limits;

    let notional = exposure.quantity * fill.adjusted_price;
    if notional > limits.max_position_size {
        return Err(ExecutionRejection::PositionSizeExceeded {
            notional,
            limit: limits.max_position_size,
        });
    }

    let total_loss = -portfolio.total_pnl();
    if total_loss > 0.0 && total_loss >= limits.max_total_loss {
        return Err(ExecutionRejection::TotalLossLimit {
            loss: total_loss,
            limit: limits.max_total_loss,
        });
    }

    let daily_loss = -daily_pnl(portfolio, now_ms);
    if daily_loss > 0.0 && daily_loss >= limits.max_daily_loss {
        return Err(ExecutionRejection::DailyLossLimit {
            loss: daily_loss,
            limit: limits.max_daily_loss,
        });
    }

    Ok(())
}
