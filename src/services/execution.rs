//! Execution Model
//!
//! Prices an accepted order against a reference price: deterministic
//! slippage against the trader, flat plus percentage commission, and an
//! all-or-nothing buying-power check for buys.

use crate::error::{EngineError, ExecutionRejection, InvariantViolation};
use crate::services::accounting::Portfolio;
use crate::types::{Execution, Order, OrderSide, OrderStatus, SimulationSettings};
use serde::{Deserialize, Serialize};

/// Price, commission and cash effect of a prospective fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillQuote {
    /// Reference price adjusted by slippage
    pub adjusted_price: f64,
    /// Per-unit slippage
    pub slippage: f64,
    pub commission: f64,
    /// adjusted_price x quantity
    pub notional: f64,
    /// Buy: notional + commission. Sell: notional - commission.
    pub net_amount: f64,
}

impl FillQuote {
    /// Pricing of an execution that already happened.
    pub fn of(execution: &Execution) -> Self {
        let notional = execution.notional();
        let net_amount = match execution.side {
            OrderSide::Buy => notional + execution.commission,
            OrderSide::Sell => notional - execution.commission,
        };
        Self {
            adjusted_price: execution.price,
            slippage: execution.slippage,
            commission: execution.commission,
            notional,
            net_amount,
        }
    }
}

/// Price a fill of `quantity` on `side` at `reference_price`.
pub fn quote_fill(
    side: OrderSide,
    quantity: f64,
    reference_price: f64,
    settings: &SimulationSettings,
) -> Result<FillQuote, InvariantViolation> {
    if !reference_price.is_finite() || reference_price <= 0.0 {
        return Err(InvariantViolation::InvalidReferencePrice(reference_price));
    }

    let commission = settings.commission_per_trade
        + reference_price * quantity * settings.commission_percentage;
    if !commission.is_finite() || commission < 0.0 {
        return Err(InvariantViolation::NegativeCommission(commission));
    }

    let slippage = reference_price * settings.slippage_percentage;
    if !slippage.is_finite() || slippage < 0.0 {
        return Err(InvariantViolation::NegativeSlippage(slippage));
    }

    let adjusted_price = match side {
        OrderSide::Buy => reference_price + slippage,
        OrderSide::Sell => reference_price - slippage,
    };
    if adjusted_price <= 0.0 {
        return Err(InvariantViolation::InvalidReferencePrice(adjusted_price));
    }

    let notional = adjusted_price * quantity;
    let net_amount = match side {
        OrderSide::Buy => notional + commission,
        OrderSide::Sell => notional - commission,
    };

    Ok(FillQuote {
        adjusted_price,
        slippage,
        commission,
        notional,
        net_amount,
    })
}

/// Outcome of an execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub order_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Execution>,
    pub message: String,
    pub executed_quantity: f64,
    pub remaining_quantity: f64,
}

impl ExecutionReport {
    /// Report for an attempt that applied nothing.
    pub fn rejected(order: &Order, error: &EngineError) -> Self {
        Self {
            order_id: order.id.clone(),
            success: false,
            execution: None,
            message: error.to_string(),
            executed_quantity: 0.0,
            remaining_quantity: order.quantity,
        }
    }
}

/// Execute `order` in full at `reference_price`.
///
/// On success the order is marked filled and the returned execution carries
/// the slippage-adjusted price. The portfolio is only read; applying the
/// execution to cash and positions is the caller's job. On failure the order
/// is left untouched.
pub fn execute(
    order: &mut Order,
    reference_price: f64,
    settings: &SimulationSettings,
    portfolio: &Portfolio,
) -> Result<ExecutionReport, EngineError> {
    if order.status != OrderStatus::Pending {
        return Err(ExecutionRejection::OrderNotPending(order.status).into());
    }

    let fill = quote_fill(order.side, order.quantity, reference_price, settings)?;

    if order.side == OrderSide::Buy && fill.net_amount > portfolio.current_balance() {
        return Err(ExecutionRejection::InsufficientBuyingPower {
            needed: fill.net_amount,
            available: portfolio.current_balance(),
        }
        .into());
    }

    let execution = Execution {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        simulation_id: order.simulation_id.clone(),
        symbol: order.symbol.clone(),
        side: order.side,
        quantity: order.quantity,
        price: fill.adjusted_price,
        reference_price,
        slippage: fill.slippage,
        commission: fill.commission,
        fees: 0.0,
        realized_pnl: 0.0,
        effect: None,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };

    order.transition(OrderStatus::Filled);

    Ok(ExecutionReport {
        order_id: order.id.clone(),
        success: true,
        message: format!(
            "Filled {} {} {} at {:.4}",
            order.side, execution.quantity, order.symbol, execution.price
        ),
        execution: Some(execution),
        executed_quantity: order.quantity,
        remaining_quantity: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::OrderKind;
    use approx::assert_relative_eq;

    fn settings() -> SimulationSettings {
        SimulationSettings::for_balance(100_000.0, &EngineConfig::default())
    }

    fn order(side: OrderSide, quantity: f64) -> Order {
        Order::new(
            "sim".to_string(),
            "AAPL".to_string(),
            side,
            OrderKind::Market,
            quantity,
        )
    }

    #[test]
    fn test_buy_quote_matches_worked_example() {
        let fill = quote_fill(OrderSide::Buy, 10.0, 150.0, &settings()).unwrap();
        assert_relative_eq!(fill.commission, 1.74, epsilon = 1e-9);
        assert_relative_eq!(fill.adjusted_price, 150.15, epsilon = 1e-9);
        assert_relative_eq!(fill.net_amount, 1503.24, epsilon = 1e-9);
    }

    #[test]
    fn test_sell_quote_matches_worked_example() {
        let fill = quote_fill(OrderSide::Sell, 10.0, 160.0, &settings()).unwrap();
        assert_relative_eq!(fill.commission, 1.79, epsilon = 1e-9);
        assert_relative_eq!(fill.adjusted_price, 159.84, epsilon = 1e-9);
        assert_relative_eq!(fill.net_amount, 1596.61, epsilon = 1e-9);
    }

    #[test]
    fn test_slippage_always_against_trader() {
        let buy = quote_fill(OrderSide::Buy, 1.0, 100.0, &settings()).unwrap();
        let sell = quote_fill(OrderSide::Sell, 1.0, 100.0, &settings()).unwrap();
        assert!(buy.adjusted_price > 100.0);
        assert!(sell.adjusted_price < 100.0);
        assert_eq!(buy.slippage, sell.slippage);
    }

    #[test]
    fn test_execute_marks_order_filled() {
        let portfolio = Portfolio::new("sim".to_string(), 100_000.0);
        let mut o = order(OrderSide::Buy, 10.0);

        let report = execute(&mut o, 150.0, &settings(), &portfolio).unwrap();
        assert!(report.success);
        assert_eq!(report.executed_quantity, 10.0);
        assert_eq!(report.remaining_quantity, 0.0);
        assert_eq!(o.status, OrderStatus::Filled);

        let exec = report.execution.unwrap();
        assert_eq!(exec.order_id, o.id);
        assert_eq!(
            FillQuote::of(&exec),
            quote_fill(OrderSide::Buy, 10.0, 150.0, &settings()).unwrap()
        );
        assert_relative_eq!(exec.price, 150.15, epsilon = 1e-9);
        assert_eq!(exec.fees, 0.0);
    }

    #[test]
    fn test_execute_rejects_non_pending() {
        let portfolio = Portfolio::new("sim".to_string(), 100_000.0);
        let mut o = order(OrderSide::Buy, 1.0);
        o.transition(OrderStatus::Filled);

        let err = execute(&mut o, 150.0, &settings(), &portfolio).unwrap_err();
        assert_eq!(
            err,
            EngineError::Rejected(ExecutionRejection::OrderNotPending(OrderStatus::Filled))
        );
    }

    #[test]
    fn test_insufficient_buying_power_is_all_or_nothing() {
        let portfolio = Portfolio::new("sim".to_string(), 1_000.0);
        let mut o = order(OrderSide::Buy, 10.0);

        let err = execute(&mut o, 150.0, &settings(), &portfolio).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient buying power");
        assert_eq!(o.status, OrderStatus::Pending);

        let report = ExecutionReport::rejected(&o, &err);
        assert!(!report.success);
        assert_eq!(report.executed_quantity, 0.0);
        assert_eq!(report.remaining_quantity, 10.0);
    }

    #[test]
    fn test_sells_skip_buying_power_check() {
        let portfolio = Portfolio::new("sim".to_string(), 1.0);
        let mut o = order(OrderSide::Sell, 10.0);
        assert!(execute(&mut o, 150.0, &settings(), &portfolio).is_ok());
    }

    #[test]
    fn test_negative_commission_is_invariant_violation() {
        let mut s = settings();
        s.commission_per_trade = -5.0;
        let err = quote_fill(OrderSide::Buy, 1.0, 100.0, &s).unwrap_err();
        assert!(matches!(err, InvariantViolation::NegativeCommission(_)));
    }

    #[test]
    fn test_invalid_reference_price() {
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(quote_fill(OrderSide::Buy, 1.0, price, &settings()).is_err());
        }
    }
}
