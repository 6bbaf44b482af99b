use crate::types::OrderStatus;
use thiserror::Error;

/// A single violated order-request rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("Quantity must be positive")]
    NonPositiveQuantity,

    #[error("Quantity must be a finite number")]
    NonFiniteQuantity,

    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("{0} order requires limit_price")]
    MissingLimitPrice(crate::types::OrderType),

    #[error("{0} order requires stop_price")]
    MissingStopPrice(crate::types::OrderType),

    #[error("{field} must be a positive finite price, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },
}

/// Reasons an accepted order could not be executed. Nothing is applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionRejection {
    #[error("Order is not pending: status is {0}")]
    OrderNotPending(OrderStatus),

    #[error("Insufficient buying power")]
    InsufficientBuyingPower { needed: f64, available: f64 },

    #[error("Short selling is disabled for this simulation")]
    ShortSellingDisabled,

    #[error("Position limit reached for {symbol}: max {max} per symbol")]
    PositionLimitPerSymbol { symbol: String, max: u32 },

    #[error("Position size {notional:.2} exceeds limit {limit:.2}")]
    PositionSizeExceeded { notional: f64, limit: f64 },

    #[error("Daily loss limit reached: {loss:.2} >= {limit:.2}")]
    DailyLossLimit { loss: f64, limit: f64 },

    #[error("Total loss limit reached: {loss:.2} >= {limit:.2}")]
    TotalLossLimit { loss: f64, limit: f64 },
}

/// A mutation that would produce an impossible ledger state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("Reference price must be positive and finite, got {0}")]
    InvalidReferencePrice(f64),

    #[error("Commission must not be negative, got {0}")]
    NegativeCommission(f64),

    #[error("Slippage must not be negative, got {0}")]
    NegativeSlippage(f64),

    #[error("Balance would become non-finite")]
    NonFiniteBalance,

    #[error("Initial balance must be positive and finite, got {0}")]
    InvalidInitialBalance(f64),
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid order: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error(transparent)]
    Rejected(#[from] ExecutionRejection),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("Simulation not found: {0}")]
    SimulationNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order cannot be cancelled: status is {0}")]
    CannotCancelOrder(OrderStatus),

    #[error("Simulation is paused: {0}")]
    SimulationPaused(String),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, EngineError>;
