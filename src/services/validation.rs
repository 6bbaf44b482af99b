//! Order Validation
//!
//! Structural and business-rule checks on an incoming order request. Buying
//! power is not checked here: a market order has no price until execution.

use crate::error::{EngineError, ValidationIssue};
use crate::types::{OrderKind, OrderRequest, OrderType};
use serde::Serialize;

/// Result of validating an order request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    #[serde(serialize_with = "serialize_issues")]
    pub errors: Vec<ValidationIssue>,
}

fn serialize_issues<S: serde::Serializer>(
    issues: &[ValidationIssue],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(issues.iter().map(|i| i.to_string()))
}

impl Validation {
    /// Convert into a `Result`, carrying every issue on failure.
    pub fn into_result(self) -> Result<(), EngineError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(EngineError::Validation(self.errors))
        }
    }
}

/// Validate an order request, reporting every violated rule.
pub fn validate(request: &OrderRequest) -> Validation {
    let mut errors = Vec::new();

    if !request.quantity.is_finite() {
        errors.push(ValidationIssue::NonFiniteQuantity);
    } else if request.quantity <= 0.0 {
        errors.push(ValidationIssue::NonPositiveQuantity);
    }

    if request.symbol.trim().is_empty() {
        errors.push(ValidationIssue::EmptySymbol);
    }

    // Stop orders may carry their trigger in limit_price
    let trigger = match request.order_type {
        OrderType::Stop => request.stop_price.or(request.limit_price),
        _ => request.stop_price,
    };

    match request.order_type {
        OrderType::Market => {}
        OrderType::Limit => {
            if request.limit_price.is_none() {
                errors.push(ValidationIssue::MissingLimitPrice(request.order_type));
            }
        }
        OrderType::Stop => {
            if trigger.is_none() {
                errors.push(ValidationIssue::MissingStopPrice(request.order_type));
            }
        }
        OrderType::StopLimit => {
            if request.stop_price.is_none() {
                errors.push(ValidationIssue::MissingStopPrice(request.order_type));
            }
            if request.limit_price.is_none() {
                errors.push(ValidationIssue::MissingLimitPrice(request.order_type));
            }
        }
    }

    for (field, value) in [("limit_price", request.limit_price), ("stop_price", request.stop_price)] {
        if let Some(value) = value {
            if !value.is_finite() || value <= 0.0 {
                errors.push(ValidationIssue::InvalidPrice { field, value });
            }
        }
    }

    Validation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validate a request and build its typed order kind.
pub fn into_order_kind(request: &OrderRequest) -> Result<OrderKind, EngineError> {
    validate(request).into_result()?;

    // Presence of each price was checked above
    let order_type = request.order_type;
    let missing = |issue: fn(OrderType) -> ValidationIssue| EngineError::Validation(vec![issue(order_type)]);
    let limit_price = || {
        request
            .limit_price
            .ok_or_else(|| missing(ValidationIssue::MissingLimitPrice))
    };
    let stop_price = || {
        request
            .stop_price
            .ok_or_else(|| missing(ValidationIssue::MissingStopPrice))
    };

    let kind = match order_type {
        OrderType::Market => OrderKind::Market,
        OrderType::Limit => OrderKind::Limit {
            limit_price: limit_price()?,
        },
        OrderType::Stop => OrderKind::Stop {
            stop_price: request
                .stop_price
                .or(request.limit_price)
                .ok_or_else(|| missing(ValidationIssue::MissingStopPrice))?,
        },
        OrderType::StopLimit => OrderKind::StopLimit {
            stop_price: stop_price()?,
            limit_price: limit_price()?,
            triggered: false,
        },
    };

    Ok(kind)
}
