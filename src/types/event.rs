//! Engine Events
//!
//! Change notifications published by the simulation store.

use super::order::{Execution, Order, OrderStatus};
use super::position::{FillEffect, Position};
use serde::{Deserialize, Serialize};

/// Type of order update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderUpdateType {
    Created,
    Filled,
    Cancelled,
    Rejected,
}

impl From<OrderStatus> for OrderUpdateType {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => OrderUpdateType::Created,
            OrderStatus::Filled => OrderUpdateType::Filled,
            OrderStatus::Cancelled => OrderUpdateType::Cancelled,
            OrderStatus::Rejected => OrderUpdateType::Rejected,
        }
    }
}

/// Order update payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdateData {
    pub simulation_id: String,
    /// The order after the update
    pub order: Order,
    pub update_type: OrderUpdateType,
    /// Rejection reason, when rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: i64,
}

/// Execution payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionData {
    pub simulation_id: String,
    pub execution: Execution,
    /// Cash balance after the execution was applied
    pub balance: f64,
    pub timestamp: i64,
}

/// Position update payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateData {
    pub simulation_id: String,
    /// Open position after the fill, or the removed copy when closed
    pub position: Position,
    pub update_type: FillEffect,
    pub timestamp: i64,
}

/// Type of simulation lifecycle update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationUpdateType {
    Created,
    Started,
    Paused,
    Reset,
    Loaded,
    SettingsChanged,
    Removed,
}

/// Simulation lifecycle payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationUpdateData {
    pub simulation_id: String,
    pub update_type: SimulationUpdateType,
    pub timestamp: i64,
}

/// Event published on the store's broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    OrderUpdate { data: OrderUpdateData },
    Execution { data: ExecutionData },
    PositionUpdate { data: PositionUpdateData },
    SimulationUpdate { data: SimulationUpdateData },
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl EngineEvent {
    pub fn order(order: &Order, update_type: OrderUpdateType, reason: Option<String>) -> Self {
        EngineEvent::OrderUpdate {
            data: OrderUpdateData {
                simulation_id: order.simulation_id.clone(),
                order: order.clone(),
                update_type,
                reason,
                timestamp: now_ms(),
            },
        }
    }

    pub fn execution(execution: &Execution, balance: f64) -> Self {
        EngineEvent::Execution {
            data: ExecutionData {
                simulation_id: execution.simulation_id.clone(),
                execution: execution.clone(),
                balance,
                timestamp: now_ms(),
            },
        }
    }

    pub fn position(simulation_id: &str, position: &Position, effect: FillEffect) -> Self {
        EngineEvent::PositionUpdate {
            data: PositionUpdateData {
                simulation_id: simulation_id.to_string(),
                position: position.clone(),
                update_type: effect,
                timestamp: now_ms(),
            },
        }
    }

    pub fn simulation(simulation_id: &str, update_type: SimulationUpdateType) -> Self {
        EngineEvent::SimulationUpdate {
            data: SimulationUpdateData {
                simulation_id: simulation_id.to_string(),
                update_type,
                timestamp: now_ms(),
            },
        }
    }

    /// Simulation the event belongs to.
    pub fn simulation_id(&self) -> &str {
        match self {
            EngineEvent::OrderUpdate { data } => &data.simulation_id,
            EngineEvent::Execution { data } => &data.simulation_id,
            EngineEvent::PositionUpdate { data } => &data.simulation_id,
            EngineEvent::SimulationUpdate { data } => &data.simulation_id,
        }
    }
}
