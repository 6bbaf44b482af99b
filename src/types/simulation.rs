//! Simulation Types
//!
//! Settings, risk limits and the simulation aggregate that owns one portfolio.

use crate::config::EngineConfig;
use crate::services::accounting::Portfolio;
use serde::{Deserialize, Serialize};

/// Simulation lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Active,
    Paused,
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationStatus::Active => write!(f, "active"),
            SimulationStatus::Paused => write!(f, "paused"),
        }
    }
}

/// Absolute risk ceilings, in account currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskLimits {
    /// Largest notional a single position may reach
    pub max_position_size: f64,
    /// Largest loss tolerated within one UTC day
    pub max_daily_loss: f64,
    /// Largest total loss tolerated since the simulation started
    pub max_total_loss: f64,
}

impl RiskLimits {
    /// Derive limits as fractions of `initial_balance`.
    pub fn from_balance(initial_balance: f64, config: &EngineConfig) -> Self {
        Self {
            max_position_size: initial_balance * config.max_position_size_pct,
            max_daily_loss: initial_balance * config.max_daily_loss_pct,
            max_total_loss: initial_balance * config.max_total_loss_pct,
        }
    }
}

/// Execution and risk settings for a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSettings {
    /// Flat commission per execution
    pub commission_per_trade: f64,
    /// Commission as a fraction of reference notional (0.0005 = 0.05%)
    pub commission_percentage: f64,
    /// Adverse price adjustment as a fraction of reference price
    pub slippage_percentage: f64,
    /// Whether sells may open or grow a short position
    pub allow_short_selling: bool,
    /// Open positions allowed per symbol (0 disables new exposure)
    pub max_positions_per_symbol: u32,
    pub risk_limits: RiskLimits,
}

impl SimulationSettings {
    /// Default settings for a simulation funded with `initial_balance`.
    pub fn for_balance(initial_balance: f64, config: &EngineConfig) -> Self {
        Self {
            commission_per_trade: config.commission_per_trade,
            commission_percentage: config.commission_percentage,
            slippage_percentage: config.slippage_percentage,
            allow_short_selling: config.allow_short_selling,
            max_positions_per_symbol: config.max_positions_per_symbol,
            risk_limits: RiskLimits::from_balance(initial_balance, config),
        }
    }
}

/// A named trading simulation. Owns exactly one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    /// Unique simulation ID
    pub id: String,
    /// Display name
    pub name: String,
    pub portfolio: Portfolio,
    pub settings: SimulationSettings,
    pub status: SimulationStatus,
    /// When the current run started (ms)
    pub start_date: i64,
}

impl Simulation {
    /// Create an active simulation with default settings.
    pub fn new(name: String, initial_balance: f64, config: &EngineConfig) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        Self {
            portfolio: Portfolio::new(id.clone(), initial_balance),
            id,
            name,
            settings: SimulationSettings::for_balance(initial_balance, config),
            status: SimulationStatus::Active,
            start_date: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SimulationStatus::Active
    }
}
