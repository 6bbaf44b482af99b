//! Haunt Paper - deterministic paper-trading ledger engine
//!
//! Orders are validated, priced against observed quotes with slippage and
//! commission, risk-checked, and applied to a per-symbol position ledger and
//! a cash account. Everything lives in memory inside a [`SimulationStore`].

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{EngineError, ExecutionRejection, InvariantViolation, Result, ValidationIssue};
pub use services::{PerformanceMetrics, Portfolio, SimulationStore, WinRateMethod};
pub use types::*;
