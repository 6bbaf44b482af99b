//! Store Commands
//!
//! The closed set of operations accepted by `SimulationStore::dispatch`,
//! and what each one returns.

use super::order::{Order, OrderRequest};
use super::quote::Quote;
use super::simulation::{Simulation, SimulationSettings};
use crate::services::analyzer::PerformanceMetrics;
use crate::services::execution::ExecutionReport;
use crate::services::validation::Validation;
use serde::{Deserialize, Serialize};

/// A command addressed to the simulation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    Create {
        name: String,
        #[serde(default)]
        initial_balance: Option<f64>,
    },
    Start { id: String },
    Pause { id: String },
    Reset { id: String },
    /// Replace the simulation with the same id wholesale
    Load { simulation: Box<Simulation> },
    Remove { id: String },
    UpdateSettings { id: String, settings: SimulationSettings },
    /// Validate a request without recording it
    Validate { request: OrderRequest },
    Submit { id: String, request: OrderRequest },
    #[serde(rename_all = "camelCase")]
    Cancel { id: String, order_id: String },
    #[serde(rename_all = "camelCase")]
    Execute {
        id: String,
        order_id: String,
        reference_price: f64,
    },
    #[serde(rename_all = "camelCase")]
    PlaceAndFill {
        id: String,
        request: OrderRequest,
        reference_price: f64,
    },
    Quote { quote: Quote },
    Snapshot { id: String },
    List,
    Performance { id: String },
}

/// Result of a dispatched command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandOutput {
    Simulation(Box<Simulation>),
    Simulations(Vec<Simulation>),
    /// Previous simulation displaced by a load, if any
    Replaced(Option<Box<Simulation>>),
    Validation(Validation),
    Order(Order),
    Execution(ExecutionReport),
    Executions(Vec<ExecutionReport>),
    Performance(PerformanceMetrics),
}
