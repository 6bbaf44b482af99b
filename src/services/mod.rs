pub mod accounting;
pub mod analyzer;
pub mod controller;
pub mod execution;
pub mod ledger;
pub mod risk;
pub mod validation;

pub use accounting::Portfolio;
pub use analyzer::{analyze, PerformanceMetrics, WinRateMethod};
pub use controller::SimulationStore;
pub use execution::{execute, quote_fill, ExecutionReport, FillQuote};
pub use ledger::{LedgerUpdate, PositionBook};
pub use validation::{into_order_kind, validate, Validation};
