//! Simulation Controller
//!
//! `SimulationStore` owns every simulation and is the only way to change one.
//! A command holds its simulation's map entry for the whole call and works on
//! a draft copy, which replaces the stored simulation only when the command
//! succeeds. Distinct simulations live on independent entries.

use crate::config::EngineConfig;
use crate::error::{EngineError, ExecutionRejection, InvariantViolation, Result};
use crate::services::analyzer::{self, PerformanceMetrics};
use crate::services::execution::{self, ExecutionReport, FillQuote};
use crate::services::{risk, validation};
use crate::types::{
    Command, CommandOutput, EngineEvent, FillEffect, Order, OrderRequest, OrderStatus,
    OrderUpdateType, Quote, QuoteBook, QuoteData, Simulation, SimulationSettings,
    SimulationStatus, SimulationUpdateType,
};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// In-memory store of named simulations.
pub struct SimulationStore {
    config: EngineConfig,
    simulations: DashMap<String, Simulation>,
    /// Latest quote per symbol
    quotes: DashMap<String, QuoteData>,
    events: broadcast::Sender<EngineEvent>,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl SimulationStore {
    pub fn new(config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            simulations: DashMap::new(),
            quotes: DashMap::new(),
            events,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, events: Vec<EngineEvent>) {
        for event in events {
            // Err only means there are no subscribers
            let _ = self.events.send(event);
        }
    }

    fn not_found(id: &str) -> EngineError {
        EngineError::SimulationNotFound(id.to_string())
    }

    /// Run `f` on a draft of simulation `id` and commit it if `f` succeeds.
    fn with_draft<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Simulation, &mut Vec<EngineEvent>) -> Result<T>,
    ) -> Result<T> {
        self.with_draft_or_settle(id, f, |_, _, _| {})
    }

    /// Like `with_draft`, but on failure runs `settle` on the live
    /// simulation while the entry is still locked.
    fn with_draft_or_settle<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Simulation, &mut Vec<EngineEvent>) -> Result<T>,
        settle: impl FnOnce(&mut Simulation, &EngineError, &mut Vec<EngineEvent>),
    ) -> Result<T> {
        let mut entry = self.simulations.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        let mut draft = entry.value().clone();
        let mut events = Vec::new();

        let result = f(&mut draft, &mut events);
        match &result {
            Ok(_) => *entry.value_mut() = draft,
            Err(err) => {
                events.clear();
                settle(entry.value_mut(), err, &mut events);
            }
        }

        drop(entry);
        self.emit(events);
        result
    }

    fn read<T>(&self, id: &str, f: impl FnOnce(&Simulation) -> T) -> Result<T> {
        self.simulations
            .get(id)
            .map(|entry| f(entry.value()))
            .ok_or_else(|| Self::not_found(id))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create an active simulation with default settings and risk limits.
    pub fn create(&self, name: &str, initial_balance: Option<f64>) -> Result<Simulation> {
        let balance = initial_balance.unwrap_or(self.config.default_initial_balance);
        if !balance.is_finite() || balance <= 0.0 {
            return Err(InvariantViolation::InvalidInitialBalance(balance).into());
        }

        let simulation = Simulation::new(name.to_string(), balance, &self.config);
        info!(
            "Created simulation {} ({}) with balance {:.2}",
            simulation.id, simulation.name, balance
        );

        self.simulations.insert(simulation.id.clone(), simulation.clone());
        self.emit(vec![EngineEvent::simulation(
            &simulation.id,
            SimulationUpdateType::Created,
        )]);
        Ok(simulation)
    }

    pub fn start(&self, id: &str) -> Result<Simulation> {
        self.set_status(id, SimulationStatus::Active)
    }

    pub fn pause(&self, id: &str) -> Result<Simulation> {
        self.set_status(id, SimulationStatus::Paused)
    }

    fn set_status(&self, id: &str, status: SimulationStatus) -> Result<Simulation> {
        self.with_draft(id, |sim, events| {
            if sim.status != status {
                sim.status = status;
                info!("Simulation {} is now {}", sim.id, status);
                let update_type = match status {
                    SimulationStatus::Active => SimulationUpdateType::Started,
                    SimulationStatus::Paused => SimulationUpdateType::Paused,
                };
                events.push(EngineEvent::simulation(&sim.id, update_type));
            }
            Ok(sim.clone())
        })
    }

    /// Return a simulation to its initial balance with no positions, orders
    /// or executions. Id, name and settings are kept.
    pub fn reset(&self, id: &str) -> Result<Simulation> {
        self.with_draft(id, |sim, events| {
            sim.portfolio.reset();
            sim.status = SimulationStatus::Active;
            sim.start_date = now_ms();
            info!(
                "Reset simulation {} to {:.2}",
                sim.id,
                sim.portfolio.initial_balance()
            );
            events.push(EngineEvent::simulation(&sim.id, SimulationUpdateType::Reset));
            Ok(sim.clone())
        })
    }

    /// Store `simulation`, replacing any simulation with the same id.
    ///
    /// Returns the replaced simulation.
    pub fn load(&self, simulation: Simulation) -> Result<Option<Simulation>> {
        let initial = simulation.portfolio.initial_balance();
        if !initial.is_finite() || initial <= 0.0 {
            return Err(InvariantViolation::InvalidInitialBalance(initial).into());
        }

        let id = simulation.id.clone();
        let previous = self.simulations.insert(id.clone(), simulation);
        info!("Loaded simulation {} (replaced: {})", id, previous.is_some());
        self.emit(vec![EngineEvent::simulation(&id, SimulationUpdateType::Loaded)]);
        Ok(previous)
    }

    pub fn remove(&self, id: &str) -> Result<Simulation> {
        let (_, simulation) = self.simulations.remove(id).ok_or_else(|| Self::not_found(id))?;
        info!("Removed simulation {}", id);
        self.emit(vec![EngineEvent::simulation(id, SimulationUpdateType::Removed)]);
        Ok(simulation)
    }

    pub fn update_settings(&self, id: &str, settings: SimulationSettings) -> Result<Simulation> {
        self.with_draft(id, |sim, events| {
            sim.settings = settings;
            info!("Updated settings for simulation {}", sim.id);
            events.push(EngineEvent::simulation(&sim.id, SimulationUpdateType::SettingsChanged));
            Ok(sim.clone())
        })
    }

    pub fn get(&self, id: &str) -> Option<Simulation> {
        self.simulations.get(id).map(|entry| entry.value().clone())
    }

    /// Serializable copy of a simulation.
    pub fn snapshot(&self, id: &str) -> Result<Simulation> {
        self.read(id, Simulation::clone)
    }

    /// Every simulation, oldest first.
    pub fn list(&self) -> Vec<Simulation> {
        let mut simulations: Vec<Simulation> = self
            .simulations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        simulations.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        simulations
    }

    pub fn len(&self) -> usize {
        self.simulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Validate a request and record it as a pending order.
    pub fn submit_order(&self, id: &str, request: &OrderRequest) -> Result<Order> {
        let kind = validation::into_order_kind(request).inspect_err(|e| {
            warn!("Rejected order request for simulation {}: {}", id, e);
        })?;

        self.with_draft(id, |sim, events| {
            if !sim.is_active() {
                return Err(EngineError::SimulationPaused(sim.id.clone()));
            }

            let order = Order::new(
                sim.id.clone(),
                request.symbol.trim().to_string(),
                request.side,
                kind,
                request.quantity,
            );
            info!(
                "Accepted {} order {}: {} {} {}",
                order.order_type(),
                order.id,
                order.side,
                order.quantity,
                order.symbol
            );

            events.push(EngineEvent::order(&order, OrderUpdateType::Created, None));
            sim.portfolio.push_order(order.clone());
            Ok(order)
        })
    }

    /// Cancel a pending order.
    pub fn cancel_order(&self, id: &str, order_id: &str) -> Result<Order> {
        self.with_draft(id, |sim, events| {
            let order = sim
                .portfolio
                .order_mut(order_id)
                .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))?;
            if !order.is_pending() {
                return Err(EngineError::CannotCancelOrder(order.status));
            }

            order.transition(OrderStatus::Cancelled);
            let order = order.clone();
            info!("Cancelled order {} in simulation {}", order.id, order.simulation_id);
            events.push(EngineEvent::order(&order, OrderUpdateType::Cancelled, None));
            Ok(order)
        })
    }

    /// Fill a pending order in full at `reference_price`.
    ///
    /// Insufficient buying power marks the order rejected; any other failure
    /// leaves the simulation exactly as it was.
    pub fn execute_order(
        &self,
        id: &str,
        order_id: &str,
        reference_price: f64,
    ) -> Result<ExecutionReport> {
        self.with_draft_or_settle(
            id,
            |sim, events| {
                if !sim.is_active() {
                    return Err(EngineError::SimulationPaused(sim.id.clone()));
                }
                self.fill(sim, order_id, reference_price, events)
            },
            |sim, err, events| {
                if Self::rejects_order(err) {
                    Self::reject(sim, order_id, err, events);
                }
            },
        )
        .inspect_err(|err| warn!("Order {} in simulation {} not filled: {}", order_id, id, err))
    }

    /// Submit a request and fill it immediately at `reference_price`.
    pub fn place_and_fill(
        &self,
        id: &str,
        request: &OrderRequest,
        reference_price: f64,
    ) -> Result<ExecutionReport> {
        let order = self.submit_order(id, request)?;
        self.execute_order(id, &order.id, reference_price)
    }

    fn rejects_order(err: &EngineError) -> bool {
        matches!(
            err,
            EngineError::Rejected(ExecutionRejection::InsufficientBuyingPower { .. })
        )
    }

    fn reject(sim: &mut Simulation, order_id: &str, err: &EngineError, events: &mut Vec<EngineEvent>) {
        if let Some(order) = sim.portfolio.order_mut(order_id) {
            if order.is_pending() {
                order.transition(OrderStatus::Rejected);
                events.push(EngineEvent::order(
                    order,
                    OrderUpdateType::Rejected,
                    Some(err.to_string()),
                ));
            }
        }
    }

    /// Execute, risk-check and apply one fill to `sim`.
    ///
    /// Callers pass a draft: on error `sim` may be partially updated.
    fn fill(
        &self,
        sim: &mut Simulation,
        order_id: &str,
        reference_price: f64,
        events: &mut Vec<EngineEvent>,
    ) -> Result<ExecutionReport> {
        let mut order = sim
            .portfolio
            .order(order_id)
            .cloned()
            .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))?;

        let mut report = execution::execute(&mut order, reference_price, &sim.settings, &sim.portfolio)?;
        let Some(mut exec) = report.execution.take() else {
            return Ok(report);
        };

        risk::check_fill(
            &sim.settings,
            &sim.portfolio,
            &exec.symbol,
            exec.side,
            exec.quantity,
            &FillQuote::of(&exec),
            exec.timestamp,
        )?;

        let update = sim.portfolio.positions_mut().apply_fill(
            &exec.symbol,
            exec.side,
            exec.quantity,
            exec.price,
            exec.timestamp,
        );
        exec.realized_pnl = update.realized_pnl_delta;
        exec.effect = Some(update.effect);

        let balance = sim.portfolio.apply_execution(&exec)?;
        sim.portfolio.apply_realized_pnl(update.realized_pnl_delta);

        let last = self.last_price(&exec.symbol).unwrap_or(reference_price);
        sim.portfolio.mark_symbol(&exec.symbol, last);

        if let Some(stored) = sim.portfolio.order_mut(order_id) {
            *stored = order.clone();
        }

        info!(
            "Filled order {} in simulation {}: {} {} {} @ {:.4}, balance {:.2}",
            order.id, sim.id, exec.side, exec.quantity, exec.symbol, exec.price, balance
        );

        events.push(EngineEvent::order(&order, OrderUpdateType::Filled, None));
        events.push(EngineEvent::execution(&exec, balance));
        if let Some(closed) = &update.closed {
            events.push(EngineEvent::position(&sim.id, closed, FillEffect::Closed));
        }
        if let Some(position) = sim.portfolio.positions().get(&exec.symbol) {
            events.push(EngineEvent::position(&sim.id, position, update.effect));
        }

        report.execution = Some(exec);
        Ok(report)
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Record a quote, fill triggered orders and re-mark positions.
    ///
    /// Pending orders on the quote's symbol in every active simulation are
    /// checked in submission order and fill at `quote.last`. Paused
    /// simulations are re-marked but trigger nothing. Returns a report for
    /// every attempted fill, successful or not.
    pub fn process_quote(&self, quote: &Quote) -> Result<Vec<ExecutionReport>> {
        let data = quote.data();
        if !data.last.is_finite() || data.last <= 0.0 {
            return Err(InvariantViolation::InvalidReferencePrice(data.last).into());
        }

        let symbol = quote.symbol.trim();
        self.quotes.insert(symbol.to_string(), data);
        debug!("Quote {} last {}", symbol, data.last);

        let mut reports = Vec::new();
        let mut events = Vec::new();

        for mut entry in self.simulations.iter_mut() {
            let sim = entry.value_mut();

            if sim.is_active() {
                let candidates: Vec<String> = sim
                    .portfolio
                    .pending_orders()
                    .filter(|o| o.symbol == symbol)
                    .map(|o| o.id.clone())
                    .collect();

                for order_id in candidates {
                    let triggered = sim
                        .portfolio
                        .order_mut(&order_id)
                        .is_some_and(|o| o.should_trigger(data.last));
                    if !triggered {
                        continue;
                    }

                    let mut draft = sim.clone();
                    let mut fill_events = Vec::new();
                    match self.fill(&mut draft, &order_id, data.last, &mut fill_events) {
                        Ok(report) => {
                            *sim = draft;
                            events.append(&mut fill_events);
                            reports.push(report);
                        }
                        Err(err) => {
                            warn!("Triggered order {} in simulation {} not filled: {}", order_id, sim.id, err);
                            if let Some(order) = sim.portfolio.order(&order_id) {
                                reports.push(ExecutionReport::rejected(order, &err));
                            }
                            if Self::rejects_order(&err) {
                                Self::reject(sim, &order_id, &err, &mut events);
                            }
                        }
                    }
                }
            }

            sim.portfolio.mark_symbol(symbol, data.last);
        }

        self.emit(events);
        Ok(reports)
    }

    /// Latest quote for `symbol`.
    pub fn quote(&self, symbol: &str) -> Option<QuoteData> {
        self.quotes.get(symbol).map(|q| *q.value())
    }

    fn last_price(&self, symbol: &str) -> Option<f64> {
        self.quotes.get(symbol).map(|q| q.last)
    }

    fn quote_book(&self) -> QuoteBook {
        self.quotes
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    /// Performance metrics for a simulation at the latest quotes.
    pub fn performance(&self, id: &str) -> Result<PerformanceMetrics> {
        let quotes = self.quote_book();
        self.read(id, |sim| {
            analyzer::analyze(&sim.portfolio, &quotes, self.config.win_rate_method)
        })
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run a command.
    pub fn dispatch(&self, command: Command) -> Result<CommandOutput> {
        let boxed = |sim: Simulation| CommandOutput::Simulation(Box::new(sim));

        match command {
            Command::Create {
                name,
                initial_balance,
            } => self.create(&name, initial_balance).map(boxed),
            Command::Start { id } => self.start(&id).map(boxed),
            Command::Pause { id } => self.pause(&id).map(boxed),
            Command::Reset { id } => self.reset(&id).map(boxed),
            Command::Load { simulation } => self
                .load(*simulation)
                .map(|previous| CommandOutput::Replaced(previous.map(Box::new))),
            Command::Remove { id } => self.remove(&id).map(boxed),
            Command::UpdateSettings { id, settings } => self.update_settings(&id, settings).map(boxed),
            Command::Validate { request } => {
                Ok(CommandOutput::Validation(validation::validate(&request)))
            }
            Command::Submit { id, request } => {
                self.submit_order(&id, &request).map(CommandOutput::Order)
            }
            Command::Cancel { id, order_id } => {
                self.cancel_order(&id, &order_id).map(CommandOutput::Order)
            }
            Command::Execute {
                id,
                order_id,
                reference_price,
            } => self
                .execute_order(&id, &order_id, reference_price)
                .map(CommandOutput::Execution),
            Command::PlaceAndFill {
                id,
                request,
                reference_price,
            } => self
                .place_and_fill(&id, &request, reference_price)
                .map(CommandOutput::Execution),
            Command::Quote { quote } => self.process_quote(&quote).map(CommandOutput::Executions),
            Command::Snapshot { id } => self.snapshot(&id).map(boxed),
            Command::List => Ok(CommandOutput::Simulations(self.list())),
            Command::Performance { id } => self.performance(&id).map(CommandOutput::Performance),
        }
    }
}

impl Default for SimulationStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use approx::assert_relative_eq;

    fn store_with_sim(balance: f64) -> (SimulationStore, String) {
        let store = SimulationStore::default();
        let sim = store.create("test", Some(balance)).unwrap();
        (store, sim.id)
    }

    #[test]
    fn test_create_uses_default_balance() {
        let store = SimulationStore::default();
        let sim = store.create("default", None).unwrap();
        assert_eq!(sim.portfolio.initial_balance(), 100_000.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_balance() {
        let store = SimulationStore::default();
        for balance in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                store.create("bad", Some(balance)),
                Err(EngineError::Invariant(InvariantViolation::InvalidInitialBalance(_)))
            ));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_simulation() {
        let store = SimulationStore::default();
        assert_eq!(
            store.pause("missing").unwrap_err(),
            EngineError::SimulationNotFound("missing".to_string())
        );
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_submit_and_cancel() {
        let (store, id) = store_with_sim(10_000.0);
        let order = store
            .submit_order(&id, &OrderRequest::limit(" AAPL ", OrderSide::Buy, 5.0, 100.0))
            .unwrap();
        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.status, OrderStatus::Pending);

        let cancelled = store.cancel_order(&id, &order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            store.cancel_order(&id, &order.id).unwrap_err(),
            EngineError::CannotCancelOrder(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn test_invalid_request_records_nothing() {
        let (store, id) = store_with_sim(10_000.0);
        let err = store
            .submit_order(&id, &OrderRequest::market("", OrderSide::Buy, 0.0))
            .unwrap_err();
        match err {
            EngineError::Validation(issues) => assert_eq!(issues.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.snapshot(&id).unwrap().portfolio.orders().is_empty());
    }

    #[test]
    fn test_execute_applies_fill() {
        let (store, id) = store_with_sim(100_000.0);
        let report = store
            .place_and_fill(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 10.0), 150.0)
            .unwrap();
        assert!(report.success);

        let sim = store.snapshot(&id).unwrap();
        assert_relative_eq!(sim.portfolio.current_balance(), 98_496.76, epsilon = 1e-6);
        assert_eq!(sim.portfolio.positions().net_quantity("AAPL"), 10.0);
        assert_eq!(sim.portfolio.executions().len(), 1);
        assert_eq!(sim.portfolio.orders()[0].status, OrderStatus::Filled);
        assert_eq!(
            sim.portfolio.executions()[0].effect,
            Some(FillEffect::Opened)
        );
    }

    #[test]
    fn test_buying_power_rejection_marks_order_rejected() {
        let (store, id) = store_with_sim(1_000.0);
        let order = store
            .submit_order(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 10.0))
            .unwrap();

        let err = store.execute_order(&id, &order.id, 150.0).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient buying power");

        let sim = store.snapshot(&id).unwrap();
        assert_eq!(sim.portfolio.order(&order.id).unwrap().status, OrderStatus::Rejected);
        assert_eq!(sim.portfolio.current_balance(), 1_000.0);
        assert!(sim.portfolio.positions().is_empty());
        assert!(sim.portfolio.executions().is_empty());
    }

    #[test]
    fn test_buying_power_rejection_is_settled_once_under_contention() {
        let (store, id) = store_with_sim(1_000.0);
        let order = store
            .submit_order(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 10.0))
            .unwrap();
        let mut rx = store.subscribe();

        let errors: Vec<EngineError> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.execute_order(&id, &order.id, 150.0).unwrap_err()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let insufficient = errors
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    EngineError::Rejected(ExecutionRejection::InsufficientBuyingPower { .. })
                )
            })
            .count();
        assert_eq!(insufficient, 1);
        assert!(errors.iter().all(insufficient_or_not_pending));

        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event,
            EngineEvent::OrderUpdate { ref data } if data.update_type == OrderUpdateType::Rejected
        ));
        assert!(rx.try_recv().is_err());
    }

    fn insufficient_or_not_pending(err: &EngineError) -> bool {
        matches!(
            err,
            EngineError::Rejected(
                ExecutionRejection::InsufficientBuyingPower { .. }
                    | ExecutionRejection::OrderNotPending(OrderStatus::Rejected)
            )
        )
    }

    #[test]
    fn test_risk_rejection_rolls_back_and_leaves_order_pending() {
        let (store, id) = store_with_sim(100_000.0);
        let before = store.snapshot(&id).unwrap();
        let order = store
            .submit_order(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 200.0))
            .unwrap();

        let err = store.execute_order(&id, &order.id, 150.0).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(ExecutionRejection::PositionSizeExceeded { .. })
        ));

        let after = store.snapshot(&id).unwrap();
        assert_eq!(after.portfolio.order(&order.id).unwrap().status, OrderStatus::Pending);
        assert_eq!(after.portfolio.current_balance(), before.portfolio.current_balance());
        assert!(after.portfolio.executions().is_empty());
    }

    #[test]
    fn test_paused_simulation_refuses_orders() {
        let (store, id) = store_with_sim(10_000.0);
        store.pause(&id).unwrap();
        assert_eq!(
            store
                .submit_order(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 1.0))
                .unwrap_err(),
            EngineError::SimulationPaused(id.clone())
        );

        store.start(&id).unwrap();
        assert!(store
            .submit_order(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 1.0))
            .is_ok());
    }

    #[test]
    fn test_quote_triggers_limit_order() {
        let (store, id) = store_with_sim(10_000.0);
        store
            .submit_order(&id, &OrderRequest::limit("AAPL", OrderSide::Buy, 5.0, 100.0))
            .unwrap();

        assert!(store.process_quote(&Quote::last("AAPL", 101.0)).unwrap().is_empty());
        let reports = store.process_quote(&Quote::last("AAPL", 99.5)).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].success);
        assert_eq!(store.quote("AAPL").unwrap().last, 99.5);
    }

    #[test]
    fn test_process_quote_rejects_bad_price() {
        let store = SimulationStore::default();
        assert!(store.process_quote(&Quote::last("AAPL", 0.0)).is_err());
        assert!(store.quote("AAPL").is_none());
    }

    #[test]
    fn test_dispatch_list_and_remove() {
        let (store, id) = store_with_sim(10_000.0);
        match store.dispatch(Command::List).unwrap() {
            CommandOutput::Simulations(sims) => assert_eq!(sims.len(), 1),
            other => panic!("unexpected output: {:?}", other),
        }
        store.dispatch(Command::Remove { id: id.clone() }).unwrap();
        assert!(store.is_empty());
        assert!(store.dispatch(Command::Snapshot { id }).is_err());
    }
}
