//! Ledger and accounting invariants over generated fill sequences
//!
//! Tests cover:
//! - Cash identity against the execution log
//! - Net quantity and realized P&L identities
//! - Average price moving only on same-direction adds
//! - Reversal fills
//! - Fractional lots closing flat
//! - Buying power never driving cash negative

use approx::assert_relative_eq;
use haunt_paper::*;

/// Small deterministic generator so sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next() % (hi - lo + 1)
    }
}

fn unlimited(store: &SimulationStore, id: &str) {
    let mut settings = store.snapshot(id).unwrap().settings;
    settings.risk_limits = RiskLimits {
        max_position_size: f64::MAX,
        max_daily_loss: f64::MAX,
        max_total_loss: f64::MAX,
    };
    store.update_settings(id, settings).unwrap();
}

fn frictionless(store: &SimulationStore, id: &str) {
    let mut settings = store.snapshot(id).unwrap().settings;
    settings.commission_per_trade = 0.0;
    settings.commission_percentage = 0.0;
    settings.slippage_percentage = 0.0;
    store.update_settings(id, settings).unwrap();
}

// =============================================================================
// Identity Tests
// =============================================================================

mod identity_tests {
    use super::*;

    #[test]
    fn test_identities_hold_over_random_fills() {
        for seed in [1u64, 7, 42, 1234] {
            let store = SimulationStore::default();
            let id = store.create("random", Some(10_000_000.0)).unwrap().id;
            unlimited(&store, &id);

            let mut rng = Lcg(seed);
            let mut signed_qty = 0.0;

            for _ in 0..200 {
                let side = if rng.range(0, 1) == 0 { OrderSide::Buy } else { OrderSide::Sell };
                let quantity = rng.range(1, 20) as f64;
                let price = rng.range(50, 150) as f64;

                let report = store
                    .place_and_fill(&id, &OrderRequest::market("AAPL", side, quantity), price)
                    .unwrap();
                assert!(report.success);

                signed_qty += match side {
                    OrderSide::Buy => quantity,
                    OrderSide::Sell => -quantity,
                };

                let sim = store.snapshot(&id).unwrap();
                let portfolio = &sim.portfolio;

                let cash: f64 = portfolio.executions().iter().map(Execution::cash_delta).sum();
                assert_relative_eq!(
                    portfolio.current_balance(),
                    portfolio.initial_balance() + cash,
                    epsilon = 1e-4
                );

                assert_relative_eq!(
                    portfolio.positions().net_quantity("AAPL"),
                    signed_qty,
                    epsilon = 1e-9
                );

                let realized: f64 = portfolio.executions().iter().map(|e| e.realized_pnl).sum();
                assert_relative_eq!(portfolio.realized_pnl(), realized, epsilon = 1e-6);
                assert_relative_eq!(
                    portfolio.total_pnl(),
                    portfolio.realized_pnl() + portfolio.unrealized_pnl(),
                    epsilon = 1e-9
                );

                if signed_qty == 0.0 {
                    assert!(portfolio.positions().get("AAPL").is_none());
                }
            }
        }
    }

    #[test]
    fn test_average_price_moves_only_on_adds() {
        let store = SimulationStore::default();
        let id = store.create("avg", Some(1_000_000.0)).unwrap().id;
        frictionless(&store, &id);

        store
            .place_and_fill(&id, &OrderRequest::market("MSFT", OrderSide::Buy, 10.0), 100.0)
            .unwrap();
        store
            .place_and_fill(&id, &OrderRequest::market("MSFT", OrderSide::Buy, 30.0), 120.0)
            .unwrap();
        let avg = store.snapshot(&id).unwrap().portfolio.positions().get("MSFT").unwrap().average_price;
        assert_relative_eq!(avg, 115.0, epsilon = 1e-9);

        store
            .place_and_fill(&id, &OrderRequest::market("MSFT", OrderSide::Sell, 15.0), 130.0)
            .unwrap();
        let sim = store.snapshot(&id).unwrap();
        let position = sim.portfolio.positions().get("MSFT").unwrap();
        assert_relative_eq!(position.average_price, 115.0, epsilon = 1e-9);
        assert_eq!(position.quantity, 25.0);
        assert_relative_eq!(sim.portfolio.realized_pnl(), 225.0, epsilon = 1e-9);
    }
}

// =============================================================================
// Reversal Tests
// =============================================================================

mod reversal_tests {
    use super::*;

    #[test]
    fn test_long_to_short_reversal() {
        let store = SimulationStore::default();
        let id = store.create("reversal", Some(100_000.0)).unwrap().id;
        frictionless(&store, &id);

        store
            .place_and_fill(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 10.0), 100.0)
            .unwrap();
        let report = store
            .place_and_fill(&id, &OrderRequest::market("AAPL", OrderSide::Sell, 25.0), 90.0)
            .unwrap();

        let execution = report.execution.unwrap();
        assert_eq!(execution.effect, Some(FillEffect::Reversed));
        assert_relative_eq!(execution.realized_pnl, -100.0, epsilon = 1e-9);

        let sim = store.snapshot(&id).unwrap();
        let position = sim.portfolio.positions().get("AAPL").unwrap();
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.quantity, 15.0);
        assert_eq!(position.average_price, 90.0);
        assert_relative_eq!(sim.portfolio.current_balance(), 101_250.0, epsilon = 1e-9);
        assert_relative_eq!(sim.portfolio.realized_pnl(), -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_to_long_reversal() {
        let store = SimulationStore::default();
        let id = store.create("reversal", Some(100_000.0)).unwrap().id;
        frictionless(&store, &id);

        store
            .place_and_fill(&id, &OrderRequest::market("TSLA", OrderSide::Sell, 4.0), 200.0)
            .unwrap();
        store
            .place_and_fill(&id, &OrderRequest::market("TSLA", OrderSide::Buy, 6.0), 180.0)
            .unwrap();

        let sim = store.snapshot(&id).unwrap();
        let position = sim.portfolio.positions().get("TSLA").unwrap();
        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.quantity, 2.0);
        assert_eq!(position.average_price, 180.0);
        assert_relative_eq!(sim.portfolio.realized_pnl(), 80.0, epsilon = 1e-9);
    }
}

// =============================================================================
// Fractional Lot Tests
// =============================================================================

mod fractional_tests {
    use super::*;

    #[test]
    fn test_selling_fractional_holding_in_lots_closes_it() {
        let store = SimulationStore::default();
        let id = store.create("lots", Some(100_000.0)).unwrap().id;
        frictionless(&store, &id);
        let mut settings = store.snapshot(&id).unwrap().settings;
        settings.allow_short_selling = false;
        store.update_settings(&id, settings).unwrap();

        store
            .place_and_fill(&id, &OrderRequest::market("BTC", OrderSide::Buy, 0.3), 100.0)
            .unwrap();
        let effects: Vec<Option<FillEffect>> = (0..3)
            .map(|_| {
                store
                    .place_and_fill(&id, &OrderRequest::market("BTC", OrderSide::Sell, 0.1), 100.0)
                    .unwrap()
                    .execution
                    .unwrap()
                    .effect
            })
            .collect();

        assert_eq!(
            effects,
            vec![
                Some(FillEffect::Reduced),
                Some(FillEffect::Reduced),
                Some(FillEffect::Closed)
            ]
        );
        let sim = store.snapshot(&id).unwrap();
        assert!(sim.portfolio.positions().is_empty());
        assert_relative_eq!(sim.portfolio.current_balance(), 100_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identities_hold_over_fractional_fills() {
        let store = SimulationStore::default();
        let id = store.create("fractional", Some(10_000_000.0)).unwrap().id;
        unlimited(&store, &id);

        let mut rng = Lcg(99);
        for _ in 0..200 {
            let side = if rng.range(0, 1) == 0 { OrderSide::Buy } else { OrderSide::Sell };
            let quantity = rng.range(1, 30) as f64 / 10.0;
            let price = rng.range(50, 150) as f64;
            store
                .place_and_fill(&id, &OrderRequest::market("ETH", side, quantity), price)
                .unwrap();

            let sim = store.snapshot(&id).unwrap();
            let portfolio = &sim.portfolio;
            let cash: f64 = portfolio.executions().iter().map(Execution::cash_delta).sum();
            assert_relative_eq!(
                portfolio.current_balance(),
                portfolio.initial_balance() + cash,
                epsilon = 1e-4
            );
            if let Some(position) = portfolio.positions().get("ETH") {
                assert!(position.quantity > 1e-6);
            }
        }
    }
}

// =============================================================================
// Buying Power Tests
// =============================================================================

mod buying_power_tests {
    use super::*;

    #[test]
    fn test_buys_never_drive_cash_negative() {
        let store = SimulationStore::default();
        let id = store.create("small", Some(1_000.0)).unwrap().id;
        unlimited(&store, &id);

        let mut rejected = 0;
        for _ in 0..20 {
            match store.place_and_fill(&id, &OrderRequest::market("AAPL", OrderSide::Buy, 1.0), 99.0) {
                Ok(report) => assert!(report.success),
                Err(e) => {
                    assert_eq!(e.to_string(), "Insufficient buying power");
                    rejected += 1;
                }
            }
            assert!(store.snapshot(&id).unwrap().portfolio.current_balance() >= 0.0);
        }

        assert!(rejected > 0);
        let sim = store.snapshot(&id).unwrap();
        let rejected_orders = sim
            .portfolio
            .orders()
            .iter()
            .filter(|o| o.status == OrderStatus::Rejected)
            .count();
        assert_eq!(rejected_orders, rejected);
    }
}
