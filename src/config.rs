use crate::services::analyzer::WinRateMethod;
use std::env;

/// Engine configuration: defaults applied to newly created simulations.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Balance used when a caller does not supply one.
    pub default_initial_balance: f64,
    /// Flat commission charged on every execution.
    pub commission_per_trade: f64,
    /// Commission as a fraction of reference notional.
    pub commission_percentage: f64,
    /// Adverse slippage as a fraction of reference price.
    pub slippage_percentage: f64,
    /// Whether new simulations may open short positions.
    pub allow_short_selling: bool,
    /// Open positions allowed per symbol.
    pub max_positions_per_symbol: u32,
    /// Position size ceiling as a fraction of initial balance.
    pub max_position_size_pct: f64,
    /// Daily loss ceiling as a fraction of initial balance.
    pub max_daily_loss_pct: f64,
    /// Total loss ceiling as a fraction of initial balance.
    pub max_total_loss_pct: f64,
    /// How the performance analyzer classifies winning trades.
    pub win_rate_method: WinRateMethod,
    /// Buffered events per subscriber before the slowest one lags.
    pub event_capacity: usize,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_initial_balance: parse_var("PAPER_INITIAL_BALANCE")
                .unwrap_or(defaults.default_initial_balance),
            commission_per_trade: parse_var("PAPER_COMMISSION_PER_TRADE")
                .unwrap_or(defaults.commission_per_trade),
            commission_percentage: parse_var("PAPER_COMMISSION_PCT")
                .unwrap_or(defaults.commission_percentage),
            slippage_percentage: parse_var("PAPER_SLIPPAGE_PCT")
                .unwrap_or(defaults.slippage_percentage),
            allow_short_selling: parse_var("PAPER_ALLOW_SHORT_SELLING")
                .unwrap_or(defaults.allow_short_selling),
            max_positions_per_symbol: parse_var("PAPER_MAX_POSITIONS_PER_SYMBOL")
                .unwrap_or(defaults.max_positions_per_symbol),
            max_position_size_pct: parse_var("PAPER_MAX_POSITION_SIZE_PCT")
                .unwrap_or(defaults.max_position_size_pct),
            max_daily_loss_pct: parse_var("PAPER_MAX_DAILY_LOSS_PCT")
                .unwrap_or(defaults.max_daily_loss_pct),
            max_total_loss_pct: parse_var("PAPER_MAX_TOTAL_LOSS_PCT")
                .unwrap_or(defaults.max_total_loss_pct),
            win_rate_method: env::var("PAPER_WIN_RATE_METHOD")
                .ok()
                .and_then(|v| WinRateMethod::parse(&v))
                .unwrap_or(defaults.win_rate_method),
            event_capacity: parse_var("PAPER_EVENT_CAPACITY")
                .filter(|c: &usize| *c > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_initial_balance: 100_000.0,
            commission_per_trade: 0.99,
            commission_percentage: 0.0005, // 0.05%
            slippage_percentage: 0.001,    // 0.1%
            allow_short_selling: true,
            max_positions_per_symbol: 1,
            max_position_size_pct: 0.20,
            max_daily_loss_pct: 0.05,
            max_total_loss_pct: 0.25,
            win_rate_method: WinRateMethod::SellHeuristic,
            event_capacity: 1024,
        }
    }
}
