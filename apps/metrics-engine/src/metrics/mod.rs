//! Performance metrics calculation for backtest evaluation.
//!
//! Implements standard trading performance metrics:
//! - Total return and CAGR
//! - Volatility, Sharpe and Sortino ratios (per-period returns, annualized)
//! - Maximum drawdown on the per-period equity curve, and Calmar ratio
//! - Win rate, profit factor, expectancy, and trade streaks

mod calculator;
mod constants;
mod equity;
mod math;
mod ratios;
mod trades;
mod types;

pub use calculator::MetricsCalculator;
pub use equity::{
    DrawdownProfile, compute_cumulative_equity, compute_drawdown_duration, compute_max_drawdown,
    drawdown_profile,
};
pub use ratios::{
    compute_cagr, compute_cagr_with_year_length, compute_calmar_ratio, compute_sharpe_ratio,
    compute_sortino_ratio, compute_total_return, compute_volatility,
};
pub use trades::{TradeStats, compute_profit_factor, compute_win_rate};
pub use types::{BacktestRun, BacktestWindow, PerformanceMetrics, STORAGE_SCALE};
