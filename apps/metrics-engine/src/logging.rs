//! Structured logging for metric calculations.
//!
//! # Log Levels
//!
//! - **INFO**: Metrics computed for a run
//! - **WARN**: Drawdown periods skipped, equity curve disagrees with the ledger,
//!   CAGR out of range
//! - **DEBUG**: Intermediate calculation steps

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::PerformanceMetrics;

/// Summary event emitted once per evaluated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsComputedEvent {
    /// Backtest run identifier.
    pub run_id: String,
    /// Total return (decimal fraction).
    pub total_return: Decimal,
    /// CAGR.
    pub cagr: Option<Decimal>,
    /// Sharpe ratio.
    pub sharpe_ratio: Option<Decimal>,
    /// Maximum drawdown (signed).
    pub max_drawdown: Decimal,
    /// Win rate.
    pub win_rate: Option<Decimal>,
    /// Profit factor.
    pub profit_factor: Option<Decimal>,
    /// Total trades.
    pub total_trades: u64,
    /// Final balance.
    pub final_balance: Decimal,
}

impl MetricsComputedEvent {
    /// Build the event for a run's metrics.
    #[must_use]
    pub fn new(run_id: impl Into<String>, metrics: &PerformanceMetrics) -> Self {
        Self {
            run_id: run_id.into(),
            total_return: metrics.total_return,
            cagr: metrics.cagr,
            sharpe_ratio: metrics.sharpe_ratio,
            max_drawdown: metrics.max_drawdown,
            win_rate: metrics.win_rate,
            profit_factor: metrics.profit_factor,
            total_trades: metrics.total_trades,
            final_balance: metrics.final_balance,
        }
    }
}

/// Log computed metrics.
pub fn log_metrics_computed(event: &MetricsComputedEvent) {
    info!(
        run_id = %event.run_id,
        total_return = %event.total_return,
        cagr = ?event.cagr,
        sharpe_ratio = ?event.sharpe_ratio,
        max_drawdown = %event.max_drawdown,
        win_rate = ?event.win_rate,
        profit_factor = ?event.profit_factor,
        total_trades = event.total_trades,
        final_balance = %event.final_balance,
        "Performance metrics computed"
    );
}

/// Log the equity curve that feeds the drawdown and ratio calculations.
pub fn log_equity_curve(run_id: &str, periods: usize, final_balance: Decimal) {
    debug!(
        run_id = %run_id,
        periods,
        final_balance = %final_balance,
        "Equity curve compounded"
    );
}

/// Log equity points skipped by the drawdown guard.
pub fn log_drawdown_guard(run_id: &str, skipped_periods: u64) {
    warn!(
        run_id = %run_id,
        skipped_periods,
        "Drawdown skipped for periods with non-positive running peak"
    );
}

/// Log a CAGR that is defined but does not fit a decimal.
pub fn log_cagr_unrepresentable(run_id: &str, elapsed_days: Decimal, total_return: Decimal) {
    warn!(
        run_id = %run_id,
        elapsed_days = %elapsed_days,
        total_return = %total_return,
        "CAGR exceeds the decimal range for this window; reported as undefined"
    );
}

/// Log a gap between the equity curve and the trade ledger.
pub fn log_ledger_gap(run_id: &str, unreconciled_pnl: Decimal, tolerance: Decimal) {
    warn!(
        run_id = %run_id,
        unreconciled_pnl = %unreconciled_pnl,
        tolerance = %tolerance,
        "Equity curve final balance does not reconcile with realized trade P&L"
    );
}
