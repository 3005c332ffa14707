//! Core types for backtest performance metrics.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ledger::TradeLedger;
use crate::series::ReturnsSeries;
use crate::sink::SinkError;

/// Fractional digits kept by the storage schema (`numeric(15,6)`).
pub const STORAGE_SCALE: u32 = 6;

/// Largest magnitude that fits `numeric(15,6)` (nine integral digits).
const STORAGE_LIMIT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Calendar window covered by a backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestWindow {
    /// First instant of the run.
    pub start: DateTime<Utc>,
    /// Last instant of the run.
    pub end: DateTime<Utc>,
}

/// Everything a completed backtest run hands over for evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestRun {
    /// Backtest run identifier.
    pub run_id: String,
    /// Starting account value.
    pub initial_capital: Decimal,
    /// Per-period returns over the full window.
    pub returns: ReturnsSeries,
    /// Closed trades.
    #[serde(default)]
    pub trades: TradeLedger,
    /// Explicit window; defaults to the span of the returns series.
    #[serde(default)]
    pub window: Option<BacktestWindow>,
}

impl BacktestRun {
    /// Create a run whose window is the span of its returns series.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        initial_capital: Decimal,
        returns: ReturnsSeries,
        trades: TradeLedger,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            initial_capital,
            returns,
            trades,
            window: None,
        }
    }

    /// Override the calendar window used for annualization.
    #[must_use]
    pub const fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window = Some(BacktestWindow { start, end });
        self
    }
}

/// Performance metrics for one backtest run.
///
/// Percentage-like values are signed decimal fractions (`-0.0389` is -3.89%).
/// `None` marks a metric that is undefined for the input, e.g. a win rate
/// with no trades or a Sharpe ratio with zero variance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Return metrics
    /// Total return over the run.
    pub total_return: Decimal,
    /// Compound annual growth rate.
    pub cagr: Option<Decimal>,
    /// Starting account value.
    pub initial_capital: Decimal,
    /// Final account value from the compounded equity curve.
    pub final_balance: Decimal,

    // Risk metrics
    /// Annualized volatility of per-period returns.
    pub volatility: Option<Decimal>,
    /// Annualized Sharpe ratio.
    pub sharpe_ratio: Option<Decimal>,
    /// Annualized Sortino ratio.
    pub sortino_ratio: Option<Decimal>,
    /// CAGR over the magnitude of max drawdown.
    pub calmar_ratio: Option<Decimal>,
    /// Maximum drawdown (signed, `<= 0`).
    pub max_drawdown: Decimal,
    /// Longest run of periods spent below a prior equity peak.
    pub max_drawdown_duration_periods: u64,

    // Trade statistics
    /// Total number of trades.
    pub total_trades: u64,
    /// Number of winning trades.
    pub winning_trades: u64,
    /// Number of losing trades.
    pub losing_trades: u64,
    /// Win rate in `[0, 1]`.
    pub win_rate: Option<Decimal>,
    /// Gross profit over gross loss.
    pub profit_factor: Option<Decimal>,
    /// Gross profit.
    pub gross_profit: Decimal,
    /// Gross loss (positive value).
    pub gross_loss: Decimal,
    /// Average winning trade.
    pub avg_win: Option<Decimal>,
    /// Average losing trade (positive value).
    pub avg_loss: Option<Decimal>,
    /// Average net P&L per trade.
    pub expectancy: Option<Decimal>,
    /// Maximum consecutive wins.
    pub max_consecutive_wins: u64,
    /// Maximum consecutive losses.
    pub max_consecutive_losses: u64,
    /// Total commission paid.
    pub total_commission: Decimal,

    // Run bookkeeping
    /// Calendar days used for annualization.
    pub elapsed_days: Option<Decimal>,
    /// Final balance minus initial capital plus realized trade P&L.
    pub unreconciled_pnl: Decimal,
}

impl PerformanceMetrics {
    /// Round every decimal to the storage scale.
    ///
    /// Fails if a value has more integral digits than the schema holds.
    pub fn rounded_for_storage(&self) -> Result<Self, SinkError> {
        let round = |field: &'static str, value: Decimal| -> Result<Decimal, SinkError> {
            let rounded =
                value.round_dp_with_strategy(STORAGE_SCALE, RoundingStrategy::MidpointAwayFromZero);
            if rounded.abs() >= STORAGE_LIMIT {
                return Err(SinkError::MetricOutOfRange { field, value });
            }
            Ok(rounded)
        };
        let round_opt = |field: &'static str, value: Option<Decimal>| {
            value.map(|v| round(field, v)).transpose()
        };

        Ok(Self {
            total_return: round("total_return", self.total_return)?,
            cagr: round_opt("cagr", self.cagr)?,
            initial_capital: round("initial_capital", self.initial_capital)?,
            final_balance: round("final_balance", self.final_balance)?,
            volatility: round_opt("volatility", self.volatility)?,
            sharpe_ratio: round_opt("sharpe_ratio", self.sharpe_ratio)?,
            sortino_ratio: round_opt("sortino_ratio", self.sortino_ratio)?,
            calmar_ratio: round_opt("calmar_ratio", self.calmar_ratio)?,
            max_drawdown: round("max_drawdown", self.max_drawdown)?,
            max_drawdown_duration_periods: self.max_drawdown_duration_periods,
            total_trades: self.total_trades,
            winning_trades: self.winning_trades,
            losing_trades: self.losing_trades,
            win_rate: round_opt("win_rate", self.win_rate)?,
            profit_factor: round_opt("profit_factor", self.profit_factor)?,
            gross_profit: round("gross_profit", self.gross_profit)?,
            gross_loss: round("gross_loss", self.gross_loss)?,
            avg_win: round_opt("avg_win", self.avg_win)?,
            avg_loss: round_opt("avg_loss", self.avg_loss)?,
            expectancy: round_opt("expectancy", self.expectancy)?,
            max_consecutive_wins: self.max_consecutive_wins,
            max_consecutive_losses: self.max_consecutive_losses,
            total_commission: round("total_commission", self.total_commission)?,
            elapsed_days: round_opt("elapsed_days", self.elapsed_days)?,
            unreconciled_pnl: round("unreconciled_pnl", self.unreconciled_pnl)?,
        })
    }
}
