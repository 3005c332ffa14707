//! Performance calculator for backtest results.

use rust_decimal::Decimal;

use super::constants::SECONDS_PER_DAY;
use super::equity::{compute_cumulative_equity, drawdown_profile};
use super::ratios::{
    compute_cagr_with_year_length, compute_calmar_ratio, compute_sharpe_ratio,
    compute_sortino_ratio, compute_total_return, compute_volatility,
};
use super::trades::TradeStats;
use super::types::{BacktestRun, PerformanceMetrics};
use crate::config::MetricsConfig;
use crate::error::MetricsError;
use crate::logging::{
    MetricsComputedEvent, log_cagr_unrepresentable, log_drawdown_guard, log_equity_curve,
    log_ledger_gap, log_metrics_computed,
};

/// Performance calculator for backtest results.
///
/// Holds only immutable configuration, so one calculator can evaluate any
/// number of runs, concurrently if needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    /// Create a calculator, rejecting unusable parameters.
    pub fn new(config: MetricsConfig) -> Result<Self, MetricsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Calculator parameters.
    #[must_use]
    pub const fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Calculate all performance metrics for a run.
    ///
    /// Invalid input fails immediately. Metrics that are undefined for
    /// valid input (no trades, zero variance, unknown window) are `None`.
    pub fn calculate(&self, run: &BacktestRun) -> Result<PerformanceMetrics, MetricsError> {
        let initial_capital = run.initial_capital;
        if initial_capital <= Decimal::ZERO {
            return Err(MetricsError::NonPositiveCapital {
                capital: initial_capital,
            });
        }
        run.trades.validate(self.config.pnl_tolerance)?;
        let elapsed_days = Self::elapsed_days(run)?;

        let returns = run.returns.values();
        let equity = compute_cumulative_equity(&returns, initial_capital)?;
        let final_balance = equity.last().copied().unwrap_or(initial_capital);
        log_equity_curve(&run.run_id, returns.len(), final_balance);

        let drawdown = drawdown_profile(&equity)?;
        if drawdown.skipped_periods > 0 {
            log_drawdown_guard(&run.run_id, drawdown.skipped_periods);
        }

        let total_return = compute_total_return(initial_capital, final_balance).ok_or(
            MetricsError::MetricOverflow {
                metric: "total_return",
            },
        )?;
        let cagr = elapsed_days.and_then(|days| {
            compute_cagr_with_year_length(
                initial_capital,
                final_balance,
                days,
                self.config.days_per_year,
            )
        });
        if let Some(days) =
            elapsed_days.filter(|_| cagr.is_none() && final_balance >= Decimal::ZERO)
        {
            log_cagr_unrepresentable(&run.run_id, days, total_return);
        }

        let annualization = self.config.annualization_factor;
        let risk_free_rate = self.config.risk_free_rate;
        let volatility = compute_volatility(&returns, annualization);
        let sharpe_ratio = compute_sharpe_ratio(&returns, risk_free_rate, annualization);
        let sortino_ratio = compute_sortino_ratio(&returns, risk_free_rate, annualization);
        let calmar_ratio = compute_calmar_ratio(cagr, drawdown.max_drawdown);

        let stats = TradeStats::from_trades(run.trades.trades());
        let unreconciled_pnl = initial_capital
            .checked_add(run.trades.total_pnl())
            .and_then(|ledger_balance| final_balance.checked_sub(ledger_balance))
            .ok_or(MetricsError::MetricOverflow {
                metric: "unreconciled_pnl",
            })?;
        if !run.trades.is_empty() && unreconciled_pnl.abs() > self.config.reconciliation_tolerance
        {
            log_ledger_gap(
                &run.run_id,
                unreconciled_pnl,
                self.config.reconciliation_tolerance,
            );
        }

        let metrics = PerformanceMetrics {
            total_return,
            cagr,
            initial_capital,
            final_balance,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown: drawdown.max_drawdown,
            max_drawdown_duration_periods: drawdown.max_duration_periods,
            total_trades: stats.total_trades,
            winning_trades: stats.winning_trades,
            losing_trades: stats.losing_trades,
            win_rate: stats.win_rate(),
            profit_factor: stats.profit_factor(),
            gross_profit: stats.gross_profit,
            gross_loss: stats.gross_loss,
            avg_win: stats.avg_win(),
            avg_loss: stats.avg_loss(),
            expectancy: stats.expectancy(),
            max_consecutive_wins: stats.max_consecutive_wins,
            max_consecutive_losses: stats.max_consecutive_losses,
            total_commission: run.trades.total_commission(),
            elapsed_days,
            unreconciled_pnl,
        };

        log_metrics_computed(&MetricsComputedEvent::new(&run.run_id, &metrics));
        Ok(metrics)
    }

    /// Calendar days covered by the run.
    ///
    /// An explicit window wins; otherwise the span of the returns series.
    /// `None` when fewer than two periods leave the span unknown.
    fn elapsed_days(run: &BacktestRun) -> Result<Option<Decimal>, MetricsError> {
        let span = match run.window {
            Some(window) => {
                if window.end <= window.start {
                    return Err(MetricsError::InvalidWindow {
                        start: window.start,
                        end: window.end,
                    });
                }
                window.end - window.start
            }
            None => match run.returns.span() {
                Some(span) => span,
                None => return Ok(None),
            },
        };
        Ok(Some(Decimal::from(span.num_seconds()) / SECONDS_PER_DAY))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::ledger::{Trade, TradeLedger, TradeSide};
    use crate::series::ReturnsSeries;

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap() + Duration::days(offset)
    }

    fn series(returns: &[i64]) -> ReturnsSeries {
        ReturnsSeries::from_pairs(
            returns
                .iter()
                .enumerate()
                .map(|(i, bp)| (day(i as i64), Decimal::new(*bp, 4))),
        )
        .unwrap()
    }

    fn make_trade(entry_price: i64, exit_price: i64, qty: i64) -> Trade {
        Trade::closed(
            "MSFT.XNAS",
            TradeSide::Buy,
            day(0),
            Decimal::new(entry_price, 2),
            day(1),
            Decimal::new(exit_price, 2),
            Decimal::new(qty, 0),
            Decimal::ZERO,
        )
    }

    fn run(returns: ReturnsSeries, trades: Vec<Trade>) -> BacktestRun {
        BacktestRun::new(
            "run-1",
            Decimal::new(100_000, 0),
            returns,
            TradeLedger::new(trades).unwrap(),
        )
    }

    #[test]
    fn test_empty_run() {
        let calc = MetricsCalculator::default();
        let metrics = calc
            .calculate(&run(ReturnsSeries::default(), vec![]))
            .unwrap();

        assert_eq!(metrics.final_balance, Decimal::new(100_000, 0));
        assert_eq!(metrics.total_return, Decimal::ZERO);
        assert_eq!(metrics.max_drawdown, Decimal::ZERO);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.cagr, None);
        assert_eq!(metrics.volatility, None);
        assert_eq!(metrics.sharpe_ratio, None);
        assert_eq!(metrics.win_rate, None);
        assert_eq!(metrics.profit_factor, None);
        assert_eq!(metrics.elapsed_days, None);
    }

    #[test]
    fn test_rejects_non_positive_capital() {
        let calc = MetricsCalculator::default();
        let mut bad = run(series(&[10, 20]), vec![]);
        bad.initial_capital = Decimal::ZERO;

        let result = calc.calculate(&bad);
        assert_eq!(
            result,
            Err(MetricsError::NonPositiveCapital {
                capital: Decimal::ZERO
            })
        );
    }

    #[test]
    fn test_rejects_inverted_window() {
        let calc = MetricsCalculator::default();
        let bad = run(series(&[10, 20]), vec![]).with_window(day(5), day(1));
        assert!(matches!(
            calc.calculate(&bad),
            Err(MetricsError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = MetricsConfig {
            annualization_factor: 0,
            ..MetricsConfig::default()
        };
        assert_eq!(
            MetricsCalculator::new(config),
            Err(MetricsError::ZeroAnnualizationFactor)
        );

        let config = MetricsConfig {
            days_per_year: Decimal::ZERO,
            ..MetricsConfig::default()
        };
        assert!(matches!(
            MetricsCalculator::new(config),
            Err(MetricsError::InvalidParameter {
                name: "days_per_year",
                ..
            })
        ));
    }

    #[test]
    fn test_tighter_pnl_tolerance_rejects_ledger() {
        let mut trade = make_trade(10_000, 10_100, 10);
        trade.realized_pnl += Decimal::new(5, 3);
        let calc = MetricsCalculator::new(MetricsConfig {
            pnl_tolerance: Decimal::new(1, 3),
            ..MetricsConfig::default()
        })
        .unwrap();

        let result = calc.calculate(&run(series(&[10]), vec![trade]));
        assert!(matches!(result, Err(MetricsError::PnlMismatch { .. })));
    }

    #[test]
    fn test_drawdown_uses_equity_curve() {
        // +10%, -20%, +5%: ends below start after an interim trough
        let calc = MetricsCalculator::default();
        let metrics = calc
            .calculate(&run(series(&[1_000, -2_000, 500]), vec![]))
            .unwrap();

        assert_eq!(metrics.final_balance, Decimal::new(92_400, 0));
        assert_eq!(metrics.total_return, Decimal::new(-76, 3));
        assert_eq!(metrics.max_drawdown, Decimal::new(-2, 1));
        assert_eq!(metrics.max_drawdown_duration_periods, 2);
        assert!(metrics.max_drawdown.abs() > metrics.total_return.abs());
    }

    #[test]
    fn test_elapsed_days_from_series_span() {
        let calc = MetricsCalculator::default();
        let metrics = calc
            .calculate(&run(series(&[0, 10, 10, 10, 10]), vec![]))
            .unwrap();
        assert_eq!(metrics.elapsed_days, Some(Decimal::new(4, 0)));
        assert!(metrics.cagr.is_some());
    }

    #[test]
    fn test_explicit_window_overrides_span() {
        let calc = MetricsCalculator::default();
        let metrics = calc
            .calculate(&run(series(&[10]), vec![]).with_window(day(0), day(30)))
            .unwrap();
        assert_eq!(metrics.elapsed_days, Some(Decimal::new(30, 0)));
        assert!(metrics.cagr.is_some());
    }

    #[test]
    fn test_trade_statistics_flow_through() {
        let calc = MetricsCalculator::default();
        let trades = vec![
            make_trade(10_000, 10_500, 100),
            make_trade(10_000, 9_700, 100),
            make_trade(10_000, 9_800, 100),
        ];
        let metrics = calc
            .calculate(&run(series(&[0, 5, -3, -2]), trades))
            .unwrap();

        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.winning_trades, 1);
        assert_eq!(metrics.losing_trades, 2);
        assert_eq!(metrics.gross_profit, Decimal::new(500, 0));
        assert_eq!(metrics.gross_loss, Decimal::new(500, 0));
        assert_eq!(metrics.profit_factor, Some(Decimal::ONE));
        assert_eq!(metrics.expectancy, Some(Decimal::ZERO));
    }

    #[test]
    fn test_unreconciled_pnl() {
        let calc = MetricsCalculator::default();
        // +0.5% on 100k is 500; the single trade also made 500
        let metrics = calc
            .calculate(&run(series(&[50]), vec![make_trade(10_000, 10_500, 100)]))
            .unwrap();
        assert_eq!(metrics.unreconciled_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_calculator_and_sink_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MetricsCalculator>();
        assert_send_sync::<crate::sink::InMemoryMetricsSink>();
    }

    #[test]
    fn test_huge_returns_leave_moments_undefined() {
        let returns = ReturnsSeries::from_pairs([
            (day(0), Decimal::new(500_000_000_000_000, 0)),
            (day(1), Decimal::NEGATIVE_ONE),
        ])
        .unwrap();
        let run = BacktestRun::new("run-huge", Decimal::ONE, returns, TradeLedger::default());

        let metrics = MetricsCalculator::default().calculate(&run).unwrap();
        assert_eq!(metrics.final_balance, Decimal::ZERO);
        assert_eq!(metrics.total_return, Decimal::NEGATIVE_ONE);
        assert_eq!(metrics.max_drawdown, Decimal::NEGATIVE_ONE);
        assert_eq!(metrics.volatility, None);
        assert_eq!(metrics.sharpe_ratio, None);
    }

    #[test]
    fn test_total_return_overflow_is_an_error() {
        let growth = Decimal::new(100_000_000_000_000_000, 0);
        let returns = ReturnsSeries::from_pairs([(day(0), growth), (day(1), growth)]).unwrap();
        let run = BacktestRun::new(
            "run-tiny",
            Decimal::new(1, 20),
            returns,
            TradeLedger::default(),
        );

        let result = MetricsCalculator::default().calculate(&run);
        assert_eq!(
            result,
            Err(MetricsError::MetricOverflow {
                metric: "total_return"
            })
        );
    }

    #[test]
    fn test_unrepresentable_cagr_is_none() {
        // doubling in one day compounds past the decimal range
        let calc = MetricsCalculator::default();
        let metrics = calc
            .calculate(&run(series(&[0, 10_000]), vec![]))
            .unwrap();
        assert_eq!(metrics.elapsed_days, Some(Decimal::ONE));
        assert_eq!(metrics.total_return, Decimal::ONE);
        assert_eq!(metrics.cagr, None);
        assert_eq!(metrics.calmar_ratio, None);
    }
}
