//! Return and risk-adjusted return ratios.
//!
//! Every ratio here takes the full per-period returns series. Feeding a
//! handful of trade-level returns instead produces a meaningless Sharpe.

use rust_decimal::Decimal;

use super::constants::DAYS_PER_YEAR;
use super::math::{downside_deviation, mean, powf_decimal, sqrt_decimal, std_dev};

/// Total return: `(final - initial) / initial`.
///
/// `None` for zero capital or a ratio outside the decimal range.
pub fn compute_total_return(initial_capital: Decimal, final_balance: Decimal) -> Option<Decimal> {
    if initial_capital == Decimal::ZERO {
        return None;
    }
    final_balance
        .checked_sub(initial_capital)?
        .checked_div(initial_capital)
}

/// Compound annual growth rate over `elapsed_days` calendar days.
///
/// `(final / initial) ^ (365.25 / elapsed_days) - 1`. Undefined for
/// non-positive capital or elapsed time, and for a negative balance ratio.
pub fn compute_cagr(
    initial_capital: Decimal,
    final_balance: Decimal,
    elapsed_days: Decimal,
) -> Option<Decimal> {
    compute_cagr_with_year_length(initial_capital, final_balance, elapsed_days, DAYS_PER_YEAR)
}

/// CAGR with an explicit number of calendar days per year.
///
/// Also `None` when the compounded growth does not fit a decimal.
pub fn compute_cagr_with_year_length(
    initial_capital: Decimal,
    final_balance: Decimal,
    elapsed_days: Decimal,
    days_per_year: Decimal,
) -> Option<Decimal> {
    if initial_capital <= Decimal::ZERO || elapsed_days <= Decimal::ZERO {
        return None;
    }
    let growth = final_balance.checked_div(initial_capital)?;
    if growth < Decimal::ZERO {
        return None;
    }
    let compounded = powf_decimal(growth, days_per_year.checked_div(elapsed_days)?)?;
    compounded.checked_sub(Decimal::ONE)
}

/// Annualized volatility: sample stdev of returns times `sqrt(annualization_factor)`.
pub fn compute_volatility(returns: &[Decimal], annualization_factor: u32) -> Option<Decimal> {
    if annualization_factor == 0 {
        return None;
    }
    let std = std_dev(returns)?;
    std.checked_mul(sqrt_decimal(Decimal::from(annualization_factor))?)
}

/// Annualized Sharpe ratio.
///
/// `(mean(r) - rf / ann) / stdev(r) * sqrt(ann)` with the sample stdev.
/// `None` with fewer than two returns or zero variance.
pub fn compute_sharpe_ratio(
    returns: &[Decimal],
    risk_free_rate: Decimal,
    annualization_factor: u32,
) -> Option<Decimal> {
    if annualization_factor == 0 {
        return None;
    }
    let std = std_dev(returns)?;
    if std == Decimal::ZERO {
        return None;
    }
    annualized_excess(returns, risk_free_rate, annualization_factor, std)
}

/// Annualized Sortino ratio.
///
/// Same excess return as Sharpe, divided by the downside deviation.
/// `None` when no period lost money.
pub fn compute_sortino_ratio(
    returns: &[Decimal],
    risk_free_rate: Decimal,
    annualization_factor: u32,
) -> Option<Decimal> {
    if annualization_factor == 0 {
        return None;
    }
    let downside_dev = downside_deviation(returns)?;
    if downside_dev == Decimal::ZERO {
        return None;
    }
    annualized_excess(returns, risk_free_rate, annualization_factor, downside_dev)
}

/// Calmar ratio: CAGR over the magnitude of the max drawdown.
pub fn compute_calmar_ratio(cagr: Option<Decimal>, max_drawdown: Decimal) -> Option<Decimal> {
    if max_drawdown >= Decimal::ZERO {
        return None;
    }
    cagr?.checked_div(max_drawdown.abs())
}

/// `(mean(r) - rf / ann) / deviation * sqrt(ann)`, `None` outside the decimal range.
fn annualized_excess(
    returns: &[Decimal],
    risk_free_rate: Decimal,
    annualization_factor: u32,
    deviation: Decimal,
) -> Option<Decimal> {
    let periods = Decimal::from(annualization_factor);
    mean(returns)?
        .checked_sub(risk_free_rate / periods)?
        .checked_div(deviation)?
        .checked_mul(sqrt_decimal(periods)?)
}
