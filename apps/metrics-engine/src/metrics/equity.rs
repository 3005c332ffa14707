//! Equity curve compounding and drawdown analysis.
//!
//! Drawdown is measured on the per-period equity curve rather than on
//! trade-close snapshots, so unrealized losses inside a trade are captured.

use rust_decimal::Decimal;

use crate::error::MetricsError;

/// Drawdown statistics for an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawdownProfile {
    /// Most negative drawdown (signed, e.g. -0.20 = 20% below peak).
    pub max_drawdown: Decimal,
    /// Longest run of consecutive points below a prior peak.
    pub max_duration_periods: u64,
    /// Points skipped because the running peak was not positive.
    pub skipped_periods: u64,
}

/// Compound per-period returns onto the initial capital.
///
/// `equity[0]` is the initial capital and `equity[i] = equity[i - 1] * (1 + r[i])`,
/// so the curve is one point longer than the returns. Values are not clamped
/// and can go negative.
pub fn compute_cumulative_equity(
    returns: &[Decimal],
    initial_capital: Decimal,
) -> Result<Vec<Decimal>, MetricsError> {
    let mut equity = Vec::with_capacity(returns.len() + 1);
    let mut current = initial_capital;
    equity.push(current);

    for (period, r) in returns.iter().enumerate() {
        current = Decimal::ONE
            .checked_add(*r)
            .and_then(|growth| current.checked_mul(growth))
            .ok_or(MetricsError::EquityOverflow { period })?;
        equity.push(current);
    }

    Ok(equity)
}

/// Walk the equity curve tracking the running peak.
///
/// A point whose running peak is zero or negative has no meaningful
/// percentage drawdown; it is skipped and counted in `skipped_periods`.
/// A decline too deep to represent relative to a tiny peak is
/// `MetricOverflow`.
pub fn drawdown_profile(equity: &[Decimal]) -> Result<DrawdownProfile, MetricsError> {
    let Some(first) = equity.first() else {
        return Ok(DrawdownProfile::default());
    };

    let mut profile = DrawdownProfile::default();
    let mut peak = *first;
    let mut underwater = 0u64;

    for point in equity {
        if *point > peak {
            peak = *point;
            underwater = 0;
            continue;
        }
        if peak <= Decimal::ZERO {
            profile.skipped_periods += 1;
            continue;
        }
        if *point < peak {
            let drawdown = point
                .checked_sub(peak)
                .and_then(|decline| decline.checked_div(peak))
                .ok_or(MetricsError::MetricOverflow {
                    metric: "max_drawdown",
                })?;
            profile.max_drawdown = profile.max_drawdown.min(drawdown);
            underwater += 1;
            profile.max_duration_periods = profile.max_duration_periods.max(underwater);
        } else {
            underwater = 0;
        }
    }

    Ok(profile)
}

/// Most negative peak-to-trough decline, as a signed fraction (`<= 0`).
pub fn compute_max_drawdown(equity: &[Decimal]) -> Result<Decimal, MetricsError> {
    Ok(drawdown_profile(equity)?.max_drawdown)
}

/// Longest run of consecutive equity points spent below a prior peak.
pub fn compute_drawdown_duration(equity: &[Decimal]) -> Result<u64, MetricsError> {
    Ok(drawdown_profile(equity)?.max_duration_periods)
}
