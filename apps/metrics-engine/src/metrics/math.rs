//! Statistical math utilities for performance metric calculations.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::constants::{SQRT_ITERATIONS, TOLERANCE, TWO};

/// Calculate mean of a slice of decimals.
///
/// `None` when empty or when the sum leaves the decimal range.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = checked_sum(values.iter().copied())?;
    Some(sum / Decimal::from(values.len() as u64))
}

/// Calculate sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }

    let avg = mean(values)?;
    let squared = values
        .iter()
        .map(|v| v.checked_sub(avg).and_then(|d| d.checked_mul(d)))
        .collect::<Option<Vec<_>>>()?;
    let variance = checked_sum(squared)? / Decimal::from((values.len() - 1) as u64);

    sqrt_decimal(variance)
}

/// Calculate downside deviation (only negative returns, total count denominator).
pub fn downside_deviation(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }

    let squared = values
        .iter()
        .filter(|v| **v < Decimal::ZERO)
        .map(|v| v.checked_mul(*v))
        .collect::<Option<Vec<_>>>()?;
    let variance = checked_sum(squared)? / Decimal::from(values.len() as u64);

    sqrt_decimal(variance)
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Square root using Newton's method.
pub fn sqrt_decimal(value: Decimal) -> Option<Decimal> {
    if value < Decimal::ZERO {
        return None;
    }
    if value == Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    // Start above the root so the iteration descends monotonically.
    let mut guess = if value < Decimal::ONE {
        Decimal::ONE
    } else {
        value / TWO + Decimal::ONE
    };

    for _ in 0..SQRT_ITERATIONS {
        let next = (guess + value / guess) / TWO;
        if (next - guess).abs() < TOLERANCE {
            return Some(next);
        }
        guess = next;
    }

    Some(guess)
}

/// Raise a non-negative decimal to a fractional power through `f64`.
///
/// Returns `None` for a negative base or a result that is not finite.
pub fn powf_decimal(base: Decimal, exponent: Decimal) -> Option<Decimal> {
    if base < Decimal::ZERO {
        return None;
    }
    let result = base.to_f64()?.powf(exponent.to_f64()?);
    if !result.is_finite() {
        return None;
    }
    Decimal::from_f64(result)
}
