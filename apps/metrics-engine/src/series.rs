//! Per-period returns series produced by a backtest run.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// A single reporting period's fractional return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPoint {
    /// End of the reporting period.
    pub timestamp: DateTime<Utc>,
    /// Fractional return for the period (0.01 = +1%).
    #[serde(alias = "return")]
    pub fractional_return: Decimal,
}

impl ReturnPoint {
    /// Create a new return point.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, fractional_return: Decimal) -> Self {
        Self {
            timestamp,
            fractional_return,
        }
    }
}

/// Ordered per-period returns with strictly increasing timestamps.
///
/// The invariant is checked on construction and on deserialization, so a
/// `ReturnsSeries` that exists is always well ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ReturnPoint>", into = "Vec<ReturnPoint>")]
pub struct ReturnsSeries {
    points: Vec<ReturnPoint>,
}

impl ReturnsSeries {
    /// Build a series, rejecting duplicate or out-of-order timestamps.
    pub fn new(points: Vec<ReturnPoint>) -> Result<Self, MetricsError> {
        for (index, pair) in points.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if current == previous {
                return Err(MetricsError::DuplicateTimestamp {
                    index: index + 1,
                    timestamp: current,
                });
            }
            if current < previous {
                return Err(MetricsError::NonMonotonicTimestamp {
                    index: index + 1,
                    previous,
                    timestamp: current,
                });
            }
        }
        Ok(Self { points })
    }

    /// Build a series from `(timestamp, return)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, MetricsError>
    where
        I: IntoIterator<Item = (DateTime<Utc>, Decimal)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(timestamp, value)| ReturnPoint::new(timestamp, value))
                .collect(),
        )
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All periods in order.
    #[must_use]
    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    /// Fractional returns in period order.
    #[must_use]
    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.fractional_return).collect()
    }

    /// Timestamp of the first period.
    #[must_use]
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Timestamp of the last period.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Time between the first and last periods.
    ///
    /// `None` for fewer than two periods.
    #[must_use]
    pub fn span(&self) -> Option<Duration> {
        if self.points.len() < 2 {
            return None;
        }
        Some(self.last_timestamp()? - self.first_timestamp()?)
    }
}

impl TryFrom<Vec<ReturnPoint>> for ReturnsSeries {
    type Error = MetricsError;

    fn try_from(points: Vec<ReturnPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<ReturnsSeries> for Vec<ReturnPoint> {
    fn from(series: ReturnsSeries) -> Self {
        series.points
    }
}
