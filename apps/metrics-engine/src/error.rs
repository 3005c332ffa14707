//! Error types for the metrics engine.
//!
//! # Categories
//!
//! | Category | Usage |
//! |----------|-------|
//! | `InvalidInput` | Malformed series, ledger, capital or configuration |
//! | `ArithmeticDegenerate` | Decimal range exhausted while compounding equity or deriving a metric |
//!
//! Metrics that are undefined for otherwise valid input (no trades, zero
//! variance, no elapsed time) are not errors; they surface as `None` fields
//! on [`crate::PerformanceMetrics`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classification of a [`MetricsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// The caller handed over data that violates an input invariant.
    InvalidInput,
    /// The input was valid but the computation left the decimal range.
    ArithmeticDegenerate,
}

impl ErrorCategory {
    /// Get the category reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::ArithmeticDegenerate => "ARITHMETIC_DEGENERATE",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors raised while validating inputs or computing metrics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// Initial capital must be strictly positive.
    #[error("Initial capital must be positive, got {capital}")]
    NonPositiveCapital {
        /// Rejected capital.
        capital: Decimal,
    },

    /// Annualization factor must be at least one period per year.
    #[error("Annualization factor must be positive")]
    ZeroAnnualizationFactor,

    /// Two return periods share a timestamp.
    #[error("Duplicate timestamp {timestamp} at return period {index}")]
    DuplicateTimestamp {
        /// Index of the offending period.
        index: usize,
        /// Repeated timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A return period is earlier than its predecessor.
    #[error("Timestamp {timestamp} at return period {index} precedes {previous}")]
    NonMonotonicTimestamp {
        /// Index of the offending period.
        index: usize,
        /// Timestamp of the preceding period.
        previous: DateTime<Utc>,
        /// Offending timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Trade quantity must be strictly positive.
    #[error("Trade {index} has non-positive quantity {quantity}")]
    NonPositiveQuantity {
        /// Index of the trade in the ledger.
        index: usize,
        /// Rejected quantity.
        quantity: Decimal,
    },

    /// Commission cannot be negative.
    #[error("Trade {index} has negative commission {commission}")]
    NegativeCommission {
        /// Index of the trade in the ledger.
        index: usize,
        /// Rejected commission.
        commission: Decimal,
    },

    /// Trade exit must come strictly after its entry.
    #[error("Trade {index} exits at {exit} which is not after entry {entry}")]
    ExitNotAfterEntry {
        /// Index of the trade in the ledger.
        index: usize,
        /// Entry timestamp.
        entry: DateTime<Utc>,
        /// Exit timestamp.
        exit: DateTime<Utc>,
    },

    /// Reported realized P&L disagrees with the recomputed value.
    #[error("Trade {index} reports realized P&L {reported} but prices imply {expected}")]
    PnlMismatch {
        /// Index of the trade in the ledger.
        index: usize,
        /// P&L reported by the backtest engine.
        reported: Decimal,
        /// P&L recomputed from prices, quantity, side and commission.
        expected: Decimal,
    },

    /// A trade's P&L, or the ledger's running totals, leave the decimal range.
    #[error("Trade {index} P&L exceeds the decimal range")]
    PnlOverflow {
        /// Index of the trade in the ledger.
        index: usize,
    },

    /// Backtest window end does not follow its start.
    #[error("Backtest window end {end} is not after start {start}")]
    InvalidWindow {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },

    /// A tolerance or rate in the configuration is out of range.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// Compounding the equity curve overflowed the decimal range.
    #[error("Equity overflowed while compounding return period {period}")]
    EquityOverflow {
        /// Index of the return that overflowed.
        period: usize,
    },

    /// A metric derived from a valid equity curve overflowed the decimal range.
    #[error("Metric '{metric}' overflowed the decimal range")]
    MetricOverflow {
        /// Metric name.
        metric: &'static str,
    },
}

impl MetricsError {
    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::EquityOverflow { .. } | Self::MetricOverflow { .. } => {
                ErrorCategory::ArithmeticDegenerate
            }
            Self::NonPositiveCapital { .. }
            | Self::ZeroAnnualizationFactor
            | Self::DuplicateTimestamp { .. }
            | Self::NonMonotonicTimestamp { .. }
            | Self::NonPositiveQuantity { .. }
            | Self::NegativeCommission { .. }
            | Self::ExitNotAfterEntry { .. }
            | Self::PnlMismatch { .. }
            | Self::PnlOverflow { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidParameter { .. } => ErrorCategory::InvalidInput,
        }
    }

    /// Check if this error was caused by the caller's input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self.category(), ErrorCategory::InvalidInput)
    }
}
