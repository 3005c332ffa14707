//! Closed-trade ledger produced by a backtest run.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Default tolerance when reconciling reported against recomputed P&L.
pub const DEFAULT_PNL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Direction of the opening fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    /// Long: profits when the exit price is above the entry.
    Buy,
    /// Short: profits when the exit price is below the entry.
    Sell,
}

impl TradeSide {
    /// P&L sign for this side.
    #[must_use]
    pub const fn sign(&self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

/// A closed round-trip trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Trade side.
    pub side: TradeSide,
    /// Entry timestamp.
    pub entry_timestamp: DateTime<Utc>,
    /// Entry price.
    pub entry_price: Decimal,
    /// Exit timestamp.
    pub exit_timestamp: DateTime<Utc>,
    /// Exit price.
    pub exit_price: Decimal,
    /// Quantity traded.
    pub quantity: Decimal,
    /// Total commission paid.
    pub commission: Decimal,
    /// Net P&L (after commission).
    pub realized_pnl: Decimal,
}

impl Trade {
    /// Create a closed trade, deriving realized P&L from the fills.
    ///
    /// If the fills imply a P&L outside the decimal range, `realized_pnl`
    /// is left at zero and ledger validation rejects the trade with
    /// `PnlOverflow`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn closed(
        instrument_id: impl Into<String>,
        side: TradeSide,
        entry_timestamp: DateTime<Utc>,
        entry_price: Decimal,
        exit_timestamp: DateTime<Utc>,
        exit_price: Decimal,
        quantity: Decimal,
        commission: Decimal,
    ) -> Self {
        let mut trade = Self {
            instrument_id: instrument_id.into(),
            side,
            entry_timestamp,
            entry_price,
            exit_timestamp,
            exit_price,
            quantity,
            commission,
            realized_pnl: Decimal::ZERO,
        };
        trade.realized_pnl = trade.expected_pnl().unwrap_or_default();
        trade
    }

    /// P&L before commission; `None` outside the decimal range.
    #[must_use]
    pub fn gross_pnl(&self) -> Option<Decimal> {
        self.exit_price
            .checked_sub(self.entry_price)?
            .checked_mul(self.quantity)?
            .checked_mul(self.side.sign())
    }

    /// Realized P&L implied by prices, quantity, side and commission.
    #[must_use]
    pub fn expected_pnl(&self) -> Option<Decimal> {
        self.gross_pnl()?.checked_sub(self.commission)
    }

    /// Check if this trade was profitable.
    #[must_use]
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > Decimal::ZERO
    }

    /// Check if this trade lost money.
    #[must_use]
    pub fn is_loser(&self) -> bool {
        self.realized_pnl < Decimal::ZERO
    }

    /// Time between entry and exit.
    #[must_use]
    pub fn holding_period(&self) -> Duration {
        self.exit_timestamp - self.entry_timestamp
    }

    fn validate(&self, index: usize, pnl_tolerance: Decimal) -> Result<(), MetricsError> {
        if self.quantity <= Decimal::ZERO {
            return Err(MetricsError::NonPositiveQuantity {
                index,
                quantity: self.quantity,
            });
        }
        if self.commission < Decimal::ZERO {
            return Err(MetricsError::NegativeCommission {
                index,
                commission: self.commission,
            });
        }
        if self.exit_timestamp <= self.entry_timestamp {
            return Err(MetricsError::ExitNotAfterEntry {
                index,
                entry: self.entry_timestamp,
                exit: self.exit_timestamp,
            });
        }
        let expected = self
            .expected_pnl()
            .ok_or(MetricsError::PnlOverflow { index })?;
        let within_tolerance = self
            .realized_pnl
            .checked_sub(expected)
            .is_some_and(|gap| gap.abs() <= pnl_tolerance);
        if !within_tolerance {
            return Err(MetricsError::PnlMismatch {
                index,
                reported: self.realized_pnl,
                expected,
            });
        }
        Ok(())
    }
}

/// Ordered closed trades, each validated against the trade invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Trade>", into = "Vec<Trade>")]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    /// Build a ledger using [`DEFAULT_PNL_TOLERANCE`].
    pub fn new(trades: Vec<Trade>) -> Result<Self, MetricsError> {
        Self::with_pnl_tolerance(trades, DEFAULT_PNL_TOLERANCE)
    }

    /// Build a ledger, reconciling each trade's P&L within `pnl_tolerance`.
    pub fn with_pnl_tolerance(
        trades: Vec<Trade>,
        pnl_tolerance: Decimal,
    ) -> Result<Self, MetricsError> {
        let ledger = Self { trades };
        ledger.validate(pnl_tolerance)?;
        Ok(ledger)
    }

    /// Re-check every trade against a (possibly tighter) tolerance.
    ///
    /// Also rejects a ledger whose gross profit, gross loss or commission
    /// totals leave the decimal range, so every total derived from a valid
    /// ledger is representable.
    pub fn validate(&self, pnl_tolerance: Decimal) -> Result<(), MetricsError> {
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut commission = Decimal::ZERO;

        for (index, trade) in self.trades.iter().enumerate() {
            trade.validate(index, pnl_tolerance)?;
            let pnl = trade.realized_pnl;
            if pnl >= Decimal::ZERO {
                gross_profit = gross_profit
                    .checked_add(pnl)
                    .ok_or(MetricsError::PnlOverflow { index })?;
            } else {
                gross_loss = gross_loss
                    .checked_sub(pnl)
                    .ok_or(MetricsError::PnlOverflow { index })?;
            }
            commission = commission
                .checked_add(trade.commission)
                .ok_or(MetricsError::PnlOverflow { index })?;
        }
        Ok(())
    }

    /// Number of trades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Check if the ledger has no trades.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// All trades in order.
    #[must_use]
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Sum of realized P&L.
    ///
    /// Bounded by the gross totals checked in [`TradeLedger::validate`].
    #[must_use]
    pub fn total_pnl(&self) -> Decimal {
        self.trades.iter().map(|t| t.realized_pnl).sum()
    }

    /// Sum of commissions.
    #[must_use]
    pub fn total_commission(&self) -> Decimal {
        self.trades.iter().map(|t| t.commission).sum()
    }
}

impl TryFrom<Vec<Trade>> for TradeLedger {
    type Error = MetricsError;

    fn try_from(trades: Vec<Trade>) -> Result<Self, Self::Error> {
        Self::new(trades)
    }
}

impl From<TradeLedger> for Vec<Trade> {
    fn from(ledger: TradeLedger) -> Self {
        ledger.trades
    }
}
