//! Trade-level statistics over a closed-trade ledger.

use rust_decimal::Decimal;

use crate::ledger::Trade;

/// Aggregated win/loss statistics for a set of trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeStats {
    /// Total number of trades.
    pub total_trades: u64,
    /// Trades with positive realized P&L.
    pub winning_trades: u64,
    /// Trades with negative realized P&L.
    pub losing_trades: u64,
    /// Sum of winning P&L.
    pub gross_profit: Decimal,
    /// Sum of losing P&L (positive value).
    pub gross_loss: Decimal,
    /// Longest run of consecutive winners.
    pub max_consecutive_wins: u64,
    /// Longest run of consecutive losers.
    pub max_consecutive_losses: u64,
}

impl TradeStats {
    /// Tally wins, losses and streaks.
    ///
    /// Break-even trades count toward the total but are neither winners nor
    /// losers, and they do not interrupt a streak. Gross totals saturate at
    /// the decimal bound, which a validated [`crate::TradeLedger`] never reaches.
    #[must_use]
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = Self {
            total_trades: trades.len() as u64,
            ..Self::default()
        };
        let mut current_wins = 0u64;
        let mut current_losses = 0u64;

        for trade in trades {
            if trade.is_winner() {
                stats.gross_profit = stats.gross_profit.saturating_add(trade.realized_pnl);
                stats.winning_trades += 1;
                current_wins += 1;
                current_losses = 0;
                stats.max_consecutive_wins = stats.max_consecutive_wins.max(current_wins);
            } else if trade.is_loser() {
                stats.gross_loss = stats.gross_loss.saturating_add(trade.realized_pnl.abs());
                stats.losing_trades += 1;
                current_losses += 1;
                current_wins = 0;
                stats.max_consecutive_losses = stats.max_consecutive_losses.max(current_losses);
            }
        }

        stats
    }

    /// Fraction of trades that made money; `None` without trades.
    #[must_use]
    pub fn win_rate(&self) -> Option<Decimal> {
        if self.total_trades == 0 {
            return None;
        }
        Some(Decimal::from(self.winning_trades) / Decimal::from(self.total_trades))
    }

    /// Gross profit over gross loss; `None` without a losing trade.
    #[must_use]
    pub fn profit_factor(&self) -> Option<Decimal> {
        if self.gross_loss == Decimal::ZERO {
            return None;
        }
        self.gross_profit.checked_div(self.gross_loss)
    }

    /// Average winning trade.
    #[must_use]
    pub fn avg_win(&self) -> Option<Decimal> {
        if self.winning_trades == 0 {
            return None;
        }
        Some(self.gross_profit / Decimal::from(self.winning_trades))
    }

    /// Average losing trade (positive value).
    #[must_use]
    pub fn avg_loss(&self) -> Option<Decimal> {
        if self.losing_trades == 0 {
            return None;
        }
        Some(self.gross_loss / Decimal::from(self.losing_trades))
    }

    /// Average net P&L per trade.
    #[must_use]
    pub fn expectancy(&self) -> Option<Decimal> {
        if self.total_trades == 0 {
            return None;
        }
        Some((self.gross_profit - self.gross_loss) / Decimal::from(self.total_trades))
    }
}

/// Fraction of trades with positive realized P&L, in `[0, 1]`.
///
/// `None` for an empty ledger: no trades means no win rate, not 0%.
pub fn compute_win_rate(trades: &[Trade]) -> Option<Decimal> {
    TradeStats::from_trades(trades).win_rate()
}

/// Gross profit divided by the magnitude of gross loss.
///
/// `None` when there are no losing trades.
pub fn compute_profit_factor(trades: &[Trade]) -> Option<Decimal> {
    TradeStats::from_trades(trades).profit_factor()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ledger::TradeSide;

    fn make_trade(entry_price: i64, exit_price: i64, qty: i64, commission: i64) -> Trade {
        let entry = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        let exit = Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap();
        Trade::closed(
            "AAPL.XNAS",
            TradeSide::Buy,
            entry,
            Decimal::new(entry_price, 2),
            exit,
            Decimal::new(exit_price, 2),
            Decimal::new(qty, 0),
            Decimal::new(commission, 2),
        )
    }

    #[test]
    fn test_win_rate() {
        let trades = vec![
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_300, 100, 100),
            make_trade(10_000, 10_200, 100, 100),
            make_trade(10_000, 9500, 100, 100),
            make_trade(10_000, 9700, 100, 100),
        ];

        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.total_trades, 5);
        assert_eq!(stats.winning_trades, 3);
        assert_eq!(stats.losing_trades, 2);
        assert_eq!(compute_win_rate(&trades), Some(Decimal::new(6, 1)));
    }

    #[test]
    fn test_win_rate_undefined_without_trades() {
        assert_eq!(compute_win_rate(&[]), None);
        assert_eq!(TradeStats::from_trades(&[]).expectancy(), None);
    }

    #[test]
    fn test_win_rate_zero_when_all_lose() {
        let trades = vec![
            make_trade(10_000, 9_900, 10, 0),
            make_trade(10_000, 9_800, 10, 0),
        ];
        assert_eq!(compute_win_rate(&trades), Some(Decimal::ZERO));
    }

    #[test]
    fn test_profit_factor() {
        let trades = vec![
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 9700, 100, 100),
            make_trade(10_000, 9700, 100, 100),
        ];

        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.gross_profit, Decimal::new(998, 0));
        assert_eq!(stats.gross_loss, Decimal::new(602, 0));
        let Some(pf) = compute_profit_factor(&trades) else {
            panic!("profit factor should be calculated");
        };
        assert!(pf > Decimal::new(165, 2) && pf < Decimal::new(166, 2));
    }

    #[test]
    fn test_profit_factor_undefined_without_losers() {
        let trades = vec![make_trade(10_000, 10_500, 100, 100)];
        assert_eq!(compute_profit_factor(&trades), None);
        assert_eq!(compute_profit_factor(&[]), None);
    }

    #[test]
    fn test_consecutive_streaks() {
        // W W W L L W L W W
        let trades = vec![
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 9500, 100, 100),
            make_trade(10_000, 9500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 9500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
        ];

        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.max_consecutive_wins, 3);
        assert_eq!(stats.max_consecutive_losses, 2);
    }

    #[test]
    fn test_averages_and_expectancy() {
        let trades = vec![
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 10_500, 100, 100),
            make_trade(10_000, 9600, 100, 100),
            make_trade(10_000, 9600, 100, 100),
        ];

        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.avg_win(), Some(Decimal::new(499, 0)));
        assert_eq!(stats.avg_loss(), Some(Decimal::new(401, 0)));
        assert_eq!(stats.expectancy(), Some(Decimal::new(139, 0)));
    }

    #[test]
    fn test_break_even_trade() {
        let trades = vec![make_trade(10_000, 10_000, 100, 0)];
        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.losing_trades, 0);
        assert_eq!(stats.win_rate(), Some(Decimal::ZERO));
        assert_eq!(stats.avg_loss(), None);
    }

    #[test]
    fn test_extreme_pnl_does_not_panic() {
        let big = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let mut huge = make_trade(10_000, 10_500, 100, 0);
        huge.realized_pnl = big;
        let mut tiny_loss = make_trade(10_000, 9_900, 100, 0);
        tiny_loss.realized_pnl = Decimal::new(-1, 20);

        let stats = TradeStats::from_trades(&[huge.clone(), huge, tiny_loss]);
        assert_eq!(stats.gross_profit, Decimal::MAX);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.profit_factor(), None);
    }
}
