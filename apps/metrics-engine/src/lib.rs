// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Metrics Engine - Backtest Performance Evaluation
//!
//! Turns the output of a completed backtest run into the performance
//! record stored alongside it.
//!
//! # Inputs
//!
//! - [`ReturnsSeries`]: per-period fractional returns over the whole run
//! - [`TradeLedger`]: closed trades with realized P&L
//! - Initial capital and an optional calendar window
//!
//! # Pipeline
//!
//! 1. Validate the series, the ledger and the capital
//! 2. Compound the equity curve `E_t = E_{t-1} * (1 + r_t)`
//! 3. Derive return and risk metrics from the equity curve and returns
//! 4. Derive trade statistics from the ledger
//! 5. Round for storage and hand the record to a [`sink::MetricsSink`]
//!
//! Drawdown is always measured on the per-period equity curve, never on
//! trade-level P&L.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod series;
pub mod sink;
pub mod telemetry;

pub use config::{Config, ConfigError, LogFormat, LoggingConfig, MetricsConfig, load_config};
pub use error::{ErrorCategory, MetricsError};
pub use ledger::{DEFAULT_PNL_TOLERANCE, Trade, TradeLedger, TradeSide};
pub use metrics::{BacktestRun, BacktestWindow, MetricsCalculator, PerformanceMetrics, TradeStats};
pub use series::{ReturnPoint, ReturnsSeries};
pub use sink::{InMemoryMetricsSink, MetricsSink, SinkError};
