//! Persistence port for computed metrics.
//!
//! The storage backend lives outside this crate; it implements
//! [`MetricsSink`]. [`InMemoryMetricsSink`] backs tests and embedding
//! applications that keep results in process.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::metrics::PerformanceMetrics;

/// Errors from storing metrics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Metrics for this run were already stored.
    #[error("Metrics already stored for run '{run_id}'")]
    AlreadyStored {
        /// Backtest run identifier.
        run_id: String,
    },

    /// A value does not fit the storage precision.
    #[error("Metric '{field}' value {value} exceeds storage precision")]
    MetricOutOfRange {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: Decimal,
    },
}

/// Destination for a run's computed metrics.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Store the metrics for a run. Each run is stored at most once.
    async fn store(&self, run_id: &str, metrics: &PerformanceMetrics) -> Result<(), SinkError>;

    /// Fetch previously stored metrics.
    async fn fetch(&self, run_id: &str) -> Result<Option<PerformanceMetrics>, SinkError>;
}

/// In-memory metrics sink.
#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    records: RwLock<HashMap<String, PerformanceMetrics>>,
}

impl InMemoryMetricsSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetricsSink for InMemoryMetricsSink {
    async fn store(&self, run_id: &str, metrics: &PerformanceMetrics) -> Result<(), SinkError> {
        let rounded = metrics.rounded_for_storage()?;
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if records.contains_key(run_id) {
            return Err(SinkError::AlreadyStored {
                run_id: run_id.to_string(),
            });
        }
        records.insert(run_id.to_string(), rounded);
        drop(records);
        tracing::debug!(run_id = %run_id, "Metrics stored");
        Ok(())
    }

    async fn fetch(&self, run_id: &str) -> Result<Option<PerformanceMetrics>, SinkError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records.get(run_id).cloned())
    }
}
