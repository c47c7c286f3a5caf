// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Collaborator seams
//!
//! The pipeline reads metric history and change events through these traits
//! and writes its final record through [`AnalysisSink`]. All queries are
//! read-only; the analysis record is written once, after the full pipeline
//! completes. Production implementations (warehouse clients and the like)
//! live outside this crate; `driftline-testing` provides in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::correlation::ChangeEvent;
use crate::error::Result;
use crate::record::AnalysisRecord;

/// Half-open time range `[start, end)` for sample queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// The range covering the `hours` before `end`.
    pub fn hours_before(end: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: end - chrono::Duration::hours(hours),
            end,
        }
    }
}

/// Reads historical samples for one metric column.
#[async_trait]
pub trait MetricSampleReader: Send + Sync {
    /// Fetch the sample series for `metric_column` in `source_table`,
    /// optionally restricted to a time range.
    ///
    /// An empty result is a valid answer here; the baseline engine decides
    /// whether that is an error for its purposes.
    async fn fetch_samples(
        &self,
        metric_column: &str,
        source_table: &str,
        range: Option<&TimeRange>,
    ) -> Result<Vec<f64>>;
}

/// Reads recorded system changes (migrations, deployments, config changes).
#[async_trait]
pub trait ChangeEventReader: Send + Sync {
    /// Fetch change events with `start <= occurred_at <= end`, newest first.
    async fn fetch_change_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ChangeEvent>>;
}

/// Persists a finished analysis.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    /// Write one analysis record.
    ///
    /// Failures are reported through the `Result` but the orchestrator logs
    /// and swallows them; producing the analysis matters more than storing it.
    async fn save(&self, record: &AnalysisRecord) -> Result<()>;
}
