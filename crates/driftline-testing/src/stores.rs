// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! In-memory collaborator doubles: sample reader, change-event reader and
//! analysis sinks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use driftline::correlation::ChangeEvent;
use driftline::error::{Error, Result};
use driftline::record::AnalysisRecord;
use driftline::store::{AnalysisSink, ChangeEventReader, MetricSampleReader, TimeRange};

/// Sample reader backed by a column-keyed map.
#[derive(Default)]
pub struct StaticSampleReader {
    by_column: HashMap<String, Vec<f64>>,
}

impl StaticSampleReader {
    /// Create an empty reader; every query returns zero rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample series for a column.
    #[must_use]
    pub fn with_samples(mut self, column: impl Into<String>, samples: Vec<f64>) -> Self {
        self.by_column.insert(column.into(), samples);
        self
    }
}

#[async_trait]
impl MetricSampleReader for StaticSampleReader {
    async fn fetch_samples(
        &self,
        metric_column: &str,
        _source_table: &str,
        _range: Option<&TimeRange>,
    ) -> Result<Vec<f64>> {
        Ok(self
            .by_column
            .get(metric_column)
            .cloned()
            .unwrap_or_default())
    }
}

/// Change-event reader backed by a fixed event list.
#[derive(Default)]
pub struct StaticChangeEventReader {
    events: Vec<ChangeEvent>,
}

impl StaticChangeEventReader {
    /// Create a reader with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one event.
    #[must_use]
    pub fn with_event(mut self, event: ChangeEvent) -> Self {
        self.events.push(event);
        self
    }
}

#[async_trait]
impl ChangeEventReader for StaticChangeEventReader {
    async fn fetch_change_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ChangeEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.occurred_at >= start && e.occurred_at <= end)
            .cloned()
            .collect())
    }
}

/// Sink that records every saved analysis for assertions.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the records saved so far, in save order.
    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl AnalysisSink for RecordingSink {
    async fn save(&self, record: &AnalysisRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Sink whose every save fails, for verifying persistence failures are
/// swallowed.
#[derive(Default)]
pub struct FailingSink;

impl FailingSink {
    /// Create the sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisSink for FailingSink {
    async fn save(&self, _record: &AnalysisRecord) -> Result<()> {
        Err(Error::Persistence("sink configured to fail".to_string()))
    }
}
